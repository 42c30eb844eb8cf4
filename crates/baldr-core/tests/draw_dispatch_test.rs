// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for validated draw dispatch.

use anyhow::Result;
use baldr_core::{
    api::{
        Attachment, BufferTarget, FramebufferStatus, FramebufferTarget, ImageAccess, IndexFormat,
        MemoryBarrier, PrimitiveTopology, ShaderDescriptor, TextureTarget, VertexFormat,
        VertexBufferLayout,
    },
    testing::{GlCall, RecordingGl},
    BindingPoint, Buffer, Context, ContextSettings, DrawCheck, DrawCommand, Error, Framebuffer,
    ObjectKind, Program, Resource, Shader, Texture, VertexArray,
};
use bytemuck::{Pod, Zeroable};
use std::rc::Rc;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [-1.0, -1.0, 0.0],
        uv: [0.0, 0.0],
    },
    Vertex {
        position: [1.0, -1.0, 0.0],
        uv: [1.0, 0.0],
    },
    Vertex {
        position: [0.0, 1.0, 0.0],
        uv: [0.5, 1.0],
    },
];

const VERTEX: &str = "\
#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec2 uv;
out vec2 v_uv;
void main() {
    v_uv = uv;
    gl_Position = vec4(position, 1.0);
}
";

const FRAGMENT: &str = "\
#version 330 core
in vec2 v_uv;
uniform sampler2D albedo;
out vec4 color;
void main() {
    color = texture(albedo, v_uv);
}
";

const COMPUTE: &str = "\
#version 430 core
layout(local_size_x = 8, local_size_y = 8) in;
layout(rgba8) uniform writeonly image2D target;
void main() {
    imageStore(target, ivec2(gl_GlobalInvocationID.xy), vec4(1.0));
}
";

struct Scene {
    gl: Rc<RecordingGl>,
    context: Context,
    vertices: Buffer,
    vertex_array: VertexArray,
    program: Program,
}

impl Scene {
    fn new() -> Result<Self> {
        let gl = Rc::new(RecordingGl::new());
        let context = Context::new(gl.clone(), ContextSettings::default());

        let vertices = Buffer::from_pod(&context, Some("triangle"), BufferTarget::Array, &TRIANGLE)?;
        let mut vertex_array = VertexArray::new(&context, Some("triangle"))?;
        vertex_array.set_vertex_buffer(
            &vertices,
            &VertexBufferLayout::packed(0, &[VertexFormat::Float32x3, VertexFormat::Float32x2]),
        )?;

        let vertex = Shader::new(&context, &ShaderDescriptor::vertex(VERTEX))?;
        let fragment = Shader::new(&context, &ShaderDescriptor::fragment(FRAGMENT))?;
        let program = Program::link(&context, Some("textured"), &[&vertex, &fragment])?;

        Ok(Self {
            gl,
            context,
            vertices,
            vertex_array,
            program,
        })
    }

    fn draw_triangle(&self, framebuffer: Option<&Framebuffer>) -> baldr_core::Result<()> {
        self.context.draw(
            &self.vertex_array,
            &self.program,
            framebuffer,
            PrimitiveTopology::TriangleList,
            3,
        )
    }

    fn draws(&self) -> usize {
        self.gl.count(GlCall::is_draw)
    }

    fn compute_program(&self) -> Result<Program> {
        let shader = Shader::new(&self.context, &ShaderDescriptor::compute(COMPUTE))?;
        Ok(Program::link(&self.context, Some("fill"), &[&shader])?)
    }

    fn layout() -> VertexBufferLayout<'static> {
        VertexBufferLayout::packed(0, &[VertexFormat::Float32x3, VertexFormat::Float32x2])
    }
}

#[test]
fn test_valid_draw_issues_one_native_draw() -> Result<()> {
    let scene = Scene::new()?;

    scene.draw_triangle(None)?;

    assert_eq!(scene.draws(), 1);
    assert_eq!(
        scene.gl.calls().last(),
        Some(&GlCall::DrawArrays {
            primitive: PrimitiveTopology::TriangleList,
            first: 0,
            count: 3,
            instances: 1,
        })
    );
    assert_eq!(
        scene.gl.native_binding(BindingPoint::Program),
        Some(scene.program.handle()?.id())
    );
    assert_eq!(
        scene.gl.native_binding(BindingPoint::VertexArray),
        Some(scene.vertex_array.handle()?.id())
    );
    assert_eq!(scene.context.draw_calls(), 1);
    Ok(())
}

#[test]
fn test_repeated_draw_issues_no_binds() -> Result<()> {
    let scene = Scene::new()?;
    scene.draw_triangle(None)?;
    scene.gl.clear_calls();

    scene.draw_triangle(None)?;

    let calls = scene.gl.calls();
    assert_eq!(calls.len(), 1, "Only the draw itself: {calls:?}");
    Ok(())
}

#[test]
fn test_destroyed_buffer_fails_validation_without_native_calls() -> Result<()> {
    let mut scene = Scene::new()?;
    let stale = scene.vertices.handle()?;
    scene.vertices.destroy();
    scene.gl.clear_calls();

    let err = scene.draw_triangle(None).unwrap_err();

    assert_eq!(err, Error::InvalidDrawState(DrawCheck::DeadBuffer { handle: stale }));
    assert!(scene.gl.calls().is_empty(), "Validation must not reach the driver");
    assert_eq!(scene.context.draw_calls(), 0);
    Ok(())
}

#[test]
fn test_indexed_draw_offsets_by_index_size() -> Result<()> {
    let mut scene = Scene::new()?;
    let indices = Buffer::from_pod(
        &scene.context,
        None,
        BufferTarget::ElementArray,
        &[0u32, 1, 2, 2, 1, 0],
    )?;
    scene
        .vertex_array
        .set_index_buffer(&indices, IndexFormat::Uint32)?;

    scene.context.dispatch(
        &scene.vertex_array,
        &scene.program,
        None,
        &DrawCommand::new(PrimitiveTopology::TriangleList, 3)
            .with_first(3)
            .with_instances(2),
    )?;

    assert_eq!(
        scene.gl.calls().last(),
        Some(&GlCall::DrawElements {
            primitive: PrimitiveTopology::TriangleList,
            count: 3,
            format: IndexFormat::Uint32,
            offset: 12,
            instances: 2,
        })
    );
    Ok(())
}

#[test]
fn test_unlinked_program_is_rejected() -> Result<()> {
    let mut scene = Scene::new()?;
    let vertex = Shader::new(&scene.context, &ShaderDescriptor::vertex(VERTEX))?;
    scene.gl.fail_next_link("error: fragment shader missing");
    assert!(scene.program.relink(&[&vertex]).is_err());

    let err = scene.draw_triangle(None).unwrap_err();

    assert_eq!(err, Error::InvalidDrawState(DrawCheck::ProgramNotLinked));
    assert_eq!(scene.draws(), 0);
    Ok(())
}

#[test]
fn test_moved_out_program_is_use_after_move() -> Result<()> {
    let mut scene = Scene::new()?;
    let _owner = scene.program.take()?;

    let err = scene.draw_triangle(None).unwrap_err();

    assert!(matches!(err, Error::UseAfterMove { .. }), "{err:?}");
    Ok(())
}

#[test]
fn test_resources_of_another_context_are_rejected() -> Result<()> {
    let scene = Scene::new()?;
    let other = Scene::new()?;

    let err = scene
        .context
        .draw(
            &scene.vertex_array,
            &other.program,
            None,
            PrimitiveTopology::TriangleList,
            3,
        )
        .unwrap_err();

    assert_eq!(err, Error::InvalidDrawState(DrawCheck::ProgramDestroyed));
    assert_eq!(scene.draws() + other.draws(), 0);
    Ok(())
}

#[test]
fn test_incomplete_framebuffer_is_rejected() -> Result<()> {
    let scene = Scene::new()?;
    let framebuffer = Framebuffer::new(&scene.context, Some("empty"))?;

    let err = scene.draw_triangle(Some(&framebuffer)).unwrap_err();

    assert_eq!(
        err,
        Error::InvalidDrawState(DrawCheck::FramebufferIncomplete {
            status: FramebufferStatus::MissingAttachment,
        })
    );
    Ok(())
}

#[test]
fn test_draw_into_complete_framebuffer() -> Result<()> {
    let scene = Scene::new()?;
    let target = Texture::rgba8(&scene.context, 64, 64)?;
    let mut framebuffer = Framebuffer::new(&scene.context, Some("offscreen"))?;
    assert!(framebuffer
        .attach(Attachment::Color(0), &target, 0)?
        .is_complete());

    scene.draw_triangle(Some(&framebuffer))?;

    assert_eq!(
        scene
            .gl
            .native_binding(BindingPoint::Framebuffer(FramebufferTarget::Draw)),
        Some(framebuffer.handle()?.id())
    );
    assert_eq!(scene.draws(), 1);
    Ok(())
}

#[test]
fn test_destroyed_attachment_is_rejected() -> Result<()> {
    let scene = Scene::new()?;
    let target = Texture::rgba8(&scene.context, 64, 64)?;
    let mut framebuffer = Framebuffer::new(&scene.context, None)?;
    framebuffer.attach(Attachment::Color(0), &target, 0)?;
    drop(target);

    let err = scene.draw_triangle(Some(&framebuffer)).unwrap_err();

    assert_eq!(
        err,
        Error::InvalidDrawState(DrawCheck::DeadAttachment {
            attachment: Attachment::Color(0),
        })
    );
    Ok(())
}

#[test]
fn test_draw_rebinds_program_textures() -> Result<()> {
    let scene = Scene::new()?;
    let albedo = Texture::rgba8(&scene.context, 4, 4)?;
    let other = Texture::rgba8(&scene.context, 4, 4)?;
    scene.program.set_texture("albedo", &albedo)?;
    let unit = BindingPoint::Texture {
        unit: 0,
        target: TextureTarget::D2,
    };

    // Uploads go through the scratch unit, which is unit 0 here.
    other.write(&[0u8; 64])?;
    assert_eq!(scene.gl.native_binding(unit), Some(other.handle()?.id()));

    scene.draw_triangle(None)?;

    assert_eq!(scene.gl.native_binding(unit), Some(albedo.handle()?.id()));
    Ok(())
}

#[test]
fn test_destroyed_sampler_texture_is_rejected() -> Result<()> {
    let scene = Scene::new()?;
    let albedo = Texture::rgba8(&scene.context, 4, 4)?;
    scene.program.set_texture("albedo", &albedo)?;
    drop(albedo);

    let err = scene.draw_triangle(None).unwrap_err();

    assert_eq!(err, Error::InvalidDrawState(DrawCheck::DeadTexture { unit: 0 }));
    Ok(())
}

#[test]
fn test_instanced_draw_forwards_instance_count() -> Result<()> {
    let scene = Scene::new()?;

    scene.context.draw_instanced(
        &scene.vertex_array,
        &scene.program,
        None,
        PrimitiveTopology::TriangleStrip,
        4,
        16,
    )?;

    assert!(matches!(
        scene.gl.calls().last(),
        Some(GlCall::DrawArrays { instances: 16, .. })
    ));
    Ok(())
}

#[test]
fn test_replaced_vertex_buffer_may_be_destroyed() -> Result<()> {
    let mut scene = Scene::new()?;
    let replacement = Buffer::from_pod(&scene.context, None, BufferTarget::Array, &TRIANGLE)?;
    scene
        .vertex_array
        .set_vertex_buffer(&replacement, &Scene::layout())?;
    scene.vertices.destroy();

    scene.draw_triangle(None)?;
    assert_eq!(scene.draws(), 1);

    let current = replacement.handle()?;
    drop(replacement);
    let err = scene.draw_triangle(None).unwrap_err();
    assert_eq!(err, Error::InvalidDrawState(DrawCheck::DeadBuffer { handle: current }));
    Ok(())
}

#[test]
fn test_shared_context_texture_can_be_sampled() -> Result<()> {
    let scene = Scene::new()?;
    let loader = Context::new_shared(scene.gl.clone(), ContextSettings::default(), &scene.context);
    let albedo = Texture::rgba8(&loader, 4, 4)?;

    scene.program.set_texture("albedo", &albedo)?;
    scene.draw_triangle(None)?;
    assert_eq!(scene.draws(), 1);

    drop(albedo);
    let err = scene.draw_triangle(None).unwrap_err();
    assert_eq!(err, Error::InvalidDrawState(DrawCheck::DeadTexture { unit: 0 }));
    Ok(())
}

#[test]
fn test_unshared_context_texture_is_rejected_when_assigned() -> Result<()> {
    let scene = Scene::new()?;
    let stranger = Context::new(Rc::new(RecordingGl::new()), ContextSettings::default());
    let albedo = Texture::rgba8(&stranger, 4, 4)?;

    let err = scene.program.set_texture("albedo", &albedo).unwrap_err();

    assert_eq!(
        err,
        Error::ContextMismatch {
            kind: ObjectKind::Texture
        }
    );
    scene.draw_triangle(None)?;
    Ok(())
}

#[test]
fn test_compute_dispatch_binds_program_and_images() -> Result<()> {
    let scene = Scene::new()?;
    let program = scene.compute_program()?;
    let target = Texture::rgba8(&scene.context, 64, 64)?;
    program.set_image("target", &target, 0, ImageAccess::WriteOnly)?;
    scene.draw_triangle(None)?;

    scene.context.dispatch_compute(&program, [8, 8, 1])?;
    scene.context.memory_barrier(MemoryBarrier::ShaderImageAccess);

    let calls = scene.gl.calls();
    assert_eq!(
        &calls[calls.len() - 2..],
        &[
            GlCall::DispatchCompute { x: 8, y: 8, z: 1 },
            GlCall::MemoryBarrier(MemoryBarrier::ShaderImageAccess),
        ]
    );
    assert_eq!(
        scene.gl.native_binding(BindingPoint::Program),
        Some(program.handle()?.id())
    );
    assert_eq!(scene.gl.native_image_unit(0), Some(target.handle()?.id()));
    assert_eq!(scene.context.compute_dispatches(), 1);
    assert_eq!(scene.context.draw_calls(), 1);
    Ok(())
}

#[test]
fn test_pipeline_kinds_are_not_interchangeable() -> Result<()> {
    let scene = Scene::new()?;
    let compute = scene.compute_program()?;

    let err = scene
        .context
        .draw(&scene.vertex_array, &compute, None, PrimitiveTopology::TriangleList, 3)
        .unwrap_err();
    assert_eq!(
        err,
        Error::InvalidDrawState(DrawCheck::WrongPipeline { compute: true })
    );

    let err = scene
        .context
        .dispatch_compute(&scene.program, [1, 1, 1])
        .unwrap_err();
    assert_eq!(
        err,
        Error::InvalidDrawState(DrawCheck::WrongPipeline { compute: false })
    );
    assert_eq!(scene.gl.count(GlCall::is_dispatch), 0);
    Ok(())
}

#[test]
fn test_destroyed_image_texture_blocks_dispatch() -> Result<()> {
    let scene = Scene::new()?;
    let program = scene.compute_program()?;
    let target = Texture::rgba8(&scene.context, 16, 16)?;
    program.set_image("target", &target, 0, ImageAccess::WriteOnly)?;
    drop(target);
    scene.gl.clear_calls();

    let err = scene
        .context
        .dispatch_compute(&program, [2, 2, 1])
        .unwrap_err();

    assert_eq!(err, Error::InvalidDrawState(DrawCheck::DeadImage { unit: 0 }));
    assert!(scene.gl.calls().is_empty(), "Validation must not reach the driver");
    Ok(())
}

#[test]
fn test_single_draw_buffer_clear_leaves_state_untouched() -> Result<()> {
    let scene = Scene::new()?;
    let albedo = Texture::rgba8(&scene.context, 8, 8)?;
    let normals = Texture::rgba8(&scene.context, 8, 8)?;
    let mut framebuffer = Framebuffer::new(&scene.context, Some("gbuffer"))?;
    framebuffer.attach(Attachment::Color(0), &albedo, 0)?;
    framebuffer.attach(Attachment::Color(1), &normals, 0)?;

    framebuffer.clear_attachment(Attachment::Color(1), [0.5, 0.5, 1.0, 0.0])?;

    assert!(scene.gl.calls().contains(&GlCall::ClearBufferColor {
        draw_buffer: 1,
        rgba: [0.5, 0.5, 1.0, 0.0],
    }));
    assert_eq!(scene.context.state_depth(baldr_core::StateKey::ColorMask), 0);
    Ok(())
}
