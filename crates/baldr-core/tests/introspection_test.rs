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

//! Integration tests for program introspection and typed uniform uploads.

use anyhow::Result;
use approx::assert_relative_eq;
use baldr_core::{
    api::{ShaderDescriptor, TextureTarget, UniformType},
    testing::{GlCall, RecordingGl, UniformValue},
    BindingPoint, Context, ContextSettings, Error, Program, Resource, Shader, Texture,
};
use glam::{Mat4, Vec3, Vec4};
use std::rc::Rc;

const VERTEX: &str = "\
#version 330 core
layout(location = 0) in vec3 position;
layout(location = 1) in vec2 uv;
uniform mat4 mvp;
out vec2 v_uv;
void main() {
    v_uv = uv;
    gl_Position = mvp * vec4(position, 1.0);
}
";

const FRAGMENT: &str = "\
#version 330 core
in vec2 v_uv;
uniform sampler2D albedo;
uniform sampler2D shadows[2];
uniform vec4 tint;
uniform vec3 lights[4];
uniform int mode;
uniform float unused;
out vec4 color;
void main() {
    vec4 base = texture(albedo, v_uv) * tint;
    color = base + texture(shadows[1], v_uv) * vec4(lights[mode], 1.0);
}
";

fn setup() -> Result<(Rc<RecordingGl>, Context, Program)> {
    let gl = Rc::new(RecordingGl::new());
    let context = Context::new(gl.clone(), ContextSettings::default());
    let vertex = Shader::new(&context, &ShaderDescriptor::vertex(VERTEX))?;
    let fragment = Shader::new(&context, &ShaderDescriptor::fragment(FRAGMENT))?;
    let program = Program::link(&context, Some("lit"), &[&vertex, &fragment])?;
    Ok((gl, context, program))
}

#[test]
fn test_active_uniforms_are_found_by_name() -> Result<()> {
    let (_gl, _context, program) = setup()?;

    assert_eq!(program.location_of("mvp")?, 0);
    assert_eq!(program.uniform("tint")?.ty, UniformType::Vec4);
    assert_eq!(program.uniform("lights")?.count, 4);
    assert_eq!(program.attribute_location("uv")?, 1);
    Ok(())
}

#[test]
fn test_array_uniforms_answer_to_both_names() -> Result<()> {
    let (_gl, _context, program) = setup()?;

    assert_eq!(program.location_of("lights")?, program.location_of("lights[0]")?);
    Ok(())
}

#[test]
fn test_eliminated_and_misspelled_uniforms_are_unknown() -> Result<()> {
    let (_gl, _context, program) = setup()?;

    for name in ["unused", "tnit"] {
        assert_eq!(
            program.location_of(name).unwrap_err(),
            Error::UnknownUniform {
                name: name.to_owned()
            }
        );
    }
    assert!(matches!(
        program.attribute("normal"),
        Err(Error::UnknownAttribute { .. })
    ));
    Ok(())
}

#[test]
fn test_samplers_get_one_unit_per_element() -> Result<()> {
    let (_gl, _context, program) = setup()?;

    assert_eq!(program.uniform("albedo")?.texture_unit, Some(0));
    assert_eq!(program.uniform("shadows")?.texture_unit, Some(1));
    assert_eq!(program.uniform("tint")?.texture_unit, None);
    assert_eq!(program.sampler_units()?, 3);
    Ok(())
}

#[test]
fn test_matrix_upload_is_column_major() -> Result<()> {
    let (gl, _context, program) = setup()?;
    let mvp = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    program.set_uniform("mvp", &mvp)?;

    let Some(UniformValue::Matrix { columns, values }) = gl.last_uniform(0) else {
        panic!("expected a matrix upload");
    };
    assert_eq!(columns, 4);
    for (uploaded, expected) in values.iter().zip(mvp.to_cols_array()) {
        assert_relative_eq!(*uploaded, expected);
    }
    assert_relative_eq!(values[12], 1.0);
    Ok(())
}

#[test]
fn test_uniform_upload_binds_the_program_once() -> Result<()> {
    let (gl, context, program) = setup()?;

    program.set_uniform("tint", &Vec4::ONE)?;
    program.set_uniform("mode", &2i32)?;

    let program_binds =
        gl.count(|call| matches!(call, GlCall::Bind { point: BindingPoint::Program, .. }));
    assert_eq!(program_binds, 1);
    assert_eq!(context.bound(BindingPoint::Program), Some(Some(program.handle()?)));
    Ok(())
}

#[test]
fn test_partial_array_upload_is_accepted() -> Result<()> {
    let (gl, _context, program) = setup()?;
    let location = program.location_of("lights")?;

    program.set_uniform_slice("lights", &[Vec3::X, Vec3::Y])?;

    assert_eq!(
        gl.last_uniform(location),
        Some(UniformValue::Float {
            components: 3,
            values: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        })
    );
    Ok(())
}

#[test]
fn test_mismatched_uploads_are_rejected() -> Result<()> {
    let (gl, _context, program) = setup()?;
    gl.clear_calls();

    let wrong_size = program.set_uniform("tint", &Vec3::ONE);
    let too_many = program.set_uniform_slice("lights", &[Vec3::ZERO; 5]);
    let sampler = program.set_uniform("albedo", &0i32);

    for result in [wrong_size, too_many, sampler] {
        assert!(matches!(result, Err(Error::UniformMismatch { .. })), "{result:?}");
    }
    assert_eq!(gl.count(|call| matches!(call, GlCall::Uniform { .. })), 0);
    Ok(())
}

#[test]
fn test_set_texture_points_sampler_at_its_unit() -> Result<()> {
    let (gl, context, program) = setup()?;
    let texture = Texture::rgba8(&context, 4, 4)?;
    let location = program.location_of("shadows")?;

    program.set_texture("shadows", &texture)?;
    program.set_texture("shadows", &texture)?;

    assert_eq!(
        gl.last_uniform(location),
        Some(UniformValue::Int {
            components: 1,
            values: vec![1],
        })
    );
    assert_eq!(
        gl.count(|call| matches!(call, GlCall::Uniform { .. })),
        1,
        "The sampler value is uploaded once per link"
    );
    let unit = BindingPoint::Texture {
        unit: 1,
        target: TextureTarget::D2,
    };
    assert_eq!(gl.native_binding(unit), Some(texture.handle()?.id()));
    Ok(())
}

#[test]
fn test_sampler_array_element_takes_the_next_unit() -> Result<()> {
    let (gl, context, program) = setup()?;
    let first = Texture::rgba8(&context, 4, 4)?;
    let second = Texture::rgba8(&context, 4, 4)?;

    program.set_texture("shadows[0]", &first)?;
    program.set_texture("shadows[1]", &second)?;

    let element = program.uniform("shadows[1]")?;
    assert_eq!(element.texture_unit, Some(2));
    assert_eq!(element.location, program.location_of("shadows")? + 1);
    assert_eq!(
        gl.last_uniform(element.location),
        Some(UniformValue::Int {
            components: 1,
            values: vec![2],
        })
    );
    let units = program
        .textures()
        .into_iter()
        .map(|(unit, handle, _)| (unit, handle))
        .collect::<Vec<_>>();
    assert_eq!(units, vec![(1, first.handle()?), (2, second.handle()?)]);
    assert!(matches!(
        program.uniform("shadows[2]"),
        Err(Error::UnknownUniform { .. })
    ));
    Ok(())
}

#[test]
fn test_fragment_outputs_and_counters_are_introspected() -> Result<()> {
    let (_gl, context, program) = setup()?;
    assert_eq!(program.output_location("color")?, 0);
    assert_eq!(program.output("color")?.ty, UniformType::Vec4);

    let counting = Shader::new(
        &context,
        &ShaderDescriptor::compute(
            "#version 430 core
layout(local_size_x = 64) in;
layout(binding = 2, offset = 0) uniform atomic_uint visible;
layout(r32f) uniform readonly image2D depth;
void main() {
    if (imageLoad(depth, ivec2(gl_GlobalInvocationID.xy)).r < 1.0) {
        atomicCounterIncrement(visible);
    }
}
",
        ),
    )?;
    let cull = Program::link(&context, Some("cull"), &[&counting])?;

    assert_eq!(cull.atomic_counter_binding("visible")?, 2);
    assert_eq!(cull.uniform("depth")?.image_unit, Some(0));
    assert_eq!(cull.image_units()?, 1);
    assert!(matches!(
        cull.output_location("color"),
        Err(Error::UnknownOutput { .. })
    ));
    Ok(())
}

#[test]
fn test_relink_replaces_the_interface() -> Result<()> {
    let (_gl, context, mut program) = setup()?;
    let vertex = Shader::new(&context, &ShaderDescriptor::vertex(VERTEX))?;
    let flat = Shader::new(
        &context,
        &ShaderDescriptor::fragment(
            "#version 330 core\nuniform vec4 flat_color;\nout vec4 color;\nvoid main() { color = flat_color; }\n",
        ),
    )?;

    program.relink(&[&vertex, &flat])?;

    assert!(program.location_of("flat_color").is_ok());
    assert!(matches!(
        program.location_of("tint"),
        Err(Error::UnknownUniform { .. })
    ));
    assert!(program.textures().is_empty());
    Ok(())
}

#[test]
fn test_introspection_failure_is_reported() -> Result<()> {
    let (gl, context, _program) = setup()?;
    let vertex = Shader::new(&context, &ShaderDescriptor::vertex(VERTEX))?;
    let fragment = Shader::new(&context, &ShaderDescriptor::fragment(FRAGMENT))?;
    gl.fail_introspection();

    let err = Program::link(&context, None, &[&vertex, &fragment]).unwrap_err();

    assert!(matches!(err, Error::Introspection(_)), "{err:?}");
    Ok(())
}
