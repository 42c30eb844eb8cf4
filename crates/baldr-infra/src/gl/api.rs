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

use std::fmt;
use std::num::NonZeroU32;

use baldr_core::api::{
    ActiveVariable, Attachment, BufferTarget, BufferUsage, ClearFlags, Extent3D,
    FramebufferStatus, FramebufferTarget, ImageAccess, IndexFormat, MapAccess, MemoryBarrier,
    PrimitiveTopology, ShaderStage, TextureFormat, TextureParameter, TextureTarget, UniformData,
    UniformType, VertexAttribute,
};
use baldr_core::state::RenderState;
use baldr_core::{BindingPoint, GlApi, NativeId, ObjectKind};
use glow::HasContext;

use super::conversions::{framebuffer_status_from_gl, uniform_type_from_gl, GlTextureFormat, IntoGl};

/// The OpenGL implementation of [`GlApi`], on top of a [`glow::Context`].
///
/// Every method assumes the context it was created from is current on the
/// calling thread. Nothing is cached here; redundant calls are filtered by
/// `baldr-core` before they arrive.
pub struct GlowApi {
    gl: glow::Context,
    version: String,
}

impl fmt::Debug for GlowApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowApi")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl GlowApi {
    /// Wraps an existing glow context.
    pub fn new(gl: glow::Context) -> Self {
        // SAFETY: Plain queries and pixel store state on the current context.
        let version = unsafe {
            // Rows of R8 and RGB32F textures are not 4-byte aligned.
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
            gl.get_parameter_string(glow::VERSION)
        };
        log::info!("GlowApi: Using OpenGL {version}");
        Self { gl, version }
    }

    /// Loads the OpenGL entry points through `loader` and wraps the result.
    ///
    /// # Safety
    /// A context must be current on the calling thread, and `loader` must
    /// return entry points of that context.
    pub unsafe fn from_loader_function<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const std::os::raw::c_void,
    {
        Self::new(glow::Context::from_loader_function(loader))
    }

    /// The version string reported by the driver.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The wrapped glow context, for calls the core does not cover.
    ///
    /// Binds or state changes issued through it are invisible to the caches;
    /// call `Context::invalidate_all` afterwards.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

fn native<T>(id: Option<NativeId>, wrap: fn(NonZeroU32) -> T) -> Option<T> {
    id.and_then(NonZeroU32::new).map(wrap)
}

fn non_zero(value: i32) -> Option<NativeId> {
    u32::try_from(value).ok().filter(|id| *id != 0)
}

// The binding point of each target, as queried with glGetIntegerv.
fn binding_query(point: BindingPoint) -> u32 {
    match point {
        BindingPoint::Buffer(target) => match target {
            BufferTarget::Array => glow::ARRAY_BUFFER_BINDING,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER_BINDING,
            BufferTarget::Uniform => glow::UNIFORM_BUFFER_BINDING,
            BufferTarget::CopyRead => glow::COPY_READ_BUFFER_BINDING,
            BufferTarget::CopyWrite => glow::COPY_WRITE_BUFFER_BINDING,
            BufferTarget::PixelPack => glow::PIXEL_PACK_BUFFER_BINDING,
            BufferTarget::PixelUnpack => glow::PIXEL_UNPACK_BUFFER_BINDING,
            BufferTarget::AtomicCounter => glow::ATOMIC_COUNTER_BUFFER_BINDING,
            BufferTarget::ShaderStorage => glow::SHADER_STORAGE_BUFFER_BINDING,
        },
        BindingPoint::UniformBufferSlot(_) => glow::UNIFORM_BUFFER_BINDING,
        BindingPoint::AtomicCounterSlot(_) => glow::ATOMIC_COUNTER_BUFFER_BINDING,
        BindingPoint::StorageBufferSlot(_) => glow::SHADER_STORAGE_BUFFER_BINDING,
        BindingPoint::Texture { target, .. } => match target {
            TextureTarget::D2 => glow::TEXTURE_BINDING_2D,
            TextureTarget::D2Array => glow::TEXTURE_BINDING_2D_ARRAY,
            TextureTarget::D3 => glow::TEXTURE_BINDING_3D,
        },
        BindingPoint::Program => glow::CURRENT_PROGRAM,
        BindingPoint::VertexArray => glow::VERTEX_ARRAY_BINDING,
        BindingPoint::Framebuffer(FramebufferTarget::Draw) => glow::DRAW_FRAMEBUFFER_BINDING,
        BindingPoint::Framebuffer(FramebufferTarget::Read) => glow::READ_FRAMEBUFFER_BINDING,
    }
}

fn gl_size(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn linked_program(gl: &glow::Context, program: NativeId) -> Result<glow::NativeProgram, String> {
    let program = native(Some(program), glow::NativeProgram)
        .ok_or_else(|| "program 0 is not a program object".to_owned())?;
    if unsafe { gl.get_program_link_status(program) } {
        Ok(program)
    } else {
        Err(format!("program {} is not linked", program.0))
    }
}

impl GlApi for GlowApi {
    fn create_buffer(&self) -> Result<NativeId, String> {
        unsafe { self.gl.create_buffer() }.map(|buffer| buffer.0.get())
    }

    fn create_texture(&self) -> Result<NativeId, String> {
        unsafe { self.gl.create_texture() }.map(|texture| texture.0.get())
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<NativeId, String> {
        unsafe { self.gl.create_shader(stage.into_gl()) }.map(|shader| shader.0.get())
    }

    fn create_program(&self) -> Result<NativeId, String> {
        unsafe { self.gl.create_program() }.map(|program| program.0.get())
    }

    fn create_framebuffer(&self) -> Result<NativeId, String> {
        unsafe { self.gl.create_framebuffer() }.map(|framebuffer| framebuffer.0.get())
    }

    fn create_vertex_array(&self) -> Result<NativeId, String> {
        unsafe { self.gl.create_vertex_array() }.map(|vertex_array| vertex_array.0.get())
    }

    fn delete_object(&self, kind: ObjectKind, id: NativeId) {
        let Some(id) = NonZeroU32::new(id) else {
            return;
        };
        unsafe {
            match kind {
                ObjectKind::Buffer => self.gl.delete_buffer(glow::NativeBuffer(id)),
                ObjectKind::Texture => self.gl.delete_texture(glow::NativeTexture(id)),
                ObjectKind::Shader => self.gl.delete_shader(glow::NativeShader(id)),
                ObjectKind::Program => self.gl.delete_program(glow::NativeProgram(id)),
                ObjectKind::Framebuffer => {
                    self.gl.delete_framebuffer(glow::NativeFramebuffer(id))
                }
                ObjectKind::VertexArray => {
                    self.gl.delete_vertex_array(glow::NativeVertexArray(id))
                }
            }
        }
    }

    fn bind(&self, point: BindingPoint, id: Option<NativeId>) {
        unsafe {
            match point {
                BindingPoint::Buffer(target) => self
                    .gl
                    .bind_buffer(target.into_gl(), native(id, glow::NativeBuffer)),
                BindingPoint::UniformBufferSlot(index)
                | BindingPoint::AtomicCounterSlot(index)
                | BindingPoint::StorageBufferSlot(index) => {
                    let target = point
                        .indexed_target()
                        .map_or(glow::UNIFORM_BUFFER, |target| target.into_gl());
                    self.gl
                        .bind_buffer_base(target, index, native(id, glow::NativeBuffer))
                }
                BindingPoint::Texture { target, .. } => self
                    .gl
                    .bind_texture(target.into_gl(), native(id, glow::NativeTexture)),
                BindingPoint::Program => self.gl.use_program(native(id, glow::NativeProgram)),
                BindingPoint::VertexArray => self
                    .gl
                    .bind_vertex_array(native(id, glow::NativeVertexArray)),
                BindingPoint::Framebuffer(target) => self
                    .gl
                    .bind_framebuffer(target.into_gl(), native(id, glow::NativeFramebuffer)),
            }
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bound_object(&self, point: BindingPoint) -> Option<NativeId> {
        let query = binding_query(point);
        let value = unsafe {
            match point {
                BindingPoint::UniformBufferSlot(index)
                | BindingPoint::AtomicCounterSlot(index)
                | BindingPoint::StorageBufferSlot(index) => {
                    self.gl.get_parameter_indexed_i32(query, index)
                }
                _ => self.gl.get_parameter_i32(query),
            }
        };
        non_zero(value)
    }

    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        unsafe {
            match data {
                Some(data) if data.len() == size => {
                    self.gl
                        .buffer_data_u8_slice(target.into_gl(), data, usage.into_gl())
                }
                _ => self
                    .gl
                    .buffer_data_size(target.into_gl(), gl_size(size), usage.into_gl()),
            }
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(target.into_gl(), gl_size(offset), data)
        }
    }

    fn get_buffer_sub_data(&self, target: BufferTarget, offset: usize, out: &mut [u8]) {
        if out.is_empty() {
            return;
        }
        unsafe {
            self.gl
                .get_buffer_sub_data(target.into_gl(), gl_size(offset), out)
        }
    }

    fn map_buffer(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
        f: &mut dyn FnMut(&mut [u8]),
    ) -> Result<(), String> {
        // Zero-length ranges are an error for the driver.
        if length == 0 {
            f(&mut []);
            return Ok(());
        }
        let target = target.into_gl();
        unsafe {
            let ptr = self
                .gl
                .map_buffer_range(target, gl_size(offset), gl_size(length), access.into_gl());
            if ptr.is_null() {
                return Err(format!(
                    "glMapBufferRange failed with error {:#x}",
                    self.gl.get_error()
                ));
            }
            // SAFETY: The driver returned a mapping of exactly `length` bytes
            // that stays valid until the unmap below.
            let mapping = std::slice::from_raw_parts_mut(ptr, length);
            f(mapping);
            self.gl.unmap_buffer(target);
        }
        Ok(())
    }

    fn tex_image(
        &self,
        target: TextureTarget,
        level: u32,
        format: TextureFormat,
        extent: Extent3D,
        data: Option<&[u8]>,
    ) {
        let GlTextureFormat {
            internal,
            format,
            ty,
        } = format.into_gl();
        let pixels = glow::PixelUnpackData::Slice(data);
        unsafe {
            match target {
                TextureTarget::D2 => self.gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    level as i32,
                    internal as i32,
                    extent.width as i32,
                    extent.height as i32,
                    0,
                    format,
                    ty,
                    pixels,
                ),
                TextureTarget::D2Array | TextureTarget::D3 => self.gl.tex_image_3d(
                    target.into_gl(),
                    level as i32,
                    internal as i32,
                    extent.width as i32,
                    extent.height as i32,
                    extent.depth_or_array_layers as i32,
                    0,
                    format,
                    ty,
                    pixels,
                ),
            }
        }
    }

    fn tex_parameter(&self, target: TextureTarget, parameter: TextureParameter) {
        let (name, value) = parameter.into_gl();
        unsafe { self.gl.tex_parameter_i32(target.into_gl(), name, value) }
    }

    fn generate_mipmap(&self, target: TextureTarget) {
        unsafe { self.gl.generate_mipmap(target.into_gl()) }
    }

    fn get_tex_image(&self, target: TextureTarget, level: u32, format: TextureFormat, out: &mut [u8]) {
        let GlTextureFormat { format, ty, .. } = format.into_gl();
        unsafe {
            self.gl.get_tex_image(
                target.into_gl(),
                level as i32,
                format,
                ty,
                glow::PixelPackData::Slice(Some(out)),
            )
        }
    }

    fn bind_image_texture(
        &self,
        unit: u32,
        texture: Option<NativeId>,
        level: u32,
        layer: Option<u32>,
        access: ImageAccess,
        format: TextureFormat,
    ) {
        let GlTextureFormat { internal, .. } = format.into_gl();
        unsafe {
            self.gl.bind_image_texture(
                unit,
                native(texture, glow::NativeTexture),
                level as i32,
                layer.is_none(),
                layer.unwrap_or(0) as i32,
                access.into_gl(),
                internal,
            )
        }
    }

    fn compile_shader(&self, shader: NativeId, source: &str) -> Result<(), String> {
        let shader = native(Some(shader), glow::NativeShader)
            .ok_or_else(|| "shader 0 is not a shader object".to_owned())?;
        unsafe {
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(shader))
            }
        }
    }

    fn attach_shader(&self, program: NativeId, shader: NativeId) {
        if let (Some(program), Some(shader)) = (
            native(Some(program), glow::NativeProgram),
            native(Some(shader), glow::NativeShader),
        ) {
            unsafe { self.gl.attach_shader(program, shader) }
        }
    }

    fn detach_shader(&self, program: NativeId, shader: NativeId) {
        if let (Some(program), Some(shader)) = (
            native(Some(program), glow::NativeProgram),
            native(Some(shader), glow::NativeShader),
        ) {
            unsafe { self.gl.detach_shader(program, shader) }
        }
    }

    fn link_program(&self, program: NativeId) -> Result<(), String> {
        let program = native(Some(program), glow::NativeProgram)
            .ok_or_else(|| "program 0 is not a program object".to_owned())?;
        unsafe {
            self.gl.link_program(program);
            if self.gl.get_program_link_status(program) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(program))
            }
        }
    }

    fn active_uniforms(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String> {
        let program = linked_program(&self.gl, program)?;
        unsafe {
            let count = self.gl.get_active_uniforms(program);
            let mut uniforms = Vec::with_capacity(count as usize);
            for index in 0..count {
                let Some(uniform) = self.gl.get_active_uniform(program, index) else {
                    continue;
                };
                let location = self
                    .gl
                    .get_uniform_location(program, &uniform.name)
                    .map(|location| location.0);
                let ty = uniform_type_from_gl(uniform.utype);
                let binding = (ty == UniformType::AtomicCounter)
                    .then(|| self.atomic_counter_binding(program, index))
                    .flatten();
                uniforms.push(ActiveVariable {
                    ty,
                    count: uniform.size.max(1) as u32,
                    location,
                    name: uniform.name,
                    binding,
                });
            }
            Ok(uniforms)
        }
    }

    fn active_attributes(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String> {
        let program = linked_program(&self.gl, program)?;
        unsafe {
            let count = self.gl.get_active_attributes(program);
            let mut attributes = Vec::with_capacity(count as usize);
            for index in 0..count {
                let Some(attribute) = self.gl.get_active_attribute(program, index) else {
                    continue;
                };
                // Built-ins report no location.
                let location = self.gl.get_attrib_location(program, &attribute.name);
                attributes.push(ActiveVariable {
                    ty: uniform_type_from_gl(attribute.atype),
                    count: attribute.size.max(1) as u32,
                    location,
                    name: attribute.name,
                    binding: None,
                });
            }
            Ok(attributes)
        }
    }

    fn active_outputs(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String> {
        let program = linked_program(&self.gl, program)?;
        unsafe {
            let count = self.gl.get_program_interface_i32(
                program,
                glow::PROGRAM_OUTPUT,
                glow::ACTIVE_RESOURCES,
            );
            let mut outputs = Vec::with_capacity(count.max(0) as usize);
            for index in 0..count.max(0) as u32 {
                let name = self
                    .gl
                    .get_program_resource_name(program, glow::PROGRAM_OUTPUT, index);
                // Built-ins such as gl_FragDepth report no location.
                let Some(location) = self.gl.get_frag_data_location(program, &name).try_into().ok()
                else {
                    continue;
                };
                let properties = self.gl.get_program_resource_i32(
                    program,
                    glow::PROGRAM_OUTPUT,
                    index,
                    &[glow::TYPE, glow::ARRAY_SIZE],
                );
                let (ty, size) = match properties.as_slice() {
                    [ty, size] => (*ty as u32, *size),
                    _ => continue,
                };
                outputs.push(ActiveVariable {
                    ty: uniform_type_from_gl(ty),
                    count: size.max(1) as u32,
                    location: Some(location),
                    name,
                    binding: None,
                });
            }
            Ok(outputs)
        }
    }

    fn uniform(&self, location: u32, data: UniformData<'_>) {
        let location = glow::NativeUniformLocation(location);
        let location = Some(&location);
        unsafe {
            match data {
                UniformData::Float { components, values } => match components {
                    1 => self.gl.uniform_1_f32_slice(location, values),
                    2 => self.gl.uniform_2_f32_slice(location, values),
                    3 => self.gl.uniform_3_f32_slice(location, values),
                    _ => self.gl.uniform_4_f32_slice(location, values),
                },
                UniformData::Int { components, values } => match components {
                    1 => self.gl.uniform_1_i32_slice(location, values),
                    2 => self.gl.uniform_2_i32_slice(location, values),
                    3 => self.gl.uniform_3_i32_slice(location, values),
                    _ => self.gl.uniform_4_i32_slice(location, values),
                },
                UniformData::UInt { components, values } => match components {
                    1 => self.gl.uniform_1_u32_slice(location, values),
                    2 => self.gl.uniform_2_u32_slice(location, values),
                    3 => self.gl.uniform_3_u32_slice(location, values),
                    _ => self.gl.uniform_4_u32_slice(location, values),
                },
                UniformData::Matrix { columns, values } => match columns {
                    2 => self.gl.uniform_matrix_2_f32_slice(location, false, values),
                    3 => self.gl.uniform_matrix_3_f32_slice(location, false, values),
                    _ => self.gl.uniform_matrix_4_f32_slice(location, false, values),
                },
            }
        }
    }

    fn framebuffer_texture(
        &self,
        target: FramebufferTarget,
        attachment: Attachment,
        texture: Option<(NativeId, TextureTarget)>,
        level: u32,
        layer: Option<u32>,
    ) {
        let target = target.into_gl();
        let attachment = attachment.into_gl();
        unsafe {
            match (texture, layer) {
                (None, _) => {
                    self.gl
                        .framebuffer_texture_2d(target, attachment, glow::TEXTURE_2D, None, 0)
                }
                (Some((id, tex_target)), None) => {
                    let texture = native(Some(id), glow::NativeTexture);
                    match tex_target {
                        TextureTarget::D2 => self.gl.framebuffer_texture_2d(
                            target,
                            attachment,
                            glow::TEXTURE_2D,
                            texture,
                            level as i32,
                        ),
                        // Layered attachment of the whole array or volume.
                        TextureTarget::D2Array | TextureTarget::D3 => {
                            self.gl
                                .framebuffer_texture(target, attachment, texture, level as i32)
                        }
                    }
                }
                (Some((id, _)), Some(layer)) => self.gl.framebuffer_texture_layer(
                    target,
                    attachment,
                    native(Some(id), glow::NativeTexture),
                    level as i32,
                    layer as i32,
                ),
            }
        }
    }

    fn draw_buffers(&self, attachments: &[Attachment]) {
        let buffers = attachments
            .iter()
            .map(|attachment| attachment.into_gl())
            .collect::<Vec<u32>>();
        unsafe { self.gl.draw_buffers(&buffers) }
    }

    fn framebuffer_status(&self, target: FramebufferTarget) -> FramebufferStatus {
        framebuffer_status_from_gl(unsafe { self.gl.check_framebuffer_status(target.into_gl()) })
    }

    fn clear(&self, flags: ClearFlags) {
        if flags.is_empty() {
            return;
        }
        unsafe { self.gl.clear(flags.into_gl()) }
    }

    fn clear_buffer_color(&self, draw_buffer: u32, rgba: [f32; 4]) {
        unsafe { self.gl.clear_buffer_f32_slice(glow::COLOR, draw_buffer, &rgba) }
    }

    fn vertex_attrib(&self, attribute: &VertexAttribute, stride: u32, divisor: u32) {
        let index = attribute.location;
        let size = attribute.format.components() as i32;
        let ty = attribute.format.scalar().into_gl();
        unsafe {
            self.gl.enable_vertex_attrib_array(index);
            if attribute.format.is_integer() && !attribute.normalized {
                self.gl.vertex_attrib_pointer_i32(
                    index,
                    size,
                    ty,
                    stride as i32,
                    attribute.offset as i32,
                );
            } else {
                self.gl.vertex_attrib_pointer_f32(
                    index,
                    size,
                    ty,
                    attribute.normalized,
                    stride as i32,
                    attribute.offset as i32,
                );
            }
            self.gl.vertex_attrib_divisor(index, divisor);
        }
    }

    fn set_state(&self, state: &RenderState) {
        let toggle = |capability: u32, enabled: bool| unsafe {
            if enabled {
                self.gl.enable(capability);
            } else {
                self.gl.disable(capability);
            }
        };
        unsafe {
            match *state {
                RenderState::Blend(enabled) => toggle(glow::BLEND, enabled),
                RenderState::BlendFunc(func) => self.gl.blend_func_separate(
                    func.src_color.into_gl(),
                    func.dst_color.into_gl(),
                    func.src_alpha.into_gl(),
                    func.dst_alpha.into_gl(),
                ),
                RenderState::BlendEquation { color, alpha } => self
                    .gl
                    .blend_equation_separate(color.into_gl(), alpha.into_gl()),
                RenderState::DepthTest(enabled) => toggle(glow::DEPTH_TEST, enabled),
                RenderState::DepthWrite(enabled) => self.gl.depth_mask(enabled),
                RenderState::DepthFunc(func) => self.gl.depth_func(func.into_gl()),
                RenderState::CullFace(enabled) => toggle(glow::CULL_FACE, enabled),
                RenderState::CullMode(face) => self.gl.cull_face(face.into_gl()),
                RenderState::FrontFace(face) => self.gl.front_face(face.into_gl()),
                RenderState::ScissorTest(enabled) => toggle(glow::SCISSOR_TEST, enabled),
                RenderState::Scissor(rect) => self.gl.scissor(
                    rect.x,
                    rect.y,
                    rect.width as i32,
                    rect.height as i32,
                ),
                RenderState::Viewport(rect) => self.gl.viewport(
                    rect.x,
                    rect.y,
                    rect.width as i32,
                    rect.height as i32,
                ),
                RenderState::ColorMask([r, g, b, a]) => self.gl.color_mask(r, g, b, a),
                RenderState::ClearColor([r, g, b, a]) => self.gl.clear_color(r, g, b, a),
                RenderState::ClearDepth(depth) => self.gl.clear_depth_f32(depth),
            }
        }
    }

    fn draw_arrays(&self, primitive: PrimitiveTopology, first: u32, count: u32, instances: u32) {
        let mode = primitive.into_gl();
        unsafe {
            if instances == 1 {
                self.gl.draw_arrays(mode, first as i32, count as i32);
            } else {
                self.gl
                    .draw_arrays_instanced(mode, first as i32, count as i32, instances as i32);
            }
        }
    }

    fn draw_elements(
        &self,
        primitive: PrimitiveTopology,
        count: u32,
        format: IndexFormat,
        offset: usize,
        instances: u32,
    ) {
        let mode = primitive.into_gl();
        let element_type = format.into_gl();
        unsafe {
            if instances == 1 {
                self.gl
                    .draw_elements(mode, count as i32, element_type, gl_size(offset));
            } else {
                self.gl.draw_elements_instanced(
                    mode,
                    count as i32,
                    element_type,
                    gl_size(offset),
                    instances as i32,
                );
            }
        }
    }

    fn dispatch_compute(&self, x: u32, y: u32, z: u32) {
        unsafe { self.gl.dispatch_compute(x, y, z) }
    }

    fn memory_barrier(&self, barrier: MemoryBarrier) {
        unsafe { self.gl.memory_barrier(barrier.into_gl()) }
    }
}

impl GlowApi {
    // The buffer binding of the atomic counter uniform at `index`.
    unsafe fn atomic_counter_binding(&self, program: glow::NativeProgram, index: u32) -> Option<u32> {
        let buffer = self.gl.get_program_resource_i32(
            program,
            glow::UNIFORM,
            index,
            &[glow::ATOMIC_COUNTER_BUFFER_INDEX],
        );
        let buffer = u32::try_from(*buffer.first()?).ok()?;
        let binding = self.gl.get_program_resource_i32(
            program,
            glow::ATOMIC_COUNTER_BUFFER,
            buffer,
            &[glow::BUFFER_BINDING],
        );
        u32::try_from(*binding.first()?).ok()
    }
}
