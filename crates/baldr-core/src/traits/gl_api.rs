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

use crate::api::*;
use crate::binding::BindingPoint;
use crate::handle::{NativeId, ObjectKind};
use crate::state::RenderState;
use std::fmt::Debug;

/// The native graphics API, as seen by the core.
///
/// Implementations translate each call into one driver call and never cache
/// anything themselves; deduplication happens in the binding cache and the
/// state tracker. A current context on the calling thread is assumed.
///
/// Methods that can fail return the driver's diagnostic text as a `String`;
/// the core wraps it in the appropriate [`Error`](crate::Error) variant.
pub trait GlApi: Debug {
    /// Allocates a buffer name.
    fn create_buffer(&self) -> Result<NativeId, String>;

    /// Allocates a texture name.
    fn create_texture(&self) -> Result<NativeId, String>;

    /// Allocates a shader object for `stage`.
    fn create_shader(&self, stage: ShaderStage) -> Result<NativeId, String>;

    /// Allocates a program object.
    fn create_program(&self) -> Result<NativeId, String>;

    /// Allocates a framebuffer name.
    fn create_framebuffer(&self) -> Result<NativeId, String>;

    /// Allocates a vertex array name.
    fn create_vertex_array(&self) -> Result<NativeId, String>;

    /// Deletes the native object `id` of the given `kind`.
    ///
    /// The driver is free to hand the same id out again afterwards.
    fn delete_object(&self, kind: ObjectKind, id: NativeId);

    /// Binds `id` (or zero for `None`) to `point`.
    ///
    /// For [`BindingPoint::Texture`] points the caller selects the unit
    /// through [`GlApi::active_texture`] first.
    fn bind(&self, point: BindingPoint, id: Option<NativeId>);

    /// Selects the active texture unit.
    fn active_texture(&self, unit: u32);

    /// Queries the object currently bound to `point`.
    ///
    /// Only used by the `verbose` consistency checks.
    fn bound_object(&self, point: BindingPoint) -> Option<NativeId>;

    /// (Re)allocates the storage of the buffer bound to `target`.
    /// ## Arguments
    /// * `target` - The target the buffer is currently bound to.
    /// * `size` - The new storage size in bytes.
    /// * `data` - Initial contents, or `None` for uninitialized storage.
    /// * `usage` - The usage hint.
    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage);

    /// Overwrites part of the buffer bound to `target`.
    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);

    /// Copies `out.len()` bytes starting at `offset` of the buffer bound to
    /// `target` into `out`.
    fn get_buffer_sub_data(&self, target: BufferTarget, offset: usize, out: &mut [u8]);

    /// Maps a range of the buffer bound to `target`, hands the mapping to
    /// `f` and unmaps it again.
    /// ## Arguments
    /// * `offset` - Start of the range in bytes.
    /// * `length` - Length of the range in bytes; the slice passed to `f`
    ///   has exactly this length.
    /// * `access` - Whether the mapping is read, written or both.
    /// ## Returns
    /// `Err` if the range could not be mapped, or if the driver reports on
    /// unmap that the contents were lost. `f` is not called in the first
    /// case.
    fn map_buffer(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
        f: &mut dyn FnMut(&mut [u8]),
    ) -> Result<(), String>;

    /// Specifies one mip level of the texture bound to `target` on the
    /// active unit.
    fn tex_image(
        &self,
        target: TextureTarget,
        level: u32,
        format: TextureFormat,
        extent: Extent3D,
        data: Option<&[u8]>,
    );

    /// Sets a sampling parameter of the texture bound to `target`.
    fn tex_parameter(&self, target: TextureTarget, parameter: TextureParameter);

    /// Generates the mip chain of the texture bound to `target`.
    fn generate_mipmap(&self, target: TextureTarget);

    /// Reads back one mip level of the texture bound to `target` on the
    /// active unit, as tightly packed texels of `format`.
    fn get_tex_image(&self, target: TextureTarget, level: u32, format: TextureFormat, out: &mut [u8]);

    /// Binds a texture level (or one layer of it) to image unit `unit`, or
    /// clears the unit when `texture` is `None`.
    fn bind_image_texture(
        &self,
        unit: u32,
        texture: Option<NativeId>,
        level: u32,
        layer: Option<u32>,
        access: ImageAccess,
        format: TextureFormat,
    );

    /// Uploads and compiles GLSL source.
    /// ## Returns
    /// `Err` with the compiler info log if compilation fails.
    fn compile_shader(&self, shader: NativeId, source: &str) -> Result<(), String>;

    /// Attaches a compiled shader to a program.
    fn attach_shader(&self, program: NativeId, shader: NativeId);

    /// Detaches a shader from a program.
    fn detach_shader(&self, program: NativeId, shader: NativeId);

    /// Links the shaders attached to `program`.
    /// ## Returns
    /// `Err` with the linker info log if linking fails.
    fn link_program(&self, program: NativeId) -> Result<(), String>;

    /// Lists the active uniforms of a linked program, in driver order.
    fn active_uniforms(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String>;

    /// Lists the active vertex attributes of a linked program, in driver order.
    fn active_attributes(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String>;

    /// Lists the active fragment outputs of a linked program, in driver
    /// order. Programs without a fragment stage have none.
    fn active_outputs(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String>;

    /// Writes a uniform of the currently bound program.
    fn uniform(&self, location: u32, data: UniformData<'_>);

    /// Attaches a texture level (or one layer of it) to the framebuffer
    /// bound to `target`, or clears the attachment when `texture` is `None`.
    fn framebuffer_texture(
        &self,
        target: FramebufferTarget,
        attachment: Attachment,
        texture: Option<(NativeId, TextureTarget)>,
        level: u32,
        layer: Option<u32>,
    );

    /// Sets the draw buffer list of the bound draw framebuffer.
    fn draw_buffers(&self, attachments: &[Attachment]);

    /// Checks the completeness of the framebuffer bound to `target`.
    fn framebuffer_status(&self, target: FramebufferTarget) -> FramebufferStatus;

    /// Clears the selected buffers of the bound draw framebuffer.
    fn clear(&self, flags: ClearFlags);

    /// Clears draw buffer `draw_buffer` of the bound draw framebuffer to
    /// `rgba`, leaving the other draw buffers untouched.
    fn clear_buffer_color(&self, draw_buffer: u32, rgba: [f32; 4]);

    /// Declares one attribute of the bound vertex array, reading from the
    /// bound array buffer.
    /// ## Arguments
    /// * `attribute` - Location, format and offset of the attribute.
    /// * `stride` - Byte distance between consecutive elements.
    /// * `divisor` - 0 to advance per vertex, 1 to advance per instance.
    fn vertex_attrib(&self, attribute: &VertexAttribute, stride: u32, divisor: u32);

    /// Applies one piece of fixed-function state.
    fn set_state(&self, state: &RenderState);

    /// Draws non-indexed primitives from the bound vertex array.
    fn draw_arrays(&self, primitive: PrimitiveTopology, first: u32, count: u32, instances: u32);

    /// Draws indexed primitives from the bound vertex array's index buffer.
    /// `offset` is in bytes.
    fn draw_elements(
        &self,
        primitive: PrimitiveTopology,
        count: u32,
        format: IndexFormat,
        offset: usize,
        instances: u32,
    );

    /// Launches `x * y * z` work groups of the bound compute program.
    fn dispatch_compute(&self, x: u32, y: u32, z: u32);

    /// Orders incoherent shader writes before the accesses `barrier` names.
    fn memory_barrier(&self, barrier: MemoryBarrier);
}
