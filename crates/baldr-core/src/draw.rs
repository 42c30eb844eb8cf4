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

//! Validated draw dispatch.
//!
//! Every draw is checked against the resource registry before anything is
//! sent to the driver. A failed check issues no native call at all.

use crate::api::{FramebufferTarget, MemoryBarrier, PrimitiveTopology};
use crate::binding::BindingPoint;
use crate::context::Context;
use crate::error::{DrawCheck, Result};
use crate::resource::{Framebuffer, Program, Resource, VertexArray};

/// The parameters of one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawCommand {
    /// How vertices are assembled.
    pub primitive: PrimitiveTopology,
    /// The first vertex, or the first index for indexed vertex arrays.
    pub first: u32,
    /// The number of vertices or indices.
    pub count: u32,
    /// The number of instances.
    pub instances: u32,
}

impl DrawCommand {
    /// A single-instance draw of `count` vertices starting at zero.
    pub const fn new(primitive: PrimitiveTopology, count: u32) -> Self {
        Self {
            primitive,
            first: 0,
            count,
            instances: 1,
        }
    }

    /// Sets the first vertex or index.
    pub const fn with_first(mut self, first: u32) -> Self {
        self.first = first;
        self
    }

    /// Sets the number of instances.
    pub const fn with_instances(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }
}

impl Context {
    /// Draws `count` vertices of `vertex_array` with `program` into
    /// `framebuffer` (the default framebuffer for `None`).
    pub fn draw(
        &self,
        vertex_array: &VertexArray,
        program: &Program,
        framebuffer: Option<&Framebuffer>,
        primitive: PrimitiveTopology,
        count: u32,
    ) -> Result<()> {
        self.dispatch(
            vertex_array,
            program,
            framebuffer,
            &DrawCommand::new(primitive, count),
        )
    }

    /// Like [`Context::draw`], for `instances` instances.
    pub fn draw_instanced(
        &self,
        vertex_array: &VertexArray,
        program: &Program,
        framebuffer: Option<&Framebuffer>,
        primitive: PrimitiveTopology,
        count: u32,
        instances: u32,
    ) -> Result<()> {
        self.dispatch(
            vertex_array,
            program,
            framebuffer,
            &DrawCommand::new(primitive, count).with_instances(instances),
        )
    }

    /// Validates the draw, binds everything it needs through the binding
    /// cache and issues exactly one native draw call.
    ///
    /// Vertex arrays with an index buffer are drawn indexed, in which case
    /// `command.first` counts indices.
    /// ## Errors
    /// * `Error::InvalidDrawState` - Naming the first failed check; nothing
    ///   was sent to the driver.
    /// * `Error::UseAfterMove` - If one of the wrappers was emptied.
    pub fn dispatch(
        &self,
        vertex_array: &VertexArray,
        program: &Program,
        framebuffer: Option<&Framebuffer>,
        command: &DrawCommand,
    ) -> Result<()> {
        self.validate_draw(vertex_array, program, framebuffer)?;

        self.bind_program_inputs(program)?;
        let target = framebuffer.map(|fb| fb.handle()).transpose()?;
        self.bind(BindingPoint::Framebuffer(FramebufferTarget::Draw), target)?;
        self.bind(BindingPoint::VertexArray, Some(vertex_array.handle()?))?;

        let api = self.api();
        match vertex_array.index_format() {
            Some(format) => api.draw_elements(
                command.primitive,
                command.count,
                format,
                command.first as usize * format.size(),
                command.instances,
            ),
            None => api.draw_arrays(
                command.primitive,
                command.first,
                command.count,
                command.instances,
            ),
        }
        self.count_draw();
        Ok(())
    }

    /// Runs `program` as a compute shader over a grid of `groups` work
    /// groups.
    ///
    /// The program is validated like a draw's, then bound with its textures
    /// and images. Follow with [`Context::memory_barrier`] before reading
    /// what the shader wrote.
    /// ## Errors
    /// * `Error::InvalidDrawState` - Naming the first failed check, with
    ///   `DrawCheck::WrongPipeline` if the program has no compute stage;
    ///   nothing was sent to the driver.
    /// * `Error::UseAfterMove` - If the program was emptied.
    pub fn dispatch_compute(&self, program: &Program, groups: [u32; 3]) -> Result<()> {
        self.validate_program(program, true)?;
        self.bind_program_inputs(program)?;
        let [x, y, z] = groups;
        self.api().dispatch_compute(x, y, z);
        self.count_compute();
        Ok(())
    }

    /// Orders shader writes before the accesses named by `barrier`.
    pub fn memory_barrier(&self, barrier: MemoryBarrier) {
        self.api().memory_barrier(barrier);
    }

    /// Runs the draw-time checks of [`Context::dispatch`] without drawing.
    ///
    /// Checks, in order: the program is alive in this context, linked and
    /// not a compute program, and every texture assigned to its samplers or
    /// images is alive; the vertex array is alive and every buffer its
    /// attributes currently read is alive; the framebuffer is alive, every
    /// attached texture is alive and the last reported status is complete.
    /// Issues no native call.
    pub fn validate_draw(
        &self,
        vertex_array: &VertexArray,
        program: &Program,
        framebuffer: Option<&Framebuffer>,
    ) -> Result<()> {
        self.validate_program(program, false)?;

        let vertex_array_handle = vertex_array.handle()?;
        if !self.owns(vertex_array) || !self.is_live(vertex_array_handle) {
            return Err(DrawCheck::VertexArrayDestroyed.into());
        }
        for handle in vertex_array.referenced_buffers() {
            if !self.is_live(handle) {
                return Err(DrawCheck::DeadBuffer { handle }.into());
            }
        }

        if let Some(framebuffer) = framebuffer {
            let framebuffer_handle = framebuffer.handle()?;
            if !self.owns(framebuffer) || !self.is_live(framebuffer_handle) {
                return Err(DrawCheck::FramebufferDestroyed.into());
            }
            for (attachment, image) in framebuffer.attachments() {
                if !self.is_live(image.texture) {
                    return Err(DrawCheck::DeadAttachment { attachment }.into());
                }
            }
            if !framebuffer.is_complete() {
                return Err(DrawCheck::FramebufferIncomplete {
                    status: framebuffer.status(),
                }
                .into());
            }
        }
        Ok(())
    }
}

impl Context {
    // Handles of another context may collide with live handles of this one.
    fn owns(&self, resource: &impl Resource) -> bool {
        resource.context().same_context(self)
    }

    fn validate_program(&self, program: &Program, compute: bool) -> Result<()> {
        let program_handle = program.handle()?;
        if !self.owns(program) || !self.is_live(program_handle) {
            return Err(DrawCheck::ProgramDestroyed.into());
        }
        if !program.is_linked() {
            return Err(DrawCheck::ProgramNotLinked.into());
        }
        if program.is_compute() != compute {
            return Err(DrawCheck::WrongPipeline {
                compute: program.is_compute(),
            }
            .into());
        }
        for (unit, texture, _) in program.textures() {
            if !self.is_live(texture) {
                return Err(DrawCheck::DeadTexture { unit }.into());
            }
        }
        for (unit, texture) in program.images() {
            if !self.is_live(texture) {
                return Err(DrawCheck::DeadImage { unit }.into());
            }
        }
        Ok(())
    }

    fn bind_program_inputs(&self, program: &Program) -> Result<()> {
        self.bind(BindingPoint::Program, Some(program.handle()?))?;
        for (unit, texture, target) in program.textures() {
            self.bind(BindingPoint::Texture { unit, target }, Some(texture))?;
        }
        program.rebind_images();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_builder_defaults_to_one_instance() {
        let command = DrawCommand::new(PrimitiveTopology::TriangleStrip, 4).with_first(2);
        assert_eq!(command.instances, 1);
        assert_eq!(command.first, 2);
        assert_eq!(command.with_instances(9).instances, 9);
    }
}
