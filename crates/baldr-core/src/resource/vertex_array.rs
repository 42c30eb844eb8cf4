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

use super::{Buffer, OwnedHandle, Resource};
use crate::api::{BufferTarget, IndexFormat, VertexBufferLayout, VertexStepMode};
use crate::binding::BindingPoint;
use crate::context::Context;
use crate::error::Result;
use crate::handle::{Handle, ObjectKind};
use std::collections::BTreeMap;

/// An owned vertex array object.
///
/// The buffers it reads from are referenced, not owned. Destroying one that
/// an attribute still reads from makes every draw with this vertex array fail
/// validation; a buffer whose attributes were all pointed elsewhere is no
/// longer referenced.
#[derive(Debug)]
pub struct VertexArray {
    pub(crate) raw: OwnedHandle,
    // Source buffer of each enabled attribute location.
    buffers: BTreeMap<u32, Handle>,
    index: Option<(Handle, IndexFormat)>,
}

impl VertexArray {
    /// Creates a vertex array with no buffers.
    pub fn new(context: &Context, label: Option<&str>) -> Result<Self> {
        let raw = OwnedHandle::allocate(context, ObjectKind::VertexArray, label, |api| {
            api.create_vertex_array()
        })?;
        Ok(Self {
            raw,
            buffers: BTreeMap::new(),
            index: None,
        })
    }

    fn bind_self(&self) -> Result<&Context> {
        let context = self.raw.context();
        context.bind(BindingPoint::VertexArray, Some(self.raw.get()?))?;
        Ok(context)
    }

    /// Reads the attributes of `layout` from `buffer`.
    ///
    /// Each attribute location now reads from `buffer`, replacing whatever
    /// buffer it read from before.
    /// ## Errors
    /// * `Error::ContextMismatch` - If the buffer belongs to a context
    ///   outside this vertex array's share group.
    pub fn set_vertex_buffer(&mut self, buffer: &Buffer, layout: &VertexBufferLayout) -> Result<()> {
        let buffer_handle = buffer.raw.get()?;
        self.raw
            .context()
            .check_reference(buffer.context(), ObjectKind::Buffer)?;
        // Borrow only `raw` so `buffers` can be updated below.
        let context = self.raw.context();
        context.bind(BindingPoint::VertexArray, Some(self.raw.get()?))?;
        context.bind(BindingPoint::Buffer(BufferTarget::Array), Some(buffer_handle))?;

        let divisor = match layout.step_mode {
            VertexStepMode::Vertex => 0,
            VertexStepMode::Instance => 1,
        };
        let api = context.api();
        for attribute in layout.attributes.iter() {
            api.vertex_attrib(attribute, layout.stride, divisor);
            self.buffers.insert(attribute.location, buffer_handle);
        }
        Ok(())
    }

    /// Makes draws with this vertex array indexed, reading `format` indices
    /// from `buffer`.
    pub fn set_index_buffer(&mut self, buffer: &Buffer, format: IndexFormat) -> Result<()> {
        let buffer_handle = buffer.raw.get()?;
        self.raw
            .context()
            .check_reference(buffer.context(), ObjectKind::Buffer)?;
        let context = self.bind_self()?;
        context.bind(
            BindingPoint::Buffer(BufferTarget::ElementArray),
            Some(buffer_handle),
        )?;
        self.index = Some((buffer_handle, format));
        Ok(())
    }

    /// Makes this the current vertex array.
    pub fn bind(&self) -> Result<bool> {
        self.raw
            .context()
            .bind(BindingPoint::VertexArray, Some(self.raw.get()?))
    }

    /// The source buffer of each enabled attribute location.
    pub fn buffers(&self) -> &BTreeMap<u32, Handle> {
        &self.buffers
    }

    /// The buffer attribute `location` reads from.
    pub fn buffer_at(&self, location: u32) -> Option<Handle> {
        self.buffers.get(&location).copied()
    }

    /// Every distinct buffer the vertex array currently reads, index
    /// buffer included.
    pub fn referenced_buffers(&self) -> Vec<Handle> {
        let mut handles = self
            .buffers
            .values()
            .copied()
            .chain(self.index_buffer())
            .collect::<Vec<_>>();
        handles.sort_by_key(|handle| (handle.id(), handle.generation()));
        handles.dedup();
        handles
    }

    /// The index buffer, if draws are indexed.
    pub fn index_buffer(&self) -> Option<Handle> {
        self.index.map(|(handle, _)| handle)
    }

    /// The index format, if draws are indexed.
    pub fn index_format(&self) -> Option<IndexFormat> {
        self.index.map(|(_, format)| format)
    }

    /// Moves the native vertex array into a new wrapper and leaves this one
    /// empty.
    pub fn take(&mut self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.take()?,
            buffers: std::mem::take(&mut self.buffers),
            index: self.index.take(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BufferDescriptor, VertexFormat};
    use crate::testing::{GlCall, RecordingGl};
    use crate::ContextSettings;
    use std::rc::Rc;

    #[test]
    fn instance_buffers_advance_per_instance() {
        let gl = Rc::new(RecordingGl::new());
        let ctx = Context::new(gl.clone(), ContextSettings::default());
        let positions = Buffer::new(&ctx, &BufferDescriptor::vertex(48)).unwrap();
        let offsets = Buffer::new(&ctx, &BufferDescriptor::vertex(32)).unwrap();
        let mut vao = VertexArray::new(&ctx, Some("instanced")).unwrap();

        let mut per_instance = VertexBufferLayout::packed(1, &[VertexFormat::Float32x2]);
        per_instance.step_mode = VertexStepMode::Instance;
        vao.set_vertex_buffer(&positions, &VertexBufferLayout::packed(0, &[VertexFormat::Float32x3]))
            .unwrap();
        vao.set_vertex_buffer(&offsets, &per_instance).unwrap();

        assert_eq!(vao.buffer_at(0), Some(positions.handle().unwrap()));
        assert_eq!(vao.buffer_at(1), Some(offsets.handle().unwrap()));
        assert_eq!(vao.buffers().len(), 2);
        let divisors = gl
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                GlCall::VertexAttrib { divisor, .. } => Some(divisor),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(divisors, vec![0, 1]);
    }

    #[test]
    fn replaced_buffer_is_no_longer_referenced() {
        let gl = Rc::new(RecordingGl::new());
        let ctx = Context::new(gl, ContextSettings::default());
        let a = Buffer::new(&ctx, &BufferDescriptor::vertex(48)).unwrap();
        let b = Buffer::new(&ctx, &BufferDescriptor::vertex(48)).unwrap();
        let uvs = Buffer::new(&ctx, &BufferDescriptor::vertex(32)).unwrap();
        let mut vao = VertexArray::new(&ctx, None).unwrap();
        let layout = VertexBufferLayout::packed(0, &[VertexFormat::Float32x3]);

        vao.set_vertex_buffer(&a, &layout).unwrap();
        vao.set_vertex_buffer(&uvs, &VertexBufferLayout::packed(1, &[VertexFormat::Float32x2]))
            .unwrap();
        vao.set_vertex_buffer(&b, &layout).unwrap();

        let a = a.handle().unwrap();
        assert_eq!(vao.buffers().len(), 2);
        assert!(!vao.referenced_buffers().contains(&a));
        assert!(vao.referenced_buffers().contains(&b.handle().unwrap()));
    }

    #[test]
    fn buffer_from_unrelated_context_is_rejected() {
        let ctx = Context::new(Rc::new(RecordingGl::new()), ContextSettings::default());
        let other = Context::new(Rc::new(RecordingGl::new()), ContextSettings::default());
        let foreign = Buffer::new(&other, &BufferDescriptor::vertex(12)).unwrap();
        let mut vao = VertexArray::new(&ctx, None).unwrap();

        let err = vao
            .set_vertex_buffer(&foreign, &VertexBufferLayout::packed(0, &[VertexFormat::Float32x3]))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::ContextMismatch {
                kind: ObjectKind::Buffer
            }
        ));
        assert!(vao.buffers().is_empty());
    }

    #[test]
    fn index_buffer_is_bound_into_the_vertex_array() {
        let gl = Rc::new(RecordingGl::new());
        let ctx = Context::new(gl.clone(), ContextSettings::default());
        let indices = Buffer::new(&ctx, &BufferDescriptor::index(12)).unwrap();
        let mut vao = VertexArray::new(&ctx, None).unwrap();
        vao.set_index_buffer(&indices, IndexFormat::Uint16).unwrap();

        assert_eq!(vao.index_format(), Some(IndexFormat::Uint16));
        let vao_id = vao.raw.get().unwrap().id();
        assert_eq!(
            gl.native_element_buffer(vao_id),
            Some(indices.raw.get().unwrap().id())
        );
    }
}
