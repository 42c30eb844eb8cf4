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

use super::OwnedHandle;
use crate::api::{BufferDescriptor, BufferTarget, BufferUsage, MapAccess};
use crate::binding::BindingPoint;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handle::ObjectKind;
use bytemuck::Pod;

// Uploads go through the copy-write target: the element array binding is
// owned by whichever vertex array is bound and must not be disturbed.
const UPLOAD: BindingPoint = BindingPoint::Buffer(BufferTarget::CopyWrite);
const READ: BindingPoint = BindingPoint::Buffer(BufferTarget::CopyRead);

/// An owned GPU buffer of fixed size.
#[derive(Debug)]
pub struct Buffer {
    pub(crate) raw: OwnedHandle,
    size: usize,
    usage: BufferUsage,
    target: BufferTarget,
}

impl Buffer {
    /// Creates a buffer with uninitialized contents.
    pub fn new(context: &Context, descriptor: &BufferDescriptor) -> Result<Self> {
        Self::create(context, descriptor, None)
    }

    /// Creates a buffer whose first bytes are `data`.
    /// ## Errors
    /// * `Error::OutOfBounds` - If `data` is longer than `descriptor.size`.
    pub fn with_data(context: &Context, descriptor: &BufferDescriptor, data: &[u8]) -> Result<Self> {
        if data.len() > descriptor.size {
            return Err(Error::OutOfBounds {
                offset: 0,
                len: data.len(),
                size: descriptor.size,
            });
        }
        Self::create(context, descriptor, Some(data))
    }

    /// Creates a buffer sized to hold exactly `values`.
    pub fn from_pod<T: Pod>(
        context: &Context,
        label: Option<&str>,
        target: BufferTarget,
        values: &[T],
    ) -> Result<Self> {
        let data: &[u8] = bytemuck::cast_slice(values);
        let mut descriptor = BufferDescriptor::vertex(data.len());
        descriptor.target = target;
        if let Some(label) = label {
            descriptor = descriptor.with_label(label);
        }
        Self::create(context, &descriptor, Some(data))
    }

    fn create(context: &Context, descriptor: &BufferDescriptor, data: Option<&[u8]>) -> Result<Self> {
        let raw = OwnedHandle::allocate(
            context,
            ObjectKind::Buffer,
            descriptor.label.as_deref(),
            |api| api.create_buffer(),
        )?;
        let buffer = Self {
            raw,
            size: descriptor.size,
            usage: descriptor.usage,
            target: descriptor.target,
        };

        context.bind(UPLOAD, Some(buffer.raw.get()?))?;
        let api = context.api();
        match data {
            Some(data) if data.len() == buffer.size => {
                api.buffer_data(BufferTarget::CopyWrite, buffer.size, Some(data), buffer.usage);
            }
            Some(data) => {
                api.buffer_data(BufferTarget::CopyWrite, buffer.size, None, buffer.usage);
                api.buffer_sub_data(BufferTarget::CopyWrite, 0, data);
            }
            None => api.buffer_data(BufferTarget::CopyWrite, buffer.size, None, buffer.usage),
        }
        Ok(buffer)
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<()> {
        let fits = offset.checked_add(len).is_some_and(|end| end <= self.size);
        if fits {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                offset,
                len,
                size: self.size,
            })
        }
    }

    /// Overwrites `data.len()` bytes starting at `offset`.
    /// ## Errors
    /// * `Error::OutOfBounds` - If the range does not fit in the buffer.
    /// * `Error::UseAfterMove` - If the buffer was moved out or destroyed.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<()> {
        let handle = self.raw.get()?;
        self.check_range(offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }
        let context = self.raw.context();
        context.bind(UPLOAD, Some(handle))?;
        context
            .api()
            .buffer_sub_data(BufferTarget::CopyWrite, offset, data);
        Ok(())
    }

    /// Overwrites part of the buffer with plain-old-data values.
    pub fn write_pod<T: Pod>(&self, offset: usize, values: &[T]) -> Result<()> {
        self.write(offset, bytemuck::cast_slice(values))
    }

    /// Sets every byte of the buffer to zero.
    pub fn clear(&self) -> Result<()> {
        self.write(0, &vec![0; self.size])
    }

    /// Copies `out.len()` bytes starting at `offset` into `out`.
    /// ## Errors
    /// * `Error::OutOfBounds` - If the range does not fit in the buffer.
    /// * `Error::UseAfterMove` - If the buffer was moved out or destroyed.
    pub fn read_into(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        let handle = self.raw.get()?;
        self.check_range(offset, out.len())?;
        if out.is_empty() {
            return Ok(());
        }
        let context = self.raw.context();
        context.bind(READ, Some(handle))?;
        context
            .api()
            .get_buffer_sub_data(BufferTarget::CopyRead, offset, out);
        Ok(())
    }

    /// Reads the whole buffer back.
    pub fn read(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![0; self.size];
        self.read_into(0, &mut bytes)?;
        Ok(bytes)
    }

    /// Reads the whole buffer back as plain-old-data values.
    /// ## Errors
    /// * `Error::DataSizeMismatch` - If the size is not a multiple of `T`.
    pub fn read_pod<T: Pod>(&self) -> Result<Vec<T>> {
        let element = std::mem::size_of::<T>().max(1);
        if self.size % element != 0 {
            return Err(Error::DataSizeMismatch {
                expected: self.size - self.size % element,
                actual: self.size,
            });
        }
        let mut values = vec![<T as bytemuck::Zeroable>::zeroed(); self.size / element];
        self.read_into(0, bytemuck::cast_slice_mut(&mut values))?;
        Ok(values)
    }

    /// Maps `len` bytes at `offset` into client memory for the duration of
    /// `f`.
    ///
    /// With [`MapAccess::Write`] the slice starts with unspecified contents;
    /// with [`MapAccess::Read`] changes to it are discarded.
    /// ## Errors
    /// * `Error::OutOfBounds` - If the range does not fit in the buffer.
    /// * `Error::MapFailed` - If the driver refused the mapping or lost the
    ///   contents before the unmap.
    pub fn map_range<R>(
        &self,
        offset: usize,
        len: usize,
        access: MapAccess,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R> {
        let handle = self.raw.get()?;
        self.check_range(offset, len)?;
        let (point, target) = if access.writes() {
            (UPLOAD, BufferTarget::CopyWrite)
        } else {
            (READ, BufferTarget::CopyRead)
        };
        let context = self.raw.context();
        context.bind(point, Some(handle))?;

        let mut f = Some(f);
        let mut result = None;
        context
            .api()
            .map_buffer(target, offset, len, access, &mut |bytes| {
                if let Some(f) = f.take() {
                    result = Some(f(bytes));
                }
            })
            .map_err(|message| {
                log::warn!(
                    "Buffer: Mapping {len} bytes of '{}' failed: {message}",
                    self.raw.label().unwrap_or("Unknown")
                );
                Error::MapFailed(message)
            })?;
        result.ok_or_else(|| Error::MapFailed("the mapping was never handed out".to_owned()))
    }

    /// Maps the whole buffer for reading.
    pub fn map_read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        self.map_range(0, self.size, MapAccess::Read, |bytes| f(bytes))
    }

    /// Maps the whole buffer for reading and writing.
    pub fn map_write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        self.map_range(0, self.size, MapAccess::ReadWrite, f)
    }

    /// Binds the buffer to its descriptor's target.
    pub fn bind(&self) -> Result<bool> {
        self.raw
            .context()
            .bind(BindingPoint::Buffer(self.target), Some(self.raw.get()?))
    }

    /// Binds the buffer to the indexed uniform buffer binding point `index`.
    pub fn bind_base(&self, index: u32) -> Result<bool> {
        self.raw
            .context()
            .bind(BindingPoint::UniformBufferSlot(index), Some(self.raw.get()?))
    }

    /// Binds the buffer to the indexed atomic counter binding point `index`.
    pub fn bind_atomic_counter(&self, index: u32) -> Result<bool> {
        self.raw
            .context()
            .bind(BindingPoint::AtomicCounterSlot(index), Some(self.raw.get()?))
    }

    /// Binds the buffer to the indexed shader storage binding point `index`.
    pub fn bind_storage(&self, index: u32) -> Result<bool> {
        self.raw
            .context()
            .bind(BindingPoint::StorageBufferSlot(index), Some(self.raw.get()?))
    }

    /// Moves the native buffer into a new wrapper and leaves this one empty.
    pub fn take(&mut self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.take()?,
            size: self.size,
            usage: self.usage,
            target: self.target,
        })
    }

    /// The size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The usage hint.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// The target [`Buffer::bind`] binds to.
    pub fn target(&self) -> BufferTarget {
        self.target
    }
}
