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

//! Owning wrappers around native GPU objects.
//!
//! Each wrapper owns exactly one native object and deletes it when dropped.
//! Wrappers are move-only. [`Resource::destroy`] releases the object early,
//! and each wrapper's `take()` moves the object into a new wrapper; in both
//! cases every later operation on the emptied wrapper fails with
//! [`Error::UseAfterMove`](crate::Error::UseAfterMove).

mod buffer;
mod framebuffer;
mod program;
mod shader;
mod texture;
mod vertex_array;

pub use self::buffer::Buffer;
pub use self::framebuffer::{AttachedImage, Framebuffer};
pub use self::program::Program;
pub use self::shader::Shader;
pub use self::texture::Texture;
pub use self::vertex_array::VertexArray;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::handle::{Handle, ObjectKind};

/// Common operations of every owning wrapper.
pub trait Resource {
    /// The handle of the owned object.
    /// ## Errors
    /// * `Error::UseAfterMove` - If the wrapper was emptied.
    fn handle(&self) -> Result<Handle>;

    /// The debug label given at creation.
    fn label(&self) -> Option<&str>;

    /// The context that owns the object.
    fn context(&self) -> &Context;

    /// Returns `true` if the wrapper still owns a live object.
    fn is_live(&self) -> bool;

    /// Deletes the native object now instead of on drop.
    ///
    /// Idempotent: calling it again, or dropping afterwards, does nothing.
    fn destroy(&mut self);
}

/// The ownership core shared by every wrapper: one handle, the context that
/// issued it and the label used in diagnostics.
#[derive(Debug)]
pub(crate) struct OwnedHandle {
    context: Context,
    kind: ObjectKind,
    handle: Option<Handle>,
    label: Option<String>,
}

impl OwnedHandle {
    /// Allocates a native object through `create` and takes ownership of it.
    pub(crate) fn allocate(
        context: &Context,
        kind: ObjectKind,
        label: Option<&str>,
        create: impl FnOnce(&dyn crate::GlApi) -> std::result::Result<u32, String>,
    ) -> Result<Self> {
        let handle = context.allocate(kind, label, create)?;
        Ok(Self {
            context: context.clone(),
            kind,
            handle: Some(handle),
            label: label.map(str::to_owned),
        })
    }

    pub(crate) fn get(&self) -> Result<Handle> {
        self.handle.ok_or(Error::UseAfterMove { kind: self.kind })
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }

    pub(crate) fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn is_live(&self) -> bool {
        self.handle
            .is_some_and(|handle| self.context.is_live(handle))
    }

    /// Moves ownership into a new value, leaving this one empty.
    pub(crate) fn take(&mut self) -> Result<Self> {
        let handle = self.get()?;
        self.handle = None;
        Ok(Self {
            context: self.context.clone(),
            kind: self.kind,
            handle: Some(handle),
            label: self.label.clone(),
        })
    }

    pub(crate) fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.context.release(handle, self.label.as_deref());
        }
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        self.release();
    }
}

// Every wrapper stores its `OwnedHandle` in a field named `raw`.
macro_rules! impl_resource {
    ($($resource:ty),* $(,)?) => {
        $(
            impl Resource for $resource {
                fn handle(&self) -> Result<Handle> {
                    self.raw.get()
                }

                fn label(&self) -> Option<&str> {
                    self.raw.label()
                }

                fn context(&self) -> &Context {
                    self.raw.context()
                }

                fn is_live(&self) -> bool {
                    self.raw.is_live()
                }

                fn destroy(&mut self) {
                    self.raw.release();
                }
            }
        )*
    };
}

impl_resource!(Buffer, Texture, Shader, Program, Framebuffer, VertexArray);
