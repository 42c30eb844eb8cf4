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

//! Non-owning references to native GPU objects.
//!
//! A [`Handle`] names a native object by its kind, the integer the driver
//! handed out, and a generation. Drivers recycle integer names aggressively,
//! so two handles with the same numeric id are only equal when they were
//! issued for the same lifetime of that id. The [`HandleRegistry`] owns the
//! generation bookkeeping for one context.

use std::collections::HashMap;
use std::fmt;

/// The integer name the driver assigns to an object (`GLuint`).
pub type NativeId = u32;

/// The kind of native object a [`Handle`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// A buffer object (vertex, index, uniform, staging...).
    Buffer,
    /// A texture object.
    Texture,
    /// A single compiled shader stage.
    Shader,
    /// A linked shader program.
    Program,
    /// A framebuffer object.
    Framebuffer,
    /// A vertex array object.
    VertexArray,
}

impl ObjectKind {
    /// Returns `true` if the native API lets this kind of object be shared
    /// between contexts of the same share group.
    ///
    /// Container objects (framebuffers, vertex arrays) never are. Programs and
    /// shaders technically are, but the wrapper only supports sharing data
    /// objects.
    pub const fn is_shareable(&self) -> bool {
        matches!(self, ObjectKind::Buffer | ObjectKind::Texture)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Buffer => "buffer",
            ObjectKind::Texture => "texture",
            ObjectKind::Shader => "shader",
            ObjectKind::Program => "program",
            ObjectKind::Framebuffer => "framebuffer",
            ObjectKind::VertexArray => "vertex array",
        };
        f.write_str(name)
    }
}

/// An opaque, copyable reference to a native GPU object.
///
/// Handles carry no ownership. They are produced by the owning resource
/// wrappers and compared by the binding cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    kind: ObjectKind,
    id: NativeId,
    generation: u32,
}

impl Handle {
    /// Builds a handle from its raw parts.
    ///
    /// Handles built this way are not known to any registry; they are mostly
    /// useful for tests and for diagnostics.
    pub const fn from_raw_parts(kind: ObjectKind, id: NativeId, generation: u32) -> Self {
        Self {
            kind,
            id,
            generation,
        }
    }

    /// The kind of object this handle refers to.
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// The driver-assigned integer name.
    pub const fn id(&self) -> NativeId {
        self.id
    }

    /// The lifetime of `id` this handle was issued for.
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} (gen {})", self.kind, self.id, self.generation)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    live: bool,
}

/// Per-context bookkeeping of which native ids are alive, and for which
/// generation.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    slots: HashMap<(ObjectKind, NativeId), Slot>,
    live_count: usize,
}

impl HandleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that the driver just handed out `id` for an object of `kind`
    /// and returns a handle for the current generation of that id.
    pub fn issue(&mut self, kind: ObjectKind, id: NativeId) -> Handle {
        let slot = self.slots.entry((kind, id)).or_default();
        if slot.live {
            // The driver never reissues a live name; the previous owner must
            // have been deleted behind our back. Close that lifetime first.
            log::warn!("HandleRegistry: {kind} #{id} reissued while still live");
            slot.generation = slot.generation.wrapping_add(1);
        } else {
            self.live_count += 1;
        }
        slot.live = true;
        Handle::from_raw_parts(kind, id, slot.generation)
    }

    /// Ends the lifetime of `handle`.
    ///
    /// Returns `true` the first time a live handle is retired and `false` for
    /// every later call or for handles of an older generation.
    pub fn retire(&mut self, handle: Handle) -> bool {
        match self.slots.get_mut(&(handle.kind, handle.id)) {
            Some(slot) if slot.live && slot.generation == handle.generation => {
                slot.live = false;
                slot.generation = slot.generation.wrapping_add(1);
                self.live_count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `handle` refers to the current lifetime of a live id.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.slots
            .get(&(handle.kind, handle.id))
            .is_some_and(|slot| slot.live && slot.generation == handle.generation)
    }

    /// The number of handles currently alive.
    pub fn live_count(&self) -> usize {
        self.live_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_handle_is_live_until_retired() {
        let mut registry = HandleRegistry::new();
        let handle = registry.issue(ObjectKind::Buffer, 3);

        assert!(registry.is_live(handle));
        assert_eq!(registry.live_count(), 1);
        assert!(registry.retire(handle));
        assert!(!registry.is_live(handle));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn retire_is_idempotent() {
        let mut registry = HandleRegistry::new();
        let handle = registry.issue(ObjectKind::Texture, 1);

        assert!(registry.retire(handle));
        assert!(!registry.retire(handle));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn recycled_id_gets_new_generation() {
        let mut registry = HandleRegistry::new();
        let first = registry.issue(ObjectKind::Buffer, 7);
        registry.retire(first);
        let second = registry.issue(ObjectKind::Buffer, 7);

        assert_eq!(first.id(), second.id());
        assert_ne!(first, second);
        assert!(!registry.is_live(first));
        assert!(registry.is_live(second));
        // Retiring the stale handle must not end the new lifetime.
        assert!(!registry.retire(first));
        assert!(registry.is_live(second));
    }

    #[test]
    fn same_id_different_kind_is_independent() {
        let mut registry = HandleRegistry::new();
        let buffer = registry.issue(ObjectKind::Buffer, 1);
        let texture = registry.issue(ObjectKind::Texture, 1);

        registry.retire(buffer);
        assert!(registry.is_live(texture));
    }

    #[test]
    fn unknown_handle_is_not_live() {
        let registry = HandleRegistry::new();
        let handle = Handle::from_raw_parts(ObjectKind::Program, 9, 0);
        assert!(!registry.is_live(handle));
    }

    #[test]
    fn only_data_objects_are_shareable() {
        assert!(ObjectKind::Buffer.is_shareable());
        assert!(ObjectKind::Texture.is_shareable());
        assert!(!ObjectKind::Framebuffer.is_shareable());
        assert!(!ObjectKind::VertexArray.is_shareable());
    }
}
