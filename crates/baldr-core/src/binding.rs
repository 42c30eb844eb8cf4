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

//! Redundant-bind elimination.
//!
//! The [`BindingCache`] remembers, per [`BindingPoint`], which object the
//! wrapper last bound there. A bind of the same handle is dropped without
//! touching the driver. The invariant "cached equals native" holds as long as
//! every bind routes through the cache; hosts that bind behind the wrapper's
//! back must call [`BindingCache::invalidate_all`].

use crate::api::{BufferTarget, FramebufferTarget, TextureTarget};
use crate::error::{Error, Result};
use crate::handle::{Handle, ObjectKind};
use crate::traits::GlApi;
use std::collections::HashMap;

/// A named slot at which exactly one object of one kind is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingPoint {
    /// A generic buffer target.
    Buffer(BufferTarget),
    /// An indexed uniform buffer binding point.
    UniformBufferSlot(u32),
    /// An indexed atomic counter buffer binding point.
    AtomicCounterSlot(u32),
    /// An indexed shader storage buffer binding point.
    StorageBufferSlot(u32),
    /// A texture target on a given texture unit.
    Texture {
        /// The texture unit.
        unit: u32,
        /// The texture target on that unit.
        target: TextureTarget,
    },
    /// The current program.
    Program,
    /// The current vertex array.
    VertexArray,
    /// A framebuffer target.
    Framebuffer(FramebufferTarget),
}

impl BindingPoint {
    /// The kind of object this point accepts.
    pub const fn kind(&self) -> ObjectKind {
        match self {
            BindingPoint::Buffer(_)
            | BindingPoint::UniformBufferSlot(_)
            | BindingPoint::AtomicCounterSlot(_)
            | BindingPoint::StorageBufferSlot(_) => ObjectKind::Buffer,
            BindingPoint::Texture { .. } => ObjectKind::Texture,
            BindingPoint::Program => ObjectKind::Program,
            BindingPoint::VertexArray => ObjectKind::VertexArray,
            BindingPoint::Framebuffer(_) => ObjectKind::Framebuffer,
        }
    }

    /// For indexed buffer points, the generic target they also bind to.
    pub const fn indexed_target(&self) -> Option<BufferTarget> {
        match self {
            BindingPoint::UniformBufferSlot(_) => Some(BufferTarget::Uniform),
            BindingPoint::AtomicCounterSlot(_) => Some(BufferTarget::AtomicCounter),
            BindingPoint::StorageBufferSlot(_) => Some(BufferTarget::ShaderStorage),
            _ => None,
        }
    }
}

/// Counters of the binds requested through a [`BindingCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingStats {
    /// Binds forwarded to the driver.
    pub issued: u64,
    /// Binds dropped because the handle was already bound.
    pub skipped: u64,
}

impl BindingStats {
    /// The fraction of requested binds that were skipped, in `[0, 1]`.
    pub fn hit_rate(&self) -> f64 {
        let total = self.issued + self.skipped;
        if total == 0 {
            0.0
        } else {
            self.skipped as f64 / total as f64
        }
    }
}

/// Per-context record of the last object bound at each binding point.
#[derive(Debug, Default)]
pub struct BindingCache {
    // A missing key means the cache does not know what is bound.
    entries: HashMap<BindingPoint, Option<Handle>>,
    active_unit: Option<u32>,
    stats: BindingStats,
}

impl BindingCache {
    /// Creates an empty cache. Every point starts unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handle` (or nothing, for `None`) at `point`.
    ///
    /// Issues exactly one native bind when `handle` differs from the cached
    /// entry, and none otherwise. Texture points first make their unit the
    /// active one.
    ///
    /// ## Returns
    /// `true` if a native bind was issued.
    /// ## Errors
    /// * `Error::KindMismatch` - If the point does not accept the handle's kind.
    /// * `Error::Desynchronized` - With the `verbose` feature, if a skipped
    ///   bind disagrees with the driver's reported binding.
    pub fn bind(
        &mut self,
        api: &dyn GlApi,
        point: BindingPoint,
        handle: Option<Handle>,
    ) -> Result<bool> {
        if let Some(handle) = handle {
            if handle.kind() != point.kind() {
                return Err(Error::KindMismatch {
                    point,
                    kind: handle.kind(),
                });
            }
        }

        if let BindingPoint::Texture { unit, .. } = point {
            self.select_unit(api, unit);
        }

        if self.entries.get(&point) == Some(&handle) {
            self.stats.skipped += 1;
            log::trace!("BindingCache: Skipped redundant bind at {point:?}");
            #[cfg(feature = "verbose")]
            self.verify(api, point, handle)?;
            return Ok(false);
        }

        api.bind(point, handle.map(|h| h.id()));
        self.stats.issued += 1;
        self.entries.insert(point, handle);

        if point == BindingPoint::VertexArray {
            self.entries
                .remove(&BindingPoint::Buffer(BufferTarget::ElementArray));
        }
        // Indexed binds also replace the generic binding of their target.
        if let Some(target) = point.indexed_target() {
            self.entries.insert(BindingPoint::Buffer(target), handle);
        }
        Ok(true)
    }

    /// Binds nothing at `point`, through the same path as [`BindingCache::bind`].
    pub fn unbind(&mut self, api: &dyn GlApi, point: BindingPoint) -> Result<bool> {
        self.bind(api, point, None)
    }

    /// Makes `unit` the active texture unit, unless it already is.
    pub fn select_unit(&mut self, api: &dyn GlApi, unit: u32) {
        if self.active_unit != Some(unit) {
            api.active_texture(unit);
            self.active_unit = Some(unit);
        }
    }

    /// The cached entry at `point`: `None` if unknown, `Some(None)` if
    /// nothing is bound.
    pub fn cached(&self, point: BindingPoint) -> Option<Option<Handle>> {
        self.entries.get(&point).copied()
    }

    /// Forgets what is bound at `point`.
    pub fn invalidate(&mut self, point: BindingPoint) {
        self.entries.remove(&point);
        if point == BindingPoint::VertexArray {
            self.entries
                .remove(&BindingPoint::Buffer(BufferTarget::ElementArray));
        }
    }

    /// Forgets every entry that records `handle`.
    ///
    /// Called when the object is deleted: the driver may hand its id out
    /// again, and a later bind of the new object must reach the driver.
    /// ## Returns
    /// The number of entries removed.
    pub fn invalidate_handle(&mut self, handle: Handle) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, bound| *bound != Some(handle));
        let removed = before - self.entries.len();
        if removed > 0 && handle.kind() == ObjectKind::VertexArray {
            self.entries
                .remove(&BindingPoint::Buffer(BufferTarget::ElementArray));
        }
        removed
    }

    /// Forgets everything, including the active texture unit.
    pub fn invalidate_all(&mut self) {
        log::debug!("BindingCache: Invalidated {} entries", self.entries.len());
        self.entries.clear();
        self.active_unit = None;
    }

    /// The bind counters accumulated so far.
    pub fn stats(&self) -> BindingStats {
        self.stats
    }

    /// Resets the bind counters.
    pub fn reset_stats(&mut self) {
        self.stats = BindingStats::default();
    }

    // On a mismatch the entry is dropped, so the next bind reaches the driver.
    #[cfg(feature = "verbose")]
    fn verify(&mut self, api: &dyn GlApi, point: BindingPoint, handle: Option<Handle>) -> Result<()> {
        let cached = handle.map(|h| h.id());
        let native = api.bound_object(point);
        if cached != native {
            log::error!(
                "BindingCache: {point:?} cached {cached:?} but the driver reports {native:?}"
            );
            self.entries.remove(&point);
            return Err(Error::Desynchronized {
                point,
                cached,
                native,
            });
        }
        Ok(())
    }
}
