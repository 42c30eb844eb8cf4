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

//! The per-context owner of the binding cache, state tracker and handle
//! registry.

use crate::api::{ClearFlags, FramebufferTarget};
use crate::binding::{BindingCache, BindingPoint, BindingStats};
use crate::error::{CreationError, Error, Result};
use crate::handle::{Handle, HandleRegistry, NativeId, ObjectKind};
use crate::resource::{Framebuffer, Resource};
use crate::settings::ContextSettings;
use crate::state::{RenderState, StateKey, StateScope, StateStats, StateTracker};
use crate::traits::GlApi;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

struct ContextInner {
    settings: ContextSettings,
    api: Rc<dyn GlApi>,
    bindings: RefCell<BindingCache>,
    states: RefCell<StateTracker>,
    // Containers, shaders and programs.
    registry: RefCell<HandleRegistry>,
    group: Rc<ShareGroup>,
    draw_calls: Cell<u64>,
    compute_dispatches: Cell<u64>,
}

// The name space of buffers and textures, common to every context created
// with `Context::new_shared`.
#[derive(Default)]
struct ShareGroup {
    registry: RefCell<HandleRegistry>,
    members: RefCell<Vec<Weak<ContextInner>>>,
}

impl ShareGroup {
    fn join(&self, member: &Rc<ContextInner>) {
        let mut members = self.members.borrow_mut();
        members.retain(|weak| weak.strong_count() > 0);
        members.push(Rc::downgrade(member));
    }

    fn live_members(&self) -> Vec<Rc<ContextInner>> {
        self.members
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

/// A handle to one native graphics context and the bookkeeping attached to
/// it.
///
/// Cloning is cheap and yields another reference to the same context; every
/// resource keeps one so it can release itself on drop. A context is bound
/// to the thread its native context is current on, so it is neither `Send`
/// nor `Sync`. Two contexts never share caches: a second context starts out
/// knowing nothing.
///
/// Contexts created with [`Context::new_shared`] form a share group. Buffers
/// and textures created by one member may then be referenced by resources of
/// every other member; all other kinds stay private to their context.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("label", &self.inner.settings.label)
            .field("live_objects", &self.live_objects())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Wraps a native API whose context is current on this thread.
    pub fn new(api: Rc<dyn GlApi>, settings: ContextSettings) -> Self {
        Self::with_group(api, settings, Rc::new(ShareGroup::default()))
    }

    /// Wraps a native context that shares its buffer and texture names with
    /// `other`, such as one created with `other` as its share context.
    pub fn new_shared(api: Rc<dyn GlApi>, settings: ContextSettings, other: &Context) -> Self {
        log::info!(
            "Context '{}': Joining the share group of '{}'",
            settings.label,
            other.inner.settings.label
        );
        Self::with_group(api, settings, other.inner.group.clone())
    }

    fn with_group(api: Rc<dyn GlApi>, settings: ContextSettings, group: Rc<ShareGroup>) -> Self {
        log::info!(
            "Context '{}': Created with viewport {:?}",
            settings.label,
            settings.initial_viewport
        );
        let states = StateTracker::new(settings.initial_viewport);
        let inner = Rc::new(ContextInner {
            settings,
            api,
            bindings: RefCell::new(BindingCache::new()),
            states: RefCell::new(states),
            registry: RefCell::new(HandleRegistry::new()),
            group,
            draw_calls: Cell::new(0),
            compute_dispatches: Cell::new(0),
        });
        inner.group.join(&inner);
        Self { inner }
    }

    /// The settings this context was created with.
    pub fn settings(&self) -> &ContextSettings {
        &self.inner.settings
    }

    /// The native API behind this context.
    pub fn api(&self) -> &dyn GlApi {
        self.inner.api.as_ref()
    }

    /// Returns `true` if both values refer to the same context.
    pub fn same_context(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns `true` if both contexts belong to the same share group.
    /// Every context shares with itself.
    pub fn shares_with(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.inner.group, &other.inner.group)
    }

    /// Checks that an object of `kind` created by `owner` may be referenced
    /// by resources of this context.
    /// ## Errors
    /// * `Error::ContextMismatch` - If `owner` is another context and either
    ///   the kind is not shareable or the contexts are not in one share group.
    pub fn check_reference(&self, owner: &Context, kind: ObjectKind) -> Result<()> {
        if self.same_context(owner) || (kind.is_shareable() && self.shares_with(owner)) {
            Ok(())
        } else {
            Err(Error::ContextMismatch { kind })
        }
    }

    fn registry(&self, kind: ObjectKind) -> &RefCell<HandleRegistry> {
        if kind.is_shareable() {
            &self.inner.group.registry
        } else {
            &self.inner.registry
        }
    }

    // --- Handles ---

    /// Allocates a native object through `create` and registers its handle.
    pub(crate) fn allocate(
        &self,
        kind: ObjectKind,
        label: Option<&str>,
        create: impl FnOnce(&dyn GlApi) -> std::result::Result<NativeId, String>,
    ) -> Result<Handle> {
        let id = create(self.api()).map_err(|message| {
            log::error!(
                "Context '{}': Failed to allocate {kind}: {message}",
                self.inner.settings.label
            );
            CreationError::allocation(kind, label, message)
        })?;
        let handle = self.registry(kind).borrow_mut().issue(kind, id);
        log::debug!(
            "Context '{}': Created {handle} '{}'",
            self.inner.settings.label,
            label.unwrap_or("Unknown")
        );
        Ok(handle)
    }

    /// Deletes the native object behind `handle`, retires the handle and
    /// forgets every binding that records it, in every context of the share
    /// group for shareable kinds.
    ///
    /// Only the first release of a live handle reaches the driver.
    pub(crate) fn release(&self, handle: Handle, label: Option<&str>) {
        if !self.registry(handle.kind()).borrow_mut().retire(handle) {
            return;
        }
        self.api().delete_object(handle.kind(), handle.id());
        let forgotten = if handle.kind().is_shareable() {
            self.inner
                .group
                .live_members()
                .iter()
                .map(|member| member.bindings.borrow_mut().invalidate_handle(handle))
                .sum()
        } else {
            self.inner.bindings.borrow_mut().invalidate_handle(handle)
        };
        log::debug!(
            "Context '{}': Destroyed {handle} '{}' ({forgotten} bindings forgotten)",
            self.inner.settings.label,
            label.unwrap_or("Unknown")
        );
    }

    /// Returns `true` if `handle` names an object this context, or for
    /// buffers and textures any context of its share group, created and has
    /// not destroyed yet.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.registry(handle.kind()).borrow().is_live(handle)
    }

    /// The number of objects currently alive in this context, counting the
    /// buffers and textures of the whole share group.
    pub fn live_objects(&self) -> usize {
        self.inner.registry.borrow().live_count() + self.inner.group.registry.borrow().live_count()
    }

    // --- Bindings ---

    /// Binds `handle` at `point` unless it is already bound there.
    /// ## Returns
    /// `true` if a native bind was issued.
    pub fn bind(&self, point: BindingPoint, handle: Option<Handle>) -> Result<bool> {
        self.inner
            .bindings
            .borrow_mut()
            .bind(self.api(), point, handle)
    }

    /// Binds nothing at `point` unless nothing is already bound there.
    pub fn unbind(&self, point: BindingPoint) -> Result<bool> {
        self.inner.bindings.borrow_mut().unbind(self.api(), point)
    }

    /// What the cache believes is bound at `point`, or `None` if unknown.
    pub fn bound(&self, point: BindingPoint) -> Option<Option<Handle>> {
        self.inner.bindings.borrow().cached(point)
    }

    /// The bind counters of this context.
    pub fn binding_stats(&self) -> BindingStats {
        self.inner.bindings.borrow().stats()
    }

    /// Makes `unit` the active texture unit.
    pub fn select_texture_unit(&self, unit: u32) {
        self.inner
            .bindings
            .borrow_mut()
            .select_unit(self.api(), unit);
    }

    /// Forgets every cached binding and marks every tracked state as
    /// unknown.
    ///
    /// Call this after foreign code issued binds or state changes directly
    /// on the native context.
    pub fn invalidate_all(&self) {
        log::debug!("Context '{}': Invalidating caches", self.inner.settings.label);
        self.inner.bindings.borrow_mut().invalidate_all();
        self.inner.states.borrow_mut().invalidate_all();
    }

    // --- State ---

    /// Pushes `state` onto its key's stack, see [`StateTracker::push`].
    pub fn push_state(&self, state: RenderState) {
        self.inner.states.borrow_mut().push(self.api(), state);
    }

    /// Pops the top of `key`'s stack, see [`StateTracker::pop`].
    pub fn pop_state(&self, key: StateKey) -> Result<RenderState> {
        self.inner.states.borrow_mut().pop(self.api(), key)
    }

    /// Replaces the active value of a key, see [`StateTracker::set`].
    pub fn set_state(&self, state: RenderState) {
        self.inner.states.borrow_mut().set(self.api(), state);
    }

    /// The active value of `key`.
    pub fn current_state(&self, key: StateKey) -> Option<RenderState> {
        self.inner.states.borrow().current(key)
    }

    /// The number of values pushed for `key`.
    pub fn state_depth(&self, key: StateKey) -> usize {
        self.inner.states.borrow().depth(key)
    }

    /// The state change counters of this context.
    pub fn state_stats(&self) -> StateStats {
        self.inner.states.borrow().stats()
    }

    /// Pushes every state in `states` and returns a guard that pops them, in
    /// reverse order, when it goes out of scope.
    pub fn scoped_state(&self, states: impl IntoIterator<Item = RenderState>) -> StateScope<'_> {
        StateScope::new(self, states)
    }

    /// Runs `f` with `states` pushed, popping them afterwards on every exit
    /// path.
    pub fn with_state<R>(
        &self,
        states: impl IntoIterator<Item = RenderState>,
        f: impl FnOnce(&Context) -> R,
    ) -> R {
        let _scope = self.scoped_state(states);
        f(self)
    }

    // --- Clears ---

    /// Clears the color buffers of `framebuffer` (the default framebuffer
    /// for `None`) to `rgba`, regardless of the current color mask and
    /// scissor state.
    pub fn clear_color(&self, framebuffer: Option<&Framebuffer>, rgba: [f32; 4]) -> Result<()> {
        self.clear_with(
            framebuffer,
            [
                RenderState::ClearColor(rgba),
                RenderState::ColorMask([true; 4]),
                RenderState::ScissorTest(false),
            ],
            ClearFlags::COLOR,
        )
    }

    /// Clears the single color draw buffer `draw_buffer` of `framebuffer`
    /// (the default framebuffer for `None`) to `rgba`, regardless of the
    /// current color mask and scissor state.
    pub fn clear_color_buffer(
        &self,
        framebuffer: Option<&Framebuffer>,
        draw_buffer: u32,
        rgba: [f32; 4],
    ) -> Result<()> {
        let target = framebuffer.map(|fb| fb.handle()).transpose()?;
        self.bind(BindingPoint::Framebuffer(FramebufferTarget::Draw), target)?;
        let _scope = self.scoped_state([
            RenderState::ColorMask([true; 4]),
            RenderState::ScissorTest(false),
        ]);
        self.api().clear_buffer_color(draw_buffer, rgba);
        Ok(())
    }

    /// Clears the depth buffer of `framebuffer` (the default framebuffer for
    /// `None`) to `depth`, regardless of the current depth write and scissor
    /// state.
    pub fn clear_depth(&self, framebuffer: Option<&Framebuffer>, depth: f32) -> Result<()> {
        self.clear_with(
            framebuffer,
            [
                RenderState::ClearDepth(depth),
                RenderState::DepthWrite(true),
                RenderState::ScissorTest(false),
            ],
            ClearFlags::DEPTH,
        )
    }

    fn clear_with(
        &self,
        framebuffer: Option<&Framebuffer>,
        states: impl IntoIterator<Item = RenderState>,
        flags: ClearFlags,
    ) -> Result<()> {
        let target = framebuffer.map(|fb| fb.handle()).transpose()?;
        self.bind(BindingPoint::Framebuffer(FramebufferTarget::Draw), target)?;
        let _scope = self.scoped_state(states);
        self.api().clear(flags);
        Ok(())
    }

    // --- Draws ---

    /// The number of draw calls issued through this context.
    pub fn draw_calls(&self) -> u64 {
        self.inner.draw_calls.get()
    }

    pub(crate) fn count_draw(&self) {
        self.inner.draw_calls.set(self.inner.draw_calls.get() + 1);
    }

    /// The number of compute dispatches issued through this context.
    pub fn compute_dispatches(&self) -> u64 {
        self.inner.compute_dispatches.get()
    }

    pub(crate) fn count_compute(&self) {
        self.inner
            .compute_dispatches
            .set(self.inner.compute_dispatches.get() + 1);
    }
}
