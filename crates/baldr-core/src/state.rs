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

//! Fixed-function state tracking with push/pop scoping.
//!
//! Each [`StateKey`] owns a base value plus a stack of pushed values; the
//! active value is the top of the stack, or the base when nothing is pushed.
//! Native state changes are only issued when the active value actually
//! changes, so balanced push/pop pairs around identical values cost nothing.

use crate::api::{BlendFactor, BlendOperation, CompareFunction, Face, FrontFace};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::traits::GlApi;
use std::collections::HashMap;

/// An integer rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Bottom edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Creates a rectangle.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle anchored at the origin.
    pub const fn from_size(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
}

/// Source and destination factors for color and alpha blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunc {
    /// Factor applied to the source color.
    pub src_color: BlendFactor,
    /// Factor applied to the destination color.
    pub dst_color: BlendFactor,
    /// Factor applied to the source alpha.
    pub src_alpha: BlendFactor,
    /// Factor applied to the destination alpha.
    pub dst_alpha: BlendFactor,
}

impl BlendFunc {
    /// Replaces the destination with the source.
    pub const REPLACE: Self = Self::new(BlendFactor::One, BlendFactor::Zero);
    /// Standard "over" compositing with non-premultiplied alpha.
    pub const ALPHA_BLENDING: Self =
        Self::new(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    /// Adds the source to the destination.
    pub const ADDITIVE: Self = Self::new(BlendFactor::One, BlendFactor::One);

    /// The same factors for color and alpha.
    pub const fn new(src: BlendFactor, dst: BlendFactor) -> Self {
        Self {
            src_color: src,
            dst_color: dst,
            src_alpha: src,
            dst_alpha: dst,
        }
    }
}

impl Default for BlendFunc {
    fn default() -> Self {
        Self::REPLACE
    }
}

/// Identifies one independently tracked piece of fixed-function state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum StateKey {
    Blend,
    BlendFunc,
    BlendEquation,
    DepthTest,
    DepthWrite,
    DepthFunc,
    CullFace,
    CullMode,
    FrontFace,
    ScissorTest,
    Scissor,
    Viewport,
    ColorMask,
    ClearColor,
    ClearDepth,
}

/// A value for one piece of fixed-function state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderState {
    /// Enables blending.
    Blend(bool),
    /// The blend factors.
    BlendFunc(BlendFunc),
    /// The blend equations.
    BlendEquation {
        /// Equation for the color channels.
        color: BlendOperation,
        /// Equation for the alpha channel.
        alpha: BlendOperation,
    },
    /// Enables depth testing.
    DepthTest(bool),
    /// Enables writes to the depth buffer.
    DepthWrite(bool),
    /// The depth comparison.
    DepthFunc(CompareFunction),
    /// Enables face culling.
    CullFace(bool),
    /// Which faces are culled.
    CullMode(Face),
    /// The front-facing winding.
    FrontFace(FrontFace),
    /// Enables the scissor test.
    ScissorTest(bool),
    /// The scissor box.
    Scissor(Rect),
    /// The viewport.
    Viewport(Rect),
    /// Per-channel color write mask (RGBA).
    ColorMask([bool; 4]),
    /// The color used by color clears.
    ClearColor([f32; 4]),
    /// The value used by depth clears.
    ClearDepth(f32),
}

impl RenderState {
    /// The key this value is tracked under.
    pub const fn key(&self) -> StateKey {
        match self {
            RenderState::Blend(_) => StateKey::Blend,
            RenderState::BlendFunc(_) => StateKey::BlendFunc,
            RenderState::BlendEquation { .. } => StateKey::BlendEquation,
            RenderState::DepthTest(_) => StateKey::DepthTest,
            RenderState::DepthWrite(_) => StateKey::DepthWrite,
            RenderState::DepthFunc(_) => StateKey::DepthFunc,
            RenderState::CullFace(_) => StateKey::CullFace,
            RenderState::CullMode(_) => StateKey::CullMode,
            RenderState::FrontFace(_) => StateKey::FrontFace,
            RenderState::ScissorTest(_) => StateKey::ScissorTest,
            RenderState::Scissor(_) => StateKey::Scissor,
            RenderState::Viewport(_) => StateKey::Viewport,
            RenderState::ColorMask(_) => StateKey::ColorMask,
            RenderState::ClearColor(_) => StateKey::ClearColor,
            RenderState::ClearDepth(_) => StateKey::ClearDepth,
        }
    }

    /// The values a freshly created context starts with.
    ///
    /// The viewport and scissor box default to the size of the default
    /// framebuffer, which only the host knows.
    pub fn defaults(viewport: Rect) -> [RenderState; 15] {
        [
            RenderState::Blend(false),
            RenderState::BlendFunc(BlendFunc::REPLACE),
            RenderState::BlendEquation {
                color: BlendOperation::Add,
                alpha: BlendOperation::Add,
            },
            RenderState::DepthTest(false),
            RenderState::DepthWrite(true),
            RenderState::DepthFunc(CompareFunction::Less),
            RenderState::CullFace(false),
            RenderState::CullMode(Face::Back),
            RenderState::FrontFace(FrontFace::Ccw),
            RenderState::ScissorTest(false),
            RenderState::Scissor(viewport),
            RenderState::Viewport(viewport),
            RenderState::ColorMask([true; 4]),
            RenderState::ClearColor([0.0; 4]),
            RenderState::ClearDepth(1.0),
        ]
    }
}

/// Counters of the state changes requested through a [`StateTracker`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateStats {
    /// State changes forwarded to the driver.
    pub issued: u64,
    /// State changes dropped because the value was already active.
    pub skipped: u64,
}

#[derive(Debug, Clone)]
struct StateEntry {
    base: RenderState,
    stack: Vec<RenderState>,
    // `false` once the host may have changed the native value.
    synced: bool,
}

impl StateEntry {
    fn active(&self) -> RenderState {
        self.stack.last().copied().unwrap_or(self.base)
    }
}

/// Per-context tracker of fixed-function state.
#[derive(Debug)]
pub struct StateTracker {
    entries: HashMap<StateKey, StateEntry>,
    stats: StateStats,
}

impl StateTracker {
    /// Creates a tracker holding the defaults of a fresh context.
    pub fn new(initial_viewport: Rect) -> Self {
        let entries = RenderState::defaults(initial_viewport)
            .into_iter()
            .map(|state| {
                (
                    state.key(),
                    StateEntry {
                        base: state,
                        stack: Vec::new(),
                        synced: true,
                    },
                )
            })
            .collect();
        Self {
            entries,
            stats: StateStats::default(),
        }
    }

    fn apply(
        stats: &mut StateStats,
        api: &dyn GlApi,
        entry: &mut StateEntry,
        previous: RenderState,
        next: RenderState,
    ) {
        if entry.synced && previous == next {
            stats.skipped += 1;
            return;
        }
        log::trace!("StateTracker: {previous:?} -> {next:?}");
        api.set_state(&next);
        entry.synced = true;
        stats.issued += 1;
    }

    fn unsynced(state: RenderState) -> StateEntry {
        StateEntry {
            base: state,
            stack: Vec::new(),
            synced: false,
        }
    }

    /// Makes `state` the active value of its key, remembering the previous
    /// one for [`StateTracker::pop`].
    ///
    /// The value is pushed in every case; the native change is only issued
    /// when it differs from the active value.
    pub fn push(&mut self, api: &dyn GlApi, state: RenderState) {
        let entry = self
            .entries
            .entry(state.key())
            .or_insert_with(|| Self::unsynced(state));
        let previous = entry.active();
        entry.stack.push(state);
        Self::apply(&mut self.stats, api, entry, previous, state);
    }

    /// Removes the most recently pushed value of `key` and restores the one
    /// below it.
    /// ## Returns
    /// The value that was popped.
    /// ## Errors
    /// * `Error::StateStackUnderflow` - If nothing is pushed for `key`.
    pub fn pop(&mut self, api: &dyn GlApi, key: StateKey) -> Result<RenderState> {
        let Some(entry) = self.entries.get_mut(&key) else {
            return Err(Error::StateStackUnderflow { key });
        };
        let Some(popped) = entry.stack.pop() else {
            return Err(Error::StateStackUnderflow { key });
        };
        let restored = entry.active();
        Self::apply(&mut self.stats, api, entry, popped, restored);
        Ok(popped)
    }

    /// Replaces the active value of the key without opening a new scope.
    ///
    /// Inside a pushed scope this rewrites the top of the stack, so the
    /// enclosing pop still restores the value from before the push.
    pub fn set(&mut self, api: &dyn GlApi, state: RenderState) {
        let entry = self
            .entries
            .entry(state.key())
            .or_insert_with(|| Self::unsynced(state));
        let previous = entry.active();
        match entry.stack.last_mut() {
            Some(top) => *top = state,
            None => entry.base = state,
        }
        Self::apply(&mut self.stats, api, entry, previous, state);
    }

    /// The active value of `key`.
    pub fn current(&self, key: StateKey) -> Option<RenderState> {
        self.entries.get(&key).map(StateEntry::active)
    }

    /// The number of values pushed for `key`.
    pub fn depth(&self, key: StateKey) -> usize {
        self.entries.get(&key).map_or(0, |entry| entry.stack.len())
    }

    /// Marks every native value as unknown; the next change of each key is
    /// issued even if it matches the tracked value.
    pub fn invalidate_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.synced = false;
        }
    }

    /// The state change counters accumulated so far.
    pub fn stats(&self) -> StateStats {
        self.stats
    }
}

/// Pops every state it pushed, in reverse order, when dropped.
///
/// Created by [`Context::scoped_state`]. The pops run on every exit path,
/// including early returns and unwinding.
#[must_use = "the pushed states are popped as soon as the scope is dropped"]
#[derive(Debug)]
pub struct StateScope<'a> {
    context: &'a Context,
    keys: Vec<StateKey>,
}

impl<'a> StateScope<'a> {
    pub(crate) fn new(context: &'a Context, states: impl IntoIterator<Item = RenderState>) -> Self {
        let mut scope = Self {
            context,
            keys: Vec::new(),
        };
        for state in states {
            scope.push(state);
        }
        scope
    }

    /// Pushes one more state, popped together with the others.
    pub fn push(&mut self, state: RenderState) {
        self.context.push_state(state);
        self.keys.push(state.key());
    }

    /// The number of states this scope will pop.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if this scope pushed nothing.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl Drop for StateScope<'_> {
    fn drop(&mut self) {
        while let Some(key) = self.keys.pop() {
            if let Err(err) = self.context.pop_state(key) {
                log::error!("StateScope: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GlCall, RecordingGl};

    fn state_calls(gl: &RecordingGl) -> usize {
        gl.count(|call| matches!(call, GlCall::SetState(_)))
    }

    #[test]
    fn push_of_active_value_is_free() {
        let gl = RecordingGl::new();
        let mut tracker = StateTracker::new(Rect::from_size(64, 64));

        tracker.push(&gl, RenderState::DepthWrite(true));
        tracker.pop(&gl, StateKey::DepthWrite).unwrap();
        assert_eq!(state_calls(&gl), 0);
        assert_eq!(tracker.stats().skipped, 2);
    }

    #[test]
    fn pop_restores_previous_value() {
        let gl = RecordingGl::new();
        let mut tracker = StateTracker::new(Rect::from_size(64, 64));

        tracker.push(&gl, RenderState::DepthTest(true));
        tracker.push(&gl, RenderState::DepthTest(true));
        assert_eq!(state_calls(&gl), 1);

        assert_eq!(tracker.pop(&gl, StateKey::DepthTest).unwrap(), RenderState::DepthTest(true));
        assert_eq!(state_calls(&gl), 1);
        tracker.pop(&gl, StateKey::DepthTest).unwrap();
        assert_eq!(state_calls(&gl), 2);
        assert_eq!(tracker.current(StateKey::DepthTest), Some(RenderState::DepthTest(false)));
    }

    #[test]
    fn pop_without_push_underflows() {
        let gl = RecordingGl::new();
        let mut tracker = StateTracker::new(Rect::default());

        let err = tracker.pop(&gl, StateKey::Blend).unwrap_err();
        assert_eq!(err, Error::StateStackUnderflow { key: StateKey::Blend });
        assert!(gl.calls().is_empty());
    }

    #[test]
    fn set_inside_scope_is_undone_by_pop() {
        let gl = RecordingGl::new();
        let mut tracker = StateTracker::new(Rect::default());

        tracker.push(&gl, RenderState::CullFace(true));
        tracker.set(&gl, RenderState::CullMode(Face::Front));
        tracker.push(&gl, RenderState::CullMode(Face::Back));
        tracker.set(&gl, RenderState::CullMode(Face::FrontAndBack));
        tracker.pop(&gl, StateKey::CullMode).unwrap();

        assert_eq!(tracker.current(StateKey::CullMode), Some(RenderState::CullMode(Face::Front)));
        assert_eq!(tracker.depth(StateKey::CullMode), 0);
        assert_eq!(tracker.depth(StateKey::CullFace), 1);
    }

    #[test]
    fn invalidated_state_is_reissued() {
        let gl = RecordingGl::new();
        let mut tracker = StateTracker::new(Rect::default());

        tracker.invalidate_all();
        tracker.push(&gl, RenderState::Blend(false));
        assert_eq!(state_calls(&gl), 1);
        // Synced again after the first change.
        tracker.push(&gl, RenderState::Blend(false));
        assert_eq!(state_calls(&gl), 1);
    }

    #[test]
    fn defaults_cover_every_key_once() {
        let defaults = RenderState::defaults(Rect::from_size(8, 8));
        let mut keys = defaults.iter().map(RenderState::key).collect::<Vec<_>>();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), defaults.len());
    }
}
