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

//! Integration tests for the render state stack and its scope guards.

use anyhow::Result;
use baldr_core::{
    api::{ClearFlags, CompareFunction},
    testing::{GlCall, RecordingGl},
    BlendFunc, Context, ContextSettings, Error, Rect, RenderState, StateKey,
};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

fn context() -> (Rc<RecordingGl>, Context) {
    let viewport = Rect::from_size(800, 600);
    let gl = Rc::new(RecordingGl::with_viewport(viewport));
    let context = Context::new(gl.clone(), ContextSettings::with_viewport(800, 600));
    (gl, context)
}

fn state_calls(gl: &RecordingGl) -> usize {
    gl.count(|call| matches!(call, GlCall::SetState(_)))
}

#[test]
fn test_nested_pushes_restore_in_order() -> Result<()> {
    let (gl, context) = context();

    context.push_state(RenderState::DepthFunc(CompareFunction::LessEqual));
    context.push_state(RenderState::DepthFunc(CompareFunction::Always));
    assert_eq!(
        gl.native_state(StateKey::DepthFunc),
        Some(RenderState::DepthFunc(CompareFunction::Always))
    );

    context.pop_state(StateKey::DepthFunc)?;
    assert_eq!(
        gl.native_state(StateKey::DepthFunc),
        Some(RenderState::DepthFunc(CompareFunction::LessEqual))
    );

    context.pop_state(StateKey::DepthFunc)?;
    assert_eq!(
        gl.native_state(StateKey::DepthFunc),
        Some(RenderState::DepthFunc(CompareFunction::Less))
    );
    assert_eq!(context.state_depth(StateKey::DepthFunc), 0);
    Ok(())
}

#[test]
fn test_pushing_the_active_value_issues_nothing() -> Result<()> {
    let (gl, context) = context();

    context.push_state(RenderState::DepthTest(false));
    context.push_state(RenderState::Viewport(Rect::from_size(800, 600)));
    context.pop_state(StateKey::Viewport)?;
    context.pop_state(StateKey::DepthTest)?;

    assert_eq!(state_calls(&gl), 0, "Both values match the context defaults");
    assert_eq!(context.state_stats().skipped, 4);
    Ok(())
}

#[test]
fn test_pop_without_push_underflows() {
    let (gl, context) = context();

    let err = context.pop_state(StateKey::Blend).unwrap_err();

    assert_eq!(err, Error::StateStackUnderflow { key: StateKey::Blend });
    assert!(gl.calls().is_empty(), "A failed pop must not touch the driver");
}

#[test]
fn test_scope_pops_on_early_return() {
    let (gl, context) = context();

    fn render_pass(context: &Context) -> Result<()> {
        let _scope = context.scoped_state([
            RenderState::Blend(true),
            RenderState::BlendFunc(BlendFunc::ALPHA_BLENDING),
        ]);
        anyhow::bail!("pass aborted")
    }

    assert!(render_pass(&context).is_err());
    assert_eq!(gl.native_state(StateKey::Blend), Some(RenderState::Blend(false)));
    assert_eq!(
        gl.native_state(StateKey::BlendFunc),
        Some(RenderState::BlendFunc(BlendFunc::REPLACE))
    );
    assert_eq!(context.state_depth(StateKey::Blend), 0);
}

#[test]
fn test_scope_pops_on_unwind() {
    let (gl, context) = context();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = context.scoped_state([RenderState::ScissorTest(true)]);
        panic!("user callback failed");
    }));

    assert!(outcome.is_err());
    assert_eq!(
        gl.native_state(StateKey::ScissorTest),
        Some(RenderState::ScissorTest(false))
    );
}

#[test]
fn test_scope_pops_in_reverse_order() {
    let (gl, context) = context();
    {
        let mut scope = context.scoped_state([RenderState::CullFace(true)]);
        scope.push(RenderState::DepthWrite(false));
        assert_eq!(scope.len(), 2);
        gl.clear_calls();
    }

    assert_eq!(
        gl.calls(),
        vec![
            GlCall::SetState(RenderState::DepthWrite(true)),
            GlCall::SetState(RenderState::CullFace(false)),
        ]
    );
}

#[test]
fn test_with_state_returns_the_closure_result() {
    let (gl, context) = context();

    let seen = context.with_state([RenderState::ColorMask([true, false, false, true])], |ctx| {
        ctx.current_state(StateKey::ColorMask)
    });

    assert_eq!(seen, Some(RenderState::ColorMask([true, false, false, true])));
    assert_eq!(
        gl.native_state(StateKey::ColorMask),
        Some(RenderState::ColorMask([true; 4]))
    );
}

#[test]
fn test_set_inside_scope_does_not_leak() -> Result<()> {
    let (gl, context) = context();

    context.push_state(RenderState::ClearColor([0.1, 0.2, 0.3, 1.0]));
    context.set_state(RenderState::ClearColor([1.0, 0.0, 0.0, 1.0]));
    context.pop_state(StateKey::ClearColor)?;

    assert_eq!(
        gl.native_state(StateKey::ClearColor),
        Some(RenderState::ClearColor([0.0, 0.0, 0.0, 0.0]))
    );
    Ok(())
}

#[test]
fn test_clear_ignores_and_preserves_masks() -> Result<()> {
    let (gl, context) = context();
    context.push_state(RenderState::ColorMask([false; 4]));
    context.push_state(RenderState::ScissorTest(true));
    gl.clear_calls();

    context.clear_color(None, [0.0, 0.0, 0.0, 1.0])?;

    let calls = gl.calls();
    let clear = calls
        .iter()
        .position(|call| *call == GlCall::Clear(ClearFlags::COLOR))
        .expect("clear must be issued");
    assert!(calls[..clear].contains(&GlCall::SetState(RenderState::ColorMask([true; 4]))));
    assert!(calls[..clear].contains(&GlCall::SetState(RenderState::ScissorTest(false))));

    assert_eq!(
        gl.native_state(StateKey::ColorMask),
        Some(RenderState::ColorMask([false; 4])),
        "The caller's mask must be back after the clear"
    );
    assert_eq!(
        gl.native_state(StateKey::ScissorTest),
        Some(RenderState::ScissorTest(true))
    );
    Ok(())
}

#[test]
fn test_invalidated_state_is_reissued() {
    let (gl, context) = context();

    // Foreign code leaves blending on behind the tracker's back.
    gl.external_state(RenderState::Blend(true));
    context.invalidate_all();
    context.set_state(RenderState::Blend(false));

    assert_eq!(gl.native_state(StateKey::Blend), Some(RenderState::Blend(false)));
    assert_eq!(state_calls(&gl), 1);
}
