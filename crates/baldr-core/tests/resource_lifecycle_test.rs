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

//! Integration tests for ownership of native objects: exactly one release
//! per object, explicit moves and creation failures.

use anyhow::Result;
use baldr_core::{
    api::{BufferDescriptor, ShaderDescriptor, ShaderStage},
    testing::{GlCall, RecordingGl},
    Buffer, Context, ContextSettings, CreationStage, Error, ObjectKind, Program, Resource,
    Shader, Texture,
};
use std::rc::Rc;

fn context() -> (Rc<RecordingGl>, Context) {
    let gl = Rc::new(RecordingGl::new());
    let context = Context::new(gl.clone(), ContextSettings::default());
    (gl, context)
}

fn deletes(gl: &RecordingGl, kind: ObjectKind) -> usize {
    gl.count(|call| matches!(call, GlCall::Delete { kind: k, .. } if *k == kind))
}

const VERTEX: &str = "\
#version 330 core
layout(location = 0) in vec3 position;
void main() {
    gl_Position = vec4(position, 1.0);
}
";

const FRAGMENT: &str = "\
#version 330 core
out vec4 color;
void main() {
    color = vec4(1.0);
}
";

#[test]
fn test_drop_releases_exactly_once() -> Result<()> {
    let (gl, context) = context();
    {
        let _buffer = Buffer::new(&context, &BufferDescriptor::vertex(32))?;
        let _texture = Texture::r32f(&context, 2, 2)?;
        assert_eq!(context.live_objects(), 2);
    }

    assert_eq!(deletes(&gl, ObjectKind::Buffer), 1);
    assert_eq!(deletes(&gl, ObjectKind::Texture), 1);
    assert_eq!(context.live_objects(), 0);
    assert_eq!(gl.alive_count(ObjectKind::Buffer), 0);
    Ok(())
}

#[test]
fn test_destroy_then_drop_releases_once() -> Result<()> {
    let (gl, context) = context();
    let mut buffer = Buffer::new(&context, &BufferDescriptor::vertex(32))?;

    buffer.destroy();
    buffer.destroy();
    assert!(!buffer.is_live());
    drop(buffer);

    assert_eq!(deletes(&gl, ObjectKind::Buffer), 1);
    Ok(())
}

#[test]
fn test_take_transfers_ownership() -> Result<()> {
    let (gl, context) = context();
    let mut original = Buffer::new(&context, &BufferDescriptor::vertex(32).with_label("mesh"))?;
    let handle = original.handle()?;

    let moved = original.take()?;

    assert_eq!(moved.handle()?, handle);
    assert_eq!(moved.label(), Some("mesh"));
    assert_eq!(
        original.write(0, &[0; 4]).unwrap_err(),
        Error::UseAfterMove {
            kind: ObjectKind::Buffer
        }
    );
    assert!(matches!(original.take(), Err(Error::UseAfterMove { .. })));

    drop(original);
    assert_eq!(deletes(&gl, ObjectKind::Buffer), 0, "The emptied wrapper owns nothing");
    drop(moved);
    assert_eq!(deletes(&gl, ObjectKind::Buffer), 1);
    Ok(())
}

#[test]
fn test_handles_of_destroyed_objects_stay_dead() -> Result<()> {
    let (_gl, context) = context();
    let first = Texture::rgba8(&context, 1, 1)?;
    let stale = first.handle()?;
    drop(first);

    let second = Texture::rgba8(&context, 1, 1)?;

    assert_eq!(second.handle()?.id(), stale.id());
    assert!(second.handle()?.generation() > stale.generation());
    assert!(!context.is_live(stale));
    assert!(context.is_live(second.handle()?));
    Ok(())
}

#[test]
fn test_allocation_failure_is_reported() {
    let (gl, context) = context();
    gl.fail_next_allocation();

    let err = Buffer::new(&context, &BufferDescriptor::vertex(32).with_label("vbo")).unwrap_err();

    let Error::Creation(creation) = err else {
        panic!("expected a creation error, got {err:?}");
    };
    assert_eq!(creation.stage, CreationStage::Allocate);
    assert_eq!(creation.label.as_deref(), Some("vbo"));
    assert_eq!(context.live_objects(), 0);
}

#[test]
fn test_compile_failure_returns_log_and_frees_shader() {
    let (gl, context) = context();
    let source = "#version 330 core\n#error broken on purpose\nvoid main() {}\n";

    let err = Shader::new(&context, &ShaderDescriptor::fragment(source).with_label("broken"))
        .unwrap_err();

    let Error::Creation(creation) = err else {
        panic!("expected a creation error, got {err:?}");
    };
    assert_eq!(creation.stage, CreationStage::Compile(ShaderStage::Fragment));
    assert!(creation.log.contains("#error"), "The native log is kept: {}", creation.log);
    assert_eq!(gl.alive_count(ObjectKind::Shader), 0);
    assert_eq!(deletes(&gl, ObjectKind::Shader), 1);
}

#[test]
fn test_link_failure_returns_log_and_frees_program() -> Result<()> {
    let (gl, context) = context();
    let vertex = Shader::new(&context, &ShaderDescriptor::vertex(VERTEX))?;
    let fragment = Shader::new(&context, &ShaderDescriptor::fragment(FRAGMENT))?;
    gl.fail_next_link("error: varying `v_uv' not written by vertex shader");

    let err = Program::link(&context, Some("forward"), &[&vertex, &fragment]).unwrap_err();

    let Error::Creation(creation) = err else {
        panic!("expected a creation error, got {err:?}");
    };
    assert_eq!(creation.stage, CreationStage::Link);
    assert_eq!(creation.log, "error: varying `v_uv' not written by vertex shader");
    assert_eq!(gl.alive_count(ObjectKind::Program), 0);
    // The shaders are still owned by the caller.
    assert!(vertex.is_live() && fragment.is_live());
    Ok(())
}

#[test]
fn test_shaders_can_be_dropped_after_link() -> Result<()> {
    let (gl, context) = context();
    let program = {
        let vertex = Shader::new(&context, &ShaderDescriptor::vertex(VERTEX))?;
        let fragment = Shader::new(&context, &ShaderDescriptor::fragment(FRAGMENT))?;
        Program::link(&context, None, &[&vertex, &fragment])?
    };

    assert_eq!(gl.alive_count(ObjectKind::Shader), 0);
    assert!(program.is_linked());
    assert_eq!(program.attribute_location("position")?, 0);
    Ok(())
}

#[test]
fn test_resources_keep_their_context_alive() -> Result<()> {
    let (gl, context) = context();
    let buffer = Buffer::new(&context, &BufferDescriptor::vertex(8))?;
    drop(context);

    assert!(buffer.is_live());
    assert_eq!(buffer.context().live_objects(), 1);
    drop(buffer);
    assert_eq!(deletes(&gl, ObjectKind::Buffer), 1);
    Ok(())
}
