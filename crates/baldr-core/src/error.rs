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

//! Defines the error types of the resource and state management core.
//!
//! Every error is local and recoverable by the caller; nothing in the core
//! aborts the process.

use crate::api::{Attachment, FramebufferStatus, ShaderStage};
use crate::binding::BindingPoint;
use crate::handle::{Handle, NativeId, ObjectKind};
use crate::state::StateKey;
use std::fmt;

/// The step of object creation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStage {
    /// The driver refused to allocate a new object name.
    Allocate,
    /// The shader compiler rejected the source.
    Compile(ShaderStage),
    /// The linker rejected the attached stages.
    Link,
}

/// A native object could not be created, compiled or linked.
///
/// `log` carries the native diagnostic text verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationError {
    /// The kind of object being created.
    pub kind: ObjectKind,
    /// The debug label of the object, if any.
    pub label: Option<String>,
    /// Which step failed.
    pub stage: CreationStage,
    /// The driver's diagnostic output.
    pub log: String,
}

impl CreationError {
    pub(crate) fn allocation(kind: ObjectKind, label: Option<&str>, log: String) -> Self {
        Self {
            kind,
            label: label.map(str::to_owned),
            stage: CreationStage::Allocate,
            log,
        }
    }

    pub(crate) fn compile(stage: ShaderStage, label: Option<&str>, log: String) -> Self {
        Self {
            kind: ObjectKind::Shader,
            label: label.map(str::to_owned),
            stage: CreationStage::Compile(stage),
            log,
        }
    }

    pub(crate) fn link(label: Option<&str>, log: String) -> Self {
        Self {
            kind: ObjectKind::Program,
            label: label.map(str::to_owned),
            stage: CreationStage::Link,
            log,
        }
    }
}

impl fmt::Display for CreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.label.as_deref().unwrap_or("Unknown");
        match self.stage {
            CreationStage::Allocate => {
                write!(f, "Failed to allocate {} '{label}': {}", self.kind, self.log)
            }
            CreationStage::Compile(stage) => {
                write!(f, "{stage:?} shader compilation failed for '{label}':\n{}", self.log)
            }
            CreationStage::Link => {
                write!(f, "Program link failed for '{label}':\n{}", self.log)
            }
        }
    }
}

impl std::error::Error for CreationError {}

/// The draw-time precondition that did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCheck {
    /// The program has no successful link.
    ProgramNotLinked,
    /// The program was destroyed or belongs to another context.
    ProgramDestroyed,
    /// A texture bound to one of the program's sampler units was destroyed.
    DeadTexture {
        /// The texture unit holding the dead texture.
        unit: u32,
    },
    /// A texture bound to one of the program's image units was destroyed.
    DeadImage {
        /// The image unit holding the dead texture.
        unit: u32,
    },
    /// A compute dispatch was requested with a program that has no compute
    /// stage, or a draw with a compute-only program.
    WrongPipeline {
        /// `true` if the program is a compute program.
        compute: bool,
    },
    /// The vertex array was destroyed or belongs to another context.
    VertexArrayDestroyed,
    /// The vertex array references a destroyed buffer.
    DeadBuffer {
        /// The stale handle recorded by the vertex array.
        handle: Handle,
    },
    /// The framebuffer was destroyed or belongs to another context.
    FramebufferDestroyed,
    /// A framebuffer attachment references a destroyed texture.
    DeadAttachment {
        /// The attachment point holding the dead texture.
        attachment: Attachment,
    },
    /// The framebuffer is not complete.
    FramebufferIncomplete {
        /// The last status reported by the driver.
        status: FramebufferStatus,
    },
}

impl fmt::Display for DrawCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawCheck::ProgramNotLinked => write!(f, "program is not linked"),
            DrawCheck::ProgramDestroyed => write!(f, "program is not alive in this context"),
            DrawCheck::DeadTexture { unit } => {
                write!(f, "texture bound to unit {unit} was destroyed")
            }
            DrawCheck::DeadImage { unit } => {
                write!(f, "texture bound to image unit {unit} was destroyed")
            }
            DrawCheck::WrongPipeline { compute: true } => {
                write!(f, "compute program cannot draw")
            }
            DrawCheck::WrongPipeline { compute: false } => {
                write!(f, "program has no compute stage")
            }
            DrawCheck::VertexArrayDestroyed => {
                write!(f, "vertex array is not alive in this context")
            }
            DrawCheck::DeadBuffer { handle } => {
                write!(f, "vertex array references destroyed {handle}")
            }
            DrawCheck::FramebufferDestroyed => {
                write!(f, "framebuffer is not alive in this context")
            }
            DrawCheck::DeadAttachment { attachment } => {
                write!(f, "framebuffer attachment {attachment:?} was destroyed")
            }
            DrawCheck::FramebufferIncomplete { status } => {
                write!(f, "framebuffer is incomplete: {status:?}")
            }
        }
    }
}

/// The error type of every fallible operation in the core.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A native object could not be created, compiled or linked.
    Creation(CreationError),
    /// The resource was moved out with `take()` or explicitly destroyed.
    UseAfterMove {
        /// The kind of the emptied resource.
        kind: ObjectKind,
    },
    /// `pop` was called on a state key with nothing pushed.
    StateStackUnderflow {
        /// The key that was popped.
        key: StateKey,
    },
    /// The name is not an active uniform of the program.
    ///
    /// Uniforms removed by the compiler's dead-code elimination and plain
    /// typos are indistinguishable and both end up here.
    UnknownUniform {
        /// The name that was looked up.
        name: String,
    },
    /// The name is not an active attribute of the program.
    UnknownAttribute {
        /// The name that was looked up.
        name: String,
    },
    /// The name is not an active fragment output of the program.
    UnknownOutput {
        /// The name that was looked up.
        name: String,
    },
    /// The native active-variable query failed.
    Introspection(String),
    /// A resource of one context was handed to a resource of another
    /// context that cannot see it.
    ContextMismatch {
        /// The kind of the foreign object.
        kind: ObjectKind,
    },
    /// The driver could not map a buffer, or the mapped range was corrupted
    /// before it was unmapped.
    MapFailed(String),
    /// A draw precondition failed; no native call was issued.
    InvalidDrawState(DrawCheck),
    /// A handle was bound to a point that accepts another kind of object.
    KindMismatch {
        /// The binding point.
        point: BindingPoint,
        /// The kind of the rejected handle.
        kind: ObjectKind,
    },
    /// A buffer write, read or mapping does not fit in the buffer.
    OutOfBounds {
        /// Byte offset of the write.
        offset: usize,
        /// Length of the write.
        len: usize,
        /// Size of the buffer.
        size: usize,
    },
    /// Client data does not have the size the operation requires.
    DataSizeMismatch {
        /// Bytes expected.
        expected: usize,
        /// Bytes received.
        actual: usize,
    },
    /// A texture operation named a mip level the texture does not have.
    InvalidMipLevel {
        /// The requested level.
        level: u32,
        /// The number of levels the texture was created with.
        levels: u32,
    },
    /// A uniform upload does not match the uniform's introspected type.
    UniformMismatch {
        /// The uniform name.
        name: String,
        /// What did not match.
        details: String,
    },
    /// `detach` was called for an attachment point with nothing attached.
    AttachmentMissing(Attachment),
    /// The binding cache disagrees with the driver. Only produced when the
    /// `verbose` feature is enabled; a debugging aid, not a guarantee.
    Desynchronized {
        /// The binding point that was checked.
        point: BindingPoint,
        /// The id the cache believed was bound.
        cached: Option<NativeId>,
        /// The id the driver reported.
        native: Option<NativeId>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Creation(err) => write!(f, "Resource creation failed: {err}"),
            Error::UseAfterMove { kind } => {
                write!(f, "Use of a moved-from or destroyed {kind}.")
            }
            Error::StateStackUnderflow { key } => {
                write!(f, "Render state stack underflow for {key:?}.")
            }
            Error::UnknownUniform { name } => {
                write!(f, "'{name}' is not an active uniform of the program.")
            }
            Error::UnknownAttribute { name } => {
                write!(f, "'{name}' is not an active attribute of the program.")
            }
            Error::UnknownOutput { name } => {
                write!(f, "'{name}' is not an active output of the program.")
            }
            Error::Introspection(msg) => write!(f, "Program introspection failed: {msg}"),
            Error::ContextMismatch { kind } => {
                write!(f, "The {kind} belongs to a context outside this share group.")
            }
            Error::MapFailed(msg) => write!(f, "Buffer mapping failed: {msg}"),
            Error::InvalidDrawState(check) => write!(f, "Invalid draw state: {check}"),
            Error::KindMismatch { point, kind } => {
                write!(f, "Cannot bind a {kind} to {point:?}.")
            }
            Error::OutOfBounds { offset, len, size } => write!(
                f,
                "Access of {len} bytes at offset {offset} exceeds buffer size {size}."
            ),
            Error::DataSizeMismatch { expected, actual } => {
                write!(f, "Expected {expected} bytes of data, got {actual}.")
            }
            Error::InvalidMipLevel { level, levels } => {
                write!(f, "Mip level {level} out of range for a texture with {levels} levels.")
            }
            Error::UniformMismatch { name, details } => {
                write!(f, "Uniform '{name}' mismatch: {details}")
            }
            Error::AttachmentMissing(attachment) => {
                write!(f, "Nothing is attached at {attachment:?}.")
            }
            Error::Desynchronized {
                point,
                cached,
                native,
            } => write!(
                f,
                "Binding cache out of sync at {point:?}: cached {cached:?}, driver reports {native:?}."
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Creation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CreationError> for Error {
    fn from(err: CreationError) -> Self {
        Error::Creation(err)
    }
}

impl From<DrawCheck> for Error {
    fn from(check: DrawCheck) -> Self {
        Error::InvalidDrawState(check)
    }
}

/// Convenient result alias for the core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn creation_error_keeps_native_log_verbatim() {
        let err = CreationError::compile(
            ShaderStage::Fragment,
            Some("blur"),
            "0:12(3): error: `foo' undeclared".to_string(),
        );
        assert_eq!(
            format!("{err}"),
            "Fragment shader compilation failed for 'blur':\n0:12(3): error: `foo' undeclared"
        );
    }

    #[test]
    fn error_wraps_creation_error_as_source() {
        let err: Error = CreationError::link(None, "missing main".to_string()).into();
        assert_eq!(
            format!("{err}"),
            "Resource creation failed: Program link failed for 'Unknown':\nmissing main"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn draw_check_is_named_in_message() {
        let err: Error = DrawCheck::FramebufferIncomplete {
            status: FramebufferStatus::MissingAttachment,
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Invalid draw state: framebuffer is incomplete: MissingAttachment"
        );
        assert!(err.source().is_none());
    }
}
