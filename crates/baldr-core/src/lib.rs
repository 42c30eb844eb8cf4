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

//! # Baldr Core
//!
//! Ownership, binding and render-state management over a stateful OpenGL
//! context.
//!
//! Every native object is owned by exactly one RAII wrapper
//! ([`Buffer`], [`Texture`], [`Shader`], [`Program`], [`Framebuffer`],
//! [`VertexArray`]) and released exactly once. Binds go through a
//! [`BindingCache`](binding::BindingCache) that drops redundant native calls,
//! fixed-function state goes through a push/pop
//! [`StateTracker`](state::StateTracker), and draws and compute dispatches
//! are validated before a single native call is issued.
//!
//! Contexts created with [`Context::new_shared`] form a share group whose
//! members may reference each other's buffers and textures.
//!
//! The native API is reached through the [`GlApi`] trait; `baldr-infra`
//! provides the real implementation and the `testing` feature a recording
//! fake.

#![warn(missing_docs)]

pub mod api;
pub mod binding;
pub mod context;
pub mod draw;
pub mod error;
pub mod handle;
pub mod introspection;
pub mod resource;
pub mod settings;
pub mod state;
pub mod traits;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use binding::{BindingPoint, BindingStats};
pub use context::Context;
pub use draw::DrawCommand;
pub use error::{CreationError, CreationStage, DrawCheck, Error, Result};
pub use handle::{Handle, NativeId, ObjectKind};
pub use introspection::{AttributeInfo, OutputInfo, ProgramInterface, UniformInfo};
pub use resource::{
    AttachedImage, Buffer, Framebuffer, Program, Resource, Shader, Texture, VertexArray,
};
pub use settings::ContextSettings;
pub use state::{BlendFunc, Rect, RenderState, StateKey, StateScope, StateStats};
pub use traits::GlApi;
