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

//! # Baldr Infra
//!
//! Concrete native backends for `baldr-core`. The only backend today is
//! desktop OpenGL 3.3+ through `glow`.
//!
//! ```no_run
//! # use std::rc::Rc;
//! # fn loader(_: &str) -> *const std::os::raw::c_void { std::ptr::null() }
//! use baldr_core::{Context, ContextSettings};
//! use baldr_infra::GlowApi;
//!
//! // With a window's GL context current on this thread:
//! let api = unsafe { GlowApi::from_loader_function(loader) };
//! let context = Context::new(Rc::new(api), ContextSettings::with_viewport(1280, 720));
//! ```

#![warn(missing_docs)]

pub mod gl;

pub use gl::GlowApi;
