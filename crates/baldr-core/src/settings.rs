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

//! Per-context configuration.

use crate::state::Rect;

/// Settings fixed when a [`Context`](crate::Context) is created.
#[derive(Debug, Clone)]
pub struct ContextSettings {
    /// A name used in log messages to tell contexts apart.
    pub label: String,
    /// The size of the default framebuffer. Seeds the tracked viewport and
    /// scissor box, which the native API initializes to the window size.
    pub initial_viewport: Rect,
    /// The texture unit textures are bound to while uploading data or
    /// editing parameters. Draws rebind every sampler texture of the
    /// program, so sharing this unit with a sampler is harmless.
    pub scratch_texture_unit: u32,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            label: "baldr".to_owned(),
            initial_viewport: Rect::default(),
            scratch_texture_unit: 0,
        }
    }
}

impl ContextSettings {
    /// Settings for a default framebuffer of `width` by `height` pixels.
    pub fn with_viewport(width: u32, height: u32) -> Self {
        Self {
            initial_viewport: Rect::from_size(width, height),
            ..Self::default()
        }
    }
}
