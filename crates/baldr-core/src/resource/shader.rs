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

use super::OwnedHandle;
use crate::api::{ShaderDescriptor, ShaderStage};
use crate::context::Context;
use crate::error::{CreationError, Result};
use crate::handle::ObjectKind;

/// An owned, successfully compiled shader stage.
#[derive(Debug)]
pub struct Shader {
    pub(crate) raw: OwnedHandle,
    stage: ShaderStage,
}

impl Shader {
    /// Compiles `descriptor.source` for `descriptor.stage`.
    /// ## Errors
    /// * `Error::Creation` - With the compiler log if compilation fails. The
    ///   native shader object is deleted before returning.
    pub fn new(context: &Context, descriptor: &ShaderDescriptor) -> Result<Self> {
        let raw = OwnedHandle::allocate(context, ObjectKind::Shader, descriptor.label, |api| {
            api.create_shader(descriptor.stage)
        })?;
        let id = raw.get()?.id();

        if let Err(log) = context.api().compile_shader(id, &descriptor.source) {
            log::warn!(
                "Shader: Compilation of {:?} stage '{}' failed:\n{log}",
                descriptor.stage,
                descriptor.label.unwrap_or("Unknown")
            );
            return Err(CreationError::compile(descriptor.stage, descriptor.label, log).into());
        }

        Ok(Self {
            raw,
            stage: descriptor.stage,
        })
    }

    /// The stage this shader was compiled for.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// Moves the native shader into a new wrapper and leaves this one empty.
    pub fn take(&mut self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.take()?,
            stage: self.stage,
        })
    }
}
