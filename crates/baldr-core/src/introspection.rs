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

//! Name to location tables of a linked program.

use crate::api::{ActiveVariable, UniformType};
use crate::error::{Error, Result};
use crate::handle::NativeId;
use crate::traits::GlApi;
use std::collections::HashMap;

/// An addressable active uniform.
///
/// Array elements are addressable on their own: `name[i]` describes the
/// tail of the array starting at element `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformInfo {
    /// The uniform location.
    pub location: u32,
    /// The GLSL type.
    pub ty: UniformType,
    /// The number of array elements from this one to the end (1 for
    /// non-arrays).
    pub count: u32,
    /// For samplers, the texture unit assigned to this element.
    pub texture_unit: Option<u32>,
    /// For images, the image unit assigned to this element.
    pub image_unit: Option<u32>,
}

/// An active vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeInfo {
    /// The attribute location.
    pub location: u32,
    /// The GLSL type.
    pub ty: UniformType,
    /// The number of array elements (1 for non-arrays).
    pub count: u32,
}

/// An active fragment shader output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputInfo {
    /// The output location, which selects the draw buffer it writes to.
    pub location: u32,
    /// The GLSL type.
    pub ty: UniformType,
}

/// The active uniforms, attributes and outputs of one linked program.
///
/// Built once after each successful link and never updated in place; a
/// relink marks the tables stale and they are rebuilt on the next lookup.
#[derive(Debug, Clone, Default)]
pub struct ProgramInterface {
    uniforms: HashMap<String, UniformInfo>,
    atomic_counters: HashMap<String, u32>,
    attributes: HashMap<String, AttributeInfo>,
    outputs: HashMap<String, OutputInfo>,
    sampler_units: u32,
    image_units: u32,
    stale: bool,
}

// Drivers report arrays as `name[0]`.
fn array_base(name: &str) -> Option<&str> {
    name.strip_suffix("[0]")
}

impl ProgramInterface {
    /// An interface with no entries that must be rebuilt before use.
    pub fn stale() -> Self {
        Self {
            stale: true,
            ..Self::default()
        }
    }

    /// Walks the active uniform, attribute and output lists of `program`.
    ///
    /// Samplers receive consecutive texture units in the order the driver
    /// lists them, one unit per array element; images receive image units
    /// the same way. Uniforms without a location (uniform block members) are
    /// not addressable and are skipped.
    /// ## Errors
    /// * `Error::Introspection` - If the native query fails. An empty
    ///   program is not an error.
    pub fn introspect(api: &dyn GlApi, program: NativeId) -> Result<Self> {
        let uniforms = api.active_uniforms(program).map_err(Error::Introspection)?;
        let attributes = api
            .active_attributes(program)
            .map_err(Error::Introspection)?;
        let outputs = api.active_outputs(program).map_err(Error::Introspection)?;

        let interface = Self::from_variables(uniforms, attributes).with_outputs(outputs);
        log::debug!(
            "ProgramInterface: Program {program} has {} uniform names, {} attribute names, {} outputs, {} sampler units, {} image units",
            interface.uniforms.len(),
            interface.attributes.len(),
            interface.outputs.len(),
            interface.sampler_units,
            interface.image_units
        );
        Ok(interface)
    }

    /// Builds the tables from already queried active variable lists.
    pub fn from_variables(
        uniforms: impl IntoIterator<Item = ActiveVariable>,
        attributes: impl IntoIterator<Item = ActiveVariable>,
    ) -> Self {
        let mut interface = Self::default();
        for variable in uniforms {
            interface.add_uniform(variable);
        }

        for ActiveVariable {
            name,
            ty,
            count,
            location,
            ..
        } in attributes
        {
            // Built-ins such as gl_VertexID have no location.
            let Some(location) = location else {
                continue;
            };
            let info = AttributeInfo {
                location,
                ty,
                count,
            };
            if let Some(base) = array_base(&name) {
                interface.attributes.insert(base.to_owned(), info);
            }
            interface.attributes.insert(name, info);
        }
        interface
    }

    /// Adds the fragment outputs of the program.
    #[must_use]
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = ActiveVariable>) -> Self {
        for ActiveVariable {
            name, ty, location, ..
        } in outputs
        {
            let Some(location) = location else {
                continue;
            };
            let info = OutputInfo { location, ty };
            if let Some(base) = array_base(&name) {
                self.outputs.insert(base.to_owned(), info);
            }
            self.outputs.insert(name, info);
        }
        self
    }

    fn add_uniform(&mut self, variable: ActiveVariable) {
        let ActiveVariable {
            name,
            ty,
            count,
            location,
            binding,
        } = variable;
        if ty == UniformType::AtomicCounter {
            let binding = binding.unwrap_or(0);
            if let Some(base) = array_base(&name) {
                self.atomic_counters.insert(base.to_owned(), binding);
            }
            self.atomic_counters.insert(name, binding);
            return;
        }
        let Some(location) = location else {
            log::trace!("ProgramInterface: Skipping block member '{name}'");
            return;
        };
        let count = count.max(1);
        let texture_unit = ty.is_sampler().then(|| {
            let unit = self.sampler_units;
            self.sampler_units += count;
            unit
        });
        let image_unit = ty.is_image().then(|| {
            let unit = self.image_units;
            self.image_units += count;
            unit
        });
        let info = UniformInfo {
            location,
            ty,
            count,
            texture_unit,
            image_unit,
        };

        let Some(base) = array_base(&name) else {
            self.uniforms.insert(name, info);
            return;
        };
        // Elements of an array occupy consecutive locations and units.
        for index in 1..count {
            let element = UniformInfo {
                location: location + index,
                count: count - index,
                texture_unit: texture_unit.map(|unit| unit + index),
                image_unit: image_unit.map(|unit| unit + index),
                ..info
            };
            self.uniforms.insert(format!("{base}[{index}]"), element);
        }
        self.uniforms.insert(base.to_owned(), info);
        self.uniforms.insert(name, info);
    }

    /// The location of the uniform `name`.
    ///
    /// A uniform the compiler optimized away and a misspelled name both
    /// produce `Error::UnknownUniform`; the driver does not distinguish them.
    pub fn location_of(&self, name: &str) -> Result<u32> {
        self.uniform(name).map(|info| info.location)
    }

    /// Everything known about the uniform `name`.
    pub fn uniform(&self, name: &str) -> Result<&UniformInfo> {
        self.uniforms.get(name).ok_or_else(|| Error::UnknownUniform {
            name: name.to_owned(),
        })
    }

    /// The buffer binding point the atomic counter `name` reads from.
    pub fn atomic_counter_binding(&self, name: &str) -> Result<u32> {
        self.atomic_counters
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownUniform {
                name: name.to_owned(),
            })
    }

    /// Everything known about the attribute `name`.
    pub fn attribute(&self, name: &str) -> Result<&AttributeInfo> {
        self.attributes
            .get(name)
            .ok_or_else(|| Error::UnknownAttribute {
                name: name.to_owned(),
            })
    }

    /// The location of the attribute `name`.
    pub fn attribute_location(&self, name: &str) -> Result<u32> {
        self.attribute(name).map(|info| info.location)
    }

    /// Everything known about the fragment output `name`.
    pub fn output(&self, name: &str) -> Result<&OutputInfo> {
        self.outputs.get(name).ok_or_else(|| Error::UnknownOutput {
            name: name.to_owned(),
        })
    }

    /// The location of the fragment output `name`.
    pub fn output_location(&self, name: &str) -> Result<u32> {
        self.output(name).map(|info| info.location)
    }

    /// Iterates over every addressable uniform name, including the bare
    /// and per-element aliases of arrays.
    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformInfo)> {
        self.uniforms.iter().map(|(name, info)| (name.as_str(), info))
    }

    /// Iterates over every active attribute name.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeInfo)> {
        self.attributes
            .iter()
            .map(|(name, info)| (name.as_str(), info))
    }

    /// Iterates over every active fragment output name.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, &OutputInfo)> {
        self.outputs.iter().map(|(name, info)| (name.as_str(), info))
    }

    /// The number of texture units the program's samplers use.
    pub fn sampler_units(&self) -> u32 {
        self.sampler_units
    }

    /// The number of image units the program's images use.
    pub fn image_units(&self) -> u32 {
        self.image_units
    }

    /// Clears the tables and marks them for rebuilding.
    pub fn invalidate(&mut self) {
        *self = Self::stale();
    }

    /// Returns `true` if the tables must be rebuilt before use.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}
