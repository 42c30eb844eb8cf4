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

//! Types exchanged with the native API during program introspection and
//! uniform upload.

/// The GLSL type of an active uniform or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `int`
    Int,
    /// `ivec2`
    IVec2,
    /// `ivec3`
    IVec3,
    /// `ivec4`
    IVec4,
    /// `uint`
    UInt,
    /// `uvec2`
    UVec2,
    /// `uvec3`
    UVec3,
    /// `uvec4`
    UVec4,
    /// `bool`, uploaded as an integer.
    Bool,
    /// `mat2`
    Mat2,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// Any sampler type. Bound through a texture unit.
    Sampler,
    /// Any image type. Bound through an image unit.
    Image,
    /// `atomic_uint`. Backed by the buffer at its atomic counter binding.
    AtomicCounter,
    /// A type the wrapper does not upload directly, with its raw enum value.
    Other(u32),
}

/// The scalar family of a uniform's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformScalar {
    /// 32-bit float components.
    Float,
    /// 32-bit signed integer components.
    Int,
    /// 32-bit unsigned integer components.
    UInt,
}

impl UniformType {
    /// Returns `true` for sampler types.
    pub const fn is_sampler(&self) -> bool {
        matches!(self, UniformType::Sampler)
    }

    /// Returns `true` for image types.
    pub const fn is_image(&self) -> bool {
        matches!(self, UniformType::Image)
    }

    /// Returns `true` for types that cannot be written with a plain value
    /// upload (samplers, images, atomic counters and unknown types).
    pub const fn is_opaque(&self) -> bool {
        matches!(
            self,
            UniformType::Sampler
                | UniformType::Image
                | UniformType::AtomicCounter
                | UniformType::Other(_)
        )
    }

    /// The scalar family of the components, or `None` for opaque types.
    pub const fn scalar(&self) -> Option<UniformScalar> {
        match self {
            UniformType::Float
            | UniformType::Vec2
            | UniformType::Vec3
            | UniformType::Vec4
            | UniformType::Mat2
            | UniformType::Mat3
            | UniformType::Mat4 => Some(UniformScalar::Float),
            UniformType::Int
            | UniformType::IVec2
            | UniformType::IVec3
            | UniformType::IVec4
            | UniformType::Bool
            | UniformType::Sampler
            | UniformType::Image => Some(UniformScalar::Int),
            UniformType::UInt | UniformType::UVec2 | UniformType::UVec3 | UniformType::UVec4 => {
                Some(UniformScalar::UInt)
            }
            UniformType::AtomicCounter | UniformType::Other(_) => None,
        }
    }

    /// The number of 32-bit components in one element.
    pub const fn component_count(&self) -> usize {
        match self {
            UniformType::Float
            | UniformType::Int
            | UniformType::UInt
            | UniformType::Bool
            | UniformType::Sampler
            | UniformType::Image => 1,
            UniformType::Vec2 | UniformType::IVec2 | UniformType::UVec2 => 2,
            UniformType::Vec3 | UniformType::IVec3 | UniformType::UVec3 => 3,
            UniformType::Vec4 | UniformType::IVec4 | UniformType::UVec4 | UniformType::Mat2 => 4,
            UniformType::Mat3 => 9,
            UniformType::Mat4 => 16,
            UniformType::AtomicCounter | UniformType::Other(_) => 0,
        }
    }

    /// For square matrix types, the number of columns.
    pub const fn matrix_columns(&self) -> Option<u8> {
        match self {
            UniformType::Mat2 => Some(2),
            UniformType::Mat3 => Some(3),
            UniformType::Mat4 => Some(4),
            _ => None,
        }
    }

    /// The tightly packed size in bytes of one element.
    pub const fn byte_size(&self) -> usize {
        self.component_count() * 4
    }
}

/// One entry of a program's active uniform, attribute or fragment output
/// list, as reported by the native API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    /// The name as reported by the driver (arrays end in `[0]`).
    pub name: String,
    /// The GLSL type.
    pub ty: UniformType,
    /// The number of array elements (1 for non-arrays).
    pub count: u32,
    /// The location, or `None` for variables that have none (uniform block
    /// members, built-ins, atomic counters).
    pub location: Option<u32>,
    /// For atomic counters, the buffer binding point they read from.
    pub binding: Option<u32>,
}

/// A typed view of uniform data ready to be handed to the native API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData<'a> {
    /// `components`-wide float vectors.
    Float {
        /// Components per element (1 to 4).
        components: u8,
        /// All elements, flattened.
        values: &'a [f32],
    },
    /// `components`-wide signed integer vectors.
    Int {
        /// Components per element (1 to 4).
        components: u8,
        /// All elements, flattened.
        values: &'a [i32],
    },
    /// `components`-wide unsigned integer vectors.
    UInt {
        /// Components per element (1 to 4).
        components: u8,
        /// All elements, flattened.
        values: &'a [u32],
    },
    /// Column-major square matrices.
    Matrix {
        /// Number of columns (and rows).
        columns: u8,
        /// All matrices, flattened.
        values: &'a [f32],
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_sizes() {
        assert_eq!(UniformType::Mat4.byte_size(), 64);
        assert_eq!(UniformType::Mat3.matrix_columns(), Some(3));
        assert_eq!(UniformType::Vec4.matrix_columns(), None);
    }

    #[test]
    fn opaque_types_cannot_be_uploaded() {
        assert!(UniformType::Sampler.is_opaque());
        assert!(UniformType::Other(0x1234).is_opaque());
        assert!(UniformType::AtomicCounter.is_opaque());
        assert_eq!(UniformType::AtomicCounter.scalar(), None);
        assert!(!UniformType::Bool.is_opaque());
        assert_eq!(UniformType::Bool.scalar(), Some(UniformScalar::Int));
    }
}
