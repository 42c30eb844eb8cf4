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

//! Descriptors used to create GPU resources.

use super::enums::*;
use std::borrow::Cow;

/// A descriptor used to create a [`Buffer`](crate::resource::Buffer).
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: usize,
    /// How the contents will be accessed.
    pub usage: BufferUsage,
    /// The target the buffer is bound to by [`Buffer::bind`](crate::resource::Buffer::bind).
    pub target: BufferTarget,
}

impl<'a> BufferDescriptor<'a> {
    /// A vertex buffer of `size` bytes.
    pub fn vertex(size: usize) -> Self {
        Self {
            label: None,
            size,
            usage: BufferUsage::StaticDraw,
            target: BufferTarget::Array,
        }
    }

    /// An index buffer of `size` bytes.
    pub fn index(size: usize) -> Self {
        Self {
            target: BufferTarget::ElementArray,
            ..Self::vertex(size)
        }
    }

    /// A uniform buffer of `size` bytes, rewritten every frame.
    pub fn uniform(size: usize) -> Self {
        Self {
            label: None,
            size,
            usage: BufferUsage::DynamicDraw,
            target: BufferTarget::Uniform,
        }
    }

    /// A shader storage buffer of `size` bytes, written by the GPU and read
    /// back by the client.
    pub fn storage(size: usize) -> Self {
        Self {
            label: None,
            size,
            usage: BufferUsage::DynamicRead,
            target: BufferTarget::ShaderStorage,
        }
    }

    /// Sets the debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the usage hint.
    pub fn with_usage(mut self, usage: BufferUsage) -> Self {
        self.usage = usage;
        self
    }
}

/// The size of a texture in texels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent3D {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels, or the number of array layers.
    pub depth_or_array_layers: u32,
}

impl Extent3D {
    /// The number of texels covered by this extent.
    pub const fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize * self.depth_or_array_layers as usize
    }

    /// The extent of mip `level`, never smaller than one texel.
    ///
    /// Array layers are not reduced.
    pub fn mip_level(&self, level: u32, target: TextureTarget) -> Self {
        let shrink = |v: u32| (v >> level).max(1);
        Self {
            width: shrink(self.width),
            height: shrink(self.height),
            depth_or_array_layers: match target {
                TextureTarget::D3 => shrink(self.depth_or_array_layers),
                _ => self.depth_or_array_layers,
            },
        }
    }
}

/// The shape of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A 2D texture.
    D2 {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
    },
    /// An array of 2D layers.
    D2Array {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
        /// Number of layers.
        layers: u32,
    },
    /// A 3D texture.
    D3 {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
        /// Depth in texels.
        depth: u32,
    },
}

impl TextureDimension {
    /// The binding target matching this shape.
    pub const fn target(&self) -> TextureTarget {
        match self {
            TextureDimension::D2 { .. } => TextureTarget::D2,
            TextureDimension::D2Array { .. } => TextureTarget::D2Array,
            TextureDimension::D3 { .. } => TextureTarget::D3,
        }
    }

    /// The size of the base level.
    pub const fn extent(&self) -> Extent3D {
        match *self {
            TextureDimension::D2 { width, height } => Extent3D {
                width,
                height,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2Array {
                width,
                height,
                layers,
            } => Extent3D {
                width,
                height,
                depth_or_array_layers: layers,
            },
            TextureDimension::D3 {
                width,
                height,
                depth,
            } => Extent3D {
                width,
                height,
                depth_or_array_layers: depth,
            },
        }
    }
}

/// A descriptor used to create a [`Texture`](crate::resource::Texture).
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label for the texture.
    pub label: Option<Cow<'a, str>>,
    /// The shape and size of the texture.
    pub dimension: TextureDimension,
    /// The storage format.
    pub format: TextureFormat,
    /// The number of mip levels to allocate. Must be at least one.
    pub levels: u32,
    /// Minification and magnification filters.
    pub filter: (FilterMode, FilterMode),
    /// Wrap modes along S, T and R.
    pub wrap: [WrapMode; 3],
}

impl<'a> TextureDescriptor<'a> {
    /// A single-level texture with linear filtering and edge clamping.
    pub fn new(dimension: TextureDimension, format: TextureFormat) -> Self {
        Self {
            label: None,
            dimension,
            format,
            levels: 1,
            filter: (FilterMode::Linear, FilterMode::Linear),
            wrap: [WrapMode::ClampToEdge; 3],
        }
    }

    /// Sets the debug label.
    pub fn with_label(mut self, label: impl Into<Cow<'a, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the number of mip levels.
    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels.max(1);
        self
    }
}

/// Describes a shader stage to compile.
#[derive(Debug, Clone)]
pub struct ShaderDescriptor<'a> {
    /// An optional debug label, used in compiler diagnostics.
    pub label: Option<&'a str>,
    /// The stage the source is compiled for.
    pub stage: ShaderStage,
    /// GLSL source code.
    pub source: Cow<'a, str>,
}

impl<'a> ShaderDescriptor<'a> {
    /// A vertex shader from GLSL source.
    pub fn vertex(source: impl Into<Cow<'a, str>>) -> Self {
        Self {
            label: None,
            stage: ShaderStage::Vertex,
            source: source.into(),
        }
    }

    /// A fragment shader from GLSL source.
    pub fn fragment(source: impl Into<Cow<'a, str>>) -> Self {
        Self {
            label: None,
            stage: ShaderStage::Fragment,
            source: source.into(),
        }
    }

    /// A compute shader from GLSL source.
    pub fn compute(source: impl Into<Cow<'a, str>>) -> Self {
        Self {
            label: None,
            stage: ShaderStage::Compute,
            source: source.into(),
        }
    }

    /// Sets the debug label.
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }
}

/// Describes one attribute inside a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The attribute location in the vertex shader (`layout(location = N)`).
    pub location: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
    /// If `true`, integer data is normalized to `[0, 1]` or `[-1, 1]`.
    pub normalized: bool,
}

/// Describes the memory layout of one vertex buffer.
#[derive(Debug, Clone)]
pub struct VertexBufferLayout<'a> {
    /// The byte distance between consecutive elements.
    pub stride: u32,
    /// How often the buffer advances.
    pub step_mode: VertexStepMode,
    /// The attributes read from each element.
    pub attributes: Cow<'a, [VertexAttribute]>,
}

impl<'a> VertexBufferLayout<'a> {
    /// Builds a per-vertex layout with tightly packed attributes in the given
    /// order, assigning consecutive locations starting at `first_location`.
    pub fn packed(first_location: u32, formats: &[VertexFormat]) -> Self {
        let mut offset = 0u32;
        let attributes = formats
            .iter()
            .enumerate()
            .map(|(i, format)| {
                let attribute = VertexAttribute {
                    location: first_location + i as u32,
                    format: *format,
                    offset,
                    normalized: false,
                };
                offset += format.size() as u32;
                attribute
            })
            .collect::<Vec<_>>();
        Self {
            stride: offset,
            step_mode: VertexStepMode::Vertex,
            attributes: Cow::Owned(attributes),
        }
    }
}
