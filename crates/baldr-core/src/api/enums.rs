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

//! Backend-agnostic enums shared by descriptors, the binding cache and the
//! native boundary.

/// The generic binding targets a buffer can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferTarget {
    /// Vertex attribute data (`GL_ARRAY_BUFFER`).
    Array,
    /// Index data; this binding is part of the bound vertex array's state.
    ElementArray,
    /// Uniform block storage.
    Uniform,
    /// Source of buffer-to-buffer copies.
    CopyRead,
    /// Destination of buffer-to-buffer copies; also used for uploads.
    CopyWrite,
    /// Destination of pixel read-backs.
    PixelPack,
    /// Source of pixel uploads.
    PixelUnpack,
    /// Storage of `atomic_uint` counters.
    AtomicCounter,
    /// Shader storage block storage.
    ShaderStorage,
}

/// How a mapped buffer range is accessed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapAccess {
    /// The client only reads; writes to the mapping are discarded.
    Read,
    /// The client only writes; the initial contents are unspecified.
    Write,
    /// The client reads and writes.
    ReadWrite,
}

impl MapAccess {
    /// Returns `true` if the mapping starts with the buffer's contents.
    pub const fn reads(&self) -> bool {
        matches!(self, MapAccess::Read | MapAccess::ReadWrite)
    }

    /// Returns `true` if changes to the mapping reach the buffer.
    pub const fn writes(&self) -> bool {
        matches!(self, MapAccess::Write | MapAccess::ReadWrite)
    }
}

/// How a shader accesses a texture bound to an image unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageAccess {
    /// `readonly` images.
    ReadOnly,
    /// `writeonly` images.
    WriteOnly,
    /// Images read and written by the same shader.
    #[default]
    ReadWrite,
}

/// The kind of incoherent shader writes a memory barrier makes visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemoryBarrier {
    /// Every kind.
    #[default]
    All,
    /// Image loads and stores in later shaders.
    ShaderImageAccess,
    /// Shader storage block accesses in later shaders.
    ShaderStorage,
    /// Atomic counter accesses in later shaders.
    AtomicCounter,
    /// Client reads and writes of buffer contents.
    BufferUpdate,
    /// Client reads and writes of texture contents.
    TextureUpdate,
}

/// A hint describing how the contents of a buffer will be accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    #[default]
    StaticDraw,
    /// Written repeatedly, drawn many times.
    DynamicDraw,
    /// Written once, drawn a few times.
    StreamDraw,
    /// Written once by the GPU, read many times by the CPU.
    StaticRead,
    /// Written repeatedly by the GPU, read many times by the CPU.
    DynamicRead,
    /// Written once by the GPU, read a few times by the CPU.
    StreamRead,
    /// Written once by the GPU, used many times by the GPU.
    StaticCopy,
    /// Written repeatedly by the GPU, used many times by the GPU.
    DynamicCopy,
    /// Written once by the GPU, used a few times by the GPU.
    StreamCopy,
}

/// The binding target (and therefore dimensionality) of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureTarget {
    /// A two-dimensional texture.
    D2,
    /// An array of two-dimensional layers.
    D2Array,
    /// A three-dimensional texture.
    D3,
}

/// The storage format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One 8-bit normalized channel.
    R8Unorm,
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
    /// One 32-bit float channel.
    R32Float,
    /// Two 32-bit float channels.
    Rg32Float,
    /// Three 32-bit float channels.
    Rgb32Float,
    /// Four 32-bit float channels.
    Rgba32Float,
    /// A 32-bit float depth channel.
    Depth32Float,
    /// Packed 24-bit depth and 8-bit stencil.
    Depth24Stencil8,
}

impl TextureFormat {
    /// The number of channels of one texel.
    pub const fn channel_count(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm | TextureFormat::R32Float | TextureFormat::Depth32Float => 1,
            TextureFormat::Rg32Float | TextureFormat::Depth24Stencil8 => 2,
            TextureFormat::Rgb32Float => 3,
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba32Float => 4,
        }
    }

    /// The number of bytes one texel occupies in client memory.
    pub const fn bytes_per_texel(&self) -> usize {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::R32Float => 4,
            TextureFormat::Rg32Float => 8,
            TextureFormat::Rgb32Float => 12,
            TextureFormat::Rgba32Float => 16,
            TextureFormat::Depth32Float => 4,
            TextureFormat::Depth24Stencil8 => 4,
        }
    }

    /// Returns `true` for depth (and depth-stencil) formats.
    pub const fn is_depth(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth24Stencil8
        )
    }
}

/// Texel filtering applied when sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Bilinear interpolation.
    #[default]
    Linear,
    /// Nearest texel from the nearest mip level.
    NearestMipmapNearest,
    /// Bilinear within the nearest mip level.
    LinearMipmapNearest,
    /// Nearest texel, interpolated between mip levels.
    NearestMipmapLinear,
    /// Trilinear filtering.
    LinearMipmapLinear,
}

/// How texture coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Clamp to the edge texel.
    #[default]
    ClampToEdge,
    /// Clamp to the border color.
    ClampToBorder,
    /// Tile the texture.
    Repeat,
    /// Tile the texture, mirroring every other repetition.
    MirroredRepeat,
}

/// A per-texture sampling parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    /// Minification filter.
    MinFilter(FilterMode),
    /// Magnification filter.
    MagFilter(FilterMode),
    /// Wrap mode along S.
    WrapS(WrapMode),
    /// Wrap mode along T.
    WrapT(WrapMode),
    /// Wrap mode along R.
    WrapR(WrapMode),
    /// Highest mip level that may be sampled.
    MaxLevel(u32),
}

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader.
    Vertex,
    /// Fragment shader.
    Fragment,
    /// Geometry shader.
    Geometry,
    /// Compute shader.
    Compute,
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Individual points.
    PointList,
    /// Pairs of vertices form lines.
    LineList,
    /// Consecutive vertices form a connected line.
    LineStrip,
    /// Triples of vertices form triangles.
    #[default]
    TriangleList,
    /// Each vertex after the second forms a triangle with the two before it.
    TriangleStrip,
    /// Every triangle shares the first vertex.
    TriangleFan,
}

/// The data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}

impl IndexFormat {
    /// The size of one index in bytes.
    pub const fn size(&self) -> usize {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// The scalar type a vertex attribute component is stored as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 32-bit float.
    F32,
    /// 32-bit signed integer.
    I32,
    /// 32-bit unsigned integer.
    U32,
    /// 16-bit signed integer.
    I16,
    /// 16-bit unsigned integer.
    U16,
    /// 8-bit signed integer.
    I8,
    /// 8-bit unsigned integer.
    U8,
}

impl ScalarType {
    /// The size in bytes of one component.
    pub const fn size(&self) -> usize {
        match self {
            ScalarType::F32 | ScalarType::I32 | ScalarType::U32 => 4,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I8 | ScalarType::U8 => 1,
        }
    }
}

/// The memory format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One 32-bit float component.
    Float32,
    /// Two 32-bit float components.
    Float32x2,
    /// Three 32-bit float components.
    Float32x3,
    /// Four 32-bit float components.
    Float32x4,
    /// One 32-bit unsigned integer component.
    Uint32,
    /// Two 32-bit unsigned integer components.
    Uint32x2,
    /// Three 32-bit unsigned integer components.
    Uint32x3,
    /// Four 32-bit unsigned integer components.
    Uint32x4,
    /// One 32-bit signed integer component.
    Sint32,
    /// Two 32-bit signed integer components.
    Sint32x2,
    /// Three 32-bit signed integer components.
    Sint32x3,
    /// Four 32-bit signed integer components.
    Sint32x4,
    /// Two 16-bit signed integer components.
    Sint16x2,
    /// Four 16-bit signed integer components.
    Sint16x4,
    /// Four 8-bit unsigned integer components.
    Uint8x4,
    /// Four 8-bit signed integer components.
    Sint8x4,
}

impl VertexFormat {
    /// The number of components (1 to 4).
    pub const fn components(&self) -> u32 {
        match self {
            VertexFormat::Float32 | VertexFormat::Uint32 | VertexFormat::Sint32 => 1,
            VertexFormat::Float32x2
            | VertexFormat::Uint32x2
            | VertexFormat::Sint32x2
            | VertexFormat::Sint16x2 => 2,
            VertexFormat::Float32x3 | VertexFormat::Uint32x3 | VertexFormat::Sint32x3 => 3,
            VertexFormat::Float32x4
            | VertexFormat::Uint32x4
            | VertexFormat::Sint32x4
            | VertexFormat::Sint16x4
            | VertexFormat::Uint8x4
            | VertexFormat::Sint8x4 => 4,
        }
    }

    /// The scalar type of each component.
    pub const fn scalar(&self) -> ScalarType {
        match self {
            VertexFormat::Float32
            | VertexFormat::Float32x2
            | VertexFormat::Float32x3
            | VertexFormat::Float32x4 => ScalarType::F32,
            VertexFormat::Uint32
            | VertexFormat::Uint32x2
            | VertexFormat::Uint32x3
            | VertexFormat::Uint32x4 => ScalarType::U32,
            VertexFormat::Sint32
            | VertexFormat::Sint32x2
            | VertexFormat::Sint32x3
            | VertexFormat::Sint32x4 => ScalarType::I32,
            VertexFormat::Sint16x2 | VertexFormat::Sint16x4 => ScalarType::I16,
            VertexFormat::Uint8x4 => ScalarType::U8,
            VertexFormat::Sint8x4 => ScalarType::I8,
        }
    }

    /// The size in bytes of this vertex format.
    pub const fn size(&self) -> usize {
        self.components() as usize * self.scalar().size()
    }

    /// Returns `true` if the components are stored as integers.
    pub const fn is_integer(&self) -> bool {
        !matches!(self.scalar(), ScalarType::F32)
    }
}

/// How often a vertex buffer advances to its next element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// Once per vertex.
    #[default]
    Vertex,
    /// Once per instance.
    Instance,
}

/// A comparison function used by depth testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less than the existing one.
    #[default]
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the new value is less than or equal to the existing one.
    LessEqual,
    /// Passes if the new value is greater than the existing one.
    Greater,
    /// Passes if the values differ.
    NotEqual,
    /// Passes if the new value is greater than or equal to the existing one.
    GreaterEqual,
    /// Always passes.
    Always,
}

/// A multiplier applied to the source or destination color when blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`
    Zero,
    /// `1`
    One,
    /// Source color.
    SrcColor,
    /// `1 - source color`
    OneMinusSrcColor,
    /// Source alpha.
    SrcAlpha,
    /// `1 - source alpha`
    OneMinusSrcAlpha,
    /// Destination color.
    DstColor,
    /// `1 - destination color`
    OneMinusDstColor,
    /// Destination alpha.
    DstAlpha,
    /// `1 - destination alpha`
    OneMinusDstAlpha,
    /// The constant blend color.
    ConstantColor,
    /// `1 - constant blend color`
    OneMinusConstantColor,
}

/// How weighted source and destination colors are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// `src + dst`
    #[default]
    Add,
    /// `src - dst`
    Subtract,
    /// `dst - src`
    ReverseSubtract,
    /// `min(src, dst)`
    Min,
    /// `max(src, dst)`
    Max,
}

/// A polygon face selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Face {
    /// Front-facing polygons.
    Front,
    /// Back-facing polygons.
    #[default]
    Back,
    /// Both faces.
    FrontAndBack,
}

/// The winding order that marks a polygon as front-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise.
    #[default]
    Ccw,
    /// Clockwise.
    Cw,
}

/// A framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attachment {
    /// The n-th color attachment.
    Color(u32),
    /// The depth attachment.
    Depth,
    /// The stencil attachment.
    Stencil,
    /// The combined depth-stencil attachment.
    DepthStencil,
}

impl Attachment {
    /// Returns `true` for color attachments, which take part in the draw
    /// buffer list.
    pub const fn is_color(&self) -> bool {
        matches!(self, Attachment::Color(_))
    }
}

/// The two framebuffer binding targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FramebufferTarget {
    /// Destination of draw and clear commands.
    Draw,
    /// Source of read-backs and blits.
    Read,
}

/// The result of a framebuffer completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    /// The framebuffer can be rendered to.
    Complete,
    /// The default framebuffer does not exist.
    Undefined,
    /// An attachment is incomplete.
    IncompleteAttachment,
    /// No image is attached.
    MissingAttachment,
    /// A draw buffer names an attachment without an image.
    IncompleteDrawBuffer,
    /// The read buffer names an attachment without an image.
    IncompleteReadBuffer,
    /// The combination of formats is not supported by the implementation.
    Unsupported,
    /// Attachments disagree on sample counts.
    IncompleteMultisample,
    /// Layered and non-layered attachments are mixed.
    IncompleteLayerTargets,
    /// A status code the wrapper does not know about.
    Unknown(u32),
}

impl FramebufferStatus {
    /// Returns `true` for [`FramebufferStatus::Complete`].
    pub const fn is_complete(&self) -> bool {
        matches!(self, FramebufferStatus::Complete)
    }
}

/// Which buffers a clear command affects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    bits: u32,
}

impl ClearFlags {
    /// Clears nothing.
    pub const NONE: Self = Self { bits: 0 };
    /// The color buffers.
    pub const COLOR: Self = Self { bits: 1 << 0 };
    /// The depth buffer.
    pub const DEPTH: Self = Self { bits: 1 << 1 };
    /// The stencil buffer.
    pub const STENCIL: Self = Self { bits: 1 << 2 };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every flag of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for ClearFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for ClearFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_format_sizes() {
        assert_eq!(VertexFormat::Float32x3.size(), 12);
        assert_eq!(VertexFormat::Uint8x4.size(), 4);
        assert_eq!(VertexFormat::Sint16x2.size(), 4);
        assert!(VertexFormat::Uint32.is_integer());
        assert!(!VertexFormat::Float32x4.is_integer());
    }

    #[test]
    fn texture_format_layout() {
        assert_eq!(TextureFormat::Rgb32Float.channel_count(), 3);
        assert_eq!(TextureFormat::Rgba32Float.bytes_per_texel(), 16);
        assert!(TextureFormat::Depth32Float.is_depth());
        assert!(!TextureFormat::Rgba8Unorm.is_depth());
    }

    #[test]
    fn clear_flags_combine() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(flags.contains(ClearFlags::COLOR));
        assert!(flags.contains(ClearFlags::DEPTH));
        assert!(!flags.contains(ClearFlags::STENCIL));
        assert!(ClearFlags::NONE.is_empty());
    }

    #[test]
    fn map_access_directions() {
        assert!(MapAccess::Read.reads() && !MapAccess::Read.writes());
        assert!(MapAccess::Write.writes() && !MapAccess::Write.reads());
        assert!(MapAccess::ReadWrite.reads() && MapAccess::ReadWrite.writes());
    }

    #[test]
    fn only_color_attachments_are_draw_buffers() {
        assert!(Attachment::Color(2).is_color());
        assert!(!Attachment::DepthStencil.is_color());
    }
}
