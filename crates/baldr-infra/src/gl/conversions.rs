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

use baldr_core::api::{
    Attachment, BlendFactor, BlendOperation, BufferTarget, BufferUsage, ClearFlags,
    CompareFunction, Face, FilterMode, FramebufferStatus, FramebufferTarget, FrontFace,
    ImageAccess, IndexFormat, MapAccess, MemoryBarrier, PrimitiveTopology, ScalarType,
    ShaderStage, TextureFormat, TextureParameter, TextureTarget, UniformType, WrapMode,
};

/// A local extension trait to convert core types into OpenGL enums.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_gl()` syntax.
pub trait IntoGl<T> {
    /// Consumes self and converts it into its OpenGL value.
    fn into_gl(self) -> T;
}

/// The three enums `glTexImage*` needs for one storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlTextureFormat {
    /// The sized internal format.
    pub internal: u32,
    /// The client pixel format.
    pub format: u32,
    /// The client component type.
    pub ty: u32,
}

// --- Buffers ---

impl IntoGl<u32> for BufferTarget {
    fn into_gl(self) -> u32 {
        match self {
            BufferTarget::Array => glow::ARRAY_BUFFER,
            BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
            BufferTarget::Uniform => glow::UNIFORM_BUFFER,
            BufferTarget::CopyRead => glow::COPY_READ_BUFFER,
            BufferTarget::CopyWrite => glow::COPY_WRITE_BUFFER,
            BufferTarget::PixelPack => glow::PIXEL_PACK_BUFFER,
            BufferTarget::PixelUnpack => glow::PIXEL_UNPACK_BUFFER,
            BufferTarget::AtomicCounter => glow::ATOMIC_COUNTER_BUFFER,
            BufferTarget::ShaderStorage => glow::SHADER_STORAGE_BUFFER,
        }
    }
}

/// The access bits of `glMapBufferRange`.
impl IntoGl<u32> for MapAccess {
    fn into_gl(self) -> u32 {
        match self {
            MapAccess::Read => glow::MAP_READ_BIT,
            MapAccess::Write => glow::MAP_WRITE_BIT,
            MapAccess::ReadWrite => glow::MAP_READ_BIT | glow::MAP_WRITE_BIT,
        }
    }
}

impl IntoGl<u32> for BufferUsage {
    fn into_gl(self) -> u32 {
        match self {
            BufferUsage::StaticDraw => glow::STATIC_DRAW,
            BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
            BufferUsage::StreamDraw => glow::STREAM_DRAW,
            BufferUsage::StaticRead => glow::STATIC_READ,
            BufferUsage::DynamicRead => glow::DYNAMIC_READ,
            BufferUsage::StreamRead => glow::STREAM_READ,
            BufferUsage::StaticCopy => glow::STATIC_COPY,
            BufferUsage::DynamicCopy => glow::DYNAMIC_COPY,
            BufferUsage::StreamCopy => glow::STREAM_COPY,
        }
    }
}

// --- Textures ---

impl IntoGl<u32> for TextureTarget {
    fn into_gl(self) -> u32 {
        match self {
            TextureTarget::D2 => glow::TEXTURE_2D,
            TextureTarget::D2Array => glow::TEXTURE_2D_ARRAY,
            TextureTarget::D3 => glow::TEXTURE_3D,
        }
    }
}

impl IntoGl<GlTextureFormat> for TextureFormat {
    fn into_gl(self) -> GlTextureFormat {
        let (internal, format, ty) = match self {
            TextureFormat::R8Unorm => (glow::R8, glow::RED, glow::UNSIGNED_BYTE),
            TextureFormat::Rgba8Unorm => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
            TextureFormat::R32Float => (glow::R32F, glow::RED, glow::FLOAT),
            TextureFormat::Rg32Float => (glow::RG32F, glow::RG, glow::FLOAT),
            TextureFormat::Rgb32Float => (glow::RGB32F, glow::RGB, glow::FLOAT),
            TextureFormat::Rgba32Float => (glow::RGBA32F, glow::RGBA, glow::FLOAT),
            TextureFormat::Depth32Float => {
                (glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT)
            }
            TextureFormat::Depth24Stencil8 => (
                glow::DEPTH24_STENCIL8,
                glow::DEPTH_STENCIL,
                glow::UNSIGNED_INT_24_8,
            ),
        };
        GlTextureFormat {
            internal,
            format,
            ty,
        }
    }
}

impl IntoGl<u32> for FilterMode {
    fn into_gl(self) -> u32 {
        match self {
            FilterMode::Nearest => glow::NEAREST,
            FilterMode::Linear => glow::LINEAR,
            FilterMode::NearestMipmapNearest => glow::NEAREST_MIPMAP_NEAREST,
            FilterMode::LinearMipmapNearest => glow::LINEAR_MIPMAP_NEAREST,
            FilterMode::NearestMipmapLinear => glow::NEAREST_MIPMAP_LINEAR,
            FilterMode::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl IntoGl<u32> for WrapMode {
    fn into_gl(self) -> u32 {
        match self {
            WrapMode::ClampToEdge => glow::CLAMP_TO_EDGE,
            WrapMode::ClampToBorder => glow::CLAMP_TO_BORDER,
            WrapMode::Repeat => glow::REPEAT,
            WrapMode::MirroredRepeat => glow::MIRRORED_REPEAT,
        }
    }
}

/// `(pname, value)` for `glTexParameteri`.
impl IntoGl<(u32, i32)> for TextureParameter {
    fn into_gl(self) -> (u32, i32) {
        match self {
            TextureParameter::MinFilter(mode) => (glow::TEXTURE_MIN_FILTER, mode.into_gl() as i32),
            TextureParameter::MagFilter(mode) => (glow::TEXTURE_MAG_FILTER, mode.into_gl() as i32),
            TextureParameter::WrapS(mode) => (glow::TEXTURE_WRAP_S, mode.into_gl() as i32),
            TextureParameter::WrapT(mode) => (glow::TEXTURE_WRAP_T, mode.into_gl() as i32),
            TextureParameter::WrapR(mode) => (glow::TEXTURE_WRAP_R, mode.into_gl() as i32),
            TextureParameter::MaxLevel(level) => (glow::TEXTURE_MAX_LEVEL, level as i32),
        }
    }
}

impl IntoGl<u32> for ImageAccess {
    fn into_gl(self) -> u32 {
        match self {
            ImageAccess::ReadOnly => glow::READ_ONLY,
            ImageAccess::WriteOnly => glow::WRITE_ONLY,
            ImageAccess::ReadWrite => glow::READ_WRITE,
        }
    }
}

// --- Shaders and draws ---

impl IntoGl<u32> for ShaderStage {
    fn into_gl(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
            ShaderStage::Geometry => glow::GEOMETRY_SHADER,
            ShaderStage::Compute => glow::COMPUTE_SHADER,
        }
    }
}

impl IntoGl<u32> for PrimitiveTopology {
    fn into_gl(self) -> u32 {
        match self {
            PrimitiveTopology::PointList => glow::POINTS,
            PrimitiveTopology::LineList => glow::LINES,
            PrimitiveTopology::LineStrip => glow::LINE_STRIP,
            PrimitiveTopology::TriangleList => glow::TRIANGLES,
            PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
            PrimitiveTopology::TriangleFan => glow::TRIANGLE_FAN,
        }
    }
}

impl IntoGl<u32> for IndexFormat {
    fn into_gl(self) -> u32 {
        match self {
            IndexFormat::Uint16 => glow::UNSIGNED_SHORT,
            IndexFormat::Uint32 => glow::UNSIGNED_INT,
        }
    }
}

impl IntoGl<u32> for ScalarType {
    fn into_gl(self) -> u32 {
        match self {
            ScalarType::F32 => glow::FLOAT,
            ScalarType::I32 => glow::INT,
            ScalarType::U32 => glow::UNSIGNED_INT,
            ScalarType::I16 => glow::SHORT,
            ScalarType::U16 => glow::UNSIGNED_SHORT,
            ScalarType::I8 => glow::BYTE,
            ScalarType::U8 => glow::UNSIGNED_BYTE,
        }
    }
}

impl IntoGl<u32> for MemoryBarrier {
    fn into_gl(self) -> u32 {
        match self {
            MemoryBarrier::All => glow::ALL_BARRIER_BITS,
            MemoryBarrier::ShaderImageAccess => glow::SHADER_IMAGE_ACCESS_BARRIER_BIT,
            MemoryBarrier::ShaderStorage => glow::SHADER_STORAGE_BARRIER_BIT,
            MemoryBarrier::AtomicCounter => glow::ATOMIC_COUNTER_BARRIER_BIT,
            MemoryBarrier::BufferUpdate => glow::BUFFER_UPDATE_BARRIER_BIT,
            MemoryBarrier::TextureUpdate => glow::TEXTURE_UPDATE_BARRIER_BIT,
        }
    }
}

// --- Fixed-function state ---

impl IntoGl<u32> for CompareFunction {
    fn into_gl(self) -> u32 {
        match self {
            CompareFunction::Never => glow::NEVER,
            CompareFunction::Less => glow::LESS,
            CompareFunction::Equal => glow::EQUAL,
            CompareFunction::LessEqual => glow::LEQUAL,
            CompareFunction::Greater => glow::GREATER,
            CompareFunction::NotEqual => glow::NOTEQUAL,
            CompareFunction::GreaterEqual => glow::GEQUAL,
            CompareFunction::Always => glow::ALWAYS,
        }
    }
}

impl IntoGl<u32> for BlendFactor {
    fn into_gl(self) -> u32 {
        match self {
            BlendFactor::Zero => glow::ZERO,
            BlendFactor::One => glow::ONE,
            BlendFactor::SrcColor => glow::SRC_COLOR,
            BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
            BlendFactor::SrcAlpha => glow::SRC_ALPHA,
            BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
            BlendFactor::DstColor => glow::DST_COLOR,
            BlendFactor::OneMinusDstColor => glow::ONE_MINUS_DST_COLOR,
            BlendFactor::DstAlpha => glow::DST_ALPHA,
            BlendFactor::OneMinusDstAlpha => glow::ONE_MINUS_DST_ALPHA,
            BlendFactor::ConstantColor => glow::CONSTANT_COLOR,
            BlendFactor::OneMinusConstantColor => glow::ONE_MINUS_CONSTANT_COLOR,
        }
    }
}

impl IntoGl<u32> for BlendOperation {
    fn into_gl(self) -> u32 {
        match self {
            BlendOperation::Add => glow::FUNC_ADD,
            BlendOperation::Subtract => glow::FUNC_SUBTRACT,
            BlendOperation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
            BlendOperation::Min => glow::MIN,
            BlendOperation::Max => glow::MAX,
        }
    }
}

impl IntoGl<u32> for Face {
    fn into_gl(self) -> u32 {
        match self {
            Face::Front => glow::FRONT,
            Face::Back => glow::BACK,
            Face::FrontAndBack => glow::FRONT_AND_BACK,
        }
    }
}

impl IntoGl<u32> for FrontFace {
    fn into_gl(self) -> u32 {
        match self {
            FrontFace::Ccw => glow::CCW,
            FrontFace::Cw => glow::CW,
        }
    }
}

// --- Framebuffers ---

impl IntoGl<u32> for Attachment {
    fn into_gl(self) -> u32 {
        match self {
            Attachment::Color(index) => glow::COLOR_ATTACHMENT0 + index,
            Attachment::Depth => glow::DEPTH_ATTACHMENT,
            Attachment::Stencil => glow::STENCIL_ATTACHMENT,
            Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
        }
    }
}

impl IntoGl<u32> for FramebufferTarget {
    fn into_gl(self) -> u32 {
        match self {
            FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
            FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
        }
    }
}

impl IntoGl<u32> for ClearFlags {
    fn into_gl(self) -> u32 {
        let mut mask = 0;
        if self.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if self.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if self.contains(ClearFlags::STENCIL) {
            mask |= glow::STENCIL_BUFFER_BIT;
        }
        mask
    }
}

/// Converts a `glCheckFramebufferStatus` result.
pub fn framebuffer_status_from_gl(status: u32) -> FramebufferStatus {
    match status {
        glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
        glow::FRAMEBUFFER_UNDEFINED => FramebufferStatus::Undefined,
        glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
        glow::FRAMEBUFFER_INCOMPLETE_DRAW_BUFFER => FramebufferStatus::IncompleteDrawBuffer,
        glow::FRAMEBUFFER_INCOMPLETE_READ_BUFFER => FramebufferStatus::IncompleteReadBuffer,
        glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
        glow::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
        glow::FRAMEBUFFER_INCOMPLETE_LAYER_TARGETS => FramebufferStatus::IncompleteLayerTargets,
        other => {
            log::warn!("Unknown framebuffer status {other:#x}");
            FramebufferStatus::Unknown(other)
        }
    }
}

/// Converts the type reported for an active uniform or attribute.
///
/// Every sampler and image flavor collapses into one variant; the core only
/// needs to know that they are bound through units. Atomic counters keep
/// their own variant, being bound through buffers.
pub fn uniform_type_from_gl(ty: u32) -> UniformType {
    match ty {
        glow::FLOAT => UniformType::Float,
        glow::FLOAT_VEC2 => UniformType::Vec2,
        glow::FLOAT_VEC3 => UniformType::Vec3,
        glow::FLOAT_VEC4 => UniformType::Vec4,
        glow::INT => UniformType::Int,
        glow::INT_VEC2 => UniformType::IVec2,
        glow::INT_VEC3 => UniformType::IVec3,
        glow::INT_VEC4 => UniformType::IVec4,
        glow::UNSIGNED_INT => UniformType::UInt,
        glow::UNSIGNED_INT_VEC2 => UniformType::UVec2,
        glow::UNSIGNED_INT_VEC3 => UniformType::UVec3,
        glow::UNSIGNED_INT_VEC4 => UniformType::UVec4,
        glow::BOOL => UniformType::Bool,
        glow::FLOAT_MAT2 => UniformType::Mat2,
        glow::FLOAT_MAT3 => UniformType::Mat3,
        glow::FLOAT_MAT4 => UniformType::Mat4,
        glow::SAMPLER_1D
        | glow::SAMPLER_2D
        | glow::SAMPLER_3D
        | glow::SAMPLER_CUBE
        | glow::SAMPLER_2D_SHADOW
        | glow::SAMPLER_2D_ARRAY
        | glow::SAMPLER_2D_ARRAY_SHADOW
        | glow::SAMPLER_CUBE_SHADOW
        | glow::SAMPLER_2D_MULTISAMPLE
        | glow::SAMPLER_BUFFER
        | glow::INT_SAMPLER_2D
        | glow::INT_SAMPLER_3D
        | glow::INT_SAMPLER_2D_ARRAY
        | glow::UNSIGNED_INT_SAMPLER_2D
        | glow::UNSIGNED_INT_SAMPLER_3D
        | glow::UNSIGNED_INT_SAMPLER_2D_ARRAY => UniformType::Sampler,
        glow::IMAGE_2D
        | glow::IMAGE_3D
        | glow::IMAGE_2D_ARRAY
        | glow::INT_IMAGE_2D
        | glow::UNSIGNED_INT_IMAGE_2D => UniformType::Image,
        glow::UNSIGNED_INT_ATOMIC_COUNTER => UniformType::AtomicCounter,
        other => UniformType::Other(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_attachments_are_offset_from_zero() {
        assert_eq!(Attachment::Color(3).into_gl(), glow::COLOR_ATTACHMENT0 + 3);
    }

    #[test]
    fn clear_flags_build_a_mask() {
        let mask: u32 = (ClearFlags::COLOR | ClearFlags::STENCIL).into_gl();
        assert_eq!(mask, glow::COLOR_BUFFER_BIT | glow::STENCIL_BUFFER_BIT);
        assert_eq!(IntoGl::<u32>::into_gl(ClearFlags::NONE), 0);
    }

    #[test]
    fn depth_formats_use_depth_client_formats() {
        let format: GlTextureFormat = TextureFormat::Depth24Stencil8.into_gl();
        assert_eq!(format.format, glow::DEPTH_STENCIL);
        assert_eq!(format.ty, glow::UNSIGNED_INT_24_8);
    }

    #[test]
    fn sampler_flavors_collapse() {
        assert_eq!(uniform_type_from_gl(glow::SAMPLER_2D_ARRAY_SHADOW), UniformType::Sampler);
        assert_eq!(uniform_type_from_gl(glow::UNSIGNED_INT_SAMPLER_3D), UniformType::Sampler);
        assert_eq!(uniform_type_from_gl(glow::BOOL_VEC3), UniformType::Other(glow::BOOL_VEC3));
        assert_eq!(
            uniform_type_from_gl(glow::UNSIGNED_INT_ATOMIC_COUNTER),
            UniformType::AtomicCounter
        );
    }

    #[test]
    fn read_write_mapping_sets_both_bits() {
        let bits: u32 = MapAccess::ReadWrite.into_gl();
        assert_eq!(bits, glow::MAP_READ_BIT | glow::MAP_WRITE_BIT);
        assert_eq!(IntoGl::<u32>::into_gl(MapAccess::Write), glow::MAP_WRITE_BIT);
    }

    #[test]
    fn compute_enums_match_gl() {
        assert_eq!(IntoGl::<u32>::into_gl(ImageAccess::default()), glow::READ_WRITE);
        assert_eq!(IntoGl::<u32>::into_gl(MemoryBarrier::default()), glow::ALL_BARRIER_BITS);
        assert_eq!(
            IntoGl::<u32>::into_gl(BufferTarget::ShaderStorage),
            glow::SHADER_STORAGE_BUFFER
        );
    }
}
