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
use crate::api::*;
use crate::binding::BindingPoint;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handle::ObjectKind;
use bytemuck::Pod;

/// An owned texture with immutable shape and format.
///
/// Uploads and parameter edits bind the texture on the context's scratch
/// texture unit; see [`ContextSettings`](crate::ContextSettings).
#[derive(Debug)]
pub struct Texture {
    pub(crate) raw: OwnedHandle,
    target: TextureTarget,
    extent: Extent3D,
    format: TextureFormat,
    levels: u32,
    filter: (FilterMode, FilterMode),
    wrap: [WrapMode; 3],
    max_level: u32,
}

impl Texture {
    /// Allocates every mip level of the texture and applies the sampling
    /// parameters of `descriptor`.
    pub fn new(context: &Context, descriptor: &TextureDescriptor) -> Result<Self> {
        let raw = OwnedHandle::allocate(
            context,
            ObjectKind::Texture,
            descriptor.label.as_deref(),
            |api| api.create_texture(),
        )?;
        let levels = descriptor.levels.max(1);
        let mut texture = Self {
            raw,
            target: descriptor.dimension.target(),
            extent: descriptor.dimension.extent(),
            format: descriptor.format,
            levels,
            filter: descriptor.filter,
            wrap: descriptor.wrap,
            max_level: levels - 1,
        };

        texture.bind_scratch()?;
        let api = context.api();
        for level in 0..levels {
            api.tex_image(
                texture.target,
                level,
                texture.format,
                texture.extent.mip_level(level, texture.target),
                None,
            );
        }
        texture.set_filter(descriptor.filter.0, descriptor.filter.1)?;
        texture.set_wrap_mode(descriptor.wrap)?;
        texture.reset_max_level()?;
        Ok(texture)
    }

    fn d2(context: &Context, width: u32, height: u32, format: TextureFormat) -> Result<Self> {
        Self::new(
            context,
            &TextureDescriptor::new(TextureDimension::D2 { width, height }, format),
        )
    }

    /// A 2D texture with one 32-bit float channel.
    pub fn r32f(context: &Context, width: u32, height: u32) -> Result<Self> {
        Self::d2(context, width, height, TextureFormat::R32Float)
    }

    /// A 2D texture with two 32-bit float channels.
    pub fn rg32f(context: &Context, width: u32, height: u32) -> Result<Self> {
        Self::d2(context, width, height, TextureFormat::Rg32Float)
    }

    /// A 2D texture with three 32-bit float channels.
    pub fn rgb32f(context: &Context, width: u32, height: u32) -> Result<Self> {
        Self::d2(context, width, height, TextureFormat::Rgb32Float)
    }

    /// A 2D texture with four 32-bit float channels.
    pub fn rgba32f(context: &Context, width: u32, height: u32) -> Result<Self> {
        Self::d2(context, width, height, TextureFormat::Rgba32Float)
    }

    /// A 2D texture with four 8-bit normalized channels.
    pub fn rgba8(context: &Context, width: u32, height: u32) -> Result<Self> {
        Self::d2(context, width, height, TextureFormat::Rgba8Unorm)
    }

    /// A 2D 32-bit float depth texture.
    pub fn depth32f(context: &Context, width: u32, height: u32) -> Result<Self> {
        Self::d2(context, width, height, TextureFormat::Depth32Float)
    }

    fn bind_scratch(&self) -> Result<()> {
        let context = self.raw.context();
        let point = BindingPoint::Texture {
            unit: context.settings().scratch_texture_unit,
            target: self.target,
        };
        context.bind(point, Some(self.raw.get()?))?;
        Ok(())
    }

    /// Replaces the contents of the base level.
    pub fn write(&self, data: &[u8]) -> Result<()> {
        self.write_level(0, data)
    }

    /// Replaces the contents of the base level with plain-old-data texels.
    pub fn write_pod<T: Pod>(&self, texels: &[T]) -> Result<()> {
        self.write_level(0, bytemuck::cast_slice(texels))
    }

    /// Replaces the contents of mip `level`.
    /// ## Errors
    /// * `Error::InvalidMipLevel` - If the texture has no such level.
    /// * `Error::DataSizeMismatch` - If `data` does not cover the level
    ///   exactly, with tightly packed texels.
    pub fn write_level(&self, level: u32, data: &[u8]) -> Result<()> {
        if level >= self.levels {
            return Err(Error::InvalidMipLevel {
                level,
                levels: self.levels,
            });
        }
        let extent = self.extent.mip_level(level, self.target);
        let expected = extent.texel_count() * self.format.bytes_per_texel();
        if data.len() != expected {
            return Err(Error::DataSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.bind_scratch()?;
        self.raw
            .context()
            .api()
            .tex_image(self.target, level, self.format, extent, Some(data));
        Ok(())
    }

    /// Reads back the base level.
    pub fn read(&self) -> Result<Vec<u8>> {
        self.read_level(0)
    }

    /// Reads back mip `level` as tightly packed texels.
    /// ## Errors
    /// * `Error::InvalidMipLevel` - If the texture has no such level.
    pub fn read_level(&self, level: u32) -> Result<Vec<u8>> {
        if level >= self.levels {
            return Err(Error::InvalidMipLevel {
                level,
                levels: self.levels,
            });
        }
        let extent = self.extent.mip_level(level, self.target);
        let mut texels = vec![0; extent.texel_count() * self.format.bytes_per_texel()];
        self.bind_scratch()?;
        self.raw
            .context()
            .api()
            .get_tex_image(self.target, level, self.format, &mut texels);
        Ok(texels)
    }

    /// Reads back mip `level` as plain-old-data texels.
    /// ## Errors
    /// * `Error::DataSizeMismatch` - If one texel is not a whole number of
    ///   `T` values.
    pub fn read_pod<T: Pod>(&self, level: u32) -> Result<Vec<T>> {
        let element = std::mem::size_of::<T>().max(1);
        if self.format.bytes_per_texel() % element != 0 {
            return Err(Error::DataSizeMismatch {
                expected: self.format.bytes_per_texel(),
                actual: element,
            });
        }
        let bytes = self.read_level(level)?;
        let mut values = vec![<T as bytemuck::Zeroable>::zeroed(); bytes.len() / element];
        bytemuck::cast_slice_mut::<T, u8>(&mut values).copy_from_slice(&bytes);
        Ok(values)
    }

    fn parameter(&self, parameter: TextureParameter) -> Result<()> {
        self.bind_scratch()?;
        self.raw.context().api().tex_parameter(self.target, parameter);
        Ok(())
    }

    /// Sets the minification and magnification filters.
    pub fn set_filter(&mut self, min: FilterMode, mag: FilterMode) -> Result<()> {
        self.parameter(TextureParameter::MinFilter(min))?;
        self.parameter(TextureParameter::MagFilter(mag))?;
        self.filter = (min, mag);
        Ok(())
    }

    /// Sets the wrap modes along S, T and R.
    pub fn set_wrap_mode(&mut self, wrap: [WrapMode; 3]) -> Result<()> {
        self.parameter(TextureParameter::WrapS(wrap[0]))?;
        self.parameter(TextureParameter::WrapT(wrap[1]))?;
        self.parameter(TextureParameter::WrapR(wrap[2]))?;
        self.wrap = wrap;
        Ok(())
    }

    /// Restricts sampling to mip levels up to `level`, clamped to the
    /// levels the texture has.
    pub fn set_max_level(&mut self, level: u32) -> Result<()> {
        let level = level.min(self.levels - 1);
        self.parameter(TextureParameter::MaxLevel(level))?;
        self.max_level = level;
        Ok(())
    }

    /// Makes every allocated mip level available to sampling again.
    pub fn reset_max_level(&mut self) -> Result<()> {
        self.set_max_level(self.levels - 1)
    }

    /// Regenerates levels 1 and up from the base level.
    pub fn generate_mipmap(&self) -> Result<()> {
        self.bind_scratch()?;
        self.raw.context().api().generate_mipmap(self.target);
        Ok(())
    }

    /// Moves the native texture into a new wrapper and leaves this one empty.
    pub fn take(&mut self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.take()?,
            ..*self
        })
    }

    /// The binding target.
    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// The size of the base level.
    pub fn extent(&self) -> Extent3D {
        self.extent
    }

    /// The storage format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The number of channels of one texel.
    pub fn channel_count(&self) -> u32 {
        self.format.channel_count()
    }

    /// The number of allocated mip levels.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// The highest mip level sampling may use.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// The minification and magnification filters.
    pub fn filter(&self) -> (FilterMode, FilterMode) {
        self.filter
    }

    /// The wrap modes along S, T and R.
    pub fn wrap_mode(&self) -> [WrapMode; 3] {
        self.wrap
    }
}
