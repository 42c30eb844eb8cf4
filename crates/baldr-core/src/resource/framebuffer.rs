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

use super::{OwnedHandle, Resource, Texture};
use crate::api::{Attachment, FramebufferStatus, FramebufferTarget, TextureTarget};
use crate::binding::BindingPoint;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::handle::{Handle, ObjectKind};
use std::collections::BTreeMap;

const DRAW: BindingPoint = BindingPoint::Framebuffer(FramebufferTarget::Draw);

/// A texture image attached to a framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedImage {
    /// The attached texture. Not owned; checked for liveness at draw time.
    pub texture: Handle,
    /// The texture's target.
    pub target: TextureTarget,
    /// The attached mip level.
    pub level: u32,
    /// The attached layer, for single-layer attachments of array and 3D
    /// textures.
    pub layer: Option<u32>,
}

/// An owned framebuffer object.
///
/// The default framebuffer has no wrapper; APIs taking an
/// `Option<&Framebuffer>` use `None` for it, and it is always complete.
#[derive(Debug)]
pub struct Framebuffer {
    pub(crate) raw: OwnedHandle,
    attachments: BTreeMap<Attachment, AttachedImage>,
    status: FramebufferStatus,
}

impl Framebuffer {
    /// Creates a framebuffer with no attachments.
    pub fn new(context: &Context, label: Option<&str>) -> Result<Self> {
        let raw = OwnedHandle::allocate(context, ObjectKind::Framebuffer, label, |api| {
            api.create_framebuffer()
        })?;
        context.bind(DRAW, Some(raw.get()?))?;
        let status = context.api().framebuffer_status(FramebufferTarget::Draw);
        Ok(Self {
            raw,
            attachments: BTreeMap::new(),
            status,
        })
    }

    /// Attaches mip `level` of `texture` at `attachment`, replacing what was
    /// there.
    /// ## Returns
    /// The completeness status after the change.
    pub fn attach(
        &mut self,
        attachment: Attachment,
        texture: &Texture,
        level: u32,
    ) -> Result<FramebufferStatus> {
        self.attach_image(attachment, texture, level, None)
    }

    /// Attaches a single `layer` of mip `level` of an array or 3D `texture`.
    pub fn attach_layer(
        &mut self,
        attachment: Attachment,
        texture: &Texture,
        level: u32,
        layer: u32,
    ) -> Result<FramebufferStatus> {
        self.attach_image(attachment, texture, level, Some(layer))
    }

    fn attach_image(
        &mut self,
        attachment: Attachment,
        texture: &Texture,
        level: u32,
        layer: Option<u32>,
    ) -> Result<FramebufferStatus> {
        self.raw
            .context()
            .check_reference(texture.context(), ObjectKind::Texture)?;
        let image = AttachedImage {
            texture: texture.raw.get()?,
            target: texture.target(),
            level,
            layer,
        };
        let context = self.raw.context();
        context.bind(DRAW, Some(self.raw.get()?))?;
        context.api().framebuffer_texture(
            FramebufferTarget::Draw,
            attachment,
            Some((image.texture.id(), image.target)),
            level,
            layer,
        );
        self.attachments.insert(attachment, image);
        Ok(self.refresh(attachment))
    }

    /// Removes the image at `attachment`.
    /// ## Errors
    /// * `Error::AttachmentMissing` - If nothing is attached there.
    pub fn detach(&mut self, attachment: Attachment) -> Result<FramebufferStatus> {
        let handle = self.raw.get()?;
        if !self.attachments.contains_key(&attachment) {
            return Err(Error::AttachmentMissing(attachment));
        }
        let context = self.raw.context();
        context.bind(DRAW, Some(handle))?;
        context
            .api()
            .framebuffer_texture(FramebufferTarget::Draw, attachment, None, 0, None);
        self.attachments.remove(&attachment);
        Ok(self.refresh(attachment))
    }

    // Expects the framebuffer to be bound to the draw target.
    fn refresh(&mut self, changed: Attachment) -> FramebufferStatus {
        let api = self.raw.context().api();
        let colors = self
            .attachments
            .keys()
            .copied()
            .filter(Attachment::is_color)
            .collect::<Vec<_>>();
        if changed.is_color() && !colors.is_empty() {
            api.draw_buffers(&colors);
        }
        self.status = api.framebuffer_status(FramebufferTarget::Draw);
        if !self.status.is_complete() {
            log::debug!(
                "Framebuffer: '{}' is {:?} after changing {changed:?}",
                self.raw.label().unwrap_or("Unknown"),
                self.status
            );
        }
        self.status
    }

    /// The status reported after the last attachment change.
    pub fn status(&self) -> FramebufferStatus {
        self.status
    }

    /// Returns `true` if the last reported status was complete.
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    /// The image attached at `attachment`, if any.
    pub fn attachment(&self, attachment: Attachment) -> Option<AttachedImage> {
        self.attachments.get(&attachment).copied()
    }

    /// Every attachment, in attachment order.
    pub fn attachments(&self) -> impl Iterator<Item = (Attachment, AttachedImage)> + '_ {
        self.attachments.iter().map(|(a, image)| (*a, *image))
    }

    /// Binds the framebuffer to `target`.
    pub fn bind(&self, target: FramebufferTarget) -> Result<bool> {
        self.raw
            .context()
            .bind(BindingPoint::Framebuffer(target), Some(self.raw.get()?))
    }

    /// Clears every color attachment to `rgba`.
    pub fn clear_color(&self, rgba: [f32; 4]) -> Result<()> {
        self.raw.context().clear_color(Some(self), rgba)
    }

    /// The draw buffer index a color attachment is written through.
    ///
    /// Draw buffers list the color attachments in attachment order, so with
    /// `Color(0)` and `Color(2)` attached the latter is draw buffer 1.
    pub fn draw_buffer_of(&self, attachment: Attachment) -> Option<u32> {
        if !attachment.is_color() || !self.attachments.contains_key(&attachment) {
            return None;
        }
        let index = self
            .attachments
            .keys()
            .filter(|a| a.is_color() && **a < attachment)
            .count();
        Some(index as u32)
    }

    /// Clears only the color attachment `attachment` to `rgba`, leaving the
    /// other color attachments untouched.
    /// ## Errors
    /// * `Error::AttachmentMissing` - If no color image is attached there.
    pub fn clear_attachment(&self, attachment: Attachment, rgba: [f32; 4]) -> Result<()> {
        let draw_buffer = self
            .draw_buffer_of(attachment)
            .ok_or(Error::AttachmentMissing(attachment))?;
        self.raw
            .context()
            .clear_color_buffer(Some(self), draw_buffer, rgba)
    }

    /// Clears the depth attachment to `depth`.
    pub fn clear_depth(&self, depth: f32) -> Result<()> {
        self.raw.context().clear_depth(Some(self), depth)
    }

    /// Moves the native framebuffer into a new wrapper and leaves this one
    /// empty.
    pub fn take(&mut self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.take()?,
            attachments: std::mem::take(&mut self.attachments),
            status: self.status,
        })
    }
}
