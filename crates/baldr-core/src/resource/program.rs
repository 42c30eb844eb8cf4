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

use super::{OwnedHandle, Shader, Texture};
use crate::api::{
    ImageAccess, ShaderStage, TextureFormat, TextureTarget, UniformData, UniformScalar,
    UniformType,
};
use crate::binding::BindingPoint;
use crate::context::Context;
use crate::error::{CreationError, Error, Result};
use crate::handle::{Handle, ObjectKind};
use crate::introspection::{AttributeInfo, OutputInfo, ProgramInterface, UniformInfo};
use crate::resource::Resource;
use bytemuck::Pod;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
struct ImageBinding {
    texture: Handle,
    level: u32,
    access: ImageAccess,
    format: TextureFormat,
}

/// An owned shader program together with its introspected interface.
#[derive(Debug)]
pub struct Program {
    pub(crate) raw: OwnedHandle,
    linked: Cell<bool>,
    compute: Cell<bool>,
    interface: RefCell<ProgramInterface>,
    // Texture units whose sampler was assigned through `set_texture`.
    textures: RefCell<BTreeMap<u32, (Handle, TextureTarget)>>,
    // Image units assigned through `set_image`.
    images: RefCell<BTreeMap<u32, ImageBinding>>,
}

impl Program {
    /// Creates a program, links `shaders` into it and introspects the result.
    /// ## Errors
    /// * `Error::Creation` - With the linker log if linking fails.
    /// * `Error::Introspection` - If the active variables cannot be queried.
    /// * `Error::UseAfterMove` - If one of the shaders was emptied.
    pub fn link(context: &Context, label: Option<&str>, shaders: &[&Shader]) -> Result<Self> {
        let raw = OwnedHandle::allocate(context, ObjectKind::Program, label, |api| {
            api.create_program()
        })?;
        let program = Self {
            raw,
            linked: Cell::new(false),
            compute: Cell::new(false),
            interface: RefCell::new(ProgramInterface::stale()),
            textures: RefCell::new(BTreeMap::new()),
            images: RefCell::new(BTreeMap::new()),
        };
        program.link_stages(shaders)?;
        Ok(program)
    }

    /// Links a new set of stages into this program.
    ///
    /// The previous interface, texture and image assignments are discarded,
    /// even if linking fails; a failed relink leaves the program unlinked.
    pub fn relink(&mut self, shaders: &[&Shader]) -> Result<()> {
        self.link_stages(shaders)
    }

    fn link_stages(&self, shaders: &[&Shader]) -> Result<()> {
        let id = self.raw.get()?.id();
        let shader_ids = shaders
            .iter()
            .map(|shader| shader.raw.get().map(|handle| handle.id()))
            .collect::<Result<Vec<_>>>()?;

        self.linked.set(false);
        self.interface.borrow_mut().invalidate();
        self.textures.borrow_mut().clear();
        self.images.borrow_mut().clear();
        self.compute.set(
            shaders
                .iter()
                .any(|shader| shader.stage() == ShaderStage::Compute),
        );

        let api = self.raw.context().api();
        for shader in &shader_ids {
            api.attach_shader(id, *shader);
        }
        let linked = api.link_program(id);
        for shader in &shader_ids {
            api.detach_shader(id, *shader);
        }

        if let Err(log) = linked {
            log::warn!(
                "Program: Link of '{}' failed:\n{log}",
                self.raw.label().unwrap_or("Unknown")
            );
            return Err(CreationError::link(self.raw.label(), log).into());
        }
        self.linked.set(true);

        let interface = ProgramInterface::introspect(api, id)?;
        *self.interface.borrow_mut() = interface;
        Ok(())
    }

    /// Returns `true` if the last link succeeded.
    pub fn is_linked(&self) -> bool {
        self.linked.get()
    }

    /// Returns `true` if the last link was of a compute shader.
    pub fn is_compute(&self) -> bool {
        self.compute.get()
    }

    fn with_interface<R>(&self, f: impl FnOnce(&ProgramInterface) -> Result<R>) -> Result<R> {
        let handle = self.raw.get()?;
        if self.interface.borrow().is_stale() {
            if !self.linked.get() {
                return Err(Error::Introspection(format!(
                    "program '{}' is not linked",
                    self.raw.label().unwrap_or("Unknown")
                )));
            }
            let interface = ProgramInterface::introspect(self.raw.context().api(), handle.id())?;
            *self.interface.borrow_mut() = interface;
        }
        f(&self.interface.borrow())
    }

    /// The location of the active uniform `name`.
    ///
    /// Uniforms the compiler eliminated are indistinguishable from typos;
    /// both produce `Error::UnknownUniform`.
    pub fn location_of(&self, name: &str) -> Result<u32> {
        self.with_interface(|interface| interface.location_of(name))
    }

    /// Everything known about the active uniform `name`.
    pub fn uniform(&self, name: &str) -> Result<UniformInfo> {
        self.with_interface(|interface| interface.uniform(name).copied())
    }

    /// Everything known about the active attribute `name`.
    pub fn attribute(&self, name: &str) -> Result<AttributeInfo> {
        self.with_interface(|interface| interface.attribute(name).copied())
    }

    /// The location of the active attribute `name`.
    pub fn attribute_location(&self, name: &str) -> Result<u32> {
        self.with_interface(|interface| interface.attribute_location(name))
    }

    /// The number of texture units the program's samplers occupy.
    pub fn sampler_units(&self) -> Result<u32> {
        self.with_interface(|interface| Ok(interface.sampler_units()))
    }

    /// The number of image units the program's images occupy.
    pub fn image_units(&self) -> Result<u32> {
        self.with_interface(|interface| Ok(interface.image_units()))
    }

    /// The buffer binding point of the atomic counter `name`; bind a buffer
    /// there with [`Buffer::bind_atomic_counter`](super::Buffer::bind_atomic_counter).
    pub fn atomic_counter_binding(&self, name: &str) -> Result<u32> {
        self.with_interface(|interface| interface.atomic_counter_binding(name))
    }

    /// Everything known about the fragment output `name`.
    pub fn output(&self, name: &str) -> Result<OutputInfo> {
        self.with_interface(|interface| interface.output(name).copied())
    }

    /// The location of the fragment output `name`, which is also the index
    /// of the draw buffer it writes to.
    pub fn output_location(&self, name: &str) -> Result<u32> {
        self.with_interface(|interface| interface.output_location(name))
    }

    /// Makes this the current program.
    pub fn bind(&self) -> Result<bool> {
        self.raw
            .context()
            .bind(BindingPoint::Program, Some(self.raw.get()?))
    }

    /// Uploads one value to the uniform `name`.
    pub fn set_uniform<T: Pod>(&self, name: &str, value: &T) -> Result<()> {
        self.set_uniform_slice(name, std::slice::from_ref(value))
    }

    /// Uploads consecutive elements of the uniform array `name`, starting at
    /// element zero.
    ///
    /// `values` is reinterpreted as tightly packed 32-bit components; its
    /// size must be a non-zero multiple of one element of the uniform's type
    /// and cover at most the whole array.
    /// ## Errors
    /// * `Error::UnknownUniform` - If `name` is not an active uniform.
    /// * `Error::UniformMismatch` - If the data does not fit the uniform, or
    ///   the uniform is a sampler or image.
    pub fn set_uniform_slice<T: Pod>(&self, name: &str, values: &[T]) -> Result<()> {
        let info = self.uniform(name)?;
        let mismatch = |details: String| Error::UniformMismatch {
            name: name.to_owned(),
            details,
        };

        let scalar = match info.ty.scalar() {
            Some(scalar) if !info.ty.is_opaque() => scalar,
            _ if info.ty.is_sampler() => {
                return Err(mismatch("samplers are assigned with set_texture".to_owned()))
            }
            _ if info.ty.is_image() => {
                return Err(mismatch("images are assigned with set_image".to_owned()))
            }
            _ => return Err(mismatch(format!("{:?} cannot be uploaded", info.ty))),
        };

        let bytes: &[u8] = bytemuck::cast_slice(values);
        let element = info.ty.byte_size();
        if bytes.is_empty() || bytes.len() % element != 0 {
            return Err(mismatch(format!(
                "expected a multiple of {element} bytes for {:?}, got {}",
                info.ty,
                bytes.len()
            )));
        }
        let elements = bytes.len() / element;
        if elements > info.count as usize {
            return Err(mismatch(format!(
                "{elements} elements for an array of {}",
                info.count
            )));
        }

        self.bind()?;
        let api = self.raw.context().api();
        let components = info.ty.component_count() as u8;
        match (scalar, info.ty.matrix_columns()) {
            (UniformScalar::Float, Some(columns)) => {
                let values = read_components::<f32>(bytes);
                api.uniform(info.location, UniformData::Matrix { columns, values: &values });
            }
            (UniformScalar::Float, None) => {
                let values = read_components::<f32>(bytes);
                api.uniform(info.location, UniformData::Float { components, values: &values });
            }
            (UniformScalar::Int, _) => {
                let values = read_components::<i32>(bytes);
                api.uniform(info.location, UniformData::Int { components, values: &values });
            }
            (UniformScalar::UInt, _) => {
                let values = read_components::<u32>(bytes);
                api.uniform(info.location, UniformData::UInt { components, values: &values });
            }
        }
        Ok(())
    }

    /// Binds `texture` to the unit assigned to the sampler `name` and points
    /// the sampler at that unit.
    ///
    /// Elements of sampler arrays are addressed as `name[i]`. The assignment
    /// is remembered: every draw with this program rebinds the texture to
    /// its unit.
    /// ## Errors
    /// * `Error::UnknownUniform` - If `name` is not an active uniform.
    /// * `Error::UniformMismatch` - If the uniform is not a sampler.
    /// * `Error::ContextMismatch` - If the texture belongs to a context
    ///   outside this program's share group.
    pub fn set_texture(&self, name: &str, texture: &Texture) -> Result<()> {
        let info = self.uniform(name)?;
        let Some(unit) = info.texture_unit else {
            return Err(Error::UniformMismatch {
                name: name.to_owned(),
                details: format!("{:?} is not a sampler", info.ty),
            });
        };
        let texture_handle = texture.raw.get()?;
        let context = self.raw.context();
        context.check_reference(texture.context(), ObjectKind::Texture)?;

        context.bind(
            BindingPoint::Texture {
                unit,
                target: texture.target(),
            },
            Some(texture_handle),
        )?;
        let previous = self
            .textures
            .borrow_mut()
            .insert(unit, (texture_handle, texture.target()));
        // The sampler value survives until the next relink.
        if previous.is_none() {
            self.bind()?;
            context.api().uniform(
                info.location,
                UniformData::Int {
                    components: 1,
                    values: &[unit as i32],
                },
            );
        }
        Ok(())
    }

    /// The textures assigned through [`Program::set_texture`], by unit.
    pub fn textures(&self) -> Vec<(u32, Handle, TextureTarget)> {
        self.textures
            .borrow()
            .iter()
            .map(|(unit, (handle, target))| (*unit, *handle, *target))
            .collect()
    }

    /// Binds mip `level` of `texture` to the image unit assigned to the
    /// image uniform `name` and points the uniform at that unit.
    ///
    /// Arrays and 3D textures are bound layered. Like sampler assignments,
    /// image assignments are remembered and rebound by every draw or
    /// dispatch with this program.
    /// ## Errors
    /// * `Error::UnknownUniform` - If `name` is not an active uniform.
    /// * `Error::UniformMismatch` - If the uniform is not an image.
    /// * `Error::InvalidMipLevel` - If the texture has no such level.
    /// * `Error::ContextMismatch` - If the texture belongs to a context
    ///   outside this program's share group.
    pub fn set_image(
        &self,
        name: &str,
        texture: &Texture,
        level: u32,
        access: ImageAccess,
    ) -> Result<()> {
        let info = self.uniform(name)?;
        let Some(unit) = info.image_unit else {
            return Err(Error::UniformMismatch {
                name: name.to_owned(),
                details: format!("{:?} is not an image", info.ty),
            });
        };
        if level >= texture.levels() {
            return Err(Error::InvalidMipLevel {
                level,
                levels: texture.levels(),
            });
        }
        let context = self.raw.context();
        context.check_reference(texture.context(), ObjectKind::Texture)?;
        let image = ImageBinding {
            texture: texture.raw.get()?,
            level,
            access,
            format: texture.format(),
        };

        bind_image(context, unit, &image);
        let previous = self.images.borrow_mut().insert(unit, image);
        if previous.is_none() {
            self.bind()?;
            context.api().uniform(
                info.location,
                UniformData::Int {
                    components: 1,
                    values: &[unit as i32],
                },
            );
        }
        Ok(())
    }

    /// The textures assigned through [`Program::set_image`], by image unit.
    pub fn images(&self) -> Vec<(u32, Handle)> {
        self.images
            .borrow()
            .iter()
            .map(|(unit, image)| (*unit, image.texture))
            .collect()
    }

    // Image units are not tracked by the binding cache; every use rebinds.
    pub(crate) fn rebind_images(&self) {
        let context = self.raw.context();
        for (unit, image) in self.images.borrow().iter() {
            bind_image(context, *unit, image);
        }
    }

    /// Moves the native program into a new wrapper and leaves this one empty.
    pub fn take(&mut self) -> Result<Self> {
        Ok(Self {
            raw: self.raw.take()?,
            linked: Cell::new(self.linked.replace(false)),
            compute: Cell::new(self.compute.replace(false)),
            interface: RefCell::new(self.interface.replace(ProgramInterface::stale())),
            textures: RefCell::new(self.textures.take()),
            images: RefCell::new(self.images.take()),
        })
    }
}

fn bind_image(context: &Context, unit: u32, image: &ImageBinding) {
    context.api().bind_image_texture(
        unit,
        Some(image.texture.id()),
        image.level,
        None,
        image.access,
        image.format,
    );
}

fn read_components<T: Pod>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(4)
        .map(bytemuck::pod_read_unaligned::<T>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ShaderDescriptor;
    use crate::testing::{GlCall, RecordingGl, UniformValue};
    use crate::ContextSettings;
    use std::rc::Rc;

    const VERTEX: &str = "#version 330 core
layout(location = 0) in vec3 position;
uniform mat4 transform;
void main() { gl_Position = transform * vec4(position, 1.0); }
";

    const FRAGMENT: &str = "#version 330 core
uniform vec4 color;
uniform int mode;
uniform float unused;
uniform sampler2D albedo;
out vec4 frag;
void main() { frag = color * texture(albedo, vec2(mode)); }
";

    fn program() -> (Rc<RecordingGl>, Context, Program) {
        let gl = Rc::new(RecordingGl::new());
        let ctx = Context::new(gl.clone(), ContextSettings::default());
        let vs = Shader::new(&ctx, &ShaderDescriptor::vertex(VERTEX)).unwrap();
        let fs = Shader::new(&ctx, &ShaderDescriptor::fragment(FRAGMENT)).unwrap();
        let program = Program::link(&ctx, Some("test"), &[&vs, &fs]).unwrap();
        (gl, ctx, program)
    }

    #[test]
    fn uniform_type_and_size_are_checked() {
        let (_gl, _ctx, program) = program();

        assert!(program.set_uniform("color", &[1.0f32, 0.0, 0.0, 1.0]).is_ok());
        assert!(matches!(
            program.set_uniform("color", &1.0f32),
            Err(Error::UniformMismatch { .. })
        ));
        assert!(matches!(
            program.set_uniform("albedo", &0i32),
            Err(Error::UniformMismatch { .. })
        ));
        assert!(matches!(
            program.set_uniform("unused", &0.0f32),
            Err(Error::UnknownUniform { .. })
        ));
    }

    #[test]
    fn matrix_uploads_as_matrix() {
        let (gl, _ctx, program) = program();
        let location = program.location_of("transform").unwrap();
        program.set_uniform("transform", &[[0.0f32; 4]; 4]).unwrap();

        assert_eq!(
            gl.last_uniform(location),
            Some(UniformValue::Matrix {
                columns: 4,
                values: vec![0.0; 16]
            })
        );
    }

    #[test]
    fn sampler_value_is_uploaded_once() {
        let (gl, ctx, program) = program();
        let texture = Texture::rgba8(&ctx, 1, 1).unwrap();

        program.set_texture("albedo", &texture).unwrap();
        program.set_texture("albedo", &texture).unwrap();
        assert_eq!(gl.count(|call| matches!(call, GlCall::Uniform { .. })), 1);
        assert_eq!(program.textures().len(), 1);
        assert!(program.set_texture("color", &texture).is_err());
    }

    #[test]
    fn sampler_array_elements_take_consecutive_units() {
        let (gl, ctx, _program) = program();
        let fs = Shader::new(
            &ctx,
            &ShaderDescriptor::fragment(
                "#version 330 core
uniform sampler2D layers[3];
out vec4 frag;
void main() { frag = texture(layers[1], vec2(0.0)); }
",
            ),
        )
        .unwrap();
        let vs = Shader::new(&ctx, &ShaderDescriptor::vertex(VERTEX)).unwrap();
        let program = Program::link(&ctx, None, &[&vs, &fs]).unwrap();
        let texture = Texture::rgba8(&ctx, 1, 1).unwrap();

        program.set_texture("layers[1]", &texture).unwrap();
        let (unit, handle, _) = program.textures()[0];
        assert_eq!(unit, 1);
        assert_eq!(handle, texture.handle().unwrap());
        assert_eq!(
            gl.last_uniform(program.location_of("layers[1]").unwrap()),
            Some(UniformValue::Int {
                components: 1,
                values: vec![1]
            })
        );
    }

    #[test]
    fn texture_from_unrelated_context_is_rejected() {
        let (_gl, _ctx, program) = program();
        let other = Context::new(Rc::new(RecordingGl::new()), ContextSettings::default());
        let texture = Texture::rgba8(&other, 1, 1).unwrap();

        assert!(matches!(
            program.set_texture("albedo", &texture),
            Err(Error::ContextMismatch {
                kind: ObjectKind::Texture
            })
        ));
        assert!(program.textures().is_empty());
    }

    #[test]
    fn compute_program_assigns_images_and_counters() {
        let gl = Rc::new(RecordingGl::new());
        let ctx = Context::new(gl.clone(), ContextSettings::default());
        let cs = Shader::new(
            &ctx,
            &ShaderDescriptor::compute(
                "#version 430 core
layout(local_size_x = 8, local_size_y = 8) in;
layout(rgba8) uniform writeonly image2D target;
layout(binding = 3, offset = 0) uniform atomic_uint hits;
void main() {
    atomicCounterIncrement(hits);
    imageStore(target, ivec2(gl_GlobalInvocationID.xy), vec4(1.0));
}
",
            ),
        )
        .unwrap();
        let program = Program::link(&ctx, None, &[&cs]).unwrap();
        let texture = Texture::rgba8(&ctx, 4, 4).unwrap();

        assert!(program.is_compute());
        assert_eq!(program.image_units().unwrap(), 1);
        assert_eq!(program.atomic_counter_binding("hits").unwrap(), 3);
        assert!(matches!(
            program.set_image("target", &texture, 1, ImageAccess::WriteOnly),
            Err(Error::InvalidMipLevel { level: 1, .. })
        ));
        assert!(matches!(
            program.set_texture("target", &texture),
            Err(Error::UniformMismatch { .. })
        ));

        program
            .set_image("target", &texture, 0, ImageAccess::WriteOnly)
            .unwrap();
        assert_eq!(gl.native_image_unit(0), Some(texture.handle().unwrap().id()));
        assert_eq!(program.images(), vec![(0, texture.handle().unwrap())]);
        assert_eq!(gl.count(|call| matches!(call, GlCall::Uniform { .. })), 1);
    }

    #[test]
    fn fragment_outputs_are_introspected() {
        let (_gl, _ctx, program) = program();

        assert!(!program.is_compute());
        assert_eq!(program.output_location("frag").unwrap(), 0);
        assert_eq!(program.output("frag").unwrap().ty, UniformType::Vec4);
        assert!(matches!(
            program.output_location("color"),
            Err(Error::UnknownOutput { .. })
        ));
    }

    #[test]
    fn failed_relink_leaves_program_unlinked() {
        let (gl, ctx, mut program) = program();
        let fs = Shader::new(&ctx, &ShaderDescriptor::fragment(FRAGMENT)).unwrap();
        gl.fail_next_link("error: missing vertex stage");

        let err = program.relink(&[&fs]).unwrap_err();
        assert!(matches!(err, Error::Creation(ref e) if e.log == "error: missing vertex stage"));
        assert!(!program.is_linked());
        assert!(matches!(program.location_of("color"), Err(Error::Introspection(_))));
    }

    #[test]
    fn take_moves_interface() {
        let (_gl, _ctx, mut program) = program();
        let moved = program.take().unwrap();

        assert!(moved.is_linked());
        assert!(moved.location_of("color").is_ok());
        assert!(matches!(
            program.location_of("color"),
            Err(Error::UseAfterMove {
                kind: ObjectKind::Program
            })
        ));
    }
}
