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

//! A recording, in-memory implementation of [`GlApi`] for tests.
//!
//! [`RecordingGl`] logs every call it receives and simulates just enough of
//! a driver to make the core's behavior observable: object names are
//! recycled the way drivers do (smallest free name first), bindings and
//! fixed-function state are tracked, buffer and texture contents are kept in
//! memory, and shader sources are scanned for `uniform`, `in` and `out`
//! declarations to produce active variable lists.
//!
//! Compilation fails for any source containing `#error`. A uniform whose
//! name appears only in its own declaration is treated as eliminated by the
//! compiler.

use crate::api::*;
use crate::binding::BindingPoint;
use crate::handle::{NativeId, ObjectKind};
use crate::state::{Rect, RenderState, StateKey};
use crate::traits::GlApi;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// An owned copy of a uniform upload.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum UniformValue {
    Float { components: u8, values: Vec<f32> },
    Int { components: u8, values: Vec<i32> },
    UInt { components: u8, values: Vec<u32> },
    Matrix { columns: u8, values: Vec<f32> },
}

impl From<UniformData<'_>> for UniformValue {
    fn from(data: UniformData<'_>) -> Self {
        match data {
            UniformData::Float { components, values } => UniformValue::Float {
                components,
                values: values.to_vec(),
            },
            UniformData::Int { components, values } => UniformValue::Int {
                components,
                values: values.to_vec(),
            },
            UniformData::UInt { components, values } => UniformValue::UInt {
                components,
                values: values.to_vec(),
            },
            UniformData::Matrix { columns, values } => UniformValue::Matrix {
                columns,
                values: values.to_vec(),
            },
        }
    }
}

/// One call received by [`RecordingGl`].
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum GlCall {
    Create { kind: ObjectKind, id: NativeId },
    Delete { kind: ObjectKind, id: NativeId },
    Bind { point: BindingPoint, id: Option<NativeId> },
    ActiveTexture(u32),
    QueryBinding(BindingPoint),
    BufferData { target: BufferTarget, size: usize, data: Option<Vec<u8>>, usage: BufferUsage },
    BufferSubData { target: BufferTarget, offset: usize, data: Vec<u8> },
    GetBufferSubData { target: BufferTarget, offset: usize, len: usize },
    MapBuffer { target: BufferTarget, offset: usize, length: usize, access: MapAccess },
    TexImage { target: TextureTarget, level: u32, format: TextureFormat, extent: Extent3D, data_len: Option<usize> },
    TexParameter { target: TextureTarget, parameter: TextureParameter },
    GenerateMipmap(TextureTarget),
    GetTexImage { target: TextureTarget, level: u32, format: TextureFormat },
    BindImageTexture {
        unit: u32,
        texture: Option<NativeId>,
        level: u32,
        layer: Option<u32>,
        access: ImageAccess,
        format: TextureFormat,
    },
    CompileShader { id: NativeId },
    AttachShader { program: NativeId, shader: NativeId },
    DetachShader { program: NativeId, shader: NativeId },
    LinkProgram { id: NativeId },
    QueryUniforms { id: NativeId },
    QueryAttributes { id: NativeId },
    QueryOutputs { id: NativeId },
    Uniform { location: u32, value: UniformValue },
    FramebufferTexture {
        target: FramebufferTarget,
        attachment: Attachment,
        texture: Option<NativeId>,
        level: u32,
        layer: Option<u32>,
    },
    DrawBuffers(Vec<Attachment>),
    CheckFramebufferStatus(FramebufferTarget),
    Clear(ClearFlags),
    ClearBufferColor { draw_buffer: u32, rgba: [f32; 4] },
    VertexAttrib { attribute: VertexAttribute, stride: u32, divisor: u32 },
    SetState(RenderState),
    DrawArrays { primitive: PrimitiveTopology, first: u32, count: u32, instances: u32 },
    DrawElements { primitive: PrimitiveTopology, count: u32, format: IndexFormat, offset: usize, instances: u32 },
    DispatchCompute { x: u32, y: u32, z: u32 },
    MemoryBarrier(MemoryBarrier),
}

impl GlCall {
    /// Returns `true` for draw calls.
    pub fn is_draw(&self) -> bool {
        matches!(self, GlCall::DrawArrays { .. } | GlCall::DrawElements { .. })
    }

    /// Returns `true` for compute dispatches.
    pub fn is_dispatch(&self) -> bool {
        matches!(self, GlCall::DispatchCompute { .. })
    }
}

#[derive(Debug, Default)]
struct LinkedProgram {
    uniforms: Vec<ActiveVariable>,
    attributes: Vec<ActiveVariable>,
    outputs: Vec<ActiveVariable>,
}

#[derive(Debug)]
struct FakeDriver {
    calls: Vec<GlCall>,
    alive: BTreeMap<ObjectKind, BTreeSet<NativeId>>,
    // Zero bindings are not stored.
    bindings: HashMap<BindingPoint, NativeId>,
    // Element array bindings per vertex array; key 0 is the default one.
    element_buffers: HashMap<NativeId, NativeId>,
    active_unit: u32,
    states: HashMap<StateKey, RenderState>,
    shaders: HashMap<NativeId, (ShaderStage, String)>,
    attached: HashMap<NativeId, Vec<NativeId>>,
    programs: HashMap<NativeId, LinkedProgram>,
    framebuffers: HashMap<NativeId, BTreeMap<Attachment, NativeId>>,
    buffer_contents: HashMap<NativeId, Vec<u8>>,
    // Keyed by texture and mip level.
    texture_contents: HashMap<(NativeId, u32), Vec<u8>>,
    image_units: HashMap<u32, NativeId>,
    fail_allocation: bool,
    fail_link: Option<String>,
    fail_introspection: bool,
}

impl FakeDriver {
    fn new(viewport: Rect) -> Self {
        Self {
            calls: Vec::new(),
            alive: BTreeMap::new(),
            bindings: HashMap::new(),
            element_buffers: HashMap::new(),
            active_unit: 0,
            states: RenderState::defaults(viewport)
                .into_iter()
                .map(|state| (state.key(), state))
                .collect(),
            shaders: HashMap::new(),
            attached: HashMap::new(),
            programs: HashMap::new(),
            framebuffers: HashMap::new(),
            buffer_contents: HashMap::new(),
            texture_contents: HashMap::new(),
            image_units: HashMap::new(),
            fail_allocation: false,
            fail_link: None,
            fail_introspection: false,
        }
    }

    fn create(&mut self, kind: ObjectKind) -> Result<NativeId, String> {
        if std::mem::take(&mut self.fail_allocation) {
            return Err("GL_OUT_OF_MEMORY".to_owned());
        }
        let alive = self.alive.entry(kind).or_default();
        let id = (1..)
            .find(|id| !alive.contains(id))
            .unwrap_or(NativeId::MAX);
        alive.insert(id);
        self.calls.push(GlCall::Create { kind, id });
        Ok(id)
    }

    // Texture points are resolved against the active unit, like the driver.
    fn resolve(&self, point: BindingPoint) -> BindingPoint {
        match point {
            BindingPoint::Texture { target, .. } => BindingPoint::Texture {
                unit: self.active_unit,
                target,
            },
            other => other,
        }
    }

    fn binding(&self, point: BindingPoint) -> Option<NativeId> {
        match point {
            BindingPoint::Buffer(BufferTarget::ElementArray) => {
                let vao = self
                    .bindings
                    .get(&BindingPoint::VertexArray)
                    .copied()
                    .unwrap_or(0);
                self.element_buffers.get(&vao).copied()
            }
            other => self.bindings.get(&other).copied(),
        }
    }

    fn set_binding(&mut self, point: BindingPoint, id: Option<NativeId>) {
        match point {
            BindingPoint::Buffer(BufferTarget::ElementArray) => {
                let vao = self.binding(BindingPoint::VertexArray).unwrap_or(0);
                match id {
                    Some(id) => self.element_buffers.insert(vao, id),
                    None => self.element_buffers.remove(&vao),
                };
            }
            other => {
                match id {
                    Some(id) => self.bindings.insert(other, id),
                    None => self.bindings.remove(&other),
                };
                if let Some(target) = other.indexed_target() {
                    self.set_binding(BindingPoint::Buffer(target), id);
                }
            }
        }
    }

    fn link(&mut self, program: NativeId) -> Result<(), String> {
        if let Some(log) = self.fail_link.take() {
            self.programs.remove(&program);
            return Err(log);
        }
        let sources = self
            .attached
            .get(&program)
            .into_iter()
            .flatten()
            .filter_map(|shader| self.shaders.get(shader))
            .collect::<Vec<_>>();
        if sources.is_empty() {
            self.programs.remove(&program);
            return Err("error: no shaders attached".to_owned());
        }
        let all_source = sources
            .iter()
            .map(|(_, source)| source.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let mut linked = LinkedProgram::default();
        let mut next_uniform = 0u32;
        let mut next_attribute = 0u32;
        let mut next_output = 0u32;
        for (stage, source) in &sources {
            for line in source.lines() {
                let Some(declaration) = Declaration::parse(line) else {
                    continue;
                };
                match declaration.storage {
                    Storage::Uniform => {
                        let eliminated = count_word(&all_source, &declaration.name) <= 1;
                        let duplicate = linked
                            .uniforms
                            .iter()
                            .any(|u| u.name.trim_end_matches("[0]") == declaration.name);
                        if eliminated || duplicate {
                            continue;
                        }
                        let ty = glsl_type(&declaration.ty);
                        // Atomic counters have a buffer binding, not a location.
                        if ty == UniformType::AtomicCounter {
                            linked.uniforms.push(declaration.active(ty, None));
                            continue;
                        }
                        linked
                            .uniforms
                            .push(declaration.active(ty, Some(next_uniform)));
                        next_uniform += declaration.count;
                    }
                    Storage::Input if *stage == ShaderStage::Vertex => {
                        let location = declaration.location.unwrap_or(next_attribute);
                        next_attribute = next_attribute.max(location + declaration.count);
                        let ty = glsl_type(&declaration.ty);
                        linked
                            .attributes
                            .push(declaration.active(ty, Some(location)));
                    }
                    Storage::Input => {}
                    Storage::Output if *stage == ShaderStage::Fragment => {
                        let location = declaration.location.unwrap_or(next_output);
                        next_output = next_output.max(location + declaration.count);
                        let ty = glsl_type(&declaration.ty);
                        linked.outputs.push(declaration.active(ty, Some(location)));
                    }
                    Storage::Output => {}
                }
            }
        }
        self.programs.insert(program, linked);
        Ok(())
    }

    fn framebuffer_status(&self, target: FramebufferTarget) -> FramebufferStatus {
        let Some(framebuffer) = self.binding(BindingPoint::Framebuffer(target)) else {
            return FramebufferStatus::Complete;
        };
        let attachments = self
            .framebuffers
            .get(&framebuffer)
            .cloned()
            .unwrap_or_default();
        if attachments.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }
        let textures = self.alive.get(&ObjectKind::Texture);
        let all_alive = attachments
            .values()
            .all(|texture| textures.is_some_and(|alive| alive.contains(texture)));
        if all_alive {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::IncompleteAttachment
        }
    }
}

impl FakeDriver {
    fn bound_buffer(&self, target: BufferTarget) -> Option<NativeId> {
        self.binding(BindingPoint::Buffer(target))
    }

    fn bound_texture(&self, target: TextureTarget) -> Option<NativeId> {
        self.binding(BindingPoint::Texture {
            unit: self.active_unit,
            target,
        })
    }

    // Out-of-range accesses are dropped, as GL_INVALID_VALUE would.
    fn buffer_range(&mut self, target: BufferTarget, offset: usize, len: usize) -> Option<&mut [u8]> {
        let buffer = self.bound_buffer(target)?;
        let contents = self.buffer_contents.get_mut(&buffer)?;
        contents.get_mut(offset..offset.checked_add(len)?)
    }
}

enum Storage {
    Uniform,
    Input,
    Output,
}

struct Declaration {
    storage: Storage,
    ty: String,
    name: String,
    count: u32,
    location: Option<u32>,
    binding: Option<u32>,
}

impl Declaration {
    // Parses `[layout(location = N, binding = N)] (uniform|in|out) <type> <name>[[N]];`.
    // Memory qualifiers such as `writeonly` between the storage and the type
    // are skipped.
    fn parse(line: &str) -> Option<Self> {
        let mut rest = line.trim();
        let mut location = None;
        let mut binding = None;
        if let Some(after) = rest.strip_prefix("layout") {
            let open = after.find('(')?;
            let close = after.find(')')?;
            let qualifiers = &after[open + 1..close];
            let qualifier = |name: &str| -> Option<u32> {
                qualifiers
                    .split(',')
                    .filter_map(|q| q.split_once('='))
                    .find(|(key, _)| key.trim() == name)
                    .and_then(|(_, value)| value.trim().parse().ok())
            };
            location = qualifier("location");
            binding = qualifier("binding");
            rest = after[close + 1..].trim();
        }
        let (storage, rest) = if let Some(rest) = rest.strip_prefix("uniform ") {
            (Storage::Uniform, rest)
        } else if let Some(rest) = rest.strip_prefix("in ") {
            (Storage::Input, rest)
        } else if let Some(rest) = rest.strip_prefix("out ") {
            (Storage::Output, rest)
        } else {
            return None;
        };
        let mut rest = rest.trim();
        for memory in ["readonly ", "writeonly ", "coherent ", "restrict "] {
            rest = rest.strip_prefix(memory).unwrap_or(rest).trim_start();
        }
        let rest = rest.trim().strip_suffix(';')?;
        let mut parts = rest.split_whitespace();
        let ty = parts.next()?.to_owned();
        let declarator = parts.next()?;
        let (name, count) = match declarator.split_once('[') {
            Some((name, size)) => (name, size.trim_end_matches(']').parse().ok()?),
            None => (declarator, 1),
        };
        Some(Self {
            storage,
            ty,
            name: name.to_owned(),
            count,
            location,
            binding,
        })
    }

    fn active(&self, ty: UniformType, location: Option<u32>) -> ActiveVariable {
        let name = if self.count > 1 {
            format!("{}[0]", self.name)
        } else {
            self.name.clone()
        };
        ActiveVariable {
            name,
            ty,
            count: self.count,
            location,
            binding: self.binding.filter(|_| ty == UniformType::AtomicCounter),
        }
    }
}

fn glsl_type(name: &str) -> UniformType {
    match name {
        "float" => UniformType::Float,
        "vec2" => UniformType::Vec2,
        "vec3" => UniformType::Vec3,
        "vec4" => UniformType::Vec4,
        "int" => UniformType::Int,
        "ivec2" => UniformType::IVec2,
        "ivec3" => UniformType::IVec3,
        "ivec4" => UniformType::IVec4,
        "uint" => UniformType::UInt,
        "uvec2" => UniformType::UVec2,
        "uvec3" => UniformType::UVec3,
        "uvec4" => UniformType::UVec4,
        "bool" => UniformType::Bool,
        "mat2" => UniformType::Mat2,
        "mat3" => UniformType::Mat3,
        "mat4" => UniformType::Mat4,
        "atomic_uint" => UniformType::AtomicCounter,
        s if s.contains("sampler") => UniformType::Sampler,
        s if s.contains("image") => UniformType::Image,
        _ => UniformType::Other(0),
    }
}

fn count_word(haystack: &str, word: &str) -> usize {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    haystack
        .match_indices(word)
        .filter(|(start, _)| {
            let before = haystack[..*start].chars().next_back();
            let after = haystack[start + word.len()..].chars().next();
            !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
        })
        .count()
}

/// A [`GlApi`] that records every call and simulates a minimal driver.
#[derive(Debug)]
pub struct RecordingGl {
    driver: RefCell<FakeDriver>,
}

impl Default for RecordingGl {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingGl {
    /// A fake driver whose default framebuffer has zero size.
    pub fn new() -> Self {
        Self::with_viewport(Rect::default())
    }

    /// A fake driver whose viewport and scissor box start at `viewport`.
    pub fn with_viewport(viewport: Rect) -> Self {
        Self {
            driver: RefCell::new(FakeDriver::new(viewport)),
        }
    }

    fn record(&self, call: GlCall) {
        self.driver.borrow_mut().calls.push(call);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<GlCall> {
        self.driver.borrow().calls.clone()
    }

    /// Forgets the recorded calls. Simulated driver state is kept.
    pub fn clear_calls(&self) {
        self.driver.borrow_mut().calls.clear();
    }

    /// The number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.driver
            .borrow()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    /// The number of recorded draw calls.
    pub fn draw_count(&self) -> usize {
        self.count(GlCall::is_draw)
    }

    /// The value last uploaded to uniform `location`, in any program.
    pub fn last_uniform(&self, location: u32) -> Option<UniformValue> {
        self.driver
            .borrow()
            .calls
            .iter()
            .rev()
            .find_map(|call| match call {
                GlCall::Uniform { location: l, value } if *l == location => Some(value.clone()),
                _ => None,
            })
    }

    /// The object the simulated driver has bound at `point`. Texture points
    /// are looked up on the unit they name.
    pub fn native_binding(&self, point: BindingPoint) -> Option<NativeId> {
        self.driver.borrow().binding(point)
    }

    /// The element array buffer recorded in vertex array `vertex_array`.
    pub fn native_element_buffer(&self, vertex_array: NativeId) -> Option<NativeId> {
        self.driver
            .borrow()
            .element_buffers
            .get(&vertex_array)
            .copied()
    }

    /// The fixed-function state value the simulated driver holds.
    pub fn native_state(&self, key: StateKey) -> Option<RenderState> {
        self.driver.borrow().states.get(&key).copied()
    }

    /// The active texture unit of the simulated driver.
    pub fn active_unit(&self) -> u32 {
        self.driver.borrow().active_unit
    }

    /// Returns `true` if the simulated driver has object `id` of `kind`.
    pub fn is_alive(&self, kind: ObjectKind, id: NativeId) -> bool {
        self.driver
            .borrow()
            .alive
            .get(&kind)
            .is_some_and(|alive| alive.contains(&id))
    }

    /// The number of objects of `kind` the simulated driver holds.
    pub fn alive_count(&self, kind: ObjectKind) -> usize {
        self.driver.borrow().alive.get(&kind).map_or(0, BTreeSet::len)
    }

    /// Changes a binding without recording a call, as foreign code sharing
    /// the context would.
    pub fn external_bind(&self, point: BindingPoint, id: Option<NativeId>) {
        let mut driver = self.driver.borrow_mut();
        let point = driver.resolve(point);
        driver.set_binding(point, id);
    }

    /// Changes a state value without recording a call.
    pub fn external_state(&self, state: RenderState) {
        self.driver.borrow_mut().states.insert(state.key(), state);
    }

    /// The contents the simulated driver holds for buffer `id`.
    pub fn buffer_contents(&self, id: NativeId) -> Option<Vec<u8>> {
        self.driver.borrow().buffer_contents.get(&id).cloned()
    }

    /// Overwrites part of buffer `id` without recording a call, as a shader
    /// writing to it would.
    pub fn external_buffer_write(&self, id: NativeId, offset: usize, data: &[u8]) {
        let mut driver = self.driver.borrow_mut();
        if let Some(range) = driver
            .buffer_contents
            .get_mut(&id)
            .and_then(|contents| contents.get_mut(offset..offset + data.len()))
        {
            range.copy_from_slice(data);
        }
    }

    /// The contents the simulated driver holds for mip `level` of texture
    /// `id`.
    pub fn texture_contents(&self, id: NativeId, level: u32) -> Option<Vec<u8>> {
        self.driver
            .borrow()
            .texture_contents
            .get(&(id, level))
            .cloned()
    }

    /// The texture bound to image unit `unit`.
    pub fn native_image_unit(&self, unit: u32) -> Option<NativeId> {
        self.driver.borrow().image_units.get(&unit).copied()
    }

    /// Makes the next object allocation fail.
    pub fn fail_next_allocation(&self) {
        self.driver.borrow_mut().fail_allocation = true;
    }

    /// Makes the next link fail with `log`.
    pub fn fail_next_link(&self, log: &str) {
        self.driver.borrow_mut().fail_link = Some(log.to_owned());
    }

    /// Makes every active variable query fail from now on.
    pub fn fail_introspection(&self) {
        self.driver.borrow_mut().fail_introspection = true;
    }
}

impl GlApi for RecordingGl {
    fn create_buffer(&self) -> Result<NativeId, String> {
        self.driver.borrow_mut().create(ObjectKind::Buffer)
    }

    fn create_texture(&self) -> Result<NativeId, String> {
        self.driver.borrow_mut().create(ObjectKind::Texture)
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<NativeId, String> {
        let mut driver = self.driver.borrow_mut();
        let id = driver.create(ObjectKind::Shader)?;
        driver.shaders.insert(id, (stage, String::new()));
        Ok(id)
    }

    fn create_program(&self) -> Result<NativeId, String> {
        self.driver.borrow_mut().create(ObjectKind::Program)
    }

    fn create_framebuffer(&self) -> Result<NativeId, String> {
        self.driver.borrow_mut().create(ObjectKind::Framebuffer)
    }

    fn create_vertex_array(&self) -> Result<NativeId, String> {
        self.driver.borrow_mut().create(ObjectKind::VertexArray)
    }

    fn delete_object(&self, kind: ObjectKind, id: NativeId) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::Delete { kind, id });
        if let Some(alive) = driver.alive.get_mut(&kind) {
            alive.remove(&id);
        }
        // Deleting a bound object reverts its bindings to zero.
        driver
            .bindings
            .retain(|point, bound| !(point.kind() == kind && *bound == id));
        match kind {
            ObjectKind::Buffer => {
                driver.element_buffers.retain(|_, bound| *bound != id);
                driver.buffer_contents.remove(&id);
            }
            ObjectKind::VertexArray => {
                driver.element_buffers.remove(&id);
            }
            ObjectKind::Shader => {
                driver.shaders.remove(&id);
            }
            ObjectKind::Program => {
                driver.programs.remove(&id);
                driver.attached.remove(&id);
            }
            ObjectKind::Framebuffer => {
                driver.framebuffers.remove(&id);
            }
            ObjectKind::Texture => {
                driver.texture_contents.retain(|(texture, _), _| *texture != id);
                driver.image_units.retain(|_, bound| *bound != id);
            }
        }
    }

    fn bind(&self, point: BindingPoint, id: Option<NativeId>) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::Bind { point, id });
        let point = driver.resolve(point);
        driver.set_binding(point, id);
    }

    fn active_texture(&self, unit: u32) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::ActiveTexture(unit));
        driver.active_unit = unit;
    }

    fn bound_object(&self, point: BindingPoint) -> Option<NativeId> {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::QueryBinding(point));
        let point = driver.resolve(point);
        driver.binding(point)
    }

    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::BufferData {
            target,
            size,
            data: data.map(<[u8]>::to_vec),
            usage,
        });
        if let Some(buffer) = driver.bound_buffer(target) {
            let contents = match data {
                Some(data) if data.len() == size => data.to_vec(),
                _ => vec![0; size],
            };
            driver.buffer_contents.insert(buffer, contents);
        }
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::BufferSubData {
            target,
            offset,
            data: data.to_vec(),
        });
        if let Some(range) = driver.buffer_range(target, offset, data.len()) {
            range.copy_from_slice(data);
        }
    }

    fn get_buffer_sub_data(&self, target: BufferTarget, offset: usize, out: &mut [u8]) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::GetBufferSubData {
            target,
            offset,
            len: out.len(),
        });
        if let Some(range) = driver.buffer_range(target, offset, out.len()) {
            out.copy_from_slice(range);
        }
    }

    fn map_buffer(
        &self,
        target: BufferTarget,
        offset: usize,
        length: usize,
        access: MapAccess,
        f: &mut dyn FnMut(&mut [u8]),
    ) -> Result<(), String> {
        // The driver is not borrowed while `f` runs.
        let mut mapping = {
            let mut driver = self.driver.borrow_mut();
            driver.calls.push(GlCall::MapBuffer {
                target,
                offset,
                length,
                access,
            });
            let range = driver
                .buffer_range(target, offset, length)
                .ok_or_else(|| "GL_INVALID_VALUE".to_owned())?;
            if access.reads() {
                range.to_vec()
            } else {
                vec![0; length]
            }
        };
        f(&mut mapping);
        if access.writes() {
            let mut driver = self.driver.borrow_mut();
            if let Some(range) = driver.buffer_range(target, offset, length) {
                range.copy_from_slice(&mapping);
            }
        }
        Ok(())
    }

    fn tex_image(
        &self,
        target: TextureTarget,
        level: u32,
        format: TextureFormat,
        extent: Extent3D,
        data: Option<&[u8]>,
    ) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::TexImage {
            target,
            level,
            format,
            extent,
            data_len: data.map(<[u8]>::len),
        });
        if let Some(texture) = driver.bound_texture(target) {
            let size = extent.texel_count() * format.bytes_per_texel();
            let contents = match data {
                Some(data) if data.len() == size => data.to_vec(),
                _ => vec![0; size],
            };
            driver.texture_contents.insert((texture, level), contents);
        }
    }

    fn tex_parameter(&self, target: TextureTarget, parameter: TextureParameter) {
        self.record(GlCall::TexParameter { target, parameter });
    }

    fn generate_mipmap(&self, target: TextureTarget) {
        self.record(GlCall::GenerateMipmap(target));
    }

    fn get_tex_image(&self, target: TextureTarget, level: u32, format: TextureFormat, out: &mut [u8]) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::GetTexImage {
            target,
            level,
            format,
        });
        let contents = driver
            .bound_texture(target)
            .and_then(|texture| driver.texture_contents.get(&(texture, level)));
        if let Some(contents) = contents.filter(|contents| contents.len() == out.len()) {
            out.copy_from_slice(contents);
        }
    }

    fn bind_image_texture(
        &self,
        unit: u32,
        texture: Option<NativeId>,
        level: u32,
        layer: Option<u32>,
        access: ImageAccess,
        format: TextureFormat,
    ) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::BindImageTexture {
            unit,
            texture,
            level,
            layer,
            access,
            format,
        });
        match texture {
            Some(id) => driver.image_units.insert(unit, id),
            None => driver.image_units.remove(&unit),
        };
    }

    fn compile_shader(&self, shader: NativeId, source: &str) -> Result<(), String> {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::CompileShader { id: shader });
        if let Some(line) = source.lines().position(|line| line.trim_start().starts_with("#error")) {
            return Err(format!("0:{}(1): error: #error directive", line + 1));
        }
        if let Some((_, stored)) = driver.shaders.get_mut(&shader) {
            *stored = source.to_owned();
        }
        Ok(())
    }

    fn attach_shader(&self, program: NativeId, shader: NativeId) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::AttachShader { program, shader });
        driver.attached.entry(program).or_default().push(shader);
    }

    fn detach_shader(&self, program: NativeId, shader: NativeId) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::DetachShader { program, shader });
        if let Some(attached) = driver.attached.get_mut(&program) {
            attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: NativeId) -> Result<(), String> {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::LinkProgram { id: program });
        driver.link(program)
    }

    fn active_uniforms(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String> {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::QueryUniforms { id: program });
        if driver.fail_introspection {
            return Err("GL_INVALID_OPERATION".to_owned());
        }
        driver
            .programs
            .get(&program)
            .map(|linked| linked.uniforms.clone())
            .ok_or_else(|| format!("program {program} is not linked"))
    }

    fn active_attributes(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String> {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::QueryAttributes { id: program });
        if driver.fail_introspection {
            return Err("GL_INVALID_OPERATION".to_owned());
        }
        driver
            .programs
            .get(&program)
            .map(|linked| linked.attributes.clone())
            .ok_or_else(|| format!("program {program} is not linked"))
    }

    fn active_outputs(&self, program: NativeId) -> Result<Vec<ActiveVariable>, String> {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::QueryOutputs { id: program });
        if driver.fail_introspection {
            return Err("GL_INVALID_OPERATION".to_owned());
        }
        driver
            .programs
            .get(&program)
            .map(|linked| linked.outputs.clone())
            .ok_or_else(|| format!("program {program} is not linked"))
    }

    fn uniform(&self, location: u32, data: UniformData<'_>) {
        self.record(GlCall::Uniform {
            location,
            value: data.into(),
        });
    }

    fn framebuffer_texture(
        &self,
        target: FramebufferTarget,
        attachment: Attachment,
        texture: Option<(NativeId, TextureTarget)>,
        level: u32,
        layer: Option<u32>,
    ) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::FramebufferTexture {
            target,
            attachment,
            texture: texture.map(|(id, _)| id),
            level,
            layer,
        });
        let Some(framebuffer) = driver.binding(BindingPoint::Framebuffer(target)) else {
            return;
        };
        let attachments = driver.framebuffers.entry(framebuffer).or_default();
        match texture {
            Some((id, _)) => attachments.insert(attachment, id),
            None => attachments.remove(&attachment),
        };
    }

    fn draw_buffers(&self, attachments: &[Attachment]) {
        self.record(GlCall::DrawBuffers(attachments.to_vec()));
    }

    fn framebuffer_status(&self, target: FramebufferTarget) -> FramebufferStatus {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::CheckFramebufferStatus(target));
        driver.framebuffer_status(target)
    }

    fn clear(&self, flags: ClearFlags) {
        self.record(GlCall::Clear(flags));
    }

    fn clear_buffer_color(&self, draw_buffer: u32, rgba: [f32; 4]) {
        self.record(GlCall::ClearBufferColor { draw_buffer, rgba });
    }

    fn vertex_attrib(&self, attribute: &VertexAttribute, stride: u32, divisor: u32) {
        self.record(GlCall::VertexAttrib {
            attribute: *attribute,
            stride,
            divisor,
        });
    }

    fn set_state(&self, state: &RenderState) {
        let mut driver = self.driver.borrow_mut();
        driver.calls.push(GlCall::SetState(*state));
        driver.states.insert(state.key(), *state);
    }

    fn draw_arrays(&self, primitive: PrimitiveTopology, first: u32, count: u32, instances: u32) {
        self.record(GlCall::DrawArrays {
            primitive,
            first,
            count,
            instances,
        });
    }

    fn draw_elements(
        &self,
        primitive: PrimitiveTopology,
        count: u32,
        format: IndexFormat,
        offset: usize,
        instances: u32,
    ) {
        self.record(GlCall::DrawElements {
            primitive,
            count,
            format,
            offset,
            instances,
        });
    }

    fn dispatch_compute(&self, x: u32, y: u32, z: u32) {
        self.record(GlCall::DispatchCompute { x, y, z });
    }

    fn memory_barrier(&self, barrier: MemoryBarrier) {
        self.record(GlCall::MemoryBarrier(barrier));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_recycled_smallest_first() {
        let gl = RecordingGl::new();
        let a = gl.create_buffer().unwrap();
        let b = gl.create_buffer().unwrap();
        gl.delete_object(ObjectKind::Buffer, a);

        assert_eq!((a, b), (1, 2));
        assert_eq!(gl.create_buffer().unwrap(), 1);
        // Each kind has its own namespace.
        assert_eq!(gl.create_texture().unwrap(), 1);
    }

    #[test]
    fn declarations_are_parsed() {
        let uniform = Declaration::parse("  uniform sampler2D shadows[4];").unwrap();
        assert_eq!((uniform.name.as_str(), uniform.count), ("shadows", 4));
        assert_eq!(glsl_type(&uniform.ty), UniformType::Sampler);

        let input = Declaration::parse("layout(location = 3) in vec2 uv;").unwrap();
        assert_eq!(input.location, Some(3));
        assert!(Declaration::parse("flat vec4 color;").is_none());

        let counter =
            Declaration::parse("layout(binding = 2, offset = 0) uniform atomic_uint hits;").unwrap();
        assert_eq!((counter.binding, counter.location), (Some(2), None));
        let image = Declaration::parse("uniform writeonly image2D target;").unwrap();
        assert_eq!(glsl_type(&image.ty), UniformType::Image);
    }

    #[test]
    fn buffer_contents_follow_uploads_and_maps() {
        let gl = RecordingGl::new();
        let target = BufferTarget::CopyWrite;
        let id = gl.create_buffer().unwrap();
        gl.bind(BindingPoint::Buffer(target), Some(id));
        gl.buffer_data(target, 4, None, BufferUsage::DynamicDraw);
        gl.buffer_sub_data(target, 1, &[7, 8]);

        gl.map_buffer(target, 2, 2, MapAccess::ReadWrite, &mut |bytes| bytes[1] = 9)
            .unwrap();
        assert_eq!(gl.buffer_contents(id), Some(vec![0, 7, 8, 9]));
        assert!(gl
            .map_buffer(target, 3, 2, MapAccess::Read, &mut |_| {})
            .is_err());
    }

    #[test]
    fn word_count_ignores_longer_identifiers() {
        assert_eq!(count_word("color colorScale my_color color;", "color"), 2);
    }

    #[test]
    fn deleting_bound_object_unbinds_it() {
        let gl = RecordingGl::new();
        let id = gl.create_vertex_array().unwrap();
        gl.bind(BindingPoint::VertexArray, Some(id));
        gl.delete_object(ObjectKind::VertexArray, id);
        assert_eq!(gl.native_binding(BindingPoint::VertexArray), None);
    }
}
