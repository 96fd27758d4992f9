//! Headless backend that records every call.
//!
//! The [`RecordingBackend`] goes into a [`crate::pipeline::Pipeline`]; the
//! [`RecordingLog`] handle returned next to it stays with the caller and
//! reads what was issued. Each recorded draw carries a snapshot of the bound
//! program's uniforms and texture at the moment it was issued.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::Rc,
};

use crate::{
    data_structures::mesh::VertexData,
    error::{Error, Result, ShaderStage},
};

use super::{
    Backend, GeometryId, PrimitiveKind, ProgramId, ProgramSource, TextureDesc, TextureId,
    UniformLocation, UniformValue,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateProgram {
        program: ProgramId,
        label: String,
    },
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
    CreateGeometry {
        geometry: GeometryId,
        label: String,
        vertex_count: usize,
    },
    CreateTexture {
        texture: TextureId,
        label: String,
        size: (u32, u32),
        mipmaps: bool,
    },
    BindTexture(Option<TextureId>),
    Draw(DrawRecord),
}

/// A draw call together with the state it was issued with.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub program: ProgramId,
    pub geometry: GeometryId,
    pub label: String,
    pub kind: PrimitiveKind,
    pub elements: usize,
    pub texture: Option<TextureId>,
    pub uniforms: BTreeMap<String, UniformValue>,
}

impl DrawRecord {
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }

    pub fn mat4(&self, name: &str) -> Option<[[f32; 4]; 4]> {
        match self.uniforms.get(name) {
            Some(UniformValue::Mat4(m)) => Some(*m),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.uniforms.get(name) {
            Some(UniformValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

/// Shared read side of a [`RecordingBackend`].
#[derive(Clone, Debug, Default)]
pub struct RecordingLog {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl RecordingLog {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Draw(draw) => Some(draw.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

#[derive(Debug)]
struct RecordedProgram {
    /// Uniform names in location order.
    names: Vec<String>,
    values: BTreeMap<String, UniformValue>,
}

#[derive(Debug)]
pub struct RecordingBackend {
    log: RecordingLog,
    /// When set, programs only expose these uniform names.
    exposed: Option<Vec<String>>,
    programs: Vec<RecordedProgram>,
    geometries: Vec<(String, usize)>,
    textures: u32,
    active: Option<ProgramId>,
    bound_texture: Option<TextureId>,
}

impl RecordingBackend {
    /// A backend whose programs expose every uniform asked for.
    pub fn new() -> (Self, RecordingLog) {
        Self::build(None)
    }

    /// A backend whose programs only expose `names`.
    pub fn with_uniforms(names: &[&str]) -> (Self, RecordingLog) {
        Self::build(Some(names.iter().map(|n| n.to_string()).collect()))
    }

    fn build(exposed: Option<Vec<String>>) -> (Self, RecordingLog) {
        let log = RecordingLog::default();
        let backend = Self {
            log: log.clone(),
            exposed,
            programs: Vec::new(),
            geometries: Vec::new(),
            textures: 0,
            active: None,
            bound_texture: None,
        };
        (backend, log)
    }

    fn active_program(&mut self) -> Option<(ProgramId, &mut RecordedProgram)> {
        let id = self.active?;
        self.programs.get_mut(id.0 as usize).map(|p| (id, p))
    }
}

impl Backend for RecordingBackend {
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        if source.vertex.trim().is_empty() {
            return Err(Error::ShaderBuild {
                stage: ShaderStage::Vertex,
                log: format!("'{}': empty vertex source", source.label),
            });
        }
        if source.fragment.trim().is_empty() {
            return Err(Error::ShaderBuild {
                stage: ShaderStage::Fragment,
                log: format!("'{}': empty fragment source", source.label),
            });
        }
        let program = ProgramId(self.programs.len() as u32);
        self.programs.push(RecordedProgram {
            names: Vec::new(),
            values: BTreeMap::new(),
        });
        self.log.push(Call::CreateProgram {
            program,
            label: source.label.clone(),
        });
        Ok(program)
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.active = program;
        self.log.push(Call::UseProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        if let Some(exposed) = &self.exposed {
            if !exposed.iter().any(|n| n == name) {
                return None;
            }
        }
        let recorded = self.programs.get_mut(program.0 as usize)?;
        let index = match recorded.names.iter().position(|n| n == name) {
            Some(index) => index,
            None => {
                recorded.names.push(name.to_string());
                recorded.names.len() - 1
            }
        };
        Some(UniformLocation(index as u32))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let log = self.log.clone();
        let Some((program, recorded)) = self.active_program() else {
            log::warn!("uniform write without a bound program ignored");
            return;
        };
        let Some(name) = recorded.names.get(location.0 as usize).cloned() else {
            log::warn!("unknown uniform location {:?} ignored", location);
            return;
        };
        recorded.values.insert(name.clone(), value);
        log.push(Call::SetUniform {
            program,
            name,
            value,
        });
    }

    fn create_geometry(&mut self, label: &str, data: &VertexData) -> Result<GeometryId> {
        let geometry = GeometryId(self.geometries.len() as u32);
        self.geometries
            .push((label.to_string(), data.element_count()));
        self.log.push(Call::CreateGeometry {
            geometry,
            label: label.to_string(),
            vertex_count: data.vertex_count(),
        });
        Ok(geometry)
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        let expected = desc.width as usize * desc.height as usize * 4;
        if desc.rgba.len() != expected {
            return Err(Error::resource(
                desc.label,
                format!("{} bytes for a {}x{} image", desc.rgba.len(), desc.width, desc.height),
            ));
        }
        let texture = TextureId(self.textures);
        self.textures += 1;
        self.log.push(Call::CreateTexture {
            texture,
            label: desc.label.to_string(),
            size: (desc.width, desc.height),
            mipmaps: desc.generate_mipmaps,
        });
        Ok(texture)
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.bound_texture = texture;
        self.log.push(Call::BindTexture(texture));
    }

    fn draw(&mut self, geometry: GeometryId, kind: PrimitiveKind) -> Result<()> {
        let (label, elements) = self
            .geometries
            .get(geometry.0 as usize)
            .cloned()
            .ok_or_else(|| Error::resource(format!("{geometry:?}"), "unknown geometry"))?;
        let texture = self.bound_texture;
        let log = self.log.clone();
        let (program, recorded) = self.active_program().ok_or(Error::NoActiveProgram)?;
        log.push(Call::Draw(DrawRecord {
            program,
            geometry,
            label,
            kind,
            elements,
            texture,
            uniforms: recorded.values.clone(),
        }));
        Ok(())
    }
}
