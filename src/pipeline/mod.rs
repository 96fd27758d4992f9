//! The graphics-state facade.
//!
//! [`Pipeline`] owns the backend, the bound program and one
//! [`AttributeStack`] per tracked attribute (model matrix, material, texture,
//! colour). Every `set_*` / `compose_*` writes the new value through to the
//! bound program right away; pops write the restored value back when a
//! program is bound.
//!
//! Scene nodes save and restore state with [`Pipeline::scope`], which returns
//! a [`StateScope`] guard that pops on exit even when the visit fails.

mod scope;
mod stack;

use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

pub use scope::{StateScope, Tracked};
pub use stack::AttributeStack;

use crate::{
    backend::{
        Backend, GeometryId, PrimitiveKind, ProgramId, ProgramSource, TextureDesc, TextureId,
        UniformLocation, UniformValue,
    },
    config::{MissingUniformPolicy, PipelineConfig},
    data_structures::{material::Material, mesh::VertexData, texture::TextureRef},
    error::{Error, Result},
    math::{self, Mat4, Vec3},
};

/// Attributes with a save/restore stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    ModelMatrix,
    Material,
    Texture,
    Color,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::ModelMatrix => "model matrix",
            Attribute::Material => "material",
            Attribute::Texture => "texture",
            Attribute::Color => "color",
        })
    }
}

/// Uniforms the pipeline keeps in sync with the bound program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Uniform {
    ModelMatrix,
    ViewMatrix,
    ProjectionMatrix,
    Color,
    Material,
    TextureEnabled,
    LightingEnabled,
    SampleCount,
}

impl Uniform {
    pub const ALL: [Uniform; 8] = [
        Uniform::ModelMatrix,
        Uniform::ViewMatrix,
        Uniform::ProjectionMatrix,
        Uniform::Color,
        Uniform::Material,
        Uniform::TextureEnabled,
        Uniform::LightingEnabled,
        Uniform::SampleCount,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug)]
struct BoundProgram {
    id: ProgramId,
    locations: [Option<UniformLocation>; Uniform::ALL.len()],
}

/// Distinguishes pipelines, and so backends, from each other. Handles created
/// through one pipeline mean nothing to another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineId(u32);

static NEXT_PIPELINE: AtomicU32 = AtomicU32::new(0);

pub struct Pipeline {
    id: PipelineId,
    backend: Box<dyn Backend>,
    config: PipelineConfig,
    program: Option<BoundProgram>,
    model_matrix: AttributeStack<Mat4>,
    material: AttributeStack<Material>,
    texture: AttributeStack<Option<TextureRef>>,
    color: AttributeStack<Vec3>,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    lighting: bool,
    sample_count: u32,
}

impl Pipeline {
    pub fn new(backend: Box<dyn Backend>, config: PipelineConfig) -> Self {
        Self {
            id: PipelineId(NEXT_PIPELINE.fetch_add(1, Ordering::Relaxed)),
            backend,
            config,
            program: None,
            model_matrix: AttributeStack::new(Attribute::ModelMatrix, math::identity()),
            material: AttributeStack::new(Attribute::Material, Material::default()),
            texture: AttributeStack::new(Attribute::Texture, None),
            color: AttributeStack::new(Attribute::Color, Vec3::new(1.0, 1.0, 1.0)),
            view_matrix: math::identity(),
            projection_matrix: math::identity(),
            lighting: false,
            sample_count: 1,
        }
    }

    pub fn id(&self) -> PipelineId {
        self.id
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    // ---- programs --------------------------------------------------------

    pub fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId> {
        let id = self.backend.create_program(source)?;
        log::debug!("program '{}' created as {:?}", source.label, id);
        Ok(id)
    }

    /// Binds `program`, resolves its uniform locations and sends it every
    /// current value.
    pub fn use_program(&mut self, program: ProgramId) -> Result<()> {
        self.backend.use_program(Some(program));
        let mut locations = [None; Uniform::ALL.len()];
        for uniform in Uniform::ALL {
            let name = self.config.uniforms.name(uniform);
            let location = self.backend.uniform_location(program, name);
            if location.is_none() {
                match self.config.missing_uniform {
                    MissingUniformPolicy::Warn => log::warn!(
                        "uniform '{name}' is not used by program {:?}; writes to it are skipped",
                        program
                    ),
                    MissingUniformPolicy::Fail => {
                        log::debug!("uniform '{name}' is not exposed by program {:?}", program)
                    }
                }
            }
            locations[uniform.index()] = location;
        }
        self.program = Some(BoundProgram {
            id: program,
            locations,
        });
        for uniform in Uniform::ALL {
            self.sync(uniform);
        }
        Ok(())
    }

    pub fn unbind_program(&mut self) {
        self.backend.use_program(None);
        self.program = None;
    }

    pub fn active_program(&self) -> Option<ProgramId> {
        self.program.as_ref().map(|p| p.id)
    }

    // ---- resources -------------------------------------------------------

    pub fn create_geometry(&mut self, label: &str, data: &VertexData) -> Result<GeometryId> {
        data.validate()?;
        self.backend.create_geometry(label, data)
    }

    pub fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId> {
        self.backend.create_texture(desc)
    }

    /// One draw call with the bound program and the current uniform state.
    pub fn draw(&mut self, geometry: GeometryId, kind: PrimitiveKind) -> Result<()> {
        if self.program.is_none() {
            return Err(Error::NoActiveProgram);
        }
        log::trace!("draw {:?} as {:?}", geometry, kind);
        self.backend.draw(geometry, kind)
    }

    // ---- model matrix ----------------------------------------------------

    pub fn model_matrix(&self) -> Mat4 {
        *self.model_matrix.current()
    }

    pub fn push_model_matrix(&mut self) {
        self.model_matrix.push();
    }

    pub fn pop_model_matrix(&mut self) -> Result<()> {
        self.model_matrix.pop()?;
        self.sync(Uniform::ModelMatrix);
        Ok(())
    }

    pub fn set_model_matrix(&mut self, matrix: Mat4) -> Result<()> {
        let location = self.location(Uniform::ModelMatrix)?;
        self.model_matrix.set(matrix);
        self.write(location, UniformValue::Mat4(math::to_columns(&matrix)));
        Ok(())
    }

    /// Right-multiplies `matrix` onto the current model matrix.
    pub fn compose_model_matrix(&mut self, matrix: &Mat4) -> Result<()> {
        let location = self.location(Uniform::ModelMatrix)?;
        self.model_matrix.update(|current| math::compose(current, matrix));
        let composed = *self.model_matrix.current();
        self.write(location, UniformValue::Mat4(math::to_columns(&composed)));
        Ok(())
    }

    // ---- material --------------------------------------------------------

    pub fn material(&self) -> Material {
        *self.material.current()
    }

    pub fn push_material(&mut self) {
        self.material.push();
    }

    pub fn pop_material(&mut self) -> Result<()> {
        self.material.pop()?;
        self.sync(Uniform::Material);
        Ok(())
    }

    pub fn set_material(&mut self, material: Material) -> Result<()> {
        let location = self.location(Uniform::Material)?;
        self.material.set(material);
        self.write(location, UniformValue::Vec4(material.to_array()));
        Ok(())
    }

    // ---- texture ---------------------------------------------------------

    pub fn texture(&self) -> Option<TextureRef> {
        self.texture.current().clone()
    }

    pub fn push_texture(&mut self) {
        self.texture.push();
    }

    pub fn pop_texture(&mut self) -> Result<()> {
        self.texture.pop()?;
        self.sync(Uniform::TextureEnabled);
        Ok(())
    }

    /// Sets the texture used by the following draws; `None` disables
    /// texturing.
    pub fn set_texture(&mut self, texture: Option<TextureRef>) -> Result<()> {
        let location = self.location(Uniform::TextureEnabled)?;
        self.texture.set(texture);
        self.write_texture(location);
        Ok(())
    }

    // ---- colour ----------------------------------------------------------

    pub fn color(&self) -> Vec3 {
        *self.color.current()
    }

    pub fn push_color(&mut self) {
        self.color.push();
    }

    pub fn pop_color(&mut self) -> Result<()> {
        self.color.pop()?;
        self.sync(Uniform::Color);
        Ok(())
    }

    pub fn set_color(&mut self, color: Vec3) -> Result<()> {
        let location = self.location(Uniform::Color)?;
        self.color.set(color);
        self.write(location, UniformValue::Vec3(color.into()));
        Ok(())
    }

    // ---- untracked uniforms ----------------------------------------------

    pub fn lighting(&self) -> bool {
        self.lighting
    }

    pub fn set_lighting(&mut self, enabled: bool) -> Result<()> {
        let location = self.location(Uniform::LightingEnabled)?;
        self.lighting = enabled;
        self.write(location, UniformValue::Int(enabled as i32));
        Ok(())
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Anti-aliasing samples per pixel; clamped to at least one.
    pub fn set_sample_count(&mut self, samples: u32) -> Result<()> {
        let location = self.location(Uniform::SampleCount)?;
        self.sample_count = samples.max(1);
        self.write(location, UniformValue::Int(self.sample_count as i32));
        Ok(())
    }

    pub fn set_view_matrix(&mut self, matrix: Mat4) -> Result<()> {
        let location = self.location(Uniform::ViewMatrix)?;
        self.view_matrix = matrix;
        self.write(location, UniformValue::Mat4(math::to_columns(&matrix)));
        Ok(())
    }

    pub fn set_projection_matrix(&mut self, matrix: Mat4) -> Result<()> {
        let location = self.location(Uniform::ProjectionMatrix)?;
        self.projection_matrix = matrix;
        self.write(location, UniformValue::Mat4(math::to_columns(&matrix)));
        Ok(())
    }

    // ---- stacks ----------------------------------------------------------

    pub fn depth(&self, attribute: Attribute) -> usize {
        match attribute {
            Attribute::ModelMatrix => self.model_matrix.depth(),
            Attribute::Material => self.material.depth(),
            Attribute::Texture => self.texture.depth(),
            Attribute::Color => self.color.depth(),
        }
    }

    /// Pushes the `tracked` attributes and returns the guard that pops them.
    pub fn scope(&mut self, tracked: Tracked) -> StateScope<'_> {
        StateScope::enter(self, tracked)
    }

    // ---- uniform plumbing ------------------------------------------------

    /// Where a write to `uniform` goes: fails without a bound program, and
    /// for an absent uniform unless the policy says to skip it.
    fn location(&self, uniform: Uniform) -> Result<Option<UniformLocation>> {
        let program = self.program.as_ref().ok_or(Error::NoActiveProgram)?;
        match (program.locations[uniform.index()], self.config.missing_uniform) {
            (Some(location), _) => Ok(Some(location)),
            (None, MissingUniformPolicy::Warn) => Ok(None),
            (None, MissingUniformPolicy::Fail) => Err(Error::MissingUniform {
                name: self.config.uniforms.name(uniform).to_string(),
            }),
        }
    }

    fn write(&mut self, location: Option<UniformLocation>, value: UniformValue) {
        if let Some(location) = location {
            self.backend.set_uniform(location, value);
        }
    }

    fn write_texture(&mut self, location: Option<UniformLocation>) {
        let texture = self.texture.current().as_ref().map(|t| t.id());
        self.write(location, UniformValue::Int(texture.is_some() as i32));
        self.backend.bind_texture(texture);
    }

    /// Re-sends the current value of `uniform` if a program is bound and
    /// exposes it. Never fails.
    fn sync(&mut self, uniform: Uniform) {
        let Some(program) = &self.program else {
            return;
        };
        let location = program.locations[uniform.index()];
        match uniform {
            Uniform::ModelMatrix => {
                let m = math::to_columns(self.model_matrix.current());
                self.write(location, UniformValue::Mat4(m));
            }
            Uniform::ViewMatrix => {
                let m = math::to_columns(&self.view_matrix);
                self.write(location, UniformValue::Mat4(m));
            }
            Uniform::ProjectionMatrix => {
                let m = math::to_columns(&self.projection_matrix);
                self.write(location, UniformValue::Mat4(m));
            }
            Uniform::Color => {
                let c = *self.color.current();
                self.write(location, UniformValue::Vec3(c.into()));
            }
            Uniform::Material => {
                let m = self.material.current().to_array();
                self.write(location, UniformValue::Vec4(m));
            }
            Uniform::TextureEnabled => self.write_texture(location),
            Uniform::LightingEnabled => {
                self.write(location, UniformValue::Int(self.lighting as i32))
            }
            Uniform::SampleCount => {
                self.write(location, UniformValue::Int(self.sample_count as i32))
            }
        }
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("program", &self.program)
            .field("model_matrix", &self.model_matrix)
            .field("material", &self.material)
            .field("texture", &self.texture)
            .field("color", &self.color)
            .field("lighting", &self.lighting)
            .field("sample_count", &self.sample_count)
            .finish_non_exhaustive()
    }
}
