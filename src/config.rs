//! Configuration for the pipeline and the application shell.

use crate::{camera::OrbitCamera, logging::LoggingConfig, pipeline::Uniform};

/// What the pipeline does when the bound program lacks a uniform it has to
/// write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissingUniformPolicy {
    /// The write fails with [`crate::Error::MissingUniform`].
    #[default]
    Fail,
    /// A warning is logged when the program is bound; writes to that uniform
    /// are then skipped.
    Warn,
}

/// Shader-side names of the uniforms the pipeline keeps in sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformNames {
    pub model_matrix: String,
    pub view_matrix: String,
    pub projection_matrix: String,
    pub color: String,
    pub material: String,
    pub texture_enabled: String,
    pub lighting_enabled: String,
    pub sample_count: String,
}

impl UniformNames {
    pub fn name(&self, uniform: Uniform) -> &str {
        match uniform {
            Uniform::ModelMatrix => &self.model_matrix,
            Uniform::ViewMatrix => &self.view_matrix,
            Uniform::ProjectionMatrix => &self.projection_matrix,
            Uniform::Color => &self.color,
            Uniform::Material => &self.material,
            Uniform::TextureEnabled => &self.texture_enabled,
            Uniform::LightingEnabled => &self.lighting_enabled,
            Uniform::SampleCount => &self.sample_count,
        }
    }
}

impl Default for UniformNames {
    fn default() -> Self {
        Self {
            model_matrix: "u_model_matrix".into(),
            view_matrix: "u_view_matrix".into(),
            projection_matrix: "u_projection_matrix".into(),
            color: "u_color".into(),
            material: "u_material".into(),
            texture_enabled: "u_texture_enabled".into(),
            lighting_enabled: "u_lighting_enabled".into(),
            sample_count: "u_sample_count".into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub uniforms: UniformNames,
    pub missing_uniform: MissingUniformPolicy,
}

/// Settings of the windowed application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// RGBA clear colour, channels in `[0, 1]`.
    pub clear_colour: [f64; 4],
    /// Initial value of the lighting flag read by every traversal.
    pub lighting: bool,
    /// Anti-aliasing sample count handed to the shader.
    pub sample_count: u32,
    pub camera: OrbitCamera,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "scene-ngin".into(),
            width: 1024,
            height: 768,
            clear_colour: [0.9, 0.9, 0.9, 1.0],
            lighting: true,
            sample_count: 1,
            camera: OrbitCamera::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
