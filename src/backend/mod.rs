//! The seam between the pipeline and an actual graphics API.
//!
//! A [`Backend`] behaves like a classic immediate-mode context: one program is
//! bound at a time, uniform writes target the bound program, and every
//! [`Backend::draw`] uses whatever uniforms and texture are current when it is
//! issued.
//!
//! - `recording` is a headless backend that logs every call
//! - `wgpu` (feature `gpu`) replays recorded draws into a wgpu render pass

pub mod recording;
#[cfg(feature = "gpu")]
pub mod wgpu;

use crate::{data_structures::mesh::VertexData, error::Result};

/// Vertex attribute slots every program is linked with.
pub const ATTRIB_POSITION: u32 = 0;
pub const ATTRIB_TEX_COORDS: u32 = 1;
pub const ATTRIB_NORMAL: u32 = 2;
pub const ATTRIB_COLOR: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 5] = [
        PrimitiveKind::Points,
        PrimitiveKind::Lines,
        PrimitiveKind::LineStrip,
        PrimitiveKind::Triangles,
        PrimitiveKind::TriangleStrip,
    ];
}

/// Source text of a program. Backends that take a single module for both
/// stages (WGSL) accept identical `vertex` and `fragment` strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
}

/// Decoded RGBA8 pixels to upload.
#[derive(Clone, Copy, Debug)]
pub struct TextureDesc<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
    /// Only power-of-two images get mipmaps; the rest are clamped to edge.
    pub generate_mipmaps: bool,
}

pub trait Backend {
    /// Compiles and links a program with the attribute slots above.
    fn create_program(&mut self, source: &ProgramSource) -> Result<ProgramId>;

    fn use_program(&mut self, program: Option<ProgramId>);

    /// Location of a uniform in `program`, `None` if the program does not
    /// expose it.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Writes a uniform of the bound program.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Uploads already validated vertex data.
    fn create_geometry(&mut self, label: &str, data: &VertexData) -> Result<GeometryId>;

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId>;

    /// Binds a texture to unit 0, or unbinds it.
    fn bind_texture(&mut self, texture: Option<TextureId>);

    /// Issues exactly one draw call with the bound program.
    fn draw(&mut self, geometry: GeometryId, kind: PrimitiveKind) -> Result<()>;
}
