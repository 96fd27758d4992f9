//! scene-ngin
//!
//! A small scene-graph renderer. Scene nodes hold ordered, heterogeneous
//! entries (child nodes, drawables, transforms, textures and materials) and
//! are drawn by a depth-first traversal that composes the model matrix and
//! scopes appearance state on a [`Pipeline`], the facade over the bound
//! shader program.
//!
//! High-level modules
//! - `math`: cgmath aliases, transform constructors and bounding boxes
//! - `pipeline`: attribute stacks, write-through uniforms and scope guards
//! - `backend`: the graphics API seam, a recording backend and (feature
//!   `gpu`) a wgpu backend
//! - `data_structures`: meshes, materials, textures, shapes and the scene graph
//! - `scenes`: ready-made demo graphs
//! - `camera`: orbit camera and mouse-drag tracking
//! - `resources`: async loading of shaders, images and files
//! - `app` (feature `gpu`): the winit application shell
//!

pub mod backend;
pub mod camera;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod logging;
pub mod math;
pub mod pipeline;
pub mod resources;
pub mod scenes;

#[cfg(feature = "gpu")]
pub mod app;
#[cfg(feature = "gpu")]
pub mod context;

// Re-exports commonly used types for convenience in downstream code.
pub use backend::{Backend, PrimitiveKind, ProgramSource};
pub use config::{AppConfig, MissingUniformPolicy, PipelineConfig};
pub use data_structures::{
    material::Material,
    mesh::{Drawable, Mesh, VertexData},
    scene_graph::{LocalState, SceneEntry, SceneNode, VisitMode},
    texture::{Texture, TextureRef},
};
pub use error::{Error, Result};
pub use pipeline::{Attribute, Pipeline, StateScope, Tracked};
