//! Scene data: drawables, their appearance and the graph that arranges them.
//!
//! - `mesh` holds validated vertex data and the [`mesh::Drawable`] contract
//! - `material` and `texture` describe appearance
//! - `shapes` builds the stock meshes
//! - `scene_graph` arranges everything into a traversable tree

pub mod material;
pub mod mesh;
pub mod scene_graph;
pub mod shapes;
pub mod texture;
