//! Scene graph: nodes holding ordered, heterogeneous entries.
//!
//! A [`SceneNode`] is visited depth-first. Entries act left to right: a
//! transform affects every entry after it in the same node (children
//! included) and nothing before it. Every visit scopes the pipeline state it
//! touches, so the pipeline looks the same after a visit as before it, also
//! when a visit fails halfway.

use std::{fmt, rc::Rc};

use crate::{
    data_structures::{material::Material, mesh::Drawable, texture::TextureRef},
    error::Result,
    math::{Mat4, Vec3},
    pipeline::{Pipeline, Tracked},
};

/// One element of a node's entry list.
pub enum SceneEntry {
    Node(SceneNode),
    Drawable(Rc<dyn Drawable>),
    Transform(Mat4),
    Texture(TextureRef),
    Material(Material),
}

impl fmt::Debug for SceneEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneEntry::Node(node) => f.debug_tuple("Node").field(node).finish(),
            SceneEntry::Drawable(d) => f.debug_tuple("Drawable").field(&d.name()).finish(),
            SceneEntry::Transform(m) => f.debug_tuple("Transform").field(m).finish(),
            SceneEntry::Texture(t) => f.debug_tuple("Texture").field(&t.name()).finish(),
            SceneEntry::Material(m) => f.debug_tuple("Material").field(m).finish(),
        }
    }
}

impl From<SceneNode> for SceneEntry {
    fn from(node: SceneNode) -> Self {
        SceneEntry::Node(node)
    }
}

impl From<Rc<dyn Drawable>> for SceneEntry {
    fn from(drawable: Rc<dyn Drawable>) -> Self {
        SceneEntry::Drawable(drawable)
    }
}

impl From<Mat4> for SceneEntry {
    fn from(matrix: Mat4) -> Self {
        SceneEntry::Transform(matrix)
    }
}

impl From<TextureRef> for SceneEntry {
    fn from(texture: TextureRef) -> Self {
        SceneEntry::Texture(texture)
    }
}

impl From<Material> for SceneEntry {
    fn from(material: Material) -> Self {
        SceneEntry::Material(material)
    }
}

/// State a node applies to its whole subtree before its first entry.
#[derive(Clone, Debug, Default)]
pub struct LocalState {
    pub color: Option<Vec3>,
    pub material: Option<Material>,
    pub texture: Option<TextureRef>,
    pub model_matrix: Option<Mat4>,
}

impl LocalState {
    pub fn is_empty(&self) -> bool {
        self.color.is_none()
            && self.material.is_none()
            && self.texture.is_none()
            && self.model_matrix.is_none()
    }
}

/// Which of the four traversals is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VisitMode {
    /// Full appearance: textures, materials and colours.
    Shaded,
    Wireframe,
    Normals,
    /// Transforms only, drawing bare geometry.
    GeometryOnly,
}

impl VisitMode {
    pub const ALL: [VisitMode; 4] = [
        VisitMode::Shaded,
        VisitMode::Wireframe,
        VisitMode::Normals,
        VisitMode::GeometryOnly,
    ];

    /// Attributes a node saves on entry.
    pub fn tracked(self) -> Tracked {
        match self {
            VisitMode::Shaded => Tracked::SHADED,
            _ => Tracked::MODEL_MATRIX,
        }
    }

    /// Whether texture, material and colour entries take effect.
    pub fn applies_appearance(self) -> bool {
        self == VisitMode::Shaded
    }

    fn draw_leaf(self, drawable: &dyn Drawable, pipeline: &mut Pipeline) -> Result<()> {
        match self {
            VisitMode::Shaded => drawable.draw(pipeline),
            VisitMode::Wireframe => drawable.draw_edges(pipeline),
            VisitMode::Normals => drawable.draw_normals(pipeline),
            VisitMode::GeometryOnly => drawable.draw_geometry(pipeline),
        }
    }
}

#[derive(Debug, Default)]
pub struct SceneNode {
    name: String,
    entries: Vec<SceneEntry>,
    local: LocalState,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
            local: LocalState::default(),
        }
    }

    pub fn with_local(mut self, local: LocalState) -> Self {
        self.local = local;
        self
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.local.color = Some(color);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.local.material = Some(material);
        self
    }

    pub fn with_texture(mut self, texture: TextureRef) -> Self {
        self.local.texture = Some(texture);
        self
    }

    pub fn with_model_matrix(mut self, matrix: Mat4) -> Self {
        self.local.model_matrix = Some(matrix);
        self
    }

    /// Builder form of [`SceneNode::add`].
    pub fn with(mut self, entry: impl Into<SceneEntry>) -> Self {
        self.add(entry);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local(&self) -> &LocalState {
        &self.local
    }

    /// Appends an entry and returns its index.
    pub fn add(&mut self, entry: impl Into<SceneEntry>) -> usize {
        self.entries.push(entry.into());
        self.entries.len() - 1
    }

    /// Appends a drawable leaf and returns its index.
    pub fn add_drawable(&mut self, drawable: impl Drawable + 'static) -> usize {
        self.add(SceneEntry::Drawable(Rc::new(drawable)))
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut SceneEntry> {
        self.entries.get_mut(index)
    }

    /// Replaces the matrix of the transform entry at `index`. Returns `false`
    /// when there is no transform entry there.
    pub fn set_transform(&mut self, index: usize, matrix: Mat4) -> bool {
        match self.entries.get_mut(index) {
            Some(SceneEntry::Transform(current)) => {
                *current = matrix;
                true
            }
            _ => false,
        }
    }

    pub fn visualize(&self, pipeline: &mut Pipeline, lighting: bool) -> Result<()> {
        self.visit(pipeline, VisitMode::Shaded, lighting)
    }

    pub fn visualize_edges(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.visit(pipeline, VisitMode::Wireframe, false)
    }

    pub fn visualize_normals(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.visit(pipeline, VisitMode::Normals, false)
    }

    pub fn visualize_geometry(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.visit(pipeline, VisitMode::GeometryOnly, false)
    }

    /// Visits this node and its subtree. `lighting` gates material entries
    /// and material overrides; it is only read in [`VisitMode::Shaded`].
    pub fn visit(&self, pipeline: &mut Pipeline, mode: VisitMode, lighting: bool) -> Result<()> {
        log::trace!("visit '{}' ({mode:?})", self.name);
        let mut scope = pipeline.scope(mode.tracked());
        let visited = self.apply_local(&mut scope, mode, lighting);
        let restored = scope.exit();
        visited.and(restored)
    }

    fn apply_local(&self, pipeline: &mut Pipeline, mode: VisitMode, lighting: bool) -> Result<()> {
        if let Some(matrix) = &self.local.model_matrix {
            pipeline.compose_model_matrix(matrix)?;
        }
        if !mode.applies_appearance() {
            return self.visit_entries(pipeline, mode, lighting);
        }
        if let Some(texture) = &self.local.texture {
            pipeline.set_texture(Some(texture.clone()))?;
        }
        if let Some(material) = self.local.material.filter(|_| lighting) {
            pipeline.set_material(material)?;
        }
        match self.local.color {
            Some(color) => {
                let mut colored = pipeline.scope(Tracked::COLOR);
                colored.set_color(color)?;
                let visited = self.visit_entries(&mut colored, mode, lighting);
                let restored = colored.exit();
                visited.and(restored)
            }
            None => self.visit_entries(pipeline, mode, lighting),
        }
    }

    fn visit_entries(&self, pipeline: &mut Pipeline, mode: VisitMode, lighting: bool) -> Result<()> {
        for entry in &self.entries {
            match entry {
                SceneEntry::Node(node) => node.visit(pipeline, mode, lighting)?,
                SceneEntry::Drawable(drawable) => mode.draw_leaf(drawable.as_ref(), pipeline)?,
                SceneEntry::Transform(matrix) => pipeline.compose_model_matrix(matrix)?,
                SceneEntry::Texture(texture) => {
                    if mode.applies_appearance() {
                        pipeline.set_texture(Some(texture.clone()))?;
                    }
                }
                SceneEntry::Material(material) => {
                    if mode.applies_appearance() && lighting {
                        pipeline.set_material(*material)?;
                    }
                }
            }
        }
        Ok(())
    }
}
