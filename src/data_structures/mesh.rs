//! Drawable primitives.
//!
//! A [`Drawable`] is a leaf of the scene graph. It never touches the state
//! stacks: whoever calls it has already composed the model matrix and set the
//! material, texture and colour it should be drawn with.

use std::{cell::RefCell, collections::BTreeSet};

use crate::{
    backend::{GeometryId, PrimitiveKind},
    error::{Error, Result},
    pipeline::{Pipeline, PipelineId},
};

/// Length given to the segments drawn by [`Drawable::draw_normals`].
pub const NORMAL_SEGMENT_LENGTH: f32 = 0.1;

pub trait Drawable {
    fn name(&self) -> &str;

    /// Shaded draw.
    fn draw(&self, pipeline: &mut Pipeline) -> Result<()>;

    /// Wireframe draw. Primitives without faces draw nothing.
    fn draw_edges(&self, _pipeline: &mut Pipeline) -> Result<()> {
        Ok(())
    }

    /// One segment per vertex along its normal. Nothing without normals.
    fn draw_normals(&self, _pipeline: &mut Pipeline) -> Result<()> {
        Ok(())
    }

    /// Bare geometry, for passes that only need coverage or depth.
    fn draw_geometry(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.draw(pipeline)
    }
}

/// Flat vertex attribute arrays as handed to a backend.
///
/// Positions, normals and colours have 3 components per vertex, texture
/// coordinates 2. Indices are optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexData {
    pub positions: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    pub colors: Option<Vec<f32>>,
    pub tex_coords: Option<Vec<f32>>,
    pub indices: Option<Vec<u32>>,
}

impl VertexData {
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self {
            positions,
            ..Default::default()
        }
    }

    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_colors(mut self, colors: Vec<f32>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: Vec<f32>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    /// Checks the array shapes and returns the vertex count.
    pub fn validate(&self) -> Result<usize> {
        if self.positions.is_empty() {
            return Err(Error::malformed("positions", "no vertices"));
        }
        let vertex_count = count_vertices("positions", &self.positions, 3)?;
        let optional = [
            ("normals", self.normals.as_deref(), 3),
            ("colors", self.colors.as_deref(), 3),
            ("tex_coords", self.tex_coords.as_deref(), 2),
        ];
        for (attribute, values, components) in optional {
            let Some(values) = values else { continue };
            let count = count_vertices(attribute, values, components)?;
            if count != vertex_count {
                return Err(Error::malformed(
                    attribute,
                    format!("{count} entries for {vertex_count} positions"),
                ));
            }
        }
        if let Some(indices) = &self.indices {
            if indices.is_empty() {
                return Err(Error::malformed("indices", "index array is empty"));
            }
            if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(Error::malformed(
                    "indices",
                    format!("index {bad} out of range for {vertex_count} vertices"),
                ));
            }
        }
        Ok(vertex_count)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of elements a draw of this data covers.
    pub fn element_count(&self) -> usize {
        self.indices
            .as_ref()
            .map_or(self.vertex_count(), |indices| indices.len())
    }

    pub fn position(&self, vertex: usize) -> [f32; 3] {
        let p = &self.positions[vertex * 3..vertex * 3 + 3];
        [p[0], p[1], p[2]]
    }
}

fn count_vertices(attribute: &'static str, values: &[f32], components: usize) -> Result<usize> {
    if values.len() % components != 0 {
        return Err(Error::malformed(
            attribute,
            format!(
                "length {} is not a multiple of {components}",
                values.len()
            ),
        ));
    }
    Ok(values.len() / components)
}

/// Geometry uploaded to a pipeline's backend on first use there and reused
/// afterwards, once per pipeline.
#[derive(Debug)]
struct Buffers {
    data: VertexData,
    kind: PrimitiveKind,
    uploads: RefCell<Vec<(PipelineId, GeometryId)>>,
}

impl Buffers {
    fn new(data: VertexData, kind: PrimitiveKind) -> Self {
        Self {
            data,
            kind,
            uploads: RefCell::new(Vec::new()),
        }
    }

    fn draw(&self, label: &str, pipeline: &mut Pipeline) -> Result<()> {
        let uploaded = self
            .uploads
            .borrow()
            .iter()
            .find(|(owner, _)| *owner == pipeline.id())
            .map(|(_, geometry)| *geometry);
        let geometry = match uploaded {
            Some(geometry) => geometry,
            None => {
                let geometry = pipeline.create_geometry(label, &self.data)?;
                self.uploads.borrow_mut().push((pipeline.id(), geometry));
                geometry
            }
        };
        pipeline.draw(geometry, self.kind)
    }
}

/// A mesh with its derived wireframe and normal-segment geometries.
///
/// Each pipeline that draws the mesh gets its own upload.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    shaded: Buffers,
    edges: Option<Buffers>,
    normals: Option<Buffers>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, kind: PrimitiveKind, data: VertexData) -> Result<Self> {
        let name = name.into();
        let vertex_count = data.validate()?;
        log::trace!("mesh '{name}': {vertex_count} vertices, {kind:?}");
        let edges = edge_data(&data, kind).map(|d| Buffers::new(d, PrimitiveKind::Lines));
        let normals = normal_data(&data).map(|d| Buffers::new(d, PrimitiveKind::Lines));
        Ok(Self {
            name,
            shaded: Buffers::new(data, kind),
            edges,
            normals,
        })
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.shaded.kind
    }

    pub fn data(&self) -> &VertexData {
        &self.shaded.data
    }

    pub fn edge_data(&self) -> Option<&VertexData> {
        self.edges.as_ref().map(|b| &b.data)
    }

    pub fn normal_data(&self) -> Option<&VertexData> {
        self.normals.as_ref().map(|b| &b.data)
    }
}

impl Drawable for Mesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn draw(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.shaded.draw(&self.name, pipeline)
    }

    fn draw_edges(&self, pipeline: &mut Pipeline) -> Result<()> {
        match &self.edges {
            Some(edges) => edges.draw(&format!("{} edges", self.name), pipeline),
            None => Ok(()),
        }
    }

    fn draw_normals(&self, pipeline: &mut Pipeline) -> Result<()> {
        match &self.normals {
            Some(normals) => normals.draw(&format!("{} normals", self.name), pipeline),
            None => Ok(()),
        }
    }

    fn draw_geometry(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.shaded.draw(&self.name, pipeline)
    }
}

fn triangles(data: &VertexData, kind: PrimitiveKind) -> Vec<[u32; 3]> {
    let elements: Vec<u32> = match &data.indices {
        Some(indices) => indices.clone(),
        None => (0..data.vertex_count() as u32).collect(),
    };
    match kind {
        PrimitiveKind::Triangles => elements
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect(),
        PrimitiveKind::TriangleStrip => elements
            .windows(3)
            .map(|w| [w[0], w[1], w[2]])
            .collect(),
        _ => Vec::new(),
    }
}

/// Line list over the unique edges of the triangles, sharing the positions.
fn edge_data(data: &VertexData, kind: PrimitiveKind) -> Option<VertexData> {
    let mut edges = BTreeSet::new();
    for [a, b, c] in triangles(data, kind) {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            if from != to {
                edges.insert((from.min(to), from.max(to)));
            }
        }
    }
    if edges.is_empty() {
        return None;
    }
    let indices = edges.into_iter().flat_map(|(a, b)| [a, b]).collect();
    Some(VertexData::from_positions(data.positions.clone()).with_indices(indices))
}

/// Two positions per vertex: the vertex and the tip of its normal.
fn normal_data(data: &VertexData) -> Option<VertexData> {
    let normals = data.normals.as_ref()?;
    let positions = data
        .positions
        .chunks_exact(3)
        .zip(normals.chunks_exact(3))
        .flat_map(|(p, n)| {
            [
                p[0],
                p[1],
                p[2],
                p[0] + n[0] * NORMAL_SEGMENT_LENGTH,
                p[1] + n[1] * NORMAL_SEGMENT_LENGTH,
                p[2] + n[2] * NORMAL_SEGMENT_LENGTH,
            ]
        })
        .collect();
    Some(VertexData::from_positions(positions))
}
