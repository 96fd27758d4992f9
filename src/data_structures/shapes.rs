//! Ready-made meshes used by the demo scenes.
//!
//! Flat shapes lie in the `z = 0` (or `y = 0`) plane and span `[0, 1]` unless
//! stated otherwise. Parametric surfaces have unit radius and are tessellated
//! into `rows x columns` quads, each split into two indexed triangles.

use std::f32::consts::{FRAC_1_SQRT_2, PI, TAU};

use crate::{
    backend::PrimitiveKind,
    data_structures::{
        mesh::{Mesh, VertexData},
        scene_graph::SceneNode,
        texture::TextureRef,
    },
    error::{Error, Result},
};

const TRIANGLE_POSITIONS: [f32; 9] = [-0.4, -0.4, 0.0, 0.4, -0.4, 0.0, 0.0, 0.4, 0.0];
const TRIANGLE_COLORS: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
const FACING_Z: [f32; 9] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

pub fn triangle() -> Result<Mesh> {
    let data = VertexData::from_positions(TRIANGLE_POSITIONS.to_vec())
        .with_colors(TRIANGLE_COLORS.to_vec())
        .with_normals(FACING_Z.to_vec());
    Mesh::new("triangle", PrimitiveKind::Triangles, data)
}

pub fn indexed_triangle() -> Result<Mesh> {
    let data = VertexData::from_positions(TRIANGLE_POSITIONS.to_vec())
        .with_colors(TRIANGLE_COLORS.to_vec())
        .with_normals(FACING_Z.to_vec())
        .with_indices(vec![0, 1, 2]);
    Mesh::new("indexed triangle", PrimitiveKind::Triangles, data)
}

/// Unit square with one colour per corner, drawn as a triangle strip.
pub fn color_quad() -> Result<Mesh> {
    let data = VertexData::from_positions(vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        1.0, 1.0, 0.0,
    ])
    .with_colors(vec![
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 1.0, 1.0,
    ]);
    Mesh::new("color quad", PrimitiveKind::TriangleStrip, data)
}

/// Unit square in XY with texture coordinates; `v` grows downwards as image
/// rows do.
pub fn textured_square_xy() -> Result<Mesh> {
    let data = VertexData::from_positions(vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0,
    ])
    .with_normals([0.0, 0.0, 1.0].repeat(4))
    .with_tex_coords(vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0])
    .with_indices(vec![0, 1, 2, 0, 2, 3]);
    Mesh::new("textured square", PrimitiveKind::Triangles, data)
}

/// [`textured_square_xy`] wrapped in a node that binds `texture` for it.
pub fn textured_quad_xy(texture: TextureRef) -> Result<SceneNode> {
    let mut node = SceneNode::new("textured quad").with_texture(texture);
    node.add_drawable(textured_square_xy()?);
    Ok(node)
}

/// Square in the `y = 0` plane spanning `[-1, 1]` in X and Z, facing +Y.
pub fn square_xz() -> Result<Mesh> {
    let data = VertexData::from_positions(vec![
        -1.0, 0.0, -1.0, //
        1.0, 0.0, -1.0, //
        1.0, 0.0, 1.0, //
        -1.0, 0.0, 1.0,
    ])
    .with_normals([0.0, 1.0, 0.0].repeat(4))
    .with_tex_coords(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0])
    .with_indices(vec![0, 2, 1, 0, 3, 2]);
    Mesh::new("square xz", PrimitiveKind::Triangles, data)
}

/// Line grid over the unit square in the `z = 0` plane.
pub fn grid_xy(cells: u32) -> Result<Mesh> {
    if cells == 0 {
        return Err(Error::malformed("positions", "grid with no cells"));
    }
    let step = 1.0 / cells as f32;
    let mut positions = Vec::with_capacity(12 * (cells as usize + 1));
    for i in 0..=cells {
        let t = i as f32 * step;
        positions.extend_from_slice(&[t, 0.0, 0.0, t, 1.0, 0.0]);
        positions.extend_from_slice(&[0.0, t, 0.0, 1.0, t, 0.0]);
    }
    Mesh::new("grid xy", PrimitiveKind::Lines, VertexData::from_positions(positions))
}

/// The three coordinate axes in red, green and blue, `length` long in the
/// positive direction and half that in the negative one.
pub fn axes(length: f32) -> Result<Mesh> {
    let back = -0.5 * length;
    let data = VertexData::from_positions(vec![
        back, 0.0, 0.0, length, 0.0, 0.0, //
        0.0, back, 0.0, 0.0, length, 0.0, //
        0.0, 0.0, back, 0.0, 0.0, length,
    ])
    .with_colors(vec![
        1.0, 0.0, 0.0, 1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, 0.0, 1.0,
    ]);
    Mesh::new("axes", PrimitiveKind::Lines, data)
}

/// Unit sphere centred at the origin.
pub fn sphere(rows: u32, columns: u32) -> Result<Mesh> {
    parametric("sphere", rows, columns, |u, v| {
        let (s, c) = (TAU * u).sin_cos();
        let lat = PI * (v - 0.5);
        let (sl, cl) = lat.sin_cos();
        let p = [cl * s, sl, cl * c];
        (p, p)
    })
}

/// Cone with its unit-radius base at `y = 0` and its apex at `y = 1`.
pub fn cone(rows: u32, columns: u32) -> Result<Mesh> {
    let slant = FRAC_1_SQRT_2;
    parametric("cone", rows, columns, |u, v| {
        let (s, c) = (TAU * u).sin_cos();
        let r = 1.0 - v;
        ([r * s, v, r * c], [slant * s, slant, slant * c])
    })
}

/// Open unit-radius cylinder between `y = 0` and `y = 1`.
pub fn cylinder(rows: u32, columns: u32) -> Result<Mesh> {
    parametric("cylinder", rows, columns, |u, v| {
        let (s, c) = (TAU * u).sin_cos();
        ([s, v, c], [s, 0.0, c])
    })
}

/// Tessellates `f(u, v) -> (position, normal)` over `[0, 1]^2`. The seam
/// column is duplicated so texture coordinates wrap cleanly.
fn parametric(
    name: &str,
    rows: u32,
    columns: u32,
    f: impl Fn(f32, f32) -> ([f32; 3], [f32; 3]),
) -> Result<Mesh> {
    if rows == 0 || columns == 0 {
        return Err(Error::malformed(
            "positions",
            format!("{name} needs at least one row and one column, got {rows}x{columns}"),
        ));
    }
    let vertices = ((rows + 1) * (columns + 1)) as usize;
    let mut positions = Vec::with_capacity(vertices * 3);
    let mut normals = Vec::with_capacity(vertices * 3);
    let mut tex_coords = Vec::with_capacity(vertices * 2);
    for row in 0..=rows {
        let v = row as f32 / rows as f32;
        for column in 0..=columns {
            let u = column as f32 / columns as f32;
            let (p, n) = f(u, v);
            positions.extend_from_slice(&p);
            normals.extend_from_slice(&n);
            tex_coords.extend_from_slice(&[u, 1.0 - v]);
        }
    }
    let stride = columns + 1;
    let mut indices = Vec::with_capacity((rows * columns * 6) as usize);
    for row in 0..rows {
        for column in 0..columns {
            let a = row * stride + column;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }
    let data = VertexData::from_positions(positions)
        .with_normals(normals)
        .with_tex_coords(tex_coords)
        .with_indices(indices);
    Mesh::new(name, PrimitiveKind::Triangles, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parametric_counts() {
        let mesh = sphere(4, 8).unwrap();
        assert_eq!(mesh.data().vertex_count(), 5 * 9);
        assert_eq!(mesh.data().element_count(), 4 * 8 * 6);
        assert!(mesh.edge_data().is_some());
        assert!(mesh.normal_data().is_some());
    }

    #[test]
    fn zero_divisions_are_rejected() {
        assert!(matches!(cone(0, 4), Err(Error::MalformedVertexData { .. })));
        assert!(matches!(cylinder(3, 0), Err(Error::MalformedVertexData { .. })));
        assert!(matches!(grid_xy(0), Err(Error::MalformedVertexData { .. })));
    }

    #[test]
    fn line_shapes_have_no_edges() {
        assert!(axes(1.0).unwrap().edge_data().is_none());
        assert!(grid_xy(8).unwrap().edge_data().is_none());
    }

    #[test]
    fn sphere_normals_are_unit_length() {
        let mesh = sphere(6, 6).unwrap();
        let normals = mesh.data().normals.as_ref().unwrap();
        for n in normals.chunks_exact(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }
}
