use std::rc::Rc;

use scene_ngin::{
    Material, PrimitiveKind, SceneNode,
    backend::{UniformValue, recording::DrawRecord},
    data_structures::shapes,
    math::{self, vec3},
    scenes,
};

use crate::common::test_utils::{
    assert_close, bound_pipeline, checker, names, translation_of,
};

mod common;

fn model_translation(draw: &DrawRecord) -> [f32; 3] {
    translation_of(draw.mat4(&names().model_matrix).unwrap())
}

#[test]
fn transforms_affect_only_later_entries() {
    let (mut pipeline, log) = bound_pipeline();
    let a = Rc::new(shapes::triangle().unwrap());
    let b = Rc::new(shapes::indexed_triangle().unwrap());

    let mut root = SceneNode::new("root");
    root.add(math::translation(vec3(1.0, 0.0, 0.0)));
    root.add_drawable(shapes::triangle().unwrap());
    root.add(math::translation(vec3(0.0, 1.0, 0.0)));
    root.add_drawable(shapes::indexed_triangle().unwrap());
    root.visualize(&mut pipeline, false).unwrap();

    let draws = log.draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].label, "triangle");
    assert_close(model_translation(&draws[0]), [1.0, 0.0, 0.0]);
    assert_eq!(draws[1].label, "indexed triangle");
    assert_close(model_translation(&draws[1]), [1.0, 1.0, 0.0]);

    // A child inherits what came before it; its own transforms stay inside.
    log.clear();
    let mut child = SceneNode::new("child");
    child.add(math::translation(vec3(0.0, 0.0, 5.0)));
    child.add(a.clone() as Rc<dyn scene_ngin::Drawable>);
    let mut root = SceneNode::new("root");
    root.add(a as Rc<dyn scene_ngin::Drawable>);
    root.add(math::translation(vec3(2.0, 0.0, 0.0)));
    root.add(child);
    root.add(b as Rc<dyn scene_ngin::Drawable>);
    root.visualize(&mut pipeline, false).unwrap();

    let draws = log.draws();
    assert_eq!(draws.len(), 3);
    assert_close(model_translation(&draws[0]), [0.0, 0.0, 0.0]);
    assert_close(model_translation(&draws[1]), [2.0, 0.0, 5.0]);
    assert_close(model_translation(&draws[2]), [2.0, 0.0, 0.0]);
}

#[test]
fn local_model_matrix_applies_in_every_mode() {
    let (mut pipeline, log) = bound_pipeline();
    let mut node =
        SceneNode::new("placed").with_model_matrix(math::translation(vec3(0.0, 3.0, 0.0)));
    node.add_drawable(shapes::sphere(2, 3).unwrap());

    node.visualize(&mut pipeline, true).unwrap();
    node.visualize_edges(&mut pipeline).unwrap();
    node.visualize_normals(&mut pipeline).unwrap();
    node.visualize_geometry(&mut pipeline).unwrap();

    let draws = log.draws();
    let kinds: Vec<_> = draws.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            PrimitiveKind::Triangles,
            PrimitiveKind::Lines,
            PrimitiveKind::Lines,
            PrimitiveKind::Triangles
        ]
    );
    for draw in &draws {
        assert_close(model_translation(draw), [0.0, 3.0, 0.0]);
    }
}

fn material_graph() -> SceneNode {
    let mut root = SceneNode::new("materials");
    root.add(Material::new(0.5, 0.5, 0.5, 8.0));
    root.add_drawable(shapes::triangle().unwrap());
    let mut child = SceneNode::new("shiny").with_material(Material::new(0.0, 1.0, 1.0, 90.0));
    child.add_drawable(shapes::indexed_triangle().unwrap());
    root.add(child);
    root
}

fn without(draw: &DrawRecord, uniform: &str) -> DrawRecord {
    let mut draw = draw.clone();
    draw.uniforms.remove(uniform);
    draw
}

#[test]
fn lighting_gates_material_entries_only() {
    let names = names();
    let (mut pipeline, log) = bound_pipeline();
    let graph = material_graph();

    graph.visualize(&mut pipeline, true).unwrap();
    let lit = log.draws();
    log.clear();
    graph.visualize(&mut pipeline, false).unwrap();
    let unlit = log.draws();

    let default = UniformValue::Vec4(Material::default().to_array());
    assert_eq!(
        lit[0].uniform(&names.material),
        Some(&UniformValue::Vec4([0.5, 0.5, 0.5, 8.0]))
    );
    assert_eq!(
        lit[1].uniform(&names.material),
        Some(&UniformValue::Vec4([0.0, 1.0, 1.0, 90.0]))
    );
    assert!(unlit.iter().all(|d| d.uniform(&names.material) == Some(&default)));

    assert_eq!(lit.len(), unlit.len());
    for (l, u) in lit.iter().zip(&unlit) {
        assert_eq!(without(l, &names.material), without(u, &names.material));
    }
}

#[test]
fn repeated_traversals_are_identical() {
    let (mut pipeline, log) = bound_pipeline();
    let texture = checker(&mut pipeline, "checker");
    let graph = scenes::test_graph(texture).unwrap();
    // The first traversal also uploads the geometry.
    graph.visualize(&mut pipeline, true).unwrap();

    for lighting in [false, true] {
        log.clear();
        graph.visualize(&mut pipeline, lighting).unwrap();
        let first = log.calls();
        log.clear();
        graph.visualize(&mut pipeline, lighting).unwrap();
        assert_eq!(log.calls(), first);
    }
}

#[test]
fn color_override_is_scoped_to_the_subtree() {
    let names = names();
    let (mut pipeline, log) = bound_pipeline();
    let mut red = SceneNode::new("red").with_color(vec3(1.0, 0.0, 0.0));
    red.add_drawable(shapes::grid_xy(1).unwrap());
    let mut root = SceneNode::new("root");
    root.add(red);
    root.add_drawable(shapes::axes(1.0).unwrap());
    root.visualize(&mut pipeline, false).unwrap();

    let draws = log.draws();
    assert_eq!(
        draws[0].uniform(&names.color),
        Some(&UniformValue::Vec3([1.0, 0.0, 0.0]))
    );
    assert_eq!(
        draws[1].uniform(&names.color),
        Some(&UniformValue::Vec3([1.0, 1.0, 1.0]))
    );
}
