use scene_ngin::{
    PrimitiveKind, SceneEntry, SceneNode,
    data_structures::shapes,
    math::{self, vec3},
    scenes::{self, Orbit},
};

use crate::common::test_utils::{
    Snapshot, assert_close, bound_pipeline, checker, names, translation_of,
};

mod common;

#[test]
fn textured_quad_then_translated_triangle() {
    let names = names();
    let (mut pipeline, log) = bound_pipeline();
    let texture = checker(&mut pipeline, "checker");

    let mut triangle = SceneNode::new("triangle node");
    triangle.add_drawable(shapes::triangle().unwrap());
    let mut root = SceneNode::new("root");
    root.add(shapes::textured_quad_xy(texture.clone()).unwrap());
    root.add(math::translation(vec3(0.0, 0.0, 0.2)));
    root.add(triangle);

    let before = Snapshot::of(&pipeline);
    root.visualize(&mut pipeline, true).unwrap();
    assert_eq!(Snapshot::of(&pipeline), before);

    let draws = log.draws();
    assert_eq!(draws.len(), 2);

    let quad = &draws[0];
    assert_eq!(quad.label, "textured square");
    assert_eq!(
        quad.mat4(&names.model_matrix),
        Some(math::to_columns(&math::identity()))
    );
    assert_eq!(quad.texture, Some(texture.id()));
    assert_eq!(quad.int(&names.texture_enabled), Some(1));

    let tri = &draws[1];
    assert_eq!(tri.label, "triangle");
    assert_close(
        translation_of(tri.mat4(&names.model_matrix).unwrap()),
        [0.0, 0.0, 0.2],
    );
    assert_eq!(tri.texture, None);
    assert_eq!(tri.int(&names.texture_enabled), Some(0));
}

#[test]
fn test_graph_draws_every_shape_in_order() {
    let names = names();
    let (mut pipeline, log) = bound_pipeline();
    let texture = checker(&mut pipeline, "checker");
    let graph = scenes::test_graph(texture).unwrap();

    graph.visualize(&mut pipeline, false).unwrap();
    let draws = log.draws();
    let labels: Vec<_> = draws.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(
        labels,
        [
            "textured square",
            "color quad",
            "triangle",
            "indexed triangle",
            "grid xy",
            "grid xy"
        ]
    );

    let rotated = math::compose(
        &math::rotation_y_deg(70.0),
        &math::translation(vec3(0.0, 0.0, 0.3)),
    );
    assert_eq!(
        draws[0].mat4(&names.model_matrix),
        Some(math::to_columns(&rotated))
    );
    let z: Vec<f32> = draws[1..]
        .iter()
        .map(|d| translation_of(d.mat4(&names.model_matrix).unwrap())[2])
        .collect();
    for (actual, expected) in z.iter().zip([0.0, 0.2, 0.4, 0.6, 1.1]) {
        assert!((actual - expected).abs() < 1e-5, "{z:?}");
    }

    log.clear();
    graph.visualize_edges(&mut pipeline).unwrap();
    let edges = log.draws();
    assert_eq!(edges.len(), 4);
    assert!(edges.iter().all(|d| d.kind == PrimitiveKind::Lines));

    log.clear();
    graph.visualize_normals(&mut pipeline).unwrap();
    assert_eq!(log.draws().len(), 3);

    log.clear();
    graph.visualize_geometry(&mut pipeline).unwrap();
    assert_eq!(log.draws().len(), 6);
    assert!(log.draws().iter().all(|d| d.texture.is_none()));
}

#[test]
fn materials_graph_binds_one_texture_per_surface() {
    let (mut pipeline, log) = bound_pipeline();
    let textures = [
        checker(&mut pipeline, "a"),
        checker(&mut pipeline, "b"),
        checker(&mut pipeline, "c"),
    ];
    let graph =
        scenes::materials_graph(textures[0].clone(), textures[1].clone(), textures[2].clone())
            .unwrap();
    graph.visualize(&mut pipeline, true).unwrap();

    let draws = log.draws();
    let bound: Vec<_> = draws.iter().map(|d| d.texture).collect();
    assert_eq!(
        bound,
        textures.iter().map(|t| Some(t.id())).collect::<Vec<_>>()
    );
    assert_eq!(pipeline.texture(), None);
}

#[test]
fn orbit_moves_the_ball_only() {
    let names = names();
    let (mut pipeline, log) = bound_pipeline();
    let floor = checker(&mut pipeline, "floor");
    let mut orbit = Orbit {
        speed_deg_per_sec: 90.0,
        ..Orbit::default()
    };
    let mut root = orbit.build(floor).unwrap();

    root.visualize(&mut pipeline, true).unwrap();
    let start = log.draws();
    assert_close(
        translation_of(start[0].mat4(&names.model_matrix).unwrap()),
        [0.8, 0.1, 0.0],
    );

    assert!(orbit.advance(&mut root, 1.0));
    assert!(!orbit.advance(&mut root, 0.0));
    log.clear();
    root.visualize(&mut pipeline, true).unwrap();
    let moved = log.draws();
    assert_close(
        translation_of(moved[0].mat4(&names.model_matrix).unwrap()),
        [0.0, 0.1, -0.8],
    );
    assert_eq!(moved[1], start[1]);

    assert!(matches!(root.entries()[1], SceneEntry::Node(_)));
    let mut plain = SceneNode::new("plain");
    let angle = orbit.angle_deg;
    assert!(!orbit.advance(&mut plain, 1.0));
    assert_eq!(orbit.angle_deg, angle);
}
