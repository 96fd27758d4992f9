use rand::{SeedableRng, rngs::StdRng};
use scene_ngin::{
    Attribute, Material, MissingUniformPolicy, SceneNode, Tracked, VisitMode,
    math::{self, vec3},
};

use crate::common::test_utils::{
    Assets, Snapshot, bound_pipeline, checker, failing_tree, names, random_tree,
    restricted_pipeline,
};

mod common;

#[test]
fn random_trees_leave_the_pipeline_as_they_found_it() {
    let mut rng = StdRng::seed_from_u64(0x5ce9e);
    let (mut pipeline, _log) = bound_pipeline();
    let assets = Assets::new(&mut pipeline);

    // Start from non-default state with something already on every stack.
    let mut outer = pipeline.scope(Tracked::ALL);
    outer.set_model_matrix(math::translation(vec3(0.5, -1.0, 2.0))).unwrap();
    outer.set_material(Material::new(0.1, 0.2, 0.3, 4.0)).unwrap();
    outer.set_texture(Some(assets.textures[0].clone())).unwrap();
    outer.set_color(vec3(0.2, 0.4, 0.6)).unwrap();

    for _ in 0..200 {
        let tree = random_tree(&mut rng, 5, &assets);
        let before = Snapshot::of(&outer);
        for mode in VisitMode::ALL {
            for lighting in [false, true] {
                tree.visit(&mut outer, mode, lighting).unwrap();
                assert_eq!(Snapshot::of(&outer), before, "{mode:?}, lighting {lighting}");
            }
        }
    }
    outer.exit().unwrap();
    for attribute in [
        Attribute::ModelMatrix,
        Attribute::Material,
        Attribute::Texture,
        Attribute::Color,
    ] {
        assert_eq!(pipeline.depth(attribute), 0);
    }
}

#[test]
fn a_failing_leaf_still_unwinds_every_push() {
    let mut rng = StdRng::seed_from_u64(7);
    let (mut pipeline, _log) = bound_pipeline();
    let assets = Assets::new(&mut pipeline);
    pipeline.set_model_matrix(math::rotation_x_deg(30.0)).unwrap();

    for depth in 1..=5 {
        let tree = failing_tree(&mut rng, depth, &assets);
        let before = Snapshot::of(&pipeline);
        for mode in VisitMode::ALL {
            let result = tree.visit(&mut pipeline, mode, true);
            assert!(result.is_err(), "depth {depth}, {mode:?}");
            assert_eq!(Snapshot::of(&pipeline), before);
        }
    }
}

#[test]
fn a_missing_uniform_mid_traversal_unwinds() {
    let names = names();
    let (mut pipeline, _log) = restricted_pipeline(
        &[names.model_matrix.as_str(), names.material.as_str()],
        MissingUniformPolicy::Fail,
    );
    let texture = checker(&mut pipeline, "checker");

    let mut inner = SceneNode::new("inner");
    inner.add(math::translation(vec3(1.0, 0.0, 0.0)));
    inner.add(texture);
    let mut root = SceneNode::new("root");
    root.add(math::scaling(vec3(2.0, 2.0, 2.0)));
    root.add(inner);

    let before = Snapshot::of(&pipeline);
    let err = root.visualize(&mut pipeline, true).unwrap_err();
    assert_eq!(
        err,
        scene_ngin::Error::MissingUniform {
            name: names.texture_enabled.clone()
        }
    );
    assert_eq!(Snapshot::of(&pipeline), before);

    // Texture entries are skipped outside the shaded traversal.
    root.visualize_edges(&mut pipeline).unwrap();
    assert_eq!(Snapshot::of(&pipeline), before);
}

#[test]
fn leaving_a_scope_through_an_error_restores_state() {
    let (mut pipeline, _log) = bound_pipeline();
    let before = Snapshot::of(&pipeline);
    let result = (|| -> scene_ngin::Result<()> {
        let mut scope = pipeline.scope(Tracked::ALL);
        scope.set_color(vec3(1.0, 0.0, 0.0))?;
        scope.compose_model_matrix(&math::translation(vec3(3.0, 0.0, 0.0)))?;
        scope.unbind_program();
        scope.set_material(Material::default())?;
        Ok(())
    })();
    assert_eq!(result, Err(scene_ngin::Error::NoActiveProgram));
    assert_eq!(Snapshot::of(&pipeline), before);
}
