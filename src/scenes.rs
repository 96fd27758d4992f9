//! Demo scene graphs.

use crate::{
    data_structures::{
        material::Material,
        scene_graph::{SceneEntry, SceneNode},
        shapes,
        texture::TextureRef,
    },
    error::Result,
    math::{self, vec3},
};

/// A textured quad rotated out of the XY plane followed by a stack of flat
/// test shapes, each 0.2 further along Z than the previous one.
pub fn test_graph(texture: TextureRef) -> Result<SceneNode> {
    let mut quad = SceneNode::new("rotated quad");
    quad.add(math::rotation_y_deg(70.0));
    quad.add(math::translation(vec3(0.0, 0.0, 0.3)));
    quad.add(shapes::textured_quad_xy(texture)?);

    let step = math::translation(vec3(0.0, 0.0, 0.2));
    let mut root = SceneNode::new("test graph");
    root.add(quad);
    root.add_drawable(shapes::color_quad()?);
    root.add(step);
    root.add_drawable(shapes::triangle()?);
    root.add(step);
    root.add_drawable(shapes::indexed_triangle()?);
    root.add(step);
    root.add_drawable(shapes::grid_xy(8)?);
    root.add(math::translation(vec3(0.0, 0.0, 0.5)));
    root.add_drawable(shapes::grid_xy(8)?);
    Ok(root)
}

/// Sphere, cone and cylinder side by side, each with its own texture and
/// material.
pub fn materials_graph(
    sphere_texture: TextureRef,
    cone_texture: TextureRef,
    cylinder_texture: TextureRef,
) -> Result<SceneNode> {
    let step = math::translation(vec3(2.0, 0.0, 0.0));
    let mut root = SceneNode::new("materials graph");
    root.add(math::scaling(vec3(0.4, 0.4, 0.4)));

    root.add(sphere_texture);
    root.add(Material::new(0.2, 0.6, 0.4, 20.0));
    root.add_drawable(shapes::sphere(32, 32)?);
    root.add(step);

    root.add(cone_texture);
    root.add(Material::new(0.3, 0.7, 0.1, 5.0));
    root.add_drawable(shapes::cone(32, 32)?);
    root.add(step);

    root.add(cylinder_texture);
    root.add(Material::new(0.1, 0.5, 0.8, 60.0));
    root.add_drawable(shapes::cylinder(32, 32)?);
    Ok(root)
}

/// A small sphere circling the Y axis over a textured floor.
#[derive(Clone, Debug, PartialEq)]
pub struct Orbit {
    /// Radius of the circle the sphere follows.
    pub radius: f32,
    /// Radius of the sphere itself.
    pub sphere_radius: f32,
    pub angle_deg: f32,
    pub speed_deg_per_sec: f32,
}

impl Default for Orbit {
    fn default() -> Self {
        Self {
            radius: 0.8,
            sphere_radius: 0.1,
            angle_deg: 0.0,
            speed_deg_per_sec: 45.0,
        }
    }
}

/// Index of the orbiting node in the root, and of the rotation within it.
const ORBIT_NODE: usize = 0;
const ORBIT_ROTATION: usize = 0;

impl Orbit {
    pub fn build(&self, floor_texture: TextureRef) -> Result<SceneNode> {
        let r = self.sphere_radius;
        // Lift onto the floor, shrink to radius r, then move out to the circle.
        let placement = math::compose(
            &math::compose(
                &math::translation(vec3(self.radius, 0.0, 0.0)),
                &math::scaling(vec3(r, r, r)),
            ),
            &math::translation(vec3(0.0, 1.0, 0.0)),
        );
        let mut ball = SceneNode::new("ball").with_model_matrix(placement);
        ball.add_drawable(shapes::sphere(32, 32)?);

        let mut orbiting = SceneNode::new("orbiting ball");
        orbiting.add(math::rotation_y_deg(self.angle_deg));
        orbiting.add(ball);

        let mut floor = SceneNode::new("floor").with_texture(floor_texture);
        floor.add_drawable(shapes::square_xz()?);

        let mut root = SceneNode::new("orbit");
        root.add(orbiting);
        root.add(floor);
        Ok(root)
    }

    /// Advances the animation by `dt` seconds and updates `root`, which must
    /// come from [`Orbit::build`]. Returns whether the graph changed.
    pub fn advance(&mut self, root: &mut SceneNode, dt: f32) -> bool {
        if self.speed_deg_per_sec == 0.0 || dt <= 0.0 {
            return false;
        }
        let angle = (self.angle_deg + self.speed_deg_per_sec * dt).rem_euclid(360.0);
        let moved = match root.entry_mut(ORBIT_NODE) {
            Some(SceneEntry::Node(orbiting)) => {
                orbiting.set_transform(ORBIT_ROTATION, math::rotation_y_deg(angle))
            }
            _ => false,
        };
        if moved {
            self.angle_deg = angle;
        } else {
            log::warn!("'{}' has no orbiting node to animate", root.name());
        }
        moved
    }
}
