//! Vectors, matrices and the few geometric helpers the scene code needs.
//!
//! The types are plain `cgmath` aliases so they keep value semantics: every
//! operation returns a new value. Matrices compose by right-multiplication,
//! i.e. `compose(a, b)` applies `b` first.

use cgmath::{Deg, InnerSpace, SquareMatrix};

pub type Vec3 = cgmath::Vector3<f32>;
pub type Vec4 = cgmath::Vector4<f32>;
pub type Mat4 = cgmath::Matrix4<f32>;

pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

pub fn identity() -> Mat4 {
    Mat4::identity()
}

pub fn translation(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

pub fn scaling(factors: Vec3) -> Mat4 {
    Mat4::from_nonuniform_scale(factors.x, factors.y, factors.z)
}

pub fn rotation_x_deg(angle: f32) -> Mat4 {
    Mat4::from_angle_x(Deg(angle))
}

pub fn rotation_y_deg(angle: f32) -> Mat4 {
    Mat4::from_angle_y(Deg(angle))
}

pub fn rotation_z_deg(angle: f32) -> Mat4 {
    Mat4::from_angle_z(Deg(angle))
}

/// Rotation of `angle` degrees around an arbitrary axis. The axis is
/// normalized here; a zero axis yields the identity.
pub fn rotation_deg(axis: Vec3, angle: f32) -> Mat4 {
    if axis.magnitude2() == 0.0 {
        return identity();
    }
    Mat4::from_axis_angle(axis.normalize(), Deg(angle))
}

/// `a * b`: the transform that applies `b`, then `a`.
pub fn compose(a: &Mat4, b: &Mat4) -> Mat4 {
    a * b
}

/// Column-major arrays, as uploaded to shaders.
pub fn to_columns(m: &Mat4) -> [[f32; 4]; 4] {
    (*m).into()
}

/// Axis-aligned box enclosing a set of points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    min: Vec3,
    max: Vec3,
}

impl BoundingBox {
    /// Returns `None` when `min` exceeds `max` on any axis.
    pub fn new(min: Vec3, max: Vec3) -> Option<Self> {
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return None;
        }
        Some(Self { min, max })
    }

    /// Smallest box containing every point; `None` for an empty slice.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        rest.iter().for_each(|p| bounds.merge(*p));
        Some(bounds)
    }

    /// Grows the box just enough to contain `point`.
    pub fn merge(&mut self, point: Vec3) {
        self.min = Vec3::new(
            self.min.x.min(point.x),
            self.min.y.min(point.y),
            self.min.z.min(point.z),
        );
        self.max = Vec3::new(
            self.max.x.max(point.x),
            self.max.y.max(point.y),
            self.max.z.max(point.z),
        );
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn radius(&self) -> f32 {
        self.diagonal().magnitude() * 0.5
    }
}

/// Two lowercase hex digits for a channel value in `[0, 1]`.
pub fn hex2(value: f32) -> Option<String> {
    if !(0.0..=1.0).contains(&value) {
        return None;
    }
    Some(format!("{:02x}", (value * 255.0).round() as u8))
}

/// Inverse of [`hex2`]: a channel value in `[0, 1]` from two hex digits.
pub fn from_hex2(digits: &str) -> Option<f32> {
    if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(digits, 16)
        .ok()
        .map(|n| n as f32 / 255.0)
}

/// `#rrggbb` for an RGB colour with channels in `[0, 1]`.
pub fn color_to_hex(color: Vec3) -> Option<String> {
    Some(format!(
        "#{}{}{}",
        hex2(color.x)?,
        hex2(color.y)?,
        hex2(color.z)?
    ))
}

pub fn color_from_hex(text: &str) -> Option<Vec3> {
    let digits = text.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    Some(Vec3::new(
        from_hex2(&digits[0..2])?,
        from_hex2(&digits[2..4])?,
        from_hex2(&digits[4..6])?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Transform;

    #[test]
    fn compose_applies_right_operand_first() {
        let m = compose(&translation(vec3(1.0, 0.0, 0.0)), &scaling(vec3(2.0, 2.0, 2.0)));
        let p = m.transform_point(cgmath::Point3::new(1.0, 0.0, 0.0));
        assert_eq!(p, cgmath::Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn bounding_box_tracks_extremes() {
        let bounds = BoundingBox::from_points(&[
            vec3(0.0, 0.0, 0.0),
            vec3(2.0, -1.0, 0.5),
            vec3(-1.0, 3.0, 0.0),
        ])
        .unwrap();
        assert_eq!(bounds.min(), vec3(-1.0, -1.0, 0.0));
        assert_eq!(bounds.max(), vec3(2.0, 3.0, 0.5));
        assert_eq!(bounds.center(), vec3(0.5, 1.0, 0.25));
        assert!(BoundingBox::from_points(&[]).is_none());
        assert!(BoundingBox::new(vec3(1.0, 0.0, 0.0), vec3(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn hex_colours() {
        assert_eq!(hex2(1.0).as_deref(), Some("ff"));
        assert_eq!(hex2(0.0).as_deref(), Some("00"));
        assert_eq!(hex2(1.5), None);
        assert_eq!(from_hex2("ff"), Some(1.0));
        assert_eq!(from_hex2("zz"), None);
        assert_eq!(color_from_hex("#ff0000"), Some(vec3(1.0, 0.0, 0.0)));
        assert_eq!(color_to_hex(vec3(0.0, 1.0, 0.0)).as_deref(), Some("#00ff00"));
    }
}
