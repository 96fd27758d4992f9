//! Orbit camera and mouse-drag state for the application shell.

use cgmath::{Deg, Point3};

use crate::math::{Mat4, Vec3};

/// A camera orbiting the origin, parametrized by longitude and latitude in
/// degrees and its distance to the look-at point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    pub longitude_deg: f32,
    pub latitude_deg: f32,
    pub distance: f32,
    pub fovy_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            longitude_deg: 0.0,
            latitude_deg: 0.0,
            distance: 2.0,
            fovy_deg: 60.0,
            near: 0.05,
            far: 100.0,
        }
    }
}

impl OrbitCamera {
    pub const MIN_DISTANCE: f32 = 0.1;
    const MAX_LATITUDE: f32 = 89.0;

    pub fn eye(&self) -> Vec3 {
        let (sin_lon, cos_lon) = self.longitude_deg.to_radians().sin_cos();
        let (sin_lat, cos_lat) = self.latitude_deg.to_radians().sin_cos();
        Vec3::new(sin_lon * cos_lat, sin_lat, cos_lon * cos_lat) * self.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.eye();
        Mat4::look_at_rh(
            Point3::new(eye.x, eye.y, eye.z),
            Point3::new(0.0, 0.0, 0.0),
            Vec3::unit_y(),
        )
    }

    /// OpenGL-convention perspective projection (depth in `[-1, 1]`).
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        cgmath::perspective(Deg(self.fovy_deg), aspect, self.near, self.far)
    }

    /// Rotates by the given degree deltas; latitude stays clear of the poles.
    pub fn rotate(&mut self, d_longitude: f32, d_latitude: f32) {
        self.longitude_deg = (self.longitude_deg + d_longitude).rem_euclid(360.0);
        self.latitude_deg =
            (self.latitude_deg + d_latitude).clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE);
    }

    /// Multiplies the distance by `factor`.
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 {
            self.distance = (self.distance * factor).max(Self::MIN_DISTANCE);
        }
    }
}

/// Tracks a drag with the right mouse button.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MouseDrag {
    right_down: bool,
    start_x: f64,
    start_y: f64,
}

impl MouseDrag {
    pub fn press(&mut self, x: f64, y: f64) {
        self.right_down = true;
        self.start_x = x;
        self.start_y = y;
    }

    pub fn release(&mut self) {
        self.right_down = false;
    }

    /// Pointer delta since the last call while dragging, `None` otherwise.
    pub fn drag_to(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !self.right_down {
            return None;
        }
        let delta = (x - self.start_x, y - self.start_y);
        self.start_x = x;
        self.start_y = y;
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_eye_sits_on_positive_z() {
        let eye = OrbitCamera::default().eye();
        assert!((eye.z - 2.0).abs() < 1e-6);
        assert!(eye.x.abs() < 1e-6 && eye.y.abs() < 1e-6);
    }

    #[test]
    fn latitude_is_clamped_and_distance_bounded() {
        let mut camera = OrbitCamera::default();
        camera.rotate(370.0, 200.0);
        assert!((camera.longitude_deg - 10.0).abs() < 1e-4);
        assert_eq!(camera.latitude_deg, 89.0);
        camera.zoom(0.0001);
        assert_eq!(camera.distance, OrbitCamera::MIN_DISTANCE);
    }

    #[test]
    fn drag_reports_incremental_deltas() {
        let mut drag = MouseDrag::default();
        assert_eq!(drag.drag_to(5.0, 5.0), None);
        drag.press(10.0, 10.0);
        assert_eq!(drag.drag_to(13.0, 8.0), Some((3.0, -2.0)));
        assert_eq!(drag.drag_to(14.0, 8.0), Some((1.0, 0.0)));
        drag.release();
        assert_eq!(drag.drag_to(20.0, 20.0), None);
    }
}
