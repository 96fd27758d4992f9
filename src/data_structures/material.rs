/// Phong reflectance coefficients applied while lighting is enabled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl Material {
    pub fn new(ambient: f32, diffuse: f32, specular: f32, shininess: f32) -> Self {
        Self {
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// Packed as `(ambient, diffuse, specular, shininess)` for the shader.
    pub fn to_array(&self) -> [f32; 4] {
        [self.ambient, self.diffuse, self.specular, self.shininess]
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(0.2, 0.8, 0.0, 1.0)
    }
}
