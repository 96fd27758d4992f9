use std::rc::Rc;

use rand::{Rng, rngs::StdRng};
use scene_ngin::{
    Attribute, Drawable, Error, Material, MissingUniformPolicy, Pipeline, PipelineConfig,
    ProgramSource, Result, SceneNode, Texture, TextureRef,
    backend::{TextureId, recording::RecordingBackend, recording::RecordingLog},
    config::UniformNames,
    data_structures::shapes,
    math::{self, Mat4, Vec3, vec3},
};

pub fn program_source() -> ProgramSource {
    ProgramSource {
        label: "test program".into(),
        vertex: "void main() {}".into(),
        fragment: "void main() {}".into(),
    }
}

/// A pipeline over a recording backend with a program already bound.
pub fn bound_pipeline() -> (Pipeline, RecordingLog) {
    bound_pipeline_with(RecordingBackend::new(), PipelineConfig::default())
}

pub fn bound_pipeline_with(
    (backend, log): (RecordingBackend, RecordingLog),
    config: PipelineConfig,
) -> (Pipeline, RecordingLog) {
    let mut pipeline = Pipeline::new(Box::new(backend), config);
    let program = pipeline.create_program(&program_source()).unwrap();
    pipeline.use_program(program).unwrap();
    (pipeline, log)
}

/// A pipeline whose program only exposes `names`.
pub fn restricted_pipeline(names: &[&str], policy: MissingUniformPolicy) -> (Pipeline, RecordingLog) {
    let config = PipelineConfig {
        missing_uniform: policy,
        ..Default::default()
    };
    bound_pipeline_with(RecordingBackend::with_uniforms(names), config)
}

pub fn names() -> UniformNames {
    UniformNames::default()
}

pub fn checker(pipeline: &mut Pipeline, name: &str) -> TextureRef {
    Texture::checkerboard(pipeline, name, 4, 2, [255, 255, 255, 255], [0, 0, 0, 255]).unwrap()
}

/// Everything a traversal must leave as it found it.
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    pub model_matrix: Mat4,
    pub material: Material,
    pub texture: Option<TextureId>,
    pub color: Vec3,
    pub depths: [usize; 4],
}

impl Snapshot {
    pub fn of(pipeline: &Pipeline) -> Self {
        Self {
            model_matrix: pipeline.model_matrix(),
            material: pipeline.material(),
            texture: pipeline.texture().map(|t| t.id()),
            color: pipeline.color(),
            depths: [
                pipeline.depth(Attribute::ModelMatrix),
                pipeline.depth(Attribute::Material),
                pipeline.depth(Attribute::Texture),
                pipeline.depth(Attribute::Color),
            ],
        }
    }
}

/// Translation part of a column-major matrix.
pub fn translation_of(columns: [[f32; 4]; 4]) -> [f32; 3] {
    [columns[3][0], columns[3][1], columns[3][2]]
}

pub fn assert_close(actual: [f32; 3], expected: [f32; 3]) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!((a - e).abs() < 1e-5, "{actual:?} != {expected:?}");
    }
}

/// A leaf whose every draw fails.
pub struct FailingDrawable;

impl Drawable for FailingDrawable {
    fn name(&self) -> &str {
        "failing"
    }

    fn draw(&self, _: &mut Pipeline) -> Result<()> {
        Err(Error::ResourceLoadFailure {
            resource: "failing".into(),
            reason: "draw refused".into(),
        })
    }

    fn draw_edges(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.draw(pipeline)
    }

    fn draw_normals(&self, pipeline: &mut Pipeline) -> Result<()> {
        self.draw(pipeline)
    }
}

/// Shared leaves and textures random trees pick from.
pub struct Assets {
    pub textures: Vec<TextureRef>,
    pub drawables: Vec<Rc<dyn Drawable>>,
}

impl Assets {
    pub fn new(pipeline: &mut Pipeline) -> Self {
        let drawables: Vec<Rc<dyn Drawable>> = vec![
            Rc::new(shapes::triangle().unwrap()),
            Rc::new(shapes::indexed_triangle().unwrap()),
            Rc::new(shapes::color_quad().unwrap()),
            Rc::new(shapes::grid_xy(2).unwrap()),
            Rc::new(shapes::axes(1.0).unwrap()),
        ];
        Self {
            textures: vec![checker(pipeline, "checker a"), checker(pipeline, "checker b")],
            drawables,
        }
    }
}

fn random_matrix(rng: &mut StdRng) -> Mat4 {
    match rng.random_range(0..4) {
        0 => math::translation(vec3(rng.random(), rng.random(), rng.random())),
        1 => math::scaling(vec3(0.5, 2.0, 1.0)),
        2 => math::rotation_y_deg(rng.random_range(0.0..360.0)),
        _ => math::rotation_deg(vec3(1.0, 1.0, 0.0), rng.random_range(0.0..360.0)),
    }
}

fn random_material(rng: &mut StdRng) -> Material {
    Material::new(rng.random(), rng.random(), rng.random(), rng.random_range(1.0..64.0))
}

/// A tree of at most `depth` levels with at most four entries per node.
pub fn random_tree(rng: &mut StdRng, depth: u32, assets: &Assets) -> SceneNode {
    let mut node = SceneNode::new(format!("random {depth}"));
    if rng.random_bool(0.3) {
        node = node.with_color(vec3(rng.random(), rng.random(), rng.random()));
    }
    if rng.random_bool(0.3) {
        node = node.with_material(random_material(rng));
    }
    if rng.random_bool(0.3) {
        let texture = assets.textures[rng.random_range(0..assets.textures.len())].clone();
        node = node.with_texture(texture);
    }
    if rng.random_bool(0.3) {
        node = node.with_model_matrix(random_matrix(rng));
    }
    for _ in 0..rng.random_range(0..=4) {
        match rng.random_range(0..5) {
            0 if depth > 1 => {
                node.add(random_tree(rng, depth - 1, assets));
            }
            0 | 1 => {
                let drawable = assets.drawables[rng.random_range(0..assets.drawables.len())].clone();
                node.add(drawable);
            }
            2 => {
                node.add(random_matrix(rng));
            }
            3 => {
                let texture = assets.textures[rng.random_range(0..assets.textures.len())].clone();
                node.add(texture);
            }
            _ => {
                node.add(random_material(rng));
            }
        }
    }
    node
}

/// A random tree with a [`FailingDrawable`] at the end of a chain of
/// `depth` nested nodes, after some random siblings at each level.
pub fn failing_tree(rng: &mut StdRng, depth: u32, assets: &Assets) -> SceneNode {
    let mut node = random_tree(rng, 2, assets);
    if depth <= 1 {
        node.add_drawable(FailingDrawable);
    } else {
        node.add(failing_tree(rng, depth - 1, assets));
    }
    node.add(random_tree(rng, 2, assets));
    node
}
