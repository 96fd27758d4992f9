use futures::future::LocalBoxFuture;
use scene_ngin::{
    AppConfig, Pipeline, SceneNode, Texture, TextureRef,
    app::{self, SceneFactory},
    resources, scenes,
};

/// Loads `file` from the assets directory, or falls back to a checkerboard
/// when it is missing.
async fn texture_or_checker(pipeline: &mut Pipeline, file: &str) -> scene_ngin::Result<TextureRef> {
    match resources::load_texture(pipeline, file).await {
        Ok(texture) => Ok(texture),
        Err(e) => {
            log::warn!("{e}; using a checkerboard instead");
            Texture::checkerboard(pipeline, file, 64, 8, [230, 230, 230, 255], [40, 40, 40, 255])
        }
    }
}

struct TestScene;

impl SceneFactory for TestScene {
    fn build<'a>(&'a mut self, pipeline: &'a mut Pipeline) -> LocalBoxFuture<'a, scene_ngin::Result<SceneNode>> {
        Box::pin(async move {
            let texture = texture_or_checker(pipeline, "quad.png").await?;
            scenes::test_graph(texture)
        })
    }
}

struct MaterialsScene;

impl SceneFactory for MaterialsScene {
    fn build<'a>(&'a mut self, pipeline: &'a mut Pipeline) -> LocalBoxFuture<'a, scene_ngin::Result<SceneNode>> {
        Box::pin(async move {
            let sphere = texture_or_checker(pipeline, "sphere.png").await?;
            let cone = texture_or_checker(pipeline, "cone.png").await?;
            let cylinder = texture_or_checker(pipeline, "cylinder.png").await?;
            scenes::materials_graph(sphere, cone, cylinder)
        })
    }
}

#[derive(Default)]
struct OrbitScene {
    orbit: scenes::Orbit,
}

impl SceneFactory for OrbitScene {
    fn build<'a>(&'a mut self, pipeline: &'a mut Pipeline) -> LocalBoxFuture<'a, scene_ngin::Result<SceneNode>> {
        Box::pin(async move {
            let floor = texture_or_checker(pipeline, "floor.png").await?;
            self.orbit.build(floor)
        })
    }

    fn update(&mut self, root: &mut SceneNode, dt: f32) -> bool {
        self.orbit.advance(root, dt)
    }
}

fn main() -> anyhow::Result<()> {
    let scene = std::env::args().nth(1).unwrap_or_else(|| "test".into());
    let factory: Box<dyn SceneFactory> = match scene.as_str() {
        "test" => Box::new(TestScene),
        "materials" => Box::new(MaterialsScene),
        "orbit" => Box::new(OrbitScene::default()),
        other => anyhow::bail!("unknown scene '{other}', expected test, materials or orbit"),
    };
    let config = AppConfig {
        title: format!("scene-ngin: {scene}"),
        ..AppConfig::default()
    };
    app::run(config, factory)
}
