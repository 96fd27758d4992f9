use futures::executor::block_on;
use scene_ngin::{
    backend::recording::Call,
    resources::{self, ASSETS_ENV},
};

use crate::common::test_utils::{bound_pipeline, program_source};

mod common;

// The assets directory is process-wide, so everything that depends on it
// lives in this one test.
#[test]
fn assets_load_from_the_configured_directory() {
    let dir = std::env::temp_dir().join(format!("scene-ngin-assets-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let source = program_source();
    std::fs::write(dir.join("plain.vert"), &source.vertex).unwrap();
    std::fs::write(dir.join("plain.frag"), &source.fragment).unwrap();
    image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
        .save(dir.join("tile.png"))
        .unwrap();
    unsafe { std::env::set_var(ASSETS_ENV, &dir) };
    assert_eq!(resources::assets_dir(), dir);

    assert_eq!(block_on(resources::load_string("plain.vert")).unwrap(), source.vertex);

    let (mut pipeline, log) = bound_pipeline();
    log.clear();
    let texture = block_on(resources::load_texture(&mut pipeline, "tile.png")).unwrap();
    assert_eq!(texture.name(), "tile.png");
    assert_eq!(texture.size(), (4, 2));
    assert!(texture.has_mipmaps());
    assert!(log.calls().iter().any(|c| matches!(
        c,
        Call::CreateTexture { label, size: (4, 2), .. } if label == "tile.png"
    )));

    let program = block_on(resources::load_program(&mut pipeline, "plain.vert", "plain.frag")).unwrap();
    pipeline.use_program(program).unwrap();
    assert_eq!(pipeline.active_program(), Some(program));
    assert!(log.calls().iter().any(|c| matches!(
        c,
        Call::CreateProgram { program: p, label } if *p == program && label == "plain.vert + plain.frag"
    )));

    let missing = block_on(resources::load_program(&mut pipeline, "plain.vert", "absent.frag"));
    assert!(matches!(
        missing,
        Err(scene_ngin::Error::ResourceLoadFailure { resource, .. }) if resource == "absent.frag"
    ));

    std::fs::remove_dir_all(&dir).ok();
}
