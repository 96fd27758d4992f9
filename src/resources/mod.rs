//! Loading of assets: shader sources, images and other files.
//!
//! On native targets files are read from the assets directory
//! (`$SCENE_NGIN_ASSETS`, or `./assets`). On the web they are fetched
//! relative to `<origin>/assets/`. Every failure, including a non-success
//! HTTP status, is reported as [`Error::ResourceLoadFailure`].
//!
//! The core traversal never awaits; everything here is meant to complete
//! before the first frame that needs it.

use crate::{
    backend::{ProgramId, ProgramSource},
    data_structures::texture::{Texture, TextureRef},
    error::{Error, Result},
    pipeline::Pipeline,
};

/// Environment variable overriding the native assets directory.
pub const ASSETS_ENV: &str = "SCENE_NGIN_ASSETS";

#[cfg(not(target_arch = "wasm32"))]
pub fn assets_dir() -> std::path::PathBuf {
    std::env::var_os(ASSETS_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::Path::new("./").join("assets"))
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let origin = web_sys::window()
        .ok_or_else(|| Error::resource(file_name, "no window"))?
        .location()
        .origin()
        .map_err(|e| Error::resource(file_name, format!("{e:?}")))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))
        .map_err(|e| Error::resource(file_name, e))?;
    base.join(file_name).map_err(|e| Error::resource(file_name, e))
}

#[cfg(target_arch = "wasm32")]
async fn fetch(file_name: &str) -> Result<reqwest::Response> {
    let url = format_url(file_name)?;
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::resource(file_name, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::resource(file_name, format!("HTTP status {status}")));
    }
    Ok(response)
}

pub async fn load_string(file_name: &str) -> Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = fetch(file_name)
        .await?
        .text()
        .await
        .map_err(|e| Error::resource(file_name, e))?;
    #[cfg(not(target_arch = "wasm32"))]
    let txt = std::fs::read_to_string(assets_dir().join(file_name))
        .map_err(|e| Error::resource(file_name, e))?;

    log::debug!("loaded '{file_name}' ({} bytes)", txt.len());
    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = fetch(file_name)
        .await?
        .bytes()
        .await
        .map_err(|e| Error::resource(file_name, e))?
        .to_vec();
    #[cfg(not(target_arch = "wasm32"))]
    let data =
        std::fs::read(assets_dir().join(file_name)).map_err(|e| Error::resource(file_name, e))?;

    log::debug!("loaded '{file_name}' ({} bytes)", data.len());
    Ok(data)
}

/// Loads an image file and uploads it as a texture. The format is guessed
/// from the file extension, falling back to the file contents.
pub async fn load_texture(pipeline: &mut Pipeline, file_name: &str) -> Result<TextureRef> {
    let data = load_binary(file_name).await?;
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| image::ImageFormat::from_extension(e).is_some());
    Texture::from_bytes(pipeline, &data, file_name, extension)
}

/// Loads both shader stages concurrently and builds a program from them.
pub async fn load_program(
    pipeline: &mut Pipeline,
    vertex_file: &str,
    fragment_file: &str,
) -> Result<ProgramId> {
    let (vertex, fragment) =
        futures::future::try_join(load_string(vertex_file), load_string(fragment_file)).await?;
    pipeline.create_program(&ProgramSource {
        label: format!("{vertex_file} + {fragment_file}"),
        vertex,
        fragment,
    })
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_a_load_failure() {
        let result = futures::executor::block_on(load_binary("definitely/not/here.bin"));
        match result {
            Err(Error::ResourceLoadFailure { resource, .. }) => {
                assert_eq!(resource, "definitely/not/here.bin")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
