//! Textures uploaded through the pipeline's backend.
//!
//! A [`Texture`] only remembers the backend handle and the image metadata;
//! the pixels live on the backend. Scene entries share textures through
//! [`TextureRef`].

use std::rc::Rc;

use image::{GenericImageView, ImageFormat, load_from_memory_with_format};

use crate::{
    backend::{TextureDesc, TextureId},
    error::{Error, Result},
    pipeline::Pipeline,
};

pub type TextureRef = Rc<Texture>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    name: String,
    id: TextureId,
    width: u32,
    height: u32,
    mipmaps: bool,
}

impl Texture {
    /// Decodes image file contents (PNG, JPEG, ...) and uploads them.
    ///
    /// `format` is an optional extension hint such as `"png"`; without it the
    /// format is guessed from the bytes.
    pub fn from_bytes(
        pipeline: &mut Pipeline,
        bytes: &[u8],
        name: &str,
        format: Option<&str>,
    ) -> Result<TextureRef> {
        let img = match format {
            None => image::load_from_memory(bytes),
            Some(fmt) => {
                let fmt = ImageFormat::from_extension(fmt)
                    .ok_or_else(|| Error::resource(name, format!("unknown image format '{fmt}'")))?;
                load_from_memory_with_format(bytes, fmt)
            }
        }
        .map_err(|e| Error::resource(name, e))?;
        Self::from_image(pipeline, &img, name)
    }

    pub fn from_image(
        pipeline: &mut Pipeline,
        img: &image::DynamicImage,
        name: &str,
    ) -> Result<TextureRef> {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();
        Self::from_rgba(pipeline, name, width, height, rgba.as_raw())
    }

    /// A two-colour checkerboard, handy when no image file is available.
    pub fn checkerboard(
        pipeline: &mut Pipeline,
        name: &str,
        size: u32,
        cells: u32,
        light: [u8; 4],
        dark: [u8; 4],
    ) -> Result<TextureRef> {
        let cell = (size / cells.max(1)).max(1);
        let img = image::RgbaImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                image::Rgba(light)
            } else {
                image::Rgba(dark)
            }
        });
        Self::from_rgba(pipeline, name, size, size, img.as_raw())
    }

    fn from_rgba(
        pipeline: &mut Pipeline,
        name: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<TextureRef> {
        if width == 0 || height == 0 {
            return Err(Error::resource(name, "image has no pixels"));
        }
        let mipmaps = is_power_of_two(width) && is_power_of_two(height);
        let id = pipeline.create_texture(&TextureDesc {
            label: name,
            width,
            height,
            rgba,
            generate_mipmaps: mipmaps,
        })?;
        log::debug!("texture '{name}' {width}x{height} uploaded (mipmaps: {mipmaps})");
        Ok(Rc::new(Self {
            name: name.to_string(),
            id,
            width,
            height,
            mipmaps,
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn has_mipmaps(&self) -> bool {
        self.mipmaps
    }
}

pub fn is_power_of_two(value: u32) -> bool {
    value != 0 && value & (value - 1) == 0
}
