//! PNG/JPEG loading. The session only ever sees the native dimensions; the
//! pixels go to the front end for texturing.

use std::path::Path;

use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};
use crate::transform::ImageSize;

pub struct LoadedImage {
    pub size: ImageSize,
    pub rgba: RgbaImage,
}

fn accepted(format: ImageFormat) -> bool {
    matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
}

/// Reject anything that is not PNG or JPEG by extension, without touching the file.
///
/// Paths without a recognizable extension pass; their content is sniffed
/// when decoding.
pub fn check_path(path: &Path) -> Result<Option<ImageFormat>> {
    match ImageFormat::from_path(path) {
        Ok(format) if accepted(format) => Ok(Some(format)),
        Ok(_) => Err(Error::UnsupportedFileType(path.display().to_string())),
        Err(_) if path.extension().is_none() => Ok(None),
        Err(_) => Err(Error::UnsupportedFileType(path.display().to_string())),
    }
}

pub fn load(path: &Path) -> Result<LoadedImage> {
    let hint = check_path(path)?;
    let bytes = std::fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = decode(&bytes, hint)?;
    log::info!(
        "Loaded {} ({}x{})",
        path.display(),
        loaded.size.width,
        loaded.size.height
    );
    Ok(loaded)
}

/// Decode in-memory image data, sniffing the format when no hint is given.
pub fn decode(bytes: &[u8], hint: Option<ImageFormat>) -> Result<LoadedImage> {
    let format = match hint {
        Some(format) => format,
        None => image::guess_format(bytes)
            .map_err(|_| Error::UnsupportedFileType("unrecognized image data".to_string()))?,
    };
    if !accepted(format) {
        return Err(Error::UnsupportedFileType(format!("{format:?}")));
    }
    let rgba = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
    Ok(LoadedImage {
        size: ImageSize::new(rgba.width(), rgba.height()),
        rgba,
    })
}
