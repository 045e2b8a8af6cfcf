use crate::{Error, Result};
use bytes::Bytes;
use lib_asset_store::Format;
use log::debug;
use std::io::Cursor;

/// No cap: renderings are committed at whatever size Figma produced.
pub const UNBOUNDED: (u32, u32) = (u32::MAX, u32::MAX);

/// Validates a downloaded raster and shrinks it under the dimension cap.
///
/// Only PNG and JPEG pass. An image above `max_size` is downscaled
/// preserving aspect ratio and re-encoded in its original format; anything
/// already within bounds is committed untouched.
pub fn postprocess(id: &str, bytes: Bytes, max_size: (u32, u32)) -> Result<(Bytes, Format)> {
    let guessed = image::guess_format(&bytes)
        .map_err(|_| Error::UnsupportedImageFormat(id.to_owned()))?;
    let format = match guessed {
        image::ImageFormat::Png => Format::Png,
        image::ImageFormat::Jpeg => Format::Jpeg,
        _ => return Err(Error::UnsupportedImageFormat(id.to_owned())),
    };

    if max_size == UNBOUNDED {
        return Ok((bytes, format));
    }

    let img = image::load_from_memory_with_format(&bytes, guessed)?;
    if img.width() <= max_size.0 && img.height() <= max_size.1 {
        return Ok((bytes, format));
    }

    debug!(
        target: "Fetcher",
        "scaling '{id}' from {}x{} into {}x{}",
        img.width(),
        img.height(),
        max_size.0,
        max_size.1
    );
    let scaled = img.resize(max_size.0, max_size.1, image::imageops::FilterType::Lanczos3);
    let mut buf = Vec::new();
    scaled
        .write_to(&mut Cursor::new(&mut buf), guessed)
        .map_err(|e| Error::ImageResize(format!("\"{id}\" {e}")))?;
    Ok((Bytes::from(buf), format))
}
