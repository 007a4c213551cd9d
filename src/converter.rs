//! Turns input files into JPEGs inside a scoped temporary directory.

use crate::{
    metaimage::{MetaImageError, MetaImageReader},
    stack::{StackError, StackPages},
};

use image::{ColorType, DynamicImage, ImageFormat};
use log::info;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;

const TEMP_PREFIX: &str = "glaucoma-";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Volume has no plane to export")]
    EmptyVolume,

    #[error("MetaImage error: {0}")]
    MetaImage(#[from] MetaImageError),

    #[error("Stack error: {0}")]
    Stack(#[from] StackError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// JPEGs written for one input file.
///
/// The files live in a temporary directory that is removed when this
/// value is dropped.
#[derive(Debug)]
pub struct ConvertedImages {
    dir: TempDir,
    images: Vec<PathBuf>,
}

impl ConvertedImages {
    fn new() -> Result<Self, ConvertError> {
        let dir = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir()?;
        Ok(Self {
            dir,
            images: Vec::new(),
        })
    }

    fn push(&mut self, file_name: &str, image: &DynamicImage) -> Result<&Path, ConvertError> {
        let path = self.dir.path().join(file_name);
        to_jpeg_compatible(image).save_with_format(&path, ImageFormat::Jpeg)?;
        self.images.push(path);
        Ok(&self.images[self.images.len() - 1])
    }

    #[cfg(test)]
    fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn images(&self) -> &[PathBuf] {
        &self.images
    }
}

/// Convert a MetaImage file into a single `image.jpg`.
///
/// Volumes with more than one plane export their first plane.
pub fn convert_volume(path: impl AsRef<Path>) -> Result<ConvertedImages, ConvertError> {
    let volume = MetaImageReader::read(path)?;
    let image = volume.get_image(0).ok_or(ConvertError::EmptyVolume)?;

    let mut converted = ConvertedImages::new()?;
    converted.push("image.jpg", &image)?;
    Ok(converted)
}

/// Convert every page of a TIFF stack into `image_<page>.jpg`, numbered
/// from 1 in page order.
pub fn convert_stack(path: impl AsRef<Path>) -> Result<ConvertedImages, ConvertError> {
    let mut converted = ConvertedImages::new()?;
    for (index, page) in StackPages::open(path)?.enumerate() {
        let output = converted.push(&format!("image_{}.jpg", index + 1), &page?)?;
        info!("De-Stacked {}", output.display());
    }
    Ok(converted)
}

/// JPEG holds neither alpha nor 16-bit samples.
fn to_jpeg_compatible(image: &DynamicImage) -> DynamicImage {
    match image.color() {
        ColorType::L8 | ColorType::Rgb8 => image.clone(),
        ColorType::La8 | ColorType::L16 | ColorType::La16 => {
            DynamicImage::ImageLuma8(image.to_luma8())
        }
        _ => DynamicImage::ImageRgb8(image.to_rgb8()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, RgbaImage};

    #[test]
    fn alpha_is_dropped() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        assert_eq!(to_jpeg_compatible(&image).color(), ColorType::Rgb8);
    }

    #[test]
    fn gray_is_kept() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([9])));
        assert_eq!(to_jpeg_compatible(&image).color(), ColorType::L8);
    }

    #[test]
    fn directory_is_removed_on_drop() {
        let mut converted = ConvertedImages::new().unwrap();
        let image = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        let path = converted.push("image.jpg", &image).unwrap().to_path_buf();
        let dir = converted.dir().to_path_buf();
        assert!(path.is_file());

        drop(converted);
        assert!(!dir.exists());
    }

    #[test]
    fn missing_volume_file() {
        assert!(matches!(
            convert_volume("does/not/exist.mha"),
            Err(ConvertError::MetaImage(MetaImageError::Io(_)))
        ));
    }
}
