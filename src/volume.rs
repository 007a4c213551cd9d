use crate::enums::ElementType;

use image::{DynamicImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};
use ndarray::{Array4, ArrayView3, Axis};
use rayon::prelude::*;

/// A decoded MetaImage, shaped (depth, height, width, channels).
///
/// Two dimensional images have a depth of one.
#[derive(Debug, Clone)]
pub struct Volume {
    pub data: Array4<f32>,
    pub element_type: ElementType,
}

impl Volume {
    pub fn new(data: Array4<f32>, element_type: ElementType) -> Self {
        Self { data, element_type }
    }

    /// Get the dimensions of the volume (depth, height, width, channels)
    pub fn dim(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }

    pub fn channels(&self) -> usize {
        self.data.dim().3
    }

    pub fn get_plane(&self, index: usize) -> Option<ArrayView3<'_, f32>> {
        (index < self.data.dim().0).then(|| self.data.index_axis(Axis(0), index))
    }

    /// Render the plane at `index` as an 8-bit image.
    ///
    /// `MET_UCHAR` samples are used as they are; anything wider is windowed
    /// to the plane's own value range.
    pub fn get_image(&self, index: usize) -> Option<DynamicImage> {
        let plane = self.get_plane(index)?;
        let (height, width, channels) = plane.dim();
        let pixel_data: Vec<u8> = match self.element_type {
            ElementType::UChar => plane
                .into_par_iter()
                .map(|&v| v.clamp(0.0, 255.0) as u8)
                .collect(),
            _ => normalize_to_u8(plane.into_par_iter().copied()),
        };
        let (width, height) = (width as u32, height as u32);

        match channels {
            1 => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixel_data)
                .map(DynamicImage::ImageLuma8),
            2 => ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, pixel_data)
                .map(DynamicImage::ImageLumaA8),
            3 => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixel_data)
                .map(DynamicImage::ImageRgb8),
            4 => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixel_data)
                .map(DynamicImage::ImageRgba8),
            _ => None,
        }
    }
}

/// Linearly map samples onto 0..=255 using their min and max.
///
/// A constant input maps to all zeros.
pub(crate) fn normalize_to_u8<I>(values: I) -> Vec<u8>
where
    I: ParallelIterator<Item = f32>,
{
    let values: Vec<f32> = values.collect();
    let (min, max) = values
        .par_iter()
        .fold(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(lo, hi), &v| (lo.min(v), hi.max(v)),
        )
        .reduce(
            || (f32::INFINITY, f32::NEG_INFINITY),
            |(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)),
        );
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return vec![0; values.len()];
    }
    values
        .par_iter()
        .map(|&v| (((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect()
}
