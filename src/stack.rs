//! Page-by-page access to multi-page TIFF containers.

use crate::volume::normalize_to_u8;

use image::{DynamicImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};
use rayon::prelude::*;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use thiserror::Error;
use tiff::{
    ColorType,
    decoder::{Decoder, DecodingResult},
};

#[derive(Debug, Error)]
pub enum StackError {
    #[error("Unsupported page layout {color_type} on page {page}")]
    Unsupported { page: usize, color_type: String },

    #[error("Page {page} holds fewer samples than its {width}x{height} size")]
    BufferSize {
        page: usize,
        width: u32,
        height: u32,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),
}

/// Iterator over the decoded pages of a TIFF container, in file order.
///
/// Decoding stops at the first error.
pub struct StackPages<R: Read + Seek> {
    decoder: Decoder<R>,
    page: usize,
    finished: bool,
}

impl StackPages<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StackError> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> StackPages<R> {
    pub fn new(reader: R) -> Result<Self, StackError> {
        Ok(Self {
            decoder: Decoder::new(reader)?,
            page: 0,
            finished: false,
        })
    }

    fn advance(&mut self) -> Result<Option<DynamicImage>, StackError> {
        if self.page > 0 {
            if !self.decoder.more_images() {
                return Ok(None);
            }
            self.decoder.next_image()?;
        }
        let page = self.page;
        self.page += 1;

        let (width, height) = self.decoder.dimensions()?;
        let color_type = self.decoder.colortype()?;
        if !is_supported(color_type) {
            return Err(StackError::Unsupported {
                page,
                color_type: format!("{color_type:?}"),
            });
        }
        let data = self.decoder.read_image()?;
        page_to_image(page, width, height, color_type, data).map(Some)
    }
}

impl<R: Read + Seek> Iterator for StackPages<R> {
    type Item = Result<DynamicImage, StackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.advance();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result.transpose()
    }
}

fn is_supported(color_type: ColorType) -> bool {
    matches!(
        color_type,
        ColorType::Gray(8 | 16 | 32)
            | ColorType::GrayA(8 | 16)
            | ColorType::RGB(8 | 16)
            | ColorType::RGBA(8 | 16)
    )
}

fn page_to_image(
    page: usize,
    width: u32,
    height: u32,
    color_type: ColorType,
    data: DecodingResult,
) -> Result<DynamicImage, StackError> {
    let image = match (color_type, data) {
        (ColorType::Gray(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        (ColorType::Gray(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, buf)
                .map(DynamicImage::ImageLuma16)
        }
        (ColorType::Gray(32), DecodingResult::F32(buf)) => {
            let buf = normalize_to_u8(buf.into_par_iter());
            ImageBuffer::<Luma<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        (ColorType::GrayA(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<LumaA<u8>, _>::from_raw(width, height, buf)
                .map(DynamicImage::ImageLumaA8)
        }
        (ColorType::GrayA(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<LumaA<u16>, _>::from_raw(width, height, buf)
                .map(DynamicImage::ImageLumaA16)
        }
        (ColorType::RGB(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        (ColorType::RGB(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgb16)
        }
        (ColorType::RGBA(8), DecodingResult::U8(buf)) => {
            ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
        }
        (ColorType::RGBA(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgba16)
        }
        (color_type, _) => {
            return Err(StackError::Unsupported {
                page,
                color_type: format!("{color_type:?}"),
            });
        }
    };

    image.ok_or(StackError::BufferSize {
        page,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConvertError, convert_stack};
    use std::{fs, io::Cursor};
    use tiff::encoder::{TiffEncoder, TiffValue, colortype};

    fn gray_stack(pages: &[[u8; 4]]) -> Cursor<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor).unwrap();
            for page in pages {
                encoder
                    .write_image::<colortype::Gray8>(2, 2, page)
                    .unwrap();
            }
        }
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn yields_every_page_in_order() {
        let cursor = gray_stack(&[[0; 4], [1; 4], [2; 4]]);
        let pages: Vec<_> = StackPages::new(cursor)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(pages.len(), 3);
        for (index, page) in pages.iter().enumerate() {
            assert_eq!((page.width(), page.height()), (2, 2));
            assert_eq!(page.as_bytes(), &[index as u8; 4]);
        }
    }

    #[test]
    fn rgb_pages() {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor).unwrap();
            encoder
                .write_image::<colortype::RGB8>(1, 2, &[1, 2, 3, 4, 5, 6])
                .unwrap();
        }
        cursor.set_position(0);

        let mut pages = StackPages::new(cursor).unwrap();
        let page = pages.next().unwrap().unwrap();
        assert_eq!(page.color(), image::ColorType::Rgb8);
        assert!(pages.next().is_none());
        assert!(pages.next().is_none());
    }

    fn single_page<C>(width: u32, height: u32, data: &[C::Inner]) -> Vec<u8>
    where
        C: colortype::ColorType,
        [C::Inner]: TiffValue,
    {
        let mut cursor = Cursor::new(Vec::new());
        TiffEncoder::new(&mut cursor)
            .unwrap()
            .write_image::<C>(width, height, data)
            .unwrap();
        cursor.into_inner()
    }

    fn convert_single(bytes: Vec<u8>) -> image::DynamicImage {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.tiff");
        fs::write(&path, bytes).unwrap();
        let converted = convert_stack(&path).unwrap();
        assert_eq!(converted.images().len(), 1);
        image::open(&converted.images()[0]).unwrap()
    }

    #[test]
    fn gray16_pages_become_8_bit() {
        let bytes = single_page::<colortype::Gray16>(2, 2, &[0, 1000, 40000, 65535]);

        let page = StackPages::new(Cursor::new(bytes.clone()))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(page.color(), image::ColorType::L16);

        let jpeg = convert_single(bytes);
        assert_eq!(jpeg.color(), image::ColorType::L8);
        assert_eq!((jpeg.width(), jpeg.height()), (2, 2));
    }

    #[test]
    fn float_pages_are_windowed() {
        let bytes = single_page::<colortype::Gray32Float>(2, 2, &[-1.0, 0.0, 1.0, 3.0]);

        let page = StackPages::new(Cursor::new(bytes))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(page.color(), image::ColorType::L8);
        assert_eq!(page.as_bytes(), &[0, 64, 128, 255]);
    }

    #[test]
    fn rgba_pages_lose_alpha_in_jpeg() {
        let bytes = single_page::<colortype::RGBA8>(2, 1, &[10, 20, 30, 255, 40, 50, 60, 0]);

        let page = StackPages::new(Cursor::new(bytes.clone()))
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert_eq!(page.color(), image::ColorType::Rgba8);

        let jpeg = convert_single(bytes);
        assert_eq!(jpeg.color(), image::ColorType::Rgb8);
    }

    #[test]
    fn cmyk_pages_are_unsupported() {
        let bytes = single_page::<colortype::CMYK8>(1, 1, &[0, 0, 0, 255]);

        let mut pages = StackPages::new(Cursor::new(bytes)).unwrap();
        assert!(matches!(
            pages.next(),
            Some(Err(StackError::Unsupported { page: 0, .. }))
        ));
        assert!(pages.next().is_none());
    }

    #[test]
    fn unsupported_page_aborts_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.tiff");
        fs::write(&path, single_page::<colortype::CMYK8>(1, 1, &[0, 0, 0, 255])).unwrap();
        assert!(matches!(
            convert_stack(&path),
            Err(ConvertError::Stack(StackError::Unsupported { .. }))
        ));
    }

    #[test]
    fn not_a_tiff() {
        let cursor = Cursor::new(b"definitely not a tiff".to_vec());
        assert!(StackPages::new(cursor).is_err());
    }
}
