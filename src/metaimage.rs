//! Reader for ITK MetaImage files (`.mha`, or `.mhd` with a detached
//! data file).

use crate::{enums::ElementType, volume::Volume};

use flate2::read::ZlibDecoder;
use ndarray::Array4;
use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetaImageError {
    #[error("Header is missing the {0} field")]
    MissingField(&'static str),

    #[error("Invalid value {value:?} for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Unsupported element type {0}")]
    UnsupportedElementType(String),

    #[error("Unsupported number of dimensions: {0}")]
    UnsupportedDimensions(usize),

    #[error("Unsupported data file list {0:?}")]
    UnsupportedDataFile(String),

    #[error("Expected {expected} bytes of pixel data, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

/// Parsed MetaImage header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Extent per axis, x first
    pub dim_size: Vec<usize>,
    pub element_type: ElementType,
    pub channels: usize,
    pub big_endian: bool,
    pub compressed: bool,
    pub data_file: DataFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFile {
    /// Pixel data follows the header in the same file
    Local,
    /// Pixel data lives in a separate file next to the header
    External(PathBuf),
}

impl Header {
    /// Parse the header at the start of `bytes`.
    ///
    /// Returns the header and the offset at which pixel data begins.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), MetaImageError> {
        let mut ndims = None;
        let mut dim_size = None;
        let mut element_type = None;
        let mut channels = 1;
        let mut big_endian = false;
        let mut compressed = false;

        let mut offset = 0;
        while offset < bytes.len() {
            let end = bytes[offset..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |p| offset + p);
            let line = String::from_utf8_lossy(&bytes[offset..end]);
            offset = (end + 1).min(bytes.len());

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "NDims" => ndims = Some(parse_value::<usize>("NDims", value)?),
                "DimSize" => dim_size = Some(parse_list::<usize>("DimSize", value)?),
                "ElementType" => {
                    element_type = Some(
                        ElementType::from_tag(value)
                            .ok_or_else(|| MetaImageError::UnsupportedElementType(value.into()))?,
                    )
                }
                "ElementNumberOfChannels" => {
                    channels = parse_value::<usize>("ElementNumberOfChannels", value)?
                }
                "BinaryDataByteOrderMSB" | "ElementByteOrderMSB" => {
                    big_endian = parse_bool("BinaryDataByteOrderMSB", value)?
                }
                "CompressedData" => compressed = parse_bool("CompressedData", value)?,
                "ElementDataFile" => {
                    let ndims = ndims.ok_or(MetaImageError::MissingField("NDims"))?;
                    if !(2..=3).contains(&ndims) {
                        return Err(MetaImageError::UnsupportedDimensions(ndims));
                    }
                    let dim_size = dim_size.ok_or(MetaImageError::MissingField("DimSize"))?;
                    if dim_size.len() != ndims {
                        return Err(MetaImageError::InvalidValue {
                            field: "DimSize",
                            value: format!("{dim_size:?}"),
                        });
                    }
                    if !(1..=4).contains(&channels) {
                        return Err(MetaImageError::InvalidValue {
                            field: "ElementNumberOfChannels",
                            value: channels.to_string(),
                        });
                    }
                    let data_file = match value {
                        "LOCAL" | "Local" | "local" => DataFile::Local,
                        list if list.starts_with("LIST") || list.contains('%') => {
                            return Err(MetaImageError::UnsupportedDataFile(list.into()));
                        }
                        path => DataFile::External(PathBuf::from(path)),
                    };
                    let header = Self {
                        element_type: element_type
                            .ok_or(MetaImageError::MissingField("ElementType"))?,
                        dim_size,
                        channels,
                        big_endian,
                        compressed,
                        data_file,
                    };
                    return Ok((header, offset));
                }
                _ => {}
            }
        }

        Err(MetaImageError::MissingField("ElementDataFile"))
    }

    /// Shape of the decoded array (depth, height, width, channels)
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        let depth = self.dim_size.get(2).copied().unwrap_or(1);
        (depth, self.dim_size[1], self.dim_size[0], self.channels)
    }

    /// Number of pixel data bytes the header describes
    pub fn data_size(&self) -> Result<usize, MetaImageError> {
        let (depth, height, width, channels) = self.shape();
        [depth, height, width, channels, self.element_type.size()]
            .into_iter()
            .try_fold(1usize, usize::checked_mul)
            .ok_or_else(|| MetaImageError::InvalidValue {
                field: "DimSize",
                value: format!("{:?}", self.dim_size),
            })
    }
}

pub struct MetaImageReader;

impl MetaImageReader {
    /// Read a MetaImage file into a volume.
    ///
    /// # Errors
    ///
    /// Returns error if the header is malformed or the pixel data does
    /// not match it
    pub fn read(path: impl AsRef<Path>) -> Result<Volume, MetaImageError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let (header, offset) = Header::parse(&bytes)?;

        match &header.data_file {
            DataFile::Local => Self::decode(&header, &bytes[offset..]),
            DataFile::External(file) => {
                let data_path = path.parent().unwrap_or(Path::new(".")).join(file);
                Self::decode(&header, &fs::read(data_path)?)
            }
        }
    }

    /// Decode pixel data described by `header`.
    pub fn decode(header: &Header, data: &[u8]) -> Result<Volume, MetaImageError> {
        let expected = header.data_size()?;

        let inflated;
        let raw = if header.compressed {
            let mut buffer = Vec::with_capacity(data.len());
            ZlibDecoder::new(data)
                .take(expected as u64)
                .read_to_end(&mut buffer)?;
            inflated = buffer;
            &inflated[..]
        } else {
            data
        };

        if raw.len() < expected {
            return Err(MetaImageError::Truncated {
                expected,
                found: raw.len(),
            });
        }

        let samples = Self::to_samples(&raw[..expected], header.element_type, header.big_endian);
        let data = Array4::from_shape_vec(header.shape(), samples)?;

        Ok(Volume::new(data, header.element_type))
    }

    fn to_samples(raw: &[u8], element_type: ElementType, big_endian: bool) -> Vec<f32> {
        macro_rules! samples {
            ($ty:ty) => {
                raw.chunks_exact(std::mem::size_of::<$ty>())
                    .map(|chunk| {
                        let bytes = chunk.try_into().unwrap_or_default();
                        let value = if big_endian {
                            <$ty>::from_be_bytes(bytes)
                        } else {
                            <$ty>::from_le_bytes(bytes)
                        };
                        value as f32
                    })
                    .collect()
            };
        }

        match element_type {
            ElementType::Char => samples!(i8),
            ElementType::UChar => samples!(u8),
            ElementType::Short => samples!(i16),
            ElementType::UShort => samples!(u16),
            ElementType::Int => samples!(i32),
            ElementType::UInt => samples!(u32),
            ElementType::LongLong => samples!(i64),
            ElementType::ULongLong => samples!(u64),
            ElementType::Float => samples!(f32),
            ElementType::Double => samples!(f64),
        }
    }
}

fn parse_value<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, MetaImageError> {
    value.parse().map_err(|_| MetaImageError::InvalidValue {
        field,
        value: value.into(),
    })
}

fn parse_list<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<Vec<T>, MetaImageError> {
    value
        .split_whitespace()
        .map(|item| parse_value(field, item))
        .collect()
}

fn parse_bool(field: &'static str, value: &str) -> Result<bool, MetaImageError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(MetaImageError::InvalidValue {
            field,
            value: value.into(),
        }),
    }
}
