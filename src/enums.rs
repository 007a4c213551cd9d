use std::path::Path;

/// Input formats the pipeline knows how to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Single MetaImage file (`.mha`)
    Volume,
    /// Multi-page TIFF container (`.tiff`)
    Stack,
}

impl FileKind {
    pub const VOLUME_EXTENSION: &'static str = "mha";
    pub const STACK_EXTENSION: &'static str = "tiff";

    /// Resolve the kind of a file from its extension.
    ///
    /// Matching is exact: `scan.MHA` or `stack.tif` are not recognized.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        match path.as_ref().extension()?.to_str()? {
            Self::VOLUME_EXTENSION => Some(Self::Volume),
            Self::STACK_EXTENSION => Some(Self::Stack),
            _ => None,
        }
    }
}

/// Sample type of a MetaImage pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    LongLong,
    ULongLong,
    Float,
    Double,
}

impl ElementType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let element_type = match tag {
            "MET_CHAR" => Self::Char,
            "MET_UCHAR" => Self::UChar,
            "MET_SHORT" => Self::Short,
            "MET_USHORT" => Self::UShort,
            "MET_INT" => Self::Int,
            "MET_UINT" => Self::UInt,
            "MET_LONG_LONG" => Self::LongLong,
            "MET_ULONG_LONG" => Self::ULongLong,
            "MET_FLOAT" => Self::Float,
            "MET_DOUBLE" => Self::Double,
            _ => return None,
        };
        Some(element_type)
    }

    /// Size of one sample in bytes
    pub fn size(self) -> usize {
        match self {
            Self::Char | Self::UChar => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::LongLong | Self::ULongLong | Self::Double => 8,
        }
    }
}
