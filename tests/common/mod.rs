use std::{fs, fs::File, path::Path};

use tiff::encoder::{TiffEncoder, colortype};

/// Write an uncompressed 2D RGB MetaImage.
pub fn write_mha(path: &Path, width: usize, height: usize) {
    let mut bytes = format!(
        "ObjectType = Image\n\
         NDims = 2\n\
         BinaryData = True\n\
         BinaryDataByteOrderMSB = False\n\
         CompressedData = False\n\
         DimSize = {width} {height}\n\
         ElementNumberOfChannels = 3\n\
         ElementSpacing = 1 1\n\
         ElementType = MET_UCHAR\n\
         ElementDataFile = LOCAL\n"
    )
    .into_bytes();
    bytes.extend((0..width * height * 3).map(|i| (i % 256) as u8));
    fs::write(path, bytes).expect("should have written mha fixture");
}

/// Write a grayscale TIFF with `pages` pages.
pub fn write_stack(path: &Path, pages: usize) {
    let file = File::create(path).expect("should have created tiff fixture");
    let mut encoder = TiffEncoder::new(file).expect("should have opened tiff encoder");
    for page in 0..pages {
        let data = vec![(page * 40) as u8; 8 * 6];
        encoder
            .write_image::<colortype::Gray8>(8, 6, &data)
            .expect("should have written tiff page");
    }
}
