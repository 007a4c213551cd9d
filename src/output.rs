use crate::collector::ResultCollection;

use log::info;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Name of the result file inside the output folder
pub const OUTPUT_FILE_NAME: &str = "multiple-justification-binary.json";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `results` as a JSON array to `output_folder`, creating the folder
/// if needed and replacing any earlier result file.
///
/// Returns the path that was written.
pub fn write_glaucomatous_features(
    results: &ResultCollection,
    output_folder: impl AsRef<Path>,
) -> Result<PathBuf, OutputError> {
    let output_folder = output_folder.as_ref();
    fs::create_dir_all(output_folder)?;

    let output_path = output_folder.join(OUTPUT_FILE_NAME);
    let mut writer = BufWriter::new(File::create(&output_path)?);
    serde_json::to_writer(&mut writer, results)?;
    writer.flush()?;

    info!("Glaucomatous features written to {}", output_path.display());
    Ok(output_path)
}
