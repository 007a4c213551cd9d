use crate::{
    collector::{ImageUnit, ResultCollection, ResultCollector},
    converter::{self, ConvertError},
    enums::FileKind,
    output::{self, OUTPUT_FILE_NAME, OutputError},
};

use log::{debug, info};
use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// Error returned by a classification handler
pub type HandlerError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to list input files: {0}")]
    Discovery(#[from] walkdir::Error),

    #[error("Failed to convert {}: {source}", .path.display())]
    Convert {
        path: PathBuf,
        #[source]
        source: ConvertError,
    },

    #[error("Handler failed on {}: {source}", .image.display())]
    Handler {
        image: PathBuf,
        #[source]
        source: HandlerError,
    },

    #[error("Failed to write results: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a run reads images from and writes results to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("test/input"),
            output_folder: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    pub fn new(input_folder: impl Into<PathBuf>, output_folder: impl Into<PathBuf>) -> Self {
        Self {
            input_folder: input_folder.into(),
            output_folder: output_folder.into(),
        }
    }

    /// Path of the result file a run produces
    pub fn output_path(&self) -> PathBuf {
        self.output_folder.join(OUTPUT_FILE_NAME)
    }
}

/// An input file with a recognized format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub kind: FileKind,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// List every recognized file under the input folder.
    ///
    /// Directories are walked recursively in file name order. Files with
    /// other extensions are left out.
    pub fn discover(&self) -> Result<Vec<InputFile>, PipelineError> {
        let mut inputs = Vec::new();
        let mut total = 0;
        for entry in WalkDir::new(&self.config.input_folder)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            total += 1;
            debug!("Input file: {}", entry.path().display());
            if let Some(kind) = FileKind::from_path(entry.path()) {
                inputs.push(InputFile {
                    path: entry.into_path(),
                    kind,
                });
            }
        }
        info!(
            "Found {total} input files in {}, {} to process",
            self.config.input_folder.display(),
            inputs.len()
        );
        Ok(inputs)
    }

    /// Convert every input and call `handler` once per converted image.
    ///
    /// The handler reports through [`ImageUnit::save_prediction`]. Each
    /// image is removed once the handler returns. Processing stops at the
    /// first conversion or handler failure.
    pub fn process<F, E>(&self, mut handler: F) -> Result<ResultCollection, PipelineError>
    where
        F: FnMut(ImageUnit<'_>) -> Result<(), E>,
        E: Into<HandlerError>,
    {
        let mut collector = ResultCollector::new();

        for input in self.discover()? {
            let converted = match input.kind {
                FileKind::Volume => converter::convert_volume(&input.path),
                FileKind::Stack => converter::convert_stack(&input.path),
            }
            .map_err(|source| PipelineError::Convert {
                path: input.path.clone(),
                source,
            })?;

            for (index, image) in converted.images().iter().enumerate() {
                let unit = ImageUnit::new(image, &input.path, input.kind, index + 1, &mut collector);
                handler(unit).map_err(|source| PipelineError::Handler {
                    image: image.clone(),
                    source: source.into(),
                })?;
            }
        }

        Ok(collector.into_collection())
    }

    /// Run [`Pipeline::process`] and write the results to the output folder.
    ///
    /// Nothing is written if processing fails.
    pub fn run<F, E>(&self, handler: F) -> Result<ResultCollection, PipelineError>
    where
        F: FnMut(ImageUnit<'_>) -> Result<(), E>,
        E: Into<HandlerError>,
    {
        fs::create_dir_all(&self.config.output_folder)?;
        let results = self.process(handler)?;
        output::write_glaucomatous_features(&results, &self.config.output_folder)?;
        Ok(results)
    }
}

/// Run the pipeline over `input_folder`, writing to `output_folder`.
pub fn inference_tasks<F, E>(
    input_folder: impl AsRef<Path>,
    output_folder: impl AsRef<Path>,
    handler: F,
) -> Result<ResultCollection, PipelineError>
where
    F: FnMut(ImageUnit<'_>) -> Result<(), E>,
    E: Into<HandlerError>,
{
    let config = PipelineConfig::new(input_folder.as_ref(), output_folder.as_ref());
    Pipeline::new(config).run(handler)
}
