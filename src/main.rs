use std::{convert::Infallible, path::PathBuf, process::ExitCode};

use clap::Parser;
use env_logger::{Builder, Env};
use glaucoma_justification::{Pipeline, PipelineConfig};
use log::{error, info};

/// Convert retinal images and write an all-unknown justification file.
///
/// No classifier is attached: every image is reported as not referable
/// with no features, which yields the baseline result file.
#[derive(Debug, Parser)]
#[command(name = "glaucoma-justification", version)]
struct Cli {
    /// Folder searched recursively for .mha and .tiff images
    #[arg(short, long, default_value = "test/input")]
    input: PathBuf,

    /// Folder the result file is written to
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Log every discovered file and prediction
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));
    builder.format_timestamp_secs();
    builder.init();

    let pipeline = Pipeline::new(PipelineConfig::new(cli.input, cli.output));
    let result = pipeline.run(|unit| {
        info!("Classifying {}", unit.image_path().display());
        unit.save_prediction(false, 0.0, None);
        Ok::<_, Infallible>(())
    });

    match result {
        Ok(results) => {
            info!(
                "Wrote {} records to {}",
                results.len(),
                pipeline.config().output_path().display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
