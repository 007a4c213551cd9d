//! # Glaucoma justification harness
//!
//! This crate drives a glaucoma classifier over a folder of retinal images
//! and collects the feature justifications it reports into a single JSON
//! file.
//!
//! Inputs are searched recursively. Two formats are recognized:
//!  - `.mha` MetaImage files, exported as one JPEG (the first plane)
//!  - `.tiff` stacks, exported as one JPEG per page
//!
//! Every other file is ignored. Each JPEG is handed to a caller supplied
//! handler together with an [`ImageUnit`] through which the handler reports
//! a referability decision, its likelihood and any of the ten glaucomatous
//! [`Feature`]s it can justify. Features that are not reported stay unknown
//! (`null`). When all inputs are processed the records are written to
//! `multiple-justification-binary.json` in the output folder.
//!
//! Processing is sequential and stops at the first failure, in which case
//! no result file is written. Converted images live in temporary
//! directories that are removed as soon as the handler is done with them.
//!
//! # Examples
//!
//! ```no_run
//! # use glaucoma_justification::{Feature, PartialFeatures, Pipeline, PipelineConfig};
//! # use std::convert::Infallible;
//! let pipeline = Pipeline::new(PipelineConfig::new("test/input", "output"));
//! let results = pipeline
//!     .run(|unit| {
//!         println!("classifying {}", unit.image_path().display());
//!         let features = PartialFeatures::new().with(Feature::LargeCup, true);
//!         unit.save_prediction(true, 0.87, Some(features));
//!         Ok::<_, Infallible>(())
//!     })
//!     .expect("should have processed every input");
//! println!("{} images classified", results.len());
//! ```

pub mod collector;
pub mod converter;
pub mod enums;
pub mod features;
pub mod metaimage;
pub mod output;
pub mod pipeline;
pub mod stack;
pub mod volume;

pub use collector::{ImageUnit, ResultCollection, ResultCollector};
pub use enums::FileKind;
pub use features::{Feature, FeatureRecord, PartialFeatures};
pub use output::OUTPUT_FILE_NAME;
pub use pipeline::{Pipeline, PipelineConfig, PipelineError, inference_tasks};
