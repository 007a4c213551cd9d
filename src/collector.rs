use crate::{
    enums::FileKind,
    features::{FeatureRecord, PartialFeatures},
};

use log::debug;
use serde::Serialize;
use std::path::Path;

/// Feature records of one run, in the order they were reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultCollection {
    records: Vec<FeatureRecord>,
}

impl ResultCollection {
    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureRecord> {
        self.records.iter()
    }
}

impl IntoIterator for ResultCollection {
    type Item = FeatureRecord;
    type IntoIter = std::vec::IntoIter<FeatureRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Accumulates one [`FeatureRecord`] per reported prediction.
#[derive(Debug, Default)]
pub struct ResultCollector {
    collection: ResultCollection,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a prediction for one image.
    ///
    /// Only `features` ends up in the output; the referability decision and
    /// its likelihood are accepted for interface compatibility and logged.
    pub fn save_prediction(
        &mut self,
        is_referable_glaucoma: bool,
        likelihood_referable_glaucoma: f64,
        features: Option<PartialFeatures>,
    ) {
        debug!(
            "Prediction #{}: referable={is_referable_glaucoma} likelihood={likelihood_referable_glaucoma}",
            self.collection.len() + 1
        );
        let record = match features {
            Some(features) => FeatureRecord::merged(&features),
            None => FeatureRecord::default(),
        };
        self.collection.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn collection(&self) -> &ResultCollection {
        &self.collection
    }

    pub fn into_collection(self) -> ResultCollection {
        self.collection
    }
}

/// One converted image handed to the classifier.
///
/// The JPEG at [`ImageUnit::image_path`] is only valid for as long as the
/// unit is alive.
#[derive(Debug)]
pub struct ImageUnit<'a> {
    image: &'a Path,
    source: &'a Path,
    kind: FileKind,
    page: usize,
    collector: &'a mut ResultCollector,
}

impl<'a> ImageUnit<'a> {
    pub(crate) fn new(
        image: &'a Path,
        source: &'a Path,
        kind: FileKind,
        page: usize,
        collector: &'a mut ResultCollector,
    ) -> Self {
        Self {
            image,
            source,
            kind,
            page,
            collector,
        }
    }

    /// Converted JPEG to classify
    pub fn image_path(&self) -> &Path {
        self.image
    }

    /// Input file the image was converted from
    pub fn source_path(&self) -> &Path {
        self.source
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// 1-based page within the source file; always 1 for volumes
    pub fn page(&self) -> usize {
        self.page
    }

    /// Report the classification of this image.
    pub fn save_prediction(
        self,
        is_referable_glaucoma: bool,
        likelihood_referable_glaucoma: f64,
        features: Option<PartialFeatures>,
    ) {
        self.collector.save_prediction(
            is_referable_glaucoma,
            likelihood_referable_glaucoma,
            features,
        );
    }
}
