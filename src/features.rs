//! Glaucomatous feature vocabulary and the per-image record built from it.

use serde::{Serialize, Serializer};

/// Clinical features a grader may justify a referable decision with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    NeuroretinalRimSuperiorly,
    NeuroretinalRimInferiorly,
    NerveFiberLayerDefectSuperiorly,
    NerveFiberLayerDefectInferiorly,
    CircumlinearVesselBaringSuperiorly,
    CircumlinearVesselBaringInferiorly,
    VesselTrunkNasalization,
    DiscHemorrhages,
    LaminarDots,
    LargeCup,
}

impl Feature {
    /// Every feature, in output order.
    pub const ALL: [Feature; 10] = [
        Feature::NeuroretinalRimSuperiorly,
        Feature::NeuroretinalRimInferiorly,
        Feature::NerveFiberLayerDefectSuperiorly,
        Feature::NerveFiberLayerDefectInferiorly,
        Feature::CircumlinearVesselBaringSuperiorly,
        Feature::CircumlinearVesselBaringInferiorly,
        Feature::VesselTrunkNasalization,
        Feature::DiscHemorrhages,
        Feature::LaminarDots,
        Feature::LargeCup,
    ];

    /// Key used for this feature in the result file
    pub fn name(self) -> &'static str {
        match self {
            Feature::NeuroretinalRimSuperiorly => "appearance neuroretinal rim superiorly",
            Feature::NeuroretinalRimInferiorly => "appearance neuroretinal rim inferiorly",
            Feature::NerveFiberLayerDefectSuperiorly => {
                "retinal nerve fiber layer defect superiorly"
            }
            Feature::NerveFiberLayerDefectInferiorly => {
                "retinal nerve fiber layer defect inferiorly"
            }
            Feature::CircumlinearVesselBaringSuperiorly => {
                "baring of the circumlinear vessel superiorly"
            }
            Feature::CircumlinearVesselBaringInferiorly => {
                "baring of the circumlinear vessel inferiorly"
            }
            Feature::VesselTrunkNasalization => "nasalization of the vessel trunk",
            Feature::DiscHemorrhages => "disc hemorrhages",
            Feature::LaminarDots => "laminar dots",
            Feature::LargeCup => "large cup",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|feature| feature.name() == name)
    }
}

impl From<Feature> for String {
    fn from(feature: Feature) -> Self {
        feature.name().to_owned()
    }
}

/// Feature values reported by a classifier for one image.
///
/// Names are not checked against [`Feature::ALL`]; anything reported is
/// carried into the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialFeatures {
    entries: Vec<(String, Option<bool>)>,
}

impl PartialFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing an earlier value for the same name.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Option<bool>>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Option<bool>>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<bool>)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl<K, V> FromIterator<(K, V)> for PartialFeatures
where
    K: Into<String>,
    V: Into<Option<bool>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut features = Self::new();
        for (name, value) in iter {
            features.insert(name, value);
        }
        features
    }
}

/// Tri-state feature values for one processed image.
///
/// Always holds the ten canonical features in [`Feature::ALL`] order,
/// followed by any extra names a caller reported. Serializes as a JSON
/// object whose values are `null`, `true` or `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    entries: Vec<(String, Option<bool>)>,
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Self {
            entries: Feature::ALL
                .into_iter()
                .map(|feature| (feature.name().to_owned(), None))
                .collect(),
        }
    }
}

impl FeatureRecord {
    /// Overlay `partial` onto the all-unknown record.
    pub fn merged(partial: &PartialFeatures) -> Self {
        let mut record = Self::default();
        for (name, value) in partial.iter() {
            match record.entries.iter_mut().find(|(key, _)| key == name) {
                Some(entry) => entry.1 = value,
                None => record.entries.push((name.to_owned(), value)),
            }
        }
        record
    }

    pub fn get(&self, name: &str) -> Option<Option<bool>> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }

    pub fn feature(&self, feature: Feature) -> Option<bool> {
        self.get(feature.name()).flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<bool>)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(name, value)| (name, value)))
    }
}
