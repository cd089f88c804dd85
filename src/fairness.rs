//! Fairness preprocessing.
//!
//! [`FairnessPreprocessor`] validates host configuration and hands a labeled
//! dataset to a [`FairnessAlgorithm`]. The algorithm itself lives outside
//! this crate; with the `python` feature the `aif360` LFR implementation is
//! reached through [`crate::aif360`].

use std::collections::BTreeMap;

use log::{debug, info};
use polars::prelude::*;
use serde::Deserialize;

use crate::error::RecipeError;
use crate::schema::{dataset, display};

/// Attribute name → value identifying one group, e.g. `{"sex": 1.0}`.
pub type GroupDefinition = BTreeMap<String, f64>;

fn default_label_name() -> String {
    dataset::DEFAULT_LABEL.to_string()
}

/// Host-supplied configuration. Every field may be absent until
/// [`FairnessConfig::validate`] is called.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FairnessConfig {
    #[serde(default)]
    pub privileged_groups: Option<Vec<GroupDefinition>>,
    #[serde(default)]
    pub unprivileged_groups: Option<Vec<GroupDefinition>>,
    #[serde(default)]
    pub favorable_label: Option<f64>,
    #[serde(default)]
    pub unfavorable_label: Option<f64>,
    #[serde(default)]
    pub protected_attribute_names: Option<Vec<String>>,
    #[serde(default = "default_label_name")]
    pub label_name: String,
}

impl FairnessConfig {
    pub fn from_json(json: &str) -> Result<Self, RecipeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check required fields in a fixed order; the first absent one is
    /// reported.
    pub fn validate(&self) -> Result<ProtectedAttributes, RecipeError> {
        let privileged_groups = self
            .privileged_groups
            .clone()
            .ok_or(RecipeError::Configuration {
                field: "privileged_groups",
            })?;
        let unprivileged_groups = self
            .unprivileged_groups
            .clone()
            .ok_or(RecipeError::Configuration {
                field: "unprivileged_groups",
            })?;
        let favorable_label = self.favorable_label.ok_or(RecipeError::Configuration {
            field: "favorable_label",
        })?;
        let unfavorable_label = self.unfavorable_label.ok_or(RecipeError::Configuration {
            field: "unfavorable_label",
        })?;
        let protected_attribute_names =
            self.protected_attribute_names
                .clone()
                .ok_or(RecipeError::Configuration {
                    field: "protected_attribute_names",
                })?;

        if favorable_label == unfavorable_label {
            return Err(RecipeError::InvalidData(format!(
                "favorable_label and unfavorable_label are both {favorable_label}"
            )));
        }

        Ok(ProtectedAttributes {
            privileged_groups,
            unprivileged_groups,
            favorable_label,
            unfavorable_label,
            protected_attribute_names,
            label_name: self.label_name.clone(),
        })
    }
}

/// Validated configuration: every field present.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedAttributes {
    pub privileged_groups: Vec<GroupDefinition>,
    pub unprivileged_groups: Vec<GroupDefinition>,
    pub favorable_label: f64,
    pub unfavorable_label: f64,
    pub protected_attribute_names: Vec<String>,
    pub label_name: String,
}

// ── Dataset ─────────────────────────────────────────────────────────────────

/// Features plus a binary label column, described by [`ProtectedAttributes`].
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    frame: DataFrame,
    attributes: ProtectedAttributes,
}

impl LabeledDataset {
    pub fn new(
        features: &DataFrame,
        labels: &[f64],
        attributes: &ProtectedAttributes,
    ) -> Result<Self, RecipeError> {
        if labels.len() != features.height() {
            return Err(RecipeError::InvalidData(format!(
                "{} labels for {} rows",
                labels.len(),
                features.height()
            )));
        }
        if let Some(bad) = labels
            .iter()
            .find(|l| **l != attributes.favorable_label && **l != attributes.unfavorable_label)
        {
            return Err(RecipeError::InvalidData(format!(
                "Label {bad} is neither favorable ({}) nor unfavorable ({})",
                attributes.favorable_label, attributes.unfavorable_label
            )));
        }
        for name in &attributes.protected_attribute_names {
            if features.column(name).is_err() {
                return Err(RecipeError::MissingColumn(name.clone()));
            }
        }
        if features.column(&attributes.label_name).is_ok() {
            return Err(RecipeError::InvalidData(format!(
                "Feature column '{}' collides with the label column",
                attributes.label_name
            )));
        }

        let label = Column::new(attributes.label_name.as_str().into(), labels);
        let frame = features.hstack(&[label])?;
        Ok(Self {
            frame,
            attributes: attributes.clone(),
        })
    }

    /// Features only; every label set to the unfavorable placeholder.
    pub fn unlabeled(
        features: &DataFrame,
        attributes: &ProtectedAttributes,
    ) -> Result<Self, RecipeError> {
        let placeholder = vec![attributes.unfavorable_label; features.height()];
        Self::new(features, &placeholder, attributes)
    }

    /// Features and label column together.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn attributes(&self) -> &ProtectedAttributes {
        &self.attributes
    }

    pub fn features(&self) -> Result<DataFrame, RecipeError> {
        Ok(self.frame.drop(&self.attributes.label_name)?)
    }

    pub fn labels(&self) -> Result<Vec<f64>, RecipeError> {
        let labels = self
            .frame
            .column(&self.attributes.label_name)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(self.attributes.unfavorable_label))
            .collect();
        Ok(labels)
    }
}

// ── Algorithm seam ──────────────────────────────────────────────────────────

/// An external fairness algorithm (for example LFR).
pub trait FairnessAlgorithm {
    type Model: FairRepresentationModel;

    fn fit(
        &self,
        attributes: &ProtectedAttributes,
        dataset: &LabeledDataset,
    ) -> Result<Self::Model, RecipeError>;
}

/// Fitted state of a [`FairnessAlgorithm`].
pub trait FairRepresentationModel {
    /// Fair representation of the dataset's features.
    fn transform(&self, dataset: &LabeledDataset) -> Result<DataFrame, RecipeError>;
}

// ── Preprocessor ────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Fitted<M> {
    attributes: ProtectedAttributes,
    model: M,
}

pub struct FairnessPreprocessor<A: FairnessAlgorithm> {
    config: FairnessConfig,
    algorithm: A,
    fitted: Option<Fitted<A::Model>>,
}

impl<A: FairnessAlgorithm> FairnessPreprocessor<A> {
    pub const DISPLAY_NAME: &'static str = display::LFR;

    pub fn new(config: FairnessConfig, algorithm: A) -> Self {
        Self {
            config,
            algorithm,
            fitted: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn fit(&mut self, features: &DataFrame, labels: &[f64]) -> Result<(), RecipeError> {
        self.fitted = None;
        let attributes = self.config.validate()?;
        let dataset = LabeledDataset::new(features, labels, &attributes)?;
        debug!(
            "Fitting {} on {} rows, protected attributes {:?}",
            Self::DISPLAY_NAME,
            dataset.frame().height(),
            attributes.protected_attribute_names
        );

        let model = self.algorithm.fit(&attributes, &dataset)?;
        info!("Fitted {}", Self::DISPLAY_NAME);
        self.fitted = Some(Fitted { attributes, model });
        Ok(())
    }

    pub fn transform(&self, features: &DataFrame) -> Result<DataFrame, RecipeError> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| RecipeError::NotFitted(Self::DISPLAY_NAME.to_string()))?;
        let dataset = LabeledDataset::unlabeled(features, &fitted.attributes)?;
        fitted.model.transform(&dataset)
    }

    pub fn fit_transform(
        &mut self,
        features: &DataFrame,
        labels: &[f64],
    ) -> Result<DataFrame, RecipeError> {
        self.fit(features, labels)?;
        self.transform(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> FairnessConfig {
        FairnessConfig::from_json(
            r#"{
                "privileged_groups": [{"sex": 1}],
                "unprivileged_groups": [{"sex": 0}],
                "favorable_label": 1,
                "unfavorable_label": 0,
                "protected_attribute_names": ["sex"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn complete_config_validates() {
        let attrs = complete().validate().unwrap();
        assert_eq!(attrs.label_name, "label");
        assert_eq!(attrs.privileged_groups[0]["sex"], 1.0);
    }

    #[test]
    fn first_missing_field_is_reported() {
        let mut config = complete();
        config.unprivileged_groups = None;
        config.protected_attribute_names = None;
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "unprivileged_groups missing from config");
    }

    #[test]
    fn equal_labels_are_rejected() {
        let mut config = complete();
        config.unfavorable_label = Some(1.0);
        assert!(matches!(config.validate(), Err(RecipeError::InvalidData(_))));
    }

    #[test]
    fn dataset_rejects_non_binary_labels() {
        let attrs = complete().validate().unwrap();
        let features = df!("sex" => [0.0, 1.0], "x" => [1.0, 2.0]).unwrap();
        assert!(LabeledDataset::new(&features, &[1.0, 2.0], &attrs).is_err());
        assert!(LabeledDataset::new(&features, &[1.0], &attrs).is_err());
    }

    #[test]
    fn dataset_requires_protected_columns() {
        let attrs = complete().validate().unwrap();
        let features = df!("x" => [1.0, 2.0]).unwrap();
        assert!(matches!(
            LabeledDataset::new(&features, &[1.0, 0.0], &attrs),
            Err(RecipeError::MissingColumn(c)) if c == "sex"
        ));
    }

    #[test]
    fn dataset_splits_features_and_labels() {
        let attrs = complete().validate().unwrap();
        let features = df!("sex" => [0.0, 1.0], "x" => [1.0, 2.0]).unwrap();
        let dataset = LabeledDataset::new(&features, &[1.0, 0.0], &attrs).unwrap();
        assert_eq!(dataset.frame().width(), 3);
        assert!(dataset.features().unwrap().equals(&features));
        assert_eq!(dataset.labels().unwrap(), vec![1.0, 0.0]);
    }
}
