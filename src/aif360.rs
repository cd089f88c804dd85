//! Bridge to the `aif360` Learning Fair Representations implementation.

use polars::prelude::*;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};
use pyo3_polars::PyDataFrame;

use crate::error::RecipeError;
use crate::fairness::{
    FairRepresentationModel, FairnessAlgorithm, GroupDefinition, LabeledDataset,
    ProtectedAttributes,
};

const LFR_MODULE: &str = "aif360.algorithms.preprocessing.lfr";
const DATASETS_MODULE: &str = "aif360.datasets";

/// `aif360.algorithms.preprocessing.lfr.LFR` with its default
/// hyperparameters.
#[derive(Debug, Clone, Default)]
pub struct Aif360Lfr {
    pub seed: Option<u64>,
}

pub struct Aif360LfrModel {
    lfr: PyObject,
}

impl FairnessAlgorithm for Aif360Lfr {
    type Model = Aif360LfrModel;

    fn fit(
        &self,
        attributes: &ProtectedAttributes,
        dataset: &LabeledDataset,
    ) -> Result<Self::Model, RecipeError> {
        Python::with_gil(|py| -> PyResult<Aif360LfrModel> {
            let kwargs = PyDict::new(py);
            kwargs.set_item(
                "unprivileged_groups",
                groups_to_py(py, &attributes.unprivileged_groups)?,
            )?;
            kwargs.set_item(
                "privileged_groups",
                groups_to_py(py, &attributes.privileged_groups)?,
            )?;
            kwargs.set_item("verbose", 0)?;
            if let Some(seed) = self.seed {
                kwargs.set_item("seed", seed)?;
            }

            let lfr = py
                .import(LFR_MODULE)?
                .getattr("LFR")?
                .call((), Some(&kwargs))?;
            let py_dataset = to_binary_label_dataset(py, dataset)?;
            lfr.call_method1("fit", (py_dataset,))?;
            Ok(Aif360LfrModel { lfr: lfr.unbind() })
        })
        .map_err(RecipeError::from)
    }
}

impl FairRepresentationModel for Aif360LfrModel {
    fn transform(&self, dataset: &LabeledDataset) -> Result<DataFrame, RecipeError> {
        let (names, rows) = Python::with_gil(|py| -> PyResult<(Vec<String>, Vec<Vec<f64>>)> {
            let py_dataset = to_binary_label_dataset(py, dataset)?;
            let fair = self.lfr.bind(py).call_method1("transform", (py_dataset,))?;
            let names: Vec<String> = fair.getattr("feature_names")?.extract()?;
            let rows: Vec<Vec<f64>> = fair
                .getattr("features")?
                .call_method0("tolist")?
                .extract()?;
            Ok((names, rows))
        })?;

        let columns = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<f64> = rows
                    .iter()
                    .map(|row| row.get(i).copied().unwrap_or(f64::NAN))
                    .collect();
                Column::new(name.as_str().into(), values)
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }
}

fn groups_to_py<'py>(
    py: Python<'py>,
    groups: &[GroupDefinition],
) -> PyResult<Bound<'py, PyList>> {
    let list = PyList::empty(py);
    for group in groups {
        let dict = PyDict::new(py);
        for (attribute, value) in group {
            dict.set_item(attribute, value)?;
        }
        list.append(dict)?;
    }
    Ok(list)
}

/// polars frame → pandas → `aif360.datasets.BinaryLabelDataset`.
fn to_binary_label_dataset<'py>(
    py: Python<'py>,
    dataset: &LabeledDataset,
) -> PyResult<Bound<'py, PyAny>> {
    let attributes = dataset.attributes();
    let pandas = PyDataFrame(dataset.frame().clone())
        .into_pyobject(py)?
        .call_method0("to_pandas")?;

    let kwargs = PyDict::new(py);
    kwargs.set_item("favorable_label", attributes.favorable_label)?;
    kwargs.set_item("unfavorable_label", attributes.unfavorable_label)?;
    kwargs.set_item("df", pandas)?;
    kwargs.set_item("label_names", vec![attributes.label_name.clone()])?;
    kwargs.set_item(
        "protected_attribute_names",
        attributes.protected_attribute_names.clone(),
    )?;

    py.import(DATASETS_MODULE)?
        .getattr("BinaryLabelDataset")?
        .call((), Some(&kwargs))
}
