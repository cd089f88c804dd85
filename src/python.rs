use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::aif360::Aif360Lfr;
use crate::fairness::{FairnessConfig, FairnessPreprocessor};
use crate::holiday::{HolidayFlagger, HolidayFlaggerConfig};
use crate::schema::display;
use crate::scoring::InputKind;

#[pyclass(name = "CanadaHolidayTransformer")]
pub struct PyHolidayTransformer {
    inner: HolidayFlagger,
}

#[pymethods]
impl PyHolidayTransformer {
    #[new]
    #[pyo3(signature = (time_column, lookback_days=14, datetime_format=None))]
    fn new(time_column: String, lookback_days: u32, datetime_format: Option<String>) -> Self {
        let mut config = HolidayFlaggerConfig::new(time_column).with_lookback_days(lookback_days);
        config.datetime_format = datetime_format;
        Self {
            inner: HolidayFlagger::new(config),
        }
    }

    #[classattr]
    fn display_name() -> &'static str {
        display::HOLIDAYS
    }

    fn fit(&mut self, frame: PyDataFrame) -> PyResult<()> {
        self.inner.fit(&frame.0)?;
        Ok(())
    }

    fn transform(&self, frame: PyDataFrame) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.transform(&frame.0)?))
    }

    fn fit_transform(&mut self, frame: PyDataFrame) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.fit_transform(&frame.0)?))
    }

    /// Serialize the fitted lookup logic as a JSON scoring pipeline.
    ///
    /// `input_type` is the dtype the scoring runtime will see for the time
    /// column: "str", "int", "float" or "date".
    #[pyo3(signature = (input_type="str"))]
    fn write_scoring_pipeline(&self, input_type: &str) -> PyResult<String> {
        let input = match input_type {
            "str" => InputKind::Str,
            "int" => InputKind::Int,
            "float" => InputKind::Float,
            "date" => InputKind::Date,
            _ => {
                return Err(PyValueError::new_err(format!(
                    "Invalid input_type: '{}'. Must be 'str', 'int', 'float' or 'date'",
                    input_type
                )))
            }
        };
        let pipeline = self.inner.export_scoring_pipeline(input)?;
        Ok(pipeline.to_json()?)
    }

    #[getter]
    fn output_feature_names(&self) -> Vec<String> {
        self.inner.output_feature_names()
    }
}

#[pyclass(name = "LfrDebiasingTransformer")]
pub struct PyLfrDebiasingTransformer {
    inner: FairnessPreprocessor<Aif360Lfr>,
}

#[pymethods]
impl PyLfrDebiasingTransformer {
    /// `config` is a dict with privileged_groups, unprivileged_groups,
    /// favorable_label, unfavorable_label and protected_attribute_names.
    /// Missing keys are reported at fit time.
    #[new]
    #[pyo3(signature = (config, seed=None))]
    fn new(py: Python<'_>, config: &Bound<'_, PyAny>, seed: Option<u64>) -> PyResult<Self> {
        let json: String = py
            .import("json")?
            .call_method1("dumps", (config,))?
            .extract()?;
        let config = FairnessConfig::from_json(&json)?;
        Ok(Self {
            inner: FairnessPreprocessor::new(config, Aif360Lfr { seed }),
        })
    }

    #[classattr]
    fn display_name() -> &'static str {
        display::LFR
    }

    fn fit(&mut self, frame: PyDataFrame, labels: Vec<f64>) -> PyResult<()> {
        self.inner.fit(&frame.0, &labels)?;
        Ok(())
    }

    fn transform(&self, frame: PyDataFrame) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.transform(&frame.0)?))
    }

    fn fit_transform(&mut self, frame: PyDataFrame, labels: Vec<f64>) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.fit_transform(&frame.0, &labels)?))
    }
}
