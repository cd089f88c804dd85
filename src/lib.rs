//! Feature and preprocessing transformers for an AutoML host.
//!
//! - [`holiday::HolidayFlagger`]: Canadian public holiday indicators, one
//!   column per jurisdiction, with a lookback window before each holiday.
//! - [`fairness::FairnessPreprocessor`]: protected-attribute validation in
//!   front of an external fair-representation algorithm.
//!
//! With the `python` feature the crate builds the `_core` extension module
//! the host loads.

pub mod calendar;
pub mod dates;
pub mod error;
pub mod fairness;
pub mod holiday;
pub mod jurisdiction;
pub mod schema;
pub mod scoring;

#[cfg(feature = "python")]
pub mod aif360;
#[cfg(feature = "python")]
mod python;

pub use calendar::{CalendarOptions, CanadaCalendar, Holiday, HolidayCalendar};
pub use error::RecipeError;
pub use fairness::{
    FairRepresentationModel, FairnessAlgorithm, FairnessConfig, FairnessPreprocessor,
    LabeledDataset, ProtectedAttributes,
};
pub use holiday::{HolidayFlagger, HolidayFlaggerConfig, HolidayTable, YearRange};
pub use jurisdiction::Jurisdiction;
pub use scoring::{InputKind, ScoringPipeline};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Export schema constants as Python submodules
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let features = PyModule::new(m.py(), "features")?;
    for jurisdiction in Jurisdiction::ALL {
        features.add(jurisdiction.code().to_uppercase(), jurisdiction.feature_name())?;
    }
    features.add("ALL", schema::features::ALL.to_vec())?;
    m.add_submodule(&features)?;

    let display = PyModule::new(m.py(), "display")?;
    display.add("HOLIDAYS", schema::display::HOLIDAYS)?;
    display.add("LFR", schema::display::LFR)?;
    m.add_submodule(&display)?;

    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyHolidayTransformer>()?;
    m.add_class::<python::PyLfrDebiasingTransformer>()?;
    add_schema_exports(m)?;
    Ok(())
}
