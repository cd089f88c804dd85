//! Portable scoring pipeline.
//!
//! A fitted [`HolidayFlagger`](crate::holiday::HolidayFlagger) can be
//! restated as a flat list of primitive column operations that a scoring
//! runtime executes without this crate. [`ScoringPipeline::evaluate`] is the
//! reference interpreter for that list.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::{self, MISSING_TOKENS};
use crate::error::RecipeError;
use crate::holiday::{HolidayTable, JurisdictionTables};
use crate::jurisdiction::Jurisdiction;
use crate::schema::keys;

/// Type of the time column the scoring runtime will receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Str,
    Int,
    /// Whole-number `yyyymmdd` values, NaN where missing.
    Float,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringType {
    Int32,
    Int64,
    Str,
}

impl ScoringType {
    fn dtype(self) -> DataType {
        match self {
            ScoringType::Int32 => DataType::Int32,
            ScoringType::Int64 => DataType::Int64,
            ScoringType::Str => DataType::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    DayOfYear,
}

/// `(year, doy)` pairs that map to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupTable {
    pub year: Vec<i32>,
    pub doy: Vec<u32>,
}

impl LookupTable {
    /// Key columns named after `keys`, plus `output` set to 1.
    fn to_frame(&self, keys: &[String; 2], output: &str) -> Result<LazyFrame, RecipeError> {
        let doy: Vec<i32> = self.doy.iter().map(|d| *d as i32).collect();
        let frame = DataFrame::new(vec![
            Column::new(keys[0].as_str().into(), &self.year),
            Column::new(keys[1].as_str().into(), doy),
        ])?;
        Ok(frame.lazy().with_column(lit(1i32).alias(output)))
    }
}

impl From<&HolidayTable> for LookupTable {
    fn from(table: &HolidayTable) -> Self {
        let (year, doy) = table.keys().map(|k| (k.year, k.day_of_year)).unzip();
        Self { year, doy }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScoringOp {
    /// Exact text replacement; `None` means null.
    Replace {
        column: String,
        map: Vec<(String, Option<String>)>,
    },
    AsType {
        column: String,
        to: ScoringType,
    },
    ParseDate {
        column: String,
        format: Option<String>,
    },
    DatePart {
        input: String,
        output: String,
        part: DatePart,
    },
    /// Left merge on `keys`; matched rows get 1 in `output`, others null.
    Merge {
        keys: [String; 2],
        table: LookupTable,
        output: String,
    },
    FillNa {
        column: String,
        value: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPipeline {
    pub group_uuid: Uuid,
    pub group_name: String,
    pub input: String,
    pub outputs: Vec<String>,
    pub ops: Vec<ScoringOp>,
}

impl ScoringPipeline {
    pub(crate) fn for_holidays(
        time_column: &str,
        datetime_format: Option<&str>,
        input: InputKind,
        tables: &JurisdictionTables,
    ) -> Self {
        let as_type = |to| ScoringOp::AsType {
            column: time_column.to_string(),
            to,
        };
        let mut ops = match input {
            InputKind::Str => vec![ScoringOp::Replace {
                column: time_column.to_string(),
                map: MISSING_TOKENS.iter().map(|t| (t.to_string(), None)).collect(),
            }],
            InputKind::Int => vec![as_type(ScoringType::Str)],
            InputKind::Float => vec![as_type(ScoringType::Int64), as_type(ScoringType::Str)],
            InputKind::Date => Vec::new(),
        };
        ops.push(ScoringOp::ParseDate {
            column: time_column.to_string(),
            format: datetime_format.map(str::to_string),
        });
        ops.push(ScoringOp::DatePart {
            input: time_column.to_string(),
            output: keys::YEAR.to_string(),
            part: DatePart::Year,
        });
        ops.push(ScoringOp::DatePart {
            input: time_column.to_string(),
            output: keys::DAY_OF_YEAR.to_string(),
            part: DatePart::DayOfYear,
        });

        for (jurisdiction, table) in tables.iter() {
            let feature = jurisdiction.feature_name().to_string();
            ops.push(ScoringOp::Merge {
                keys: [keys::YEAR.to_string(), keys::DAY_OF_YEAR.to_string()],
                table: LookupTable::from(table),
                output: feature.clone(),
            });
            ops.push(ScoringOp::FillNa {
                column: feature,
                value: 0,
            });
        }
        for jurisdiction in Jurisdiction::ALL {
            ops.push(ScoringOp::AsType {
                column: jurisdiction.feature_name().to_string(),
                to: ScoringType::Int32,
            });
        }

        Self {
            group_uuid: Uuid::new_v4(),
            group_name: "HolidayFlagger".to_string(),
            input: time_column.to_string(),
            outputs: Jurisdiction::ALL
                .iter()
                .map(|j| j.feature_name().to_string())
                .collect(),
            ops,
        }
    }

    pub fn to_json(&self) -> Result<String, RecipeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, RecipeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Run the pipeline over the input column of `df`. Returns the output
    /// columns in input row order.
    pub fn evaluate(&self, df: &DataFrame) -> Result<DataFrame, RecipeError> {
        require_columns(df, &[self.input.as_str()])?;
        let input = df.column(&self.input)?.clone();
        let mut frame = DataFrame::new(vec![input])?
            .lazy()
            .with_row_index(keys::ROW_INDEX, None)
            .collect()?;

        for op in &self.ops {
            frame = apply(frame, op)?;
        }

        let outputs: Vec<Expr> = self.outputs.iter().map(|name| col(name.as_str())).collect();
        Ok(frame
            .lazy()
            .sort([keys::ROW_INDEX], SortMultipleOptions::default())
            .select(outputs)
            .collect()?)
    }
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), RecipeError> {
    for &name in required {
        if df.column(name).is_err() {
            return Err(RecipeError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

fn apply(frame: DataFrame, op: &ScoringOp) -> Result<DataFrame, RecipeError> {
    let lazy = match op {
        ScoringOp::Replace { column, map } => {
            require_columns(&frame, &[column.as_str()])?;
            let replaced = map.iter().fold(col(column.as_str()), |expr, (from, to)| {
                let value = match to {
                    Some(to) => lit(to.as_str()),
                    None => lit(NULL).cast(DataType::String),
                };
                when(col(column.as_str()).eq(lit(from.as_str())))
                    .then(value)
                    .otherwise(expr)
            });
            frame.lazy().with_column(replaced.alias(column.as_str()))
        }
        ScoringOp::AsType { column, to } => {
            require_columns(&frame, &[column.as_str()])?;
            frame
                .lazy()
                .with_column(col(column.as_str()).cast(to.dtype()))
        }
        ScoringOp::ParseDate { column, format } => {
            require_columns(&frame, &[column.as_str()])?;
            let dtype = frame.column(column)?.dtype().clone();
            let parsed = dates::date_expr(column, &dtype, format.as_deref())?;
            frame.lazy().with_column(parsed)
        }
        ScoringOp::DatePart {
            input,
            output,
            part,
        } => {
            require_columns(&frame, &[input.as_str()])?;
            let date = col(input.as_str()).dt();
            let value = match part {
                DatePart::Year => date.year(),
                DatePart::DayOfYear => date.ordinal_day(),
            };
            frame
                .lazy()
                .with_column(value.cast(DataType::Int32).alias(output.as_str()))
        }
        ScoringOp::Merge {
            keys,
            table,
            output,
        } => {
            require_columns(&frame, &[keys[0].as_str(), keys[1].as_str()])?;
            let on = [col(keys[0].as_str()), col(keys[1].as_str())];
            frame.lazy().join(
                table.to_frame(keys, output)?,
                on.clone(),
                on,
                JoinArgs {
                    maintain_order: MaintainOrderJoin::Left,
                    ..JoinArgs::new(JoinType::Left)
                },
            )
        }
        ScoringOp::FillNa { column, value } => {
            require_columns(&frame, &[column.as_str()])?;
            frame
                .lazy()
                .with_column(col(column.as_str()).fill_null(lit(*value)))
        }
    };
    Ok(lazy.collect()?)
}
