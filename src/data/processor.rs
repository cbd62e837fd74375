//! Data Processor Module
//! Selects a region row and turns its year/sex columns into typed counts.

use crate::data::loader::PopulationTable;
use crate::data::model::{AgeDistribution, AgeGroupSeries, BySex, Sex, TrendSeries};
use crate::data::schema::{self, SchemaError};
use polars::prelude::*;
use rayon::prelude::*;
use thiserror::Error;

const THOUSANDS_SEPARATOR: char = ',';

/// A cell that could not be read as a population count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedCell {
    pub column: String,
    pub value: String,
}

/// Every malformed cell of one selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} column(s) hold values that are not population counts: {}", .cells.len(), describe_cells(.cells))]
pub struct CoercionError {
    pub cells: Vec<MalformedCell>,
}

fn describe_cells(cells: &[MalformedCell]) -> String {
    cells
        .iter()
        .map(|c| format!("{} = '{}'", c.column, c.value))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error("Region '{region}' matches {rows} rows")]
    AmbiguousRegion { region: String, rows: usize },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Parse a thousands-separated count. Empty text is a missing value (zero).
pub fn parse_count(text: &str) -> Option<u64> {
    let cleaned: String = text
        .chars()
        .filter(|&c| c != THOUSANDS_SEPARATOR)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Some(0);
    }
    if !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

/// Format a count with thousands separators, e.g. `10,050`.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(THOUSANDS_SEPARATOR);
        }
        out.push(c);
    }
    out
}

/// Coerce one cell to a population count.
///
/// Missing cells (null, NaN, empty text) count as zero. Anything else that is
/// not a non-negative integer is malformed.
pub fn coerce_cell(column: &str, value: &AnyValue) -> Result<u64, MalformedCell> {
    let malformed = || MalformedCell {
        column: column.to_string(),
        value: value.to_string().trim_matches('"').to_string(),
    };
    let signed = |v: i64| u64::try_from(v).map_err(|_| malformed());
    let float = |v: f64| {
        if v.is_nan() {
            Ok(0)
        } else if v.is_finite() && v >= 0.0 {
            Ok(v.trunc() as u64)
        } else {
            Err(malformed())
        }
    };

    match value {
        AnyValue::Null => Ok(0),
        AnyValue::UInt8(v) => Ok(u64::from(*v)),
        AnyValue::UInt16(v) => Ok(u64::from(*v)),
        AnyValue::UInt32(v) => Ok(u64::from(*v)),
        AnyValue::UInt64(v) => Ok(*v),
        AnyValue::Int8(v) => signed(i64::from(*v)),
        AnyValue::Int16(v) => signed(i64::from(*v)),
        AnyValue::Int32(v) => signed(i64::from(*v)),
        AnyValue::Int64(v) => signed(*v),
        AnyValue::Float32(v) => float(f64::from(*v)),
        AnyValue::Float64(v) => float(*v),
        AnyValue::String(s) => parse_count(s).ok_or_else(malformed),
        AnyValue::StringOwned(s) => parse_count(s.as_str()).ok_or_else(malformed),
        _ => Err(malformed()),
    }
}

/// Handles region selection and numeric coercion.
pub struct DataProcessor;

impl DataProcessor {
    /// Select the single row of a region.
    ///
    /// No match is `Ok(None)`; several matches are rejected.
    pub fn find_region(
        table: &PopulationTable,
        region: &str,
    ) -> Result<Option<DataFrame>, ProcessorError> {
        let filtered = table
            .dataframe()
            .clone()
            .lazy()
            .filter(col(table.region_column()).eq(lit(region)))
            .collect()?;

        match filtered.height() {
            0 => Ok(None),
            1 => Ok(Some(filtered)),
            rows => Err(ProcessorError::AmbiguousRegion {
                region: region.to_string(),
                rows,
            }),
        }
    }

    /// Coerce the first-row cells of `columns`, collecting every malformed cell.
    fn coerce_columns<'a>(
        row: &DataFrame,
        columns: &[&'a str],
    ) -> Result<Vec<(&'a str, u64)>, ProcessorError> {
        let mut values = Vec::with_capacity(columns.len());
        let mut malformed = Vec::new();

        for &name in columns {
            let cell = row.column(name)?.get(0)?;
            match coerce_cell(name, &cell) {
                Ok(v) => values.push((name, v)),
                Err(bad) => malformed.push(bad),
            }
        }

        if !malformed.is_empty() {
            tracing::warn!(count = malformed.len(), "Malformed population cells");
            return Err(CoercionError { cells: malformed }.into());
        }
        Ok(values)
    }

    /// Age-group counts of one sex in a region row, in table order.
    pub fn sex_series(row: &DataFrame, year: i32, sex: Sex) -> Result<AgeGroupSeries, ProcessorError> {
        let names: Vec<&str> = row.get_column_names().into_iter().map(|s| s.as_str()).collect();
        let (age_columns, _) = schema::sex_columns(&names, year, sex);

        let mut series = AgeGroupSeries::default();
        for (column, count) in Self::coerce_columns(row, &age_columns)? {
            series.push(schema::age_group_label(column).to_string(), count);
        }
        Ok(series)
    }

    /// Sum of the total-population columns of one sex, `None` when absent.
    pub fn sex_total(row: &DataFrame, year: i32, sex: Sex) -> Result<Option<u64>, ProcessorError> {
        let names: Vec<&str> = row.get_column_names().into_iter().map(|s| s.as_str()).collect();
        let (_, total_columns) = schema::sex_columns(&names, year, sex);
        if total_columns.is_empty() {
            return Ok(None);
        }

        let values = Self::coerce_columns(row, &total_columns)?;
        Ok(Some(values.into_iter().map(|(_, v)| v).sum()))
    }

    /// Age distribution of a region for one year.
    pub fn age_distribution(
        table: &PopulationTable,
        region: &str,
        year: i32,
    ) -> Result<Option<AgeDistribution>, ProcessorError> {
        let age_groups = schema::age_groups(&table.column_names(), year)?;
        let Some(row) = Self::find_region(table, region)? else {
            return Ok(None);
        };

        let series = BySex::try_build(|sex| Self::sex_series(&row, year, sex))?;
        let reported_totals = BySex::try_build(|sex| Self::sex_total(&row, year, sex))?;

        Ok(Some(Self::reconcile(
            region,
            year,
            age_groups,
            series,
            reported_totals,
        )))
    }

    /// Align both series on one age axis; absent labels count as zero.
    ///
    /// Series labels outside `age_groups` (e.g. `연령미상`) join the axis so no
    /// count is left off the chart.
    pub fn reconcile(
        region: &str,
        year: i32,
        mut age_groups: Vec<String>,
        series: BySex<AgeGroupSeries>,
        reported_totals: BySex<Option<u64>>,
    ) -> AgeDistribution {
        let extra: Vec<String> = series
            .male
            .labels
            .iter()
            .chain(&series.female.labels)
            .filter(|label| !age_groups.contains(label))
            .cloned()
            .collect();
        if !extra.is_empty() {
            tracing::debug!(region, year, labels = ?extra, "Age groups outside the header axis");
            for label in extra {
                if !age_groups.contains(&label) {
                    age_groups.push(label);
                }
            }
            schema::sort_age_groups(&mut age_groups);
        }

        let counts = series.map(|_, s| age_groups.iter().map(|label| s.count(label)).collect());
        AgeDistribution {
            region: region.to_string(),
            year,
            age_groups,
            counts,
            reported_totals,
        }
    }

    /// Total population per year for a region, ascending by year.
    pub fn trend_series(
        table: &PopulationTable,
        region: &str,
    ) -> Result<Option<TrendSeries>, ProcessorError> {
        let mut years = schema::discover_years(&table.column_names())?;
        years.reverse();
        let Some(row) = Self::find_region(table, region)? else {
            return Ok(None);
        };

        let points: Vec<BySex<u64>> = years
            .par_iter()
            .map(|&year| {
                BySex::try_build(|sex| {
                    Self::sex_total(&row, year, sex)?
                        .ok_or(ProcessorError::Schema(SchemaError::NoTotalColumn { year, sex }))
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Some(TrendSeries {
            region: region.to_string(),
            years,
            totals: BySex::new(
                points.iter().map(|p| p.male).collect(),
                points.iter().map(|p| p.female).collect(),
            ),
        }))
    }
}
