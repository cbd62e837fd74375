//! Dashboard orchestrator.
//! One render per selection: schema, filter & coerce, then chart specifications.

use crate::charts::{Labels, Palette, PyramidChart, TrendChart};
use crate::data::processor::{DataProcessor, ProcessorError};
use crate::data::schema::{self, SchemaError};
use crate::data::PopulationTable;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Process(#[from] ProcessorError),
    #[error("No rows found for region '{region}'")]
    SelectionMismatch { region: String },
}

impl From<SchemaError> for RenderError {
    fn from(e: SchemaError) -> Self {
        RenderError::Process(ProcessorError::Schema(e))
    }
}

impl RenderError {
    /// Errors shown as an explicit "no data" state rather than a failure.
    pub fn is_empty_state(&self) -> bool {
        matches!(
            self,
            RenderError::SelectionMismatch { .. } | RenderError::Process(ProcessorError::Schema(_))
        )
    }
}

/// Values offered by the year and region selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorOptions {
    /// Most recent first; the first entry is the default.
    pub years: Vec<i32>,
    pub regions: Vec<String>,
}

impl SelectorOptions {
    pub fn default_selection(&self) -> Option<Selection> {
        Some(Selection {
            year: *self.years.first()?,
            region: self.regions.first()?.clone(),
        })
    }
}

/// One user selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub year: i32,
    pub region: String,
}

impl Selection {
    /// File-name friendly `{year}_{region}`; characters other than letters and digits become `_`.
    pub fn file_stem(&self) -> String {
        let region: String = self
            .region
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("{}_{}", self.year, region)
    }
}

/// Everything drawn for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub selection: Selection,
    pub pyramid: PyramidChart,
    pub trend: Option<TrendChart>,
    /// Data-quality notes, e.g. age groups not adding up to the total column.
    pub warnings: Vec<String>,
}

/// Composes the pipeline over a read-only table.
pub struct Dashboard<'a> {
    table: &'a PopulationTable,
    labels: &'a Labels,
    palette: Palette,
}

impl<'a> Dashboard<'a> {
    pub fn new(table: &'a PopulationTable, labels: &'a Labels, palette: Palette) -> Self {
        Self {
            table,
            labels,
            palette,
        }
    }

    pub fn options(&self) -> Result<SelectorOptions, RenderError> {
        Ok(SelectorOptions {
            years: schema::discover_years(&self.table.column_names())?,
            regions: self.table.regions(),
        })
    }

    pub fn render(&self, selection: &Selection, include_trend: bool) -> Result<DashboardView, RenderError> {
        let started = Instant::now();
        let mismatch = || RenderError::SelectionMismatch {
            region: selection.region.clone(),
        };

        let dist = DataProcessor::age_distribution(self.table, &selection.region, selection.year)?
            .ok_or_else(mismatch)?;

        let mut warnings: Vec<String> = dist
            .total_mismatches()
            .into_iter()
            .map(|(sex, summed, reported)| {
                tracing::warn!(
                    region = %selection.region,
                    year = selection.year,
                    sex = %sex,
                    summed,
                    reported,
                    "Age groups do not add up to the total column"
                );
                format!(
                    "{}: {} ≠ {}",
                    self.labels.sex(sex),
                    self.labels.population(summed),
                    self.labels.population(reported)
                )
            })
            .collect();

        // A broken year elsewhere in the table must not hide this pyramid.
        let trend = if include_trend {
            match DataProcessor::trend_series(self.table, &selection.region) {
                Ok(Some(series)) => Some(TrendChart::from_series(&series, self.labels, &self.palette)),
                Ok(None) => return Err(mismatch()),
                Err(e) => {
                    tracing::warn!(region = %selection.region, error = %e, "Yearly trend unavailable");
                    warnings.push(format!("{}: {e}", self.labels.trend_unavailable));
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(
            region = %selection.region,
            year = selection.year,
            elapsed_us = started.elapsed().as_micros() as u64,
            "Rendered selection"
        );

        Ok(DashboardView {
            selection: selection.clone(),
            pyramid: PyramidChart::from_distribution(&dist, self.labels, &self.palette),
            trend,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table() -> PopulationTable {
        let df = df!(
            "행정구역" => ["서울특별시", "부산광역시"],
            "2023년_남_총인구수" => ["10,050", "10"],
            "2023년_남_0~4세" => ["10,000", "3"],
            "2023년_남_100세 이상" => ["50", "4"],
            "2023년_여_총인구수" => ["9,580", "0"],
            "2023년_여_0~4세" => ["9,500", "0"],
            "2023년_여_100세 이상" => ["80", "0"],
            "2022년_남_총인구수" => ["9,000", "8"],
            "2022년_남_0~4세" => ["9,000", "8"],
            "2022년_여_총인구수" => ["8,000", "0"],
            "2022년_여_0~4세" => ["8,000", "0"]
        )
        .unwrap();
        PopulationTable::from_dataframe(df, "행정구역", "memory.csv").unwrap()
    }

    #[test]
    fn options_default_to_latest_year_and_first_region() {
        let t = table();
        let labels = Labels::default();
        let dashboard = Dashboard::new(&t, &labels, Palette::default());
        let options = dashboard.options().unwrap();

        assert_eq!(options.years, vec![2023, 2022]);
        assert_eq!(
            options.default_selection(),
            Some(Selection {
                year: 2023,
                region: "서울특별시".into()
            })
        );
    }

    #[test]
    fn renders_pyramid_and_trend() {
        let t = table();
        let labels = Labels::default();
        let dashboard = Dashboard::new(&t, &labels, Palette::default());
        let selection = Selection {
            year: 2023,
            region: "서울특별시".into(),
        };
        let view = dashboard.render(&selection, true).unwrap();

        assert_eq!(view.pyramid.categories, vec!["0~4세", "100세 이상"]);
        assert_eq!(view.pyramid.male.values, vec![-10_000.0, -50.0]);
        assert_eq!(view.pyramid.male.legend, "남: 10,050명");
        assert_eq!(view.pyramid.female.legend, "여: 9,580명");
        assert!(view.warnings.is_empty());

        let trend = view.trend.unwrap();
        assert_eq!(trend.years, vec![2022, 2023]);
        assert_eq!(trend.male.values, vec![9_000.0, 10_050.0]);
    }

    #[test]
    fn total_mismatch_becomes_warning() {
        let t = table();
        let labels = Labels::default();
        let dashboard = Dashboard::new(&t, &labels, Palette::default());
        let selection = Selection {
            year: 2023,
            region: "부산광역시".into(),
        };
        let view = dashboard.render(&selection, false).unwrap();
        assert!(view.trend.is_none());
        assert_eq!(view.warnings, vec!["남: 7명 ≠ 10명"]);
    }

    #[test]
    fn trend_failure_keeps_pyramid() {
        let df = df!(
            "행정구역" => ["서울특별시"],
            "2023년_남_총인구수" => ["10"],
            "2023년_남_0~4세" => ["10"],
            "2023년_여_총인구수" => ["8"],
            "2023년_여_0~4세" => ["8"],
            "2022년_남_총인구수" => ["9"],
            "2022년_남_0~4세" => ["9"],
            "2022년_여_0~4세" => ["7"]
        )
        .unwrap();
        let t = PopulationTable::from_dataframe(df, "행정구역", "memory.csv").unwrap();
        let labels = Labels::default();
        let dashboard = Dashboard::new(&t, &labels, Palette::default());
        let selection = Selection {
            year: 2023,
            region: "서울특별시".into(),
        };

        let view = dashboard.render(&selection, true).unwrap();
        assert_eq!(view.pyramid.male.values, vec![-10.0]);
        assert!(view.trend.is_none());
        assert_eq!(view.warnings.len(), 1);
        assert!(view.warnings[0].starts_with("연도별 추이를 그릴 수 없습니다: "));
        assert!(view.warnings[0].contains("2022"));
    }

    #[test]
    fn unknown_region_is_empty_state() {
        let t = table();
        let labels = Labels::default();
        let dashboard = Dashboard::new(&t, &labels, Palette::default());
        let err = dashboard
            .render(
                &Selection {
                    year: 2023,
                    region: "세종특별자치시".into(),
                },
                true,
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::SelectionMismatch { .. }));
        assert!(err.is_empty_state());
    }

    #[test]
    fn file_stem_is_path_safe() {
        let selection = Selection {
            year: 2023,
            region: "서울특별시  (1100000000)".into(),
        };
        assert_eq!(selection.file_stem(), "2023_서울특별시___1100000000_");
    }

    #[test]
    fn unknown_year_is_empty_state() {
        let t = table();
        let labels = Labels::default();
        let dashboard = Dashboard::new(&t, &labels, Palette::default());
        let err = dashboard
            .render(
                &Selection {
                    year: 1999,
                    region: "서울특별시".into(),
                },
                false,
            )
            .unwrap_err();
        assert!(err.is_empty_state());
    }
}
