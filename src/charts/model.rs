//! Chart specifications handed to the interactive plotter and static renderer.

use crate::charts::labels::Labels;
use crate::data::{AgeDistribution, Sex, TrendSeries};
use serde::{Deserialize, Serialize};

/// RGB color of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesColor(pub u8, pub u8, pub u8);

impl SeriesColor {
    pub const BLUE: SeriesColor = SeriesColor(52, 152, 219);
    pub const RED: SeriesColor = SeriesColor(231, 76, 60);
    pub const GREY: SeriesColor = SeriesColor(128, 128, 128);
}

/// Colors per sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub male: SeriesColor,
    pub female: SeriesColor,
    pub reference: SeriesColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            male: SeriesColor::BLUE,
            female: SeriesColor::RED,
            reference: SeriesColor::GREY,
        }
    }
}

/// One named series of a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub legend: String,
    pub color: SeriesColor,
    pub values: Vec<f64>,
}

/// Horizontal bar chart with males left of zero and females right of it.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidChart {
    pub title: String,
    pub value_axis: String,
    /// Age groups, bottom to top.
    pub categories: Vec<String>,
    /// Negated magnitudes.
    pub male: Series,
    pub female: Series,
    pub total_legend: String,
    pub reference_color: SeriesColor,
}

impl PyramidChart {
    pub fn from_distribution(dist: &AgeDistribution, labels: &Labels, palette: &Palette) -> Self {
        let values = |sex: Sex, sign: f64| -> Vec<f64> {
            dist.counts
                .get(sex)
                .iter()
                .map(|&v| sign * v as f64)
                .collect()
        };

        Self {
            title: labels.pyramid_title(&dist.region, dist.year),
            value_axis: labels.population_axis.clone(),
            categories: dist.age_groups.clone(),
            male: Series {
                legend: labels.legend(Sex::Male, dist.total(Sex::Male)),
                color: palette.male,
                values: values(Sex::Male, -1.0),
            },
            female: Series {
                legend: labels.legend(Sex::Female, dist.total(Sex::Female)),
                color: palette.female,
                values: values(Sex::Female, 1.0),
            },
            total_legend: labels.combined_legend(dist.combined_total()),
            reference_color: palette.reference,
        }
    }

    /// Largest bar length on either side, for a symmetric value axis.
    pub fn max_magnitude(&self) -> f64 {
        self.male
            .values
            .iter()
            .chain(&self.female.values)
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

/// Total population per year, one line per sex.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendChart {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub years: Vec<i32>,
    pub male: Series,
    pub female: Series,
}

impl TrendChart {
    pub fn from_series(trend: &TrendSeries, labels: &Labels, palette: &Palette) -> Self {
        let series = |sex: Sex, color: SeriesColor| Series {
            legend: labels.sex(sex).to_string(),
            color,
            values: trend.totals.get(sex).iter().map(|&v| v as f64).collect(),
        };

        Self {
            title: labels.trend_title(&trend.region),
            x_axis: labels.year_axis.clone(),
            y_axis: labels.population_axis.clone(),
            years: trend.years.clone(),
            male: series(Sex::Male, palette.male),
            female: series(Sex::Female, palette.female),
        }
    }

    pub fn max_value(&self) -> f64 {
        self.male
            .values
            .iter()
            .chain(&self.female.values)
            .fold(0.0_f64, |acc, &v| acc.max(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::BySex;

    fn seoul() -> AgeDistribution {
        AgeDistribution {
            region: "서울특별시".into(),
            year: 2023,
            age_groups: vec!["0~4세".into(), "100세 이상".into()],
            counts: BySex::new(vec![10_000, 50], vec![9_500, 80]),
            reported_totals: BySex::new(None, None),
        }
    }

    #[test]
    fn pyramid_negates_male_bars() {
        let chart = PyramidChart::from_distribution(&seoul(), &Labels::default(), &Palette::default());

        assert_eq!(chart.categories, vec!["0~4세", "100세 이상"]);
        assert_eq!(chart.male.values, vec![-10_000.0, -50.0]);
        assert_eq!(chart.female.values, vec![9_500.0, 80.0]);
        assert_eq!(chart.male.legend, "남: 10,050명");
        assert_eq!(chart.female.legend, "여: 9,580명");
        assert_eq!(chart.total_legend, "총: 19,630명");
        assert_eq!(chart.max_magnitude(), 10_000.0);
    }

    #[test]
    fn trend_keeps_year_order() {
        let trend = TrendSeries {
            region: "서울특별시".into(),
            years: vec![2021, 2022, 2023],
            totals: BySex::new(vec![100, 110, 120], vec![90, 95, 99]),
        };
        let chart = TrendChart::from_series(&trend, &Labels::default(), &Palette::default());

        assert_eq!(chart.years, vec![2021, 2022, 2023]);
        assert_eq!(chart.male.values, vec![100.0, 110.0, 120.0]);
        assert_eq!(chart.female.legend, "여");
        assert_eq!(chart.max_value(), 120.0);
    }
}
