//! Chart Plotter Module
//! Draws pyramid and trend chart specifications with egui_plot.

use crate::charts::model::{PyramidChart, SeriesColor, TrendChart};
use crate::data::processor::format_thousands;
use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points, VLine};

const BAR_WIDTH: f64 = 0.8;

pub fn color32(color: SeriesColor) -> Color32 {
    Color32::from_rgb(color.0, color.1, color.2)
}

/// Tick label for a population axis value; the pyramid's left side shows magnitudes.
fn population_tick(value: f64) -> String {
    if value.fract().abs() > f64::EPSILON {
        return String::new();
    }
    format_thousands(value.abs() as u64)
}

/// Creates the interactive dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw the population pyramid.
    /// Y-axis: age groups, X-axis: signed population
    pub fn draw_pyramid(ui: &mut egui::Ui, chart: &PyramidChart, height: f32) {
        let categories = chart.categories.clone();
        let limit = chart.max_magnitude().max(1.0) * 1.05;

        let bars = |values: &[f64], color: Color32| -> Vec<Bar> {
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    Bar::new(i as f64, v)
                        .width(BAR_WIDTH)
                        .fill(color)
                        .name(&categories[i])
                })
                .collect()
        };
        let male_bars = bars(&chart.male.values, color32(chart.male.color));
        let female_bars = bars(&chart.female.values, color32(chart.female.color));

        Plot::new(format!("pyramid_{}", chart.title))
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_x(-limit)
            .include_x(limit)
            .x_axis_label(chart.value_axis.clone())
            .x_axis_formatter(|mark, _range| population_tick(mark.value))
            .y_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                categories.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(male_bars)
                        .horizontal()
                        .color(color32(chart.male.color))
                        .name(&chart.male.legend),
                );
                plot_ui.bar_chart(
                    BarChart::new(female_bars)
                        .horizontal()
                        .color(color32(chart.female.color))
                        .name(&chart.female.legend),
                );
                plot_ui.vline(
                    VLine::new(0.0)
                        .color(color32(chart.reference_color))
                        .width(0.8),
                );
            });
    }

    /// Draw total population per year, one line per sex.
    pub fn draw_trend(ui: &mut egui::Ui, chart: &TrendChart, height: f32) {
        let years = chart.years.clone();

        Plot::new(format!("trend_{}", chart.title))
            .height(height)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_y(0.0)
            .include_y(chart.max_value() * 1.1)
            .x_axis_label(chart.x_axis.clone())
            .y_axis_label(chart.y_axis.clone())
            .x_axis_formatter(move |mark, _range| {
                let year = mark.value.round();
                if (mark.value - year).abs() > 1e-6 || !years.contains(&(year as i32)) {
                    return String::new();
                }
                format!("{}", year as i32)
            })
            .y_axis_formatter(|mark, _range| population_tick(mark.value))
            .show(ui, |plot_ui| {
                for series in [&chart.male, &chart.female] {
                    let color = color32(series.color);
                    let points: Vec<[f64; 2]> = chart
                        .years
                        .iter()
                        .zip(series.values.iter())
                        .map(|(&year, &value)| [f64::from(year), value])
                        .collect();

                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(points.iter().copied()))
                            .color(color)
                            .width(2.0)
                            .name(&series.legend),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(points.iter().copied()))
                            .radius(3.0)
                            .color(color),
                    );
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_show_magnitudes() {
        assert_eq!(population_tick(-10_000.0), "10,000");
        assert_eq!(population_tick(2_500.0), "2,500");
        assert_eq!(population_tick(0.5), "");
    }

    #[test]
    fn series_color_conversion() {
        assert_eq!(color32(SeriesColor(1, 2, 3)), Color32::from_rgb(1, 2, 3));
    }
}
