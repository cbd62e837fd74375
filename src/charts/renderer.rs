//! Static Chart Renderer
//! Writes pyramid and trend charts to PNG or SVG files with plotters, drawing
//! text with the glyphs of the resolved font file.
//!
//! Layout of the pyramid image:
//! 1. Title: "{region} {year}" caption centered
//! 2. Bars: males left of zero, females right, grey reference line at zero
//! 3. Legend (upper right): per-sex totals, then the combined total

use crate::charts::model::{PyramidChart, SeriesColor, TrendChart};
use crate::data::processor::format_thousands;
use crate::fonts::ResolvedFont;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported image format '{0}' (expected png or svg)")]
    UnsupportedFormat(String),
    #[error("No font available for chart text")]
    NoFont,
    #[error("'{0}' is not a usable font file")]
    InvalidFont(String),
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

type DrawResult = Result<(), Box<dyn Error>>;

/// Registration outcome per family; plotters keeps registered bytes for the process lifetime.
static REGISTERED_FONTS: Lazy<Mutex<HashMap<String, bool>>> = Lazy::new(Default::default);

/// Make the resolved font's glyphs drawable under its family name.
fn register_chart_font(font: &ResolvedFont) -> Result<(), ExportError> {
    let Some(data) = &font.data else {
        return Err(ExportError::NoFont);
    };

    let mut registered = REGISTERED_FONTS.lock();
    let ok = match registered.get(&font.family) {
        Some(&ok) => ok,
        None => {
            let bytes: &'static [u8] = Box::leak(data.as_slice().to_vec().into_boxed_slice());
            let ok = register_font(&font.family, FontStyle::Normal, bytes).is_ok();
            registered.insert(font.family.clone(), ok);
            ok
        }
    };

    if ok {
        Ok(())
    } else {
        Err(ExportError::InvalidFont(font.family.clone()))
    }
}

fn rgb(color: SeriesColor) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

#[derive(Clone, Copy)]
enum ChartTarget<'a> {
    Pyramid(&'a PyramidChart),
    Trend(&'a TrendChart),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageFormat {
    Png,
    Svg,
}

impl ImageFormat {
    fn of(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(ImageFormat::Png),
            "svg" => Ok(ImageFormat::Svg),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

pub struct StaticChartRenderer {
    pub width: u32,
    pub height: u32,
    font_family: Option<String>,
}

impl StaticChartRenderer {
    /// Registers the font's bytes with plotters. A font without usable glyph
    /// data leaves the renderer unable to draw text, and every export then
    /// fails with `ExportError::NoFont` or `ExportError::InvalidFont`.
    pub fn new(width: u32, height: u32, font: &ResolvedFont) -> Self {
        let font_family = match register_chart_font(font) {
            Ok(()) => Some(font.family.clone()),
            Err(e) => {
                tracing::warn!(family = %font.family, error = %e, "Chart font unavailable");
                None
            }
        };
        Self {
            width,
            height,
            font_family,
        }
    }

    /// Family the charts are drawn with, if one could be registered.
    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }

    pub fn export_pyramid(&self, chart: &PyramidChart, path: &Path) -> Result<(), ExportError> {
        self.export(path, ChartTarget::Pyramid(chart))
    }

    pub fn export_trend(&self, chart: &TrendChart, path: &Path) -> Result<(), ExportError> {
        self.export(path, ChartTarget::Trend(chart))
    }

    fn export(&self, path: &Path, target: ChartTarget) -> Result<(), ExportError> {
        let format = ImageFormat::of(path)?;
        let family = self.font_family.as_deref().ok_or(ExportError::NoFont)?;
        let size = (self.width, self.height);

        let draw = || -> DrawResult {
            match format {
                ImageFormat::Png => {
                    let root = BitMapBackend::new(path, size).into_drawing_area();
                    Self::draw_target(&root, target, family)?;
                    root.present()?;
                }
                ImageFormat::Svg => {
                    let root = SVGBackend::new(path, size).into_drawing_area();
                    Self::draw_target(&root, target, family)?;
                    root.present()?;
                }
            }
            Ok(())
        };
        draw().map_err(|e| ExportError::Draw(e.to_string()))?;

        tracing::info!(path = %path.display(), family, "Exported chart");
        Ok(())
    }

    fn draw_target<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        target: ChartTarget,
        family: &str,
    ) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        match target {
            ChartTarget::Pyramid(chart) => Self::draw_pyramid(root, chart, family),
            ChartTarget::Trend(chart) => Self::draw_trend(root, chart, family),
        }
    }

    fn draw_pyramid<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &PyramidChart,
        family: &str,
    ) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let n = chart.categories.len();
        let limit = chart.max_magnitude().max(1.0) * 1.05;
        let top = n as f64 - 0.5;
        let categories = &chart.categories;

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (family, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d(-limit..limit, -0.5..top)?;

        ctx.configure_mesh()
            .disable_y_mesh()
            .y_labels(n.max(1))
            .y_label_formatter(&|y| {
                let idx = y.round();
                if (y - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                categories.get(idx as usize).cloned().unwrap_or_default()
            })
            .x_label_formatter(&|x| format_thousands(x.abs().round() as u64))
            .x_desc(chart.value_axis.as_str())
            .label_style((family, 14))
            .axis_desc_style((family, 16))
            .draw()?;

        for series in [&chart.male, &chart.female] {
            let color = rgb(series.color);
            ctx.draw_series(series.values.iter().enumerate().map(|(i, &v)| {
                let y = i as f64;
                let (left, right) = if v < 0.0 { (v, 0.0) } else { (0.0, v) };
                Rectangle::new([(left, y - 0.4), (right, y + 0.4)], color.filled())
            }))?
            .label(series.legend.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 14, y + 6)], color.filled()));
        }

        let reference = rgb(chart.reference_color);
        ctx.draw_series(LineSeries::new(vec![(0.0, -0.5), (0.0, top)], reference.stroke_width(1)))?
            .label(chart.total_legend.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 14, y)], reference.stroke_width(1)));

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font((family, 14))
            .draw()?;

        Ok(())
    }

    fn draw_trend<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        chart: &TrendChart,
        family: &str,
    ) -> DrawResult
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let first = chart.years.first().copied().unwrap_or(0);
        let last = chart.years.last().copied().unwrap_or(first);
        let y_max = chart.max_value().max(1.0) * 1.1;

        let mut ctx = ChartBuilder::on(root)
            .caption(&chart.title, (family, 28))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(110)
            .build_cartesian_2d((first - 1)..(last + 1), 0.0..y_max)?;

        ctx.configure_mesh()
            .x_labels(chart.years.len().max(1) + 2)
            .x_label_formatter(&|x| x.to_string())
            .y_label_formatter(&|y| format_thousands(y.max(0.0).round() as u64))
            .x_desc(chart.x_axis.as_str())
            .y_desc(chart.y_axis.as_str())
            .label_style((family, 14))
            .axis_desc_style((family, 16))
            .draw()?;

        for series in [&chart.male, &chart.female] {
            let color = rgb(series.color);
            let points: Vec<(i32, f64)> = chart
                .years
                .iter()
                .copied()
                .zip(series.values.iter().copied())
                .collect();

            ctx.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                .label(series.legend.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 14, y)], color.stroke_width(2)));
            ctx.draw_series(
                points
                    .into_iter()
                    .map(|p| Circle::new(p, 4, color.filled())),
            )?;
        }

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.85))
            .border_style(&BLACK)
            .label_font((family, 14))
            .draw()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Labels, Locale, Palette};
    use crate::data::{BySex, TrendSeries};
    use crate::fonts::{DirectoryFontSource, FontRegistry};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn trend_chart() -> TrendChart {
        let trend = TrendSeries {
            region: "Seoul".into(),
            years: vec![2021, 2022, 2023],
            totals: BySex::new(vec![100, 110, 120], vec![90, 95, 99]),
        };
        TrendChart::from_series(&trend, &Labels::for_locale(Locale::English), &Palette::default())
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ImageFormat::of(Path::new("a/pyramid.PNG")).unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::of(Path::new("trend.svg")).unwrap(), ImageFormat::Svg);
        assert!(matches!(
            ImageFormat::of(Path::new("chart.pdf")),
            Err(ExportError::UnsupportedFormat(ext)) if ext == "pdf"
        ));
    }

    #[test]
    fn font_without_data_cannot_export() {
        let renderer = StaticChartRenderer::new(320, 240, &ResolvedFont::default());
        assert_eq!(renderer.font_family(), None);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trend.png");
        assert!(matches!(
            renderer.export_trend(&trend_chart(), &path),
            Err(ExportError::NoFont)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let font = ResolvedFont {
            family: "NotAFont".into(),
            path: None,
            data: Some(Arc::new(b"glyphs".to_vec())),
        };
        assert!(matches!(
            register_chart_font(&font),
            Err(ExportError::InvalidFont(family)) if family == "NotAFont"
        ));
        assert_eq!(StaticChartRenderer::new(320, 240, &font).font_family(), None);
    }

    #[test]
    fn exports_with_resolved_font_bytes() {
        let registry = FontRegistry::new(DirectoryFontSource::with_platform_dirs(&[]));
        let font = registry.resolve("DejaVu Sans", None);
        if font.is_fallback() {
            // No system font to draw with.
            return;
        }

        let renderer = StaticChartRenderer::new(320, 240, &font);
        let Some(family) = renderer.font_family() else {
            // Collections or formats the glyph rasterizer rejects.
            return;
        };
        assert_eq!(family, font.family);

        let dir = TempDir::new().unwrap();
        for name in ["trend.png", "trend.svg"] {
            let path = dir.path().join(name);
            renderer.export_trend(&trend_chart(), &path).unwrap();
            assert!(std::fs::metadata(&path).unwrap().len() > 0);
        }
    }
}
