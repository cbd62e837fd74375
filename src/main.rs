//! Population Pyramid - interactive dashboard and headless chart export.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use eframe::egui;
use population_pyramid::charts::{Labels, Locale, StaticChartRenderer};
use population_pyramid::config::{Settings, DEFAULT_CONFIG_FILE};
use population_pyramid::dashboard::{Dashboard, Selection};
use population_pyramid::data::{PopulationTable, TableCache};
use population_pyramid::fonts::{DirectoryFontSource, FontRegistry, ResolvedFont};
use population_pyramid::gui::PyramidApp;
use population_pyramid::logging;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "population_pyramid", version, about = "Population pyramid dashboard for demographic CSV files")]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Population CSV file
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Text encoding of the CSV file (e.g. euc-kr, utf-8)
    #[arg(long, global = true)]
    encoding: Option<String>,

    /// Font family or font file used for chart text
    #[arg(long, global = true)]
    font: Option<String>,

    /// Label language: ko, en or ko-en
    #[arg(long, global = true)]
    locale: Option<Locale>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the interactive dashboard (default)
    Gui,
    /// Print the years and regions found in the CSV file
    Inspect,
    /// Render charts for one selection to image files
    Export {
        /// Year to chart; defaults to the most recent year
        #[arg(long)]
        year: Option<i32>,
        /// Region to chart; defaults to the first region
        #[arg(long)]
        region: Option<String>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = Format::Png)]
        format: Format,
        /// Skip the yearly trend chart
        #[arg(long)]
        no_trend: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Svg,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Svg => "svg",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load settings from {}", cli.config.display()))?;
    apply_overrides(&mut settings, &cli);

    logging::init_tracing(&settings.logging.level);

    let font = resolve_font(&settings);

    match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => run_gui(settings, font),
        Command::Inspect => inspect(&settings),
        Command::Export {
            year,
            region,
            out,
            format,
            no_trend,
        } => export(&settings, &font, year, region, &out, format, !no_trend),
    }
}

fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(csv) = &cli.csv {
        settings.data.csv_path = csv.clone();
    }
    if let Some(encoding) = &cli.encoding {
        settings.data.encoding = encoding.clone();
    }
    if let Some(locale) = cli.locale {
        settings.display.locale = locale;
    }
    if let Some(font) = &cli.font {
        let path = PathBuf::from(font);
        if path.is_file() {
            settings.display.font_path = Some(path);
        } else {
            settings.display.font_family = font.clone();
            settings.display.font_path = None;
        }
    }
}

fn resolve_font(settings: &Settings) -> ResolvedFont {
    let source = DirectoryFontSource::with_platform_dirs(&settings.display.font_dirs);
    FontRegistry::new(source).resolve(
        &settings.display.font_family,
        settings.display.font_path.as_deref(),
    )
}

fn load(settings: &Settings) -> Result<Arc<PopulationTable>> {
    let data = &settings.data;
    TableCache::global()
        .load(&data.csv_path, &data.encoding, &data.region_column)
        .with_context(|| format!("Failed to load {}", data.csv_path.display()))
}

fn run_gui(settings: Settings, font: ResolvedFont) -> Result<()> {
    let title = Labels::for_locale(settings.display.locale).app_title;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 700.0])
            .with_title(title.clone()),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| Ok(Box::new(PyramidApp::new(cc, settings, font)))),
    )
    .map_err(|e| anyhow::anyhow!("Dashboard failed: {e}"))
}

fn inspect(settings: &Settings) -> Result<()> {
    let table = load(settings)?;
    let labels = Labels::for_locale(settings.display.locale);
    let options = Dashboard::new(&table, &labels, settings.display.palette()).options()?;

    println!("File:    {}", table.source().display());
    println!("Rows:    {}", table.row_count());
    println!(
        "Years:   {}",
        options
            .years
            .iter()
            .map(i32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Regions: {}", options.regions.len());
    for region in &options.regions {
        println!("  {region}");
    }
    Ok(())
}

fn export(
    settings: &Settings,
    font: &ResolvedFont,
    year: Option<i32>,
    region: Option<String>,
    out: &Path,
    format: Format,
    include_trend: bool,
) -> Result<()> {
    let table = load(settings)?;
    let labels = Labels::for_locale(settings.display.locale);
    let dashboard = Dashboard::new(&table, &labels, settings.display.palette());
    let options = dashboard.options()?;

    let Some(default) = options.default_selection() else {
        bail!("{} has no regions", table.source().display());
    };
    let selection = Selection {
        year: year.unwrap_or(default.year),
        region: region.unwrap_or(default.region),
    };

    let view = dashboard
        .render(&selection, include_trend)
        .with_context(|| format!("No chart for {} {}", selection.region, selection.year))?;
    for warning in &view.warnings {
        eprintln!("warning: {warning}");
    }

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let renderer = StaticChartRenderer::new(1200, 900, font);
    let stem = selection.file_stem();
    let ext = format.extension();

    let pyramid_path = out.join(format!("pyramid_{stem}.{ext}"));
    renderer.export_pyramid(&view.pyramid, &pyramid_path)?;
    println!("{}", pyramid_path.display());

    if let Some(trend) = &view.trend {
        let trend_path = out.join(format!("trend_{stem}.{ext}"));
        renderer.export_trend(trend, &trend_path)?;
        println!("{}", trend_path.display());
    }
    Ok(())
}
