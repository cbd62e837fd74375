//! Population Pyramid Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{Labels, Palette, StaticChartRenderer};
use crate::config::Settings;
use crate::dashboard::Dashboard;
use crate::data::{PopulationTable, TableCache};
use crate::fonts::{self, ResolvedFont};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction, ViewState};
use egui::SidePanel;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;

/// CSV loading result from background thread
enum LoadResult {
    Complete(Arc<PopulationTable>),
    Error(String),
}

/// Main application window.
pub struct PyramidApp {
    settings: Settings,
    labels: Labels,
    palette: Palette,
    font: ResolvedFont,
    table: Option<Arc<PopulationTable>>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl PyramidApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings, font: ResolvedFont) -> Self {
        fonts::install_egui_font(&cc.egui_ctx, &font);

        let labels = Labels::for_locale(settings.display.locale);
        let mut app = Self {
            control_panel: ControlPanel::new(settings.display.show_trend, &labels),
            labels,
            palette: settings.display.palette(),
            chart_viewer: ChartViewer::new(),
            font,
            table: None,
            load_rx: None,
            is_loading: false,
            settings,
        };

        let initial = app.settings.data.csv_path.clone();
        if initial.exists() {
            app.start_load(initial);
        } else {
            let status = app.labels.file_not_found(&initial);
            app.control_panel.set_status(status);
        }
        app
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_load(path);
        }
    }

    /// Load a CSV file in a background thread; the current charts stay visible meanwhile.
    fn start_load(&mut self, path: PathBuf) {
        self.control_panel.csv_path = Some(path.clone());
        self.control_panel.set_status(self.labels.loading.clone());
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let encoding = self.settings.data.encoding.clone();
        let region_column = self.settings.data.region_column.clone();

        thread::spawn(move || {
            let result = match TableCache::global().load(&path, &encoding, &region_column) {
                Ok(table) => LoadResult::Complete(table),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete(table)) => {
                self.is_loading = false;
                self.control_panel
                    .set_status(self.labels.loaded(table.row_count(), table.dataframe().width()));
                self.table = Some(table);
                self.refresh_options();
            }
            Ok(LoadResult::Error(error)) => {
                self.is_loading = false;
                tracing::error!(%error, "Failed to load population table");
                self.control_panel
                    .set_error(format!("{}: {error}", self.labels.load_error));
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.is_loading = false;
                tracing::error!("Loader thread stopped without a result");
                self.control_panel.set_error(self.labels.load_error.clone());
            }
        }
    }

    /// Rebuild selector options for the current table, then render.
    fn refresh_options(&mut self) {
        let Some(table) = self.table.clone() else {
            return;
        };

        let dashboard = Dashboard::new(&table, &self.labels, self.palette);
        match dashboard.options() {
            Ok(options) => {
                self.control_panel.update_options(options);
                self.render_selection();
            }
            Err(e) => {
                self.control_panel.export_enabled = false;
                self.chart_viewer.state = ViewState::Empty(e.to_string());
            }
        }
    }

    /// Run the pipeline for the current selection.
    fn render_selection(&mut self) {
        let (Some(table), Some(selection)) = (self.table.clone(), self.control_panel.selection())
        else {
            return;
        };

        let dashboard = Dashboard::new(&table, &self.labels, self.palette);
        match dashboard.render(&selection, self.control_panel.show_trend) {
            Ok(view) => {
                self.chart_viewer.set_view(view);
                self.control_panel.export_enabled = true;
            }
            Err(e) if e.is_empty_state() => {
                tracing::info!(error = %e, "No data for selection");
                self.chart_viewer.state = ViewState::Empty(e.to_string());
                self.control_panel.export_enabled = false;
            }
            Err(e) => {
                tracing::error!(error = %e, "Render failed");
                self.chart_viewer.state = ViewState::Failed(e.to_string());
                self.control_panel.export_enabled = false;
            }
        }
    }

    fn renderer(&self) -> StaticChartRenderer {
        StaticChartRenderer::new(1200, 900, &self.font)
    }

    /// Export the displayed charts as PNG files into a chosen folder.
    fn handle_export(&mut self) {
        let Some(view) = self.chart_viewer.view().cloned() else {
            self.control_panel.set_error(self.labels.no_charts.clone());
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let renderer = self.renderer();
        let stem = view.selection.file_stem();
        let pyramid_path = dir.join(format!("pyramid_{stem}.png"));

        let result = renderer
            .export_pyramid(&view.pyramid, &pyramid_path)
            .and_then(|()| match &view.trend {
                Some(trend) => renderer.export_trend(trend, &dir.join(format!("trend_{stem}.png"))),
                None => Ok(()),
            });

        match result {
            Ok(()) => {
                self.control_panel.set_status(self.labels.exported_to(&dir));
                Self::open_exported(&pyramid_path);
            }
            Err(e) => self
                .control_panel
                .set_error(format!("{}: {e}", self.labels.export_error)),
        }
    }

    fn open_exported(path: &Path) {
        if let Err(e) = open::that(path) {
            tracing::warn!(path = %path.display(), error = %e, "Could not open exported chart");
        }
    }
}

impl eframe::App for PyramidApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui, &self.labels);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::SelectionChanged => self.render_selection(),
                        ControlPanelAction::ExportCharts => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui, &self.labels.no_data);
        });
    }
}
