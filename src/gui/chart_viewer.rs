//! Chart Viewer Widget
//! Central panel showing the pyramid above the yearly trend, or an empty/error state.

use crate::charts::ChartPlotter;
use crate::dashboard::DashboardView;
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const PYRAMID_HEIGHT: f32 = 520.0;
const TREND_HEIGHT: f32 = 300.0;

/// What the central panel currently shows.
#[derive(Debug, Clone, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Ready(Box<DashboardView>),
    Empty(String),
    Failed(String),
}

/// Scrollable chart display area.
#[derive(Default)]
pub struct ChartViewer {
    pub state: ViewState,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the displayed view.
    pub fn set_view(&mut self, view: DashboardView) {
        self.state = ViewState::Ready(Box::new(view));
    }

    pub fn view(&self) -> Option<&DashboardView> {
        match &self.state {
            ViewState::Ready(view) => Some(view),
            _ => None,
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui, no_data_text: &str) {
        let view = match &self.state {
            ViewState::Idle => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new(no_data_text).size(20.0));
                });
                return;
            }
            ViewState::Empty(reason) => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new(format!("{no_data_text}\n{reason}")).size(18.0));
                });
                return;
            }
            ViewState::Failed(error) => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new(format!("⚠ {error}"))
                            .size(16.0)
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                });
                return;
            }
            ViewState::Ready(view) => view,
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                Self::draw_card(ui, &view.pyramid.title, |ui| {
                    ui.label(RichText::new(&view.pyramid.total_legend).size(13.0));
                    for warning in &view.warnings {
                        ui.label(
                            RichText::new(format!("⚠ {warning}"))
                                .size(12.0)
                                .color(Color32::from_rgb(243, 156, 18)),
                        );
                    }
                    ChartPlotter::draw_pyramid(ui, &view.pyramid, PYRAMID_HEIGHT);
                });

                if let Some(trend) = &view.trend {
                    ui.add_space(CHART_SPACING);
                    Self::draw_card(ui, &trend.title, |ui| {
                        ChartPlotter::draw_trend(ui, trend, TREND_HEIGHT);
                    });
                }
            });
    }

    fn draw_card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(RichText::new(title).size(18.0).strong());
                    ui.add_space(8.0);
                    add_contents(ui);
                });
            });
    }
}
