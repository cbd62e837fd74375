//! Control Panel Widget
//! Left side panel with the data source, year/region selectors and export.

use crate::charts::Labels;
use crate::dashboard::{SelectorOptions, Selection};
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Actions triggered by the control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    SelectionChanged,
    ExportCharts,
}

/// Left side control panel with file selection and selectors.
pub struct ControlPanel {
    pub csv_path: Option<PathBuf>,
    pub options: SelectorOptions,
    pub year: Option<i32>,
    pub region: Option<String>,
    pub show_trend: bool,
    pub status: String,
    pub status_is_error: bool,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(show_trend: bool, labels: &Labels) -> Self {
        Self {
            csv_path: None,
            options: SelectorOptions {
                years: Vec::new(),
                regions: Vec::new(),
            },
            year: None,
            region: None,
            show_trend,
            status: labels.ready.clone(),
            status_is_error: false,
            export_enabled: false,
        }
    }

    /// Replace selector options after a table load, keeping a still-valid selection.
    pub fn update_options(&mut self, options: SelectorOptions) {
        let default = options.default_selection();
        if !self.year.is_some_and(|y| options.years.contains(&y)) {
            self.year = default.as_ref().map(|s| s.year);
        }
        if !self
            .region
            .as_ref()
            .is_some_and(|r| options.regions.contains(r))
        {
            self.region = default.map(|s| s.region);
        }
        self.options = options;
    }

    pub fn selection(&self) -> Option<Selection> {
        Some(Selection {
            year: self.year?,
            region: self.region.clone()?,
        })
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = false;
    }

    pub fn set_error(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.status_is_error = true;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, labels: &Labels) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new(&labels.app_title)
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new(&labels.data_source).size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| labels.no_file.clone());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.csv_path.is_some() {
                            ui.visuals().text_color()
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(&labels.browse).clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Selection Section =====
        let mut changed = false;

        ui.label(RichText::new(&labels.year_prompt).size(14.0).strong());
        ComboBox::from_id_salt("year_select")
            .width(ui.available_width() - 10.0)
            .selected_text(self.year.map(|y| y.to_string()).unwrap_or_default())
            .show_ui(ui, |ui| {
                for &year in &self.options.years {
                    changed |= ui
                        .selectable_value(&mut self.year, Some(year), year.to_string())
                        .changed();
                }
            });

        ui.add_space(10.0);

        ui.label(RichText::new(&labels.region_prompt).size(14.0).strong());
        ComboBox::from_id_salt("region_select")
            .width(ui.available_width() - 10.0)
            .selected_text(self.region.clone().unwrap_or_default())
            .show_ui(ui, |ui| {
                egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
                    for region in &self.options.regions {
                        changed |= ui
                            .selectable_value(&mut self.region, Some(region.clone()), region)
                            .changed();
                    }
                });
            });

        ui.add_space(10.0);
        changed |= ui
            .checkbox(&mut self.show_trend, &labels.show_trend)
            .changed();

        if changed {
            action = ControlPanelAction::SelectionChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Section =====
        ui.add_enabled_ui(self.export_enabled, |ui| {
            if ui
                .add_sized([ui.available_width(), 32.0], egui::Button::new(&labels.export_button))
                .clicked()
            {
                action = ControlPanelAction::ExportCharts;
            }
        });

        ui.add_space(10.0);

        let status_color = if self.status_is_error {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(12.0).color(status_color));

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::Locale;

    fn options(years: &[i32], regions: &[&str]) -> SelectorOptions {
        SelectorOptions {
            years: years.to_vec(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn first_load_selects_defaults() {
        let mut panel = ControlPanel::new(true, &Labels::default());
        panel.update_options(options(&[2023, 2022], &["서울특별시", "부산광역시"]));
        assert_eq!(
            panel.selection(),
            Some(Selection {
                year: 2023,
                region: "서울특별시".into()
            })
        );
    }

    #[test]
    fn status_starts_in_panel_locale() {
        let korean = ControlPanel::new(true, &Labels::for_locale(Locale::Korean));
        assert_eq!(korean.status, "준비");
        let english = ControlPanel::new(false, &Labels::for_locale(Locale::English));
        assert_eq!(english.status, "Ready");
        assert!(!english.show_trend);
    }

    #[test]
    fn reload_keeps_valid_selection() {
        let mut panel = ControlPanel::new(true, &Labels::default());
        panel.year = Some(2022);
        panel.region = Some("부산광역시".into());
        panel.update_options(options(&[2023, 2022], &["서울특별시", "부산광역시"]));
        assert_eq!(panel.year, Some(2022));
        assert_eq!(panel.region.as_deref(), Some("부산광역시"));

        panel.update_options(options(&[2024], &["대구광역시"]));
        assert_eq!(panel.year, Some(2024));
        assert_eq!(panel.region.as_deref(), Some("대구광역시"));
    }
}
