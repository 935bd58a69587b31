//! Section rendering (sidebar, home, models, settings)

use super::App;
use crate::constants::*;
use crate::preferences::{PreferenceChange, Theme};
use crate::render::{Card, Stat};
use crate::router::Section;
use crate::theme;
use crate::types::DownloadStatus;
use crate::ui::components::{self, CardAction};
use eframe::egui;
use egui_phosphor::regular as icons;

impl App {
    pub fn render_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("nav_panel")
            .exact_width(theme::SIDEBAR_WIDTH)
            .resizable(false)
            .show_separator_line(false)
            .frame(theme::sidebar_frame(&self.appearance))
            .show(ctx, |ui| {
                ui.add_space(theme::SPACING_MD);
                ui.label(
                    egui::RichText::new(TITLE_PREFIX)
                        .size(self.appearance.font_size * 1.8)
                        .strong()
                        .color(self.appearance.accent),
                );
                ui.add_space(theme::SPACING_XL);

                let mut clicked = None;
                let language = self.language().to_string();
                for section in Section::ALL {
                    let active = self.view.is_nav_active(section);
                    let label = section.label(&language);
                    if components::nav_entry(ui, &self.appearance, section, label, active) {
                        clicked = Some(section);
                    }
                }
                if let Some(section) = clicked {
                    self.navigate(ctx, section);
                }

                ui.add_space(theme::SPACING_LG);
                ui.horizontal(|ui| {
                    let router = self.site.router();
                    let back = ui.add_enabled(
                        router.can_go_back(),
                        theme::button(&self.appearance, icons::ARROW_LEFT),
                    );
                    let forward = ui.add_enabled(
                        router.can_go_forward(),
                        theme::button(&self.appearance, icons::ARROW_RIGHT),
                    );
                    if back.clicked() {
                        self.go_back(ctx);
                    }
                    if forward.clicked() {
                        self.go_forward(ctx);
                    }
                });

                ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                    ui.add_space(theme::SPACING_MD);
                    let version = ui.add(
                        egui::Label::new(
                            egui::RichText::new(format!("v{}", APP_VERSION))
                                .small()
                                .color(self.appearance.palette().text_muted),
                        )
                        .sense(egui::Sense::click()),
                    );
                    if version.clicked() && self.site.secret_click() {
                        self.show_easter_egg = true;
                    }
                });
            });
    }

    /// Browser-style location field showing the current fragment
    pub fn render_location_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(icons::HASH).color(self.appearance.palette().text_muted));
            let field = ui.add(
                egui::TextEdit::singleline(&mut self.location_input)
                    .desired_width(240.0)
                    .hint_text("#home"),
            );
            if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                let fragment = self.location_input.clone();
                self.open_fragment(ctx, &fragment);
            }
        });
        ui.add_space(theme::SPACING_LG);
    }

    pub fn render_active_section(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        match self.view.active_section() {
            Some(Section::Home) | None => self.render_home(ui),
            Some(Section::Models) => self.render_models(ui, ctx),
            Some(Section::Settings) => self.render_settings(ui, ctx),
        }
    }

    fn render_home(&mut self, ui: &mut egui::Ui) {
        ui.heading("Roblox Scripts & Models");
        ui.label(
            egui::RichText::new("Worlds and systems ready to drop into your projects.")
                .color(self.appearance.palette().text_muted),
        );
        ui.add_space(theme::SPACING_XL);

        let tiles = [
            (icons::PACKAGE, "Total models", Stat::TotalItems),
            (icons::HARD_DRIVES, "Total size", Stat::TotalSize),
            (icons::DOWNLOAD_SIMPLE, "Total downloads", Stat::TotalDownloads),
            (icons::TROPHY, "Most downloaded", Stat::TopItem),
            (icons::CALENDAR_BLANK, "Last update", Stat::LastUpdate),
        ];
        ui.horizontal_wrapped(|ui| {
            for (icon, label, stat) in tiles {
                components::stat_tile(ui, &self.appearance, icon, label, self.view.stat(stat));
            }
        });
    }

    fn render_models(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.heading(Section::Models.label(self.language()));
            if self.site.size_batch_pending() {
                ui.spinner();
            }
        });
        ui.add_space(theme::SPACING_LG);

        let mut actions = Vec::new();
        egui::ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                for card in &self.view.cards {
                    match card {
                        Card::Item(view) => {
                            let downloading = self.is_downloading(view.item_id);
                            let action =
                                components::item_card(ui, &self.appearance, view, downloading);
                            if action != CardAction::None {
                                actions.push((view.item_id, action));
                            }
                        }
                        Card::Placeholder(text) => {
                            components::empty_state(ui, &self.appearance, text)
                        }
                    }
                }
            });

            let rows = self.download_rows();
            if !rows.is_empty() {
                ui.add_space(theme::SPACING_XL);
                self.render_download_list(ui, &rows);
            }
        });

        for (id, action) in actions {
            match action {
                CardAction::Download => self.download_item(ctx, id),
                CardAction::OpenDetails => {
                    self.site.select_item(id);
                }
                CardAction::None => {}
            }
        }
    }

    fn render_download_list(&mut self, ui: &mut egui::Ui, rows: &[(u32, DownloadStatus)]) {
        let p = *self.appearance.palette();
        theme::card_frame(&self.appearance).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.strong("Downloads");
                if self.has_active_downloads() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add(theme::button_danger("Cancel")).clicked() {
                            self.cancel_downloads();
                        }
                    });
                }
            });
            for (id, status) in rows {
                let title = self
                    .site
                    .catalog()
                    .get(*id)
                    .map(|item| item.title.clone())
                    .unwrap_or_default();
                ui.horizontal(|ui| {
                    ui.label(title);
                    match status {
                        DownloadStatus::Downloading(done, total) => {
                            let fraction = if *total > 0 {
                                *done as f32 / *total as f32
                            } else {
                                0.0
                            };
                            ui.add(egui::ProgressBar::new(fraction).desired_width(160.0));
                            ui.label(crate::size::format_size(*done));
                        }
                        DownloadStatus::Complete(path) => {
                            ui.colored_label(theme::STATUS_SUCCESS, icons::CHECK);
                            if ui.link("Show in folder").clicked() {
                                let folder = path.parent().unwrap_or(path).to_path_buf();
                                if let Err(e) = open::that(&folder) {
                                    tracing::warn!(error = %e, "Failed to open download folder");
                                }
                            }
                        }
                        DownloadStatus::Cancelled => {
                            ui.colored_label(theme::STATUS_WARNING, "Cancelled");
                        }
                        DownloadStatus::Failed(reason) => {
                            ui.colored_label(theme::STATUS_ERROR, reason);
                        }
                    }
                });
            }
            ui.label(
                egui::RichText::new(format!("Saved to {}", self.download_dir().display()))
                    .small()
                    .color(p.text_muted),
            );
        });
    }

    fn render_settings(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let p = *self.appearance.palette();
        let prefs = self.site.preferences().clone();
        ui.heading(Section::Settings.label(&prefs.language));
        ui.add_space(theme::SPACING_LG);

        let mut changes = Vec::new();
        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([theme::SPACING_XL, theme::SPACING_LG])
            .show(ui, |ui| {
                ui.label("Theme");
                ui.horizontal(|ui| {
                    for (theme_choice, label) in [(Theme::Dark, "Dark"), (Theme::Light, "Light")] {
                        if ui.selectable_label(prefs.theme == theme_choice, label).clicked()
                            && prefs.theme != theme_choice
                        {
                            changes.push(PreferenceChange::Theme(theme_choice));
                        }
                    }
                });
                ui.end_row();

                ui.label("Primary color");
                ui.horizontal(|ui| {
                    for swatch in theme::ACCENT_SWATCHES {
                        let Some((r, g, b)) = crate::preferences::parse_hex_color(swatch) else {
                            continue;
                        };
                        let (rect, response) =
                            ui.allocate_exact_size(egui::vec2(20.0, 20.0), egui::Sense::click());
                        ui.painter().rect_filled(
                            rect,
                            theme::RADIUS_DEFAULT,
                            egui::Color32::from_rgb(r, g, b),
                        );
                        if prefs.primary_color == swatch {
                            ui.painter().rect_stroke(
                                rect.expand(2.0),
                                theme::RADIUS_DEFAULT,
                                egui::Stroke::new(2.0, p.text_primary),
                                egui::StrokeKind::Outside,
                            );
                        }
                        if response.clicked() {
                            self.color_input = swatch.to_string();
                            changes.push(PreferenceChange::PrimaryColor(swatch.to_string()));
                        }
                    }
                    let field = ui.add(
                        egui::TextEdit::singleline(&mut self.color_input).desired_width(80.0),
                    );
                    if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        changes.push(PreferenceChange::PrimaryColor(self.color_input.clone()));
                    }
                });
                ui.end_row();

                ui.label("Font size");
                let mut size = prefs.font_size;
                let slider = ui.add(
                    egui::Slider::new(&mut size, FONT_SIZE_MIN..=FONT_SIZE_MAX).suffix(" px"),
                );
                if slider.changed() {
                    changes.push(PreferenceChange::FontSize(size as i64));
                }
                ui.end_row();

                ui.label("Language");
                egui::ComboBox::from_id_salt("language")
                    .selected_text(language_name(&prefs.language))
                    .show_ui(ui, |ui| {
                        for code in SUPPORTED_LANGUAGES {
                            let selected = prefs.language == *code;
                            if ui.selectable_label(selected, language_name(code)).clicked() {
                                changes.push(PreferenceChange::Language(code.to_string()));
                            }
                        }
                    });
                ui.end_row();

                ui.label("Size detection");
                let mut auto_detect = prefs.auto_detect_size;
                if ui
                    .checkbox(&mut auto_detect, "Re-detect sizes every time Models opens")
                    .changed()
                {
                    changes.push(PreferenceChange::AutoDetectSize(auto_detect));
                }
                ui.end_row();

                ui.label("Asset server");
                let field = ui.add(
                    egui::TextEdit::singleline(&mut self.base_url_input).desired_width(260.0),
                );
                if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    changes.push(PreferenceChange::AssetBaseUrl(self.base_url_input.clone()));
                }
                ui.end_row();

                ui.label("Download folder");
                ui.horizontal(|ui| {
                    ui.label(self.download_dir().display().to_string());
                    if ui.add(theme::button(&self.appearance, "Browse…")).clicked() {
                        if let Some(folder) = rfd::FileDialog::new().pick_folder() {
                            changes.push(PreferenceChange::DownloadPath(Some(
                                folder.to_string_lossy().to_string(),
                            )));
                        }
                    }
                    if prefs.download_path.is_some()
                        && ui.add(theme::button(&self.appearance, "Default")).clicked()
                    {
                        changes.push(PreferenceChange::DownloadPath(None));
                    }
                });
                ui.end_row();

                ui.label("Download counters");
                if ui.add(theme::button_danger("Reset counters")).clicked() {
                    self.show_reset_confirm = true;
                }
                ui.end_row();
            });

        if let Some(error) = &self.settings_error {
            ui.add_space(theme::SPACING_MD);
            ui.colored_label(theme::STATUS_ERROR, error);
        }
        if prefs.easter_egg_unlocked {
            ui.add_space(theme::SPACING_XL);
            ui.colored_label(self.appearance.accent, format!("{} Secret unlocked", icons::SPARKLE));
        }

        for change in changes {
            self.set_preference(ctx, change);
        }
    }
}

fn language_name(code: &str) -> &'static str {
    match code {
        "es" => "Español",
        _ => "English",
    }
}
