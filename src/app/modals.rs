//! Modal dialogs (item details, reset confirmation, easter egg) and the toast

use super::App;
use crate::render::group_thousands;
use crate::size::SizeLookup;
use crate::theme;
use eframe::egui;
use egui_phosphor::regular as icons;

const TOAST_VISIBLE_SECS: f32 = 3.0;
const TOAST_FADE_SECS: f32 = 0.5;

impl App {
    pub fn render_modals(&mut self, ctx: &egui::Context) {
        if self.site.selected_item().is_some() {
            self.render_item_modal(ctx);
        }
        if self.show_reset_confirm {
            self.render_reset_modal(ctx);
        }
        if self.show_easter_egg {
            self.render_easter_egg_modal(ctx);
        }
    }

    fn render_item_modal(&mut self, ctx: &egui::Context) {
        let Some(item) = self.site.selected_item().cloned() else {
            return;
        };
        let p = *self.appearance.palette();
        let size = self
            .site
            .size_of(item.id)
            .unwrap_or(SizeLookup::Unknown)
            .display();
        let downloads = group_thousands(self.site.count(item.id));
        let url = item.asset_url(&self.site.preferences().asset_base_url);
        let downloading = self.is_downloading(item.id);

        let mut close = false;
        let mut download = false;
        let modal = egui::Modal::new(egui::Id::new("item_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(120))
            .frame(theme::modal_frame(&self.appearance))
            .show(ctx, |ui| {
                ui.set_width(420.0);
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(&item.title)
                            .size(self.appearance.font_size * 1.3)
                            .strong()
                            .color(p.text_primary),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.add(egui::Button::new(icons::X).frame(false)).clicked() {
                            close = true;
                        }
                    });
                });
                ui.add_space(theme::SPACING_MD);
                ui.label(egui::RichText::new(&item.description).color(p.text_secondary));
                ui.add_space(theme::SPACING_LG);

                let added = item
                    .added_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                let category = item.category.clone().unwrap_or_else(|| "N/A".to_string());
                let format = item.format();
                egui::Grid::new("item_details")
                    .num_columns(2)
                    .spacing([theme::SPACING_XL, theme::SPACING_SM])
                    .show(ui, |ui| {
                        for (label, value) in [
                            ("Category", category.as_str()),
                            ("Size", size.as_str()),
                            ("Downloads", downloads.as_str()),
                            ("Format", format.as_str()),
                            ("Added", added.as_str()),
                            ("File", url.as_str()),
                        ] {
                            ui.label(egui::RichText::new(label).strong().color(p.text_muted));
                            ui.label(egui::RichText::new(value).color(p.text_secondary));
                            ui.end_row();
                        }
                    });

                ui.add_space(theme::SPACING_LG);
                ui.horizontal(|ui| {
                    let text = format!("{}  Download", icons::DOWNLOAD_SIMPLE);
                    if ui
                        .add_enabled(!downloading, theme::button_accent(&self.appearance, text))
                        .clicked()
                    {
                        download = true;
                    }
                    if ui.add(theme::button(&self.appearance, "Close")).clicked() {
                        close = true;
                    }
                });
            });

        if download {
            self.download_item(ctx, item.id);
        }
        if close || modal.should_close() {
            self.site.clear_selection();
        }
    }

    fn render_reset_modal(&mut self, ctx: &egui::Context) {
        let mut confirmed = false;
        let mut cancelled = false;
        let modal = egui::Modal::new(egui::Id::new("reset_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(120))
            .frame(theme::modal_frame(&self.appearance))
            .show(ctx, |ui| {
                ui.set_width(320.0);
                ui.label(egui::RichText::new("Reset download counters?").strong());
                ui.add_space(theme::SPACING_SM);
                ui.label(
                    egui::RichText::new("Every model goes back to zero downloads.")
                        .color(self.appearance.palette().text_muted),
                );
                ui.add_space(theme::SPACING_LG);
                ui.horizontal(|ui| {
                    if ui.add(theme::button_danger("Reset")).clicked() {
                        confirmed = true;
                    }
                    if ui.add(theme::button(&self.appearance, "Cancel")).clicked() {
                        cancelled = true;
                    }
                });
            });

        if confirmed {
            self.site.reset_downloads(&mut self.view);
            self.show_toast("Download counters reset");
        }
        if confirmed || cancelled || modal.should_close() {
            self.show_reset_confirm = false;
        }
    }

    fn render_easter_egg_modal(&mut self, ctx: &egui::Context) {
        let mut close = false;
        let modal = egui::Modal::new(egui::Id::new("easter_egg_modal"))
            .backdrop_color(egui::Color32::from_black_alpha(120))
            .frame(theme::modal_frame(&self.appearance))
            .show(ctx, |ui| {
                ui.set_width(300.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new(icons::SPARKLE)
                            .size(self.appearance.font_size * 3.0)
                            .color(self.appearance.accent),
                    );
                    ui.add_space(theme::SPACING_MD);
                    ui.label(egui::RichText::new("You found the secret!").strong());
                    ui.label(
                        egui::RichText::new("Thanks for poking around.")
                            .color(self.appearance.palette().text_muted),
                    );
                    ui.add_space(theme::SPACING_LG);
                    if ui.add(theme::button_accent(&self.appearance, "Nice")).clicked() {
                        close = true;
                    }
                });
            });

        if close || modal.should_close() {
            self.show_easter_egg = false;
        }
    }

    /// Bottom-right notification, 3s visible then fade, paused on hover
    pub fn render_toast(&mut self, ctx: &egui::Context) {
        let Some(msg) = self.toast_message.clone() else {
            return;
        };
        let total = TOAST_VISIBLE_SECS + TOAST_FADE_SECS;
        let elapsed = self.toast_start.map(|t| t.elapsed().as_secs_f32()).unwrap_or(0.0);
        let alpha = if elapsed > TOAST_VISIBLE_SECS {
            ((total - elapsed) / TOAST_FADE_SECS).clamp(0.0, 1.0)
        } else {
            1.0
        };

        let p = *self.appearance.palette();
        let accent = self.appearance.accent;
        let screen = ctx.screen_rect();
        let margin = theme::SPACING_LG;
        let response = egui::Area::new(egui::Id::new("toast"))
            .fixed_pos(egui::pos2(screen.right() - margin, screen.bottom() - margin))
            .pivot(egui::Align2::RIGHT_BOTTOM)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(p.bg_elevated.gamma_multiply(0.9 * alpha))
                    .stroke(egui::Stroke::new(
                        theme::STROKE_DEFAULT,
                        accent.gamma_multiply(0.4 * alpha),
                    ))
                    .corner_radius(6.0)
                    .inner_margin(egui::Margin::symmetric(16, 10))
                    .show(ui, |ui| {
                        let color = p.text_primary.gamma_multiply(alpha);
                        ui.label(egui::RichText::new(msg).color(color));
                    });
            });

        if response.response.hovered() {
            self.toast_start = Some(std::time::Instant::now());
        }

        if elapsed >= total {
            self.toast_message = None;
            self.toast_start = None;
        } else {
            ctx.request_repaint();
        }
    }
}
