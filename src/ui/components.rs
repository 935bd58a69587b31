//! Reusable UI components
//!
//! Standalone widgets used by the section views.

use crate::render::CardView;
use crate::router::Section;
use crate::theme::{self, Appearance};
use eframe::egui;

/// What the user did with an item card this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardAction {
    None,
    Download,
    OpenDetails,
}

pub fn section_icon(section: Section) -> &'static str {
    match section {
        Section::Home => egui_phosphor::regular::HOUSE,
        Section::Models => egui_phosphor::regular::PACKAGE,
        Section::Settings => egui_phosphor::regular::GEAR,
    }
}

/// Sidebar navigation row. Returns true if clicked.
pub fn nav_entry(
    ui: &mut egui::Ui,
    appearance: &Appearance,
    section: Section,
    label: &str,
    active: bool,
) -> bool {
    let p = appearance.palette();
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), theme::NAV_ROW_HEIGHT),
        egui::Sense::click(),
    );
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    let painter = ui.painter();
    if active {
        painter.rect_filled(rect, theme::RADIUS_DEFAULT, appearance.accent.gamma_multiply(0.18));
        painter.rect_filled(
            egui::Rect::from_min_size(rect.min, egui::vec2(3.0, rect.height())),
            theme::RADIUS_DEFAULT,
            appearance.accent,
        );
    } else if response.hovered() {
        painter.rect_filled(rect, theme::RADIUS_DEFAULT, p.bg_hover);
    }

    let color = if active { appearance.accent } else { p.text_secondary };
    painter.text(
        rect.left_center() + egui::vec2(14.0, 0.0),
        egui::Align2::LEFT_CENTER,
        format!("{}  {}", section_icon(section), label),
        egui::FontId::proportional(appearance.font_size),
        color,
    );
    response.clicked()
}

/// Labeled statistic tile for the home section
pub fn stat_tile(ui: &mut egui::Ui, appearance: &Appearance, icon: &str, label: &str, value: &str) {
    let p = appearance.palette();
    theme::card_frame(appearance).show(ui, |ui| {
        ui.set_width(theme::STAT_TILE_WIDTH);
        ui.horizontal(|ui| {
            ui.colored_label(appearance.accent, icon);
            ui.label(egui::RichText::new(label).small().color(p.text_muted));
        });
        ui.add_space(theme::SPACING_SM);
        ui.label(
            egui::RichText::new(value)
                .size(appearance.font_size * 1.4)
                .strong()
                .color(p.text_primary),
        );
    });
}

/// One catalog card
pub fn item_card(
    ui: &mut egui::Ui,
    appearance: &Appearance,
    card: &CardView,
    downloading: bool,
) -> CardAction {
    let p = appearance.palette();
    let mut action = CardAction::None;

    theme::card_frame(appearance).show(ui, |ui| {
        ui.set_width(theme::CARD_WIDTH);

        let title = ui.add(
            egui::Label::new(
                egui::RichText::new(&card.title)
                    .size(appearance.font_size * 1.2)
                    .strong()
                    .color(p.text_primary),
            )
            .sense(egui::Sense::click()),
        );
        if title.clicked() {
            action = CardAction::OpenDetails;
        }
        title.on_hover_cursor(egui::CursorIcon::PointingHand);

        ui.add_space(theme::SPACING_SM);
        ui.label(egui::RichText::new(&card.description).color(p.text_secondary));
        ui.add_space(theme::SPACING_MD);

        egui::Grid::new(("card_info", card.item_id))
            .num_columns(2)
            .spacing([theme::SPACING_LG, theme::SPACING_SM])
            .show(ui, |ui| {
                for (label, value) in [
                    ("Category", card.category.as_str()),
                    ("Size", card.size.as_str()),
                    ("Downloads", card.downloads.as_str()),
                    ("Format", card.format.as_str()),
                ] {
                    ui.label(egui::RichText::new(label).strong().color(p.text_muted));
                    ui.label(egui::RichText::new(value).color(p.text_secondary));
                    ui.end_row();
                }
            });

        ui.add_space(theme::SPACING_MD);
        let text = format!("{}  Download", egui_phosphor::regular::DOWNLOAD_SIMPLE);
        let button = ui
            .add_enabled(!downloading, theme::button_accent(appearance, text))
            .on_hover_text(&card.download_url);
        if button.clicked() {
            action = CardAction::Download;
        }
    });

    action
}

/// Placeholder shown when the catalog is empty
pub fn empty_state(ui: &mut egui::Ui, appearance: &Appearance, text: &str) {
    ui.add_space(theme::SPACING_XL);
    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new(text).color(appearance.palette().text_muted));
    });
}
