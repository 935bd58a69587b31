//! Centralized theme for RSM Catalog
//! Colors come from the active palette plus the user's primary color;
//! sizes and spacing are constants.

use crate::preferences::{Theme, VisualEffect};
use egui::Color32;

// =============================================================================
// PALETTES
// =============================================================================
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_base: Color32,
    pub bg_elevated: Color32,
    pub bg_surface: Color32,
    pub bg_hover: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,
    pub border_subtle: Color32,
    pub border_default: Color32,
}

pub const DARK: Palette = Palette {
    bg_base: Color32::from_rgb(0x09, 0x09, 0x0b),      // zinc-950
    bg_elevated: Color32::from_rgb(0x18, 0x18, 0x1b),  // zinc-900
    bg_surface: Color32::from_rgb(0x27, 0x27, 0x2a),   // zinc-800
    bg_hover: Color32::from_rgb(0x1f, 0x1f, 0x22),
    text_primary: Color32::WHITE,
    text_secondary: Color32::from_rgb(0xe4, 0xe4, 0xe7), // zinc-200
    text_muted: Color32::from_rgb(0xa1, 0xa1, 0xaa),     // zinc-400
    border_subtle: Color32::from_rgb(0x27, 0x27, 0x2a),
    border_default: Color32::from_rgb(0x3f, 0x3f, 0x46), // zinc-700
};

pub const LIGHT: Palette = Palette {
    bg_base: Color32::from_rgb(0xfa, 0xfa, 0xfa),      // zinc-50
    bg_elevated: Color32::WHITE,
    bg_surface: Color32::from_rgb(0xf4, 0xf4, 0xf5),   // zinc-100
    bg_hover: Color32::from_rgb(0xe4, 0xe4, 0xe7),
    text_primary: Color32::from_rgb(0x09, 0x09, 0x0b),
    text_secondary: Color32::from_rgb(0x27, 0x27, 0x2a),
    text_muted: Color32::from_rgb(0x71, 0x71, 0x7a),     // zinc-500
    border_subtle: Color32::from_rgb(0xe4, 0xe4, 0xe7),
    border_default: Color32::from_rgb(0xd4, 0xd4, 0xd8), // zinc-300
};

// =============================================================================
// COLORS - Status
// =============================================================================
pub const STATUS_SUCCESS: Color32 = Color32::from_rgb(0x34, 0xd3, 0x99); // emerald-400
pub const STATUS_WARNING: Color32 = Color32::from_rgb(0xfb, 0xbf, 0x24); // amber-400
pub const STATUS_ERROR: Color32 = Color32::from_rgb(0xf8, 0x71, 0x71); // red-400
pub const BTN_DANGER: Color32 = Color32::from_rgb(0xdc, 0x26, 0x26); // red-600

/// Swatches offered next to the color field
pub const ACCENT_SWATCHES: [&str; 6] = [
    "#2dd4bf", "#60a5fa", "#a78bfa", "#f472b6", "#fb923c", "#facc15",
];

// =============================================================================
// DIMENSIONS
// =============================================================================
pub const SIDEBAR_WIDTH: f32 = 220.0;
pub const CARD_WIDTH: f32 = 320.0;
pub const NAV_ROW_HEIGHT: f32 = 34.0;
pub const STAT_TILE_WIDTH: f32 = 180.0;

pub const RADIUS_DEFAULT: f32 = 4.0;
pub const RADIUS_LARGE: f32 = 8.0;

pub const STROKE_DEFAULT: f32 = 1.0;

pub const SPACING_SM: f32 = 4.0;
pub const SPACING_MD: f32 = 8.0;
pub const SPACING_LG: f32 = 12.0;
pub const SPACING_XL: f32 = 16.0;

// =============================================================================
// APPEARANCE - what the preferences resolve to
// =============================================================================
#[derive(Debug, Clone, Copy)]
pub struct Appearance {
    pub theme: Theme,
    pub accent: Color32,
    pub font_size: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            accent: Color32::from_rgb(0x2d, 0xd4, 0xbf),
            font_size: 16.0,
        }
    }
}

impl Appearance {
    pub fn palette(&self) -> &'static Palette {
        match self.theme {
            Theme::Dark => &DARK,
            Theme::Light => &LIGHT,
        }
    }

    /// Fold one effect in. Returns true when the egui style must be rebuilt.
    pub fn apply(&mut self, effect: &VisualEffect) -> bool {
        match effect {
            VisualEffect::ThemeSwap(theme) => self.theme = *theme,
            VisualEffect::Accent((r, g, b)) => self.accent = Color32::from_rgb(*r, *g, *b),
            VisualEffect::FontScale(size) => self.font_size = *size as f32,
            VisualEffect::Relabel(_) | VisualEffect::None => return false,
        }
        true
    }

    /// Text drawn on top of the accent color
    pub fn on_accent(&self) -> Color32 {
        let [r, g, b, _] = self.accent.to_array();
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        if luma > 150.0 {
            Color32::from_rgb(0x04, 0x2f, 0x2e)
        } else {
            Color32::WHITE
        }
    }
}

// =============================================================================
// HELPER - Apply global visuals
// =============================================================================
pub fn apply_visuals(ctx: &egui::Context, appearance: &Appearance) {
    let p = appearance.palette();
    let base = match appearance.theme {
        Theme::Dark => egui::Visuals::dark(),
        Theme::Light => egui::Visuals::light(),
    };
    let widget = |bg: Color32, stroke: Color32, fg: Color32| egui::style::WidgetVisuals {
        bg_fill: bg,
        weak_bg_fill: bg,
        bg_stroke: egui::Stroke::new(STROKE_DEFAULT, stroke),
        fg_stroke: egui::Stroke::new(STROKE_DEFAULT, fg),
        corner_radius: RADIUS_DEFAULT.into(),
        expansion: 0.0,
    };

    ctx.set_visuals(egui::Visuals {
        panel_fill: p.bg_base,
        window_fill: p.bg_elevated,
        extreme_bg_color: p.bg_surface,
        faint_bg_color: p.bg_elevated,
        hyperlink_color: appearance.accent,
        selection: egui::style::Selection {
            bg_fill: appearance.accent.gamma_multiply(0.35),
            stroke: egui::Stroke::new(STROKE_DEFAULT, appearance.accent),
        },
        widgets: egui::style::Widgets {
            noninteractive: widget(p.bg_elevated, p.border_subtle, p.text_primary),
            inactive: widget(p.bg_surface, p.border_subtle, p.text_secondary),
            hovered: widget(p.bg_hover, appearance.accent, p.text_primary),
            active: widget(p.bg_hover, appearance.accent, p.text_primary),
            open: widget(p.bg_surface, p.border_subtle, p.text_primary),
        },
        slider_trailing_fill: true,
        interact_cursor: Some(egui::CursorIcon::PointingHand),
        window_stroke: egui::Stroke::new(STROKE_DEFAULT, p.border_subtle),
        window_corner_radius: egui::CornerRadius::same(8),
        ..base
    });

    let size = appearance.font_size;
    ctx.style_mut(|style| {
        use egui::{FontFamily, FontId, TextStyle};
        style.text_styles = [
            (TextStyle::Heading, FontId::new(size * 1.5, FontFamily::Proportional)),
            (TextStyle::Body, FontId::new(size, FontFamily::Proportional)),
            (TextStyle::Button, FontId::new(size, FontFamily::Proportional)),
            (TextStyle::Monospace, FontId::new(size * 0.9, FontFamily::Monospace)),
            (TextStyle::Small, FontId::new(size * 0.75, FontFamily::Proportional)),
        ]
        .into();
        style.interaction.selectable_labels = false;
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
    });
}

// =============================================================================
// HELPER - Frames
// =============================================================================
pub fn card_frame(appearance: &Appearance) -> egui::Frame {
    let p = appearance.palette();
    egui::Frame::new()
        .fill(p.bg_elevated)
        .stroke(egui::Stroke::new(STROKE_DEFAULT, p.border_subtle))
        .corner_radius(RADIUS_LARGE)
        .inner_margin(egui::Margin::same(SPACING_LG as i8))
}

pub fn sidebar_frame(appearance: &Appearance) -> egui::Frame {
    egui::Frame::new()
        .fill(appearance.palette().bg_base)
        .inner_margin(egui::Margin::same(SPACING_LG as i8))
        .stroke(egui::Stroke::new(STROKE_DEFAULT, appearance.palette().border_subtle))
}

pub fn modal_frame(appearance: &Appearance) -> egui::Frame {
    let p = appearance.palette();
    egui::Frame::new()
        .fill(p.bg_elevated)
        .stroke(egui::Stroke::new(STROKE_DEFAULT, p.border_default))
        .corner_radius(RADIUS_LARGE)
        .inner_margin(egui::Margin::same(20))
}

// =============================================================================
// HELPER - Button styles
// =============================================================================

/// Default gray button
pub fn button(appearance: &Appearance, text: impl Into<String>) -> egui::Button<'static> {
    egui::Button::new(text.into())
        .fill(appearance.palette().border_default)
        .corner_radius(RADIUS_DEFAULT)
}

/// Accent button (for primary actions like Download)
pub fn button_accent(appearance: &Appearance, text: impl Into<String>) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new(text.into()).color(appearance.on_accent()))
        .fill(appearance.accent)
        .corner_radius(RADIUS_DEFAULT)
}

/// Danger red button (for destructive actions like Reset)
pub fn button_danger(text: impl Into<String>) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new(text.into()).color(Color32::WHITE))
        .fill(BTN_DANGER)
        .corner_radius(RADIUS_DEFAULT)
}
