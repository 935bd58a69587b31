//! Application constants and configuration

pub const APP_NAME: &str = "RSM Catalog";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Static file host serving the `worlds/` directory
pub const DEFAULT_ASSET_BASE_URL: &str = "http://localhost:8000";
pub const ASSET_ROOT: &str = "worlds";

/// Keys of the two persisted records in the settings table
pub const DOWNLOADS_KEY: &str = "rsm_downloads";
pub const SETTINGS_KEY: &str = "rsm_settings";

pub const FONT_SIZE_MIN: u8 = 12;
pub const FONT_SIZE_MAX: u8 = 24;
pub const DEFAULT_FONT_SIZE: u8 = 16;
pub const DEFAULT_PRIMARY_COLOR: &str = "#2dd4bf";

pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "es"];

/// Clicks on the version label needed to unlock the easter egg
pub const EASTER_EGG_CLICKS: u32 = 7;

pub const TITLE_PREFIX: &str = "RSM";
