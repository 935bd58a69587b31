//! User preferences and download counters, written through to a
//! [`KeyValueStore`] on every change.

use crate::constants::*;
use crate::db::KeyValueStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub primary_color: String,
    pub font_size: u8,
    pub language: String,
    pub auto_detect_size: bool,
    pub easter_egg_unlocked: bool,
    pub secret_click_count: u32,
    pub asset_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    /// Keys written by other versions, kept so a save does not drop them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            language: "en".to_string(),
            auto_detect_size: false,
            easter_egg_unlocked: false,
            secret_click_count: 0,
            asset_base_url: DEFAULT_ASSET_BASE_URL.to_string(),
            download_path: None,
            extra: Map::new(),
        }
    }
}

impl Preferences {
    /// Overlay a persisted record onto `defaults`. A key only wins when it
    /// deserializes into its field; malformed keys keep the default.
    pub fn merge(defaults: &Preferences, persisted: Map<String, Value>) -> Preferences {
        let Ok(Value::Object(mut merged)) = serde_json::to_value(defaults) else {
            return defaults.clone();
        };

        for (key, mut value) in persisted {
            if key == "fontSize" {
                if let Some(size) = value.as_i64() {
                    value = Value::from(clamp_font_size(size));
                }
            }
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value);
            if serde_json::from_value::<Preferences>(Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
            } else {
                warn!(key = %key, "Ignoring malformed persisted preference");
            }
        }

        let mut prefs: Preferences =
            serde_json::from_value(Value::Object(merged)).unwrap_or_else(|_| defaults.clone());
        match normalize_hex_color(&prefs.primary_color) {
            Some(color) => prefs.primary_color = color,
            None => prefs.primary_color = defaults.primary_color.clone(),
        }
        if !SUPPORTED_LANGUAGES.contains(&prefs.language.as_str()) {
            prefs.language = defaults.language.clone();
        }
        prefs
    }

    /// Primary color as RGB; the stored value is always normalized
    pub fn primary_rgb(&self) -> (u8, u8, u8) {
        parse_hex_color(&self.primary_color).unwrap_or((0x2d, 0xd4, 0xbf))
    }
}

pub fn clamp_font_size(size: i64) -> u8 {
    size.clamp(FONT_SIZE_MIN as i64, FONT_SIZE_MAX as i64) as u8
}

/// Parse `#rgb` or `#rrggbb`
pub fn parse_hex_color(text: &str) -> Option<(u8, u8, u8)> {
    let hex = text.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some((expand(0)?, expand(1)?, expand(2)?))
        }
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        _ => None,
    }
}

pub fn normalize_hex_color(text: &str) -> Option<String> {
    parse_hex_color(text).map(|(r, g, b)| format!("#{:02x}{:02x}{:02x}", r, g, b))
}

/// A single settings edit
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceChange {
    Theme(Theme),
    PrimaryColor(String),
    FontSize(i64),
    Language(String),
    AutoDetectSize(bool),
    AssetBaseUrl(String),
    DownloadPath(Option<String>),
}

/// Visual work the shell must do after a change is accepted
#[derive(Debug, Clone, PartialEq)]
pub enum VisualEffect {
    ThemeSwap(Theme),
    Accent((u8, u8, u8)),
    FontScale(u8),
    Relabel(String),
    None,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PreferenceError {
    #[error("invalid color {0:?}, expected #rgb or #rrggbb")]
    InvalidColor(String),

    #[error("unsupported language {0:?}")]
    UnsupportedLanguage(String),

    #[error("invalid asset URL {0:?}")]
    InvalidUrl(String),
}

pub struct PreferenceStore<S: KeyValueStore> {
    store: S,
    prefs: Preferences,
    counters: BTreeMap<u32, u64>,
    valid_ids: HashSet<u32>,
}

impl<S: KeyValueStore> PreferenceStore<S> {
    /// Hydrate from `store`; anything missing or unreadable falls back to defaults
    pub fn load(store: S, valid_ids: HashSet<u32>) -> Self {
        let prefs = Preferences::merge(&Preferences::default(), read_record(&store, SETTINGS_KEY));

        let mut counters = BTreeMap::new();
        for (key, value) in read_record(&store, DOWNLOADS_KEY) {
            match (key.parse::<u32>(), value.as_u64()) {
                (Ok(id), Some(count)) if valid_ids.contains(&id) => {
                    counters.insert(id, count);
                }
                (Ok(id), Some(_)) => debug!(id, "Dropping counter for unknown item"),
                _ => warn!(key = %key, "Ignoring malformed download counter"),
            }
        }

        debug!(theme = ?prefs.theme, counters = counters.len(), "Preferences loaded");
        Self {
            store,
            prefs,
            counters,
            valid_ids,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn counters(&self) -> &BTreeMap<u32, u64> {
        &self.counters
    }

    pub fn count(&self, id: u32) -> u64 {
        self.counters.get(&id).copied().unwrap_or(0)
    }

    pub fn set(&mut self, change: PreferenceChange) -> Result<VisualEffect, PreferenceError> {
        let effect = match change {
            PreferenceChange::Theme(theme) => {
                self.prefs.theme = theme;
                VisualEffect::ThemeSwap(theme)
            }
            PreferenceChange::PrimaryColor(color) => {
                let normalized =
                    normalize_hex_color(&color).ok_or(PreferenceError::InvalidColor(color))?;
                self.prefs.primary_color = normalized;
                VisualEffect::Accent(self.prefs.primary_rgb())
            }
            PreferenceChange::FontSize(size) => {
                self.prefs.font_size = clamp_font_size(size);
                VisualEffect::FontScale(self.prefs.font_size)
            }
            PreferenceChange::Language(language) => {
                if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
                    return Err(PreferenceError::UnsupportedLanguage(language));
                }
                self.prefs.language = language.clone();
                VisualEffect::Relabel(language)
            }
            PreferenceChange::AutoDetectSize(enabled) => {
                self.prefs.auto_detect_size = enabled;
                VisualEffect::None
            }
            PreferenceChange::AssetBaseUrl(url) => {
                let url = url.trim().trim_end_matches('/').to_string();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(PreferenceError::InvalidUrl(url));
                }
                self.prefs.asset_base_url = url;
                VisualEffect::None
            }
            PreferenceChange::DownloadPath(path) => {
                self.prefs.download_path = path.filter(|p| !p.trim().is_empty());
                VisualEffect::None
            }
        };
        self.persist_settings();
        Ok(effect)
    }

    /// Returns the new count, or `None` for an id outside the catalog
    pub fn increment_download(&mut self, id: u32) -> Option<u64> {
        if !self.valid_ids.contains(&id) {
            warn!(id, "Download registered for unknown item");
            return None;
        }
        let count = self.counters.entry(id).or_insert(0);
        *count += 1;
        let count = *count;
        self.persist_downloads();
        Some(count)
    }

    pub fn reset_downloads(&mut self) {
        self.counters.clear();
        self.persist_downloads();
        info!("Download counters reset");
    }

    /// Count a click on the secret trigger. True only on the click that unlocks.
    pub fn register_secret_click(&mut self) -> bool {
        if self.prefs.easter_egg_unlocked {
            return false;
        }
        self.prefs.secret_click_count += 1;
        let unlocked = self.prefs.secret_click_count >= EASTER_EGG_CLICKS;
        if unlocked {
            self.prefs.easter_egg_unlocked = true;
            info!("Easter egg unlocked");
        }
        self.persist_settings();
        unlocked
    }

    fn persist_settings(&self) {
        match serde_json::to_string(&self.prefs) {
            Ok(json) => {
                if let Err(e) = self.store.set(SETTINGS_KEY, &json) {
                    warn!(error = %e, "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }

    fn persist_downloads(&self) {
        match serde_json::to_string(&self.counters) {
            Ok(json) => {
                if let Err(e) = self.store.set(DOWNLOADS_KEY, &json) {
                    warn!(error = %e, "Failed to save download counters");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize download counters"),
        }
    }
}

fn read_record<S: KeyValueStore>(store: &S, key: &str) -> Map<String, Value> {
    match store.get(key) {
        Ok(Some(text)) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(key, "Persisted record is not an object, using defaults");
                Map::new()
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to parse persisted record, using defaults");
                Map::new()
            }
        },
        Ok(None) => {
            debug!(key, "No persisted record found, using defaults");
            Map::new()
        }
        Err(e) => {
            warn!(key, error = %e, "Failed to read persisted record, using defaults");
            Map::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StorageError};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Sqlite(rusqlite::Error::InvalidQuery))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Sqlite(rusqlite::Error::InvalidQuery))
        }
    }

    fn ids(list: &[u32]) -> HashSet<u32> {
        list.iter().copied().collect()
    }

    fn persisted(store: &MemoryStore) -> Value {
        serde_json::from_str(&store.get(SETTINGS_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn persisted_keys_override_defaults() {
        let store = MemoryStore::with(&[(SETTINGS_KEY, r#"{"fontSize":18}"#)]);
        let prefs = PreferenceStore::load(&store, ids(&[1]));
        let p = prefs.preferences();
        assert_eq!(p.font_size, 18);
        assert_eq!(p.theme, Theme::Dark);
        assert_eq!(p.primary_color, DEFAULT_PRIMARY_COLOR);
        assert_eq!(p.language, "en");
    }

    #[test]
    fn malformed_record_falls_back_to_defaults() {
        let store = MemoryStore::with(&[(SETTINGS_KEY, "{not json"), (DOWNLOADS_KEY, "[1,2]")]);
        let prefs = PreferenceStore::load(&store, ids(&[1]));
        assert_eq!(prefs.preferences(), &Preferences::default());
        assert!(prefs.counters().is_empty());
    }

    #[test]
    fn malformed_key_keeps_default_but_keeps_others() {
        let store = MemoryStore::with(&[(
            SETTINGS_KEY,
            r#"{"theme":"sepia","fontSize":40,"primaryColor":"red","autoDetectSize":true}"#,
        )]);
        let prefs = PreferenceStore::load(&store, ids(&[]));
        let p = prefs.preferences();
        assert_eq!(p.theme, Theme::Dark);
        assert_eq!(p.font_size, FONT_SIZE_MAX);
        assert_eq!(p.primary_color, DEFAULT_PRIMARY_COLOR);
        assert!(p.auto_detect_size);
    }

    #[test]
    fn unknown_keys_survive_a_save() {
        let store = MemoryStore::with(&[(SETTINGS_KEY, r#"{"sidebarCollapsed":true}"#)]);
        let mut prefs = PreferenceStore::load(&store, ids(&[]));
        prefs.set(PreferenceChange::Theme(Theme::Light)).unwrap();
        let saved = persisted(&store);
        assert_eq!(saved["sidebarCollapsed"], Value::Bool(true));
        assert_eq!(saved["theme"], Value::from("light"));
    }

    #[test]
    fn font_size_is_clamped() {
        let store = MemoryStore::default();
        let mut prefs = PreferenceStore::load(&store, ids(&[]));
        assert_eq!(prefs.set(PreferenceChange::FontSize(4)), Ok(VisualEffect::FontScale(12)));
        assert_eq!(prefs.set(PreferenceChange::FontSize(99)), Ok(VisualEffect::FontScale(24)));
        assert_eq!(persisted(&store)["fontSize"], Value::from(24));
    }

    #[test]
    fn invalid_color_is_rejected_and_previous_kept() {
        let store = MemoryStore::default();
        let mut prefs = PreferenceStore::load(&store, ids(&[]));
        assert_eq!(
            prefs.set(PreferenceChange::PrimaryColor("#ABC".into())),
            Ok(VisualEffect::Accent((0xaa, 0xbb, 0xcc)))
        );
        let err = prefs.set(PreferenceChange::PrimaryColor("#12345g".into()));
        assert_eq!(err, Err(PreferenceError::InvalidColor("#12345g".into())));
        assert_eq!(prefs.preferences().primary_color, "#aabbcc");
    }

    #[test]
    fn unsupported_language_and_bad_url_are_rejected() {
        let mut prefs = PreferenceStore::load(MemoryStore::default(), ids(&[]));
        assert!(prefs.set(PreferenceChange::Language("xx".into())).is_err());
        assert!(prefs.set(PreferenceChange::AssetBaseUrl("ftp://host".into())).is_err());
        assert_eq!(
            prefs.set(PreferenceChange::AssetBaseUrl("https://cdn.test/".into())),
            Ok(VisualEffect::None)
        );
        assert_eq!(prefs.preferences().asset_base_url, "https://cdn.test");
    }

    #[test]
    fn increments_are_counted_per_id() {
        let store = MemoryStore::default();
        let mut prefs = PreferenceStore::load(&store, ids(&[1, 2, 3]));
        for _ in 0..4 {
            prefs.increment_download(2);
        }
        assert_eq!(prefs.increment_download(1), Some(1));
        assert_eq!(prefs.count(2), 4);
        assert_eq!(prefs.count(1), 1);
        assert_eq!(prefs.count(3), 0);
        assert_eq!(prefs.increment_download(42), None);

        let reloaded = PreferenceStore::load(&store, ids(&[1, 2, 3]));
        assert_eq!(reloaded.count(2), 4);
    }

    #[test]
    fn reset_zeroes_every_count() {
        let store = MemoryStore::default();
        let mut prefs = PreferenceStore::load(&store, ids(&[1, 2]));
        prefs.increment_download(1);
        prefs.increment_download(2);
        prefs.reset_downloads();
        assert_eq!(prefs.count(1), 0);
        assert_eq!(prefs.count(2), 0);
        assert_eq!(store.get(DOWNLOADS_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn counters_for_unknown_items_are_dropped() {
        let store = MemoryStore::with(&[(DOWNLOADS_KEY, r#"{"1":3,"9":5,"x":1}"#)]);
        let prefs = PreferenceStore::load(&store, ids(&[1]));
        assert_eq!(prefs.counters().len(), 1);
        assert_eq!(prefs.count(1), 3);
    }

    #[test]
    fn broken_store_keeps_memory_authoritative() {
        let mut prefs = PreferenceStore::load(BrokenStore, ids(&[1]));
        assert_eq!(prefs.preferences(), &Preferences::default());
        assert_eq!(prefs.increment_download(1), Some(1));
        assert_eq!(prefs.increment_download(1), Some(2));
        prefs.set(PreferenceChange::FontSize(20)).unwrap();
        assert_eq!(prefs.preferences().font_size, 20);
    }

    #[test]
    fn secret_clicks_unlock_once() {
        let store = MemoryStore::default();
        let mut prefs = PreferenceStore::load(&store, ids(&[]));
        let unlocks: Vec<bool> = (0..EASTER_EGG_CLICKS + 2)
            .map(|_| prefs.register_secret_click())
            .collect();
        assert_eq!(unlocks.iter().filter(|u| **u).count(), 1);
        assert!(unlocks[EASTER_EGG_CLICKS as usize - 1]);
        assert!(PreferenceStore::load(&store, ids(&[])).preferences().easter_egg_unlocked);
    }
}
