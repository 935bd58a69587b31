//! Catalog store: the ordered list of downloadable items

use crate::constants::ASSET_ROOT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// One downloadable entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: u32,
    pub title: String,
    pub filename: String,
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub added_date: Option<NaiveDate>,
    /// Known size, when the catalog ships one
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl CatalogItem {
    /// File extension shown as the item format, e.g. ".rbxl"
    pub fn format(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// Asset path relative to the site root
    pub fn asset_path(&self) -> String {
        format!("{}/{}", ASSET_ROOT, self.filename)
    }

    pub fn asset_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.asset_path())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate catalog id {0}")]
    DuplicateId(u32),

    #[error("invalid catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id) {
                return Err(CatalogError::DuplicateId(item.id));
            }
        }
        Ok(Self { items })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<CatalogItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    /// Compiled-in catalog
    pub fn builtin() -> Self {
        Self {
            items: vec![CatalogItem {
                id: 1,
                title: "Custom Chat System".to_string(),
                filename: "CustomChatSystem.rbxl".to_string(),
                description: "This chat system is fully customizable and designed to integrate \
                              easily into your projects. Make sure to follow the rules provided \
                              to avoid errors or conflicts within the system."
                    .to_string(),
                category: Some("Game Systems".to_string()),
                added_date: NaiveDate::from_ymd_opt(2025, 1, 16),
                size_bytes: None,
            }],
        }
    }

    /// `catalog.json` from the data directory when present and valid,
    /// the compiled-in catalog otherwise
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join("catalog.json");
        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(catalog) => {
                    info!(path = %path.display(), count = catalog.len(), "Loaded catalog override");
                    catalog
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        path = %path.display(),
                        "Failed to load catalog override, using built-in"
                    );
                    Self::builtin()
                }
            },
            Err(_) => {
                debug!("No catalog override found, using built-in");
                Self::builtin()
            }
        }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get(&self, id: u32) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> HashSet<u32> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn test_item(id: u32, title: &str) -> CatalogItem {
    CatalogItem {
        id,
        title: title.to_string(),
        filename: format!("{}.rbxl", title.replace(' ', "")),
        description: format!("{} description", title),
        category: None,
        added_date: None,
        size_bytes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_ids() {
        let err = Catalog::new(vec![test_item(1, "A"), test_item(1, "B")]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(1)));
    }

    #[test]
    fn builtin_item_paths() {
        let catalog = Catalog::builtin();
        let item = catalog.get(1).unwrap();
        assert_eq!(item.format(), ".rbxl");
        assert_eq!(item.asset_path(), "worlds/CustomChatSystem.rbxl");
        assert_eq!(
            item.asset_url("http://localhost:8000/"),
            "http://localhost:8000/worlds/CustomChatSystem.rbxl"
        );
    }

    #[test]
    fn parses_override_json() {
        let json = r#"[
            {"id": 4, "title": "Obby Kit", "filename": "ObbyKit.rbxm",
             "description": "Parts", "category": "Worlds", "addedDate": "2025-03-02"}
        ]"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        let item = catalog.get(4).unwrap();
        assert_eq!(item.format(), ".rbxm");
        assert_eq!(item.added_date, NaiveDate::from_ymd_opt(2025, 3, 2));
    }

    #[test]
    fn missing_override_falls_back_to_builtin() {
        let dir = std::env::temp_dir().join("rsm-catalog-no-override");
        let catalog = Catalog::load(&dir);
        assert_eq!(catalog.len(), Catalog::builtin().len());
    }
}
