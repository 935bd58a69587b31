//! The owned application state: catalog, preferences, router and size cache.
//! Every user action reaches the core through a `Site` method, and every
//! method repaints through the given [`RenderTarget`].

use crate::catalog::{Catalog, CatalogItem};
use crate::db::KeyValueStore;
use crate::preferences::{
    PreferenceChange, PreferenceError, PreferenceStore, Preferences, VisualEffect,
};
use crate::render::{build_cards, paint_catalog, RenderTarget};
use crate::router::{Navigation, Router, Section};
use crate::size::{SizeLookup, SizeRequest};
use crate::stats::Stats;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct Site<S: KeyValueStore> {
    catalog: Catalog,
    prefs: PreferenceStore<S>,
    router: Router,
    sizes: HashMap<u32, SizeLookup>,
    size_batch_pending: bool,
}

impl<S: KeyValueStore> Site<S> {
    pub fn new(catalog: Catalog, store: S, fragment: Option<&str>) -> Self {
        let prefs = PreferenceStore::load(store, catalog.ids());
        Self {
            catalog,
            prefs,
            router: Router::new(fragment),
            sizes: HashMap::new(),
            size_batch_pending: false,
        }
    }

    /// First paint: visuals from the stored preferences, statistics, then
    /// the initial section. Returns a size batch to start, if any.
    pub fn boot<T: RenderTarget + ?Sized>(&mut self, target: &mut T) -> Option<Vec<SizeRequest>> {
        let prefs = self.prefs.preferences();
        for effect in [
            VisualEffect::ThemeSwap(prefs.theme),
            VisualEffect::Accent(prefs.primary_rgb()),
            VisualEffect::FontScale(prefs.font_size),
            VisualEffect::Relabel(prefs.language.clone()),
        ] {
            target.apply_visual(&effect);
        }
        self.refresh_stats(target);

        let section = self.router.current();
        info!(section = section.id(), items = self.catalog.len(), "Site ready");
        self.navigate_to(section.id(), target)
    }

    pub fn navigate_to<T: RenderTarget + ?Sized>(
        &mut self,
        section_id: &str,
        target: &mut T,
    ) -> Option<Vec<SizeRequest>> {
        let navigation = self.router.navigate_to(section_id, target)?;
        self.after_navigation(navigation, target)
    }

    pub fn on_fragment_change<T: RenderTarget + ?Sized>(
        &mut self,
        fragment: &str,
        target: &mut T,
    ) -> Option<Vec<SizeRequest>> {
        let navigation = self.router.on_fragment_change(fragment, target)?;
        self.after_navigation(navigation, target)
    }

    pub fn back<T: RenderTarget + ?Sized>(&mut self, target: &mut T) -> Option<Vec<SizeRequest>> {
        let navigation = self.router.back(target)?;
        self.after_navigation(navigation, target)
    }

    pub fn forward<T: RenderTarget + ?Sized>(
        &mut self,
        target: &mut T,
    ) -> Option<Vec<SizeRequest>> {
        let navigation = self.router.forward(target)?;
        self.after_navigation(navigation, target)
    }

    /// Store a finished size batch and repaint. A late batch still
    /// overwrites whatever an earlier one wrote.
    pub fn apply_sizes<T: RenderTarget + ?Sized>(
        &mut self,
        results: Vec<(u32, SizeLookup)>,
        target: &mut T,
    ) {
        self.size_batch_pending = false;
        let resolved = results.len();
        for (id, lookup) in results {
            if self.catalog.contains(id) {
                self.sizes.insert(id, lookup);
            }
        }
        debug!(resolved, "Size batch applied");
        self.refresh_stats(target);
        if self.router.current() == Section::Models {
            self.render_catalog(target);
        }
    }

    /// Count a download intent. Returns the new count for a catalog id.
    pub fn register_download<T: RenderTarget + ?Sized>(
        &mut self,
        id: u32,
        target: &mut T,
    ) -> Option<u64> {
        let count = self.prefs.increment_download(id)?;
        info!(id, count, "Download registered");
        self.refresh_stats(target);
        if self.router.current() == Section::Models {
            self.render_catalog(target);
        }
        Some(count)
    }

    /// Clear every counter. Callers confirm with the user first.
    pub fn reset_downloads<T: RenderTarget + ?Sized>(&mut self, target: &mut T) {
        self.prefs.reset_downloads();
        self.refresh_stats(target);
        if self.router.current() == Section::Models {
            self.render_catalog(target);
        }
    }

    pub fn set_preference<T: RenderTarget + ?Sized>(
        &mut self,
        change: PreferenceChange,
        target: &mut T,
    ) -> Result<(), PreferenceError> {
        let effect = self.prefs.set(change)?;
        target.apply_visual(&effect);
        if self.router.current() == Section::Models {
            self.render_catalog(target);
        }
        Ok(())
    }

    /// True on the click that unlocks the easter egg
    pub fn secret_click(&mut self) -> bool {
        self.prefs.register_secret_click()
    }

    /// Open the detail view of an item; unknown ids are ignored
    pub fn select_item(&mut self, id: u32) -> bool {
        if !self.catalog.contains(id) {
            return false;
        }
        self.router.select_item(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.router.clear_selection();
    }

    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.router
            .selected_item()
            .and_then(|id| self.catalog.get(id))
    }

    pub fn render_catalog<T: RenderTarget + ?Sized>(&self, target: &mut T) {
        let cards = build_cards(
            &self.catalog,
            self.prefs.counters(),
            &self.sizes,
            &self.prefs.preferences().asset_base_url,
        );
        paint_catalog(target, &cards);
    }

    pub fn refresh_stats<T: RenderTarget + ?Sized>(&self, target: &mut T) {
        self.stats().paint(target);
    }

    pub fn stats(&self) -> Stats {
        Stats::compute(&self.catalog, self.prefs.counters(), &self.sizes)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn preferences(&self) -> &Preferences {
        self.prefs.preferences()
    }

    pub fn count(&self, id: u32) -> u64 {
        self.prefs.count(id)
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn size_of(&self, id: u32) -> Option<SizeLookup> {
        self.sizes.get(&id).copied()
    }

    pub fn size_batch_pending(&self) -> bool {
        self.size_batch_pending
    }

    fn after_navigation<T: RenderTarget + ?Sized>(
        &mut self,
        navigation: Navigation,
        target: &mut T,
    ) -> Option<Vec<SizeRequest>> {
        if navigation.refresh_stats {
            self.refresh_stats(target);
        }
        if navigation.section != Section::Models {
            return None;
        }

        self.render_catalog(target);
        let wants_sizes =
            navigation.first_catalog_visit || self.prefs.preferences().auto_detect_size;
        if !wants_sizes || self.size_batch_pending {
            return None;
        }
        let requests = self.size_requests();
        if requests.is_empty() {
            self.refresh_stats(target);
            self.render_catalog(target);
            return None;
        }
        self.size_batch_pending = true;
        Some(requests)
    }

    /// Items with a shipped size are cached directly; the rest need a lookup.
    fn size_requests(&mut self) -> Vec<SizeRequest> {
        let base_url = self.prefs.preferences().asset_base_url.clone();
        let mut requests = Vec::new();
        for item in self.catalog.items() {
            match item.size_bytes {
                Some(bytes) => {
                    self.sizes.insert(item.id, SizeLookup::Known(bytes));
                }
                None => requests.push(SizeRequest {
                    item_id: item.id,
                    url: item.asset_url(&base_url),
                }),
            }
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_item;
    use crate::constants::DOWNLOADS_KEY;
    use crate::db::MemoryStore;
    use crate::render::{Card, RecordingTarget, Stat};
    use crate::size::{resolve_all, SizeError, SizeSource};

    fn catalog() -> Catalog {
        Catalog::new(vec![test_item(1, "A"), test_item(2, "B"), test_item(3, "C")]).unwrap()
    }

    fn card_downloads(target: &RecordingTarget) -> Vec<String> {
        target
            .view
            .cards
            .iter()
            .filter_map(|c| match c {
                Card::Item(view) => Some(view.downloads.clone()),
                Card::Placeholder(_) => None,
            })
            .collect()
    }

    struct FixedSource;

    impl SizeSource for FixedSource {
        async fn head_length(&self, url: &str) -> Result<u64, SizeError> {
            if url.ends_with("A.rbxl") {
                Ok(2048)
            } else {
                Err(SizeError::MissingLength)
            }
        }

        async fn fetch_length(&self, url: &str) -> Result<u64, SizeError> {
            if url.ends_with("B.rbxl") {
                Ok(512)
            } else {
                Err(SizeError::Status(404))
            }
        }
    }

    #[test]
    fn boot_paints_stats_and_initial_section() {
        let mut site = Site::new(catalog(), MemoryStore::default(), None);
        let mut target = RecordingTarget::default();
        assert_eq!(site.boot(&mut target), None);
        assert_eq!(target.active_sections(), vec![Section::Home]);
        assert_eq!(target.view.stat(Stat::TotalItems), "3");
        assert_eq!(target.view.stat(Stat::TopItem), "None");
        assert_eq!(target.view.pending_visuals.len(), 4);
    }

    #[test]
    fn deep_link_to_catalog_requests_sizes_once() {
        let mut site = Site::new(catalog(), MemoryStore::default(), Some("#models"));
        let mut target = RecordingTarget::default();
        let requests = site.boot(&mut target).unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "http://localhost:8000/worlds/A.rbxl");
        assert!(site.size_batch_pending());

        site.navigate_to("home", &mut target);
        assert_eq!(site.navigate_to("models", &mut target), None);
    }

    #[test]
    fn revisit_reuses_cached_sizes() {
        let mut site = Site::new(catalog(), MemoryStore::default(), Some("#models"));
        let mut target = RecordingTarget::default();
        assert!(site.boot(&mut target).is_some());
        site.apply_sizes(
            vec![
                (1, SizeLookup::Known(2048)),
                (2, SizeLookup::Known(512)),
                (3, SizeLookup::Unknown),
            ],
            &mut target,
        );
        assert!(!site.size_batch_pending());
        assert!(!site.preferences().auto_detect_size);

        site.navigate_to("home", &mut target);
        assert_eq!(site.navigate_to("models", &mut target), None);
        assert!(!site.size_batch_pending());

        let sizes: Vec<String> = target
            .view
            .cards
            .iter()
            .filter_map(|c| match c {
                Card::Item(v) => Some(v.size.clone()),
                Card::Placeholder(_) => None,
            })
            .collect();
        assert_eq!(sizes, vec!["2.0 KB", "512 B", "Unknown"]);
        assert_eq!(site.size_of(1), Some(SizeLookup::Known(2048)));
    }

    #[tokio::test]
    async fn resolved_batch_repaints_cards() {
        let mut site = Site::new(catalog(), MemoryStore::default(), None);
        let mut target = RecordingTarget::default();
        site.boot(&mut target);
        let requests = site.navigate_to("models", &mut target).unwrap();
        assert!(matches!(&target.view.cards[0], Card::Item(v) if v.size == "Loading…"));

        let results = resolve_all(&FixedSource, requests).await;
        site.apply_sizes(results, &mut target);

        let sizes: Vec<String> = target
            .view
            .cards
            .iter()
            .filter_map(|c| match c {
                Card::Item(v) => Some(v.size.clone()),
                Card::Placeholder(_) => None,
            })
            .collect();
        assert_eq!(sizes, vec!["2.0 KB", "512 B", "Unknown"]);
        assert_eq!(target.view.stat(Stat::TotalSize), "2.5 KB");
        assert!(!site.size_batch_pending());
    }

    #[test]
    fn auto_detect_re_requests_on_every_visit() {
        let mut site = Site::new(catalog(), MemoryStore::default(), None);
        let mut target = RecordingTarget::default();
        site.set_preference(PreferenceChange::AutoDetectSize(true), &mut target)
            .unwrap();
        let first = site.navigate_to("models", &mut target).unwrap();
        site.apply_sizes(vec![(1, SizeLookup::Known(1))], &mut target);
        site.navigate_to("home", &mut target);
        let second = site.navigate_to("models", &mut target).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn shipped_sizes_skip_the_network() {
        let mut item = test_item(1, "A");
        item.size_bytes = Some(4096);
        let catalog = Catalog::new(vec![item]).unwrap();
        let mut site = Site::new(catalog, MemoryStore::default(), None);
        let mut target = RecordingTarget::default();
        assert_eq!(site.navigate_to("models", &mut target), None);
        assert_eq!(site.size_of(1), Some(SizeLookup::Known(4096)));
        assert!(matches!(&target.view.cards[0], Card::Item(v) if v.size == "4.0 KB"));
    }

    #[test]
    fn downloads_update_cards_and_stats() {
        let store = MemoryStore::default();
        let mut site = Site::new(catalog(), &store, Some("#models"));
        let mut target = RecordingTarget::default();
        site.boot(&mut target);

        for id in [1, 2, 2, 3, 3] {
            site.register_download(id, &mut target);
        }
        assert_eq!(site.register_download(99, &mut target), None);
        assert_eq!(card_downloads(&target), vec!["1", "2", "2"]);
        assert_eq!(target.view.stat(Stat::TotalDownloads), "5");
        assert_eq!(target.view.stat(Stat::TopItem), "B");
        assert!(store.get(DOWNLOADS_KEY).unwrap().is_some());
    }

    #[test]
    fn reset_zeroes_counts_everywhere() {
        let mut site = Site::new(catalog(), MemoryStore::default(), Some("#models"));
        let mut target = RecordingTarget::default();
        site.boot(&mut target);
        site.register_download(1, &mut target);
        site.reset_downloads(&mut target);
        for id in [1, 2, 3] {
            assert_eq!(site.count(id), 0);
        }
        assert_eq!(card_downloads(&target), vec!["0", "0", "0"]);
        assert_eq!(target.view.stat(Stat::TopItem), "None");
    }

    #[test]
    fn empty_catalog_end_to_end() {
        let mut site = Site::new(Catalog::default(), MemoryStore::default(), Some("#models"));
        let mut target = RecordingTarget::default();
        assert_eq!(site.boot(&mut target), None);
        assert_eq!(target.view.cards.len(), 1);
        assert!(matches!(target.view.cards[0], Card::Placeholder(_)));
        assert!(card_downloads(&target).is_empty());
        assert_eq!(target.view.stat(Stat::TotalItems), "0");
    }

    #[test]
    fn rejected_preference_changes_nothing() {
        let mut site = Site::new(catalog(), MemoryStore::default(), None);
        let mut target = RecordingTarget::default();
        let before = site.preferences().clone();
        assert!(site
            .set_preference(PreferenceChange::PrimaryColor("teal".into()), &mut target)
            .is_err());
        assert_eq!(site.preferences(), &before);
        assert!(target.view.pending_visuals.is_empty());
    }

    #[test]
    fn selection_only_accepts_catalog_ids() {
        let mut site = Site::new(catalog(), MemoryStore::default(), Some("#models"));
        assert!(!site.select_item(7));
        assert!(site.select_item(2));
        assert_eq!(site.selected_item().map(|i| i.title.as_str()), Some("B"));
    }
}
