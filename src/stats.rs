//! Aggregate statistics shown on the home section

use crate::catalog::Catalog;
use crate::render::{group_thousands, Element, RenderTarget, Stat};
use crate::size::{format_size, parse_size, SizeLookup};
use std::collections::{BTreeMap, HashMap};

pub const NO_TOP_ITEM: &str = "None";

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub total_items: usize,
    /// `None` while no size is known
    pub total_size: Option<u64>,
    pub total_downloads: u64,
    pub top_item: Option<String>,
    pub last_update: Option<chrono::NaiveDate>,
}

impl Stats {
    pub fn compute(
        catalog: &Catalog,
        counters: &BTreeMap<u32, u64>,
        sizes: &HashMap<u32, SizeLookup>,
    ) -> Self {
        // Totals are summed from the displayed strings so they agree with the cards.
        let known: Vec<u64> = catalog
            .items()
            .iter()
            .filter_map(|item| sizes.get(&item.id).and_then(|lookup| lookup.bytes()))
            .filter_map(|bytes| parse_size(&format_size(bytes)))
            .collect();
        let total_size = (!known.is_empty()).then(|| known.iter().sum());

        let mut top_item = None;
        let mut max = 0;
        for item in catalog.items() {
            let count = counters.get(&item.id).copied().unwrap_or(0);
            if count > max {
                max = count;
                top_item = Some(item.title.clone());
            }
        }

        Self {
            total_items: catalog.len(),
            total_size,
            total_downloads: counters.values().sum(),
            top_item,
            last_update: catalog.items().iter().filter_map(|item| item.added_date).max(),
        }
    }

    pub fn display(&self, stat: Stat) -> String {
        match stat {
            Stat::TotalItems => self.total_items.to_string(),
            Stat::TotalSize => self
                .total_size
                .map(format_size)
                .unwrap_or_else(|| "Unknown".to_string()),
            Stat::TotalDownloads => group_thousands(self.total_downloads),
            Stat::TopItem => self
                .top_item
                .clone()
                .unwrap_or_else(|| NO_TOP_ITEM.to_string()),
            Stat::LastUpdate => self
                .last_update
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }

    /// Write every stat whose element is present
    pub fn paint<T: RenderTarget + ?Sized>(&self, target: &mut T) {
        for stat in Stat::ALL {
            if target.has(Element::Stat(stat)) {
                target.render_stat(stat, &self.display(stat));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_item;
    use crate::render::RecordingTarget;
    use chrono::NaiveDate;

    fn abc() -> Catalog {
        Catalog::new(vec![test_item(1, "A"), test_item(2, "B"), test_item(3, "C")]).unwrap()
    }

    #[test]
    fn first_max_wins_ties() {
        let counters = BTreeMap::from([(1, 3), (2, 5), (3, 5)]);
        let stats = Stats::compute(&abc(), &counters, &HashMap::new());
        assert_eq!(stats.top_item.as_deref(), Some("B"));
        assert_eq!(stats.total_downloads, 13);
    }

    #[test]
    fn no_downloads_reports_none() {
        let stats = Stats::compute(&abc(), &BTreeMap::new(), &HashMap::new());
        assert_eq!(stats.display(Stat::TopItem), NO_TOP_ITEM);
        assert_eq!(stats.display(Stat::TotalDownloads), "0");
        assert_eq!(stats.display(Stat::TotalSize), "Unknown");
        assert_eq!(stats.display(Stat::LastUpdate), "N/A");
    }

    #[test]
    fn total_size_skips_unknown() {
        let sizes = HashMap::from([
            (1, SizeLookup::Known(1024)),
            (2, SizeLookup::Unknown),
            (3, SizeLookup::Known(1536)),
        ]);
        let stats = Stats::compute(&abc(), &BTreeMap::new(), &sizes);
        assert_eq!(stats.total_size, Some(2560));
        assert_eq!(stats.display(Stat::TotalSize), "2.5 KB");
        assert_eq!(stats.display(Stat::TotalItems), "3");
    }

    #[test]
    fn last_update_is_latest_added_date() {
        let mut a = test_item(1, "A");
        a.added_date = NaiveDate::from_ymd_opt(2025, 1, 16);
        let mut b = test_item(2, "B");
        b.added_date = NaiveDate::from_ymd_opt(2025, 4, 2);
        let catalog = Catalog::new(vec![a, b, test_item(3, "C")]).unwrap();
        let stats = Stats::compute(&catalog, &BTreeMap::new(), &HashMap::new());
        assert_eq!(stats.display(Stat::LastUpdate), "2025-04-02");
    }

    #[test]
    fn paint_skips_missing_elements() {
        let mut target = RecordingTarget::without(&[Element::Stat(Stat::TopItem)]);
        Stats::compute(&abc(), &BTreeMap::new(), &HashMap::new()).paint(&mut target);
        assert_eq!(target.view.stats.len(), Stat::ALL.len() - 1);
        assert!(!target.view.stats.contains_key(&Stat::TopItem));
        assert_eq!(target.view.stat(Stat::TotalItems), "3");
    }
}
