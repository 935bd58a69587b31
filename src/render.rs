//! Card projection and the render-target seam
//!
//! The core never touches egui directly. It paints through [`RenderTarget`],
//! asking [`RenderTarget::has`] before writing to any element so an absent
//! element is a skipped branch rather than a failure. [`ViewModel`] is the
//! target the egui shell reads every frame.

use crate::catalog::Catalog;
use crate::preferences::VisualEffect;
use crate::router::Section;
use crate::size::SizeLookup;
use std::collections::{BTreeMap, HashMap};

pub const LOADING_TEXT: &str = "Loading…";
pub const EMPTY_CATALOG_TEXT: &str = "No models available.";

/// Addressable parts of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Section(Section),
    Nav(Section),
    Cards,
    Stat(Stat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stat {
    TotalItems,
    TotalSize,
    TotalDownloads,
    TopItem,
    LastUpdate,
}

impl Stat {
    pub const ALL: [Stat; 5] = [
        Stat::TotalItems,
        Stat::TotalSize,
        Stat::TotalDownloads,
        Stat::TopItem,
        Stat::LastUpdate,
    ];
}

/// Everything a card shows about one item
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub item_id: u32,
    pub title: String,
    pub description: String,
    pub category: String,
    pub format: String,
    pub size: String,
    pub downloads: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Card {
    Item(CardView),
    Placeholder(String),
}

pub trait RenderTarget {
    fn has(&self, element: Element) -> bool;
    fn set_section_active(&mut self, section: Section, active: bool);
    fn set_nav_active(&mut self, section: Section, active: bool);
    fn set_title(&mut self, title: &str);
    fn set_fragment(&mut self, fragment: &str);
    fn clear_cards(&mut self);
    fn render_card(&mut self, card: &Card);
    fn render_stat(&mut self, stat: Stat, value: &str);
    fn apply_visual(&mut self, effect: &VisualEffect);
}

/// Project the catalog into cards, in catalog order. An empty catalog
/// yields a single placeholder.
pub fn build_cards(
    catalog: &Catalog,
    counters: &BTreeMap<u32, u64>,
    sizes: &HashMap<u32, SizeLookup>,
    base_url: &str,
) -> Vec<Card> {
    if catalog.is_empty() {
        return vec![Card::Placeholder(EMPTY_CATALOG_TEXT.to_string())];
    }

    catalog
        .items()
        .iter()
        .map(|item| {
            let size = match sizes.get(&item.id) {
                Some(lookup) => lookup.display(),
                None => item
                    .size_bytes
                    .map(|bytes| SizeLookup::Known(bytes).display())
                    .unwrap_or_else(|| LOADING_TEXT.to_string()),
            };
            Card::Item(CardView {
                item_id: item.id,
                title: item.title.clone(),
                description: item.description.trim().to_string(),
                category: item
                    .category
                    .clone()
                    .unwrap_or_else(|| "Uncategorized".to_string()),
                format: item.format(),
                size,
                downloads: group_thousands(counters.get(&item.id).copied().unwrap_or(0)),
                download_url: item.asset_url(base_url),
            })
        })
        .collect()
}

/// Replace the card container contents; no-op when the container is absent
pub fn paint_catalog<T: RenderTarget + ?Sized>(target: &mut T, cards: &[Card]) -> bool {
    if !target.has(Element::Cards) {
        return false;
    }
    target.clear_cards();
    for card in cards {
        target.render_card(card);
    }
    true
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// What the egui shell paints from
#[derive(Debug, Default)]
pub struct ViewModel {
    pub sections: BTreeMap<Section, bool>,
    pub navs: BTreeMap<Section, bool>,
    pub title: String,
    pub fragment: String,
    pub cards: Vec<Card>,
    pub stats: BTreeMap<Stat, String>,
    /// Effects not yet applied to the egui context
    pub pending_visuals: Vec<VisualEffect>,
}

impl ViewModel {
    pub fn active_section(&self) -> Option<Section> {
        self.sections
            .iter()
            .find_map(|(section, active)| active.then_some(*section))
    }

    pub fn is_nav_active(&self, section: Section) -> bool {
        self.navs.get(&section).copied().unwrap_or(false)
    }

    pub fn stat(&self, stat: Stat) -> &str {
        self.stats.get(&stat).map(String::as_str).unwrap_or("-")
    }
}

impl RenderTarget for ViewModel {
    fn has(&self, _element: Element) -> bool {
        true
    }

    fn set_section_active(&mut self, section: Section, active: bool) {
        self.sections.insert(section, active);
    }

    fn set_nav_active(&mut self, section: Section, active: bool) {
        self.navs.insert(section, active);
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.fragment = fragment.to_string();
    }

    fn clear_cards(&mut self) {
        self.cards.clear();
    }

    fn render_card(&mut self, card: &Card) {
        self.cards.push(card.clone());
    }

    fn render_stat(&mut self, stat: Stat, value: &str) {
        self.stats.insert(stat, value.to_string());
    }

    fn apply_visual(&mut self, effect: &VisualEffect) {
        if *effect != VisualEffect::None {
            self.pending_visuals.push(effect.clone());
        }
    }
}

/// In-memory target with removable elements. Writing to an element that
/// `has` reported absent panics, so tests catch unchecked writes.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingTarget {
    pub view: ViewModel,
    pub missing: std::collections::HashSet<Element>,
}

#[cfg(test)]
impl RecordingTarget {
    pub fn without(elements: &[Element]) -> Self {
        Self {
            view: ViewModel::default(),
            missing: elements.iter().copied().collect(),
        }
    }

    fn check(&self, element: Element) {
        assert!(!self.missing.contains(&element), "wrote to missing {:?}", element);
    }

    pub fn active_sections(&self) -> Vec<Section> {
        self.view
            .sections
            .iter()
            .filter_map(|(s, active)| active.then_some(*s))
            .collect()
    }

    pub fn active_navs(&self) -> Vec<Section> {
        self.view
            .navs
            .iter()
            .filter_map(|(s, active)| active.then_some(*s))
            .collect()
    }
}

#[cfg(test)]
impl RenderTarget for RecordingTarget {
    fn has(&self, element: Element) -> bool {
        !self.missing.contains(&element)
    }

    fn set_section_active(&mut self, section: Section, active: bool) {
        self.check(Element::Section(section));
        self.view.set_section_active(section, active);
    }

    fn set_nav_active(&mut self, section: Section, active: bool) {
        self.check(Element::Nav(section));
        self.view.set_nav_active(section, active);
    }

    fn set_title(&mut self, title: &str) {
        self.view.set_title(title);
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.view.set_fragment(fragment);
    }

    fn clear_cards(&mut self) {
        self.check(Element::Cards);
        self.view.clear_cards();
    }

    fn render_card(&mut self, card: &Card) {
        self.check(Element::Cards);
        self.view.render_card(card);
    }

    fn render_stat(&mut self, stat: Stat, value: &str) {
        self.check(Element::Stat(stat));
        self.view.render_stat(stat, value);
    }

    fn apply_visual(&mut self, effect: &VisualEffect) {
        self.view.apply_visual(effect);
    }
}
