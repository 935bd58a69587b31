//! Section routing: one active section, one active nav entry

use crate::constants::TITLE_PREFIX;
use crate::render::{Element, RenderTarget};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Home,
    Models,
    Settings,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Home, Section::Models, Section::Settings];

    pub fn id(self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::Models => "models",
            Section::Settings => "settings",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Parse `#models`, `models` or `rsm://#models`
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let id = fragment.rsplit('#').next().unwrap_or(fragment).trim();
        Self::from_id(id)
    }

    pub fn fragment(self) -> String {
        format!("#{}", self.id())
    }

    /// Sidebar label in the given language
    pub fn label(self, language: &str) -> &'static str {
        match (self, language) {
            (Section::Home, "es") => "Inicio",
            (Section::Models, "es") => "Modelos",
            (Section::Settings, "es") => "Ajustes",
            (Section::Home, _) => "Home",
            (Section::Models, _) => "Models",
            (Section::Settings, _) => "Settings",
        }
    }
}

/// Window title derived from the section id, e.g. "RSM - Models"
pub fn title_for(section: Section) -> String {
    let id = section.id();
    let mut chars = id.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };
    format!("{} - {}", TITLE_PREFIX, capitalized)
}

/// Outcome of a successful navigation; drives lazy work in the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub section: Section,
    /// True exactly once: the first time the catalog section is shown
    pub first_catalog_visit: bool,
    pub refresh_stats: bool,
}

#[derive(Debug)]
pub struct Router {
    current: Section,
    models_loaded: bool,
    selected_item: Option<u32>,
    back: Vec<Section>,
    forward: Vec<Section>,
}

impl Router {
    pub fn new(fragment: Option<&str>) -> Self {
        Self {
            current: fragment
                .and_then(Section::from_fragment)
                .unwrap_or(Section::Home),
            models_loaded: false,
            selected_item: None,
            back: Vec::new(),
            forward: Vec::new(),
        }
    }

    pub fn current(&self) -> Section {
        self.current
    }

    pub fn selected_item(&self) -> Option<u32> {
        self.selected_item
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    /// Show the section named `section_id`. Unknown ids and sections the
    /// target cannot show leave the view unchanged.
    pub fn navigate_to<T: RenderTarget + ?Sized>(
        &mut self,
        section_id: &str,
        target: &mut T,
    ) -> Option<Navigation> {
        let Some(section) = Section::from_id(section_id) else {
            debug!(section_id, "Ignoring navigation to unknown section");
            return None;
        };
        let previous = self.current;
        let navigation = self.show(section, target)?;
        if previous != section {
            self.back.push(previous);
            self.forward.clear();
        }
        Some(navigation)
    }

    /// Follow a changed deep-link fragment; anything unrecognized shows home
    pub fn on_fragment_change<T: RenderTarget + ?Sized>(
        &mut self,
        fragment: &str,
        target: &mut T,
    ) -> Option<Navigation> {
        let section = Section::from_fragment(fragment).unwrap_or(Section::Home);
        self.navigate_to(section.id(), target)
    }

    pub fn back<T: RenderTarget + ?Sized>(&mut self, target: &mut T) -> Option<Navigation> {
        let section = self.back.pop()?;
        let previous = self.current;
        match self.show(section, target) {
            Some(navigation) => {
                self.forward.push(previous);
                Some(navigation)
            }
            None => {
                self.back.push(section);
                None
            }
        }
    }

    pub fn forward<T: RenderTarget + ?Sized>(&mut self, target: &mut T) -> Option<Navigation> {
        let section = self.forward.pop()?;
        let previous = self.current;
        match self.show(section, target) {
            Some(navigation) => {
                self.back.push(previous);
                Some(navigation)
            }
            None => {
                self.forward.push(section);
                None
            }
        }
    }

    pub fn select_item(&mut self, id: u32) {
        self.selected_item = Some(id);
    }

    pub fn clear_selection(&mut self) {
        self.selected_item = None;
    }

    fn show<T: RenderTarget + ?Sized>(
        &mut self,
        section: Section,
        target: &mut T,
    ) -> Option<Navigation> {
        if !target.has(Element::Section(section)) {
            debug!(section = section.id(), "Section not present, view unchanged");
            return None;
        }

        for other in Section::ALL {
            if target.has(Element::Section(other)) {
                target.set_section_active(other, false);
            }
            if target.has(Element::Nav(other)) {
                target.set_nav_active(other, false);
            }
        }
        target.set_section_active(section, true);
        if target.has(Element::Nav(section)) {
            target.set_nav_active(section, true);
        }

        self.current = section;
        if section != Section::Models {
            self.selected_item = None;
        }
        target.set_title(&title_for(section));
        target.set_fragment(&section.fragment());

        let first_catalog_visit = section == Section::Models && !self.models_loaded;
        if first_catalog_visit {
            self.models_loaded = true;
        }
        debug!(section = section.id(), "Showing section");

        Some(Navigation {
            section,
            first_catalog_visit,
            refresh_stats: section == Section::Home,
        })
    }
}
