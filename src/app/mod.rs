//! App module - egui shell around the [`Site`] core

mod downloads;
mod modals;
mod views;

use crate::db::Database;
use crate::preferences::{PreferenceChange, PreferenceError};
use crate::render::ViewModel;
use crate::router::Section;
use crate::site::Site;
use crate::size::{resolve_all, HttpSizeSource, SizeLookup, SizeRequest};
use crate::theme::{self, Appearance};
use crate::types::DownloadState;
use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ============================================================================
// APP STATE
// ============================================================================

pub struct App {
    pub(crate) site: Site<Database>,
    pub(crate) view: ViewModel,
    pub(crate) appearance: Appearance,
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) http: reqwest::Client,
    // Size batches finished on the runtime, drained on the UI thread
    pub(crate) size_tx: Sender<Vec<(u32, SizeLookup)>>,
    pub(crate) size_rx: Receiver<Vec<(u32, SizeLookup)>>,
    // Download state
    pub(crate) download_state: Arc<Mutex<DownloadState>>,
    pub(crate) cancel_token: Option<CancellationToken>,
    pub(crate) data_dir: PathBuf,
    // Dialogs
    pub(crate) show_reset_confirm: bool,
    pub(crate) show_easter_egg: bool,
    // Settings form buffers
    pub(crate) color_input: String,
    pub(crate) base_url_input: String,
    pub(crate) location_input: String,
    pub(crate) settings_error: Option<String>,
    // Toast notification
    pub(crate) toast_message: Option<String>,
    pub(crate) toast_start: Option<std::time::Instant>,
    pub(crate) window_title: String,
}

// ============================================================================
// APP INITIALIZATION & HELPERS
// ============================================================================

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        site: Site<Database>,
        data_dir: PathBuf,
    ) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (size_tx, size_rx) = channel();

        let prefs = site.preferences();
        let color_input = prefs.primary_color.clone();
        let base_url_input = prefs.asset_base_url.clone();

        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let mut app = Self {
            site,
            view: ViewModel::default(),
            appearance: Appearance::default(),
            runtime,
            http: reqwest::Client::new(),
            size_tx,
            size_rx,
            download_state: Arc::new(Mutex::new(DownloadState::default())),
            cancel_token: None,
            data_dir,
            show_reset_confirm: false,
            show_easter_egg: false,
            color_input,
            base_url_input,
            location_input: String::new(),
            settings_error: None,
            toast_message: None,
            toast_start: None,
            window_title: String::new(),
        };

        if let Some(requests) = app.site.boot(&mut app.view) {
            app.start_size_batch(requests, &cc.egui_ctx);
        }
        app.apply_pending_visuals(&cc.egui_ctx);
        Ok(app)
    }

    /// Sidebar click or deep link
    pub fn navigate(&mut self, ctx: &egui::Context, section: Section) {
        if let Some(requests) = self.site.navigate_to(section.id(), &mut self.view) {
            self.start_size_batch(requests, ctx);
        }
    }

    /// Fragment typed into the location bar
    pub fn open_fragment(&mut self, ctx: &egui::Context, fragment: &str) {
        if let Some(requests) = self.site.on_fragment_change(fragment, &mut self.view) {
            self.start_size_batch(requests, ctx);
        }
        self.location_input = self.view.fragment.clone();
    }

    pub fn go_back(&mut self, ctx: &egui::Context) {
        if let Some(requests) = self.site.back(&mut self.view) {
            self.start_size_batch(requests, ctx);
        }
    }

    pub fn go_forward(&mut self, ctx: &egui::Context) {
        if let Some(requests) = self.site.forward(&mut self.view) {
            self.start_size_batch(requests, ctx);
        }
    }

    /// Resolve a size batch off the UI thread
    pub fn start_size_batch(&self, requests: Vec<SizeRequest>, ctx: &egui::Context) {
        info!(count = requests.len(), "Starting size batch");
        let source = HttpSizeSource::new(self.http.clone());
        let tx = self.size_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let results = resolve_all(&source, requests).await;
            if tx.send(results).is_err() {
                debug!("Size batch finished after shutdown");
            }
            ctx.request_repaint();
        });
    }

    /// Apply finished size batches to the site
    pub fn poll_size_results(&mut self) {
        while let Ok(results) = self.size_rx.try_recv() {
            self.site.apply_sizes(results, &mut self.view);
        }
    }

    pub fn set_preference(&mut self, ctx: &egui::Context, change: PreferenceChange) {
        let edits_text_field = matches!(
            change,
            PreferenceChange::PrimaryColor(_) | PreferenceChange::AssetBaseUrl(_)
        );
        match self.site.set_preference(change, &mut self.view) {
            Ok(()) => {
                self.settings_error = None;
                if edits_text_field {
                    self.sync_settings_inputs();
                }
                self.apply_pending_visuals(ctx);
            }
            Err(e) => {
                warn!(error = %e, "Preference change rejected");
                self.settings_error = Some(e.to_string());
                if matches!(e, PreferenceError::InvalidColor(_) | PreferenceError::InvalidUrl(_)) {
                    self.sync_settings_inputs();
                }
            }
        }
    }

    /// Reset the free-text settings fields to the stored values
    fn sync_settings_inputs(&mut self) {
        let prefs = self.site.preferences();
        self.color_input = prefs.primary_color.clone();
        self.base_url_input = prefs.asset_base_url.clone();
    }

    /// Fold queued visual effects into the egui style
    pub fn apply_pending_visuals(&mut self, ctx: &egui::Context) {
        let mut rebuild = false;
        for effect in self.view.pending_visuals.drain(..) {
            rebuild |= self.appearance.apply(&effect);
        }
        if rebuild {
            theme::apply_visuals(ctx, &self.appearance);
        }
    }

    /// Push the router's title to the window when it changes
    pub fn sync_window_title(&mut self, ctx: &egui::Context) {
        if self.view.title != self.window_title {
            self.window_title = self.view.title.clone();
            self.location_input = self.view.fragment.clone();
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.window_title.clone()));
        }
    }

    pub fn show_toast(&mut self, message: impl Into<String>) {
        self.toast_message = Some(message.into());
        self.toast_start = Some(std::time::Instant::now());
    }

    pub fn language(&self) -> &str {
        &self.site.preferences().language
    }

    pub fn download_dir(&self) -> PathBuf {
        self.site
            .preferences()
            .download_path
            .as_ref()
            .map(PathBuf::from)
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| self.data_dir.join("downloads"))
    }
}
