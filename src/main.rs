#![windows_subsystem = "windows"]
//! RSM Catalog - Main entry point

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod app;
mod catalog;
mod constants;
mod db;
mod preferences;
mod render;
mod router;
mod site;
mod size;
mod stats;
mod theme;
mod types;
mod ui;

use app::App;
use catalog::Catalog;
use constants::*;
use db::Database;
use eframe::egui;
use site::Site;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Initialize file logging. Returns a guard that must be held for the app lifetime.
fn init_logging(data_dir: &std::path::Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "rsm-catalog.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rsm_catalog=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    guard
}

/// Open the settings database, falling back to an in-memory one so the
/// catalog still works when the data dir is unwritable
fn open_database(data_dir: &std::path::Path) -> Result<Database, db::StorageError> {
    let db_path = data_dir.join("rsm.db");
    match Database::open(&db_path) {
        Ok(db) => {
            info!(path = %db_path.display(), "Database opened");
            Ok(db)
        }
        Err(e) => {
            error!(
                error = %e,
                path = %db_path.display(),
                "Failed to open database, preferences will not persist"
            );
            Database::open_in_memory()
        }
    }
}

fn main() -> eframe::Result<()> {
    let data_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME);

    std::fs::create_dir_all(&data_dir).ok();

    // Initialize logging - guard must live for entire app lifetime
    let _log_guard = init_logging(&data_dir);

    info!(version = APP_VERSION, "RSM Catalog starting");

    let db = open_database(&data_dir).map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    match db.get_db_version() {
        Ok(Some(previous)) if previous != APP_VERSION => {
            info!(previous = %previous, current = APP_VERSION, "Upgraded from older version")
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Failed to read stored version"),
    }
    if let Err(e) = db.set_db_version(APP_VERSION) {
        warn!(error = %e, "Failed to store version");
    }

    let catalog = Catalog::load(&data_dir);

    // Deep link, e.g. `rsm-catalog "#models"`
    let fragment = std::env::args().nth(1);
    debug!(fragment = ?fragment, "Launch fragment");
    let site = Site::new(catalog, db, fragment.as_deref());

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1200.0, 780.0])
        .with_min_inner_size([900.0, 600.0])
        .with_title(APP_NAME);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| {
            let app = App::new(cc, site, data_dir)?;
            Ok(Box::new(app))
        }),
    )
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Finished size batches from the runtime
        self.poll_size_results();

        // Mouse side buttons and Alt+arrows walk the history
        if !ctx.wants_keyboard_input() {
            let (back, forward) = ctx.input(|i| {
                (
                    i.pointer.button_pressed(egui::PointerButton::Extra1)
                        || (i.modifiers.alt && i.key_pressed(egui::Key::ArrowLeft)),
                    i.pointer.button_pressed(egui::PointerButton::Extra2)
                        || (i.modifiers.alt && i.key_pressed(egui::Key::ArrowRight)),
                )
            });
            if back {
                self.go_back(ctx);
            }
            if forward {
                self.go_forward(ctx);
            }
        }

        self.apply_pending_visuals(ctx);
        self.sync_window_title(ctx);

        self.render_sidebar(ctx);

        let panel_frame = egui::Frame::new()
            .fill(self.appearance.palette().bg_base)
            .inner_margin(egui::Margin::same(theme::SPACING_XL as i8));
        egui::CentralPanel::default().frame(panel_frame).show(ctx, |ui| {
            self.render_location_bar(ui, ctx);
            self.render_active_section(ui, ctx);
        });

        self.render_modals(ctx);
        self.render_toast(ctx);

        if self.has_active_downloads() || self.site.size_batch_pending() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application shutting down");
        self.cancel_downloads();
    }
}
