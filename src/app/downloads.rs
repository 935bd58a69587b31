//! Download logic

use super::App;
use crate::types::*;
use eframe::egui;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

fn set_status(state: &Mutex<DownloadState>, id: u32, status: DownloadStatus) {
    state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .downloads
        .insert(id, status);
}

/// Download one item file with progress tracking and cancellation support.
async fn download_item(
    id: u32,
    url: String,
    dest: PathBuf,
    state: Arc<Mutex<DownloadState>>,
    client: reqwest::Client,
    ctx: egui::Context,
    token: CancellationToken,
) {
    set_status(&state, id, DownloadStatus::Downloading(0, 0));
    ctx.request_repaint();

    let response = match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            warn!(id, url = %url, status = %response.status(), "Download failed");
            set_status(&state, id, DownloadStatus::Failed(format!("HTTP {}", response.status())));
            ctx.request_repaint();
            return;
        }
        Err(e) => {
            warn!(id, url = %url, error = %e, "Download failed");
            set_status(&state, id, DownloadStatus::Failed(e.to_string()));
            ctx.request_repaint();
            return;
        }
    };

    let total_size = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut bytes_vec = Vec::with_capacity(total_size as usize);
    let mut stream = response.bytes_stream();
    let mut last_repaint = std::time::Instant::now();

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!(id, "Download cancelled");
                set_status(&state, id, DownloadStatus::Cancelled);
                ctx.request_repaint();
                return;
            }
            chunk = stream.next() => {
                match chunk {
                    Some(Ok(data)) => {
                        downloaded += data.len() as u64;
                        bytes_vec.extend_from_slice(&data);
                        set_status(&state, id, DownloadStatus::Downloading(downloaded, total_size));
                        if last_repaint.elapsed() >= std::time::Duration::from_millis(100) {
                            ctx.request_repaint();
                            last_repaint = std::time::Instant::now();
                        }
                    }
                    Some(Err(e)) => {
                        warn!(id, error = %e, "Download stream failed");
                        set_status(&state, id, DownloadStatus::Failed(e.to_string()));
                        ctx.request_repaint();
                        return;
                    }
                    None => break,
                }
            }
        }
    }

    let status = match tokio::fs::write(&dest, &bytes_vec).await {
        Ok(()) => {
            info!(id, bytes = downloaded, path = %dest.display(), "Download complete");
            DownloadStatus::Complete(dest)
        }
        Err(e) => {
            warn!(id, error = %e, path = %dest.display(), "Failed to write download");
            DownloadStatus::Failed("Write failed".into())
        }
    };
    set_status(&state, id, status);
    ctx.request_repaint();
}

impl App {
    /// Count the download intent, then fetch the file in the background
    pub fn download_item(&mut self, ctx: &egui::Context, id: u32) {
        let Some(item) = self.site.catalog().get(id).cloned() else {
            return;
        };
        if self.is_downloading(id) {
            return;
        }

        self.site.register_download(id, &mut self.view);

        let dir = self.download_dir();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(error = %e, path = %dir.display(), "Failed to create download folder");
        }
        let url = item.asset_url(&self.site.preferences().asset_base_url);
        let dest = dir.join(&item.filename);
        info!(id, url = %url, path = %dest.display(), "Starting download");

        let token = self.cancel_token.get_or_insert_with(CancellationToken::new).clone();
        self.runtime.spawn(download_item(
            id,
            url,
            dest,
            self.download_state.clone(),
            self.http.clone(),
            ctx.clone(),
            token,
        ));
    }

    /// Cancel every running download
    pub fn cancel_downloads(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }

    /// Snapshot of the downloads panel rows, in item order
    pub fn download_rows(&self) -> Vec<(u32, DownloadStatus)> {
        let state = self.download_state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<(u32, DownloadStatus)> = state
            .downloads
            .iter()
            .map(|(id, status)| (*id, status.clone()))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows
    }

    pub fn is_downloading(&self, id: u32) -> bool {
        self.download_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_downloading(id)
    }

    pub fn has_active_downloads(&self) -> bool {
        self.download_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active_count()
            > 0
    }
}
