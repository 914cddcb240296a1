use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::broadcast;

use crate::errors::AppError;

const MAX_FILE_STEM_CHARS: usize = 100;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DownloadEvent {
    Started {
        song_id: String,
        title: String,
        path: PathBuf,
    },
    Progress {
        song_id: String,
        percent: f32,
    },
    Completed {
        song_id: String,
        success: bool,
        path: PathBuf,
    },
}

/// MP3 export through `yt-dlp`. Downloads run on background tasks and report
/// through [`DownloadManager::subscribe`]; callers never wait on them.
pub struct DownloadManager {
    binary: PathBuf,
    download_dir: Mutex<PathBuf>,
    active_downloads: Arc<Mutex<HashSet<String>>>, // Song ids being downloaded
    events: broadcast::Sender<DownloadEvent>,
}

impl DownloadManager {
    pub fn new(binary: impl Into<PathBuf>, download_dir: PathBuf) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            binary: binary.into(),
            download_dir: Mutex::new(download_dir),
            active_downloads: Arc::new(Mutex::new(HashSet::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.events.subscribe()
    }

    pub fn get_download_path(&self) -> PathBuf {
        self.download_dir.lock().clone()
    }

    pub fn set_download_path(&self, path: PathBuf) {
        *self.download_dir.lock() = path;
    }

    pub fn is_active(&self, song_id: &str) -> bool {
        self.active_downloads.lock().contains(song_id)
    }

    pub fn target_path(&self, song_id: &str, title: &str) -> PathBuf {
        let stem = sanitize_filename(title);
        let stem = if stem.trim().is_empty() {
            sanitize_filename(song_id)
        } else {
            stem
        };
        self.get_download_path().join(format!("{}.mp3", stem))
    }

    /// Start a download and return where the file will land. The worker runs
    /// on the ambient tokio runtime; without one the call fails up front.
    pub fn start(&self, song_id: &str, title: &str) -> Result<PathBuf, AppError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| AppError::Internal(format!("No async runtime for downloads: {}", e)))?;

        {
            let mut active = self.active_downloads.lock();
            if active.contains(song_id) {
                return Err(AppError::Download(format!(
                    "Download already in progress: {}",
                    title
                )));
            }
            active.insert(song_id.to_string());
        }

        let path = self.target_path(song_id, title);
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                self.active_downloads.lock().remove(song_id);
                return Err(e.into());
            }
        }

        log::info!("Downloading {} to {}", song_id, path.display());
        let _ = self.events.send(DownloadEvent::Started {
            song_id: song_id.to_string(),
            title: title.to_string(),
            path: path.clone(),
        });

        let binary = self.binary.clone();
        let events = self.events.clone();
        let active_downloads = self.active_downloads.clone();
        let song_id = song_id.to_string();
        let target = path.clone();

        runtime.spawn(async move {
            let success = match download_worker(&binary, &song_id, &target, &events).await {
                Ok(success) => success,
                Err(e) => {
                    log::error!("Download of {} failed: {}", song_id, e);
                    false
                }
            };

            active_downloads.lock().remove(&song_id);
            let _ = events.send(DownloadEvent::Completed {
                song_id,
                success,
                path: target,
            });
        });

        Ok(path)
    }
}

pub fn download_args(song_id: &str, path: &Path) -> Vec<String> {
    vec![
        "-f".to_string(),
        "bestaudio".to_string(),
        "--extract-audio".to_string(),
        "--audio-format".to_string(),
        "mp3".to_string(),
        "--audio-quality".to_string(),
        "0".to_string(),
        "--progress".to_string(),
        "--newline".to_string(),
        "-o".to_string(),
        path.to_string_lossy().to_string(),
        video_url(song_id),
    ]
}

pub fn video_url(song_id: &str) -> String {
    format!(
        "https://www.youtube.com/watch?v={}",
        urlencoding::encode(song_id)
    )
}

async fn download_worker(
    binary: &Path,
    song_id: &str,
    path: &Path,
    events: &broadcast::Sender<DownloadEvent>,
) -> Result<bool, AppError> {
    let mut child = Command::new(binary)
        .args(download_args(song_id, path))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::Download(format!("Could not start {}: {}", binary.display(), e)))?;

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                log::warn!("[yt-dlp] {}", line);
            }
        });
    }

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            log::debug!("[yt-dlp] {}", line);
            if let Some(percent) = parse_progress(&line) {
                let _ = events.send(DownloadEvent::Progress {
                    song_id: song_id.to_string(),
                    percent,
                });
            }
        }
    }

    let status = child.wait().await?;
    log::info!("yt-dlp exited with {} for {}", status, song_id);
    Ok(status.success())
}

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.\d+)%").expect("valid progress regex"))
}

/// Percentage from a `[download]  42.3% of ...` line.
pub fn parse_progress(line: &str) -> Option<f32> {
    if !line.contains("[download]") {
        return None;
    }
    progress_regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .take(MAX_FILE_STEM_CHARS)
        .collect()
}
