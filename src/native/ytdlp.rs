use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::models::Song;
use crate::providers::{SongSource, SourceError, SourceId};

pub const NATIVE_SEARCH_LIMIT: u32 = 25;

/// Local search through the `yt-dlp` binary, available only when the binary
/// is installed on the host.
pub struct YtDlpSearch {
    binary: PathBuf,
    limit: u32,
}

impl YtDlpSearch {
    /// Capability probe. Resolves the binary without running it.
    pub fn detect(binary: &str) -> Option<Self> {
        let resolved = resolve_binary(binary)?;
        log::info!("Native search available via {}", resolved.display());
        Some(Self {
            binary: resolved,
            limit: NATIVE_SEARCH_LIMIT,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn search_args(&self, query: &str) -> Vec<String> {
        vec![
            "--flat-playlist".to_string(),
            "--dump-json".to_string(),
            "--no-warnings".to_string(),
            format!("ytsearch{}:{}", self.limit, query),
        ]
    }
}

pub fn resolve_binary(binary: &str) -> Option<PathBuf> {
    let candidate = Path::new(binary);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var).find_map(|dir| {
        let full = dir.join(binary);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = dir.join(format!("{}.exe", binary));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

/// One `--dump-json` line into a song. Lines that aren't JSON objects or
/// have no id/title are skipped.
pub fn parse_search_line(line: &str) -> Option<Song> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let data: Value = serde_json::from_str(line).ok()?;

    let id = data.get("id")?.as_str()?.to_string();
    let title = data.get("title")?.as_str()?.to_string();

    let channel = ["channel", "uploader"]
        .iter()
        .filter_map(|key| data.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    // yt-dlp lists thumbnails from lowest to highest resolution
    let thumbnail = data
        .get("thumbnails")
        .and_then(|t| t.as_array())
        .and_then(|arr| arr.last())
        .and_then(|t| t.get("url"))
        .or_else(|| data.get("thumbnail"))
        .and_then(|u| u.as_str())
        .unwrap_or_default()
        .to_string();

    let mut song = Song::new(id, title, thumbnail, channel);
    song.duration = data
        .get("duration")
        .and_then(|d| d.as_f64())
        .map(format_duration);
    song.views = data.get("view_count").and_then(|v| v.as_u64());

    song.is_valid().then_some(song)
}

pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[async_trait]
impl SongSource for YtDlpSearch {
    fn id(&self) -> SourceId {
        SourceId::Native
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn supports_related(&self) -> bool {
        false
    }

    async fn search(
        &self,
        query: &str,
        _credential: Option<&str>,
    ) -> Result<Vec<Song>, SourceError> {
        let output = Command::new(&self.binary)
            .args(self.search_args(query))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Unavailable(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let songs: Vec<Song> = stdout.lines().filter_map(parse_search_line).collect();
        log::debug!("yt-dlp returned {} results", songs.len());
        Ok(songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_line() {
        let line = r#"{"id": "abc", "title": "Song", "channel": "Artist - Topic",
            "uploader": "Someone", "duration": 215.0, "view_count": 1200,
            "thumbnails": [{"url": "https://small.jpg"}, {"url": "https://large.jpg"}]}"#
            .replace('\n', " ");

        let song = parse_search_line(&line).unwrap();

        assert_eq!(song.id, "abc");
        assert_eq!(song.channel, "Artist - Topic");
        assert_eq!(song.thumbnail, "https://large.jpg");
        assert_eq!(song.duration.as_deref(), Some("3:35"));
        assert_eq!(song.views, Some(1200));
    }

    #[test]
    fn test_parse_falls_back_for_missing_fields() {
        let with_uploader =
            parse_search_line(r#"{"id": "a", "title": "T", "uploader": "Up", "thumbnail": "https://t.jpg"}"#)
                .unwrap();
        assert_eq!(with_uploader.channel, "Up");
        assert_eq!(with_uploader.thumbnail, "https://t.jpg");
        assert_eq!(with_uploader.duration, None);

        let bare = parse_search_line(r#"{"id": "b", "title": "T", "channel": null}"#).unwrap();
        assert_eq!(bare.channel, "Unknown");
        assert_eq!(bare.thumbnail, "");
    }

    #[test]
    fn test_parse_skips_garbage() {
        assert!(parse_search_line("").is_none());
        assert!(parse_search_line("WARNING: something").is_none());
        assert!(parse_search_line(r#"{"title": "no id"}"#).is_none());
        assert!(parse_search_line(r#"{"id": "x", "title": ""}"#).is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(59.6), "1:00");
        assert_eq!(format_duration(3725.0), "1:02:05");
    }

    #[test]
    fn test_detect_missing_binary() {
        assert!(YtDlpSearch::detect("definitely-not-a-real-binary-aura").is_none());
        assert!(resolve_binary("/nonexistent/dir/yt-dlp").is_none());
    }

    #[test]
    fn test_detect_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("yt-dlp");
        std::fs::write(&fake, "").unwrap();

        let native = YtDlpSearch::detect(fake.to_str().unwrap()).unwrap();
        assert_eq!(native.binary(), fake.as_path());
        assert!(native.search_args("q").last().unwrap().starts_with("ytsearch25:"));
    }
}
