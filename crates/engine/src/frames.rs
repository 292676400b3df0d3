use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::debug;

use common::{Frame, FrameSource, Result};

/// Frame source backed by a watched directory of chart screenshots.
///
/// Whatever drops images into the directory (a capture tool, a cron job)
/// plays the role the browser's screen capture played; the newest image
/// wins. An empty directory means "no frame right now" and the cycle is
/// skipped.
pub struct DirFrameSource {
    dir: PathBuf,
}

impl DirFrameSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl FrameSource for DirFrameSource {
    async fn next_frame(&self) -> Result<Option<Frame>> {
        let Some(path) = newest_image(&self.dir).await? else {
            return Ok(None);
        };
        let data = tokio::fs::read(&path).await?;
        debug!(path = %path.display(), bytes = data.len(), "frame loaded");
        Ok(Some(Frame::new(mime_for(&path), data)))
    }
}

async fn newest_image(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(e) => e,
        // A missing directory is treated like an empty one.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_image(&path) {
            continue;
        }
        let modified = entry
            .metadata()
            .await?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, p)| p))
}

fn is_image(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("png" | "jpg" | "jpeg" | "webp")
    )
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}
