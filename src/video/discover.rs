use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::InputConfig;
use crate::video::Video;

/// Videos directly inside `folder` (not recursive), sorted by path.
pub fn scan_folder(folder: &Path, extensions: &[String]) -> Result<Vec<Video>> {
    let mut videos = Vec::new();

    if !folder.exists() {
        tracing::warn!("Input folder does not exist: {}", folder.display());
        return Ok(videos);
    }

    for entry in std::fs::read_dir(folder)
        .with_context(|| format!("Failed to read folder {}", folder.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if has_video_extension(&path, extensions) {
            videos.push(Video::new(path));
        }
    }

    videos.sort_by(|a, b| a.path.cmp(&b.path)); // deterministic order
    Ok(videos)
}

/// Every target folder for the run: each input folder, then (optionally)
/// its immediate subfolders.
pub fn target_folders(input: &InputConfig) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for folder in &input.folders {
        folders.push(folder.clone());
        if !input.include_subfolders || !folder.is_dir() {
            continue;
        }
        let mut subfolders = Vec::new();
        for entry in std::fs::read_dir(folder)
            .with_context(|| format!("Failed to read folder {}", folder.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                subfolders.push(entry.path());
            }
        }
        subfolders.sort();
        folders.extend(subfolders);
    }
    Ok(folders)
}

/// Discover all videos across the configured folders.
pub fn discover_videos(input: &InputConfig) -> Result<Vec<Video>> {
    let mut videos = Vec::new();
    for folder in target_folders(input)? {
        let found = scan_folder(&folder, &input.extensions)?;
        tracing::debug!("{}: {} video(s)", folder.display(), found.len());
        videos.extend(found);
    }
    Ok(videos)
}

fn has_video_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| {
            let e = e.to_string_lossy();
            extensions.iter().any(|want| want.eq_ignore_ascii_case(&e))
        })
        .unwrap_or(false)
}
