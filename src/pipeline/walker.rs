use crate::error::ScanError;
use crate::pairing;
use crate::pipeline::classifier::VideoClassifier;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walk `source_dir`, classify every rear-camera recording, and copy
/// matched pairs into `dest_dir` under lowercased names. Aborts on the
/// first unreadable video, missing front file, or destination conflict.
pub fn process_tree(
    source_dir: &Path,
    dest_dir: &Path,
    classifier: &mut dyn VideoClassifier,
) -> Result<()> {
    tracing::info!("Processing directory {}", source_dir.display());

    fs::create_dir_all(dest_dir)
        .with_context(|| format!("failed to create destination {}", dest_dir.display()))?;

    let candidates = discover_rear_videos(source_dir);
    tracing::info!("Found {} rear-camera candidates", candidates.len());

    let pb = ProgressBar::new(candidates.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    for rear_path in &candidates {
        tracing::debug!("Processing video {}", rear_path.display());

        if classifier.contains_target(rear_path)? {
            copy_pair(rear_path, dest_dir)?;
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    Ok(())
}

/// All regular files under `root` whose name follows the rear-camera
/// convention. Unreadable directory entries are skipped.
fn discover_rear_videos(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(pairing::is_rear_video)
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect()
}

/// Copy both halves of a matched pair into `dest_dir`, lowercasing the
/// file names. Both members are validated before the first copy, so a
/// conflict or missing front file leaves the pair entirely uncopied.
fn copy_pair(rear_path: &Path, dest_dir: &Path) -> Result<()> {
    let rear_name = rear_path
        .file_name()
        .and_then(|s| s.to_str())
        .with_context(|| format!("invalid file name: {}", rear_path.display()))?;

    let front_file = pairing::front_name(rear_name)
        .with_context(|| format!("not a rear-camera file name: {}", rear_name))?;
    let front_path = rear_path.with_file_name(&front_file);

    if !front_path.is_file() {
        bail!(ScanError::MissingFrontFile {
            rear: rear_path.to_path_buf(),
            front: front_path,
        });
    }

    let rear_dest = dest_dir.join(rear_name.to_lowercase());
    let front_dest = dest_dir.join(front_file.to_lowercase());

    for dest in [&rear_dest, &front_dest] {
        if dest.exists() {
            bail!(ScanError::DestinationExists { path: dest.clone() });
        }
    }

    tracing::debug!("Copying {} to {}", rear_path.display(), rear_dest.display());
    fs::copy(rear_path, &rear_dest)
        .with_context(|| format!("failed to copy {}", rear_path.display()))?;

    tracing::debug!(
        "Copying {} to {}",
        front_path.display(),
        front_dest.display()
    );
    fs::copy(&front_path, &front_dest)
        .with_context(|| format!("failed to copy {}", front_path.display()))?;

    Ok(())
}
