use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort the whole run. Each one unwinds to the
/// top level; nothing is retried or skipped.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A rear video could not be opened for decoding.
    #[error("unreadable media file: {}", path.display())]
    UnreadableMedia { path: PathBuf },

    /// A matched rear video has no front-camera counterpart on disk.
    #[error("missing front file {} for rear file {}", front.display(), rear.display())]
    MissingFrontFile { rear: PathBuf, front: PathBuf },

    /// A computed destination path is already occupied.
    #[error("file already exists: {}", path.display())]
    DestinationExists { path: PathBuf },
}
