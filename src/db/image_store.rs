use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::BoardError;

/// Upload size cap.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// A file that passed the size and content checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageKind {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Check the size cap and sniff the content. Extensions are not trusted.
pub fn validate_image(path: &Path) -> Result<ImageKind, BoardError> {
    let meta = fs::metadata(path).map_err(|e| {
        BoardError::validation(format!("Cannot read image {}: {e}", path.display()))
    })?;
    if !meta.is_file() {
        return Err(BoardError::validation(format!("{} is not a file", path.display())));
    }
    if meta.len() > MAX_IMAGE_BYTES {
        return Err(BoardError::validation(format!(
            "Image is {} bytes; the limit is 5MB",
            meta.len()
        )));
    }

    let mut head = Vec::with_capacity(64);
    fs::File::open(path)?.take(64).read_to_end(&mut head)?;
    match infer::get(&head) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            debug!(mime = kind.mime_type(), "image sniffed");
            Ok(ImageKind {
                mime_type: kind.mime_type(),
                extension: kind.extension(),
            })
        }
        Some(kind) => Err(BoardError::validation(format!(
            "File type {} is not an image",
            kind.mime_type()
        ))),
        None => Err(BoardError::validation("File is not a recognized image type")),
    }
}

/// Copy a validated image into `dir` under a fresh name and return its URL.
pub fn store_image(dir: &Path, source: &Path) -> Result<String, BoardError> {
    let kind = validate_image(source)?;
    fs::create_dir_all(dir)?;
    let target: PathBuf = dir.join(format!("{}.{}", ulid::Ulid::new(), kind.extension));
    fs::copy(source, &target)?;
    let absolute = fs::canonicalize(&target)?;
    info!(path = %absolute.display(), mime = kind.mime_type, "image stored");
    Ok(format!("file://{}", absolute.display()))
}

/// Remove a stored copy that no task ended up referencing. URLs that do not
/// point directly into `dir` are left alone.
pub fn discard_image(dir: &Path, url: &str) -> Result<(), BoardError> {
    let Some(path) = url.strip_prefix("file://").map(Path::new) else {
        return Ok(());
    };
    let dir = fs::canonicalize(dir)?;
    if path.parent() != Some(dir.as_path()) {
        return Ok(());
    }
    fs::remove_file(path)?;
    debug!(path = %path.display(), "orphaned image removed");
    Ok(())
}
