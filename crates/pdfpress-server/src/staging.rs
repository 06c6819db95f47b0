// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// On-disk staging for uploads and compressed outputs.
//
// Layout under the staging root:
//
//   uploads/{download_id}_{filename}      input while it is being compressed
//   compressed/{download_id}_{filename}   output waiting for its one download
//
// Every file is created through a `StagedFile` guard that removes it on drop,
// so an early return anywhere in a handler leaves nothing behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pdfpress_core::DownloadId;
use pdfpress_core::error::{PdfpressError, Result};
use tracing::{debug, info, warn};

const UPLOADS_DIR: &str = "uploads";
const COMPRESSED_DIR: &str = "compressed";

/// Suffix of outputs that a download has claimed but not yet finished reading.
pub const CLAIMED_SUFFIX: &str = ".claimed";

/// Used when sanitising leaves nothing of the client's filename.
const FALLBACK_FILENAME: &str = "document.pdf";

/// The two staging directories.
#[derive(Debug, Clone)]
pub struct StagingArea {
    uploads: PathBuf,
    compressed: PathBuf,
}

impl StagingArea {
    /// Create (if needed) `uploads/` and `compressed/` under `root`.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let area = Self {
            uploads: root.join(UPLOADS_DIR),
            compressed: root.join(COMPRESSED_DIR),
        };
        std::fs::create_dir_all(&area.uploads)?;
        std::fs::create_dir_all(&area.compressed)?;
        info!(root = %root.display(), "staging area ready");
        Ok(area)
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn compressed_dir(&self) -> &Path {
        &self.compressed
    }

    /// Guard for the upload of `filename` (already sanitised).
    pub fn stage_upload(&self, id: DownloadId, filename: &str) -> StagedFile {
        StagedFile::new(self.uploads.join(entry_name(id, filename)))
    }

    /// Guard for the compressed output `filename` (already sanitised).
    pub fn stage_output(&self, id: DownloadId, filename: &str) -> StagedFile {
        StagedFile::new(self.compressed.join(entry_name(id, filename)))
    }

    /// Take the compressed output for `id`/`filename` and return its bytes.
    ///
    /// The file is first renamed to a claimed name, so of two concurrent
    /// downloads only one can win; the claimed file is removed once read.
    pub async fn claim_output(&self, id: DownloadId, filename: &str) -> Result<Vec<u8>> {
        let entry = entry_name(id, filename);
        let path = self.compressed.join(&entry);
        let claimed = StagedFile::new(self.compressed.join(format!("{entry}{CLAIMED_SUFFIX}")));

        match tokio::fs::rename(&path, claimed.path()).await {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                // Nothing was moved, so there is nothing for the guard to remove.
                claimed.keep();
                return Err(PdfpressError::NotFound(entry));
            }
            Err(err) => {
                claimed.keep();
                return Err(err.into());
            }
        }

        let bytes = tokio::fs::read(claimed.path()).await?;
        debug!(%id, bytes = bytes.len(), "output claimed");
        Ok(bytes)
    }
}

/// A staged file that is deleted when dropped unless [`StagedFile::keep`]
/// was called.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    keep: bool,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leave the file on disk and return its path.
    pub fn keep(mut self) -> PathBuf {
        self.keep = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "staged file removed"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), %err, "failed to remove staged file"),
        }
    }
}

fn entry_name(id: DownloadId, filename: &str) -> String {
    format!("{id}_{filename}")
}

// -- Filenames ----------------------------------------------------------------

/// Reduce a client-supplied filename to something safe to put on disk.
///
/// Non-ASCII characters are dropped, path separators become spaces, runs of
/// whitespace become `_`, anything outside `[A-Za-z0-9._-]` is removed and
/// leading or trailing `.`/`_` are trimmed. May return an empty string.
pub fn sanitize_filename(raw: &str) -> String {
    let ascii: String = raw
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();
    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");
    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Sanitised upload name, falling back to a fixed name when nothing is left.
pub fn upload_filename(raw: &str) -> String {
    let name = sanitize_filename(raw);
    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name
    }
}

/// `report.pdf` becomes `report_compressed.pdf`.
pub fn compressed_filename(upload_name: &str) -> String {
    let stem = match upload_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => upload_name,
    };
    format!("{stem}_compressed.pdf")
}

/// Whether the client's filename has a `.pdf` extension, in any case.
pub fn has_pdf_extension(raw: &str) -> bool {
    raw.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> (tempfile::TempDir, StagingArea) {
        let dir = tempfile::tempdir().expect("tempdir");
        let area = StagingArea::create(dir.path()).expect("staging");
        (dir, area)
    }

    #[test]
    fn sanitize_matches_werkzeug_rules() {
        assert_eq!(sanitize_filename("My Report 2024.pdf"), "My_Report_2024.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_filename("..\\windows\\evil.pdf"), "windows_evil.pdf");
        assert_eq!(sanitize_filename("résumé.pdf"), "rsum.pdf");
        assert_eq!(sanitize_filename("...."), "");
        assert_eq!(upload_filename("日本.pdf"), "pdf");
        assert_eq!(upload_filename("///"), FALLBACK_FILENAME);
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(has_pdf_extension("scan.PDF"));
        assert!(has_pdf_extension("a.b.pdf"));
        assert!(!has_pdf_extension("notes.txt"));
        assert!(!has_pdf_extension("pdf"));
    }

    #[test]
    fn compressed_name_replaces_extension() {
        assert_eq!(compressed_filename("report.pdf"), "report_compressed.pdf");
        assert_eq!(compressed_filename("a.b.pdf"), "a.b_compressed.pdf");
        assert_eq!(compressed_filename("pdf"), "pdf_compressed.pdf");
    }

    #[test]
    fn dropped_guard_removes_file() {
        let (_dir, area) = area();
        let staged = area.stage_upload(DownloadId::new(), "x.pdf");
        std::fs::write(staged.path(), b"data").expect("write");
        let path = staged.path().to_path_buf();
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn kept_guard_leaves_file() {
        let (_dir, area) = area();
        let staged = area.stage_output(DownloadId::new(), "x_compressed.pdf");
        std::fs::write(staged.path(), b"data").expect("write");
        let path = staged.keep();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn output_can_be_claimed_once() {
        let (_dir, area) = area();
        let id = DownloadId::new();
        let staged = area.stage_output(id, "x_compressed.pdf");
        std::fs::write(staged.path(), b"%PDF-1.5").expect("write");
        staged.keep();

        let bytes = area.claim_output(id, "x_compressed.pdf").await.expect("first claim");
        assert_eq!(bytes, b"%PDF-1.5");

        let second = area.claim_output(id, "x_compressed.pdf").await;
        assert!(matches!(second, Err(PdfpressError::NotFound(_))));
        assert_eq!(std::fs::read_dir(area.compressed_dir()).expect("read dir").count(), 0);
    }
}
