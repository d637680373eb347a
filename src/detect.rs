//! Input format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Document formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Portable Document Format
    Pdf,
    /// Office Open XML word-processing document
    Docx,
}

impl FileKind {
    /// Resolve a kind from a file extension (case-insensitive, without the dot).
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Ok(FileKind::Pdf),
            "docx" => Ok(FileKind::Docx),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }

    /// Resolve a kind from a path's extension.
    ///
    /// # Returns
    /// * `Err(Error::UnsupportedFormat)` if the extension is missing or unknown
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        Self::from_extension(ext)
    }

    /// Canonical lowercase extension.
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
        }
    }

    /// Check that `data` starts with this format's magic bytes.
    pub fn validate_bytes(&self, data: &[u8]) -> Result<()> {
        let ok = match self {
            FileKind::Pdf => is_pdf_bytes(data),
            FileKind::Docx => is_zip_bytes(data),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::UnknownFormat(self.name()))
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FileKind::Pdf => "PDF",
            FileKind::Docx => "DOCX",
        }
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Zip local file header, the container every DOCX uses.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Read the first bytes of a file and check them against `kind`.
pub fn validate_path<P: AsRef<Path>>(path: P, kind: FileKind) -> Result<()> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = Vec::with_capacity(16);
    reader.by_ref().take(16).read_to_end(&mut header)?;
    kind.validate_bytes(&header)
}

/// Check if bytes start with a valid PDF header (`%PDF-x.y`).
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return false;
    }
    is_valid_version(&data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN])
}

/// Check if bytes start with a zip local file header.
pub fn is_zip_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

fn is_valid_version(version: &[u8]) -> bool {
    version.len() == 3 && version[0].is_ascii_digit() && version[1] == b'.' && version[2].is_ascii_digit()
}
