//! Upload pre-validation
//!
//! Size and type checks performed before a file is sent to storage.
//! File content is never inspected beyond its declared type.

use serde::{Deserialize, Serialize};

use crate::error::{VisaError, VisaResult};

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

/// Visa photo limit
pub const PHOTO_MAX_BYTES: u64 = 240 * KIB;
/// Scans and supporting documents limit
pub const DOCUMENT_MAX_BYTES: u64 = 10 * MIB;

const PHOTO_TYPES: &[&str] = &["image/jpeg"];
const DOCUMENT_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Photo,
    PassportScan,
    SupportingDocument,
}

impl UploadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::PassportScan => "passport_scan",
            Self::SupportingDocument => "supporting_document",
        }
    }

    pub fn max_bytes(&self) -> u64 {
        match self {
            Self::Photo => PHOTO_MAX_BYTES,
            Self::PassportScan | Self::SupportingDocument => DOCUMENT_MAX_BYTES,
        }
    }

    pub fn accepted_types(&self) -> &'static [&'static str] {
        match self {
            Self::Photo => PHOTO_TYPES,
            Self::PassportScan | Self::SupportingDocument => DOCUMENT_TYPES,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "photo" => Some(Self::Photo),
            "passport" | "passport_scan" => Some(Self::PassportScan),
            "document" | "supporting_document" => Some(Self::SupportingDocument),
            _ => None,
        }
    }
}

/// Guess a content type from the file extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Check a file against the limits of `kind`
pub fn validate_upload(kind: UploadKind, file_name: &str, content_type: &str, size: u64) -> VisaResult<()> {
    if size == 0 {
        return Err(VisaError::EmptyFile {
            file_name: file_name.to_string(),
        });
    }
    let content_type = content_type.split(';').next().unwrap_or("").trim().to_lowercase();
    if !kind.accepted_types().contains(&content_type.as_str()) {
        return Err(VisaError::UnsupportedFileType {
            file_name: file_name.to_string(),
            content_type,
        });
    }
    if size > kind.max_bytes() {
        return Err(VisaError::FileTooLarge {
            file_name: file_name.to_string(),
            size,
            limit: kind.max_bytes(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_limits() {
        assert!(validate_upload(UploadKind::Photo, "me.jpg", "image/jpeg", 200 * KIB).is_ok());
        assert!(matches!(
            validate_upload(UploadKind::Photo, "me.jpg", "image/jpeg", 241 * KIB),
            Err(VisaError::FileTooLarge { .. })
        ));
        assert!(matches!(
            validate_upload(UploadKind::Photo, "me.png", "image/png", 10 * KIB),
            Err(VisaError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn test_documents() {
        assert!(validate_upload(UploadKind::PassportScan, "p.pdf", "application/pdf", 9 * MIB).is_ok());
        assert!(validate_upload(UploadKind::SupportingDocument, "b.png", "IMAGE/PNG; q=1", MIB).is_ok());
        assert!(validate_upload(UploadKind::SupportingDocument, "b.pdf", "application/pdf", 11 * MIB).is_err());
        assert!(matches!(
            validate_upload(UploadKind::SupportingDocument, "empty.pdf", "application/pdf", 0),
            Err(VisaError::EmptyFile { .. })
        ));
    }

    #[test]
    fn test_content_type_guess() {
        assert_eq!(content_type_for("scan.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.pdf"), "application/pdf");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
        assert_eq!(UploadKind::parse("passport"), Some(UploadKind::PassportScan));
    }
}
