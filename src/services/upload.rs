//! Upload storage service implementation
//!
//! Stores admission documents, generated PDFs and certificate background
//! images under the local uploads directory. File names are regenerated
//! to UUIDs; the original name is only kept as metadata.

use std::path::{Path, PathBuf};
use tracing::{info, debug};
use crate::config::settings::Settings;
use crate::models::step::StepDocument;
use crate::services::certificate::{MIN_BACKGROUND_WIDTH, MIN_BACKGROUND_HEIGHT};
use crate::utils::errors::{AdmissioError, Result};
use crate::utils::helpers::{file_extension, unique_file_name};

/// Metadata of a stored file
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Public path recorded in the database, e.g. `/uploads/documents/<name>`
    pub public_path: String,
    pub file_name: String,
    pub file_size: i64,
}

/// Upload storage service
#[derive(Debug, Clone)]
pub struct UploadService {
    settings: Settings,
}

impl UploadService {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Validate and store an admission document upload
    pub async fn store_document(
        &self,
        requirement: &StepDocument,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile> {
        if bytes.is_empty() {
            return Err(AdmissioError::InvalidInput("Uploaded file is empty".to_string()));
        }

        let accepted = requirement.accepted_extensions();
        let extension = file_extension(original_name).ok_or_else(|| {
            AdmissioError::InvalidInput(format!(
                "File has no extension. Accepted formats: {}",
                accepted.join(", ")
            ))
        })?;

        if !accepted.contains(&extension) {
            return Err(AdmissioError::InvalidInput(format!(
                "Format not accepted: {}. Accepted formats: {}",
                extension,
                accepted.join(", ")
            )));
        }

        if bytes.len() as u64 > requirement.max_size_bytes() {
            return Err(AdmissioError::InvalidInput(format!(
                "File too large. Maximum size: {}MB",
                requirement.max_size_mb.max(1)
            )));
        }

        let stored = self.write("documents", &extension, bytes).await?;
        info!(
            document_id = requirement.id,
            file = %stored.public_path,
            size = stored.file_size,
            "Document stored"
        );

        Ok(StoredFile { file_name: original_name.to_string(), ..stored })
    }

    /// Store a generated certificate PDF
    pub async fn store_certificate_pdf(&self, certificate_code: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.base_dir().join("certificates");
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("certificate-{}.pdf", certificate_code);
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        Ok(format!("/uploads/certificates/{}", file_name))
    }

    /// Store a generated contract PDF
    pub async fn store_contract_pdf(&self, registration_id: i64, bytes: &[u8]) -> Result<String> {
        let dir = self.base_dir().join("contracts");
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("contract-{}-{}", registration_id, unique_file_name("pdf"));
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        Ok(format!("/uploads/contracts/{}", file_name))
    }

    /// Validate and store a certificate background image, returning its
    /// public path and pixel dimensions
    pub async fn store_background_image(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<(String, u32, u32)> {
        let max_bytes = self.settings.storage.max_image_size_mb * 1024 * 1024;
        if bytes.len() as u64 > max_bytes {
            return Err(AdmissioError::InvalidInput(format!(
                "File too large. Maximum size: {}MB",
                self.settings.storage.max_image_size_mb
            )));
        }

        let (width, height) = sniff_image_dimensions(bytes).ok_or_else(|| {
            AdmissioError::InvalidInput("File must be a PNG or JPEG image".to_string())
        })?;

        if width < MIN_BACKGROUND_WIDTH || height < MIN_BACKGROUND_HEIGHT {
            return Err(AdmissioError::InvalidInput(format!(
                "Image too small: {}x{}. Minimum: {}x{}",
                width, height, MIN_BACKGROUND_WIDTH, MIN_BACKGROUND_HEIGHT
            )));
        }

        let extension = file_extension(original_name)
            .unwrap_or_else(|| if bytes.starts_with(&[0x89]) { "png".to_string() } else { "jpg".to_string() });
        let stored = self.write("backgrounds", &extension, bytes).await?;
        info!(file = %stored.public_path, width = width, height = height, "Background image stored");

        Ok((stored.public_path, width, height))
    }

    /// Map a stored public path back to its location on disk
    pub fn absolute_path(&self, public_path: &str) -> PathBuf {
        match public_path.strip_prefix("/uploads/") {
            Some(rest) => self.base_dir().join(rest),
            None => PathBuf::from(public_path),
        }
    }

    /// Read a stored file's bytes
    pub async fn read(&self, public_path: &str) -> Result<Vec<u8>> {
        let path = self.absolute_path(public_path);
        debug!(path = %path.display(), "Reading stored file");
        Ok(tokio::fs::read(path).await?)
    }

    fn base_dir(&self) -> &Path {
        Path::new(&self.settings.storage.uploads_dir)
    }

    async fn write(&self, subdir: &str, extension: &str, bytes: &[u8]) -> Result<StoredFile> {
        let dir = self.base_dir().join(subdir);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = unique_file_name(extension);
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        Ok(StoredFile {
            public_path: format!("/uploads/{}/{}", subdir, file_name),
            file_name,
            file_size: bytes.len() as i64,
        })
    }
}

/// Read pixel dimensions from a PNG or JPEG header
pub fn sniff_image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    png_dimensions(bytes).or_else(|| jpeg_dimensions(bytes))
}

/// PNG stores the IHDR dimensions at fixed offsets after the signature
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || !bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        return None;
    }
    let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
    let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
    Some((width, height))
}

/// Walk JPEG segments until a start-of-frame marker carries the dimensions
fn jpeg_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut i = 2;
    while i + 9 < bytes.len() {
        if bytes[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = bytes[i + 1];
        match marker {
            // SOF0..SOF15, excluding DHT/JPG/DAC
            0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                let height = u16::from_be_bytes([bytes[i + 5], bytes[i + 6]]) as u32;
                let width = u16::from_be_bytes([bytes[i + 7], bytes[i + 8]]) as u32;
                return Some((width, height));
            }
            // Standalone markers without a length field
            0xD8 | 0x01 | 0xD0..=0xD7 => {
                i += 2;
            }
            _ => {
                let length = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
                if length < 2 {
                    return None;
                }
                i += 2 + length;
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        bytes.extend_from_slice(&[0, 0, 0, 13]);
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    fn jpeg_header(width: u16, height: u16) -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        // APP0 segment the walker must skip
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        bytes.extend_from_slice(&[0u8; 14]);
        // SOF0 segment carrying the dimensions
        bytes.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 10]);
        bytes
    }

    fn requirement(formats: Option<serde_json::Value>, max_size_mb: i32) -> StepDocument {
        StepDocument {
            id: 1,
            step_id: 1,
            name: "ID".to_string(),
            description: None,
            is_required: true,
            accepted_formats: formats,
            max_size_mb,
            order_index: 0,
            created_at: Utc::now(),
        }
    }

    fn service(dir: &std::path::Path) -> UploadService {
        let mut settings = Settings::default();
        settings.storage.uploads_dir = dir.to_string_lossy().to_string();
        UploadService::new(settings)
    }

    #[test]
    fn test_png_dimensions() {
        assert_eq!(png_dimensions(&png_header(1200, 800)), Some((1200, 800)));
        assert_eq!(png_dimensions(b"not a png"), None);
    }

    #[test]
    fn test_jpeg_dimensions() {
        assert_eq!(jpeg_dimensions(&jpeg_header(1600, 900)), Some((1600, 900)));
        assert_eq!(jpeg_dimensions(&[0xFF, 0xD8, 0x00]), None);
        assert_eq!(jpeg_dimensions(b"GIF89a"), None);
    }

    #[tokio::test]
    async fn test_store_document_rejects_bad_extension() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let req = requirement(Some(serde_json::json!(["pdf"])), 10);

        let err = svc.store_document(&req, "malware.exe", b"data").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_store_document_rejects_oversize() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let req = requirement(None, 1);

        let bytes = vec![0u8; 1024 * 1024 + 1];
        let err = svc.store_document(&req, "scan.pdf", &bytes).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_store_document_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let req = requirement(None, 10);

        let stored = svc.store_document(&req, "scan.pdf", b"%PDF-1.4").await.unwrap();
        assert!(stored.public_path.starts_with("/uploads/documents/"));
        assert_eq!(stored.file_name, "scan.pdf");
        assert_eq!(stored.file_size, 8);

        let on_disk = svc.read(&stored.public_path).await.unwrap();
        assert_eq!(on_disk, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_background_image_dimension_floor() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let small = png_header(100, 100);
        let err = svc.store_background_image("bg.png", &small).await.unwrap_err();
        assert!(err.is_validation());

        let big = png_header(MIN_BACKGROUND_WIDTH, MIN_BACKGROUND_HEIGHT);
        let (path, w, h) = svc.store_background_image("bg.png", &big).await.unwrap();
        assert!(path.starts_with("/uploads/backgrounds/"));
        assert_eq!((w, h), (MIN_BACKGROUND_WIDTH, MIN_BACKGROUND_HEIGHT));
    }

    #[tokio::test]
    async fn test_background_rejects_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let err = svc.store_background_image("bg.txt", b"plain text").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_absolute_path_mapping() {
        let svc = service(std::path::Path::new("uploads"));
        let path = svc.absolute_path("/uploads/documents/a.pdf");
        assert_eq!(path, PathBuf::from("uploads/documents/a.pdf"));
    }
}
