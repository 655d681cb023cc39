//! QR code issuance
//!
//! Renders `<public_base_url>/<identifier>` into a fixed-size PNG under the QR
//! directory. Filenames combine a sanitized identifier with a millisecond
//! timestamp and a random tag, and files are created with create-new
//! semantics: re-issuing for the same identifier never overwrites an earlier
//! image.

use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind, Seek, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use image::{imageops, ImageBuffer, ImageFormat, Luma};
use qrcode::QrCode;
use qroster_common::config::{QrConfig, QR_CODES_DIR_NAME};
use qroster_common::identifier;
use thiserror::Error;
use tracing::debug;

/// Attempts at finding an unused filename before giving up
const MAX_NAME_ATTEMPTS: usize = 8;

/// QR rendering or persistence failure
#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("QR encoding failed for '{identifier}': {source}")]
    Encode {
        identifier: String,
        #[source]
        source: qrcode::types::QrError,
    },

    #[error("QR image write failed for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("QR file error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not allocate a unique QR filename for '{0}'")]
    NameExhausted(String),

    #[error("QR worker failed: {0}")]
    Worker(String),
}

/// Issues QR images for record identifiers
#[derive(Debug, Clone)]
pub struct QrIssuer {
    qr_dir: PathBuf,
    public_base_url: String,
    settings: QrConfig,
}

impl QrIssuer {
    pub fn new(qr_dir: PathBuf, public_base_url: &str, settings: QrConfig) -> Self {
        Self {
            qr_dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            settings,
        }
    }

    pub fn qr_dir(&self) -> &Path {
        &self.qr_dir
    }

    /// URL encoded into the QR code for `identifier`
    pub fn payload(&self, identifier: &str) -> String {
        format!("{}/{}", self.public_base_url, identifier)
    }

    /// Render and store a QR image, returning its server-relative path
    pub fn issue(&self, identifier: &str) -> Result<String, IssuanceError> {
        let image = self.render(identifier)?;

        std::fs::create_dir_all(&self.qr_dir).map_err(|source| IssuanceError::Io {
            path: self.qr_dir.clone(),
            source,
        })?;

        let sanitized = sanitize_filename(identifier);

        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = format!(
                "qr_{}_{}{}.png",
                sanitized,
                Utc::now().timestamp_millis(),
                identifier::random_base36(4)
            );
            let path = self.qr_dir.join(&file_name);

            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(IssuanceError::Io { path, source }),
            };

            if let Err(e) = write_png(&image, &path, BufWriter::new(file)) {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }

            debug!(identifier = %identifier, file = %file_name, "Issued QR code");
            return Ok(format!("/{}/{}", QR_CODES_DIR_NAME, file_name));
        }

        Err(IssuanceError::NameExhausted(identifier.to_string()))
    }

    /// Render the payload onto a square canvas of `settings.size` pixels
    ///
    /// The canvas grows when the code plus margin cannot fit at one pixel
    /// per module.
    fn render(&self, identifier: &str) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>, IssuanceError> {
        let code = QrCode::new(self.payload(identifier).as_bytes()).map_err(|source| {
            IssuanceError::Encode {
                identifier: identifier.to_string(),
                source,
            }
        })?;

        let modules = code.width() as u32;
        let total_modules = modules + 2 * self.settings.margin;
        let module_px = (self.settings.size / total_modules).max(1);

        let symbol = code
            .render::<Luma<u8>>()
            .quiet_zone(false)
            .module_dimensions(module_px, module_px)
            .build();

        let side = self
            .settings
            .size
            .max(symbol.width() + 2 * self.settings.margin * module_px);
        let mut canvas = ImageBuffer::from_pixel(side, side, Luma([255u8]));
        let offset = i64::from((side - symbol.width()) / 2);
        imageops::overlay(&mut canvas, &symbol, offset, offset);

        Ok(canvas)
    }
}

/// Encode `image` as PNG into `writer`, flushing before returning
fn write_png<W: Write + Seek>(
    image: &ImageBuffer<Luma<u8>, Vec<u8>>,
    path: &Path,
    mut writer: W,
) -> Result<(), IssuanceError> {
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|source| IssuanceError::Image {
            path: path.to_path_buf(),
            source,
        })?;

    writer.flush().map_err(|source| IssuanceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace every non-alphanumeric character with `_` and lowercase
pub fn sanitize_filename(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// File name component of a stored `qr_image_path`
///
/// Only the final component is used so a stored path can never point
/// outside the QR directory.
pub fn stored_file_name(qr_image_path: &str) -> Option<&str> {
    Path::new(qr_image_path)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
}

/// Absolute location of a stored QR path inside `qr_dir`
pub fn resolve_stored_path(qr_dir: &Path, qr_image_path: &str) -> Option<PathBuf> {
    stored_file_name(qr_image_path).map(|name| qr_dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(dir: &Path) -> QrIssuer {
        QrIssuer::new(
            dir.join("qr_codes"),
            "https://roster.example/details/",
            QrConfig::default(),
        )
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("EMP-001/Ä"), "emp_001__");
        assert_eq!(sanitize_filename("abc123"), "abc123");
    }

    #[test]
    fn test_payload_trims_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            issuer(dir.path()).payload("A1"),
            "https://roster.example/details/A1"
        );
    }

    #[test]
    fn test_issue_writes_png_of_configured_size() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(dir.path());

        let stored = issuer.issue("EMP 001").unwrap();

        assert!(stored.starts_with("/qr_codes/qr_emp_001_"));
        assert!(stored.ends_with(".png"));

        let path = resolve_stored_path(issuer.qr_dir(), &stored).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 256);
        assert_eq!(img.height(), 256);
    }

    #[test]
    fn test_issue_twice_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let issuer = issuer(dir.path());

        let first = issuer.issue("same").unwrap();
        let second = issuer.issue("same").unwrap();

        assert_ne!(first, second);
        assert!(resolve_stored_path(issuer.qr_dir(), &first).unwrap().exists());
        assert!(resolve_stored_path(issuer.qr_dir(), &second).unwrap().exists());
    }

    #[test]
    fn test_issue_fails_when_directory_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("qr_codes");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = issuer(dir.path()).issue("x");

        assert!(matches!(result, Err(IssuanceError::Io { .. })));
    }

    #[test]
    fn test_stored_file_name_strips_directories() {
        assert_eq!(stored_file_name("/qr_codes/qr_a_1.png"), Some("qr_a_1.png"));
        assert_eq!(stored_file_name("/qr_codes/../../etc/passwd"), Some("passwd"));
        assert_eq!(stored_file_name(""), None);
    }

    /// Accepts writes but fails the final flush, like a full disk
    struct FailingFlush(std::io::Cursor<Vec<u8>>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(ErrorKind::Other, "no space left on device"))
        }
    }

    impl Seek for FailingFlush {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            self.0.seek(pos)
        }
    }

    #[test]
    fn test_flush_failure_is_reported() {
        let image = ImageBuffer::from_pixel(8, 8, Luma([255u8]));
        let writer = BufWriter::new(FailingFlush(std::io::Cursor::new(Vec::new())));

        let result = write_png(&image, Path::new("qr_x.png"), writer);

        assert!(matches!(
            result,
            Err(IssuanceError::Io { .. } | IssuanceError::Image { .. })
        ));
    }
}
