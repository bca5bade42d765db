//! File attachments referenced by path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MailError;

/// A file attachment, referenced by path and attached under a display name.
///
/// Files are read at delivery time; a missing file surfaces when the message
/// is built, not when the attachment is added.
///
/// ```
/// use herald::Attachment;
///
/// let attachment = Attachment::new("/var/docs/report.pdf", "report.pdf").unwrap();
/// assert_eq!(attachment.filename, "report.pdf");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Absolute path to the file on disk.
    pub filepath: PathBuf,
    /// Filename presented to the recipient.
    pub filename: String,
}

impl Attachment {
    /// Create an attachment from a file path and display filename.
    ///
    /// Both fields are required; an empty path or filename is rejected with
    /// [`MailError::InvalidAttachment`].
    pub fn new(filepath: impl Into<PathBuf>, filename: impl Into<String>) -> Result<Self, MailError> {
        let filepath = filepath.into();
        let filename = filename.into();

        if filepath.as_os_str().is_empty() {
            return Err(MailError::InvalidAttachment(
                "attachment file path is empty".into(),
            ));
        }
        if filename.is_empty() {
            return Err(MailError::InvalidAttachment(format!(
                "attachment '{}' has no filename",
                filepath.display()
            )));
        }

        Ok(Self { filepath, filename })
    }

    /// Create an attachment from a path, using the file's basename as the
    /// display filename.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, MailError> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                MailError::InvalidAttachment(format!(
                    "cannot derive a filename from '{}'",
                    path.display()
                ))
            })?
            .to_string();

        Self::new(path, filename)
    }

    /// Read the attachment contents from disk.
    pub fn read(&self) -> Result<Vec<u8>, MailError> {
        std::fs::read(&self.filepath).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MailError::AttachmentFileNotFound(self.filepath.display().to_string())
            } else {
                MailError::AttachmentReadError(format!("{}: {}", self.filepath.display(), e))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let attachment = Attachment::new("/tmp/report.pdf", "Report.pdf").unwrap();
        assert_eq!(attachment.filepath, PathBuf::from("/tmp/report.pdf"));
        assert_eq!(attachment.filename, "Report.pdf");
    }

    #[test]
    fn test_new_rejects_empty_path() {
        let result = Attachment::new("", "report.pdf");
        assert!(matches!(result, Err(MailError::InvalidAttachment(_))));
    }

    #[test]
    fn test_new_rejects_empty_filename() {
        let result = Attachment::new("/tmp/report.pdf", "");
        assert!(matches!(result, Err(MailError::InvalidAttachment(_))));
    }

    #[test]
    fn test_from_path_uses_basename() {
        let attachment = Attachment::from_path("/var/docs/invoice-42.pdf").unwrap();
        assert_eq!(attachment.filename, "invoice-42.pdf");
    }

    #[test]
    fn test_read_missing_file() {
        let attachment = Attachment::new("/nonexistent/file.bin", "file.bin").unwrap();
        assert!(matches!(
            attachment.read(),
            Err(MailError::AttachmentFileNotFound(_))
        ));
    }
}
