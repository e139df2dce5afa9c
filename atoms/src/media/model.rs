use serde::Serialize;
use crate::error::{AtomError, AtomResult};

/// 5 MiB per file
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/jpg", "image/webp"];

const LINKABLE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "webp", "gif", "avif"];

/// A file handed to the image store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Reject by type/size/name before anything reaches the store
    pub fn validate(&self) -> AtomResult<()> {
        if self.file_name.trim().is_empty() {
            return Err(AtomError::Validation("Invalid file name".to_string()));
        }

        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AtomError::Validation(format!(
                "File {} is too large. Maximum size: {}MB",
                self.file_name,
                MAX_UPLOAD_BYTES / 1024 / 1024
            )));
        }

        if !ALLOWED_CONTENT_TYPES.contains(&self.content_type.as_str()) {
            return Err(AtomError::Validation(format!(
                "Unsupported format for {}. Use PNG, JPG, JPEG or WebP",
                self.file_name
            )));
        }

        Ok(())
    }

    /// Extension for the stored object, from the file name or else the content type
    pub fn extension(&self) -> &str {
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => match self.content_type.as_str() {
                "image/png" => "png",
                "image/webp" => "webp",
                _ => "jpg",
            },
        }
    }
}

/// Outcome of a multi-file upload. Successful URLs are committed even when
/// some files failed.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub failures: Vec<UploadFailure>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadFailure {
    pub file_name: String,
    pub error: String,
}

impl UploadReport {
    pub fn succeeded(&self) -> usize {
        self.uploaded.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Non-fatal summary of the failed subset, if any
    pub fn partial_failure(&self) -> Option<AtomError> {
        let first = self.failures.first()?;
        Some(AtomError::PartialBatch {
            succeeded: self.succeeded(),
            failed: self.failed(),
            detail: format!("{}: {}", first.file_name, first.error),
        })
    }
}

/// Well-formedness check for externally linked images
pub fn validate_image_url(raw: &str) -> AtomResult<String> {
    let invalid = || {
        AtomError::Validation(
            "Please enter a valid image URL ending in .jpg, .png, etc.".to_string(),
        )
    };

    let trimmed = raw.trim();
    let parsed = url::Url::parse(trimmed).map_err(|_| invalid())?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }

    let last_segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let has_image_extension = last_segment
        .rsplit_once('.')
        .map(|(_, ext)| LINKABLE_EXTENSIONS.contains(&ext))
        .unwrap_or(false);

    if !has_image_extension {
        return Err(invalid());
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, content_type: &str, len: usize) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0; len],
        }
    }

    #[test]
    fn accepts_whitelisted_types_under_the_limit() {
        assert!(file("sofa.webp", "image/webp", 10).validate().is_ok());
        assert!(file("sofa.jpg", "image/jpeg", MAX_UPLOAD_BYTES).validate().is_ok());
    }

    #[test]
    fn rejects_oversize_unknown_type_and_blank_name() {
        assert!(matches!(
            file("big.png", "image/png", MAX_UPLOAD_BYTES + 1).validate(),
            Err(AtomError::Validation(_))
        ));
        assert!(matches!(
            file("anim.gif", "image/gif", 10).validate(),
            Err(AtomError::Validation(_))
        ));
        assert!(matches!(
            file("  ", "image/png", 10).validate(),
            Err(AtomError::Validation(_))
        ));
    }

    #[test]
    fn extension_falls_back_to_content_type() {
        assert_eq!(file("chair.PNG", "image/png", 1).extension(), "PNG");
        assert_eq!(file("chair", "image/webp", 1).extension(), "webp");
        assert_eq!(file("chair", "image/jpeg", 1).extension(), "jpg");
    }

    #[test]
    fn image_urls_need_scheme_host_and_extension() {
        assert_eq!(
            validate_image_url("  https://cdn.example.com/a/b.JPG?w=200 ").unwrap(),
            "https://cdn.example.com/a/b.JPG?w=200"
        );
        assert!(validate_image_url("ftp://cdn.example.com/a.png").is_err());
        assert!(validate_image_url("https://cdn.example.com/page.html").is_err());
        assert!(validate_image_url("not a url").is_err());
    }

    #[test]
    fn partial_failure_only_when_something_failed() {
        let mut report = UploadReport {
            uploaded: vec!["u1".into()],
            failures: vec![],
        };
        assert!(report.partial_failure().is_none());

        report.failures.push(UploadFailure {
            file_name: "b.gif".into(),
            error: "Unsupported format".into(),
        });
        assert_eq!(
            report.partial_failure(),
            Some(AtomError::PartialBatch {
                succeeded: 1,
                failed: 1,
                detail: "b.gif: Unsupported format".into(),
            })
        );
    }
}
