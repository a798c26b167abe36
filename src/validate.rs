//! Checks run on an upload before anything touches the disk.

/// Name of the multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("No file part in the request")]
    MissingFile,
    #[error("No selected file")]
    EmptyFilename,
    #[error("File type not allowed")]
    DisallowedType,
}

/// An upload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    pub filename: String,
    /// Lowercased extension, one of [`ALLOWED_EXTENSIONS`].
    pub extension: String,
}

/// Extension of `filename` if it is one we can decode.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// `filename` is `None` when the request carried no `file` field at all.
pub fn accept(filename: Option<&str>) -> Result<AcceptedFile, Rejection> {
    let filename = filename.ok_or(Rejection::MissingFile)?;
    if filename.is_empty() {
        return Err(Rejection::EmptyFilename);
    }
    let extension = allowed_extension(filename).ok_or(Rejection::DisallowedType)?;
    Ok(AcceptedFile {
        filename: filename.to_string(),
        extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        for name in ["guru.jpg", "a.PNG", "scan.final.JpEg", "anim.gif"] {
            assert!(accept(Some(name)).is_ok(), "{name} should be accepted");
        }
        let accepted = accept(Some("Photo.JPEG")).unwrap();
        assert_eq!(accepted.extension, "jpeg");
        assert_eq!(accepted.filename, "Photo.JPEG");
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        for name in ["notes.txt", "jpg", "image.jpg.exe", "archive.", ".bashrc"] {
            assert_eq!(accept(Some(name)), Err(Rejection::DisallowedType), "{name}");
        }
    }

    #[test]
    fn missing_field_is_checked_before_filename() {
        assert_eq!(accept(None), Err(Rejection::MissingFile));
        assert_eq!(accept(Some("")), Err(Rejection::EmptyFilename));
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(
            Rejection::MissingFile.to_string(),
            "No file part in the request"
        );
        assert_eq!(Rejection::EmptyFilename.to_string(), "No selected file");
        assert_eq!(Rejection::DisallowedType.to_string(), "File type not allowed");
    }
}
