//! Puzzle images as inline `data:` URLs.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use coordination::Sample;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to read image {path}: {source}")]
pub struct ImageError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// MIME type from the file extension; unknown extensions are sent as JPEG.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Read an image file and encode it as a base64 `data:` URL.
pub fn encode_image(path: &Path) -> Result<String, ImageError> {
    let bytes = std::fs::read(path).map_err(|source| ImageError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(format!(
        "data:{};base64,{}",
        mime_for(path),
        STANDARD.encode(bytes)
    ))
}

/// Encode the sample's image, if it has one, from `image_dir`.
///
/// Returns whether an image was attached.
pub fn attach_image(sample: &mut Sample, image_dir: &Path) -> Result<bool, ImageError> {
    let Some(image) = &sample.image else {
        return Ok(false);
    };
    sample.image_data = Some(encode_image(&image_dir.join(image))?);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mime_by_extension() {
        assert_eq!(mime_for(Path::new("a.png")), "image/png");
        assert_eq!(mime_for(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_for(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_for(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_for(Path::new("noext")), "image/jpeg");
    }

    #[test]
    fn test_encode_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(encode_image(&path).unwrap(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_attach_image() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/p.jpg"), b"abc").unwrap();

        let mut with = Sample::new("q", vec!["a".into()], "a").with_image("images/p.jpg");
        assert!(attach_image(&mut with, dir.path()).unwrap());
        assert_eq!(with.image_data.as_deref(), Some("data:image/jpeg;base64,YWJj"));

        let mut without = Sample::new("q", vec!["a".into()], "a");
        assert!(!attach_image(&mut without, dir.path()).unwrap());

        let mut missing = Sample::new("q", vec!["a".into()], "a").with_image("nope.png");
        let err = attach_image(&mut missing, dir.path()).unwrap_err();
        assert!(err.path.ends_with("nope.png"));
    }
}
