//! Template Store
//!
//! Resolves an event's configured certificate template path to a readable
//! image file. The upload endpoint already restricts MIME types, but files
//! can be moved or reconfigured after upload, so the generator re-validates
//! by extension and existence before every render.

use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::error::{PlatformError, Result};

/// Extensions accepted as certificate backgrounds.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Resolve a configured template path: absolute, existing, allow-listed
/// extension.
pub fn resolve(configured_path: &str) -> Result<PathBuf> {
    let path = Path::new(configured_path);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    if !has_allowed_extension(&absolute) {
        return Err(PlatformError::validation(
            "Certificate template must be PNG or JPG",
        ));
    }

    if !absolute.try_exists()? {
        return Err(PlatformError::invalid_state(
            "Certificate template file missing",
        ));
    }

    Ok(absolute)
}

/// Decode the template image. Runs on a blocking thread in the pipeline.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path)
        .map_err(|err| PlatformError::render(format!("Failed to decode certificate template: {err}")))
}

fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        let err = resolve(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidState { .. }));
    }

    #[test]
    fn test_disallowed_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.gif");
        std::fs::File::create(&path).unwrap().write_all(b"x").unwrap();

        let err = resolve(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.PNG");
        std::fs::File::create(&path).unwrap().write_all(b"x").unwrap();

        assert!(resolve(path.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_existing_allowed_template_resolves_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.jpg");
        std::fs::File::create(&path).unwrap().write_all(b"x").unwrap();

        let resolved = resolve(path.to_str().unwrap()).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_undecodable_template_is_render_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.png");
        std::fs::File::create(&path).unwrap().write_all(b"not a png").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, PlatformError::Render { .. }));
    }
}
