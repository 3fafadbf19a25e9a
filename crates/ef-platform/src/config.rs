//! Runtime Configuration
//!
//! Explicit configuration objects constructed by the binaries and passed
//! into the services. Nothing in the library reads the environment.

use std::path::{Path, PathBuf};

/// Fallback used when no public verification URL is configured; matches the
/// local frontend dev server.
pub const DEFAULT_VERIFY_BASE_URL: &str = "http://localhost:5173";

/// Filesystem and URL settings for the certificate pipeline.
#[derive(Debug, Clone)]
pub struct CertificateConfig {
    /// Directory that receives uploaded template images
    pub upload_dir: PathBuf,

    /// Directory that receives generated PDF artifacts (created on demand)
    pub generated_dir: PathBuf,

    /// Base URL embedded in verification QR codes
    pub verify_base_url: String,
}

impl CertificateConfig {
    pub fn new(upload_dir: impl Into<PathBuf>, generated_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            generated_dir: generated_dir.into(),
            verify_base_url: DEFAULT_VERIFY_BASE_URL.to_string(),
        }
    }

    pub fn with_verify_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.verify_base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Deterministic artifact path for one registration.
    pub fn artifact_path(&self, registration_id: &str) -> PathBuf {
        self.generated_dir
            .join(format!("certificate-{registration_id}.pdf"))
    }

    pub fn template_upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self::new("uploads/certificates", "uploads/generated")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path_is_deterministic() {
        let config = CertificateConfig::default();
        let a = config.artifact_path("reg-1");
        let b = config.artifact_path("reg-1");
        assert_eq!(a, b);
        assert!(a.to_string_lossy().ends_with("certificate-reg-1.pdf"));
    }

    #[test]
    fn test_verify_base_url_trailing_slash_trimmed() {
        let config = CertificateConfig::default().with_verify_base_url("https://events.example.org/");
        assert_eq!(config.verify_base_url, "https://events.example.org");
    }
}
