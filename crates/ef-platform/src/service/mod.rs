//! Service Layer
//!
//! Business logic: auth token validation, the certificate issuance pipeline
//! (template store, QR encoder, renderer, orchestrator), and the ledger
//! repair utility.

pub mod auth;
pub mod certificate;
pub mod qr;
pub mod renderer;
pub mod repair;
pub mod template;

pub use auth::{checks, extract_bearer_token, AccessTokenClaims, AuthConfig, AuthContext, AuthService};
pub use certificate::{CertificateService, IssuedCertificate, VerificationProjection};
pub use renderer::{render_certificate_pdf, CertificateArt};
pub use repair::{CertificateRepairService, RepairReport};
