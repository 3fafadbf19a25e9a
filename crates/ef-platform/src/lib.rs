//! EventForge Platform
//!
//! Event-management backend core:
//! - Event, user, and registration domain models over MongoDB
//! - Certificate issuance pipeline (eligibility gate, template store,
//!   QR verification encoder, PDF renderer, idempotent issuance ledger)
//! - Public certificate verification
//! - Ledger repair utility for out-of-band recovery

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;

pub use config::CertificateConfig;
pub use domain::*;
pub use error::PlatformError;
