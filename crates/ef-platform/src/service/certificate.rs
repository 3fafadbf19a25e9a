//! Certificate Issuance
//!
//! Orchestrates the pipeline: eligibility gate -> template store -> QR
//! encoder -> renderer -> ledger commit. Generation is at-most-once per
//! registration for a given artifact lifetime: a per-registration async
//! lock serializes attempts inside this process, and the conditional ledger
//! update (`commit_issuance`) picks a single winner across processes.
//! Losers fall back to the winner's artifact and never touch the issuance
//! timestamp.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::CertificateConfig;
use crate::domain::{Event, Registration, User};
use crate::error::{PlatformError, Result};
use crate::repository::{EventRepository, RegistrationRepository, UserRepository};
use crate::service::auth::AuthContext;
use crate::service::renderer::{render_certificate_pdf, CertificateArt};
use crate::service::{qr, template};

/// Result of a successful `ensure_certificate` call.
pub struct IssuedCertificate {
    pub registration_id: String,
    pub artifact_path: PathBuf,
    pub issued_at: Option<DateTime<Utc>>,
}

impl IssuedCertificate {
    pub fn file_name(&self) -> String {
        format!("certificate-{}.pdf", self.registration_id)
    }
}

/// Public-safe view served to QR scanners.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationProjection {
    pub participant_name: String,
    pub participant_email: String,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub issued_at: DateTime<Utc>,
    pub certificate_id: String,
}

pub struct CertificateService {
    registration_repo: Arc<RegistrationRepository>,
    event_repo: Arc<EventRepository>,
    user_repo: Arc<UserRepository>,
    config: CertificateConfig,
    generation_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CertificateService {
    pub fn new(
        registration_repo: Arc<RegistrationRepository>,
        event_repo: Arc<EventRepository>,
        user_repo: Arc<UserRepository>,
        config: CertificateConfig,
    ) -> Self {
        Self {
            registration_repo,
            event_repo,
            user_repo,
            config,
            generation_locks: DashMap::new(),
        }
    }

    /// Serve the registration's certificate, generating it first if the
    /// ledger has no valid artifact. The ledger state returned reflects the
    /// committed issuance; replays never move the timestamp.
    pub async fn ensure_certificate(
        &self,
        registration_id: &str,
        auth: &AuthContext,
    ) -> Result<IssuedCertificate> {
        let lock = self
            .generation_locks
            .entry(registration_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        let result = self.ensure_locked(registration_id, auth).await;

        drop(guard);
        // entries are tiny; drop them when nobody else is queued
        self.generation_locks
            .remove_if(registration_id, |_, v| Arc::strong_count(v) <= 2);

        result
    }

    async fn ensure_locked(
        &self,
        registration_id: &str,
        auth: &AuthContext,
    ) -> Result<IssuedCertificate> {
        let (registration, event) = self.check_eligibility(registration_id, auth).await?;

        let artifact_path = self.config.artifact_path(&registration.id);

        // Cache hit: ledger says generated and the artifact is still there.
        if registration.certificate_generated && tokio::fs::try_exists(&artifact_path).await? {
            return Ok(IssuedCertificate {
                registration_id: registration.id,
                artifact_path,
                issued_at: registration.certificate_issued_at,
            });
        }

        let user = self
            .user_repo
            .find_by_id(&registration.user)
            .await?
            .ok_or_else(|| PlatformError::not_found("User", &registration.user))?;

        self.generate(&registration, &event, &user, &artifact_path).await?;

        let issued_at = Utc::now();
        let committed = self
            .registration_repo
            .commit_issuance(&registration.id, &artifact_path.to_string_lossy(), issued_at)
            .await?;

        if committed {
            info!(registration_id = %registration.id, "certificate issued");
            Ok(IssuedCertificate {
                registration_id: registration.id,
                artifact_path,
                issued_at: Some(issued_at),
            })
        } else {
            // Another writer won the ledger race; its timestamp stands.
            warn!(registration_id = %registration.id, "issuance raced, serving existing ledger state");
            let current = self
                .registration_repo
                .find_by_id(&registration.id)
                .await?
                .ok_or_else(|| PlatformError::not_found("Registration", &registration.id))?;
            Ok(IssuedCertificate {
                registration_id: current.id,
                artifact_path,
                issued_at: current.certificate_issued_at,
            })
        }
    }

    /// The eligibility gate: ordered, short-circuit, side-effect free.
    async fn check_eligibility(
        &self,
        registration_id: &str,
        auth: &AuthContext,
    ) -> Result<(Registration, Event)> {
        let registration = self
            .registration_repo
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Registration", registration_id))?;

        eligibility::check_registration(&registration, auth)?;

        let event = self
            .event_repo
            .find_by_id(&registration.event)
            .await?
            .ok_or_else(|| PlatformError::not_found("Event", &registration.event))?;

        let configured = eligibility::check_event(&event)?;
        template::resolve(configured)?;

        Ok((registration, event))
    }

    /// Render the PDF and persist it at the deterministic artifact path.
    async fn generate(
        &self,
        registration: &Registration,
        event: &Event,
        user: &User,
        artifact_path: &std::path::Path,
    ) -> Result<()> {
        let configured = event
            .certificate_template
            .as_deref()
            .ok_or_else(|| PlatformError::invalid_state("Certificate template not uploaded"))?;
        let template_path = template::resolve(configured)?;

        let verify_url = qr::verification_url(&self.config.verify_base_url, &registration.id);
        let student_name = user.name.clone();
        let event_title = event.title.clone();
        let issue_date = Utc::now().format("%B %e, %Y").to_string();

        // Image decode and PDF encode are CPU-bound; keep them off the
        // async workers.
        let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let template_image = template::load_image(&template_path)?;
            let qr_image = qr::render(&verify_url)?;
            render_certificate_pdf(&CertificateArt {
                student_name,
                event_title,
                issue_date,
                template: template_image,
                qr: qr_image,
            })
        })
        .await
        .map_err(|err| PlatformError::internal(format!("Render task failed: {err}")))??;

        if let Some(dir) = artifact_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(artifact_path, &bytes).await?;

        Ok(())
    }

    /// Public verification lookup: only issued certificates resolve;
    /// everything else is a uniform not-found.
    pub async fn verify(&self, registration_id: &str) -> Result<VerificationProjection> {
        let registration = self
            .registration_repo
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Certificate", registration_id))?;

        let issued_at = registration
            .certificate_issued_at
            .ok_or_else(|| PlatformError::not_found("Certificate", registration_id))?;

        let user = self
            .user_repo
            .find_by_id(&registration.user)
            .await?
            .ok_or_else(|| PlatformError::not_found("Certificate", registration_id))?;
        let event = self
            .event_repo
            .find_by_id(&registration.event)
            .await?
            .ok_or_else(|| PlatformError::not_found("Certificate", registration_id))?;

        Ok(VerificationProjection {
            participant_name: user.name,
            participant_email: user.email,
            event_title: event.title,
            event_date: event.date,
            issued_at,
            certificate_id: registration.id,
        })
    }
}

/// Pure precondition checks, ordered so the first failure wins.
pub mod eligibility {
    use super::*;

    /// Ownership, then attendance. Ownership is never granted transitively,
    /// not even to admins.
    pub fn check_registration(registration: &Registration, auth: &AuthContext) -> Result<()> {
        if registration.user != auth.user_id {
            return Err(PlatformError::forbidden("Access denied"));
        }

        if !registration.has_attended() {
            return Err(PlatformError::invalid_state("Attendance not completed"));
        }

        Ok(())
    }

    /// Enablement, then template configuration. Returns the configured
    /// template path for the filesystem check that follows.
    pub fn check_event(event: &Event) -> Result<&str> {
        if !event.certificate_enabled {
            return Err(PlatformError::forbidden("Certificate not enabled by admin yet"));
        }

        event
            .certificate_template
            .as_deref()
            .ok_or_else(|| PlatformError::invalid_state("Certificate template not uploaded"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RegistrationStatus, Role};

    fn owner_context() -> AuthContext {
        AuthContext {
            user_id: "user-1".to_string(),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.org".to_string(),
            role: Role::User,
        }
    }

    fn admin_context() -> AuthContext {
        AuthContext {
            user_id: "admin-1".to_string(),
            name: "Root".to_string(),
            email: "root@example.org".to_string(),
            role: Role::Admin,
        }
    }

    fn attended_registration() -> Registration {
        let mut reg = Registration::new("user-1", "event-1");
        reg.status = RegistrationStatus::Attended;
        reg
    }

    fn certificate_ready_event() -> Event {
        let mut event = Event::new("Workshop", "desc", Utc::now(), "10:00", "Hall A", 50, "admin-1");
        event.certificate_enabled = true;
        event.certificate_template = Some("uploads/certificates/template.png".to_string());
        event
    }

    #[test]
    fn test_owner_with_attendance_passes() {
        let reg = attended_registration();
        assert!(eligibility::check_registration(&reg, &owner_context()).is_ok());
    }

    #[test]
    fn test_non_owner_rejected_even_as_admin() {
        let reg = attended_registration();
        let err = eligibility::check_registration(&reg, &admin_context()).unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden { .. }));
    }

    #[test]
    fn test_attendance_required_regardless_of_other_flags() {
        for status in [RegistrationStatus::Registered, RegistrationStatus::Cancelled] {
            let mut reg = attended_registration();
            reg.status = status;
            let err = eligibility::check_registration(&reg, &owner_context()).unwrap_err();
            assert!(matches!(err, PlatformError::InvalidState { .. }));
        }
    }

    #[test]
    fn test_ownership_failure_wins_over_attendance() {
        // ownership short-circuits before the attendance check
        let mut reg = attended_registration();
        reg.status = RegistrationStatus::Registered;
        let err = eligibility::check_registration(&reg, &admin_context()).unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden { .. }));
    }

    #[test]
    fn test_enablement_checked_before_template() {
        let mut event = certificate_ready_event();
        event.certificate_enabled = false;
        event.certificate_template = None;
        let err = eligibility::check_event(&event).unwrap_err();
        assert!(matches!(err, PlatformError::Forbidden { .. }));
    }

    #[test]
    fn test_missing_template_is_invalid_state() {
        let mut event = certificate_ready_event();
        event.certificate_template = None;
        let err = eligibility::check_event(&event).unwrap_err();
        assert!(matches!(err, PlatformError::InvalidState { .. }));
    }

    #[test]
    fn test_ready_event_yields_template_path() {
        let event = certificate_ready_event();
        assert_eq!(
            eligibility::check_event(&event).unwrap(),
            "uploads/certificates/template.png"
        );
    }
}
