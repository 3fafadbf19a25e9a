//! Ledger Repair
//!
//! Out-of-band batch pass over every registration whose ledger claims an
//! issued certificate. Any record whose preconditions no longer hold (event
//! gone, certificates disabled, template unresolvable, artifact missing)
//! has all three certificate fields reset together so the next download
//! regenerates cleanly. Safe to re-run; a second pass finds nothing.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Event, Registration};
use crate::error::Result;
use crate::repository::{EventRepository, RegistrationRepository};
use crate::service::template;

#[derive(Debug, Default, Clone, Copy)]
pub struct RepairReport {
    pub scanned: usize,
    pub repaired: usize,
}

pub struct CertificateRepairService {
    registration_repo: Arc<RegistrationRepository>,
    event_repo: Arc<EventRepository>,
}

impl CertificateRepairService {
    pub fn new(registration_repo: Arc<RegistrationRepository>, event_repo: Arc<EventRepository>) -> Self {
        Self {
            registration_repo,
            event_repo,
        }
    }

    pub async fn run(&self) -> Result<RepairReport> {
        let mut report = RepairReport::default();

        for registration in self.registration_repo.find_generated().await? {
            report.scanned += 1;

            let event = self.event_repo.find_by_id(&registration.event).await?;
            if let Some(reason) = issuance_violation(&registration, event.as_ref()) {
                warn!(
                    registration_id = %registration.id,
                    reason,
                    "resetting broken certificate ledger entry"
                );
                if self.registration_repo.reset_certificate(&registration.id).await? {
                    report.repaired += 1;
                }
            }
        }

        info!(scanned = report.scanned, repaired = report.repaired, "certificate repair pass done");
        Ok(report)
    }
}

/// Decide whether a generated=true ledger entry is still valid.
/// Returns the first violated precondition, if any.
fn issuance_violation(registration: &Registration, event: Option<&Event>) -> Option<&'static str> {
    let Some(event) = event else {
        return Some("event missing");
    };

    if !event.certificate_enabled {
        return Some("certificates disabled");
    }

    let template_ok = event
        .certificate_template
        .as_deref()
        .map(|p| template::resolve(p).is_ok())
        .unwrap_or(false);
    if !template_ok {
        return Some("template unresolvable");
    }

    let artifact_ok = registration
        .certificate_path
        .as_deref()
        .map(|p| Path::new(p).exists())
        .unwrap_or(false);
    if !artifact_ok {
        return Some("artifact missing");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegistrationStatus;
    use chrono::Utc;
    use std::io::Write;

    fn generated_registration(artifact: Option<&Path>) -> Registration {
        let mut reg = Registration::new("user-1", "event-1");
        reg.status = RegistrationStatus::Attended;
        reg.certificate_generated = true;
        reg.certificate_path = artifact.map(|p| p.to_string_lossy().into_owned());
        reg.certificate_issued_at = Some(Utc::now());
        reg
    }

    fn enabled_event(template: Option<&Path>) -> Event {
        let mut event = Event::new("Workshop", "desc", Utc::now(), "10:00", "Hall A", 50, "admin-1");
        event.certificate_enabled = true;
        event.certificate_template = template.map(|p| p.to_string_lossy().into_owned());
        event
    }

    fn touch(path: &Path) {
        std::fs::File::create(path).unwrap().write_all(b"x").unwrap();
    }

    #[test]
    fn test_intact_record_passes() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.png");
        let artifact = dir.path().join("certificate-reg.pdf");
        touch(&template);
        touch(&artifact);

        let reg = generated_registration(Some(&artifact));
        let event = enabled_event(Some(&template));
        assert_eq!(issuance_violation(&reg, Some(&event)), None);
    }

    #[test]
    fn test_missing_event_is_violation() {
        let reg = generated_registration(None);
        assert_eq!(issuance_violation(&reg, None), Some("event missing"));
    }

    #[test]
    fn test_disabled_certificates_is_violation() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.png");
        touch(&template);

        let reg = generated_registration(None);
        let mut event = enabled_event(Some(&template));
        event.certificate_enabled = false;
        assert_eq!(issuance_violation(&reg, Some(&event)), Some("certificates disabled"));
    }

    #[test]
    fn test_deleted_template_is_violation() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.png");
        // never created on disk

        let reg = generated_registration(None);
        let event = enabled_event(Some(&template));
        assert_eq!(issuance_violation(&reg, Some(&event)), Some("template unresolvable"));
    }

    #[test]
    fn test_deleted_artifact_is_violation() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.png");
        touch(&template);
        let artifact = dir.path().join("certificate-reg.pdf");
        // artifact never written

        let reg = generated_registration(Some(&artifact));
        let event = enabled_event(Some(&template));
        assert_eq!(issuance_violation(&reg, Some(&event)), Some("artifact missing"));
    }

    #[test]
    fn test_repair_decision_is_stable() {
        // deciding twice over unchanged state yields the same answer, which
        // is what makes the batch pass idempotent
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.jpg");
        touch(&template);

        let reg = generated_registration(None);
        let event = enabled_event(Some(&template));
        let first = issuance_violation(&reg, Some(&event));
        let second = issuance_violation(&reg, Some(&event));
        assert_eq!(first, second);
    }
}
