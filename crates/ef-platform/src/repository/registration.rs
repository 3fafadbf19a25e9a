//! Registration Repository
//!
//! Carries the issuance-ledger writes. `commit_issuance` is the single-winner
//! transition for concurrent generation attempts: the filter only matches
//! while `certificateGenerated` is still false, so exactly one caller
//! observes `true` and every later caller falls back to the cached artifact.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{bson, bson::doc, options::FindOptions, Collection, Database};

use crate::domain::Registration;
use crate::error::{PlatformError, Result};

const DUPLICATE_KEY_CODE: i32 = 11000;

pub struct RegistrationRepository {
    collection: Collection<Registration>,
}

impl RegistrationRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("event_registrations"),
        }
    }

    /// Insert a new registration. A unique-index violation on (user, event)
    /// surfaces as `PlatformError::Duplicate`.
    pub async fn insert(&self, registration: &Registration) -> Result<()> {
        match self.collection.insert_one(registration).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(PlatformError::duplicate(
                "Registration",
                "user+event",
                format!("{}:{}", registration.user, registration.event),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Registration>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Registration>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self
            .collection
            .find(doc! { "user": user_id })
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by_event(&self, event_id: &str) -> Result<Vec<Registration>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": 1 }).build();
        let cursor = self
            .collection
            .find(doc! { "event": event_id })
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_by_event(&self, event_id: &str) -> Result<u64> {
        Ok(self.collection.count_documents(doc! { "event": event_id }).await?)
    }

    /// All registrations whose ledger claims an issued certificate.
    pub async fn find_generated(&self) -> Result<Vec<Registration>> {
        let cursor = self
            .collection
            .find(doc! { "certificateGenerated": true })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Transition registered -> attended. Marking attendance invalidates any
    /// prior issuance so the next download regenerates against the current
    /// template. Returns the updated record.
    pub async fn mark_attended(&self, id: &str) -> Result<Option<Registration>> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "status": "attended",
                    "certificateGenerated": false,
                    "certificatePath": null,
                    "certificateIssuedAt": null,
                    "updatedAt": bson::DateTime::now(),
                } },
            )
            .return_document(mongodb::options::ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    /// Atomically commit a successful generation: all three certificate
    /// fields move in one update, and only while the ledger is still
    /// unissued. Returns false when another writer won the race.
    pub async fn commit_issuance(
        &self,
        id: &str,
        artifact_path: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id, "certificateGenerated": false },
                doc! { "$set": {
                    "certificateGenerated": true,
                    "certificatePath": artifact_path,
                    "certificateIssuedAt": bson::DateTime::from_chrono(issued_at),
                    "updatedAt": bson::DateTime::now(),
                } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    /// Reset the ledger to its unissued defaults (repair utility).
    pub async fn reset_certificate(&self, id: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "certificateGenerated": false,
                    "certificatePath": null,
                    "certificateIssuedAt": null,
                    "updatedAt": bson::DateTime::now(),
                } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY_CODE
    )
}
