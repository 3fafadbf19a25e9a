//! Event Repository

use futures::TryStreamExt;
use mongodb::{bson, bson::doc, options::FindOptions, Collection, Database};

use crate::domain::Event;
use crate::error::Result;

pub struct EventRepository {
    collection: Collection<Event>,
}

impl EventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("events"),
        }
    }

    pub async fn insert(&self, event: &Event) -> Result<()> {
        self.collection.insert_one(event).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// Published events, soonest first
    pub async fn find_published(&self) -> Result<Vec<Event>> {
        let options = FindOptions::builder().sort(doc! { "date": 1 }).build();
        let cursor = self
            .collection
            .find(doc! { "status": "Published" })
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// All events, newest first (admin listing)
    pub async fn find_all(&self) -> Result<Vec<Event>> {
        let options = FindOptions::builder().sort(doc! { "createdAt": -1 }).build();
        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn update(&self, event: &Event) -> Result<()> {
        self.collection
            .replace_one(doc! { "_id": &event.id }, event)
            .await?;
        Ok(())
    }

    pub async fn set_certificate_enabled(&self, id: &str, enabled: bool) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "certificateEnabled": enabled,
                    "updatedAt": bson::DateTime::now(),
                } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn set_certificate_template(&self, id: &str, path: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "certificateTemplate": path,
                    "updatedAt": bson::DateTime::now(),
                } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}
