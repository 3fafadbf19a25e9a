//! Index Creation
//!
//! Called once at server startup. Index creation is idempotent on the
//! server side, so repeated boots are safe.

use mongodb::{bson::doc, options::IndexOptions, Database, IndexModel};
use tracing::info;

use crate::domain::{Event, Registration, User};
use crate::error::Result;

pub async fn ensure_indexes(db: &Database) -> Result<()> {
    // One registration per user per event
    let unique_pair = IndexModel::builder()
        .keys(doc! { "user": 1, "event": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<Registration>("event_registrations")
        .create_index(unique_pair)
        .await?;

    db.collection::<Registration>("event_registrations")
        .create_index(IndexModel::builder().keys(doc! { "event": 1 }).build())
        .await?;

    db.collection::<Event>("events")
        .create_index(IndexModel::builder().keys(doc! { "status": 1, "date": 1 }).build())
        .await?;

    let unique_email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<User>("users").create_index(unique_email).await?;

    info!("MongoDB indexes ensured");
    Ok(())
}
