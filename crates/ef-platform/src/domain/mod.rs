//! Domain Models
//!
//! Core domain entities. All entities use opaque string ids (UUID v4)
//! serialized as the Mongo `_id`.

pub mod event;
pub mod registration;
pub mod user;

pub use event::*;
pub use registration::*;
pub use user::*;
