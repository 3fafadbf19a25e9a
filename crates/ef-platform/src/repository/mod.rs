//! Repository Layer
//!
//! MongoDB repositories for all domain entities.

pub mod event;
pub mod indexes;
pub mod registration;
pub mod user;

pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use user::UserRepository;
