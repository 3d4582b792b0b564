//! # services
//!
//! Use cases of the boulder catalogue. Everything here talks to the outside
//! world through the ports in `domains` and is wired up by the binary.

pub mod card;
pub mod form;
pub mod intake;
pub mod record;
pub mod sync;
pub mod upload;

pub use card::BoulderCard;
pub use form::FormSession;
pub use intake::{ImageIntake, IntakeState};
pub use record::{BoulderForm, CatalogSettings};
pub use sync::{BoulderSynchronizer, EditSession};
pub use upload::StorageUploadEndpoint;
