pub mod gallery;
pub mod registration_status;
pub mod registrations;

pub use gallery::{GalleryItemRow, GalleryKind};
pub use registration_status::RegistrationStatus;
pub use registrations::{RegistrationRow, RegistrationStatsRow};
