pub mod gallery_repo;
pub mod registrations_repo;
pub mod schema;
pub mod sessions_repo;
