//! Typed repositories, one per persisted record family.
//!
//! Each repository is a zero-sized type with associated async functions that
//! take the store explicitly, so the services decide when to read and write.

pub mod account_repo;
pub mod activity_repo;
pub mod badge_repo;

pub use account_repo::AccountRepo;
pub use activity_repo::ActivityRepo;
pub use badge_repo::BadgeRepo;
