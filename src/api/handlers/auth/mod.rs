//! Admin session authentication.
//!
//! Admin requests carry a random session token (cookie or bearer header);
//! only its SHA-256 hash is stored. Each request resolves the token into a
//! `Principal`; there is no ambient "logged in" state anywhere.

pub mod principal;
pub mod session;
pub(crate) mod storage;
pub mod types;
pub(crate) mod utils;

pub use principal::{require_admin, Principal};
pub(crate) use utils::is_unique_violation;
