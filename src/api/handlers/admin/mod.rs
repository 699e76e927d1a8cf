//! Session-gated admin endpoints: registrations review, CSV export, and
//! featured-posts management.

pub mod export;
pub mod posts;
pub mod registrations;
