//! # PSP-K Membership Services
//!
//! Backend for the People's Solidarity Party of Kenya: registration intake,
//! OTP-gated self-service identity verification, and the admin dashboard.
//!
//! ## Verification lifecycle
//!
//! A registration starts `pending` and is moved to `approved` or `rejected`
//! by an admin; both transitions are terminal. Approval allocates a
//! year-sequential membership number (`PSP-K-<year>-<5-digit sequence>`).
//! Resignation deletes the registration outright, from any state, after an
//! audit row is written.
//!
//! ## OTP gating
//!
//! Every sensitive self-service action (membership status check, data
//! correction/deletion request, resignation) requires proving control of
//! the registered email through a 6-digit one-time code. Codes live for ten
//! minutes, are scoped to one action, and are consumable exactly once;
//! issuing a new code invalidates its unused predecessors.
//!
//! ## Soft failures
//!
//! Lookups that miss (unknown email/ID pair, wrong or expired code) return
//! HTTP 200 with `{"success": false}` so callers cannot probe which field
//! mismatched. Outbound email is best-effort and never fails the operation
//! that triggered it.

pub mod api;
pub mod cli;
pub mod member;
pub mod otp;
pub mod posts;
