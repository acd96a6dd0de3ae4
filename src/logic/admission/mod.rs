//! Admission Module - Upload decision engine
//!
//! # Flow
//! 1. Decode the candidate (reject anything that is not an image)
//! 2. Read the threshold and the current reference photo
//! 3. Empty slot: accept and seed the reference
//! 4. Otherwise score candidate vs reference, accept iff `score >= threshold`
//! 5. Accepted uploads atomically replace the reference
//!
//! # Failure Strategy
//! Every error path leaves the slot untouched. A scorer that fails, hangs
//! past the timeout or returns a value outside [0, 1] is reported as
//! `ScorerUnavailable`, never as a rejection or an acceptance.

pub mod engine;
pub mod types;

pub use engine::{AdmissionEngine, DEFAULT_SCORER_TIMEOUT, SEED_SCORE};
pub use types::{AdmissionError, AdmissionOutcome, AdmissionResult, CandidatePhoto};
