//! Core pipeline orchestration and domain logic for docpup.
//!
//! This crate ties together checkout, preprocessing, scanning, copying and
//! index generation into the `generate` workflow, and owns the `.gitignore`
//! merger that runs once at the end of it.

pub mod assembler;
pub mod checkout;
pub mod gitignore;
pub mod index;
pub mod pipeline;
pub mod preprocess;

pub use checkout::{CheckoutProvider, GitCheckout};
pub use pipeline::{
    Phase, ProgressReporter, RepoFailure, RepoOutcome, RepoReport, RunSummary, SilentProgress,
    generate, select_repos,
};
