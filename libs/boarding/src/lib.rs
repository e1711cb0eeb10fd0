//! Boarding validator (C12).
//!
//! A dependency-ordered validation pipeline sharing the workflow engine's
//! context/step pattern in spirit (same "skip on unmet prerequisite"
//! idea as [`provisioner_workflow_engine::ConditionalStep`]), but over a
//! read-mostly snapshot of a server's state rather than a live workflow.
//! Categories run in the fixed order connectivity -> hardware -> ipmi ->
//! bios -> network -> configuration; each category requires at least one
//! passing result from the category(ies) named by its checks'
//! `required_prerequisites`.

pub mod check;
pub mod checks;
pub mod context;
pub mod coordinator;

pub use check::BoardingCheck;
pub use checks::all_checks;
pub use context::BoardingContext;
pub use coordinator::run_boarding_validation;
