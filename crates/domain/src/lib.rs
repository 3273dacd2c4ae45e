//! # parentctl-domain
//!
//! Pure domain model for the parental control rule form.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, local time
//! - Define **Rules** (who, on which days, during which window) and their
//!   validation and defaults
//! - Define the **Settings** singleton
//! - Project **Host hints** into MAC/IP suggestion lists
//! - Describe the form as an immutable **schema** for a rendering layer
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod host_hint;
pub mod rule;
pub mod schema;
pub mod settings;
