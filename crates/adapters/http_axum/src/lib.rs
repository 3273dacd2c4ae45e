//! # parentctl-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the form as JSON: schema with target suggestions, rule rows and
//!   settings (`/api/form`)
//! - Serve per-record endpoints for rules and settings (`/api/rules`,
//!   `/api/settings`)
//! - Map application errors into HTTP responses, with field-level detail
//!   for validation failures
//!
//! ## Dependency rule
//! Depends on `parentctl-app` (for port traits and services) and
//! `parentctl-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
