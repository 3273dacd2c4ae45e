//! # parentctl-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ConfigStore`: namespaced sections with staged changes and commit
//!   - `HostHintSource`: read-only MAC → name/IPv4 directory
//! - Map domain records to and from store sections (`record`)
//! - Define the **driving/inbound port** as a use-case struct:
//!   - `RuleFormService`: load the form, validate, commit
//!
//! ## Dependency rule
//! Depends on `parentctl-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod record;
pub mod services;
