//! oscal-gateway - OSCAL documents as pull requests
//!
//! A stateless HTTP gateway between API clients and a GitHub-hosted data
//! repository. Every edit to a System Security Plan, Record of Processing
//! Activities entry, profile or tenant metadata becomes a reviewable change:
//! a branch, one or more commits, and a pull request back to the base branch.
//!
//! # Architecture
//!
//! - [`store`]: the [`store::ContentStore`] trait and its GitHub REST implementation
//! - [`pipeline`]: branch provisioning, document writes, pull requests, plans
//! - [`server`]: the axum router and handlers
//! - [`oscal`]: SSP templates and root-key checks
//! - [`paths`]: the repository layout of tenant documents

pub mod auth;
pub mod config;
pub mod error;
pub mod oscal;
pub mod paths;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod types;

pub use error::{Error, Result};
