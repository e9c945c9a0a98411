//! Core business logic for Expenso.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, approval routing, and currency calculations live here.
//!
//! # Modules
//!
//! - `expense` - The expense aggregate and its embedded approval flow
//! - `workflow` - Rule matching, flow construction, and the approval state machine
//! - `currency` - Multi-currency conversion and exchange-rate caching

pub mod currency;
pub mod expense;
pub mod workflow;
