//! Approval routing for expenses.
//!
//! This module implements the approval rules engine, approval-flow
//! construction, and the expense approval state machine.
//!
//! # Modules
//!
//! - `approval` - Approval rules and the rule matcher
//! - `directory` - The external user-directory collaborator seam
//! - `flow` - Resolves a matched rule (or default policy) into concrete steps
//! - `service` - The approval state machine
//! - `error` - Workflow-specific error types

pub mod approval;
pub mod directory;
pub mod error;
pub mod flow;
pub mod service;

#[cfg(test)]
mod approval_props;
#[cfg(test)]
mod service_props;

pub use approval::{
    AmountRange, ApprovalRule, ApproverSpec, ConditionalRule, ConditionalRuleType,
    ConditionalRules, FlowStepTemplate, RuleConditions, RuleMatcher,
};
pub use directory::{Employee, UserDirectory};
pub use error::WorkflowError;
pub use flow::{FlowBuilder, FlowOutcome, UnresolvedApprover};
pub use service::{ApprovalOutcome, ApprovalService};
