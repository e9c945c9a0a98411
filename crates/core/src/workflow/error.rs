//! Workflow error types for expense approval routing.

use rust_decimal::Decimal;
use thiserror::Error;

use expenso_shared::error::AppError;

use crate::expense::types::ExpenseStatus;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The acting user has no pending step on the expense.
    #[error("No pending approval found for this user")]
    ApprovalNotFound,

    /// Attempted an invalid status transition.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: ExpenseStatus,
        /// The attempted target status.
        to: ExpenseStatus,
    },

    /// A rule's amount range has min above max.
    #[error("Invalid amount range: min {min} exceeds max {max}")]
    InvalidAmountRange {
        /// Lower bound of the range.
        min: Decimal,
        /// Upper bound of the range.
        max: Decimal,
    },

    /// A percentage conditional rule carries a value outside 1..=100.
    #[error("Percentage must be between 1 and 100, got {value}")]
    InvalidPercentage {
        /// The offending value.
        value: u8,
    },

    /// A percentage conditional rule has no percentage set.
    #[error("Percentage is required for percentage rule type")]
    MissingPercentage,

    /// A specific-approver conditional rule has no approver set.
    #[error("Specific approver is required for specific_approver rule type")]
    MissingSpecificApprover,
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ApprovalNotFound => 403,
            Self::InvalidTransition { .. }
            | Self::InvalidAmountRange { .. }
            | Self::InvalidPercentage { .. }
            | Self::MissingPercentage
            | Self::MissingSpecificApprover => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::ApprovalNotFound => "APPROVAL_NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidAmountRange { .. } => "INVALID_AMOUNT_RANGE",
            Self::InvalidPercentage { .. } => "INVALID_PERCENTAGE",
            Self::MissingPercentage => "MISSING_PERCENTAGE",
            Self::MissingSpecificApprover => "MISSING_SPECIFIC_APPROVER",
        }
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::ApprovalNotFound => Self::Forbidden(err.to_string()),
            WorkflowError::InvalidTransition { .. } => Self::BusinessRule(err.to_string()),
            WorkflowError::InvalidAmountRange { .. }
            | WorkflowError::InvalidPercentage { .. }
            | WorkflowError::MissingPercentage
            | WorkflowError::MissingSpecificApprover => Self::Validation(err.to_string()),
        }
    }
}
