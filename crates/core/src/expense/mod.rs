//! The expense aggregate and its embedded approval flow.
//!
//! An expense owns its approval steps, conditional-approval snapshot, and
//! append-only audit log as value-type sub-records; the aggregate is the unit
//! of persistence, with no independent lifecycle for steps.
//!
//! # Modules
//!
//! - `types` - Status/category enums, approval steps, audit entries, amounts
//! - `aggregate` - The `Expense` aggregate root

pub mod aggregate;
pub mod types;

pub use aggregate::Expense;
pub use types::{
    ApprovalAction, ApprovalStep, ApproverRole, AuditAction, AuditEntry, CompanySettings,
    ConditionalApproval, ConvertedAmount, EmployeeRole, ExpenseAmount, ExpenseCategory,
    ExpenseStatus, StepStatus,
};
