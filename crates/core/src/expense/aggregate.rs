//! The `Expense` aggregate root.
//!
//! The aggregate owns its approval flow, conditional-approval snapshot and
//! audit log. Every mutation that matters to an auditor appends an entry to
//! `audit_log`; the log is append-only and never rewritten.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use expenso_shared::error::{AppError, AppResult};
use expenso_shared::types::{CompanyId, ExpenseId, Money, UserId};

use crate::expense::types::{
    ApprovalStep, ApproverRole, AuditAction, AuditEntry, ConditionalApproval, ExpenseAmount,
    ExpenseCategory, ExpenseStatus,
};

/// A submitted expense and its approval state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier.
    pub id: ExpenseId,
    /// The employee who incurred the expense.
    pub employee_id: UserId,
    /// The company the expense belongs to.
    pub company_id: CompanyId,
    /// Original and (optionally) company-currency amounts.
    pub amount: ExpenseAmount,
    /// Expense category.
    pub category: ExpenseCategory,
    /// What the expense was for.
    pub description: String,
    /// Current workflow status.
    pub status: ExpenseStatus,
    /// Ordered approval steps; sorted ascending by sequence.
    pub approval_flow: Vec<ApprovalStep>,
    /// Conditional-approval snapshot from the matched rule, if any.
    pub conditional_approval: ConditionalApproval,
    /// Append-only audit trail.
    pub audit_log: Vec<AuditEntry>,
    /// When the expense was incurred.
    pub expense_date: DateTime<Utc>,
    /// When the expense was submitted.
    pub submitted_at: DateTime<Utc>,
    /// When the final approval landed.
    pub final_approved_at: Option<DateTime<Utc>>,
    /// When the expense was rejected.
    pub rejected_at: Option<DateTime<Utc>>,
    /// The rejecting approver's comments.
    pub rejection_reason: Option<String>,
}

impl Expense {
    /// Creates a new expense in `Pending` status with an immediate `created`
    /// audit entry.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the amount is not strictly
    /// positive, the description is shorter than 5 or longer than 500
    /// characters, or the expense date is in the future or more than a year
    /// old.
    pub fn new(
        employee_id: UserId,
        company_id: CompanyId,
        original: Money,
        category: ExpenseCategory,
        description: impl Into<String>,
        expense_date: DateTime<Utc>,
    ) -> AppResult<Self> {
        let description = description.into();
        if !original.is_positive() {
            return Err(AppError::Validation("Amount must be positive".to_string()));
        }
        if description.trim().len() < 5 || description.len() > 500 {
            return Err(AppError::Validation(
                "Description must be between 5 and 500 characters".to_string(),
            ));
        }
        let now = Utc::now();
        if expense_date > now || expense_date < now - Duration::days(365) {
            return Err(AppError::Validation(
                "Expense date must be within the last year and not in the future".to_string(),
            ));
        }

        let mut expense = Self {
            id: ExpenseId::new(),
            employee_id,
            company_id,
            amount: ExpenseAmount::new(original),
            category,
            description,
            status: ExpenseStatus::Pending,
            approval_flow: Vec::new(),
            conditional_approval: ConditionalApproval::default(),
            audit_log: Vec::new(),
            expense_date,
            submitted_at: now,
            final_approved_at: None,
            rejected_at: None,
            rejection_reason: None,
        };
        expense.record_audit(AuditAction::Created, employee_id, "Expense created");
        Ok(expense)
    }

    /// Appends an audit entry.
    pub fn record_audit(
        &mut self,
        action: AuditAction,
        performed_by: UserId,
        details: impl Into<String>,
    ) {
        self.audit_log.push(AuditEntry {
            action,
            performed_by,
            timestamp: Utc::now(),
            details: details.into(),
            previous_values: None,
        });
    }

    /// Appends an audit entry carrying a snapshot of the values it replaced.
    pub fn record_audit_with_previous(
        &mut self,
        action: AuditAction,
        performed_by: UserId,
        details: impl Into<String>,
        previous_values: serde_json::Value,
    ) {
        self.audit_log.push(AuditEntry {
            action,
            performed_by,
            timestamp: Utc::now(),
            details: details.into(),
            previous_values: Some(previous_values),
        });
    }

    /// Appends a pending approval step and re-sorts the flow ascending by
    /// sequence. Sequence numbers need not be contiguous.
    pub fn add_approval_step(
        &mut self,
        approver_id: UserId,
        approver_role: ApproverRole,
        sequence: u32,
        is_required: bool,
    ) {
        self.approval_flow.push(ApprovalStep::pending(
            approver_id,
            approver_role,
            sequence,
            is_required,
        ));
        self.approval_flow.sort_by_key(|step| step.sequence);
    }

    /// The effective amount used for all threshold comparisons.
    #[must_use]
    pub fn effective_amount(&self) -> Decimal {
        self.amount.effective()
    }

    /// The next approver awaiting the expense, if any.
    ///
    /// Only meaningful while the expense is pending; the flow is kept sorted
    /// by sequence, so this is the lowest-sequence pending step.
    #[must_use]
    pub fn current_approver(&self) -> Option<UserId> {
        if self.status != ExpenseStatus::Pending {
            return None;
        }
        self.approval_flow
            .iter()
            .find(|step| step.is_pending())
            .map(|step| step.approver_id)
    }
}
