//! The expense approval state machine.
//!
//! `ApprovalService` is stateless; every operation takes the expense
//! aggregate by mutable reference and either mutates it atomically or
//! returns an error with no partial writes.

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use expenso_shared::types::UserId;

use crate::expense::aggregate::Expense;
use crate::expense::types::{ApprovalAction, AuditAction, CompanySettings, ExpenseStatus};
use crate::workflow::error::WorkflowError;

/// What a processed approval decision resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// Every required step is approved; the expense is approved.
    Approved,
    /// The decision rejected the expense (terminal).
    Rejected,
    /// The step was approved but required steps remain pending.
    AwaitingFurtherApproval,
}

/// Stateless service driving expense status transitions.
pub struct ApprovalService;

impl ApprovalService {
    /// Auto-approves the expense when either its converted or its original
    /// value is at or under the company limit.
    ///
    /// The check is a permissive OR on purpose: an expense whose converted
    /// value exceeds the limit still auto-approves when its original value
    /// is within it. A zero limit disables auto-approval. Returns whether
    /// the expense was approved.
    pub fn check_auto_approval(expense: &mut Expense, settings: &CompanySettings) -> bool {
        if expense.status != ExpenseStatus::Pending {
            return false;
        }
        let limit = settings.auto_approval_limit;
        if limit <= Decimal::ZERO {
            return false;
        }

        let original_within = expense.amount.original.amount <= limit;
        let converted_within = expense
            .amount
            .converted
            .as_ref()
            .is_some_and(|c| c.value <= limit);
        if !(original_within || converted_within) {
            return false;
        }

        expense.status = ExpenseStatus::Approved;
        expense.final_approved_at = Some(Utc::now());
        expense.record_audit(
            AuditAction::Approved,
            expense.employee_id,
            "Auto-approved based on amount threshold",
        );
        true
    }

    /// Submits (or resubmits) the expense for approval.
    ///
    /// Draft and rejected expenses move to pending; rejected -> pending is
    /// the only re-entry transition in the status graph. Resubmission clears
    /// the previous rejection.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` for any other source status.
    pub fn submit(expense: &mut Expense, performed_by: UserId) -> Result<(), WorkflowError> {
        if !Self::is_valid_transition(expense.status, ExpenseStatus::Pending) {
            return Err(WorkflowError::InvalidTransition {
                from: expense.status,
                to: ExpenseStatus::Pending,
            });
        }

        expense.status = ExpenseStatus::Pending;
        expense.submitted_at = Utc::now();
        expense.rejected_at = None;
        expense.rejection_reason = None;
        expense.record_audit(
            AuditAction::Submitted,
            performed_by,
            "Expense submitted for approval",
        );
        Ok(())
    }

    /// Applies one approver's decision to their pending step.
    ///
    /// The approver must hold exactly one pending step on the expense;
    /// anything else (no step, already decided, or a duplicate pending
    /// step) is `ApprovalNotFound` and leaves the expense untouched.
    ///
    /// A rejection is terminal immediately, regardless of remaining steps.
    /// An approval completes the expense once no required step remains
    /// pending; optional steps never block completion. The conditional
    /// approval counter is maintained but its threshold is not consulted
    /// here.
    ///
    /// # Errors
    ///
    /// `ApprovalNotFound` when the precondition fails or the expense is no
    /// longer pending.
    pub fn process_approval(
        expense: &mut Expense,
        approver_id: UserId,
        action: ApprovalAction,
        comments: Option<&str>,
    ) -> Result<ApprovalOutcome, WorkflowError> {
        if expense.status != ExpenseStatus::Pending {
            return Err(WorkflowError::ApprovalNotFound);
        }
        let mut pending = expense
            .approval_flow
            .iter()
            .enumerate()
            .filter(|(_, step)| step.approver_id == approver_id && step.is_pending())
            .map(|(i, _)| i);
        let index = pending.next().ok_or(WorkflowError::ApprovalNotFound)?;
        if pending.next().is_some() {
            return Err(WorkflowError::ApprovalNotFound);
        }

        let now = Utc::now();
        let step = &mut expense.approval_flow[index];
        step.status = action.step_status();
        step.comments = comments.map(ToOwned::to_owned);
        step.action_date = Some(now);

        let details = match comments {
            Some(c) => format!("Expense {action}: {c}"),
            None => format!("Expense {action}"),
        };
        let audit_action = match action {
            ApprovalAction::Approved => AuditAction::Approved,
            ApprovalAction::Rejected => AuditAction::Rejected,
        };
        expense.record_audit(audit_action, approver_id, details);

        match action {
            ApprovalAction::Rejected => {
                expense.status = ExpenseStatus::Rejected;
                expense.rejected_at = Some(now);
                expense.rejection_reason = comments.map(ToOwned::to_owned);
                Ok(ApprovalOutcome::Rejected)
            }
            ApprovalAction::Approved => {
                if expense.conditional_approval.is_enabled {
                    let count = expense.conditional_approval.current_approvals.unwrap_or(0);
                    expense.conditional_approval.current_approvals = Some(count + 1);
                }

                let required_pending = expense
                    .approval_flow
                    .iter()
                    .any(|step| step.is_required && step.is_pending());
                if required_pending {
                    Ok(ApprovalOutcome::AwaitingFurtherApproval)
                } else {
                    expense.status = ExpenseStatus::Approved;
                    expense.final_approved_at = Some(now);
                    Ok(ApprovalOutcome::Approved)
                }
            }
        }
    }

    /// Force-resolves every pending step and sets the expense status
    /// directly, bypassing the normal transition rules.
    ///
    /// The audit entry is tagged with the override action and carries a
    /// snapshot of the statuses it overwrote.
    pub fn admin_override(
        expense: &mut Expense,
        admin_id: UserId,
        action: ApprovalAction,
        comments: Option<&str>,
    ) -> ApprovalOutcome {
        let now = Utc::now();
        let override_comment = format!("Admin override: {}", comments.unwrap_or("No comments"));

        let previous_steps: Vec<_> = expense
            .approval_flow
            .iter()
            .filter(|step| step.is_pending())
            .map(|step| {
                json!({
                    "sequence": step.sequence,
                    "approver_id": step.approver_id,
                    "status": "pending",
                })
            })
            .collect();
        let previous = json!({
            "status": expense.status.as_str(),
            "steps": previous_steps,
        });

        for step in &mut expense.approval_flow {
            if step.is_pending() {
                step.status = action.step_status();
                step.comments = Some(override_comment.clone());
                step.action_date = Some(now);
            }
        }

        let (audit_action, outcome) = match action {
            ApprovalAction::Approved => {
                expense.status = ExpenseStatus::Approved;
                expense.final_approved_at = Some(now);
                (AuditAction::AdminOverrideApproved, ApprovalOutcome::Approved)
            }
            ApprovalAction::Rejected => {
                expense.status = ExpenseStatus::Rejected;
                expense.rejected_at = Some(now);
                expense.rejection_reason = Some(override_comment.clone());
                (AuditAction::AdminOverrideRejected, ApprovalOutcome::Rejected)
            }
        };
        expense.record_audit_with_previous(audit_action, admin_id, override_comment, previous);
        outcome
    }

    /// The expense status graph.
    ///
    /// `rejected -> pending` (resubmission) is the only re-entry edge;
    /// `processing -> pending` covers async intake handing off to approval.
    #[must_use]
    pub fn is_valid_transition(from: ExpenseStatus, to: ExpenseStatus) -> bool {
        matches!(
            (from, to),
            (ExpenseStatus::Draft | ExpenseStatus::Rejected | ExpenseStatus::Processing, ExpenseStatus::Pending)
                | (ExpenseStatus::Pending, ExpenseStatus::Approved | ExpenseStatus::Rejected)
                | (ExpenseStatus::Approved, ExpenseStatus::Reimbursed)
        )
    }
}
