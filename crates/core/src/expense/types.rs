//! Expense domain types.
//!
//! These types serialize to the same JSON shapes the document store already
//! holds (lowercase / snake_case string tags), so stored expenses remain
//! readable across versions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use expenso_shared::error::{AppError, AppResult};
use expenso_shared::types::{CurrencyCode, Money, UserId};

use crate::workflow::approval::ConditionalRule;

/// Expense status in the approval workflow.
///
/// Expenses progress through these states from submission to reimbursement.
/// The valid transitions are:
/// - Draft -> Pending (submit)
/// - Processing -> Pending (flow constructed after async intake)
/// - Pending -> Approved (all required steps approved, or auto-approval)
/// - Pending -> Rejected (any required approver rejects)
/// - Rejected -> Pending (resubmission - the only re-entry transition)
/// - Approved -> Reimbursed (downstream payout, outside this core)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Expense is being drafted and can be modified or deleted.
    Draft,
    /// Expense has been submitted and awaits approval.
    Pending,
    /// Expense has been fully approved.
    Approved,
    /// Expense has been rejected by an approver.
    Rejected,
    /// Transitional status while async intake (e.g. receipt extraction) runs.
    Processing,
    /// Expense has been paid out (immutable).
    Reimbursed,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Processing => "processing",
            Self::Reimbursed => "reimbursed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "processing" => Some(Self::Processing),
            "reimbursed" => Some(Self::Reimbursed),
            _ => None,
        }
    }

    /// Returns true if the expense can still be modified by its owner.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the status is terminal for the approval workflow.
    ///
    /// `Rejected` is terminal for the flow but can be re-entered via
    /// resubmission; nothing else reopens without an explicit admin override.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Reimbursed)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expense category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    /// Travel costs (flights, trains, mileage).
    Travel,
    /// Meals and per-diem.
    Meals,
    /// Hotels and lodging.
    Accommodation,
    /// Local transportation (taxi, transit).
    Transportation,
    /// Office supplies.
    OfficeSupplies,
    /// Client entertainment.
    Entertainment,
    /// Anything else.
    Other,
}

impl ExpenseCategory {
    /// Returns the string representation of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Meals => "meals",
            Self::Accommodation => "accommodation",
            Self::Transportation => "transportation",
            Self::OfficeSupplies => "office_supplies",
            Self::Entertainment => "entertainment",
            Self::Other => "other",
        }
    }

    /// Parses a category from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "travel" => Some(Self::Travel),
            "meals" => Some(Self::Meals),
            "accommodation" => Some(Self::Accommodation),
            "transportation" => Some(Self::Transportation),
            "office_supplies" => Some(Self::OfficeSupplies),
            "entertainment" => Some(Self::Entertainment),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Awaiting the approver's decision.
    Pending,
    /// Approved by the step's approver.
    Approved,
    /// Rejected by the step's approver.
    Rejected,
}

/// The two verbs an approver can apply to a pending step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    /// Approve the step.
    Approved,
    /// Reject the step (terminal for the whole expense).
    Rejected,
}

impl ApprovalAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// The step status this action resolves a pending step to.
    #[must_use]
    pub fn step_status(&self) -> StepStatus {
        match self {
            Self::Approved => StepStatus::Approved,
            Self::Rejected => StepStatus::Rejected,
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role recorded against an approval step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproverRole {
    /// The employee's manager.
    Manager,
    /// A company administrator.
    Admin,
    /// A finance-team approver.
    Finance,
}

impl ApproverRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Finance => "finance",
        }
    }

    /// Parses a role from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "manager" => Some(Self::Manager),
            "admin" => Some(Self::Admin),
            "finance" => Some(Self::Finance),
            _ => None,
        }
    }
}

/// Role a user holds in the company directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    /// Regular employee.
    Employee,
    /// People manager.
    Manager,
    /// Company administrator.
    Admin,
}

impl EmployeeRole {
    /// Returns the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

/// One entry in an expense's approval flow, binding one approver to one
/// sequence position with its own approve/reject state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalStep {
    /// The concrete approver resolved at flow-construction time.
    pub approver_id: UserId,
    /// The role the approver acts under for this step.
    pub approver_role: ApproverRole,
    /// Current state of this step.
    pub status: StepStatus,
    /// Approver comments recorded with the decision.
    pub comments: Option<String>,
    /// When the decision was made.
    pub action_date: Option<DateTime<Utc>>,
    /// Position in the flow (ascending; not necessarily contiguous).
    pub sequence: u32,
    /// Whether this step must be approved for overall completion.
    pub is_required: bool,
}

impl ApprovalStep {
    /// Creates a new pending step.
    #[must_use]
    pub fn pending(
        approver_id: UserId,
        approver_role: ApproverRole,
        sequence: u32,
        is_required: bool,
    ) -> Self {
        Self {
            approver_id,
            approver_role,
            status: StepStatus::Pending,
            comments: None,
            action_date: None,
            sequence,
            is_required,
        }
    }

    /// Returns true if this step still awaits a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == StepStatus::Pending
    }
}

/// The expense amount pair: what was spent, and its company-currency value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseAmount {
    /// Amount as originally incurred.
    pub original: Money,
    /// Amount converted to the company's base currency, when conversion
    /// succeeded at submission time.
    pub converted: Option<ConvertedAmount>,
}

impl ExpenseAmount {
    /// Creates an unconverted amount.
    #[must_use]
    pub const fn new(original: Money) -> Self {
        Self {
            original,
            converted: None,
        }
    }

    /// The effective amount used for all threshold comparisons:
    /// the converted value if present, else the original value.
    #[must_use]
    pub fn effective(&self) -> Decimal {
        self.converted
            .as_ref()
            .map_or(self.original.amount, |c| c.value)
    }

    /// Installs a successful company-currency conversion.
    ///
    /// A same-currency "conversion" is a no-op: `converted` is only ever set
    /// when the original currency differs from the company currency.
    pub fn apply_conversion(&mut self, value: Decimal, exchange_rate: Decimal, currency: CurrencyCode) {
        if currency == self.original.currency {
            return;
        }
        self.converted = Some(ConvertedAmount {
            value,
            currency,
            exchange_rate,
            converted_at: Utc::now(),
        });
    }
}

/// A company-currency conversion applied to an expense amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertedAmount {
    /// Converted value in the company currency.
    pub value: Decimal,
    /// Target currency (always the company's base currency).
    pub currency: CurrencyCode,
    /// Rate used for the conversion.
    pub exchange_rate: Decimal,
    /// When the conversion was performed.
    pub converted_at: DateTime<Utc>,
}

/// Conditional-approval state snapshotted onto an expense from its rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionalApproval {
    /// Whether conditional completion rules were enabled on the matched rule.
    pub is_enabled: bool,
    /// Snapshot of the rule's conditional rules at flow-construction time.
    pub rules: Vec<ConditionalRule>,
    /// Count of approvals received so far (bookkeeping only; completion is
    /// driven by required steps, not this counter).
    pub current_approvals: Option<u32>,
    /// Percentage-derived approval threshold computed at flow construction.
    pub required_approvals: Option<u32>,
}

/// Actions recorded in the expense audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Expense record created.
    Created,
    /// Expense submitted (or resubmitted) for approval.
    Submitted,
    /// An approval was granted (step-level or final).
    Approved,
    /// The expense was rejected.
    Rejected,
    /// The expense was edited while in draft.
    Modified,
    /// The expense was paid out.
    Reimbursed,
    /// Admin force-approved all pending steps.
    AdminOverrideApproved,
    /// Admin force-rejected all pending steps.
    AdminOverrideRejected,
}

impl AuditAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Modified => "modified",
            Self::Reimbursed => "reimbursed",
            Self::AdminOverrideApproved => "admin_override_approved",
            Self::AdminOverrideRejected => "admin_override_rejected",
        }
    }
}

/// One append-only audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// Who did it.
    pub performed_by: UserId,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Human-readable detail line.
    pub details: String,
    /// Snapshot of overwritten values, when the action replaced state.
    pub previous_values: Option<serde_json::Value>,
}

/// Company policy settings consulted by the approval engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanySettings {
    /// The company's base currency.
    pub currency: CurrencyCode,
    /// Expenses at or below this effective amount bypass the approval flow.
    /// Zero disables auto-approval entirely.
    pub auto_approval_limit: Decimal,
    /// Whether the employee's manager is the default approver when no rule
    /// matches.
    pub is_manager_approver: bool,
    /// Hard cap on a single expense's effective amount, if the company set
    /// one.
    pub max_expense_amount: Option<Decimal>,
}

impl CompanySettings {
    /// Checks an expense amount against the company's hard cap.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the amount exceeds the cap.
    pub fn check_expense_amount(&self, amount: Decimal) -> AppResult<()> {
        match self.max_expense_amount {
            Some(max) if amount > max => Err(AppError::Validation(format!(
                "Expense amount exceeds the company maximum of {max}"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            ExpenseStatus::Draft,
            ExpenseStatus::Pending,
            ExpenseStatus::Approved,
            ExpenseStatus::Rejected,
            ExpenseStatus::Processing,
            ExpenseStatus::Reimbursed,
        ] {
            assert_eq!(ExpenseStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ExpenseStatus::parse("PENDING"), Some(ExpenseStatus::Pending));
        assert_eq!(ExpenseStatus::parse("invalid"), None);
    }

    #[test]
    fn test_status_predicates() {
        assert!(ExpenseStatus::Draft.is_editable());
        assert!(!ExpenseStatus::Pending.is_editable());
        assert!(ExpenseStatus::Approved.is_terminal());
        assert!(ExpenseStatus::Rejected.is_terminal());
        assert!(ExpenseStatus::Reimbursed.is_terminal());
        assert!(!ExpenseStatus::Pending.is_terminal());
        assert!(!ExpenseStatus::Processing.is_terminal());
    }

    #[test]
    fn test_category_round_trip() {
        for cat in [
            ExpenseCategory::Travel,
            ExpenseCategory::Meals,
            ExpenseCategory::Accommodation,
            ExpenseCategory::Transportation,
            ExpenseCategory::OfficeSupplies,
            ExpenseCategory::Entertainment,
            ExpenseCategory::Other,
        ] {
            assert_eq!(ExpenseCategory::parse(cat.as_str()), Some(cat));
        }
        assert_eq!(ExpenseCategory::parse("office_supplies"), Some(ExpenseCategory::OfficeSupplies));
        assert_eq!(ExpenseCategory::parse("groceries"), None);
    }

    #[test]
    fn test_action_maps_to_step_status() {
        assert_eq!(ApprovalAction::Approved.step_status(), StepStatus::Approved);
        assert_eq!(ApprovalAction::Rejected.step_status(), StepStatus::Rejected);
    }

    #[test]
    fn test_audit_action_override_tags() {
        assert_eq!(
            AuditAction::AdminOverrideApproved.as_str(),
            "admin_override_approved"
        );
        assert_eq!(
            AuditAction::AdminOverrideRejected.as_str(),
            "admin_override_rejected"
        );
    }

    #[test]
    fn test_audit_action_serde_tags_match_as_str() {
        for action in [
            AuditAction::Created,
            AuditAction::Submitted,
            AuditAction::Approved,
            AuditAction::Rejected,
            AuditAction::Modified,
            AuditAction::Reimbursed,
            AuditAction::AdminOverrideApproved,
            AuditAction::AdminOverrideRejected,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }

    #[test]
    fn test_effective_amount_prefers_converted() {
        let mut amount = ExpenseAmount::new(Money::new(dec!(100), usd()));
        assert_eq!(amount.effective(), dec!(100));

        amount.converted = Some(ConvertedAmount {
            value: dec!(85.50),
            currency: CurrencyCode::new("EUR").unwrap(),
            exchange_rate: dec!(0.855),
            converted_at: Utc::now(),
        });
        assert_eq!(amount.effective(), dec!(85.50));
    }

    #[test]
    fn test_apply_conversion_skips_same_currency() {
        let mut amount = ExpenseAmount::new(Money::new(dec!(100), usd()));
        amount.apply_conversion(dec!(100), dec!(1), usd());
        assert!(amount.converted.is_none());

        amount.apply_conversion(dec!(91.30), dec!(0.913), CurrencyCode::new("EUR").unwrap());
        let converted = amount.converted.as_ref().unwrap();
        assert_eq!(converted.value, dec!(91.30));
        assert_eq!(converted.exchange_rate, dec!(0.913));
    }

    #[test]
    fn test_check_expense_amount_cap() {
        let settings = CompanySettings {
            currency: usd(),
            auto_approval_limit: dec!(0),
            is_manager_approver: true,
            max_expense_amount: Some(dec!(5000)),
        };
        assert!(settings.check_expense_amount(dec!(5000)).is_ok());
        assert!(settings.check_expense_amount(dec!(5000.01)).is_err());

        let uncapped = CompanySettings {
            max_expense_amount: None,
            ..settings
        };
        assert!(uncapped.check_expense_amount(dec!(1000000)).is_ok());
    }

    #[test]
    fn test_pending_step_defaults() {
        let step = ApprovalStep::pending(UserId::new(), ApproverRole::Manager, 1, true);
        assert!(step.is_pending());
        assert!(step.comments.is_none());
        assert!(step.action_date.is_none());
    }

    #[test]
    fn test_approver_role_parse() {
        assert_eq!(ApproverRole::parse("finance"), Some(ApproverRole::Finance));
        assert_eq!(ApproverRole::parse("Admin"), Some(ApproverRole::Admin));
        assert_eq!(ApproverRole::parse("ceo"), None);
    }
}
