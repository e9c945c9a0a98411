//! Approval rules and the rule matcher.
//!
//! A company's approval rules decide which approval flow an expense gets.
//! Rules are matched by amount range, category, department and employee role;
//! when multiple rules match, the one with the lowest priority value wins.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use expenso_shared::types::{ApprovalRuleId, CompanyId, UserId};

use crate::expense::aggregate::Expense;
use crate::expense::types::{ApproverRole, EmployeeRole, ExpenseCategory};
use crate::workflow::directory::Employee;
use crate::workflow::error::WorkflowError;

/// Inclusive amount range a rule applies to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountRange {
    /// Lower bound (inclusive).
    #[serde(default)]
    pub min: Decimal,
    /// Upper bound (inclusive).
    #[serde(default = "AmountRange::default_max")]
    pub max: Decimal,
}

impl AmountRange {
    fn default_max() -> Decimal {
        Decimal::MAX
    }

    /// Creates a range; both ends inclusive.
    #[must_use]
    pub const fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Returns true if `amount` falls within the range, bounds included.
    #[must_use]
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && amount <= self.max
    }
}

impl Default for AmountRange {
    fn default() -> Self {
        Self {
            min: Decimal::ZERO,
            max: Decimal::MAX,
        }
    }
}

/// The matching conditions of an approval rule.
///
/// An empty collection on any dimension means "no restriction on that
/// dimension".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConditions {
    /// Effective-amount range the rule applies to.
    #[serde(default)]
    pub amount_range: AmountRange,
    /// Categories the rule is restricted to.
    #[serde(default)]
    pub categories: Vec<ExpenseCategory>,
    /// Departments the rule is restricted to.
    #[serde(default)]
    pub departments: Vec<String>,
    /// Employee roles the rule is restricted to.
    #[serde(default)]
    pub employee_roles: Vec<EmployeeRole>,
}

/// How a template step's concrete approver is resolved.
///
/// A closed set of resolution strategies; resolution itself happens in the
/// flow builder against the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "approver_type", rename_all = "snake_case")]
pub enum ApproverSpec {
    /// The submitting employee's manager.
    Manager,
    /// A fixed user picked when the rule was authored.
    SpecificUser {
        /// The user to route to.
        approver_id: UserId,
        /// Role recorded on the step; defaults to manager.
        #[serde(default)]
        approver_role: Option<ApproverRole>,
    },
    /// The first active user holding a role in the company.
    RoleBased {
        /// The role to look up.
        approver_role: ApproverRole,
    },
    /// The first active manager or admin of a department.
    DepartmentHead {
        /// The department whose head approves.
        department: String,
        /// Role recorded on the step; defaults to manager.
        #[serde(default)]
        approver_role: Option<ApproverRole>,
    },
}

/// One step of a rule's approval-flow template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowStepTemplate {
    /// Position in the flow (ascending; not necessarily contiguous).
    pub sequence: u32,
    /// How to resolve the concrete approver.
    #[serde(flatten)]
    pub approver: ApproverSpec,
    /// Whether the resolved step must be approved for overall completion.
    #[serde(default = "FlowStepTemplate::default_required")]
    pub is_required: bool,
    /// Step-level auto-approve flag carried in the rule template.
    #[serde(default)]
    pub auto_approve: bool,
}

impl FlowStepTemplate {
    fn default_required() -> bool {
        true
    }

    /// Creates a required, non-auto-approve template step.
    #[must_use]
    pub const fn required(sequence: u32, approver: ApproverSpec) -> Self {
        Self {
            sequence,
            approver,
            is_required: true,
            auto_approve: false,
        }
    }

    /// The role recorded on the constructed step.
    ///
    /// Falls back to `manager` when the template carries no explicit role,
    /// matching the stored-document convention.
    #[must_use]
    pub fn recorded_role(&self) -> ApproverRole {
        match &self.approver {
            ApproverSpec::Manager => ApproverRole::Manager,
            ApproverSpec::RoleBased { approver_role } => *approver_role,
            ApproverSpec::SpecificUser { approver_role, .. }
            | ApproverSpec::DepartmentHead { approver_role, .. } => {
                approver_role.unwrap_or(ApproverRole::Manager)
            }
        }
    }
}

/// Kinds of conditional completion rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionalRuleType {
    /// A percentage of approvers suffices.
    Percentage,
    /// One specific approver's approval suffices.
    SpecificApprover,
    /// Combination of the two.
    Hybrid,
}

/// One conditional completion rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalRule {
    /// The kind of rule.
    #[serde(rename = "type")]
    pub rule_type: ConditionalRuleType,
    /// Required percentage (1..=100) for percentage rules.
    pub percentage: Option<u8>,
    /// The designated approver for specific-approver rules.
    pub specific_approver_id: Option<UserId>,
    /// Evaluation priority among conditional rules (lower first).
    #[serde(default = "ConditionalRule::default_priority")]
    pub priority: u32,
}

impl ConditionalRule {
    fn default_priority() -> u32 {
        1
    }

    /// Validates the per-kind invariants.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        match self.rule_type {
            ConditionalRuleType::Percentage => match self.percentage {
                None => Err(WorkflowError::MissingPercentage),
                Some(value) if !(1..=100).contains(&value) => {
                    Err(WorkflowError::InvalidPercentage { value })
                }
                Some(_) => Ok(()),
            },
            ConditionalRuleType::SpecificApprover => {
                if self.specific_approver_id.is_none() {
                    Err(WorkflowError::MissingSpecificApprover)
                } else {
                    Ok(())
                }
            }
            // Hybrid rules carry whichever fields were authored; the stored
            // documents never constrained them.
            ConditionalRuleType::Hybrid => Ok(()),
        }
    }
}

/// Conditional-approval configuration on a rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConditionalRules {
    /// Whether conditional completion is enabled.
    #[serde(default)]
    pub is_enabled: bool,
    /// The conditional rules, evaluated by ascending priority.
    #[serde(default)]
    pub rules: Vec<ConditionalRule>,
}

/// An approval rule owned by one company.
///
/// Rules are never deleted mid-flight except by explicit admin action;
/// in-flight expenses reference resolved approver IDs, not the rule, so rule
/// deletion does not orphan them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Unique identifier.
    pub id: ApprovalRuleId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Human-readable name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Matching conditions.
    pub conditions: RuleConditions,
    /// The approval-flow template, ascending by sequence.
    pub approval_flow: Vec<FlowStepTemplate>,
    /// Conditional completion configuration.
    #[serde(default)]
    pub conditional_rules: ConditionalRules,
    /// Rule selection priority (lower = evaluated first).
    pub priority: i16,
    /// Whether the rule participates in matching.
    pub is_active: bool,
    /// Creation time; the tie-break among equal priorities.
    pub created_at: DateTime<Utc>,
}

impl ApprovalRule {
    /// Validates the rule's structural invariants.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        let range = &self.conditions.amount_range;
        if range.min > range.max {
            return Err(WorkflowError::InvalidAmountRange {
                min: range.min,
                max: range.max,
            });
        }
        for rule in &self.conditional_rules.rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// Returns true if this rule applies to the expense/employee pair.
    ///
    /// All four conditions must hold: effective amount within range, and the
    /// category, department and role sets each empty or containing the
    /// candidate's value.
    #[must_use]
    pub fn applies_to(&self, expense: &Expense, employee: &Employee) -> bool {
        if !self.conditions.amount_range.contains(expense.effective_amount()) {
            return false;
        }

        if !self.conditions.categories.is_empty()
            && !self.conditions.categories.contains(&expense.category)
        {
            return false;
        }

        if !self.conditions.departments.is_empty()
            && !employee
                .department
                .as_ref()
                .is_some_and(|d| self.conditions.departments.contains(d))
        {
            return false;
        }

        if !self.conditions.employee_roles.is_empty()
            && !self.conditions.employee_roles.contains(&employee.role)
        {
            return false;
        }

        true
    }
}

/// Stateless matcher selecting the rules applicable to an expense.
pub struct RuleMatcher;

impl RuleMatcher {
    /// Filters and ranks a company's rules for an expense/employee pair.
    ///
    /// Returns the active, applicable rules sorted ascending by
    /// `(priority, created_at, id)` - creation-time tie-break, id as the
    /// final deterministic disambiguator. The caller uses index 0; ties are
    /// never merged.
    #[must_use]
    pub fn find_applicable<'a>(
        rules: &'a [ApprovalRule],
        expense: &Expense,
        employee: &Employee,
    ) -> Vec<&'a ApprovalRule> {
        let mut applicable: Vec<&ApprovalRule> = rules
            .iter()
            .filter(|rule| rule.is_active)
            .filter(|rule| rule.applies_to(expense, employee))
            .collect();

        applicable.sort_by_key(|rule| (rule.priority, rule.created_at, rule.id));
        applicable
    }
}
