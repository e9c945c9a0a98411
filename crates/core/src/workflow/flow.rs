//! Approval-flow construction.
//!
//! Turns a matched rule's template (or the company's default routing policy)
//! into concrete approval steps on an expense. Resolution failures never fail
//! the build: the step is omitted and reported as a warning, so one departed
//! approver cannot block expense intake.

use std::sync::Arc;

use serde::Serialize;

use expenso_shared::error::AppResult;

use crate::expense::aggregate::Expense;
use crate::expense::types::{CompanySettings, ConditionalApproval, EmployeeRole};
use crate::workflow::approval::{ApprovalRule, ApproverSpec, ConditionalRuleType};
use crate::workflow::directory::{Employee, UserDirectory};

/// A template step that could not be resolved to a concrete approver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedApprover {
    /// The template step's sequence number.
    pub sequence: u32,
    /// Why resolution failed.
    pub reason: String,
}

/// Result of a flow build.
#[derive(Debug, Default)]
pub struct FlowOutcome {
    /// Number of concrete steps added to the expense.
    pub steps_added: usize,
    /// Template steps that were dropped, with reasons. A flow can end up
    /// empty; the expense then sits pending until an admin intervenes.
    pub warnings: Vec<UnresolvedApprover>,
}

impl FlowOutcome {
    fn resolved(&mut self) {
        self.steps_added += 1;
    }

    fn dropped(&mut self, sequence: u32, reason: impl Into<String>) {
        self.warnings.push(UnresolvedApprover {
            sequence,
            reason: reason.into(),
        });
    }
}

/// Builds approval flows from rule templates and default routing policy.
pub struct FlowBuilder {
    directory: Arc<dyn UserDirectory>,
}

impl FlowBuilder {
    /// Creates a builder over the given user directory.
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Builds the approval flow onto `expense`.
    ///
    /// With a matched rule, its template drives the flow; without one, the
    /// company's default routing applies (the employee's manager when policy
    /// routes through managers, else an active admin). Unresolvable steps are
    /// omitted and reported in the outcome rather than failing the build, so
    /// a flow can end up empty.
    ///
    /// # Errors
    ///
    /// Only directory failures propagate; resolution misses do not.
    pub async fn build(
        &self,
        expense: &mut Expense,
        employee: &Employee,
        settings: &CompanySettings,
        rule: Option<&ApprovalRule>,
    ) -> AppResult<FlowOutcome> {
        match rule {
            Some(rule) => self.build_from_rule(expense, employee, rule).await,
            None => self.build_default(expense, employee, settings).await,
        }
    }

    /// Resolves a rule's templates in sequence order. When the rule enables
    /// conditional approval, its rules are snapshotted onto the expense and
    /// the percentage threshold is computed from the steps actually added.
    async fn build_from_rule(
        &self,
        expense: &mut Expense,
        employee: &Employee,
        rule: &ApprovalRule,
    ) -> AppResult<FlowOutcome> {
        let mut outcome = FlowOutcome::default();

        let mut templates: Vec<_> = rule.approval_flow.iter().collect();
        templates.sort_by_key(|t| t.sequence);

        for template in templates {
            let resolved = match &template.approver {
                ApproverSpec::Manager => self.resolve_manager(employee).await?,
                ApproverSpec::SpecificUser { approver_id, .. } => {
                    match self.directory.find_user_by_id(*approver_id).await? {
                        Some(user) => Ok(user),
                        None => Err("approver user not found in directory".to_string()),
                    }
                }
                ApproverSpec::RoleBased { approver_role } => {
                    match self
                        .directory
                        .find_active_user_by_role(expense.company_id, *approver_role)
                        .await?
                    {
                        Some(user) => Ok(user),
                        None => Err(format!(
                            "no active user with role '{}' in company",
                            approver_role.as_str()
                        )),
                    }
                }
                ApproverSpec::DepartmentHead { department, .. } => {
                    match self
                        .directory
                        .find_active_user_by_department_and_role(
                            expense.company_id,
                            department,
                            &[EmployeeRole::Manager, EmployeeRole::Admin],
                        )
                        .await?
                    {
                        Some(user) => Ok(user),
                        None => Err(format!("no active head found for department '{department}'")),
                    }
                }
            };

            match resolved {
                Ok(user) => {
                    expense.add_approval_step(
                        user.id,
                        template.recorded_role(),
                        template.sequence,
                        template.is_required,
                    );
                    outcome.resolved();
                }
                Err(reason) => outcome.dropped(template.sequence, reason),
            }
        }

        if rule.conditional_rules.is_enabled && !rule.conditional_rules.rules.is_empty() {
            expense.conditional_approval = ConditionalApproval {
                is_enabled: true,
                rules: rule.conditional_rules.rules.clone(),
                current_approvals: Some(0),
                required_approvals: Self::percentage_threshold(rule, outcome.steps_added),
            };
        }

        Ok(outcome)
    }

    /// Default routing when no rule matches: the employee's manager when
    /// company policy routes through managers, falling back to an active
    /// company admin. A single required step at sequence 1.
    async fn build_default(
        &self,
        expense: &mut Expense,
        employee: &Employee,
        settings: &CompanySettings,
    ) -> AppResult<FlowOutcome> {
        use crate::expense::types::ApproverRole;

        let mut outcome = FlowOutcome::default();

        if settings.is_manager_approver {
            match self.resolve_manager(employee).await? {
                Ok(manager) => {
                    expense.add_approval_step(manager.id, ApproverRole::Manager, 1, true);
                    outcome.resolved();
                    return Ok(outcome);
                }
                Err(reason) => outcome.dropped(1, reason),
            }
        }

        match self
            .directory
            .find_active_user_by_role(expense.company_id, ApproverRole::Admin)
            .await?
        {
            Some(admin) => {
                expense.add_approval_step(admin.id, ApproverRole::Admin, 1, true);
                outcome.resolved();
            }
            None => outcome.dropped(1, "no active admin in company"),
        }

        Ok(outcome)
    }

    /// Resolves the submitting employee's manager, confirming the referenced
    /// user still exists in the directory.
    async fn resolve_manager(&self, employee: &Employee) -> AppResult<Result<Employee, String>> {
        let Some(manager_id) = employee.manager_id else {
            return Ok(Err("employee has no manager assigned".to_string()));
        };
        Ok(match self.directory.find_user_by_id(manager_id).await? {
            Some(manager) => Ok(manager),
            None => Err("assigned manager not found in directory".to_string()),
        })
    }

    /// The percentage-derived approval threshold: `ceil(steps * pct / 100)`
    /// over the first percentage-bearing conditional rule, ordered by rule
    /// priority. Stored on the expense for reporting; completion itself is
    /// driven by required steps.
    fn percentage_threshold(rule: &ApprovalRule, total_steps: usize) -> Option<u32> {
        let mut rules: Vec<_> = rule.conditional_rules.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
            .iter()
            .find(|r| {
                matches!(
                    r.rule_type,
                    ConditionalRuleType::Percentage | ConditionalRuleType::Hybrid
                ) && r.percentage.is_some()
            })
            .and_then(|r| r.percentage)
            .map(|pct| {
                let total = u32::try_from(total_steps).unwrap_or(u32::MAX);
                (total * u32::from(pct)).div_ceil(100)
            })
    }
}
