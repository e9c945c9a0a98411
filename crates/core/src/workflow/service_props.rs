//! Property-based tests for the approval state machine.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use expenso_shared::types::{CompanyId, CurrencyCode, Money, UserId};

use crate::expense::aggregate::Expense;
use crate::expense::types::{
    ApprovalAction, ApproverRole, CompanySettings, ExpenseCategory, ExpenseStatus,
};
use crate::workflow::error::WorkflowError;
use crate::workflow::service::{ApprovalOutcome, ApprovalService};

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn make_expense(amount: Decimal) -> Expense {
    Expense::new(
        UserId::new(),
        CompanyId::new(),
        Money::new(amount, CurrencyCode::new("USD").unwrap()),
        ExpenseCategory::Other,
        "Generated test expense",
        Utc::now() - Duration::days(1),
    )
    .unwrap()
}

fn make_settings(limit: Decimal) -> CompanySettings {
    CompanySettings {
        currency: CurrencyCode::new("USD").unwrap(),
        auto_approval_limit: limit,
        is_manager_approver: true,
        max_expense_amount: None,
    }
}

/// Attaches `n` required steps with fresh approvers, sequences 1..=n.
fn attach_steps(expense: &mut Expense, n: usize) -> Vec<UserId> {
    let approvers: Vec<UserId> = (0..n).map(|_| UserId::new()).collect();
    for (i, approver) in approvers.iter().enumerate() {
        expense.add_approval_step(
            *approver,
            ApproverRole::Manager,
            u32::try_from(i + 1).unwrap(),
            true,
        );
    }
    approvers
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Auto-approval OR semantics
    // =========================================================================

    /// Auto-approval fires exactly when the original OR the converted value
    /// is at or under the (positive) limit.
    #[test]
    fn prop_auto_approval_or_semantics(
        original in arb_amount(),
        converted in arb_amount(),
        limit in arb_amount(),
    ) {
        let mut expense = make_expense(original);
        expense.amount.apply_conversion(
            converted,
            Decimal::ONE,
            CurrencyCode::new("EUR").unwrap(),
        );
        let expected = original <= limit || converted <= limit;

        let approved = ApprovalService::check_auto_approval(&mut expense, &make_settings(limit));
        prop_assert_eq!(approved, expected);
        if expected {
            prop_assert_eq!(expense.status, ExpenseStatus::Approved);
            prop_assert!(expense.final_approved_at.is_some());
        } else {
            prop_assert_eq!(expense.status, ExpenseStatus::Pending);
        }
    }

    /// Without a conversion only the original value is consulted.
    #[test]
    fn prop_auto_approval_unconverted(
        original in arb_amount(),
        limit in arb_amount(),
    ) {
        let mut expense = make_expense(original);
        let approved = ApprovalService::check_auto_approval(&mut expense, &make_settings(limit));
        prop_assert_eq!(approved, original <= limit);
    }

    // =========================================================================
    // Single-rejection terminality
    // =========================================================================

    /// One rejection anywhere in the flow makes the expense terminally
    /// rejected; every other step is left untouched and further decisions
    /// are refused.
    #[test]
    fn prop_single_rejection_is_terminal(
        steps in 1usize..6,
        reject_at in 0usize..6,
    ) {
        let reject_at = reject_at % steps;
        let mut expense = make_expense(Decimal::new(50_000, 2));
        let approvers = attach_steps(&mut expense, steps);

        let outcome = ApprovalService::process_approval(
            &mut expense,
            approvers[reject_at],
            ApprovalAction::Rejected,
            Some("Not compliant"),
        )
        .unwrap();

        prop_assert_eq!(outcome, ApprovalOutcome::Rejected);
        prop_assert_eq!(expense.status, ExpenseStatus::Rejected);
        prop_assert!(expense.rejected_at.is_some());
        prop_assert_eq!(expense.rejection_reason.as_deref(), Some("Not compliant"));

        for (i, step) in expense.approval_flow.iter().enumerate() {
            if i != reject_at {
                prop_assert!(step.is_pending());
            }
        }
        for (i, approver) in approvers.iter().enumerate() {
            if i != reject_at {
                let result = ApprovalService::process_approval(
                    &mut expense,
                    *approver,
                    ApprovalAction::Approved,
                    None,
                );
                prop_assert!(matches!(result, Err(WorkflowError::ApprovalNotFound)));
            }
        }
    }

    // =========================================================================
    // All-required-approved completion
    // =========================================================================

    /// The expense completes exactly when the last required step is
    /// approved, independent of the order approvers act in.
    #[test]
    fn prop_completion_on_last_required_approval(
        steps in 1usize..6,
        order_seed in any::<u64>(),
    ) {
        let mut expense = make_expense(Decimal::new(50_000, 2));
        let mut approvers = attach_steps(&mut expense, steps);

        // Deterministic shuffle from the seed; approval order is arbitrary.
        let mut seed = order_seed;
        for i in (1..approvers.len()).rev() {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = usize::try_from(seed % (i as u64 + 1)).unwrap();
            approvers.swap(i, j);
        }

        for (acted, approver) in approvers.iter().enumerate() {
            let outcome = ApprovalService::process_approval(
                &mut expense,
                *approver,
                ApprovalAction::Approved,
                None,
            )
            .unwrap();

            if acted + 1 == approvers.len() {
                prop_assert_eq!(outcome, ApprovalOutcome::Approved);
                prop_assert_eq!(expense.status, ExpenseStatus::Approved);
                prop_assert!(expense.final_approved_at.is_some());
            } else {
                prop_assert_eq!(outcome, ApprovalOutcome::AwaitingFurtherApproval);
                prop_assert_eq!(expense.status, ExpenseStatus::Pending);
            }
        }
    }

    /// Optional steps never gate completion.
    #[test]
    fn prop_optional_steps_do_not_gate(
        required in 1usize..4,
        optional in 1usize..4,
    ) {
        let mut expense = make_expense(Decimal::new(50_000, 2));
        let approvers = attach_steps(&mut expense, required);
        for i in 0..optional {
            expense.add_approval_step(
                UserId::new(),
                ApproverRole::Finance,
                u32::try_from(required + i + 1).unwrap(),
                false,
            );
        }

        let mut last = ApprovalOutcome::AwaitingFurtherApproval;
        for approver in &approvers {
            last = ApprovalService::process_approval(
                &mut expense,
                *approver,
                ApprovalAction::Approved,
                None,
            )
            .unwrap();
        }

        prop_assert_eq!(last, ApprovalOutcome::Approved);
        prop_assert_eq!(expense.status, ExpenseStatus::Approved);
    }
}
