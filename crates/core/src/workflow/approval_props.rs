//! Property-based tests for rule matching.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use expenso_shared::types::{ApprovalRuleId, CompanyId, CurrencyCode, Money, UserId};

use crate::expense::aggregate::Expense;
use crate::expense::types::{EmployeeRole, ExpenseCategory};
use crate::workflow::approval::{
    AmountRange, ApprovalRule, ApproverSpec, ConditionalRules, FlowStepTemplate, RuleConditions,
    RuleMatcher,
};
use crate::workflow::directory::Employee;

/// Strategy for generating random positive Decimal amounts.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating random expense categories.
fn arb_category() -> impl Strategy<Value = ExpenseCategory> {
    prop_oneof![
        Just(ExpenseCategory::Travel),
        Just(ExpenseCategory::Meals),
        Just(ExpenseCategory::Accommodation),
        Just(ExpenseCategory::Transportation),
        Just(ExpenseCategory::OfficeSupplies),
        Just(ExpenseCategory::Entertainment),
        Just(ExpenseCategory::Other),
    ]
}

/// Strategy for generating an inclusive amount range as raw cents.
fn arb_range() -> impl Strategy<Value = (i64, i64)> {
    (1i64..1_000_000i64, 1i64..1_000_000i64).prop_map(|(a, b)| (a.min(b), a.max(b)))
}

fn make_rule(company_id: CompanyId, priority: i16, conditions: RuleConditions) -> ApprovalRule {
    ApprovalRule {
        id: ApprovalRuleId::new(),
        company_id,
        name: "Generated".to_string(),
        description: None,
        conditions,
        approval_flow: vec![FlowStepTemplate::required(1, ApproverSpec::Manager)],
        conditional_rules: ConditionalRules::default(),
        priority,
        is_active: true,
        created_at: Utc::now(),
    }
}

fn make_expense(company_id: CompanyId, amount: Decimal, category: ExpenseCategory) -> Expense {
    Expense::new(
        UserId::new(),
        company_id,
        Money::new(amount, CurrencyCode::new("USD").unwrap()),
        category,
        "Generated test expense",
        Utc::now() - Duration::days(1),
    )
    .unwrap()
}

fn make_employee(role: EmployeeRole) -> Employee {
    Employee {
        id: UserId::new(),
        role,
        department: Some("Engineering".to_string()),
        manager_id: None,
        is_active: true,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // =========================================================================
    // Adding conditions only shrinks the applicable set (filter monotonicity)
    // =========================================================================

    /// A rule with extra conditions never applies where the unconstrained
    /// version does not.
    #[test]
    fn prop_adding_conditions_only_shrinks(
        amount in arb_amount(),
        category in arb_category(),
        (min, max) in arb_range(),
        restrict_category in arb_category(),
    ) {
        let company_id = CompanyId::new();
        let expense = make_expense(company_id, amount, category);
        let employee = make_employee(EmployeeRole::Employee);

        let loose = make_rule(company_id, 1, RuleConditions::default());

        let tight = make_rule(company_id, 1, RuleConditions {
            amount_range: AmountRange::new(Decimal::new(min, 2), Decimal::new(max, 2)),
            categories: vec![restrict_category],
            ..RuleConditions::default()
        });

        if tight.applies_to(&expense, &employee) {
            prop_assert!(loose.applies_to(&expense, &employee));
        }
    }

    /// Growing the rule set never removes previously applicable rules.
    #[test]
    fn prop_rule_set_growth_is_monotonic(
        amount in arb_amount(),
        category in arb_category(),
        (min, max) in arb_range(),
    ) {
        let company_id = CompanyId::new();
        let expense = make_expense(company_id, amount, category);
        let employee = make_employee(EmployeeRole::Employee);

        let base = vec![
            make_rule(company_id, 3, RuleConditions::default()),
            make_rule(company_id, 1, RuleConditions {
                amount_range: AmountRange::new(Decimal::new(min, 2), Decimal::new(max, 2)),
                ..RuleConditions::default()
            }),
        ];
        let before: Vec<_> = RuleMatcher::find_applicable(&base, &expense, &employee)
            .iter()
            .map(|r| r.id)
            .collect();

        let mut grown = base.clone();
        grown.push(make_rule(company_id, 2, RuleConditions::default()));
        let after: Vec<_> = RuleMatcher::find_applicable(&grown, &expense, &employee)
            .iter()
            .map(|r| r.id)
            .collect();

        for id in &before {
            prop_assert!(after.contains(id));
        }
    }

    // =========================================================================
    // Priority ordering
    // =========================================================================

    /// The matcher's first result always carries the lowest priority value
    /// among applicable rules, and the whole result is sorted.
    #[test]
    fn prop_lowest_priority_wins(
        amount in arb_amount(),
        priorities in prop::collection::vec(-100i16..100i16, 1..8),
    ) {
        let company_id = CompanyId::new();
        let expense = make_expense(company_id, amount, ExpenseCategory::Other);
        let employee = make_employee(EmployeeRole::Employee);

        let rules: Vec<_> = priorities
            .iter()
            .map(|&p| make_rule(company_id, p, RuleConditions::default()))
            .collect();

        let result = RuleMatcher::find_applicable(&rules, &expense, &employee);
        prop_assert_eq!(result.len(), rules.len());

        let min = priorities.iter().copied().min().unwrap();
        prop_assert_eq!(result[0].priority, min);
        for pair in result.windows(2) {
            prop_assert!(pair[0].priority <= pair[1].priority);
        }
    }

    /// Amount bounds are inclusive on both ends.
    #[test]
    fn prop_amount_bounds_inclusive(
        (min, max) in arb_range(),
    ) {
        let range = AmountRange::new(Decimal::new(min, 2), Decimal::new(max, 2));
        prop_assert!(range.contains(Decimal::new(min, 2)));
        prop_assert!(range.contains(Decimal::new(max, 2)));
        prop_assert!(!range.contains(Decimal::new(min, 2) - Decimal::new(1, 2)));
        prop_assert!(!range.contains(Decimal::new(max, 2) + Decimal::new(1, 2)));
    }
}
