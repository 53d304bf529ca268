//! Monthly spending per category compared against the user's category
//! budgets.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    Error, aggregation::CategoryTotal, dataset::ChartDataset, record::TransactionRecord,
    series::CalendarMonth,
};

/// How a category's spending in one month compares to its budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    /// The display name of the category.
    pub category: String,
    /// The most the user wants to spend in the category in a month.
    #[serde(with = "rust_decimal::serde::float")]
    pub budget: Decimal,
    /// The sum of the category's amounts in the month.
    #[serde(with = "rust_decimal::serde::float")]
    pub spent: Decimal,
    /// Whether `spent` is more than `budget`. Spending exactly the budget is
    /// not over budget.
    pub over_budget: bool,
}

impl BudgetStatus {
    /// How much of the budget is left, negative once the budget is exceeded.
    pub fn remaining(&self) -> Decimal {
        self.budget - self.spent
    }
}

/// Compares each category's spending in `month` against its entry in
/// `budgets`.
///
/// Returns one status per budgeted category, ordered by category name.
/// Categories with a budget but no records in the month have spent nothing,
/// and categories without a budget are left out.
///
/// # Errors
/// Returns [Error::InvalidBudget] if a budget is negative, or
/// [Error::Overflow] if a category's amounts are too large to add up.
pub fn budget_status(
    records: &[TransactionRecord],
    month: CalendarMonth,
    budgets: &BTreeMap<String, Decimal>,
) -> Result<Vec<BudgetStatus>, Error> {
    if let Some((category, budget)) = budgets.iter().find(|(_, budget)| budget.is_sign_negative())
    {
        return Err(Error::InvalidBudget {
            category: category.clone(),
            budget: budget.to_string(),
        });
    }

    let mut spent_by_category: BTreeMap<&str, Decimal> = budgets
        .keys()
        .map(|category| (category.as_str(), Decimal::ZERO))
        .collect();

    for record in records.iter().filter(|record| month.contains(record.date())) {
        if let Some(spent) = spent_by_category.get_mut(record.category.as_str()) {
            *spent = spent.checked_add(record.amount).ok_or(Error::Overflow)?;
        }
    }

    let statuses: Vec<BudgetStatus> = budgets
        .iter()
        .map(|(category, &budget)| {
            let spent = spent_by_category
                .get(category.as_str())
                .copied()
                .unwrap_or_default();

            BudgetStatus {
                category: category.clone(),
                budget,
                spent,
                over_budget: budget - spent < Decimal::ZERO,
            }
        })
        .collect();

    for status in statuses.iter().filter(|status| status.over_budget) {
        tracing::info!(
            "Spending on {} in {} {} is over budget: {} of {}",
            status.category,
            month.month(),
            month.year(),
            status.spent,
            status.budget
        );
    }

    Ok(statuses)
}

/// The spending of each budgeted category as a donut chart dataset.
pub fn budget_dataset(statuses: &[BudgetStatus]) -> ChartDataset {
    ChartDataset::from_totals(
        statuses
            .iter()
            .map(|status| CategoryTotal::new(&status.category, status.spent))
            .collect::<Vec<_>>(),
    )
}
