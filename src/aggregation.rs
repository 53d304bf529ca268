//! Category totals for the donut chart.
//!
//! Records are filtered by date, grouped by category and summed. Categories
//! whose share of the grand total is below a significance threshold are kept
//! out of the primary dataset, but never dropped from [Aggregation::all].

use std::{collections::BTreeMap, fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{Error, dataset::ChartDataset, date_range::DateRange, record::TransactionRecord};

/// The total amount for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// The display name of the category.
    pub category: String,
    /// The sum of the amounts of the category's records.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl CategoryTotal {
    /// Create a new category total.
    pub fn new(category: &str, total: Decimal) -> Self {
        Self {
            category: category.to_owned(),
            total,
        }
    }
}

/// The minimum share of the grand total a category needs to get its own
/// slice, as a fraction in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SignificanceThreshold(Decimal);

impl SignificanceThreshold {
    /// Create a threshold from a fraction, e.g. `0.05` for 5%.
    ///
    /// # Errors
    /// Returns [Error::InvalidThreshold] if `fraction` is negative or not
    /// less than one.
    pub fn new(fraction: Decimal) -> Result<Self, Error> {
        if fraction < Decimal::ZERO || fraction >= Decimal::ONE {
            return Err(Error::InvalidThreshold(fraction.to_string()));
        }

        Ok(Self(fraction))
    }

    /// The threshold as a fraction.
    pub fn fraction(&self) -> Decimal {
        self.0
    }

    fn admits(&self, total: Decimal, grand_total: Decimal) -> bool {
        total
            .checked_div(grand_total)
            .is_some_and(|share| share >= self.0)
    }
}

impl Default for SignificanceThreshold {
    /// Five percent.
    fn default() -> Self {
        Self(Decimal::new(5, 2))
    }
}

impl FromStr for SignificanceThreshold {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fraction = Decimal::from_str(text.trim())
            .map_err(|_| Error::InvalidThreshold(text.to_owned()))?;

        Self::new(fraction)
    }
}

impl fmt::Display for SignificanceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-category totals split by significance.
///
/// All lists are ordered by category name so that the output does not depend
/// on the order of the input records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    significant: Vec<CategoryTotal>,
    insignificant: Vec<CategoryTotal>,
    all: Vec<CategoryTotal>,
    #[serde(with = "rust_decimal::serde::float")]
    grand_total: Decimal,
}

impl Aggregation {
    /// The categories that get their own slice.
    pub fn significant(&self) -> &[CategoryTotal] {
        &self.significant
    }

    /// The categories below the significance threshold.
    pub fn insignificant(&self) -> &[CategoryTotal] {
        &self.insignificant
    }

    /// Every category in the selected records.
    pub fn all(&self) -> &[CategoryTotal] {
        &self.all
    }

    /// The sum of all category totals.
    pub fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    /// The significant categories followed by a single `label` slice holding
    /// the sum of the insignificant ones.
    ///
    /// The slices sum to [Aggregation::grand_total]. If a significant category
    /// is already called `label`, the insignificant total is added to it.
    ///
    /// # Errors
    /// Returns [Error::Overflow] if the insignificant totals cannot be added
    /// up.
    pub fn collapsed(&self, label: &str) -> Result<Vec<CategoryTotal>, Error> {
        let mut slices = self.significant.clone();

        if self.insignificant.is_empty() {
            return Ok(slices);
        }

        let rest = checked_sum(self.insignificant.iter().map(|total| total.total))?;

        match slices.iter_mut().find(|slice| slice.category == label) {
            Some(slice) => slice.total = slice.total.checked_add(rest).ok_or(Error::Overflow)?,
            None => slices.push(CategoryTotal::new(label, rest)),
        }

        Ok(slices)
    }

    /// The significant categories as a donut chart dataset.
    pub fn into_dataset(self) -> ChartDataset {
        ChartDataset::from_totals(self.significant)
    }
}

/// Adds up `amounts`.
///
/// # Errors
/// Returns [Error::Overflow] if the sum does not fit in a [Decimal].
pub(crate) fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, Error> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(amount))
        .ok_or(Error::Overflow)
}

/// Sums the amounts of the records in `range` by category.
///
/// A grand total of zero (no records, or amounts that cancel out) yields an
/// empty significant set rather than an error.
///
/// # Errors
/// Returns [Error::InvalidRange] if `range` starts after it ends, or
/// [Error::Overflow] if the amounts are too large to add up.
pub fn aggregate(
    records: &[TransactionRecord],
    range: &DateRange,
    threshold: SignificanceThreshold,
) -> Result<Aggregation, Error> {
    range.validate()?;

    let mut totals_by_category: BTreeMap<&str, Decimal> = BTreeMap::new();

    for record in records.iter().filter(|record| range.contains(record.date())) {
        let total = totals_by_category
            .entry(record.category.as_str())
            .or_insert(Decimal::ZERO);
        *total = total.checked_add(record.amount).ok_or(Error::Overflow)?;
    }

    let grand_total = checked_sum(totals_by_category.values().copied())?;

    let all: Vec<CategoryTotal> = totals_by_category
        .into_iter()
        .map(|(category, total)| CategoryTotal::new(category, total))
        .collect();

    let (significant, insignificant): (Vec<_>, Vec<_>) = all
        .iter()
        .cloned()
        .partition(|total| threshold.admits(total.total, grand_total));

    tracing::debug!(
        "Aggregated {} categories ({} significant at {threshold}), grand total {grand_total}",
        all.len(),
        significant.len()
    );

    Ok(Aggregation {
        significant,
        insignificant,
        all,
        grand_total,
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, PrimitiveDateTime, Time, macros::date};

    use crate::{
        Error,
        aggregation::{CategoryTotal, SignificanceThreshold, aggregate},
        dataset::ChartDataset,
        date_range::DateRange,
        record::TransactionRecord,
    };

    fn create_test_record(category: &str, amount: Decimal, date: Date) -> TransactionRecord {
        TransactionRecord::new(1, 1, category, amount, PrimitiveDateTime::new(date, Time::MIDNIGHT))
    }

    fn example_records() -> Vec<TransactionRecord> {
        vec![
            create_test_record("Food", dec!(10), date!(2024 - 03 - 01)),
            create_test_record("Food", dec!(5), date!(2024 - 03 - 02)),
            create_test_record("Rent", dec!(1000), date!(2024 - 03 - 01)),
        ]
    }

    fn threshold(fraction: Decimal) -> SignificanceThreshold {
        SignificanceThreshold::new(fraction).unwrap()
    }

    #[test]
    fn small_categories_are_not_significant() {
        let result = aggregate(
            &example_records(),
            &DateRange::unbounded(),
            SignificanceThreshold::default(),
        )
        .unwrap();

        assert_eq!(result.grand_total(), dec!(1015));
        assert_eq!(
            result.all(),
            &[
                CategoryTotal::new("Food", dec!(15)),
                CategoryTotal::new("Rent", dec!(1000))
            ]
        );
        assert_eq!(result.significant(), &[CategoryTotal::new("Rent", dec!(1000))]);
        assert_eq!(result.insignificant(), &[CategoryTotal::new("Food", dec!(15))]);
    }

    #[test]
    fn category_totals_sum_to_grand_total() {
        let records = vec![
            create_test_record("Food", dec!(12.34), date!(2024 - 01 - 15)),
            create_test_record("Transport", dec!(-5.10), date!(2024 - 01 - 16)),
            create_test_record("Food", dec!(0.01), date!(2024 - 01 - 17)),
            create_test_record("Bills", dec!(99.99), date!(2024 - 01 - 18)),
        ];

        let result = aggregate(&records, &DateRange::unbounded(), threshold(dec!(0.1))).unwrap();

        let sum: Decimal = result.all().iter().map(|total| total.total).sum();
        assert_eq!(sum, result.grand_total());
        assert_eq!(result.grand_total(), dec!(107.24));
    }

    #[test]
    fn result_does_not_depend_on_record_order() {
        let mut records = vec![
            create_test_record("Food", dec!(0.1), date!(2024 - 01 - 15)),
            create_test_record("Bills", dec!(0.2), date!(2024 - 01 - 16)),
            create_test_record("Food", dec!(0.3), date!(2024 - 01 - 17)),
            create_test_record("Fun", dec!(7.77), date!(2024 - 01 - 18)),
        ];
        let range = DateRange::unbounded();

        let first = aggregate(&records, &range, SignificanceThreshold::default()).unwrap();
        let again = aggregate(&records, &range, SignificanceThreshold::default()).unwrap();
        records.reverse();
        let reversed = aggregate(&records, &range, SignificanceThreshold::default()).unwrap();

        assert_eq!(first, again);
        assert_eq!(first, reversed);
    }

    #[test]
    fn raising_threshold_never_adds_slices() {
        let records = vec![
            create_test_record("A", dec!(1), date!(2024 - 01 - 01)),
            create_test_record("B", dec!(4), date!(2024 - 01 - 01)),
            create_test_record("C", dec!(10), date!(2024 - 01 - 01)),
            create_test_record("D", dec!(25), date!(2024 - 01 - 01)),
            create_test_record("E", dec!(60), date!(2024 - 01 - 01)),
        ];
        let range = DateRange::unbounded();

        let mut previous = usize::MAX;
        let fractions = [
            dec!(0),
            dec!(0.01),
            dec!(0.05),
            dec!(0.1),
            dec!(0.25),
            dec!(0.6),
            dec!(0.99),
        ];
        for fraction in fractions {
            let count = aggregate(&records, &range, threshold(fraction))
                .unwrap()
                .significant()
                .len();

            assert!(
                count <= previous,
                "threshold {fraction} gave {count} slices, more than {previous}"
            );
            previous = count;
        }
    }

    #[test]
    fn share_equal_to_threshold_is_significant() {
        let records = vec![
            create_test_record("Food", dec!(5), date!(2024 - 01 - 01)),
            create_test_record("Rent", dec!(95), date!(2024 - 01 - 01)),
        ];

        let result = aggregate(
            &records,
            &DateRange::unbounded(),
            SignificanceThreshold::default(),
        )
        .unwrap();

        assert_eq!(result.significant().len(), 2);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let records = vec![
            create_test_record("Before", dec!(1), date!(2024 - 02 - 29)),
            create_test_record("Start", dec!(2), date!(2024 - 03 - 01)),
            create_test_record("End", dec!(3), date!(2024 - 03 - 31)),
            create_test_record("After", dec!(4), date!(2024 - 04 - 01)),
        ];
        let range =
            DateRange::new(Some(date!(2024 - 03 - 01)), Some(date!(2024 - 03 - 31))).unwrap();

        let result = aggregate(&records, &range, threshold(dec!(0))).unwrap();

        let categories: Vec<&str> = result
            .all()
            .iter()
            .map(|total| total.category.as_str())
            .collect();
        assert_eq!(categories, vec!["End", "Start"]);
        assert_eq!(result.grand_total(), dec!(5));
    }

    #[test]
    fn time_of_day_does_not_affect_range_filtering() {
        let late = TransactionRecord::new(
            1,
            1,
            "Food",
            dec!(3),
            time::macros::datetime!(2024-03-31 23:59:59),
        );
        let range = DateRange::new(None, Some(date!(2024 - 03 - 31))).unwrap();

        let result = aggregate(&[late], &range, SignificanceThreshold::default()).unwrap();

        assert_eq!(result.grand_total(), dec!(3));
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result =
            aggregate(&[], &DateRange::unbounded(), SignificanceThreshold::default()).unwrap();

        assert_eq!(result.grand_total(), Decimal::ZERO);
        assert!(result.significant().is_empty());
        assert!(result.all().is_empty());
    }

    #[test]
    fn zero_grand_total_has_no_significant_categories() {
        let records = vec![
            create_test_record("Refund", dec!(-20), date!(2024 - 01 - 01)),
            create_test_record("Shoes", dec!(20), date!(2024 - 01 - 02)),
        ];

        let result = aggregate(&records, &DateRange::unbounded(), threshold(dec!(0))).unwrap();

        assert_eq!(result.grand_total(), Decimal::ZERO);
        assert!(result.significant().is_empty());
        assert_eq!(result.all().len(), 2);
    }

    #[test]
    fn negative_amounts_use_share_of_negative_total() {
        let records = vec![
            create_test_record("Food", dec!(-15), date!(2024 - 01 - 01)),
            create_test_record("Rent", dec!(-1000), date!(2024 - 01 - 01)),
        ];

        let result = aggregate(
            &records,
            &DateRange::unbounded(),
            SignificanceThreshold::default(),
        )
        .unwrap();

        assert_eq!(result.significant(), &[CategoryTotal::new("Rent", dec!(-1000))]);
    }

    #[test]
    fn reversed_range_is_an_error() {
        let range = DateRange {
            from: Some(date!(2024 - 03 - 02)),
            to: Some(date!(2024 - 03 - 01)),
        };

        let got = aggregate(&example_records(), &range, SignificanceThreshold::default());

        assert_eq!(
            got,
            Err(Error::InvalidRange {
                from: date!(2024 - 03 - 02),
                to: date!(2024 - 03 - 01)
            })
        );
    }

    #[test]
    fn collapsed_keeps_total_mass() {
        let records = vec![
            create_test_record("Coffee", dec!(2), date!(2024 - 01 - 01)),
            create_test_record("Snacks", dec!(3), date!(2024 - 01 - 01)),
            create_test_record("Rent", dec!(500), date!(2024 - 01 - 01)),
        ];

        let result = aggregate(
            &records,
            &DateRange::unbounded(),
            SignificanceThreshold::default(),
        )
        .unwrap();
        let slices = result.collapsed("Other").unwrap();

        assert_eq!(
            slices,
            vec![
                CategoryTotal::new("Rent", dec!(500)),
                CategoryTotal::new("Other", dec!(5))
            ]
        );
        let sum: Decimal = slices.iter().map(|slice| slice.total).sum();
        assert_eq!(sum, result.grand_total());
    }

    #[test]
    fn collapsed_merges_into_existing_label() {
        let records = vec![
            create_test_record("Coffee", dec!(1), date!(2024 - 01 - 01)),
            create_test_record("Other", dec!(50), date!(2024 - 01 - 01)),
            create_test_record("Rent", dec!(100), date!(2024 - 01 - 01)),
        ];

        let result = aggregate(
            &records,
            &DateRange::unbounded(),
            SignificanceThreshold::default(),
        )
        .unwrap();

        assert_eq!(
            result.collapsed("Other").unwrap(),
            vec![
                CategoryTotal::new("Other", dec!(51)),
                CategoryTotal::new("Rent", dec!(100))
            ]
        );
    }

    #[test]
    fn collapsed_without_insignificant_categories_is_unchanged() {
        let result = aggregate(
            &example_records(),
            &DateRange::unbounded(),
            threshold(dec!(0)),
        )
        .unwrap();

        assert_eq!(result.collapsed("Other").unwrap(), result.significant());
    }

    #[test]
    fn dataset_holds_significant_categories() {
        let result = aggregate(
            &example_records(),
            &DateRange::unbounded(),
            SignificanceThreshold::default(),
        )
        .unwrap();

        let ChartDataset::Categories(values) = result.into_dataset() else {
            panic!("want a category dataset");
        };

        assert_eq!(values.len(), 1);
        assert_eq!(values["Rent"], dec!(1000));
    }

    #[test]
    fn threshold_must_be_a_fraction() {
        assert!(SignificanceThreshold::new(dec!(0)).is_ok());
        assert!(SignificanceThreshold::new(dec!(0.999)).is_ok());
        assert_eq!(
            SignificanceThreshold::new(dec!(1)),
            Err(Error::InvalidThreshold("1".to_owned()))
        );
        assert!(SignificanceThreshold::new(dec!(-0.01)).is_err());
    }

    #[test]
    fn threshold_parses_from_string() {
        assert_eq!(
            "0.1".parse::<SignificanceThreshold>().unwrap().fraction(),
            dec!(0.1)
        );
        assert!("ten percent".parse::<SignificanceThreshold>().is_err());
        assert_eq!(SignificanceThreshold::default().fraction(), dec!(0.05));
    }

    #[test]
    fn overflowing_totals_are_an_error() {
        let records = vec![
            create_test_record("Food", Decimal::MAX, date!(2024 - 01 - 01)),
            create_test_record("Food", Decimal::MAX, date!(2024 - 01 - 02)),
        ];

        let got = aggregate(&records, &DateRange::unbounded(), threshold(dec!(0)));

        assert_eq!(got, Err(Error::Overflow));
    }

    #[test]
    fn overflowing_grand_total_is_an_error() {
        let records = vec![
            create_test_record("Food", Decimal::MAX, date!(2024 - 01 - 01)),
            create_test_record("Rent", Decimal::MAX, date!(2024 - 01 - 01)),
        ];

        let got = aggregate(&records, &DateRange::unbounded(), threshold(dec!(0)));

        assert_eq!(got, Err(Error::Overflow));
    }
}
