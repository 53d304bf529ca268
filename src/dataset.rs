//! The data handed over to the chart renderer.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Serialize, Serializer};

use crate::{aggregation::CategoryTotal, series::SeriesPoint};

/// Chart-ready data: either category slices or a dated line series.
///
/// The renderer takes ownership of the dataset and may mutate its copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ChartDataset {
    /// Category name to aggregate value, for donut charts.
    ///
    /// Category names are used verbatim as keys.
    Categories(#[serde(serialize_with = "serialize_values_as_numbers")] BTreeMap<String, Decimal>),
    /// Points ordered by date, for line charts.
    Series(Vec<SeriesPoint>),
}

impl ChartDataset {
    /// Build a category dataset from totals.
    ///
    /// Totals that share a category name are summed.
    pub fn from_totals(totals: impl IntoIterator<Item = CategoryTotal>) -> Self {
        let mut values = BTreeMap::new();

        for CategoryTotal { category, total } in totals {
            *values.entry(category).or_insert(Decimal::ZERO) += total;
        }

        Self::Categories(values)
    }

    /// A short name for the dataset's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Categories(_) => "category",
            Self::Series(_) => "series",
        }
    }

    /// The number of slices or points.
    pub fn len(&self) -> usize {
        match self {
            Self::Categories(values) => values.len(),
            Self::Series(points) => points.len(),
        }
    }

    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<SeriesPoint>> for ChartDataset {
    fn from(points: Vec<SeriesPoint>) -> Self {
        Self::Series(points)
    }
}

fn serialize_values_as_numbers<S: Serializer>(
    values: &BTreeMap<String, Decimal>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(
        values
            .iter()
            .map(|(category, value)| (category, value.to_f64().unwrap_or(f64::NAN))),
    )
}
