//! Spendchart prepares the data behind the charts of a personal finance app.
//!
//! Transaction records are turned into:
//! - per-category totals for donut charts, with small categories split off
//!   by a significance threshold ([aggregate]),
//! - per-card daily series for monthly line graphs ([build_series]), and
//! - monthly spending per category against the user's budgets
//!   ([budget_status]).
//!
//! Every stage is a pure function of its inputs. The resulting
//! [ChartDataset]s can be handed to any renderer; [donut_chart] and
//! [line_chart] build ECharts configurations for them.

#![warn(missing_docs)]

mod aggregation;
mod budget;
mod charts;
mod dataset;
mod date_range;
mod error;
mod html;
mod input;
mod record;
mod series;
mod summary;
mod timezone;

pub use aggregation::{Aggregation, CategoryTotal, SignificanceThreshold, aggregate};
pub use budget::{BudgetStatus, budget_dataset, budget_status};
pub use charts::{
    ChartMount, ChartStyle, LINE_COLOR, PALETTE, SliceCallbacks, charts_script, charts_view,
    donut_chart, line_chart, slice_color,
};
pub use dataset::ChartDataset;
pub use date_range::DateRange;
pub use error::Error;
pub use html::{DEFAULT_CURRENCY_SYMBOL, HeadElement, base as chart_page, format_currency};
pub use input::{records_from_csv, records_from_json};
pub use record::{
    CardId, ParsedRecords, RawTransactionRecord, RecordId, TransactionRecord, parse_records,
    parse_timestamp,
};
pub use series::{
    CalendarMonth, SameDayPolicy, SeriesMode, SeriesOptions, SeriesPoint, build_series,
    build_series_by_card, card_ids,
};
pub use summary::{WeekdayAverage, total_spending, weekday_averages};
pub use timezone::{current_month, get_local_offset};
