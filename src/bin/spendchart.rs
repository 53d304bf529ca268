use std::{
    collections::BTreeMap,
    error::Error,
    fs,
    io::{self, Read},
    path::PathBuf,
};

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use time::Date;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use spendchart_rs::{
    CalendarMonth, CardId, ChartDataset, ChartMount, ChartStyle, DEFAULT_CURRENCY_SYMBOL,
    DateRange, SameDayPolicy, SeriesMode, SeriesOptions, SeriesPoint, SignificanceThreshold,
    TransactionRecord, aggregate, budget_dataset, budget_status, build_series_by_card, card_ids,
    chart_page, charts_script, charts_view, current_month, donut_chart, format_currency,
    line_chart, parse_timestamp, records_from_csv, records_from_json, total_spending,
    weekday_averages,
};

/// Prepares chart data from a list of transaction records.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to read the records from. Records are read from stdin if
    /// omitted.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// The format of the records.
    #[arg(long, value_enum, default_value_t = InputFormat::Json)]
    format: InputFormat,

    /// The currency symbol to show amounts with.
    #[arg(long, env = "SPENDCHART_CURRENCY", default_value = DEFAULT_CURRENCY_SYMBOL)]
    currency: String,

    /// The canonical timezone used to work out the current month, e.g.
    /// "Europe/London".
    #[arg(long, env = "SPENDCHART_TIMEZONE", default_value = "Europe/London")]
    timezone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-category totals for a donut chart.
    Categories {
        /// The first day to include (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,

        /// The last day to include (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,

        /// The minimum share of the total a category needs for its own slice.
        #[arg(long, default_value_t = SignificanceThreshold::default())]
        threshold: SignificanceThreshold,

        /// Fold the small categories into one slice with this label.
        #[arg(long)]
        collapse: Option<String>,

        #[arg(long, value_enum, default_value_t = Output::Table)]
        output: Output,
    },

    /// Daily series for a card's monthly line graph.
    Series {
        /// The cards to plot. Plots every card in the input if omitted.
        #[arg(long = "card")]
        cards: Vec<CardId>,

        /// The month number (1-12). Defaults to the current month.
        #[arg(long)]
        month: Option<u8>,

        /// The year. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,

        /// How to combine transactions on the same day.
        #[arg(long, value_enum, default_value_t = SameDay::Sum)]
        same_day: SameDay,

        /// Plot the running total for the month instead of daily values.
        #[arg(long)]
        cumulative: bool,

        #[arg(long, value_enum, default_value_t = Output::Table)]
        output: Output,
    },

    /// A month's spending per category against the category budgets.
    Budget {
        /// A category budget, e.g. "Food=250". May be repeated.
        #[arg(long = "budget", value_parser = parse_budget, required = true)]
        budgets: Vec<(String, Decimal)>,

        /// The month number (1-12). Defaults to the current month.
        #[arg(long)]
        month: Option<u8>,

        /// The year. Defaults to the current year.
        #[arg(long)]
        year: Option<i32>,

        #[arg(long, value_enum, default_value_t = Output::Table)]
        output: Output,
    },

    /// Total spending and average spending by day of the week.
    Summary {
        /// The first day to include (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,

        /// The last day to include (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Output {
    /// Human readable table.
    Table,
    /// The chart dataset as JSON.
    Json,
    /// A standalone HTML page with the chart.
    Html,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SameDay {
    Sum,
    First,
    Last,
}

impl From<SameDay> for SameDayPolicy {
    fn from(value: SameDay) -> Self {
        match value {
            SameDay::Sum => SameDayPolicy::Sum,
            SameDay::First => SameDayPolicy::First,
            SameDay::Last => SameDayPolicy::Last,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let text = read_input(args.input.as_ref())?;
    let parsed = match args.format {
        InputFormat::Json => records_from_json(&text)?,
        InputFormat::Csv => records_from_csv(&text)?,
    };
    if parsed.skipped_count() > 0 {
        tracing::warn!("Skipped {} malformed records", parsed.skipped_count());
    }
    let records = parsed.records;

    match args.command {
        Command::Categories {
            from,
            to,
            threshold,
            collapse,
            output,
        } => {
            let range = DateRange::new(from, to)?;
            let aggregation = aggregate(&records, &range, threshold)?;

            let slices = match &collapse {
                Some(label) => aggregation.collapsed(label)?,
                None => aggregation.significant().to_vec(),
            };

            match output {
                Output::Table => {
                    for slice in &slices {
                        print_row(&slice.category, &format_currency(slice.total, &args.currency));
                    }
                    print_row(
                        "Total",
                        &format_currency(aggregation.grand_total(), &args.currency),
                    );
                }
                Output::Json => {
                    println!("{}", serde_json::to_string_pretty(&aggregation)?);
                }
                Output::Html => {
                    let style = ChartStyle {
                        title: "Spending by category".to_owned(),
                        currency_symbol: args.currency.clone(),
                    };
                    let chart = donut_chart(&ChartDataset::from_totals(slices), &style)?;
                    print_page(&style.title, &[ChartMount::new("category-chart", &chart)]);
                }
            }
        }
        Command::Series {
            cards,
            month,
            year,
            same_day,
            cumulative,
            output,
        } => {
            let month = resolve_month(month, year, &args.timezone)?;
            let options = SeriesOptions {
                same_day: same_day.into(),
                mode: if cumulative {
                    SeriesMode::Cumulative
                } else {
                    SeriesMode::Pointwise
                },
            };

            let cards = if cards.is_empty() {
                card_ids(&records)
            } else {
                cards
            };
            let series_by_card: Vec<(CardId, Vec<SeriesPoint>)> =
                build_series_by_card(&records, cards, month, options)?
                    .into_iter()
                    .collect();

            print_series(&series_by_card, month, output, &args.currency)?;
        }
        Command::Budget {
            budgets,
            month,
            year,
            output,
        } => {
            let month = resolve_month(month, year, &args.timezone)?;
            let budgets: BTreeMap<String, Decimal> = budgets.into_iter().collect();
            let statuses = budget_status(&records, month, &budgets)?;

            match output {
                Output::Table => {
                    for status in &statuses {
                        let flag = if status.over_budget { " OVER" } else { "" };
                        print_row(
                            &status.category,
                            &format!(
                                "{} / {}{flag}",
                                format_currency(status.spent, &args.currency),
                                format_currency(status.budget, &args.currency)
                            ),
                        );
                    }
                }
                Output::Json => {
                    println!("{}", serde_json::to_string_pretty(&statuses)?);
                }
                Output::Html => {
                    let style = ChartStyle {
                        title: format!("Budgets for {} {}", month.month(), month.year()),
                        currency_symbol: args.currency.clone(),
                    };
                    let chart = donut_chart(&budget_dataset(&statuses), &style)?;
                    print_page(&style.title, &[ChartMount::new("budget-chart", &chart)]);
                }
            }
        }
        Command::Summary { from, to } => {
            let range = DateRange::new(from, to)?;
            print_summary(&records, &range, &args.currency)?;
        }
    }

    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout is reserved for chart data.
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_log).init();
}

fn read_input(path: Option<&PathBuf>) -> Result<String, io::Error> {
    match path {
        Some(path) => {
            tracing::debug!("Reading records from {path:#?}");
            fs::read_to_string(path)
        }
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn parse_date(text: &str) -> Result<Date, String> {
    parse_timestamp(text).map(|timestamp| timestamp.date())
}

fn parse_budget(text: &str) -> Result<(String, Decimal), String> {
    let (category, amount) = text
        .rsplit_once('=')
        .ok_or_else(|| format!("expected CATEGORY=AMOUNT, got \"{text}\""))?;
    let amount = amount
        .trim()
        .parse::<Decimal>()
        .map_err(|error| format!("invalid budget amount \"{amount}\": {error}"))?;

    Ok((category.trim().to_owned(), amount))
}

fn resolve_month(
    month: Option<u8>,
    year: Option<i32>,
    timezone: &str,
) -> Result<CalendarMonth, spendchart_rs::Error> {
    match (month, year) {
        (Some(month), Some(year)) => CalendarMonth::new(year, month),
        (month, year) => {
            let now = current_month(timezone)?;
            CalendarMonth::new(
                year.unwrap_or(now.year()),
                month.unwrap_or(u8::from(now.month())),
            )
        }
    }
}

fn print_row(label: &str, value: &str) {
    println!("{label:<24}{value:>16}");
}

fn print_series(
    series_by_card: &[(CardId, Vec<SeriesPoint>)],
    month: CalendarMonth,
    output: Output,
    currency: &str,
) -> Result<(), Box<dyn Error>> {
    match output {
        Output::Table => {
            for (card_id, points) in series_by_card {
                println!("Card {card_id}, {} {}", month.month(), month.year());
                for point in points {
                    print_row(&point.date.to_string(), &format_currency(point.value, currency));
                }
            }
        }
        Output::Json => {
            let datasets: Vec<serde_json::Value> = series_by_card
                .iter()
                .map(|(card_id, points)| {
                    serde_json::json!({
                        "card_id": card_id,
                        "dataset": ChartDataset::from(points.clone()),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&datasets)?);
        }
        Output::Html => {
            let mut mounts = Vec::with_capacity(series_by_card.len());
            for (card_id, points) in series_by_card {
                let style = ChartStyle {
                    title: format!("Card {card_id}"),
                    currency_symbol: currency.to_owned(),
                };
                let chart = line_chart(&ChartDataset::from(points.clone()), &style)?;
                mounts.push(ChartMount::new(&format!("card-{card_id}-chart"), &chart));
            }
            print_page(&format!("{} {}", month.month(), month.year()), &mounts);
        }
    }

    Ok(())
}

fn print_summary(
    records: &[TransactionRecord],
    range: &DateRange,
    currency: &str,
) -> Result<(), spendchart_rs::Error> {
    print_row(
        "Total spending",
        &format_currency(total_spending(records, range)?, currency),
    );

    for average in weekday_averages(records, range)? {
        print_row(
            &format!("{} ({})", average.weekday, average.transaction_count),
            &format_currency(average.average, currency),
        );
    }

    Ok(())
}

fn print_page(title: &str, mounts: &[ChartMount]) {
    let page = chart_page(title, &[charts_script(mounts)], &charts_view(mounts));
    println!("{}", page.into_string());
}
