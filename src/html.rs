//! HTML page scaffolding and currency formatting for chart output.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use numfmt::{Formatter, Precision};
use rust_decimal::{Decimal, prelude::ToPrimitive};

/// Where the ECharts library is loaded from.
pub const ECHARTS_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js";

/// The currency symbol used when none is configured.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "£";

const PAGE_STYLE: &str = "max-width: 1200px; margin: 0 auto; padding: 2rem 1.5rem; \
    font-family: system-ui, sans-serif;";

/// Extra elements to place in a page's `<head>`.
pub enum HeadElement {
    /// JavaScript source code.
    ScriptSource(PreEscaped<String>),
}

/// Renders a standalone page with the ECharts library loaded.
pub fn base(title: &str, head_elements: &[HeadElement], content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Spending" }

                script src=(ECHARTS_SCRIPT_URL) {}

                @for element in head_elements
                {
                    @match element
                    {
                        HeadElement::ScriptSource(text) => script { (text) }
                    }
                }
            }

            body
            {
                main style=(PAGE_STYLE)
                {
                    h1 { (title) }

                    (content)
                }
            }
        }
    }
}

/// Formats `amount` with `symbol` and two decimal places, e.g. "£1,234.50"
/// or "-£3.00".
pub fn format_currency(amount: Decimal, symbol: &str) -> String {
    let amount = amount.round_dp(2);

    if amount.is_zero() {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        return format!("{symbol}0.00");
    }

    let prefix = if amount.is_sign_negative() {
        format!("-{symbol}")
    } else {
        symbol.to_owned()
    };

    let magnitude = amount.abs();

    let formatted_string = match (
        Formatter::currency(&prefix),
        magnitude.to_f64(),
    ) {
        (Ok(formatter), Some(number)) => formatter
            .precision(Precision::Decimals(2))
            .fmt_string(number),
        _ => format!("{prefix}{magnitude}"),
    };

    pad_cents(formatted_string)
}

// numfmt drops trailing zeros, so "12.30" comes out as "12.3" and "12.00" as "12".
fn pad_cents(formatted_string: String) -> String {
    match formatted_string.rfind('.') {
        None => format!("{formatted_string}.00"),
        Some(dot) => {
            let decimals = formatted_string.len() - dot - 1;
            match decimals {
                0 => format!("{formatted_string}00"),
                1 => format!("{formatted_string}0"),
                _ => formatted_string,
            }
        }
    }
}
