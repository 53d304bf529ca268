//! Chart rendering for chart datasets.
//!
//! Turns datasets into ECharts configuration and provides the HTML containers
//! and JavaScript that mount them:
//! - **Donut Chart**: One slice per category, coloured by cycling a fixed palette
//! - **Line Chart**: One point per day for a card's monthly spending
//!
//! Mounting a chart replaces any chart already drawn in the same container.

use std::collections::BTreeMap;

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisLabel, AxisType, Color, JsFunction, LineStyle, Tooltip, Trigger},
    series::{Line, Pie},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::prelude::ToPrimitive;

use crate::{Error, dataset::ChartDataset, html::HeadElement};

/// Slice colours, assigned to categories in name order and reused once
/// exhausted.
pub const PALETTE: [&str; 6] = [
    "#9a65b7", "#c62355", "#6fba12", "#243cb9", "#67e3df", "#7b5452",
];

/// The stroke colour of line charts.
pub const LINE_COLOR: &str = "#d03027";

/// Text and formatting shared by the charts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartStyle {
    /// The chart title.
    pub title: String,
    /// The currency symbol shown in tooltips and axis labels.
    pub currency_symbol: String,
}

/// JavaScript to run when a category's slice is clicked, keyed by category
/// name.
///
/// Each callback is the body of a function that receives the ECharts event
/// `params`.
pub type SliceCallbacks = BTreeMap<String, String>;

/// A chart with the ID of the HTML element it is drawn in.
#[derive(Debug, Clone)]
pub struct ChartMount {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: String,
    /// The ECharts configuration as a JSON string
    pub options: String,
    /// Click handlers for the chart's slices.
    pub callbacks: SliceCallbacks,
}

impl ChartMount {
    /// Mount `chart` at the element with ID `id`, without click handlers.
    pub fn new(id: &str, chart: &Chart) -> Self {
        Self {
            id: id.to_owned(),
            options: chart.to_string(),
            callbacks: SliceCallbacks::new(),
        }
    }

    /// Add click handlers for the chart's slices.
    pub fn with_callbacks(mut self, callbacks: SliceCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }
}

/// The palette colour for the slice at `index`.
pub fn slice_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Creates a donut chart with one slice per category.
///
/// # Errors
/// Returns [Error::DatasetShape] if `dataset` is a point series.
pub fn donut_chart(dataset: &ChartDataset, style: &ChartStyle) -> Result<Chart, Error> {
    let ChartDataset::Categories(values) = dataset else {
        return Err(Error::DatasetShape {
            chart: "donut",
            dataset: dataset.kind(),
        });
    };

    let data: Vec<(f64, &str)> = values
        .iter()
        .map(|(category, value)| (value.to_f64().unwrap_or_default(), category.as_str()))
        .collect();

    let colors: Vec<Color> = (0..values.len().max(1))
        .map(|index| Color::from(slice_color(index)))
        .collect();

    Ok(Chart::new()
        .title(Title::new().text(style.title.as_str()))
        .color(colors)
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Item)
                .value_formatter(currency_formatter(&style.currency_symbol)),
        )
        .legend(Legend::new().top("bottom"))
        .series(
            Pie::new()
                .name(style.title.as_str())
                .radius(vec!["65%", "90%"])
                .data(data),
        ))
}

/// Creates a line chart with one point per day.
///
/// The y axis starts at zero unless the series has negative values.
///
/// # Errors
/// Returns [Error::DatasetShape] if `dataset` holds category totals.
pub fn line_chart(dataset: &ChartDataset, style: &ChartStyle) -> Result<Chart, Error> {
    let ChartDataset::Series(points) = dataset else {
        return Err(Error::DatasetShape {
            chart: "line",
            dataset: dataset.kind(),
        });
    };

    let labels: Vec<String> = points.iter().map(|point| point.date.to_string()).collect();
    let values: Vec<f64> = points
        .iter()
        .map(|point| point.value.to_f64().unwrap_or_default())
        .collect();

    let mut y_axis = Axis::new()
        .type_(AxisType::Value)
        .axis_label(AxisLabel::new().formatter(currency_formatter(&style.currency_symbol)));

    if points.iter().all(|point| !point.value.is_sign_negative()) {
        y_axis = y_axis.min(0);
    }

    Ok(Chart::new()
        .title(Title::new().text(style.title.as_str()))
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .value_formatter(currency_formatter(&style.currency_symbol)),
        )
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(y_axis)
        .series(
            Line::new()
                .name(style.title.as_str())
                .line_style(LineStyle::new().color(LINE_COLOR).width(4))
                .data(values),
        ))
}

// ECharts draws nothing into a container without a height.
const CHART_CONTAINER_STYLE: &str = "width: 100%; height: 380px; margin-bottom: 1rem;";

/// Renders the HTML containers for charts.
pub fn charts_view(charts: &[ChartMount]) -> Markup {
    html!(
        section id="charts"
        {
            @for chart in charts {
                div id=(chart.id) style=(CHART_CONTAINER_STYLE) {}
            }
        }
    )
}

/// Generates JavaScript initialization code for charts.
///
/// Any chart already mounted in a container is disposed before the new one
/// is drawn. Clicking a slice calls the callback registered for its category.
pub fn charts_script(charts: &[ChartMount]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById({});
                    const previous = echarts.getInstanceByDom(chartDom);
                    if (previous) {{
                        previous.dispose();
                    }}
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    const callbacks = {};
                    chart.on('click', function(params) {{
                        const callback = callbacks[params.name];
                        if (callback) {{
                            callback(params);
                        }}
                    }});

                    window.addEventListener('resize', chart.resize);
                }})();"#,
                js_string(&chart.id),
                escape_script_text(&chart.options),
                callbacks_object(&chart.callbacks)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

fn js_string(text: &str) -> String {
    escape_script_text(&serde_json::Value::from(text).to_string())
}

// Stops text inside an inline script from closing the script element. `<\/`
// is read as `</` by JavaScript string literals.
fn escape_script_text(text: &str) -> String {
    text.replace("</", "<\\/")
}

fn callbacks_object(callbacks: &SliceCallbacks) -> String {
    let entries = callbacks
        .iter()
        .map(|(category, body)| {
            format!(
                "{}: function(params) {{ {} }}",
                js_string(category),
                escape_script_text(body)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("{{{entries}}}")
}

#[inline]
fn currency_formatter(symbol: &str) -> JsFunction {
    JsFunction::new_with_args(
        "value",
        &format!(
            "const symbol = {};
            const number = Number(value);
            return (number < 0 ? '-' : '') + symbol + Math.abs(number).toFixed(2);",
            js_string(symbol)
        ),
    )
}
