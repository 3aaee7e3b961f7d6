//! Server-side HTML rendering for the dashboard.
//!
//! Every page is the static shell with a generated content block. All user
//! and upstream text passes through [`escape_html`].

use std::collections::HashMap;
use std::fmt::Write;

use super::client::DashboardError;
use super::form::{FormError, CONTRACTS, GENDERS, PAYMENT_METHODS, YES_NO};
use crate::prediction::Prediction;

/// Page shell, compiled into the binary.
const SHELL: &str = include_str!("../../static/dashboard.html");

const CONTENT_SLOT: &str = "{{content}}";

enum Input {
    Choice(&'static [&'static str]),
    Count,
    Amount,
    Coordinate,
}

/// Three form columns of `(field name, label, input)`.
const LAYOUT: [[(&str, &str, Input); 4]; 3] = [
    [
        ("Gender", "Gender", Input::Choice(&GENDERS)),
        ("Senior_Citizen", "Senior Citizen", Input::Choice(&YES_NO)),
        ("Partner", "Partner", Input::Choice(&YES_NO)),
        ("Dependents", "Dependents", Input::Choice(&YES_NO)),
    ],
    [
        ("Tenure_Months", "Tenure Months", Input::Count),
        ("Monthly_Charges", "Monthly Charges", Input::Amount),
        ("Total_Charges", "Total Charges", Input::Amount),
        ("CLTV", "CLTV", Input::Amount),
    ],
    [
        ("Contract", "Contract", Input::Choice(&CONTRACTS)),
        ("Payment_Method", "Payment Method", Input::Choice(&PAYMENT_METHODS)),
        ("Latitude", "Latitude", Input::Coordinate),
        ("Longitude", "Longitude", Input::Coordinate),
    ],
];

/// Escape `&`, `<`, `>`, `"` and `'` for HTML text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Probability as a percentage with one decimal, e.g. `81.2%`.
pub fn format_probability(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

fn shell(content: &str) -> String {
    SHELL.replace(CONTENT_SLOT, content)
}

/// The input form alone.
pub fn form_page(values: &HashMap<String, String>, errors: &[FormError]) -> String {
    shell(&form_section(values, errors))
}

/// The form followed by the prediction results.
pub fn result_page(values: &HashMap<String, String>, prediction: &Prediction) -> String {
    let mut content = form_section(values, &[]);
    content.push_str("<hr>\n");
    content.push_str(&results_section(prediction));
    shell(&content)
}

/// The form followed by an error block describing `error`.
pub fn failure_page(values: &HashMap<String, String>, error: &DashboardError) -> String {
    match error {
        DashboardError::Form(errors) => form_page(values, errors),
        DashboardError::Upstream { body, .. } => {
            let mut content = form_section(values, &[]);
            content.push_str("<hr>\n");
            content.push_str(&failure_section(&pretty_body(body)));
            shell(&content)
        }
        DashboardError::Transport(message) => {
            let mut content = form_section(values, &[]);
            content.push_str("<hr>\n");
            content.push_str(&failure_section(message));
            shell(&content)
        }
    }
}

/// Pretty-prints JSON bodies; anything else is returned unchanged.
fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string())
}

fn form_section(values: &HashMap<String, String>, errors: &[FormError]) -> String {
    let mut html = String::from(
        "<h2>Customer Information</h2>\n<form method=\"post\" action=\"/predict\">\n<div class=\"columns\">\n",
    );

    for column in &LAYOUT {
        html.push_str("<div>\n");
        for (name, label, input) in column {
            let value = values.get(*name).map(String::as_str).unwrap_or("");
            let _ = writeln!(html, "<label for=\"{name}\">{label}</label>");
            match input {
                Input::Choice(choices) => {
                    let _ = writeln!(html, "<select id=\"{name}\" name=\"{name}\">");
                    for choice in choices.iter() {
                        let selected = if *choice == value { " selected" } else { "" };
                        let escaped = escape_html(choice);
                        let _ = writeln!(
                            html,
                            "<option value=\"{escaped}\"{selected}>{escaped}</option>"
                        );
                    }
                    html.push_str("</select>\n");
                }
                Input::Count => number_input(&mut html, name, value, "1", Some("0")),
                Input::Amount => number_input(&mut html, name, value, "0.01", Some("0")),
                Input::Coordinate => number_input(&mut html, name, value, "any", None),
            }
            for error in errors.iter().filter(|e| e.field == *name) {
                let _ = writeln!(
                    html,
                    "<div class=\"field-error\">{}</div>",
                    escape_html(&error.message)
                );
            }
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n<button type=\"submit\">Predict Churn Risk</button>\n</form>\n");
    html
}

fn number_input(html: &mut String, name: &str, value: &str, step: &str, min: Option<&str>) {
    let min = min.map(|m| format!(" min=\"{m}\"")).unwrap_or_default();
    let _ = writeln!(
        html,
        "<input type=\"number\" id=\"{name}\" name=\"{name}\" value=\"{}\" step=\"{step}\"{min}>",
        escape_html(value)
    );
}

fn results_section(prediction: &Prediction) -> String {
    let risk = prediction.risk();
    let alert = if prediction.is_churn() {
        "warning"
    } else {
        "success"
    };

    let mut html = String::from("<h2>Prediction Results</h2>\n<div class=\"metrics\">\n");
    metric(
        &mut html,
        "Churn Probability",
        &format_probability(prediction.churn_probability),
        "",
    );
    metric(&mut html, "Prediction", prediction.label(), "");
    metric(&mut html, "Risk Level", risk.label(), risk.css_class());
    html.push_str("</div>\n<hr>\n<h2>Churn Risk Indicator</h2>\n");
    html.push_str(&probability_chart(prediction.churn_probability));
    let _ = write!(
        html,
        "<hr>\n<h2>Customer Insight</h2>\n<div class=\"alert {alert}\">{}</div>\n",
        escape_html(prediction.insight())
    );
    html
}

fn metric(html: &mut String, name: &str, value: &str, class: &str) {
    let _ = writeln!(
        html,
        "<div class=\"metric\"><div class=\"name\">{name}</div><div class=\"value {class}\">{}</div></div>",
        escape_html(value)
    );
}

/// Single-bar SVG chart of `p` on a 0–1 axis.
pub fn probability_chart(p: f64) -> String {
    const PLOT_HEIGHT: f64 = 180.0;
    const TOP: f64 = 10.0;
    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    let bar_height = p * PLOT_HEIGHT;
    let bar_y = TOP + PLOT_HEIGHT - bar_height;

    let mut svg = String::from(
        "<svg class=\"chart\" viewBox=\"0 0 320 220\" width=\"320\" height=\"220\" role=\"img\" aria-label=\"Churn Probability\">\n",
    );
    for tick in [0.0_f64, 0.25, 0.5, 0.75, 1.0] {
        let y = TOP + PLOT_HEIGHT - tick * PLOT_HEIGHT;
        let _ = writeln!(
            svg,
            "<line x1=\"40\" x2=\"310\" y1=\"{y:.1}\" y2=\"{y:.1}\"/><text x=\"4\" y=\"{:.1}\">{tick:.2}</text>",
            y + 4.0
        );
    }
    let _ = writeln!(
        svg,
        "<rect class=\"bar\" x=\"110\" y=\"{bar_y:.1}\" width=\"120\" height=\"{bar_height:.1}\"><title>{p:.3}</title></rect>"
    );
    svg.push_str("<text x=\"120\" y=\"210\">Churn Probability</text>\n</svg>\n");
    svg
}

fn failure_section(detail: &str) -> String {
    format!(
        "<div class=\"alert error\">Prediction failed</div>\n<pre>{}</pre>\n",
        escape_html(detail)
    )
}
