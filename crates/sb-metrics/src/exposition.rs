use std::fmt::Write as _;

use crate::registry::{POWER_LABEL_NAMES, PowerGauges, PowerSeries};

/// Render gauges in the Prometheus text exposition format (version 0.0.4).
///
/// Series without values are omitted entirely.
pub fn render(gauges: &PowerGauges) -> String {
    let mut out = String::new();
    for series in PowerSeries::ALL {
        let gauge = gauges.series(series);
        if gauge.is_empty() {
            continue;
        }
        let name = series.name();
        let _ = writeln!(out, "# HELP {name} {}", series.help());
        let _ = writeln!(out, "# TYPE {name} gauge");
        for (labels, value) in gauge.iter() {
            let pairs: Vec<String> = POWER_LABEL_NAMES
                .iter()
                .zip(labels.values())
                .map(|(label, value)| format!("{label}=\"{}\"", escape_label_value(value)))
                .collect();
            let _ = writeln!(out, "{name}{{{}}} {}", pairs.join(","), format_value(value));
        }
    }
    out
}

fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".into()
    } else if value.is_infinite() && value.is_sign_positive() {
        "+Inf".into()
    } else if value.is_infinite() {
        "-Inf".into()
    } else {
        value.to_string()
    }
}
