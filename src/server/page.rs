//! HTML for the single form page.

use crate::vitals::FEATURE_COLUMNS;

fn field_label(name: &str) -> &'static str {
    match name {
        "systolic" => "Systolic BP (mmHg)",
        "diastolic" => "Diastolic BP (mmHg)",
        "spo2" => "SpO₂ (%)",
        "temperature" => "Temperature (°C)",
        _ => "Value",
    }
}

/// Render the form page, with `result` shown under the form when present.
pub fn render_page(result: Option<&str>) -> String {
    let inputs: String = FEATURE_COLUMNS
        .iter()
        .map(|name| {
            format!(
                "      <label for=\"{name}\">{label}</label>\n      \
                 <input type=\"number\" step=\"any\" id=\"{name}\" name=\"{name}\" required>\n",
                label = field_label(name)
            )
        })
        .collect();

    let result_block = result
        .map(|text| format!("    <div class=\"result\">{}</div>\n", escape_html(text)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Vitals Disease Predictor</title>
  <style>
    body {{ font-family: sans-serif; max-width: 28rem; margin: 2rem auto; }}
    form {{ display: grid; gap: 0.5rem; }}
    .result {{ margin-top: 1.5rem; font-size: 1.2rem; }}
  </style>
</head>
<body>
  <main>
    <h1>Vitals Disease Predictor</h1>
    <form action="/predict" method="post">
{inputs}      <button type="submit">Predict</button>
    </form>
{result_block}  </main>
</body>
</html>
"#
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
