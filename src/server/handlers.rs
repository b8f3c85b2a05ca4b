use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    Form,
};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::PredictError;
use crate::server::page::render_page;
use crate::server::state::AppState;
use crate::vitals::VitalsSample;

pub const SUCCESS_PREFIX: &str = "🩺 Predicted Disease:";
pub const ERROR_PREFIX: &str = "❌ Error:";

/// Blank form
pub async fn index() -> Html<String> {
    Html(render_page(None))
}

/// Parse the four vitals, run the model, and render the outcome into the page.
///
/// Always answers 200; failures are reported inside the page body.
pub async fn predict(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Html<String> {
    let outcome = form
        .map_err(|rejection| PredictError::InvalidInput {
            field: "form".to_string(),
            reason: rejection.body_text(),
        })
        .and_then(|Form(pairs)| VitalsSample::from_form(&first_values(pairs)))
        .and_then(|sample| state.model.predict(&sample));

    let message = match outcome {
        Ok(label) => {
            info!(label = %label, "Prediction served");
            format!("{SUCCESS_PREFIX} {label}")
        }
        Err(e) => {
            warn!(error = %e, invalid_input = e.is_invalid_input(), "Prediction failed");
            format!("{ERROR_PREFIX} {e}")
        }
    };

    Html(render_page(Some(&message)))
}

/// Collapse repeated form fields, keeping the first value submitted for each name.
fn first_values(pairs: Vec<(String, String)>) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        fields.entry(name).or_insert(value);
    }
    fields
}

/// Liveness check - is the process alive?
pub async fn healthz() -> &'static str {
    "ok"
}
