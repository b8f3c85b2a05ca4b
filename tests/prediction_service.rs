use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use orchid::{
    create_router,
    ml::{ForestParams, RandomForest},
    model::{ModelMetadata, VitalsModel},
    AppState,
};
use tower::ServiceExt;

const LABELS: [&str; 3] = ["Healthy", "Hypertension", "Pneumonia"];

fn trained_model() -> VitalsModel {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..12 {
        let d = i as f64 * 0.5;
        rows.push(vec![118.0 + d, 78.0 + d, 98.0, 36.7 + d / 10.0]);
        labels.push(LABELS[0].to_string());
        rows.push(vec![155.0 + d, 98.0 + d, 97.0, 36.9]);
        labels.push(LABELS[1].to_string());
        rows.push(vec![121.0 + d, 80.0, 87.0 - d, 38.8 + d / 10.0]);
        labels.push(LABELS[2].to_string());
    }
    let params = ForestParams {
        n_trees: 25,
        ..ForestParams::default()
    };
    let forest = RandomForest::fit(&rows, &labels, &params).expect("fit forest");
    VitalsModel::new(
        forest,
        ModelMetadata {
            trained_at: Utc::now(),
            n_train: rows.len(),
            n_test: 0,
            accuracy: 1.0,
            n_trees: params.n_trees,
            seed: params.seed,
        },
    )
}

fn app() -> Router {
    create_router(AppState::new(trained_model()))
}

async fn send(app: &Router, method: Method, uri: &str, form: Option<&str>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match form {
        Some(body) => builder
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .expect("failed to build form request"),
        None => builder
            .body(Body::empty())
            .expect("failed to build empty request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, String::from_utf8_lossy(&bytes).to_string())
}

fn predicted_label(body: &str) -> Option<&str> {
    let start = body.find("🩺 Predicted Disease: ")? + "🩺 Predicted Disease: ".len();
    let rest = &body[start..];
    let end = rest.find('<')?;
    Some(rest[..end].trim())
}

#[tokio::test]
async fn index_renders_form_without_result() {
    let (status, body) = send(&app(), Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"systolic\""));
    assert!(!body.contains("Predicted Disease:"));
    assert!(!body.contains("Error:"));
}

#[tokio::test]
async fn valid_vitals_return_a_training_label() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/predict",
        Some("systolic=120&diastolic=80&spo2=98&temperature=37.0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let label = predicted_label(&body).expect("success message in body");
    assert!(!label.is_empty());
    assert!(LABELS.contains(&label), "unexpected label {label}");
}

#[tokio::test]
async fn repeated_requests_are_deterministic() {
    let app = app();
    let form = "systolic=150&diastolic=95&spo2=96&temperature=37.2";

    let (_, first) = send(&app, Method::POST, "/predict", Some(form)).await;
    let first = predicted_label(&first).expect("first prediction").to_string();
    for _ in 0..5 {
        let (_, body) = send(&app, Method::POST, "/predict", Some(form)).await;
        assert_eq!(predicted_label(&body), Some(first.as_str()));
    }
}

#[tokio::test]
async fn missing_field_is_reported_with_200() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/predict",
        Some("systolic=120&diastolic=80&temperature=37.0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("❌ Error:"));
    assert!(body.contains("spo2"));
    assert!(!body.contains("Predicted Disease:"));
}

#[tokio::test]
async fn non_numeric_field_is_reported_with_200() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/predict",
        Some("systolic=abc&diastolic=80&spo2=98&temperature=37.0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("❌ Error:"));
    assert!(body.contains("systolic"));
    assert!(body.contains("&quot;abc&quot;"));
}

#[tokio::test]
async fn repeated_field_uses_first_value() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some("systolic=abc&systolic=120&diastolic=80&spo2=98&temperature=37.0"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("❌ Error:"));
    assert!(body.contains("&quot;abc&quot;"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/predict",
        Some("systolic=120&systolic=abc&diastolic=80&spo2=98&temperature=37.0"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(predicted_label(&body).is_some(), "{body}");
}

#[tokio::test]
async fn non_finite_value_is_an_inference_error() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/predict",
        Some("systolic=NaN&diastolic=80&spo2=98&temperature=37.0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("❌ Error: inference failed"));
}

#[tokio::test]
async fn non_form_body_is_still_a_page() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from("{}"))
        .expect("failed to build request");
    let response = app().oneshot(request).await.expect("router request failed");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    assert!(String::from_utf8_lossy(&bytes).contains("❌ Error:"));
}

#[tokio::test]
async fn healthz_is_ok() {
    let (status, body) = send(&app(), Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
