use std::fs;
use std::path::{Path, PathBuf};

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use premium_server::api::{
    self, ErrorResponse, PredictionResponse, MAX_BODY_SIZE, NO_INPUT_MESSAGE,
};
use premium_server::models::{
    ColumnTransform, Estimator, HandleUnknown, Preprocessor, RegressionModel, RegressionTree,
    TreeNode,
};
use premium_server::state::AppState;
use serde_json::json;

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(api::configure),
        )
        .await
    };
}

fn saved_models() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("saved_models")
}

fn bundled_state(expose_error_details: bool) -> AppState {
    let dir = saved_models();
    AppState::load(
        &dir.join("insurance_premium_model.json"),
        &dir.join("preprocessor.json"),
        expose_error_details,
    )
    .expect("bundled artifacts load")
}

fn applicant() -> serde_json::Value {
    json!({"age": 35, "bmi": 27.1, "children": 2, "smoker": "no", "region": "southeast"})
}

#[actix_web::test]
async fn index_reports_running() {
    let app = app!(bundled_state(true));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(body, "Insurance Premium Prediction API is running.");
}

#[actix_web::test]
async fn predicts_premium_for_valid_applicant() {
    let app = app!(bundled_state(true));
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(applicant())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: PredictionResponse = test::read_body_json(resp).await;
    assert!(body.predicted_insurance_premium.is_finite());
    assert!((body.predicted_insurance_premium - 5572.54).abs() < 0.01);
}

#[actix_web::test]
async fn smokers_pay_more() {
    let app = app!(bundled_state(true));
    let mut smoker = applicant();
    smoker["smoker"] = json!("yes");
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(smoker)
        .to_request();
    let body: PredictionResponse = test::call_and_read_body_json(&app, req).await;
    assert!((body.predicted_insurance_premium - 29421.07).abs() < 0.01);
}

#[actix_web::test]
async fn identical_requests_yield_identical_predictions() {
    let app = app!(bundled_state(true));
    let mut seen = Vec::new();
    for _ in 0..3 {
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(applicant())
            .to_request();
        let body: PredictionResponse = test::call_and_read_body_json(&app, req).await;
        seen.push(body.predicted_insurance_premium);
    }
    assert!(seen.windows(2).all(|w| w[0] == w[1]));
}

#[actix_web::test]
async fn empty_or_missing_body_is_a_client_error() {
    let app = app!(bundled_state(true));
    let requests = vec![
        test::TestRequest::post().uri("/predict").to_request(),
        test::TestRequest::post()
            .uri("/predict")
            .insert_header(("content-type", "application/json"))
            .set_payload("")
            .to_request(),
        test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({}))
            .to_request(),
        test::TestRequest::post()
            .uri("/predict")
            .set_json(json!(null))
            .to_request(),
    ];
    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, NO_INPUT_MESSAGE);
    }
}

#[actix_web::test]
async fn malformed_json_is_a_client_error() {
    let app = app!(bundled_state(true));
    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"age\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert!(body.error.starts_with("Invalid JSON"));
}

#[actix_web::test]
async fn missing_features_are_a_server_error_with_detail() {
    let app = app!(bundled_state(true));
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"age": 35, "smoker": "no"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "missing required feature 'bmi'");
}

#[actix_web::test]
async fn bad_values_are_server_errors() {
    let app = app!(bundled_state(true));
    let mut unknown_region = applicant();
    unknown_region["region"] = json!("midwest");
    let mut text_age = applicant();
    text_age["age"] = json!("thirty");

    for (payload, expected) in [
        (unknown_region, "unknown category 'midwest'"),
        (text_age, "feature 'age' must be a finite number"),
        (json!([applicant()]), "expected a JSON object"),
    ] {
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains(expected), "{}", body.error);
    }
}

fn age_stump_state() -> AppState {
    let preprocessor = Preprocessor::new(vec![ColumnTransform::Passthrough {
        columns: vec!["age".into()],
    }])
    .unwrap();
    let model = RegressionModel::new(
        1,
        Estimator::GradientBoosting {
            init: 1000.0,
            learning_rate: 1.0,
            trees: vec![RegressionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 40.0,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: 0.0 },
                    TreeNode::Leaf { value: 5000.0 },
                ],
            }],
        },
    )
    .unwrap();
    AppState::new(preprocessor, model, true).unwrap()
}

#[actix_web::test]
async fn non_finite_numbers_are_rejected() {
    let app = app!(age_stump_state());

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"age": 55}))
        .to_request();
    let body: PredictionResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.predicted_insurance_premium, 6000.0);

    for age in ["NaN", "inf", "-inf"] {
        let req = test::TestRequest::post()
            .uri("/predict")
            .set_json(json!({ "age": age }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "age={age}");
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("must be a finite number"), "{}", body.error);
    }
}

#[actix_web::test]
async fn oversized_body_gets_json_error() {
    let app = app!(bundled_state(true));
    let padding = "x".repeat(MAX_BODY_SIZE);
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"age": 35, "padding": padding}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert!(body.error.starts_with("Request body exceeds"));
}

#[actix_web::test]
async fn error_details_can_be_hidden() {
    let app = app!(bundled_state(false));
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"age": 35}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = test::read_body_json(resp).await;
    assert_eq!(body.error, "Internal server error");
}

#[actix_web::test]
async fn serves_boosted_model_from_binary_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let preprocessor = Preprocessor::new(vec![
        ColumnTransform::Passthrough {
            columns: vec!["age".into()],
        },
        ColumnTransform::OneHotEncoder {
            columns: vec!["smoker".into()],
            categories: vec![vec!["no".into(), "yes".into()]],
            drop_first: false,
            handle_unknown: HandleUnknown::Ignore,
        },
    ])
    .unwrap();
    let model = RegressionModel::new(
        3,
        Estimator::GradientBoosting {
            init: 1000.0,
            learning_rate: 1.0,
            trees: vec![RegressionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature: 2,
                        threshold: 0.5,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: 0.0 },
                    TreeNode::Leaf { value: 20000.0 },
                ],
            }],
        },
    )
    .unwrap();

    let preprocessor_path = dir.path().join("preprocessor.json");
    fs::write(
        &preprocessor_path,
        serde_json::to_vec(&preprocessor).unwrap(),
    )
    .unwrap();
    let model_path = dir.path().join("model.bin");
    fs::write(
        &model_path,
        bincode::serde::encode_to_vec(&model, bincode::config::standard()).unwrap(),
    )
    .unwrap();

    let state = AppState::load(&model_path, &preprocessor_path, true).unwrap();
    let app = app!(state);
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"age": 52, "smoker": "yes", "sex": "male"}))
        .to_request();
    let body: PredictionResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.predicted_insurance_premium, 21000.0);
}

#[::core::prelude::v1::test]
fn startup_fails_without_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(
        saved_models().join("preprocessor.json"),
        dir.path().join("preprocessor.json"),
    )
    .unwrap();

    let result = AppState::load(
        &dir.path().join("insurance_premium_model.json"),
        &dir.path().join("preprocessor.json"),
        true,
    );
    assert!(result.is_err());
}

#[::core::prelude::v1::test]
fn startup_fails_without_preprocessor() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(
        saved_models().join("insurance_premium_model.json"),
        dir.path().join("insurance_premium_model.json"),
    )
    .unwrap();

    let err = AppState::load(
        &dir.path().join("insurance_premium_model.json"),
        &dir.path().join("preprocessor.json"),
        true,
    )
    .err()
    .unwrap();
    assert!(err.to_string().contains("failed to load preprocessor"));
}

#[::core::prelude::v1::test]
fn startup_fails_on_mismatched_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    fs::write(
        &model_path,
        json!({"n_features": 2, "estimator": {"Linear": {"coefficients": [1.0, 2.0], "intercept": 0.0}}})
            .to_string(),
    )
    .unwrap();

    let err = AppState::load(&model_path, &saved_models().join("preprocessor.json"), true)
        .err()
        .unwrap();
    assert!(err.to_string().contains("expects 2"));
}
