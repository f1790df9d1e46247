// Tests for the Vertex AI adapter against a mock prediction service

use actix_web::{http::StatusCode, test, web, App};
use mockito::Matcher;
use penguin_gateway::models::{DeploymentConfig, FeatureRecord};
use penguin_gateway::routes::{configure_routes, AppState};
use penguin_gateway::services::{
    predict_tabular_classification, ClientOptions, Credentials, ServiceAccountCredentials,
    VertexError, VertexPredictor,
};
use serde_json::{json, Value};
use std::sync::Arc;

const PREDICT_PATH: &str = "/v1/projects/penguins/locations/europe-west4/endpoints/1234567890:predict";

fn deployment() -> DeploymentConfig {
    DeploymentConfig::new("penguins", "1234567890")
}

fn gentoo() -> FeatureRecord {
    FeatureRecord {
        culmen_length_mm: json!(45.1),
        culmen_depth_mm: json!(14.5),
        flipper_length_mm: json!(210),
        body_mass_g: json!(4750),
    }
}

fn predict_response() -> String {
    json!({
        "predictions": [{
            "classes": ["Adelie", "Chinstrap", "Gentoo"],
            "scores": [0.1, 0.05, 0.85]
        }],
        "deployedModelId": "987654321",
        "model": "projects/42/locations/europe-west4/models/555",
        "modelDisplayName": "penguins-automl"
    })
    .to_string()
}

#[tokio::test]
async fn test_sends_single_instance_with_empty_parameters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PREDICT_PATH)
        .match_header("content-type", "application/json")
        .match_header("authorization", "Bearer ya29.test-token")
        .match_body(Matcher::Json(json!({
            "instances": [{
                "culmen_length_mm": 45.1,
                "culmen_depth_mm": 14.5,
                "flipper_length_mm": 210,
                "body_mass_g": 4750
            }],
            "parameters": {}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(predict_response())
        .expect(1)
        .create_async()
        .await;

    let options = ClientOptions::new(Credentials::AccessToken("ya29.test-token".to_string()))
        .with_base_url(server.url());

    let prediction = predict_tabular_classification(&deployment(), &gentoo(), &options)
        .await
        .unwrap();

    assert_eq!(prediction["classes"], json!(["Adelie", "Chinstrap", "Gentoo"]));
    assert_eq!(prediction["scores"], json!([0.1, 0.05, 0.85]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_first_prediction_is_returned_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body(
            json!({
                "predictions": [
                    {"classes": ["Adelie"], "scores": [1.0], "displayNames": ["adelie"]},
                    {"classes": ["Gentoo"], "scores": [1.0]}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let options = ClientOptions::default().with_base_url(server.url());
    let prediction = predict_tabular_classification(&deployment(), &FeatureRecord::default(), &options)
        .await
        .unwrap();

    assert_eq!(
        Value::Object(prediction),
        json!({"classes": ["Adelie"], "scores": [1.0], "displayNames": ["adelie"]})
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_prediction_with_debug_logging_enabled() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body(predict_response())
        .create_async()
        .await;

    let options = ClientOptions::default().with_base_url(server.url());
    let prediction = predict_tabular_classification(&deployment(), &gentoo(), &options)
        .await
        .unwrap();

    assert_eq!(prediction["scores"], json!([0.1, 0.05, 0.85]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_credentials_sends_no_authorization() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PREDICT_PATH)
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(predict_response())
        .create_async()
        .await;

    let options = ClientOptions::default().with_base_url(server.url());
    predict_tabular_classification(&deployment(), &gentoo(), &options)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_service_account_signs_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PREDICT_PATH)
        .match_header("authorization", Matcher::Regex(r"^Bearer eyJ[\w-]+\.[\w-]+\.[\w-]+$".to_string()))
        .with_status(200)
        .with_body(predict_response())
        .create_async()
        .await;

    let key_path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/service_account.json");
    let credentials = Credentials::ServiceAccount(ServiceAccountCredentials::from_file(key_path).unwrap());
    let options = ClientOptions::new(credentials).with_base_url(server.url());

    predict_tabular_classification(&deployment(), &gentoo(), &options)
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_predictions_is_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body(r#"{"predictions": [], "deployedModelId": "987654321"}"#)
        .create_async()
        .await;

    let options = ClientOptions::default().with_base_url(server.url());
    let err = predict_tabular_classification(&deployment(), &gentoo(), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, VertexError::EmptyPredictions));
}

#[tokio::test]
async fn test_google_error_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(404)
        .with_body(
            json!({
                "error": {
                    "code": 404,
                    "message": "Endpoint `projects/penguins/locations/europe-west4/endpoints/1234567890` not found.",
                    "status": "NOT_FOUND"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let options = ClientOptions::default().with_base_url(server.url());
    let err = predict_tabular_classification(&deployment(), &gentoo(), &options)
        .await
        .unwrap_err();

    match err {
        VertexError::ApiError { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("not found"));
            assert!(message.ends_with("(NOT_FOUND)"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_unparseable_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body("<html>proxy error</html>")
        .create_async()
        .await;

    let options = ClientOptions::default().with_base_url(server.url());
    let err = predict_tabular_classification(&deployment(), &gentoo(), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, VertexError::InvalidResponse(_)));
}

#[actix_web::test]
async fn test_end_to_end_prediction() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PREDICT_PATH)
        .with_status(200)
        .with_body(predict_response())
        .expect(1)
        .create_async()
        .await;

    let predictor = VertexPredictor::new(ClientOptions::default().with_base_url(server.url()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(deployment(), Arc::new(predictor))))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({
            "culmen_length_mm": 45.1,
            "culmen_depth_mm": 14.5,
            "flipper_length_mm": 210,
            "body_mass_g": 4750
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "status": "success",
            "prediction": {
                "classes": ["Adelie", "Chinstrap", "Gentoo"],
                "scores": [0.1, 0.05, 0.85]
            }
        })
    );
    mock.assert_async().await;
}

#[actix_web::test]
async fn test_end_to_end_unconfigured_skips_remote() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let predictor = VertexPredictor::new(ClientOptions::default().with_base_url(server.url()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(DeploymentConfig::default(), Arc::new(predictor))))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"culmen_length_mm": 45.1}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "PROJECT_ID and ENDPOINT_ID must be set in environment variables"
    );
    mock.assert_async().await;
}

#[actix_web::test]
async fn test_end_to_end_unreachable_service() {
    // Nothing listens on port 1
    let predictor = VertexPredictor::new(ClientOptions::default().with_base_url("http://127.0.0.1:1"));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(deployment(), Arc::new(predictor))))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().starts_with("HTTP request failed"));
}
