mod common;

use axum::http::StatusCode;
use common::{setup, setup_with, TestApp};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const ENDPOINT: &str = "/functions/v1/fleet-engine";
const PROVIDER_PATH: &str = "/v1/providers/test-project";
const ACCESS_TOKEN: &str = "ya29.test-token";

async fn mount_token(app: &TestApp, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("jwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3600,
            "token_type": "Bearer",
        })))
        .expect(expected_calls)
        .mount(&app.server)
        .await;
}

fn bearer() -> String {
    format!("Bearer {}", ACCESS_TOKEN)
}

#[tokio::test]
async fn test_unknown_action_is_rejected() {
    let app = setup().await;

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "delete_fleet", "data": {} }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Ação desconhecida: delete_fleet");
}

#[tokio::test]
async fn test_missing_action_is_rejected() {
    let app = setup().await;

    let (status, body) = app.post_json(ENDPOINT, json!({ "data": {} })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Campo 'action' é obrigatório");
}

#[tokio::test]
async fn test_invalid_data_is_rejected_before_any_call() {
    let app = setup().await;
    mount_token(&app, 0).await;

    let (status, body) = app
        .post_json(
            ENDPOINT,
            json!({ "action": "update_location", "data": { "vehicle_id": "truck-1", "latitude": "north" } }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Dados inválidos para update_location"));
}

#[tokio::test]
async fn test_create_vehicle() {
    let app = setup().await;
    mount_token(&app, 1).await;

    Mock::given(method("POST"))
        .and(path(format!("{}/deliveryVehicles", PROVIDER_PATH)))
        .and(query_param("deliveryVehicleId", "truck-1"))
        .and(header("authorization", bearer().as_str()))
        .and(body_partial_json(json!({ "type": "AUTO" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "providers/test-project/deliveryVehicles/truck-1",
            "type": "AUTO",
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "create_vehicle", "data": { "vehicle_id": "truck-1" } }))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "providers/test-project/deliveryVehicles/truck-1");
}

#[tokio::test]
async fn test_access_token_is_reused() {
    let app = setup().await;
    mount_token(&app, 1).await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/deliveryVehicles/truck-1", PROVIDER_PATH)))
        .and(header("authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&app.server)
        .await;

    for latitude in [-23.55, -23.56] {
        let (status, _) = app
            .post_json(
                ENDPOINT,
                json!({
                    "action": "update_location",
                    "data": { "vehicle_id": "truck-1", "latitude": latitude, "longitude": -46.63 },
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_update_location_body() {
    let app = setup().await;
    mount_token(&app, 1).await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/deliveryVehicles/truck-1", PROVIDER_PATH)))
        .and(query_param("updateMask", "last_location"))
        .and(body_partial_json(json!({
            "lastLocation": {
                "location": { "latitude": -23.55, "longitude": -46.63 },
                "heading": 90,
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "truck-1" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let (status, body) = app
        .post_json(
            ENDPOINT,
            json!({
                "action": "update_location",
                "data": { "vehicleId": "truck-1", "latitude": -23.55, "longitude": -46.63, "heading": 90 },
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "truck-1");
}

#[tokio::test]
async fn test_create_task() {
    let app = setup().await;
    mount_token(&app, 1).await;

    Mock::given(method("POST"))
        .and(path(format!("{}/tasks", PROVIDER_PATH)))
        .and(query_param("taskId", "task-9"))
        .and(body_partial_json(json!({
            "type": "DELIVERY",
            "state": "OPEN",
            "trackingId": "carga-7",
            "taskDuration": "600s",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "tasks/task-9" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let (status, body) = app
        .post_json(
            ENDPOINT,
            json!({
                "action": "create_task",
                "data": { "task_id": "task-9", "carga_id": "carga-7", "latitude": -22.9, "longitude": -43.2 },
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["name"], "tasks/task-9");
}

#[tokio::test]
async fn test_assign_task() {
    let app = setup().await;
    mount_token(&app, 1).await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/deliveryVehicles/truck-1", PROVIDER_PATH)))
        .and(query_param("updateMask", "remaining_vehicle_journey_segments"))
        .and(body_string_contains("\"taskId\":\"task-9\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "truck-1" })))
        .expect(1)
        .mount(&app.server)
        .await;

    let (status, _) = app
        .post_json(
            ENDPOINT,
            json!({
                "action": "assign_task",
                "data": { "vehicle_id": "truck-1", "task_id": "task-9", "latitude": -22.9, "longitude": -43.2 },
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_generate_token() {
    let app = setup().await;
    mount_token(&app, 1).await;

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "generate_token" }))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["token"], ACCESS_TOKEN);
    assert_eq!(body["data"]["tokenType"], "Bearer");

    let expires_in = body["data"]["expiresIn"].as_u64().unwrap();
    assert!(expires_in > 0 && expires_in <= 3600);
}

#[tokio::test]
async fn test_token_exchange_failure() {
    let app = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature.",
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "generate_token" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "oauth error: Invalid JWT Signature.");
}

#[tokio::test]
async fn test_missing_provider_is_configuration_error() {
    let app = setup_with(|settings| settings.fleet.provider_id.clear()).await;
    mount_token(&app, 0).await;

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "create_vehicle", "data": { "vehicle_id": "truck-1" } }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Missing configuration value: fleet.provider_id");
}

#[tokio::test]
async fn test_missing_private_key_is_configuration_error() {
    let app = setup_with(|settings| settings.fleet.private_key.clear()).await;

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "generate_token" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Missing configuration value: fleet.private_key");
}

#[tokio::test]
async fn test_upstream_error_message_is_forwarded() {
    let app = setup().await;
    mount_token(&app, 1).await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/deliveryVehicles/ghost", PROVIDER_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Vehicle not found", "status": "NOT_FOUND" }
        })))
        .mount(&app.server)
        .await;

    let (status, body) = app
        .post_json(
            ENDPOINT,
            json!({
                "action": "update_location",
                "data": { "vehicle_id": "ghost", "latitude": 0.0, "longitude": 0.0 },
            }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "fleet error: Vehicle not found");
}

#[tokio::test]
async fn test_oversized_token_lifetime_is_clamped() {
    let app = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": u64::MAX,
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    for _ in 0..2 {
        let (status, body) = app
            .post_json(ENDPOINT, json!({ "action": "generate_token" }))
            .await;

        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["data"]["token"], ACCESS_TOKEN);

        let expires_in = body["data"]["expiresIn"].as_u64().unwrap();
        assert!(expires_in > 0 && expires_in <= 86_400, "{}", expires_in);
    }
}

#[tokio::test]
async fn test_nearly_expired_token_is_minted_again() {
    let app = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 30,
        })))
        .expect(2)
        .mount(&app.server)
        .await;

    for _ in 0..2 {
        let (status, _) = app
            .post_json(ENDPOINT, json!({ "action": "generate_token" }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_failed_exchange_is_not_cached() {
    let app = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "backendError" })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.server)
        .await;
    mount_token(&app, 1).await;

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "generate_token" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "oauth error: backendError");

    let (status, body) = app
        .post_json(ENDPOINT, json!({ "action": "generate_token" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["token"], ACCESS_TOKEN);
}
