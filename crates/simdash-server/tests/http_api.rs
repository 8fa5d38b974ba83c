//! HTTP API tests against an in-memory router with a temporary resource
//! directory.

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use simdash_server::api::{build_router, AppState};
use simdash_server::settings::Settings;

const SOURCE_MODEL: &str = r#"{
    "field_prototypes": {
        "engine_proto": {
            "return_kind": "table",
            "fields": {
                "rpm": { "return_kind": "number", "display_name": "RPM" }
            }
        }
    },
    "fields": {
        "altitude": {
            "return_kind": "number",
            "unit": "meters",
            "function_name": "get_altitude",
            "display_name": "Altitude ASL",
            "default_decimal_digits": 1
        },
        "heading": {
            "return_kind": "number",
            "unit": "radians",
            "function_name": "get_heading"
        },
        "engines": {
            "return_kind": "list",
            "function_name": "get_engines",
            "prototype_ref": "engine_proto"
        }
    }
}"#;

const SAMPLE_EXPORT_MODEL: &str = r#"{"rows": [[{"field_id": "altitude", "unit": "feet"}]]}"#;

fn write_resources(base: &Path) {
    for dir in [
        "templates",
        "external_models",
        "sample_export_models",
        "notices",
    ] {
        std::fs::create_dir(base.join(dir)).unwrap();
    }
    std::fs::write(
        base.join("templates/main.lua.template"),
        "-- %copyright%\nlocal S = {%bind_address%, %bind_port%, %max_connections%, %socket_timeout%, %log_prefix%}\nfunction collectData()\n    local data = {}\n    %data_content%\n    return data\nend\n",
    )
    .unwrap();
    std::fs::write(
        base.join("templates/export.lua.template"),
        "dofile([[Scripts\\%output_script_name%]])\n",
    )
    .unwrap();
    std::fs::write(
        base.join("templates/template.main.html"),
        "<title>%app_title% %app_version%</title>\nhttp://%bind_address%:%bind_port%/\n//%title_map_entries%\n//%unit_map_entries%\n//%decimal_digits_map_entries%\n//%position_map_entries%\n//%color_scale_map_entries%\n//%color_scale_classes_entries%\n//%set_interval_call%\n",
    )
    .unwrap();
    std::fs::write(
        base.join("external_models/external_model_default.json"),
        SOURCE_MODEL,
    )
    .unwrap();
    std::fs::write(
        base.join("sample_export_models/sample_export_model.json"),
        SAMPLE_EXPORT_MODEL,
    )
    .unwrap();
    for (name, content) in [
        ("LICENSE", "MIT"),
        ("third_party_licenses_distributed.txt", "3p"),
        ("privacy_policy.md", "privacy"),
        ("terms_of_service.md", "terms"),
        ("readme.txt", "readme"),
    ] {
        std::fs::write(base.join("notices").join(name), content).unwrap();
    }
}

fn router(base: &Path) -> Router {
    let settings = Settings::resolve(Some(&base.display().to_string()), None, None);
    let state = Arc::new(AppState::load(&settings).unwrap());
    build_router(state, &settings)
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_serves_greeting() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let response = router(dir.path())
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"Hello World!");
}

#[tokio::test]
async fn source_model_catalog_lists_fields() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let response = router(dir.path())
        .oneshot(
            Request::builder()
                .uri("/api/source-model")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let catalog: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let units = catalog["units"].as_array().unwrap();
    assert_eq!(units.len(), 15);
    assert!(units.iter().any(|u| u["id"] == "seconds"));

    let fields = catalog["fields"].as_array().unwrap();
    let ids: Vec<&str> = fields
        .iter()
        .map(|f| f["field_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["altitude", "engines.rpm", "heading"]);

    let altitude = &fields[0];
    assert_eq!(altitude["display_name"], "Altitude ASL");
    assert_eq!(altitude["unit"]["id"], "meters");
    assert_eq!(altitude["default_decimal_digits"], 1);
    let unit_ids: Vec<&str> = altitude["convertible_units"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert_eq!(unit_ids, vec!["meters", "miles", "feet"]);
}

#[tokio::test]
async fn generate_returns_zip_attachment() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let body = json!({
        "rows": [[
            {"field_id": "altitude", "unit": "feet", "decimal_digits": 0},
            {"field_id": "engines.rpm"}
        ]]
    });
    let response = router(dir.path())
        .oneshot(post_json("/api/generate", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/zip"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("simdash-export.zip"));
    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..2], b"PK");
}

#[tokio::test]
async fn generate_rejects_empty_grid() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let response = router(dir.path())
        .oneshot(post_json("/api/generate", json!({"rows": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_rejects_unknown_field() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let body = json!({"rows": [[{"field_id": "vertical_speed"}]]});
    let response = router(dir.path())
        .oneshot(post_json("/api/generate", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = body_bytes(response).await;
    assert!(String::from_utf8(bytes).unwrap().contains("vertical_speed"));
}

#[tokio::test]
async fn generate_rejects_inconvertible_unit() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let body = json!({"rows": [[{"field_id": "heading", "unit": "meters"}]]});
    let response = router(dir.path())
        .oneshot(post_json("/api/generate", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sample_model_round_trips_through_generate() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let app = router(dir.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sample-model")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sample: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();

    let response = app
        .oneshot(post_json("/api/generate", sample))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn notices_and_metadata_available() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let app = router(dir.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/notices")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let notices: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(notices["license"], "MIT");
    assert_eq!(notices["readme"], "readme");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/metadata")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let metadata: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(metadata["app_version"].is_string());
}
