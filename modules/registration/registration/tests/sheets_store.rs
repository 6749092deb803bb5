#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Spreadsheet-backed repository against a mocked Sheets API.

mod common;

use std::sync::Arc;

use httpmock::prelude::*;
use registration::domain::error::StoreError;
use registration::domain::repo::RegistrationRepository;
use registration::infra::storage::SheetsRegistrationRepository;
use registration::module::build_sheets_repository;
use registration::{
    Identifier, NewRegistration, PhotoUpload, RegistrationConfig, RegistrationModule,
    RegistrationRecord, SheetsStoreConfig, StoreConfig,
};
use serde_json::json;
use sheets_client::{SheetsClient, SheetsClientConfig, StaticTokenProvider};
use url::Url;

const SHEET_ID: &str = "sheet-reg";
const APPEND_PATH: &str = "/v4/spreadsheets/sheet-reg/values/Sheet1!A1:append";
const READ_PATH: &str = "/v4/spreadsheets/sheet-reg/values/Sheet1!A:D";

fn repository(server: &MockServer) -> SheetsRegistrationRepository {
    let config = SheetsClientConfig::new(SHEET_ID)
        .unwrap()
        .with_base_url(Url::parse(&server.base_url()).unwrap());
    let client = SheetsClient::new(config, Arc::new(StaticTokenProvider::new("test-token"))).unwrap();
    SheetsRegistrationRepository::new(client, "Sheet1")
}

fn ada() -> RegistrationRecord {
    RegistrationRecord {
        name: "Ada".to_owned(),
        role: "Speaker".to_owned(),
        identifier: Identifier::new("123456"),
        photo_ref: "uploads/1-ada.png".to_owned(),
    }
}

fn mock_rows(server: &MockServer, rows: serde_json::Value) {
    server.mock(|when, then| {
        when.method(GET).path(READ_PATH);
        then.status(200)
            .json_body(json!({"range": "Sheet1!A1:D1000", "majorDimension": "ROWS", "values": rows}));
    });
}

#[tokio::test]
async fn append_writes_one_row_in_column_order() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(APPEND_PATH)
            .query_param("valueInputOption", "RAW")
            .query_param("insertDataOption", "INSERT_ROWS")
            .header("authorization", "Bearer test-token")
            .json_body(json!({
                "range": "Sheet1!A1",
                "majorDimension": "ROWS",
                "values": [["Ada", "Speaker", "123456", "uploads/1-ada.png"]]
            }));
        then.status(200).json_body(json!({
            "spreadsheetId": SHEET_ID,
            "updates": {"updatedRange": "Sheet1!A2:D2", "updatedRows": 1}
        }));
    });

    repository(&server).append(&ada()).await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn find_skips_configured_header_rows() {
    let server = MockServer::start();
    mock_rows(
        &server,
        json!([
            ["Name", "Role", "123456", "Photo"],
            ["Ada", "Speaker", "123456", "uploads/1-ada.png"]
        ]),
    );
    let repo = repository(&server).with_header_rows(1);

    let found = repo.find_by_identifier("123456").await.unwrap();

    assert_eq!(found, Some(ada()));
}

#[tokio::test]
async fn find_returns_first_matching_row() {
    let server = MockServer::start();
    mock_rows(
        &server,
        json!([
            ["Grace", "Organizer", "654321"],
            ["Ada", "Speaker", "123456", "uploads/1-ada.png"],
            ["Ada Again", "Volunteer", "123456", "uploads/2-ada.png"]
        ]),
    );

    let found = repository(&server).find_by_identifier("123456").await.unwrap();

    assert_eq!(found.unwrap().name, "Ada");
}

#[tokio::test]
async fn find_unknown_identifier_is_none() {
    let server = MockServer::start();
    mock_rows(&server, json!([["Ada", "Speaker", "123456", "uploads/1-ada.png"]]));

    let found = repository(&server).find_by_identifier("999999").await.unwrap();

    assert_eq!(found, None);
}

#[tokio::test]
async fn list_all_skips_rows_without_identifier() {
    let server = MockServer::start();
    mock_rows(
        &server,
        json!([
            ["Ada", "Speaker", "123456", "uploads/1-ada.png"],
            ["half", "row"],
            ["Grace", "Organizer", "654321"]
        ]),
    );

    let records = repository(&server).list_all().await.unwrap();

    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Ada", "Grace"]);
    assert_eq!(records[1].photo_ref, "");
}

#[tokio::test]
async fn list_all_on_empty_sheet_is_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(READ_PATH);
        then.status(200)
            .json_body(json!({"range": "Sheet1!A1:D1000", "majorDimension": "ROWS"}));
    });

    assert!(repository(&server).list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn server_error_maps_to_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(READ_PATH);
        then.status(503).json_body(json!({"error": {"code": 503, "message": "backend"}}));
    });

    let err = repository(&server).list_all().await.unwrap_err();

    assert!(matches!(err, StoreError::Unavailable(_)), "{err:?}");
}

#[tokio::test]
async fn bad_request_maps_to_rejected() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(APPEND_PATH);
        then.status(400).json_body(json!({
            "error": {"code": 400, "message": "Unable to parse range", "status": "INVALID_ARGUMENT"}
        }));
    });

    let err = repository(&server).append(&ada()).await.unwrap_err();

    assert!(matches!(err, StoreError::Rejected(_)), "{err:?}");
}

fn sheets_config(server: &MockServer, dir: &std::path::Path) -> SheetsStoreConfig {
    let fixture = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../../libs/sheets-client/tests/fixtures/service_account.json");
    let mut key: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(fixture).unwrap()).unwrap();
    key["token_uri"] = json!(server.url("/token"));
    let credentials_path = dir.join("credentials.json");
    std::fs::write(&credentials_path, key.to_string()).unwrap();

    SheetsStoreConfig {
        spreadsheet_id: SHEET_ID.to_owned(),
        sheet_name: "Sheet1".to_owned(),
        credentials_path,
        base_url: Url::parse(&server.base_url()).unwrap(),
        header_rows: 0,
        timeout_secs: 5,
    }
}

fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/token")
            .body_includes("assertion=");
        then.status(200).json_body(json!({
            "access_token": "ya29.registrar",
            "expires_in": 3599,
            "token_type": "Bearer"
        }));
    })
}

#[tokio::test]
async fn repository_from_config_authorizes_with_service_account() {
    let server = MockServer::start();
    let token = mock_token(&server);
    let read = server.mock(|when, then| {
        when.method(GET)
            .path(READ_PATH)
            .header("authorization", "Bearer ya29.registrar");
        then.status(200).json_body(json!({
            "values": [["Ada", "Speaker", "123456", "uploads/1-ada.png"]]
        }));
    });
    let dir = tempfile::tempdir().unwrap();

    let repo = build_sheets_repository(&sheets_config(&server, dir.path())).unwrap();
    let first = repo.list_all().await.unwrap();
    let second = repo.find_by_identifier("123456").await.unwrap();

    assert_eq!(first, vec![ada()]);
    assert_eq!(second, Some(ada()));
    assert_eq!(token.calls(), 1);
    assert_eq!(read.calls(), 2);
}

#[test]
fn missing_key_file_fails_with_path_in_context() {
    let server = MockServer::start();
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = sheets_config(&server, dir.path());
    cfg.credentials_path = dir.path().join("absent.json");

    let err = build_sheets_repository(&cfg).unwrap_err();

    assert!(format!("{err:#}").contains("absent.json"), "{err:#}");
}

#[tokio::test]
async fn module_registers_into_spreadsheet() {
    let server = MockServer::start();
    mock_token(&server);
    let append = server.mock(|when, then| {
        when.method(POST)
            .path(APPEND_PATH)
            .body_includes("\"Ada\"")
            .body_includes("\"Speaker\"");
        then.status(200).json_body(json!({
            "updates": {"updatedRange": "Sheet1!A2:D2", "updatedRows": 1}
        }));
    });
    let lookup = server.mock(|when, then| {
        when.method(GET).path(READ_PATH);
        then.status(200).json_body(json!({"values": [["Grace", "Organizer", "654321"]]}));
    });
    let dir = tempfile::tempdir().unwrap();
    let cfg = RegistrationConfig {
        store: StoreConfig::Sheets(sheets_config(&server, dir.path())),
        template_path: common::write_template(dir.path()),
        upload_dir: dir.path().join("uploads"),
        artifact_cache_dir: None,
        collision_retries: 1,
    };
    let module = RegistrationModule::from_config(&cfg).unwrap();

    let (record, handle) = module
        .service()
        .register(NewRegistration {
            name: "Ada".to_owned(),
            role: "Speaker".to_owned(),
            photo: Some(PhotoUpload::new("ada.png", "image/png", b"png".to_vec())),
        })
        .await
        .unwrap();

    append.assert();
    assert_eq!(lookup.calls(), 1);
    assert_eq!(handle.identifier, record.identifier);
    assert!(record.photo_ref.contains("ada.png"));
}
