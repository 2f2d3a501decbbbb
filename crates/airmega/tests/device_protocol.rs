mod common;

use std::sync::Arc;

use airmega::protocol::{AirQuality, LightState};
use airmega::{
    AirmegaError, DeviceClient, FanSpeed, FilterRole, MemoryCredentialStore, Mode, Session,
    TokenPair,
};
use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

const BARCODE: &str = "02EUZ4A1234567";

fn ok_body() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"header": {}, "body": {}}))
}

fn client_for(server: &MockServer, tokens: TokenPair) -> Arc<DeviceClient> {
    let store = Arc::new(MemoryCredentialStore::with_tokens(tokens));
    let session = Session::new(config_for(server), store).unwrap();
    Arc::new(DeviceClient::new(Arc::new(session)))
}

fn fresh_tokens() -> TokenPair {
    TokenPair::new("access-1", "refresh-1", Utc::now())
}

async fn mount_ok(server: &MockServer, endpoint: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/{endpoint}.json")))
        .respond_with(ok_body())
        .mount(server)
        .await;
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_control_is_followed_by_refresh() {
    let server = MockServer::start().await;
    mount_ok(&server, "CWIG0603").await;
    mount_ok(&server, "CWIG0602").await;

    let client = client_for(&server, fresh_tokens());
    client
        .set_fan_speed(BARCODE, FanSpeed::from(3))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.path(), "/CWIG0603.json");
    assert_eq!(requests[1].url.path(), "/CWIG0602.json");

    let control = decode_message(&requests[0]);
    assert_eq!(control["header"]["trcode"], "CWIG0603");
    assert_eq!(control["header"]["accessToken"], "access-1");
    assert_eq!(control["body"]["barcode"], BARCODE);
    assert_eq!(control["body"]["funcList"], json!([{"comdVal": "3", "funcId": "0003"}]));

    let refresh = decode_message(&requests[1]);
    assert_eq!(refresh["header"]["trcode"], "CWIG0602");
    assert_eq!(refresh["body"]["barcode"], BARCODE);
    assert_eq!(refresh["body"]["dvcTypeCd"], "004");
}

#[tokio::test]
async fn test_each_control_sends_its_wire_value() {
    let server = MockServer::start().await;
    mount_ok(&server, "CWIG0603").await;
    mount_ok(&server, "CWIG0602").await;

    let client = client_for(&server, fresh_tokens());
    client.set_power(BARCODE, true).await.unwrap();
    client.set_mode(BARCODE, Mode::Manual).await.unwrap();
    client.set_light(BARCODE, false).await.unwrap();

    let controls: Vec<_> = requests_to(&server, "/CWIG0603.json")
        .await
        .iter()
        .map(|r| decode_message(r)["body"]["funcList"][0].clone())
        .collect();
    assert_eq!(
        controls,
        vec![
            json!({"comdVal": "1", "funcId": "0001"}),
            json!({"comdVal": "2", "funcId": "0002"}),
            json!({"comdVal": "0", "funcId": "0007"}),
        ]
    );
    assert_eq!(requests_to(&server, "/CWIG0602.json").await.len(), 3);
}

#[tokio::test]
async fn test_failed_control_skips_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIG0603.json"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/CWIG0602.json"))
        .respond_with(ok_body())
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, fresh_tokens());
    let err = client.set_power(BARCODE, false).await.unwrap_err();
    assert!(matches!(err, AirmegaError::Transport(_)));
    assert_eq!(request_paths(&server).await, vec!["/CWIG0603.json"]);
}

#[tokio::test]
async fn test_undefined_control_values_send_nothing() {
    let server = MockServer::start().await;
    mount_ok(&server, "CWIG0603").await;
    mount_ok(&server, "CWIG0602").await;

    let client = client_for(&server, fresh_tokens());
    let err = client.set_mode(BARCODE, Mode::Other(7)).await.unwrap_err();
    assert!(matches!(err, AirmegaError::Protocol(_)));
    let err = client
        .set_fan_speed(BARCODE, FanSpeed::Other(200))
        .await
        .unwrap_err();
    assert!(matches!(err, AirmegaError::Protocol(_)));

    assert!(request_paths(&server).await.is_empty());
}

#[tokio::test]
async fn test_get_status_with_blank_air_quality() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIA0120.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {},
            "body": {"prodStatus": [{
                "power": "1", "light": "2", "airVolume": "1", "prodMode": "1", "dustPollution": ""
            }]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, fresh_tokens());
    let status = client.get_status(BARCODE).await.unwrap();
    assert_eq!(status.fan_speed, FanSpeed::Low);
    assert_eq!(status.air_quality, AirQuality::Unknown(0));
}

#[tokio::test]
async fn test_concurrent_controls_keep_pairs_together() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIG0603.json"))
        .respond_with(ok_body().set_delay(std::time::Duration::from_millis(50)))
        .mount(&server)
        .await;
    mount_ok(&server, "CWIG0602").await;

    let client = client_for(&server, fresh_tokens());
    let (a, b) = tokio::join!(
        client.set_power(BARCODE, true),
        client.set_light(BARCODE, true)
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(
        request_paths(&server).await,
        vec![
            "/CWIG0603.json",
            "/CWIG0602.json",
            "/CWIG0603.json",
            "/CWIG0602.json"
        ]
    );
}

#[tokio::test]
async fn test_get_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIA0120.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"trcode": "CWIA0120"},
            "body": {"prodStatus": [{
                "power": "1", "light": "0", "airVolume": "2", "prodMode": "2", "dustPollution": "4"
            }]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, fresh_tokens());
    let status = client.get_status(BARCODE).await.unwrap();

    assert!(status.power);
    assert_eq!(status.light, LightState::Off);
    assert_eq!(status.fan_speed, FanSpeed::Medium);
    assert_eq!(status.mode, Mode::Manual);
    assert_eq!(status.air_quality, AirQuality::Inferior);

    let request = &requests_to(&server, "/CWIA0120.json").await[0];
    let message = decode_message(request);
    assert_eq!(message["body"]["barcode"], BARCODE);
    assert_eq!(message["body"]["deviceType"], "004");
}

#[tokio::test]
async fn test_get_status_without_status_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIA0120.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"header": {}, "body": {}})))
        .mount(&server)
        .await;

    let client = client_for(&server, fresh_tokens());
    let err = client.get_status(BARCODE).await.unwrap_err();
    assert!(matches!(err, AirmegaError::Protocol(_)));
}

#[tokio::test]
async fn test_get_filter_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIA0800.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {},
            "body": {"filterList": [
                {"filterName": "Pre-filter", "filterCode": "3121332", "filterPer": "85"},
                {"filterName": "Max2 filter", "filterCode": "3104756", "filterPer": "40"}
            ]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, fresh_tokens());
    let filters = client.get_filter_status(BARCODE).await.unwrap();

    assert_eq!(filters.len(), 2);
    assert_eq!((filters[0].role, filters[0].life_level_percent), (FilterRole::Pre, 85));
    assert_eq!((filters[1].role, filters[1].life_level_percent), (FilterRole::Main, 40));
    assert!(!filters[1].needs_change());
}

#[tokio::test]
async fn test_list_devices_binds_handles() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIG0304.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {},
            "body": {"deviceInfos": [
                {"barcode": BARCODE, "dvcNick": "Living Room", "prodName": "AIRMEGA"}
            ]}
        })))
        .mount(&server)
        .await;
    mount_ok(&server, "CWIG0603").await;
    mount_ok(&server, "CWIG0602").await;

    let client = client_for(&server, fresh_tokens());
    let devices = client.devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].id(), BARCODE);
    assert_eq!(devices[0].display_name(), "Living Room");
    assert_eq!(devices[0].to_string(), format!("Living Room ({BARCODE})"));

    devices[0].set_power(true).await.unwrap();
    assert_eq!(
        request_paths(&server).await,
        vec!["/CWIG0304.json", "/CWIG0603.json", "/CWIG0602.json"]
    );

    let list = decode_message(&requests_to(&server, "/CWIG0304.json").await[0]);
    assert_eq!(list["body"], json!({"pageIndex": "0", "pageSize": "100"}));
}

#[tokio::test]
async fn test_expired_tokens_refresh_before_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/CWIL0100.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": {"accessToken": "access-2", "refreshToken": "refresh-2"},
            "body": {}
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_ok(&server, "CWIG0603").await;
    mount_ok(&server, "CWIG0602").await;

    let expired = TokenPair::new("access-1", "refresh-1", Utc::now() - Duration::minutes(61));
    let client = client_for(&server, expired);
    client.set_power(BARCODE, true).await.unwrap();

    assert_eq!(
        request_paths(&server).await,
        vec!["/CWIL0100.json", "/CWIG0603.json", "/CWIG0602.json"]
    );
    for path in ["/CWIG0603.json", "/CWIG0602.json"] {
        let message = decode_message(&requests_to(&server, path).await[0]);
        assert_eq!(message["header"]["accessToken"], "access-2");
    }
}
