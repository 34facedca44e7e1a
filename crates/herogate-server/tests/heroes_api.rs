use serde_json::{Value, json};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use herogate_server::{AppConfig, build_app};

fn test_config(upstream: &MockServer) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.upstream.base_url = upstream.uri();
    cfg.upstream.timeout_ms = 2000;
    // Keep backoff sleeps negligible so retry-exhaustion tests stay fast.
    cfg.retry.initial_delay_ms = 1;
    cfg
}

async fn start_server(cfg: &AppConfig) -> (String, tokio::sync::oneshot::Sender<()>, JoinHandle<()>) {
    let app = build_app(cfg).expect("build app");

    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    (format!("http://{}", addr), tx, server)
}

fn hero_json(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name, "image": format!("http://example.com/{id}.jpg")})
}

fn profile_json() -> Value {
    json!({"str": 2, "int": 7, "agi": 9, "luk": 7})
}

#[tokio::test]
async fn unauthenticated_get_hero_returns_plain_hero() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hero_json("1", "Daredevil")))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(0)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes/1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "1");
    assert_eq!(body["name"], "Daredevil");
    assert!(body.get("profile").is_none());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn missing_hero_maps_to_404_without_retry() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes/9999"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes/9999", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({"status": "error", "message": "Hero not found"}));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn list_without_credentials_never_authenticates() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([hero_json("1", "Daredevil"), hero_json("2", "Thor")])),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(0)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/heroes", base)).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    let heroes = body["heroes"].as_array().unwrap();
    assert_eq!(heroes.len(), 2);
    assert!(heroes.iter().all(|h| h.get("profile").is_none()));

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn invalid_credentials_degrade_to_public_view() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([hero_json("1", "Daredevil")])))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes/1/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(0)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes", base))
        .header("Name", "hahow")
        .header("Password", "wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    let heroes = body["heroes"].as_array().unwrap();
    assert_eq!(heroes.len(), 1);
    assert!(heroes[0].get("profile").is_none());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn authenticated_list_includes_profiles() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([hero_json("1", "Daredevil"), hero_json("2", "Thor")])),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes/1/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes/2/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes", base))
        .header("Name", "hahow")
        .header("Password", "rocks")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    let heroes = body["heroes"].as_array().unwrap();
    assert_eq!(heroes.len(), 2);
    for hero in heroes {
        assert_eq!(hero["profile"], profile_json());
    }

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn authenticated_get_hero_includes_profile() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hero_json("1", "Daredevil")))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes/1/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes/1", base))
        .header("Name", "hahow")
        .header("Password", "rocks")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "1");
    assert_eq!(body["profile"], profile_json());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn cache_hit_suppresses_second_upstream_call() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([hero_json("1", "Daredevil")])))
        .expect(1)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let resp = client.get(format!("{}/heroes", base)).send().await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["heroes"].as_array().unwrap().len(), 1);
    }

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn public_and_authenticated_views_use_separate_cache_entries() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&upstream)
        .await;
    // The public request populates its own entry; the authenticated request
    // must fetch again rather than reuse it.
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([hero_json("1", "Daredevil")])))
        .expect(2)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes/1/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json()))
        .expect(1)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/heroes", base)).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["heroes"][0].get("profile").is_none());

    let resp = client
        .get(format!("{}/heroes", base))
        .header("Name", "hahow")
        .header("Password", "rocks")
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["heroes"][0]["profile"], profile_json());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn business_error_exhausts_retries_then_503() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 1000, "message": "Backend error"})),
        )
        .expect(3)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/heroes", base)).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({"status": "error", "message": "external API service unavailable"})
    );

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn transport_error_exhausts_retries_then_503() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/heroes/1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes/1", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn auth_backend_failure_rejects_whole_request() {
    let upstream = MockServer::start().await;
    // A transport-level auth failure is not retried and no downstream
    // processing happens.
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes", base))
        .header("Name", "hahow")
        .header("Password", "rocks")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "Authentication service is currently unavailable. Please try again later."
    );

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn auth_business_error_is_retried_before_rejecting() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 1000, "message": "Backend error"})),
        )
        .expect(3)
        .mount(&upstream)
        .await;

    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/heroes", base))
        .header("Name", "hahow")
        .header("Password", "rocks")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}

#[tokio::test]
async fn health_endpoints_respond() {
    let upstream = MockServer::start().await;
    let (base, shutdown_tx, handle) = start_server(&test_config(&upstream)).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/healthz", base))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let resp = client.get(format!("{}/", base)).send().await.unwrap();
    assert!(resp.status().is_success());

    let _ = shutdown_tx.send(());
    let _ = handle.await;
}
