//! End-to-end session flows against a mocked API

use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use trek_core::TrekConfig;
use trek_http::PublicTrekClient;
use trek_session::{
    GuardDecision, Navigation, Redirects, RefreshOutcome, RemoteAuthApi, RestoreOutcome,
    RouteGuard, RouteTable, SessionManager, SessionPolicy, SessionStatus,
};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_for(sub: &str, role: &str) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": sub, "role": role, "exp": 4_102_444_800_i64 }),
        &EncodingKey::from_secret(b"api-signing-key"),
    )
    .unwrap()
}

fn manager_for(server: &MockServer) -> SessionManager {
    let client = PublicTrekClient::new(server.uri()).unwrap();
    SessionManager::new(
        Arc::new(RemoteAuthApi::new(client)),
        SessionPolicy::default(),
    )
}

#[tokio::test]
async fn test_sign_in_then_refresh_uses_cookie() {
    let server = MockServer::start().await;
    let first = token_for("ada", "admin");
    let second = token_for("ada", "admin");

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refreshToken=r-1; Path=/; HttpOnly")
                .set_body_json(json!({ "accessToken": first })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "refreshToken=r-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": second })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    let identity = manager.sign_in("ada", "hunter2").await.unwrap();
    assert_eq!(identity.subject_id, "ada");

    let outcome = manager.refresh_token().await;
    assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));
    assert_eq!(manager.snapshot().access_token(), Some(second.as_str()));
}

#[tokio::test]
async fn test_restore_without_cookie_ends_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "No token" })))
        .expect(1)
        .mount(&server)
        .await;

    // Logout with no token held carries no bearer header
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    let mut rx = manager.subscribe();
    let guard = RouteGuard::new(["admin"], Redirects::default());

    assert_eq!(manager.restore().await, RestoreOutcome::NoSession);
    assert_eq!(manager.restore().await, RestoreOutcome::AlreadyAttempted);

    assert_eq!(
        guard.resolve(&mut rx).await,
        GuardDecision::RedirectToLogin("/login".into())
    );
    let requests = server.received_requests().await.unwrap();
    let logout = requests
        .iter()
        .find(|r| r.url.path() == "/auth/logout")
        .unwrap();
    assert!(!logout.headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_logout_survives_server_error() {
    let server = MockServer::start().await;
    let token = token_for("bob", "user");

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    manager.login(token).unwrap();
    manager.logout().await;

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.status(), SessionStatus::Unauthenticated);
    assert!(snapshot.identity().is_none());
    assert!(snapshot.access_token().is_none());
}

#[tokio::test]
async fn test_admin_navigation_after_restore() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": token_for("eve", "user") })),
        )
        .mount(&server)
        .await;

    let mut config = TrekConfig::default();
    config.api.base_url = server.uri();
    let manager = SessionManager::from_config(&config).unwrap();
    let table = RouteTable::default_site(&Redirects::from(&config.routes));

    assert!(matches!(
        table.navigate("/admin/blog/new", &manager.snapshot()),
        Navigation::Matched { decision: GuardDecision::Pending, .. }
    ));

    assert!(matches!(manager.restore().await, RestoreOutcome::Restored(_)));

    match table.navigate("/admin/blog/new", &manager.snapshot()) {
        Navigation::Matched { pattern, decision, .. } => {
            assert_eq!(pattern, "/admin/blog/*");
            assert_eq!(decision, GuardDecision::RedirectToHome("/".into()));
        }
        Navigation::NotFound => panic!("admin route should match"),
    }
}

#[tokio::test]
async fn test_overlapping_refreshes_hit_the_api_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": token_for("ada", "user") }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server);
    let (first, second) = futures::join!(manager.refresh_token(), manager.refresh_token());

    let outcomes = [first, second];
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, RefreshOutcome::Refreshed(_)))
            .count(),
        1
    );
    assert!(outcomes.contains(&RefreshOutcome::AlreadyInFlight));
    assert!(manager.snapshot().is_authenticated());
}
