mod common;

use common::{env, TestApp, TEST_RECIPIENT};
use contact_service::config::EnvSource;
use contact_service::services::{
    EmailMessage, EmailProvider, MailgunProvider, Notifier, ProviderError, SmtpProvider,
};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// base64("api:key-123")
const BASIC_AUTH: &str = "Basic YXBpOmtleS0xMjM=";

fn mailgun_env(server: &MockServer) -> Arc<dyn EnvSource> {
    let base_url = server.uri();
    Arc::new(env(&[
        ("MAILGUN_API_KEY", "key-123"),
        ("MAILGUN_DOMAIN", "mg.acme.test"),
        ("MAILGUN_BASE_URL", base_url.as_str()),
    ]))
}

fn message() -> EmailMessage {
    EmailMessage {
        to: TEST_RECIPIENT.to_string(),
        subject: "New contact request".to_string(),
        body_html: "<p>Name: Ada</p>".to_string(),
        reply_to: Some("ada@example.com".to_string()),
    }
}

#[tokio::test]
async fn posts_form_with_basic_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mg.acme.test/messages"))
        .and(header("authorization", BASIC_AUTH))
        .and(body_string_contains("subject=New+contact+request"))
        .and(body_string_contains("%3Cno-reply%40mg.acme.test%3E"))
        .and(body_string_contains("h%3AReply-To=ada%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "<20261018.1@mg.acme.test>",
            "message": "Queued. Thank you."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = MailgunProvider::new(mailgun_env(&server)).unwrap();
    assert!(provider.is_configured());

    let response = provider.send(&message()).await.expect("send succeeds");
    assert_eq!(
        response.provider_id.as_deref(),
        Some("<20261018.1@mg.acme.test>")
    );
}

#[tokio::test]
async fn display_name_with_comma_is_quoted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mg.acme.test/messages"))
        .and(body_string_contains(
            "from=%22Acme%2C+Inc.%22+%3Cno-reply%40mg.acme.test%3E",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "<2@mg.acme.test>" })))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = server.uri();
    let vars = env(&[
        ("MAILGUN_API_KEY", "key-123"),
        ("MAILGUN_DOMAIN", "mg.acme.test"),
        ("MAILGUN_BASE_URL", base_url.as_str()),
        ("FROM_NAME", "Acme, Inc."),
    ]);
    let provider = MailgunProvider::new(Arc::new(vars)).unwrap();

    provider.send(&message()).await.expect("send succeeds");
}

#[tokio::test]
async fn non_success_status_is_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mg.acme.test/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let provider = MailgunProvider::new(mailgun_env(&server)).unwrap();
    let err = provider.send(&message()).await.unwrap_err();

    assert!(matches!(err, ProviderError::SendFailed(_)));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn missing_settings_skip_the_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let base_url = server.uri();
    let provider =
        MailgunProvider::new(Arc::new(env(&[("MAILGUN_BASE_URL", base_url.as_str())]))).unwrap();

    assert!(!provider.is_configured());
    let err = provider.send(&message()).await.unwrap_err();
    assert!(err.is_not_configured());
}

#[tokio::test]
async fn contact_form_uses_mailgun_when_smtp_is_unconfigured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/mg.acme.test/messages"))
        .and(body_string_contains("to=inbox%40acme.test"))
        .and(body_string_contains("Name%3A+Ada"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "<1@mg.acme.test>",
            "message": "Queued. Thank you."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = mailgun_env(&server);
    let notifier = Notifier::new(
        Arc::new(SmtpProvider::new(env.clone())),
        Arc::new(MailgunProvider::new(env).unwrap()),
    );
    let app = TestApp::spawn_with_notifier(notifier).await;

    let response = app
        .post_contact(json!({ "name": "Ada", "message": "Hello" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "ok": true, "via": "mailgun" }));
}

#[tokio::test]
async fn contact_form_fails_when_no_provider_is_configured() {
    let empty: Arc<dyn EnvSource> = Arc::new(env(&[]));
    let notifier = Notifier::new(
        Arc::new(SmtpProvider::new(empty.clone())),
        Arc::new(MailgunProvider::new(empty).unwrap()),
    );
    let app = TestApp::spawn_with_notifier(notifier).await;

    let response = app.post_contact(json!({})).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .contains("SMTP is not configured"));
}
