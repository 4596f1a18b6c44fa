//! API tests against an in-process router backed by memory storage

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use bookly_server::{
    api,
    config::{AppConfig, DeleterConfig},
    models::UserClaims,
    repository::{MemoryStorage, Storage},
    services::{deleter::DeletionBatcher, Services},
    AppState,
};

struct TestApp {
    router: Router,
    storage: Arc<MemoryStorage>,
    config: AppConfig,
    cancel: CancellationToken,
}

impl TestApp {
    fn start(batch_size: usize) -> Self {
        let mut config = AppConfig::default();
        config.deleter = DeleterConfig {
            batch_size,
            flush_interval_secs: None,
        };

        let storage = Arc::new(MemoryStorage::new());
        let (error_tx, _error_rx) = mpsc::channel(1);
        let (deletions, batcher) = DeletionBatcher::new(storage.clone(), &config.deleter, error_tx);
        let cancel = CancellationToken::new();
        tokio::spawn(batcher.run(cancel.child_token()));

        let services = Services::new(storage.clone(), &config.auth, deletions);
        let router = api::router(AppState {
            services: Arc::new(services),
        });

        Self {
            router,
            storage,
            config,
            cancel,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, token);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let auth_header = response
            .headers()
            .get(AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, auth_header, body)
    }

    async fn register(&self, email: &str) -> String {
        let (status, header, body) = self
            .send(
                Method::POST,
                "/users/register",
                None,
                Some(json!({ "email": email, "password": "s3cret", "age": 27 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = body["token"].as_str().unwrap().to_string();
        assert_eq!(header.as_deref(), Some(token.as_str()));
        token
    }

    async fn wait_for_rows(&self, expected: usize) {
        for _ in 0..100 {
            if self.storage.book_rows().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} book rows, found {}",
            expected,
            self.storage.book_rows().await
        );
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[tokio::test]
async fn test_public_routes() {
    let app = TestApp::start(10);

    let (status, _, body) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Hello".to_string()));

    let (status, _, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_auth_failures_look_the_same() {
    let app = TestApp::start(10);

    let expired = UserClaims {
        user_id: "someone".to_string(),
        exp: chrono::Utc::now().timestamp() - 1,
        iat: chrono::Utc::now().timestamp() - 3600,
    }
    .create_token(&jsonwebtoken::EncodingKey::from_secret(
        app.config.auth.jwt_secret.as_bytes(),
    ))
    .unwrap();

    let foreign = UserClaims {
        user_id: "someone".to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: chrono::Utc::now().timestamp(),
    }
    .create_token(&jsonwebtoken::EncodingKey::from_secret(b"another secret"))
    .unwrap();

    let mut bodies = Vec::new();
    for token in [None, Some(""), Some("garbage"), Some(expired.as_str()), Some(foreign.as_str())] {
        let (status, _, body) = app.send(Method::GET, "/books/", token, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        bodies.push(body);
    }
    assert!(bodies.iter().all(|b| *b == bodies[0]));
    assert_eq!(bodies[0]["message"], "invalid token");
}

#[tokio::test]
async fn test_register_login_and_info() {
    let app = TestApp::start(10);
    let token = app.register("reader@example.com").await;

    let (status, _, _) = app
        .send(
            Method::POST,
            "/users/register",
            None,
            Some(json!({ "email": "reader@example.com", "password": "other", "age": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, header, body) = app
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "email": "reader@example.com", "password": "s3cret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(header.is_some());
    assert_eq!(body["token_type"], "Bearer");

    let (status, _, _) = app
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "email": "reader@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .send(
            Method::POST,
            "/users/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": "s3cret" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let bearer = format!("Bearer {}", token);
    let (status, _, body) = app
        .send(Method::GET, "/users/info", Some(&bearer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "reader@example.com");
    assert_eq!(body["age"], 27);
    assert!(body.get("pass").is_none());
}

#[tokio::test]
async fn test_books_catalog() {
    let app = TestApp::start(10);
    let token = app.register("reader@example.com").await;
    let token = Some(token.as_str());

    let (status, _, _) = app.send(Method::GET, "/books/", token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = app
        .send(
            Method::POST,
            "/add-book",
            token,
            Some(json!({ "label": "Dune", "author": "Herbert", "description": "Spice", "age": 12 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "book Herbert Dune was added");

    let (status, _, body) = app
        .send(
            Method::POST,
            "/add-books",
            token,
            Some(json!([
                { "label": "Dune", "author": "Herbert" },
                { "label": "Emma", "author": "Austen" }
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "2 books were added");

    let (status, _, body) = app.send(Method::GET, "/books/", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["label"], "Dune");
    assert_eq!(books[0]["count"], 2);

    let bid = books[1]["bid"].as_str().unwrap();
    let (status, _, body) = app
        .send(Method::GET, &format!("/books/{}", bid), token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author"], "Austen");

    let (status, _, _) = app
        .send(Method::GET, "/books/does-not-exist", token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_removed_books_purged_per_batch() {
    let app = TestApp::start(2);
    let token = app.register("reader@example.com").await;
    let token = Some(token.as_str());

    for label in ["A", "B", "C"] {
        let (status, _, _) = app
            .send(
                Method::POST,
                "/add-book",
                token,
                Some(json!({ "label": label, "author": "Anon" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let bids: Vec<String> = app
        .storage
        .get_books()
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.bid)
        .collect();

    let (status, _, body) = app
        .send(Method::GET, &format!("/books/{}/remove", bids[0]), token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], format!("book {} was deleted", bids[0]));

    // hidden at once, still stored until the batch fills
    let (status, _, _) = app
        .send(Method::GET, &format!("/books/{}", bids[0]), token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.storage.book_rows().await, 3);

    // removing twice does not count toward the batch
    let (status, _, _) = app
        .send(Method::GET, &format!("/books/{}/remove", bids[0]), token, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.storage.book_rows().await, 3);

    let (status, _, _) = app
        .send(Method::GET, &format!("/books/{}/remove", bids[1]), token, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    app.wait_for_rows(1).await;

    let (status, _, body) = app.send(Method::GET, "/books/", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["bid"], bids[2].as_str());
}
