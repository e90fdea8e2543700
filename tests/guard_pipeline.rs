//! Guard chain behavior through the full router, without a socket.

use axum::http::{header, Method, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::json;
use tower::ServiceExt;

use admission_control::services::tasks::{TaskStatus, TaskWorker};
use admission_control::HttpServer;

mod common;
use common::{body_bytes, body_json, request, spawn_app, spawn_app_with, SECRET};

fn claims_for(user_id: u64, role: &str, exp: u64) -> serde_json::Value {
    json!({
        "sub": user_id.to_string(),
        "user_id": user_id,
        "username": "root",
        "role": role,
        "iat": get_current_timestamp(),
        "exp": exp,
    })
}

// ---------------------------------------------------------------------------
// Path guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_traversal_is_not_found_before_identity() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    for filename in ["..%2F..%2Fetc%2Fpasswd", "%2Fetc%2Fpasswd", "..%252F..%252Fetc%252Fpasswd"] {
        let uri = format!("/api/v1/files/download?filename={}", filename);
        let res = router
            .clone()
            .oneshot(request(Method::GET, &uri, None, None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "filename {}", filename);
        assert_eq!(body_json(res).await, json!({ "error": "not found" }));
    }
}

#[tokio::test]
async fn test_download_serves_file_under_root() {
    let app = spawn_app().await;
    std::fs::write(app.dir.path().join("report.txt"), b"quarterly numbers").unwrap();
    let router = HttpServer::build_router(app.state.clone());

    let res = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/files/download?filename=report.txt",
            None,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = router
        .oneshot(request(
            Method::GET,
            "/api/v1/files/download?filename=report.txt",
            Some(&app.user_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.txt\""
    );
    assert_eq!(body_bytes(res).await, b"quarterly numbers");
}

#[tokio::test]
async fn test_missing_file_and_traversal_look_alike() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let missing = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/files/download?filename=absent.txt",
            Some(&app.user_token),
            None,
        ))
        .await
        .unwrap();
    let traversal = router
        .oneshot(request(
            Method::GET,
            "/api/v1/files/download?filename=..%2Fsecret",
            Some(&app.user_token),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(missing.status(), traversal.status());
    assert_eq!(body_bytes(missing).await, body_bytes(traversal).await);
}

// ---------------------------------------------------------------------------
// Bound guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_oversized_record_count_never_reaches_data_source() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    for count in [
        json!(999_999_999),
        json!("999999999"),
        json!(0),
        json!(-5),
        json!("12abc"),
        json!(9_223_372_036_854_775_808u64),
        json!(u64::MAX),
    ] {
        let res = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/reports",
                Some(&app.user_token),
                Some(json!({ "record_count": count })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "count {}", count);
    }
    assert_eq!(app.data_source.calls(), 0);
}

#[tokio::test]
async fn test_report_within_limit() {
    let app = spawn_app_with(|c| c.policy.max_record_limit = 10).await;
    let router = HttpServer::build_router(app.state.clone());

    let res = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/reports",
            Some(&app.user_token),
            Some(json!({ "record_count": "10" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = String::from_utf8(body_bytes(res).await).unwrap();
    assert!(body.contains("Record 10"));

    let res = router
        .oneshot(request(
            Method::POST,
            "/api/v1/reports",
            Some(&app.user_token),
            Some(json!({ "record_count": 11 })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.data_source.calls(), 1);
}

// ---------------------------------------------------------------------------
// Network guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_private_targets_never_fetched() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let cases = [
        ("http://169.254.169.254/latest/meta-data/", StatusCode::FORBIDDEN),
        ("http://127.0.0.1:8080/admin", StatusCode::FORBIDDEN),
        ("http://[::1]/", StatusCode::FORBIDDEN),
        ("http://internal.example.com/a.png", StatusCode::FORBIDDEN),
        ("http://mixed.example.com/a.png", StatusCode::FORBIDDEN),
        ("file:///etc/passwd", StatusCode::BAD_REQUEST),
        ("gopher://images.example.com/", StatusCode::BAD_REQUEST),
        ("http://user:pw@images.example.com/a.png", StatusCode::BAD_REQUEST),
        ("not a url", StatusCode::BAD_REQUEST),
        ("http://nowhere.invalid/a.png", StatusCode::BAD_GATEWAY),
    ];

    for (url, expected) in cases {
        let res = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/profile/picture",
                Some(&app.user_token),
                Some(json!({ "image_url": url })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), expected, "url {}", url);
    }
    assert_eq!(app.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_public_target_is_fetched() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let res = router
        .oneshot(request(
            Method::POST,
            "/api/v1/profile/picture",
            Some(&app.user_token),
            Some(json!({ "image_url": "https://images.example.com/avatar.png" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await,
        json!({ "status": "updated", "bytes": 4, "content_type": "image/png" })
    );
    assert_eq!(app.fetcher.calls(), 1);
}

#[tokio::test]
async fn test_injected_hostname_never_executes() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    for host in ["example.com; rm -rf /", "$(id)", "-c 1000 example.com", "a b", ""] {
        let res = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/diagnostics/verify",
                Some(&app.admin_token),
                Some(json!({ "target_host": host })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "host {:?}", host);
    }
    assert!(app.commands.calls().is_empty());
}

#[tokio::test]
async fn test_verify_host_passes_argv() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let res = router
        .oneshot(request(
            Method::POST,
            "/api/v1/diagnostics/verify",
            Some(&app.admin_token),
            Some(json!({ "target_host": "example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await,
        json!({ "host": "example.com", "status": "reachable" })
    );

    let calls = app.commands.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "ping");
    assert_eq!(calls[0].1, vec!["-c", "1", "-W", "1", "example.com"]);
}

// ---------------------------------------------------------------------------
// Identity guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_forged_tokens_rejected() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());
    let exp = get_current_timestamp() + 3600;
    let claims = claims_for(app.admin.user_id, "admin", exp);

    let unsigned = format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    );
    let hs512 = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    let wrong_key = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"some-other-secret-that-is-long-enough"),
    )
    .unwrap();
    let expired = encode(
        &Header::new(Algorithm::HS256),
        &claims_for(app.admin.user_id, "admin", get_current_timestamp() - 60),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    for token in [unsigned, hs512, wrong_key, expired, "garbage".to_string()] {
        let res = router
            .clone()
            .oneshot(request(
                Method::GET,
                "/api/v1/user/profile",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await, json!({ "error": "authentication required" }));
    }
}

#[tokio::test]
async fn test_scheme_must_be_bearer() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let mut req = request(Method::GET, "/api/v1/user/profile", None, None);
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Basic {}", app.user_token).parse().unwrap(),
    );
    let res = router.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_profile() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());
    let creds = json!({ "username": "bob", "password": "hunter2hunter2" });

    let res = router
        .clone()
        .oneshot(request(Method::POST, "/api/v1/auth/register", None, Some(creds.clone())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let profile = body_json(res).await;
    assert_eq!(profile["username"], "bob");
    assert_eq!(profile["role"], "user");

    let res = router
        .clone()
        .oneshot(request(Method::POST, "/api/v1/auth/register", None, Some(creds.clone())))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = router
        .clone()
        .oneshot(request(Method::POST, "/api/v1/auth/login", None, Some(creds)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let login = body_json(res).await;
    assert_eq!(login["token_type"], "Bearer");
    let token = login["token"].as_str().unwrap().to_string();

    let res = router
        .oneshot(request(Method::GET, "/api/v1/user/profile", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["username"], "bob");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let wrong_password = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "alice", "password": "not-her-password" })),
        ))
        .await
        .unwrap();
    let unknown_user = router
        .oneshot(request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "mallory", "password": "not-her-password" })),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(wrong_password).await, body_bytes(unknown_user).await);
}

// ---------------------------------------------------------------------------
// Authorization guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_user_role_cannot_reach_admin_operations() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let res = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/diagnostics/verify",
            Some(&app.user_token),
            Some(json!({ "target_host": "example.com" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(app.commands.calls().is_empty());

    let uri = format!("/api/v1/admin/users/{}", app.admin.user_id);
    let res = router
        .oneshot(request(Method::DELETE, &uri, Some(&app.user_token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(app.state.users.get(app.admin.user_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let uri = format!("/api/v1/admin/users/{}", app.admin.user_id);
    let res = router
        .oneshot(request(Method::DELETE, &uri, Some(&app.admin_token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(res).await,
        json!({ "error": "operation not permitted on own account" })
    );
    assert!(app.state.users.get(app.admin.user_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_admin_deletes_other_user() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());
    let uri = format!("/api/v1/admin/users/{}", app.user.user_id);

    let res = router
        .clone()
        .oneshot(request(Method::DELETE, &uri, Some(&app.admin_token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = router
        .clone()
        .oneshot(request(Method::DELETE, &uri, Some(&app.admin_token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = router
        .oneshot(request(
            Method::DELETE,
            "/api/v1/admin/users/not-a-number",
            Some(&app.admin_token),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Content guard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_comment_markup_and_length_rejected() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let cases = [
        (json!("<script>alert(1)</script>"), StatusCode::BAD_REQUEST),
        (json!("x".repeat(2001)), StatusCode::BAD_REQUEST),
        (json!(""), StatusCode::BAD_REQUEST),
        (json!("bell\u{7}"), StatusCode::BAD_REQUEST),
    ];
    for (content, expected) in cases {
        let res = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/topics/7/comments",
                Some(&app.user_token),
                Some(json!({ "content": content })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), expected);
    }

    let res = router
        .oneshot(request(Method::GET, "/api/v1/topics/7/comments", None, None))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["comments"], json!([]));
}

#[tokio::test]
async fn test_comment_stored_and_listed() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let res = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/topics/7/comments",
            Some(&app.user_token),
            Some(json!({ "content": "Looks good.\nShip it." })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = router
        .clone()
        .oneshot(request(Method::GET, "/api/v1/topics/7/comments", None, None))
        .await
        .unwrap();
    let page = body_json(res).await;
    assert_eq!(page["total"], 1);
    let comments = &page["comments"];
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["content"], "Looks good.\nShip it.");
    assert_eq!(comments[0]["author"], "alice");

    let res = router
        .oneshot(request(Method::GET, "/api/v1/topics/0/comments", None, None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_comment_listing_is_paged_and_bounded() {
    let app = spawn_app_with(|c| c.limits.max_page_size = 2).await;
    let router = HttpServer::build_router(app.state.clone());

    for body in ["one", "two", "three"] {
        let res = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/topics/4/comments",
                Some(&app.user_token),
                Some(json!({ "content": body })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Default page size is the configured maximum.
    let res = router
        .clone()
        .oneshot(request(Method::GET, "/api/v1/topics/4/comments", None, None))
        .await
        .unwrap();
    let page = body_json(res).await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["comments"].as_array().unwrap().len(), 2);

    let res = router
        .clone()
        .oneshot(request(
            Method::GET,
            "/api/v1/topics/4/comments?page=2&per_page=2",
            None,
            None,
        ))
        .await
        .unwrap();
    let page = body_json(res).await;
    assert_eq!(page["comments"][0]["content"], "three");

    for query in ["per_page=3", "per_page=0", "page=0", "page=abc"] {
        let res = router
            .clone()
            .oneshot(request(
                Method::GET,
                &format!("/api/v1/topics/4/comments?{}", query),
                None,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "query {}", query);
    }
}

// ---------------------------------------------------------------------------
// Task queue
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_task_filename_guarded() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    for filename in ["../etc/passwd", "a;rm -rf /", "sub/dir.csv", ".hidden", ""] {
        let res = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/tasks",
                Some(&app.user_token),
                Some(json!({ "filename": filename })),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "filename {:?}", filename);
    }
    assert_eq!(app.state.tasks.pending_len().unwrap(), 0);
}

#[tokio::test]
async fn test_task_lifecycle_and_visibility() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());
    std::fs::write(app.dir.path().join("input.csv"), b"id,value\n").unwrap();

    let res = router
        .clone()
        .oneshot(request(
            Method::POST,
            "/api/v1/tasks",
            Some(&app.user_token),
            Some(json!({ "filename": "input.csv" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let task = body_json(res).await;
    assert_eq!(task["status"], "pending");
    let uri = format!("/api/v1/tasks/{}", task["id"].as_str().unwrap());

    let stranger = common::create_user(
        &app.state,
        "eve",
        "eve-password-1",
        admission_control::guard::Role::User,
    )
    .await;
    let stranger_token = app.state.issuer.issue(&stranger).unwrap();
    let res = router
        .clone()
        .oneshot(request(Method::GET, &uri, Some(&stranger_token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let worker = TaskWorker::new(
        app.state.tasks.clone(),
        app.state.commands.clone(),
        "process-file",
        std::time::Duration::from_millis(10),
        std::time::Duration::from_secs(1),
    );
    worker.drain().await;

    let expected_arg = format!(
        "--input={}",
        app.state.policy.storage_root.as_path().join("input.csv").display()
    );
    assert_eq!(
        app.commands.calls(),
        vec![("process-file".to_string(), vec![expected_arg])]
    );

    for token in [&app.user_token, &app.admin_token] {
        let res = router
            .clone()
            .oneshot(request(Method::GET, &uri, Some(token), None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["status"], TaskStatus::Completed.as_str());
    }

    let res = router
        .oneshot(request(Method::GET, "/api/v1/tasks/not-a-uuid", Some(&app.user_token), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_task_input_must_exist_under_root() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let res = router
        .oneshot(request(
            Method::POST,
            "/api/v1/tasks",
            Some(&app.user_token),
            Some(json!({ "filename": "missing.csv" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.state.tasks.pending_len().unwrap(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_task_input_is_never_processed() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let outside = tempfile::tempdir().unwrap();
    let secret = outside.path().join("secret.csv");
    std::fs::write(&secret, b"token,value\n").unwrap();
    std::os::unix::fs::symlink(&secret, app.dir.path().join("link.csv")).unwrap();

    let res = router
        .oneshot(request(
            Method::POST,
            "/api/v1/tasks",
            Some(&app.user_token),
            Some(json!({ "filename": "link.csv" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.state.tasks.pending_len().unwrap(), 0);

    let worker = TaskWorker::new(
        app.state.tasks.clone(),
        app.state.commands.clone(),
        "process-file",
        std::time::Duration::from_millis(10),
        std::time::Duration::from_secs(1),
    );
    worker.drain().await;
    assert!(app.commands.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Chain properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_input_guard_runs_before_identity() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    // Bad input and no token: the input guard answers first.
    let res = router
        .oneshot(request(
            Method::POST,
            "/api/v1/reports",
            None,
            Some(json!({ "record_count": 999_999_999 })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rejection_is_idempotent() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let mut seen = Vec::new();
    for _ in 0..2 {
        let res = router
            .clone()
            .oneshot(request(
                Method::POST,
                "/api/v1/profile/picture",
                Some(&app.user_token),
                Some(json!({ "image_url": "http://10.1.2.3/x" })),
            ))
            .await
            .unwrap();
        seen.push((res.status(), body_bytes(res).await));
    }
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[0].0, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = spawn_app().await;
    let router = HttpServer::build_router(app.state.clone());

    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/reports")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{\"record_count\": "))
        .unwrap();
    let res = router.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await, json!({ "error": "malformed request" }));
}
