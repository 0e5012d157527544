//! API integration tests over in-memory backends.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;

use clipgen_events::RecordingPublisher;
use clipgen_models::{Job, JobId, JobStatus, Short, ShortStatus};
use clipgen_store::{JobRepository, PresetRepository, UserRepository};

use common::{request, StubVerifier, TestApp, CDN};

fn short(id: &str, status: ShortStatus, output_key: Option<&str>) -> Short {
    Short {
        id: id.to_string(),
        status,
        start_time: "00:00:05".to_string(),
        end_time: "00:00:35".to_string(),
        duration_seconds: 30.0,
        hook: "You won't believe this".to_string(),
        output_key: output_key.map(str::to_string),
        completed_at: None,
        confidence: Some(0.9),
        processing_time: None,
    }
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = TestApp::new();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri("/health")
            .header("x-request-id", "req-abc")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-request-id").unwrap(), "req-abc");

    let (status, body) = app.get("/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let app = TestApp::new();
    let (status, _) = app.get("/metrics", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_submit_requires_session() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/generate-shorts",
            None,
            json!({ "url": "https://youtu.be/abc123", "compositionId": "DefaultShort" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert!(app.jobs.is_empty().await);
    assert!(app.events.events().await.is_empty());
}

#[tokio::test]
async fn test_submit_rejects_invalid_session() {
    let app = TestApp::new();
    let (status, _) = app
        .send(request(
            Method::POST,
            "/api/generate-shorts",
            Some("not-a-token".to_string()),
            Some(json!({ "url": "https://youtu.be/abc123", "compositionId": "DefaultShort" })),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submit_creates_job_and_publishes_event() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/generate-shorts",
            Some("alice"),
            json!({
                "url": "https://youtu.be/abc123",
                "settings": { "captionStyle": "bold", "clipDuration": 30 },
                "compositionId": "DefaultShort"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Shorts generation started");
    let request_id = body["requestId"].as_str().unwrap().to_string();

    let job = app
        .jobs
        .get(&JobId::from_string(request_id.clone()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.user_id, "alice");
    assert_eq!(job.source_url, "https://youtu.be/abc123");
    let settings = job.settings.unwrap();
    assert_eq!(settings.caption_style.as_deref(), Some("bold"));
    assert_eq!(settings.clip_duration, Some(30.0));
    assert!(settings.aspect_ratio.is_none());

    let events = app.events.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].detail_type, "GenerateShorts");
    assert_eq!(events[0].detail["requestId"], request_id.as_str());
    assert_eq!(events[0].detail["userId"], "alice");
    assert_eq!(events[0].detail["compositionId"], "DefaultShort");
    assert!(events[0].detail["cookiesKey"].is_null());
    assert_eq!(events[0].detail["maxShorts"], 3);
    assert_eq!(events[0].detail["maxDuration"], 60);
}

#[tokio::test]
async fn test_duplicate_submissions_create_distinct_jobs() {
    let app = TestApp::new();
    let body = json!({ "url": "https://youtu.be/abc123", "compositionId": "DefaultShort" });

    let (_, first) = app.post("/api/generate-shorts", Some("alice"), body.clone()).await;
    let (_, second) = app.post("/api/generate-shorts", Some("alice"), body).await;

    assert_ne!(first["requestId"], second["requestId"]);
    assert_eq!(app.jobs.len().await, 2);
}

#[tokio::test]
async fn test_submit_validation() {
    let app = TestApp::new();

    let cases = [
        (json!({ "compositionId": "DefaultShort" }), "URL is required"),
        (json!({ "url": "  ", "compositionId": "DefaultShort" }), "URL is required"),
        (json!({ "url": "https://youtu.be/abc123" }), "compositionId is required"),
        (
            json!({ "url": "https://youtu.be/abc123", "compositionId": "c", "maxShorts": 0 }),
            "maxShorts must be between 1 and 10",
        ),
        (
            json!({ "url": "https://youtu.be/abc123", "compositionId": "c", "maxShorts": 11 }),
            "maxShorts must be between 1 and 10",
        ),
        (
            json!({ "url": "https://youtu.be/abc123", "compositionId": "c", "maxDuration": 0 }),
            "maxDuration must be greater than 0",
        ),
    ];

    for (body, message) in cases {
        let (status, response) = app.post("/api/generate-shorts", Some("alice"), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], message);
    }

    for url in [
        "http://169.254.169.254/latest/meta-data",
        "http://x@169.254.169.254/latest/meta-data",
        "http://2130706433/",
        "http://[::ffff:127.0.0.1]/",
    ] {
        let (status, _) = app
            .post("/api/generate-shorts", Some("alice"), json!({ "url": url, "compositionId": "c" }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{url}");
    }

    assert!(app.jobs.is_empty().await);
    assert!(app.events.events().await.is_empty());
}

#[tokio::test]
async fn test_submit_forwards_overrides_and_checks_cookies_key() {
    let app = TestApp::new();

    let (status, _) = app
        .post(
            "/api/generate-shorts",
            Some("alice"),
            json!({
                "url": "https://youtu.be/abc123",
                "compositionId": "DefaultShort",
                "cookiesKey": "user-uploads/bob/cookies.txt"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(app.jobs.is_empty().await);

    let (status, _) = app
        .post(
            "/api/generate-shorts",
            Some("alice"),
            json!({
                "url": "https://youtu.be/abc123",
                "compositionId": "DefaultShort",
                "cookiesKey": "user-uploads/alice/cookies.txt",
                "maxShorts": 5,
                "maxDuration": 45
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let events = app.events.events().await;
    assert_eq!(events[0].detail["cookiesKey"], "user-uploads/alice/cookies.txt");
    assert_eq!(events[0].detail["maxShorts"], 5);
    assert_eq!(events[0].detail["maxDuration"], 45);
}

#[tokio::test]
async fn test_publish_failure_marks_job_failed() {
    let app = TestApp::builder()
        .publisher(RecordingPublisher::failing("event bus unavailable"))
        .build();

    let (status, body) = app
        .post(
            "/api/generate-shorts",
            Some("alice"),
            json!({ "url": "https://youtu.be/abc123", "compositionId": "DefaultShort" }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let jobs = app.jobs.list_by_user("alice").await.unwrap();
    assert_eq!(jobs.len(), 1);
    let job = app.jobs.get(&jobs[0].id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.error_message.as_deref(), Some("Failed to dispatch job"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/api/generate-shorts")
                .header(header::AUTHORIZATION, format!("Bearer {}", app.token("alice")))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.0, StatusCode::BAD_REQUEST);
    assert!(response.1["error"].is_string());
}

#[tokio::test]
async fn test_list_jobs_scoped_and_newest_first() {
    let app = TestApp::new();

    let mut older = Job::new_processing("alice", "https://youtu.be/aaa", "DefaultShort", None);
    older.created_at = 1_000;
    let mut newer = Job::new_processing("alice", "https://youtu.be/bbb", "DefaultShort", None);
    newer.created_at = 2_000;
    newer.video_title = Some("Newer".to_string());
    let other = Job::new_processing("bob", "https://youtu.be/ccc", "DefaultShort", None);
    for job in [&older, &newer, &other] {
        app.jobs.put(job.clone()).await;
    }

    let (status, body) = app.get("/api/list-generate-shorts-jobs", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let jobs = body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["id"], newer.id.as_str());
    assert_eq!(jobs[0]["videoTitle"], "Newer");
    assert_eq!(jobs[0]["status"], "PROCESSING");
    assert_eq!(jobs[1]["id"], older.id.as_str());
    assert_eq!(jobs[1]["createdAt"], 1_000);

    let (status, _) = app
        .get("/api/list-generate-shorts-jobs?userId=alice", Some("alice"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get("/api/list-generate-shorts-jobs?userId=bob", Some("alice"))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get("/api/list-generate-shorts-jobs", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_job_detail_ownership_and_output_urls() {
    let app = TestApp::new();

    let mut job = Job::new_processing("alice", "https://youtu.be/abc123", "DefaultShort", None);
    job.status = JobStatus::Completed;
    job.shorts = vec![
        short("s1", ShortStatus::Completed, Some("renders/s1.mp4")),
        short("s2", ShortStatus::Processing, Some("renders/stray.mp4")),
    ];
    app.jobs.put(job.clone()).await;

    let uri = format!("/api/generate-shorts-jobs/{}", job.id);

    let (status, body) = app.get(&uri, Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["effectiveStatus"], "completed");
    assert_eq!(body["shorts"][0]["outputUrl"], format!("{CDN}/renders/s1.mp4"));
    assert!(body["shorts"][0].get("outputKey").is_none());
    assert!(body["shorts"][1].get("outputUrl").is_none());

    let (status, _) = app.get(&uri, Some("bob")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/generate-shorts-jobs/missing", Some("alice")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found");
}

#[tokio::test]
async fn test_video_metadata_route() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/get-video-metadata", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "URL parameter is required");

    let (status, body) = app
        .get("/api/get-video-metadata?url=https%3A%2F%2Fvimeo.com%2F123", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid YouTube URL");

    // Neither the API nor the watch page is reachable
    let (status, body) = app
        .get("/api/get-video-metadata?url=https%3A%2F%2Fyoutu.be%2Fabc123", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["videoId"], "abc123");
    assert_eq!(body["source"], "placeholder");
    assert_eq!(body["thumbnail"], "https://i.ytimg.com/vi/abc123/maxresdefault.jpg");
}

#[tokio::test]
async fn test_backfill_video_metadata() {
    let app = TestApp::new();
    let job = Job::new_processing("alice", "https://www.youtube.com/watch?v=abc123", "c", None);
    app.jobs.put(job.clone()).await;

    let (status, body) = app.post("/api/backfill-video-metadata", Some("alice"), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Job ID is required");

    let (status, _) = app
        .post("/api/backfill-video-metadata", Some("alice"), json!({ "jobId": "missing" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post("/api/backfill-video-metadata", Some("bob"), json!({ "jobId": job.id.as_str() }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post("/api/backfill-video-metadata", Some("alice"), json!({ "jobId": job.id.as_str() }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Thumbnail updated");

    let stored = app.jobs.get(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.video_title.as_deref(), Some("YouTube Video (abc123)"));
    assert_eq!(
        stored.thumbnail_url.as_deref(),
        Some("https://i.ytimg.com/vi/abc123/maxresdefault.jpg")
    );
    assert!(stored.updated_at.is_some());

    let upload_job = Job::new_processing("alice", "https://cdn.example.com/u/a.mp4", "c", None);
    app.jobs.put(upload_job.clone()).await;
    let (status, _) = app
        .post(
            "/api/backfill-video-metadata",
            Some("alice"),
            json!({ "jobId": upload_job.id.as_str() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_preset_requires_fields() {
    let app = TestApp::new();

    let cases = [
        json!({ "compositionId": "c", "inputProps": {} }),
        json!({ "name": " ", "compositionId": "c", "inputProps": {} }),
        json!({ "name": "Bold", "inputProps": {} }),
        json!({ "name": "Bold", "compositionId": "c" }),
        json!({ "name": "Bold", "compositionId": "c", "inputProps": null }),
    ];
    for body in cases {
        let (status, response) = app.post("/api/create-preset", Some("alice"), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "Name, compositionId and inputProps are required");
    }

    let (status, _) = app
        .post(
            "/api/create-preset",
            Some("alice"),
            json!({ "name": "Bold", "compositionId": "c", "inputProps": [1, 2] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.presets.is_empty().await);
}

#[tokio::test]
async fn test_create_and_list_presets() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/create-preset",
            Some("alice"),
            json!({
                "name": "Bold captions",
                "compositionId": "DefaultShort",
                "inputProps": { "captionColor": "#ffffff", "title": { "size": 48 } }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Preset created successfully");
    assert_eq!(body["preset"]["description"], "");
    assert_eq!(body["preset"]["inputProps"]["title"]["size"], 48);
    assert_eq!(body["preset"]["createdAt"], body["preset"]["updatedAt"]);

    app.post(
        "/api/create-preset",
        Some("bob"),
        json!({ "name": "Other", "compositionId": "c", "inputProps": {} }),
    )
    .await;

    let (status, body) = app.get("/api/list-presets", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    let presets = body["presets"].as_array().unwrap();
    assert_eq!(presets.len(), 1);
    assert_eq!(presets[0]["name"], "Bold captions");
    assert_eq!(app.presets.list_by_user("bob").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_credits() {
    let verifier = StubVerifier::default().with("google-token", "sub-1", Some("a@example.com"));
    let app = TestApp::builder().verifier(verifier).build();

    let (status, body) = app.get("/api/get-user-credits", Some("nobody")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credits"], 0);

    app.post("/api/auth/google", None, json!({ "idToken": "google-token" })).await;
    app.users.set_credits("sub-1", 12).await;

    let (_, body) = app.get("/api/get-user-credits", Some("sub-1")).await;
    assert_eq!(body["credits"], 12);
}

#[tokio::test]
async fn test_generate_video_upload() {
    let app = TestApp::new();

    let (status, body) = app
        .post(
            "/api/generate-video-upload",
            Some("alice"),
            json!({ "filename": "My Talk.mp4", "contentType": "video/mp4" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let key = body["key"].as_str().unwrap();
    assert!(key.starts_with("user-uploads/alice/"));
    assert!(body["uploadUrl"].as_str().unwrap().contains("X-Amz-Signature"));
    assert_eq!(body["publicUrl"], format!("{CDN}/{key}"));
    assert_eq!(body["expiresIn"], 900);

    let (status, _) = app
        .post(
            "/api/generate-video-upload",
            Some("alice"),
            json!({ "filename": "x.mp4", "contentType": "video/mp4", "keyOverride": "user-uploads/bob/x.mp4" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(
            "/api/generate-video-upload",
            Some("alice"),
            json!({ "filename": "x.mp4", "keyOverride": "user-uploads/alice/../bob/x.mp4" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/generate-video-upload",
            Some("alice"),
            json!({ "filename": "x.mp4", "keyOverride": "user-uploads/alice/cookies.txt" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["key"], "user-uploads/alice/cookies.txt");
}

#[tokio::test]
async fn test_google_sign_in_requires_verified_email() {
    let verifier = StubVerifier::default()
        .with("owner", "google-sub-1", Some("alice@example.com"))
        .with_unverified("impostor", "google-sub-9", "alice@example.com")
        .with_unverified("newcomer", "google-sub-10", "carol@example.com");
    let app = TestApp::builder().verifier(verifier).build();

    let (status, _) = app.post("/api/auth/google", None, json!({ "idToken": "owner" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/api/auth/google", None, json!({ "idToken": "impostor" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("token").is_none());

    let (status, _) = app.post("/api/auth/google", None, json!({ "idToken": "newcomer" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.users.get("google-sub-10").await.unwrap().is_none());
}

#[tokio::test]
async fn test_google_sign_in_creates_user_once() {
    let verifier = StubVerifier::default()
        .with("token-1", "google-sub-1", Some("alice@example.com"))
        .with("token-2", "google-sub-2", Some("alice@example.com"))
        .with("no-email", "google-sub-3", None);
    let app = TestApp::builder().verifier(verifier).build();

    let (status, body) = app.post("/api/auth/google", None, json!({ "idToken": "token-1" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], "google-sub-1");
    assert_eq!(body["user"]["provider"], "google");
    let token = body["token"].as_str().unwrap().to_string();

    // Same email under another subject resolves to the existing account
    let (_, body) = app.post("/api/auth/google", None, json!({ "idToken": "token-2" })).await;
    assert_eq!(body["user"]["id"], "google-sub-1");

    let (status, _) = app.post("/api/auth/google", None, json!({ "idToken": "no-email" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.post("/api/auth/google", None, json!({ "idToken": "forged" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .send(request(Method::GET, "/api/auth/session", Some(token.clone()), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/api/auth/session")
                .header(header::COOKIE, format!("session={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "google-sub-1");
}

#[tokio::test]
async fn test_checkout_requires_product() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/payment/create-checkout-session", Some("alice"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "productId is required");

    let (status, _) = app
        .post("/api/payment/create-checkout-session", None, json!({ "productId": "prod_1" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_per_client_ip() {
    let app = TestApp::builder().rate_limit(1).build();
    let limited = |ip: &str| {
        Request::builder()
            .uri("/api/get-video-metadata")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = app.send(limited("203.0.113.9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let response = tower::ServiceExt::oneshot(app.router.clone(), limited("203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");

    let (status, _) = app.send(limited("198.51.100.4")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
