use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

mod common;

async fn server() -> TestServer {
    let db = common::database().await;
    TestServer::new(tanuki::api::router(common::app(db))).expect("test server")
}

async fn bearer(server: &TestServer, role: &str) -> HeaderValue {
    let response = server.post("/token").json(&json!({ "role": role })).await;
    response.assert_status(StatusCode::OK);

    let token = response.json::<Value>()["token"]
        .as_str()
        .expect("token in reply")
        .to_string();

    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn user_payload() -> Value {
    json!({
        "firstName": "Mio",
        "lastName": "Imai",
        "phone": "+81 3 1234 5678",
        "email": "mio@example.com",
        "verified": true
    })
}

fn video_payload(title: &str, likes: i64) -> Value {
    json!({
        "title": title,
        "description": "a description",
        "credits": "studio crew",
        "publishDate": "2024-03-01T12:00:00+00:00",
        "isPublic": true,
        "likes": likes,
        "user": 1,
        "comments": []
    })
}

#[tokio::test]
async fn token_issuance_rejects_unknown_roles() {
    let server = server().await;

    let response = server.post("/token").json(&json!({ "role": "root" })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json::<Value>();
    assert_eq!(body["status"], json!(400));
    assert_eq!(body["message"], json!("Invalid Credentials required"));
}

#[tokio::test]
async fn token_issuance_accepts_user_and_admin() {
    let server = server().await;

    for role in ["user", "admin"] {
        let response = server.post("/token").json(&json!({ "role": role })).await;
        response.assert_status(StatusCode::OK);
        assert!(response.json::<Value>()["token"].is_string());
    }
}

#[tokio::test]
async fn mutating_routes_require_a_token() {
    let server = server().await;

    let response = server.post("/user").json(&user_payload()).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body = response.json::<Value>();
    assert_eq!(body["status"], json!(401));
    assert_eq!(body["message"], json!("Unauthorized"));
    assert_eq!(body["solution"], json!("Please LogIn or Register"));

    let response = server.put("/user/1").json(&json!({ "phone": "+81" })).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server.delete("/video/1").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_tokens_are_rejected() {
    let server = server().await;

    let response = server
        .post("/user")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer nonsense"))
        .json(&user_payload())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_crud_flow() {
    let server = server().await;
    let auth = bearer(&server, "admin").await;

    let response = server
        .post("/user")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&user_payload())
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["status"], json!(201));
    assert_eq!(body["newUser"]["id"], json!(1));
    assert_eq!(
        body["newUser"]["verified"],
        json!(false),
        "creation must ignore the verified claim in the payload"
    );

    let response = server.get("/user").await;
    response.assert_status(StatusCode::OK);
    let body = response.json::<Value>();
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    let response = server.get("/user/1").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["user"]["firstName"], json!("Mio"));

    let response = server
        .put("/user/1")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&json!({ "phone": "+81 3 8765 4321" }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json::<Value>()["message"],
        json!("User updated successfully")
    );

    let response = server.get("/user/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], json!("User not found"));

    let response = server
        .put("/user/999")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&json!({ "phone": "+81" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["message"],
        json!("User not found or nothing changed")
    );

    let response = server
        .delete("/user/1")
        .add_header(AUTHORIZATION, auth)
        .await;
    response.assert_status(StatusCode::OK);

    let response = server.get("/user/1").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_payloads_are_validated() {
    let server = server().await;
    let auth = bearer(&server, "admin").await;

    let mut invalid_email = user_payload();
    invalid_email["email"] = json!("not-an-address");

    let response = server
        .post("/user")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&invalid_email)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["status"], json!(400));

    let response = server
        .post("/user")
        .add_header(AUTHORIZATION, auth)
        .json(&json!({ "firstName": "Mio" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn verification_flow() {
    let server = server().await;
    let auth = bearer(&server, "admin").await;

    server
        .post("/user")
        .add_header(AUTHORIZATION, auth)
        .json(&user_payload())
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/user/send-verification")
        .json(&json!({ "email": "mio@example.com", "lastName": "Imai" }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json::<Value>()["message"],
        json!("Verification email sent")
    );

    let response = server.get("/user/1").await;
    assert_eq!(response.json::<Value>()["user"]["verified"], json!(true));

    let response = server
        .post("/user/send-verification")
        .json(&json!({ "email": "ghost@example.com", "lastName": "Imai" }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], json!("User not found"));
}

#[tokio::test]
async fn verify_link_target_is_public() {
    let server = server().await;
    let auth = bearer(&server, "admin").await;

    server
        .post("/user")
        .add_header(AUTHORIZATION, auth)
        .json(&user_payload())
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.get("/user/verify/1").await;
    response.assert_status(StatusCode::OK);

    let response = server.get("/user/1").await;
    assert_eq!(response.json::<Value>()["user"]["verified"], json!(true));

    let response = server.get("/user/verify/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn video_social_flow() {
    let server = server().await;
    let auth = bearer(&server, "user").await;

    let response = server
        .post("/video")
        .add_header(AUTHORIZATION, auth.clone())
        .json(&video_payload("A", 0))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["newVideo"]["id"], json!(1));
    assert_eq!(body["newVideo"]["likes"], json!(0));

    let response = server.post("/video/like/1").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(
        response.json::<Value>()["message"],
        json!("Like added successfully")
    );

    let response = server.get("/video/1").await;
    assert_eq!(response.json::<Value>()["video"]["likes"], json!(1));

    let response = server.post("/video/comment/1").json(&json!("hi")).await;
    response.assert_status(StatusCode::OK);

    let response = server.get("/video/1").await;
    assert_eq!(
        response.json::<Value>()["video"]["comments"],
        json!(["hi"])
    );

    let response = server.get("/video/likes").await;
    response.assert_status(StatusCode::OK);
    let body = response.json::<Value>();
    let videos = body["videos"].as_array().unwrap();
    assert!(videos.iter().any(|video| video["id"] == json!(1)));

    let response = server.get("/video/visibility/public").await;
    assert_eq!(
        response.json::<Value>()["videos"].as_array().unwrap().len(),
        1
    );

    let response = server.get("/video/visibility/private").await;
    assert!(response.json::<Value>()["videos"]
        .as_array()
        .unwrap()
        .is_empty());

    let response = server.get("/video/user/1").await;
    assert_eq!(
        response.json::<Value>()["videos"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn social_operations_on_missing_videos_report_not_found() {
    let server = server().await;

    let response = server.post("/video/like/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["message"], json!("Video not found"));

    let response = server.post("/video/comment/999").json(&json!("hi")).await;
    response.assert_status(StatusCode::NOT_FOUND);

    let response = server.get("/video/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn video_payloads_are_validated() {
    let server = server().await;
    let auth = bearer(&server, "user").await;

    let response = server
        .post("/video")
        .add_header(AUTHORIZATION, auth)
        .json(&video_payload("A", -3))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        json!("likes must not be negative")
    );
}
