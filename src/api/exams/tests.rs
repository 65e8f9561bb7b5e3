use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::models::SubmissionIdentity;
use crate::db::types::UserRole;
use crate::test_support::{self, TestContext};

fn exam_payload(is_published: bool) -> Value {
    json!({
        "title": "Rust fundamentals",
        "description": "Ownership and borrowing",
        "duration_minutes": 30,
        "passing_score": 50,
        "is_published": is_published,
        "questions": [
            {
                "prompt": "Which keyword declares a mutable binding?",
                "options": ["let mut", "var", "mut let"],
                "correct_index": 0
            },
            {"prompt": "Is String heap allocated?", "options": ["yes", "no"], "correct_index": 0},
            {
                "prompt": "Borrow checker runs at",
                "options": ["runtime", "compile time"],
                "correct_index": 1
            },
            {
                "prompt": "Box<T> is",
                "options": ["a smart pointer", "a trait", "a macro", "a lifetime"],
                "correct_index": 0
            }
        ]
    })
}

async fn send(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, token, body))
        .await
        .expect("request");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

async fn create_exam(ctx: &TestContext, admin_token: &str, is_published: bool) -> Value {
    let (status, exam) = send(
        ctx,
        Method::POST,
        "/api/v1/exams",
        Some(admin_token),
        Some(exam_payload(is_published)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {exam}");
    exam
}

#[tokio::test]
async fn student_takes_published_exam_and_sees_result() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let student =
        test_support::insert_user(ctx.state.db(), "omar", UserRole::Student, "student-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());
    let student_token = test_support::session_token(&student.id, ctx.state.settings());

    let exam = create_exam(&ctx, &admin_token, true).await;
    let exam_id = exam["id"].as_str().expect("exam id").to_string();
    assert_eq!(exam["questions"][2]["correct_index"], 1);

    let (status, listed) =
        send(&ctx, Method::GET, "/api/v1/exams/published", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::OK, "response: {listed}");
    assert_eq!(listed[0]["question_count"], 4);

    let (status, shown) = send(
        &ctx,
        Method::GET,
        &format!("/api/v1/exams/published/{exam_id}"),
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {shown}");
    assert!(shown["questions"][0].get("correct_index").is_none());

    let (status, result) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/submit"),
        Some(&student_token),
        Some(json!({"answers": [0, 1, 1, null]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {result}");
    assert_eq!(result["score"], 2);
    assert_eq!(result["total"], 4);
    assert_eq!(result["percentage"], 50);
    assert_eq!(result["passed"], true);

    let (status, mine) =
        send(&ctx, Method::GET, "/api/v1/exams/submissions/me", Some(&student_token), None).await;
    assert_eq!(status, StatusCode::OK, "response: {mine}");
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    assert_eq!(mine[0]["exam_title"], "Rust fundamentals");

    let (status, all) = send(
        &ctx,
        Method::GET,
        &format!("/api/v1/exams/admin/submissions?exam_id={exam_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {all}");
    assert_eq!(all[0]["submitter"]["kind"], "authenticated");
    assert_eq!(all[0]["submitter"]["username"], "omar");
}

#[tokio::test]
async fn unpublished_exam_is_hidden_from_students() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let student =
        test_support::insert_user(ctx.state.db(), "omar", UserRole::Student, "student-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());
    let student_token = test_support::session_token(&student.id, ctx.state.settings());

    let exam = create_exam(&ctx, &admin_token, false).await;
    let exam_id = exam["id"].as_str().expect("exam id").to_string();

    let (status, _) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/submit"),
        Some(&student_token),
        Some(json!({"answers": [0, 0, 1, 0]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, published) = send(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/exams/{exam_id}/publish"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {published}");
    assert_eq!(published["is_published"], true);

    let (status, result) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/submit"),
        Some(&student_token),
        Some(json!({"answers": [0, 0, 1, 0]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {result}");
    assert_eq!(result["score"], 4);
}

#[tokio::test]
async fn exam_routes_enforce_roles() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let learner =
        test_support::insert_user(ctx.state.db(), "newcomer", UserRole::User, "user-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());
    let learner_token = test_support::session_token(&learner.id, ctx.state.settings());

    let (status, _) =
        send(&ctx, Method::GET, "/api/v1/exams/published", Some(&learner_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        send(&ctx, Method::GET, "/api/v1/exams/published", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &ctx,
        Method::POST,
        "/api/v1/exams",
        Some(&learner_token),
        Some(exam_payload(true)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&ctx, Method::GET, "/api/v1/exams/admin/all", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_questions_are_rejected() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/v1/exams",
        Some(&admin_token),
        Some(json!({
            "title": "Broken",
            "questions": [{"prompt": "Pick", "options": ["a", "b"], "correct_index": 3}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let exam = create_exam(&ctx, &admin_token, false).await;
    let exam_id = exam["id"].as_str().expect("exam id").to_string();
    let (status, body) = send(
        &ctx,
        Method::PUT,
        &format!("/api/v1/exams/{exam_id}"),
        Some(&admin_token),
        Some(json!({"questions": [{"prompt": "Pick", "options": ["only"], "correct_index": 0}]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, body) = send(
        &ctx,
        Method::PUT,
        &format!("/api/v1/exams/{exam_id}"),
        Some(&admin_token),
        Some(json!({"title": "Renamed", "passing_score": 75})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["passing_score"], 75);
    assert_eq!(body["questions"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn anonymous_taker_submits_through_private_link() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());

    let exam = create_exam(&ctx, &admin_token, false).await;
    let exam_id = exam["id"].as_str().expect("exam id").to_string();

    let (status, link) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/generate-link"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {link}");
    let token = link["access_token"].as_str().expect("token").to_string();
    assert_eq!(token.len(), 64);
    assert!(link["private_link"].as_str().expect("link").ends_with(&format!("token={token}")));
    assert_eq!(link["allow_anonymous"], true);

    let (status, shown) =
        send(&ctx, Method::GET, &format!("/api/v1/exams/public/{token}"), None, None).await;
    assert_eq!(status, StatusCode::OK, "response: {shown}");
    assert_eq!(shown["title"], "Rust fundamentals");
    assert!(shown["questions"][1].get("correct_index").is_none());

    let (status, body) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/public/{token}/submit"),
        None,
        Some(json!({"answers": [0, 0, 1, 0], "userName": "Guest"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, result) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/public/{token}/submit"),
        None,
        Some(json!({
            "answers": [0, 0, 0, 1],
            "userName": "Guest Taker",
            "userEmail": "Guest@Example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {result}");
    assert_eq!(result["score"], 2);
    assert_eq!(result["passed"], true);

    let submission_id = result["submission_id"].as_str().expect("submission id");
    let stored = crate::repositories::submissions::find_by_id(ctx.state.db(), submission_id)
        .await
        .expect("lookup submission")
        .expect("submission stored");
    assert_eq!(
        stored.identity(),
        SubmissionIdentity::Anonymous {
            name: "Guest Taker".to_string(),
            email: "guest@example.com".to_string(),
        }
    );

    let (status, all) =
        send(&ctx, Method::GET, "/api/v1/exams/admin/submissions", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK, "response: {all}");
    assert_eq!(all[0]["submitter"]["kind"], "anonymous");
    assert_eq!(all[0]["submitter"]["email"], "guest@example.com");
}

#[tokio::test]
async fn private_link_can_require_sign_in() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let learner =
        test_support::insert_user(ctx.state.db(), "newcomer", UserRole::User, "user-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());
    let learner_token = test_support::session_token(&learner.id, ctx.state.settings());

    let exam = create_exam(&ctx, &admin_token, false).await;
    let exam_id = exam["id"].as_str().expect("exam id").to_string();

    let (status, link) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/generate-link"),
        Some(&admin_token),
        Some(json!({"allow_anonymous": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {link}");
    let token = link["access_token"].as_str().expect("token").to_string();

    let submit_uri = format!("/api/v1/exams/public/{token}/submit");
    let answers =
        json!({"answers": [0, 0, 1, 0], "userName": "Guest", "userEmail": "g@example.com"});

    let (status, _) = send(&ctx, Method::POST, &submit_uri, None, Some(answers.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, result) =
        send(&ctx, Method::POST, &submit_uri, Some(&learner_token), Some(answers)).await;
    assert_eq!(status, StatusCode::CREATED, "response: {result}");
    assert_eq!(result["score"], 4);

    let (status, all) =
        send(&ctx, Method::GET, "/api/v1/exams/admin/submissions", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK, "response: {all}");
    assert_eq!(all[0]["submitter"]["user_id"], learner.id.as_str());
}

#[tokio::test]
async fn unknown_or_malformed_links_are_not_found() {
    let ctx = test_support::setup_test_context().await;

    let (status, _) =
        send(&ctx, Method::GET, "/api/v1/exams/public/not-a-token", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let unknown = "ab".repeat(32);
    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/v1/exams/public/{unknown}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_exam_removes_its_submissions() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let student =
        test_support::insert_user(ctx.state.db(), "omar", UserRole::Student, "student-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());
    let student_token = test_support::session_token(&student.id, ctx.state.settings());

    let exam = create_exam(&ctx, &admin_token, true).await;
    let exam_id = exam["id"].as_str().expect("exam id").to_string();

    let (status, result) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/submit"),
        Some(&student_token),
        Some(json!({"answers": [0, null, null, null]})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {result}");
    let submission_id = result["submission_id"].as_str().expect("submission id").to_string();

    let (status, _) = send(
        &ctx,
        Method::DELETE,
        &format!("/api/v1/exams/{exam_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let stored = crate::repositories::submissions::find_by_id(ctx.state.db(), &submission_id)
        .await
        .expect("lookup submission");
    assert!(stored.is_none());

    let (status, _) = send(
        &ctx,
        Method::DELETE,
        &format!("/api/v1/exams/{exam_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn mistyped_toggle_bodies_are_rejected() {
    let ctx = test_support::setup_test_context().await;

    let admin =
        test_support::insert_user(ctx.state.db(), "root", UserRole::Admin, "admin-pass").await;
    let admin_token = test_support::session_token(&admin.id, ctx.state.settings());
    let exam = create_exam(&ctx, &admin_token, false).await;
    let exam_id = exam["id"].as_str().expect("exam id").to_string();

    let (status, body) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/generate-link"),
        Some(&admin_token),
        Some(json!({"allow_anonymous": "false"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, body) = send(
        &ctx,
        Method::PATCH,
        &format!("/api/v1/exams/{exam_id}/publish"),
        Some(&admin_token),
        Some(json!({"is_published": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");

    let (status, stored) = send(
        &ctx,
        Method::GET,
        &format!("/api/v1/exams/admin/{exam_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {stored}");
    assert_eq!(stored["is_published"], false);
    assert_eq!(stored["is_private"], false);

    let (status, link) = send(
        &ctx,
        Method::POST,
        &format!("/api/v1/exams/{exam_id}/generate-link"),
        Some(&admin_token),
        Some(json!({"allow_anonymous": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {link}");
    assert_eq!(link["allow_anonymous"], false);
}
