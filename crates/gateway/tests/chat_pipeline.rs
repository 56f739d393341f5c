//! Integration tests for the chat pipeline and its API surface — full
//! round-trips over an in-memory platform fake and a scripted completion
//! provider. All tests are pure and deterministic.

mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use mn_domain::config::Config;
use mn_domain::error::Error;
use mn_domain::model::{Role, Visibility};
use mn_providers::scripted::ScriptedProvider;
use mn_providers::CompletionProvider;

use mn_gateway::api;
use mn_gateway::api::auth::AuthedUser;
use mn_gateway::pipeline::{self, ChatInput};
use mn_gateway::state::AppState;

use support::{make_agent, MemoryStore};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn test_state(store: Arc<MemoryStore>, llm: Arc<dyn CompletionProvider>) -> AppState {
    AppState {
        config: Arc::new(Config::default()),
        store,
        llm,
    }
}

fn user(id: &str) -> AuthedUser {
    AuthedUser {
        user_id: id.to_owned(),
    }
}

fn chat_input(agent_id: &str, message: &str, session_id: Option<&str>) -> ChatInput {
    ChatInput {
        agent_id: agent_id.to_owned(),
        message: message.to_owned(),
        session_id: session_id.map(ToOwned::to_owned),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scenario A: public agent, fresh session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn public_agent_fresh_session_replies_and_records() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let llm = Arc::new(ScriptedProvider::with_replies(["The answer is 4."]));
    let state = test_state(store.clone(), llm);

    let outcome = pipeline::run_chat(&state, &user("alice"), chat_input("a1", "What is 2+2?", None))
        .await
        .unwrap();

    assert_eq!(outcome.response, "The answer is 4.");
    assert_eq!(outcome.agent_name, "a1-name");
    assert!(!outcome.session_id.is_empty());

    // One user turn, one assistant turn, usage counter bumped exactly once.
    let rows = store.interactions();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].role, Role::User);
    assert_eq!(rows[0].content, "What is 2+2?");
    assert_eq!(rows[1].role, Role::Assistant);
    assert_eq!(rows[1].content, "The answer is 4.");
    assert_eq!(rows[1].session_id, outcome.session_id);
    assert!(rows[1].response_time.is_some());
    assert_eq!(store.usage_count("a1"), 1);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scenario D: session reuse appends history
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn session_reuse_appends_history() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let llm = Arc::new(ScriptedProvider::with_replies(["4.", "Still 4."]));
    let state = test_state(store.clone(), llm.clone());

    let first = pipeline::run_chat(&state, &user("alice"), chat_input("a1", "What is 2+2?", None))
        .await
        .unwrap();

    let second = pipeline::run_chat(
        &state,
        &user("alice"),
        chat_input("a1", "Are you sure?", Some(&first.session_id)),
    )
    .await
    .unwrap();

    assert_eq!(second.session_id, first.session_id);

    // The second prompt carries exactly the first call's pair as history.
    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Conversation history:\nuser: What is 2+2?\nassistant: 4."));
    // Exactly one prior pair — no earlier turns, no duplicates.
    assert_eq!(prompts[1].matches("\nuser: ").count(), 1);

    // Appended, never overwritten: all four turns are on the session.
    let rows = store.interactions();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.session_id == first.session_id));
    assert_eq!(store.usage_count("a1"), 2);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scenario B & visibility policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn private_agent_denies_non_creator_even_with_shared_organization() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Private, "alice", Some("org-1")));
    store.add_membership("bob", "org-1");
    let state = test_state(store.clone(), Arc::new(ScriptedProvider::new()));

    // Creator succeeds.
    pipeline::run_chat(&state, &user("alice"), chat_input("a1", "hello", None))
        .await
        .unwrap();

    // Non-creator is denied despite membership in the owning organization.
    let err = pipeline::run_chat(&state, &user("bob"), chat_input("a1", "hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));

    // The denied attempt left no rows behind.
    assert_eq!(store.interactions().len(), 2);
    assert_eq!(store.usage_count("a1"), 1);
}

#[tokio::test]
async fn organization_agent_allows_members_only() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Organization, "alice", Some("org-1")));
    store.add_membership("member", "org-1");
    store.add_membership("outsider", "org-2");
    let state = test_state(store.clone(), Arc::new(ScriptedProvider::new()));

    pipeline::run_chat(&state, &user("member"), chat_input("a1", "hello", None))
        .await
        .unwrap();

    let err = pipeline::run_chat(&state, &user("outsider"), chat_input("a1", "hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
}

#[tokio::test]
async fn organization_agent_without_owner_fails_closed() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Organization, "alice", None));
    store.add_membership("member", "org-1");
    let state = test_state(store.clone(), Arc::new(ScriptedProvider::new()));

    let err = pipeline::run_chat(&state, &user("member"), chat_input("a1", "hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PermissionDenied(_)));
    assert!(store.interactions().is_empty());
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scenario C: attached files
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn attached_files_appear_in_order_before_the_message() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = make_agent("a1", Visibility::Public, "creator", None);
    agent.file_contexts = vec!["f1".into(), "f2".into()];
    store.add_agent(agent);
    store.add_file("f1", "alpha.txt", "Alpha");
    store.add_file("f2", "beta.txt", "Beta");
    let llm = Arc::new(ScriptedProvider::new());
    let state = test_state(store, llm.clone());

    pipeline::run_chat(&state, &user("alice"), chat_input("a1", "Summarize.", None))
        .await
        .unwrap();

    let prompt = llm.prompts().pop().unwrap();
    let alpha = prompt.find("File: alpha.txt\nContent: Alpha").unwrap();
    let beta = prompt.find("File: beta.txt\nContent: Beta").unwrap();
    let message = prompt.find("Summarize.").unwrap();
    assert!(alpha < beta);
    assert!(beta < message);
}

#[tokio::test]
async fn failed_file_fetch_degrades_to_no_file_section() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = make_agent("a1", Visibility::Public, "creator", None);
    agent.file_contexts = vec!["f1".into()];
    store.add_agent(agent);
    store.add_file("f1", "alpha.txt", "Alpha");
    store.fail_file_fetches();
    let llm = Arc::new(ScriptedProvider::new());
    let state = test_state(store, llm.clone());

    // The turn still succeeds; the section is simply absent.
    pipeline::run_chat(&state, &user("alice"), chat_input("a1", "Summarize.", None))
        .await
        .unwrap();
    assert!(!llm.prompts().pop().unwrap().contains("File: alpha.txt"));
}

#[tokio::test]
async fn failed_history_fetch_degrades_to_no_history_section() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let llm = Arc::new(ScriptedProvider::new());
    let state = test_state(store.clone(), llm.clone());

    let first = pipeline::run_chat(&state, &user("alice"), chat_input("a1", "hello", None))
        .await
        .unwrap();

    store.fail_history_fetches();
    pipeline::run_chat(
        &state,
        &user("alice"),
        chat_input("a1", "again", Some(&first.session_id)),
    )
    .await
    .unwrap();

    assert!(!llm.prompts().pop().unwrap().contains("Conversation history"));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Prompt layout
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn instructions_lead_and_template_folds_the_message() {
    let store = Arc::new(MemoryStore::new());
    let mut agent = make_agent("a1", Visibility::Public, "creator", None);
    agent.system_instructions = "You are a strict math tutor.".into();
    agent.prompt_template = "Student asks: {message}".into();
    store.add_agent(agent);
    let llm = Arc::new(ScriptedProvider::new());
    let state = test_state(store, llm.clone());

    pipeline::run_chat(&state, &user("alice"), chat_input("a1", "What is 2+2?", None))
        .await
        .unwrap();

    let prompt = llm.prompts().pop().unwrap();
    assert!(prompt.starts_with("You are a strict math tutor."));
    assert!(prompt.ends_with("Student asks: What is 2+2?"));
}

#[tokio::test]
async fn empty_instructions_fall_back_to_default() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let llm = Arc::new(ScriptedProvider::new());
    let state = test_state(store, llm.clone());

    pipeline::run_chat(&state, &user("alice"), chat_input("a1", "hi", None))
        .await
        .unwrap();

    let prompt = llm.prompts().pop().unwrap();
    assert!(prompt.starts_with(&Config::default().chat.default_instructions));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Failure modes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn provider_failure_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let state = test_state(store.clone(), Arc::new(ScriptedProvider::unavailable()));

    let err = pipeline::run_chat(&state, &user("alice"), chat_input("a1", "hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upstream { .. }));

    assert!(store.interactions().is_empty());
    assert_eq!(store.usage_count("a1"), 0);
}

#[tokio::test]
async fn blank_arguments_are_rejected_before_any_lookup() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let state = test_state(store.clone(), Arc::new(ScriptedProvider::new()));

    let err = pipeline::run_chat(&state, &user("alice"), chat_input("  ", "hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = pipeline::run_chat(&state, &user("alice"), chat_input("a1", "   ", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    assert!(store.interactions().is_empty());
}

#[tokio::test]
async fn unknown_agent_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let state = test_state(store, Arc::new(ScriptedProvider::new()));

    let err = pipeline::run_chat(&state, &user("alice"), chat_input("ghost", "hello", None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP surface
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn test_app(state: AppState) -> axum::Router {
    api::router(state.clone()).with_state(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_bearer_is_unauthenticated_and_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let app = test_app(test_state(store.clone(), Arc::new(ScriptedProvider::new())));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({ "agentId": "a1", "message": "hi" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    assert!(store.interactions().is_empty());
}

#[tokio::test]
async fn chat_round_trip_over_http() {
    let store = Arc::new(MemoryStore::new());
    store.add_token("tok-alice", "alice");
    store.add_agent(make_agent("a1", Visibility::Public, "creator", None));
    let llm = Arc::new(ScriptedProvider::with_replies(["The answer is 4."]));
    let app = test_app(test_state(store.clone(), llm));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/chat")
                .header("content-type", "application/json")
                .header("authorization", "Bearer tok-alice")
                .body(Body::from(
                    serde_json::json!({ "agentId": "a1", "message": "What is 2+2?" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["response"], "The answer is 4.");
    assert_eq!(body["data"]["agentName"], "a1-name");
    assert!(body["data"]["sessionId"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(body["data"]["responseTime"].is_number());
}

#[tokio::test]
async fn healthz_is_public() {
    let store = Arc::new(MemoryStore::new());
    let app = test_app(test_state(store, Arc::new(ScriptedProvider::new())));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn agent_management_round_trip() {
    let store = Arc::new(MemoryStore::new());
    store.add_token("tok-alice", "alice");
    store.add_token("tok-bob", "bob");
    let app = test_app(test_state(store.clone(), Arc::new(ScriptedProvider::new())));

    // Create (defaults to private).
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/agents")
                .header("content-type", "application/json")
                .header("authorization", "Bearer tok-alice")
                .body(Body::from(
                    serde_json::json!({ "name": "Essay Coach", "category": "writing" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let agent_id = created["data"]["agent"]["id"].as_str().unwrap().to_owned();
    assert_eq!(created["data"]["agent"]["visibility"], "private");
    assert_eq!(created["data"]["agent"]["creator_id"], "alice");

    // The creator sees it in their listing…
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/agents")
                .header("authorization", "Bearer tok-alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed["data"]["agents"].as_array().unwrap().len(), 1);

    // …but another user does not.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1/agents")
                .header("authorization", "Bearer tok-bob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert!(listed["data"]["agents"].as_array().unwrap().is_empty());

    // Detail is gated by the same policy.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/v1/agents/{agent_id}"))
                .header("authorization", "Bearer tok-bob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Only the creator may edit.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/v1/agents/{agent_id}"))
                .header("content-type", "application/json")
                .header("authorization", "Bearer tok-bob")
                .body(Body::from(
                    serde_json::json!({ "name": "Hijacked" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/v1/agents/{agent_id}"))
                .header("content-type", "application/json")
                .header("authorization", "Bearer tok-alice")
                .body(Body::from(
                    serde_json::json!({ "visibility": "public", "description": "Grades essays" })
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["data"]["agent"]["visibility"], "public");

    // Now bob can see it.
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(format!("/v1/agents/{agent_id}"))
                .header("authorization", "Bearer tok-bob")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
