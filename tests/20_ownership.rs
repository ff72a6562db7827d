mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{test_config, TestServer};

#[tokio::test]
async fn owner_can_modify_own_todo() -> Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    let a = server.register("a@x.com", "pw123").await?;
    let token = server.token_for("a@x.com", "pw123").await?;
    let todo = server.create_todo(&token, "buy milk").await?;

    let res = server
        .client
        .put(server.url(&format!("/api/todos/{}", todo)))
        .bearer_auth(&token)
        .json(&json!({ "completed": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["completed"], true);
    assert_eq!(body["data"]["owner_id"], a.as_str());

    let res = server
        .client
        .delete(server.url(&format!("/api/todos/{}", todo)))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn foreign_todo_cannot_be_modified() -> Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    server.register("a@x.com", "pw123").await?;
    server.register("b@x.com", "pw456").await?;
    let a = server.token_for("a@x.com", "pw123").await?;
    let b = server.token_for("b@x.com", "pw456").await?;
    let todo = server.create_todo(&b, "b's todo").await?;
    let path = format!("/api/todos/{}", todo);

    let res = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&a)
        .json(&json!({ "title": "mine now" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.delete(server.url(&path)).bearer_auth(&a).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Untouched
    let res = server.client.get(server.url(&path)).bearer_auth(&b).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["title"], "b's todo");
    Ok(())
}

#[tokio::test]
async fn missing_todo_is_not_found_for_mutations() -> Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    server.register("a@x.com", "pw123").await?;
    let token = server.token_for("a@x.com", "pw123").await?;

    let res = server
        .client
        .delete(server.url("/api/todos/no-such-todo"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn listing_is_scoped_to_caller() -> Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    server.register("a@x.com", "pw123").await?;
    server.register("b@x.com", "pw456").await?;
    let a = server.token_for("a@x.com", "pw123").await?;
    let b = server.token_for("b@x.com", "pw456").await?;

    server.create_todo(&a, "one").await?;
    server.create_todo(&a, "two").await?;
    server.create_todo(&b, "three").await?;

    let res = server.client.get(server.url("/api/todos")).bearer_auth(&a).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let res = server.client.get(server.url("/api/todos/count")).bearer_auth(&b).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["count"], 1);
    Ok(())
}

#[tokio::test]
async fn empty_update_is_rejected() -> Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    server.register("a@x.com", "pw123").await?;
    let token = server.token_for("a@x.com", "pw123").await?;
    let todo = server.create_todo(&token, "buy milk").await?;

    let res = server
        .client
        .put(server.url(&format!("/api/todos/{}", todo)))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn deleting_an_account_removes_its_todos() -> Result<()> {
    let server = TestServer::spawn(test_config()).await?;
    let a = server.register("a@x.com", "pw123").await?;
    server.register("b@x.com", "pw456").await?;
    let a_token = server.token_for("a@x.com", "pw123").await?;
    let b_token = server.token_for("b@x.com", "pw456").await?;

    let a_todo = server.create_todo(&a_token, "one").await?;
    server.create_todo(&a_token, "two").await?;
    let b_todo = server.create_todo(&b_token, "three").await?;

    let res = server
        .client
        .delete(server.url(&format!("/api/user/{}", a)))
        .bearer_auth(&a_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["deleted_todos"], 2);

    let res = server
        .client
        .get(server.url(&format!("/api/todos/{}", a_todo)))
        .bearer_auth(&b_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .client
        .get(server.url(&format!("/api/todos/{}", b_todo)))
        .bearer_auth(&b_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // The stale token cannot recreate an orphaned todo
    let res = server
        .client
        .post(server.url("/api/todos"))
        .bearer_auth(&a_token)
        .json(&json!({ "title": "ghost" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn admin_can_view_any_users_todos() -> Result<()> {
    let server = TestServer::spawn_with_admin("root@x.com", "rootpw").await?;
    let a = server.register("a@x.com", "pw123").await?;
    server.register("b@x.com", "pw456").await?;
    let a_token = server.token_for("a@x.com", "pw123").await?;
    let b_token = server.token_for("b@x.com", "pw456").await?;
    let admin = server.token_for("root@x.com", "rootpw").await?;

    server.create_todo(&a_token, "one").await?;
    server.create_todo(&a_token, "two").await?;

    let res = server
        .client
        .get(server.url(&format!("/api/users/{}/todos", a)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["data"][0]["owner_id"], a.as_str());

    let res = server
        .client
        .get(server.url(&format!("/api/users/{}/todos/count", a)))
        .bearer_auth(&admin)
        .send()
        .await?;
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["count"], 2);

    // Regular users cannot browse other users' todos
    let res = server
        .client
        .get(server.url(&format!("/api/users/{}/todos", a)))
        .bearer_auth(&b_token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .get(server.url("/api/users/no-such-user/todos/count"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
