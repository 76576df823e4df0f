mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{error_field, TestServer};

#[tokio::test]
async fn users_lists_every_user() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get("/users").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let users = res.json::<Vec<Value>>().await?;
    assert_eq!(users.len(), 3);

    let admin = users
        .iter()
        .find(|u| u["id"] == json!(server.admin.id))
        .expect("admin missing from /users");
    assert_eq!(admin["role"], "admin");
    assert_eq!(admin["email"], "root@example.com");
    Ok(())
}

#[tokio::test]
async fn user_by_id() -> Result<()> {
    let server = TestServer::spawn().await?;

    let res = server.get(&format!("/users/{}", server.bob.id)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let bob = res.json::<Value>().await?;
    assert_eq!(bob["user_name"], "bob");
    assert_eq!(bob["role"], "user");
    Ok(())
}

#[tokio::test]
async fn unknown_user_is_not_found() -> Result<()> {
    let server = TestServer::spawn().await?;

    for id in [uuid::Uuid::new_v4().to_string(), "nobody".to_string()] {
        let res = server.get(&format!("/users/{}", id)).send().await?;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = res.json::<Value>().await?;
        assert_eq!(error_field(&body, "code"), "NOT_FOUND");
    }
    Ok(())
}
