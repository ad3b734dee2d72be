use crate::common::{client, relay_for, spawn_mock_backend, spawn_relay, unreachable_url};
use serde_json::{json, Value};
use storefront_relay::config::{AdminDeletePolicy, RelayConfig};

fn cloudinary_config(backend_url: &str, provider_url: &str) -> RelayConfig {
    let mut cfg = RelayConfig::new(backend_url);
    cfg.asset_host.backend = "cloudinary".to_string();
    cfg.asset_host.cloudinary_cloud_name = Some("demo".to_string());
    cfg.asset_host.cloudinary_api_key = Some("key123".to_string());
    cfg.asset_host.cloudinary_api_secret = Some("secret456".to_string());
    cfg.asset_host.cloudinary_api_base_url = provider_url.to_string();
    cfg
}

#[tokio::test]
async fn test_admin_delete_through_provider() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let provider = spawn_mock_backend(200, json!({ "result": "ok" })).await;
    let relay = spawn_relay(cloudinary_config(&backend.url, &provider.url)).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/products/shoe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let v: Value = resp.json().await.unwrap();
    assert_eq!(
        v,
        json!({ "success": true, "message": "Image deleted successfully", "publicId": "products/shoe" })
    );

    let hit = provider.only_hit();
    assert_eq!(hit.method, "POST");
    assert_eq!(hit.path, "/v1_1/demo/image/destroy");
    let form = String::from_utf8_lossy(&hit.body).to_string();
    assert!(form.contains("public_id=products%2Fshoe"));
    assert!(form.contains("api_key=key123"));
    assert!(form.contains("signature_algorithm=sha256"));
    assert!(form.contains("signature="));
    assert!(!form.contains("secret456"));

    assert!(backend.hits().is_empty());
}

#[tokio::test]
async fn test_admin_delete_provider_not_found_is_failure() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let provider = spawn_mock_backend(200, json!({ "result": "not found" })).await;
    let relay = spawn_relay(cloudinary_config(&backend.url, &provider.url)).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/missing"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let v: Value = resp.json().await.unwrap();
    assert_eq!(v["success"], false);
    assert_eq!(v["message"], "Failed to delete image");
}

#[tokio::test]
async fn test_admin_delete_provider_unreachable() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let relay = spawn_relay(cloudinary_config(&backend.url, &unreachable_url().await)).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/shoe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let v: Value = resp.json().await.unwrap();
    assert_eq!(v["success"], false);
}

#[tokio::test]
async fn test_admin_delete_without_asset_host() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let relay = relay_for(&backend.url).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/shoe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    assert!(backend.hits().is_empty());
}

#[tokio::test]
async fn test_admin_delete_honours_admin_token() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let provider = spawn_mock_backend(200, json!({ "result": "ok" })).await;
    let mut cfg = cloudinary_config(&backend.url, &provider.url);
    cfg.admin_token = Some("admin-secret".to_string());
    let relay = spawn_relay(cfg).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/shoe"))
        .bearer_auth("wrong")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(provider.hits().is_empty());

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/shoe"))
        .bearer_auth("admin-secret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(provider.hits().len(), 1);
}

#[tokio::test]
async fn test_admin_delete_backend_policy_forwards() {
    let backend = spawn_mock_backend(200, json!({ "success": true, "message": "gone" })).await;
    let provider = spawn_mock_backend(200, json!({ "result": "ok" })).await;
    let mut cfg = cloudinary_config(&backend.url, &provider.url);
    cfg.admin_delete_via = AdminDeletePolicy::Backend;
    let relay = spawn_relay(cfg).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/products/shoe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/products/shoe"))
        .bearer_auth("admin-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let v: Value = resp.json().await.unwrap();
    assert_eq!(v["message"], "gone");

    let hit = backend.only_hit();
    assert_eq!(hit.method, "DELETE");
    assert_eq!(hit.path, "/api/upload/products/shoe");
    assert_eq!(hit.header("authorization"), Some("Bearer admin-jwt"));
    assert!(provider.hits().is_empty());
}

#[tokio::test]
async fn test_user_delete_requires_token() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let relay = relay_for(&backend.url).await;

    let resp = client()
        .delete(format!("{relay}/api/uploads/shoe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(backend.hits().is_empty());
}

#[tokio::test]
async fn test_user_delete_passthrough() {
    let backend = spawn_mock_backend(403, json!({ "success": false, "message": "not your image" })).await;
    let relay = relay_for(&backend.url).await;

    let resp = client()
        .delete(format!("{relay}/api/uploads/users/7/avatar"))
        .bearer_auth("tok")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
    let v: Value = resp.json().await.unwrap();
    assert_eq!(v, json!({ "success": false, "message": "not your image" }));

    let hit = backend.only_hit();
    assert_eq!(hit.method, "DELETE");
    assert_eq!(hit.path, "/api/upload/users/7/avatar");
    assert_eq!(hit.header("authorization"), Some("Bearer tok"));
}

#[tokio::test]
async fn test_admin_delete_slash_only_id_is_rejected() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let provider = spawn_mock_backend(200, json!({ "result": "ok" })).await;
    let relay = spawn_relay(cloudinary_config(&backend.url, &provider.url)).await;

    for id in ["%2F", "%2F%2F", "%20"] {
        let resp = client()
            .delete(format!("{relay}/api/admin/assets/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "id {id}");
        let v: Value = resp.json().await.unwrap();
        assert_eq!(v, json!({ "success": false, "message": "Public ID is required" }));
    }
    assert!(provider.hits().is_empty());
    assert!(backend.hits().is_empty());
}

#[tokio::test]
async fn test_admin_delete_provider_rejection_carries_reason() {
    let backend = spawn_mock_backend(200, json!({})).await;
    let provider = spawn_mock_backend(
        401,
        json!({ "error": { "message": "Invalid Signature abc. String to sign - 'public_id=shoe'." } }),
    )
    .await;
    let relay = spawn_relay(cloudinary_config(&backend.url, &provider.url)).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/shoe"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let v: Value = resp.json().await.unwrap();
    assert_eq!(v["message"], "Failed to delete image");
    assert!(v["error"].as_str().unwrap().contains("Invalid Signature"));

    let form = String::from_utf8_lossy(&provider.only_hit().body).to_string();
    assert!(form.contains("signature_algorithm=sha256"));
}

#[tokio::test]
async fn test_admin_token_does_not_gate_backend_policy() {
    let backend = spawn_mock_backend(200, json!({ "success": true, "message": "gone" })).await;
    let mut cfg = RelayConfig::new(&backend.url);
    cfg.admin_delete_via = AdminDeletePolicy::Backend;
    cfg.admin_token = Some("admin-secret".to_string());
    let relay = spawn_relay(cfg).await;

    let resp = client()
        .delete(format!("{relay}/api/admin/assets/shoe"))
        .bearer_auth("caller-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let hit = backend.only_hit();
    assert_eq!(hit.path, "/api/upload/shoe");
    assert_eq!(hit.header("authorization"), Some("Bearer caller-jwt"));
}

#[tokio::test]
async fn test_user_delete_of_reserved_upload_names() {
    let backend = spawn_mock_backend(200, json!({ "success": true, "message": "gone" })).await;
    let relay = relay_for(&backend.url).await;

    for name in ["single", "multiple"] {
        let resp = client()
            .delete(format!("{relay}/api/uploads/{name}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);

        let resp = client()
            .delete(format!("{relay}/api/uploads/{name}"))
            .bearer_auth("tok")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    let hits = backend.hits();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].method, "DELETE");
    assert_eq!(hits[0].path, "/api/upload/single");
    assert_eq!(hits[1].path, "/api/upload/multiple");
    assert_eq!(hits[1].header("authorization"), Some("Bearer tok"));
}
