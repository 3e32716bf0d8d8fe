//! End-to-end scenarios across several applications sharing collaborators.

mod common;

use app_tenancy::directory::DirectoryUser;
use app_tenancy::model::{AppStorageRecord, PlantStorageRecord, Role};
use app_tenancy::{TenantAppConfig, TenantApplication};
use common::*;
use futures::future::join_all;
use serde_json::json;
use std::sync::Arc;

/// Subtenant app for `subtenant2`; user A belongs to the subtenant and has a
/// storage record, user B only exists in the parent tenant.
async fn subtenant_scenario() -> Fixture {
    let fx = Fixture::new(Some(SUBTENANT)).await;
    fx.directory
        .insert_user(
            TENANT,
            DirectoryUser::new("id-a", "A").with_subtenant(SUBTENANT),
        )
        .await;
    fx.directory
        .insert_user(TENANT, DirectoryUser::new("id-b", "B"))
        .await;
    seed_user_file(&fx.storage, "id-a", &record("A", Role::LocalUser)).await;
    fx
}

#[tokio::test]
async fn test_user_existence_across_tenant_and_storage() {
    let mut fx = subtenant_scenario().await;
    fx.app.initialize().await.unwrap();

    assert!(fx.app.user_exists_in_tenant("A").await.unwrap());
    assert!(fx.app.user_exists_in_tenant_and_storage("A").await.unwrap());

    // B is in the parent tenant but has no storage record
    assert!(fx.app.user_exists_in_tenant("B").await.unwrap());
    assert!(!fx.app.user_exists_in_tenant_and_storage("B").await.unwrap());

    assert!(fx.app.user_exists_in_storage("A").await.unwrap());
    assert!(!fx.app.user_exists_in_storage("B").await.unwrap());
    assert_eq!(
        fx.app.get_user_id_if_exists("A").await.unwrap(),
        Some("id-a".to_string())
    );
    assert_eq!(fx.app.get_user_id_if_exists("B").await.unwrap(), None);
}

#[tokio::test]
async fn test_full_user_lifecycle() {
    let mut fx = subtenant_scenario().await;
    fx.app.initialize().await.unwrap();
    assert!(fx.app.user_cache().has("id-a"));

    let created = fx
        .app
        .create_user(rich_record("C", Role::LocalUser))
        .await
        .unwrap();
    let id_c = created.directory.id.clone();
    assert!(fx.app.user_exists_in_tenant_and_storage("C").await.unwrap());

    let updated = fx
        .app
        .update_user(&id_c, rich_record("C", Role::LocalAdmin))
        .await
        .unwrap();
    assert_eq!(updated.storage.role(), Role::LocalAdmin);
    assert!(updated.directory.is_member_of(LOCAL_ADMIN));
    assert!(!updated.directory.is_member_of(LOCAL_USER));

    let all: Vec<String> = fx
        .app
        .get_all_users()
        .await
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert!(all.contains(&id_c));
    assert!(all.contains(&"id-a".to_string()));

    fx.app.delete_user(&id_c).await.unwrap();
    assert!(!fx.app.user_exists_in_tenant("C").await.unwrap());
    assert!(!fx.app.user_exists_in_storage("C").await.unwrap());
}

#[tokio::test]
async fn test_independent_apps_share_collaborators() {
    let fx = Fixture::new(None).await;
    let tenant_app = fx.sibling_app(None);
    let subtenant_app = fx.sibling_app(Some(SUBTENANT));

    let mut apps = join_all([tenant_app, subtenant_app].into_iter().map(|mut app| async move {
        app.initialize().await.map(|_| app)
    }))
    .await
    .into_iter()
    .collect::<Result<Vec<_>, _>>()
    .unwrap();

    let mut subtenant_app = apps.pop().unwrap();
    let mut tenant_app = apps.pop().unwrap();

    let user = subtenant_app
        .create_user(record("D", Role::LocalUser))
        .await
        .unwrap();

    // Same container: the other instance finds the record on a cache miss
    assert!(!tenant_app.user_cache().has(&user.directory.id));
    assert!(
        tenant_app
            .user_assigned_to_app(&user.directory.id)
            .await
            .unwrap()
    );
    assert!(tenant_app.user_cache().has(&user.directory.id));
}

#[tokio::test]
async fn test_plants_and_app_config() {
    let mut fx = Fixture::initialized(None).await;
    fx.app
        .set_app_config(AppStorageRecord {
            data: json!({"title": "Energy monitor"}),
            config: json!({"maxNumberOfUsers": null}),
        })
        .await
        .unwrap();
    assert_eq!(fx.app.get_max_number_of_users().await.unwrap(), None);

    for id in ["p1", "p2"] {
        fx.app
            .set_plant(
                id,
                PlantStorageRecord {
                    data: json!({"name": id}),
                    config: json!({}),
                },
            )
            .await
            .unwrap();
    }

    // A fresh instance warms its caches from storage
    let mut other = fx.sibling_app(None);
    other.initialize().await.unwrap();
    let plants: Vec<String> = other
        .get_all_plants()
        .await
        .unwrap()
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(plants, vec!["p1", "p2"]);
    assert_eq!(
        other.get_app_config().await.unwrap().data["title"],
        "Energy monitor"
    );
}

#[test]
fn test_app_from_json_config() {
    tokio_test::block_on(async {
        init_logging();
        let config = TenantAppConfig::from_json_str(&format!(
            r#"{{
                "identity": {{
                    "storageTenant": "{}", "appId": "{}", "assetId": "{}",
                    "appTenant": "{}", "subtenantId": "{}"
                }},
                "groups": {{
                    "globalAdmin": "{}", "globalUser": "{}",
                    "localAdmin": "{}", "localUser": "{}",
                    "standardUser": "{}", "subtenantUser": "{}"
                }}
            }}"#,
            STORAGE_TENANT,
            APP_ID,
            ASSET_ID,
            TENANT,
            SUBTENANT,
            GLOBAL_ADMIN,
            GLOBAL_USER,
            LOCAL_ADMIN,
            LOCAL_USER,
            STANDARD_USER,
            SUBTENANT_USER
        ))
        .unwrap();

        let fx = subtenant_scenario().await;
        let mut app = TenantApplication::from_config(
            config,
            Arc::new(fx.storage.clone()),
            Arc::new(fx.directory.clone()),
        );
        app.initialize().await.unwrap();

        assert!(app.is_subtenant_app());
        assert!(app.user_exists_in_tenant_and_storage("A").await.unwrap());
    });
}
