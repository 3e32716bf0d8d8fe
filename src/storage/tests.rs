//! Parameterized tests for file storage implementations.
//!
//! Every [`FileStorage`] implementation used under the caches must pass this
//! suite: the caches depend on list filtering, existence answers and
//! whole-file replacement behaving exactly as described here.

use super::{FileKey, FileStorage, StorageError};
use serde_json::json;

pub async fn test_file_storage<S>(storage: S)
where
    S: FileStorage<Error = StorageError>,
{
    test_set_and_get(&storage).await;
    test_get_missing(&storage).await;
    test_set_replaces(&storage).await;
    test_exists(&storage).await;
    test_delete(&storage).await;
    test_list_by_suffix(&storage).await;
    test_container_isolation(&storage).await;
}

async fn test_set_and_get<S>(storage: &S)
where
    S: FileStorage<Error = StorageError>,
{
    let key = FileKey::new("t1", "asset", "u1.user.config.json");
    let content = json!({"userName": "alice"});

    storage.set(&key, content.clone()).await.unwrap();
    assert_eq!(storage.get(&key).await.unwrap(), Some(content));
}

async fn test_get_missing<S>(storage: &S)
where
    S: FileStorage<Error = StorageError>,
{
    let key = FileKey::new("t1", "asset", "missing.user.config.json");
    assert!(storage.get(&key).await.unwrap().is_none());
}

async fn test_set_replaces<S>(storage: &S)
where
    S: FileStorage<Error = StorageError>,
{
    let key = FileKey::new("t1", "asset", "replace.json");
    storage
        .set(&key, json!({"a": 1, "b": 2}))
        .await
        .unwrap();
    storage.set(&key, json!({"a": 3})).await.unwrap();

    // Whole-file replacement, no merge
    assert_eq!(storage.get(&key).await.unwrap(), Some(json!({"a": 3})));
}

async fn test_exists<S>(storage: &S)
where
    S: FileStorage<Error = StorageError>,
{
    let key = FileKey::new("t1", "asset", "exists.json");
    assert_eq!(storage.exists(&key).await.unwrap(), Some(false));

    storage.set(&key, json!({})).await.unwrap();
    assert_eq!(storage.exists(&key).await.unwrap(), Some(true));
}

async fn test_delete<S>(storage: &S)
where
    S: FileStorage<Error = StorageError>,
{
    let key = FileKey::new("t1", "asset", "delete.json");
    storage.set(&key, json!({})).await.unwrap();

    storage.delete(&key).await.unwrap();
    assert!(storage.get(&key).await.unwrap().is_none());

    let err = storage.delete(&key).await.unwrap_err();
    assert!(matches!(err, StorageError::FileNotFound { .. }));
}

async fn test_list_by_suffix<S>(storage: &S)
where
    S: FileStorage<Error = StorageError>,
{
    for name in ["b.user.config.json", "a.user.config.json", "p1.plant.config.json"] {
        storage
            .set(&FileKey::new("t2", "asset", name), json!({}))
            .await
            .unwrap();
    }

    let users = storage
        .list_file_names("t2", "asset", ".user.config.json")
        .await
        .unwrap();
    assert_eq!(users, vec!["a.user.config.json", "b.user.config.json"]);

    let plants = storage
        .list_file_names("t2", "asset", ".plant.config.json")
        .await
        .unwrap();
    assert_eq!(plants, vec!["p1.plant.config.json"]);

    let none = storage
        .list_file_names("t2", "other-asset", ".user.config.json")
        .await
        .unwrap();
    assert!(none.is_empty());
}

async fn test_container_isolation<S>(storage: &S)
where
    S: FileStorage<Error = StorageError>,
{
    let first = FileKey::new("t3", "asset-a", "same.json");
    let second = FileKey::new("t3", "asset-b", "same.json");

    storage.set(&first, json!({"owner": "a"})).await.unwrap();
    storage.set(&second, json!({"owner": "b"})).await.unwrap();

    assert_eq!(
        storage.get(&first).await.unwrap(),
        Some(json!({"owner": "a"}))
    );
    assert_eq!(
        storage.get(&second).await.unwrap(),
        Some(json!({"owner": "b"}))
    );
}
