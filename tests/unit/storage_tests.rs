/*!
 * Tests for the binary object stores
 */

use bytes::Bytes;
use tempfile::TempDir;

use inscriptor::storage::{BlobStore, FileSystemBlobStore, MemoryBlobStore, ScopedKey};

#[tokio::test]
async fn test_fileSystemStore_withBaseUrl_shouldReturnPublicReference() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path(), "https://cdn.example.com/objects/");
    let key = ScopedKey::generate("U1", "mp3");

    let reference = store.put(&key, Bytes::from_static(b"ID3"), "audio/mpeg").await.unwrap();

    assert_eq!(reference, format!("https://cdn.example.com/objects/{}", key));
    assert_eq!(store.get(&reference).await.unwrap(), Bytes::from_static(b"ID3"));
    assert!(dir.path().join(key.as_str()).exists());
}

#[tokio::test]
async fn test_fileSystemStore_shouldLeaveNoStagingFiles() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path(), "");
    let key = ScopedKey::generate("U1", "png");

    store.put(&key, Bytes::from_static(b"image"), "image/png").await.unwrap();

    let owner_dir = dir.path().join("U1");
    let names: Vec<String> = std::fs::read_dir(&owner_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".png"));
}

#[tokio::test]
async fn test_fileSystemStore_withMissingObject_shouldFail() {
    let dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(dir.path(), "");

    assert!(store.get("U1/never-written.png").await.is_err());
}

#[tokio::test]
async fn test_memoryStore_shouldKeepOwnersApart() {
    let store = MemoryBlobStore::new();

    let mine = store
        .put(&ScopedKey::generate("U1", "png"), Bytes::from_static(b"a"), "image/png")
        .await
        .unwrap();
    let theirs = store
        .put(&ScopedKey::generate("U2", "png"), Bytes::from_static(b"b"), "image/png")
        .await
        .unwrap();

    assert_ne!(mine, theirs);
    assert_eq!(store.len(), 2);
    assert!(store.keys().iter().any(|k| k.starts_with("U1/")));
    assert!(store.keys().iter().any(|k| k.starts_with("U2/")));
}

#[test]
fn test_scopedKey_shouldFollowOwnerMillisUuidLayout() {
    let key = ScopedKey::generate("user-42", ".WAV");

    let (owner, file) = key.as_str().split_once('/').unwrap();
    let (stem, extension) = file.rsplit_once('.').unwrap();
    let (millis, uuid) = stem.split_once('-').unwrap();

    assert_eq!(owner, "user-42");
    assert_eq!(key.owner(), "user-42");
    assert_eq!(extension, "wav");
    assert!(millis.parse::<i64>().unwrap() > 0);
    assert!(uuid::Uuid::parse_str(uuid).is_ok());
}
