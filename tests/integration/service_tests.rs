/*!
 * Tests for the upload, history and language operations of the service API
 */

use bytes::Bytes;
use inscriptor::errors::{ErrorKind, PipelineError};
use inscriptor::app_config::Config;
use inscriptor::registry::Credentials;
use inscriptor::service::{MAX_UPLOAD_BYTES, PipelineService};
use tempfile::TempDir;

use crate::common::*;

#[tokio::test]
async fn test_registerUpload_withImage_shouldStoreObjectUnderOwner() {
    let harness = Harness::new(happy_chains());

    let upload = harness
        .service
        .register_upload(OWNER, "photos/temple wall.JPG", sample_image())
        .await
        .unwrap();

    assert_eq!(upload.owner, OWNER);
    assert_eq!(upload.filename, "temple wall.JPG");
    assert!(upload.storage_reference.starts_with("memory://U1/"));
    assert!(upload.storage_reference.ends_with(".jpg"));
    assert_eq!(harness.blobs.len(), 1);
    assert_eq!(harness.records.writes(), 1);
}

#[tokio::test]
async fn test_registerUpload_withSameFilenameTwice_shouldNotCollide() {
    let harness = Harness::new(happy_chains());

    let first = harness.service.register_upload(OWNER, "stone.png", sample_image()).await.unwrap();
    let second = harness.service.register_upload(OWNER, "stone.png", sample_image()).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_ne!(first.storage_reference, second.storage_reference);
    assert_eq!(harness.blobs.len(), 2);
}

#[tokio::test]
async fn test_registerUpload_withNonImage_shouldBeInvalidInput() {
    let harness = Harness::new(happy_chains());

    let error = harness
        .service
        .register_upload(OWNER, "notes.txt", Bytes::from_static(b"hello"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidInput);
    assert_eq!(harness.blobs.len(), 0);
    assert_eq!(harness.records.writes(), 0);
}

#[tokio::test]
async fn test_registerUpload_withEmptyOrOversizedImage_shouldBeInvalidInput() {
    let harness = Harness::new(happy_chains());

    let empty = harness.service.register_upload(OWNER, "stone.png", Bytes::new()).await.unwrap_err();
    let oversized = Bytes::from(vec![0u8; MAX_UPLOAD_BYTES + 1]);
    let too_big = harness.service.register_upload(OWNER, "stone.png", oversized).await.unwrap_err();

    assert_eq!(empty.kind(), ErrorKind::InvalidInput);
    assert_eq!(too_big.kind(), ErrorKind::InvalidInput);
    assert_eq!(harness.blobs.len(), 0);
}

#[tokio::test]
async fn test_registerUpload_withBlankUser_shouldBeUnauthorized() {
    let harness = Harness::new(happy_chains());

    let error = harness.service.register_upload("", "stone.png", sample_image()).await.unwrap_err();

    assert!(matches!(error, PipelineError::Unauthorized(_)));
    assert_eq!(harness.blobs.len(), 0);
}

#[tokio::test]
async fn test_registerUpload_withMalformedUser_shouldStoreNothing() {
    let harness = Harness::new(happy_chains());

    let error = harness
        .service
        .register_upload("../U1", "stone.png", sample_image())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Unauthorized);
    assert_eq!(harness.blobs.len(), 0);
}

#[tokio::test]
async fn test_registerUpload_withRecordStoreDown_shouldFailAndKeepNoRecord() {
    let harness = Harness::new(happy_chains());
    harness.records.reject_writes();

    let error = harness
        .service
        .register_upload(OWNER, "stone.png", sample_image())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::StorageError);
    // the object was written before the insert failed and is left behind
    assert_eq!(harness.blobs.len(), 1);
    assert!(harness.service.history(OWNER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_shouldListNewestFirstWithUpload() {
    let harness = Harness::new(happy_chains());
    let upload_id = harness.upload(OWNER).await;

    let older = harness.service.process(OWNER, &upload_id, "es").await.unwrap();
    let newer = harness.service.process(OWNER, &upload_id, "hi").await.unwrap();

    let history = harness.service.history(OWNER).await.unwrap();

    assert_eq!(history.len(), 2);
    assert_eq!(history[0].translation.id, newer.id);
    assert_eq!(history[1].translation.id, older.id);
    let upload = history[0].upload.as_ref().unwrap();
    assert_eq!(upload.id, upload_id);
    assert_eq!(upload.filename, "stone.png");
}

#[tokio::test]
async fn test_history_shouldOnlyShowOwnRecords() {
    let harness = Harness::new(happy_chains());
    let mine = harness.upload(OWNER).await;
    let theirs = harness.upload(OTHER_OWNER).await;
    harness.service.process(OWNER, &mine, "es").await.unwrap();
    harness.service.process(OTHER_OWNER, &theirs, "fr").await.unwrap();

    let history = harness.service.history(OWNER).await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].translation.owner, OWNER);
    assert_eq!(history[0].translation.target_language, "es");
}

#[tokio::test]
async fn test_process_withAnotherOwnersUpload_shouldBeNotFound() {
    let harness = Harness::new(happy_chains());
    let theirs = harness.upload(OTHER_OWNER).await;

    let failure = harness.service.process(OWNER, &theirs, "es").await.unwrap_err();

    assert_eq!(failure.kind(), ErrorKind::NotFound);
    assert!(harness.service.history(OWNER).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_history_withBlankUser_shouldBeUnauthorized() {
    let harness = Harness::new(happy_chains());

    let error = harness.service.history(" ").await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_supportedLanguages_shouldMatchMenu() {
    let harness = Harness::new(happy_chains());

    let codes: Vec<&str> = harness.service.supported_languages().iter().map(|l| l.code).collect();

    assert_eq!(codes, vec!["en", "es", "fr", "de", "hi", "zh", "ar", "ja"]);
}

#[tokio::test]
async fn test_fromConfig_shouldOpenConfiguredDatabaseAndStorage() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.database_path = Some(dir.path().join("db").join("inscriptor.db"));
    config.storage_dir = dir.path().join("objects");

    let service = PipelineService::from_config(&config, &Credentials::default()).unwrap();
    let upload = service.register_upload(OWNER, "stone.png", sample_image()).await.unwrap();

    assert!(dir.path().join("db").join("inscriptor.db").exists());
    assert!(dir.path().join("objects").join(&upload.storage_reference).exists());
}
