// tests/media_tests.rs
mod common;

use common::*;
use karat::media::{self, ImageLibrary, ImageUpload, UploadLimits};
use karat::store::JsonFileStore;
use karat::{KaratError, MediaHost, MemoryLocalStore};
use std::sync::Arc;

fn library() -> ImageLibrary {
  ImageLibrary::new(Arc::new(MemoryLocalStore::new()))
}

fn png(name: &str, len: usize) -> ImageUpload {
  ImageUpload::new(name, "image/png", vec![7u8; len])
}

#[tokio::test]
async fn test_successful_upload_is_prepended() {
  setup_tracing();
  let host = counting_host();
  let lib = library();
  let limits = UploadLimits::default();

  lib.upload(host.clone(), &limits, png(" Lotus ", 10)).await.unwrap();
  let second = lib.upload(host.clone(), &limits, png("Peacock", 10)).await.unwrap();

  assert_eq!(host.calls(), 2);
  let listed = lib.list().unwrap();
  assert_eq!(listed[0], second);
  assert_eq!(listed[1].name, "Lotus");
  assert_eq!(listed[1].public_id, "gold-catalog/Lotus");

  let sent = host.received.lock();
  assert_eq!(sent[0].public_id, "Lotus");
  assert_eq!(sent[0].folder, "gold-catalog");
}

#[tokio::test]
async fn test_rejections_never_reach_the_host() {
  let host = counting_host();
  let lib = library();
  let limits = UploadLimits::default();
  lib.upload(host.clone(), &limits, png("Lotus", 1)).await.unwrap();
  assert_eq!(host.calls(), 1);

  let too_big = png("Big", limits.max_bytes + 1);
  let not_image = ImageUpload::new("Doc", "application/pdf", vec![1; 10]);
  let duplicate = png("  lOTUS ", 10);
  let unnamed = png("   ", 10);

  for upload in [too_big, not_image, duplicate, unnamed] {
    let err = lib.upload(host.clone(), &limits, upload).await.unwrap_err();
    assert!(err.is_validation(), "expected validation error, got {:?}", err);
  }
  assert_eq!(host.calls(), 1);
  assert_eq!(lib.list().unwrap().len(), 1);
}

#[tokio::test]
async fn test_host_failure_leaves_list_unchanged() {
  let host: Arc<dyn MediaHost> = Arc::new(CountingHost::failing("quota exceeded"));
  let lib = library();
  let err = lib.upload(host, &UploadLimits::default(), png("Lotus", 10)).await.unwrap_err();
  match err {
    KaratError::MediaHost(msg) => assert_eq!(msg, "quota exceeded"),
    other => panic!("unexpected error {:?}", other),
  }
  assert!(lib.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_requires_confirmation_and_is_local_only() {
  let host = counting_host();
  let lib = library();
  lib.upload(host.clone(), &UploadLimits::default(), png("Lotus", 10)).await.unwrap();

  assert!(matches!(lib.remove("lotus", false), Err(KaratError::ConfirmationRequired(_))));
  assert_eq!(lib.list().unwrap().len(), 1);

  let removed = lib.remove("lotus", true).unwrap();
  assert_eq!(removed.name, "Lotus");
  assert!(lib.list().unwrap().is_empty());
  assert_eq!(host.calls(), 1);
  assert!(matches!(lib.remove("lotus", true), Err(KaratError::NotFound(_))));
}

#[tokio::test]
async fn test_library_persists_in_json_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nested").join("images.json");
  let host = counting_host();

  {
    let lib = ImageLibrary::new(Arc::new(JsonFileStore::open(&path).unwrap()));
    lib.upload(host.clone(), &UploadLimits::default(), png("Lotus", 10)).await.unwrap();
  }

  let lib = ImageLibrary::new(Arc::new(JsonFileStore::open(&path).unwrap()));
  assert_eq!(lib.list().unwrap().len(), 1);
  assert!(lib.contains_name("LOTUS").unwrap());
  assert_eq!(lib.clear(true).unwrap(), 1);
  assert!(lib.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_product_image_upload_skips_library_and_duplicate_check() {
  let host = counting_host();
  let limits = UploadLimits::default();

  let first = media::upload_product_image(host.clone(), &limits, png("Lotus Ring", 10)).await.unwrap();
  let again = media::upload_product_image(host.clone(), &limits, png("Lotus Ring", 10)).await.unwrap();
  assert_eq!(first, again);

  let anon = media::upload_product_image(host.clone(), &limits, png("", 10)).await.unwrap();
  assert!(anon.public_id.starts_with("gold-catalog/product_"));

  let err = media::upload_product_image(host.clone(), &limits, ImageUpload::new("x", "text/plain", vec![1]))
    .await
    .unwrap_err();
  assert!(err.is_validation());
  assert_eq!(host.calls(), 3);
}

#[test]
fn test_concurrent_prepends_on_a_file_store_keep_every_record() {
  let dir = tempfile::tempdir().unwrap();
  let file = JsonFileStore::open(dir.path().join("images.json")).unwrap();
  let lib = ImageLibrary::new(Arc::new(file));

  let workers: Vec<_> = (0..8)
    .map(|worker| {
      let lib = lib.clone();
      std::thread::spawn(move || {
        for n in 0..25 {
          let name = format!("w{}-{}", worker, n);
          let hosted = karat::HostedImage {
            url: format!("https://img.example/{}.png", name),
            public_id: format!("gold-catalog/{}", name),
          };
          lib.prepend(media::library_record(&name, hosted)).unwrap();
        }
      })
    })
    .collect();
  for worker in workers {
    worker.join().unwrap();
  }

  assert_eq!(lib.list().unwrap().len(), 200);
  let reopened = ImageLibrary::new(Arc::new(JsonFileStore::open(dir.path().join("images.json")).unwrap()));
  assert_eq!(reopened.list().unwrap().len(), 200);
  assert!(reopened.contains_name("w7-24").unwrap());
}
