//! Unit tests for the filesystem artifact store

use std::io::Write;

use omr_providers::storage::LocalArtifactStore;
use omr_domain::error::Error;
use omr_domain::ports::ArtifactStore;

fn store() -> (tempfile::TempDir, LocalArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalArtifactStore::new(dir.path()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn save_get_round_trip() {
    let (_dir, store) = store();
    store
        .save("uploads/templates/1/blank.jpg", b"bytes")
        .await
        .unwrap();
    assert_eq!(store.get("uploads/templates/1/blank.jpg").await.unwrap(), b"bytes");
    assert!(store.exists("uploads/templates/1/blank.jpg").await.unwrap());
    assert_eq!(store.size("uploads/templates/1/blank.jpg").await.unwrap(), 5);
}

#[tokio::test]
async fn missing_artifact_is_not_found() {
    let (_dir, store) = store();
    assert!(matches!(
        store.get("nope.jpg").await.unwrap_err(),
        Error::NotFound { .. }
    ));
    assert!(!store.exists("nope.jpg").await.unwrap());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (_dir, store) = store();
    store.save("a.txt", b"x").await.unwrap();
    store.delete("a.txt").await.unwrap();
    store.delete("a.txt").await.unwrap();
    assert!(!store.exists("a.txt").await.unwrap());
}

#[tokio::test]
async fn traversal_paths_are_rejected() {
    let (_dir, store) = store();
    assert!(store.save("../escape.txt", b"x").await.is_err());
    assert!(store.get("/etc/passwd").await.is_err());
}

#[tokio::test]
async fn list_filters_and_sorts() {
    let (_dir, store) = store();
    store.save("sheets/b.jpg", b"b").await.unwrap();
    store.save("sheets/a.jpg", b"a").await.unwrap();
    store.save("sheets/c.png", b"c").await.unwrap();
    store.save("other/d.jpg", b"d").await.unwrap();

    let jpgs = store.list("sheets", "*.jpg").await.unwrap();
    assert_eq!(jpgs, vec!["sheets/a.jpg", "sheets/b.jpg"]);

    let all = store.list("sheets", "*").await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn chunked_upload_assembles_in_order() {
    let (_dir, store) = store();
    // Chunks arrive out of order.
    store
        .save_chunk("u1", 1, 3, "uploads/answer_sheets/1/batch.zip", b"BBB")
        .await
        .unwrap();
    store
        .save_chunk("u1", 0, 3, "uploads/answer_sheets/1/batch.zip", b"AAA")
        .await
        .unwrap();
    store
        .save_chunk("u1", 2, 3, "uploads/answer_sheets/1/batch.zip", b"CC")
        .await
        .unwrap();

    let metadata = store.upload_metadata("u1").await.unwrap().unwrap();
    assert_eq!(metadata.total_chunks, 3);
    assert!(metadata.is_complete());
    assert_eq!(metadata.chunks_received, vec![0, 1, 2]);

    store
        .combine_chunks("u1", 3, "uploads/answer_sheets/1/batch.zip")
        .await
        .unwrap();
    assert_eq!(
        store.get("uploads/answer_sheets/1/batch.zip").await.unwrap(),
        b"AAABBBCC"
    );

    store.delete_upload("u1").await.unwrap();
    assert!(store.upload_metadata("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_chunk_receipts_do_not_double_count() {
    let (_dir, store) = store();
    store.save_chunk("u2", 0, 2, "final.bin", b"x").await.unwrap();
    store.save_chunk("u2", 0, 2, "final.bin", b"x").await.unwrap();
    let metadata = store.upload_metadata("u2").await.unwrap().unwrap();
    assert_eq!(metadata.chunks_received, vec![0]);
    assert_eq!(metadata.missing_chunks(), vec![1]);
}

#[tokio::test]
async fn combine_fails_naming_the_missing_chunk() {
    let (_dir, store) = store();
    store.save_chunk("u3", 0, 2, "final.bin", b"x").await.unwrap();
    let err = store.combine_chunks("u3", 2, "final.bin").await.unwrap_err();
    assert!(err.to_string().contains("chunk_0001"), "{err}");
}

#[tokio::test]
async fn zip_extraction_expands_and_removes_the_archive() {
    let (_dir, store) = store();

    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("sheets/a.jpg", options).unwrap();
        writer.write_all(b"sheet-a").unwrap();
        writer.start_file("sheets/b.jpg", options).unwrap();
        writer.write_all(b"sheet-b").unwrap();
        writer.finish().unwrap();
    }
    store
        .save("uploads/answer_sheets/1/batch.zip", &buffer.into_inner())
        .await
        .unwrap();

    let extracted = store
        .extract_zip("uploads/answer_sheets/1/batch.zip")
        .await
        .unwrap();
    assert_eq!(extracted, "uploads/answer_sheets/1/batch");
    assert_eq!(
        store
            .get("uploads/answer_sheets/1/batch/sheets/a.jpg")
            .await
            .unwrap(),
        b"sheet-a"
    );
    assert!(!store.exists("uploads/answer_sheets/1/batch.zip").await.unwrap());
}
