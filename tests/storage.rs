use marquee::{
    error::AppError,
    storage::{AssetStore, MOVIE_POSTERS, Upload},
};

fn upload(bytes: &[u8], ext: Option<&str>) -> Upload {
    Upload { bytes: bytes.to_vec(), ext: ext.map(str::to_string) }
}

#[tokio::test]
async fn save_writes_the_file_and_returns_a_handle() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AssetStore::new(dir.path());

    let handle = store.save(MOVIE_POSTERS, &upload(b"jpeg bytes", Some("jpg"))).await.expect("save");
    assert!(handle.starts_with("movies/"));
    assert!(handle.ends_with(".jpg"));

    let stored = tokio::fs::read(dir.path().join(&handle)).await.expect("read back");
    assert_eq!(stored, b"jpeg bytes");
}

#[tokio::test]
async fn replace_drops_the_previous_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AssetStore::new(dir.path());

    let old = store.save(MOVIE_POSTERS, &upload(b"old", Some("jpg"))).await.expect("save");
    let new = store
        .replace(MOVIE_POSTERS, &upload(b"new", Some("png")), Some(&old))
        .await
        .expect("replace");

    assert!(!dir.path().join(&old).exists());
    let stored = tokio::fs::read(dir.path().join(&new)).await.expect("read back");
    assert_eq!(stored, b"new");
}

#[tokio::test]
async fn delete_tolerates_missing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AssetStore::new(dir.path());

    store.delete("movies/already-gone.jpg").await.expect("delete");
}

#[tokio::test]
async fn handles_cannot_escape_the_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = AssetStore::new(dir.path());

    let err = store.delete("../outside.jpg").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = store.delete("/etc/passwd").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
