use cellemu_site::storage::{LocalDiskStorage, MockStorageService, StorageService};
use tempfile::TempDir;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_put_and_delete() {
        let mock = MockStorageService::new();
        mock.put("2024/05/a.png", b"png", "image/png").await.unwrap();
        assert!(mock.contains("2024/05/a.png"));
        assert_eq!(mock.public_url("2024/05/a.png"), "/uploads/2024/05/a.png");

        mock.delete("2024/05/a.png").await.unwrap();
        assert!(mock.is_empty());
        // Deleting twice is fine.
        mock.delete("2024/05/a.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockStorageService::new_failing();
        assert!(mock.put("a.png", b"png", "image/png").await.is_err());
        assert!(mock.delete("a.png").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_sanitization() {
        let mock = MockStorageService::new();
        mock.put("../../etc/passwd", b"x", "text/plain").await.unwrap();
        assert!(mock.contains("etc/passwd"));
        assert!(!mock.public_url("../../etc/passwd").contains(".."));
    }
}

#[cfg(test)]
mod disk_tests {
    use super::*;

    fn storage() -> (TempDir, LocalDiskStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path(), "/uploads");
        (dir, storage)
    }

    #[tokio::test]
    async fn test_put_creates_partition_directories() {
        let (dir, storage) = storage();
        storage.put("2024/05/datasheet.pdf", b"%PDF", "application/pdf").await.unwrap();

        let written = tokio::fs::read(dir.path().join("2024/05/datasheet.pdf")).await.unwrap();
        assert_eq!(written, b"%PDF");
        assert_eq!(storage.public_url("2024/05/datasheet.pdf"), "/uploads/2024/05/datasheet.pdf");
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_object() {
        let (dir, storage) = storage();
        storage.put("logo.svg", b"<svg/>", "image/svg+xml").await.unwrap();
        storage.put("logo.svg", b"<svg></svg>", "image/svg+xml").await.unwrap();
        let written = tokio::fs::read_to_string(dir.path().join("logo.svg")).await.unwrap();
        assert_eq!(written, "<svg></svg>");
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_ignores_missing() {
        let (dir, storage) = storage();
        storage.put("2024/05/a.png", b"png", "image/png").await.unwrap();
        storage.delete("2024/05/a.png").await.unwrap();
        assert!(!dir.path().join("2024/05/a.png").exists());

        storage.delete("2024/05/never-existed.png").await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_root() {
        let (dir, storage) = storage();
        storage.put("../../escape.txt", b"nope", "text/plain").await.unwrap();
        assert!(dir.path().join("escape.txt").exists());
        assert_eq!(storage.root(), dir.path());
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let (_dir, storage) = storage();
        assert!(storage.put("../..", b"x", "text/plain").await.is_err());
        assert!(storage.delete("/").await.is_err());
    }
}
