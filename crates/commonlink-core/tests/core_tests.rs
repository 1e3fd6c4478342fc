use commonlink_core::{
    Category, Classification, Environment, InodeInfo, PathError, RelativePath, SyncConfig,
    SyncError,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_inode_info() {
    let inode1 = InodeInfo::new(12345, 67890);
    assert_eq!(inode1.inode, 12345);
    assert_eq!(inode1.device, 67890);

    let inode2 = InodeInfo::new(12345, 67890);
    assert_eq!(inode1, inode2);
    assert_ne!(inode1, InodeInfo::new(12345, 1));
}

#[test]
fn test_relative_path_serializes_as_string() {
    let path = RelativePath::new("src/main.rs");
    let json = serde_json::to_string(&path).unwrap();
    assert_eq!(json, "\"src/main.rs\"");

    let back: RelativePath = serde_json::from_str(&json).unwrap();
    assert_eq!(back, path);
}

#[test]
fn test_classification_totals() {
    let mut classification = Classification::new();
    classification.push(Category::Linked, "a.txt".into());
    classification.push(Category::NoExist, "b.txt".into());
    classification
        .errors
        .push(PathError::new("c.txt".into(), "permission denied"));

    assert_eq!(classification.classified_count(), 2);
    assert_eq!(classification.total(), 3);
    assert!(classification.has_errors());
    assert_eq!(classification.linkable(), vec![RelativePath::new("b.txt")]);
}

#[test]
fn test_config_deserializes_with_defaults() {
    let config: SyncConfig = serde_json::from_str(r#"{"common_dir": "../common"}"#).unwrap();
    assert_eq!(config.project_dir, PathBuf::from("."));
    assert_eq!(config.file_limit, 500);
    assert_eq!(config.time_limit, 10);
    assert!(config.ignored.is_empty());

    let merged = config.with_defaults();
    assert!(merged.ignored.iter().any(|p| p == ".git"));
}

#[test]
fn test_resolve_same_directory_through_symlink() {
    let temp = TempDir::new().unwrap();
    let real = temp.path().join("real");
    fs::create_dir(&real).unwrap();

    #[cfg(unix)]
    {
        let alias = temp.path().join("alias");
        std::os::unix::fs::symlink(&real, &alias).unwrap();

        let config = SyncConfig::builder()
            .common_dir(real.clone())
            .project_dir(alias)
            .build()
            .unwrap();
        let env = Environment::new(temp.path(), None);

        let err = config.resolve(&env).unwrap_err();
        assert!(matches!(err, SyncError::SameDirectory { .. }));
    }
}

#[test]
fn test_resolve_distinct_directories() {
    let temp = TempDir::new().unwrap();
    let env = Environment::new(temp.path(), None);
    let config = SyncConfig::builder()
        .common_dir("common")
        .project_dir("project")
        .build()
        .unwrap();

    let dirs = config.resolve(&env).unwrap();
    assert_eq!(dirs.common_dir, temp.path().join("common"));
    assert_eq!(dirs.project_dir, temp.path().join("project"));
    // `~/.gitignore` stays relative without a home directory, so it is
    // looked up in both trees like `.gitignore`.
    assert!(dirs
        .gitignore_files
        .contains(&temp.path().join("common").join(".gitignore")));
}
