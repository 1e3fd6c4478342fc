use commonlink_analyze::{Category, Classifier, ClassifierConfig, RelativePath};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup() -> (TempDir, std::path::PathBuf, std::path::PathBuf) {
    let temp = TempDir::new().unwrap();
    let common = temp.path().join("common");
    let project = temp.path().join("project");
    fs::create_dir_all(&common).unwrap();
    fs::create_dir_all(&project).unwrap();
    (temp, common, project)
}

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_classifier_config_builder() {
    let config = ClassifierConfig::builder()
        .concurrency(3usize)
        .chunk_size(1024usize)
        .build()
        .unwrap();

    assert_eq!(config.concurrency, 3);
    assert_eq!(config.chunk_size, 1024);

    let default_config = ClassifierConfig::default();
    assert_eq!(default_config.chunk_size, 64 * 1024);
    assert!(default_config.concurrency >= 1);
}

#[test]
fn test_classification_is_total_and_ordered() {
    let (_temp, common, project) = setup();
    let mut input = Vec::new();
    for i in 0..40 {
        let rel = format!("dir{}/file{i}.bin", i % 4);
        let contents = vec![i as u8; 100 + i];
        write(&common, &rel, &contents);
        match i % 4 {
            0 => {
                fs::create_dir_all(project.join(format!("dir{}", i % 4))).unwrap();
                fs::hard_link(common.join(&rel), project.join(&rel)).unwrap();
            }
            1 => write(&project, &rel, &contents),
            2 => write(&project, &rel, b"diverged"),
            _ => {}
        }
        input.push(RelativePath::new(&rel));
    }

    let classifier = Classifier::with_config(
        ClassifierConfig::builder()
            .concurrency(4usize)
            .chunk_size(16usize)
            .build()
            .unwrap(),
    );
    let result = classifier.classify(&input, &common, &project).unwrap();

    assert_eq!(result.total(), input.len());
    assert_eq!(result.linked.len(), 10);
    assert_eq!(result.same.len(), 10);
    assert_eq!(result.different.len(), 10);
    assert_eq!(result.no_exist.len(), 10);

    // Category lists keep input order.
    let expected_same: Vec<RelativePath> = input
        .iter()
        .enumerate()
        .filter(|(i, _)| i % 4 == 1)
        .map(|(_, p)| p.clone())
        .collect();
    assert_eq!(result.same, expected_same);
}

#[test]
fn test_large_equal_files_span_many_chunks() {
    let (_temp, common, project) = setup();
    let data: Vec<u8> = (0..300_000u32).map(|i| (i * 7 % 256) as u8).collect();
    write(&common, "big.bin", &data);
    write(&project, "big.bin", &data);

    let result = Classifier::new()
        .classify(&[RelativePath::new("big.bin")], &common, &project)
        .unwrap();

    assert_eq!(result.same, vec![RelativePath::new("big.bin")]);
    assert_eq!(result.bytes_compared, 300_000);
}

#[test]
fn test_vanished_common_file_is_error() {
    let (_temp, common, project) = setup();
    write(&project, "gone.txt", b"p");

    let result = Classifier::new()
        .classify(&[RelativePath::new("gone.txt")], &common, &project)
        .unwrap();

    assert_eq!(result.classified_count(), 0);
    assert_eq!(result.errors.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlinks_compare_by_target() {
    use std::os::unix::fs::symlink;

    let (_temp, common, project) = setup();
    symlink("target.txt", common.join("same-link")).unwrap();
    symlink("target.txt", project.join("same-link")).unwrap();
    symlink("one.txt", common.join("diff-link")).unwrap();
    symlink("two.txt", project.join("diff-link")).unwrap();

    let input = vec![RelativePath::new("same-link"), RelativePath::new("diff-link")];
    let result = Classifier::new().classify(&input, &common, &project).unwrap();

    assert_eq!(result.get(Category::Same), &[RelativePath::new("same-link")]);
    assert_eq!(
        result.get(Category::Different),
        &[RelativePath::new("diff-link")]
    );
    assert_eq!(result.bytes_compared, 0);
}
