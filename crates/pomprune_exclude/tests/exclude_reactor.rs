use pomprune_core::Reactor;
use pomprune_exclude::{Config, SelectorSet, exclude_from_reactor, run_exclusion};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

const ROOT_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.example</groupId>
    <artifactId>root</artifactId>
    <packaging>pom</packaging>

    <modules>
        <module>sub1</module>
        <!-- sub2 aggregates its own modules -->
        <module>sub2</module>
        <module>sub3</module>
    </modules>
</project>
"#;

const ROOT_POM_REWRITTEN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.example</groupId>
    <artifactId>root</artifactId>
    <packaging>pom</packaging>

    <modules>
        <module>sub1</module>
        <module>sub3</module>
    </modules>
</project>
"#;

const SUB1_POM: &str = r#"<project>
  <parent>
    <groupId>com.example</groupId>
    <artifactId>root</artifactId>
  </parent>
  <artifactId>sub1</artifactId>

  <dependencies>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>lib-a</artifactId>
    </dependency>

    <dependency>
      <groupId>com.example</groupId>
      <artifactId>lib-b</artifactId>
    </dependency>
  </dependencies>
</project>
"#;

const SUB1_POM_REWRITTEN: &str = r#"<project>
  <parent>
    <groupId>com.example</groupId>
    <artifactId>root</artifactId>
  </parent>
  <artifactId>sub1</artifactId>

  <dependencies>

    <dependency>
      <groupId>com.example</groupId>
      <artifactId>lib-b</artifactId>
    </dependency>
  </dependencies>
</project>
"#;

const SUB2_POM: &str = r#"<project>
  <groupId>com.example</groupId>
  <artifactId>sub2</artifactId>
  <modules>
    <module>sub2a</module>
  </modules>
</project>
"#;

const SUB2A_POM: &str = r#"<project>
  <groupId>com.example</groupId>
  <artifactId>sub2a</artifactId>
</project>
"#;

const SUB3_POM: &str = r#"<project>
  <groupId>com.example</groupId>
  <artifactId>sub3</artifactId>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>${project.groupId}</groupId>
        <artifactId>sub2</artifactId>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>com.example</groupId>
      <artifactId>sub2</artifactId>
    </dependency>
  </dependencies>
</project>
"#;

const SUB3_POM_REWRITTEN: &str = r#"<project>
  <groupId>com.example</groupId>
  <artifactId>sub3</artifactId>
  <dependencyManagement>
    <dependencies>
    </dependencies>
  </dependencyManagement>
  <dependencies>
  </dependencies>
</project>
"#;

fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
    let file_path = dir.join(path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// Builds the sample reactor and returns its canonical root.
fn create_reactor(temp_dir: &TempDir, excludes: Option<&str>) -> PathBuf {
    let root = temp_dir.path().canonicalize().unwrap();
    create_test_file(&root, "pom.xml", ROOT_POM);
    create_test_file(&root, "sub1/pom.xml", SUB1_POM);
    create_test_file(&root, "sub2/pom.xml", SUB2_POM);
    create_test_file(&root, "sub2/sub2a/pom.xml", SUB2A_POM);
    create_test_file(&root, "sub3/pom.xml", SUB3_POM);
    fs::create_dir_all(root.join(".mvn")).unwrap();
    if let Some(excludes) = excludes {
        create_test_file(&root, ".mvn/excludes.txt", excludes);
    }
    root
}

fn config(root: &Path) -> Config {
    Config { root: Some(root.to_path_buf()), ..Default::default() }
}

#[test]
fn test_end_to_end_exclusion() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub2\n\n  com.example:lib-a  \n"));

    let outcome = run_exclusion(config(&root)).unwrap();

    let read = |p: &str| fs::read_to_string(root.join(p)).unwrap();
    assert_eq!(read(".exclude-pom.xml"), ROOT_POM_REWRITTEN);
    assert_eq!(read("sub1/.exclude-pom.xml"), SUB1_POM_REWRITTEN);
    assert_eq!(read("sub3/.exclude-pom.xml"), SUB3_POM_REWRITTEN);
    assert!(!root.join("sub2/.exclude-pom.xml").exists());
    assert!(!root.join("sub2/sub2a/.exclude-pom.xml").exists());

    // Originals are never touched
    assert_eq!(read("pom.xml"), ROOT_POM);
    assert_eq!(read("sub1/pom.xml"), SUB1_POM);

    let excluded: Vec<_> =
        outcome.excluded.iter().map(|p| p.coordinate.artifact_id.as_str()).collect();
    assert_eq!(excluded, vec!["sub2", "sub2a"]);
    assert_eq!(outcome.excluded[0].selector.as_deref(), Some("sub2"));
    assert_eq!(outcome.excluded[1].selector, None);
    assert_eq!(outcome.rewritten.len(), 3);
    assert!(outcome.failed.is_empty());

    let remaining: Vec<_> =
        outcome.reactor.projects.iter().map(|p| p.artifact_id.as_str()).collect();
    assert_eq!(remaining, vec!["root", "sub1", "sub3"]);
    let root_project = &outcome.reactor.projects[0];
    assert_eq!(root_project.file, root.join(".exclude-pom.xml"));
    assert_eq!(root_project.modules, vec!["sub1", "sub3"]);
    let sub1 = &outcome.reactor.projects[1];
    assert_eq!(sub1.file, root.join("sub1").join(".exclude-pom.xml"));
    assert_eq!(sub1.dependencies.len(), 1);
    assert_eq!(sub1.dependencies[0].artifact_id, "lib-b");
}

#[test]
fn test_missing_selector_list_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, None);

    let outcome = run_exclusion(config(&root)).unwrap();

    assert!(outcome.selectors.is_empty());
    assert!(outcome.excluded.is_empty());
    assert!(outcome.rewritten.is_empty());
    assert!(!root.join(".exclude-pom.xml").exists());
}

#[test]
fn test_unmatched_selectors_leave_descriptors_alone() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("does-not-exist\n:nothing\n"));

    let outcome = run_exclusion(config(&root)).unwrap();

    assert!(outcome.excluded.is_empty());
    assert!(outcome.rewritten.is_empty());
    assert_eq!(outcome.reactor.len(), 5);
    assert!(!root.join(".exclude-pom.xml").exists());
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub2\n"));

    let cfg = Config { dry_run: true, ..config(&root) };
    let outcome = run_exclusion(cfg).unwrap();

    assert!(outcome.dry_run);
    assert_eq!(outcome.rewritten.len(), 2);
    assert!(!root.join(".exclude-pom.xml").exists());
    assert!(!root.join("sub3/.exclude-pom.xml").exists());
}

#[test]
fn test_custom_output_name() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub3\n"));

    let cfg = Config { output_name: "pom-trimmed.xml".to_string(), ..config(&root) };
    let outcome = run_exclusion(cfg).unwrap();

    assert_eq!(outcome.rewritten.len(), 1);
    assert!(root.join("pom-trimmed.xml").exists());
    assert!(!root.join(".exclude-pom.xml").exists());
}

#[test]
fn test_malformed_descriptor_aborts_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub2\n"));

    // The same reactor with a well-formed sub3 goes through
    let dry_run = Config { dry_run: true, ..config(&root) };
    assert_eq!(run_exclusion(dry_run).unwrap().rewritten.len(), 2);

    create_test_file(&root, "sub3/pom.xml", "<project><artifactId>sub3</project>");
    assert!(run_exclusion(config(&root)).is_err());
    assert!(!root.join(".exclude-pom.xml").exists());
    assert!(!root.join("sub3/.exclude-pom.xml").exists());
}

#[test]
fn test_missing_root_descriptor_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub2\n"));
    fs::remove_file(root.join("pom.xml")).unwrap();

    let err = run_exclusion(config(&root)).unwrap_err();
    assert!(format!("{:#}", err).contains("does not exist"));
}

#[test]
fn test_descriptor_encoding_is_preserved() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub2\n"));
    let sub3: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
        <project>\n  <groupId>com.example</groupId>\n  <artifactId>sub3</artifactId>\n\
        <name>Caf\xE9</name>\n  <dependencies>\n    <dependency>\n\
        <groupId>com.example</groupId>\n      <artifactId>sub2</artifactId>\n\
        </dependency>\n  </dependencies>\n</project>\n";
    fs::write(root.join("sub3/pom.xml"), sub3).unwrap();

    let outcome = run_exclusion(config(&root)).unwrap();

    let rewritten = fs::read(root.join("sub3/.exclude-pom.xml")).unwrap();
    let expected: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
        <project>\n  <groupId>com.example</groupId>\n  <artifactId>sub3</artifactId>\n\
        <name>Caf\xE9</name>\n  <dependencies>\n  </dependencies>\n</project>\n";
    assert_eq!(rewritten, expected);
    let sub3 = outcome.rewritten.iter().find(|r| r.coordinate.artifact_id == "sub3").unwrap();
    assert_eq!(sub3.encoding, "windows-1252");
}

/// Loads the reactor, then breaks sub1's descriptor so only the rewrite fails.
fn reactor_with_broken_sub1(root: &Path) -> (Reactor, SelectorSet) {
    let reactor = Reactor::load(&root.join("pom.xml")).unwrap();
    create_test_file(root, "sub1/pom.xml", "<project><dependencies></project>");
    let selectors = SelectorSet::new(root, &["sub2".to_string(), ":lib-a".to_string()]);
    (reactor, selectors)
}

#[test]
fn test_rewrite_failure_is_fatal_for_the_batch() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, None);
    let (reactor, selectors) = reactor_with_broken_sub1(&root);

    let result = exclude_from_reactor(reactor, &selectors, &config(&root));

    assert!(result.is_err());
    // The root descriptor was planned and filtered first, but nothing is written
    assert!(!root.join(".exclude-pom.xml").exists());
    assert!(!root.join("sub1/.exclude-pom.xml").exists());
}

#[test]
fn test_isolated_rewrite_failure_skips_only_that_project() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, None);
    let (reactor, selectors) = reactor_with_broken_sub1(&root);

    let cfg = Config { isolate_failures: true, ..config(&root) };
    let outcome = exclude_from_reactor(reactor, &selectors, &cfg).unwrap();

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].coordinate.artifact_id, "sub1");
    assert!(root.join(".exclude-pom.xml").exists());
    assert!(!root.join("sub1/.exclude-pom.xml").exists());
    let sub1 = outcome.reactor.projects.iter().find(|p| p.artifact_id == "sub1").unwrap();
    assert_eq!(sub1.file, root.join("sub1").join("pom.xml"));
}

/// Occupies sub1's staging path with a directory so writing its output fails.
fn block_sub1_output(root: &Path) {
    fs::create_dir_all(root.join("sub1/.exclude-pom.xml.tmp")).unwrap();
}

#[test]
fn test_write_failure_leaves_no_output_behind() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub2\ncom.example:lib-a\n"));
    block_sub1_output(&root);

    assert!(run_exclusion(config(&root)).is_err());
    // The root descriptor was staged before sub1 failed and is discarded again
    assert!(!root.join(".exclude-pom.xml").exists());
    assert!(!root.join(".exclude-pom.xml.tmp").exists());
    assert!(!root.join("sub1/.exclude-pom.xml").exists());
    assert!(!root.join("sub3/.exclude-pom.xml").exists());
}

#[test]
fn test_isolated_write_failure_skips_only_that_project() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_reactor(&temp_dir, Some("sub2\ncom.example:lib-a\n"));
    block_sub1_output(&root);

    let cfg = Config { isolate_failures: true, ..config(&root) };
    let outcome = run_exclusion(cfg).unwrap();

    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].coordinate.artifact_id, "sub1");
    assert_eq!(outcome.rewritten.len(), 2);
    assert!(root.join(".exclude-pom.xml").exists());
    assert!(root.join("sub3/.exclude-pom.xml").exists());
    assert!(!root.join("sub1/.exclude-pom.xml").exists());
    let sub1 = outcome.reactor.projects.iter().find(|p| p.artifact_id == "sub1").unwrap();
    assert_eq!(sub1.file, root.join("sub1").join("pom.xml"));
}
