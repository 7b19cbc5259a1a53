use std::fs;
use std::sync::Arc;

use yelm_context::patterns::{PatternRegistry, DEFAULT_HIERARCHY};
use yelm_context::scanner::{
    build_file_index, find_context_files, DirectoryScanner, GitignoreOracle, ScanOptions,
};

use super::fixtures::Fixture;

fn build_tree(fx: &Fixture, dirs: usize) -> std::path::PathBuf {
    let root = fx.root.join("tree");
    for i in 0..dirs {
        fx.write(&root.join(format!("dir{i:03}")).join("agents.md"), "x");
    }
    root
}

#[test]
fn test_max_dirs_bounds_directories_scanned() {
    let fx = Fixture::new();
    let root = build_tree(&fx, 30);

    for n in [1, 5, 10, 31] {
        let result = DirectoryScanner::new(&root, ScanOptions::new(20, n, Vec::new()))
            .scan()
            .unwrap();
        assert!(result.directories_scanned <= n);
        assert_eq!(result.limit_reached, n < 31, "max_dirs = {n}");
    }
}

#[test]
fn test_files_relative_paths_use_forward_slashes() {
    let fx = Fixture::new();
    let root = fx.root.join("tree");
    fx.write(&root.join("a").join("b").join("CLAUDE.md"), "x");

    let result = DirectoryScanner::new(&root, ScanOptions::default())
        .scan()
        .unwrap();
    let rel: Vec<_> = result.files.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(rel, vec!["a/b/CLAUDE.md"]);
    assert_eq!(result.files[0].depth, 2);
    assert_eq!(result.total_size(), 1);
}

#[test]
fn test_index_and_winner_selection() {
    let fx = Fixture::new();
    let root = fx.root.join("tree");
    fx.write(&root.join("GEMINI.md"), "g");
    fx.write(&root.join("CLAUDE.md"), "c");
    fx.write(&root.join("x").join(".cursor").join("rules"), "r");
    fx.write(&root.join("x").join("notes.txt"), "n");

    let result = DirectoryScanner::new(&root, ScanOptions::default())
        .scan()
        .unwrap();
    let index = build_file_index(&result);
    let registry = PatternRegistry::new(DEFAULT_HIERARCHY).unwrap();
    let winners = find_context_files(&index, &registry);

    assert_eq!(winners.len(), 2);
    assert_eq!(winners[&root].pattern_name, "CLAUDE.md");
    assert_eq!(winners[&root.join("x")].pattern_name, ".cursor/rules");
    assert_eq!(winners[&root.join("x")].depth, 1);
    assert_eq!(index.named("notes.txt").count(), 1);
}

#[test]
fn test_gitignore_oracle_prunes_scan() {
    let fx = Fixture::new();
    let root = fx.root.join("tree");
    fx.write(&root.join(".gitignore"), "secret/\n*.bak\n");
    fx.write(&root.join("secret").join("agents.md"), "s");
    fx.write(&root.join("open").join("agents.md"), "o");
    fx.write(&root.join("open").join("old.bak"), "b");

    let oracle = GitignoreOracle::from_root(&root, &[]).unwrap();
    let result = DirectoryScanner::new(&root, ScanOptions::default())
        .with_ignore_oracle(Some(Arc::new(oracle)))
        .scan()
        .unwrap();

    let rel: Vec<_> = result.files.iter().map(|f| f.relative_path.as_str()).collect();
    assert_eq!(rel, vec![".gitignore", "open/agents.md"]);
}

#[test]
fn test_scan_root_must_be_directory() {
    let fx = Fixture::new();
    let file = fx.write(&fx.root.join("file.txt"), "x");
    assert!(DirectoryScanner::new(&file, ScanOptions::default())
        .scan()
        .is_err());
    assert!(
        DirectoryScanner::new(&fx.root.join("missing"), ScanOptions::default())
            .scan()
            .is_err()
    );
}

#[test]
fn test_empty_directory() {
    let fx = Fixture::new();
    let root = fx.root.join("empty");
    fs::create_dir_all(&root).unwrap();

    let result = DirectoryScanner::new(&root, ScanOptions::default())
        .scan()
        .unwrap();
    assert_eq!(result.directories_scanned, 1);
    assert!(result.files.is_empty());
    assert!(!result.limit_reached);
}
