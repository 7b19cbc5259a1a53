use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use yelm_context::discovery::{
    DiscoveryRequest, DiscoverySource, HierarchyResolver, EXTENSION_LEVEL, GLOBAL_LEVEL,
};
use yelm_context::scanner::GitignoreOracle;

use super::fixtures::Fixture;

#[test]
fn test_scenario_global_project_and_working_dir() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&fx.home.join(".yelm").join("agents.md"), "global");
    fx.write(&proj.join("CLAUDE.md"), "project");
    fx.write(&proj.join("src").join("GEMINI.md"), "src");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver
        .discover(&DiscoveryRequest::new(proj.join("src")))
        .unwrap();

    assert_eq!(files.len(), 3);
    assert_eq!(files[0].absolute_path, fx.home.join(".yelm").join("agents.md"));
    assert_eq!(files[0].directory_level, GLOBAL_LEVEL);
    assert_eq!(files[0].source, DiscoverySource::Global);
    assert_eq!(files[1].absolute_path, proj.join("CLAUDE.md"));
    assert_eq!(files[1].directory_level, 1);
    assert_eq!(files[2].absolute_path, proj.join("src").join("GEMINI.md"));
    assert_eq!(files[2].directory_level, 0);
}

#[test]
fn test_higher_priority_pattern_wins_directory() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("src").join("GEMINI.md"), "low");
    fx.write(&proj.join("src").join("agents.md"), "high");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver
        .discover(&DiscoveryRequest::new(proj.join("src")))
        .unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].pattern_name, "agents.md");
    assert_eq!(files[0].priority, 0);
}

#[test]
fn test_nested_rules_pattern_belongs_to_parent_dir() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("web").join(".cursor").join("rules"), "rules");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].pattern_name, ".cursor/rules");
    assert_eq!(files[0].directory, proj.join("web"));
    assert_eq!(files[0].directory_level, 1);
    assert_eq!(files[0].source, DiscoverySource::Downward);
}

#[test]
fn test_nested_rules_lose_to_flat_file_in_same_dir() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("web").join(".cursor").join("rules"), "rules");
    fx.write(&proj.join("web").join("CLAUDE.md"), "claude");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].pattern_name, "CLAUDE.md");
}

#[test]
fn test_upward_walk_stops_at_project_root() {
    let fx = Fixture::new();
    fx.write(&fx.root.join("agents.md"), "outside the project");
    let proj = fx.project("proj");
    fx.write(&proj.join("agents.md"), "inside");
    let deep = proj.join("a").join("b");
    fs::create_dir_all(&deep).unwrap();

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&deep)).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].absolute_path, proj.join("agents.md"));
    assert_eq!(files[0].directory_level, 2);
}

#[test]
fn test_global_dir_not_duplicated_when_working_in_it() {
    let fx = Fixture::new();
    let global = fx.home.join(".yelm");
    fx.write(&global.join("agents.md"), "global");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&global)).unwrap();

    let global_hits = files
        .iter()
        .filter(|f| f.absolute_path == global.join("agents.md"))
        .count();
    assert_eq!(global_hits, 1);
    assert_eq!(files[0].source, DiscoverySource::Global);
}

#[test]
fn test_at_most_one_winner_per_directory() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    for dir in ["", "a", "a/b", "c"] {
        let d = proj.join(dir);
        fx.write(&d.join("agents.md"), "a");
        fx.write(&d.join("CLAUDE.md"), "c");
        fx.write(&d.join("GEMINI.md"), "g");
    }

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();

    let mut seen = HashSet::new();
    for file in &files {
        assert!(seen.insert(file.directory.clone()), "duplicate winner in {:?}", file.directory);
        assert_eq!(file.pattern_name, "agents.md");
    }
    assert_eq!(files.len(), 4);
}

#[test]
fn test_descendants_ordered_by_depth_then_path() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("z").join("agents.md"), "z");
    fx.write(&proj.join("a").join("deep").join("agents.md"), "deep");
    fx.write(&proj.join("a").join("agents.md"), "a");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();

    let dirs: Vec<_> = files.iter().map(|f| f.directory.clone()).collect();
    assert_eq!(
        dirs,
        vec![proj.join("a"), proj.join("z"), proj.join("a").join("deep")]
    );
}

#[test]
fn test_ignore_oracle_hides_descendants() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join(".gitignore"), "generated/\n");
    fx.write(&proj.join("generated").join("agents.md"), "ignored");
    fx.write(&proj.join("kept").join("agents.md"), "kept");

    let oracle = GitignoreOracle::from_root(&proj, &[]).unwrap();
    let request = DiscoveryRequest::new(&proj).with_ignore_oracle(Some(Arc::new(oracle)));

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&request).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].directory, proj.join("kept"));
}

#[test]
fn test_ignore_patterns_skip_build_dirs() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("node_modules").join("pkg").join("agents.md"), "vendored");
    fx.write(&proj.join("target").join("agents.md"), "build output");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();
    assert!(files.is_empty());
}

#[test]
fn test_extension_files_are_last() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("agents.md"), "p");
    let ext = fx.write(&fx.root.join("ext").join("EXTRA.md"), "ext");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver
        .discover(&DiscoveryRequest::new(&proj).with_extension_files(vec![ext.clone()]))
        .unwrap();

    let last = files.last().unwrap();
    assert_eq!(last.absolute_path, ext);
    assert_eq!(last.pattern_name, "EXTRA.md");
    assert_eq!(last.directory_level, EXTENSION_LEVEL);
}

#[test]
fn test_max_dirs_limits_descendants() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    for i in 0..10 {
        fx.write(&proj.join(format!("d{i:02}")).join("agents.md"), "x");
    }

    let mut config = fx.config();
    config.max_dirs = 4;
    let resolver = HierarchyResolver::new(Arc::new(config)).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();

    // The root takes one slot; three children fit.
    assert_eq!(files.len(), 3);
}

#[test]
fn test_custom_hierarchy() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("agents.md"), "a");
    fx.write(&proj.join("NOTES.md"), "n");

    let mut config = fx.config();
    config.hierarchy = vec!["NOTES.md".to_string(), "agents.md".to_string()];
    let resolver = HierarchyResolver::new(Arc::new(config)).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&proj)).unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].pattern_name, "NOTES.md");
}

#[test]
fn test_invalid_hierarchy_rejected_at_construction() {
    let fx = Fixture::new();
    let mut config = fx.config();
    config.hierarchy = vec!["../escape.md".to_string()];

    let err = HierarchyResolver::new(Arc::new(config)).unwrap_err();
    assert!(err.is_configuration_error());
}

#[test]
fn test_missing_working_dir_is_error() {
    let fx = Fixture::new();
    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let result = resolver.discover(&DiscoveryRequest::new(fx.root.join("missing")));
    assert!(result.is_err());
}

#[test]
fn test_home_working_dir_does_not_rescan_global_dirs() {
    let fx = Fixture::new();
    fx.write(&fx.home.join(".yelm").join("agents.md"), "current");
    fx.write(&fx.home.join(".yelm").join("extra").join("CLAUDE.md"), "nested");
    fx.write(&fx.home.join(".gemini").join("GEMINI.md"), "legacy");
    fx.write(&fx.home.join("notes").join("CLAUDE.md"), "notes");

    let resolver = HierarchyResolver::new(fx.shared_config()).unwrap();
    let files = resolver.discover(&DiscoveryRequest::new(&fx.home)).unwrap();

    let global: Vec<_> = files
        .iter()
        .filter(|f| f.absolute_path.starts_with(fx.home.join(".yelm")))
        .chain(
            files
                .iter()
                .filter(|f| f.absolute_path.starts_with(fx.home.join(".gemini"))),
        )
        .collect();
    assert_eq!(global.len(), 1);
    assert_eq!(global[0].source, DiscoverySource::Global);
    assert_eq!(global[0].absolute_path, fx.home.join(".yelm").join("agents.md"));

    assert_eq!(files.len(), 2);
    assert_eq!(files[1].absolute_path, fx.home.join("notes").join("CLAUDE.md"));
    assert_eq!(files[1].source, DiscoverySource::Downward);
}
