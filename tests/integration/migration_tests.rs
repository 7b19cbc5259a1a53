use std::fs;
use std::sync::Arc;

use yelm_context::migration::{
    ConflictReason, DetectOptions, LegacyKind, MigrationAction, MigrationService,
};

use super::fixtures::Fixture;

fn service(fx: &Fixture) -> MigrationService {
    MigrationService::new(fx.shared_config()).unwrap()
}

#[test]
fn test_detect_plan_execute_round() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("GEMINI.md"), "root legacy");
    fx.write(&proj.join("pkg").join("GEMINI.md"), "pkg legacy");

    let svc = service(&fx);
    let options = DetectOptions::from_config(svc.config()).with_include_global(false);
    let legacy = svc.detect_legacy_files(&proj, &options);
    assert_eq!(legacy.len(), 2);

    let plan = svc.suggest_migration(&legacy);
    assert!(svc.can_auto_migrate(&plan));
    assert!(plan
        .candidates
        .iter()
        .all(|c| c.action == MigrationAction::Rename));

    let result = svc.execute_migration(&plan, false);
    assert!(result.success);
    assert_eq!(result.migrated.len(), 2);
    assert_eq!(
        fs::read_to_string(proj.join("agents.md")).unwrap(),
        "root legacy"
    );
    assert_eq!(
        fs::read_to_string(proj.join("pkg").join("agents.md")).unwrap(),
        "pkg legacy"
    );
    assert!(!proj.join("GEMINI.md").exists());

    // Nothing left to do afterwards.
    assert!(svc.detect_legacy_files(&proj, &options).is_empty());
}

#[test]
fn test_collision_blocks_auto_migration() {
    let fx = Fixture::new();
    let legacy_global = fx.home.join(".gemini");
    fx.write(&legacy_global.join("agents.md"), "legacy agents");
    fx.write(&legacy_global.join("GEMINI.md"), "legacy gemini");
    let proj = fx.project("proj");

    let svc = service(&fx);
    let legacy = svc.detect_legacy_files(&proj, &DetectOptions::from_config(svc.config()));
    assert_eq!(legacy.len(), 2);
    assert!(legacy
        .iter()
        .all(|f| f.kind == LegacyKind::DeprecatedGlobalDir));

    let plan = svc.suggest_migration(&legacy);
    assert!(!svc.can_auto_migrate(&plan));

    let collision = plan
        .conflicts
        .iter()
        .find(|c| c.reason == ConflictReason::Collision)
        .unwrap();
    assert_eq!(collision.target, fx.home.join(".yelm").join("agents.md"));
    assert_eq!(collision.sources.len(), 2);
    assert!(!plan.warnings.is_empty());

    let result = svc.execute_migration(&plan, false);
    assert!(!result.success);
    assert!(result.migrated.is_empty());
    assert_eq!(result.failed.len(), 2);
    assert!(legacy_global.join("agents.md").exists());
    assert!(legacy_global.join("GEMINI.md").exists());
}

#[test]
fn test_existing_target_blocks_then_force_overwrites() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("GEMINI.md"), "legacy");
    fx.write(&proj.join("agents.md"), "current");

    let svc = service(&fx);
    let options = DetectOptions::from_config(svc.config()).with_include_global(false);
    let plan = svc.suggest_migration(&svc.detect_legacy_files(&proj, &options));

    assert_eq!(plan.conflicts.len(), 1);
    assert_eq!(plan.conflicts[0].reason, ConflictReason::TargetExists);
    assert!(!svc.can_auto_migrate(&plan));

    assert!(!svc.execute_migration(&plan, false).success);
    assert_eq!(fs::read_to_string(proj.join("agents.md")).unwrap(), "current");

    assert!(svc.execute_migration(&plan, true).success);
    assert_eq!(fs::read_to_string(proj.join("agents.md")).unwrap(), "legacy");
}

#[test]
fn test_global_move_and_keep_originals() {
    let fx = Fixture::new();
    let legacy_global = fx.home.join(".gemini");
    fx.write(&legacy_global.join("CLAUDE.md"), "claude");
    let proj = fx.project("proj");

    let mut config = fx.config();
    config.migration.keep_originals = true;
    let svc = MigrationService::new(Arc::new(config)).unwrap();

    let legacy = svc.detect_legacy_files(&proj, &DetectOptions::from_config(svc.config()));
    let plan = svc.suggest_migration(&legacy);
    assert_eq!(plan.candidates.len(), 1);
    assert_eq!(plan.candidates[0].action, MigrationAction::Copy);
    assert_eq!(
        plan.candidates[0].suggested_path,
        fx.home.join(".yelm").join("CLAUDE.md")
    );

    let result = svc.execute_migration(&plan, false);
    assert!(result.success);
    assert!(legacy_global.join("CLAUDE.md").exists());
    assert!(fx.home.join(".yelm").join("CLAUDE.md").exists());
}

#[test]
fn test_detection_file_limit() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    for i in 0..5 {
        fx.write(&proj.join(format!("d{i}")).join("GEMINI.md"), "x");
    }

    let svc = service(&fx);
    let options = DetectOptions {
        max_files: 2,
        include_global: false,
        ..DetectOptions::from_config(svc.config())
    };
    assert_eq!(svc.detect_legacy_files(&proj, &options).len(), 2);
}

#[test]
fn test_migration_does_not_touch_discovery() {
    let fx = Fixture::new();
    let proj = fx.project("proj");
    fx.write(&proj.join("GEMINI.md"), "legacy");

    let manager =
        yelm_context::manager::ContextFileManager::new(fx.shared_config()).unwrap();
    let loaded = manager.load(&proj).unwrap();

    assert_eq!(loaded.file_count, 1);
    assert!(proj.join("GEMINI.md").exists());
    assert!(!proj.join("agents.md").exists());
}
