use stepwise_core::config::MigrationConfig;
use stepwise_core::IssueId;
use stepwise_migration::{combine, MigrationResult, MultiProjectMigration, ProjectMigrator, ResultCode};
use stepwise_test_utils::{failed_map, issues, FakeIssueMigrator};

fn config(threshold: usize) -> MigrationConfig {
    MigrationConfig {
        failure_threshold: threshold,
    }
}

#[test]
fn projects_migrate_until_one_terminates() {
    let cfg = config(3);
    let mut migration = MultiProjectMigration::new();

    let mut alpha = FakeIssueMigrator::failing([2]);
    let result = ProjectMigrator::new("Alpha", &cfg).run(&issues("ALP", 5), &mut alpha).unwrap();
    assert_eq!(result.code(), ResultCode::Success);
    assert_eq!(alpha.migrated.len(), 4);
    migration.push("Alpha", result).unwrap();

    let mut beta = FakeIssueMigrator::failing([1, 2, 3, 4]);
    let result = ProjectMigrator::new("Beta", &cfg).run(&issues("BET", 6), &mut beta).unwrap();
    assert!(result.is_terminated());
    assert_eq!(result.failed_count(), 3);
    assert!(!result.failed_issues().contains_key(&IssueId(4)));
    migration.push("Beta", result).unwrap();

    assert!(migration.push("Gamma", MigrationResult::success(Default::default())).is_err());

    // Alpha's issue 2 and Beta's issues 1..=3 share ids but not keys.
    let overall = migration.result();
    assert!(overall.is_err());
    assert_eq!(migration.failed_count(), 4);
    assert_eq!(migration.terminated_project(), Some("Beta"));
}

#[test]
fn refused_project_touches_nothing() {
    let mut refusing = FakeIssueMigrator::refusing("Status 'Triage' has no target in the new workflow");
    let result = ProjectMigrator::new("Support", &MigrationConfig::default())
        .run(&issues("SUP", 4), &mut refusing)
        .unwrap();

    assert!(result.is_terminated());
    assert!(result.failed_issues().is_empty());
    assert!(refusing.migrated.is_empty());

    let mut migration = MultiProjectMigration::new();
    migration.push("Support", result).unwrap();
    let overall = migration.result().unwrap();
    assert_eq!(overall.errors().messages.len(), 1);
}

#[test]
fn default_threshold_is_ten() {
    let mut migrator = FakeIssueMigrator::failing(1..=10);
    let result = ProjectMigrator::new("Big", &MigrationConfig::default())
        .run(&issues("BIG", 30), &mut migrator)
        .unwrap();
    assert!(result.is_terminated());
    assert_eq!(result.failed_count(), 10);

    let mut migrator = FakeIssueMigrator::failing(1..=9);
    let result = ProjectMigrator::new("Big", &MigrationConfig::default())
        .run(&issues("BIG", 30), &mut migrator)
        .unwrap();
    assert!(result.is_success());
    assert_eq!(migrator.migrated.len(), 21);
}

#[test]
fn combined_results_merge_failures_across_projects() {
    let alpha = MigrationResult::success(failed_map(&[(1, "ALP-1"), (4, "ALP-4")]));
    let beta = MigrationResult::terminated_with_failures(failed_map(&[(9, "BET-9")])).unwrap();

    let combined = combine(&[alpha.clone(), beta.clone()]).unwrap();
    assert!(combined.is_terminated());
    assert_eq!(
        combined.failed_issues(),
        &failed_map(&[(1, "ALP-1"), (4, "ALP-4"), (9, "BET-9")])
    );
    assert_eq!(combine(&[beta, alpha]).unwrap(), combined);

    let clash = MigrationResult::success(failed_map(&[(4, "OTHER-4")]));
    assert!(combine(&[combined, clash]).is_err());
}
