#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{Fixture, BASELINE_BODY};
use limdb_core::errors::ExErrorKind;
use limdb_core::model::TableKind;
use limdb_engine::{
    fingerprint_store, history, in_effect_at, merge_revision_file, rebuild_from_scratch,
    rebuild_plan, verify_reproducible, RevisionInput,
};
use limdb_store::atomic::staging_path;
use limdb_store::{db, repo};
use std::fs;

#[test]
fn test_baseline_is_forced_to_version_zero() {
    // GIVEN a baseline whose file says revision 1.12
    let fx = Fixture::new();

    // WHEN rebuilding from it
    let outcome = rebuild_from_scratch(&[fx.baseline()], &fx.store_path(), &fx.ctx()).unwrap();

    // THEN it is stored as version 0 with everything added
    let first = &outcome.revisions[0];
    assert_eq!(first.version, 0);
    assert_eq!(first.revision, "2.0");
    assert_eq!(first.limits.added, 4);
    assert_eq!(first.states.added, 1);

    // AND reference sets fill TEPHIN
    let tephin = history(&fx.store_path(), "TEPHIN", TableKind::Limit).unwrap();
    assert_eq!(tephin.len(), 2);
}

#[test]
fn test_two_rebuilds_give_identical_table_hashes() {
    // GIVEN the same inputs rebuilt into two stores
    let fx = Fixture::new();
    let inputs = vec![
        fx.baseline(),
        fx.archive("2.1", "2000/02/01 00:00:00", "MLOAD BAR\nMLIMIT SET 0 PPENG 0 1 11 20\n"),
    ];
    let other = fx.dir.path().join("other.sqlite3");

    let a = rebuild_from_scratch(&inputs, &fx.store_path(), &fx.ctx()).unwrap();
    let b = rebuild_from_scratch(&inputs, &other, &fx.ctx()).unwrap();

    // THEN every ledger row agrees on tables and counts
    for (x, y) in a.revisions.iter().zip(b.revisions.iter()) {
        assert!(x.fingerprint.same_tables(&y.fingerprint));
    }
}

#[test]
fn test_rebuild_equals_baseline_then_merge() {
    // GIVEN one store rebuilt in full and one built incrementally
    let fx = Fixture::new();
    let revision = fx.archive("2.1", "2000/02/01 00:00:00", "MLOAD FOO\nMLMENABLE 0\n");
    let full = rebuild_from_scratch(&[fx.baseline(), revision.clone()], &fx.store_path(), &fx.ctx())
        .unwrap();

    let incremental_path = fx.dir.path().join("incremental.sqlite3");
    rebuild_from_scratch(&[fx.baseline()], &incremental_path, &fx.ctx()).unwrap();
    let merged = merge_revision_file(&incremental_path, &revision, &fx.ctx()).unwrap();

    // THEN both describe the same tables
    assert!(full.fingerprint().unwrap().same_tables(&merged.fingerprint));
}

#[test]
fn test_rebuild_replaces_existing_store_atomically() {
    // GIVEN an existing store
    let fx = Fixture::new();
    rebuild_from_scratch(&[fx.baseline()], &fx.store_path(), &fx.ctx()).unwrap();
    let before = fs::read(fx.store_path()).unwrap();

    // WHEN a rebuild fails on its second revision
    let broken = fx.archive("2.1", "2000/02/01 00:00:00", "MLIMIT SET 0 EXPST ON\n");
    let err = rebuild_from_scratch(&[fx.baseline(), broken], &fx.store_path(), &fx.ctx())
        .unwrap_err();

    // THEN the old store is untouched and no staging file remains
    assert_eq!(err.kind(), ExErrorKind::MalformedInput);
    assert_eq!(fs::read(fx.store_path()).unwrap(), before);
    assert!(!staging_path(&fx.store_path()).exists());
}

#[test]
fn test_failed_rebuild_keeps_tmp_named_store() {
    // GIVEN a store whose configured file name already ends in `.tmp`
    let mut fx = Fixture::new();
    fx.config.store_file = "glimmondb.tmp".to_string();
    rebuild_from_scratch(&[fx.baseline()], &fx.store_path(), &fx.ctx()).unwrap();
    let before = fs::read(fx.store_path()).unwrap();

    // WHEN a rebuild fails on a revision without `$Date`
    let undated = fx.dir.path().join("G_LIMMON_2.1.dec");
    fs::write(&undated, "# $Revision: 2.1 $\nMLOAD BAR\n").unwrap();
    let inputs = vec![fx.baseline(), RevisionInput::new(undated)];
    let err = rebuild_from_scratch(&inputs, &fx.store_path(), &fx.ctx()).unwrap_err();

    // THEN the production store is still there, byte for byte
    assert_eq!(err.kind(), ExErrorKind::MissingMetadata);
    assert_eq!(fs::read(fx.store_path()).unwrap(), before);
    assert!(!staging_path(&fx.store_path()).exists());
}

#[test]
fn test_rebuild_plan_replays_archive_in_order() {
    // GIVEN archive files written out of order
    let fx = Fixture::new();
    fx.archive("2.10", "2000/04/01 00:00:00", "MLOAD BAR\nMLIMIT SET 0 PPENG 0 1 13 20\n");
    fx.archive("2.9", "2000/03/01 00:00:00", "MLOAD BAR\nMLIMIT SET 0 PPENG 0 1 12 20\n");

    // WHEN planning and running a full rebuild
    let plan = rebuild_plan(&fx.config).unwrap();
    let outcome = rebuild_from_scratch(&plan, &fx.store_path(), &fx.ctx()).unwrap();

    // THEN versions come out 0, 9, 10
    let versions: Vec<_> = outcome.revisions.iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![0, 9, 10]);
    let conn = db::open_existing(fx.store_path()).unwrap();
    assert_eq!(repo::max_version(&conn).unwrap(), Some(10));
}

#[test]
fn test_in_effect_at_between_revisions() {
    let fx = Fixture::new();
    let inputs = vec![
        fx.baseline(),
        fx.archive("2.1", "2000/02/01 00:00:00", "MLOAD BAR\nMLIMIT SET 0 PPENG 0 1 11 20\n"),
    ];
    let outcome = rebuild_from_scratch(&inputs, &fx.store_path(), &fx.ctx()).unwrap();
    let conn = db::open_existing(fx.store_path()).unwrap();
    let versions = repo::list_versions(&conn).unwrap();
    drop(conn);

    let midway = (versions[0].datesec + versions[1].datesec) / 2.0;
    let rows = in_effect_at(&fx.store_path(), "bar", TableKind::Limit, midway).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stamp().modversion, 0);
    assert_eq!(outcome.revisions.len(), 2);
}

#[test]
fn test_fingerprint_store_keeps_source_columns() {
    let fx = Fixture::new();
    let outcome = rebuild_from_scratch(&[fx.baseline()], &fx.store_path(), &fx.ctx()).unwrap();

    let record = fingerprint_store(&fx.store_path()).unwrap();

    assert!(record.same_tables(outcome.fingerprint().unwrap()));
    assert_eq!(record.source_file.as_deref(), Some("G_LIMMON_P007A.dec"));
    assert!(record.db_hash.is_some());
}

#[test]
fn test_verify_reproducible_agrees() {
    let fx = Fixture::new();
    fx.archive("2.1", "2000/02/01 00:00:00", BASELINE_BODY);
    let plan = rebuild_plan(&fx.config).unwrap();

    let report = verify_reproducible(&plan, &fx.ctx()).unwrap();

    assert_eq!(report.revisions, 2);
    assert_eq!(report.version, 1);
    assert_eq!(report.version_count, 2);
}
