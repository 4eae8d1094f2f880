//! Program reads through the service

use catalog_core::{CatalogConfig, CatalogError, HierarchyError, ProgramCatalogService};
use catalog_model::{EffortPayload, NewProgram, ProgramKey};
use catalog_store::MemoryStore;
use catalog_test_utils::{
    current, program, program_dated, sample_hierarchy, seed_programs, seeded_memory_store,
    FaultPoint, FaultyStore,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn service_with(programs: &[NewProgram]) -> (Arc<MemoryStore>, ProgramCatalogService) {
    let store = Arc::new(seeded_memory_store(programs));
    let service = ProgramCatalogService::new(store.clone(), &CatalogConfig::new());
    (store, service)
}

#[tokio::test]
async fn tree_aggregates_descendant_expectations() {
    let (_, service) = service_with(&sample_hierarchy());
    let tree = service.get_program_tree().await.unwrap().unwrap();

    assert_eq!(tree.program_id, "100");
    assert!(tree.has_descendant_expecting_software_effort);
    assert!(!tree.expecting_software_efforts);

    let child = tree.find("1.1").unwrap();
    assert!(child.expecting_software_efforts);
    assert!(!child.has_descendant_expecting_software_effort);
    assert!(!tree.find("1.2").unwrap().has_descendant_expecting_software_effort);

    let ids: Vec<&str> = tree.children.iter().map(|c| c.program_id.as_str()).collect();
    assert_eq!(ids, vec!["110", "120"]);
    assert_eq!(tree.node_count(), 4);
}

#[tokio::test]
async fn empty_catalog_has_no_tree() {
    let (_, service) = service_with(&[]);
    assert!(service.get_program_tree().await.unwrap().is_none());
    assert!(service.get_all_programs().await.unwrap().is_empty());
}

#[tokio::test]
async fn several_roots_are_rejected() {
    let (_, service) = service_with(&[program("1", "1"), program("2", "2"), program("3", "1.1")]);
    let err = service.get_program_tree().await.unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Hierarchy(HierarchyError::MultipleRoots { count: 2, .. })
    ));
}

#[tokio::test]
async fn latest_version_wins() {
    let (_, service) = service_with(&[
        program_dated("100", "1", 1),
        NewProgram {
            name: "Renamed".into(),
            ..program_dated("100", "1", 5)
        },
        program_dated("100", "1", 3),
    ]);
    let programs = service.get_all_programs().await.unwrap();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0].name, "Renamed");
}

#[tokio::test]
async fn inactive_rows_are_ignored() {
    let (_, service) = service_with(&[
        program("100", "1"),
        program_dated("200", "1.1", 1),
        NewProgram {
            name: "Withdrawn".into(),
            ..program_dated("200", "1.1", 2).with_active(false)
        },
        program("300", "1.2").with_active(false),
    ]);
    let programs = service.get_all_programs().await.unwrap();
    assert_eq!(current(&programs, "200").unwrap().name, "Program 200");
    assert!(current(&programs, "300").is_none());
    assert!(service.get_program_by_id("300").await.unwrap().is_none());
}

#[tokio::test]
async fn returned_programs_are_copies() {
    let (_, service) = service_with(&sample_hierarchy());
    let mut first = service.get_all_programs().await.unwrap();
    first[0].name = "changed by caller".into();
    first.clear();

    let second = service.get_all_programs().await.unwrap();
    assert_eq!(second.len(), 4);
    assert_eq!(second[0].name, "Program 100");
}

#[tokio::test]
async fn cached_list_is_reused_until_invalidated() {
    let (store, service) = service_with(&sample_hierarchy());
    service.get_all_programs().await.unwrap();
    let before = store.transactions_started();

    service.get_all_programs().await.unwrap();
    service.get_program_tree().await.unwrap();
    assert_eq!(store.transactions_started(), before);

    seed_programs(&*store, &[program("130", "1.3")]);
    assert_eq!(service.get_all_programs().await.unwrap().len(), 4);

    service.invalidate_program_cache().await;
    assert_eq!(service.get_all_programs().await.unwrap().len(), 5);
}

#[tokio::test]
async fn inserting_a_version_refreshes_programs() {
    let (_, service) = service_with(&sample_hierarchy());
    assert!(service.get_program_by_id("130").await.unwrap().is_none());

    let key = service
        .insert_program_version(program("130", "1.3"))
        .await
        .unwrap();

    let found = service.get_program_by_id("130").await.unwrap().unwrap();
    assert_eq!(found.key, key);
    assert_eq!(service.get_program_by_key(key).await.unwrap(), Some(found));
}

#[tokio::test]
async fn import_is_all_or_nothing_per_call() {
    let faulty = Arc::new(FaultyStore::new(MemoryStore::new()));
    let service = ProgramCatalogService::new(faulty.clone(), &CatalogConfig::new());

    faulty.fail_after(FaultPoint::InsertProgram, 2);
    let err = service.import_programs(sample_hierarchy()).await.unwrap_err();
    assert!(matches!(err, CatalogError::Store(_)));
    assert_eq!(faulty.injected(), 1);
    assert!(service.get_all_programs().await.unwrap().is_empty());

    faulty.clear();
    let keys = service.import_programs(sample_hierarchy()).await.unwrap();
    assert_eq!(keys.len(), 4);
    assert_eq!(service.get_all_programs().await.unwrap().len(), 4);
    assert!(service.get_program_tree().await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn write_during_load_is_not_hidden_by_stale_cache() {
    let faulty = Arc::new(FaultyStore::new(seeded_memory_store(&[program("1", "1")])));
    let service = ProgramCatalogService::new(faulty.clone(), &CatalogConfig::new());

    let gate = faulty.hold_next_commit();
    let reader = {
        let service = service.clone();
        tokio::spawn(async move { service.get_all_programs().await })
    };
    let gate = tokio::task::spawn_blocking(move || {
        gate.wait_committed();
        gate
    })
    .await
    .unwrap();

    service
        .insert_program_version(program("2", "1.1"))
        .await
        .unwrap();
    gate.release();

    assert_eq!(reader.await.unwrap().unwrap().len(), 1);
    assert_eq!(service.get_all_programs().await.unwrap().len(), 2);
}

#[tokio::test]
async fn superseded_version_is_not_found_by_key() {
    let store = Arc::new(MemoryStore::new());
    let keys = seed_programs(
        &*store,
        &[program_dated("100", "1", 1), program_dated("100", "1", 2)],
    );
    let service = ProgramCatalogService::new(store, &CatalogConfig::new());

    assert!(service.get_program_by_key(keys[0]).await.unwrap().is_none());
    assert!(service.get_program_by_key(keys[1]).await.unwrap().is_some());
    assert!(service
        .get_program_by_key(ProgramKey(9_999))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn efforts_for_unknown_program_is_none() {
    let (_, service) = service_with(&sample_hierarchy());
    assert!(service.get_efforts_for_program("999").await.unwrap().is_none());
    assert_eq!(
        service.get_efforts_for_program("110").await.unwrap(),
        Some(Vec::new())
    );
}

#[tokio::test]
async fn efforts_are_listed_per_program() {
    let (_, service) = service_with(&sample_hierarchy());
    for name in ["Alpha", "Beta"] {
        service
            .save_effort("110", Some(EffortPayload::named(name)))
            .await
            .unwrap();
    }
    service
        .save_effort("120", Some(EffortPayload::named("Gamma")))
        .await
        .unwrap();

    let efforts = service.get_efforts_for_program("110").await.unwrap().unwrap();
    let mut names: Vec<_> = efforts.iter().map(|e| e.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Alpha", "Beta"]);
    assert!(efforts.iter().all(|e| e.program_id == "110"));
}

#[tokio::test]
async fn malformed_uuid_lookup_skips_storage() {
    let (store, service) = service_with(&sample_hierarchy());
    let before = store.transactions_started();
    assert!(service.get_effort("nope").await.unwrap().is_none());
    assert_eq!(store.transactions_started(), before);
}
