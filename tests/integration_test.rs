// Integration tests for teamroute
use std::sync::Arc;
use std::time::Duration;
use teamroute_api::{HttpTeamResolver, RestApi};
use teamroute_core::{
    AddressQuery, CatalogResolver, Error, ResolverConfig, SegmentDraft, TeamDraft, TeamResolver,
    UnitDraft,
};
use teamroute_storage::StorageManager;

fn unit(name: &str) -> UnitDraft {
    UnitDraft {
        name: name.to_string(),
        address: "Rua Domingos de Morais, 100".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
        cep: "04010-100".to_string(),
    }
}

fn segment(street: &str, start: i64, end: i64, parity: &str, team_id: u64) -> SegmentDraft {
    SegmentDraft {
        street_name: street.to_string(),
        street_type: "Rua".to_string(),
        neighborhood: "Vila Mariana".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
        start_number: start,
        end_number: end,
        cep_prefix: "04010-100".to_string(),
        even_odd: parity.to_string(),
        team_id,
    }
}

/// One unit with teams T1 and T2; "Rua das Flores" odd numbers go to T1,
/// even numbers to T2.
fn seeded(storage: &StorageManager) -> (u64, u64, u64) {
    let ubs = storage.create_unit(unit("UBS Vila Mariana")).unwrap();
    let t1 = storage
        .create_team(TeamDraft {
            name: "T1".to_string(),
            ubs_id: ubs.id,
        })
        .unwrap();
    let t2 = storage
        .create_team(TeamDraft {
            name: "T2".to_string(),
            ubs_id: ubs.id,
        })
        .unwrap();
    storage
        .create_segment(segment("Rua das Flores", 1, 999, "odd", t1.team.id))
        .unwrap();
    storage
        .create_segment(segment("Rua das Flores", 2, 1000, "even", t2.team.id))
        .unwrap();
    (ubs.id, t1.team.id, t2.team.id)
}

#[test]
fn test_crud_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();

    let ubs = storage.create_unit(unit("UBS Centro")).unwrap();
    assert_eq!(ubs.city, "SAO PAULO");
    assert_eq!(ubs.postal_code, "04010100");

    let team = storage
        .create_team(TeamDraft {
            name: "Equipe Azul".to_string(),
            ubs_id: ubs.id,
        })
        .unwrap();
    assert_eq!(team.ubs.as_ref().map(|u| u.id), Some(ubs.id));

    let created = storage
        .create_segment(segment("Rua  das Flôres", 1, 500, "ALL", team.team.id))
        .unwrap();
    assert_eq!(created.segment.street_name, "RUA DAS FLORES");
    assert_eq!(created.segment.original_street_name, "Rua  das Flôres");
    assert_eq!(created.segment.postal_prefix, "04010");

    let listed = storage.list_segments();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].team.as_ref().unwrap().team.name, "Equipe Azul");

    let renamed = storage
        .update_team(team.team.id, TeamDraft {
            name: "Equipe Verde".to_string(),
            ubs_id: ubs.id,
        })
        .unwrap();
    assert_eq!(renamed.team.created_at, team.team.created_at);
    let joined = storage.get_segment(created.segment.id).unwrap();
    assert_eq!(joined.team.unwrap().team.name, "Equipe Verde");
}

#[test]
fn test_segment_validation() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let (_, t1, _) = seeded(&storage);

    let err = storage.create_segment(segment("Rua A", 10, 1, "all", t1)).unwrap_err();
    assert!(matches!(err, Error::InvalidRange { start: 10, end: 1 }));

    let err = storage.create_segment(segment("Rua A", 1, 10, "both", t1)).unwrap_err();
    assert!(matches!(err, Error::InvalidParity(_)));

    let err = storage.create_segment(segment("   ", 1, 10, "all", t1)).unwrap_err();
    assert!(err.is_input_error());

    // a single-number segment is valid
    assert!(storage.create_segment(segment("Rua A", 7, 7, "all", t1)).is_ok());
}

#[test]
fn test_persistence_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let (ubs_id, t1, _) = {
        let storage = StorageManager::new(dir.path()).unwrap();
        seeded(&storage)
    };

    let storage = StorageManager::new(dir.path()).unwrap();
    assert_eq!(storage.list_units().len(), 1);
    assert_eq!(storage.list_teams().len(), 2);
    assert_eq!(storage.list_segments().len(), 2);
    assert_eq!(storage.get_team(t1).unwrap().ubs.unwrap().id, ubs_id);

    // ids keep increasing after a restart
    let next = storage.create_unit(unit("UBS Nova")).unwrap();
    assert_eq!(next.id, ubs_id + 1);
}

#[tokio::test]
async fn test_resolution_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(StorageManager::new(dir.path()).unwrap());
    let (ubs_id, t1, t2) = seeded(&storage);
    let resolver = CatalogResolver::new(storage.clone());

    let odd = AddressQuery::new("rua das flôres", 41, "são paulo", "sp").unwrap();
    let found = resolver.resolve_address(&odd).await.unwrap().unwrap();
    assert_eq!(found.team.id, t1);
    assert_eq!(found.ubs.id, ubs_id);

    let even = AddressQuery::new("Rua das Flores", 42, "São Paulo", "SP").unwrap();
    assert_eq!(resolver.resolve_address(&even).await.unwrap().unwrap().team.id, t2);

    let outside = AddressQuery::new("Rua das Flores", 1001, "São Paulo", "SP").unwrap();
    assert!(resolver.resolve_address(&outside).await.unwrap().is_none());

    let elsewhere = AddressQuery::new("Avenida Paulista", 42, "São Paulo", "SP").unwrap();
    assert!(resolver.resolve_address(&elsewhere).await.unwrap().is_none());
}

#[tokio::test]
async fn test_resolution_sees_updates() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(StorageManager::new(dir.path()).unwrap());
    let (_, t1, t2) = seeded(&storage);
    let resolver = CatalogResolver::new(storage.clone());
    let query = AddressQuery::new("Rua das Flores", 41, "São Paulo", "SP").unwrap();

    assert_eq!(resolver.resolve_address(&query).await.unwrap().unwrap().team.id, t1);

    let odd = storage
        .list_segments()
        .into_iter()
        .find(|s| s.segment.team_id == t1)
        .unwrap();
    storage
        .update_segment(odd.segment.id, segment("Rua das Flores", 1, 999, "odd", t2))
        .unwrap();
    assert_eq!(resolver.resolve_address(&query).await.unwrap().unwrap().team.id, t2);

    storage.delete_segment(odd.segment.id).unwrap();
    assert!(resolver.resolve_address(&query).await.unwrap().is_none());
}

#[test]
fn test_referential_rules() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageManager::new(dir.path()).unwrap();
    let (ubs_id, t1, _) = seeded(&storage);

    assert!(matches!(storage.delete_team(t1), Err(Error::TeamHasSegments(_))));
    assert!(matches!(storage.delete_unit(ubs_id), Err(Error::UnitHasTeams(_))));
    assert!(storage
        .create_team(TeamDraft {
            name: "Orphan".to_string(),
            ubs_id: 999,
        })
        .unwrap_err()
        .is_input_error());
    assert!(storage
        .update_segment(1, segment("Rua das Flores", 1, 999, "odd", 999))
        .unwrap_err()
        .is_input_error());
}

#[tokio::test]
async fn test_snapshot_restore() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(StorageManager::new(dir.path()).unwrap());
    let (_, t1, _) = seeded(&storage);
    let resolver = CatalogResolver::new(storage.clone());
    let query = AddressQuery::new("Rua das Flores", 41, "São Paulo", "SP").unwrap();

    let snapshot = storage.create_snapshot().unwrap();
    assert_eq!(storage.list_snapshots().unwrap().len(), 1);

    for view in storage.list_segments() {
        storage.delete_segment(view.segment.id).unwrap();
    }
    assert!(resolver.resolve_address(&query).await.unwrap().is_none());

    let checksum = snapshot.checksum.clone().unwrap();
    storage.restore_snapshot(&snapshot.name, Some(&checksum)).unwrap();
    assert_eq!(resolver.resolve_address(&query).await.unwrap().unwrap().team.id, t1);

    // restored catalog survives a restart
    drop(resolver);
    drop(storage);
    let reopened = StorageManager::new(dir.path()).unwrap();
    assert_eq!(reopened.list_segments().len(), 2);

    reopened.delete_snapshot(&snapshot.name).unwrap();
    assert!(matches!(
        reopened.delete_snapshot(&snapshot.name),
        Err(Error::SnapshotNotFound(_))
    ));
}

#[tokio::test]
async fn test_lookup_timeout_is_configurable() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(StorageManager::new(dir.path()).unwrap());
    seeded(&storage);

    let resolver = CatalogResolver::with_config(
        storage,
        ResolverConfig {
            similarity_threshold: 0.3,
            lookup_timeout: Duration::from_secs(1),
        },
    );
    let query = AddressQuery::new("Rua das Flores", 41, "São Paulo", "SP").unwrap();
    assert!(resolver.resolve_address(&query).await.unwrap().is_some());
}

#[actix_web::test]
async fn test_http_resolver_against_live_server() {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(StorageManager::new(dir.path()).unwrap());
    let (ubs_id, _, t2) = seeded(&storage);

    let (server, addrs) =
        RestApi::bind(storage, ResolverConfig::default(), ("127.0.0.1", 0)).unwrap();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let resolver = HttpTeamResolver::new(format!("http://{}", addrs[0])).unwrap();

    let query = AddressQuery::new("Rua das Flôres", 42, "São Paulo", "SP").unwrap();
    let found = resolver.resolve_address(&query).await.unwrap().unwrap();
    assert_eq!(found.team.id, t2);
    assert_eq!(found.ubs.id, ubs_id);

    let missing = AddressQuery::new("Rua das Flores", 5000, "São Paulo", "SP").unwrap();
    assert!(resolver.resolve_address(&missing).await.unwrap().is_none());

    // a 404 from a route that does not exist is a failure, not "no team"
    let misrouted = HttpTeamResolver::new(format!("http://{}/v2", addrs[0])).unwrap();
    assert!(matches!(
        misrouted.resolve_address(&query).await,
        Err(Error::Upstream(_))
    ));

    handle.stop(true).await;
}
