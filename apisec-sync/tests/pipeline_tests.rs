//! End-to-end runs against an in-memory management service.
//!
//! Providers are scripted through their settings: `hosts` lists the hosts to
//! return (each under `/v1`), `fail` makes the provider error, `tag` is copied
//! into every returned spec.

use std::cell::RefCell;

use apisec_core::{
    ApiIdentity, ApiSpec, DesiredSet, ExistingInventory, ManagementService, ProviderConfig, ProviderKind, RemoteId,
    ServiceError, Settings,
};
use apisec_fetchers::{FetchError, Fetcher, FetcherRegistry};
use apisec_sync::{gather, plan, reconcile, run, Category, RunError, RunReport};
use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    List,
    Create(ApiIdentity),
    Update(RemoteId, ApiIdentity),
    Delete(RemoteId),
}

#[derive(Default)]
struct FakeService {
    inventory: RefCell<ExistingInventory>,
    calls: RefCell<Vec<Call>>,
    fail_list: bool,
    fail_on: Vec<ApiIdentity>,
    fail_ids: Vec<RemoteId>,
    next_id: RefCell<u64>,
}

impl FakeService {
    fn with(entries: &[(&str, u64)]) -> Self {
        let service = Self::default();
        for (host, id) in entries {
            service
                .inventory
                .borrow_mut()
                .insert(ApiIdentity::from_parts(host, "/v1"), RemoteId::from(*id));
        }
        *service.next_id.borrow_mut() = 1000;
        service
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| *c != Call::List).collect()
    }

    fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| f(c)).count()
    }
}

impl ManagementService for FakeService {
    fn list(&self) -> Result<ExistingInventory, ServiceError> {
        self.calls.borrow_mut().push(Call::List);
        if self.fail_list {
            return Err(ServiceError::Status {
                code: 500,
                body: "down".to_string(),
            });
        }
        Ok(self.inventory.borrow().clone())
    }

    fn create(&self, spec: &ApiSpec) -> Result<(), ServiceError> {
        let identity = spec.identity().expect("identity");
        self.calls.borrow_mut().push(Call::Create(identity.clone()));
        if self.fail_on.contains(&identity) {
            return Err(ServiceError::Network("timed out".to_string()));
        }
        let mut next = self.next_id.borrow_mut();
        *next += 1;
        self.inventory.borrow_mut().insert(identity, RemoteId::from(*next));
        Ok(())
    }

    fn update(&self, id: &RemoteId, spec: &ApiSpec) -> Result<(), ServiceError> {
        let identity = spec.identity().expect("identity");
        self.calls.borrow_mut().push(Call::Update(id.clone(), identity.clone()));
        if self.fail_on.contains(&identity) {
            return Err(ServiceError::Malformed("bad spec".to_string()));
        }
        Ok(())
    }

    fn delete(&self, id: &RemoteId) -> Result<(), ServiceError> {
        self.calls.borrow_mut().push(Call::Delete(id.clone()));
        if self.fail_ids.contains(id) {
            return Err(ServiceError::Status {
                code: 409,
                body: "in use".to_string(),
            });
        }
        self.inventory.borrow_mut().retain(|_, v| v != id);
        Ok(())
    }
}

struct Scripted;

impl Fetcher for Scripted {
    fn fetch(&self, settings: &Settings) -> Result<DesiredSet, FetchError> {
        if settings.get("fail").and_then(|v| v.as_bool()) == Some(true) {
            return Err(FetchError::Transport {
                url: "https://provider.test".to_string(),
                message: "connection refused".to_string(),
            });
        }
        let hosts = settings
            .get("hosts")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(hosts
            .iter()
            .filter_map(|h| h.as_str())
            .map(|h| {
                let spec = ApiSpec::new(json!({ "host": h, "basePath": "/v1", "tag": settings.get("tag") }));
                (ApiIdentity::from_parts(h, "/v1"), spec)
            })
            .collect())
    }
}

fn registry() -> FetcherRegistry {
    let mut registry = FetcherRegistry::empty();
    registry
        .register(ProviderKind::FileSystem, Scripted)
        .register(ProviderKind::ThreeScale, Scripted)
        .register(ProviderKind::Azure, Scripted);
    registry
}

fn provider(kind: ProviderKind, settings: serde_json::Value) -> ProviderConfig {
    ProviderConfig {
        kind,
        active: true,
        settings: settings.as_object().cloned().expect("settings object"),
    }
}

fn id(host: &str) -> ApiIdentity {
    ApiIdentity::from_parts(host, "/v1")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn updates_existing_and_creates_missing() {
    let service = FakeService::with(&[("a.com", 1)]);
    let providers = [provider(ProviderKind::FileSystem, json!({ "hosts": ["a.com", "b.com"] }))];

    let report = run(&providers, &registry(), &service, None).expect("run");

    assert_eq!(
        service.mutations(),
        vec![Call::Update(RemoteId::from(1), id("a.com")), Call::Create(id("b.com"))]
    );
    assert_eq!(service.count(|c| matches!(c, Call::Delete(_))), 0);

    assert!(!report.has_errors);
    assert_eq!(report.apis.added.success, vec!["b.com/v1"]);
    assert_eq!(report.apis.updated.success, vec!["a.com/v1"]);
    assert_eq!(report.fetchers.success, vec!["FileSystemFetcher"]);
    assert_eq!(report.exit_code(), 0);
}

#[test]
fn empty_provider_is_an_error_but_others_still_reconcile() {
    let service = FakeService::with(&[("a.com", 1)]);
    let providers = [
        provider(ProviderKind::FileSystem, json!({ "hosts": [] })),
        provider(ProviderKind::ThreeScale, json!({ "hosts": ["c.com"] })),
    ];

    let report = run(&providers, &registry(), &service, None).expect("run");

    assert_eq!(service.count(|c| matches!(c, Call::Create(_))), 1);
    assert!(service.calls().contains(&Call::Create(id("c.com"))));
    assert!(service.calls().contains(&Call::Delete(RemoteId::from(1))));
    assert_eq!(report.fetchers.error, vec!["FileSystemFetcher"]);
    assert_eq!(report.fetchers.success, vec!["ThreeScaleFetcher"]);
    assert!(report.has_errors);
    assert_eq!(report.exit_code(), 1);
}

#[rstest]
#[case::all_empty(json!({ "hosts": [] }), json!({ "hosts": [] }))]
#[case::all_failing(json!({ "fail": true }), json!({ "fail": true }))]
#[case::mixed(json!({ "fail": true }), json!({ "hosts": [] }))]
fn nothing_fetched_never_mutates(#[case] first: serde_json::Value, #[case] second: serde_json::Value) {
    let service = FakeService::with(&[("a.com", 1), ("b.com", 2)]);
    let status = TempDir::new().unwrap();
    let providers = [
        provider(ProviderKind::FileSystem, first),
        provider(ProviderKind::Azure, second),
    ];

    let err = run(&providers, &registry(), &service, Some(status.path())).unwrap_err();

    assert!(service.mutations().is_empty(), "mutations: {:?}", service.mutations());
    let report = match err {
        RunError::NothingFetched(report) => report,
        other => panic!("expected NothingFetched, got {other}"),
    };
    assert!(report.has_errors);
    assert_eq!(report.fetchers.error, vec!["FileSystemFetcher", "AzureFetcher"]);
    for category in [Category::Added, Category::Updated, Category::Deleted] {
        let bucket = report.apis.bucket(category);
        assert!(bucket.success.is_empty() && bucket.error.is_empty());
    }

    let persisted = RunReport::load_at(status.path()).expect("status.json");
    assert_eq!(persisted, *report);
}

#[test]
fn no_enabled_providers_aborts_without_mutations() {
    let service = FakeService::with(&[("a.com", 1)]);
    let mut disabled = provider(ProviderKind::FileSystem, json!({ "hosts": ["a.com"] }));
    disabled.active = false;

    let err = run(&[disabled], &registry(), &service, None).unwrap_err();

    assert!(matches!(err, RunError::NothingFetched(_)));
    assert!(service.mutations().is_empty());
}

#[test]
fn inventory_failure_aborts_before_fetching() {
    let service = FakeService {
        fail_list: true,
        ..FakeService::default()
    };
    let status = TempDir::new().unwrap();
    let providers = [provider(ProviderKind::FileSystem, json!({ "hosts": ["a.com"] }))];

    let err = run(&providers, &registry(), &service, Some(status.path())).unwrap_err();

    assert!(matches!(err, RunError::Inventory(ServiceError::Status { code: 500, .. })));
    assert_eq!(service.calls(), vec![Call::List]);
    assert!(!status.path().join("status.json").exists());
}

#[test]
fn later_provider_wins_duplicate_identity() {
    let service = FakeService::with(&[]);
    let providers = [
        provider(ProviderKind::FileSystem, json!({ "hosts": ["x.com"], "tag": "p1" })),
        provider(ProviderKind::ThreeScale, json!({ "hosts": ["x.com"], "tag": "p2" })),
    ];

    let snapshot = gather(&providers, &registry(), &service).expect("gather");
    assert_eq!(snapshot.fetch.desired[&id("x.com")].document()["tag"], "p2");

    run(&providers, &registry(), &service, None).expect("run");
    assert_eq!(service.count(|c| matches!(c, Call::Create(_))), 1);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn item_failures_are_isolated() {
    let mut service = FakeService::with(&[("a.com", 1), ("gone.com", 2), ("stuck.com", 3)]);
    service.fail_on = vec![id("a.com"), id("new.com")];
    service.fail_ids = vec![RemoteId::from(3)];
    let providers = [provider(ProviderKind::FileSystem, json!({ "hosts": ["a.com", "b.com", "new.com"] }))];

    let report = run(&providers, &registry(), &service, None).expect("run");

    // Every planned action was attempted despite earlier failures.
    assert_eq!(service.mutations().len(), 5);
    assert_eq!(report.apis.added.success, vec!["b.com/v1"]);
    assert_eq!(report.apis.added.error, vec!["new.com/v1"]);
    assert_eq!(report.apis.updated.error, vec!["a.com/v1"]);
    assert_eq!(report.apis.deleted.success, vec!["gone.com/v1"]);
    assert_eq!(report.apis.deleted.error, vec!["stuck.com/v1"]);
    assert!(report.has_errors);
}

#[test]
fn second_run_converges_to_updates_only() {
    let service = FakeService::with(&[("old.com", 9)]);
    let providers = [provider(ProviderKind::FileSystem, json!({ "hosts": ["a.com", "b.com"] }))];

    run(&providers, &registry(), &service, None).expect("first run");
    service.calls.borrow_mut().clear();

    let report = run(&providers, &registry(), &service, None).expect("second run");

    assert_eq!(service.count(|c| matches!(c, Call::Create(_))), 0);
    assert_eq!(service.count(|c| matches!(c, Call::Delete(_))), 0);
    assert_eq!(service.count(|c| matches!(c, Call::Update(..))), 2);
    assert_eq!(report.apis.updated.success.len(), 2);
}

#[test]
fn plan_covers_the_union_exactly_once() {
    let existing: ExistingInventory = [("a.com", 1), ("b.com", 2), ("c.com", 3)]
        .iter()
        .map(|(h, i)| (id(h), RemoteId::from(*i)))
        .collect();
    let desired: DesiredSet = ["b.com", "c.com", "d.com", "e.com"]
        .iter()
        .map(|h| (id(h), ApiSpec::new(json!({ "host": h, "basePath": "/v1" }))))
        .collect();

    let plan = plan(&existing, &desired);
    let mut identities: Vec<_> = plan.actions.iter().map(|a| a.identity().clone()).collect();
    identities.sort();

    let mut union: Vec<_> = existing.keys().chain(desired.keys()).cloned().collect();
    union.sort();
    union.dedup();
    assert_eq!(identities, union);
    assert_eq!(plan.count(Category::Added), 2);
    assert_eq!(plan.count(Category::Updated), 2);
    assert_eq!(plan.count(Category::Deleted), 1);
}

#[test]
fn reconcile_with_empty_inventory_only_creates() {
    let service = FakeService::with(&[]);
    let desired: DesiredSet = ["a.com", "b.com"]
        .iter()
        .map(|h| (id(h), ApiSpec::new(json!({ "host": h, "basePath": "/v1" }))))
        .collect();

    let outcome = reconcile(&ExistingInventory::new(), &desired, &service);

    assert_eq!(outcome.items.len(), 2);
    assert_eq!(outcome.failures(), 0);
    assert!(outcome.items.iter().all(|i| i.category == Category::Added));
}

#[test]
fn report_is_persisted_when_status_dir_is_set() {
    let service = FakeService::with(&[]);
    let status = TempDir::new().unwrap();
    let providers = [provider(ProviderKind::FileSystem, json!({ "hosts": ["a.com"] }))];

    let report = run(&providers, &registry(), &service, Some(status.path())).expect("run");

    let raw = std::fs::read_to_string(status.path().join("status.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["has_errors"], false);
    assert_eq!(value["apis"]["added"]["success"][0], "a.com/v1");
    assert_eq!(value["time"], report.time);
}
