use stackup_core::{acquire_configuration, Acquired, AcquireError, CollectError, CompletionLedger, ConfigCollector,
                   ConfigStore, InMemoryConfigStore, InMemoryLedger, RunConfiguration, Secrets};

#[test]
fn ledger_membership_is_monotonic_and_deduplicated() {
    let mut ledger = InMemoryLedger::new();
    ledger.mark_complete("install-mariadb").unwrap();
    ledger.mark_complete("secure-mariadb").unwrap();
    let once = ledger.completed();
    ledger.mark_complete("install-mariadb").unwrap();
    assert_eq!(ledger.completed(), once);
    assert!(ledger.is_complete("install-mariadb"));
    assert!(!ledger.is_complete("install-rabbitmq"));
}

struct Scripted {
    answer: Option<RunConfiguration>,
    calls: usize,
}

impl ConfigCollector for Scripted {
    fn collect(&mut self) -> Result<RunConfiguration, CollectError> {
        self.calls += 1;
        self.answer.clone().ok_or(CollectError::Rejected)
    }
}

fn cfg() -> RunConfiguration {
    RunConfiguration::new("10.0.0.11".parse().unwrap(), "eth1", Secrets::generate())
}

#[test]
fn persisted_configuration_is_used_without_collecting() {
    let stored = cfg();
    let mut store = InMemoryConfigStore::with_config(stored.clone());
    let mut collector = Scripted { answer: Some(cfg()),
                                   calls: 0 };
    let acquired = acquire_configuration(&mut store, &mut collector).unwrap();
    assert_eq!(acquired, Acquired { config: stored,
                                    fresh: false });
    assert_eq!(collector.calls, 0);
    assert_eq!(store.saves, 0);
}

#[test]
fn two_loads_return_identical_configuration() {
    let mut store = InMemoryConfigStore::new();
    store.save(&cfg()).unwrap();
    assert_eq!(store.load(), store.load());
}

#[test]
fn fresh_configuration_is_saved_once() {
    let mut store = InMemoryConfigStore::new();
    let fresh = cfg();
    let mut collector = Scripted { answer: Some(fresh.clone()),
                                   calls: 0 };
    let acquired = acquire_configuration(&mut store, &mut collector).unwrap();
    assert!(acquired.fresh);
    assert_eq!(store.load(), Some(fresh));
    assert_eq!(store.saves, 1);
}

#[test]
fn rejection_discards_and_leaves_store_absent() {
    let mut store = InMemoryConfigStore::new();
    assert!(store.load().is_none());
    let mut collector = Scripted { answer: None,
                                   calls: 0 };
    let res = acquire_configuration(&mut store, &mut collector);
    assert!(matches!(res, Err(AcquireError::Abandoned)));
    assert_eq!(collector.calls, 1);
    assert!(store.load().is_none());
}
