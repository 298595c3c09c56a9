#![cfg(feature = "memory-source")]

use futures::executor::block_on;
use rs_permissions::{
    Affordance, CacheStatus, EffectivePermission, Error, EvaluatorBuilder, Guard, MemorySource,
    ScopeId,
};
use std::sync::Arc;

fn store(value: &str) -> Option<ScopeId> {
    Some(ScopeId::try_from(value).unwrap())
}

fn seeded_source() -> MemorySource {
    let source = MemorySource::new();
    source.set_permissions(
        store("store_1"),
        vec![
            EffectivePermission::allow("product", "*").unwrap(),
            EffectivePermission::deny("product", "delete").unwrap(),
            EffectivePermission::allow("order", "update").unwrap(),
        ],
    );
    source.set_permissions(
        store("store_2"),
        vec![EffectivePermission::allow("*", "read").unwrap()],
    );
    source
}

#[test]
fn login_switch_and_logout_flow() {
    let source = seeded_source();
    let evaluator = EvaluatorBuilder::new(source.clone()).build();
    let delete_button = Guard::new("product", "delete");
    let edit_button = Guard::new("product", "update");

    assert_eq!(edit_button.affordance(&evaluator), Affordance::Hidden);

    block_on(evaluator.load(store("store_1"))).unwrap();
    assert_eq!(edit_button.affordance(&evaluator), Affordance::Shown);
    assert_eq!(delete_button.affordance(&evaluator), Affordance::Hidden);
    assert!(evaluator.can_manage_products());
    assert!(evaluator.can_manage_orders());

    block_on(evaluator.switch_scope(store("store_2"))).unwrap();
    assert_eq!(evaluator.scope(), store("store_2"));
    assert!(evaluator.check("customer", "read"));
    assert!(!evaluator.check("product", "update"));
    assert!(!evaluator.can_manage_products());

    evaluator.clear();
    assert_eq!(evaluator.status(), CacheStatus::Empty);
    assert!(!evaluator.check("customer", "read"));
    assert_eq!(source.fetch_count(), 2);
}

#[test]
fn outage_fails_closed_until_retry() {
    let source = seeded_source();
    let evaluator = EvaluatorBuilder::new(source.clone()).build();
    block_on(evaluator.load(store("store_1"))).unwrap();

    source.set_unavailable(true);
    let err = block_on(evaluator.reload(store("store_1"))).unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable(_)));
    assert!(err.to_string().contains("unavailable"));
    assert!(!evaluator.check("order", "update"));
    assert!(evaluator.last_error().is_some());

    source.set_unavailable(false);
    block_on(evaluator.load(store("store_1"))).unwrap();
    assert!(evaluator.check("order", "update"));
    assert!(evaluator.last_error().is_none());
}

#[test]
fn reload_picks_up_changed_grants() {
    let source = seeded_source();
    let evaluator = EvaluatorBuilder::new(source.clone()).build();
    block_on(evaluator.load(store("store_1"))).unwrap();
    assert!(!evaluator.check("customer", "create"));

    source.add_permission(
        store("store_1"),
        EffectivePermission::allow("customer", "create").unwrap(),
    );
    block_on(evaluator.load(store("store_1"))).unwrap();
    assert!(!evaluator.check("customer", "create"));

    block_on(evaluator.reload(store("store_1"))).unwrap();
    assert!(evaluator.check("customer", "create"));
    assert_eq!(source.fetch_count(), 2);
}

#[test]
fn shared_evaluator_answers_from_many_threads() {
    let evaluator = Arc::new(EvaluatorBuilder::new(seeded_source()).build());
    block_on(evaluator.load(store("store_1"))).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let evaluator = Arc::clone(&evaluator);
            std::thread::spawn(move || {
                (0..1_000).all(|_| {
                    evaluator.check("product", "update") && !evaluator.check("product", "delete")
                })
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().expect("thread panicked"));
    }
}
