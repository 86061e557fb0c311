//! Property tests for retry bounds and cause-chain classification.

mod common;

use common::*;
use flow_hospital::{ClassifierConfig, ErrorClassifier, HospitalConfig, TriageCoordinator};
use flow_hospital_types::{flow_error, FlowFailure, PersistenceError};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Wrap a persistence error in `depth` layers of workflow failures.
fn wrapped(root: PersistenceError, depth: usize) -> FlowFailure {
    let mut error = FlowFailure::caused_by("layer 0", root);
    for layer in 1..depth {
        error = FlowFailure::caused_by(format!("layer {}", layer), error);
    }
    error
}

fn arb_root() -> impl Strategy<Value = (PersistenceError, bool, bool)> {
    prop_oneof![
        Just(()).prop_map(|_| (PersistenceError::sql("deadlock detected"), true, false)),
        "[a-z]{2,6}".prop_map(|table| (
            PersistenceError::constraint_violation(format!("pk_{}", table), "conflict"),
            false,
            true
        )),
        Just(()).prop_map(|_| (PersistenceError::sql("connection refused"), false, false)),
    ]
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// A deterministic duplicate insert runs exactly bound + 2 times.
    #[test]
    fn duplicate_insert_runs_bound_plus_two(bound in 0usize..8, suspend_count in 0u32..100) {
        let config = HospitalConfig::default().with_duplicate_insert_bound(bound);
        let hospital = TriageCoordinator::new(config).unwrap();
        let mut events = hospital.subscribe();

        let mut flow = SimulatedFlow::new(payment_state(suspend_count), |_| Err(duplicate_insert()));
        let report = flow.run(&hospital);

        prop_assert_eq!(report.executions as usize, bound + 2);
        prop_assert!(report.propagated());
        prop_assert_eq!(hospital.patient_count(), 0);

        let discharges = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|e| matches!(e, flow_hospital::TriageEvent::Discharged { .. }))
            .count();
        prop_assert_eq!(discharges, bound + 1);
    }

    /// A transient fault recovers after exactly as many retries as it fails.
    #[test]
    fn transient_faults_always_retry(failures in 0u32..30) {
        let hospital = TriageCoordinator::new(HospitalConfig::default()).unwrap();
        let mut flow = SimulatedFlow::new(payment_state(0), move |execution| {
            if execution <= failures { Err(deadlock()) } else { Ok(()) }
        });

        let report = flow.run(&hospital);
        prop_assert_eq!(report.executions, failures + 1);
        prop_assert!(report.completed());
    }

    /// Classification sees through any nesting within the depth bound.
    #[test]
    fn classification_follows_nested_causes(root in arb_root(), depth in 1usize..20) {
        let (root, is_contention, is_duplicate) = root;
        let classifier = ErrorClassifier::new(&ClassifierConfig::default());
        let error = flow_error(wrapped(root, depth));

        prop_assert_eq!(classifier.is_contention(error.as_ref()), is_contention);
        prop_assert_eq!(classifier.is_duplicate_key(error.as_ref()), is_duplicate);
    }

    /// Causes beyond the configured depth are never reached.
    #[test]
    fn classification_respects_depth_bound(max_depth in 1usize..10, extra in 1usize..10) {
        let config = ClassifierConfig { max_cause_depth: max_depth, ..ClassifierConfig::default() };
        let classifier = ErrorClassifier::new(&config);

        // Root sits at chain position max_depth + extra
        let error = wrapped(PersistenceError::sql("deadlock"), max_depth + extra - 1);
        prop_assert!(!classifier.is_contention(&error));

        let reachable = wrapped(PersistenceError::sql("deadlock"), max_depth - 1);
        if max_depth > 1 {
            prop_assert!(classifier.is_contention(&reachable));
        }
    }
}
