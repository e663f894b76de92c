//! Property tests: every candidate kernel agrees with its reference

use copt_core::{oracle, OperationId, OperationRegistry};
use proptest::prelude::*;

fn operation() -> impl Strategy<Value = OperationId> {
    prop::sample::select(OperationId::ALL.to_vec())
}

proptest! {
    #[test]
    fn candidate_matches_reference(op in operation(), n in 0usize..24, repetitions in 1u32..4) {
        let registry = OperationRegistry::new();
        let pair = registry.kernel_pair(op);

        let mut reference = registry.build_context(op, n).unwrap();
        for _ in 0..repetitions {
            pair.reference.invoke(&mut reference);
        }
        let captured = oracle::capture(&reference).unwrap();

        let mut candidate = registry.build_context(op, n).unwrap();
        for _ in 0..repetitions {
            pair.candidate.invoke(&mut candidate);
        }

        prop_assert!(oracle::verify(&candidate, captured).is_ok());
    }

    #[test]
    fn factorial_wraps_identically(n in 0usize..200) {
        let registry = OperationRegistry::new();
        let pair = registry.kernel_pair(OperationId::Factorial);

        let mut reference = registry.build_context(OperationId::Factorial, n).unwrap();
        let mut candidate = registry.build_context(OperationId::Factorial, n).unwrap();
        pair.reference.invoke(&mut reference);
        pair.candidate.invoke(&mut candidate);

        prop_assert_eq!(reference.scalar(), candidate.scalar());
    }
}

#[test]
fn contexts_start_identical() {
    let registry = OperationRegistry::new();
    for op in OperationId::ALL {
        let first = registry.build_context(op, 5).unwrap();
        let second = registry.build_context(op, 5).unwrap();
        assert_eq!(first.lhs(), second.lhs());
        assert_eq!(first.rhs(), second.rhs());
        assert_eq!(first.product(), second.product());
        assert_eq!(first.scalar(), second.scalar());
    }
}
