//! Property-based tests for migration result aggregation.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::aggregate::combine;
    use crate::result::{MigrationResult, ResultCode};
    use proptest::prelude::*;
    use stepwise_core::{ErrorCollection, IssueId};

    // ===== STRATEGY HELPERS =====

    /// Failed-issue map with ids drawn from `base..base + 50`.
    fn any_failed(base: u64) -> impl Strategy<Value = BTreeMap<IssueId, String>> {
        prop::collection::btree_set(base..base + 50, 0..8).prop_map(|ids| {
            ids.into_iter()
                .map(|id| (IssueId(id), format!("PRJ-{}", id)))
                .collect()
        })
    }

    /// Success, or termination by failures when the map is non-empty.
    fn any_failure_result(base: u64) -> impl Strategy<Value = MigrationResult> {
        (any_failed(base), any::<bool>()).prop_map(|(failed, terminate)| {
            if terminate && !failed.is_empty() {
                MigrationResult::terminated_with_failures(failed).unwrap()
            } else {
                MigrationResult::success(failed)
            }
        })
    }

    /// Clean success, or termination by pre-flight errors.
    fn any_error_result() -> impl Strategy<Value = MigrationResult> {
        prop::collection::vec("[a-z]{1,8}", 0..4).prop_map(|messages| {
            if messages.is_empty() {
                MigrationResult::success(BTreeMap::new())
            } else {
                let mut errors = ErrorCollection::new();
                for message in messages {
                    errors.add_error_message(message);
                }
                MigrationResult::terminated_with_errors(errors).unwrap()
            }
        })
    }

    fn sorted_messages(result: &MigrationResult) -> Vec<String> {
        let mut messages = result.errors().messages.clone();
        messages.sort();
        messages
    }

    fn holds_invariant(result: &MigrationResult) -> bool {
        match result.code() {
            ResultCode::Success => result.errors().is_empty(),
            ResultCode::Terminated => result.errors().is_empty() != result.failed_issues().is_empty(),
        }
    }

    // ===== COMBINE =====

    proptest! {
        /// Property: combine is commutative on disjoint failure maps
        #[test]
        fn test_combine_commutes_on_failures(a in any_failure_result(0), b in any_failure_result(100)) {
            let ab = combine(&[a.clone(), b.clone()]).unwrap();
            let ba = combine(&[b, a]).unwrap();
            prop_assert_eq!(ab.code(), ba.code());
            prop_assert_eq!(ab.failed_issues(), ba.failed_issues());
            prop_assert!(holds_invariant(&ab));
        }

        /// Property: combine is associative on disjoint failure maps
        #[test]
        fn test_combine_associates(
            a in any_failure_result(0),
            b in any_failure_result(100),
            c in any_failure_result(200),
        ) {
            let left = combine(&[combine(&[a.clone(), b.clone()]).unwrap(), c.clone()]).unwrap();
            let right = combine(&[a, combine(&[b, c]).unwrap()]).unwrap();
            prop_assert_eq!(left, right);
        }

        /// Property: combine is commutative on the error set
        #[test]
        fn test_combine_commutes_on_errors(a in any_error_result(), b in any_error_result()) {
            let ab = combine(&[a.clone(), b.clone()]).unwrap();
            let ba = combine(&[b, a]).unwrap();
            prop_assert_eq!(ab.code(), ba.code());
            prop_assert_eq!(sorted_messages(&ab), sorted_messages(&ba));
            prop_assert!(holds_invariant(&ab));
        }

        /// Property: the combined failure count is the sum of disjoint inputs
        #[test]
        fn test_combine_counts_every_failure(a in any_failure_result(0), b in any_failure_result(100)) {
            let combined = combine(&[a.clone(), b.clone()]).unwrap();
            prop_assert_eq!(combined.failed_count(), a.failed_count() + b.failed_count());
            prop_assert_eq!(combined.is_terminated(), a.is_terminated() || b.is_terminated());
        }
    }
}
