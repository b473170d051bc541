// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Property-Based Tests: History Rotation
//!
//! However many entries are written, the persisted array holds the most
//! recent `min(written, capacity)` of them, oldest first.

#[cfg(test)]
mod tests {
    use logcore::logging::{
        LogSink, MemoryStorage, PersistentSink, RotationPolicy, StorageBackend,
    };
    use logcore::{LogEntry, Severity};
    use proptest::prelude::*;
    use std::sync::Arc;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// **Property:** the array is bounded and keeps the newest entries.
        ///
        /// **Strategy:** random `max_entries`, a `rotate_at` above it and a
        /// write count that may or may not cross the bound.
        #[test]
        fn test_history_keeps_most_recent(
            max_entries in 1usize..40,
            headroom in 1usize..40,
            written in 0usize..120,
        ) {
            let policy = RotationPolicy::new(max_entries, max_entries + headroom);
            let store = Arc::new(MemoryStorage::new());
            let sink = PersistentSink::new(Arc::clone(&store) as Arc<dyn StorageBackend>)
                .policy(policy);

            for i in 0..written {
                let entry = LogEntry::new(Severity::Error, "Prop", format!("{}", i), vec![])
                    .at(i as i64);
                sink.write_entry(&entry).unwrap();
            }

            let kept: Vec<usize> = sink
                .entries()
                .iter()
                .map(|e| e.message.parse().unwrap())
                .collect();
            let expected_len = written.min(policy.capacity());
            prop_assert_eq!(kept.len(), expected_len);
            let expected: Vec<usize> = (written - expected_len..written).collect();
            prop_assert_eq!(kept, expected);
        }

        /// **Property:** trimming never leaves more than `capacity` and never
        /// reorders what remains.
        #[test]
        fn test_policy_apply_is_a_suffix(
            max_entries in 0usize..50,
            rotate_at in 0usize..60,
            len in 0usize..100,
        ) {
            let policy = RotationPolicy::new(max_entries, rotate_at);
            let mut v: Vec<usize> = (0..len).collect();
            let trimmed = policy.apply(&mut v);

            prop_assert!(v.len() <= policy.capacity());
            prop_assert_eq!(trimmed, len > policy.capacity());
            prop_assert_eq!(v, (len - len.min(policy.capacity())..len).collect::<Vec<_>>());
        }
    }
}
