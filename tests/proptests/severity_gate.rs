// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Property-Based Tests: Severity Gate
//!
//! An entry reaches a sink exactly when its severity passes both the global
//! level and the sink's own threshold, and only accepted entries are counted.

#[cfg(test)]
mod tests {
    use logcore::logging::{BufferedConsole, LogSink, ManualScheduler, MemorySink};
    use logcore::{Logger, Severity};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn severity() -> impl Strategy<Value = Severity> {
        (0u8..5).prop_map(|rank| Severity::from_u8(rank).unwrap())
    }

    proptest! {
        /// **Property:** delivery to a sink is the conjunction of the two gates.
        ///
        /// **Strategy:** pick a global level, a sink threshold and a batch of
        /// entry severities; compare what the sink saw with the expected
        /// filter applied to the batch.
        #[test]
        fn test_sink_sees_exactly_what_passes_both_gates(
            global in severity(),
            threshold in severity(),
            batch in prop::collection::vec(severity(), 0..40),
        ) {
            let memory = Arc::new(MemorySink::new("memory", threshold));
            let logger = Logger::builder()
                .without_storage()
                .console_output(Box::new(BufferedConsole::new()))
                .scheduler(Arc::new(ManualScheduler::new()))
                .sink(Arc::clone(&memory) as Arc<dyn LogSink>)
                .build();
            logger.set_log_level(global);

            for (i, s) in batch.iter().enumerate() {
                logger.log(*s, "Prop", &format!("entry {}", i), Vec::new());
            }

            let expected: Vec<Severity> = batch
                .iter()
                .copied()
                .filter(|s| s.passes(global) && s.passes(threshold))
                .collect();
            let got: Vec<Severity> = memory.entries().iter().map(|e| e.severity).collect();
            prop_assert_eq!(got, expected);

            let accepted = batch.iter().filter(|s| s.passes(global)).count() as u64;
            prop_assert_eq!(logger.statistics().counters.total_logs, accepted);
        }

        /// **Property:** the rank order is total and matches `passes`.
        #[test]
        fn test_passes_matches_rank(a in severity(), b in severity()) {
            prop_assert_eq!(a.passes(b), a.as_u8() <= b.as_u8());
            prop_assert_eq!(a <= b, a.as_u8() <= b.as_u8());
        }
    }
}
