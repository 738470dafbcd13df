// Property-based tests for the deletion pipeline as a whole.
//
// For any bucket content, batch size and worker count the run terminates,
// every candidate is submitted exactly once, and the counters add up.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use crate::pipeline::DeletionPipeline;
    use crate::test_utils::{StubStorage, make_s3_object, make_test_config};
    use crate::types::token::create_pipeline_cancellation_token;

    const CUTOFF_SECS: i64 = 1_704_067_200;

    /// One generated object: (is older than the cutoff, has a per-key failure).
    fn arb_bucket() -> impl Strategy<Value = Vec<(bool, bool)>> {
        prop::collection::vec((any::<bool>(), prop::bool::weighted(0.1)), 0..120)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(40))]

        #[test]
        fn prop_pipeline_accounts_for_every_candidate(
            bucket in arb_bucket(),
            max_keys in 1u16..=20,
            workers in 1u16..=6,
        ) {
            let mut storage = StubStorage::with_objects(
                bucket
                    .iter()
                    .enumerate()
                    .map(|(i, (old, _))| {
                        let secs = if *old { CUTOFF_SECS - 60 } else { CUTOFF_SECS };
                        make_s3_object(&format!("obj{i:04}"), secs)
                    })
                    .collect(),
            );
            for (i, (_, failing)) in bucket.iter().enumerate() {
                if *failing {
                    storage = storage.fail_key(&format!("obj{i:04}"));
                }
            }

            let mut config = make_test_config();
            config.max_keys = max_keys;
            config.worker_size = workers;

            let mut pipeline = DeletionPipeline::with_storage(
                config,
                create_pipeline_cancellation_token(),
                Box::new(storage.clone()),
            );

            let rt = tokio::runtime::Runtime::new().unwrap();
            let finished = rt.block_on(async {
                tokio::time::timeout(Duration::from_secs(30), pipeline.run()).await
            });
            prop_assert!(finished.is_ok(), "pipeline did not terminate");

            let expected_keys: Vec<String> = bucket
                .iter()
                .enumerate()
                .filter(|(_, (old, _))| *old)
                .map(|(i, _)| format!("obj{i:04}"))
                .collect();
            let failing_candidates = bucket
                .iter()
                .filter(|(old, failing)| *old && *failing)
                .count() as u64;
            let candidates = expected_keys.len() as u64;
            let batch_size = u64::from(max_keys);

            let stats = pipeline.get_deletion_stats();
            prop_assert!(!pipeline.has_error());
            prop_assert_eq!(stats.stats_listed_objects, bucket.len() as u64);
            prop_assert_eq!(stats.stats_candidate_objects, candidates);
            prop_assert_eq!(stats.stats_dispatched_batches, candidates.div_ceil(batch_size));
            prop_assert_eq!(stats.stats_deleted_objects, candidates - failing_candidates);
            prop_assert_eq!(stats.stats_failed_objects, failing_candidates);
            prop_assert!(stats.stats_deleted_objects <= stats.stats_candidate_objects);
            prop_assert_eq!(pipeline.has_warning(), 0 < failing_candidates);

            let calls = storage.delete_calls();
            prop_assert!(calls.iter().all(|keys| !keys.is_empty() && keys.len() <= usize::from(max_keys)));

            let mut requested = storage.requested_keys();
            requested.sort();
            prop_assert_eq!(requested, expected_keys);
        }
    }
}
