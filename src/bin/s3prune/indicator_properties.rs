// Property-based tests for the progress indicator.
//
// For any sequence of statistics the indicator terminates once the channel
// closes, and its totals equal the sums of the events it received.

#[cfg(test)]
mod tests {
    use crate::indicator::show_indicator;
    use proptest::prelude::*;
    use s3prune_rs::DeletionStatistics;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    enum Event {
        Listed(u64, u64),
        Complete(u64),
        Error(u64),
        Warning,
    }

    impl Event {
        fn to_stats(&self) -> DeletionStatistics {
            match self {
                Event::Listed(listed, matched) => DeletionStatistics::ObjectsListed {
                    listed: *listed,
                    matched: *matched,
                },
                Event::Complete(count) => DeletionStatistics::DeleteComplete { count: *count },
                Event::Error(count) => DeletionStatistics::DeleteError { count: *count },
                Event::Warning => DeletionStatistics::DeleteWarning {
                    key: "key".to_string(),
                },
            }
        }
    }

    fn arb_events() -> impl Strategy<Value = Vec<Event>> {
        prop::collection::vec(
            prop_oneof![
                (0u64..=1000).prop_flat_map(|listed| (Just(listed), 0..=listed))
                    .prop_map(|(listed, matched)| Event::Listed(listed, matched)),
                (1u64..=1000).prop_map(Event::Complete),
                (1u64..=1000).prop_map(Event::Error),
                Just(Event::Warning),
            ],
            0..50,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_indicator_totals_match_events(
            events in arb_events(),
            show_progress in proptest::bool::ANY,
            show_batch_result in proptest::bool::ANY,
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let summary = rt.block_on(async {
                let (sender, receiver) = async_channel::unbounded();
                for event in &events {
                    sender.send(event.to_stats()).await.unwrap();
                }
                drop(sender);

                let handle = show_indicator(receiver, show_progress, show_batch_result);
                tokio::time::timeout(Duration::from_secs(5), handle)
                    .await
                    .expect("indicator should complete within timeout")
                    .expect("indicator task should not panic")
            });

            let mut deleted = 0;
            let mut failed = 0;
            let mut warnings = 0;
            let mut listed = 0;
            let mut matched = 0;
            for event in &events {
                match event {
                    Event::Listed(l, m) => {
                        listed += l;
                        matched += m;
                    }
                    Event::Complete(count) => deleted += count,
                    Event::Error(count) => failed += count,
                    Event::Warning => warnings += 1,
                }
            }

            prop_assert_eq!(summary.total_listed_count, listed);
            prop_assert_eq!(summary.total_matched_count, matched);
            prop_assert_eq!(summary.total_delete_count, deleted);
            prop_assert_eq!(summary.total_error_count, failed);
            prop_assert_eq!(summary.total_warning_count, warnings);
        }
    }
}
