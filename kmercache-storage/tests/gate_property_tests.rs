//! Property tests: the cache agrees with a simple in-memory model over
//! arbitrary sequences of batches and result writes.

use std::collections::{BTreeMap, HashSet};

use kmercache_test_utils::fixtures::{run_prepared, seen_records, temp_cache, write_result};
use kmercache_test_utils::generators::arb_batch;
use kmercache_test_utils::{Batch, DestinationBuckets, Kmer};
use proptest::prelude::*;

#[derive(Default)]
struct Model {
    results: BTreeMap<String, String>,
    seen: BTreeMap<String, i64>,
    initialized: bool,
}

impl Model {
    fn apply(&mut self, batch: &Batch) -> (DestinationBuckets, Vec<Kmer>) {
        let iteration = batch.iteration().as_i64();
        let mut buckets = DestinationBuckets::new();
        let mut staged = Vec::new();
        let mut staged_here = HashSet::new();

        for kmer in batch.kmers() {
            let key = kmer.as_str();
            if self.initialized {
                if let Some(payload) = self.results.get(key) {
                    buckets.bucket_mut(batch.destination()).push(payload.clone());
                    continue;
                }
                if staged_here.contains(key) {
                    continue;
                }
                if matches!(self.seen.get(key), Some(&it) if it != iteration) {
                    continue;
                }
            } else if staged_here.contains(key) {
                continue;
            }
            self.seen.entry(key.to_string()).or_insert(iteration);
            staged_here.insert(key.to_string());
            staged.push(kmer.clone());
        }
        self.initialized = true;
        (buckets, staged)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_cache_matches_model(
        steps in prop::collection::vec((arb_batch(), any::<bool>()), 1..6)
    ) {
        let (config, _dir) = temp_cache();
        let mut model = Model::default();

        for (batch, write_back) in steps {
            let out = run_prepared(&config, &batch).unwrap();
            let (expected_buckets, expected_staged) = model.apply(&batch);

            prop_assert_eq!(&out.buckets, &expected_buckets);
            prop_assert_eq!(&out.needs_computation, &expected_staged);

            // Staged kmers never show up as hits in the same call.
            let hit_count = out.buckets.total_len();
            prop_assert!(hit_count + out.needs_computation.len() <= batch.len());

            if write_back {
                for kmer in &out.needs_computation {
                    let payload = format!("signal={}", kmer);
                    write_result(&config.path, kmer.as_str(), &payload);
                    model.results.insert(kmer.to_string(), payload);
                }
            }
        }

        let expected_seen: Vec<(String, i64)> = model.seen.into_iter().collect();
        prop_assert_eq!(seen_records(&config.path), expected_seen);
    }

    #[test]
    fn prop_second_identical_call_never_grows_seen(batch in arb_batch()) {
        let (config, _dir) = temp_cache();
        run_prepared(&config, &batch).unwrap();
        let before = seen_records(&config.path);
        run_prepared(&config, &batch).unwrap();
        prop_assert_eq!(seen_records(&config.path), before);
    }
}
