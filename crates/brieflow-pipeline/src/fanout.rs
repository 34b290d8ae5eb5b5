// SPDX-FileCopyrightText: 2026 Brieflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-concurrency map over independent work items.

use std::future::Future;

use brieflow_core::BrieflowError;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::debug;

/// Runs `worker` over `items` with at most `min(max(max_workers, 1), items.len())`
/// futures in flight.
///
/// Results come back in completion order, so workers should return the key
/// of the item they processed. On the first error no further items are
/// started, in-flight work is drained, and that first error is returned.
pub async fn map_bounded<T, R, F, Fut>(
    items: Vec<T>,
    max_workers: usize,
    worker: F,
) -> Result<Vec<R>, BrieflowError>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, BrieflowError>>,
{
    let total = items.len();
    let capacity = max_workers.max(1).min(total);
    let mut pending = items.into_iter();
    let mut in_flight = FuturesUnordered::new();
    for item in pending.by_ref().take(capacity) {
        in_flight.push(worker(item));
    }

    let mut results = Vec::with_capacity(total);
    let mut first_error: Option<BrieflowError> = None;
    while let Some(outcome) = in_flight.next().await {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                if first_error.is_none() {
                    debug!(error = %e, in_flight = in_flight.len(), "fan-out item failed, draining");
                    first_error = Some(e);
                }
            }
        }
        if first_error.is_none() {
            if let Some(item) = pending.next() {
                in_flight.push(worker(item));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn all_results_are_returned_and_addressable_by_key() {
        let items: Vec<usize> = (0..6).collect();
        let results = map_bounded(items, 3, |i| async move {
            // Later items finish first.
            tokio::time::sleep(Duration::from_millis((6 - i as u64) * 5)).await;
            Ok((i, i * 10))
        })
        .await
        .unwrap();

        assert_eq!(results.len(), 6);
        let mut by_key: Vec<_> = results.clone();
        by_key.sort();
        assert_eq!(by_key, (0..6).map(|i| (i, i * 10)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_the_cap() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let results = map_bounded((0..10).collect(), 3, |i: usize| {
            let active = active.clone();
            let peak = peak.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await
        .unwrap();
        assert_eq!(results.len(), 10);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_cap_still_runs_one_at_a_time() {
        let results = map_bounded(vec![1, 2, 3], 0, |i| async move { Ok(i) })
            .await
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn empty_input_is_ok() {
        let results: Vec<u8> = map_bounded(Vec::<u8>::new(), 4, |i| async move { Ok(i) })
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn first_error_stops_new_work_and_drains_in_flight() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));
        let outcome = map_bounded((0..8).collect(), 2, |i: usize| {
            let started = started.clone();
            let finished = finished.clone();
            async move {
                started.fetch_add(1, Ordering::SeqCst);
                if i == 0 {
                    return Err(BrieflowError::provider("item 0 failed"));
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await;

        let err = outcome.unwrap_err();
        assert!(err.to_string().contains("item 0 failed"));
        // Item 1 was already in flight and ran to completion; nothing else started.
        assert_eq!(started.load(Ordering::SeqCst), 2);
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_error_wins_over_later_errors() {
        let outcome = map_bounded(vec![0u64, 1], 2, |i| async move {
            tokio::time::sleep(Duration::from_millis(i * 20)).await;
            Err::<u64, _>(BrieflowError::provider(format!("failure {i}")))
        })
        .await;
        assert!(outcome.unwrap_err().to_string().contains("failure 0"));
    }
}
