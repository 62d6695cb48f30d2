//! Fixed-size worker pool over contiguous chunks of the file list.

use futures::future::join_all;
use std::sync::Arc;

/// Split `items` into `ceil(len / workers)`-sized contiguous chunks.
///
/// Chunks are never empty, keep the input order and together cover the
/// whole input. There are at most `workers` of them.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let chunk_size = items.len().div_ceil(workers.max(1));

    let mut chunks = Vec::with_capacity(items.len().div_ceil(chunk_size));
    let mut remaining = items.into_iter().peekable();
    while remaining.peek().is_some() {
        chunks.push(remaining.by_ref().take(chunk_size).collect());
    }
    chunks
}

/// What happened to the workers of one `run`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchedulerReport {
    pub workers_started: usize,
    /// One message per worker that panicked or was cancelled by the runtime
    pub failures: Vec<String>,
}

impl SchedulerReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Process `items` with one blocking worker per chunk and wait for all of them.
///
/// `process` receives the worker index and the item. Items of a chunk are
/// handled in order; ordering across workers is unspecified.
pub async fn run<T, F>(items: Vec<T>, workers: usize, process: F) -> SchedulerReport
where
    T: Send + 'static,
    F: Fn(usize, T) + Send + Sync + 'static,
{
    if items.is_empty() {
        return SchedulerReport::default();
    }

    let process = Arc::new(process);

    let handles: Vec<_> = partition(items, workers)
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let process = Arc::clone(&process);
            tokio::task::spawn_blocking(move || {
                tracing::debug!(worker = index, files = chunk.len(), "Worker started");
                for item in chunk {
                    process(index, item);
                }
                tracing::debug!(worker = index, "Worker finished");
            })
        })
        .collect();

    let workers_started = handles.len();
    let mut failures = Vec::new();

    for (index, result) in join_all(handles).await.into_iter().enumerate() {
        if let Err(join_err) = result {
            tracing::warn!(worker = index, error = %join_err, "Worker panicked");
            failures.push(format!("Worker {} failed: {}", index, join_err));
        }
    }

    SchedulerReport {
        workers_started,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_partition_covers_input_in_order() {
        for total in 0..40usize {
            let items: Vec<usize> = (0..total).collect();
            for workers in 1..12usize {
                let chunks = partition(items.clone(), workers);

                assert!(chunks.len() <= workers);
                assert!(chunks.iter().all(|c| !c.is_empty()));
                let joined: Vec<usize> = chunks.into_iter().flatten().collect();
                assert_eq!(joined, items, "total={} workers={}", total, workers);
            }
        }
    }

    #[test]
    fn test_partition_chunk_sizes() {
        let items: Vec<u8> = (0..10).collect();
        let sizes: Vec<usize> = partition(items.clone(), 4).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 1]);
        assert_eq!(partition(items, 0).len(), 1);
    }

    #[tokio::test]
    async fn test_run_processes_every_item_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let report = run((0..25).collect::<Vec<u32>>(), 4, move |worker, item| {
            sink.lock().unwrap().push((worker, item));
        })
        .await;

        assert_eq!(report.workers_started, 4);
        assert!(report.is_clean());

        // Worker i got the i-th chunk of 7, 7, 7, 4 items
        let seen_by = |worker: usize| -> Vec<u32> {
            let guard = seen.lock().unwrap();
            guard.iter().filter(|(w, _)| *w == worker).map(|(_, i)| *i).collect()
        };
        assert_eq!(seen_by(0), (0..7).collect::<Vec<_>>());
        assert_eq!(seen_by(3), (21..25).collect::<Vec<_>>());

        let seen = seen.lock().unwrap();
        let mut items: Vec<u32> = seen.iter().map(|(_, i)| *i).collect();
        items.sort();
        assert_eq!(items, (0..25).collect::<Vec<_>>());

        // Per-worker order follows the chunk order
        for worker in 0..4 {
            let mine: Vec<u32> = seen.iter().filter(|(w, _)| *w == worker).map(|(_, i)| *i).collect();
            assert!(mine.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[tokio::test]
    async fn test_worker_panic_is_reported() {
        let report = run(vec![1, 2, 3, 4], 2, |_, item| {
            if item == 3 {
                panic!("boom");
            }
        })
        .await;

        assert_eq!(report.workers_started, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].starts_with("Worker 1 failed"));
    }

    #[tokio::test]
    async fn test_run_empty_input() {
        let report = run(Vec::<u8>::new(), 8, |_, _| {}).await;
        assert_eq!(report.workers_started, 0);
    }
}
