//! Fork-join partitioning of a flat index range.
//!
//! `[0, n)` is split into one contiguous [`Segment`] per worker. Each call
//! builds a fresh rayon pool with exactly that many threads, runs one task per
//! segment and blocks until every task has finished. A single worker runs on
//! the calling thread, which keeps the single-threaded path usable on targets
//! without threads (wasm32).
//!
//! # Example
//!
//! ```rust
//! use imagefilters::parallel::run_parallel_mut;
//!
//! let mut data = vec![1u32; 1000];
//! run_parallel_mut(&mut data, 4, |_, chunk| {
//!     for v in chunk.iter_mut() {
//!         *v *= 2;
//!     }
//! })
//! .unwrap();
//! assert!(data.iter().all(|&v| v == 2));
//! ```

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::trace;

use crate::{FilterError, FilterResult};

/// Half-open index range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub from: usize,
    pub to: usize,
}

impl Segment {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to: to.max(from) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.to == self.from
    }

    /// Overlap of two segments; empty (anchored at the larger start) when
    /// they are disjoint.
    pub fn intersect(&self, other: Segment) -> Segment {
        Segment::new(self.from.max(other.from), self.to.min(other.to))
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.from..self.to
    }
}

/// Hardware concurrency, never less than one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .max(1)
}

/// Split `[0, n)` into `workers` segments of `n / workers` elements.
///
/// The last segment always ends at `n` and absorbs the remainder. When
/// `n < workers` the leading segments are empty.
pub fn segments(n: usize, workers: usize) -> FilterResult<Vec<Segment>> {
    if workers == 0 {
        return Err(FilterError::InvalidWorkers(workers));
    }
    let size = n / workers;
    Ok((0..workers)
        .map(|t| {
            let to = if t == workers - 1 { n } else { (t + 1) * size };
            Segment::new(t * size, to)
        })
        .collect())
}

fn build_pool(workers: usize) -> FilterResult<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("imagefilters-worker-{i}"))
        .build()
        .map_err(|e| FilterError::ThreadPool(e.to_string()))
}

/// Run `segment_fn` once per segment of `[0, n)` on `workers` threads.
///
/// Returns after all segments are done. If any task panics the call returns
/// [`FilterError::WorkerPanicked`] once the remaining tasks have finished.
pub fn run_parallel<F>(n: usize, workers: usize, segment_fn: F) -> FilterResult<()>
where
    F: Fn(Segment) + Sync,
{
    let segments = segments(n, workers)?;
    if workers == 1 {
        return panic::catch_unwind(AssertUnwindSafe(|| segment_fn(segments[0])))
            .map_err(|_| FilterError::WorkerPanicked);
    }
    let pool = build_pool(workers)?;
    let segment_fn = &segment_fn;

    panic::catch_unwind(AssertUnwindSafe(|| {
        pool.scope(|scope| {
            for (t, segment) in segments.iter().copied().enumerate() {
                if segment.is_empty() {
                    continue;
                }
                scope.spawn(move |_| {
                    trace!(worker = t, from = segment.from, to = segment.to, "segment start");
                    segment_fn(segment);
                });
            }
        })
    }))
    .map_err(|_| FilterError::WorkerPanicked)
}

/// Like [`run_parallel`], but hands each task the sub-slice of `buffer` that
/// its segment covers.
///
/// Sub-slices are disjoint `&mut` borrows, so tasks cannot write outside
/// their own segment. Global index `i` lives at `chunk[i - segment.from]`.
pub fn run_parallel_mut<T, F>(buffer: &mut [T], workers: usize, segment_fn: F) -> FilterResult<()>
where
    T: Send,
    F: Fn(Segment, &mut [T]) + Sync,
{
    let segments = segments(buffer.len(), workers)?;
    if workers == 1 {
        return panic::catch_unwind(AssertUnwindSafe(|| segment_fn(segments[0], buffer)))
            .map_err(|_| FilterError::WorkerPanicked);
    }
    let pool = build_pool(workers)?;
    let segment_fn = &segment_fn;

    panic::catch_unwind(AssertUnwindSafe(|| {
        pool.scope(|scope| {
            let mut rest = buffer;
            for (t, segment) in segments.iter().copied().enumerate() {
                let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(segment.len());
                rest = tail;
                if segment.is_empty() {
                    continue;
                }
                scope.spawn(move |_| {
                    trace!(worker = t, from = segment.from, to = segment.to, "segment start");
                    segment_fn(segment, chunk);
                });
            }
        })
    }))
    .map_err(|_| FilterError::WorkerPanicked)
}
