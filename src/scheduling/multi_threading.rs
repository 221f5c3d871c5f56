//! Multi-threaded back-end of the analysis

#[cfg(feature = "faster-threading")]
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    analysis::AnalysisResults,
    scheduling::{batches, Progress},
    Result,
};

use std::{ops::Range, sync::Mutex};

/// Analyze events in multi-threaded mode
///
/// Each batch of events is analyzed by its own task. If any batch fails, one
/// of the failures is reported once every task is done.
///
pub fn run_analysis_impl(
    num_events: usize,
    progress: &Progress,
    analyze_events: impl Send + Sync + Fn(Range<usize>, &Progress) -> Result<AnalysisResults>,
) -> Result<AnalysisResults> {
    // Some double-checking cannot hurt...
    assert!(num_events > 0, "Must analyze at least one event");

    // We know in advance which batches of event we will process
    let batches = batches(num_events).collect::<Vec<_>>();

    // The results of parallel tasks will be aggregated...
    let accumulator = {
        // ...in a way that is optimized for numerical reproduciblity
        #[cfg(not(feature = "faster-threading"))]
        {
            ReproducibleAccumulator::new(batches.len())
        }

        // ...in a way that is optimized for computational performance
        #[cfg(feature = "faster-threading")]
        {
            FastAccumulator::new(batches.len())
        }
    };

    // This function is a synchronization scope: it will only return
    // once all inner tasks have been executed
    rayon::scope(|scope| {
        // For each batch of events, spawn a task which analyzes them
        for (batch_id, batch) in batches.into_iter().enumerate() {
            let accumulator_ref = &accumulator;
            let analyze_events_ref = &analyze_events;
            scope.spawn(move |_| {
                let result = analyze_events_ref(batch, progress);
                accumulator_ref.set_task_result(batch_id, result);
            });
        }
    });

    // Extract the results from the accumulator
    accumulator.get_merged_result()
}

/// Reproducibility-optimized results accumulation mechanism
///
/// Batch results are merged in event order, so histograms do not depend on
/// the order in which tasks complete.
///
#[cfg(not(feature = "faster-threading"))]
struct ReproducibleAccumulator {
    /// Storage for the intermediary analysis results of parallel tasks
    results: Box<[Mutex<Option<Result<AnalysisResults>>>]>,
}
//
#[cfg(not(feature = "faster-threading"))]
impl ReproducibleAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            results: (0..num_tasks)
                .map(|_| Mutex::new(None))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    fn set_task_result(&self, task_id: usize, result: Result<AnalysisResults>) {
        let mut lock = self.results[task_id]
            .lock()
            .expect("Mutex data should be valid");
        assert!(lock.is_none(), "Tasks should not report results twice");
        *lock = Some(result);
    }

    /// Aggregate the results in a reproducible fashion
    fn get_merged_result(self) -> Result<AnalysisResults> {
        // Start iterating over the task results
        let mut results_iter = self.results.into_vec().into_iter().map(|entry| {
            entry
                .into_inner()
                .expect("Mutex data should be valid")
                .expect("Result should be ready")
        });

        // Initialize results storage with the result of the first task
        let first_result = results_iter
            .next()
            .expect("There should be at least one task")?;

        // Merge the results of the other tasks, stopping at the first error
        results_iter.try_fold(first_result, |mut r1, r2| -> Result<AnalysisResults> {
            r1.merge(&r2?);
            Ok(r1)
        })
    }
}

/// Speed-optimized results accumulation mechanism
#[cfg(feature = "faster-threading")]
struct FastAccumulator {
    /// Storage location in which results will be merged out of order
    merged_result: Mutex<Option<Result<AnalysisResults>>>,

    /// Truth that each task has reported its results
    task_finished: Box<[AtomicBool]>,
}
//
#[cfg(feature = "faster-threading")]
impl FastAccumulator {
    /// Set up results storage for N parallel tasks
    fn new(num_tasks: usize) -> Self {
        assert!(num_tasks > 0, "There should be at least one task");
        Self {
            merged_result: Mutex::new(None),
            task_finished: (0..num_tasks)
                .map(|_| AtomicBool::new(false))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
        }
    }

    /// Integrate the results of the n-th analysis task
    fn set_task_result(&self, task_id: usize, result: Result<AnalysisResults>) {
        {
            let mut storage = self
                .merged_result
                .lock()
                .expect("Mutex data should be valid");
            *storage = Some(match (storage.take(), result) {
                // If we are the first, initialize the accumulator
                (None, result) => result,

                // Otherwise, merge our results with those that are already here
                (Some(Ok(mut accumulator)), Ok(result)) => {
                    accumulator.merge(&result);
                    Ok(accumulator)
                }

                // Errors are sticky
                (Some(Err(error)), _) | (Some(Ok(_)), Err(error)) => Err(error),
            });
        }

        // Remember that this task has completed its work
        let was_finished = self.task_finished[task_id].swap(true, Ordering::Relaxed);
        assert!(!was_finished, "Tasks should not set their result twice");
    }

    /// Aggregate the results
    fn get_merged_result(self) -> Result<AnalysisResults> {
        // Check that all tasks have completed their work
        for ready in self.task_finished.into_vec().into_iter() {
            assert!(
                ready.load(Ordering::Relaxed),
                "All tasks should have completed their work"
            );
        }

        // Collect the merged result
        self.merged_result
            .into_inner()
            .expect("Mutex data should be valid")
            .expect("Result should be ready")
    }
}
