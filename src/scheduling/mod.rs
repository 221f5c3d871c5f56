//! This module takes care of scheduling the analysis work, encapsulating use
//! of multiple threads and progress reporting

#[cfg(not(feature = "multi-threading"))] mod sequential;
#[cfg(feature = "multi-threading")] mod multi_threading;

use crate::{analysis::AnalysisResults, Result};

use log::info;

use std::{
    ops::Range,
    sync::atomic::{AtomicUsize, Ordering},
};


/// Size of the analyzed event batches
///
/// Events are grouped in batches of a certain size in order to amortize the
/// cost of setting up factories and histograms, and to achieve identical
/// histogram contents between sequential and parallel runs.
///
const EVENT_BATCH_SIZE: usize = 10_000;


/// Run the analysis in the manner that was configured at build time.
///
/// Takes as parameters the total number of events to be analyzed, and an
/// analysis kernel that processes a range of events into fresh results.
///
/// Returns the merged results, or the first error reported by a batch
///
pub fn run_analysis(
    num_events: usize,
    analyze_events: impl Send + Sync
                         + Fn(Range<usize>, &Progress) -> Result<AnalysisResults>
) -> Result<AnalysisResults> {
    // Check that the user is being reasonable (should have already been checked
    // at configuration time, but bugs can happen...)
    assert!(num_events > 0, "Must analyze at least one event");

    // Set up progress reporting
    let progress = Progress::new(num_events);

    // Integrate analysis results...
    let results = {
        // ...in sequential mode
        #[cfg(not(feature = "multi-threading"))]
        { sequential::run_analysis_impl(num_events, &progress, analyze_events) }

        // ...in multi-threaded mode
        #[cfg(feature = "multi-threading")]
        { multi_threading::run_analysis_impl(num_events, &progress, analyze_events) }
    }?;

    // Check that no event was left behind
    assert_eq!(progress.processed(), num_events, "Every event should be processed");
    Ok(results)
}


/// Split the event range into batches of at most `EVENT_BATCH_SIZE` events
fn batches(num_events: usize) -> impl Iterator<Item = Range<usize>> {
    (0..num_events)
        .step_by(EVENT_BATCH_SIZE)
        .map(move |start| start..(start + EVENT_BATCH_SIZE).min(num_events))
}


/// Shared progress counter, which reports each completed tenth of the work
#[derive(Debug)]
pub struct Progress {
    num_events: usize,
    processed: AtomicUsize,
}
//
impl Progress {
    /// Prepare to track the processing of `num_events` events
    pub fn new(num_events: usize) -> Self {
        Self {
            num_events,
            processed: AtomicUsize::new(0),
        }
    }

    /// Record that one more event was processed
    pub fn event_done(&self) {
        let done = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        let tenths = |count: usize| count * 10 / self.num_events.max(1);
        if tenths(done) > tenths(done - 1) {
            info!("Processed {}% of events ({}/{})", tenths(done) * 10, done, self.num_events);
        }
    }

    /// Number of events processed so far
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }
}
