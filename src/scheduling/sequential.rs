//! Sequential back-end of the analysis

use crate::{
    analysis::AnalysisResults,
    scheduling::{batches, Progress},
    Result,
};

use std::ops::Range;

/// Analyze events in sequential mode
///
/// We use batched logic even in sequential mode, in order to achieve
/// reproducibility with respect to multi-threaded runs.
///
/// The first failing batch aborts the analysis.
///
pub fn run_analysis_impl(
    num_events: usize,
    progress: &Progress,
    analyze_events: impl Send + Sync + Fn(Range<usize>, &Progress) -> Result<AnalysisResults>,
) -> Result<AnalysisResults> {
    // Some double-checking cannot hurt...
    assert!(num_events > 0, "Must analyze at least one event");

    // Initialize the accumulator with the first batch of events
    let mut batches = batches(num_events);
    let first_batch = batches.next().expect("There should be at least one batch");
    let mut accumulator = analyze_events(first_batch, progress)?;

    // Analyze and integrate the other batches of events (if any)
    for batch in batches {
        accumulator.merge(&analyze_events(batch, progress)?);
    }

    // Return the final accumulated results
    Ok(accumulator)
}
