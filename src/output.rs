//! This module is in charge of outputting the final analysis results to the
//! log and to the histogram file

use crate::{
    analysis::{AnalysisResults, ObjectTallies, NEVENTS},
    config::Configuration,
    histo::Histogram1D,
    Result,
};

use eyre::WrapErr;
use log::info;
use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use std::{
    fs::File,
    io::{BufWriter, Write},
    time::Duration,
};

/// Contents of the histogram file
#[derive(Debug, Serialize)]
struct ResultsFile<'a> {
    /// When the run ended (RFC 3339, UTC)
    created: String,

    /// Input event file
    input: String,

    /// Path of the event tree inside of the input file
    tree: &'a str,

    /// Number of processed events
    events: usize,

    /// Wall-clock duration of the event loop
    elapsed_seconds: f64,

    /// Object counts of every category
    tallies: &'a ObjectTallies,

    /// Filled histograms, by name order
    histograms: Vec<&'a Histogram1D>,
}

/// Output the analysis results to the log and to disk
pub fn dump_results(
    cfg: &Configuration,
    results: &AnalysisResults,
    elapsed_time: Duration,
) -> Result<()> {
    // Every processed event should have been counted
    debug_assert_eq!(
        results.histograms.get(NEVENTS).map(|h| h.entries() as usize),
        Some(results.num_events)
    );

    // Print out a summary of the run
    print_summary(results, elapsed_time);

    // Compute a timestamp of when the run ended
    let created = OffsetDateTime::now_utc().format(&Rfc3339)?;

    // Write the histogram file
    let file = File::create(&cfg.output)
        .wrap_err_with(|| format!("Failed to create {}", cfg.output.display()))?;
    let mut writer = BufWriter::new(file);
    write_results(&mut writer, cfg, results, elapsed_time, created)?;
    writer.flush()?;
    info!("Histograms written to {}", cfg.output.display());

    // ...and we're done
    Ok(())
}

/// Log the number of events, object tallies and histogram statistics
fn print_summary(results: &AnalysisResults, elapsed_time: Duration) {
    info!(
        "Processed {} events in {:.3} s",
        results.num_events,
        elapsed_time.as_secs_f64()
    );
    for (category, tally) in results.tallies.iter() {
        info!(
            "{:<20}: {} selected out of {}",
            category, tally.selected, tally.total
        );
    }
    for histogram in results.histograms.iter() {
        info!(
            "{:<20}: {} entries, integral {}, underflow {}, overflow {}",
            histogram.name(),
            histogram.entries(),
            histogram.integral(),
            histogram.bin_content(0),
            histogram.bin_content(histogram.n_bins() + 1)
        );
    }
}

/// Serialize the results into a JSON document
fn write_results(
    writer: impl Write,
    cfg: &Configuration,
    results: &AnalysisResults,
    elapsed_time: Duration,
    created: String,
) -> Result<()> {
    let contents = ResultsFile {
        created,
        input: cfg.input.display().to_string(),
        tree: &cfg.tree,
        events: results.num_events,
        elapsed_seconds: elapsed_time.as_secs_f64(),
        tallies: &results.tallies,
        histograms: results.histograms.iter().collect(),
    };
    serde_json::to_writer_pretty(writer, &contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::book_histograms,
        config::Selection,
        histo::HistogramSink,
    };
    use serde_json::Value;

    #[test]
    fn results_file_layout() {
        let cfg = Configuration {
            input: "events.root".into(),
            output: "histos.json".into(),
            tree: "ggNtuplizer/EventTree".to_owned(),
            selection: Selection::default(),
        };
        let mut histograms = book_histograms();
        histograms.fill(NEVENTS, 1., 1.);
        histograms.fill(NEVENTS, 1., 1.);
        let results = AnalysisResults {
            num_events: 2,
            histograms,
            tallies: ObjectTallies::default(),
        };

        let mut buffer = Vec::new();
        let created = "2024-01-01T00:00:00Z".to_owned();
        write_results(&mut buffer, &cfg, &results, Duration::from_millis(1500), created).unwrap();
        let document: Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(document["created"], "2024-01-01T00:00:00Z");
        assert_eq!(document["input"], "events.root");
        assert_eq!(document["tree"], "ggNtuplizer/EventTree");
        assert_eq!(document["events"], 2);
        assert_eq!(document["elapsed_seconds"], 1.5);
        assert!(document["tallies"].as_object().unwrap().is_empty());

        let histograms = document["histograms"].as_array().unwrap();
        assert_eq!(histograms.len(), results.histograms.iter().count());
        let names = histograms
            .iter()
            .map(|h| h["name"].as_str().unwrap())
            .collect::<Vec<_>>();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        let nevents = histograms.iter().find(|h| h["name"] == NEVENTS).unwrap();
        assert_eq!(nevents["n_bins"], 2);
        assert_eq!(nevents["entries"], 2);
        assert_eq!(nevents["contents"][2], 2.);
    }
}
