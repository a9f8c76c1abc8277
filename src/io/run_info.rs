//! Writer for the JSON summary of a bubble search run.

use std::path::Path;

use anyhow::{Context, Result};

use crate::bubble::{FinderConfig, StatsSummary};

/// Write a JSON summary with the run's counters and configuration.
pub fn write_run_info(
    path: &Path,
    summary: &StatsSummary,
    config: &FinderConfig,
    num_nodes: usize,
    elapsed_secs: f64,
) -> Result<()> {
    let info = serde_json::json!({
        "version": crate::VERSION,
        "num_nodes": num_nodes,
        "nb_bubbles": summary.nb_bubbles,
        "nb_bubbles_high": summary.nb_bubbles_high,
        "nb_bubbles_low": summary.nb_bubbles_low,
        "rejections": {
            "not_closed": summary.not_closed,
            "branching": summary.rejected_branching,
            "low_complexity": summary.rejected_complexity,
            "duplicates": summary.duplicates,
        },
        "config": config,
        "runtime_seconds": format!("{:.2}", elapsed_secs),
    });

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &info).context("failed to write run summary JSON")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_run_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_info.json");
        let summary = StatsSummary {
            nb_bubbles: 12,
            nb_bubbles_high: 2,
            nb_bubbles_low: 10,
            not_closed: 40,
            rejected_branching: 3,
            rejected_complexity: 1,
            duplicates: 12,
        };

        write_run_info(&path, &summary, &FinderConfig::default(), 5000, 1.5).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let val: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(val["nb_bubbles"], 12);
        assert_eq!(val["rejections"]["low_complexity"], 1);
        assert_eq!(val["config"]["kmer_size"], 31);
        assert_eq!(val["config"]["branching_policy"], "forbidden");
        assert_eq!(val["runtime_seconds"], "1.50");
    }
}
