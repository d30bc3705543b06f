//! Human-readable reports and data export.

use crate::error::Result;
use crate::lineage::TrialResult;
use crate::stats::{theoretical_survival, AggregateStatistic};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Everything printed at the end of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total_trials: usize,
    pub seed: u64,
    pub confidence_level: f64,
    pub population_cap: u64,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub statistics: Vec<AggregateStatistic>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Galton-Watson Survival ===")?;
        writeln!(f, "Trials: {}", self.total_trials)?;
        writeln!(f, "Population cap: {}", self.population_cap)?;
        writeln!(f, "Seed: {}", self.seed)?;
        writeln!(f, "Time: {}", format_duration(self.elapsed))?;
        writeln!(f)?;

        let pct = self.confidence_level * 100.0;
        writeln!(f, "Survival probability ({:.0}% confidence)", pct)?;
        writeln!(
            f,
            "{:>6}  {:>8}  {:>8}  {:>8}  {:>8}",
            "lambda", "p", "low", "high", "theory"
        )?;
        for s in &self.statistics {
            writeln!(
                f,
                "{:>6.2}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}",
                s.lambda,
                s.survival_probability,
                s.confidence_low,
                s.confidence_high,
                theoretical_survival(s.lambda)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Expected extinction time (generations)")?;
        writeln!(f, "{:>6}  {:>10}  {:>8}", "lambda", "E[T]", "extinct")?;
        for s in &self.statistics {
            writeln!(
                f,
                "{:>6.2}  {:>10.3}  {:>8}",
                s.lambda,
                s.extinction_time(),
                s.extinctions
            )?;
        }
        Ok(())
    }
}

/// Compact duration: `850ms`, `12.30s`, `3m 05.2s`, `1h 02m 03s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        return format!("{}ms", duration.as_millis());
    }
    if secs < 60.0 {
        return format!("{:.2}s", secs);
    }

    let whole = duration.as_secs();
    let hours = whole / 3600;
    let minutes = (whole % 3600) / 60;
    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, whole % 60)
    } else {
        let rest = secs - (whole - whole % 60) as f64;
        format!("{}m {:04.1}s", minutes, rest)
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

/// Save the report's statistics as pretty JSON.
pub fn export_json<P: AsRef<Path>>(report: &Report, path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Export raw trial outcomes to CSV.
pub fn export_trials_csv<P: AsRef<Path>>(results: &[TrialResult], path: P) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    write_trials_csv(results, &mut file)?;
    file.flush()?;
    Ok(())
}

fn write_trials_csv<W: Write>(results: &[TrialResult], out: &mut W) -> std::io::Result<()> {
    writeln!(out, "lambda,repetition,outcome,generation")?;
    for r in results {
        writeln!(
            out,
            "{},{},{},{}",
            r.lambda,
            r.repetition,
            r.outcome.as_str(),
            r.generation
        )?;
    }
    Ok(())
}
