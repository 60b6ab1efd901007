// src/data.rs
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::error::Result;

/// One classifier cycle as it went through the stabilizer.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRecord {
    pub timestamp_ms: i64,
    pub cycle: u64,
    pub label: String,
    pub score: f32,
    pub committed: bool,
    pub sentence: String,
}

/// Collects per-cycle predictions and writes them out when the session ends.
pub struct SessionExporter {
    output_dir: PathBuf,
    session_name: String,
    records: Vec<PredictionRecord>,
}

impl SessionExporter {
    pub fn new(output_dir: impl AsRef<Path>, session_name: Option<String>) -> Self {
        let session_name = session_name
            .unwrap_or_else(|| format!("session_{}", Local::now().format("%Y%m%d_%H%M%S")));

        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            session_name,
            records: Vec::new(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn add(&mut self, record: PredictionRecord) {
        self.records.push(record);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn export_csv(&self) -> Result<PathBuf> {
        let csv_path = self
            .output_dir
            .join(&self.session_name)
            .join("predictions.csv");

        // Create directory if it doesn't exist
        if let Some(parent) = csv_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(&csv_path)?;
        let mut writer = Writer::from_writer(file);

        for record in &self.records {
            writer.serialize(record)?;
        }

        writer.flush()?;
        Ok(csv_path)
    }

    pub fn generate_report(&self) -> Result<PathBuf> {
        let report_path = self
            .output_dir
            .join(&self.session_name)
            .join("report.html");

        // Create directory if it doesn't exist
        if let Some(parent) = report_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let html_content = self.create_html_report();
        std::fs::write(&report_path, html_content)?;

        Ok(report_path)
    }

    fn create_html_report(&self) -> String {
        let total_cycles = self.records.len();
        let commit_count = self.records.iter().filter(|r| r.committed).count();
        let commit_rate = if total_cycles == 0 {
            0.0
        } else {
            commit_count as f64 / total_cycles as f64 * 100.0
        };

        let mut commits_per_label: BTreeMap<&str, usize> = BTreeMap::new();
        for record in self.records.iter().filter(|r| r.committed) {
            *commits_per_label.entry(record.label.as_str()).or_insert(0) += 1;
        }
        let label_rows: String = commits_per_label
            .iter()
            .map(|(label, count)| {
                format!(
                    r#"        <div class="stat-item">
            <span class="stat-label">Committed "{label}":</span>
            <span class="stat-value">{count} times</span>
        </div>
"#
                )
            })
            .collect();

        let final_sentence = self
            .records
            .last()
            .map(|r| r.sentence.as_str())
            .unwrap_or("(empty)");

        format!(
            r#"
<!DOCTYPE html>
<html>
<head>
    <title>Sign Recognition Report - {}</title>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 40px; background: #f5f5f5; }}
        h1 {{ color: #333; }}
        .stats {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        .stat-item {{ margin: 10px 0; }}
        .stat-label {{ font-weight: bold; color: #666; }}
        .stat-value {{ color: #4682EA; font-size: 1.2em; }}
    </style>
</head>
<body>
    <h1>Sign Recognition Session Report</h1>
    <div class="stats">
        <h2>Session: {}</h2>
        <div class="stat-item">
            <span class="stat-label">Classifier Cycles:</span>
            <span class="stat-value">{}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Committed Labels:</span>
            <span class="stat-value">{}</span>
        </div>
        <div class="stat-item">
            <span class="stat-label">Commit Rate:</span>
            <span class="stat-value">{:.1}%</span>
        </div>
{}        <div class="stat-item">
            <span class="stat-label">Final Sentence:</span>
            <span class="stat-value">{}</span>
        </div>
    </div>
</body>
</html>
        "#,
            self.session_name,
            self.session_name,
            total_cycles,
            commit_count,
            commit_rate,
            label_rows,
            final_sentence
        )
    }
}
