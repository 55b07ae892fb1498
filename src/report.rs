//! Rendering of compatibility verdicts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::io::Write;

use crate::checksum::Fingerprint;
use crate::compatibility::Incompatibility;
use crate::error::Result;
use crate::source::LoadedDocument;

const SEPARATOR: &str = "======================================================";

/// Output format for verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable report, silent on success
    #[default]
    Text,
    /// Verdict object as pretty JSON
    Json,
}

/// Where a compared document came from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub source: String,
    pub fingerprint: Fingerprint,
}

impl From<&LoadedDocument> for DocumentSummary {
    fn from(document: &LoadedDocument) -> Self {
        Self {
            source: document.source.to_string(),
            fingerprint: document.fingerprint.clone(),
        }
    }
}

/// Outcome of checking one candidate against one baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub compatible: bool,
    pub baseline: DocumentSummary,
    pub candidate: DocumentSummary,
    pub checked_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incompatibility: Option<Incompatibility>,
}

impl Verdict {
    pub fn new(
        baseline: &LoadedDocument,
        candidate: &LoadedDocument,
        outcome: std::result::Result<(), Incompatibility>,
    ) -> Self {
        let incompatibility = outcome.err();
        Self {
            compatible: incompatibility.is_none(),
            baseline: baseline.into(),
            candidate: candidate.into(),
            checked_at: Utc::now(),
            incompatibility,
        }
    }
}

/// Renders verdicts for terminals or machines
#[derive(Debug, Clone)]
pub struct Reporter {
    format: OutputFormat,
    show_diff: bool,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_diff: false,
        }
    }

    /// Append a line diff of the two fragments to text reports
    pub fn with_diff(mut self, show_diff: bool) -> Self {
        self.show_diff = show_diff;
        self
    }

    /// Render a verdict. Compatible verdicts render as an empty string in text mode.
    pub fn render(&self, verdict: &Verdict) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(verdict)? + "\n"),
            OutputFormat::Text => match &verdict.incompatibility {
                Some(incompatibility) => self.render_text(incompatibility),
                None => Ok(String::new()),
            },
        }
    }

    /// Write a rendered verdict to `out`
    pub fn write_to(&self, verdict: &Verdict, mut out: impl Write) -> Result<()> {
        out.write_all(self.render(verdict)?.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Plain-text report of a single incompatibility
    pub fn render_text(&self, incompatibility: &Incompatibility) -> Result<String> {
        let baseline = pretty(&incompatibility.baseline)?;
        let candidate = pretty(&incompatibility.candidate)?;
        let path = if incompatibility.path.is_empty() {
            "(document root)"
        } else {
            incompatibility.path.as_str()
        };

        let mut text = String::new();
        text.push_str(&format!(
            "CONTEXT: {} {}\n",
            incompatibility.context,
            incompatibility.reason.to_string().to_uppercase()
        ));
        text.push_str(&format!("PATH: {}\n", path));
        text.push_str(SEPARATOR);
        text.push('\n');
        text.push_str(&baseline);
        text.push('\n');
        text.push_str(SEPARATOR);
        text.push('\n');
        text.push_str(&candidate);
        text.push('\n');

        if self.show_diff {
            text.push_str(SEPARATOR);
            text.push('\n');
            text.push_str(&line_diff(&baseline, &candidate));
        }

        Ok(text)
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(OutputFormat::default())
    }
}

fn pretty(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn line_diff(baseline: &str, candidate: &str) -> String {
    let diff = TextDiff::from_lines(baseline, candidate);
    let mut out = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(sign);
        out.push_str(change.value());
        if change.missing_newline() {
            out.push('\n');
        }
    }

    out
}
