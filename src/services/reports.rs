//! Report generation.
//!
//! Both steps take guard output: the record count is a [`BoundedCount`], so
//! allocation and rendering work are capped by the policy limit.

use std::fmt::Write as _;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::guard::BoundedCount;
use crate::services::StoreError;

/// Width of the details column.
pub const DETAILS_WIDTH: usize = 75;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: u64,
    pub name: String,
    pub details: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("no records to render")]
    Empty,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[async_trait]
pub trait DataSource: Send + Sync {
    /// Produce exactly `count` records.
    async fn fetch_records(&self, count: BoundedCount) -> Result<Vec<Record>, StoreError>;
}

/// Generates deterministic-shape records with random detail text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticDataSource;

const WORDS: &[&str] = &[
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo", "lima", "mike", "november", "oscar", "papa",
];

#[async_trait]
impl DataSource for SyntheticDataSource {
    async fn fetch_records(&self, count: BoundedCount) -> Result<Vec<Record>, StoreError> {
        let n = count.get();
        let mut records = Vec::with_capacity(n as usize);
        for id in 1..=n {
            let words = fastrand::usize(4..20);
            let details = (0..words)
                .map(|_| WORDS[fastrand::usize(..WORDS.len())])
                .collect::<Vec<_>>()
                .join(" ");
            records.push(Record {
                id,
                name: format!("Record {}", id),
                details,
            });
        }
        Ok(records)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub content_type: &'static str,
    pub file_name: &'static str,
    pub body: String,
}

pub trait ReportRenderer: Send + Sync {
    fn render(&self, records: &[Record]) -> Result<Report, ReportError>;
}

/// Fixed-width plain-text table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportRenderer;

impl ReportRenderer for TextReportRenderer {
    fn render(&self, records: &[Record]) -> Result<Report, ReportError> {
        if records.is_empty() {
            return Err(ReportError::Empty);
        }

        let mut body = String::with_capacity(records.len() * (DETAILS_WIDTH + 32));
        let _ = writeln!(body, "Data Report ({} records)", records.len());
        let _ = writeln!(body, "{:<8} {:<16} {}", "ID", "Name", "Details");
        let _ = writeln!(body, "{}", "-".repeat(8 + 1 + 16 + 1 + DETAILS_WIDTH));
        for record in records {
            let _ = writeln!(
                body,
                "{:<8} {:<16} {}",
                record.id,
                record.name,
                truncate(&record.details, DETAILS_WIDTH)
            );
        }

        Ok(Report {
            content_type: "text/plain; charset=utf-8",
            file_name: "report.txt",
            body,
        })
    }
}

/// Cut to at most `width` characters, marking the cut with "...".
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}
