//! User-facing status messages produced during a run.

use crate::data::{DataBatch, ValueCount};
use crate::steps::Step;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Structured payload attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detail {
    Preview(Preview),
    Distribution { counts: Vec<ValueCount> },
}

/// One message shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Step>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,
}

impl Diagnostic {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            step: None,
            message: message.into(),
            detail: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn preview(title: impl Into<String>, batch: &DataBatch, rows: usize) -> Self {
        Self {
            detail: Some(Detail::Preview(Preview::from_batch(batch, rows))),
            ..Self::info(title)
        }
    }

    pub fn distribution(title: impl Into<String>, counts: Vec<ValueCount>) -> Self {
        Self {
            detail: Some(Detail::Distribution { counts }),
            ..Self::info(title)
        }
    }

    pub fn for_step(mut self, step: Step) -> Self {
        self.step = Some(step);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Info => "info",
            Level::Success => "done",
            Level::Warning => "warning",
            Level::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)?;
        match &self.detail {
            Some(Detail::Preview(preview)) => write!(f, "\n{preview}"),
            Some(Detail::Distribution { counts }) => {
                for c in counts {
                    write!(f, "\n  {:>8}  {}", c.value, c.count)?;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// The first rows of a table, rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
}

impl Preview {
    pub fn from_batch(batch: &DataBatch, rows: usize) -> Self {
        let head = batch.head(rows);
        Self {
            columns: head.column_names().iter().map(|s| s.to_string()).collect(),
            rows: (0..head.row_count())
                .map(|r| {
                    head.columns()
                        .iter()
                        .map(|c| c.values.render(r).unwrap_or_else(|| "NaN".to_string()))
                        .collect()
                })
                .collect(),
            total_rows: batch.row_count(),
        }
    }
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, &w)| format!("{c:>w$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };

        write!(f, "{}", line(self.columns.as_slice()))?;
        for row in &self.rows {
            write!(f, "\n{}", line(row.as_slice()))?;
        }
        write!(
            f,
            "\n[{} rows x {} columns]",
            self.total_rows,
            self.columns.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnValues};

    #[test]
    fn test_preview_renders_missing_as_nan() {
        let batch = DataBatch::new(vec![Column::new(
            "Sensor1",
            ColumnValues::Float(vec![Some(1.0), None, Some(3.0)]),
        )])
        .unwrap();
        let preview = Preview::from_batch(&batch, 2);
        assert_eq!(preview.rows, vec![vec!["1.0".to_string()], vec!["NaN".to_string()]]);
        assert_eq!(preview.total_rows, 3);
        let text = preview.to_string();
        assert!(text.starts_with("Sensor1"));
        assert!(text.ends_with("[3 rows x 1 columns]"));
    }

    #[test]
    fn test_preview_aligns_non_ascii_cells() {
        let batch = DataBatch::new(vec![
            Column::new(
                "Température",
                ColumnValues::Float(vec![Some(1.5), Some(20.25)]),
            ),
            Column::new(
                "Ligne",
                ColumnValues::String(vec![Some("bâtiment Ü".into()), Some("a".into())]),
            ),
        ])
        .unwrap();
        let text = Preview::from_batch(&batch, 2).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Température       Ligne");
        assert_eq!(lines[1], "        1.5  bâtiment Ü");
        assert_eq!(lines[2], "      20.25           a");
    }

    #[test]
    fn test_diagnostic_serializes_level_and_step() {
        let d = Diagnostic::warning("careful").for_step(Step::Oversample);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["step"], "oversample");
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_distribution_display() {
        let d = Diagnostic::distribution(
            "before",
            vec![ValueCount {
                value: "-1".into(),
                count: 9,
            }],
        );
        assert_eq!(d.to_string(), "[info] before\n        -1  9");
    }
}
