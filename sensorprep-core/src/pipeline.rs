//! The transform pipeline: selected steps applied in fixed order.

use crate::data::DataBatch;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::steps::{
    self, ColumnSelector, LABEL_COLUMN, OversampleError, Step, StepOutput, balance_classes,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rows shown in the before/after previews unless configured otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Which steps to run, plus the column to coerce in step 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSelection {
    #[serde(default)]
    pub to_datetime: bool,
    #[serde(default)]
    pub time_column: Option<String>,
    #[serde(default)]
    pub prune_impute: bool,
    #[serde(default)]
    pub encode_label: bool,
    #[serde(default)]
    pub oversample: bool,
    #[serde(default)]
    pub normalize: bool,
}

impl TransformSelection {
    /// Every step enabled.
    pub fn all(time_column: Option<String>) -> Self {
        Self {
            to_datetime: true,
            time_column,
            prune_impute: true,
            encode_label: true,
            oversample: true,
            normalize: true,
        }
    }

    pub fn is_enabled(&self, step: Step) -> bool {
        match step {
            Step::ToDatetime => self.to_datetime,
            Step::PruneImpute => self.prune_impute,
            Step::EncodeLabel => self.encode_label,
            Step::Oversample => self.oversample,
            Step::Normalize => self.normalize,
        }
    }

    /// Enabled steps in execution order.
    pub fn enabled_steps(&self) -> Vec<Step> {
        Step::ORDER
            .into_iter()
            .filter(|s| self.is_enabled(*s))
            .collect()
    }
}

/// Record of a step that changed the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRecord {
    pub step: Step,
    pub applied_at: chrono::DateTime<chrono::Utc>,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// `None` when the run had no input.
    #[serde(skip)]
    pub dataset: Option<DataBatch>,
    pub diagnostics: Vec<Diagnostic>,
    pub records: Vec<TransformRecord>,
}

impl RunOutcome {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: chrono::Utc::now(),
            dataset: None,
            diagnostics: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Steps that changed the table, in the order they ran.
    pub fn applied_steps(&self) -> Vec<Step> {
        self.records.iter().map(|r| r.step).collect()
    }

    pub fn has_output(&self) -> bool {
        self.dataset.is_some()
    }
}

/// Applies a [`TransformSelection`] to a table.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    selection: TransformSelection,
    selector: ColumnSelector,
    preview_rows: usize,
}

impl TransformPipeline {
    pub fn new(selection: TransformSelection) -> Self {
        Self {
            selection,
            selector: ColumnSelector::sensors(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Run every selected step once, in order.
    ///
    /// `None` input is the idle state: nothing runs and no table is returned.
    /// Fatal step errors abort the run. Oversampling failures are reported in
    /// the diagnostics and the table from before that step is kept.
    pub fn run(&self, input: Option<DataBatch>) -> Result<RunOutcome> {
        let mut outcome = RunOutcome::new();
        let Some(mut batch) = input else {
            tracing::info!("No dataset provided; nothing to do");
            return Ok(outcome);
        };

        tracing::info!(
            run_id = %outcome.run_id,
            rows = batch.row_count(),
            columns = batch.column_count(),
            steps = ?self.selection.enabled_steps(),
            "Starting preprocessing run"
        );
        outcome.diagnostics.push(Diagnostic::preview(
            "Original data preview",
            &batch,
            self.preview_rows,
        ));

        for step in self.selection.enabled_steps() {
            let span = tracing::info_span!("step", step = %step);
            let _enter = span.enter();
            tracing::debug!(title = step.title(), "Applying step");

            let rows_before = batch.row_count();
            let columns_before = batch.column_count();
            let Some(next) = self.apply(step, &batch, &mut outcome.diagnostics)? else {
                continue;
            };
            outcome.records.push(TransformRecord {
                step,
                applied_at: chrono::Utc::now(),
                rows_before,
                rows_after: next.row_count(),
                columns_before,
                columns_after: next.column_count(),
            });
            batch = next;
        }

        outcome
            .diagnostics
            .push(Diagnostic::success("Preprocessing complete"));
        outcome.diagnostics.push(Diagnostic::preview(
            "Preprocessed data preview",
            &batch,
            self.preview_rows,
        ));
        tracing::info!(
            run_id = %outcome.run_id,
            applied = outcome.records.len(),
            rows = batch.row_count(),
            columns = batch.column_count(),
            "Finished preprocessing run"
        );
        outcome.dataset = Some(batch);
        Ok(outcome)
    }

    /// Column coerced by step 1: the selected one, else the first column.
    fn time_column<'a>(&'a self, batch: &'a DataBatch) -> Option<&'a str> {
        self.selection
            .time_column
            .as_deref()
            .or_else(|| batch.column_names().first().copied())
    }

    /// Apply one step. `Ok(None)` leaves the table as it was.
    fn apply(
        &self,
        step: Step,
        batch: &DataBatch,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Option<DataBatch>> {
        let output = match step {
            Step::ToDatetime => match self.time_column(batch) {
                Some(column) => Some(StepOutput::new(steps::to_datetime(batch, column)?)),
                None => None,
            },
            Step::PruneImpute => steps::prune_and_impute(batch, &self.selector)?,
            Step::EncodeLabel => steps::remap_label(batch, LABEL_COLUMN)?,
            Step::Oversample => oversample(batch, diagnostics),
            Step::Normalize => Some(StepOutput::new(steps::min_max_scale(
                batch,
                &self.selector,
            )?)),
        };
        Ok(output.map(|out| {
            diagnostics.extend(out.diagnostics);
            out.batch
        }))
    }
}

/// Step 4 with its failures turned into diagnostics.
fn oversample(batch: &DataBatch, diagnostics: &mut Vec<Diagnostic>) -> Option<StepOutput> {
    match balance_classes(batch, LABEL_COLUMN) {
        Ok(Some(done)) => {
            let counts = |m: &std::collections::BTreeMap<i64, usize>| {
                m.iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            Some(StepOutput::new(done.batch).with_diagnostic(
                Diagnostic::info(format!(
                    "SMOTE applied (k_neighbors = {}); class counts {{{}}} -> {{{}}}",
                    done.k_neighbors,
                    counts(&done.class_counts_before),
                    counts(&done.class_counts_after)
                ))
                .for_step(Step::Oversample),
            ))
        }
        Ok(None) => None,
        Err(err) => {
            diagnostics.push(oversample_diagnostic(&err));
            None
        }
    }
}

fn oversample_diagnostic(err: &OversampleError) -> Diagnostic {
    if err.is_warning() {
        tracing::warn!(error = %err, "SMOTE not applied");
        Diagnostic::warning(format!("cannot apply SMOTE: {err}")).for_step(Step::Oversample)
    } else {
        tracing::error!(error = %err, "SMOTE failed; keeping previous table");
        Diagnostic::error(format!("error while applying SMOTE: {err}")).for_step(Step::Oversample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnType, ColumnValues};
    use crate::diagnostics::Level;

    fn batch() -> DataBatch {
        DataBatch::new(vec![
            Column::new(
                "Time",
                ColumnValues::String(
                    (1..=6).map(|d| Some(format!("2024-01-0{d} 00:00:00"))).collect(),
                ),
            ),
            Column::new(
                "Sensor1",
                ColumnValues::Float(vec![
                    Some(1.0),
                    Some(2.0),
                    Some(3.0),
                    Some(4.0),
                    Some(5.0),
                    Some(6.0),
                ]),
            ),
            Column::new(
                LABEL_COLUMN,
                ColumnValues::Integer(vec![Some(-1), Some(-1), Some(-1), Some(-1), Some(1), Some(1)]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_idle_without_input() {
        let outcome = TransformPipeline::new(TransformSelection::all(None))
            .run(None)
            .unwrap();
        assert!(!outcome.has_output());
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_nothing_selected_passes_through() {
        let outcome = TransformPipeline::new(TransformSelection::default())
            .run(Some(batch()))
            .unwrap();
        assert_eq!(outcome.dataset.unwrap(), batch());
        assert!(outcome.records.is_empty());
        // Two previews and the success message.
        assert_eq!(outcome.diagnostics.len(), 3);
    }

    #[test]
    fn test_to_datetime_defaults_to_first_column() {
        let selection = TransformSelection {
            to_datetime: true,
            ..Default::default()
        };
        let outcome = TransformPipeline::new(selection).run(Some(batch())).unwrap();
        assert_eq!(outcome.applied_steps(), vec![Step::ToDatetime]);
        let out = outcome.dataset.unwrap();
        assert_eq!(out.column("Time").unwrap().dtype(), ColumnType::DateTime);
    }

    #[test]
    fn test_all_steps_in_order() {
        let outcome = TransformPipeline::new(TransformSelection::all(Some("Time".into())))
            .run(Some(batch()))
            .unwrap();
        assert_eq!(
            outcome.applied_steps(),
            vec![
                Step::ToDatetime,
                Step::PruneImpute,
                Step::EncodeLabel,
                Step::Oversample,
                Step::Normalize
            ]
        );
        let out = outcome.dataset.unwrap();
        // SMOTE keeps only numeric features plus the label.
        assert_eq!(out.column_names(), vec!["Sensor1", LABEL_COLUMN]);
        assert_eq!(out.row_count(), 8);
    }

    #[test]
    fn test_oversample_failure_keeps_previous_table() {
        let mut b = batch();
        b = b
            .with_values(
                LABEL_COLUMN,
                ColumnValues::Integer(vec![Some(-1), Some(-1), Some(-1), Some(-1), Some(-1), Some(1)]),
            )
            .unwrap();
        let selection = TransformSelection {
            oversample: true,
            normalize: true,
            ..Default::default()
        };
        let outcome = TransformPipeline::new(selection).run(Some(b)).unwrap();
        let warning = outcome
            .diagnostics
            .iter()
            .find(|d| d.level == Level::Warning)
            .unwrap();
        assert_eq!(
            warning.message,
            "cannot apply SMOTE: minority class too small (min class: 1)"
        );
        let out = outcome.dataset.unwrap();
        // Time column survives because SMOTE's result was discarded.
        assert_eq!(out.column("Time").unwrap().dtype(), ColumnType::String);
        assert_eq!(out.row_count(), 6);
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_fatal_error_aborts() {
        let b = batch()
            .with_values(
                "Time",
                ColumnValues::String(vec![Some("not a date".into()); 6]),
            )
            .unwrap();
        let selection = TransformSelection {
            to_datetime: true,
            time_column: Some("Time".into()),
            normalize: true,
            ..Default::default()
        };
        assert!(TransformPipeline::new(selection).run(Some(b)).is_err());
    }

    #[test]
    fn test_selection_serde_defaults() {
        let sel: TransformSelection = serde_json::from_str(r#"{"normalize": true}"#).unwrap();
        assert_eq!(sel.enabled_steps(), vec![Step::Normalize]);
    }
}
