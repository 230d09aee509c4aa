use crate::core::io::traits::TableFile;
use crate::core::io::tsv::TsvFile;
use crate::core::models::columns::{ColumnKind, ColumnRegistry};
use crate::core::models::frame::{Column, ColumnData, Frame};
use crate::engine::config::PlotConfig;
use crate::engine::error::EngineError;
use crate::engine::table::MoleculeTable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument, warn};

pub const TEST_SET_COLUMN: &str = "TestSet";
const FOLD_COLUMN: &str = "Fold";
const INDEPENDENT_SET: &str = "Independent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    Regression,
    Classification,
}

/// Which prediction-derived column colours a performance plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformancePlotKind {
    Errors,
    Splits,
    Predictions,
    Labels,
}

impl PerformancePlotKind {
    pub fn color_column(self, target: &str) -> String {
        match self {
            PerformancePlotKind::Errors => error_column(target),
            PerformancePlotKind::Splits => TEST_SET_COLUMN.to_string(),
            PerformancePlotKind::Predictions => prediction_column(target),
            PerformancePlotKind::Labels => label_column(target),
        }
    }
}

pub fn label_column(target: &str) -> String {
    format!("{}_Label", target)
}

pub fn prediction_column(target: &str) -> String {
    format!("{}_Prediction", target)
}

pub fn error_column(target: &str) -> String {
    format!("{}_Error", target)
}

fn probability_prefix(target: &str) -> String {
    format!("{}_ProbabilityClass_", target)
}

/// Model predictions for one target, keyed by the molecule index column.
///
/// Cross-validation files carry a `Fold` column; rows from them are assigned
/// to `Fold_<n>` (1-based). Rows from files without it form the
/// `Independent` test set.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSet {
    pub target: String,
    pub task: TaskKind,
    pub index_column: String,
    pub probability_columns: Vec<String>,
    frame: Frame,
}

impl PredictionSet {
    /// Reads a prediction TSV whose first column is the molecule index.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>, target: &str, task: TaskKind) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = TsvFile::read_from_path(path, &ColumnRegistry::new(""))
            .map_err(|source| EngineError::PredictionRead {
                path: display.clone(),
                source,
            })?;
        let invalid = |reason: String| EngineError::Predictions {
            path: display.clone(),
            reason,
        };

        let index_column = raw
            .column_names()
            .first()
            .map(|name| name.to_string())
            .ok_or_else(|| invalid("file has no columns".to_string()))?;
        let label_name = label_column(target);
        let prediction_name = prediction_column(target);
        let labels = numeric(&raw, &label_name).map_err(invalid)?;
        let predictions = numeric(&raw, &prediction_name).map_err(invalid)?;

        let errors: Vec<Option<f64>> = labels
            .iter()
            .zip(&predictions)
            .map(|(label, prediction)| Some((*label)? - (*prediction)?))
            .collect();

        let test_sets: Vec<Option<String>> = match raw.column(FOLD_COLUMN) {
            Some(folds) => (0..raw.row_count())
                .map(|row| {
                    let fold = folds.data.number(row).ok_or_else(|| {
                        invalid(format!("row {} has no numeric fold", row + 1))
                    })?;
                    Ok(Some(format!("Fold_{}", fold as i64 + 1)))
                })
                .collect::<Result<_, EngineError>>()?,
            None => vec![Some(INDEPENDENT_SET.to_string()); raw.row_count()],
        };

        let prefix = probability_prefix(target);
        let probability_columns: Vec<String> = raw
            .column_names()
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .map(String::from)
            .collect();

        let mut frame = Frame::new();
        let index = raw
            .column(&index_column)
            .ok_or_else(|| invalid(format!("missing index column '{}'", index_column)))?;
        frame.insert(Column::new(index_column.clone(), index.data.clone()))?;
        frame.insert(Column::text(TEST_SET_COLUMN, test_sets))?;
        match task {
            TaskKind::Regression => {
                frame.insert(Column::numeric(label_name, labels))?;
                frame.insert(Column::numeric(prediction_name, predictions))?;
            }
            TaskKind::Classification => {
                frame.insert(Column::text(label_name, class_labels(&labels)))?;
                frame.insert(Column::text(prediction_name, class_labels(&predictions)))?;
            }
        }
        frame.insert(Column::numeric(error_column(target), errors))?;
        for name in &probability_columns {
            if let Some(column) = raw.column(name) {
                frame.insert(column.clone())?;
            }
        }

        info!(rows = frame.row_count(), "Loaded predictions.");
        Ok(Self {
            target: target.to_string(),
            task,
            index_column,
            probability_columns,
            frame,
        })
    }

    /// Stacks two prediction sets of the same target, e.g. cross-validation and independent test.
    pub fn concat(mut self, other: PredictionSet) -> Result<Self, EngineError> {
        let mut columns = Vec::with_capacity(self.frame.column_count());
        for column in self.frame.columns() {
            let tail = other
                .frame
                .column(&column.name)
                .map(|c| c.data.clone())
                .unwrap_or_else(|| empty_like(&column.data, other.frame.row_count()));
            columns.push(Column::new(column.name.clone(), append(&column.data, &tail)));
        }
        self.frame = Frame::from_columns(columns)?;
        Ok(self)
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn row_count(&self) -> usize {
        self.frame.row_count()
    }

    /// The prediction-derived columns shown on hover cards.
    pub fn card_columns(&self) -> Vec<String> {
        let mut columns = vec![
            self.index_column.clone(),
            TEST_SET_COLUMN.to_string(),
            label_column(&self.target),
            prediction_column(&self.target),
            error_column(&self.target),
        ];
        columns.extend(self.probability_columns.iter().cloned());
        columns
    }
}

fn numeric(frame: &Frame, name: &str) -> Result<Vec<Option<f64>>, String> {
    let column = frame
        .column(name)
        .ok_or_else(|| format!("missing column '{}'", name))?;
    match column.data.to_numeric() {
        Some(ColumnData::Numeric(values)) => Ok(values),
        _ => Err(format!("column '{}' is not numeric", name)),
    }
}

fn class_labels(values: &[Option<f64>]) -> Vec<Option<String>> {
    values
        .iter()
        .map(|value| value.map(|v| format!("Class_{}", v as i64)))
        .collect()
}

fn empty_like(data: &ColumnData, rows: usize) -> ColumnData {
    match data {
        ColumnData::Text(_) => ColumnData::Text(vec![None; rows]),
        ColumnData::Numeric(_) => ColumnData::Numeric(vec![None; rows]),
    }
}

fn append(head: &ColumnData, tail: &ColumnData) -> ColumnData {
    match (head, tail) {
        (ColumnData::Numeric(a), ColumnData::Numeric(b)) => {
            ColumnData::Numeric(a.iter().chain(b).copied().collect())
        }
        _ => {
            let rows = head.len() + tail.len();
            ColumnData::Text(
                (0..rows)
                    .map(|row| {
                        if row < head.len() {
                            head.text(row)
                        } else {
                            tail.text(row - head.len())
                        }
                    })
                    .collect(),
            )
        }
    }
}

/// A molecule table joined with model predictions, with a plot configured for it.
pub struct PerformanceView {
    pub table: MoleculeTable,
    pub plot: PlotConfig,
}

/// Joins `predictions` onto `table` by the index column and prepares the plot settings.
///
/// The joined table keeps the SMILES, index, requested card, descriptor,
/// scaffold and manifold columns of `table` for the molecules that have
/// predictions, in table order. It is written to `output`.
#[instrument(skip_all, name = "performance_workflow", fields(kind = ?kind))]
pub fn prepare_view(
    table: &MoleculeTable,
    predictions: &PredictionSet,
    kind: PerformancePlotKind,
    card_columns: &[String],
    base: &PlotConfig,
    output: impl AsRef<Path>,
) -> Result<PerformanceView, EngineError> {
    let index_name = &predictions.index_column;
    let index = table
        .column(index_name)
        .ok_or_else(|| EngineError::MissingColumn(index_name.clone()))?;
    let prediction_index = predictions
        .frame
        .column(index_name)
        .ok_or_else(|| EngineError::MissingColumn(index_name.clone()))?;

    let mut lookup: HashMap<String, usize> = HashMap::new();
    for row in 0..predictions.row_count() {
        if let Some(key) = prediction_index.data.text(row) {
            lookup.entry(key).or_insert(row);
        }
    }
    let (table_rows, prediction_rows): (Vec<usize>, Vec<usize>) = (0..table.row_count())
        .filter_map(|row| {
            let key = index.data.text(row)?;
            lookup.get(&key).map(|&matched| (row, matched))
        })
        .unzip();
    if table_rows.len() < predictions.row_count() {
        warn!(
            unmatched = predictions.row_count() - table_rows.len(),
            "Some predictions have no matching molecule in the table."
        );
    }

    let keep = |name: &str| {
        name == table.smiles_column()
            || name == index_name
            || card_columns.iter().any(|c| c == name)
            || matches!(
                table.classify(name),
                ColumnKind::Descriptor { .. } | ColumnKind::Scaffold { .. } | ColumnKind::Manifold { .. }
            )
    };
    let mut columns: Vec<Column> = table
        .frame()
        .columns()
        .iter()
        .filter(|c| keep(&c.name))
        .map(|c| Column::new(c.name.clone(), c.data.take(&table_rows)))
        .collect();
    for column in predictions.frame.columns() {
        if column.name != *index_name {
            columns.retain(|c| c.name != column.name);
            columns.push(Column::new(column.name.clone(), column.data.take(&prediction_rows)));
        }
    }

    let joined = MoleculeTable::from_frame(output, Frame::from_columns(columns)?, table.smiles_column())?;
    info!(rows = joined.row_count(), "Joined predictions onto molecule table.");

    let mut cards = predictions.card_columns();
    cards.extend(card_columns.iter().cloned());
    let plot = PlotConfig {
        color_by: Some(kind.color_column(&predictions.target)),
        title_column: Some(index_name.clone()),
        card_columns: cards,
        ..base.clone()
    };
    Ok(PerformanceView {
        table: joined,
        plot,
    })
}
