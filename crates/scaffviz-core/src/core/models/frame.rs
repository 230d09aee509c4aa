use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Column '{0}' not found")]
    MissingColumn(String),
}

/// Cell values of a single column. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(values) => values.len(),
            ColumnData::Numeric(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    /// The cell rendered as text, the way it is written to disk.
    pub fn text(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Text(values) => values.get(row).cloned().flatten(),
            ColumnData::Numeric(values) => values
                .get(row)
                .copied()
                .flatten()
                .map(|value| value.to_string()),
        }
    }

    /// The cell as a number, parsing text cells on demand.
    pub fn number(&self, row: usize) -> Option<f64> {
        match self {
            ColumnData::Numeric(values) => values.get(row).copied().flatten(),
            ColumnData::Text(values) => values
                .get(row)
                .and_then(|cell| cell.as_deref())
                .and_then(|cell| cell.trim().parse::<f64>().ok()),
        }
    }

    /// Every non-empty cell parses as a number.
    pub fn is_numeric_like(&self) -> bool {
        match self {
            ColumnData::Numeric(_) => true,
            ColumnData::Text(values) => {
                values.iter().any(Option::is_some)
                    && values
                        .iter()
                        .flatten()
                        .all(|cell| cell.trim().parse::<f64>().is_ok())
            }
        }
    }

    /// Converts text cells to numbers. Returns `None` if any non-empty cell is not numeric.
    pub fn to_numeric(&self) -> Option<ColumnData> {
        match self {
            ColumnData::Numeric(_) => Some(self.clone()),
            ColumnData::Text(values) => values
                .iter()
                .map(|cell| match cell.as_deref() {
                    None => Some(None),
                    Some(text) => text.trim().parse::<f64>().ok().map(Some),
                })
                .collect::<Option<Vec<_>>>()
                .map(ColumnData::Numeric),
        }
    }

    /// Like [`ColumnData::to_numeric`], but only when every cell would be
    /// written back exactly as it was read.
    pub fn to_numeric_exact(&self) -> Option<ColumnData> {
        let numeric = self.to_numeric()?;
        let exact = (0..self.len()).all(|row| numeric.text(row) == self.text(row));
        exact.then_some(numeric)
    }

    pub fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Text(values) => {
                ColumnData::Text(rows.iter().map(|&r| values.get(r).cloned().flatten()).collect())
            }
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(rows.iter().map(|&r| values.get(r).copied().flatten()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self::new(name, ColumnData::Text(values))
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }
}

/// An ordered collection of equally long named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self, FrameError> {
        let mut frame = Frame::new();
        for column in columns {
            if frame.column(&column.name).is_some() {
                return Err(FrameError::DuplicateColumn(column.name));
            }
            frame.insert(column)?;
        }
        Ok(frame)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Adds a column, replacing any existing column of the same name in place.
    pub fn insert(&mut self, column: Column) -> Result<(), FrameError> {
        if self.columns.is_empty() {
            self.rows = column.data.len();
        } else if column.data.len() != self.rows {
            return Err(FrameError::LengthMismatch {
                column: column.name,
                expected: self.rows,
                actual: column.data.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        let removed = self.columns.remove(index);
        if self.columns.is_empty() {
            self.rows = 0;
        }
        Some(removed)
    }

    /// Columns whose names start with `prefix`, in table order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.name.starts_with(prefix))
            .collect()
    }

    /// A new frame holding the given rows, in the given order.
    pub fn take(&self, rows: &[usize]) -> Frame {
        Frame {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.take(rows)))
                .collect(),
            rows: rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::from_columns(vec![
            Column::text("SMILES", vec![Some("CCO".into()), Some("c1ccccc1".into()), None]),
            Column::numeric("Activity", vec![Some(1.5), None, Some(3.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn insert_rejects_length_mismatch() {
        let mut frame = sample();
        let result = frame.insert(Column::numeric("Short", vec![Some(1.0)]));
        assert_eq!(
            result,
            Err(FrameError::LengthMismatch {
                column: "Short".into(),
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn insert_replaces_existing_column_in_place() {
        let mut frame = sample();
        frame
            .insert(Column::numeric("SMILES", vec![Some(0.0); 3]))
            .unwrap();
        assert_eq!(frame.column_names(), vec!["SMILES", "Activity"]);
        assert!(frame.column("SMILES").unwrap().data.is_numeric());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = Frame::from_columns(vec![
            Column::text("A", vec![None]),
            Column::text("A", vec![None]),
        ]);
        assert_eq!(result, Err(FrameError::DuplicateColumn("A".into())));
    }

    #[test]
    fn numeric_conversion_keeps_missing_cells() {
        let data = ColumnData::Text(vec![Some("1".into()), None, Some(" 2.5".into())]);
        assert_eq!(
            data.to_numeric(),
            Some(ColumnData::Numeric(vec![Some(1.0), None, Some(2.5)]))
        );
        assert!(ColumnData::Text(vec![Some("x".into())]).to_numeric().is_none());
        assert_eq!(data.text(2).as_deref(), Some(" 2.5"));
        assert_eq!(ColumnData::Numeric(vec![Some(2.0)]).text(0).as_deref(), Some("2"));
    }

    #[test]
    fn take_selects_rows_in_order() {
        let frame = sample().take(&[2, 0]);
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.column("SMILES").unwrap().data.text(1).as_deref(), Some("CCO"));
        assert_eq!(frame.column("Activity").unwrap().data.number(0), Some(3.0));
    }
}
