//! Flat tables: one per exported sheet.

use std::fmt;

use serde::Serialize;

use crate::error::InventoryError;

/// Placeholder for optional fields the provider did not return.
pub const NA: &str = "N/A";

/// A single value in a table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    /// Text cell, falling back to `"N/A"` when absent.
    pub fn opt<S: Into<String>>(value: Option<S>) -> Self {
        match value {
            Some(v) => Cell::Text(v.into()),
            None => Cell::Text(NA.to_string()),
        }
    }

    /// Integer cell, falling back to `"N/A"` when absent.
    pub fn opt_int<N: Into<i64>>(value: Option<N>) -> Self {
        match value {
            Some(v) => Cell::Int(v.into()),
            None => Cell::Text(NA.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Int(n) => write!(f, "{}", n),
            Cell::Float(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<&String> for Cell {
    fn from(s: &String) -> Self {
        Cell::Text(s.clone())
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Int(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Int(n as i64)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Float(n)
    }
}

impl From<bool> for Cell {
    fn from(b: bool) -> Self {
        Cell::Bool(b)
    }
}

/// A record that projects into one table row.
pub trait ToRow {
    const HEADERS: &'static [&'static str];

    fn to_row(&self) -> Vec<Cell>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Pie,
    Column,
}

/// Chart over the table's first column (categories) and second column (values).
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    /// Zero-based (row, column) of the chart's top-left corner.
    pub anchor: (u32, u16),
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, anchor: (u32, u16)) -> Self {
        Self {
            kind,
            title: title.to_string(),
            x_axis: None,
            y_axis: None,
            anchor,
        }
    }

    pub fn with_axes(mut self, x_axis: &str, y_axis: &str) -> Self {
        self.x_axis = Some(x_axis.to_string());
        self.y_axis = Some(y_axis.to_string());
        self
    }
}

/// A named sheet of rows sharing one header.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    /// Column rendered with the misconfiguration fill.
    pub highlight_column: Option<usize>,
    pub charts: Vec<ChartSpec>,
}

impl Table {
    pub fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
            highlight_column: None,
            charts: Vec::new(),
        }
    }

    /// Build a table from records sharing the record type's header.
    pub fn from_records<T: ToRow>(name: &str, records: &[T]) -> Result<Self, InventoryError> {
        let mut table = Self::new(name, T::HEADERS);
        for record in records {
            table.push_row(record.to_row())?;
        }
        Ok(table)
    }

    /// Append a row; its width must equal the header's.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), InventoryError> {
        if row.len() != self.headers.len() {
            return Err(InventoryError::ColumnMismatch {
                table: self.name.clone(),
                expected: self.headers.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a single message spanning the first column, padding the rest.
    pub fn push_message(&mut self, message: &str) {
        let mut row = vec![Cell::from(message)];
        row.resize(self.headers.len().max(1), Cell::from(""));
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn with_highlight(mut self, column: usize) -> Self {
        self.highlight_column = Some(column);
        self
    }

    pub fn with_chart(mut self, chart: ChartSpec) -> Self {
        self.charts.push(chart);
        self
    }

    /// Values of one column rendered as text.
    pub fn column_text(&self, column: usize) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.get(column).map(|c| c.to_string()))
            .collect()
    }
}
