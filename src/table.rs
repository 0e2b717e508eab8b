use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::ForecastError;

/// One loosely typed table value. Scraped data arrives as strings; stages coerce
/// towards `Number` as they go.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Reads a raw CSV field: blank is `Empty`, anything that parses as a finite
    /// float is a `Number`, the rest stays `Text`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Text(raw.to_string()),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    pub fn from_opt<T: Into<f64>>(value: Option<T>) -> Self {
        value.map_or(Cell::Empty, |v| Cell::Number(v.into()))
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Cell::Number(v) if *v == 0.0)
    }

    /// CSV rendering. Integral numbers drop the fractional part so a
    /// write/read/write cycle produces identical bytes.
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) => format_number(*v),
            Cell::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return String::new();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Column-ordered, row-major table with a dynamic schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        let mut table = Table::default();
        for name in columns {
            table.ensure_column(&name);
        }
        table
    }

    /// Builds a table from sparse records. Columns appear in first-seen order and
    /// rows that lack a column hold `Cell::Empty` there.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Vec<(String, Cell)>>,
    {
        let mut table = Table::default();
        for record in records {
            table.push_record(record);
        }
        table
    }

    pub fn push_record(&mut self, record: Vec<(String, Cell)>) {
        let mut row = vec![Cell::Empty; self.columns.len()];
        for (name, cell) in record {
            let col = self.ensure_column(&name);
            if col >= row.len() {
                row.resize(col + 1, Cell::Empty);
            }
            row[col] = cell;
        }
        self.rows.push(row);
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.index.get(name) {
            return *idx;
        }
        let idx = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        for row in &mut self.rows {
            row.push(Cell::Empty);
        }
        idx
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, ForecastError> {
        self.column_index(name)
            .ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        &self.rows[row]
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Cell> {
        let col = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[col])
    }

    pub fn column_cells(&self, col: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |r| &r[col])
    }

    pub fn map_column(&mut self, col: usize, mut f: impl FnMut(&Cell) -> Cell) {
        for row in &mut self.rows {
            row[col] = f(&row[col]);
        }
    }

    /// Adds `name`, or overwrites it in place when it already exists.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        let col = self.ensure_column(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[col] = value;
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        if self.has_column(to) {
            return;
        }
        let Some(idx) = self.index.remove(from) else {
            return;
        };
        self.columns[idx] = to.to_string();
        self.index.insert(to.to_string(), idx);
    }

    pub fn drop_columns(&mut self, names: &[String]) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|idx| !names.contains(&self.columns[*idx]))
            .collect();
        if keep.len() == self.columns.len() {
            return;
        }
        self.columns = keep.iter().map(|idx| self.columns[*idx].clone()).collect();
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|idx| std::mem::take(&mut row[*idx])).collect();
        }
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Cell]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: indices.iter().map(|idx| self.rows[*idx].clone()).collect(),
        }
    }

    /// A column is numeric when it has no text cells. Blank cells do not count
    /// against it.
    pub fn is_numeric_column(&self, col: usize) -> bool {
        self.column_cells(col)
            .all(|cell| matches!(cell, Cell::Number(_) | Cell::Empty))
    }

    /// Schema-union concatenation: columns are merged in first-seen order, rows
    /// keep their order, and missing columns are left blank.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut out = Table::default();
        for table in tables {
            let targets: Vec<usize> = table
                .columns
                .iter()
                .map(|name| out.ensure_column(name))
                .collect();
            for row in table.rows {
                let mut merged = vec![Cell::Empty; out.columns.len()];
                for (cell, target) in row.into_iter().zip(&targets) {
                    merged[*target] = cell;
                }
                out.rows.push(merged);
            }
        }
        out
    }

    pub fn read_csv(path: &Path) -> Result<Table> {
        if !path.exists() {
            return Err(ForecastError::missing_input(path).into());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("open csv {}", path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("read csv header {}", path.display()))?
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>();
        let mut seen = HashSet::with_capacity(headers.len());
        if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
            return Err(ForecastError::DuplicateColumn {
                path: path.display().to_string(),
                column: dup.clone(),
            }
            .into());
        }
        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record.with_context(|| format!("read csv row {}", path.display()))?;
            table.push_row(record.iter().map(Cell::parse).collect());
        }
        Ok(table)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("create csv {}", path.display()))?;
        writer
            .write_record(&self.columns)
            .context("write csv header")?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(Cell::render))
                .context("write csv row")?;
        }
        writer.flush().context("flush csv")?;
        Ok(())
    }
}

/// First unsigned decimal inside `raw` (`55` in `"55%"`, `1.5` in `"1,5 xG"`).
/// A comma is read as a decimal point.
pub fn extract_decimal(raw: &str) -> Option<f64> {
    let s = raw.replace(',', ".");
    let start = s.find(|ch: char| ch.is_ascii_digit())?;
    let mut end = start;
    let mut seen_dot = false;
    for (offset, ch) in s[start..].char_indices() {
        if ch.is_ascii_digit() {
            end = start + offset + 1;
        } else if ch == '.' && !seen_dot {
            seen_dot = true;
            end = start + offset + 1;
        } else {
            break;
        }
    }
    s[start..end].parse::<f64>().ok()
}

/// Drops everything except digits, `.` and `-`, then parses what is left.
pub fn strip_to_number(raw: &str) -> Option<f64> {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();
    kept.parse::<f64>().ok().filter(|v| v.is_finite())
}
