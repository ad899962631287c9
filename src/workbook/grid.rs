use calamine::{Data, Range};
use serde::Serialize;
use std::fmt;

/// A single raw cell of the worksheet grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Text content of the cell, if it holds text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of the cell
    ///
    /// Text cells are parsed leniently: surrounding whitespace and a trailing
    /// `%` are ignored, and a decimal comma is accepted ("1234,5", "1.234,5").
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_number(s),
            Cell::Empty => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            // Error cells (#DIV/0!, #N/A, ...) carry no usable value
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        return Some(n);
    }
    // German notation: '.' as thousands separator, ',' as decimal separator
    if trimmed.contains(',') {
        let normalized = trimmed.replace('.', "").replace(',', ".");
        return normalized.parse::<f64>().ok();
    }
    None
}

/// Raw worksheet content addressed by absolute sheet coordinates
///
/// Row 0 / column 0 is cell A1, regardless of where the sheet's used range
/// starts. Reads outside the stored area yield [`Cell::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build a grid from a calamine range, re-anchoring it at A1
    pub fn from_range(range: &Range<Data>) -> Self {
        let (row_offset, col_offset) = match range.start() {
            Some((r, c)) => (r as usize, c as usize),
            None => return Self::default(),
        };

        let mut rows = vec![Vec::new(); row_offset];
        for source_row in range.rows() {
            let mut row = vec![Cell::Empty; col_offset];
            row.extend(source_row.iter().map(Cell::from));
            while row.last().is_some_and(Cell::is_empty) {
                row.pop();
            }
            rows.push(row);
        }

        Self { rows }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }

    pub fn row(&self, row: usize) -> &[Cell] {
        self.rows.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }
}
