///! TSV Formatter Utility
///! This module provides a generic TSV formatter.

use std::io::{self, Write};
use std::sync::Arc;

pub const DEFAULT_FLOAT_PRECISION: usize = 4;

/// Runtime value with embedded formatting information.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Float(f64, usize), // value, precision
    ScientificFloat(f64, usize), // value, precision. Print in scientific notation
    Str(String),
    Bool(bool),
    /// Missing value, printed as `NA`
    Missing,
    Float3DMatrix([[f64; 3]; 3], usize, &'static str), // matrix, precision, separator
    Float3DVector([f64; 3], usize, &'static str), // vector, precision, separator
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v, DEFAULT_FLOAT_PRECISION) // default precision
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Missing,
        }
    }
}

impl From<[[f64; 3]; 3]> for Value {
    fn from(v: [[f64; 3]; 3]) -> Self {
        Value::Float3DMatrix(v, DEFAULT_FLOAT_PRECISION, ",") // default precision and separator
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::Float3DVector(v, DEFAULT_FLOAT_PRECISION, ",") // default precision and separator
    }
}

/// A column definition that combines metadata and extraction logic.
pub struct Column<R> {
    /// Column key (e.g. "tm_score", "rmsd", "mobile").
    pub key: &'static str,
    /// Description of what this column represents.
    pub description: &'static str,
    /// Function to extract the value from a record.
    pub extractor: Arc<dyn Fn(&R) -> Value + Send + Sync>,
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Column {
            key: self.key,
            description: self.description,
            extractor: Arc::clone(&self.extractor),
        }
    }
}

impl<R> Column<R> {
    pub fn new<F>(key: &'static str, description: &'static str, extractor: F) -> Self
    where
        F: Fn(&R) -> Value + Send + Sync + 'static,
    {
        Column {
            key,
            description,
            extractor: Arc::new(extractor),
        }
    }
}

/// Generic TSV formatter that can be instantiated for any record type `R`.
pub struct TsvFormatter<R> {
    pub columns: Vec<Column<R>>,
}

impl<R> TsvFormatter<R> {
    pub fn new(columns: Vec<Column<R>>) -> Self {
        TsvFormatter { columns }
    }

    /// Write header line (column keys) to the writer.
    pub fn write_header<W: Write>(&self, mut w: W) -> io::Result<()> {
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(w, "\t")?;
            }
            write!(w, "{}", col.key)?;
        }
        writeln!(w)
    }

    /// Write a single record as TSV.
    pub fn write_record<W: Write>(&self, mut w: W, record: &R) -> io::Result<()> {
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(w, "\t")?;
            }
            let value = (col.extractor)(record);
            Self::write_value(&mut w, &value)?;
        }
        writeln!(w)
    }

    /// Header followed by every record.
    pub fn write_all<W: Write>(&self, mut w: W, records: &[R]) -> io::Result<()> {
        self.write_header(&mut w)?;
        for record in records {
            self.write_record(&mut w, record)?;
        }
        Ok(())
    }

    fn write_value<W: Write>(w: &mut W, value: &Value) -> io::Result<()> {
        match value {
            Value::Int(v) => write!(w, "{}", v),
            Value::Uint(v) => write!(w, "{}", v),
            Value::Float(v, precision) => write!(w, "{:.1$}", v, precision),
            Value::ScientificFloat(v, precision) => write!(w, "{:.1$e}", v, precision),
            Value::Str(s) => write!(w, "{}", escape_tsv(s)),
            Value::Bool(b) => write!(w, "{}", if *b { "1" } else { "0" }),
            Value::Missing => write!(w, "NA"),
            Value::Float3DMatrix(m, precision, separator) => {
                for (i, row) in m.iter().enumerate() {
                    if i > 0 { write!(w, "{}", separator)?; }
                    for (j, val) in row.iter().enumerate() {
                        if j > 0 { write!(w, "{}", separator)?; }
                        write!(w, "{:.1$}", val, precision)?;
                    }
                }
                Ok(())
            }
            Value::Float3DVector(v, precision, separator) => {
                for (i, val) in v.iter().enumerate() {
                    if i > 0 { write!(w, "{}", separator)?; }
                    write!(w, "{:.1$}", val, precision)?;
                }
                Ok(())
            }
        }
    }
}

/// Minimal TSV escaping (tabs and newlines).
fn escape_tsv(s: &str) -> String {
    s.replace('\t', " ").replace('\n', " ")
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;

    struct Record {
        mobile: String,
        aligned: usize,
        tm_score: Option<f64>,
        marginal_error: f64,
        converged: bool,
        translation: [f64; 3],
    }

    fn columns() -> Vec<Column<Record>> {
        vec![
            Column::new("mobile", "Mobile id", |r: &Record| Value::from(r.mobile.clone())),
            Column::new("aligned", "Aligned length", |r: &Record| Value::from(r.aligned)),
            Column::new("tm_score", "TM-score", |r: &Record| Value::from(r.tm_score)),
            Column::new("marginal", "Marginal error", |r: &Record| Value::ScientificFloat(r.marginal_error, 2)),
            Column::new("converged", "Early stopped", |r: &Record| Value::from(r.converged)),
            Column::new("t", "Translation", |r: &Record| Value::Float3DVector(r.translation, 1, ",")),
        ]
    }

    #[test]
    fn test_tsv_formatter() {
        let formatter = TsvFormatter::new(columns());
        let records = vec![
            Record {
                mobile: "1abc\tA".to_string(),
                aligned: 42,
                tm_score: Some(0.87654),
                marginal_error: 0.000123,
                converged: true,
                translation: [1.0, -2.5, 0.0],
            },
            Record {
                mobile: "2xyz".to_string(),
                aligned: 0,
                tm_score: None,
                marginal_error: 1.0,
                converged: false,
                translation: [0.0; 3],
            },
        ];
        let mut output = Vec::new();
        formatter.write_all(&mut output, &records).unwrap();
        let result = String::from_utf8(output).unwrap();
        let expected = "mobile\taligned\ttm_score\tmarginal\tconverged\tt\n\
                        1abc A\t42\t0.8765\t1.23e-4\t1\t1.0,-2.5,0.0\n\
                        2xyz\t0\tNA\t1.00e0\t0\t0.0,0.0,0.0\n";
        assert_eq!(result, expected);
    }
}
