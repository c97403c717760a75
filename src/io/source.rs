//! Named-column tabular sources.
//!
//! The core does not parse any file format. It only needs something that can
//! hand out numeric columns by name, which is what [`ColumnSource`] describes.
//! [`ColumnTable`] is the in-memory implementation used by the CSV reader, the
//! synthetic generator, and tests.

/// A loaded record exposing named numeric columns.
pub trait ColumnSource {
    /// Column names in their stored order.
    fn column_names(&self) -> Vec<&str>;

    /// A column as floating-point values.
    fn float_column(&self, name: &str) -> Option<Vec<f64>>;

    /// A column as integer flags. `None` if absent or not representable as `i32`.
    fn flag_column(&self, name: &str) -> Option<Vec<i32>>;
}

/// One stored column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Flag(Vec<i32>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Flag(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `i` as `f64`.
    pub fn value(&self, i: usize) -> f64 {
        match self {
            Column::Float(v) => v[i],
            Column::Flag(v) => f64::from(v[i]),
        }
    }
}

/// An ordered, in-memory set of named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnTable {
    columns: Vec<(String, Column)>,
}

impl ColumnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a floating-point column.
    pub fn with_float(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.insert(name.into(), Column::Float(values));
        self
    }

    /// Add (or replace) an integer flag column.
    pub fn with_flags(mut self, name: impl Into<String>, values: Vec<i32>) -> Self {
        self.insert(name.into(), Column::Flag(values));
        self
    }

    pub fn insert(&mut self, name: String, column: Column) {
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = column,
            None => self.columns.push((name, column)),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Number of rows (length of the longest column).
    pub fn n_rows(&self) -> usize {
        self.columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }
}

impl ColumnSource for ColumnTable {
    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn float_column(&self, name: &str) -> Option<Vec<f64>> {
        match self.column(name)? {
            Column::Float(v) => Some(v.clone()),
            Column::Flag(v) => Some(v.iter().map(|&q| f64::from(q)).collect()),
        }
    }

    fn flag_column(&self, name: &str) -> Option<Vec<i32>> {
        match self.column(name)? {
            Column::Flag(v) => Some(v.clone()),
            Column::Float(v) => v.iter().map(|&x| flag_value(x)).collect(),
        }
    }
}

/// `x` as an `i32` flag when it is integral and in range.
pub(crate) fn flag_value(x: f64) -> Option<i32> {
    let in_range =
        x.is_finite() && x.fract() == 0.0 && x >= f64::from(i32::MIN) && x <= f64::from(i32::MAX);
    in_range.then_some(x as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_keep_insertion_order_and_replace_in_place() {
        let table = ColumnTable::new()
            .with_float("TIME", vec![0.0, 1.0])
            .with_float("SAP_FLUX", vec![1.0, 2.0])
            .with_float("TIME", vec![5.0, 6.0]);
        assert_eq!(table.column_names(), vec!["TIME", "SAP_FLUX"]);
        assert_eq!(table.float_column("TIME").unwrap(), vec![5.0, 6.0]);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn float_columns_convert_to_flags_only_when_integral() {
        let table = ColumnTable::new()
            .with_float("QUALITY", vec![0.0, 128.0])
            .with_float("BAD", vec![0.5, 1.0])
            .with_flags("FLAGS", vec![1, 2]);
        assert_eq!(table.flag_column("QUALITY").unwrap(), vec![0, 128]);
        assert!(table.flag_column("BAD").is_none());
        assert_eq!(table.float_column("FLAGS").unwrap(), vec![1.0, 2.0]);
        assert!(table.flag_column("MISSING").is_none());
    }
}
