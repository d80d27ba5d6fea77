//! Typed nested-list values.
//!
//! Masks are persisted as a small tree of typed values: numeric matrices,
//! string matrices and heterogeneous lists. [`WireValue`] models that tree;
//! the [`mask`](crate::mask) codec gives it meaning.
//!
//! Matrices store their cells in column-major order, so a column vector and
//! a row vector holding the same strings share the same `data` and differ
//! only by their dimensions.

use serde::{Deserialize, Serialize};

use crate::error::ShapeError;

/// A dense two-dimensional matrix stored in column-major order.
///
/// Deserialization goes through [`Matrix::new`], so dimensions that do not
/// match the cell count are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMatrix<T>")]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// Unchecked serialized form of a [`Matrix`].
#[derive(Deserialize)]
struct RawMatrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T> TryFrom<RawMatrix<T>> for Matrix<T> {
    type Error = ShapeError;

    fn try_from(raw: RawMatrix<T>) -> Result<Self, Self::Error> {
        Matrix::new(raw.rows, raw.cols, raw.data)
    }
}

/// Matrix of doubles. An empty one is the legacy "no data" marker.
pub type DoubleMatrix = Matrix<f64>;

/// Matrix of strings.
pub type StringMatrix = Matrix<String>;

impl<T> Matrix<T> {
    /// Creates a matrix from column-major data.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::Dimensions`] if `data` does not hold exactly
    /// `rows * cols` cells.
    pub fn new(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, ShapeError> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(ShapeError::Dimensions {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Creates a `0x0` matrix.
    pub fn empty() -> Self {
        Self {
            rows: 0,
            cols: 0,
            data: Vec::new(),
        }
    }

    /// Creates an `n x 1` matrix.
    pub fn column(data: Vec<T>) -> Self {
        Self {
            rows: data.len(),
            cols: 1,
            data,
        }
    }

    /// Creates a `1 x n` matrix.
    pub fn row(data: Vec<T>) -> Self {
        Self {
            rows: 1,
            cols: data.len(),
            data,
        }
    }

    /// Creates a `1 x 1` matrix.
    pub fn scalar(value: T) -> Self {
        Self::row(vec![value])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the cell at (`row`, `col`), or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(col * self.rows + row)
    }

    /// Returns the cells in column-major order.
    pub fn data(&self) -> &[T] {
        &self.data
    }
}

impl<T: Clone> Matrix<T> {
    /// Returns the transposed matrix.
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());
        for row in 0..self.rows {
            for col in 0..self.cols {
                if let Some(cell) = self.get(row, col) {
                    data.push(cell.clone());
                }
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }
}

impl StringMatrix {
    /// Builds a string matrix from anything yielding string-like items, as a column.
    pub fn from_strings<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::column(items.into_iter().map(Into::into).collect())
    }
}

/// A typed value of the nested-list wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum WireValue {
    Double(DoubleMatrix),
    String(StringMatrix),
    List(Vec<WireValue>),
}

impl WireValue {
    /// The empty double matrix `[]`.
    pub fn empty_double() -> Self {
        WireValue::Double(Matrix::empty())
    }

    /// A `1 x 1` string matrix.
    pub fn string(value: impl Into<String>) -> Self {
        WireValue::String(Matrix::scalar(value.into()))
    }

    /// A `1 x 1` double matrix.
    pub fn double(value: f64) -> Self {
        WireValue::Double(Matrix::scalar(value))
    }

    /// Returns a short name of the value type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            WireValue::Double(_) => "double",
            WireValue::String(_) => "string",
            WireValue::List(_) => "list",
        }
    }

    pub fn as_list(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&StringMatrix> {
        match self {
            WireValue::String(matrix) => Some(matrix),
            _ => None,
        }
    }

    pub fn as_doubles(&self) -> Option<&DoubleMatrix> {
        match self {
            WireValue::Double(matrix) => Some(matrix),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_dimensions() {
        assert!(Matrix::new(2, 2, vec![1.0, 2.0, 3.0, 4.0]).is_ok());

        let err = Matrix::new(2, 3, vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            ShapeError::Dimensions {
                rows: 2,
                cols: 3,
                len: 1
            }
        );
    }

    #[test]
    fn test_new_rejects_overflowing_dimensions() {
        let err = Matrix::new(usize::MAX, 2, vec![1.0]).unwrap_err();
        assert!(matches!(err, ShapeError::Dimensions { len: 1, .. }));
    }

    #[test]
    fn test_column_major_access() {
        // [a c]
        // [b d]
        let matrix = Matrix::new(2, 2, vec!["a", "b", "c", "d"]).unwrap();
        assert_eq!(matrix.get(0, 0), Some(&"a"));
        assert_eq!(matrix.get(1, 0), Some(&"b"));
        assert_eq!(matrix.get(0, 1), Some(&"c"));
        assert_eq!(matrix.get(1, 1), Some(&"d"));
        assert_eq!(matrix.get(2, 0), None);
        assert_eq!(matrix.get(0, 2), None);
    }

    #[test]
    fn test_transpose() {
        let column = StringMatrix::from_strings(["x", "y", "z"]);
        let row = column.transpose();

        assert_eq!(row.rows(), 1);
        assert_eq!(row.cols(), 3);
        assert_eq!(row.get(0, 2).map(String::as_str), Some("z"));
        assert_eq!(row.transpose(), column);
    }

    #[test]
    fn test_empty_and_scalar() {
        let empty: DoubleMatrix = Matrix::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.rows(), 0);

        let scalar = Matrix::scalar(-1.0);
        assert_eq!(scalar.len(), 1);
        assert_eq!(scalar.get(0, 0), Some(&-1.0));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(WireValue::empty_double().type_name(), "double");
        assert_eq!(WireValue::string("t").type_name(), "string");
        assert_eq!(WireValue::List(vec![]).type_name(), "list");
    }

    #[test]
    fn test_accessors() {
        let list = WireValue::List(vec![WireValue::string("a"), WireValue::double(2.0)]);
        let items = list.as_list().unwrap();
        assert!(items[0].as_strings().is_some());
        assert!(items[1].as_doubles().is_some());
        assert!(items[0].as_list().is_none());
    }
}
