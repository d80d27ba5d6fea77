//! Mask documents and their wire codec.
//!
//! A mask is the user-editable parameter table of a block: a title followed by
//! ordered `(name, value, description)` rows. It is stored as
//!
//! ```text
//! list(values, list(names, descriptions, pol_fields))
//! ```
//!
//! where `descriptions` carries the title in its first cell, so it is one cell
//! longer than `values` and `names`. A mask without rows is stored as the
//! legacy empty document `list([], list([], title, list([])))`.
//!
//! [`decode`] and [`encode`] convert between that wire form and
//! [`MaskDocument`].

use log::trace;
use serde::{Deserialize, Serialize};

use crate::{
    error::ShapeError,
    wire::{Matrix, StringMatrix, WireValue},
};

/// Title used when a block carries no mask at all.
pub const DEFAULT_TITLE: &str = "Set block parameters";

/// Type tag written for each entry in the pol fields.
pub const POL_TAG: &str = "pol";

/// Dimension marker written for each entry in the pol fields (automatic).
pub const AUTOMATIC_DIMENSION: f64 = -1.0;

/// A single mask row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaskEntry {
    name: String,
    value: String,
    #[serde(default)]
    description: String,
}

impl MaskEntry {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Renders the entry as a `name = value` statement.
    ///
    /// The value is used verbatim as a statement fragment.
    pub fn assignment(&self) -> String {
        format!("{} = {}", self.name, self.value)
    }
}

/// A title plus ordered mask entries.
///
/// Equality is order-sensitive: entry order decides positional
/// correspondence in the wire arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskDocument {
    title: String,
    #[serde(default)]
    entries: Vec<MaskEntry>,
}

impl Default for MaskDocument {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE)
    }
}

impl MaskDocument {
    /// Creates a document with a title and no entries.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Replaces the entries (builder style).
    pub fn with_entries(mut self, entries: Vec<MaskEntry>) -> Self {
        self.entries = entries;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn entries(&self) -> &[MaskEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut Vec<MaskEntry> {
        &mut self.entries
    }

    pub fn push(&mut self, entry: MaskEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the `name = value` statements of all entries, in order.
    pub fn assignments(&self) -> impl Iterator<Item = String> + '_ {
        self.entries.iter().map(MaskEntry::assignment)
    }
}

/// Layout of the vectors inside the wire arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    /// Entries run down the first column.
    Column,
    /// Entries run along the first row.
    Row,
}

impl Orientation {
    fn of(descriptions: &StringMatrix) -> Self {
        if descriptions.rows() >= descriptions.cols() {
            Orientation::Column
        } else {
            Orientation::Row
        }
    }

    fn len(self, matrix: &StringMatrix) -> usize {
        match self {
            Orientation::Column => matrix.rows(),
            Orientation::Row => matrix.cols(),
        }
    }

    fn cell(self, matrix: &StringMatrix, index: usize) -> Option<&str> {
        let cell = match self {
            Orientation::Column => matrix.get(index, 0),
            Orientation::Row => matrix.get(0, index),
        };
        cell.map(String::as_str)
    }
}

/// Reads a string array that may be replaced by the legacy double marker.
fn strings_or_marker<'a>(
    value: &'a WireValue,
    field: &'static str,
) -> Result<Option<&'a StringMatrix>, ShapeError> {
    match value {
        WireValue::String(matrix) => Ok(Some(matrix)),
        WireValue::Double(_) => Ok(None),
        other => Err(ShapeError::UnexpectedType {
            field,
            expected: "string or double",
            found: other.type_name(),
        }),
    }
}

fn expect_list<'a>(
    value: &'a WireValue,
    field: &'static str,
    len: usize,
) -> Result<&'a [WireValue], ShapeError> {
    let items = value.as_list().ok_or(ShapeError::UnexpectedType {
        field,
        expected: "list",
        found: value.type_name(),
    })?;
    if items.len() != len {
        return Err(ShapeError::Length {
            field,
            expected: len,
            found: items.len(),
        });
    }
    Ok(items)
}

/// Decodes wire data into a [`MaskDocument`].
///
/// Accepts `list(values, list(names, descriptions, pol_fields))`. `values` and
/// `names` may be a double matrix (legacy marker for "no entries"). A bare
/// double in place of the whole list stands for a block saved before masks
/// existed and decodes to the default empty document.
///
/// The arrays may hold column or row vectors; the orientation is taken from
/// `descriptions` and applied to all three arrays.
///
/// # Errors
///
/// Returns [`ShapeError`] when the value does not have the shape above or when
/// `names`/`values` are shorter than the entry count implied by
/// `descriptions`.
///
/// # Examples
///
/// ```
/// use blockctx_core::mask::{self, MaskDocument, MaskEntry};
///
/// let doc = MaskDocument::new("Gains")
///     .with_entries(vec![MaskEntry::new("k", "1", "gain")]);
/// let decoded = mask::decode(&mask::encode(&doc)).unwrap();
/// assert_eq!(decoded, doc);
/// ```
pub fn decode(wire: &WireValue) -> Result<MaskDocument, ShapeError> {
    trace!(wire:?; "Decoding mask");

    if let WireValue::Double(_) = wire {
        return Ok(MaskDocument::default());
    }

    let outer = expect_list(wire, "exprs", 2)?;
    let values = strings_or_marker(&outer[0], "values")?;

    let inner = expect_list(&outer[1], "mask fields", 3)?;
    let names = strings_or_marker(&inner[0], "names")?;
    let descriptions = inner[1].as_strings().ok_or(ShapeError::UnexpectedType {
        field: "descriptions",
        expected: "string",
        found: inner[1].type_name(),
    })?;
    if inner[2].as_list().is_none() {
        return Err(ShapeError::UnexpectedType {
            field: "pol fields",
            expected: "list",
            found: inner[2].type_name(),
        });
    }

    let orientation = Orientation::of(descriptions);
    let title = orientation
        .cell(descriptions, 0)
        .ok_or(ShapeError::MissingTitle)?;

    let height = orientation.len(descriptions);
    let mut entries = Vec::with_capacity(height.saturating_sub(1));
    for i in 1..height {
        let index = i - 1;
        let name = names
            .and_then(|names| orientation.cell(names, index))
            .ok_or(ShapeError::MissingCell {
                field: "names",
                index,
            })?;
        let value = values
            .and_then(|values| orientation.cell(values, index))
            .ok_or(ShapeError::MissingCell {
                field: "values",
                index,
            })?;
        let description = orientation
            .cell(descriptions, i)
            .ok_or(ShapeError::MissingCell {
                field: "descriptions",
                index: i,
            })?;
        entries.push(MaskEntry::new(name, value, description));
    }

    Ok(MaskDocument::new(title).with_entries(entries))
}

/// Builds the wire form of a document without entries.
pub fn empty_wire(title: impl Into<String>) -> WireValue {
    WireValue::List(vec![
        WireValue::empty_double(),
        WireValue::List(vec![
            WireValue::empty_double(),
            WireValue::string(title),
            WireValue::List(vec![WireValue::empty_double()]),
        ]),
    ])
}

/// Encodes a [`MaskDocument`] into its wire form.
///
/// Entries are written as column vectors. A document without entries is
/// written as the legacy empty document carrying the title, so blocks that
/// predate masks keep round-tripping unchanged.
pub fn encode(doc: &MaskDocument) -> WireValue {
    if doc.is_empty() {
        return empty_wire(doc.title());
    }

    let entries = doc.entries();
    let values = StringMatrix::from_strings(entries.iter().map(MaskEntry::value));
    let names = StringMatrix::from_strings(entries.iter().map(MaskEntry::name));
    let descriptions = StringMatrix::from_strings(
        std::iter::once(doc.title()).chain(entries.iter().map(MaskEntry::description)),
    );

    let mut pol_fields = Vec::with_capacity(entries.len() * 2);
    for _ in entries {
        pol_fields.push(WireValue::string(POL_TAG));
        pol_fields.push(WireValue::Double(Matrix::scalar(AUTOMATIC_DIMENSION)));
    }

    WireValue::List(vec![
        WireValue::String(values),
        WireValue::List(vec![
            WireValue::String(names),
            WireValue::String(descriptions),
            WireValue::List(pol_fields),
        ]),
    ])
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn entry_strategy() -> impl Strategy<Value = MaskEntry> {
        ("[a-z][a-z0-9_]{0,8}", "[ -~]{0,12}", "[ -~]{0,16}")
            .prop_map(|(name, value, description)| MaskEntry::new(name, value, description))
    }

    fn document_strategy() -> impl Strategy<Value = MaskDocument> {
        ("[ -~]{0,24}", prop::collection::vec(entry_strategy(), 1..8))
            .prop_map(|(title, entries)| MaskDocument::new(title).with_entries(entries))
    }

    /// Transposes every string matrix of an encoded mask.
    fn transpose_wire(wire: &WireValue) -> WireValue {
        match wire {
            WireValue::String(matrix) => WireValue::String(matrix.transpose()),
            WireValue::List(items) => WireValue::List(items.iter().map(transpose_wire).collect()),
            other => other.clone(),
        }
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_round_trip(doc: MaskDocument) -> Result<(), TestCaseError> {
        let decoded = decode(&encode(&doc));
        prop_assert_eq!(decoded, Ok(doc));
        Ok(())
    }

    fn check_orientation_independence(doc: MaskDocument) -> Result<(), TestCaseError> {
        let column = encode(&doc);
        let row = transpose_wire(&column);
        prop_assert_ne!(&row, &column);
        prop_assert_eq!(decode(&row), decode(&column));
        Ok(())
    }

    fn check_empty_round_trip(title: String) -> Result<(), TestCaseError> {
        let decoded = decode(&encode(&MaskDocument::new(title.clone())))
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        prop_assert_eq!(decoded.title(), title.as_str());
        prop_assert!(decoded.is_empty());
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn round_trip(doc in document_strategy()) {
            check_round_trip(doc)?;
        }

        #[test]
        fn orientation_independence(doc in document_strategy()) {
            check_orientation_independence(doc)?;
        }

        #[test]
        fn empty_round_trip(title in "[ -~]{0,24}") {
            check_empty_round_trip(title)?;
        }
    }
}
