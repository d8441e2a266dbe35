//! Tables used by the crosswalk engine.
//!
//! A [`Frame`] wraps a Polars DataFrame whose column names are lowercased.
//! Source frames hold typed columns (`Int64`, `Float64` or `String`, see
//! [`ColumnKind`]); target frames hold nullable `String` columns, since the
//! migrated table is written out as text. Rules are applied as whole-column
//! boolean masks.

use polars::prelude::*;
use uds_common::{any_to_string, format_numeric, is_missing_token, parse_f64, parse_i64};

use crate::error::{Result, TransformError};

/// Value type of a source column, derived from its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Text,
}

/// A DataFrame of lowercased columns with a fixed row count.
#[derive(Debug, Clone)]
pub struct Frame {
    data: DataFrame,
    height: usize,
}

impl Frame {
    /// An empty frame whose columns will hold `height` rows.
    pub fn new(height: usize) -> Self {
        Self {
            data: DataFrame::empty(),
            height,
        }
    }

    /// Build a frame from columns of equal length.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let height = columns.first().map_or(0, Column::len);
        if let Some(column) = columns.iter().find(|column| column.len() != height) {
            return Err(TransformError::Shape {
                column: column.name().to_string(),
                expected: height,
                actual: column.len(),
            });
        }
        Ok(Self {
            data: DataFrame::new(columns)?,
            height,
        })
    }

    /// Build a frame from raw text, typing each column the way source tables
    /// are typed: missing tokens become null, all-integer columns become
    /// integers and all-numeric columns become floats.
    pub fn from_text_columns(columns: Vec<(&str, Vec<Option<&str>>)>) -> Result<Self> {
        let typed = columns
            .into_iter()
            .map(|(name, values)| {
                let values: StringChunked = values.into_iter().collect();
                type_column(&name.trim().to_lowercase(), &values)
            })
            .collect();
        Self::from_columns(typed)
    }

    /// Type a Polars DataFrame for the engine, casting every column through
    /// text first.
    pub fn from_data_frame(df: &DataFrame) -> Result<Self> {
        let mut columns = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let name = column.name().trim().to_lowercase();
            let strings = column.cast(&DataType::String)?;
            columns.push(type_column(&name, strings.str()?));
        }
        let mut frame = Self::from_columns(columns)?;
        frame.height = df.height();
        Ok(frame)
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn into_data_frame(self) -> DataFrame {
        self.data
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.data
            .get_columns()
            .iter()
            .map(|column| column.name().as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data.get_column_index(name).is_some()
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        let column = self.data.column(name).ok()?;
        Some(match column.dtype() {
            DataType::Int64 => ColumnKind::Int,
            DataType::Float64 => ColumnKind::Float,
            _ => ColumnKind::Text,
        })
    }

    /// The column rendered as text. Floats drop trailing zeros.
    pub fn text(&self, name: &str) -> Option<StringChunked> {
        let column = self.data.column(name).ok()?;
        render(column).ok()
    }

    /// The column read as numbers; unparseable text becomes null.
    pub fn numbers(&self, name: &str) -> Option<Float64Chunked> {
        let column = self.data.column(name).ok()?;
        match column.dtype() {
            DataType::String => Some(
                column
                    .str()
                    .ok()?
                    .into_iter()
                    .map(|value| value.and_then(parse_f64))
                    .collect(),
            ),
            _ => column.cast(&DataType::Float64).ok()?.f64().ok().cloned(),
        }
    }

    /// True where the column is null, or on every row when it is absent.
    pub fn null_mask(&self, name: &str) -> BooleanChunked {
        match self.data.column(name) {
            Ok(column) => column.is_null(),
            Err(_) => BooleanChunked::full(name.into(), true, self.height),
        }
    }

    /// Replace or append a whole text column.
    pub fn set_column(&mut self, name: &str, values: StringChunked) -> Result<()> {
        self.data
            .with_column(values.with_name(name.into()).into_column())?;
        Ok(())
    }

    /// Replace or append a column, typing the text the way source columns are.
    pub fn set_typed(&mut self, name: &str, values: &StringChunked) -> Result<()> {
        self.data.with_column(type_column(name, values))?;
        Ok(())
    }

    /// Append an all-null text column unless one exists.
    pub fn ensure_column(&mut self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Ok(());
        }
        self.set_column(name, StringChunked::full_null(name.into(), self.height))
    }

    /// Fill null cells from `values`; a missing column is created from them.
    pub fn fill_nulls(&mut self, name: &str, values: StringChunked) -> Result<()> {
        let merged = match self.text(name) {
            Some(existing) => existing.zip_with(&existing.is_not_null(), &values)?,
            None => values,
        };
        self.set_column(name, merged)
    }

    /// Write `values` on rows where `mask` holds, keeping the other cells.
    ///
    /// The column is created all-null when absent.
    pub fn overwrite(
        &mut self,
        name: &str,
        mask: &BooleanChunked,
        values: &StringChunked,
    ) -> Result<()> {
        let current = self
            .text(name)
            .unwrap_or_else(|| StringChunked::full_null(name.into(), self.height));
        let merged = values.zip_with(mask, &current)?;
        self.set_column(name, merged)
    }

    /// Write one value (or null) on rows where `mask` holds.
    pub fn assign(&mut self, name: &str, mask: &BooleanChunked, value: Option<&str>) -> Result<()> {
        let values = match value {
            Some(value) => StringChunked::full(name.into(), value, self.height),
            None => StringChunked::full_null(name.into(), self.height),
        };
        self.overwrite(name, mask, &values)
    }

    /// Keep only the named columns, in the given order.
    pub fn select(self, names: &[String]) -> Result<Self> {
        let mut kept: Vec<&str> = Vec::with_capacity(names.len());
        for name in names {
            if self.contains(name) && !kept.contains(&name.as_str()) {
                kept.push(name);
            }
        }
        Ok(Self {
            data: self.data.select(kept)?,
            height: self.height,
        })
    }

    /// Render a numeric column as zero-padded integers.
    ///
    /// Nulls become the text `NA`; non-numeric text is left unchanged.
    /// Returns false when the column does not exist.
    pub fn zero_pad(&mut self, name: &str, width: usize) -> Result<bool> {
        let Some(values) = self.text(name) else {
            return Ok(false);
        };
        let padded: StringChunked = values
            .into_iter()
            .map(|value| match value {
                None => Some("NA".to_string()),
                Some(text) => Some(
                    parse_f64(text).map_or_else(|| text.to_string(), |v| format!("{v:0width$.0}")),
                ),
            })
            .collect();
        self.set_column(name, padded)?;
        Ok(true)
    }
}

/// Mask of cells whose text equals `expected`; nulls never match.
pub fn text_matches(values: &StringChunked, expected: &str) -> BooleanChunked {
    values
        .into_iter()
        .map(|value| value == Some(expected))
        .collect()
}

/// Mask of null cells and cells reading `NA` in any case.
pub fn missing_or_na(values: &StringChunked) -> BooleanChunked {
    values
        .into_iter()
        .map(|value| value.is_none_or(|text| text.eq_ignore_ascii_case("NA")))
        .collect()
}

/// Numeric coercion of rule text; unparseable text becomes `None`.
///
/// # Examples
///
/// ```
/// use uds_transform::numeric_text;
///
/// assert_eq!(numeric_text(" 2 ").as_deref(), Some("2"));
/// assert_eq!(numeric_text("2.50").as_deref(), Some("2.5"));
/// assert_eq!(numeric_text("yes"), None);
/// ```
pub fn numeric_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    match parse_i64(trimmed) {
        Some(int) => Some(int.to_string()),
        None => parse_f64(trimmed).map(format_numeric),
    }
}

fn render(column: &Column) -> PolarsResult<StringChunked> {
    let rendered: StringChunked = match column.dtype() {
        DataType::String => column.str()?.clone(),
        _ => column
            .as_materialized_series()
            .iter()
            .map(|value| (!value.is_null()).then(|| any_to_string(value)))
            .collect(),
    };
    Ok(rendered.with_name(column.name().clone()))
}

fn type_column(name: &str, values: &StringChunked) -> Column {
    let present: StringChunked = values
        .into_iter()
        .map(|value| value.filter(|text| !is_missing_token(text)))
        .collect();

    let numbers: Option<Float64Chunked> = present
        .into_iter()
        .map(|value| match value {
            None => Some(None),
            Some(text) => parse_f64(text).map(Some),
        })
        .collect();

    match numbers {
        Some(numbers) if numbers.into_iter().flatten().all(is_integral) => {
            let ints: Int64Chunked = numbers
                .into_iter()
                .map(|value| value.map(|v| v as i64))
                .collect();
            ints.with_name(name.into()).into_column()
        }
        Some(numbers) => numbers.with_name(name.into()).into_column(),
        None => present.with_name(name.into()).into_column(),
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0 && value.abs() < 9.0e15
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(frame: &Frame, name: &str) -> Vec<Option<String>> {
        frame
            .text(name)
            .map(|values| {
                values
                    .into_iter()
                    .map(|value| value.map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn some(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|value| Some((*value).to_string())).collect()
    }

    #[test]
    fn text_columns_are_typed() {
        let frame = Frame::from_text_columns(vec![
            ("ID", vec![Some("P1"), Some("P2"), Some("P3")]),
            ("age", vec![Some("70"), Some("NA"), Some("81.0")]),
            ("score", vec![Some("1.5"), None, Some("2")]),
        ])
        .expect("frame");

        assert_eq!(frame.kind("id"), Some(ColumnKind::Text));
        assert_eq!(frame.kind("age"), Some(ColumnKind::Int));
        assert_eq!(
            strings(&frame, "age"),
            vec![Some("70".to_string()), None, Some("81".to_string())]
        );
        assert_eq!(frame.kind("score"), Some(ColumnKind::Float));
        assert_eq!(strings(&frame, "score")[2].as_deref(), Some("2"));
        assert_eq!(frame.numbers("score").and_then(|v| v.get(0)), Some(1.5));
    }

    #[test]
    fn zero_pad_formats_numbers_and_nulls() {
        let mut frame =
            Frame::from_text_columns(vec![("momprdx", vec![Some("1"), None, Some("410")])])
                .expect("frame");
        assert!(frame.zero_pad("momprdx", 3).expect("pad"));
        assert_eq!(strings(&frame, "momprdx"), some(&["001", "NA", "410"]));
        assert_eq!(frame.kind("momprdx"), Some(ColumnKind::Text));
        assert!(!frame.zero_pad("dadprdx", 3).expect("pad"));
    }

    #[test]
    fn mismatched_heights_are_rejected() {
        let err = Frame::from_columns(vec![
            Column::new("a".into(), [Some("x")]),
            Column::new("b".into(), Vec::<Option<&str>>::new()),
        ])
        .expect_err("shape error");
        assert!(matches!(err, TransformError::Shape { .. }));
    }

    #[test]
    fn select_projects_and_reorders() {
        let frame = Frame::from_text_columns(vec![("a", vec![Some("1")]), ("b", vec![Some("2")])])
            .expect("frame")
            .select(&["b".to_string(), "missing".to_string(), "a".to_string()])
            .expect("select");
        let names: Vec<&str> = frame.column_names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(frame.height(), 1);
    }

    #[test]
    fn assignments_keep_unmasked_cells() {
        let mut frame = Frame::new(3);
        let mask: BooleanChunked = [true, false, true].into_iter().collect();
        frame.assign("t", &mask, Some("x")).expect("assign");
        assert_eq!(
            strings(&frame, "t"),
            vec![Some("x".to_string()), None, Some("x".to_string())]
        );

        let fill: StringChunked = [Some("a"), Some("b"), None].into_iter().collect();
        frame.fill_nulls("t", fill).expect("fill");
        assert_eq!(strings(&frame, "t"), some(&["x", "b", "x"]));
        assert!(!frame.null_mask("t").any());
        assert!(frame.null_mask("absent").all());
    }

    #[test]
    fn masks_over_text() {
        let values: StringChunked = [Some("1"), None, Some("na"), Some("2")]
            .into_iter()
            .collect();
        let hits: Vec<Option<bool>> = text_matches(&values, "1").into_iter().collect();
        assert_eq!(hits, vec![Some(true), Some(false), Some(false), Some(false)]);
        let missing: Vec<Option<bool>> = missing_or_na(&values).into_iter().collect();
        assert_eq!(missing, vec![Some(false), Some(true), Some(true), Some(false)]);
    }

    #[test]
    fn typed_columns_come_from_polars() {
        let df = DataFrame::new(vec![Column::new(
            "X ".into(),
            [Some("1"), None, Some("NA")],
        )])
        .expect("df");
        let frame = Frame::from_data_frame(&df).expect("from polars");
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.kind("x"), Some(ColumnKind::Int));
        let nulls: Vec<Option<bool>> = frame.null_mask("x").into_iter().collect();
        assert_eq!(nulls, vec![Some(false), Some(true), Some(true)]);
    }
}
