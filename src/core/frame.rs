//! Columnar table used for merge results
//!
//! Every column is logically a sequence of strings. The physical encoding
//! may differ (dictionary codes, narrow integers, floats) but `Column::get`
//! always yields the same text the column was built from.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::mem::size_of;

/// Dictionary codes, narrowed to the smallest width that fits the dictionary.
#[derive(Debug, Clone, PartialEq)]
pub enum Codes {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Codes {
    pub fn from_indices(indices: Vec<usize>, dictionary_len: usize) -> Option<Self> {
        if dictionary_len <= u8::MAX as usize + 1 {
            Some(Codes::U8(indices.into_iter().map(|i| i as u8).collect()))
        } else if dictionary_len <= u16::MAX as usize + 1 {
            Some(Codes::U16(indices.into_iter().map(|i| i as u16).collect()))
        } else if dictionary_len <= u32::MAX as usize {
            Some(Codes::U32(indices.into_iter().map(|i| i as u32).collect()))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Codes::U8(v) => v.len(),
            Codes::U16(v) => v.len(),
            Codes::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: usize) -> usize {
        match self {
            Codes::U8(v) => v[row] as usize,
            Codes::U16(v) => v[row] as usize,
            Codes::U32(v) => v[row] as usize,
        }
    }

    fn estimated_bytes(&self) -> usize {
        match self {
            Codes::U8(v) => v.len(),
            Codes::U16(v) => v.len() * 2,
            Codes::U32(v) => v.len() * 4,
        }
    }
}

/// Integer storage. `None` is an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub enum IntValues {
    I8(Vec<Option<i8>>),
    I16(Vec<Option<i16>>),
    I32(Vec<Option<i32>>),
    I64(Vec<Option<i64>>),
}

impl IntValues {
    fn len(&self) -> usize {
        match self {
            IntValues::I8(v) => v.len(),
            IntValues::I16(v) => v.len(),
            IntValues::I32(v) => v.len(),
            IntValues::I64(v) => v.len(),
        }
    }

    fn get(&self, row: usize) -> Option<i64> {
        match self {
            IntValues::I8(v) => v[row].map(i64::from),
            IntValues::I16(v) => v[row].map(i64::from),
            IntValues::I32(v) => v[row].map(i64::from),
            IntValues::I64(v) => v[row],
        }
    }

    fn estimated_bytes(&self) -> usize {
        match self {
            IntValues::I8(v) => v.len() * size_of::<Option<i8>>(),
            IntValues::I16(v) => v.len() * size_of::<Option<i16>>(),
            IntValues::I32(v) => v.len() * size_of::<Option<i32>>(),
            IntValues::I64(v) => v.len() * size_of::<Option<i64>>(),
        }
    }
}

/// Float storage. `None` is an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FloatValues {
    F32(Vec<Option<f32>>),
    F64(Vec<Option<f64>>),
}

impl FloatValues {
    fn len(&self) -> usize {
        match self {
            FloatValues::F32(v) => v.len(),
            FloatValues::F64(v) => v.len(),
        }
    }

    fn render(&self, row: usize) -> Option<String> {
        match self {
            FloatValues::F32(v) => v[row].map(|x| x.to_string()),
            FloatValues::F64(v) => v[row].map(|x| x.to_string()),
        }
    }

    fn estimated_bytes(&self) -> usize {
        match self {
            FloatValues::F32(v) => v.len() * size_of::<Option<f32>>(),
            FloatValues::F64(v) => v.len() * size_of::<Option<f64>>(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Categorical,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Categorical { dictionary: Vec<String>, codes: Codes },
    Integer(IntValues),
    Float(FloatValues),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Categorical { codes, .. } => codes.len(),
            Column::Integer(v) => v.len(),
            Column::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical value of a cell.
    pub fn get(&self, row: usize) -> Cow<'_, str> {
        match self {
            Column::Text(v) => Cow::Borrowed(v[row].as_str()),
            Column::Categorical { dictionary, codes } => {
                Cow::Borrowed(dictionary[codes.get(row)].as_str())
            }
            Column::Integer(v) => match v.get(row) {
                Some(x) => Cow::Owned(x.to_string()),
                None => Cow::Borrowed(""),
            },
            Column::Float(v) => match v.render(row) {
                Some(s) => Cow::Owned(s),
                None => Cow::Borrowed(""),
            },
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Text(_) => ColumnKind::Text,
            Column::Categorical { .. } => ColumnKind::Categorical,
            Column::Integer(IntValues::I8(_)) => ColumnKind::Int8,
            Column::Integer(IntValues::I16(_)) => ColumnKind::Int16,
            Column::Integer(IntValues::I32(_)) => ColumnKind::Int32,
            Column::Integer(IntValues::I64(_)) => ColumnKind::Int64,
            Column::Float(FloatValues::F32(_)) => ColumnKind::Float32,
            Column::Float(FloatValues::F64(_)) => ColumnKind::Float64,
        }
    }

    /// Approximate heap plus inline size of the column.
    pub fn estimated_bytes(&self) -> usize {
        fn strings(values: &[String]) -> usize {
            values.iter().map(|s| size_of::<String>() + s.capacity()).sum()
        }
        match self {
            Column::Text(v) => strings(v),
            Column::Categorical { dictionary, codes } => {
                strings(dictionary) + codes.estimated_bytes()
            }
            Column::Integer(v) => v.estimated_bytes(),
            Column::Float(v) => v.estimated_bytes(),
        }
    }

    /// Copy out the logical values as plain text.
    pub fn to_text(&self) -> Vec<String> {
        (0..self.len()).map(|row| self.get(row).into_owned()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
    height: usize,
}

impl Frame {
    /// Build from named columns. Returns `None` when lengths disagree.
    pub fn from_columns(names: Vec<String>, columns: Vec<Column>) -> Option<Self> {
        if names.len() != columns.len() {
            return None;
        }
        let height = columns.first().map(Column::len).unwrap_or(0);
        if columns.iter().any(|c| c.len() != height) {
            return None;
        }
        Some(Self {
            names,
            columns,
            height,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
    }

    pub fn cell(&self, row: usize, column: usize) -> Cow<'_, str> {
        self.columns[column].get(row)
    }

    pub fn row(&self, row: usize) -> Vec<Cow<'_, str>> {
        self.columns.iter().map(|c| c.get(row)).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Cow<'_, str>>> + '_ {
        (0..self.height).map(move |row| self.row(row))
    }

    pub fn estimated_bytes(&self) -> usize {
        self.columns.iter().map(Column::estimated_bytes).sum()
    }

    /// Row-by-row, column-by-column equality of logical values.
    pub fn same_values(&self, other: &Frame) -> bool {
        self.names == other.names
            && self.height == other.height
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| (0..self.height).all(|row| a.get(row) == b.get(row)))
    }

    /// Replace every column, keeping names. Lengths must match the frame height.
    pub(crate) fn map_columns<F>(self, mut f: F) -> Self
    where
        F: FnMut(&str, Column) -> Column,
    {
        let height = self.height;
        let columns = self
            .names
            .iter()
            .zip(self.columns)
            .map(|(name, column)| {
                let original_len = column.len();
                let mapped = f(name, column);
                debug_assert_eq!(mapped.len(), original_len);
                mapped
            })
            .collect();
        Self {
            names: self.names,
            columns,
            height,
        }
    }

    /// Stack frames with differing schemas, prefixing a tag column.
    /// Columns are the ordered union of all inputs; absent cells are empty.
    pub fn concat_tagged<'a, I>(tag_column: &str, parts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Frame)>,
    {
        let parts: Vec<(&str, &Frame)> = parts.into_iter().collect();

        let mut names = vec![tag_column.to_string()];
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (_, frame) in &parts {
            for name in frame.names() {
                if !positions.contains_key(name) && name != tag_column {
                    positions.insert(name.clone(), names.len());
                    names.push(name.clone());
                }
            }
        }

        let mut builder = FrameBuilder::new(names.clone());
        let mut row_buf = vec![String::new(); names.len()];
        for (tag, frame) in &parts {
            let targets: Vec<Option<usize>> = frame
                .names()
                .iter()
                .map(|n| positions.get(n).copied())
                .collect();
            for row in 0..frame.height() {
                row_buf.iter_mut().for_each(String::clear);
                row_buf[0].push_str(tag);
                for (col, target) in targets.iter().enumerate() {
                    if let Some(target) = target {
                        row_buf[*target].push_str(&frame.cell(row, col));
                    }
                }
                builder.push_row(row_buf.iter().map(String::as_str));
            }
        }
        builder.finish()
    }
}

/// Row-wise builder producing a frame of text columns.
pub struct FrameBuilder {
    names: Vec<String>,
    columns: Vec<Vec<String>>,
}

impl FrameBuilder {
    pub fn new(names: Vec<String>) -> Self {
        let columns = names.iter().map(|_| Vec::new()).collect();
        Self { names, columns }
    }

    pub fn with_capacity(names: Vec<String>, rows: usize) -> Self {
        let columns = names.iter().map(|_| Vec::with_capacity(rows)).collect();
        Self { names, columns }
    }

    /// Append a row. Missing trailing cells are filled with empty strings,
    /// surplus cells are ignored.
    pub fn push_row<'a, I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cells = cells.into_iter();
        for column in &mut self.columns {
            column.push(cells.next().unwrap_or("").to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.columns.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn finish(self) -> Frame {
        let height = self.len();
        Frame {
            names: self.names,
            columns: self.columns.into_iter().map(Column::Text).collect(),
            height,
        }
    }
}
