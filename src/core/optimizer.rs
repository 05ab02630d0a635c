//! Column re-encoding to shrink merge results in memory
//!
//! A text column is converted only when the new encoding renders every cell
//! back to exactly the original text, so optimisation never changes what is
//! written out.

use crate::core::frame::{Codes, Column, ColumnKind, FloatValues, Frame, IntValues};
use crate::core::merger::{MemoryFootprint, MergeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub enabled: bool,
    /// Distinct/total ratio below which a text column becomes categorical.
    pub categorical_threshold: f64,
    /// Frames shorter than this are left untouched.
    pub min_rows: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            categorical_threshold: 0.5,
            min_rows: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnChange {
    pub name: String,
    pub from: ColumnKind,
    pub to: ColumnKind,
}

#[derive(Debug, Clone)]
pub struct TypeOptimizer {
    settings: OptimizerSettings,
}

impl Default for TypeOptimizer {
    fn default() -> Self {
        Self::new(OptimizerSettings::default())
    }
}

impl TypeOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    /// Re-encode the result's columns and record the memory estimate.
    pub fn optimize(&self, mut result: MergeResult) -> MergeResult {
        let bytes_before = result.frame.estimated_bytes();
        let (frame, changes) = self.optimize_frame(result.frame);
        let bytes_after = frame.estimated_bytes();

        debug!(
            database = %result.database,
            converted = changes.len(),
            bytes_before,
            bytes_after,
            "optimized column types"
        );

        result.frame = frame;
        result.memory = Some(MemoryFootprint {
            bytes_before,
            bytes_after,
        });
        result
    }

    pub fn optimize_frame(&self, frame: Frame) -> (Frame, Vec<ColumnChange>) {
        if !self.settings.enabled || frame.height() < self.settings.min_rows {
            return (frame, Vec::new());
        }

        let mut changes = Vec::new();
        let frame = frame.map_columns(|name, column| {
            let from = column.kind();
            let optimized = self.optimize_column(column);
            if optimized.kind() != from {
                changes.push(ColumnChange {
                    name: name.to_string(),
                    from,
                    to: optimized.kind(),
                });
            }
            optimized
        });
        (frame, changes)
    }

    /// Best effort: any candidate that fails to convert, or is not smaller,
    /// leaves the column as it was.
    fn optimize_column(&self, column: Column) -> Column {
        let values = match column {
            Column::Text(values) => values,
            other => return other,
        };

        let candidate = to_integer(&values)
            .or_else(|| to_float(&values))
            .or_else(|| to_categorical(&values, self.settings.categorical_threshold));

        let original = Column::Text(values);
        match candidate {
            Some(c) if c.estimated_bytes() < original.estimated_bytes() => c,
            _ => original,
        }
    }
}

fn has_value(values: &[String]) -> bool {
    values.iter().any(|v| !v.is_empty())
}

fn to_integer(values: &[String]) -> Option<Column> {
    if !has_value(values) {
        return None;
    }

    let mut parsed = Vec::with_capacity(values.len());
    let (mut min, mut max) = (i64::MAX, i64::MIN);
    for raw in values {
        if raw.is_empty() {
            parsed.push(None);
            continue;
        }
        let value: i64 = raw.parse().ok()?;
        if value.to_string() != *raw {
            return None;
        }
        min = min.min(value);
        max = max.max(value);
        parsed.push(Some(value));
    }

    let fits = |lo: i64, hi: i64| min >= lo && max <= hi;
    let values = if fits(i8::MIN.into(), i8::MAX.into()) {
        IntValues::I8(parsed.into_iter().map(|v| v.map(|x| x as i8)).collect())
    } else if fits(i16::MIN.into(), i16::MAX.into()) {
        IntValues::I16(parsed.into_iter().map(|v| v.map(|x| x as i16)).collect())
    } else if fits(i32::MIN.into(), i32::MAX.into()) {
        IntValues::I32(parsed.into_iter().map(|v| v.map(|x| x as i32)).collect())
    } else {
        IntValues::I64(parsed)
    };
    Some(Column::Integer(values))
}

fn to_float(values: &[String]) -> Option<Column> {
    if !has_value(values) {
        return None;
    }

    let mut parsed = Vec::with_capacity(values.len());
    let mut narrow = true;
    for raw in values {
        if raw.is_empty() {
            parsed.push(None);
            continue;
        }
        let value: f64 = raw.parse().ok()?;
        if value.to_string() != *raw {
            return None;
        }
        if narrow {
            let single = value as f32;
            narrow = f64::from(single) == value && single.to_string() == *raw;
        }
        parsed.push(Some(value));
    }

    let values = if narrow {
        FloatValues::F32(parsed.into_iter().map(|v| v.map(|x| x as f32)).collect())
    } else {
        FloatValues::F64(parsed)
    };
    Some(Column::Float(values))
}

fn to_categorical(values: &[String], threshold: f64) -> Option<Column> {
    if values.is_empty() {
        return None;
    }

    let mut dictionary: Vec<String> = Vec::new();
    let mut lookup: HashMap<&str, usize> = HashMap::new();
    let mut indices = Vec::with_capacity(values.len());
    for value in values {
        let code = match lookup.get(value.as_str()) {
            Some(&code) => code,
            None => {
                let code = dictionary.len();
                dictionary.push(value.clone());
                lookup.insert(value.as_str(), code);
                code
            }
        };
        indices.push(code);
    }

    let ratio = dictionary.len() as f64 / values.len() as f64;
    if ratio >= threshold {
        return None;
    }

    let codes = Codes::from_indices(indices, dictionary.len())?;
    Some(Column::Categorical { dictionary, codes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frame::FrameBuilder;

    fn text(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_integer_narrowing() {
        let column = to_integer(&text(&["1", "-5", "", "120"])).unwrap();
        assert_eq!(column.kind(), ColumnKind::Int8);
        assert_eq!(column.to_text(), text(&["1", "-5", "", "120"]));

        let wide = to_integer(&text(&["1", "70000"])).unwrap();
        assert_eq!(wide.kind(), ColumnKind::Int32);
    }

    #[test]
    fn test_integer_rejects_non_canonical_text() {
        assert!(to_integer(&text(&["007", "1"])).is_none());
        assert!(to_integer(&text(&["+1"])).is_none());
        assert!(to_integer(&text(&["", ""])).is_none());
    }

    #[test]
    fn test_float_selection() {
        let narrow = to_float(&text(&["0.5", "1.25"])).unwrap();
        assert_eq!(narrow.kind(), ColumnKind::Float32);

        let wide = to_float(&text(&["0.1", "0.2"])).unwrap();
        assert_eq!(wide.kind(), ColumnKind::Float64);
        assert_eq!(wide.to_text(), text(&["0.1", "0.2"]));

        assert!(to_float(&text(&["1.50"])).is_none());
        assert!(to_float(&text(&["abc"])).is_none());
    }

    #[test]
    fn test_categorical_threshold() {
        let values = text(&["a", "b", "a", "a", "b", "a"]);
        let column = to_categorical(&values, 0.5).unwrap();
        assert_eq!(column.kind(), ColumnKind::Categorical);
        assert_eq!(column.to_text(), values);

        assert!(to_categorical(&text(&["a", "b", "c"]), 0.5).is_none());
    }

    #[test]
    fn test_optimize_frame_is_transparent() {
        let names = text(&["sample", "ko", "score", "label"]);
        let mut builder = FrameBuilder::new(names);
        for i in 0..20 {
            let score = format!("{}", i % 3);
            let label = if i % 2 == 0 { "Safe" } else { "Toxic" };
            builder.push_row(["S1", "K00031", score.as_str(), label]);
        }
        let frame = builder.finish();

        let (optimized, changes) = TypeOptimizer::default().optimize_frame(frame.clone());
        assert!(optimized.same_values(&frame));
        assert!(optimized.estimated_bytes() < frame.estimated_bytes());
        assert!(changes
            .iter()
            .any(|c| c.name == "score" && c.to == ColumnKind::Int8));
        assert_eq!(
            optimized.column("label").unwrap().kind(),
            ColumnKind::Categorical
        );
    }

    #[test]
    fn test_disabled_optimizer_leaves_frame() {
        let mut builder = FrameBuilder::new(text(&["a"]));
        builder.push_row(["1"]);
        builder.push_row(["1"]);
        let frame = builder.finish();
        let settings = OptimizerSettings {
            enabled: false,
            ..OptimizerSettings::default()
        };
        let (optimized, changes) = TypeOptimizer::new(settings).optimize_frame(frame);
        assert!(changes.is_empty());
        assert_eq!(optimized.column("a").unwrap().kind(), ColumnKind::Text);
    }
}
