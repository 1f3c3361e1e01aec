//! Sliding windows over the visible rows of a column, see [crate::Table::rolling].

use std::ops::Range;

use crate::config::{RollingConfig, WindowPosition};
use crate::data_type::DataType;
use crate::error::{Result, TableError};
use crate::value::Value;

/// Rows of the window whose result lands on row `k`, `None` when it runs past either end.
pub(crate) fn window(k: usize, len: usize, config: &RollingConfig) -> Option<Range<usize>> {
    let size = config.window_size;
    let start = match config.position {
        WindowPosition::Start => Some(k),
        WindowPosition::Center => k.checked_sub(size / 2),
        WindowPosition::End => (k + 1).checked_sub(size),
    }?;
    let end = start + size;
    (end <= len).then_some(start..end)
}

/// Runs `f` over the window of every row, the pad value where the window does not fit.
pub(crate) fn roll<T>(
    values: &[T],
    config: &RollingConfig,
    f: impl Fn(&[T]) -> Value,
) -> Vec<Value> {
    (0..values.len())
        .map(|k| match window(k, values.len(), config) {
            Some(range) => f(&values[range]),
            None => config.pad_value.clone(),
        })
        .collect()
}

/// Fails when padding is needed and the pad value cannot be stored in `output`.
pub(crate) fn check_pad(config: &RollingConfig, output: DataType) -> Result<()> {
    if config.window_size == 1 {
        return Ok(());
    }
    let fits = match (&config.pad_value, output) {
        (Value::Null, DataType::Float | DataType::String) => true,
        (Value::Int(_), DataType::Int | DataType::Float) => true,
        (Value::Float(_), DataType::Float) => true,
        (Value::Bool(_), DataType::Bool) => true,
        (Value::Text(_), DataType::String) => true,
        _ => false,
    };
    if !fits {
        return Err(TableError::InvalidRolling(format!(
            "pad value {} cannot be stored in a {output} column",
            config.pad_value
        )));
    }
    Ok(())
}
