//! Whitespace-delimited statistics tables
//!
//! Both the biological reference files and the `--short` output of the
//! statistics tool share this layout:
//!
//! ```text
//! mtype      mean    std
//! L23_PC     0.21    0.03
//! L5_TTPC    0.18    0.02
//! ```
//!
//! The first non-blank line is the header. Column names are trimmed and fields
//! are split on runs of whitespace. Only the key columns, `mean` and `std` are
//! read; other columns are ignored.

use std::fs;
use std::path::Path;

use super::{Key, KeyLayout, StatPoint, StatSet, StatsError};

const MEAN_COLUMN: &str = "mean";
const STD_COLUMN: &str = "std";

/// Parse a statistics table held in memory.
pub fn parse_stat_table(text: &str, layout: &KeyLayout) -> Result<StatSet, StatsError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(StatsError::EmptyTable)?;
    let header: Vec<&str> = header_line.split_whitespace().map(str::trim).collect();

    let column_index = |name: &str| -> Result<usize, StatsError> {
        header
            .iter()
            .position(|col| *col == name)
            .ok_or_else(|| StatsError::MissingColumn {
                column: name.to_string(),
            })
    };

    let key_columns = match layout {
        KeyLayout::Single { column } => KeyColumns::Single(column_index(column.as_str())?),
        KeyLayout::Pair { from, to } => {
            KeyColumns::Pair(column_index(from.as_str())?, column_index(to.as_str())?)
        }
    };
    let mean_idx = column_index(MEAN_COLUMN)?;
    let std_idx = column_index(STD_COLUMN)?;
    let required = key_columns.max_index().max(mean_idx).max(std_idx) + 1;

    let mut set = StatSet::new(layout.clone());
    for (line_no, line) in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < required {
            return Err(StatsError::ShortRow {
                line: line_no,
                expected: required,
                found: fields.len(),
            });
        }

        let key = match key_columns {
            KeyColumns::Single(idx) => Key::single(fields[idx]),
            KeyColumns::Pair(from, to) => Key::pair(fields[from], fields[to]),
        };
        let mean = parse_number(fields[mean_idx], MEAN_COLUMN, line_no)?;
        let std = parse_number(fields[std_idx], STD_COLUMN, line_no)?;
        set.insert(StatPoint::new(key, mean, std))?;
    }

    tracing::debug!("Parsed {} statistics rows", set.len());
    Ok(set)
}

/// Read and parse a statistics table from disk.
pub fn read_stat_table(path: &Path, layout: &KeyLayout) -> Result<StatSet, StatsError> {
    let text = fs::read_to_string(path).map_err(|source| StatsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_stat_table(&text, layout)
}

/// Header positions of the key columns
#[derive(Clone, Copy)]
enum KeyColumns {
    Single(usize),
    Pair(usize, usize),
}

impl KeyColumns {
    fn max_index(self) -> usize {
        match self {
            KeyColumns::Single(idx) => idx,
            KeyColumns::Pair(from, to) => from.max(to),
        }
    }
}

fn parse_number(raw: &str, column: &str, line: usize) -> Result<f64, StatsError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| StatsError::InvalidNumber {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        })
}
