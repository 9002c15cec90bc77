//! Model vs. reference comparison
//!
//! - [`align`]: outer join of two StatSets on key
//! - [`error_metric`]: pooled-std percentage deviation per record
//! - [`table`]: validation CSV written by the validate tools and read back by
//!   the recipe adjustment

pub mod align;
pub mod error_metric;
pub mod table;

use crate::stats::{Key, StatSet};

pub use align::align;
pub use error_metric::{annotate_errors, relative_error};
pub use table::{read_validation_table, write_validation_table, TableError};

/// One aligned row of the validation table.
///
/// `None` marks a value that is missing, either because the key was absent
/// from one source or because the error is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRecord {
    pub key: Key,
    pub mean_model: Option<f64>,
    pub std_model: Option<f64>,
    pub mean_ref: Option<f64>,
    pub std_ref: Option<f64>,
    pub error: Option<f64>,
}

impl ValidationRecord {
    /// `(mean_model, mean_ref)` when this record takes part in fitting.
    pub fn fit_pair(&self) -> Option<(f64, f64)> {
        self.error?;
        Some((self.mean_model?, self.mean_ref?))
    }
}

/// Align both sources and compute the error column.
pub fn compare(model: &StatSet, reference: &StatSet) -> Vec<ValidationRecord> {
    let mut records = align(model, reference);
    annotate_errors(&mut records);
    records
}

/// Records usable for fitting
pub fn fit_pairs(records: &[ValidationRecord]) -> Vec<(f64, f64)> {
    records.iter().filter_map(ValidationRecord::fit_pair).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{KeyLayout, StatPoint};

    #[test]
    fn test_compare_excludes_unpaired_keys_from_fit() {
        let model = StatSet::from_points(
            KeyLayout::mtype(),
            vec![
                StatPoint::new(Key::single("A"), 1.0, 0.1),
                StatPoint::new(Key::single("B"), 2.0, 0.1),
            ],
        )
        .unwrap();
        let reference = StatSet::from_points(
            KeyLayout::mtype(),
            vec![
                StatPoint::new(Key::single("B"), 4.0, 0.3),
                StatPoint::new(Key::single("C"), 5.0, 0.2),
            ],
        )
        .unwrap();

        let records = compare(&model, &reference);
        assert_eq!(records.len(), 3);
        assert_eq!(fit_pairs(&records), vec![(2.0, 4.0)]);
    }
}
