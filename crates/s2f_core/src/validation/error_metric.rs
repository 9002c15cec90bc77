use super::ValidationRecord;

/// Percentage deviation of the model mean from the reference mean, normalized
/// by the average of both standard deviations:
///
/// ```text
/// error = 100 * (mean_model - mean_ref) / (0.5 * (std_model + std_ref))
/// ```
///
/// Undefined (`None`) when any input is missing, when `std_model + std_ref`
/// is not strictly positive, or when the quotient is not finite.
pub fn relative_error(record: &ValidationRecord) -> Option<f64> {
    let mean_model = record.mean_model?;
    let std_model = record.std_model?;
    let mean_ref = record.mean_ref?;
    let std_ref = record.std_ref?;

    let spread = std_model + std_ref;
    if spread.is_nan() || spread <= 0.0 {
        return None;
    }

    let error = 100.0 * (mean_model - mean_ref) / (0.5 * spread);
    error.is_finite().then_some(error)
}

/// Fill the error column of every record.
pub fn annotate_errors(records: &mut [ValidationRecord]) {
    for record in records.iter_mut() {
        record.error = relative_error(record);
        if record.error.is_none() {
            tracing::debug!("No error defined for {}", record.key);
        }
    }
}
