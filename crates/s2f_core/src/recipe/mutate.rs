use super::{AdjustmentSpec, RecipeError, RecipeTree};
use crate::fit::ScaleFactor;

/// Rescale `spec.attribute_key` on every direct child of the root that carries
/// it: `new = clamp(scale * old, min_bound, max_bound)`.
///
/// Nodes without the attribute are not touched; nested elements are not
/// visited. Returns the number of nodes updated.
pub fn apply_scale(
    tree: &mut RecipeTree,
    spec: &AdjustmentSpec,
    scale: ScaleFactor,
) -> Result<usize, RecipeError> {
    let mut updated = 0;

    for index in 0..tree.len() {
        let Some(raw) = tree
            .node(index)
            .and_then(|node| node.attribute(&spec.attribute_key))
        else {
            continue;
        };

        let old_value = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RecipeError::InvalidValue {
                index,
                attribute: spec.attribute_key.clone(),
                value: raw.to_string(),
            })?;

        let new_value = spec.clamp(scale.value() * old_value);
        tree.set_attribute(index, &spec.attribute_key, format_value(new_value))?;
        updated += 1;
    }

    tracing::info!(
        "Scaled {} on {} of {} nodes by {:.6}",
        spec.attribute_key,
        updated,
        tree.len(),
        scale.value()
    );
    Ok(updated)
}

/// Shortest round-trip form that still reads as a float ("1.0", "0.75", "1e20").
fn format_value(value: f64) -> String {
    format!("{:?}", value)
}
