use std::collections::BTreeSet;

use super::ValidationRecord;
use crate::stats::StatSet;

/// Outer-join model and reference statistics on key.
///
/// Produces exactly one record per key in the union of both sets, in sorted
/// key order. Fields of a side that lacks the key are `None`. The error column
/// is left empty; see [`super::annotate_errors`].
pub fn align(model: &StatSet, reference: &StatSet) -> Vec<ValidationRecord> {
    let keys: BTreeSet<_> = model.keys().chain(reference.keys()).collect();

    keys.into_iter()
        .map(|key| {
            let mdl = model.get(key);
            let bio = reference.get(key);
            ValidationRecord {
                key: key.clone(),
                mean_model: mdl.map(|p| p.mean),
                std_model: mdl.map(|p| p.std),
                mean_ref: bio.map(|p| p.mean),
                std_ref: bio.map(|p| p.std),
                error: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{Key, KeyLayout, StatPoint};
    use proptest::prelude::*;

    fn mtype_set(entries: &[(&str, f64, f64)]) -> StatSet {
        StatSet::from_points(
            KeyLayout::mtype(),
            entries
                .iter()
                .map(|(label, mean, std)| StatPoint::new(Key::single(*label), *mean, *std)),
        )
        .unwrap()
    }

    #[test]
    fn test_align_shared_keys_copy_fields() {
        let model = mtype_set(&[("L23_PC", 0.2, 0.05)]);
        let reference = mtype_set(&[("L23_PC", 0.25, 0.07)]);

        let records = align(&model, &reference);
        assert_eq!(
            records,
            vec![ValidationRecord {
                key: Key::single("L23_PC"),
                mean_model: Some(0.2),
                std_model: Some(0.05),
                mean_ref: Some(0.25),
                std_ref: Some(0.07),
                error: None,
            }]
        );
    }

    #[test]
    fn test_align_one_sided_keys_are_missing() {
        let model = mtype_set(&[("L4_SS", 1.0, 0.1)]);
        let reference = mtype_set(&[("L6_IPC", 2.0, 0.2)]);

        let records = align(&model, &reference);
        assert_eq!(records.len(), 2);

        let l4 = &records[0];
        assert_eq!(l4.key, Key::single("L4_SS"));
        assert_eq!(l4.mean_model, Some(1.0));
        assert_eq!(l4.mean_ref, None);
        assert_eq!(l4.std_ref, None);

        let l6 = &records[1];
        assert_eq!(l6.key, Key::single("L6_IPC"));
        assert_eq!(l6.mean_model, None);
        assert_eq!(l6.mean_ref, Some(2.0));
    }

    #[test]
    fn test_align_empty_sets() {
        let records = align(&StatSet::new(KeyLayout::mtype()), &StatSet::new(KeyLayout::mtype()));
        assert!(records.is_empty());
    }

    proptest! {
        #[test]
        fn prop_one_record_per_union_key(
            model_labels in proptest::collection::btree_set("[A-D][0-9]", 0..12),
            ref_labels in proptest::collection::btree_set("[A-D][0-9]", 0..12),
        ) {
            let model = StatSet::from_points(
                KeyLayout::mtype(),
                model_labels.iter().map(|l| StatPoint::new(Key::single(l.as_str()), 1.0, 0.1)),
            ).unwrap();
            let reference = StatSet::from_points(
                KeyLayout::mtype(),
                ref_labels.iter().map(|l| StatPoint::new(Key::single(l.as_str()), 2.0, 0.2)),
            ).unwrap();

            let records = align(&model, &reference);
            let union: std::collections::BTreeSet<_> = model_labels.union(&ref_labels).collect();
            prop_assert_eq!(records.len(), union.len());

            let keys: Vec<_> = records.iter().map(|r| r.key.clone()).collect();
            let expected: Vec<_> = union.iter().map(|l| Key::single(l.as_str())).collect();
            prop_assert_eq!(keys, expected);

            for record in &records {
                let label = match &record.key { Key::Single(l) => l, Key::Pair(..) => unreachable!() };
                prop_assert_eq!(record.mean_model.is_some(), model_labels.contains(label));
                prop_assert_eq!(record.mean_ref.is_some(), ref_labels.contains(label));
            }
        }
    }
}
