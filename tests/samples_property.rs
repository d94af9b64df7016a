use proptest::prelude::*;

use coreflow::attributes::{AttrValue, AttributeRegistry};
use coreflow::samples::{AttrMap, Sample, VirtualSample};

fn to_attr_map(map: &std::collections::HashMap<String, i64>) -> AttrMap {
    map.iter()
        .map(|(k, v)| (k.clone(), AttrValue::Integer(*v)))
        .collect()
}

proptest! {
    /// Merged reads are overlay-then-input-then-absent, for any pair of
    /// layers and any probe key.
    #[test]
    fn merge_read_is_overlay_then_input_then_absent(
        input in proptest::collection::hash_map("[a-z]{1,4}", any::<i64>(), 0..8),
        run in proptest::collection::hash_map("[a-z]{1,4}", any::<i64>(), 0..8),
        probe in "[a-z]{1,4}",
    ) {
        let mut sample = Sample::from_input(to_attr_map(&input));
        let mut view = VirtualSample::new(&mut sample, "run").unwrap();
        for (k, v) in &run {
            view.set(k.clone(), AttrValue::Integer(*v));
        }

        let expected = run
            .get(&probe)
            .or_else(|| input.get(&probe))
            .map(|v| AttrValue::Integer(*v));
        prop_assert_eq!(view.get(&probe), expected);

        // enumeration is the union of both layers
        for key in input.keys().chain(run.keys()) {
            prop_assert!(view.contains(key));
        }
    }

    /// With no registered output attributes the purge empties the run layer
    /// and never touches the input layer; a second purge changes nothing.
    #[test]
    fn purge_drops_all_unregistered_and_is_idempotent(
        input in proptest::collection::hash_map("[a-z]{1,4}", any::<i64>(), 0..8),
        run in proptest::collection::hash_map("[a-z]{1,4}", any::<i64>(), 1..8),
    ) {
        let registry = AttributeRegistry::default();
        let mut sample = Sample::from_input(to_attr_map(&input));
        let mut view = VirtualSample::new(&mut sample, "run").unwrap();
        for (k, v) in &run {
            view.set(k.clone(), AttrValue::Integer(*v));
        }

        view.purge_intermediates(&registry);
        for key in run.keys() {
            prop_assert_eq!(
                view.get(key).is_some(),
                input.contains_key(key),
                "only input values remain visible"
            );
        }

        let before = sample.clone();
        let mut view = VirtualSample::new(&mut sample, "run").unwrap();
        view.purge_intermediates(&registry);
        prop_assert_eq!(&sample, &before);
    }
}
