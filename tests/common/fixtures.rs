use rustc_hash::FxHashMap;

use coreflow::attributes::{AttrType, AttrValue, Attribute, AttributeRegistry};
use coreflow::samples::{AttrMap, Core, Sample};
use coreflow::workflows::Selector;

/// A core with one sample per depth, each carrying only its depth as input.
pub fn core_with_depths(name: &str, depths: &[f64]) -> Core {
    let mut core = Core::new(name);
    for depth in depths {
        let mut input = AttrMap::default();
        input.insert("depth".to_owned(), AttrValue::Float(*depth));
        core.add(Sample::from_input(input))
            .expect("sample carries a depth");
    }
    core
}

/// Registry with the base attributes plus the given `(name, type, output)`
/// triples.
pub fn registry_with(attrs: &[(&str, AttrType, bool)]) -> AttributeRegistry {
    let mut registry = AttributeRegistry::default();
    for (name, ty, output) in attrs {
        registry.register(Attribute::new(*name, *ty, *output));
    }
    registry
}

pub fn no_selectors() -> FxHashMap<String, Selector> {
    FxHashMap::default()
}

pub fn selector_set(selectors: impl IntoIterator<Item = Selector>) -> FxHashMap<String, Selector> {
    selectors
        .into_iter()
        .map(|s| (s.name().to_owned(), s))
        .collect()
}
