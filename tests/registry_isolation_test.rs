mod common;

use codegauge::{
    CalculatorConfig, CalculatorRegistry, HalsteadMetrics, MetricsConfig, MetricsEngine,
};
use common::sample_codebase;
use std::sync::Arc;

#[test]
fn owned_registries_do_not_observe_each_other() {
    let first = CalculatorRegistry::with_standard_calculators().unwrap();
    let second = CalculatorRegistry::with_standard_calculators().unwrap();

    assert!(first.unregister("halstead_volume"));
    assert_eq!(first.len(), 4);
    assert_eq!(second.len(), 5);
    assert!(second.get("halstead_volume").is_some());
}

#[test]
fn shared_registry_is_seeded_once() {
    let shared = CalculatorRegistry::shared();
    assert!(shared.get("cyclomatic_complexity").is_some());
    assert!(shared.get("depth_of_inheritance").is_some());
    assert!(std::ptr::eq(shared, CalculatorRegistry::shared()));
}

#[test]
fn engine_with_stripped_registry_leaves_fields_at_defaults() {
    let registry = Arc::new(CalculatorRegistry::with_standard_calculators().unwrap());
    registry.unregister("halstead_volume");
    registry.unregister("maintainability_index");

    let engine = MetricsEngine::with_registry(MetricsConfig::default(), registry);
    let data = engine.calculate_codebase_metrics(&sample_codebase()).unwrap();

    for file in data.file_metrics.values() {
        assert_eq!(file.halstead, HalsteadMetrics::default());
        assert_eq!(file.maintainability_index, 0.0);
        assert!(file.cyclomatic >= 1);
    }
}

#[test]
fn create_instance_honors_its_own_configuration() {
    let registry = CalculatorRegistry::with_standard_calculators().unwrap();

    // An instance with the loop category disabled counts fewer decision
    // points than the catalogue's default-configured one
    let config = CalculatorConfig::new()
        .set("count_loops", false)
        .set("count_conditionals", false);
    let instance = registry
        .create_instance("cyclomatic_complexity", &config)
        .unwrap();
    let shared = registry.get("cyclomatic_complexity").unwrap();

    let source = codegauge::InMemoryFunction::new(
        "looper",
        "src/looper.py",
        "def looper(xs):\n    for x in xs:\n        if x:\n            return x\n",
    );
    let seeded = codegauge::FunctionMetrics::new(
        "looper".to_string(),
        "src/looper.py".into(),
        1,
        4,
    );

    let custom = instance.calculate_for_function(&source, seeded.clone());
    let default = shared.calculate_for_function(&source, seeded);
    assert!(custom.value.cyclomatic < default.value.cyclomatic);
    assert_eq!(custom.value.cyclomatic, 1);
}

#[test]
fn clearing_an_owned_registry_does_not_touch_the_shared_one() {
    let owned = CalculatorRegistry::with_standard_calculators().unwrap();
    owned.clear();
    assert!(owned.is_empty());
    assert!(!CalculatorRegistry::shared().is_empty());
}
