mod common;

use codegauge::{
    CalcOutcome, Calculator, CalculatorCategory, CalculatorConfig, CalculatorRegistry,
    CodebaseSource, EngineConfig, EngineState, FileSource, FromConfig, FunctionMetrics,
    FunctionSource, HalsteadMetrics, Language, MetricsConfig, MetricsEngine, RegistryError,
};
use common::sample_codebase;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn engine_with(config: MetricsConfig) -> MetricsEngine {
    let registry = Arc::new(CalculatorRegistry::with_standard_calculators().unwrap());
    MetricsEngine::with_registry(config, registry)
}

#[test]
fn codebase_run_produces_consistent_totals() {
    common::init_test_logging();
    let engine = engine_with(MetricsConfig::default());
    let data = engine.calculate_codebase_metrics(&sample_codebase()).unwrap();

    assert_eq!(data.codebase.project_name, "sample");
    assert_eq!(data.codebase.revision.as_deref(), Some("rev-42"));
    assert_eq!(data.codebase.total_files, 4);
    assert_eq!(data.codebase.total_files, data.file_metrics.len());
    assert_eq!(data.codebase.total_functions, 4);
    assert_eq!(data.codebase.total_classes, 4);

    let expected_average = data.codebase.total_cyclomatic_complexity as f64
        / data.codebase.total_files as f64;
    assert!((data.codebase.average_cyclomatic_complexity - expected_average).abs() < 1e-9);

    assert_eq!(data.codebase.language_distribution["Python"], 3);
    assert_eq!(data.codebase.language_distribution["JavaScript"], 1);
    assert_eq!(data.codebase.test_file_count, 1);

    assert_eq!(engine.state(), EngineState::Complete);
}

#[test]
fn line_totals_sum_over_files() {
    let engine = engine_with(MetricsConfig::default());
    let data = engine.calculate_codebase_metrics(&sample_codebase()).unwrap();

    let summed: usize = data.file_metrics.values().map(|f| f.lines.total).sum();
    assert_eq!(data.codebase.lines.total, summed);

    for file in data.file_metrics.values() {
        assert_eq!(
            file.lines.blank + file.lines.comment + file.lines.source,
            file.lines.total,
            "partition broken for {}",
            file.path.display()
        );
    }
}

#[test]
fn cross_file_hierarchy_depths_are_exact() {
    let engine = engine_with(MetricsConfig::default());
    let data = engine.calculate_codebase_metrics(&sample_codebase()).unwrap();

    let shapes = &data.class_metrics[&PathBuf::from("src/shapes.py")];
    let shape = shapes.iter().find(|c| c.name == "Shape").unwrap();
    assert_eq!(shape.depth_of_inheritance, 0);
    assert_eq!(shape.number_of_children, 1);

    let handlers = &data.class_metrics[&PathBuf::from("src/handlers.py")];
    let depth_of = |name: &str| {
        handlers
            .iter()
            .find(|c| c.name == name)
            .unwrap()
            .depth_of_inheritance
    };
    assert_eq!(depth_of("Circle"), 1);
    assert_eq!(depth_of("Ring"), 2);
    assert_eq!(depth_of("Disk"), 3);
}

#[test]
fn class_complexity_follows_the_additive_convention() {
    let engine = engine_with(MetricsConfig::default());
    let outcome = engine.calculate_class_metrics(&common::handlers_file().classes[0], None);
    let class = outcome.value;

    // The class body contains the method source, and the method's
    // complexity is added again on top
    let method_sum: u32 = class.methods.iter().map(|m| m.cyclomatic).sum();
    assert!(method_sum >= 1);
    assert!(class.cyclomatic > method_sum);
}

#[test]
fn single_class_depth_is_approximated_with_warning() {
    let engine = engine_with(MetricsConfig::default());
    let circle = common::handlers_file().classes[0].clone();
    let outcome = engine.calculate_class_metrics(&circle, None);

    assert_eq!(outcome.value.depth_of_inheritance, 1);
    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.message.contains("approximated")));
}

#[test]
fn disabled_calculator_leaves_its_fields_at_defaults() {
    let config = MetricsConfig {
        engine: EngineConfig {
            disabled_calculators: vec!["halstead_volume".to_string()],
            ..Default::default()
        },
        ..Default::default()
    };
    let engine = engine_with(config);
    let data = engine.calculate_codebase_metrics(&sample_codebase()).unwrap();

    for file in data.file_metrics.values() {
        assert_eq!(file.halstead, HalsteadMetrics::default());
        // Other calculators still populated their fields
        assert!(file.cyclomatic >= 1);
        assert!(file.lines.total > 0);
    }
    assert_eq!(data.codebase.total_halstead_volume, 0.0);
}

struct PanickyCalculator;

impl FromConfig for PanickyCalculator {
    fn from_config(_config: &CalculatorConfig) -> Result<Self, RegistryError> {
        Ok(Self)
    }
}

impl Calculator for PanickyCalculator {
    fn name(&self) -> &str {
        "panicky"
    }

    fn description(&self) -> &str {
        "panics on every function"
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    fn calculate_for_function(
        &self,
        _source: &dyn FunctionSource,
        _metrics: FunctionMetrics,
    ) -> CalcOutcome<FunctionMetrics> {
        panic!("boom");
    }
}

#[test]
fn a_panicking_calculator_does_not_abort_the_run() {
    let registry = Arc::new(CalculatorRegistry::with_standard_calculators().unwrap());
    registry
        .register::<PanickyCalculator>(CalculatorCategory::Custom, CalculatorConfig::new())
        .unwrap();
    let engine = MetricsEngine::with_registry(MetricsConfig::default(), registry);

    let data = engine.calculate_codebase_metrics(&sample_codebase()).unwrap();

    assert_eq!(data.codebase.total_files, 4);
    assert!(data
        .errors
        .iter()
        .any(|e| e.calculator.as_deref() == Some("panicky")));
    // Every other calculator still produced values
    for file in data.file_metrics.values() {
        assert!(file.cyclomatic >= 1);
        assert!(file.lines.total > 0);
    }
}

struct UnreadableCodebase;

impl CodebaseSource for UnreadableCodebase {
    fn project_name(&self) -> &str {
        "unreadable"
    }

    fn files(&self) -> anyhow::Result<Vec<&dyn FileSource>> {
        anyhow::bail!("directory vanished")
    }
}

#[test]
fn enumeration_failure_is_fatal_and_marks_the_engine_failed() {
    let engine = engine_with(MetricsConfig::default());
    let result = engine.calculate_codebase_metrics(&UnreadableCodebase);
    assert!(result.is_err());
    assert_eq!(engine.state(), EngineState::Failed);
}

struct SourcelessFunction;

impl FunctionSource for SourcelessFunction {
    fn name(&self) -> &str {
        "ghost"
    }

    fn file_path(&self) -> &Path {
        Path::new("src/ghost.py")
    }

    fn start_line(&self) -> usize {
        1
    }

    fn end_line(&self) -> usize {
        1
    }

    fn source_text(&self) -> anyhow::Result<String> {
        anyhow::bail!("no source available")
    }
}

#[test]
fn missing_source_degrades_to_warnings() {
    let engine = engine_with(MetricsConfig::default());
    let outcome = engine.calculate_function_metrics(&SourcelessFunction, Some(Language::Python));

    // Text-based metrics were skipped, leaving defaults
    assert_eq!(outcome.value.cyclomatic, 1);
    assert_eq!(outcome.value.halstead, HalsteadMetrics::default());
    assert_eq!(outcome.value.lines.total, 0);
    assert!(outcome.errors.is_empty());
    assert!(outcome.warnings.len() >= 3);
}

#[test]
fn dead_function_hints_flow_into_codebase_counts() {
    use codegauge::{InMemoryCodebase, InMemoryFile, InMemoryFunction};

    let source = "def unused():\n    return 1\n";
    let file = InMemoryFile::new("src/legacy.py", source).with_function(
        InMemoryFunction::new("unused", "src/legacy.py", source).marked_dead(),
    );
    let codebase = InMemoryCodebase::new("legacy").with_file(file);

    let engine = engine_with(MetricsConfig::default());
    let data = engine.calculate_codebase_metrics(&codebase).unwrap();

    let file = &data.file_metrics[&PathBuf::from("src/legacy.py")];
    assert!(file.has_dead_code);
    assert!(file.functions[0].is_dead);
    assert_eq!(data.codebase.files_with_dead_code, 1);
}

#[test]
fn to_dict_exposes_the_run_structure() {
    let engine = engine_with(MetricsConfig::default());
    let data = engine.calculate_codebase_metrics(&sample_codebase()).unwrap();

    let dict = data.to_dict();
    assert!(dict.get("codebase").is_some());
    assert!(dict.get("file_metrics").is_some());
    assert_eq!(
        dict["codebase"]["project_name"],
        serde_json::Value::String("sample".to_string())
    );
}
