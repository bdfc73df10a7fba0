//! Bottom-up metrics orchestration.
//!
//! The engine seeds a fresh metrics object per entity, runs every active
//! calculator over it in registration order (each receiving the previous
//! one's output), and assembles nested results from the bottom up:
//! function metrics first, embedded into class metrics, embedded into
//! file metrics, aggregated into codebase totals. Calculator faults are
//! contained per call: outcome diagnostics are collected and tagged, a
//! panicking calculator is caught and recorded, and neither stops the
//! remaining calculators or entities.
//!
//! File-level computation optionally runs on a bounded worker pool.
//! Workers return pure per-file results; only the orchestrating thread
//! merges them, so aggregates are identical between sequential and
//! parallel runs up to floating-point summation order.

use crate::calculators::{
    CalcOutcome, Calculator, CalculatorRegistry, HierarchyAnalysis, TypeDecl,
};
use crate::config::MetricsConfig;
use crate::core::{
    ClassMetrics, CodebaseMetrics, Diagnostic, EngineError, FileMetrics, FunctionMetrics,
    Language, MetricsData, Result,
};
use crate::source::{ClassSource, CodebaseSource, FileSource, FunctionSource};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle of a codebase run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Aggregating,
    Complete,
    Failed,
}

enum RegistryHandle {
    Shared(&'static CalculatorRegistry),
    Owned(Arc<CalculatorRegistry>),
}

impl RegistryHandle {
    fn get(&self) -> &CalculatorRegistry {
        match self {
            RegistryHandle::Shared(registry) => registry,
            RegistryHandle::Owned(registry) => registry,
        }
    }
}

/// Diagnostics accumulated while computing one entity or one run
#[derive(Default)]
struct DiagnosticSink {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl DiagnosticSink {
    fn absorb_outcome<T>(&mut self, outcome: &mut CalcOutcome<T>) {
        self.errors.append(&mut outcome.errors);
        self.warnings.append(&mut outcome.warnings);
    }

    fn merge(&mut self, mut other: DiagnosticSink) {
        self.errors.append(&mut other.errors);
        self.warnings.append(&mut other.warnings);
    }
}

/// Orchestrates calculators over source handles
pub struct MetricsEngine {
    registry: RegistryHandle,
    config: MetricsConfig,
    state: Mutex<EngineState>,
}

impl Default for MetricsEngine {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

impl MetricsEngine {
    /// Engine over the process-wide shared registry
    pub fn new(config: MetricsConfig) -> Self {
        Self {
            registry: RegistryHandle::Shared(CalculatorRegistry::shared()),
            config,
            state: Mutex::new(EngineState::Idle),
        }
    }

    /// Engine over an independently owned registry. Required for tests
    /// that must not observe each other's registrations.
    pub fn with_registry(config: MetricsConfig, registry: Arc<CalculatorRegistry>) -> Self {
        Self {
            registry: RegistryHandle::Owned(registry),
            config,
            state: Mutex::new(EngineState::Idle),
        }
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    fn set_state(&self, state: EngineState) {
        *self.state.lock() = state;
    }

    /// Active calculators for a language, in registration order
    fn active_calculators(&self, language: Language) -> Vec<Arc<dyn Calculator>> {
        self.registry
            .get()
            .get_for_language(language)
            .into_iter()
            .filter(|c| self.config.engine.is_calculator_active(c.name()))
            .collect()
    }

    /// Whether a calculator participates in batch hierarchy analysis
    fn supports_hierarchy(calculator: &dyn Calculator) -> bool {
        calculator.analyze_type_hierarchy(&[]).is_some()
    }

    /// Run one calculator step with panic containment. Returns the input
    /// value unchanged when the calculator panics.
    fn run_step<T, F>(
        calculator: &dyn Calculator,
        entity: &str,
        metrics: T,
        sink: &mut DiagnosticSink,
        step: F,
    ) -> T
    where
        T: Clone,
        F: FnOnce(T) -> CalcOutcome<T>,
    {
        let fallback = metrics.clone();
        match catch_unwind(AssertUnwindSafe(|| step(metrics))) {
            Ok(mut outcome) => {
                sink.absorb_outcome(&mut outcome);
                outcome.value
            }
            Err(_) => {
                log::error!(
                    "Calculator '{}' panicked on '{entity}'",
                    calculator.name()
                );
                sink.errors.push(
                    Diagnostic::error("calculator panicked; value left unchanged")
                        .for_calculator(calculator.name())
                        .for_entity(entity),
                );
                fallback
            }
        }
    }

    fn compute_function(
        &self,
        source: &dyn FunctionSource,
        language: Language,
        sink: &mut DiagnosticSink,
    ) -> FunctionMetrics {
        let mut metrics = FunctionMetrics::new(
            source.name().to_string(),
            source.file_path().to_path_buf(),
            source.start_line(),
            source.end_line(),
        );
        if let Some(count) = source.parameter_count() {
            metrics.parameter_count = count;
        }
        if let Some(depth) = source.nesting_depth() {
            metrics.nesting_depth = depth;
        }
        if let Some(flag) = source.is_recursive() {
            metrics.is_recursive = flag;
        }
        if let Some(flag) = source.is_dead() {
            metrics.is_dead = flag;
        }
        if let Some(flag) = source.has_unused_params() {
            metrics.has_unused_params = flag;
        }
        if let Some(count) = source.call_site_count() {
            metrics.call_site_count = count;
        }
        if let Some(count) = source.dependency_count() {
            metrics.dependency_count = count;
        }

        for calculator in self.active_calculators(language) {
            metrics = Self::run_step(
                calculator.as_ref(),
                source.name(),
                metrics,
                sink,
                |m| calculator.calculate_for_function(source, m),
            );
        }
        metrics
    }

    fn compute_class(
        &self,
        source: &dyn ClassSource,
        language: Language,
        in_batch: bool,
        sink: &mut DiagnosticSink,
    ) -> ClassMetrics {
        let mut metrics = ClassMetrics::new(
            source.name().to_string(),
            source.file_path().to_path_buf(),
            source.start_line(),
            source.end_line(),
        );

        // Bottom-up: method metrics first, then class-scope calculators
        for method in source.methods() {
            metrics
                .methods
                .push(self.compute_function(method, language, sink));
        }
        metrics.method_count = metrics.methods.len();
        metrics.has_dead_methods = metrics.methods.iter().any(|m| m.is_dead);
        if let Some(count) = source.attribute_count() {
            metrics.attribute_count = count;
        }

        for calculator in self.active_calculators(language) {
            // Hierarchy-aware calculators get batch context later; their
            // single-type approximation would only add noise here
            if in_batch && Self::supports_hierarchy(calculator.as_ref()) {
                continue;
            }
            metrics = Self::run_step(
                calculator.as_ref(),
                source.name(),
                metrics,
                sink,
                |m| calculator.calculate_for_class(source, m),
            );
        }
        metrics
    }

    fn compute_file(&self, source: &dyn FileSource, sink: &mut DiagnosticSink) -> FileMetrics {
        let language = source
            .language()
            .unwrap_or_else(|| Language::from_path(source.path()));
        let mut metrics = FileMetrics::new(source.path().to_path_buf(), language);

        for function in source.functions() {
            metrics
                .functions
                .push(self.compute_function(function, language, sink));
        }
        for class in source.classes() {
            metrics
                .classes
                .push(self.compute_class(class, language, true, sink));
        }

        metrics.function_count = metrics.functions.len();
        metrics.class_count = metrics.classes.len();
        if let Some(count) = source.import_count() {
            metrics.import_count = count;
        }
        if let Some(count) = source.global_var_count() {
            metrics.global_var_count = count;
        }
        if let Some(count) = source.interface_count() {
            metrics.interface_count = count;
        }
        metrics.is_test_file = source
            .is_test_file()
            .unwrap_or_else(|| is_test_path(source.path()));
        if let Some(estimate) = source.test_coverage_estimate() {
            metrics.test_coverage_estimate = estimate;
        }
        metrics.has_dead_code = metrics.functions.iter().any(|f| f.is_dead)
            || metrics.classes.iter().any(|c| c.has_dead_methods);

        for calculator in self.active_calculators(language) {
            metrics = Self::run_step(
                calculator.as_ref(),
                &source.path().display().to_string(),
                metrics,
                sink,
                |m| calculator.calculate_for_file(source, m),
            );
        }

        // File-scope hierarchy: every class in this file forms the batch
        let types: Vec<TypeDecl> = source
            .classes()
            .iter()
            .map(|c| TypeDecl::new(c.name(), c.base_types()))
            .collect();
        if !types.is_empty() {
            for analysis in self.hierarchy_analyses(language, &types, sink) {
                overlay_hierarchy(&mut metrics.classes, &analysis);
            }
        }

        metrics
    }

    /// Batch hierarchy results from every active hierarchy-aware
    /// calculator. The hierarchy is rebuilt per call; nothing survives
    /// between batches.
    fn hierarchy_analyses(
        &self,
        language: Language,
        types: &[TypeDecl],
        sink: &mut DiagnosticSink,
    ) -> Vec<HierarchyAnalysis> {
        let mut analyses = Vec::new();
        for calculator in self.active_calculators(language) {
            if let Some(mut analysis) = calculator.analyze_type_hierarchy(types) {
                sink.warnings.append(&mut analysis.warnings);
                analyses.push(analysis);
            }
        }
        analyses
    }

    /// Compute metrics for a single function
    pub fn calculate_function_metrics(
        &self,
        source: &dyn FunctionSource,
        language: Option<Language>,
    ) -> CalcOutcome<FunctionMetrics> {
        let language = language.unwrap_or_else(|| Language::from_path(source.file_path()));
        let mut sink = DiagnosticSink::default();
        let metrics = self.compute_function(source, language, &mut sink);
        CalcOutcome {
            value: metrics,
            errors: sink.errors,
            warnings: sink.warnings,
        }
    }

    /// Compute metrics for a single class, methods first.
    ///
    /// Without sibling batch context the depth-of-inheritance value is
    /// the single-type approximation; use a file or codebase run for
    /// hierarchy-aware depth.
    pub fn calculate_class_metrics(
        &self,
        source: &dyn ClassSource,
        language: Option<Language>,
    ) -> CalcOutcome<ClassMetrics> {
        let language = language.unwrap_or_else(|| Language::from_path(source.file_path()));
        let mut sink = DiagnosticSink::default();
        let metrics = self.compute_class(source, language, false, &mut sink);
        CalcOutcome {
            value: metrics,
            errors: sink.errors,
            warnings: sink.warnings,
        }
    }

    /// Compute metrics for a single file, embedded scopes first
    pub fn calculate_file_metrics(&self, source: &dyn FileSource) -> CalcOutcome<FileMetrics> {
        let mut sink = DiagnosticSink::default();
        let metrics = self.compute_file(source, &mut sink);
        CalcOutcome {
            value: metrics,
            errors: sink.errors,
            warnings: sink.warnings,
        }
    }

    /// Primary entry point: compute the whole codebase and aggregate.
    ///
    /// Per-entity and per-calculator faults are recorded in the returned
    /// diagnostics and never abort the run; only a codebase handle that
    /// cannot enumerate its files raises.
    pub fn calculate_codebase_metrics(&self, source: &dyn CodebaseSource) -> Result<MetricsData> {
        let started = Instant::now();
        self.set_state(EngineState::Running);

        let files = match source.files() {
            Ok(files) => files,
            Err(e) => {
                self.set_state(EngineState::Failed);
                return Err(EngineError::CodebaseEnumeration {
                    project: source.project_name().to_string(),
                    message: e.to_string(),
                }
                .into());
            }
        };

        let mut sink = DiagnosticSink::default();
        let mut per_file = self.compute_files(&files, &mut sink);

        // Codebase-scope hierarchy: the batch spans every file's classes
        let all_types: Vec<TypeDecl> = files
            .iter()
            .flat_map(|f| f.classes())
            .map(|c| TypeDecl::new(c.name(), c.base_types()))
            .collect();
        if !all_types.is_empty() {
            for analysis in self.hierarchy_analyses(Language::Unknown, &all_types, &mut sink) {
                for metrics in &mut per_file {
                    overlay_hierarchy(&mut metrics.classes, &analysis);
                }
            }
        }

        let mut codebase = CodebaseMetrics::new(source.project_name().to_string());
        codebase.revision = source.revision();
        for calculator in self.codebase_calculators() {
            codebase = Self::run_step(
                calculator.as_ref(),
                source.project_name(),
                codebase,
                &mut sink,
                |m| calculator.calculate_for_codebase(source, m),
            );
        }

        self.set_state(EngineState::Aggregating);
        let codebase = aggregate(codebase, &per_file);

        let mut data = MetricsData::new(codebase);
        for metrics in per_file {
            data.class_metrics
                .insert(metrics.path.clone(), metrics.classes.clone());
            data.function_metrics
                .insert(metrics.path.clone(), metrics.functions.clone());
            data.file_metrics.insert(metrics.path.clone(), metrics);
        }
        data.errors = sink.errors;
        data.warnings = sink.warnings;
        data.duration_ms = started.elapsed().as_millis() as u64;

        self.set_state(EngineState::Complete);
        log::debug!(
            "Computed metrics for {} files in {}ms ({} errors, {} warnings)",
            data.codebase.total_files,
            data.duration_ms,
            data.errors.len(),
            data.warnings.len()
        );
        Ok(data)
    }

    /// One file's computation as a pure result: metrics (absent when the
    /// whole file step failed and was skipped) plus its diagnostics
    fn compute_file_guarded(&self, file: &dyn FileSource) -> (Option<FileMetrics>, DiagnosticSink) {
        let mut sink = DiagnosticSink::default();
        match catch_unwind(AssertUnwindSafe(|| {
            let mut inner = DiagnosticSink::default();
            let metrics = self.compute_file(file, &mut inner);
            (metrics, inner)
        })) {
            Ok((metrics, inner)) => {
                sink.merge(inner);
                (Some(metrics), sink)
            }
            Err(_) => {
                let error = EngineError::FileProcessing {
                    file: file.path().to_path_buf(),
                    message: "file computation panicked; file skipped".to_string(),
                };
                log::error!("{error}");
                sink.errors.push(Diagnostic::error(error.to_string()));
                (None, sink)
            }
        }
    }

    /// Per-file computation, parallel over the configured worker pool
    /// when enabled. Workers return pure values; diagnostics merge on the
    /// orchestrating thread afterwards, in file order.
    fn compute_files(
        &self,
        files: &[&dyn FileSource],
        sink: &mut DiagnosticSink,
    ) -> Vec<FileMetrics> {
        let sequential = !self.config.engine.parallel || files.len() < 2;

        let results: Vec<(Option<FileMetrics>, DiagnosticSink)> = if sequential {
            files
                .iter()
                .map(|file| self.compute_file_guarded(*file))
                .collect()
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.engine.worker_count())
                .build()
            {
                Ok(pool) => pool.install(|| {
                    files
                        .par_iter()
                        .map(|file| self.compute_file_guarded(*file))
                        .collect()
                }),
                Err(e) => {
                    log::warn!("Worker pool unavailable, falling back to sequential: {e}");
                    sink.warnings.push(Diagnostic::warning(format!(
                        "worker pool unavailable, processed sequentially: {e}"
                    )));
                    files
                        .iter()
                        .map(|file| self.compute_file_guarded(*file))
                        .collect()
                }
            }
        };

        let mut per_file = Vec::with_capacity(results.len());
        for (metrics, file_sink) in results {
            sink.merge(file_sink);
            per_file.extend(metrics);
        }
        per_file
    }

    /// Codebase-scope calculators are filtered by the enabled sets only;
    /// there is no single language at this granularity
    fn codebase_calculators(&self) -> Vec<Arc<dyn Calculator>> {
        self.registry
            .get()
            .in_registration_order()
            .into_iter()
            .filter(|c| self.config.engine.is_calculator_active(c.name()))
            .collect()
    }
}

/// Overwrite class DIT/NOC with batch hierarchy results
fn overlay_hierarchy(classes: &mut [ClassMetrics], analysis: &HierarchyAnalysis) {
    for class in classes {
        class.depth_of_inheritance = analysis.depth_of(&class.name);
        class.number_of_children = analysis.number_of_children(&class.name);
    }
}

/// Heuristic test-file detection from the path, used when the handle has
/// no explicit answer
fn is_test_path(path: &Path) -> bool {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    if name.starts_with("test_") || name.ends_with("_test") || name.ends_with("_tests") {
        return true;
    }
    if name.ends_with(".test") || name.ends_with(".spec") {
        return true;
    }
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(|c| c == "tests" || c == "test" || c == "__tests__")
}

/// Fold per-file results into codebase totals and averages. Pure sums and
/// means: the outcome is independent of file processing order.
fn aggregate(mut codebase: CodebaseMetrics, per_file: &[FileMetrics]) -> CodebaseMetrics {
    for metrics in per_file {
        codebase.total_files += 1;
        codebase.total_functions += metrics.function_count;
        codebase.total_classes += metrics.class_count;
        codebase.lines.absorb(&metrics.lines);
        codebase.total_cyclomatic_complexity += u64::from(metrics.cyclomatic);
        codebase.total_halstead_volume += metrics.halstead.volume();
        *codebase
            .language_distribution
            .entry(metrics.language.to_string())
            .or_insert(0) += 1;
        if metrics.has_dead_code {
            codebase.files_with_dead_code += 1;
        }
        if metrics.is_test_file {
            codebase.test_file_count += 1;
        }
    }

    if codebase.total_files > 0 {
        codebase.average_cyclomatic_complexity =
            codebase.total_cyclomatic_complexity as f64 / codebase.total_files as f64;
    }

    let scored: Vec<f64> = per_file
        .iter()
        .map(|m| m.maintainability_index)
        .filter(|&mi| mi > 0.0)
        .collect();
    if !scored.is_empty() {
        codebase.average_maintainability_index =
            scored.iter().sum::<f64>() / scored.len() as f64;
    }

    codebase
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_heuristic() {
        assert!(is_test_path(Path::new("src/test_parser.py")));
        assert!(is_test_path(Path::new("tests/integration.rs")));
        assert!(is_test_path(Path::new("src/widget.test.js")));
        assert!(!is_test_path(Path::new("src/parser.py")));
        assert!(!is_test_path(Path::new("src/attestation.rs")));
    }

    #[test]
    fn aggregate_of_nothing_is_zeroes() {
        let codebase = aggregate(CodebaseMetrics::new("empty".to_string()), &[]);
        assert_eq!(codebase.total_files, 0);
        assert_eq!(codebase.average_cyclomatic_complexity, 0.0);
        assert_eq!(codebase.average_maintainability_index, 0.0);
    }
}
