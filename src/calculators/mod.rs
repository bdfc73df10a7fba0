//! Calculator contract and the standard calculator set.
//!
//! A calculator is a pure formula implementation behind one trait. The
//! central failure-containment rule of the engine lives here: a
//! `calculate_for_*` operation never panics outward and never returns a
//! hard error. Faults are carried as diagnostics inside the returned
//! [`CalcOutcome`], and the outcome's lists are fresh per invocation.
//! The only rejection point is construction from configuration.

pub mod cyclomatic;
pub mod halstead;
pub mod inheritance;
pub mod loc;
pub mod maintainability;
pub mod registry;
pub mod strip;

use crate::core::{
    ClassMetrics, CodebaseMetrics, Diagnostic, FileMetrics, FunctionMetrics, Language,
    RegistryError,
};
use crate::source::{ClassSource, CodebaseSource, FileSource, FunctionSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalogue categories calculators are indexed under
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CalculatorCategory {
    Complexity,
    Size,
    Quality,
    Maintainability,
    Inheritance,
    Testing,
    Custom,
}

impl std::fmt::Display for CalculatorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        static DISPLAY_STRINGS: &[(CalculatorCategory, &str)] = &[
            (CalculatorCategory::Complexity, "complexity"),
            (CalculatorCategory::Size, "size"),
            (CalculatorCategory::Quality, "quality"),
            (CalculatorCategory::Maintainability, "maintainability"),
            (CalculatorCategory::Inheritance, "inheritance"),
            (CalculatorCategory::Testing, "testing"),
            (CalculatorCategory::Custom, "custom"),
        ];

        let display_str = DISPLAY_STRINGS
            .iter()
            .find(|(c, _)| c == self)
            .map(|(_, s)| *s)
            .unwrap_or("custom");

        write!(f, "{display_str}")
    }
}

/// Untyped per-calculator configuration, the shape a `[calculators.<name>]`
/// table takes after loading
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CalculatorConfig {
    #[serde(flatten)]
    values: HashMap<String, toml::Value>,
}

impl CalculatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.values
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.values
            .get(key)
            .and_then(|v| v.as_integer())
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.values
            .get(key)
            .and_then(|v| match v {
                toml::Value::Float(f) => Some(*f),
                toml::Value::Integer(i) => Some(*i as f64),
                _ => None,
            })
            .unwrap_or(default)
    }

    pub fn get_string_list(&self, key: &str) -> Option<Vec<String>> {
        self.values.get(key).and_then(|v| v.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Kinds a configuration field may take
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigValueKind {
    Bool,
    Integer,
    Float,
    StringList,
}

/// One entry of a calculator's configuration schema descriptor
#[derive(Clone, Debug)]
pub struct ConfigFieldSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ConfigValueKind,
}

/// Self-description of the configuration keys a calculator understands
#[derive(Clone, Debug, Default)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigFieldSpec>,
}

impl ConfigSchema {
    pub fn field(
        mut self,
        name: &'static str,
        kind: ConfigValueKind,
        description: &'static str,
    ) -> Self {
        self.fields.push(ConfigFieldSpec {
            name,
            description,
            kind,
        });
        self
    }
}

/// Result of one calculator invocation: the updated (or unchanged) metrics
/// value plus the diagnostics raised while producing it. Lists start empty
/// on every call.
#[derive(Clone, Debug)]
pub struct CalcOutcome<T> {
    pub value: T,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl<T> CalcOutcome<T> {
    /// A successful computation
    pub fn ok(value: T) -> Self {
        Self {
            value,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// The input handed back untouched, the contract's fallback shape
    pub fn unchanged(value: T) -> Self {
        Self::ok(value)
    }

    pub fn with_warning(mut self, warning: Diagnostic) -> Self {
        self.warnings.push(warning);
        self
    }

    pub fn with_error(mut self, error: Diagnostic) -> Self {
        self.errors.push(error);
        self
    }

    pub fn push_warning(&mut self, warning: Diagnostic) {
        self.warnings.push(warning);
    }

    pub fn push_error(&mut self, error: Diagnostic) {
        self.errors.push(error);
    }
}

/// The calculator plugin contract.
///
/// Implementations are stateless across calls and safe to invoke
/// concurrently over different files. Each `calculate_for_*` defaults to
/// handing the input back unchanged; concrete calculators override the
/// scopes whose fields they own.
pub trait Calculator: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn version(&self) -> &str;

    /// Whether this calculator produces meaningful values for `language`.
    /// Defaults to supporting every language.
    fn supports_language(&self, _language: Language) -> bool {
        true
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::default()
    }

    /// Batch hierarchy analysis over a file's or codebase's type
    /// declarations. The engine invokes this explicitly so the hierarchy
    /// is rebuilt per batch rather than cached across calls. Calculators
    /// without a hierarchy concern return `None`.
    fn analyze_type_hierarchy(&self, _types: &[TypeDecl]) -> Option<HierarchyAnalysis> {
        None
    }

    fn calculate_for_function(
        &self,
        _source: &dyn FunctionSource,
        metrics: FunctionMetrics,
    ) -> CalcOutcome<FunctionMetrics> {
        CalcOutcome::unchanged(metrics)
    }

    fn calculate_for_class(
        &self,
        _source: &dyn ClassSource,
        metrics: ClassMetrics,
    ) -> CalcOutcome<ClassMetrics> {
        CalcOutcome::unchanged(metrics)
    }

    fn calculate_for_file(
        &self,
        _source: &dyn FileSource,
        metrics: FileMetrics,
    ) -> CalcOutcome<FileMetrics> {
        CalcOutcome::unchanged(metrics)
    }

    fn calculate_for_codebase(
        &self,
        _source: &dyn CodebaseSource,
        metrics: CodebaseMetrics,
    ) -> CalcOutcome<CodebaseMetrics> {
        CalcOutcome::unchanged(metrics)
    }
}

/// Construction from an untyped configuration table. The one place a
/// calculator may reject: bad configuration is a programmer error, not a
/// runtime data issue.
pub trait FromConfig: Sized {
    fn from_config(config: &CalculatorConfig) -> Result<Self, RegistryError>;
}

pub use cyclomatic::CyclomaticComplexityCalculator;
pub use halstead::HalsteadVolumeCalculator;
pub use inheritance::{DepthOfInheritanceCalculator, HierarchyAnalysis, TypeDecl};
pub use loc::LinesOfCodeCalculator;
pub use maintainability::MaintainabilityIndexCalculator;
pub use registry::CalculatorRegistry;
