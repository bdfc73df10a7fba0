// Export modules for library usage
pub mod calculators;
pub mod config;
pub mod core;
pub mod engine;
pub mod source;
pub mod storage;

// Re-export commonly used types
pub use crate::core::{
    ClassMetrics, CodebaseMetrics, Diagnostic, DiagnosticSeverity, EngineError, Error,
    FileMetrics, FunctionMetrics, HalsteadMetrics, Language, LineCounts, MetricsData,
    PersistenceError, RegistryError, Result,
};

pub use crate::calculators::{
    CalcOutcome, Calculator, CalculatorCategory, CalculatorConfig, CalculatorRegistry,
    ConfigSchema, CyclomaticComplexityCalculator, DepthOfInheritanceCalculator, FromConfig,
    HalsteadVolumeCalculator, HierarchyAnalysis, LinesOfCodeCalculator,
    MaintainabilityIndexCalculator, TypeDecl,
};

pub use crate::config::{EngineConfig, MetricsConfig};

pub use crate::engine::{EngineState, MetricsEngine};

pub use crate::source::{
    fs::FsCodebase, ClassSource, CodebaseSource, FileSource, FunctionSource, InMemoryClass,
    InMemoryCodebase, InMemoryFile, InMemoryFunction,
};

pub use crate::storage::{
    dialect::{Dialect, QueryBuilder},
    HistoryPoint, MetricsStore, StoredRun,
};
