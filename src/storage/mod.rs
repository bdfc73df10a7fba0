//! Persistence of metrics runs.
//!
//! One run becomes one `codebase_metrics` row plus its dependent file,
//! class, function, Halstead, and diagnostic rows, inserted strictly
//! parent before child with generated ids threaded down.
//! [`MetricsStore::store_metrics_data`] is a single transaction: any
//! failure rolls the whole run back, and the in-memory [`MetricsData`]
//! stays valid either way. The executing backend is SQLite; SQL strings
//! come from the dialect-aware query builder so the schema stays portable
//! across placeholder and id-retrieval styles.

pub mod dialect;
pub mod schema;

use crate::core::{
    CodebaseMetrics, Diagnostic, DiagnosticSeverity, FileMetrics, HalsteadMetrics, MetricsData,
    PersistenceError,
};
use chrono::{DateTime, Utc};
use dialect::{Dialect, QueryBuilder};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::path::Path;

/// A run as read back from storage
#[derive(Clone, Debug, PartialEq)]
pub struct StoredRun {
    pub run_id: i64,
    pub duration_ms: u64,
    pub codebase: CodebaseMetrics,
}

/// One history sample: the requested metric values of a single run
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryPoint {
    pub run_id: i64,
    pub calculated_at: DateTime<Utc>,
    pub values: HashMap<String, f64>,
}

/// Metric names servable by `get_metrics_history`, each mapped to its
/// `codebase_metrics` column
const HISTORY_METRICS: &[(&str, &str)] = &[
    ("total_files", "total_files"),
    ("total_lines", "total_lines"),
    ("source_lines", "source_lines"),
    ("total_cyclomatic_complexity", "total_cyclomatic_complexity"),
    ("total_halstead_volume", "total_halstead_volume"),
    (
        "average_cyclomatic_complexity",
        "average_cyclomatic_complexity",
    ),
    (
        "average_maintainability_index",
        "average_maintainability_index",
    ),
];

/// SQLite-backed store for historical metrics snapshots
pub struct MetricsStore {
    conn: Connection,
    builder: QueryBuilder,
}

impl MetricsStore {
    /// Open (or create) a store at `path`
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        Self::init(Connection::open(path)?)
    }

    /// An in-memory store, for tests and ephemeral runs
    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, PersistenceError> {
        let builder = QueryBuilder::new(Dialect::Sqlite);
        conn.execute_batch(&schema::ddl(builder.dialect()))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, builder })
    }

    pub fn dialect(&self) -> Dialect {
        self.builder.dialect()
    }

    /// Persist one completed run. Parent rows go first and their ids are
    /// threaded into every child insert; the whole run commits or rolls
    /// back together.
    pub fn store_metrics_data(&mut self, data: &MetricsData) -> Result<i64, PersistenceError> {
        let builder = self.builder;
        let tx = self.conn.transaction()?;

        let codebase_id = insert_codebase(&tx, &builder, data)?;

        // Deterministic insert order regardless of map iteration
        let mut paths: Vec<_> = data.file_metrics.keys().collect();
        paths.sort();

        for path in paths {
            let file = &data.file_metrics[path];
            let file_id = insert_file(&tx, &builder, codebase_id, file)?;
            for class in &file.classes {
                let halstead_id = insert_halstead(&tx, &builder, &class.halstead)?;
                insert_class(&tx, &builder, file_id, halstead_id, class)?;
            }
            for function in &file.functions {
                let halstead_id = insert_halstead(&tx, &builder, &function.halstead)?;
                insert_function(&tx, &builder, file_id, halstead_id, function)?;
            }
        }

        for diagnostic in data.errors.iter().chain(&data.warnings) {
            insert_diagnostic(&tx, &builder, codebase_id, diagnostic)?;
        }

        tx.commit()?;
        log::debug!(
            "Stored run {codebase_id} for project '{}'",
            data.codebase.project_name
        );
        Ok(codebase_id)
    }

    /// Most recent stored run for a project, None when the project has
    /// never been stored
    pub fn get_latest_metrics(
        &self,
        project: &str,
    ) -> Result<Option<StoredRun>, PersistenceError> {
        let sql = self.builder.select_latest(
            "codebase_metrics",
            &[
                "id",
                "project_name",
                "revision",
                "total_files",
                "total_functions",
                "total_classes",
                "total_lines",
                "logical_lines",
                "source_lines",
                "comment_lines",
                "blank_lines",
                "total_cyclomatic_complexity",
                "total_halstead_volume",
                "average_cyclomatic_complexity",
                "average_maintainability_index",
                "language_distribution",
                "files_with_dead_code",
                "test_file_count",
                "duration_ms",
                "calculated_at",
            ],
        );

        let row = self
            .conn
            .query_row(&sql, params![project], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, i64>(9)?,
                    row.get::<_, i64>(10)?,
                    row.get::<_, i64>(11)?,
                    row.get::<_, f64>(12)?,
                    row.get::<_, f64>(13)?,
                    row.get::<_, f64>(14)?,
                    row.get::<_, String>(15)?,
                    row.get::<_, i64>(16)?,
                    row.get::<_, i64>(17)?,
                    row.get::<_, i64>(18)?,
                    row.get::<_, String>(19)?,
                ))
            })
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut codebase = CodebaseMetrics::new(row.1);
        codebase.revision = row.2;
        codebase.total_files = row.3 as usize;
        codebase.total_functions = row.4 as usize;
        codebase.total_classes = row.5 as usize;
        codebase.lines.total = row.6 as usize;
        codebase.lines.logical = row.7 as usize;
        codebase.lines.source = row.8 as usize;
        codebase.lines.comment = row.9 as usize;
        codebase.lines.blank = row.10 as usize;
        codebase.total_cyclomatic_complexity = row.11 as u64;
        codebase.total_halstead_volume = row.12;
        codebase.average_cyclomatic_complexity = row.13;
        codebase.average_maintainability_index = row.14;
        codebase.language_distribution = serde_json::from_str(&row.15)?;
        codebase.files_with_dead_code = row.16 as usize;
        codebase.test_file_count = row.17 as usize;
        codebase.calculated_at = parse_timestamp(&row.19, "codebase_metrics")?;

        Ok(Some(StoredRun {
            run_id: row.0,
            duration_ms: row.18 as u64,
            codebase,
        }))
    }

    /// Per-run values of selected codebase metrics inside a trailing day
    /// window, oldest first. `metric_names` restricts the sampled set;
    /// None samples every known metric. Unknown names are ignored.
    pub fn get_metrics_history(
        &self,
        project: &str,
        window_days: u32,
        metric_names: Option<&[&str]>,
    ) -> Result<Vec<HistoryPoint>, PersistenceError> {
        let selected: Vec<(&str, &str)> = match metric_names {
            Some(names) => HISTORY_METRICS
                .iter()
                .filter(|(name, _)| names.contains(name))
                .copied()
                .collect(),
            None => HISTORY_METRICS.to_vec(),
        };

        let mut columns = vec!["id", "calculated_at"];
        columns.extend(selected.iter().map(|(_, column)| *column));
        let sql = self.builder.select_history("codebase_metrics", &columns);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![project, i64::from(window_days)], |row| {
            let run_id: i64 = row.get(0)?;
            let calculated_at: String = row.get(1)?;
            let mut values = HashMap::new();
            for (offset, (name, _)) in selected.iter().enumerate() {
                values.insert((*name).to_string(), row.get::<_, f64>(2 + offset)?);
            }
            Ok((run_id, calculated_at, values))
        })?;

        let mut points = Vec::new();
        for row in rows {
            let (run_id, calculated_at, values) = row?;
            points.push(HistoryPoint {
                run_id,
                calculated_at: parse_timestamp(&calculated_at, "codebase_metrics")?,
                values,
            });
        }
        Ok(points)
    }
}

fn parse_timestamp(value: &str, table: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::InvalidValue {
            table: table.to_string(),
            column: "calculated_at".to_string(),
            message: e.to_string(),
        })
}

fn insert_codebase(
    tx: &Transaction<'_>,
    builder: &QueryBuilder,
    data: &MetricsData,
) -> Result<i64, PersistenceError> {
    let codebase = &data.codebase;
    let sql = builder.insert(
        "codebase_metrics",
        &[
            "project_name",
            "revision",
            "total_files",
            "total_functions",
            "total_classes",
            "total_lines",
            "logical_lines",
            "source_lines",
            "comment_lines",
            "blank_lines",
            "total_cyclomatic_complexity",
            "total_halstead_volume",
            "average_cyclomatic_complexity",
            "average_maintainability_index",
            "language_distribution",
            "files_with_dead_code",
            "test_file_count",
            "duration_ms",
            "calculated_at",
        ],
    );
    tx.execute(
        &sql,
        params![
            codebase.project_name,
            codebase.revision,
            codebase.total_files as i64,
            codebase.total_functions as i64,
            codebase.total_classes as i64,
            codebase.lines.total as i64,
            codebase.lines.logical as i64,
            codebase.lines.source as i64,
            codebase.lines.comment as i64,
            codebase.lines.blank as i64,
            codebase.total_cyclomatic_complexity as i64,
            codebase.total_halstead_volume,
            codebase.average_cyclomatic_complexity,
            codebase.average_maintainability_index,
            serde_json::to_string(&codebase.language_distribution)?,
            codebase.files_with_dead_code as i64,
            codebase.test_file_count as i64,
            data.duration_ms as i64,
            codebase.calculated_at.to_rfc3339(),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_file(
    tx: &Transaction<'_>,
    builder: &QueryBuilder,
    codebase_id: i64,
    file: &FileMetrics,
) -> Result<i64, PersistenceError> {
    let sql = builder.insert(
        "file_metrics",
        &[
            "codebase_id",
            "path",
            "language",
            "cyclomatic",
            "halstead_volume",
            "maintainability_index",
            "total_lines",
            "logical_lines",
            "source_lines",
            "comment_lines",
            "blank_lines",
            "class_count",
            "function_count",
            "import_count",
            "global_var_count",
            "interface_count",
            "has_dead_code",
            "is_test_file",
            "test_coverage_estimate",
        ],
    );
    tx.execute(
        &sql,
        params![
            codebase_id,
            file.path.display().to_string(),
            file.language.to_string(),
            i64::from(file.cyclomatic),
            file.halstead.volume(),
            file.maintainability_index,
            file.lines.total as i64,
            file.lines.logical as i64,
            file.lines.source as i64,
            file.lines.comment as i64,
            file.lines.blank as i64,
            file.class_count as i64,
            file.function_count as i64,
            file.import_count as i64,
            file.global_var_count as i64,
            file.interface_count as i64,
            file.has_dead_code,
            file.is_test_file,
            file.test_coverage_estimate,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_halstead(
    tx: &Transaction<'_>,
    builder: &QueryBuilder,
    halstead: &HalsteadMetrics,
) -> Result<i64, PersistenceError> {
    let sql = builder.insert(
        "halstead_metrics",
        &[
            "distinct_operators",
            "distinct_operands",
            "total_operators",
            "total_operands",
            "volume",
            "difficulty",
            "effort",
        ],
    );
    tx.execute(
        &sql,
        params![
            halstead.distinct_operators as i64,
            halstead.distinct_operands as i64,
            halstead.total_operators as i64,
            halstead.total_operands as i64,
            halstead.volume(),
            halstead.difficulty(),
            halstead.effort(),
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_class(
    tx: &Transaction<'_>,
    builder: &QueryBuilder,
    file_id: i64,
    halstead_id: i64,
    class: &crate::core::ClassMetrics,
) -> Result<i64, PersistenceError> {
    let sql = builder.insert(
        "class_metrics",
        &[
            "file_id",
            "halstead_id",
            "name",
            "start_line",
            "end_line",
            "cyclomatic",
            "maintainability_index",
            "total_lines",
            "logical_lines",
            "source_lines",
            "comment_lines",
            "blank_lines",
            "method_count",
            "attribute_count",
            "depth_of_inheritance",
            "number_of_children",
            "has_dead_methods",
        ],
    );
    tx.execute(
        &sql,
        params![
            file_id,
            halstead_id,
            class.name,
            class.start_line as i64,
            class.end_line as i64,
            i64::from(class.cyclomatic),
            class.maintainability_index,
            class.lines.total as i64,
            class.lines.logical as i64,
            class.lines.source as i64,
            class.lines.comment as i64,
            class.lines.blank as i64,
            class.method_count as i64,
            class.attribute_count as i64,
            i64::from(class.depth_of_inheritance),
            class.number_of_children as i64,
            class.has_dead_methods,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_function(
    tx: &Transaction<'_>,
    builder: &QueryBuilder,
    file_id: i64,
    halstead_id: i64,
    function: &crate::core::FunctionMetrics,
) -> Result<i64, PersistenceError> {
    let sql = builder.insert(
        "function_metrics",
        &[
            "file_id",
            "halstead_id",
            "name",
            "start_line",
            "end_line",
            "cyclomatic",
            "maintainability_index",
            "total_lines",
            "logical_lines",
            "source_lines",
            "comment_lines",
            "blank_lines",
            "parameter_count",
            "nesting_depth",
            "is_recursive",
            "is_dead",
            "has_unused_params",
            "call_site_count",
            "dependency_count",
        ],
    );
    tx.execute(
        &sql,
        params![
            file_id,
            halstead_id,
            function.name,
            function.start_line as i64,
            function.end_line as i64,
            i64::from(function.cyclomatic),
            function.maintainability_index,
            function.lines.total as i64,
            function.lines.logical as i64,
            function.lines.source as i64,
            function.lines.comment as i64,
            function.lines.blank as i64,
            function.parameter_count as i64,
            i64::from(function.nesting_depth),
            function.is_recursive,
            function.is_dead,
            function.has_unused_params,
            function.call_site_count as i64,
            function.dependency_count as i64,
        ],
    )?;
    Ok(tx.last_insert_rowid())
}

fn insert_diagnostic(
    tx: &Transaction<'_>,
    builder: &QueryBuilder,
    codebase_id: i64,
    diagnostic: &Diagnostic,
) -> Result<(), PersistenceError> {
    let sql = builder.insert(
        "run_diagnostics",
        &["codebase_id", "severity", "calculator", "entity", "message"],
    );
    let severity = match diagnostic.severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
    };
    tx.execute(
        &sql,
        params![
            codebase_id,
            severity,
            diagnostic.calculator,
            diagnostic.entity,
            diagnostic.message,
        ],
    )?;
    Ok(())
}
