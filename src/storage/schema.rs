//! The normalized metrics schema.
//!
//! Six tables, parent before child: `codebase_metrics` is the root row
//! for one run; `file_metrics` hangs off it; `class_metrics` and
//! `function_metrics` hang off their file and each reference their own
//! `halstead_metrics` row; `run_diagnostics` preserves the run's
//! consolidated error/warning lists. Rows are immutable historical
//! snapshots: a new run always inserts, never overwrites.

use super::dialect::Dialect;

/// Full DDL for the metrics schema in the given dialect
pub fn ddl(dialect: Dialect) -> String {
    let pk = dialect.primary_key_clause();
    format!(
        r#"
CREATE TABLE IF NOT EXISTS codebase_metrics (
    id {pk},
    project_name TEXT NOT NULL,
    revision TEXT,
    total_files INTEGER NOT NULL,
    total_functions INTEGER NOT NULL,
    total_classes INTEGER NOT NULL,
    total_lines INTEGER NOT NULL,
    logical_lines INTEGER NOT NULL,
    source_lines INTEGER NOT NULL,
    comment_lines INTEGER NOT NULL,
    blank_lines INTEGER NOT NULL,
    total_cyclomatic_complexity INTEGER NOT NULL,
    total_halstead_volume REAL NOT NULL,
    average_cyclomatic_complexity REAL NOT NULL,
    average_maintainability_index REAL NOT NULL,
    language_distribution TEXT NOT NULL,
    files_with_dead_code INTEGER NOT NULL,
    test_file_count INTEGER NOT NULL,
    duration_ms INTEGER NOT NULL,
    calculated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_codebase_project
    ON codebase_metrics (project_name, calculated_at);

CREATE TABLE IF NOT EXISTS file_metrics (
    id {pk},
    codebase_id INTEGER NOT NULL REFERENCES codebase_metrics (id),
    path TEXT NOT NULL,
    language TEXT NOT NULL,
    cyclomatic INTEGER NOT NULL,
    halstead_volume REAL NOT NULL,
    maintainability_index REAL NOT NULL,
    total_lines INTEGER NOT NULL,
    logical_lines INTEGER NOT NULL,
    source_lines INTEGER NOT NULL,
    comment_lines INTEGER NOT NULL,
    blank_lines INTEGER NOT NULL,
    class_count INTEGER NOT NULL,
    function_count INTEGER NOT NULL,
    import_count INTEGER NOT NULL,
    global_var_count INTEGER NOT NULL,
    interface_count INTEGER NOT NULL,
    has_dead_code INTEGER NOT NULL,
    is_test_file INTEGER NOT NULL,
    test_coverage_estimate REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_file_codebase ON file_metrics (codebase_id);

CREATE TABLE IF NOT EXISTS halstead_metrics (
    id {pk},
    distinct_operators INTEGER NOT NULL,
    distinct_operands INTEGER NOT NULL,
    total_operators INTEGER NOT NULL,
    total_operands INTEGER NOT NULL,
    volume REAL NOT NULL,
    difficulty REAL NOT NULL,
    effort REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS class_metrics (
    id {pk},
    file_id INTEGER NOT NULL REFERENCES file_metrics (id),
    halstead_id INTEGER NOT NULL REFERENCES halstead_metrics (id),
    name TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    cyclomatic INTEGER NOT NULL,
    maintainability_index REAL NOT NULL,
    total_lines INTEGER NOT NULL,
    logical_lines INTEGER NOT NULL,
    source_lines INTEGER NOT NULL,
    comment_lines INTEGER NOT NULL,
    blank_lines INTEGER NOT NULL,
    method_count INTEGER NOT NULL,
    attribute_count INTEGER NOT NULL,
    depth_of_inheritance INTEGER NOT NULL,
    number_of_children INTEGER NOT NULL,
    has_dead_methods INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_class_file ON class_metrics (file_id);

CREATE TABLE IF NOT EXISTS function_metrics (
    id {pk},
    file_id INTEGER NOT NULL REFERENCES file_metrics (id),
    halstead_id INTEGER NOT NULL REFERENCES halstead_metrics (id),
    name TEXT NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    cyclomatic INTEGER NOT NULL,
    maintainability_index REAL NOT NULL,
    total_lines INTEGER NOT NULL,
    logical_lines INTEGER NOT NULL,
    source_lines INTEGER NOT NULL,
    comment_lines INTEGER NOT NULL,
    blank_lines INTEGER NOT NULL,
    parameter_count INTEGER NOT NULL,
    nesting_depth INTEGER NOT NULL,
    is_recursive INTEGER NOT NULL,
    is_dead INTEGER NOT NULL,
    has_unused_params INTEGER NOT NULL,
    call_site_count INTEGER NOT NULL,
    dependency_count INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_function_file ON function_metrics (file_id);

CREATE TABLE IF NOT EXISTS run_diagnostics (
    id {pk},
    codebase_id INTEGER NOT NULL REFERENCES codebase_metrics (id),
    severity TEXT NOT NULL,
    calculator TEXT,
    entity TEXT,
    message TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_diagnostics_codebase
    ON run_diagnostics (codebase_id);
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_names_all_six_tables() {
        let ddl = ddl(Dialect::Sqlite);
        for table in [
            "codebase_metrics",
            "file_metrics",
            "halstead_metrics",
            "class_metrics",
            "function_metrics",
            "run_diagnostics",
        ] {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {table}")));
        }
    }

    #[test]
    fn dialect_controls_primary_key_clause() {
        assert!(ddl(Dialect::Sqlite).contains("INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(ddl(Dialect::Postgres).contains("BIGSERIAL PRIMARY KEY"));
        assert!(ddl(Dialect::Mysql).contains("BIGINT PRIMARY KEY AUTO_INCREMENT"));
    }
}
