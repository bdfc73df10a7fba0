//! SQL dialect abstraction for the metrics schema.
//!
//! The logical schema is identical across backends; what varies is
//! parameter placeholder style, how generated ids are retrieved, the
//! auto-increment primary-key clause, and date-interval arithmetic for
//! history windows. Those differences live here, behind a query builder
//! chosen once at store construction.

/// Supported SQL dialects
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    Mysql,
}

/// How a backend hands back the id of an inserted row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdStrategy {
    /// `last_insert_rowid()` after the insert
    LastInsertRowid,
    /// `RETURNING id` on the insert statement
    ReturningClause,
    /// `LAST_INSERT_ID()` after the insert
    LastInsertIdFunction,
}

impl Dialect {
    /// Positional parameter placeholder, 1-based
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Postgres => format!("${index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    pub fn id_strategy(&self) -> IdStrategy {
        match self {
            Dialect::Sqlite => IdStrategy::LastInsertRowid,
            Dialect::Postgres => IdStrategy::ReturningClause,
            Dialect::Mysql => IdStrategy::LastInsertIdFunction,
        }
    }

    /// Auto-increment integer primary key clause
    pub fn primary_key_clause(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
            Dialect::Postgres => "BIGSERIAL PRIMARY KEY",
            Dialect::Mysql => "BIGINT PRIMARY KEY AUTO_INCREMENT",
        }
    }

    /// Predicate limiting `column` to the trailing day window given by the
    /// parameter at `index`
    pub fn history_window_predicate(&self, column: &str, index: usize) -> String {
        let param = self.placeholder(index);
        match self {
            Dialect::Sqlite => {
                format!("datetime({column}) >= datetime('now', '-' || {param} || ' days')")
            }
            Dialect::Postgres => {
                format!("{column} >= NOW() - ({param} || ' days')::interval")
            }
            Dialect::Mysql => {
                format!("{column} >= DATE_SUB(NOW(), INTERVAL {param} DAY)")
            }
        }
    }
}

/// Renders dialect-correct SQL strings for the metrics schema
#[derive(Clone, Copy, Debug)]
pub struct QueryBuilder {
    dialect: Dialect,
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `INSERT INTO table (cols...) VALUES (placeholders...)`, with a
    /// `RETURNING id` suffix where that is the id strategy
    pub fn insert(&self, table: &str, columns: &[&str]) -> String {
        let placeholders: Vec<String> = (1..=columns.len())
            .map(|i| self.dialect.placeholder(i))
            .collect();
        let mut sql = format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );
        if self.dialect.id_strategy() == IdStrategy::ReturningClause {
            sql.push_str(" RETURNING id");
        }
        sql
    }

    /// Latest run for a project, newest `calculated_at` first
    pub fn select_latest(&self, table: &str, columns: &[&str]) -> String {
        format!(
            "SELECT {} FROM {table} WHERE project_name = {} \
             ORDER BY calculated_at DESC, id DESC LIMIT 1",
            columns.join(", "),
            self.dialect.placeholder(1)
        )
    }

    /// Runs for a project inside a trailing day window, oldest first.
    /// Parameter 1 is the project name, parameter 2 the window in days.
    pub fn select_history(&self, table: &str, columns: &[&str]) -> String {
        format!(
            "SELECT {} FROM {table} WHERE project_name = {} AND {} \
             ORDER BY calculated_at ASC, id ASC",
            columns.join(", "),
            self.dialect.placeholder(1),
            self.dialect
                .history_window_predicate("calculated_at", 2)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_styles() {
        assert_eq!(Dialect::Sqlite.placeholder(3), "?3");
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Mysql.placeholder(3), "?");
    }

    #[test]
    fn insert_for_sqlite() {
        let builder = QueryBuilder::new(Dialect::Sqlite);
        assert_eq!(
            builder.insert("halstead_metrics", &["a", "b"]),
            "INSERT INTO halstead_metrics (a, b) VALUES (?1, ?2)"
        );
    }

    #[test]
    fn insert_for_postgres_appends_returning() {
        let builder = QueryBuilder::new(Dialect::Postgres);
        let sql = builder.insert("codebase_metrics", &["project_name"]);
        assert_eq!(
            sql,
            "INSERT INTO codebase_metrics (project_name) VALUES ($1) RETURNING id"
        );
    }

    #[test]
    fn insert_for_mysql_uses_anonymous_placeholders() {
        let builder = QueryBuilder::new(Dialect::Mysql);
        let sql = builder.insert("t", &["a", "b", "c"]);
        assert_eq!(sql, "INSERT INTO t (a, b, c) VALUES (?, ?, ?)");
    }

    #[test]
    fn history_window_per_dialect() {
        assert!(Dialect::Sqlite
            .history_window_predicate("calculated_at", 2)
            .contains("datetime('now'"));
        assert!(Dialect::Postgres
            .history_window_predicate("calculated_at", 2)
            .contains("::interval"));
        assert!(Dialect::Mysql
            .history_window_predicate("calculated_at", 2)
            .contains("DATE_SUB"));
    }

    #[test]
    fn id_strategies() {
        assert_eq!(Dialect::Sqlite.id_strategy(), IdStrategy::LastInsertRowid);
        assert_eq!(Dialect::Postgres.id_strategy(), IdStrategy::ReturningClause);
        assert_eq!(
            Dialect::Mysql.id_strategy(),
            IdStrategy::LastInsertIdFunction
        );
    }
}
