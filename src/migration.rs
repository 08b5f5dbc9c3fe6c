//! Table synchronization: create missing tables and indexes, add missing columns, report type drift.
//!
//! Statements run one by one without a transaction; a failure stops the table and keeps
//! whatever was already created. Existing columns are never altered.

use crate::db::{Database, LiveColumn};
use crate::dialect::Dialect;
use crate::error::DbError;
use crate::schema::{IndexDescriptor, IndexKind, KindCategory, TableDescriptor};
use serde::Serialize;

/// A live column whose type family differs from what the descriptor declares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SchemaDrift {
    pub table: String,
    pub column: String,
    pub expected: KindCategory,
    pub live: KindCategory,
    /// Type name the driver reported.
    pub live_type: String,
}

/// What one synchronization did to one table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub table: String,
    pub created: bool,
    /// DDL statements executed, in order.
    pub statements: Vec<String>,
    pub drift: Vec<SchemaDrift>,
}

impl SyncReport {
    /// Nothing was executed.
    pub fn is_noop(&self) -> bool {
        self.statements.is_empty()
    }
}

/// `SELECT * FROM t WHERE 1=0`: prepared to check existence and read the live columns.
pub fn existence_sql(dialect: &dyn Dialect, table: &str) -> String {
    format!("SELECT * FROM {} WHERE 1=0", dialect.quote_ident(table))
}

/// `CREATE TABLE IF NOT EXISTS` with every column in declaration order and the primary
/// index, if any, as a table constraint.
pub fn create_table_sql(dialect: &dyn Dialect, table: &TableDescriptor) -> String {
    let mut clauses: Vec<String> = table.columns.iter().map(|c| dialect.column_definition(c)).collect();
    if let Some(primary) = table.primary_index() {
        clauses.push(format!("PRIMARY KEY ({})", quoted_list(dialect, &primary.columns, ", ")));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {}(\n{}\n)",
        dialect.quote_ident(&table.name),
        clauses.join(",\n")
    )
}

/// `CREATE [UNIQUE] INDEX name ON table (c1,c2)`.
pub fn create_index_sql(dialect: &dyn Dialect, table: &str, index: &IndexDescriptor) -> String {
    let kind = match index.kind {
        IndexKind::Unique => "UNIQUE INDEX",
        IndexKind::Plain | IndexKind::Primary => "INDEX",
    };
    format!(
        "CREATE {} {} ON {} ({})",
        kind,
        dialect.quote_ident(&index.name),
        dialect.quote_ident(table),
        quoted_list(dialect, &index.columns, ",")
    )
}

/// Every index statement for a new table; the primary index lives in CREATE TABLE.
pub fn create_index_sqls(dialect: &dyn Dialect, table: &TableDescriptor) -> Vec<String> {
    table
        .secondary_indexes()
        .map(|index| create_index_sql(dialect, &table.name, index))
        .collect()
}

pub fn add_column_sql(dialect: &dyn Dialect, table: &str, column: &crate::schema::ColumnDescriptor) -> String {
    format!("ALTER TABLE {} ADD {}", dialect.quote_ident(table), dialect.column_definition(column))
}

fn quoted_list(dialect: &dyn Dialect, columns: &[String], sep: &str) -> String {
    columns.iter().map(|c| dialect.quote_ident(c)).collect::<Vec<_>>().join(sep)
}

/// Compare descriptor columns with live ones: statements for missing columns, drift for
/// present columns of another type family.
pub fn diff_columns(
    dialect: &dyn Dialect,
    table: &TableDescriptor,
    live: &[LiveColumn],
) -> (Vec<String>, Vec<SchemaDrift>) {
    let mut statements = Vec::new();
    let mut drift = Vec::new();
    for column in &table.columns {
        let Some(live_column) = live.iter().find(|l| l.name.eq_ignore_ascii_case(&column.name)) else {
            statements.push(add_column_sql(dialect, &table.name, column));
            continue;
        };
        let (Some(expected), Some(found)) = (
            column.storage_category(),
            KindCategory::of_sql_type(&live_column.type_name),
        ) else {
            continue;
        };
        if expected != found {
            drift.push(SchemaDrift {
                table: table.name.clone(),
                column: column.name.clone(),
                expected,
                live: found,
                live_type: live_column.type_name.clone(),
            });
        }
    }
    (statements, drift)
}

/// Create the table if it does not exist, otherwise add the columns it lacks.
/// Running it twice against an unchanged database executes nothing the second time.
pub async fn synchronize(db: &Database, table: &TableDescriptor) -> Result<SyncReport, DbError> {
    let dialect = db.dialect();
    let mut report = SyncReport {
        table: table.name.clone(),
        ..Default::default()
    };

    match db.live_columns(&table.name).await {
        Err(e) if dialect.is_missing_table(&e) => {
            let mut statements = vec![create_table_sql(dialect, table)];
            statements.extend(create_index_sqls(dialect, table));
            for sql in statements {
                db.execute(&sql).await.map_err(|e| DbError::ddl(&table.name, &sql, e))?;
                report.statements.push(sql);
            }
            report.created = true;
            tracing::info!(table = %table.name, indexes = table.indexes.len(), "created table");
        }
        Err(e) => return Err(DbError::query(existence_sql(dialect, &table.name), e)),
        Ok(live) => {
            let (statements, drift) = diff_columns(dialect, table, &live);
            for sql in statements {
                db.execute(&sql).await.map_err(|e| DbError::ddl(&table.name, &sql, e))?;
                tracing::info!(table = %table.name, sql = %sql, "added column");
                report.statements.push(sql);
            }
            for d in &drift {
                tracing::warn!(
                    table = %d.table,
                    column = %d.column,
                    expected = ?d.expected,
                    live = ?d.live,
                    live_type = %d.live_type,
                    "column type differs from descriptor; leaving it unchanged"
                );
            }
            report.drift = drift;
        }
    }
    Ok(report)
}

/// Synchronize every descriptor in order. Stops at the first failure.
pub async fn apply_migrations(db: &Database, tables: &[TableDescriptor]) -> Result<Vec<SyncReport>, DbError> {
    let mut reports = Vec::with_capacity(tables.len());
    for table in tables {
        reports.push(synchronize(db, table).await?);
    }
    let created = reports.iter().filter(|r| r.created).count();
    let altered = reports.iter().filter(|r| !r.created && !r.is_noop()).count();
    tracing::info!(tables = tables.len(), created, altered, "schema synchronized");
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MysqlDialect, PostgresDialect, SqliteDialect};
    use crate::schema::FieldDef;

    fn test_table() -> TableDescriptor {
        TableDescriptor::extract(
            "test",
            &[
                FieldDef::string("A"),
                FieldDef::integer("B"),
                FieldDef::blob("C"),
                FieldDef::timestamp("D"),
                FieldDef::string("E").optional(),
                FieldDef::string("F").tag("type:text length:15 default:'aa'"),
            ],
        )
        .unwrap()
    }

    fn indexed_table() -> TableDescriptor {
        TableDescriptor::extract(
            "test",
            &[
                FieldDef::integer("ID"),
                FieldDef::string("A").tag("index:a_b,unique"),
                FieldDef::string("B").tag("index:a_b"),
                FieldDef::string("C").tag("index:c"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn create_table_mysql() {
        assert_eq!(
            create_table_sql(&MysqlDialect, &test_table()),
            "CREATE TABLE IF NOT EXISTS `test`(\n\
             `a` VARCHAR(255) NOT NULL DEFAULT '',\n\
             `b` INT(11) NOT NULL DEFAULT '0',\n\
             `c` TEXT NOT NULL,\n\
             `d` DATETIME NOT NULL,\n\
             `e` VARCHAR(255) NULL,\n\
             `f` TEXT(15) NOT NULL DEFAULT 'aa'\n)"
        );
    }

    #[test]
    fn create_table_postgres() {
        assert_eq!(
            create_table_sql(&PostgresDialect, &test_table()),
            "CREATE TABLE IF NOT EXISTS \"test\"(\n\
             \"a\" VARCHAR(255) NOT NULL DEFAULT '',\n\
             \"b\" INTEGER NOT NULL DEFAULT '0',\n\
             \"c\" TEXT NOT NULL,\n\
             \"d\" TIMESTAMP NOT NULL,\n\
             \"e\" VARCHAR(255) NULL,\n\
             \"f\" TEXT(15) NOT NULL DEFAULT 'aa'\n)"
        );
    }

    #[test]
    fn create_table_sqlite_with_auto_id() {
        let t = TableDescriptor::extract("room", &[FieldDef::integer("Id"), FieldDef::string("RoomName")]).unwrap();
        assert_eq!(
            create_table_sql(&SqliteDialect, &t),
            "CREATE TABLE IF NOT EXISTS \"room\"(\n\
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT,\n\
             \"room_name\" VARCHAR(255) NOT NULL DEFAULT ''\n)"
        );
    }

    #[test]
    fn index_statements() {
        assert_eq!(
            create_index_sqls(&MysqlDialect, &indexed_table()),
            ["CREATE UNIQUE INDEX `a_b` ON `test` (`a`,`b`)", "CREATE INDEX `c` ON `test` (`c`)"]
        );
        assert_eq!(
            create_index_sqls(&PostgresDialect, &indexed_table())[0],
            "CREATE UNIQUE INDEX \"a_b\" ON \"test\" (\"a\",\"b\")"
        );
    }

    #[test]
    fn primary_index_becomes_table_constraint() {
        let t = TableDescriptor::extract(
            "member",
            &[
                FieldDef::integer("RoomId").tag("index:pk,primary"),
                FieldDef::integer("Uid").tag("index:pk"),
            ],
        )
        .unwrap();
        let sql = create_table_sql(&MysqlDialect, &t);
        assert!(sql.ends_with(",\nPRIMARY KEY (`room_id`, `uid`)\n)"), "{sql}");
        assert!(create_index_sqls(&MysqlDialect, &t).is_empty());
    }

    #[test]
    fn diff_adds_missing_columns_only() {
        let t = test_table();
        let live: Vec<LiveColumn> = ["a", "b", "c", "d"]
            .iter()
            .zip(["TEXT", "INTEGER", "TEXT", "DATETIME"])
            .map(|(n, ty)| LiveColumn {
                name: n.to_string(),
                type_name: ty.to_string(),
            })
            .collect();
        let (statements, drift) = diff_columns(&SqliteDialect, &t, &live);
        assert_eq!(
            statements,
            [
                "ALTER TABLE \"test\" ADD \"e\" VARCHAR(255) NULL",
                "ALTER TABLE \"test\" ADD \"f\" TEXT(15) NOT NULL DEFAULT 'aa'",
            ]
        );
        assert!(drift.is_empty());
    }

    #[test]
    fn diff_reports_type_family_drift() {
        let t = TableDescriptor::extract("t", &[FieldDef::integer("B"), FieldDef::float("P")]).unwrap();
        let live = vec![
            LiveColumn {
                name: "b".into(),
                type_name: "VARCHAR".into(),
            },
            LiveColumn {
                name: "p".into(),
                type_name: "NULL".into(),
            },
        ];
        let (statements, drift) = diff_columns(&MysqlDialect, &t, &live);
        assert!(statements.is_empty());
        assert_eq!(
            drift,
            [SchemaDrift {
                table: "t".into(),
                column: "b".into(),
                expected: KindCategory::Number,
                live: KindCategory::String,
                live_type: "VARCHAR".into(),
            }]
        );
    }
}
