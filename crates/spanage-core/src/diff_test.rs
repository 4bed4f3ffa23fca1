use super::*;
use crate::live::{inspect, CatalogTable};
use crate::LEDGER_TABLE;

// ── Helpers ────────────────────────────────────────────────────────────

fn column(name: &str, ty: &str) -> ColumnDdl {
    ColumnDdl {
        name: name.to_string(),
        ddl: format!("{} {}", name, ty),
    }
}

fn index(name: &str, table: &str, cols: &str) -> IndexDdl {
    IndexDdl {
        name: name.to_string(),
        ddl: format!("CREATE INDEX {} ON {}({})", name, table, cols),
    }
}

fn table(name: &str, columns: Vec<ColumnDdl>, ddl: &str, indexes: Vec<IndexDdl>) -> TableDdl {
    TableDdl {
        name: name.to_string(),
        columns,
        ddl: ddl.to_string(),
        indexes,
    }
}

fn singers_v1() -> TableDdl {
    table(
        "Singers",
        vec![
            column("SingerId", "INT64 NOT NULL"),
            column("FirstName", "STRING(1024)"),
        ],
        "PRIMARY KEY(SingerId)",
        vec![],
    )
}

fn singers_v2() -> TableDdl {
    let mut t = singers_v1();
    t.columns.push(column("LastName", "STRING(1024)"));
    t.indexes.push(index("SingersByLastName", "Singers", "LastName"));
    t
}

fn albums() -> TableDdl {
    table(
        "Albums",
        vec![
            column("SingerId", "INT64 NOT NULL"),
            column("AlbumId", "INT64 NOT NULL"),
            column("AlbumTitle", "STRING(MAX)"),
        ],
        "PRIMARY KEY(SingerId, AlbumId), INTERLEAVE IN PARENT Singers ON DELETE CASCADE",
        vec![index("AlbumsByAlbumTitle", "Albums", "AlbumTitle")],
    )
}

fn schema(tables: Vec<TableDdl>) -> SchemaDdl {
    SchemaDdl { tables }
}

fn live(rows: Vec<CatalogTable>) -> LiveSchema {
    inspect(rows, LEDGER_TABLE).unwrap()
}

fn position(statements: &[String], needle: &str) -> usize {
    statements
        .iter()
        .position(|s| s == needle)
        .unwrap_or_else(|| panic!("statement not found: {needle}\n{statements:#?}"))
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn test_create_table_on_empty_database() {
    let diff = diff_schema(&LiveSchema::default(), &schema(vec![singers_v1()]));

    assert_eq!(
        diff.statements(),
        vec![
            "CREATE TABLE Singers (SingerId INT64 NOT NULL, FirstName STRING(1024)) PRIMARY KEY(SingerId)"
        ]
    );
}

#[test]
fn test_create_table_without_trailing_fragment() {
    let t = table("Events", vec![column("id", "BIGINT")], "", vec![]);
    let diff = diff_schema(&LiveSchema::default(), &schema(vec![t]));

    assert_eq!(diff.statements(), vec!["CREATE TABLE Events (id BIGINT)"]);
}

#[test]
fn test_new_table_indexes_follow_create_in_declared_order() {
    let mut t = albums();
    t.indexes.push(index("AlbumsBySinger", "Albums", "SingerId"));
    let diff = diff_schema(&LiveSchema::default(), &schema(vec![singers_v1(), t]));

    let statements = diff.statements();
    assert_eq!(statements.len(), 4);
    assert!(statements[0].starts_with("CREATE TABLE Singers ("));
    assert!(statements[1].starts_with("CREATE TABLE Albums ("));
    assert_eq!(
        statements[2],
        "CREATE INDEX AlbumsByAlbumTitle ON Albums(AlbumTitle)"
    );
    assert_eq!(statements[3], "CREATE INDEX AlbumsBySinger ON Albums(SingerId)");
}

#[test]
fn test_add_column_then_add_index() {
    let current = live(vec![CatalogTable::stable(
        "Singers",
        ["SingerId", "FirstName"],
    )]);

    let diff = diff_schema(&current, &schema(vec![singers_v2()]));

    assert_eq!(
        diff.statements(),
        vec![
            "ALTER TABLE Singers ADD COLUMN LastName STRING(1024)",
            "CREATE INDEX SingersByLastName ON Singers(LastName)",
        ]
    );
}

#[test]
fn test_converged_schema_has_no_changes() {
    let current = live(vec![
        CatalogTable::stable("Singers", ["SingerId", "FirstName", "LastName"])
            .with_index("SingersByLastName"),
    ]);

    let diff = diff_schema(&current, &schema(vec![singers_v2()]));

    assert!(diff.is_empty());
    assert_eq!(diff.to_string(), "No changes detected.\n");
}

#[test]
fn test_changed_fragment_on_existing_column_is_ignored() {
    let current = live(vec![CatalogTable::stable(
        "Singers",
        ["SingerId", "FirstName"],
    )]);
    let mut t = singers_v1();
    t.columns[1].ddl = "FirstName STRING(MAX) NOT NULL".to_string();

    assert!(diff_schema(&current, &schema(vec![t])).is_empty());
}

#[test]
fn test_drop_index_precedes_drop_column() {
    let current = live(vec![
        CatalogTable::stable("Singers", ["SingerId", "FirstName", "LastName"])
            .with_index("SingersByLastName"),
    ]);

    let diff = diff_schema(&current, &schema(vec![singers_v1()]));

    assert_eq!(
        diff.statements(),
        vec![
            "DROP INDEX SingersByLastName",
            "ALTER TABLE Singers DROP COLUMN LastName",
        ]
    );
}

#[test]
fn test_reconcile_phases_are_ordered() {
    // Swap LastName for Nickname and swap the index covering it.
    let current = live(vec![
        CatalogTable::stable("Singers", ["SingerId", "FirstName", "LastName"])
            .with_index("SingersByLastName"),
    ]);
    let mut t = singers_v1();
    t.columns.push(column("Nickname", "STRING(64)"));
    t.indexes.push(index("SingersByNickname", "Singers", "Nickname"));

    let statements = diff_schema(&current, &schema(vec![t])).statements();

    assert_eq!(
        statements,
        vec![
            "DROP INDEX SingersByLastName",
            "ALTER TABLE Singers ADD COLUMN Nickname STRING(64)",
            "ALTER TABLE Singers DROP COLUMN LastName",
            "CREATE INDEX SingersByNickname ON Singers(Nickname)",
        ]
    );
    assert!(
        position(&statements, "DROP INDEX SingersByLastName")
            < position(&statements, "ALTER TABLE Singers DROP COLUMN LastName")
    );
    assert!(
        position(&statements, "ALTER TABLE Singers ADD COLUMN Nickname STRING(64)")
            < position(&statements, "CREATE INDEX SingersByNickname ON Singers(Nickname)")
    );
}

#[test]
fn test_revert_drops_extra_table_and_columns() {
    let current = live(vec![
        CatalogTable::stable("Singers", ["SingerId", "FirstName", "LastName"])
            .with_index("SingersByFirstName")
            .with_index("SingersByLastName"),
        CatalogTable::stable("Albums", ["SingerId", "AlbumId", "AlbumTitle"])
            .with_index("AlbumsByAlbumTitle"),
    ]);

    let statements = diff_schema(&current, &schema(vec![singers_v1()])).statements();

    assert_eq!(
        statements,
        vec![
            "DROP INDEX SingersByFirstName",
            "DROP INDEX SingersByLastName",
            "ALTER TABLE Singers DROP COLUMN LastName",
            "DROP INDEX AlbumsByAlbumTitle",
            "DROP TABLE Albums",
        ]
    );
}

#[test]
fn test_undeclared_tables_dropped_in_name_order() {
    let current = live(vec![
        CatalogTable::stable("Zebras", ["id"]),
        CatalogTable::stable("Albums", ["id"]).with_index("AlbumsById"),
    ]);

    let statements = diff_schema(&current, &SchemaDdl::default()).statements();

    assert_eq!(
        statements,
        vec!["DROP INDEX AlbumsById", "DROP TABLE Albums", "DROP TABLE Zebras"]
    );
}

#[test]
fn test_existing_table_gains_index_on_existing_column() {
    let current = live(vec![CatalogTable::stable(
        "Singers",
        ["SingerId", "FirstName"],
    )]);
    let mut t = singers_v1();
    t.indexes.push(index("SingersByFirstName", "Singers", "FirstName"));

    assert_eq!(
        diff_schema(&current, &schema(vec![t])).statements(),
        vec!["CREATE INDEX SingersByFirstName ON Singers(FirstName)"]
    );
}

#[test]
fn test_change_display() {
    let current = live(vec![
        CatalogTable::stable("Singers", ["SingerId", "FirstName", "Age"]).with_index("ByAge"),
        CatalogTable::stable("Old", ["id"]),
    ]);
    let diff = diff_schema(&current, &schema(vec![singers_v2(), albums()]));

    let rendered = diff.to_string();
    assert!(rendered.starts_with("Changes detected:\n"));
    assert!(rendered.contains("  - index ByAge on Singers\n"));
    assert!(rendered.contains("  + column Singers.LastName\n"));
    assert!(rendered.contains("  - column Singers.Age\n"));
    assert!(rendered.contains("  + index SingersByLastName on Singers\n"));
    assert!(rendered.contains("  + table Albums (3 columns)\n"));
    assert!(rendered.contains("  - table Old\n"));
    assert_eq!(diff.len(), 7);
    assert!(diff.changes.iter().all(|c| !c.table().is_empty()));
}
