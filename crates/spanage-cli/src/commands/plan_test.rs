use super::*;
use spanage_db::{DuckDbBackend, SchemaCatalog};
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn test_plan_leaves_database_untouched() {
    let dir = tempdir().unwrap();
    let schema_path = dir.path().join("schema.json");
    fs::write(
        &schema_path,
        r#"{"tables": [{"name": "Events", "columns": [{"name": "id", "ddl": "id BIGINT"}]}]}"#,
    )
    .unwrap();
    let config_path = dir.path().join("spanage.yml");
    fs::write(&config_path, "{}\n").unwrap();
    let db_path = dir.path().join("app.duckdb");
    let global = GlobalArgs {
        verbose: false,
        config: Some(config_path.display().to_string()),
        database: Some(db_path.display().to_string()),
    };

    execute(
        &PlanArgs {
            schema_file: Some(schema_path),
        },
        &global,
    )
    .await
    .unwrap();

    let db = DuckDbBackend::from_path(&db_path).unwrap();
    assert!(db.list_tables().await.unwrap().is_empty());
}
