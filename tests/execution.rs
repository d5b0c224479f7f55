use std::fs;

use fixtura::error::FixturaError;
use fixtura::library::LibraryItem;
use fixtura::queue::SqlLibrary;
use fixtura::replacement::{ReplacementSet, SqlValue};
use tracing_subscriber::EnvFilter;

/// Makes queue/execute tracing visible when a test run needs debugging,
/// e.g. `RUST_LOG=debug cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn workspace_sql() -> SqlLibrary {
    init_tracing();
    let mut sql = SqlLibrary::new();
    sql.set_connections(vec![("workspace".to_string(), ":memory:".to_string())]);
    sql
}

#[test]
fn queued_statements_execute_in_enqueue_order() {
    let mut sql = workspace_sql();
    sql.queue_raw("workspace", "select 1 as v;").expect("queue ok");
    sql.queue_raw("workspace", "select 2 as v;").expect("queue ok");
    sql.queue_raw("workspace", "select 3 as v;").expect("queue ok");
    let rows = sql.execute().expect("execute ok");
    let values: Vec<i64> = rows
        .iter()
        .map(|row| row.get("v").and_then(SqlValue::as_integer).expect("integer v"))
        .collect();
    assert_eq!(values, vec![1, 2, 3]);
}

#[test]
fn empty_queue_fails_and_execute_drains_the_queue() {
    let mut sql = workspace_sql();
    assert!(matches!(sql.execute().unwrap_err(), FixturaError::EmptyQueue));

    sql.queue_raw("workspace", "select 1 as v;").expect("queue ok");
    let rows = sql.execute().expect("execute ok");
    assert_eq!(rows.len(), 1);
    assert!(!sql.has_queued());
    // A second immediate execute finds nothing left.
    assert!(matches!(sql.execute().unwrap_err(), FixturaError::EmptyQueue));
}

#[test]
fn go_lines_separate_batches_on_one_connection() {
    let mut sql = workspace_sql();
    sql.queue_raw(
        "workspace",
        "create table t (x int);\ninsert into t values (42);\nGO\nselect x from t;",
    )
    .expect("queue ok");
    let rows = sql.execute().expect("execute ok");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("x").and_then(SqlValue::as_integer), Some(42));
}

#[test]
fn rows_preserve_driver_column_order() {
    let mut sql = workspace_sql();
    sql.queue_raw("workspace", "select 1 as first, 'two' as second, 3.5 as third;")
        .expect("queue ok");
    let rows = sql.execute().expect("execute ok");
    let names: Vec<&str> = rows[0].column_names().collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert_eq!(rows[0].get("second").and_then(SqlValue::as_text), Some("two"));
    assert_eq!(rows[0].get("third"), Some(&SqlValue::Real(3.5)));
}

#[test]
fn execution_failure_carries_the_offending_script() {
    let mut sql = workspace_sql();
    sql.queue_raw("workspace", "select * from missing_table;")
        .expect("queue ok");
    let err = sql.execute().unwrap_err();
    match &err {
        FixturaError::Execution { message, script } => {
            assert!(message.contains("missing_table"), "message was: {message}");
            assert!(script.contains("select * from missing_table"));
        }
        other => panic!("expected an execution error, got {other:?}"),
    }
    // The failing alias's buffer was still cleared.
    assert!(!sql.has_queued());
}

#[test]
fn unconfigured_alias_at_execute_lists_what_is_configured() {
    let mut sql = workspace_sql();
    sql.queue_raw("elsewhere", "select 1;").expect("queue ok");
    let err = sql.execute().unwrap_err();
    match &err {
        FixturaError::ConnectionNotFound { alias, configured } => {
            assert_eq!(alias, "ELSEWHERE");
            assert!(configured.contains("WORKSPACE"), "configured was: {configured}");
        }
        other => panic!("expected connection-not-found, got {other:?}"),
    }
}

#[test]
fn multiple_aliases_execute_and_concatenate_rows() {
    init_tracing();
    let mut sql = SqlLibrary::new();
    sql.set_connections(vec![
        ("alpha".to_string(), ":memory:".to_string()),
        ("beta".to_string(), ":memory:".to_string()),
    ]);
    sql.queue_raw("beta", "select 'b' as who;").expect("queue ok");
    sql.queue_raw("alpha", "select 'a' as who;").expect("queue ok");
    let rows = sql.execute().expect("execute ok");
    // Aliases run in alias iteration order.
    let who: Vec<&str> = rows
        .iter()
        .map(|row| row.get("who").and_then(SqlValue::as_text).expect("text who"))
        .collect();
    assert_eq!(who, vec!["a", "b"]);
}

#[test]
fn file_backed_catalog_item_queues_and_executes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let library_dir = dir.path().join("_TestDataLibrary").join("Samples");
    fs::create_dir_all(&library_dir).expect("create library dirs");
    let script_path = library_dir.join("Pick.sql");
    fs::write(
        &script_path,
        "DEFAULTS: { picked: 1 }\n--DbType = WORKSPACE\nselect {picked} as picked;",
    )
    .expect("write fixture");

    let mut sql = workspace_sql();
    sql.catalog_mut()
        .register_file(&script_path, "_TestDataLibrary", ".sql");
    assert!(sql.catalog().contains("Samples.Pick"));

    let mut overrides = ReplacementSet::new();
    overrides.set("picked", 5);
    sql.queue_from_catalog("Samples.Pick", &overrides)
        .expect("queue ok");
    let rows = sql.execute().expect("execute ok");
    assert_eq!(rows[0].get("picked").and_then(SqlValue::as_integer), Some(5));
}

#[test]
fn fixture_with_include_round_trips_through_execution() {
    let mut sql = workspace_sql();
    sql.catalog_mut().register(LibraryItem::from_text(
        "Other.Item",
        "select {baseValue} as base;",
    ));
    sql.catalog_mut().register(LibraryItem::from_text(
        "Main",
        "DEFAULTS: { label: 'Boom' }\n--DbType = WORKSPACE\nselect '{label}' as label;\nINCLUDE Other.Item, {baseValue: 69}",
    ));
    sql.queue_from_catalog("Main", &ReplacementSet::new())
        .expect("queue ok");
    let rows = sql.execute().expect("execute ok");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("label").and_then(SqlValue::as_text), Some("Boom"));
    assert_eq!(rows[1].get("base").and_then(SqlValue::as_integer), Some(69));
}
