use fixtura::error::FixturaError;
use fixtura::library::LibraryItem;
use fixtura::queue::SqlLibrary;
use fixtura::replacement::ReplacementSet;

fn workspace_connections() -> Vec<(String, String)> {
    vec![("workspace".to_string(), ":memory:".to_string())]
}

#[test]
fn queueing_requires_configured_connections() {
    let mut sql = SqlLibrary::new();
    sql.catalog_mut().register(LibraryItem::from_text(
        "Known.Item",
        "--DbType = WORKSPACE\nselect 1;",
    ));
    // Even for a key that exists, the connection check comes first.
    let err = sql
        .queue_from_catalog("Known.Item", &ReplacementSet::new())
        .unwrap_err();
    assert!(matches!(err, FixturaError::Configuration(_)));
    // And the same for a key that does not exist.
    let err = sql
        .queue_from_catalog("No.Such.Item", &ReplacementSet::new())
        .unwrap_err();
    assert!(matches!(err, FixturaError::Configuration(_)));
    // Raw queueing follows the same rule.
    let err = sql.queue_raw("workspace", "select 1;").unwrap_err();
    assert!(matches!(err, FixturaError::Configuration(_)));
}

#[test]
fn unknown_catalog_key_is_not_found() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(workspace_connections());
    let err = sql
        .queue_from_catalog("No.Such.Item", &ReplacementSet::new())
        .unwrap_err();
    match &err {
        FixturaError::ItemNotFound { key } => assert_eq!(key, "No.Such.Item"),
        other => panic!("expected item-not-found, got {other:?}"),
    }
}

#[test]
fn script_without_marker_is_a_configuration_error() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(workspace_connections());
    sql.catalog_mut()
        .register(LibraryItem::from_text("Unmarked", "select 1;"));
    let err = sql
        .queue_from_catalog("Unmarked", &ReplacementSet::new())
        .unwrap_err();
    match &err {
        FixturaError::Configuration(message) => {
            // The message names the exact marker expression that was tried.
            assert!(message.contains("--DbType"), "message was: {message}");
            assert!(message.contains("WORKSPACE"), "message was: {message}");
        }
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

#[test]
fn markers_route_regions_to_their_aliases() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(vec![
        ("first".to_string(), ":memory:".to_string()),
        ("second".to_string(), ":memory:".to_string()),
    ]);
    sql.catalog_mut().register(LibraryItem::from_text(
        "Split",
        "--DbType = FIRST\nselect 1;\n--DbType = SECOND\nselect 2;",
    ));
    sql.queue_from_catalog("Split", &ReplacementSet::new())
        .expect("queue ok");
    assert!(sql.queued_sql("first").expect("first queued").contains("select 1"));
    assert!(sql.queued_sql("second").expect("second queued").contains("select 2"));
}

#[test]
fn markers_are_case_insensitive_and_whitespace_tolerant() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(workspace_connections());
    sql.catalog_mut().register(LibraryItem::from_text(
        "Sloppy",
        "--dbtype=workspace\nselect 1;",
    ));
    sql.queue_from_catalog("Sloppy", &ReplacementSet::new())
        .expect("queue ok");
    assert!(sql.queued_sql("workspace").expect("queued").contains("select 1"));
}

#[test]
fn successive_appends_are_newline_separated() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(workspace_connections());
    sql.queue_raw("workspace", "select 1;").expect("queue ok");
    sql.queue_raw("workspace", "select 2;").expect("queue ok");
    assert_eq!(
        sql.queued_sql("workspace").expect("queued"),
        "select 1;\nselect 2;"
    );
}

#[test]
fn expansion_happens_at_queue_time() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(workspace_connections());
    sql.catalog_mut().register(LibraryItem::from_text(
        "Parameterized",
        "DEFAULTS: { v: 1 }\n--DbType = WORKSPACE\nselect {v} as v;",
    ));
    let mut overrides = ReplacementSet::new();
    overrides.set("v", 9);
    sql.queue_from_catalog("Parameterized", &overrides)
        .expect("queue ok");
    assert!(sql.queued_sql("workspace").expect("queued").contains("select 9 as v"));
}

#[test]
fn queue_calls_chain() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(workspace_connections());
    sql.queue_raw("workspace", "select 1;")
        .and_then(|sql| sql.queue_raw("workspace", "select 2;"))
        .expect("chained queue ok");
    assert!(sql.has_queued());
}

#[test]
fn connection_lookup_is_case_insensitive_and_lists_configured() {
    let mut sql = SqlLibrary::new();
    sql.set_connections(workspace_connections());
    assert_eq!(sql.connection("Workspace").expect("found"), ":memory:");
    let err = sql.connection("other").unwrap_err();
    match &err {
        FixturaError::ConnectionNotFound { alias, configured } => {
            assert_eq!(alias, "OTHER");
            assert!(configured.contains("WORKSPACE"));
        }
        other => panic!("expected connection-not-found, got {other:?}"),
    }
}
