//! Data layer against a real PostgreSQL running `sql/widget_procedures.sql`.
//!
//! Destructive: the `widgets` table is truncated. Point `WIDGET_TEST_DATABASE_URL` at a
//! disposable database to run it; without it the test is skipped.

use sqlx::Executor;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use web_widget::app::data_layer::release;
use web_widget::{DataAccessError, DataLayer, Widget, WidgetStore};

const SCHEMA: &str = include_str!("../sql/widget_procedures.sql");

// Functions the scenarios below swap out; dropped first so a changed return type can be
// restored and an interrupted earlier run leaves nothing behind.
const DROP_REPLACEABLE: &str = r#"
    DROP FUNCTION IF EXISTS "spDeleteWidget"(INTEGER);
    DROP FUNCTION IF EXISTS "spInsertWidget"(INTEGER, TEXT, TEXT, DOUBLE PRECISION, TEXT);
"#;

const INSERT_WRITING_NOTHING: &str = r#"
CREATE OR REPLACE FUNCTION "spInsertWidget"(
    wid INTEGER, wname TEXT, wdescription TEXT, wcost DOUBLE PRECISION, wlocation TEXT,
    OUT aid INTEGER, OUT affected INTEGER
)
LANGUAGE plpgsql AS $$
BEGIN
    aid := NULL;
    affected := 0;
END
$$;
"#;

const INSERT_WITHOUT_AID: &str = r#"
CREATE OR REPLACE FUNCTION "spInsertWidget"(
    wid INTEGER, wname TEXT, wdescription TEXT, wcost DOUBLE PRECISION, wlocation TEXT,
    OUT aid INTEGER, OUT affected INTEGER
)
LANGUAGE plpgsql AS $$
BEGIN
    aid := NULL;
    affected := 1;
END
$$;
"#;

const DELETE_COUNTING_BIGINT: &str = r#"
DROP FUNCTION IF EXISTS "spDeleteWidget"(INTEGER);
CREATE FUNCTION "spDeleteWidget"(aid INTEGER)
RETURNS BIGINT
LANGUAGE plpgsql AS $$
DECLARE
    affected BIGINT;
BEGIN
    DELETE FROM widgets WHERE widgets.id = aid;
    GET DIAGNOSTICS affected = ROW_COUNT;
    RETURN affected;
END
$$;
"#;

const DELETE_SLEEPING: &str = r#"
DROP FUNCTION IF EXISTS "spDeleteWidget"(INTEGER);
CREATE FUNCTION "spDeleteWidget"(aid INTEGER)
RETURNS INTEGER
LANGUAGE plpgsql AS $$
BEGIN
    PERFORM pg_sleep(3);
    RETURN 0;
END
$$;
"#;

async fn run_script(layer: &DataLayer, script: &str) {
    let mut conn = layer.connect().await.expect("test database reachable");
    conn.execute(script).await.expect("script runs");
    release(conn).await;
}

async fn load_reference_schema(layer: &DataLayer) {
    run_script(layer, DROP_REPLACEABLE).await;
    run_script(layer, SCHEMA).await;
}

async fn prepared_layer() -> Option<DataLayer> {
    dotenv::dotenv().ok();
    let Ok(url) = std::env::var("WIDGET_TEST_DATABASE_URL") else {
        println!("WIDGET_TEST_DATABASE_URL not set; skipping stored procedure test");
        return None;
    };
    let layer = DataLayer::new(&url).expect("valid WIDGET_TEST_DATABASE_URL");

    load_reference_schema(&layer).await;
    run_script(&layer, "TRUNCATE TABLE widgets RESTART IDENTITY").await;
    Some(layer)
}

// One test function: the properties share a single table and must not run in parallel.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_widget_procedures() -> Result<(), Box<dyn std::error::Error>> {
    let Some(layer) = prepared_layer().await else {
        return Ok(());
    };

    // --- Empty table: empty list, absent lookup ---
    assert!(layer.list_widgets().await?.is_empty());
    assert_eq!(layer.get_widget_by_id(42).await?, None);

    // --- Missing entity: invalid argument, nothing written ---
    assert!(layer.insert_widget(None).await.unwrap_err().is_invalid_argument());
    assert!(layer.update_widget(1, None).await.unwrap_err().is_invalid_argument());
    assert!(layer.list_widgets().await?.is_empty());

    // --- Insert returns the server-assigned id, not the placeholder ---
    let draft = Widget::new("Sprocket", 2.5)
        .with_description("12 teeth")
        .with_location("Bin 4");
    let mut seen = HashSet::new();
    let mut inserted = Vec::new();
    for n in 0..5 {
        let mut w = draft.clone();
        w.name = format!("Sprocket {}", n);
        let stored = layer.insert_widget(Some(&w)).await?.expect("row inserted");
        assert_ne!(stored.id, 0);
        assert!(seen.insert(stored.id), "id {} reused", stored.id);
        assert_eq!(layer.get_widget_by_id(stored.id).await?, Some(stored.clone()));
        inserted.push(stored);
    }
    assert_eq!(layer.list_widgets().await?.len(), inserted.len());

    // --- Nullable columns survive the round trip ---
    let bare = layer
        .insert_widget(Some(&Widget::new("Bare", 0.0)))
        .await?
        .expect("row inserted");
    let fetched = layer.get_widget_by_id(bare.id).await?.expect("row present");
    assert_eq!(fetched.description, None);
    assert_eq!(fetched.location, None);

    // --- Update replaces all four mutable fields, id unchanged ---
    let target = inserted[0].id;
    let replacement = Widget::new("Sprocket XL", 4.75).with_location("Bin 9");
    assert_eq!(layer.update_widget(target, Some(&replacement)).await?, 1);
    let updated = layer.get_widget_by_id(target).await?.expect("row present");
    assert_eq!(updated, replacement.with_id(target));
    assert_eq!(layer.update_widget(-1, Some(&replacement)).await?, 0);

    // --- Delete, then absence ---
    let doomed = inserted[1].id;
    assert_eq!(layer.delete_widget(doomed).await?, 1);
    assert_eq!(layer.get_widget_by_id(doomed).await?, None);
    assert_eq!(layer.delete_widget(doomed).await?, 0);

    // --- Concurrent lookups for different ids each see their own row ---
    let layer = Arc::new(layer);
    let handles: Vec<_> = inserted[2..]
        .iter()
        .cloned()
        .map(|expected| {
            let layer = layer.clone();
            tokio::spawn(async move {
                let got = layer.get_widget_by_id(expected.id).await.unwrap();
                assert_eq!(got, Some(expected));
            })
        })
        .collect();
    for handle in handles {
        handle.await?;
    }

    // --- Insert that writes no row: absence, not an error ---
    let before = layer.list_widgets().await?.len();
    run_script(&layer, INSERT_WRITING_NOTHING).await;
    assert_eq!(layer.insert_widget(Some(&draft)).await?, None);
    assert_eq!(layer.list_widgets().await?.len(), before);

    // --- Insert reporting a row but no aid: the id cannot be invented ---
    run_script(&layer, INSERT_WITHOUT_AID).await;
    let err = layer.insert_widget(Some(&draft)).await.unwrap_err();
    assert!(
        matches!(err, DataAccessError::MissingOutput { parameter: "aid", .. }),
        "unexpected error: {err}"
    );

    // --- Affected-row counts reported as BIGINT ---
    run_script(&layer, DELETE_COUNTING_BIGINT).await;
    let bigint_target = inserted[2].id;
    assert_eq!(layer.delete_widget(bigint_target).await?, 1);
    assert_eq!(layer.delete_widget(bigint_target).await?, 0);

    // --- A procedure outliving the command timeout ---
    run_script(&layer, DELETE_SLEEPING).await;
    let impatient = layer
        .as_ref()
        .clone()
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(1));
    let started = Instant::now();
    let err = impatient.delete_widget(-1).await.unwrap_err();
    assert!(
        matches!(err, DataAccessError::Timeout { timeout, .. } if timeout == Duration::from_secs(1)),
        "unexpected error: {err}"
    );
    assert!(started.elapsed() < Duration::from_secs(3));

    // --- Reference procedures back in place ---
    load_reference_schema(&layer).await;
    assert_eq!(layer.delete_widget(-1).await?, 0);
    let restored = layer.insert_widget(Some(&draft)).await?.expect("row inserted");
    assert!(restored.id > 0);

    Ok(())
}
