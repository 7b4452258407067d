use std::sync::Arc;

use rb_client::materialize::Materializer;
use rb_client::mem::MemCursor;
use rb_client::record::{Record, Value};
use rb_client::schema::{columns_from, schema_from, ColumnSpec};
use rb_common::{BindConfig, BindMode, MaterializeError, RbError, TypeTag};

fn key_name_columns() -> Vec<ColumnSpec> {
    columns_from(&[("key", TypeTag::I64), ("name", TypeTag::Str)])
}

fn key_name_target() -> Arc<rb_client::schema::RecordSchema> {
    Arc::new(schema_from(&[("key", TypeTag::I64), ("name", TypeTag::Str)]))
}

fn row(key: Option<i64>, name: &str) -> Vec<Option<Value>> {
    vec![key.map(Value::I64), Some(Value::Str(name.to_string()))]
}

#[test]
fn unhandled_null_fails_the_row() {
    let target = key_name_target();
    let cols = key_name_columns();
    let rows = vec![row(None, "bad"), row(Some(2), "good")];

    let mut m = Materializer::new(
        target,
        cols.clone(),
        &BindConfig {
            mode: BindMode::ByName,
            ignore_unhandled_null: false,
        },
    )
    .unwrap();
    let mut cursor = MemCursor::new(cols, rows);

    // The failing row surfaces as an error; it is not silently passed over.
    let err = m.next_record(&mut cursor).unwrap_err();
    match err {
        RbError::Materialize(MaterializeError::UnhandledNull { field, column }) => {
            assert_eq!(field, "key");
            assert_eq!(column, 0);
        }
        other => panic!("expected unhandled-null, got {other:?}"),
    }
    assert_eq!(m.stats().rows_read, 0);
}

#[test]
fn ignored_null_skips_row_and_continues() {
    let target = key_name_target();
    let cols = key_name_columns();
    let rows = vec![row(None, "dropped"), row(Some(2), "kept")];

    let mut m = Materializer::new(
        Arc::clone(&target),
        cols.clone(),
        &BindConfig {
            mode: BindMode::ByName,
            ignore_unhandled_null: true,
        },
    )
    .unwrap();
    let mut cursor = MemCursor::new(cols, rows);

    let record = m.next_record(&mut cursor).unwrap().unwrap();
    assert_eq!(record.get("name"), Some(&Value::Str("kept".to_string())));
    assert!(m.next_record(&mut cursor).unwrap().is_none());

    let stats = m.stats();
    assert_eq!(stats.rows_read, 1);
    assert_eq!(stats.rows_skipped, 1);
}

#[test]
fn configured_default_replaces_null() {
    let target = key_name_target();
    let cols = key_name_columns();
    let rows = vec![row(None, "defaulted"), row(Some(2), "plain")];

    let template = Record::new(
        Arc::clone(&target),
        vec![Value::I64(-1), Value::Str("n/a".to_string())],
    )
    .unwrap();
    let mut m = Materializer::new(
        Arc::clone(&target),
        cols.clone(),
        &BindConfig {
            mode: BindMode::ByName,
            ignore_unhandled_null: false,
        },
    )
    .unwrap()
    .with_default_record(template)
    .unwrap();
    let mut cursor = MemCursor::new(cols, rows);

    let first = m.next_record(&mut cursor).unwrap().unwrap();
    assert_eq!(first.get("key"), Some(&Value::I64(-1)));
    assert_eq!(first.get("name"), Some(&Value::Str("defaulted".to_string())));

    let second = m.next_record(&mut cursor).unwrap().unwrap();
    assert_eq!(second.get("key"), Some(&Value::I64(2)));

    let stats = m.stats();
    assert_eq!(stats.rows_read, 2);
    assert_eq!(stats.nulls_defaulted, 1);
}

#[test]
fn mismatched_default_template_is_rejected() {
    let target = key_name_target();
    let cols = key_name_columns();
    let other_schema = Arc::new(schema_from(&[("key", TypeTag::I64)]));
    let template = Record::new(other_schema, vec![Value::I64(0)]).unwrap();

    let err = Materializer::new(target, cols, &BindConfig::default())
        .unwrap()
        .with_default_record(template)
        .unwrap_err();
    assert!(matches!(err, RbError::InvalidConfig(_)));
}
