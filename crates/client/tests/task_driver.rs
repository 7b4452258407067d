use std::sync::Arc;

use rb_client::driver::{TaskDescriptor, TaskDriver};
use rb_client::mem::MemExecutionClient;
use rb_client::record::Value;
use rb_client::schema::{columns_from, schema_from, ColumnSpec, RecordSchema};
use rb_common::{
    BindConfig, BindMode, MaterializeError, QueryId, RbError, SchemaError, TaskId, ToleranceConfig,
    TypeTag,
};

fn descriptor() -> TaskDescriptor {
    TaskDescriptor {
        query_id: QueryId(7),
        task_id: TaskId(0),
        payload: b"plan-fragment".to_vec(),
    }
}

fn key_name_columns() -> Vec<ColumnSpec> {
    columns_from(&[("key", TypeTag::I64), ("name", TypeTag::Str)])
}

fn key_name_target() -> Arc<RecordSchema> {
    Arc::new(schema_from(&[("key", TypeTag::I64), ("name", TypeTag::Str)]))
}

fn row(key: Option<i64>, name: &str) -> Vec<Option<Value>> {
    vec![key.map(Value::I64), Some(Value::Str(name.to_string()))]
}

fn by_name() -> BindConfig {
    BindConfig {
        mode: BindMode::ByName,
        ignore_unhandled_null: false,
    }
}

#[test]
fn yields_all_records_then_closes_exactly_once() {
    let client = MemExecutionClient::new(
        key_name_columns(),
        vec![row(Some(1), "a"), row(Some(2), "b")],
    );
    let probe = client.close_probe();

    let mut driver = TaskDriver::open(&client, &descriptor(), key_name_target(), &by_name())
        .unwrap();
    let records: Vec<_> = driver.by_ref().collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("key"), Some(&Value::I64(1)));
    assert_eq!(records[1].get("name"), Some(&Value::Str("b".to_string())));
    assert_eq!(probe.count(), 1);

    // Exhausted driver keeps returning None and never re-closes.
    assert!(driver.next().is_none());
    drop(driver);
    assert_eq!(probe.count(), 1);
}

#[test]
fn materialize_error_surfaces_and_closes_exactly_once() {
    let client = MemExecutionClient::new(
        key_name_columns(),
        vec![row(Some(1), "ok"), row(None, "bad"), row(Some(3), "never")],
    );
    let probe = client.close_probe();

    let mut driver = TaskDriver::open(&client, &descriptor(), key_name_target(), &by_name())
        .unwrap();
    assert!(driver.next().unwrap().is_ok());
    let err = driver.next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        RbError::Materialize(MaterializeError::UnhandledNull { .. })
    ));
    assert_eq!(probe.count(), 1);
    assert!(driver.next().is_none());
    drop(driver);
    assert_eq!(probe.count(), 1);
}

#[test]
fn early_drop_runs_release_path() {
    let client = MemExecutionClient::new(
        key_name_columns(),
        vec![row(Some(1), "a"), row(Some(2), "b"), row(Some(3), "c")],
    );
    let probe = client.close_probe();

    let mut driver = TaskDriver::open(&client, &descriptor(), key_name_target(), &by_name())
        .unwrap();
    assert!(driver.next().unwrap().is_ok());
    drop(driver);
    assert_eq!(probe.count(), 1);
}

#[test]
fn bind_failure_releases_the_cursor() {
    let client = MemExecutionClient::new(key_name_columns(), vec![row(Some(1), "a")]);
    let probe = client.close_probe();

    let target = Arc::new(schema_from(&[("nowhere", TypeTag::I64)]));
    let err = TaskDriver::open(&client, &descriptor(), target, &by_name()).unwrap_err();
    assert!(matches!(
        err,
        RbError::Schema(SchemaError::FieldNotFound { .. })
    ));
    assert_eq!(probe.count(), 1);
}

#[test]
fn transport_failure_surfaces_and_closes() {
    let client = MemExecutionClient::new(
        key_name_columns(),
        vec![row(Some(1), "a"), row(Some(2), "b")],
    )
    .with_advance_failure(1);
    let probe = client.close_probe();

    let mut driver = TaskDriver::open(&client, &descriptor(), key_name_target(), &by_name())
        .unwrap();
    assert!(driver.next().unwrap().is_ok());
    let err = driver.next().unwrap().unwrap_err();
    assert!(matches!(err, RbError::Execution(_)));
    assert_eq!(probe.count(), 1);
    assert!(driver.next().is_none());
}

#[test]
fn tolerance_excuses_rare_bad_rows() {
    let client = MemExecutionClient::new(
        key_name_columns(),
        vec![row(Some(1), "a"), row(None, "bad"), row(Some(3), "c")],
    );

    let driver = TaskDriver::open(&client, &descriptor(), key_name_target(), &by_name())
        .unwrap()
        .with_tolerance(ToleranceConfig {
            max_error_rate: 0.9,
            min_errors: 1,
        });
    let records: Vec<_> = driver.collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("key"), Some(&Value::I64(3)));
}

#[test]
fn tolerance_trips_on_systematic_errors() {
    let client = MemExecutionClient::new(
        key_name_columns(),
        vec![row(None, "bad"), row(None, "bad"), row(None, "bad")],
    );
    let probe = client.close_probe();

    let mut driver = TaskDriver::open(&client, &descriptor(), key_name_target(), &by_name())
        .unwrap()
        .with_tolerance(ToleranceConfig {
            max_error_rate: 0.1,
            min_errors: 1,
        });
    let err = driver.next().unwrap().unwrap_err();
    assert!(matches!(err, RbError::Materialize(_)));
    assert_eq!(probe.count(), 1);
}

#[test]
fn default_record_applies_through_the_driver() {
    let client = MemExecutionClient::new(
        key_name_columns(),
        vec![row(None, "defaulted"), row(Some(2), "plain")],
    );

    let target = key_name_target();
    let template = rb_client::record::Record::new(
        Arc::clone(&target),
        vec![Value::I64(0), Value::Str("".to_string())],
    )
    .unwrap();
    let driver = TaskDriver::open(&client, &descriptor(), target, &by_name())
        .unwrap()
        .with_default_record(template)
        .unwrap();
    let records: Vec<_> = driver.collect::<Result<_, _>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("key"), Some(&Value::I64(0)));
}

#[test]
fn rejected_template_still_releases_the_cursor() {
    let client = MemExecutionClient::new(key_name_columns(), vec![row(Some(1), "a")]);
    let probe = client.close_probe();

    let wrong_schema = Arc::new(schema_from(&[("key", TypeTag::I64)]));
    let template =
        rb_client::record::Record::new(wrong_schema, vec![Value::I64(0)]).unwrap();
    let err = TaskDriver::open(&client, &descriptor(), key_name_target(), &by_name())
        .unwrap()
        .with_default_record(template)
        .unwrap_err();
    assert!(matches!(err, RbError::InvalidConfig(_)));
    assert_eq!(probe.count(), 1);
}

#[test]
fn descriptor_round_trips_through_json() {
    let task = descriptor();
    let json = serde_json::to_string(&task).unwrap();
    let back: TaskDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(back, task);
}
