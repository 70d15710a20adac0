//! Compile, execute against the scripted executor, and decode.

mod common;

use common::{Account, account, node_for};
use querykit::{
    Create, DecodeError, Error, MemoryExecutor, Merge, NodePattern, PropertyRef, Query, Return,
    ResultSet, Session, Set, Value, decode_value,
};
use rstest::{fixture, rstest};

#[fixture]
fn find_adults() -> Query {
    Query::new()
        .matching(NodePattern::of::<Account>("p"))
        .filter(PropertyRef::of::<Account>("p", "age").gte(18i64))
        .returning(Return::new(["p"]))
}

#[rstest]
fn test_created_record_decodes_back(find_adults: Query) {
    let record = account();
    let create = Query::new().create(Create::record("p", &record).unwrap());

    let executor = MemoryExecutor::new();
    executor.push_result(ResultSet::default());
    executor.push_result(ResultSet::new(["p"]).with_row([Value::Node(node_for(&record))]));
    let session = Session::new(executor);

    assert_eq!(session.execute(&create).unwrap(), 0);
    let fetched: Account = session.fetch_one(&find_adults).unwrap();
    assert_eq!(fetched, record);

    let executed = session.executor().executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].0.starts_with("CREATE (p:Account {id: $p_id, user_handle: $p_user_handle"));
    assert_eq!(executed[0].1.get("p_user_handle"), Some(&Value::from("grace")));
    assert_eq!(executed[1].0, "MATCH (p:Account) WHERE p.age >= $param1 RETURN p");
}

#[rstest]
fn test_engine_int64_overflowing_int32_is_type_mismatch(find_adults: Query) {
    let node = node_for(&account()).with_property("age", Value::Int64(200_000_000_000));
    let executor =
        MemoryExecutor::new().with_result(ResultSet::new(["p"]).with_row([Value::Node(node)]));
    let session = Session::new(executor);

    match session.fetch_one::<Account>(&find_adults) {
        Err(Error::Decode(DecodeError::TypeMismatch { field, .. })) => assert_eq!(field, "age"),
        other => panic!("expected a type mismatch, got {:?}", other),
    }
}

#[rstest]
fn test_missing_optional_property_is_none(find_adults: Query) {
    let mut record = account();
    record.status = None;
    let executor = MemoryExecutor::new()
        .with_result(ResultSet::new(["p"]).with_row([Value::Node(node_for(&record))]));
    let session = Session::new(executor);

    let fetched = session.fetch_optional::<Account>(&find_adults).unwrap();
    assert_eq!(fetched.and_then(|a| a.status), None);
}

#[rstest]
fn test_upsert_by_primary_key() {
    let record = account();
    let query = Query::new()
        .merge(Merge::record("p", &record, &[]).unwrap())
        .returning(Return::new(["p"]));
    let session = Session::new(MemoryExecutor::new());

    assert!(session.fetch_optional::<Account>(&query).unwrap().is_none());
    let (statement, params) = session.executor().executed().remove(0);
    assert!(statement.starts_with("MERGE (p:Account {id: $p_id}) ON CREATE SET "));
    assert!(statement.contains(" ON MATCH SET "));
    assert_eq!(params.get("p_id"), Some(&Value::Uuid(record.id)));
}

#[rstest]
fn test_set_record_then_count() {
    let record = account();
    let query = Query::new()
        .matching(NodePattern::of::<Account>("p").property("email", record.email.clone()))
        .set(Set::record("p", &record).unwrap())
        .returning(Return::new([querykit::Expr::count_all().aliased("updated")]));
    let executor = MemoryExecutor::new()
        .with_result(ResultSet::new(["updated"]).with_row([Value::Int64(1)]));
    let session = Session::new(executor);

    let result = session.run(&query).unwrap();
    let updated: i64 = decode_value(&result.rows[0][0]).unwrap();
    assert_eq!(updated, 1);
}
