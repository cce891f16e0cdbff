use super::*;
use rusqlite::Connection;

#[test]
fn running_migrations_twice_is_a_no_op() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    run(&mut conn).unwrap();
    let schema_once: Vec<String> = conn
        .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name")
        .unwrap()
        .query_map([], |r| r.get::<_, String>(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    run(&mut conn).unwrap();
    let schema_twice: Vec<String> = conn
        .prepare("SELECT sql FROM sqlite_master WHERE sql IS NOT NULL ORDER BY name")
        .unwrap()
        .query_map([], |r| r.get::<_, String>(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(schema_once, schema_twice);
}

#[test]
fn ledger_records_every_applied_version() {
    let mut conn = Connection::open_in_memory().unwrap();
    run(&mut conn).unwrap();
    let versions = applied_versions(&conn).unwrap();
    assert_eq!(versions, vec![1, 2]);
}
