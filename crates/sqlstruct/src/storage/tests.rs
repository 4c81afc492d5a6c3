use super::*;
use crate::quote::quote_ansi;
use crate::record::FieldDescriptor;
use crate::value::{Column, Value};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ── Recording database for tests ──

#[derive(Default)]
struct Script {
    fail_begin: bool,
    fail_commit: bool,
    fail_rollback: bool,
    fail_exec: bool,
    rows: Vec<Row>,
}

#[derive(Default)]
struct MockDb {
    log: Arc<Mutex<Vec<String>>>,
    args: Arc<Mutex<Vec<Vec<Value>>>>,
    script: Arc<Script>,
}

struct MockTx {
    log: Arc<Mutex<Vec<String>>>,
    args: Arc<Mutex<Vec<Vec<Value>>>>,
    script: Arc<Script>,
}

fn record(log: &Mutex<Vec<String>>, entry: String) {
    log.lock().unwrap().push(entry);
}

fn run(
    log: &Mutex<Vec<String>>,
    arg_log: &Mutex<Vec<Vec<Value>>>,
    script: &Script,
    prefix: &str,
    sql: &str,
    args: &[Value],
) -> SqlResult<()> {
    record(log, format!("{prefix}{sql}"));
    arg_log.lock().unwrap().push(args.to_vec());
    if script.fail_exec {
        return Err(SqlError::other("exec error"));
    }
    Ok(())
}

impl Executor for MockDb {
    async fn execute(&self, sql: &str, args: &[Value]) -> SqlResult<ExecResult> {
        run(&self.log, &self.args, &self.script, "exec ", sql, args)?;
        Ok(ExecResult::new(1))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> SqlResult<Vec<Row>> {
        run(&self.log, &self.args, &self.script, "query ", sql, args)?;
        Ok(self.script.rows.clone())
    }
}

impl Database for MockDb {
    type Tx = MockTx;

    async fn begin(&self) -> SqlResult<MockTx> {
        record(&self.log, "begin".into());
        if self.script.fail_begin {
            return Err(SqlError::other("begin error"));
        }
        Ok(MockTx {
            log: Arc::clone(&self.log),
            args: Arc::clone(&self.args),
            script: Arc::clone(&self.script),
        })
    }
}

impl Executor for MockTx {
    async fn execute(&self, sql: &str, args: &[Value]) -> SqlResult<ExecResult> {
        run(&self.log, &self.args, &self.script, "tx exec ", sql, args)?;
        Ok(ExecResult::new(1))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> SqlResult<Vec<Row>> {
        run(&self.log, &self.args, &self.script, "tx query ", sql, args)?;
        Ok(self.script.rows.clone())
    }
}

impl Transaction for MockTx {
    async fn commit(&self) -> SqlResult<()> {
        record(&self.log, "commit".into());
        if self.script.fail_commit {
            return Err(SqlError::other("commit error"));
        }
        Ok(())
    }

    async fn rollback(&self) -> SqlResult<()> {
        record(&self.log, "rollback".into());
        if self.script.fail_rollback {
            return Err(SqlError::other("rollback error"));
        }
        Ok(())
    }
}

fn mock(script: Script) -> (MockDb, Arc<Mutex<Vec<String>>>) {
    let db = MockDb {
        script: Arc::new(script),
        ..Default::default()
    };
    let log = Arc::clone(&db.log);
    (db, log)
}

fn entries(log: &Mutex<Vec<String>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn error_counter<D: Database>(st: Storage<D>) -> (Storage<D>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let st = st.on_error(move |err| sink.lock().unwrap().push(err.to_string()));
    (st, seen)
}

#[derive(Debug, Default)]
struct User {
    id: i64,
    name: String,
}

impl Record for User {
    fn describe(fields: &mut Vec<FieldDescriptor>, parent: &[usize]) {
        fields.push(FieldDescriptor::column(parent, 0, "id", "id", false));
        fields.push(FieldDescriptor::column(parent, 1, "name", "name", true));
    }

    fn column(&self, path: &[usize]) -> Option<&dyn Column> {
        match path {
            [0] => Some(&self.id),
            [1] => Some(&self.name),
            _ => None,
        }
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> SqlResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

// ── Transactions ──

#[tokio::test]
async fn test_in_tx_commits() {
    let (db, log) = mock(Script::default());
    let st = &Storage::new(db);
    let ctx = Context::background();

    let affected = st
        .in_tx(&ctx, move |ctx| async move {
            assert!(ctx.in_tx());
            st.exec(&ctx, "DELETE FROM users").await
        })
        .await
        .unwrap();

    assert_eq!(affected.rows_affected, 1);
    assert_eq!(entries(&log), ["begin", "tx exec DELETE FROM users", "commit"]);
}

#[tokio::test]
async fn test_in_tx_rolls_back_on_error() {
    let (db, log) = mock(Script::default());
    let (st, seen) = error_counter(Storage::new(db));

    let err = st
        .in_tx(&Context::background(), |_ctx| async { Err::<(), _>(SqlError::other("error")) })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "error");
    assert_eq!(entries(&log), ["begin", "rollback"]);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_in_tx_rollback_failure_keeps_original() {
    let (db, _) = mock(Script {
        fail_rollback: true,
        ..Default::default()
    });
    let (st, seen) = error_counter(Storage::new(db));

    let err = st
        .in_tx(&Context::background(), |_ctx| async { Err::<(), _>(SqlError::other("error")) })
        .await
        .unwrap_err();

    assert!(err.is_rollback());
    assert_eq!(err.original().map(ToString::to_string).as_deref(), Some("error"));
    assert_eq!(
        err.to_string(),
        "failed to rollback: rollback error (original error: error)"
    );
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_in_tx_begin_failure() {
    let (db, log) = mock(Script {
        fail_begin: true,
        ..Default::default()
    });
    let (st, seen) = error_counter(Storage::new(db));
    let called = &AtomicUsize::new(0);

    let err = st
        .in_tx(&Context::background(), move |_ctx| async move {
            called.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "failed to begin tx: begin error");
    assert_eq!(called.load(Ordering::SeqCst), 0);
    assert_eq!(entries(&log), ["begin"]);
    assert_eq!(*seen.lock().unwrap(), ["failed to begin tx: begin error"]);
}

#[tokio::test]
async fn test_in_tx_commit_failure() {
    let (db, _) = mock(Script {
        fail_commit: true,
        ..Default::default()
    });
    let st = Storage::new(db);

    let err = st
        .in_tx(&Context::background(), |_ctx| async { Ok(()) })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to commit: commit error");
}

#[tokio::test]
async fn test_in_tx_reuses_running_tx() {
    let (db, log) = mock(Script::default());
    let st = &Storage::new(db);
    let counter = &AtomicUsize::new(0);

    st.in_tx(&Context::background(), move |outer| async move {
        let outer_tx = Arc::clone(outer.tx().unwrap());
        st.in_tx(&outer, move |inner| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            assert!(Arc::ptr_eq(inner.tx().unwrap(), &outer_tx));
            st.exec(&inner, "SELECT 1").await.map(|_| ())
        })
        .await
    })
    .await
    .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(entries(&log), ["begin", "tx exec SELECT 1", "commit"]);
}

#[tokio::test]
async fn test_nested_failure_is_returned_unchanged() {
    let (db, log) = mock(Script::default());
    let st = &Storage::new(db);

    let err = st
        .in_tx(&Context::background(), move |outer| async move {
            st.in_tx(&outer, |_inner| async { Err::<(), _>(SqlError::other("inner")) })
                .await
        })
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "inner");
    assert_eq!(entries(&log), ["begin", "rollback"]);
}

// ── Execution ──

#[tokio::test]
async fn test_exec_outside_tx_uses_db() {
    let (db, log) = mock(Script::default());
    let st = Storage::new(db);
    let args = Arc::clone(&st.db().args);

    let q = st
        .delete_stmt("users")
        .where_(Eq::new().with("id", 7i64));
    st.exec(&Context::background(), &q).await.unwrap();

    assert_eq!(entries(&log), ["exec DELETE FROM users WHERE id = $1"]);
    assert_eq!(*args.lock().unwrap(), [vec![Value::I64(7)]]);
}

#[tokio::test]
async fn test_build_error_is_reported() {
    let (db, log) = mock(Script::default());
    let (st, seen) = error_counter(Storage::new(db));

    let q = st.query_builder().select(Vec::<String>::new()).from("users");
    let err = st.query(&Context::background(), &q).await.unwrap_err();

    assert!(matches!(err, SqlError::Build(_)));
    assert!(err.to_string().starts_with("failed to build query: "));
    assert!(entries(&log).is_empty());
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_not_found_is_not_reported() {
    let (db, _) = mock(Script::default());
    let (st, seen) = error_counter(Storage::new(db));

    let err = st
        .get::<(i64,), _>(&Context::background(), "SELECT id FROM users")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_and_list_decode_rows() {
    let columns: Arc<[String]> = vec!["id".to_string(), "name".to_string()].into();
    let rows = vec![
        Row::new(Arc::clone(&columns), vec![Value::I64(1), Value::from("alice")]),
        Row::new(Arc::clone(&columns), vec![Value::I64(2), Value::from("bob")]),
    ];
    let (db, _) = mock(Script {
        rows,
        ..Default::default()
    });
    let st = Storage::new(db);
    let ctx = Context::background();

    let first: (i64, String) = st.get(&ctx, "SELECT id, name FROM users").await.unwrap();
    assert_eq!(first, (1, "alice".to_string()));

    let all: Vec<(i64, String)> = st.list(&ctx, "SELECT id, name FROM users").await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].1, "bob");
}

#[tokio::test]
async fn test_exec_failure_reaches_observer_and_hook() {
    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl QueryHook for Arc<Recorder> {
        fn before_query(&self, ctx: &QueryContext<'_>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("before {:?} {}", ctx.query_type, ctx.sql));
        }

        fn after_query(&self, _ctx: &QueryContext<'_>, _: Duration, error: Option<&SqlError>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("after {}", error.map(ToString::to_string).unwrap_or_default()));
        }
    }

    let (db, _) = mock(Script {
        fail_exec: true,
        ..Default::default()
    });
    let recorder = Arc::new(Recorder::default());
    let (st, seen) = error_counter(Storage::new(db).with_hook(Arc::clone(&recorder)));

    let err = st
        .exec(&Context::background(), "UPDATE users SET name = 'x'")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "exec error");
    assert_eq!(*seen.lock().unwrap(), ["exec error"]);
    assert_eq!(
        *recorder.events.lock().unwrap(),
        ["before Update UPDATE users SET name = 'x'", "after exec error"]
    );
}

// ── Statements ──

#[test]
fn test_statements_quote_identifiers() {
    let (db, _) = mock(Script::default());
    let st = Storage::with_config(db, StorageConfig::new().with_quoter(quote_ansi));
    let user = User {
        id: 123,
        name: "John Doe".into(),
    };

    let q = st.insert_stmt("users", &[user], Options::new()).build().unwrap();
    assert_eq!(q.sql, r#"INSERT INTO "users" ("id","name") VALUES ($1,$2)"#);

    let user = User {
        id: 123,
        ..Default::default()
    };
    let q = st
        .update_stmt("users", &user, Options::new())
        .where_(Eq::new().with(st.col(&user, &user.id), 123i64))
        .build()
        .unwrap();
    assert_eq!(q.sql, r#"UPDATE "users" SET "id" = $1 WHERE "id" = $2"#);

    let q = st
        .select_stmt("users", &[User::default()], Options::new())
        .build()
        .unwrap();
    assert_eq!(q.sql, r#"SELECT "id", "name" FROM "users""#);

    let q = st
        .select_stmt(
            "users",
            &[User::default()],
            Options::new().prepare_column(Arc::new(|c: &str| format!("u.{c}"))),
        )
        .build()
        .unwrap();
    assert_eq!(q.sql, r#"SELECT u.id, u.name FROM "users""#);

    assert_eq!(st.delete_stmt("users").build().unwrap().sql, r#"DELETE FROM "users""#);
}

#[test]
fn test_statements_without_quoter() {
    let (db, _) = mock(Script::default());
    let st = Storage::with_config(
        db,
        StorageConfig::new().with_format(crate::qb::PlaceholderFormat::Question),
    );
    let user = User {
        id: 1,
        ..Default::default()
    };

    assert_eq!(st.col(&user, &user.name), "name");
    let eq = st.where_eq(&user, Options::new()).unwrap();
    assert_eq!(eq.get("id"), Some(&Value::I64(1)));
    assert!(st.where_eq(&User::default(), Options::new().columns(["name"])).is_none());

    let q = st.insert_stmt("users", &[user], Options::new()).build().unwrap();
    assert_eq!(q.sql, "INSERT INTO users (id) VALUES (?)");
}

#[test]
fn test_referencer_shares_quoter() {
    let (db, _) = mock(Script::default());
    let st = Storage::with_config(db, StorageConfig::new().with_quoter(quote_ansi));
    let user = User::default();
    let mut rf = st.referencer();
    rf.add_table_alias(&user, "u");
    assert_eq!(rf.reference(&user.id), r#""u"."id""#);
    assert!(Arc::ptr_eq(rf.mapper(), st.mapper()));
}

// ── Table ──

#[tokio::test]
async fn test_table_statements() {
    let (db, log) = mock(Script::default());
    let st = Arc::new(Storage::with_config(db, StorageConfig::new().with_quoter(quote_ansi)));
    let users: Table<User, _> = Table::new(Arc::clone(&st), "users");
    let ctx = Context::background();

    users
        .insert_row(
            &ctx,
            &User {
                id: 123,
                name: "John Doe".into(),
            },
            Options::new(),
        )
        .await
        .unwrap();

    let q = users
        .update_stmt(
            &User {
                id: 123,
                name: "Jr.".into(),
            },
            Options::new(),
        )
        .where_(users.eq(&users.r.id, 123i64));
    users.storage().exec(&ctx, &q).await.unwrap();

    let q = users
        .select_stmt(Options::new())
        .where_sql(&users.fmt("{} LIKE ?", &[&users.r.name]), vec!["John %".into()]);
    let _ = users.list(&ctx, &q).await.unwrap();

    assert_eq!(
        entries(&log),
        [
            r#"exec INSERT INTO "users" ("id","name") VALUES ($1,$2)"#,
            r#"exec UPDATE "users" SET "id" = $1, "name" = $2 WHERE "users"."id" = $3"#,
            r#"query SELECT "users"."id", "users"."name" FROM "users" WHERE "users"."name" LIKE $1"#,
        ]
    );
}
