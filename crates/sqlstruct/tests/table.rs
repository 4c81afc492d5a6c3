//! Table repository over a recording database.

use sqlstruct::qb::Expr;
use sqlstruct::{
    Context, Database, ExecResult, Executor, FromRow, Options, Record, Row, SqlResult, Storage,
    StorageConfig, Table, Transaction, Value, quote_ansi,
};
use std::sync::{Arc, Mutex};

type Log = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

#[derive(Default)]
struct RecordingDb {
    log: Log,
    rows: Vec<Row>,
}

struct RecordingTx {
    log: Log,
}

impl Executor for RecordingDb {
    async fn execute(&self, sql: &str, args: &[Value]) -> SqlResult<ExecResult> {
        self.log.lock().unwrap().push((format!("exec {sql}"), args.to_vec()));
        Ok(ExecResult::new(args.len() as u64))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> SqlResult<Vec<Row>> {
        self.log.lock().unwrap().push((format!("query {sql}"), args.to_vec()));
        Ok(self.rows.clone())
    }
}

impl Database for RecordingDb {
    type Tx = RecordingTx;

    async fn begin(&self) -> SqlResult<RecordingTx> {
        self.log.lock().unwrap().push(("begin".into(), vec![]));
        Ok(RecordingTx {
            log: Arc::clone(&self.log),
        })
    }
}

impl Executor for RecordingTx {
    async fn execute(&self, sql: &str, args: &[Value]) -> SqlResult<ExecResult> {
        self.log.lock().unwrap().push((format!("tx exec {sql}"), args.to_vec()));
        Ok(ExecResult::new(1))
    }

    async fn query(&self, sql: &str, args: &[Value]) -> SqlResult<Vec<Row>> {
        self.log.lock().unwrap().push((format!("tx query {sql}"), args.to_vec()));
        Ok(Vec::new())
    }
}

impl Transaction for RecordingTx {
    async fn commit(&self) -> SqlResult<()> {
        self.log.lock().unwrap().push(("commit".into(), vec![]));
        Ok(())
    }

    async fn rollback(&self) -> SqlResult<()> {
        self.log.lock().unwrap().push(("rollback".into(), vec![]));
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Record, FromRow)]
struct User {
    #[db(column = "id")]
    id: i64,
    #[db(column = "role_id")]
    role_id: i64,
    #[db(column = "name")]
    name: String,
}

#[derive(Debug, Default, Record, FromRow)]
struct Role {
    #[db(column = "id")]
    id: i64,
    #[db(column = "name")]
    name: String,
}

fn storage(rows: Vec<Row>) -> (Arc<Storage<RecordingDb>>, Log) {
    let db = RecordingDb {
        rows,
        ..Default::default()
    };
    let log = Arc::clone(&db.log);
    let st = Storage::with_config(db, StorageConfig::new().with_quoter(quote_ansi));
    (Arc::new(st), log)
}

fn take(log: &Log) -> Vec<(String, Vec<Value>)> {
    std::mem::take(&mut *log.lock().unwrap())
}

#[tokio::test]
async fn test_table_writes() {
    let (st, log) = storage(Vec::new());
    let users: Table<User, _> = Table::new(st, "users");
    let ctx = Context::background();

    let john = User {
        id: 123,
        name: "John Doe".into(),
        ..Default::default()
    };
    users.insert_row(&ctx, &john, Options::new()).await.unwrap();
    assert_eq!(
        take(&log),
        [(
            r#"exec INSERT INTO "users" ("id","role_id","name") VALUES ($1,$2,$3)"#.to_string(),
            vec![Value::I64(123), Value::I64(0), Value::from("John Doe")],
        )]
    );

    let rows = [
        User {
            id: 124,
            name: "Jane Doe".into(),
            ..Default::default()
        },
        User {
            id: 125,
            name: "Richard Roe".into(),
            ..Default::default()
        },
    ];
    users.insert_rows(&ctx, &rows, Options::new()).await.unwrap();
    assert_eq!(
        take(&log)[0].0,
        r#"exec INSERT INTO "users" ("id","role_id","name") VALUES ($1,$2,$3),($4,$5,$6)"#
    );

    let jr = User {
        id: 123,
        name: "John Doe, Jr.".into(),
        ..Default::default()
    };
    let q = users
        .update_stmt(&jr, Options::new())
        .where_(users.eq(&users.r.id, 123i64));
    users.storage().exec(&ctx, &q).await.unwrap();
    assert_eq!(
        take(&log),
        [(
            r#"exec UPDATE "users" SET "id" = $1, "role_id" = $2, "name" = $3 WHERE "users"."id" = $4"#
                .to_string(),
            vec![
                Value::I64(123),
                Value::I64(0),
                Value::from("John Doe, Jr."),
                Value::I64(123)
            ],
        )]
    );

    let q = users.delete_stmt().where_(users.eq(&users.r.id, 123i64));
    users.storage().exec(&ctx, &q).await.unwrap();
    assert_eq!(
        take(&log)[0].0,
        r#"exec DELETE FROM "users" WHERE "users"."id" = $1"#
    );
}

#[tokio::test]
async fn test_table_reads() {
    let row = Row::from_pairs([
        ("id", Value::I64(123)),
        ("role_id", Value::I64(2)),
        ("name", Value::from("John Doe")),
    ]);
    let (st, log) = storage(vec![row]);
    let mut users: Table<User, _> = Table::new(Arc::clone(&st), "users");
    let ctx = Context::background();

    let q = users.select_stmt(Options::new()).where_(users.eq(&users.r.id, 123i64));
    let user = users.get(&ctx, &q).await.unwrap();
    assert_eq!(user.role_id, 2);
    assert_eq!(
        take(&log)[0].0,
        r#"query SELECT "users"."id", "users"."role_id", "users"."name" FROM "users" WHERE "users"."id" = $1"#
    );

    let q = users
        .select_stmt(Options::new())
        .where_sql(&users.fmt("{} LIKE ?", &[&users.r.name]), vec!["John %".into()]);
    assert_eq!(users.list(&ctx, &q).await.unwrap(), [user.clone()]);
    assert_eq!(
        take(&log),
        [(
            r#"query SELECT "users"."id", "users"."role_id", "users"."name" FROM "users" WHERE "users"."name" LIKE $1"#
                .to_string(),
            vec![Value::from("John %")],
        )]
    );

    let q = users
        .select_stmt(Options::new())
        .where_(Expr::NotEq(users.eq(&users.r.id, 123i64)));
    users.list(&ctx, &q).await.unwrap();
    assert_eq!(
        take(&log)[0].0,
        r#"query SELECT "users"."id", "users"."role_id", "users"."name" FROM "users" WHERE "users"."id" <> $1"#
    );

    users.list(&ctx, &users.select_stmt(Options::new())).await.unwrap();
    assert_eq!(
        take(&log)[0].0,
        r#"query SELECT "users"."id", "users"."role_id", "users"."name" FROM "users""#
    );

    let roles: Table<Role, _> = Table::new(st, "roles");
    users.add_table_alias(&roles.r, "roles");

    let q = users
        .select_stmt(Options::new())
        .left_join(
            &users.fmt("{} ON {} = {}", &[&*roles.r, &roles.r.id, &users.r.role_id]),
            vec![],
        )
        .where_sql(&users.fmt("{} = ?", &[&roles.r.name]), vec!["admin".into()]);
    users.list(&ctx, &q).await.unwrap();
    assert_eq!(
        take(&log)[0].0,
        r#"query SELECT "users"."id", "users"."role_id", "users"."name" FROM "users" LEFT JOIN "roles" ON "roles"."id" = "users"."role_id" WHERE "roles"."name" = $1"#
    );
}

#[tokio::test]
async fn test_table_writes_in_tx() {
    let (st, log) = storage(Vec::new());
    let users: Table<User, _> = Table::new(Arc::clone(&st), "users");
    let users = &users;

    st.in_tx(&Context::background(), move |ctx| async move {
        users.insert_row(&ctx, &User::default(), Options::new()).await?;
        users
            .storage()
            .exec(&ctx, &users.delete_stmt().where_(users.eq(&users.r.id, 1i64)))
            .await
    })
    .await
    .unwrap();

    let entries: Vec<String> = take(&log).into_iter().map(|(sql, _)| sql).collect();
    assert_eq!(
        entries,
        [
            "begin",
            r#"tx exec INSERT INTO "users" ("id","role_id","name") VALUES ($1,$2,$3)"#,
            r#"tx exec DELETE FROM "users" WHERE "users"."id" = $1"#,
            "commit",
        ]
    );
}
