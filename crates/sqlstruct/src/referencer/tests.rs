use super::*;
use crate::Options;
use crate::qb::{self, Expr, PlaceholderFormat, SqlQb, StatementBuilder};
use crate::quote::{quote_ansi, quote_backticks};
use crate::record::FieldDescriptor;
use crate::value::Column;

#[derive(Debug, Default, Clone)]
struct User {
    id: i64,
    first_name: String,
    last_name: String,
}

impl Record for User {
    fn describe(fields: &mut Vec<FieldDescriptor>, parent: &[usize]) {
        fields.push(FieldDescriptor::column(parent, 0, "id", "id", true));
        fields.push(FieldDescriptor::column(parent, 1, "first_name", "first_name", true));
        fields.push(FieldDescriptor::column(parent, 2, "last_name", "last_name", true));
    }

    fn column(&self, path: &[usize]) -> Option<&dyn Column> {
        match path {
            [0] => Some(&self.id),
            [1] => Some(&self.first_name),
            [2] => Some(&self.last_name),
            _ => None,
        }
    }
}

#[test]
fn test_reference_and_col() {
    let row = User::default();
    let row2 = User::default();

    let mut rf = Referencer::new().with_quoter(quote_ansi);
    rf.add_table_alias(&row, "some_table");
    rf.add_table_alias(&row2, "");

    assert_eq!(rf.reference(&row), r#""some_table""#);
    assert_eq!(rf.reference(&row.id), r#""some_table"."id""#);
    assert_eq!(rf.col(&row.id), "id");
    assert_eq!(rf.reference(&row2.id), r#""id""#);
    assert_eq!(rf.col(&row2.id), "id");

    assert_eq!(rf.try_reference(&row2), Err(UsageError::UnknownFieldOrRow));
    assert_eq!(rf.try_col(&row2), Err(UsageError::UnknownFieldOrRow));
    assert_eq!(rf.try_reference(&5i32), Err(UsageError::UnknownFieldOrRow));
}

#[test]
#[should_panic(expected = "unknown field or row")]
fn test_reference_panics_when_unregistered() {
    let rf = Referencer::new();
    let row = User::default();
    rf.reference(&row);
}

#[test]
fn test_same_shape_different_instances() {
    let a = User::default();
    let b = User::default();
    let mut rf = Referencer::new();
    rf.add_table_alias(&a, "a");
    rf.add_table_alias(&b, "b");
    assert_eq!(rf.refs(&[&a.id, &b.id]), ["a.id", "b.id"]);
}

#[test]
fn test_reregistration_replaces_entries() {
    let row = User::default();
    let mut rf = Referencer::new();
    rf.add_table_alias(&row, "old");
    rf.add_table_alias(&row, "new");
    assert_eq!(rf.reference(&row), "new");
    assert_eq!(rf.reference(&row.last_name), "new.last_name");
    assert_eq!(rf.cols(&row), ["new.first_name", "new.id", "new.last_name"]);

    rf.add_table_alias(&row, "");
    assert_eq!(rf.try_reference(&row), Err(UsageError::UnknownFieldOrRow));
    assert_eq!(rf.reference(&row.id), "id");
}

#[test]
fn test_cols_sorted() {
    let row = User::default();
    let row2 = User::default();
    let unknown = User::default();

    let mut rf = Referencer::new().with_quoter(quote_backticks);
    rf.add_table_alias(&row, "some_table");
    rf.add_table_alias(&row2, "");

    assert_eq!(
        rf.cols(&row),
        ["`some_table`.`first_name`", "`some_table`.`id`", "`some_table`.`last_name`"]
    );
    assert_eq!(rf.cols(&row2), ["`first_name`", "`id`", "`last_name`"]);
    assert_eq!(rf.try_cols(&unknown), Err(UsageError::UnknownFieldOrRow));
}

#[test]
fn test_refs_reports_position() {
    let row = User::default();
    let mut rf = Referencer::new();
    rf.add_table_alias(&row, "u");
    assert_eq!(rf.try_refs(&[&row.id, &row, &1u8]), Err(UsageError::UnknownAt(2)));
}

#[test]
fn test_fmt_self_join() {
    let manager = User::default();
    let employee = User::default();
    let mut rf = Referencer::new();
    rf.add_table_alias(&manager, "manager");
    rf.add_table_alias(&employee, "employee");

    let users = rf.q(&["users"]);
    assert_eq!(rf.fmt("{} AS {}", &[&users, &manager]), "users AS manager");
    assert_eq!(
        rf.fmt("{} = {}", &[&manager.last_name, &employee.last_name]),
        "manager.last_name = employee.last_name"
    );
    assert_eq!(rf.fmt("{} != ?", &[&manager.first_name]), "manager.first_name != ?");
    assert_eq!(rf.fmt("{{{}}}", &[&manager.id]), "{manager.id}");
}

#[test]
fn test_fmt_literals() {
    let row = User::default();
    let mut rf = Referencer::new();
    rf.add_table_alias(&row, "u");

    assert_eq!(rf.fmt("{} > {} AND {} = {}", &[&row.id, &"10", &row.first_name, &"'x'"]), "u.id > 10 AND u.first_name = 'x'");

    let strict = {
        let mut rf = Referencer::new().strict(true);
        rf.add_table_alias(&row, "u");
        rf.try_fmt("{} > {}", &[&row.id, &"10"])
    };
    assert_eq!(strict, Err(UsageError::LiteralAt(1)));

    assert_eq!(rf.try_fmt("{}", &[&vec![1u8]]), Err(UsageError::UnknownAt(0)));
    assert_eq!(rf.try_fmt("{}", &[&10i64]), Err(UsageError::UnknownAt(0)));
    assert_eq!(rf.try_fmt("{}", &[&String::from("x")]), Err(UsageError::UnknownAt(0)));
    assert_eq!(
        rf.try_fmt("{} {}", &[&row.id]),
        Err(UsageError::FormatArgs {
            placeholders: 2,
            args: 1
        })
    );
}

#[test]
fn test_no_table() {
    let row = User::default();
    let mut rf = Referencer::new().with_quoter(quote_backticks);
    rf.add_table_alias(&row, "users");

    let nt = no_table_all(&[&row.id, &row.first_name, &row.first_name, &row.last_name, &row.last_name]);
    let args: Vec<&dyn Any> = nt.iter().map(|n| n as &dyn Any).collect();
    assert_eq!(
        rf.fmt("ON CONFLICT({}) DO UPDATE SET {} = excluded.{}, {} = excluded.{}", &args),
        "ON CONFLICT(`id`) DO UPDATE SET `first_name` = excluded.`first_name`, `last_name` = excluded.`last_name`"
    );
    assert_eq!(rf.reference(&no_table(&row.first_name)), "`first_name`");
    assert_eq!(rf.reference(&row.first_name), "`users`.`first_name`");
    assert_eq!(rf.col(&no_table(&row.last_name)), "last_name");
}

#[test]
fn test_eq_and_columns_of() {
    let manager = User::default();
    let employee = User::default();
    let mut rf = Referencer::new();
    rf.add_table_alias(&manager, "manager");
    rf.add_table_alias(&employee, "employee");

    let m = rf.mapper().clone();
    let larry = User {
        first_name: "Larry".into(),
        last_name: "Page".into(),
        ..Default::default()
    };
    let sergey = User {
        first_name: "Sergey".into(),
        last_name: "Brin".into(),
        ..Default::default()
    };

    let q = qb::select(rf.refs(&[&manager.id]))
        .from(rf.fmt("{} AS {}", &[&rf.q(&["users"]), &manager]))
        .where_(rf.eq(&employee.id, 5i64))
        .where_(m.where_eq(&larry, &Options::new().prepare_column(rf.columns_of(&employee))))
        .where_(Expr::NotEq(
            m.where_eq(&sergey, &Options::new().prepare_column(rf.columns_of(&"manager")))
                .unwrap_or_default(),
        ))
        .build()
        .unwrap();
    assert_eq!(
        q.sql,
        "SELECT manager.id FROM users AS manager WHERE employee.id = ? \
         AND employee.first_name = ? AND employee.last_name = ? \
         AND manager.first_name <> ? AND manager.last_name <> ?"
    );
    assert_eq!(q.args.len(), 5);

    let quoted = rf.columns_of(&Quoted::new("\"t\""));
    assert_eq!(quoted("id"), "\"t\".id");
    assert!(rf.try_columns_of(&User::default()).is_err());
}

#[test]
fn test_owned_rows_stay_registered() {
    let mut rf: Referencer<'static> = Referencer::new().with_quoter(quote_ansi);
    let row = rf.add_table_alias_owned(std::sync::Arc::new(User::default()), "users");
    assert_eq!(rf.reference(&row.id), r#""users"."id""#);

    let q = StatementBuilder::new(PlaceholderFormat::Dollar)
        .delete(&rf.reference(&*row))
        .where_(rf.eq(&row.id, 1i64))
        .build()
        .unwrap();
    assert_eq!(q.sql, r#"DELETE FROM "users" WHERE "users"."id" = $1"#);
}

#[test]
fn test_fmt_rejects_unregistered_fields() {
    let registered = User::default();
    let other = User {
        id: 7,
        first_name: "x'; DROP TABLE users; --".into(),
        ..Default::default()
    };
    let mut rf = Referencer::new();
    rf.add_table_alias(&registered, "u");

    assert_eq!(
        rf.try_fmt("{} = ?", &[&other.first_name]),
        Err(UsageError::UnknownAt(0))
    );
    assert_eq!(
        rf.try_fmt("{} = {}", &[&registered.id, &other.id]),
        Err(UsageError::UnknownAt(1))
    );

    // A clone is a different instance.
    let copy = registered.clone();
    assert!(rf.try_fmt("{}", &[&copy.last_name]).is_err());
}
