use super::*;
use crate::value::{Arg, Deferred};
use crate::{and, comma, sql, unsafe_raw};
use std::thread;

fn dbg(params: &[Param]) -> Vec<String> {
    params.iter().map(|p| format!("{p:?}")).collect()
}

fn token_count(sql: &str) -> usize {
    sql.match_indices('$').count()
}

#[test]
fn fragment_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Fragment>();
}

#[test]
fn no_arguments_returns_input() {
    let s = sql!("SELECT * FROM foo");
    assert_eq!(s.query(), "SELECT * FROM foo");
    assert!(s.values().unwrap().is_empty());
}

#[test]
fn completely_empty_raw_initialized() {
    let s = Fragment::from_parts(Vec::new(), Vec::new()).unwrap();
    assert_eq!(s.query(), "");
    assert!(s.values().unwrap().is_empty());
    assert!(s.is_empty());
}

#[test]
fn from_parts_rejects_placeholder_mismatch() {
    let err = Fragment::from_parts(vec![Part::text("id = "), Part::Placeholder], Vec::new())
        .unwrap_err();
    assert!(matches!(
        err,
        FragError::PlaceholderMismatch {
            placeholders: 1,
            values: 0
        }
    ));
}

#[test]
fn single_value_placeholder() {
    let s = sql!("SELECT * FROM foo WHERE id = " {5_i32});
    assert_eq!(s.raw_values().len(), 1);
    assert_eq!(s.query(), "SELECT * FROM foo WHERE id = $1");
    assert_eq!(dbg(&s.values().unwrap()), ["5"]);
    assert!(!s.has_deferred());
}

#[test]
fn deferred_value_is_called_with_call_args() {
    let s = sql!("SELECT * FROM foo WHERE id = " {Deferred::new(|args| {
        let x = *args.get::<i64>(0)?;
        let y = *args.get::<i64>(1)?;
        Ok((5 + x) * y)
    })});
    assert_eq!(s.query(), "SELECT * FROM foo WHERE id = $1");
    let args = CallArgs::new().arg(3_i64).arg(8_i64);
    assert_eq!(dbg(&s.values_with(&args).unwrap()), ["64"]);
    assert!(s.has_deferred());
}

#[test]
fn every_deferred_value_gets_the_same_args() {
    let s = sql!(
        "a = " {Deferred::new(|args| Ok(*args.get::<i32>(0)? * 10))}
        " AND b = " {"fixed"}
        " AND c = " {Deferred::new(|args| Ok(*args.get::<i32>(0)? + 1))}
    );
    let args = CallArgs::new().arg(4_i32);
    assert_eq!(s.query(), "a = $1 AND b = $2 AND c = $3");
    assert_eq!(dbg(&s.values_with(&args).unwrap()), ["40", "\"fixed\"", "5"]);
}

#[test]
fn deferred_failure_propagates() {
    let s = sql!(
        "a = " {1_i32}
        " AND b = " {Deferred::new(|_args| -> FragResult<i32> {
            Err(FragError::deferred("boom"))
        })}
    );
    let err = s.values().unwrap_err();
    assert!(matches!(err, FragError::Deferred(_)));
}

#[test]
fn deferred_without_args_reports_missing_argument() {
    let s = sql!("n = " {Deferred::new(|args| Ok(*args.get::<i32>(0)?))});
    assert!(matches!(
        s.values().unwrap_err(),
        FragError::MissingArgument { index: 0, len: 0 }
    ));
}

#[test]
fn immediate_values_ignore_call_args() {
    let s = sql!("id = " {5_i32});
    let args = CallArgs::new().arg(100_i32);
    assert_eq!(dbg(&s.values_with(&args).unwrap()), ["5"]);
}

#[test]
fn nestable() {
    let cols = sql!("*");
    let test1 = sql!("id = " {5_i32});
    let test2 = sql!("name = " {"hi"});
    let tests = sql!("" {test1} " AND " {test2});
    let s = sql!("SELECT " {cols.clone()} " FROM foo WHERE " {tests.clone()});

    assert_eq!(s.parts().len(), 5);
    assert!(matches!(&s.parts()[1], Part::Fragment(f) if Fragment::ptr_eq(f, &cols)));
    assert!(matches!(&s.parts()[3], Part::Fragment(f) if Fragment::ptr_eq(f, &tests)));
    assert!(matches!(&s.parts()[4], Part::Text(t) if t.is_empty()));
    assert!(s.raw_values().is_empty());

    assert_eq!(s.query(), "SELECT * FROM foo WHERE id = $1 AND name = $2");
    assert_eq!(dbg(&s.values().unwrap()), ["5", "\"hi\""]);
}

#[test]
fn unsafe_inlines_nested() {
    let cols = sql!("" {unsafe_raw("*")} "");
    let tests = sql!("id = " {5_i32});
    let s = sql!("SELECT " {cols} " FROM foo WHERE " {tests});
    assert!(s.raw_values().is_empty());
    assert_eq!(s.query(), "SELECT * FROM foo WHERE id = $1");
    assert_eq!(dbg(&s.values().unwrap()), ["5"]);
}

#[test]
fn flattenable() {
    let cols = sql!("" {unsafe_raw("*")} "");
    let test1 = sql!("id = " {5_i32});
    let test2 = sql!("name = " {"hi"});
    let tests = sql!("" {test1} " AND " {test2});
    let s = sql!("SELECT " {cols} " FROM foo WHERE " {tests}).flatten();

    let parts = s.parts();
    assert_eq!(parts.len(), 5);
    assert!(matches!(&parts[0], Part::Text(t) if t == "SELECT * FROM foo WHERE id = "));
    assert!(matches!(parts[1], Part::Placeholder));
    assert!(matches!(&parts[2], Part::Text(t) if t == " AND name = "));
    assert!(matches!(parts[3], Part::Placeholder));
    assert!(matches!(&parts[4], Part::Text(t) if t.is_empty()));
    assert_eq!(s.raw_values().len(), 2);

    assert_eq!(s.query(), "SELECT * FROM foo WHERE id = $1 AND name = $2");
    assert_eq!(dbg(&s.values().unwrap()), ["5", "\"hi\""]);
}

#[test]
fn flatten_keeps_adjacent_placeholders_apart() {
    let mut t = crate::Template::new();
    t.push_bind(1_i32).push_bind(2_i32);
    let flat = t.finish().flatten();
    // Empty text between the two placeholders is still a text run.
    assert_eq!(flat.parts().len(), 5);
    assert_eq!(flat.query(), "$1$2");
}

#[test]
fn flatten_of_empty_has_no_parts() {
    let flat = Fragment::empty().flatten();
    assert!(flat.parts().is_empty());
    assert_eq!(flat.query(), "");
}

#[test]
fn flatten_equivalence() {
    let inner = comma([Arg::from(1_i32), Arg::from(sql!("now()")), Arg::from("x")]);
    let f = sql!("INSERT INTO t VALUES (" {inner} ") RETURNING " {unsafe_raw("id")});
    let flat = f.flatten();
    assert_eq!(flat.query(), f.query());
    assert_eq!(dbg(&flat.values().unwrap()), dbg(&f.values().unwrap()));
}

#[test]
fn flatten_preserves_deferred_values() {
    let f = sql!("x = " {Deferred::new(|args| Ok(*args.get::<i32>(0)?))});
    let flat = f.flatten();
    assert!(flat.has_deferred());
    let args = CallArgs::new().arg(9_i32);
    assert_eq!(dbg(&flat.values_with(&args).unwrap()), ["9"]);
}

#[test]
fn order_preserved_across_depth() {
    let deep = sql!("d = " {4_i32});
    let mid = sql!("c = " {3_i32} " AND " {deep});
    let f1 = sql!("a = " {1_i32});
    let f2 = sql!("b = " {2_i32} " AND " {mid});
    let parent = and([f1.clone(), f2.clone()]);

    let mut expected = dbg(&f1.values().unwrap());
    expected.extend(dbg(&f2.values().unwrap()));
    assert_eq!(dbg(&parent.values().unwrap()), expected);
    assert_eq!(expected, ["1", "2", "3", "4"]);
    assert_eq!(parent.query(), "a = $1 AND b = $2 AND c = $3 AND d = $4");
}

#[test]
fn shared_subtree_is_numbered_per_occurrence() {
    let cond = sql!("x = " {1_i32});
    let f = sql!("" {cond.clone()} " OR " {cond.clone()});
    assert_eq!(f.query(), "x = $1 OR x = $2");
    assert_eq!(dbg(&f.values().unwrap()), ["1", "1"]);
    // The shared child renders independently of its parents.
    assert_eq!(cond.query(), "x = $1");
}

#[test]
fn placeholder_count_matches_values() {
    let f = and([
        sql!("a = " {1_i32}),
        sql!("b IN (" {comma([2_i32, 3, 4])} ")"),
        sql!("c = " {Deferred::new(|args| Ok(*args.get::<i32>(0)?))}),
    ]);
    let args = CallArgs::new().arg(5_i32);
    assert_eq!(token_count(f.query()), f.values_with(&args).unwrap().len());
    assert_eq!(token_count(f.query()), f.param_count());
    assert_eq!(f.param_count(), 5);
}

#[test]
fn many_placeholders_number_without_gaps() {
    let f = comma((0..120).map(|i| i as i64));
    let sql = f.query();
    assert!(sql.starts_with("$1, $2, "));
    assert!(sql.contains("$99, $100, $101"));
    assert!(sql.ends_with("$120"));
    assert_eq!(f.values().unwrap().len(), 120);
}

#[test]
fn render_is_idempotent() {
    let f = sql!("id = " {5_i32} " AND " {sql!("name = " {"hi"})});
    let first_sql = f.query().to_string();
    let first_values = dbg(&f.values().unwrap());
    assert_eq!(f.query(), first_sql);
    assert_eq!(dbg(&f.values().unwrap()), first_values);
    // Same memoized string both times.
    assert!(std::ptr::eq(f.query(), f.query()));
}

#[test]
fn values_returns_fresh_vec_each_call() {
    let f = sql!("id = " {5_i32});
    let mut a = f.values().unwrap();
    a.clear();
    assert_eq!(f.values().unwrap().len(), 1);
}

#[test]
fn deep_concat_chain_does_not_overflow() {
    let mut f = Fragment::text("SELECT 1");
    for i in 0..50_000 {
        f = f.concat(&sql!("+ " {i as i64}));
    }
    assert_eq!(f.param_count(), 50_000);
    assert!(f.query().ends_with("+ $50000"));
}

#[test]
fn concurrent_first_render_is_consistent() {
    let f = and((0..200).map(|i| sql!("c = " {i as i64})));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let f = f.clone();
            thread::spawn(move || (f.query().to_string(), f.param_count()))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (sql, count) in &results {
        assert_eq!(sql, &results[0].0);
        assert_eq!(*count, 200);
    }
}

#[test]
fn display_and_debug() {
    let f = sql!("id = " {5_i32});
    assert_eq!(f.to_string(), "id = $1");
    assert_eq!(format!("{f:?}"), r#"Fragment { sql: "id = $1", params: 1 }"#);
}
