//! Formula parsing and evaluation.

use proptest::prelude::*;
use uds_transform::{Expression, TransformError};

fn lookup<'a>(values: &'a [(&'a str, f64)]) -> impl Fn(&str) -> Option<f64> + 'a {
    move |name| values.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
}

#[test]
fn en_dash_reads_as_minus() {
    let expr = Expression::parse("PDYR – BIRTHYR").expect("parse");
    assert_eq!(expr.text(), "pdyr - birthyr");
    assert_eq!(
        expr.evaluate(lookup(&[("pdyr", 2001.0), ("birthyr", 1941.0)])),
        Some(60.0)
    );
}

#[test]
fn formulas_never_execute_text() {
    for formula in ["__import__('os')", "a; b", "a == b", "a[0]"] {
        assert!(
            matches!(Expression::parse(formula), Err(TransformError::Expression { .. })),
            "{formula}"
        );
    }
}

proptest! {
    #[test]
    fn difference_matches_arithmetic(a in -10_000i32..10_000, b in -10_000i32..10_000) {
        let expr = Expression::parse("a - b").expect("parse");
        let values = [("a", f64::from(a)), ("b", f64::from(b))];
        prop_assert_eq!(expr.evaluate(lookup(&values)), Some(f64::from(a - b)));
    }

    #[test]
    fn display_reparses_to_same_value(
        a in -1_000i32..1_000,
        b in -1_000i32..1_000,
        c in 1i32..100,
    ) {
        let expr = Expression::parse("(a + b) * 3 - a / c").expect("parse");
        let reparsed = Expression::parse(&expr.root().to_string()).expect("reparse");
        let values = [("a", f64::from(a)), ("b", f64::from(b)), ("c", f64::from(c))];
        prop_assert_eq!(
            expr.evaluate(lookup(&values)),
            reparsed.evaluate(lookup(&values))
        );
    }
}
