use super::*;

fn pop(values: &[Option<f64>]) -> Population {
    Population::new(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| AreaRecord::new(format!("A{i}")).with_raw("score", *v))
            .collect(),
    )
}

#[derive(serde::Deserialize)]
struct Wrapper {
    when: Vec<Predicate>,
}

#[test]
fn parses_value_and_percentile_forms() {
    let w: Wrapper = toml::from_str(
        r#"when = [
            { field = "score", op = ">=", percentile = 75 },
            { field = "total_population", op = ">", value = 100 },
        ]"#,
    )
    .unwrap();
    assert_eq!(w.when[0].threshold, Threshold::Percentile(75.0));
    assert_eq!(w.when[0].op, Op::Ge);
    assert_eq!(w.when[1].threshold, Threshold::Value(100.0));
    assert_eq!(w.when[1].op, Op::Gt);
}

#[test]
fn rejects_both_value_and_percentile() {
    let r: Result<Wrapper, _> = toml::from_str(
        r#"when = [{ field = "score", op = ">=", value = 1, percentile = 50 }]"#,
    );
    assert!(r.is_err());
}

#[test]
fn rejects_missing_threshold() {
    let r: Result<Wrapper, _> = toml::from_str(r#"when = [{ field = "score", op = "<" }]"#);
    assert!(r.is_err());
}

#[test]
fn rejects_percentile_out_of_range() {
    let r: Result<Wrapper, _> =
        toml::from_str(r#"when = [{ field = "score", op = ">=", percentile = 120 }]"#);
    assert!(r.is_err());
}

#[test]
fn rejects_unknown_operator() {
    let r: Result<Wrapper, _> =
        toml::from_str(r#"when = [{ field = "score", op = "==", value = 1 }]"#);
    assert!(r.is_err());
}

#[test]
fn percentile_resolves_over_defined_values_only() {
    let p = pop(&[Some(10.0), None, Some(20.0), Some(30.0), Some(40.0)]);
    let resolved = Predicate::new("score", Op::Ge, Threshold::Percentile(75.0)).resolve(&p);
    let c = resolved.cutoff.unwrap();
    assert!((c - 32.5).abs() < 1e-9, "p75 should be 32.5, got {c}");
}

#[test]
fn undefined_field_never_matches() {
    let p = pop(&[Some(10.0), None]);
    let resolved = Predicate::new("score", Op::Le, Threshold::Value(100.0)).resolve(&p);
    assert!(resolved.matches(&p.areas[0]));
    assert!(!resolved.matches(&p.areas[1]));
}

#[test]
fn percentile_over_empty_field_never_matches() {
    let p = pop(&[None, None]);
    let resolved = Predicate::new("score", Op::Ge, Threshold::Percentile(50.0)).resolve(&p);
    assert!(resolved.cutoff.is_none());
    assert!(!resolved.matches(&p.areas[0]));
}

#[test]
fn resolved_cutoff_is_frozen() {
    let mut p = pop(&[Some(1.0), Some(2.0), Some(3.0)]);
    let resolved = Predicate::new("score", Op::Ge, Threshold::Percentile(50.0)).resolve(&p);
    // Mutating the population afterwards must not move the cut-off.
    p.areas[0].raw.insert("score".to_string(), Some(100.0));
    assert_eq!(resolved.cutoff, Some(2.0));
    assert!(resolved.matches(&p.areas[0]));
}

#[test]
fn empty_conjunction_matches() {
    let p = pop(&[None]);
    assert!(all_match(&[], &p.areas[0]));
}

#[test]
fn display_shows_percentile_source() {
    let p = pop(&[Some(1.0), Some(3.0)]);
    let resolved = Predicate::new("score", Op::Ge, Threshold::Percentile(50.0)).resolve(&p);
    assert_eq!(resolved.to_string(), "score >= 2.00 (p50)");
    let fixed = Predicate::new("score", Op::Lt, Threshold::Value(5.0)).resolve(&p);
    assert_eq!(fixed.to_string(), "score < 5.00");
}
