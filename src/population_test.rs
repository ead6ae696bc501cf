use super::*;
use crate::stats::mean_defined;

fn rent_to_income() -> RatioSpec {
    RatioSpec {
        name: "rent_to_income".to_string(),
        numerator: "rent".to_string(),
        denominator: "income".to_string(),
        scale: 100.0,
    }
}

#[test]
fn value_lookup_prefers_composite_then_derived() {
    let mut a = AreaRecord::new("101").with_raw("x", Some(1.0));
    assert_eq!(a.value("x"), Some(1.0));
    a.derived.insert("x".to_string(), Some(2.0));
    assert_eq!(a.value("x"), Some(2.0));
    a.composite.insert("x".to_string(), Some(3.0));
    assert_eq!(a.value("x"), Some(3.0));
}

#[test]
fn value_of_absent_or_undefined_field_is_none() {
    let a = AreaRecord::new("101").with_raw("suppressed", None);
    assert_eq!(a.value("suppressed"), None);
    assert_eq!(a.value("never_loaded"), None);
}

#[test]
fn ratio_guards_zero_denominator() {
    assert_eq!(ratio(Some(380.0), Some(0.0), 100.0), None);
    assert_eq!(ratio(Some(0.0), Some(0.0), 1.0), None);
}

#[test]
fn ratio_propagates_missing_inputs() {
    assert_eq!(ratio(None, Some(10.0), 1.0), None);
    assert_eq!(ratio(Some(10.0), None, 1.0), None);
}

#[test]
fn ratio_scales() {
    let r = ratio(Some(380.0), Some(1900.0), 100.0).unwrap();
    assert!((r - 20.0).abs() < 1e-9, "expected 20%, got {r}");
}

#[test]
fn zero_income_area_gets_undefined_ratio_not_infinity() {
    let mut pop = Population::new(vec![
        AreaRecord::new("A")
            .with_raw("rent", Some(380.0))
            .with_raw("income", Some(0.0)),
        AreaRecord::new("B")
            .with_raw("rent", Some(400.0))
            .with_raw("income", Some(2000.0)),
        AreaRecord::new("C")
            .with_raw("rent", Some(300.0))
            .with_raw("income", Some(1000.0)),
    ]);

    let undefined = derive_ratios(&mut pop, &[rent_to_income()]);
    assert_eq!(undefined, 1);
    assert_eq!(pop.areas[0].value("rent_to_income"), None);
    assert!(pop.areas[0].flags[0].starts_with("rent_to_income"));

    let avg = mean_defined(pop.values("rent_to_income")).unwrap();
    assert!(avg.is_finite());
    // (20 + 30) / 2, not (0 + 20 + 30) / 3 and not inf
    assert!((avg - 25.0).abs() < 1e-9, "expected 25, got {avg}");
}
