use super::*;
use crate::predicate::{Op, Threshold};

fn pop(values: &[(&str, Option<f64>, Option<f64>)]) -> Population {
    Population::new(
        values
            .iter()
            .map(|(id, score, employed)| {
                AreaRecord::new(*id)
                    .with_raw("opportunity_score", *score)
                    .with_raw("employed", *employed)
            })
            .collect(),
    )
}

fn commercial_scheme() -> Scheme {
    Scheme {
        name: "commercial".to_string(),
        default: "none".to_string(),
        tiers: vec![
            Tier {
                name: "established".to_string(),
                when: vec![Predicate::new(
                    "opportunity_score",
                    Op::Ge,
                    Threshold::Percentile(75.0),
                )],
            },
            Tier {
                name: "emerging".to_string(),
                when: vec![
                    Predicate::new("opportunity_score", Op::Ge, Threshold::Value(40.0)),
                    Predicate::new("employed", Op::Ge, Threshold::Value(500.0)),
                ],
            },
        ],
    }
}

#[test]
fn first_matching_tier_wins() {
    let mut p = pop(&[
        ("A", Some(90.0), Some(1000.0)),
        ("B", Some(60.0), Some(800.0)),
        ("C", Some(45.0), Some(100.0)),
        ("D", Some(10.0), Some(5000.0)),
    ]);
    let out = classify_population(&mut p, &[commercial_scheme()]);

    // p75 of [10, 45, 60, 90] = 67.5: only A is established, even though
    // A also satisfies the emerging predicates.
    assert_eq!(p.areas[0].tier("commercial"), Some("established"));
    assert_eq!(p.areas[1].tier("commercial"), Some("emerging"));
    assert_eq!(p.areas[2].tier("commercial"), Some("none"));
    assert_eq!(p.areas[3].tier("commercial"), Some("none"));

    assert_eq!(
        out[0].counts,
        vec![
            ("established".to_string(), 1),
            ("emerging".to_string(), 1),
            ("none".to_string(), 2),
        ]
    );
    let cutoff = out[0].scheme.tiers[0].when[0].cutoff.unwrap();
    assert!((cutoff - 67.5).abs() < 1e-9, "got {cutoff}");
}

#[test]
fn undefined_fields_fall_to_default_without_error() {
    let mut p = pop(&[("A", None, None), ("B", Some(50.0), None)]);
    classify_population(&mut p, &[commercial_scheme()]);
    assert_eq!(p.areas[0].tier("commercial"), Some("none"));
    // B is the p75 area (only defined value), so it is established.
    assert_eq!(p.areas[1].tier("commercial"), Some("established"));
}

#[test]
fn every_area_gets_exactly_one_tier_per_scheme() {
    let mut p = pop(&[
        ("A", Some(1.0), Some(1.0)),
        ("B", Some(2.0), None),
        ("C", None, Some(3.0)),
    ]);
    let mut other = commercial_scheme();
    other.name = "second".to_string();
    other.default = "unclassified".to_string();
    classify_population(&mut p, &[commercial_scheme(), other]);
    for a in &p.areas {
        assert_eq!(a.tiers.len(), 2);
        assert!(a.tier("commercial").is_some());
        assert!(a.tier("second").is_some());
    }
    assert_eq!(p.areas[2].tier("second"), Some("unclassified"));
}

#[test]
fn thresholds_frozen_before_labelling() {
    let p = pop(&[("A", Some(10.0), None), ("B", Some(20.0), None)]);
    let frozen = commercial_scheme().freeze(&p);
    let later = pop(&[("A", Some(1000.0), None), ("B", Some(2000.0), None)]);
    // The cut-off stays at p75 of the original snapshot (17.5).
    assert_eq!(frozen.classify(&later.areas[0]), "established");
}

#[test]
fn filter_drops_areas_below_minimum_and_undefined() {
    let p = pop(&[
        ("A", Some(1.0), Some(1000.0)),
        ("B", Some(1.0), Some(10.0)),
        ("C", Some(1.0), None),
    ]);
    let (kept, outcome) = filter_population(
        p,
        &[Predicate::new("employed", Op::Ge, Threshold::Value(100.0))],
    );
    assert_eq!(kept.len(), 1);
    assert_eq!(kept.areas[0].area_id, "A");
    assert_eq!(outcome.kept, 1);
    assert_eq!(outcome.removed, 2);
}

#[test]
fn no_filters_keep_everyone() {
    let p = pop(&[("A", None, None), ("B", None, None)]);
    let (kept, outcome) = filter_population(p, &[]);
    assert_eq!(kept.len(), 2);
    assert_eq!(outcome.removed, 0);
}
