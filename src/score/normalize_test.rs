use super::*;
use crate::population::AreaRecord;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}

fn pop(field: &str, values: &[Option<f64>]) -> Population {
    Population::new(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| AreaRecord::new(format!("{:03}", i)).with_raw(field, *v))
            .collect(),
    )
}

fn spec(source: &str, score: &str, method: Method, invert: bool) -> MetricSpec {
    MetricSpec {
        source: source.to_string(),
        score: score.to_string(),
        method,
        invert,
    }
}

fn derived(p: &Population, name: &str) -> Vec<Option<f64>> {
    p.areas.iter().map(|a| a.derived[name]).collect()
}

#[test]
fn professional_density_example() {
    // National mean is 354.15; the lowest area sits exactly on it.
    let mut p = pop(
        "professional_density",
        &[Some(1224.3), Some(947.0), Some(900.4), Some(354.15)],
    );
    normalize_population(
        &mut p,
        &[spec(
            "professional_density",
            "professional_density_score",
            Method::Percentile,
            false,
        )],
    );
    let s: Vec<f64> = derived(&p, "professional_density_score")
        .into_iter()
        .map(|v| v.unwrap())
        .collect();
    assert!(close(s[0], 100.0), "got {}", s[0]);
    assert!(close(s[1], 66.67), "got {}", s[1]);
    assert!(close(s[2], 33.33), "got {}", s[2]);
    assert!(close(s[3], 0.0), "got {}", s[3]);
}

#[test]
fn percentile_ties_share_average_rank() {
    let sorted = [1.0, 2.0, 2.0, 3.0];
    // ranks 1 and 2 averaged -> 1.5 / 3 -> 50
    assert!(close(percentile_rank(2.0, &sorted), 50.0));
    assert!(close(percentile_rank(1.0, &sorted), 0.0));
    assert!(close(percentile_rank(3.0, &sorted), 100.0));
}

#[test]
fn percentile_flat_population_ties_at_middle() {
    let sorted = [5.0, 5.0, 5.0];
    assert!(close(percentile_rank(5.0, &sorted), 50.0));
}

#[test]
fn percentile_single_value_is_flat() {
    assert!(close(percentile_rank(9.0, &[9.0]), FLAT_SCORE));
}

#[test]
fn percentile_invariant_under_affine_transform() {
    let raw = [3.0, 17.5, -2.0, 17.5, 8.25, 0.0, 41.0];
    let mut a = pop("x", &raw.map(Some));
    let mut b = pop("x", &raw.map(|v| Some(2.0 * v + 5.0)));
    let metric = [spec("x", "x_score", Method::Percentile, false)];
    normalize_population(&mut a, &metric);
    normalize_population(&mut b, &metric);
    assert_eq!(derived(&a, "x_score"), derived(&b, "x_score"));
}

#[test]
fn min_max_scales_to_range() {
    assert!(close(min_max(5.0, 0.0, 10.0), 50.0));
    assert!(close(min_max(0.0, 0.0, 10.0), 0.0));
    assert!(close(min_max(10.0, 0.0, 10.0), 100.0));
}

#[test]
fn min_max_flat_population_is_fifty() {
    let mut p = pop("x", &[Some(4.2), Some(4.2), None, Some(4.2)]);
    normalize_population(&mut p, &[spec("x", "x_score", Method::MinMax, false)]);
    let s = derived(&p, "x_score");
    assert_eq!(s, vec![Some(50.0), Some(50.0), None, Some(50.0)]);
}

#[test]
fn missing_input_gives_missing_output() {
    let mut p = pop("x", &[Some(1.0), None, Some(3.0)]);
    let out = normalize_population(&mut p, &[spec("x", "x_score", Method::Percentile, false)]);
    assert_eq!(p.areas[1].derived["x_score"], None);
    assert_eq!(out[0].defined, 2);
    assert_eq!(out[0].undefined, 1);
    assert!(p.areas[1].flags.iter().any(|f| f == "x_score: missing x"));
    // The two defined areas rank against each other only.
    assert_eq!(p.areas[0].derived["x_score"], Some(0.0));
    assert_eq!(p.areas[2].derived["x_score"], Some(100.0));
}

#[test]
fn invert_turns_supply_into_deficit() {
    let mut p = pop("supply", &[Some(0.0), Some(10.0)]);
    normalize_population(
        &mut p,
        &[spec("supply", "supply_deficit", Method::MinMax, true)],
    );
    assert_eq!(p.areas[0].derived["supply_deficit"], Some(100.0));
    assert_eq!(p.areas[1].derived["supply_deficit"], Some(0.0));
}

#[test]
fn scores_stay_in_range() {
    let raw = [12.0, -3.0, 7.7, 1e6, 0.5];
    for method in [Method::Percentile, Method::MinMax] {
        let mut p = pop("x", &raw.map(Some));
        normalize_population(&mut p, &[spec("x", "s", method, false)]);
        for v in derived(&p, "s") {
            let v = v.unwrap();
            assert!((0.0..=100.0).contains(&v), "{method:?} out of range: {v}");
        }
    }
}

#[test]
fn report_carries_source_range() {
    let mut p = pop("x", &[Some(2.0), Some(8.0)]);
    let out = normalize_population(&mut p, &[spec("x", "s", Method::MinMax, false)]);
    assert_eq!(out[0].source_min, Some(2.0));
    assert_eq!(out[0].source_max, Some(8.0));
    assert_eq!(out[0].method, Method::MinMax);
}
