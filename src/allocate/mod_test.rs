use super::*;
use std::fs;

fn candidates(needs: &[Option<f64>]) -> Vec<Candidate> {
    needs
        .iter()
        .enumerate()
        .map(|(i, n)| Candidate {
            area_id: format!("A{i}"),
            need: *n,
        })
        .collect()
}

#[test]
fn requested_units_floors_and_ignores_undefined() {
    assert_eq!(requested_units(Some(12.9)), 12);
    assert_eq!(requested_units(Some(0.4)), 0);
    assert_eq!(requested_units(Some(-3.0)), 0);
    assert_eq!(requested_units(None), 0);
    assert_eq!(requested_units(Some(f64::INFINITY)), 0);
}

#[test]
fn two_billion_at_56k_funds_35714_units() {
    // Demand of exactly what the budget can buy, spread over ranked areas.
    let c = candidates(&[Some(20_000.0), Some(10_000.0), Some(5_714.0)]);
    let a = allocate(&c, "top_stress_first", 2_000_000_000, 56_000);

    let units: u64 = a.ledger.iter().map(|r| r.units_allocated).sum();
    assert_eq!(units, 35_714);
    assert_eq!(a.summary.total_units, 35_714);
    assert_eq!(a.summary.total_spend, 35_714 * 56_000);
    assert!(a.summary.total_spend <= 2_000_000_000);
    // The $16,000 left over cannot buy another unit.
    assert_eq!(a.summary.remaining, 16_000);
    assert!(a.summary.remaining < a.summary.cost_per_unit);
    assert_eq!(a.summary.gap_closed_pct, Some(100.0));
    assert_eq!(
        a.ledger.last().unwrap().cumulative_spend,
        a.summary.total_spend
    );
}

#[test]
fn partial_allocation_at_budget_boundary() {
    let c = candidates(&[Some(3.0), Some(10.0), Some(4.0)]);
    let a = allocate(&c, "greedy", 10 * 1_000 + 999, 1_000);
    assert_eq!(a.ledger.len(), 2);
    assert_eq!(a.ledger[0].units_allocated, 3);
    // 7 units left in budget, area asked for 10
    assert_eq!(a.ledger[1].units_allocated, 7);
    assert_eq!(a.ledger[1].need_units, 10);
    assert_eq!(a.summary.remaining, 999);
    assert_eq!(a.summary.total_demand, 17);
    let pct = a.summary.gap_closed_pct.unwrap();
    assert!((pct - 1000.0 / 17.0).abs() < 1e-9, "got {pct}");
}

#[test]
fn never_overspends() {
    let needs = [Some(7.5), Some(120.0), None, Some(33.0), Some(2.0), Some(91.2)];
    for budget in [0u64, 1, 55_999, 56_000, 1_000_000, 3_333_333, 50_000_000] {
        let a = allocate(&candidates(&needs), "s", budget, 56_000);
        let units: u64 = a.ledger.iter().map(|r| r.units_allocated).sum();
        assert!(units * 56_000 <= budget, "overspent budget {budget}");
        assert_eq!(a.summary.total_spend + a.summary.remaining, budget);
    }
}

#[test]
fn ample_budget_closes_full_gap() {
    let needs = [Some(7.5), Some(120.0), None, Some(33.0)];
    let demand = 7 + 120 + 33;
    let a = allocate(&candidates(&needs), "s", demand * 1_000 + 5, 1_000);
    assert_eq!(a.summary.total_units, demand);
    assert_eq!(a.summary.total_demand, demand);
    assert_eq!(a.summary.gap_closed_pct, Some(100.0));
    // The undefined-need area is never funded.
    assert!(a.ledger.iter().all(|r| r.area_id != "A2"));
}

#[test]
fn ledger_skips_unfunded_and_keeps_rank() {
    let a = allocate(&candidates(&[None, Some(2.0), Some(0.0)]), "s", 10_000, 1_000);
    assert_eq!(a.ledger.len(), 1);
    assert_eq!(a.ledger[0].rank, 2);
    assert_eq!(a.summary.areas_funded, 1);
    assert_eq!(a.summary.candidates, 3);
}

#[test]
fn no_demand_leaves_gap_pct_undefined() {
    let a = allocate(&candidates(&[None, Some(0.2)]), "s", 10_000, 1_000);
    assert!(a.ledger.is_empty());
    assert_eq!(a.summary.gap_closed_pct, None);
    assert_eq!(a.summary.remaining, 10_000);
}

#[test]
fn zero_cost_does_not_panic() {
    let a = allocate(&candidates(&[Some(5.0)]), "s", 10_000, 0);
    assert!(a.ledger.is_empty());
}

#[test]
fn rerun_is_byte_identical() {
    let c = candidates(&[Some(40.0), Some(12.0), Some(99.0)]);
    let first = ledger_csv(&allocate(&c, "s", 3_000_000, 56_000)).unwrap();
    let second = ledger_csv(&allocate(&c, "s", 3_000_000, 56_000)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn run_over_ranked_csv_writes_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ranked.csv");
    fs::write(
        &input,
        "rank,area_id,dwelling_gap\n1,B,3\n2,A,NA\n3,C,5.5\n",
    )
    .unwrap();
    let out = dir.path().join("ledger.csv");
    run(&AllocateArgs {
        csv: &input,
        id_column: "area_id",
        need: "dwelling_gap",
        strategy: "ranked",
        budget: 6_000,
        cost_per_unit: 1_000,
        out: Some(&out),
        json: true,
    })
    .unwrap();

    let ledger = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = ledger.lines().collect();
    assert_eq!(
        lines[0],
        "rank,area_id,need_units,units_allocated,cost_per_unit,spend,cumulative_spend"
    );
    assert_eq!(lines[1], "1,B,3,3,1000,3000,3000");
    assert_eq!(lines[2], "3,C,5,3,1000,3000,6000");
    assert_eq!(lines.len(), 3);
}

#[test]
fn run_refuses_repeated_area_and_writes_no_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ranked.csv");
    fs::write(&input, "area_id,dwelling_gap\nA,3\nA,4\nB,2\n").unwrap();
    let out = dir.path().join("ledger.csv");
    let err = run(&AllocateArgs {
        csv: &input,
        id_column: "area_id",
        need: "dwelling_gap",
        strategy: "ranked",
        budget: 1_000_000,
        cost_per_unit: 1_000,
        out: Some(&out),
        json: true,
    })
    .unwrap_err();
    assert!(
        matches!(err, Error::Load(crate::load::LoadError::DuplicateArea { .. })),
        "{err}"
    );
    assert!(!out.exists());
}
