//! Property tests for the date join and curve ordering.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use fwd_curves::curve::{Assignments, MaturityRegistry, ThirdFriday, build_curve, merge, third_friday};
use fwd_curves::domain::{PricePoint, Series, SourceColumns};
use fwd_curves::io::{parse_rows, read_price_rows, write_merged_csv};
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// Up to four maturities, each with observations on day offsets in 0..60.
fn inputs() -> impl Strategy<Value = Vec<Vec<(u16, u32)>>> {
    prop::collection::vec(prop::collection::vec((0u16..60, 1u32..100_000), 0..25), 1..5)
}

fn spot_input() -> impl Strategy<Value = Option<Vec<(u16, u32)>>> {
    prop::option::of(prop::collection::vec((0u16..60, 1u32..100_000), 0..25))
}

fn series_of(points: &[(u16, u32)]) -> Series {
    Series::from_points(points.iter().map(|&(day, cents)| PricePoint {
        date: base() + chrono::Duration::days(day.into()),
        price: f64::from(cents) / 100.0,
    }))
}

/// Registry with one maturity per input (Feb 2024 onwards) and one file per maturity.
fn setup(inputs: &[Vec<(u16, u32)>]) -> (MaturityRegistry, Assignments, BTreeMap<String, Series>) {
    let mut registry = MaturityRegistry::new();
    let mut assignments = Assignments::new();
    let mut series = BTreeMap::new();
    for (i, points) in inputs.iter().enumerate() {
        let delivery = registry.add(i as u32 + 2, 2024).unwrap();
        let file = format!("f{i}.csv");
        assignments.insert(file.clone(), Some(delivery.id));
        series.insert(file, series_of(points));
    }
    (registry, assignments, series)
}

proptest! {
    #[test]
    fn rows_are_strictly_descending_and_cover_the_union(inputs in inputs(), spot in spot_input()) {
        let (registry, assignments, series) = setup(&inputs);
        let spot = spot.map(|p| series_of(&p));
        let table = merge(&registry, &assignments, &series, spot.as_ref()).unwrap();

        for pair in table.rows.windows(2) {
            prop_assert!(pair[0].date > pair[1].date);
        }

        let mut union: BTreeSet<NaiveDate> = series.values().flat_map(|s| s.dates()).collect();
        if let Some(spot) = &spot {
            union.extend(spot.dates());
        }
        let got: BTreeSet<NaiveDate> = table.dates().collect();
        prop_assert_eq!(got, union);
    }

    #[test]
    fn each_cell_is_the_assigned_series_price(inputs in inputs(), spot in spot_input()) {
        let (registry, assignments, series) = setup(&inputs);
        let spot = spot.map(|p| series_of(&p));
        let table = merge(&registry, &assignments, &series, spot.as_ref()).unwrap();

        for row in &table.rows {
            prop_assert_eq!(row.prices.len(), registry.len());
            for (file, id) in &assignments {
                let id = id.as_deref().unwrap();
                prop_assert_eq!(row.price(id), series[file].get(row.date));
            }
            let expected_spot = spot.as_ref().and_then(|s| s.get(row.date));
            prop_assert_eq!(row.spot, expected_spot);
        }
    }

    #[test]
    fn merged_export_round_trips_every_column(inputs in inputs()) {
        let (registry, assignments, series) = setup(&inputs);
        let table = merge(&registry, &assignments, &series, None).unwrap();

        let mut buf = Vec::new();
        write_merged_csv(&mut buf, &table).unwrap();

        for (file, id) in &assignments {
            let id = id.as_deref().unwrap();
            let columns = SourceColumns { date: "date".to_string(), price: id.to_string() };
            let rows = read_price_rows(buf.as_slice(), &columns).unwrap();
            prop_assert_eq!(&parse_rows(rows).series, &series[file]);
        }
    }

    #[test]
    fn curves_skip_gaps_and_keep_registry_order(inputs in inputs(), day in 0u16..60) {
        let (registry, assignments, series) = setup(&inputs);
        let table = merge(&registry, &assignments, &series, None).unwrap();
        let date = base() + chrono::Duration::days(day.into());

        match table.row(date) {
            None => prop_assert!(build_curve(date, &table, &registry, &ThirdFriday).is_err()),
            Some(row) => {
                let curve = build_curve(date, &table, &registry, &ThirdFriday).unwrap();
                let expected: Vec<String> = registry
                    .ids()
                    .into_iter()
                    .filter(|id| row.price(id).is_some())
                    .collect();
                let got: Vec<String> = curve.points.iter().map(|p| p.maturity.clone()).collect();
                prop_assert_eq!(got, expected);
                for pair in curve.points.windows(2) {
                    prop_assert!(pair[0].time_to_maturity_days < pair[1].time_to_maturity_days);
                }
            }
        }
    }

    #[test]
    fn third_friday_is_the_third_friday(year in 1990i32..2100, month in 1u32..=12) {
        let date = third_friday(year, month).unwrap();
        prop_assert_eq!(date.weekday(), chrono::Weekday::Fri);
        prop_assert_eq!(date.month(), month);
        prop_assert!((15..=21).contains(&date.day()));
    }
}
