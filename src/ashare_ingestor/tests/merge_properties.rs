use std::collections::HashSet;

use ashare_ingestor::{
    merge::merge,
    models::{
        dataset::DedupKey,
        frame::{as_text, has_column, text_values},
    },
};
use polars::prelude::*;
use proptest::prelude::*;

const CODES: [&str; 4] = ["600001", "000002", "300003", "600004"];
const DATES: [&str; 3] = ["2024-01-01", "2024-01-02", "2024-01-03"];

fn key() -> DedupKey {
    DedupKey::new("代码", "日期")
}

fn frame_from(rows: &[(usize, usize, i64)]) -> DataFrame {
    df!(
        "代码" => rows.iter().map(|r| CODES[r.0]).collect::<Vec<_>>(),
        "日期" => rows.iter().map(|r| DATES[r.1]).collect::<Vec<_>>(),
        "价格" => rows.iter().map(|r| r.2).collect::<Vec<_>>()
    )
    .expect("well-formed rows")
}

/// A valid history: already unique by key.
fn history(rows: &[(usize, usize, i64)]) -> DataFrame {
    merge(None, frame_from(rows), &key()).unwrap()
}

fn column(df: &DataFrame, name: &str) -> Vec<String> {
    text_values(df, name)
        .unwrap()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect()
}

fn keys(df: &DataFrame) -> Vec<(String, String)> {
    column(df, "代码").into_iter().zip(column(df, "日期")).collect()
}

fn triples(df: &DataFrame) -> HashSet<(String, String, String)> {
    keys(df)
        .into_iter()
        .zip(column(df, "价格"))
        .map(|((c, d), v)| (c, d, v))
        .collect()
}

fn rows() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0..CODES.len(), 0..DATES.len(), -50i64..50), 0..12)
}

proptest! {
    #[test]
    fn keys_are_unique_after_merge(existing in rows(), incoming in rows()) {
        let merged = merge(Some(history(&existing)), frame_from(&incoming), &key()).unwrap();
        let ks = keys(&merged);
        let unique: HashSet<_> = ks.iter().cloned().collect();
        prop_assert_eq!(ks.len(), unique.len());
    }

    #[test]
    fn merging_twice_equals_merging_once(existing in rows(), incoming in rows()) {
        let once = merge(Some(history(&existing)), frame_from(&incoming), &key()).unwrap();
        let twice = merge(Some(once.clone()), frame_from(&incoming), &key()).unwrap();

        prop_assert_eq!(once.height(), twice.height());
        prop_assert_eq!(triples(&once), triples(&twice));
    }

    #[test]
    fn incoming_values_win(existing in rows(), incoming in rows()) {
        let merged = merge(Some(history(&existing)), frame_from(&incoming), &key()).unwrap();
        let ks = keys(&merged);
        let prices = column(&merged, "价格");

        for &(c, d, _) in &incoming {
            let last = incoming
                .iter()
                .rev()
                .find(|&&(c2, d2, _)| c2 == c && d2 == d)
                .map(|&(_, _, v)| v)
                .unwrap();
            let idx = ks
                .iter()
                .position(|(kc, kd)| kc == CODES[c] && kd == DATES[d])
                .expect("incoming key present");
            prop_assert_eq!(&prices[idx], &last.to_string());
        }
    }

    #[test]
    fn no_key_is_lost(existing in rows(), incoming in rows()) {
        let merged = merge(Some(history(&existing)), frame_from(&incoming), &key()).unwrap();
        let got: HashSet<_> = keys(&merged).into_iter().collect();
        let want: HashSet<_> = keys(&history(&existing))
            .into_iter()
            .chain(keys(&frame_from(&incoming)))
            .collect();
        prop_assert_eq!(got, want);
    }
}

#[test]
fn disjoint_dates_are_a_plain_union() {
    let existing = frame_from(&[(0, 0, 1), (1, 0, 2)]);
    let incoming = frame_from(&[(0, 1, 3), (1, 1, 4)]);

    let merged = merge(Some(existing.clone()), incoming.clone(), &key()).unwrap();

    assert_eq!(merged.height(), 4);
    assert!(merged.slice(0, 2).equals_missing(&as_text(&existing).unwrap()));
    assert!(merged.slice(2, 2).equals_missing(&as_text(&incoming).unwrap()));
}

#[test]
fn column_tolerance_drops_empty_columns_without_error() {
    let existing = df!(
        "代码" => ["600001"],
        "日期" => ["2024-01-01"],
        "A" => [1i64],
        "B" => [None::<i64>]
    )
    .unwrap();
    let incoming = df!(
        "代码" => ["600001"],
        "日期" => ["2024-01-02"],
        "A" => [2i64],
        "C" => [None::<&str>]
    )
    .unwrap();

    let merged = merge(Some(existing), incoming, &key()).unwrap();

    assert!(has_column(&merged, "A"));
    assert!(!has_column(&merged, "B"));
    assert!(!has_column(&merged, "C"));
    assert_eq!(merged.height(), 2);
}
