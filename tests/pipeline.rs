use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use superstore::app::pipeline::{DatasetHandle, run_query};
use superstore::data::{SampleConfig, generate_dataset};
use superstore::domain::{Dataset, FilterSpec, MonthKey, Ranked, Record};
use superstore::engine::{filter, summarize};
use superstore::io::ingest::LoadOptions;
use superstore::io::{SummaryFile, read_summary_json, write_filtered_csv, write_summary_json};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn two_orders() -> Dataset {
    Dataset::new(
        Vec::new(),
        vec![
            Record::new(d(2023, 1, 15), "Furniture", "East", Decimal::from(100), Decimal::from(10)),
            Record::new(d(2023, 2, 20), "Tech", "West", Decimal::from(200), Decimal::from(-5)),
        ],
    )
}

fn ranked(key: &str, value: i64) -> Ranked {
    Ranked {
        key: key.to_string(),
        value: Decimal::from(value),
    }
}

fn sample() -> Dataset {
    generate_dataset(&SampleConfig {
        rows: 400,
        seed: 2024,
        ..SampleConfig::default()
    })
    .unwrap()
}

/// A spread of filters over the sample: full domain, narrow windows, single values, empty lists.
fn specs(ds: &Dataset) -> Vec<FilterSpec> {
    let all = FilterSpec::all(ds);
    let none: [&str; 0] = [];
    vec![
        all.clone(),
        all.clone().with_dates(d(2015, 3, 1), d(2015, 8, 31)).unwrap(),
        all.clone().with_dates(d(2016, 7, 4), d(2016, 7, 4)).unwrap(),
        all.clone().with_categories(["Technology"]),
        all.clone().with_regions(["West", "East"]),
        all.clone().with_categories(["Furniture"]).with_regions(["South"]),
        all.clone().with_categories(none),
        all.with_dates(d(2030, 1, 1), d(2030, 12, 31)).unwrap(),
    ]
}

#[test]
fn worked_example_full_filter() {
    let ds = two_orders();
    let spec = FilterSpec::new(d(2023, 1, 1), d(2023, 12, 31), ["Furniture", "Tech"], ["East", "West"]).unwrap();

    let result = summarize(filter(&ds, &spec).iter());
    assert_eq!(result.order_count, 2);
    assert_eq!(result.total_sales, Decimal::from(300));
    assert_eq!(result.total_profit, Decimal::from(5));
    assert_eq!(result.average_order_value, Decimal::from(150));
    assert_eq!(result.sales_by_category, vec![ranked("Tech", 200), ranked("Furniture", 100)]);
    assert_eq!(result.profit_by_region, vec![ranked("East", 10), ranked("West", -5)]);

    let months: Vec<(String, Decimal)> = result
        .monthly_sales_series
        .iter()
        .map(|p| (p.month.to_string(), p.sales))
        .collect();
    assert_eq!(
        months,
        vec![
            ("2023-01".to_string(), Decimal::from(100)),
            ("2023-02".to_string(), Decimal::from(200)),
        ]
    );
}

#[test]
fn worked_example_single_category() {
    let ds = two_orders();
    let spec = FilterSpec::new(d(2023, 1, 1), d(2023, 12, 31), ["Furniture"], ["East", "West"]).unwrap();

    let result = summarize(filter(&ds, &spec).iter());
    assert_eq!(result.total_sales, Decimal::from(100));
    assert_eq!(result.total_profit, Decimal::from(10));
    assert_eq!(result.average_order_value, Decimal::from(100));
    assert_eq!(result.sales_by_category, vec![ranked("Furniture", 100)]);
    assert_eq!(result.profit_by_region, vec![ranked("East", 10)]);
}

#[test]
fn filter_partitions_the_dataset() {
    let ds = sample();
    for spec in specs(&ds) {
        let kept = filter(&ds, &spec);
        let kept_count = ds.records.iter().filter(|r| spec.matches(r)).count();
        assert_eq!(kept.len(), kept_count);

        for r in kept.iter() {
            assert!(r.order_date >= spec.date_start() && r.order_date <= spec.date_end());
            assert!(spec.categories().contains(&r.category));
            assert!(spec.regions().contains(&r.region));
        }
        for r in ds.records.iter().filter(|r| !spec.matches(r)) {
            let in_range = r.order_date >= spec.date_start() && r.order_date <= spec.date_end();
            assert!(!in_range || !spec.categories().contains(&r.category) || !spec.regions().contains(&r.region));
        }
    }
}

#[test]
fn aggregates_are_consistent_and_ordered() {
    let ds = sample();
    for spec in specs(&ds) {
        let first = summarize(filter(&ds, &spec).iter());
        let second = summarize(filter(&ds, &spec).iter());
        assert_eq!(first, second);

        let by_category: Decimal = first.sales_by_category.iter().map(|r| r.value).sum();
        let by_region: Decimal = first.profit_by_region.iter().map(|r| r.value).sum();
        let by_month: Decimal = first.monthly_sales_series.iter().map(|p| p.sales).sum();
        assert_eq!(by_category, first.total_sales);
        assert_eq!(by_region, first.total_profit);
        assert_eq!(by_month, first.total_sales);

        assert!(first.sales_by_category.windows(2).all(|w| w[0].value >= w[1].value));
        assert!(first.profit_by_region.windows(2).all(|w| w[0].value >= w[1].value));
        assert!(first.monthly_sales_series.windows(2).all(|w| w[0].month < w[1].month));
    }
}

#[test]
fn empty_selection_yields_zeroes() {
    let ds = sample();
    let spec = FilterSpec::all(&ds).with_dates(d(2030, 1, 1), d(2030, 12, 31)).unwrap();
    let result = summarize(filter(&ds, &spec).iter());

    assert_eq!(result.order_count, 0);
    assert_eq!(result.total_sales, Decimal::ZERO);
    assert_eq!(result.total_profit, Decimal::ZERO);
    assert_eq!(result.average_order_value, Decimal::ZERO);
    assert!(result.sales_by_category.is_empty());
    assert!(result.profit_by_category.is_empty());
    assert!(result.sales_by_region.is_empty());
    assert!(result.profit_by_region.is_empty());
    assert!(result.monthly_sales_series.is_empty());
}

#[test]
fn inverted_range_is_a_validation_error() {
    let err = FilterSpec::new(d(2023, 12, 31), d(2023, 1, 1), ["Tech"], ["West"]).unwrap_err();
    assert!(err.to_string().contains("inverted"));
}

#[test]
fn csv_export_reloads_to_the_same_summary() {
    let dir = tempfile::tempdir().unwrap();
    let ds = sample();

    // Whole dataset: written, read back, aggregated identically.
    let full_path = dir.path().join("sample.csv");
    write_filtered_csv(&full_path, &filter(&ds, &FilterSpec::all(&ds))).unwrap();
    let handle = DatasetHandle::new(LoadOptions::new(&full_path));
    let reloaded = handle.get().unwrap();
    assert_eq!(reloaded.headers, ds.headers);
    assert_eq!(reloaded.len(), ds.len());
    let everything = FilterSpec::all(&ds);
    assert_eq!(run_query(&reloaded, &everything), run_query(&ds, &everything));

    // Filtered subset: the export holds exactly the matching rows.
    let spec = FilterSpec::all(&ds).with_categories(["Office Supplies"]);
    let subset_path = dir.path().join("office.csv");
    write_filtered_csv(&subset_path, &filter(&ds, &spec)).unwrap();
    let subset = DatasetHandle::new(LoadOptions::new(&subset_path)).get().unwrap();
    assert!(subset.records.iter().all(|r| r.category == "Office Supplies"));
    assert_eq!(
        summarize(subset.records.iter()),
        summarize(filter(&ds, &spec).iter())
    );
}

#[test]
fn summary_json_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ds = two_orders();
    let spec = FilterSpec::all(&ds);
    let result = summarize(filter(&ds, &spec).iter());

    let path = dir.path().join("summary.json");
    write_summary_json(&path, &SummaryFile::new(None, &spec, &result)).unwrap();
    let back = read_summary_json(&path).unwrap();

    assert_eq!(back.filter, spec);
    assert_eq!(back.result, result);
    assert_eq!(
        back.result.monthly_sales_series[0].month,
        MonthKey { year: 2023, month: 1 }
    );
}

#[test]
fn concurrent_queries_share_one_dataset() {
    let ds = Arc::new(sample());
    let specs = specs(&ds);
    let expected: Vec<_> = specs.iter().map(|s| run_query(&ds, s)).collect();

    let workers: Vec<_> = specs
        .into_iter()
        .map(|spec| {
            let ds = Arc::clone(&ds);
            thread::spawn(move || run_query(&ds, &spec))
        })
        .collect();

    for (worker, want) in workers.into_iter().zip(expected) {
        assert_eq!(worker.join().unwrap(), want);
    }
}
