use approx::assert_relative_eq;
use chrono::NaiveDate;
use procure_data::catalog::SupplierCatalog;
use procure_data::generator::{GeneratorConfig, TransactionGenerator};
use procure_data::{DataError, Transaction};
use rstest::rstest;
use std::collections::HashSet;

fn generate(config: GeneratorConfig) -> Vec<Transaction> {
    TransactionGenerator::new(config, SupplierCatalog::default())
        .unwrap()
        .generate()
        .unwrap()
}

#[test]
fn test_seed_42_scenario() {
    let transactions = generate(GeneratorConfig::default());

    assert_eq!(transactions.len(), 2000);
    let ids: Vec<u64> = transactions.iter().map(|t| t.order_id).collect();
    assert_eq!(ids, (1..=2000).collect::<Vec<u64>>());

    let suppliers: HashSet<&str> = transactions
        .iter()
        .map(|t| t.supplier_name.as_str())
        .collect();
    assert!(suppliers.len() <= 22);
    // 2000 uniform draws over 22 suppliers leave none unused in practice
    assert_eq!(suppliers.len(), 22);

    let total_cents: i64 = transactions.iter().map(Transaction::spend_cents).sum();
    assert_eq!(total_cents, 4_924_353_511_280);
    let total: f64 = transactions.iter().map(|t| t.total_spend).sum();
    assert_relative_eq!(total, 49_243_535_112.80, max_relative = 1e-12);
}

#[test]
fn test_seed_42_stored_rows() {
    let transactions = generate(GeneratorConfig::default());

    assert_eq!(
        transactions[0],
        Transaction {
            order_id: 1,
            order_date: NaiveDate::from_ymd_opt(2022, 7, 31).unwrap(),
            supplier_name: "Amgen".to_string(),
            total_spend: 31_826_890.31,
            therapeutic_category: "Neurology".to_string(),
            on_time_delivery: true,
            lead_time: 34,
        }
    );
    assert_eq!(
        transactions[1999],
        Transaction {
            order_id: 2000,
            order_date: NaiveDate::from_ymd_opt(2023, 1, 23).unwrap(),
            supplier_name: "Bayer".to_string(),
            total_spend: 12_787_269.77,
            therapeutic_category: "Cardiovascular".to_string(),
            on_time_delivery: false,
            lead_time: 26,
        }
    );
}

#[test]
fn test_field_bounds_hold_for_every_row() {
    let config = GeneratorConfig::default();
    let last = config.last_order_date().unwrap();
    let transactions = generate(config.clone());

    for t in &transactions {
        assert!(t.total_spend > 0.0);
        assert!(t.total_spend >= config.spend_min && t.total_spend <= config.spend_max);
        assert!((25..=40).contains(&t.lead_time));
        assert!(t.order_date >= config.epoch && t.order_date <= last);
    }
}

#[test]
fn test_same_seed_reproduces_table() {
    let first = generate(GeneratorConfig::default());
    let second = generate(GeneratorConfig::default());
    assert_eq!(first, second);
}

#[test]
fn test_different_seed_changes_table() {
    let first = generate(GeneratorConfig::default());
    let second = generate(GeneratorConfig {
        seed: 7,
        ..GeneratorConfig::default()
    });
    assert_ne!(first, second);
}

#[test]
fn test_on_time_rate_tracks_probability() {
    let transactions = generate(GeneratorConfig {
        transaction_count: 20_000,
        ..GeneratorConfig::default()
    });
    let on_time = transactions.iter().filter(|t| t.on_time_delivery).count();
    let rate = on_time as f64 / transactions.len() as f64;
    assert!((rate - 0.456).abs() < 0.02, "on-time rate {}", rate);
}

#[test]
fn test_dates_cover_the_whole_window() {
    let transactions = generate(GeneratorConfig::default());
    let months: HashSet<NaiveDate> = transactions.iter().map(|t| t.month()).collect();
    // 2021-01 through 2023-12
    assert_eq!(months.len(), 36);
}

#[rstest]
#[case(Vec::new(), vec!["Oncology"])]
#[case(vec!["Sandoz"], Vec::new())]
fn test_empty_catalog_lists_rejected(#[case] suppliers: Vec<&str>, #[case] categories: Vec<&str>) {
    let catalog = SupplierCatalog {
        suppliers: suppliers.into_iter().map(String::from).collect(),
        categories: categories.into_iter().map(String::from).collect(),
        supplier_weights: None,
    };
    let result = TransactionGenerator::new(GeneratorConfig::default(), catalog);
    assert!(matches!(result, Err(DataError::Configuration(_))));
}

#[test]
fn test_small_fixture_catalog() {
    let catalog = SupplierCatalog::new(vec!["Alpha", "Beta"], vec!["Vaccines"]).unwrap();
    let config = GeneratorConfig {
        transaction_count: 50,
        ..GeneratorConfig::default()
    };
    let transactions = TransactionGenerator::new(config, catalog)
        .unwrap()
        .generate()
        .unwrap();

    assert_eq!(transactions.len(), 50);
    assert!(transactions
        .iter()
        .all(|t| t.therapeutic_category == "Vaccines"));
    assert!(transactions
        .iter()
        .all(|t| t.supplier_name == "Alpha" || t.supplier_name == "Beta"));
}
