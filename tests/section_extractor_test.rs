// Tests for section location and extraction on the fixed "Performance PARK 25" layout

mod common;

use performance_park::section::{
    extract, ExtractOptions, Period, RowKey, SectionError, SectionLocator, SectionStrategy,
    FIXED_SECTION_STARTS,
};
use performance_park::workbook::{Grid, WorkbookLoader};
use std::collections::HashSet;

fn template_grid() -> Grid {
    WorkbookLoader::default()
        .load_from_bytes(&common::template_workbook())
        .expect("template should load")
}

fn all_options() -> Vec<ExtractOptions> {
    vec![
        ExtractOptions {
            drop_annual_sum: false,
            reorder_months: true,
        },
        ExtractOptions {
            drop_annual_sum: true,
            reorder_months: true,
        },
    ]
}

#[test]
fn test_fixed_strategy_discovers_all_sections() {
    let grid = template_grid();
    let sections = SectionLocator::new(SectionStrategy::FixedOffset).discover(&grid);

    let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, common::SECTION_LABELS.to_vec());

    for (section, start) in sections.iter().zip(FIXED_SECTION_STARTS) {
        assert_eq!(section.start_row, start);
        assert_eq!(section.end_row, start + 14);
    }
    assert!(sections[3].is_percent());
    assert!(!sections[0].is_percent());
}

#[test]
fn test_row_keys_are_canonical_and_unique() {
    let grid = template_grid();
    let locator = SectionLocator::default();

    for section in locator.discover(&grid) {
        for options in all_options() {
            let table = extract(&grid, section.start_row, section.end_row, &options).unwrap();

            let mut seen = HashSet::new();
            for row in &table.rows {
                let period = row.key.period().expect("only canonical keys");
                assert!(seen.insert(period), "duplicate key {period}");
            }
            if options.drop_annual_sum {
                assert_eq!(table.rows.len(), 12);
            } else {
                assert_eq!(table.rows.len(), 13);
            }
        }
    }
}

#[test]
fn test_extract_template_section_values() {
    let grid = template_grid();
    let (start, end) = SectionLocator::default()
        .locate(&grid, "Ist in kWh")
        .unwrap();

    let table = extract(&grid, start, end, &ExtractOptions::default()).unwrap();

    assert_eq!(table.label, "Ist in kWh");
    assert_eq!(table.row_key_name, "Ist in kWh");
    // "Reserve" holds no data and is dropped
    assert_eq!(table.sites, common::SITES.to_vec());
    assert_eq!(
        table.value(Period::March, "Ost"),
        Some(common::fixture_value(1, 3, 2))
    );
    let expected_sum: f64 = (0..12).map(|m| common::fixture_value(1, 0, m)).sum();
    assert_eq!(table.value(Period::AnnualSum, "Nord"), Some(expected_sum));
}

#[test]
fn test_extract_is_idempotent() {
    let grid = template_grid();
    let before = grid.clone();
    let options = ExtractOptions::default();

    let first = extract(&grid, 52, 66, &options).unwrap();
    let second = extract(&grid, 52, 66, &options).unwrap();

    assert_eq!(first, second);
    assert_eq!(grid, before);
}

#[test]
fn test_drop_annual_sum_never_leaves_jahressumme() {
    let options = ExtractOptions {
        drop_annual_sum: true,
        reorder_months: true,
    };

    let with_sum = common::site_a_b_grid();
    let table = extract(&with_sum, 0, 14, &options).unwrap();
    assert!(table.row(Period::AnnualSum).is_none());

    // Absent in the source: no error either
    let months_only: Vec<(&str, Vec<Option<f64>>)> = common::MONTHS
        .iter()
        .map(|m| (*m, vec![Some(1.0)]))
        .collect();
    let grid = common::section_grid(&["Soll in kWh", "Nord"], &months_only);
    let table = extract(&grid, 0, 13, &options).unwrap();
    assert_eq!(table.rows.len(), 12);
    assert!(table.row(Period::AnnualSum).is_none());
}

#[test]
fn test_rows_are_reindexed_into_canonical_order() {
    let grid = common::section_grid(
        &["Soll in kWh", "Nord"],
        &[
            ("Jahressumme", vec![Some(6.0)]),
            ("Mai", vec![Some(3.0)]),
            ("Januar", vec![Some(1.0)]),
            ("März", vec![Some(2.0)]),
        ],
    );

    let table = extract(&grid, 0, 5, &ExtractOptions::default()).unwrap();
    let keys: Vec<&str> = table.rows.iter().map(|r| r.key.label()).collect();
    assert_eq!(keys, vec!["Januar", "März", "Mai", "Jahressumme"]);
    assert_eq!(
        table.available_periods(),
        vec![Period::January, Period::March, Period::May, Period::AnnualSum]
    );
}

#[test]
fn test_unrecognized_keys_dropped_only_when_reordering() {
    let grid = common::section_grid(
        &["Soll in kWh", "Nord"],
        &[
            ("Februar", vec![Some(2.0)]),
            ("Bemerkung", vec![Some(0.0)]),
            ("Januar", vec![Some(1.0)]),
        ],
    );

    let reordered = extract(&grid, 0, 4, &ExtractOptions::default()).unwrap();
    assert_eq!(reordered.rows.len(), 2);
    assert_eq!(reordered.rows[0].key, RowKey::Period(Period::January));

    let legacy = extract(
        &grid,
        0,
        4,
        &ExtractOptions {
            drop_annual_sum: false,
            reorder_months: false,
        },
    )
    .unwrap();
    let keys: Vec<&str> = legacy.rows.iter().map(|r| r.key.label()).collect();
    assert_eq!(keys, vec!["Februar", "Bemerkung", "Januar"]);
}

#[test]
fn test_missing_cells_are_not_zero() {
    let grid = common::section_grid(
        &["Ist in kWh", "Nord", "Süd"],
        &[
            ("Januar", vec![Some(5.0), None]),
            ("Februar", vec![None, Some(7.0)]),
        ],
    );

    let table = extract(&grid, 0, 3, &ExtractOptions::default()).unwrap();
    assert_eq!(table.value(Period::January, "Süd"), None);
    assert_eq!(table.value(Period::February, "Nord"), None);
    assert_eq!(table.value(Period::February, "Süd"), Some(7.0));
}

#[test]
fn test_malformed_sections() {
    let no_values = common::section_grid(
        &["Ist in kWh", "Nord"],
        &[("Januar", vec![None]), ("Februar", vec![None])],
    );
    assert!(matches!(
        extract(&no_values, 0, 3, &ExtractOptions::default()),
        Err(SectionError::MalformedSection { .. })
    ));

    // Empty area of the template: nothing below the last section
    let grid = template_grid();
    assert!(matches!(
        extract(&grid, 200, 214, &ExtractOptions::default()),
        Err(SectionError::MalformedSection { .. })
    ));
}

#[test]
fn test_unknown_section_label() {
    let grid = template_grid();
    let result = SectionLocator::default().locate(&grid, "Gibt es nicht");

    match result {
        Err(SectionError::UnknownSection(label)) => assert_eq!(label, "Gibt es nicht"),
        other => panic!("Expected UnknownSection error, got {other:?}"),
    }
}

#[test]
fn test_scan_strategy_runs_to_next_marker() {
    let grid = template_grid();
    let sections = SectionLocator::new(SectionStrategy::Scan).discover(&grid);

    // Percentage sections do not carry the "in kWh" marker
    let labels: Vec<&str> = sections.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Soll in kWh",
            "Ist in kWh",
            "Abweichung in kWh",
            "Einspeisung in kWh",
            "Eigenverbrauch in kWh",
            "Netzbezug in kWh",
            "Ertrag Vorjahr in kWh",
            "Prognose in kWh",
        ]
    );
    assert_eq!((sections[0].start_row, sections[0].end_row), (1, 18));
    assert_eq!((sections[2].start_row, sections[2].end_row), (35, 69));
    assert_eq!(sections[7].end_row, grid.height());

    // The long scan block swallows the percentage section; reindexing keeps
    // the first occurrence of each month
    let table = extract(&grid, 35, 69, &ExtractOptions::default()).unwrap();
    assert_eq!(table.rows.len(), 13);
    assert_eq!(
        table.value(Period::January, "Nord"),
        Some(common::fixture_value(2, 0, 0))
    );
}

#[test]
fn test_fixed_and_scan_agree_on_regular_sections() {
    let grid = template_grid();
    let fixed = SectionLocator::new(SectionStrategy::FixedOffset);
    let scan = SectionLocator::new(SectionStrategy::Scan);
    let options = ExtractOptions::default();

    let (fs, fe) = fixed.locate(&grid, "Soll in kWh").unwrap();
    let (ss, se) = scan.locate(&grid, "Soll in kWh").unwrap();
    assert_eq!(fs, ss);
    assert_ne!(fe, se);

    let from_fixed = extract(&grid, fs, fe, &options).unwrap();
    let from_scan = extract(&grid, ss, se, &options).unwrap();
    assert_eq!(from_fixed, from_scan);
}
