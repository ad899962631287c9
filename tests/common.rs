// Shared fixtures: "Performance PARK 25" workbooks written in memory
#![allow(dead_code)]

use performance_park::section::FIXED_SECTION_STARTS;
use performance_park::workbook::{Cell, Grid};
use rust_xlsxwriter::Workbook;

pub const SHEET: &str = "Performance PARK 25";

pub const MONTHS: [&str; 12] = [
    "Januar",
    "Februar",
    "März",
    "April",
    "Mai",
    "Juni",
    "Juli",
    "August",
    "September",
    "Oktober",
    "November",
    "Dezember",
];

/// Section labels of the fixture template, one per fixed start row
pub const SECTION_LABELS: [&str; 10] = [
    "Soll in kWh",
    "Ist in kWh",
    "Abweichung in kWh",
    "Performance-Ratio in %",
    "Einspeisung in kWh",
    "Eigenverbrauch in kWh",
    "Netzbezug in kWh",
    "Verfügbarkeit in %",
    "Ertrag Vorjahr in kWh",
    "Prognose in kWh",
];

/// Header cells after the label; "Reserve" never holds data
pub const HEADER: [&str; 4] = ["Nord", "Süd", "Reserve", "Ost"];

pub const SITES: [&str; 3] = ["Nord", "Süd", "Ost"];

/// Value of `site` (index into HEADER) in `month` (0-based) of section `section`
pub fn fixture_value(section: usize, header_col: usize, month: usize) -> f64 {
    (section as f64 + 1.0) * 1000.0 + header_col as f64 * 100.0 + month as f64
}

/// The full template: title row, then ten sections at the fixed start rows,
/// each with 12 month rows and a Jahressumme row
pub fn template_workbook() -> Vec<u8> {
    workbook_with_sheet(SHEET)
}

pub fn workbook_with_sheet(sheet_name: &str) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name).expect("valid sheet name");
    worksheet
        .write_string(0, 0, "Performance PARK 25 Übersicht")
        .expect("write title");

    for (section, start) in FIXED_SECTION_STARTS.iter().enumerate() {
        let start = *start as u32;
        worksheet
            .write_string(start, 0, SECTION_LABELS[section])
            .expect("write label");
        for (i, site) in HEADER.iter().enumerate() {
            worksheet
                .write_string(start, (i + 1) as u16, *site)
                .expect("write header");
        }

        for (month_idx, month) in MONTHS.iter().enumerate() {
            let row = start + 1 + month_idx as u32;
            worksheet.write_string(row, 0, *month).expect("write month");
            for (i, site) in HEADER.iter().enumerate() {
                if *site == "Reserve" {
                    continue;
                }
                worksheet
                    .write_number(row, (i + 1) as u16, fixture_value(section, i, month_idx))
                    .expect("write value");
            }
        }

        let sum_row = start + 13;
        worksheet
            .write_string(sum_row, 0, "Jahressumme")
            .expect("write sum label");
        for (i, site) in HEADER.iter().enumerate() {
            if *site == "Reserve" {
                continue;
            }
            let total: f64 = (0..12).map(|m| fixture_value(section, i, m)).sum();
            worksheet
                .write_number(sum_row, (i + 1) as u16, total)
                .expect("write sum");
        }
    }

    workbook.save_to_buffer().expect("save workbook")
}

/// Small in-memory grid holding one section at row 0
///
/// `rows` are `(key, values)` pairs; `None` leaves the cell empty.
pub fn section_grid(header: &[&str], rows: &[(&str, Vec<Option<f64>>)]) -> Grid {
    let mut grid_rows = Vec::with_capacity(rows.len() + 1);
    grid_rows.push(
        header
            .iter()
            .map(|h| {
                if h.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(h.to_string())
                }
            })
            .collect(),
    );
    for (key, values) in rows {
        let mut row = vec![Cell::Text(key.to_string())];
        row.extend(values.iter().map(|v| match v {
            Some(n) => Cell::Number(*n),
            None => Cell::Empty,
        }));
        grid_rows.push(row);
    }
    Grid::new(grid_rows)
}

/// Scenario grid: header ["", "SiteA", "SiteB"], twelve months and a
/// Jahressumme row
pub fn site_a_b_grid() -> Grid {
    let site_a = [10.0, 11.0, 12.0, 13.0, 14.0, 16.0, 17.0, 18.0, 19.0, 20.0, 15.0, 15.0];
    let site_b = [20.0, 21.0, 22.0, 23.0, 24.0, 26.0, 27.0, 28.0, 29.0, 25.0, 30.0, 25.0];

    let mut rows: Vec<(&str, Vec<Option<f64>>)> = MONTHS
        .iter()
        .enumerate()
        .map(|(i, m)| (*m, vec![Some(site_a[i]), Some(site_b[i])]))
        .collect();
    rows.push(("Jahressumme", vec![Some(180.0), Some(300.0)]));

    section_grid(&["", "SiteA", "SiteB"], &rows)
}
