use performance_park::section::FIXED_SECTION_STARTS;
use performance_park::workbook::{WorkbookLoader, DEFAULT_SHEET_NAME};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let file_path = args.get(1).ok_or("usage: examine-sheet <file.xlsx> [sheet]")?;
    let sheet_name = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

    println!("Opening workbook: {file_path}");
    println!("Examining sheet: {sheet_name}");
    println!("{}", "=".repeat(100));

    let loader = WorkbookLoader::new(sheet_name);
    let (workbook_id, grid) = loader.load_from_path(file_path)?;

    println!("Workbook id: {workbook_id}");
    println!("Dimensions: {} rows x {} columns", grid.height(), grid.width());
    println!("Rows marked with '*' are fixed section label rows");
    println!("{}", "=".repeat(100));

    // 0-based row indices, as used by the fixed layout
    for (row_idx, row) in grid.rows().enumerate() {
        let has_data = row.iter().any(|cell| !cell.is_empty());
        if !has_data {
            continue;
        }
        let marker = if FIXED_SECTION_STARTS.contains(&row_idx) {
            '*'
        } else {
            ' '
        };
        print!("{marker}Row {row_idx:3}: ");
        for cell in row.iter().take(10) {
            if cell.is_empty() {
                print!("[empty] ");
            } else {
                print!("[{cell}] ");
            }
        }
        println!();
    }

    Ok(())
}
