use clap::{Parser, ValueEnum};
use performance_park::chart::{build_chart, render_html, ChartData, Selection};
use performance_park::section::{
    extract, ExtractOptions, Period, SectionLocator, SectionStrategy,
};
use performance_park::workbook::{WorkbookLoader, DEFAULT_SHEET_NAME};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Vega-Lite chart spec
    Json,
    /// Standalone HTML page rendering the chart
    Html,
    /// Plain text listing of the chart points
    Table,
}

#[derive(Parser)]
#[command(name = "performance-chart")]
#[command(about = "Chart monthly figures of a 'Performance PARK 25' workbook", long_about = None)]
struct Cli {
    /// Path to the xlsx workbook
    #[arg(long)]
    file: PathBuf,

    /// Worksheet holding the sections
    #[arg(long, env = "SHEET_NAME", default_value = DEFAULT_SHEET_NAME)]
    sheet: String,

    /// Section strategy: 'fixed' (known row offsets) or 'scan' (marker rows)
    #[arg(long, env = "SECTION_STRATEGY", default_value = "fixed", value_parser = parse_strategy)]
    strategy: SectionStrategy,

    /// Marker substring for the scan strategy
    #[arg(long, env = "SECTION_MARKER", default_value = "in kWh")]
    marker: String,

    /// Only list the sections of the workbook
    #[arg(long)]
    list_sections: bool,

    /// Section label (default: first section)
    #[arg(long)]
    section: Option<String>,

    /// Site to include, repeatable (default: first site)
    #[arg(long = "site")]
    sites: Vec<String>,

    /// First month of the range (e.g. "März")
    #[arg(long)]
    from: Option<Period>,

    /// Last month of the range (e.g. "Mai")
    #[arg(long)]
    to: Option<Period>,

    /// Keep the "Jahressumme" row
    #[arg(long)]
    keep_annual_sum: bool,

    /// Order sites by descending mean
    #[arg(long)]
    sort_by_mean: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "html")]
    format: OutputFormat,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_strategy(value: &str) -> Result<SectionStrategy, String> {
    value.parse()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let loader = WorkbookLoader::new(cli.sheet.clone());
    let (workbook_id, grid) = loader.load_from_path(&cli.file)?;
    info!("Loaded workbook {} from {}", workbook_id, cli.file.display());

    let locator = SectionLocator::new(cli.strategy).with_marker(cli.marker.clone());
    let sections = locator.discover(&grid);

    if cli.list_sections {
        for section in &sections {
            println!(
                "{:>4}..{:<4} {}{}",
                section.start_row,
                section.end_row,
                section.label,
                if section.is_percent() { "  [%]" } else { "" }
            );
        }
        return Ok(());
    }

    let section_label = match &cli.section {
        Some(label) => label.clone(),
        None => sections
            .first()
            .map(|s| s.label.clone())
            .ok_or("No sections found in workbook")?,
    };

    let (start_row, end_row) = locator.locate(&grid, &section_label)?;
    let options = ExtractOptions {
        drop_annual_sum: !cli.keep_annual_sum,
        reorder_months: true,
    };
    let table = extract(&grid, start_row, end_row, &options)?;

    let sites = if cli.sites.is_empty() {
        table.sites.iter().take(1).cloned().collect()
    } else {
        cli.sites.clone()
    };

    let mut selection = Selection::new(section_label)
        .with_sites(sites)
        .dropping_annual_sum(!cli.keep_annual_sum)
        .sorted_by_mean(cli.sort_by_mean);
    match (cli.from, cli.to) {
        (Some(from), Some(to)) => selection = selection.with_month_range(from, to),
        (None, None) => {}
        _ => warn!("Both --from and --to are needed for a month range, ignoring it"),
    }

    let chart = build_chart(&table, &selection)?;
    let rendered = match cli.format {
        OutputFormat::Json => serde_json::to_string_pretty(&chart.vega_lite())?,
        OutputFormat::Html => render_html(&chart),
        OutputFormat::Table => render_table(&chart),
    };

    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)?;
            println!("✅ Wrote {} points to {}", chart.points.len(), path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

fn render_table(chart: &ChartData) -> String {
    let mut out = format!("{}\n", chart.hints.title);
    for point in &chart.points {
        let value = match point.value {
            Some(v) if chart.hints.is_percent => format!("{v:.2} %"),
            Some(v) => format!("{v:.0} kWh"),
            None => "-".to_string(),
        };
        out.push_str(&format!("{:<12} {:<24} {}\n", point.month.label(), point.site, value));
    }
    out
}
