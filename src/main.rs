// Command-line shell around the analytics library.
//
// - `profile` loads the CSV and prints what was found (rows, statuses,
//   end-date span, defaulted columns).
// - `report` loads the CSV, builds one `AnalysisConfig` from a JSON config
//   file and flags, recomputes every result set and prints Markdown previews.
//   With `--out-dir` the tables are also exported.
use chrono::Local;
use clap::{Parser, Subcommand};
use contratos_report::config::{ConfigFile, DEFAULT_CURRENCY};
use contratos_report::error::AppError;
use contratos_report::loader::{self, LoadReport};
use contratos_report::reports::{self, DashboardResults, TimeSeries};
use contratos_report::types::ContractRecord;
use contratos_report::{logging, output, util};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "contratos-report")]
#[command(about = "Supplier spending and concentration over procurement contracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Profile(ProfileArgs),
    Report(ReportArgs),
}

#[derive(Parser)]
struct ProfileArgs {
    /// `;`-separated contracts file, or `-` for stdin.
    #[arg(long, env = "CONTRATOS_CSV", default_value = "contratos_petrobras.csv")]
    input: PathBuf,
    #[arg(long, default_value = DEFAULT_CURRENCY)]
    currency: String,
}

#[derive(Parser)]
struct ReportArgs {
    /// `;`-separated contracts file, or `-` for stdin.
    #[arg(long, env = "CONTRATOS_CSV", default_value = "contratos_petrobras.csv")]
    input: PathBuf,
    /// JSON file with default filter values.
    #[arg(long, env = "CONTRATOS_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long)]
    currency: Option<String>,
    /// First accepted end date (dd/mm/yyyy).
    #[arg(long)]
    start: Option<String>,
    /// Last accepted end date (dd/mm/yyyy).
    #[arg(long)]
    end: Option<String>,
    /// Accepted status; repeat for several. Defaults to every known status.
    #[arg(long = "status")]
    statuses: Vec<String>,
    #[arg(long)]
    keyword: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    top_n: Option<usize>,
    /// Reference date for the active/expiring KPIs. Defaults to today.
    #[arg(long)]
    as_of: Option<String>,
    #[arg(long, default_value_t = 10)]
    preview_rows: usize,
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    logging::init_logging("contratos-report").map_err(AppError::Logging)?;
    let cli = Cli::parse();
    match cli.command {
        Command::Profile(args) => handle_profile(args),
        Command::Report(args) => handle_report(args),
    }
}

fn load(input: &Path) -> Result<(Vec<ContractRecord>, LoadReport), AppError> {
    let loaded = if input == Path::new("-") {
        loader::load_and_clean(std::io::stdin().lock())?
    } else {
        loader::load_contracts(input)?
    };
    Ok(loaded)
}

fn handle_profile(args: ProfileArgs) -> Result<(), AppError> {
    let (records, load_report) = load(&args.input)?;
    let profile = reports::profile(&records, &args.currency);

    println!(
        "Processing dataset... ({} rows loaded, {} in {})",
        util::format_int(profile.total_rows),
        util::format_int(profile.currency_rows),
        args.currency
    );
    if !load_report.missing_columns.is_empty() {
        let cols: Vec<&str> = load_report.missing_columns.iter().map(String::as_str).collect();
        println!("Note: columns not found, defaulted: {}", cols.join(", "));
    }
    println!(
        "Note: {} rows without valor_contrato (counted as 0), {} without fim_vigencia.",
        util::format_int(load_report.empty_values),
        util::format_int(load_report.undated_rows)
    );
    println!(
        "End dates: {} to {}",
        util::format_date(profile.first_end_date),
        util::format_date(profile.last_end_date)
    );
    println!("Statuses:");
    for status in &profile.statuses {
        let label = if status.is_empty() { "(blank)" } else { status.as_str() };
        println!("  - {label}");
    }
    Ok(())
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let file_config = match &args.config {
        Some(path) => ConfigFile::from_path(path)?,
        None => ConfigFile::default(),
    };
    let flags = ConfigFile {
        currency: args.currency.clone(),
        start: args.start.clone(),
        end: args.end.clone(),
        statuses: (!args.statuses.is_empty()).then(|| args.statuses.clone()),
        keyword: args.keyword.clone(),
        category: args.category.clone(),
        top_n: args.top_n,
        as_of: args.as_of.clone(),
    };
    let merged = file_config.merge(flags);

    let (records, _) = load(&args.input)?;
    let currency = merged.currency.clone().unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let profile = reports::profile(&records, &currency);
    let default_range = profile.first_end_date.zip(profile.last_end_date);

    let today = Local::now().date_naive();
    let mut config = merged.resolve(today, default_range)?;
    if config.status_set.is_empty() {
        config.status_set = profile.statuses.clone();
    }
    info!(
        "report for {} as of {} ({} statuses selected)",
        config.currency,
        config.as_of,
        config.status_set.len()
    );

    let results = reports::recompute(&records, &config);
    print_dashboard(&results, &config.currency, args.preview_rows);

    if let Some(dir) = &args.out_dir {
        let files = output::write_dashboard(dir, &results, &config.currency)?;
        println!("(Full tables exported to {})", dir.display());
        for f in files {
            println!("  {}", f.display());
        }
    }
    Ok(())
}

fn print_dashboard(results: &DashboardResults, currency: &str, preview_rows: usize) {
    let k = &results.kpis;
    println!("Indicadores");
    println!("  Valor total:           {}", util::format_currency(currency, k.total_value));
    println!("  Contratos:             {}", util::format_int(k.contract_count));
    println!("  Fornecedores:          {}", util::format_int(k.supplier_count));
    println!("  Ticket médio:          {}", util::format_currency(currency, k.average_ticket));
    println!("  Vigentes hoje:         {}", util::format_int(k.active_today));
    println!(
        "  Vencendo em {} dias:   {}\n",
        reports::EXPIRING_WINDOW_DAYS,
        util::format_int(k.expiring_soon)
    );

    println!("Top fornecedores por valor\n");
    output::preview_table_rows(&reports::value_rows(&results.top_by_value, currency), preview_rows);

    println!("Top fornecedores por número de contratos\n");
    output::preview_table_rows(&reports::count_rows(&results.top_by_count, currency), preview_rows);

    println!("Detalhe dos principais fornecedores\n");
    output::preview_table_rows(&reports::detail_rows(&results.top_details, currency), preview_rows);

    println!("Participação de mercado (Pareto)\n");
    output::preview_table_rows(&reports::market_share_rows(&results.market_share, currency), preview_rows);

    let c = &results.concentration;
    println!(
        "Concentração: CR4 = {}, CR10 = {}, HHI = {} ({})\n",
        util::format_pct(c.cr4),
        util::format_pct(c.cr10),
        util::format_number(c.hhi, 0),
        c.structure.label()
    );
    if let Some(n) = results.pareto_suppliers {
        println!(
            "{} fornecedores concentram {} do valor\n",
            util::format_int(n),
            util::format_pct(reports::PARETO_THRESHOLD_PCT)
        );
    }

    println!("Contratos x valor por fornecedor\n");
    output::preview_table_rows(&reports::scatter_rows(&results.scatter, currency), preview_rows);

    println!("Valor total por ano de início\n");
    match &results.time_series {
        TimeSeries::Ready(_) => {
            output::preview_table_rows(&reports::year_rows(&results.time_series, currency), usize::MAX)
        }
        TimeSeries::InsufficientData => println!("Dados insuficientes para a série anual.\n"),
    }
}
