use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ef_app::{
    AppError, AppResult, BrowseSession, CatalogConfig, CatalogSource, CompareSession,
    ConfigOverrides, ExportColumn, FetchSlot, FetchWorker, FileCatalog, HttpCatalogClient,
    SortKey, default_sort, export_file_name, export_records, generate_summary, load_draft,
    submit_draft,
};
use ef_core::{DraftReport, SimulationRecord, check_draft};
use ef_filter::{Facet, FacetKind, FacetValue};
use ef_session::{
    CellValue, ComparisonAction, ComparisonTable, FileStorage, MAX_SELECTION, Section,
    SelectionSet, Toggle,
};

#[derive(Parser)]
#[command(name = "ef-cli")]
#[command(about = "EarthFrame CLI - Browse and compare simulation metadata", long_about = None)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Catalog API base URL (overrides config and environment)
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Read records from a JSON snapshot instead of the API
    #[arg(long, global = true)]
    data: Option<PathBuf>,
    /// Directory holding the persisted selection
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List records matching the filters
    Browse(FilterArgs),
    /// Show the values each facet can take
    Options,
    /// Show one record
    Show {
        /// Simulation ID
        id: String,
    },
    /// Manage the comparison selection
    #[command(subcommand)]
    Select(SelectCommands),
    /// Render or edit the comparison table
    #[command(subcommand)]
    Compare(CompareCommands),
    /// Export filtered records as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Sort key, e.g. `name` or `-uploadDate` (repeatable)
        #[arg(long = "sort")]
        sort: Vec<SortKey>,
        /// Columns to export, comma separated (defaults to all)
        #[arg(long, value_delimiter = ',')]
        columns: Vec<ExportColumn>,
        /// Output CSV file path (defaults to a timestamped name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Ask the catalog for an AI summary of the selection
    Summary,
    /// Submit a new simulation from a JSON or YAML draft
    Submit {
        /// Draft file (`.json`, `.yaml` or `.yml`)
        file: PathBuf,
        /// Only report required-field completeness
        #[arg(long)]
        check: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// URL query string, e.g. `status=complete&campaignId=v3.LR`
    #[arg(long)]
    query: Option<String>,
    /// Facet constraint `facet=v1,v2` (repeatable)
    #[arg(short, long = "filter")]
    filters: Vec<String>,
    /// Case-insensitive name search
    #[arg(long)]
    name: Option<String>,
}

#[derive(Subcommand)]
enum SelectCommands {
    /// Add or remove a simulation
    Toggle {
        /// Simulation ID
        id: String,
    },
    /// Empty the selection
    Clear,
    /// List selected simulations
    List,
}

#[derive(Subcommand)]
enum CompareCommands {
    /// Print the comparison table
    Render {
        /// Move a column, `FROM:TO` as column indices (repeatable)
        #[arg(long = "move")]
        moves: Vec<String>,
        /// Toggle a section open or closed (repeatable)
        #[arg(long = "toggle")]
        sections: Vec<String>,
    },
    /// Hide the column at this index
    Hide { column: usize },
    /// Show a hidden simulation again
    Show { id: String },
    /// Show every hidden column
    UnhideAll,
    /// Drop the column at this index from the selection
    Remove { column: usize },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let result = match cli.command {
        Commands::Browse(filters) => cmd_browse(&cli.data, &config, &filters),
        Commands::Options => cmd_options(&cli.data, &config),
        Commands::Show { id } => cmd_show(&cli.data, &config, &id),
        Commands::Select(select) => cmd_select(&cli.data, &config, select),
        Commands::Compare(compare) => cmd_compare(&cli.data, &config, compare),
        Commands::Export {
            filters,
            sort,
            columns,
            output,
        } => cmd_export(&cli.data, &config, &filters, sort, columns, output),
        Commands::Summary => cmd_summary(&cli.data, &config),
        Commands::Submit { file, check } => cmd_submit(&cli.data, &config, &file, check),
    };

    if let Err(err) = &result
        && err.is_retryable()
    {
        eprintln!("The catalog could not be reached; run the command again to retry.");
    }
    result
}

fn load_config(cli: &Cli) -> AppResult<CatalogConfig> {
    let overrides = ConfigOverrides {
        api_url: cli.api_url.clone(),
        state_dir: cli.state_dir.clone(),
    };
    let config = CatalogConfig::load(cli.config.as_deref(), &overrides)?;
    tracing::debug!(
        api_url = %config.api_url,
        state_dir = %config.state_dir.display(),
        "configuration loaded"
    );
    Ok(config)
}

fn source(data: &Option<PathBuf>, config: &CatalogConfig) -> Arc<dyn CatalogSource + Send + Sync> {
    match data {
        Some(path) => Arc::new(FileCatalog::new(path.clone())),
        None => Arc::new(HttpCatalogClient::new(config)),
    }
}

/// Fetch the record set on a worker thread, waiting at most the configured timeout.
fn load_records(
    source: Arc<dyn CatalogSource + Send + Sync>,
    config: &CatalogConfig,
) -> AppResult<Vec<SimulationRecord>> {
    let mut slot = FetchSlot::new();
    let ticket = slot.begin();
    let worker = FetchWorker::start(ticket, move || source.fetch_simulations());

    let message = worker.wait(config.timeout() + Duration::from_secs(1))?;
    message.deliver(&mut slot);
    match slot.take_data() {
        Some(records) => Ok(records),
        None => Err(AppError::Fetch(
            slot.error().unwrap_or("no data returned").to_string(),
        )),
    }
}

fn load_browse(data: &Option<PathBuf>, config: &CatalogConfig) -> AppResult<BrowseSession> {
    Ok(BrowseSession::new(load_records(source(data, config), config)?))
}

fn open_compare(config: &CatalogConfig) -> AppResult<CompareSession<FileStorage>> {
    let storage = FileStorage::new(config.state_dir.clone())?;
    Ok(CompareSession::open(storage))
}

fn apply_filters(browse: &mut BrowseSession, args: &FilterArgs) -> AppResult<()> {
    if let Some(query) = &args.query {
        browse.apply_query(query);
    }
    for filter in &args.filters {
        let (key, raw) = filter.split_once('=').ok_or_else(|| {
            AppError::InvalidInput(format!("Expected facet=value, got '{}'", filter))
        })?;
        let facet: Facet = key.parse()?;
        let value = match facet.kind() {
            FacetKind::MultiSelect => FacetValue::Values(
                raw.split(',')
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            FacetKind::DateBound => FacetValue::Bound(raw.to_string()),
        };
        browse.apply_filter(facet, value)?;
    }
    if let Some(name) = &args.name {
        browse.set_name_query(name.clone());
    }
    Ok(())
}

fn cmd_browse(data: &Option<PathBuf>, config: &CatalogConfig, args: &FilterArgs) -> AppResult<()> {
    let mut browse = load_browse(data, config)?;
    apply_filters(&mut browse, args)?;
    let selection = FileStorage::open_existing(&config.state_dir)
        .map(|storage| SelectionSet::load(&storage))
        .unwrap_or_default();

    let filtered = browse.filtered();
    println!(
        "{} of {} simulations",
        filtered.len(),
        browse.records().len()
    );
    for record in filtered {
        let marker = if selection.contains(&record.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:<12} {:<40} {:<12} {}",
            marker,
            record.id,
            record.name,
            record.status.as_str(),
            record.campaign_id.as_deref().unwrap_or("-")
        );
    }

    let query = browse.query_string();
    if !query.is_empty() {
        println!("\nQuery: ?{}", query);
    }
    Ok(())
}

fn cmd_options(data: &Option<PathBuf>, config: &CatalogConfig) -> AppResult<()> {
    let browse = load_browse(data, config)?;
    for (facet, values) in browse.options().iter() {
        if values.is_empty() {
            continue;
        }
        println!("{}:", facet);
        for value in values {
            println!("  {}", value);
        }
    }
    Ok(())
}

fn cmd_show(data: &Option<PathBuf>, config: &CatalogConfig, id: &str) -> AppResult<()> {
    let record = source(data, config).fetch_simulation(id)?;
    println!("{} - {}", record.id, record.name);
    println!("  Status:   {}", record.status);
    println!("  Type:     {}", record.simulation_type);
    if let Some(campaign) = &record.campaign_id {
        println!("  Campaign: {}", campaign);
    }
    if let Some(machine) = record.machine_label() {
        println!("  Machine:  {}", machine);
    }
    if let Some(compset) = &record.compset {
        println!("  Compset:  {}", compset);
    }
    if !record.variables.is_empty() {
        println!("  Variables: {}", record.variables.join(", "));
    }
    for link in record.diagnostic_links.iter().chain(&record.pace_links) {
        println!("  Link:     {} ({})", link.label, link.url);
    }
    Ok(())
}

fn cmd_select(
    data: &Option<PathBuf>,
    config: &CatalogConfig,
    command: SelectCommands,
) -> AppResult<()> {
    let mut session = open_compare(config)?;
    match command {
        SelectCommands::Toggle { id } => match session.toggle(&id)? {
            Toggle::Added => println!("✓ Selected {}", id),
            Toggle::Removed => println!("✓ Deselected {}", id),
            Toggle::Rejected => println!(
                "Selection is full ({} max); deselect something first",
                MAX_SELECTION
            ),
        },
        SelectCommands::Clear => {
            session.clear()?;
            println!("✓ Selection cleared");
        }
        SelectCommands::List => {
            if session.selection().is_empty() {
                println!("No simulations selected");
                return Ok(());
            }
            let browse = load_browse(data, config)?;
            println!(
                "Selected ({}/{}):",
                session.selection().len(),
                MAX_SELECTION
            );
            for id in session.selection().ids() {
                let name = browse.record(id).map(|r| r.name.as_str()).unwrap_or("?");
                println!("  {} - {}", id, name);
            }
        }
    }
    Ok(())
}

fn parse_move(arg: &str) -> AppResult<(usize, usize)> {
    let parsed = arg
        .split_once(':')
        .and_then(|(from, to)| Some((from.parse().ok()?, to.parse().ok()?)));
    parsed.ok_or_else(|| AppError::InvalidInput(format!("Expected FROM:TO, got '{}'", arg)))
}

fn cmd_compare(
    data: &Option<PathBuf>,
    config: &CatalogConfig,
    command: CompareCommands,
) -> AppResult<()> {
    let mut session = open_compare(config)?;
    match command {
        CompareCommands::Render { moves, sections } => {
            for arg in &moves {
                let (from, to) = parse_move(arg)?;
                session.drag_start(from);
                session.drag_over(to);
                session.drop_on(to)?;
            }
            for key in &sections {
                let section = Section::from_key(key).ok_or_else(|| {
                    AppError::InvalidInput(format!("Unknown section: {}", key))
                })?;
                session.dispatch(ComparisonAction::ToggleSection(section))?;
            }
            let browse = load_browse(data, config)?;
            print_table(&session.render(browse.records()));
        }
        CompareCommands::Hide { column } => {
            if session.dispatch(ComparisonAction::Hide(column))? {
                println!("✓ Column {} hidden", column);
            } else {
                println!("Column {} is already hidden or does not exist", column);
            }
        }
        CompareCommands::Show { id } => {
            if session.dispatch(ComparisonAction::Show(id.clone()))? {
                println!("✓ {} shown", id);
            } else {
                println!("{} was not hidden", id);
            }
        }
        CompareCommands::UnhideAll => {
            session.dispatch(ComparisonAction::UnhideAll)?;
            println!("✓ All columns visible");
        }
        CompareCommands::Remove { column } => {
            if session.remove_column(column)? {
                println!("✓ Column {} removed from selection", column);
            } else {
                println!("No column {}", column);
            }
        }
    }
    Ok(())
}

fn print_table(table: &ComparisonTable) {
    if table.headers.is_empty() && table.hidden.is_empty() {
        println!("Nothing selected; use `select toggle <id>` to add simulations");
        return;
    }

    let header: Vec<String> = table
        .headers
        .iter()
        .map(|h| format!("[{}] {}", h.column, h.title))
        .collect();
    println!("{:<20} | {}", "", header.join(" | "));

    for section in &table.sections {
        let marker = if section.expanded { "▾" } else { "▸" };
        println!("\n{} {}", marker, section.section.title());
        for row in &section.rows {
            let cells: Vec<String> = row.cells.iter().map(CellValue::display).collect();
            let flag = if row.differs { "*" } else { " " };
            println!("{}{:<19} | {}", flag, row.label, cells.join(" | "));
        }
    }

    if !table.hidden.is_empty() {
        println!("\nHidden:");
        for (id, title) in &table.hidden {
            println!("  {} - {}", id, title);
        }
    }
}

fn cmd_export(
    data: &Option<PathBuf>,
    config: &CatalogConfig,
    args: &FilterArgs,
    sort: Vec<SortKey>,
    columns: Vec<ExportColumn>,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let mut browse = load_browse(data, config)?;
    apply_filters(&mut browse, args)?;

    let sort = if sort.is_empty() { default_sort() } else { sort };
    let columns = if columns.is_empty() {
        ExportColumn::ALL.to_vec()
    } else {
        columns
    };
    let path = output.unwrap_or_else(|| PathBuf::from(export_file_name(chrono::Local::now())));

    let mut writer = BufWriter::new(File::create(&path)?);
    let rows = export_records(&mut writer, browse.filtered(), &sort, &columns)?;
    writer.flush()?;

    println!("✓ Exported {} rows to {}", rows, path.display());
    Ok(())
}

fn cmd_summary(data: &Option<PathBuf>, config: &CatalogConfig) -> AppResult<()> {
    let session = open_compare(config)?;
    if session.selection().is_empty() {
        println!("No simulations selected");
        return Ok(());
    }

    let source = source(data, config);
    let records = load_records(source.clone(), config)?;
    let selected = session.selected_records(&records);

    print!("Analyzing {} simulations...", selected.len());
    let _ = io::stdout().flush();
    let summary = generate_summary(source.as_ref(), &selected);
    println!("\r{}\r", " ".repeat(40));

    println!("Summary:");
    println!("{}", summary);
    Ok(())
}

fn print_draft_report(report: &DraftReport) {
    for progress in &report.sections {
        let mark = if progress.is_complete() { "✓" } else { "✗" };
        let advisory = if progress.section.gates_submission() {
            ""
        } else {
            " (optional)"
        };
        println!(
            "{} {:<16} {}/{}{}",
            mark, progress.section.title(), progress.satisfied, progress.required, advisory
        );
        if !progress.missing.is_empty() {
            println!("    missing: {}", progress.missing.join(", "));
        }
    }
}

fn cmd_submit(
    data: &Option<PathBuf>,
    config: &CatalogConfig,
    file: &Path,
    check: bool,
) -> AppResult<()> {
    let draft = load_draft(file)?;
    let report = check_draft(&draft);
    print_draft_report(&report);
    if check {
        return Ok(());
    }

    let (created, _) = submit_draft(source(data, config).as_ref(), &draft)?;
    println!("✓ Created {} - {}", created.id, created.name);
    Ok(())
}
