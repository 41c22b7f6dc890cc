use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use pokedex_viewer::app::{App, CategoriesResult, ListResult, ProgressEvent, ProgressSink};
use pokedex_viewer::catalog::Catalog;
use pokedex_viewer::config::{ConfigLoader, ResolvedConfig};
use pokedex_viewer::detail::DetailState;
use pokedex_viewer::domain::{ItemKey, Theme, display_id};
use pokedex_viewer::error::{DexError, ErrorKind};
use pokedex_viewer::filter::FilterCriteria;
use pokedex_viewer::output::{JsonOutput, OutputMode};
use pokedex_viewer::pokeapi::PokeApiHttpClient;
use pokedex_viewer::prefs::{self, FilePreferences, MemoryPreferences, PreferenceStore};
use pokedex_viewer::tui::Tui;
use pokedex_viewer::view::Session;

#[derive(Parser)]
#[command(name = "pokedex")]
#[command(about = "Browse the PokeAPI catalog from the terminal")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true, help = "Number of catalog entries to load")]
    count: Option<u32>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List catalog entries matching a search and categories")]
    List(ListArgs),
    #[command(about = "List categories with entry counts")]
    Categories,
    #[command(about = "Show details, lineage and sprites for one entry")]
    Show(ShowArgs),
    #[command(about = "Show, set or toggle the saved theme")]
    Theme(ThemeArgs),
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, default_value = "")]
    search: String,

    #[arg(long = "category")]
    categories: Vec<String>,
}

#[derive(Args)]
struct ShowArgs {
    key: String,
}

#[derive(Args)]
struct ThemeArgs {
    choice: Option<ThemeChoice>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeChoice {
    Dark,
    Light,
    Toggle,
}

struct LogProgress;

impl ProgressSink for LogProgress {
    fn event(&self, event: ProgressEvent) {
        tracing::info!("{}", event.message);
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(dex) = report.downcast_ref::<DexError>() {
            return ExitCode::from(map_exit_code(dex));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &DexError) -> u8 {
    match error.kind() {
        ErrorKind::NotFound => 2,
        ErrorKind::Transport | ErrorKind::Status | ErrorKind::Parse | ErrorKind::MissingLink => 3,
        ErrorKind::Local => match error {
            DexError::InvalidItemKey(_) | DexError::InvalidTheme(_) => 2,
            _ => 1,
        },
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = resolve_config(cli.config.as_deref(), cli.count)?;

    match cli.command {
        Some(Commands::List(args)) => run_list(args, config, output_mode),
        Some(Commands::Categories) => run_categories(config, output_mode),
        Some(Commands::Show(args)) => run_show(args, config, output_mode),
        Some(Commands::Theme(args)) => {
            let preferences = open_preferences(&config)?;
            run_theme(args, &preferences, output_mode)
        }
        None => {
            let preferences = browse_preferences(&config);
            run_browse(config, preferences.as_ref(), output_mode)
        }
    }
}

fn resolve_config(path: Option<&str>, count: Option<u32>) -> Result<ResolvedConfig, DexError> {
    let mut config = ConfigLoader::resolve(path)?;
    if let Some(count) = count {
        if count == 0 {
            return Err(DexError::ConfigValue("--count must be positive".to_string()));
        }
        config.item_count = count;
    }
    Ok(config)
}

fn open_preferences(config: &ResolvedConfig) -> Result<FilePreferences, DexError> {
    match &config.preferences_path {
        Some(path) => Ok(FilePreferences::new(path.clone())),
        None => FilePreferences::at_default_location(),
    }
}

fn browse_preferences(config: &ResolvedConfig) -> Box<dyn PreferenceStore> {
    match open_preferences(config) {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::warn!(error = %err, "theme will not be saved this session");
            Box::new(MemoryPreferences::default())
        }
    }
}

fn http_app(config: ResolvedConfig) -> Result<App<PokeApiHttpClient>, DexError> {
    let client = PokeApiHttpClient::new(&config)?;
    Ok(App::new(client, config))
}

fn progress_sink(output_mode: OutputMode) -> &'static dyn ProgressSink {
    match output_mode {
        OutputMode::NonInteractive => &JsonOutput,
        OutputMode::Interactive => &LogProgress,
    }
}

fn run_browse(
    config: ResolvedConfig,
    preferences: &dyn PreferenceStore,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let theme = prefs::initial_theme(preferences, prefs::system_prefers_dark());
    let app = http_app(config)?;
    match output_mode {
        OutputMode::NonInteractive => {
            let (catalog, _) = app.load_catalog(&JsonOutput);
            Session::new(catalog, theme).render(&JsonOutput);
            Ok(())
        }
        OutputMode::Interactive => {
            let mut tui = Tui::new();
            tui.run(Arc::new(app), theme, preferences)
        }
    }
}

fn run_list(args: ListArgs, config: ResolvedConfig, output_mode: OutputMode) -> miette::Result<()> {
    let app = http_app(config)?;
    let (catalog, _) = app.load_catalog(progress_sink(output_mode));
    let result = app.list(&catalog, FilterCriteria::new(&args.search, args.categories));
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_list(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_list_summary(&catalog, &result);
            Ok(())
        }
    }
}

fn run_categories(config: ResolvedConfig, output_mode: OutputMode) -> miette::Result<()> {
    let app = http_app(config)?;
    let (catalog, _) = app.load_catalog(progress_sink(output_mode));
    let result = app.categories(&catalog);
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_categories(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_categories_summary(&result);
            Ok(())
        }
    }
}

fn run_show(args: ShowArgs, config: ResolvedConfig, output_mode: OutputMode) -> miette::Result<()> {
    let key = args.key.parse::<ItemKey>()?;
    let app = http_app(config)?;
    let state = app.detail(&key, progress_sink(output_mode));
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_detail(&state).into_diagnostic()?,
        OutputMode::Interactive => print_detail_summary(&state),
    }
    match state {
        DetailState::Failed { key, kind, .. } => Err(DexError::DetailUnavailable {
            key: key.to_string(),
            kind,
        }
        .into()),
        _ => Ok(()),
    }
}

fn run_theme(
    args: ThemeArgs,
    preferences: &dyn PreferenceStore,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let current = prefs::initial_theme(preferences, prefs::system_prefers_dark());
    let theme = match args.choice {
        None => current,
        Some(ThemeChoice::Dark) => prefs::set_theme(preferences, Theme::Dark)?,
        Some(ThemeChoice::Light) => prefs::set_theme(preferences, Theme::Light)?,
        Some(ThemeChoice::Toggle) => prefs::toggle_theme(preferences, current)?,
    };
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_theme(theme).into_diagnostic(),
        OutputMode::Interactive => {
            println!("theme: {theme}");
            Ok(())
        }
    }
}

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

fn print_list_summary(catalog: &Catalog, result: &ListResult) {
    println!(
        "{CYAN}Pokédex: {} of {} loaded, {} matching{RESET}",
        catalog.len(),
        catalog.requested(),
        result.matched
    );
    if result.items.is_empty() {
        println!("{YELLOW}{}{RESET}", pokedex_viewer::view::NO_MATCH_MESSAGE);
        return;
    }
    for item in &result.items {
        println!(
            "{GREEN}{}{RESET} {:<16} {}",
            display_id(item.id),
            item.name,
            item.categories.join(" / ")
        );
    }
}

fn print_categories_summary(result: &CategoriesResult) {
    for entry in &result.categories {
        println!("{CYAN}{:<10}{RESET} {}", entry.label, entry.count);
    }
}

fn print_detail_summary(state: &DetailState) {
    let view = match state {
        DetailState::Ready { view } => view,
        DetailState::Failed { message, .. } => {
            println!("{RED}{message}{RESET}");
            return;
        }
        DetailState::Loading { key } => {
            println!("{YELLOW}still loading {key}{RESET}");
            return;
        }
    };

    println!(
        "{CYAN}{} {}{RESET}  {}",
        view.header.name,
        view.header.display_id,
        view.header.categories.join(" / ")
    );
    for tile in &view.sprites {
        println!("  {:<11}{}", tile.label, tile.url);
    }
    println!("{GREEN}Base Stats{RESET}");
    for bar in &view.stats {
        println!("  {:<16}{:>4}  {:>5.1}%", bar.label, bar.value, bar.percent);
    }
    println!("{GREEN}Evolution Chain{RESET}");
    match view.lineage.notice() {
        Some(notice) => println!("  {YELLOW}{notice}{RESET}"),
        None => {
            let names: Vec<&str> = view
                .lineage
                .nodes()
                .iter()
                .map(|node| node.name.as_str())
                .collect();
            println!("  {}", names.join(" → "));
        }
    }
    println!("{GREEN}Older Game Sprites{RESET}");
    if let Some(notice) = view.generations_notice() {
        println!("  {YELLOW}{notice}{RESET}");
    }
    for group in &view.generations {
        println!("  {}", group.label);
        for sprite in &group.sprites {
            println!("    {:<8}{}", sprite.game, sprite.url);
        }
    }
}
