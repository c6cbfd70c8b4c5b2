use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use pokedex_browser::api::HttpCatalogClient;
use pokedex_browser::app::App;
use pokedex_browser::bookmarks::BookmarkStore;
use pokedex_browser::config::{ConfigLoader, ResolvedConfig};
use pokedex_browser::domain::RecordId;
use pokedex_browser::enrich::Enricher;
use pokedex_browser::error::PokedexError;
use pokedex_browser::listing::{ListingCoordinator, NavState};
use pokedex_browser::output::{JsonOutput, OutputMode, render_listing_text};
use pokedex_browser::store::{FileStorage, Store};
use pokedex_browser::tui::Tui;

type CliApp = App<HttpCatalogClient, FileStorage>;

#[derive(Parser)]
#[command(name = "pokedex")]
#[command(about = "Browse, search and bookmark the Pokédex from the terminal")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Print one page of the catalog")]
    Browse(BrowseArgs),
    #[command(about = "Show one record by id")]
    Show(ShowArgs),
    #[command(about = "Manage bookmarks")]
    Bookmarks(BookmarksArgs),
    #[command(about = "Print the shareable link for a page/search")]
    Link(NavArgs),
}

#[derive(Args, Clone)]
struct NavArgs {
    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    search: Option<String>,

    #[arg(long, conflicts_with_all = ["page", "search"])]
    link: Option<String>,
}

#[derive(Args)]
struct BrowseArgs {
    #[command(flatten)]
    nav: NavArgs,

    #[arg(long)]
    plain: bool,
}

#[derive(Args)]
struct ShowArgs {
    id: String,
}

#[derive(Args)]
struct BookmarksArgs {
    #[command(subcommand)]
    command: Option<BookmarkCommand>,
}

#[derive(Subcommand)]
enum BookmarkCommand {
    #[command(about = "List bookmarked records")]
    List,
    #[command(about = "Bookmark a record, or remove it when already bookmarked")]
    Toggle(ShowArgs),
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<PokedexError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &PokedexError) -> u8 {
    match error {
        PokedexError::RecordNotFound(_)
        | PokedexError::InvalidRecordId(_)
        | PokedexError::InvalidNavigation(_) => 2,
        PokedexError::Unavailable(_) => 3,
        _ => 1,
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

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let runtime = Runtime::new().into_diagnostic()?;

    match cli.command {
        Some(Commands::Browse(args)) => {
            let nav = resolve_nav(&args.nav)?;
            let app = build_app(&config, nav)?;
            let view = runtime.block_on(app.view());
            if args.plain {
                print!("{}", render_listing_text(&view));
            } else {
                JsonOutput::print_listing(&view).into_diagnostic()?;
            }
            if view.is_error {
                return Err(PokedexError::unavailable("failed to load the catalog").into());
            }
            Ok(())
        }
        Some(Commands::Show(args)) => {
            let id: RecordId = args.id.parse()?;
            let app = build_app(&config, NavState::default())?;
            let result = runtime.block_on(app.detail(id))?;
            JsonOutput::print_detail(&result).into_diagnostic()
        }
        Some(Commands::Bookmarks(args)) => {
            let mut app = build_app(&config, NavState::default())?;
            match args.command.unwrap_or(BookmarkCommand::List) {
                BookmarkCommand::List => {
                    JsonOutput::print_bookmarks(&app.list_bookmarks()).into_diagnostic()
                }
                BookmarkCommand::Toggle(args) => {
                    let id: RecordId = args.id.parse()?;
                    let result = runtime.block_on(app.toggle_bookmark(id))?;
                    JsonOutput::print_toggle(&result).into_diagnostic()
                }
            }
        }
        Some(Commands::Link(args)) => {
            let nav = resolve_nav(&args)?;
            let app = build_app(&config, nav)?;
            JsonOutput::print_link(&app.link()).into_diagnostic()
        }
        None => {
            if matches!(output_mode, OutputMode::NonInteractive) {
                return Err(miette::Report::msg(
                    "command required (try `pokedex --help`)",
                ));
            }
            let app = build_app(&config, NavState::default())?;
            let mut tui = Tui::new(app, runtime.handle().clone());
            tui.run()
        }
    }
}

fn resolve_nav(args: &NavArgs) -> Result<NavState, PokedexError> {
    match &args.link {
        Some(link) => NavState::parse(link),
        None => Ok(NavState::from_parts(args.page, args.search.as_deref())),
    }
}

fn build_app(config: &ResolvedConfig, nav: NavState) -> Result<CliApp, PokedexError> {
    let store = match &config.data_dir {
        Some(dir) => Store::new_with_root(dir.clone()),
        None => Store::new()?,
    };
    store.ensure_data_root()?;
    let bookmarks = BookmarkStore::load(store.storage());

    let client = HttpCatalogClient::new(config)?;
    let enricher = Enricher::new(client, config.language.clone());
    let coordinator = ListingCoordinator::new(enricher, config.catalog.clone());
    Ok(App::new(coordinator, bookmarks, nav))
}
