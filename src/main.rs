use anyhow::Result;
use clap::Parser;
use simplecrawl::commands;
use simplecrawl::config::{Config, DEFAULT_INDEX_URL, DEFAULT_SNAPSHOT};
use simplecrawl::context::Context;
use simplecrawl::runtime::RealRuntime;
use std::path::PathBuf;

/// Package shown when no subcommand is given.
const DEFAULT_PACKAGE: &str = "pandas";

/// simplecrawl - PyPI simple index crawler
///
/// Lists the packages of a simple index, resolves the latest file of a
/// package and reads the core metadata embedded in it.
///
/// Examples:
///   simplecrawl                 # Show the latest release of pandas
///   simplecrawl show requests   # Show the latest release of requests
///   simplecrawl list --prefix django
#[derive(Parser, Debug)]
#[command(author, version = env!("SIMPLECRAWL_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Simple index root URL
    #[arg(
        long = "index-url",
        short = 'i',
        env = "SIMPLECRAWL_INDEX_URL",
        value_name = "URL",
        default_value = DEFAULT_INDEX_URL,
        global = true
    )]
    pub index_url: String,

    /// Package list snapshot, read if present and written otherwise
    #[arg(
        long = "snapshot",
        short = 's',
        env = "SIMPLECRAWL_SNAPSHOT",
        value_name = "PATH",
        default_value = DEFAULT_SNAPSHOT,
        global = true
    )]
    pub snapshot: PathBuf,

    /// Directory in which temporary download directories are created
    #[arg(
        long = "scratch-dir",
        env = "SIMPLECRAWL_SCRATCH_DIR",
        value_name = "PATH",
        global = true
    )]
    pub scratch_dir: Option<PathBuf>,

    /// Request timeout in seconds (requests wait indefinitely by default)
    #[arg(
        long = "timeout",
        env = "SIMPLECRAWL_TIMEOUT",
        value_name = "SECS",
        global = true
    )]
    pub timeout: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Show the latest file of a package and its metadata
    Show(ShowArgs),

    /// List every file published for a package
    Versions(VersionsArgs),

    /// List the packages known to the index
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Package name
    #[arg(value_name = "NAME", default_value = DEFAULT_PACKAGE)]
    pub name: String,

    /// Print the record as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct VersionsArgs {
    /// Package name
    #[arg(value_name = "NAME")]
    pub name: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only show packages whose normalized name starts with this prefix
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Show at most this many packages
    #[arg(long, short = 'n', value_name = "N")]
    pub limit: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = Config::new(
        Some(&cli.index_url),
        Some(cli.snapshot),
        cli.scratch_dir,
        cli.timeout,
    )?;
    let ctx = Context::new(RealRuntime, config)?;

    match cli.command {
        Some(Commands::Show(args)) => commands::show(&ctx, &args.name, args.json).await?,
        Some(Commands::Versions(args)) => commands::versions(&ctx, &args.name).await?,
        Some(Commands::List(args)) => {
            commands::list(&ctx, args.prefix.as_deref(), args.limit).await?
        }
        None => commands::show(&ctx, DEFAULT_PACKAGE, false).await?,
    }
    Ok(())
}
