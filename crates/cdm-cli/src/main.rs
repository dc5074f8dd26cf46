use std::io;
use std::path::PathBuf;

use cdm_crawler::{
    scrape_collections, scrape_repository, FsSink, HttpApi, OnError, ScraperConfig, SnapshotMode,
};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use env_logger::{Env, Target};

/// ContentDM collections mirror
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum SubCommand {
    #[command(name = "collection")]
    Collection(CollectionArgs),
    #[command(name = "repository")]
    Repository(RepositoryArgs),
    #[command(hide = true)]
    Completion,
}

/// Mirror the given collections
#[derive(Debug, clap::Args)]
pub struct CollectionArgs {
    /// Aliases of the collections to mirror
    #[arg(required = true)]
    pub aliases: Vec<String>,
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Mirror every collection of the repository
#[derive(Debug, clap::Args)]
pub struct RepositoryArgs {
    /// Alias of a collection to leave out, can be repeated
    #[arg(long)]
    pub exclude: Vec<String>,
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, clap::Args)]
pub struct CommonArgs {
    /// Optional scraper yaml configuration file
    #[arg(env = "CDM_SCRAPER_CONFIG", long)]
    pub config: Option<PathBuf>,
    /// Override ContentDM server url
    #[arg(long)]
    pub server: Option<String>,
    /// Override directory where collections are mirrored
    #[arg(long)]
    pub repo_dir: Option<PathBuf>,
    /// Override scraper's user agent
    #[arg(long)]
    pub user_agent: Option<String>,
    /// Override request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Override root listing page size
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Override highest root listing start position
    #[arg(long)]
    pub max_start: Option<usize>,
    /// Override snapshot policy
    #[arg(value_enum, long)]
    pub snapshot: Option<SnapshotMode>,
    /// Override metadata download error handling strategy
    #[arg(value_enum, long)]
    pub on_dl_error: Option<OnError>,
    /// Override local xml error handling strategy
    #[arg(value_enum, long)]
    pub on_xml_error: Option<OnError>,
    /// Write info logs to this file instead of warnings to stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
    /// When quiet no logs are outputted
    #[arg(long, short)]
    pub quiet: bool,
}

impl TryFrom<&CommonArgs> for ScraperConfig {
    type Error = anyhow::Error;

    fn try_from(args: &CommonArgs) -> Result<Self, Self::Error> {
        let mut conf = if let Some(path) = &args.config {
            serde_yaml::from_reader(fs_err::File::open(path)?)?
        } else {
            ScraperConfig::default()
        };
        if let Some(server) = &args.server {
            conf.server = server.to_string();
        }
        if let Some(repo_dir) = &args.repo_dir {
            conf.repo_dir = repo_dir.clone();
        }
        if let Some(user_agent) = &args.user_agent {
            conf.user_agent = user_agent.to_string();
        }
        if let Some(timeout) = args.timeout {
            conf.timeout = Some(timeout);
        }
        if let Some(chunk_size) = args.chunk_size {
            conf.chunk_size = chunk_size;
        }
        if let Some(max_start) = args.max_start {
            conf.max_start = max_start;
        }
        if let Some(snapshot) = args.snapshot {
            conf.snapshot = snapshot;
        }
        if let Some(on_dl_error) = args.on_dl_error {
            conf.on_dl_error = on_dl_error;
        }
        if let Some(on_xml_error) = args.on_xml_error {
            conf.on_xml_error = on_xml_error;
        }
        Ok(conf)
    }
}

fn init_logs(args: &CommonArgs) -> anyhow::Result<()> {
    if args.quiet {
        return Ok(());
    }
    let level = if args.log_file.is_some() { "info" } else { "warn" };
    let filters = format!("cdm_crawler={level},cdm={level}");
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(filters));
    if let Some(path) = &args.log_file {
        builder.target(Target::Pipe(Box::new(fs_err::File::create(path)?)));
    }
    builder.init();
    Ok(())
}

pub fn collection(args: CollectionArgs) -> anyhow::Result<()> {
    init_logs(&args.common)?;
    let conf = ScraperConfig::try_from(&args.common)?;
    let api = HttpApi::new(&conf)?;
    let stats = scrape_collections(&conf, &api, &FsSink, &args.aliases)?;
    log::info!("done: {stats}");
    Ok(())
}

pub fn repository(args: RepositoryArgs) -> anyhow::Result<()> {
    init_logs(&args.common)?;
    let mut conf = ScraperConfig::try_from(&args.common)?;
    conf.exclude.extend(args.exclude);
    let api = HttpApi::new(&conf)?;
    let stats = scrape_repository(&conf, &api, &FsSink)?;
    log::info!("done: {stats}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        SubCommand::Collection(args) => collection(args),
        SubCommand::Repository(args) => repository(args),
        SubCommand::Completion => {
            generate(Shell::Bash, &mut Args::command(), "cdm", &mut io::stdout());
            Ok(())
        }
    }
}
