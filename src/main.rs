use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use hn_reader::app::{App, Command, HELP};
use hn_reader::cache::MemCache;
use hn_reader::client::HttpClient;
use hn_reader::config::Config;
use hn_reader::context::Context;
use hn_reader::hn_client::HackerNewsClient;
use hn_reader::models::ItemType;
use hn_reader::pipeline::FetchPipeline;

#[derive(Parser, Debug)]
#[command(name = "hn-reader", version, about = "Read Hacker News in the terminal")]
struct Cli {
    /// Config file (default: ~/.hn_reader/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not create the config file when it is missing
    #[arg(long)]
    no_config_write: bool,

    /// Concurrent item fetches
    #[arg(long)]
    workers: Option<usize>,

    /// Stories per page
    #[arg(long)]
    per_page: Option<usize>,

    /// API root
    #[arg(long)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Tab to start on: top, new, best or ask
    #[arg(long, default_value = "top")]
    tab: ItemType,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "hn_reader=debug" } else { "hn_reader=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let mut config = Config::load_or_init(&path, !cli.no_config_write)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(per_page) = cli.per_page {
        config.per_page = per_page;
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout_secs = timeout;
    }
    config.validate()?;
    Ok(config)
}

fn open_link(url: &str) {
    if let Err(e) = open::that(url) {
        eprintln!("Failed to open URL: {}", e);
    }
}

fn run(app: &mut App) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("{}", app.render(Utc::now()));
    loop {
        print!("\n> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        match Command::parse(&line) {
            Some(Command::Quit) => return Ok(()),
            Some(Command::Help) => println!("{}", HELP),
            Some(Command::NextPage) => {
                if !app.has_more() || app.next_page() == 0 {
                    println!("No more stories");
                    continue;
                }
                println!("{}", app.render(Utc::now()));
            }
            Some(Command::NextTab) => {
                app.next_tab();
                println!("{}", app.render(Utc::now()));
            }
            Some(Command::PreviousTab) => {
                app.previous_tab();
                println!("{}", app.render(Utc::now()));
            }
            Some(Command::Filter(query)) => {
                app.set_filter(query);
                println!("{}", app.render(Utc::now()));
            }
            Some(Command::Open(number)) => match app.visit(number) {
                Some(item) if !item.url.is_empty() => open_link(&item.url),
                Some(item) => println!("\n{}\n\n{}", item.title, item.plain_text()),
                None => println!("No story {}", number),
            },
            None => println!("Unknown command, `h` for help"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let remote = HttpClient::new(&config.base_url, config.request_timeout(), &config.user_agent)
        .context("failed to create HTTP client")?;
    let cache = Arc::new(MemCache::new());
    let service = Arc::new(HackerNewsClient::new(Arc::new(remote), cache));
    let pipeline = FetchPipeline::new(service, config.workers);

    let ctx = Context::background();
    let mut app = App::new(ctx.clone(), pipeline, config.per_page)
        .context("failed to load story lists")?;
    app.select_tab(cli.tab);

    println!("Loading stories...");
    app.load_initial();

    let result = run(&mut app);
    ctx.cancel();
    result
}
