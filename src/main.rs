use anyhow::Context;
use clap::{Parser, Subcommand};
use dbgchat::assistant::prompt::PromptSource;
use dbgchat::assistant::{Mode, Session, Strategy};
use dbgchat::config::ConfigStore;
use dbgchat::host::GdbSession;
use dbgchat::llm::{HttpTransport, LlmClient};
use dbgchat::ui::console::print::style::{FilePathView, KeywordView};
use dbgchat::ui::console::AppBuilder;
use dbgchat::version::{self, Version};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Cmd>,

    /// Directory with configuration files
    #[arg(long, env = "DBGCHAT_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Path to GDB executable, searched in PATH by default
    #[arg(long, env = "DBGCHAT_GDB")]
    gdb: Option<PathBuf>,

    /// Initial assistant mode: ask or agent
    #[arg(long, default_value_t = Mode::Agent)]
    mode: Mode,

    /// Resolve `chat` queries with the multi-stage resolver guided by debugger help
    #[arg(long)]
    staged: bool,

    /// Directory with stage prompt files, built-in prompts are used by default
    #[arg(long, env = "DBGCHAT_PROMPTS")]
    prompts: Option<PathBuf>,

    /// Maximum number of commands executed by `chat-explore`
    #[arg(long, default_value_t = 3)]
    explore_steps: usize,

    /// Suggest next steps every time the program stops
    #[arg(long)]
    stop_hints: bool,

    /// Program to debug
    program: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Set up the model connection, print current settings if no options given
    Config {
        /// API key of the model provider
        #[arg(long)]
        key: Option<String>,
        /// Model name
        #[arg(long)]
        model: Option<String>,
        /// Chat completions endpoint
        #[arg(long)]
        url: Option<String>,
        /// Check for a newer dbgchat release
        #[arg(long)]
        check_version: bool,
    },
}

fn config_store(dir: Option<PathBuf>) -> anyhow::Result<ConfigStore> {
    match dir {
        Some(dir) => Ok(ConfigStore::at(dir)),
        None => Ok(ConfigStore::default_location()?),
    }
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{visible}****")
}

fn configure(
    store: &ConfigStore,
    key: Option<String>,
    model: Option<String>,
    url: Option<String>,
    check_version: bool,
) -> anyhow::Result<()> {
    let mut written = vec![];
    if let Some(key) = key {
        written.push(store.store_key(&key)?);
    }
    if let Some(model) = model {
        written.push(store.store_model(&model)?);
    }
    if let Some(url) = url {
        written.push(store.store_url(&url)?);
    }
    if !written.is_empty() {
        written.extend(store.store_missing_defaults()?);
    }
    for path in &written {
        println!("updated {}", FilePathView::from(path.display()));
    }

    if written.is_empty() {
        let config = store.load()?;
        println!("configuration directory: {}", FilePathView::from(store.dir().display()));
        println!("{}: {}", KeywordView::from("api key"), mask(&config.api_key));
        println!("{}: {}", KeywordView::from("model"), config.model);
        println!("{}: {}", KeywordView::from("url"), config.endpoint_url);
    }

    if check_version {
        let current = Version::current();
        let latest = version::latest_published(&HttpTransport::new())
            .context("version lookup")?;
        if latest > current {
            println!("new version available: {latest} (current {current})");
        } else {
            println!("dbgchat {current} is up to date");
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let store = config_store(args.config_dir)?;

    if let Some(Cmd::Config {
        key,
        model,
        url,
        check_version,
    }) = args.command
    {
        return configure(&store, key, model, url, check_version);
    }

    let config = store.load()?;
    let client = LlmClient::new(config, HttpTransport::new());

    let strategy = if args.staged {
        Strategy::Staged
    } else {
        Strategy::Direct
    };
    let prompts = match args.prompts {
        Some(dir) => PromptSource::from_dir(dir),
        None => PromptSource::builtin(),
    };
    let session = Session::new(client)
        .with_mode(args.mode)
        .with_strategy(strategy)
        .with_prompts(prompts)
        .with_explore_iterations(args.explore_steps)
        .with_stop_hints(args.stop_hints);

    let gdb = GdbSession::start(args.gdb.as_deref(), args.program.as_deref())
        .context("start debugger")?;
    let app = AppBuilder::new(session).build(gdb)?;
    app.run()
}
