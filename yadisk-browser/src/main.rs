use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;
use yadisk_browser::auth::{AuthResolution, BearerToken, TokenSource, resolve_session, sign_out};
use yadisk_browser::browser::FolderBrowser;
use yadisk_browser::config::BrowserConfig;
use yadisk_browser::gateway::YadiskGateway;
use yadisk_browser::listing::EntryKind;
use yadisk_browser::navigation::FolderPath;
use yadisk_browser::storage::{KeyValueStore, KeyringStore};
use yadisk_browser::upload::{LocalFile, SelectionError};
use yadisk_browser::view::{
    render_listing, render_outcome, render_selection, render_sign_in, render_too_many_files,
};

/// Browse a Yandex Disk and upload files into it
#[derive(Parser)]
#[command(name = "yadisk-browser")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Save the access token from the address the browser was redirected to
    Login {
        /// Redirect address containing `#access_token=...`; prompted for when omitted
        #[arg(long)]
        redirect: Option<String>,
    },

    /// Forget the saved access token
    Logout,

    /// List a remote folder
    Ls {
        /// Folder path such as `Docs/Reports`; the disk root when omitted
        #[arg(default_value = "")]
        path: String,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload local files into a remote folder
    Upload {
        /// Destination folder; the disk root when omitted
        #[arg(long, default_value = "")]
        to: String,

        /// Files to upload (at most 100)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Interactive folder browser (default)
    Browse {
        /// Folder to start in
        #[arg(default_value = "")]
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    List,
    Enter(String),
    Up,
    Select(Vec<PathBuf>),
    Upload,
    Help,
    Quit,
    Empty,
}

fn parse_browse_command(line: &str) -> anyhow::Result<BrowseCommand> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));
    Ok(match verb {
        "" => BrowseCommand::Empty,
        "ls" | "refresh" => BrowseCommand::List,
        "cd" if rest == ".." => BrowseCommand::Up,
        "cd" if !rest.is_empty() => BrowseCommand::Enter(rest.to_string()),
        "select" if !rest.is_empty() => {
            BrowseCommand::Select(rest.split_whitespace().map(PathBuf::from).collect())
        }
        "upload" => BrowseCommand::Upload,
        "help" | "?" => BrowseCommand::Help,
        "quit" | "exit" | "q" => BrowseCommand::Quit,
        other => anyhow::bail!("unknown command: {other} (type `help`)"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    let cli = Cli::parse();
    let config = BrowserConfig::from_env();
    let store = KeyringStore::with_service(config.keyring_service.clone());

    let command = cli.command.unwrap_or(Command::Browse {
        path: String::new(),
    });
    match command {
        Command::Login { redirect } => login(&config, &store, redirect).await,
        Command::Logout => {
            sign_out(&store).context("failed to remove saved token")?;
            println!("Signed out");
            Ok(())
        }
        Command::Ls { path, json } => {
            let Some(mut browser) = connect(&config, &store, FolderPath::parse(&path))? else {
                return show_sign_in(&config);
            };
            browser.open().await;
            if browser.needs_reauth() {
                return reauthenticate(&config, &store);
            }
            if let Some(error) = browser.listing().error() {
                anyhow::bail!("{error}");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(browser.listing().entries())?);
            } else {
                print!("{}", render_listing(browser.folder(), browser.listing()));
            }
            Ok(())
        }
        Command::Upload { to, files } => {
            let Some(mut browser) = connect(&config, &store, FolderPath::parse(&to))? else {
                return show_sign_in(&config);
            };
            let files = local_files(files)?;
            if let Err(err) = browser.select(files) {
                eprintln!("{}", render_too_many_files());
                return Err(err.into());
            }
            browser.open().await;
            if browser.needs_reauth() {
                return reauthenticate(&config, &store);
            }
            let outcome = browser.upload_selection().await.clone();
            print!("{}", render_listing(browser.folder(), browser.listing()));
            println!("{}", render_outcome(&outcome));
            if browser.needs_reauth() {
                return reauthenticate(&config, &store);
            }
            if outcome.failed > 0 {
                anyhow::bail!("{} of {} files failed to upload", outcome.failed, outcome.total());
            }
            Ok(())
        }
        Command::Browse { path } => {
            let Some(browser) = connect(&config, &store, FolderPath::parse(&path))? else {
                return show_sign_in(&config);
            };
            browse(browser, &config, &store).await
        }
    }
}

async fn login(
    config: &BrowserConfig,
    store: &dyn KeyValueStore,
    redirect: Option<String>,
) -> anyhow::Result<()> {
    let redirect = match redirect {
        Some(redirect) => redirect,
        None => {
            let url = authorize_url(config)?;
            println!("Open this URL in your browser:\n{url}");
            print!("Paste the address you were redirected to: ");
            std::io::stdout().flush()?;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            lines.next_line().await?.unwrap_or_default()
        }
    };
    let location = Url::parse(redirect.trim()).context("redirect address is not a valid URL")?;
    match resolve_session(Some(&location), store).context("failed to save token")? {
        AuthResolution::Present {
            source: TokenSource::Redirect,
            location,
            ..
        } => {
            match location {
                Some(clean) => println!("Signed in, returned to {clean}"),
                None => println!("Signed in"),
            }
            Ok(())
        }
        AuthResolution::Present { .. } => {
            anyhow::bail!("no access_token found in the redirect address; the saved token is kept")
        }
        AuthResolution::Absent => anyhow::bail!("no access_token found in the redirect address"),
    }
}

async fn browse(
    mut browser: FolderBrowser<YadiskGateway>,
    config: &BrowserConfig,
    store: &dyn KeyValueStore,
) -> anyhow::Result<()> {
    browser.open().await;
    print!("{}", render_listing(browser.folder(), browser.listing()));
    if browser.needs_reauth() {
        return reauthenticate(config, store);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", browser.folder());
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_browse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match command {
            BrowseCommand::Empty => continue,
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                print_browse_help();
                continue;
            }
            BrowseCommand::List => browser.refresh().await,
            BrowseCommand::Up => {
                if !browser.ascend().await {
                    println!("Already at the disk root");
                    continue;
                }
            }
            BrowseCommand::Enter(name) => {
                let is_dir = browser
                    .listing()
                    .entries()
                    .iter()
                    .any(|entry| entry.name == name && entry.kind == EntryKind::Dir);
                if !is_dir {
                    println!("No folder named {name:?} here");
                    continue;
                }
                browser.descend_into(&name).await;
            }
            BrowseCommand::Select(paths) => {
                match local_files(paths) {
                    Ok(files) => match browser.select(files) {
                        Ok(_) => println!("{}", render_selection(browser.selection())),
                        Err(SelectionError::TooManyFiles { .. }) => {
                            println!("{}", render_too_many_files());
                        }
                        Err(err) => println!("{err}"),
                    },
                    Err(err) => println!("{err}"),
                }
                continue;
            }
            BrowseCommand::Upload => {
                if browser.selection().is_empty() {
                    println!("{}", render_selection(browser.selection()));
                    continue;
                }
                let outcome = browser.upload_selection().await.clone();
                print!("{}", render_listing(browser.folder(), browser.listing()));
                println!("{}", render_outcome(&outcome));
                if browser.needs_reauth() {
                    return reauthenticate(config, store);
                }
                continue;
            }
        }
        print!("{}", render_listing(browser.folder(), browser.listing()));
        if browser.needs_reauth() {
            return reauthenticate(config, store);
        }
    }
    Ok(())
}

fn connect(
    config: &BrowserConfig,
    store: &dyn KeyValueStore,
    folder: FolderPath,
) -> anyhow::Result<Option<FolderBrowser<YadiskGateway>>> {
    let Some(token) = session_token(config, store)? else {
        return Ok(None);
    };
    let client = config
        .api_client(token.as_str())
        .context("invalid api base url")?;
    let gateway = YadiskGateway::new(client, config.list_limit);
    Ok(Some(FolderBrowser::at(gateway, folder)))
}

fn session_token(
    config: &BrowserConfig,
    store: &dyn KeyValueStore,
) -> anyhow::Result<Option<BearerToken>> {
    if let Some(token) = &config.token {
        return Ok(Some(BearerToken::new(token.clone())));
    }
    let resolution = resolve_session(None, store).context("failed to read saved token")?;
    Ok(resolution.token().cloned())
}

fn local_files(paths: Vec<PathBuf>) -> anyhow::Result<Vec<LocalFile>> {
    paths
        .into_iter()
        .map(|path| {
            if !path.is_file() {
                anyhow::bail!("not a file: {}", path.display());
            }
            Ok(LocalFile::from_path(path)?)
        })
        .collect()
}

fn authorize_url(config: &BrowserConfig) -> anyhow::Result<Url> {
    config
        .implicit_grant()
        .and_then(|grant| grant.authorize_url(&config.redirect_url))
        .context("invalid oauth configuration")
}

fn show_sign_in(config: &BrowserConfig) -> anyhow::Result<()> {
    println!("{}", render_sign_in(&authorize_url(config)?));
    Ok(())
}

fn reauthenticate(config: &BrowserConfig, store: &dyn KeyValueStore) -> anyhow::Result<()> {
    if config.token.is_some() {
        anyhow::bail!("the token from YADISK_TOKEN was rejected");
    }
    sign_out(store).context("failed to remove rejected token")?;
    println!("The saved access token was rejected.");
    show_sign_in(config)
}

fn print_browse_help() {
    println!("Commands:");
    println!("  ls              Reload the current folder");
    println!("  cd NAME         Open a folder from the listing");
    println!("  cd ..           Go to the parent folder");
    println!("  select FILE...  Choose up to 100 local files");
    println!("  upload          Upload the chosen files here");
    println!("  quit            Leave the browser");
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
