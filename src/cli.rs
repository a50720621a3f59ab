// Command-line surface: argument definitions and the two commands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info};

use crate::api::{parse_tags, PinTarget, PinryClient};
use crate::config::Config;
use crate::error::PinryError;
use crate::ui;

pub const MISSING_CONFIG: &str =
    "config file invalid or doesn't exist, use 'pinry config' to create new";

#[derive(Parser, Debug)]
#[command(name = "pinry", version, about = "Command-line client for a Pinry instance")]
pub struct Cli {
    /// Config file path (defaults to ~/.pinry-cli.config.json)
    #[arg(short, long, global = true, env = "PINRY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add host and token for pinry
    Config(ConfigArgs),
    /// Add file or url to pinry instance
    Add(AddArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Pinry host, e.g. https://pin.example.com (prompted if omitted)
    #[arg(long = "pinry_url", alias = "pinry-url")]
    pub pinry_url: Option<String>,

    /// API token from the Profile page (prompted if omitted)
    #[arg(long)]
    pub token: Option<String>,

    /// Check the token against the server before saving
    #[arg(long)]
    pub verify: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Board name
    #[arg(short, long)]
    pub board: Option<String>,

    /// Tags separated by comma ','
    #[arg(short, long, default_value = "")]
    pub tags: String,

    /// Description text
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Referer of pin
    #[arg(short, long, default_value = "")]
    pub referer: String,

    /// Local image path or image url
    pub file_or_url: String,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let path = cli.config_path();
    debug!(config = %path.display(), "using config file");

    match cli.command {
        Command::Config(args) => {
            let pinry_url = ui::host_or_prompt(args.pinry_url)?;
            let token = ui::token_or_prompt(args.token)?;
            save_config(&path, &pinry_url, &token, args.verify)?;
            println!("config saved to {}", path.display());
        }
        Command::Add(args) => {
            let link = add_pin(&path, &args)?;
            println!("pin created: {}", link);
        }
    }
    Ok(())
}

/// Validate and persist host + token, optionally checking the token with
/// the server first.
pub fn save_config(path: &Path, pinry_url: &str, token: &str, verify: bool) -> Result<Config> {
    let config = Config::new(pinry_url, token)?;

    if verify {
        let client = PinryClient::from_config(&config)?;
        let spinner = ui::spinner("Checking token...");
        let valid = client.is_token_valid();
        spinner.finish_and_clear();
        if !valid.context("Failed to reach pinry instance")? {
            bail!("token was rejected by {}", client.pinry_url());
        }
    }

    config
        .save(path)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;
    info!(config = %path.display(), "config written");
    Ok(config)
}

/// Create a pin from the `add` arguments and return its resource link.
pub fn add_pin(config_path: &Path, args: &AddArgs) -> Result<String> {
    let config = Config::load(config_path)
        .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
    let Some(config) = config else {
        bail!(MISSING_CONFIG);
    };
    let mut client = PinryClient::from_config(&config).context(MISSING_CONFIG)?;

    let target = PinTarget::parse(&args.file_or_url);
    if let PinTarget::File(path) = &target {
        if !path.is_file() {
            return Err(PinryError::ImageNotFound(path.clone()).into());
        }
    }

    let board = args.board.as_deref();
    if let Some(name) = board {
        client.ensure_board(name)?;
    }
    let tags = parse_tags(&args.tags);

    let link = match target {
        PinTarget::Url(url) => {
            client.create(&args.description, &args.referer, &url, board, tags)?
        }
        PinTarget::File(path) => {
            let spinner = ui::spinner("Uploading...");
            let result = client.create_with_file_upload(
                &args.description,
                &args.referer,
                &path,
                tags,
                board,
            );
            spinner.finish_and_clear();
            result?
        }
    };
    Ok(link)
}
