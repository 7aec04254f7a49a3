//! Clearway CLI — entry point.

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "clearway",
    about = "Clearway — verify Lodestone characters and sync clear roles",
    version
)]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// The character a command is about.
#[derive(clap::Args, Clone)]
pub struct CharacterArgs {
    /// Character's world
    #[arg(long)]
    pub world: String,
    /// Character's first name
    #[arg(long)]
    pub first_name: String,
    /// Character's last name
    #[arg(long)]
    pub last_name: String,
    /// Skip the search and use this Lodestone id
    #[arg(long)]
    pub lodestone_id: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a character's Lodestone id
    Resolve {
        #[command(flatten)]
        character: CharacterArgs,
    },
    /// Check a verification token in the character's self introduction
    Verify {
        #[command(flatten)]
        character: CharacterArgs,
        /// Token expected in the self introduction
        #[arg(long)]
        token: String,
    },
    /// List every achievement reachable from the character's profile
    Achievements {
        #[command(flatten)]
        character: CharacterArgs,
    },
    /// Show the role diff for a rankings export (no Lodestone access)
    Sync {
        #[command(flatten)]
        character: CharacterArgs,
        /// JSON file of encounter rankings
        #[arg(long)]
        rankings: String,
        /// Roles currently held, comma separated
        #[arg(long, value_delimiter = ',')]
        held: Vec<String>,
    },
    /// Run the full clears flow against an in-memory role store
    Clears {
        #[command(flatten)]
        character: CharacterArgs,
        /// Token expected in the self introduction
        #[arg(long)]
        token: String,
        /// JSON file of encounter rankings
        #[arg(long)]
        rankings: String,
        /// Roles currently held, comma separated
        #[arg(long, value_delimiter = ',')]
        held: Vec<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let ctx = commands::Context {
        config_path: cli.config,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Resolve { character } => commands::resolve(&ctx, &character).await,
        Commands::Verify { character, token } => commands::verify(&ctx, &character, &token).await,
        Commands::Achievements { character } => commands::achievements(&ctx, &character).await,
        Commands::Sync {
            character,
            rankings,
            held,
        } => commands::sync(&ctx, &character, &rankings, &held).await,
        Commands::Clears {
            character,
            token,
            rankings,
            held,
        } => commands::clears(&ctx, &character, &token, &rankings, &held).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "clearway", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result {
        if ctx.json {
            println!(
                "{}",
                serde_json::json!({ "error": true, "message": format!("{e:#}") })
            );
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
