use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use trustdeposit_cli::commands;
use trustdeposit_cli::commands::receipt::ReceiptArgs;

#[derive(Parser)]
#[command(name = "trustdeposit")]
#[command(author, version, long_about = None)]
#[command(
    about = "Fill in a Smokeball trust account deposit receipt",
    long_about = "trustdeposit logs into Smokeball, completes two-factor verification, opens the \
                  trust transactions page of a matter and fills in the Deposit Funds form. \
                  By default it stops before submitting; pass --submit to create the receipt."
)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "ENVIRONMENT:
    SMOKEBALL_USERNAME      Login email (required)
    SMOKEBALL_PASSWORD      Login password (required)
    SMOKEBALL_TOTP_SECRET   Base32 2FA secret (or SMOKEBALL_2FA_SECRET); without it the code
                            is asked for on the terminal
    SMOKEBALL_BASE_URL      Portal address (default https://app.smokeball.com.au)
    TRUSTDEPOSIT_CHROME     Chrome binary, same as --chrome-path

A .env file in the current directory (or a parent) is read at startup.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    receipt: ReceiptArgs,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current 2FA code from SMOKEBALL_TOTP_SECRET
    Totp,

    /// Manage saved Chrome profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:
    bash, zsh, fish, powershell, elvish

INSTALLATION:
    bash:  trustdeposit completion --shell bash >> ~/.bashrc
    zsh:   trustdeposit completion --shell zsh > ~/.zfunc/_trustdeposit
    fish:  trustdeposit completion --shell fish > ~/.config/fish/completions/trustdeposit.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// List all saved profiles
    List,

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    // Before parsing, so .env can also supply env-backed flags
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(cli.verbose);
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Some(Commands::Totp) => commands::totp::execute(),
        Some(Commands::Profile { command }) => match command {
            ProfileCommands::List => commands::profile::list(),
            ProfileCommands::Delete { name, force } => {
                commands::profile::delete(&name, force)
            }
        },
        Some(Commands::Completion { shell }) => {
            commands::completion::execute(shell, &mut Cli::command())
        }
        None => {
            let result = commands::receipt::execute(cli.receipt)?;

            // Machine-readable outcome, always the last line
            println!("{}", serde_json::to_string(&result)?);

            if !result.success {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "trustdeposit=debug,trustdeposit_cli=debug,trustdeposit_core=debug,\
             trustdeposit_browser=debug,chromiumoxide=warn",
        )
    } else {
        EnvFilter::new(
            "trustdeposit=info,trustdeposit_cli=info,trustdeposit_core=info,trustdeposit_browser=info",
        )
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
