use clap::{Parser, Subcommand};

/// keydash — API key management dashboard
#[derive(Parser)]
#[command(name = "keydash", version, about)]
pub struct Cli {
    /// Use an in-process store instead of the hosted one (nothing is persisted)
    #[arg(long, global = true)]
    pub in_memory: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the dashboard on localhost
    Serve {
        /// Port to bind (defaults to KEYDASH_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage API keys from the terminal
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// List API keys
    List {
        /// Show full keys instead of masked ones
        #[arg(long)]
        reveal: bool,
    },
    /// Create a new API key
    Create {
        #[arg(long)]
        name: String,
    },
    /// Rename an API key
    Rename {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
    },
    /// Delete an API key
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Copy an API key to the clipboard (needs KEYDASH_CLIPBOARD_CMD)
    Copy {
        #[arg(long)]
        id: String,
    },
    /// Print one full API key
    Show {
        #[arg(long)]
        id: String,
    },
}
