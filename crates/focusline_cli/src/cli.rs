use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "focusline",
    about = "Focusline: personal work tracking with a single current focus",
    version
)]
pub struct Cli {
    /// Path to the SQLite database file
    #[arg(long, global = true, default_value = "focusline.sqlite3")]
    pub db: String,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when absent
    #[arg(long, global = true)]
    pub log_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new item in `waiting`
    Add {
        /// Item title
        title: String,

        /// Context: objectives, research, needs or reminders
        #[arg(long)]
        context: String,

        /// Zone id to tag the item with
        #[arg(long)]
        zone: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Free-form due date
        #[arg(long)]
        due: Option<String>,

        /// Explicit ref code (AAA-XXXXX); generated when absent
        #[arg(long)]
        ref_code: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List items in display order
    List {
        /// Restrict to one status bucket
        #[arg(long)]
        status: Option<String>,

        /// Restrict to contexts (repeatable)
        #[arg(long = "context")]
        contexts: Vec<String>,

        /// Restrict to one zone id
        #[arg(long)]
        zone: Option<String>,

        /// Include done items when no status is given
        #[arg(long)]
        all: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one item by id or ref code
    Show {
        item: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move an item to another status
    Status {
        item: String,

        /// Target status: waiting, in_progress, current or done
        status: String,
    },

    /// Move an item to a position inside its status bucket
    Move {
        item: String,

        /// Zero-based target position; clamped to the bucket
        index: i64,
    },

    /// Edit title, notes, zone or due date
    Edit {
        item: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, conflicts_with = "clear_notes")]
        notes: Option<String>,

        #[arg(long)]
        clear_notes: bool,

        #[arg(long, conflicts_with = "clear_zone")]
        zone: Option<String>,

        #[arg(long)]
        clear_zone: bool,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,
    },

    /// Zone management
    Zone {
        #[command(subcommand)]
        command: ZoneCommands,
    },

    /// Print core linkage info
    Ping,
}

#[derive(Subcommand)]
pub enum ZoneCommands {
    /// Create a zone
    Add { name: String },

    /// List zones
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a zone; tagged items keep existing untagged
    Delete { zone: String },
}
