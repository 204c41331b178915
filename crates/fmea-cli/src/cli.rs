use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fmea",
    about = "FMEA rule validation, structural checks and merge planning",
    version
)]
pub struct Cli {
    /// Log filter directive for stderr output (e.g. `info`, `fmea_validate=debug`)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate every row of a row document and check dataset structure
    Validate {
        /// Path to the row document (JSON)
        rows: String,

        /// Project ontology file; built-in rules are used when absent or unreadable
        #[arg(long)]
        ontology: Option<String>,

        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sort rows hierarchically and emit merge ranges for rendering
    Plan {
        /// Path to the row document (JSON)
        rows: String,

        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate one field value
    CheckField {
        /// Field kind or alias (mode, E, 고장형태, ...)
        kind: String,

        /// Field text
        value: String,

        /// Project ontology file
        #[arg(long)]
        ontology: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check one cross-field relation between two values
    CheckPair {
        /// Relation (`mode->cause`, `E->F`, ...)
        relation: String,

        /// Text of the relation's first field
        a: String,

        /// Text of the relation's second field
        b: String,

        /// Project ontology file
        #[arg(long)]
        ontology: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize the active rule tables
    Ontology {
        /// Project ontology file
        #[arg(long)]
        ontology: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a row document with canonical field names
    Normalize {
        /// Path to the row document (JSON)
        rows: String,
    },
}
