use clap::{Args, Subcommand};

/// Top-level commands.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the schema bootstrap and report the outcome.
    Migrate,
    /// Record a new test result.
    Create(CreateArgs),
    /// Change fields of an active test result.
    Update(UpdateArgs),
    /// Soft-delete a test result.
    Delete(MutateArgs),
    /// Permanently remove a soft-deleted test result.
    Purge(MutateArgs),
    /// Show one test result.
    Show(ShowArgs),
    /// List an owner's test results.
    List(ListArgs),
    /// Series and summary statistics for one test.
    Trend(TrendArgs),
    /// Query the audit trail.
    Audit(AuditArgs),
}

#[derive(Clone, Debug, Args)]
pub struct CreateArgs {
    /// Acting identity (becomes the owner)
    #[arg(long)]
    pub actor: String,

    #[arg(long)]
    pub test_name: String,

    #[arg(long, allow_hyphen_values = true)]
    pub value: f64,

    #[arg(long)]
    pub unit: String,

    /// RFC 3339 timestamp (defaults to now)
    #[arg(long)]
    pub taken_at: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct UpdateArgs {
    /// Public ID of the test result
    pub id: String,

    #[arg(long)]
    pub actor: String,

    #[arg(long)]
    pub test_name: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<f64>,

    #[arg(long)]
    pub unit: Option<String>,

    /// RFC 3339 timestamp
    #[arg(long)]
    pub taken_at: Option<String>,

    #[arg(long, conflicts_with = "clear_notes")]
    pub notes: Option<String>,

    /// Remove the notes
    #[arg(long)]
    pub clear_notes: bool,
}

#[derive(Clone, Debug, Args)]
pub struct MutateArgs {
    /// Public ID of the test result
    pub id: String,

    #[arg(long)]
    pub actor: String,
}

#[derive(Clone, Debug, Args)]
pub struct ShowArgs {
    /// Public ID of the test result
    pub id: String,

    /// Also return soft-deleted records
    #[arg(long)]
    pub include_deleted: bool,
}

#[derive(Clone, Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub owner: String,

    /// taken-at-desc, taken-at-asc, test-name, updated-at-desc
    #[arg(long)]
    pub order: Option<String>,

    /// Also return soft-deleted records
    #[arg(long)]
    pub include_deleted: bool,
}

#[derive(Clone, Debug, Args)]
pub struct TrendArgs {
    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub test_name: String,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Public ID of the audited record
    #[arg(long)]
    pub entity_id: Option<String>,

    #[arg(long)]
    pub actor: Option<String>,

    /// update, soft-delete, purge
    #[arg(long)]
    pub action: Option<String>,
}
