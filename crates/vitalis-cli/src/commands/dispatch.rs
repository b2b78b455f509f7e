use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler.
pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Migrate => commands::migrate::handle(ctx, flags),
        Commands::Create(args) => commands::record::create(&args, ctx, flags).await,
        Commands::Update(args) => commands::record::update(&args, ctx, flags).await,
        Commands::Delete(args) => commands::record::delete(&args, ctx, flags).await,
        Commands::Purge(args) => commands::record::purge(&args, ctx, flags).await,
        Commands::Show(args) => commands::record::show(&args, ctx, flags).await,
        Commands::List(args) => commands::record::list(&args, ctx, flags).await,
        Commands::Trend(args) => commands::record::trend(&args, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
    }
}
