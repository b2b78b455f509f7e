use vitalis_core::enums::{AuditAction, EntityType};
use vitalis_core::identity::ActorId;
use vitalis_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `vitalis audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let action = args
        .action
        .as_deref()
        .map(|raw| parse_enum::<AuditAction>(raw, "action"))
        .transpose()?;

    let filter = AuditFilter {
        entity_type: Some(EntityType::TestResult),
        entity_public_id: args.entity_id.clone(),
        actor_id: args.actor.as_deref().map(ActorId::from),
        action,
        limit: Some(ctx.effective_limit(flags.limit)),
    };

    let records = ctx.service.query_audit(&filter).await?;
    output(&records, flags.format)
}
