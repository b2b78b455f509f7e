//! Handlers for the test result commands.

use serde_json::json;
use vitalis_core::entities::NewTestResult;
use vitalis_core::enums::OrderKey;
use vitalis_core::identity::ActorId;
use vitalis_core::time::now_utc;
use vitalis_db::filter::ReadScope;
use vitalis_db::updates::test_result::TestResultUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::{
    CreateArgs, ListArgs, MutateArgs, ShowArgs, TrendArgs, UpdateArgs,
};
use crate::commands::shared::parse::{parse_enum, parse_timestamp};
use crate::context::AppContext;
use crate::output::output;

pub async fn create(args: &CreateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let taken_at = match args.taken_at.as_deref() {
        Some(raw) => parse_timestamp(raw, "taken_at")?,
        None => now_utc(),
    };
    let new = NewTestResult {
        test_name: args.test_name.clone(),
        value: args.value,
        unit: args.unit.clone(),
        taken_at,
        notes: args.notes.clone(),
    };

    let result = ctx
        .service
        .create_test_result(&ActorId::from(args.actor.as_str()), new)
        .await?;
    output(&result, flags.format)
}

pub async fn update(args: &UpdateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut builder = TestResultUpdateBuilder::new();
    if let Some(ref name) = args.test_name {
        builder = builder.test_name(name.as_str());
    }
    if let Some(value) = args.value {
        builder = builder.value(value);
    }
    if let Some(ref unit) = args.unit {
        builder = builder.unit(unit.as_str());
    }
    if let Some(ref raw) = args.taken_at {
        builder = builder.taken_at(parse_timestamp(raw, "taken_at")?);
    }
    if args.clear_notes {
        builder = builder.notes(None);
    } else if let Some(ref notes) = args.notes {
        builder = builder.notes(Some(notes.clone()));
    }

    let result = ctx
        .service
        .submit_update(&args.id, builder.build(), &ActorId::from(args.actor.as_str()))
        .await?;
    output(&result, flags.format)
}

pub async fn delete(args: &MutateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.service
        .submit_soft_delete(&args.id, &ActorId::from(args.actor.as_str()))
        .await?;
    output(&json!({ "public_id": args.id, "deleted": true }), flags.format)
}

pub async fn purge(args: &MutateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    ctx.service
        .purge(&args.id, &ActorId::from(args.actor.as_str()))
        .await?;
    output(&json!({ "public_id": args.id, "purged": true }), flags.format)
}

pub async fn show(args: &ShowArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let result = ctx
        .service
        .get_by_public_id(&args.id, args.include_deleted)
        .await?;
    output(&result, flags.format)
}

pub async fn list(args: &ListArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let order = args
        .order
        .as_deref()
        .map(|raw| parse_enum::<OrderKey>(raw, "order"))
        .transpose()?
        .unwrap_or_default();
    let limit = usize::try_from(ctx.effective_limit(flags.limit)).unwrap_or(usize::MAX);

    let mut results = ctx
        .service
        .list(
            &ActorId::from(args.owner.as_str()),
            order,
            ReadScope::from_include_deleted(args.include_deleted),
        )
        .await?;
    results.truncate(limit);
    output(&results, flags.format)
}

pub async fn trend(args: &TrendArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let summary = ctx
        .service
        .trend(&ActorId::from(args.owner.as_str()), &args.test_name)
        .await?;
    output(&summary, flags.format)
}
