use serde_json::json;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

/// Startup already drove the bootstrap to `Ready`; report how it got there.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = &ctx.report;
    let transitions = report
        .transitions
        .iter()
        .map(|state| state.as_str())
        .collect::<Vec<_>>();

    output(
        &json!({
            "database": ctx.config.database.path,
            "state": report.state.as_str(),
            "attempts": report.attempts,
            "applied": report.applied,
            "transitions": transitions,
        }),
        flags.format,
    )
}
