use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let progress = Progress::spinner(flags, "analyzing contract...");
    let audit = match ctx.manager.analyze_audit(id).await {
        Ok(audit) => audit,
        Err(error) => {
            progress.finish_clear();
            return Err(error).with_context(|| format!("failed to analyze audit '{id}'"));
        }
    };
    super::finish_analysis(&progress, &audit);

    output(&audit, flags.format)
}
