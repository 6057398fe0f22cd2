use std::path::Path;

use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

pub async fn run(
    file: &Path,
    owner: &str,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read contract source {}", file.display()))?;

    let progress = Progress::spinner(flags, "analyzing contract...");
    let audit = match ctx.manager.submit_audit(owner, &source).await {
        Ok(audit) => audit,
        Err(error) => {
            progress.finish_clear();
            return Err(error).context("audit submission failed");
        }
    };
    super::finish_analysis(&progress, &audit);

    output(&audit, flags.format)
}
