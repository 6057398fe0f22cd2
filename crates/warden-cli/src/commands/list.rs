use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(owner: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let audits = ctx.manager.list_audits(owner).await?;
    output(&audits, flags.format)
}
