use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let audit = ctx
        .manager
        .validate_audit(id)
        .await
        .with_context(|| format!("failed to validate audit '{id}'"))?;
    output(&audit, flags.format)
}
