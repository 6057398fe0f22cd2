use warden_core::entities::Audit;
use warden_core::enums::AuditStatus;

use crate::cli::{Commands, GlobalFlags};
use crate::context::AppContext;
use crate::progress::Progress;

mod analyze;
mod list;
mod show;
mod submit;
mod validate;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Submit { file, owner, .. } => submit::run(&file, &owner, ctx, flags).await,
        Commands::Analyze { id, .. } => analyze::run(&id, ctx, flags).await,
        Commands::Validate { id } => validate::run(&id, ctx, flags).await,
        Commands::Show { id } => show::run(&id, ctx, flags).await,
        Commands::List { owner } => list::run(&owner, ctx, flags).await,
    }
}

/// Close the analysis spinner with a one-line outcome.
fn finish_analysis(progress: &Progress, audit: &Audit) {
    match (&audit.status, &audit.report) {
        (AuditStatus::Analyzed, Some(report)) => progress.finish_ok(&format!(
            "{}: {} findings, score {}",
            audit.id,
            report.vulnerabilities.len(),
            report.security_score
        )),
        _ => progress.finish_err(&format!(
            "{}: analysis failed: {}",
            audit.id,
            audit.failure_reason.as_deref().unwrap_or("unknown reason")
        )),
    }
}
