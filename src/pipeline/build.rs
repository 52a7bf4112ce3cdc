use crate::error::GradeError;
use crate::sandbox::{CapturedOutput, Invoker, MakeCommand, command};

/// What `ls` prints for a path that does not exist
const MISSING_FILE: &str = "No such file or directory";

/// Runs `make` in `build_dir` and captures everything it prints
///
/// The outer error aborts the request. An inner error means the output could
/// not be read back and maps onto a transport error verdict.
pub async fn build(
    invoker: &Invoker<'_>,
    build_dir: &str,
    force_rebuild: bool,
    target: Option<&str>,
) -> Result<Result<CapturedOutput, anyhow::Error>, GradeError> {
    let cmd = MakeCommand::new(build_dir)
        .force_rebuild(force_rebuild)
        .target(target)
        .build();

    let captured = invoker.capture(&cmd).await?;
    if let Ok(output) = &captured {
        log::debug!(
            "[{cmd}] on {} exited with {}:\n{}",
            invoker.instance().name,
            output.status,
            output.text
        );
    }
    Ok(captured)
}

/// Makes sure a previously compiled artifact is still there
pub async fn probe_artifact(invoker: &Invoker<'_>, artifact: &str) -> Result<(), GradeError> {
    let listing = invoker
        .capture(&command::list(artifact))
        .await?
        .map_err(GradeError::Internal)?;

    if listing.text.contains(MISSING_FILE) {
        log::info!(
            "Artifact {artifact} not present on instance {}",
            invoker.instance().name
        );
        return Err(GradeError::not_found(format!("artifact {artifact}")));
    }

    Ok(())
}
