use crate::error::GradeError;
use crate::sandbox::{Invoker, command};

/// Where the assets for one build come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSource<'a> {
    /// Git repository cloned into the working directory
    Repository(&'a str),
    /// Directory tree on a web host, mirrored from `<host>/<item>/`
    Tree { host: &'a str, item: &'a str },
}

/// Populates the instance's working directory with build and test assets
///
/// Only a failure to dispatch the command aborts the request. A clone into a
/// directory that already holds the repository exits non-zero and is fine.
pub async fn fetch_resources(
    invoker: &Invoker<'_>,
    source: ResourceSource<'_>,
) -> Result<(), GradeError> {
    let cmd = match source {
        ResourceSource::Repository(url) => command::clone_repository(url),
        ResourceSource::Tree { host, item } => command::recursive_fetch(host, item),
    };

    let status = invoker.run_for_status(&cmd).await?;
    log::info!(
        "Obtained resources for instance {} ([{cmd}] exited with {status})",
        invoker.instance().name
    );
    Ok(())
}
