use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::session::Instance;

/// Streams files into a sandboxed instance
///
/// Readers handed in here come straight off the request body, so they are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait InstanceFileWriter: Send + Sync {
    /// Writes everything `content` yields to `<dest_dir>/<file_name>`,
    /// creating `dest_dir` if needed. Returns the number of bytes written.
    async fn upload_from_reader(
        &self,
        instance: &Instance,
        file_name: &str,
        dest_dir: &str,
        content: &mut (dyn AsyncRead + Unpin),
    ) -> Result<u64>;
}
