use std::io;

use anyhow::Context;
use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;

use crate::error::GradeError;
use crate::sandbox::InstanceFileWriter;
use crate::sandbox::command::validate_name;
use crate::session::Instance;

/// One part of a multipart body
pub struct UploadPart<R> {
    /// `None` for plain form fields
    pub file_name: Option<String>,
    pub content: R,
}

/// The request body broke off or went malformed inside a part
///
/// Part readers report it wrapped in an [`io::Error`], so that writers can
/// pass it through unchanged and the upload is rejected as a bad request.
#[derive(Debug, thiserror::Error)]
#[error("malformed multipart body: {0}")]
pub struct MalformedPart(pub String);

impl From<MalformedPart> for io::Error {
    fn from(err: MalformedPart) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, err)
    }
}

fn is_malformed_part(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .and_then(io::Error::get_ref)
            .is_some_and(|inner| inner.is::<MalformedPart>())
    })
}

/// Streams every file part into `dest_dir` on the instance
///
/// Parts are pulled one at a time and iteration stops at the first failure.
/// Returns the number of files written.
pub async fn upload_all<S, R>(
    writer: &dyn InstanceFileWriter,
    instance: &Instance,
    parts: S,
    dest_dir: &str,
) -> Result<usize, GradeError>
where
    S: Stream<Item = Result<UploadPart<R>, GradeError>>,
    R: AsyncRead,
{
    let mut parts = std::pin::pin!(parts);
    let mut uploaded = 0;

    while let Some(part) = parts.next().await {
        let part = part?;
        let Some(file_name) = part.file_name.as_deref() else {
            continue;
        };
        let file_name = validate_name("file name", file_name)?;

        let mut content = Box::pin(part.content);
        let written = writer
            .upload_from_reader(instance, file_name, dest_dir, &mut content)
            .await
            .with_context(|| format!("uploading {file_name} to {dest_dir}"))
            .map_err(|e| {
                if is_malformed_part(&e) {
                    log::warn!("Rejected upload to instance {}: {e:#}", instance.name);
                    GradeError::bad_request("multipart body")
                } else {
                    log::error!("Failed to upload to instance {}: {e:#}", instance.name);
                    GradeError::Internal(e)
                }
            })?;

        log::info!(
            "Uploaded [{file_name}] ({written} bytes) to [{}]",
            instance.name
        );
        uploaded += 1;
    }

    Ok(uploaded)
}
