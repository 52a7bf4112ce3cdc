mod exam;
mod test_runs;

pub use exam::*;
pub use test_runs::*;

use actix_multipart::Multipart;
use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse};
use futures::{Stream, StreamExt, TryStreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::error::GradeError;
use crate::pipeline::{MalformedPart, UploadPart};

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::info!("Rejected query string: {err}");
    InternalError::from_response(err, HttpResponse::BadRequest().finish()).into()
}

/// Adapts a multipart body into upload parts whose content is read lazily
///
/// Any error from the body, whether in a part's headers or halfway through
/// its content, means the request was malformed.
pub fn multipart_parts(
    payload: Multipart,
) -> impl Stream<Item = Result<UploadPart<impl AsyncRead>, GradeError>> {
    payload.map(|field| {
        let field = field.map_err(|e| {
            log::warn!("Malformed multipart body: {e}");
            GradeError::bad_request("multipart body")
        })?;

        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        Ok(UploadPart {
            file_name,
            content: StreamReader::new(
                field.map_err(|e| std::io::Error::from(MalformedPart(e.to_string()))),
            ),
        })
    })
}
