use actix_multipart::Multipart;
use actix_web::{HttpResponse, post, web};
use serde::Deserialize;

use super::multipart_parts;
use crate::error::GradeError;
use crate::pipeline::{APPLICATION_JSON, Grader, ResponseMode, TestUpload};

#[derive(Deserialize, Debug)]
pub struct TestUploadQuery {
    pub path: Option<String>,
    pub testname: Option<String>,
}

impl TestUploadQuery {
    fn params(&self) -> TestUpload<'_> {
        TestUpload {
            test_name: self.testname.as_deref(),
            path: self.path.as_deref(),
        }
    }
}

/// Uploads code, fetches the named test suite and relays the runner's report
#[post("/sessions/{session_id}/instances/{instance_name}/test/upload")]
pub async fn test_upload_handler(
    grader: web::Data<Grader>,
    path: web::Path<(String, String)>,
    query: web::Query<TestUploadQuery>,
    payload: Multipart,
) -> Result<HttpResponse, GradeError> {
    let (session_id, instance_name) = path.into_inner();

    let emission = grader
        .test_upload(
            &session_id,
            &instance_name,
            query.params(),
            ResponseMode::Relay(APPLICATION_JSON),
            multipart_parts(payload),
        )
        .await?;
    Ok(emission.into_response())
}

#[post("/sessions/{session_id}/instances/{instance_name}/test/build")]
pub async fn test_build_handler(
    grader: web::Data<Grader>,
    path: web::Path<(String, String)>,
    query: web::Query<TestUploadQuery>,
    payload: Multipart,
) -> Result<HttpResponse, GradeError> {
    let (session_id, instance_name) = path.into_inner();

    let emission = grader
        .test_upload(
            &session_id,
            &instance_name,
            query.params(),
            ResponseMode::Summary,
            multipart_parts(payload),
        )
        .await?;
    Ok(emission.into_response())
}
