use actix_multipart::Multipart;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;

use super::multipart_parts;
use crate::error::GradeError;
use crate::pipeline::{ExamUpload, Grader};

#[derive(Deserialize, Debug)]
pub struct ExamRunQuery {
    pub examname: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ExamUploadQuery {
    pub examname: Option<String>,
    pub compiler: Option<String>,
    pub path: Option<String>,
}

/// Runs the `check` target of an exam that has already been compiled
#[get("/sessions/{session_id}/instances/{instance_name}/exam/run")]
pub async fn exam_run_handler(
    grader: web::Data<Grader>,
    path: web::Path<(String, String)>,
    query: web::Query<ExamRunQuery>,
) -> Result<HttpResponse, GradeError> {
    let (session_id, instance_name) = path.into_inner();

    let emission = grader
        .exam_run(&session_id, &instance_name, query.examname.as_deref())
        .await?;
    Ok(emission.into_response())
}

/// Uploads an exam submission and compiles it against the exam resources
///
/// A compile error comes back as 502 with make's output as the body.
#[post("/sessions/{session_id}/instances/{instance_name}/exam/upload")]
pub async fn exam_upload_compile_handler(
    grader: web::Data<Grader>,
    path: web::Path<(String, String)>,
    query: web::Query<ExamUploadQuery>,
    payload: Multipart,
) -> Result<HttpResponse, GradeError> {
    let (session_id, instance_name) = path.into_inner();
    let params = ExamUpload {
        exam_name: query.examname.as_deref(),
        compiler: query.compiler.as_deref(),
        path: query.path.as_deref(),
    };

    let emission = grader
        .exam_upload_compile(&session_id, &instance_name, params, multipart_parts(payload))
        .await?;
    Ok(emission.into_response())
}
