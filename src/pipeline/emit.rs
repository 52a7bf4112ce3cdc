use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;

use super::Verdict;

pub const BUILD_SUCCESSFUL: &str = "BUILD SUCCESSFUL.";
pub const TEXT_HTML: &str = "text/html";
pub const APPLICATION_JSON: &str = "application/json";

/// Header telling clients which verdict a 200 or 502 response carries
pub const VERDICT_HEADER: &str = "x-grade-verdict";

/// How a successful verdict is reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Fixed success message
    Summary,
    /// Tool output passed through untouched with the given content type
    Relay(&'static str),
}

/// Status, body and content type for one verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub status: StatusCode,
    pub body: String,
    pub content_type: Option<&'static str>,
    pub verdict: &'static str,
}

pub fn emit(verdict: Verdict, mode: ResponseMode) -> Emission {
    match verdict {
        Verdict::Success(output) => {
            let (body, content_type) = match mode {
                ResponseMode::Summary => (BUILD_SUCCESSFUL.to_string(), TEXT_HTML),
                ResponseMode::Relay(content_type) => (output, content_type),
            };
            Emission {
                status: StatusCode::OK,
                body,
                content_type: Some(content_type),
                verdict: "success",
            }
        }
        // A failing test run is a valid grading result, so the report is
        // relayed like a successful one
        Verdict::TestFailure(report) => Emission {
            status: StatusCode::OK,
            body: report,
            content_type: Some(match mode {
                ResponseMode::Summary => TEXT_HTML,
                ResponseMode::Relay(content_type) => content_type,
            }),
            verdict: "test-failure",
        },
        Verdict::CompileError(diagnostics) => Emission {
            status: StatusCode::BAD_GATEWAY,
            body: diagnostics,
            content_type: Some(TEXT_HTML),
            verdict: "compile-error",
        },
        Verdict::TransportError => Emission {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
            content_type: None,
            verdict: "transport-error",
        },
    }
}

impl Emission {
    pub fn into_response(self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);
        builder.insert_header((VERDICT_HEADER, self.verdict));
        if let Some(content_type) = self.content_type {
            builder.insert_header((CONTENT_TYPE, content_type));
        }
        builder.body(self.body)
    }
}
