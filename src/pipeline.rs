mod build;
mod emit;
mod resources;
#[cfg(test)]
pub(crate) mod testing;
mod upload;
mod verdict;

pub use build::{build, probe_artifact};
pub use emit::{
    APPLICATION_JSON, BUILD_SUCCESSFUL, Emission, ResponseMode, TEXT_HTML, VERDICT_HEADER, emit,
};
pub use resources::{ResourceSource, fetch_resources};
pub use upload::{MalformedPart, UploadPart, upload_all};
pub use verdict::{Classifier, Verdict};

use std::str::FromStr;
use std::sync::Arc;

use futures::Stream;
use tokio::io::AsyncRead;

use crate::config::EndpointConfig;
use crate::error::GradeError;
use crate::sandbox::command::{join_path, validate_dir, validate_name};
use crate::sandbox::{CapturedOutput, Executor, InstanceFileWriter, Invoker};
use crate::session::{self, Instance, InstanceRegistry, SessionStore};

/// Directory used when the caller does not name one: the instance's workdir
pub const DEFAULT_PATH: &str = ".";

/// Toolchain family an exam is compiled with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compiler {
    Rose,
    Llvm,
}

impl FromStr for Compiler {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rose" => Ok(Self::Rose),
            "llvm" => Ok(Self::Llvm),
            other => {
                log::info!("Rejected compiler {other:?}");
                Err(GradeError::bad_request("compiler"))
            }
        }
    }
}

/// Caller-supplied parameters of an exam upload
#[derive(Debug, Clone, Copy, Default)]
pub struct ExamUpload<'a> {
    pub exam_name: Option<&'a str>,
    pub compiler: Option<&'a str>,
    pub path: Option<&'a str>,
}

/// Caller-supplied parameters of a test upload
#[derive(Debug, Clone, Copy, Default)]
pub struct TestUpload<'a> {
    pub test_name: Option<&'a str>,
    pub path: Option<&'a str>,
}

/// Drives submissions through resolve, upload, fetch, build and classify
///
/// Every collaborator is handed in at construction. A request only ever sees
/// its own instance reference and buffers.
pub struct Grader {
    sessions: Arc<dyn SessionStore>,
    instances: Arc<dyn InstanceRegistry>,
    executor: Arc<dyn Executor>,
    writer: Arc<dyn InstanceFileWriter>,
    endpoints: EndpointConfig,
}

impl Grader {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        instances: Arc<dyn InstanceRegistry>,
        executor: Arc<dyn Executor>,
        writer: Arc<dyn InstanceFileWriter>,
        endpoints: EndpointConfig,
    ) -> Self {
        Self {
            sessions,
            instances,
            executor,
            writer,
            endpoints,
        }
    }

    pub fn resolve(&self, session_id: &str, instance_name: &str) -> Result<Instance, GradeError> {
        session::resolve(
            self.sessions.as_ref(),
            self.instances.as_ref(),
            session_id,
            instance_name,
        )
    }

    /// Re-runs the `check` target of an exam that was compiled earlier
    pub async fn exam_run(
        &self,
        session_id: &str,
        instance_name: &str,
        exam_name: Option<&str>,
    ) -> Result<Emission, GradeError> {
        let instance = self.resolve(session_id, instance_name)?;
        let exam = required_name("exam name", exam_name)?;
        let invoker = Invoker::new(self.executor.as_ref(), &instance);

        // Step 1: the submission must have been uploaded and compiled
        probe_artifact(&invoker, &format!("exams/{exam}/{exam}_submission")).await?;

        // Step 2: run the checks and hand their output back as is
        let captured = build(&invoker, &format!("exams/{exam}"), false, Some("check")).await?;
        let verdict = match captured {
            Ok(output) => Verdict::Success(output.text),
            Err(_) => Verdict::TransportError,
        };

        Ok(finish(&instance, verdict, ResponseMode::Relay(TEXT_HTML)))
    }

    /// Fetches the exam resources, uploads the submission and compiles it
    pub async fn exam_upload_compile<S, R>(
        &self,
        session_id: &str,
        instance_name: &str,
        params: ExamUpload<'_>,
        parts: S,
    ) -> Result<Emission, GradeError>
    where
        S: Stream<Item = Result<UploadPart<R>, GradeError>>,
        R: AsyncRead,
    {
        let instance = self.resolve(session_id, instance_name)?;
        let compiler: Compiler = params
            .compiler
            .ok_or_else(|| GradeError::bad_request("compiler"))?
            .parse()?;
        let exam = required_name("exam name", params.exam_name)?;
        let base = validate_dir("path", params.path.unwrap_or(DEFAULT_PATH))?;
        let invoker = Invoker::new(self.executor.as_ref(), &instance);

        log::info!("Using {compiler:?} endpoint for exam {exam}");
        let endpoint = self.endpoints.exam_endpoint(compiler);
        fetch_resources(&invoker, ResourceSource::Repository(endpoint)).await?;

        let dest = join_path(base, &format!("exams/{exam}"));
        upload_all(self.writer.as_ref(), &instance, parts, &dest).await?;

        let captured = build(&invoker, &dest, true, None).await?;
        let verdict = classify(Classifier::EXAM, captured);

        Ok(finish(&instance, verdict, ResponseMode::Summary))
    }

    /// Uploads a submission, fetches its test assets, then builds and runs it
    ///
    /// With [`ResponseMode::Relay`] the test runner's output is passed back,
    /// and a failing run is reported as such. With [`ResponseMode::Summary`]
    /// only the build outcome matters.
    pub async fn test_upload<S, R>(
        &self,
        session_id: &str,
        instance_name: &str,
        params: TestUpload<'_>,
        mode: ResponseMode,
        parts: S,
    ) -> Result<Emission, GradeError>
    where
        S: Stream<Item = Result<UploadPart<R>, GradeError>>,
        R: AsyncRead,
    {
        let instance = self.resolve(session_id, instance_name)?;
        let test = required_name("test name", params.test_name)?;
        let dest = validate_dir("path", params.path.unwrap_or(DEFAULT_PATH))?;
        let invoker = Invoker::new(self.executor.as_ref(), &instance);

        upload_all(self.writer.as_ref(), &instance, parts, dest).await?;

        fetch_resources(
            &invoker,
            ResourceSource::Tree {
                host: &self.endpoints.tests,
                item: test,
            },
        )
        .await?;

        let captured = build(&invoker, dest, false, None).await?;
        let classifier = match mode {
            ResponseMode::Relay(_) => Classifier::TEST_RUN,
            ResponseMode::Summary => Classifier::BUILD,
        };
        let verdict = classify(classifier, captured);

        Ok(finish(&instance, verdict, mode))
    }
}

fn required_name<'a>(kind: &str, value: Option<&'a str>) -> Result<&'a str, GradeError> {
    let value = value.ok_or_else(|| {
        log::info!("Missing {kind}");
        GradeError::bad_request(format!("missing {kind}"))
    })?;
    validate_name(kind, value)
}

fn classify(classifier: Classifier, captured: Result<CapturedOutput, anyhow::Error>) -> Verdict {
    match captured {
        Ok(output) => classifier.classify_output(output),
        Err(_) => Verdict::TransportError,
    }
}

fn finish(instance: &Instance, verdict: Verdict, mode: ResponseMode) -> Emission {
    let emission = emit(verdict, mode);
    log::info!(
        "Instance {} graded: {} ({})",
        instance.name,
        emission.verdict,
        emission.status
    );
    emission
}
