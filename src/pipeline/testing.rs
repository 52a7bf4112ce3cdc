//! Recording collaborators for the pipeline's unit tests

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use crate::config::EndpointConfig;
use crate::sandbox::{CommandDescriptor, CommandOutput, Executor, InstanceFileWriter};
use crate::session::{Instance, MemorySessionStore, Session};

use super::{Grader, UploadPart};

pub fn instance() -> Instance {
    Instance {
        name: "node1".to_string(),
        container: "c-node1".to_string(),
    }
}

pub fn part(file_name: Option<&str>, content: &'static str) -> UploadPart<&'static [u8]> {
    UploadPart {
        file_name: file_name.map(str::to_string),
        content: content.as_bytes(),
    }
}

pub fn grader(executor: Arc<RecordingExecutor>, writer: Arc<RecordingWriter>) -> Grader {
    grader_with(executor, writer, instance())
}

/// Grader whose session `s1` holds only `instance`
pub fn grader_with(
    executor: Arc<dyn Executor>,
    writer: Arc<dyn InstanceFileWriter>,
    instance: Instance,
) -> Grader {
    let store = Arc::new(MemorySessionStore::new());
    store.insert(Session {
        id: "s1".to_string(),
        instances: vec![instance],
    });
    Grader::new(
        store.clone(),
        store,
        executor,
        writer,
        EndpointConfig {
            rose_exam: "https://git.example/rose.git".to_string(),
            llvm_exam: "https://git.example/llvm.git".to_string(),
            tests: "https://tests.example/suite".to_string(),
        },
    )
}

#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Vec<String>>>,
    outputs: HashMap<String, (i32, String)>,
    failing: Option<String>,
    broken: Option<String>,
}

impl RecordingExecutor {
    /// Fails to dispatch any command running `program`
    pub fn failing(program: &str) -> Self {
        Self {
            failing: Some(program.to_string()),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, program: &str, status: i32, text: &str) -> Self {
        self.outputs
            .insert(program.to_string(), (status, text.to_string()));
        self
    }

    /// Output of `program` errors out while being read
    pub fn with_broken_output(mut self, program: &str) -> Self {
        self.broken = Some(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    fn record(&self, command: &CommandDescriptor) -> Result<String> {
        self.calls.lock().push(command.args().to_vec());
        let program = command.program().unwrap_or_default().to_string();
        if self.failing.as_deref() == Some(program.as_str()) {
            return Err(anyhow!("cannot reach instance"));
        }
        Ok(program)
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn exec(&self, _instance: &Instance, command: &CommandDescriptor) -> Result<i32> {
        self.record(command)?;
        Ok(0)
    }

    async fn exec_output(
        &self,
        _instance: &Instance,
        command: &CommandDescriptor,
    ) -> Result<CommandOutput> {
        let program = self.record(command)?;
        if self.broken.as_deref() == Some(program.as_str()) {
            return Ok(CommandOutput {
                status: 0,
                stream: Box::new(Broken),
            });
        }
        let (status, text) = self.outputs.get(&program).cloned().unwrap_or_default();
        Ok(CommandOutput {
            status,
            stream: Box::new(Cursor::new(text.into_bytes())),
        })
    }
}

struct Broken;

impl AsyncRead for Broken {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "exec channel closed",
        )))
    }
}

/// Records `(dest_dir, file_name, content)` for every successful write
#[derive(Default)]
pub struct RecordingWriter {
    writes: Mutex<Vec<(String, String, String)>>,
    fail_on: Option<String>,
}

impl RecordingWriter {
    pub fn failing_on(file_name: &str) -> Self {
        Self {
            fail_on: Some(file_name.to_string()),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<(String, String, String)> {
        self.writes.lock().clone()
    }
}

#[async_trait(?Send)]
impl InstanceFileWriter for RecordingWriter {
    async fn upload_from_reader(
        &self,
        _instance: &Instance,
        file_name: &str,
        dest_dir: &str,
        content: &mut (dyn AsyncRead + Unpin),
    ) -> Result<u64> {
        if self.fail_on.as_deref() == Some(file_name) {
            return Err(anyhow!("disk full"));
        }
        let mut body = String::new();
        let n = content.read_to_string(&mut body).await?;
        self.writes
            .lock()
            .push((dest_dir.to_string(), file_name.to_string(), body));
        Ok(n as u64)
    }
}
