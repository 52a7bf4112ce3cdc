pub mod command;
mod docker;
mod executor;
mod writer;

pub use command::{CommandDescriptor, MakeCommand};
pub use docker::DockerExecutor;
pub use executor::{CapturedOutput, CommandOutput, Executor, Invoker, OutputStream, drain};
pub use writer::InstanceFileWriter;
