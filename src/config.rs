use clap::Parser;
use serde::Deserialize;

use crate::pipeline::Compiler;

#[derive(Parser)]
#[command(name = "grader", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> std::io::Result<Config> {
        let file = std::fs::File::open(&self.config_path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub sessions: Vec<SessionConfig>,
}

#[derive(Deserialize, Debug)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

/// Resource hosts that exam and test assets are fetched from
#[derive(Deserialize, Debug, Clone)]
pub struct EndpointConfig {
    /// Repository cloned before compiling a ROSE exam
    pub rose_exam: String,
    /// Repository cloned before compiling an LLVM exam
    pub llvm_exam: String,
    /// Directory tree that test assets are recursively fetched from
    pub tests: String,
}

impl EndpointConfig {
    pub fn exam_endpoint(&self, compiler: Compiler) -> &str {
        match compiler {
            Compiler::Rose => &self.rose_exam,
            Compiler::Llvm => &self.llvm_exam,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct DockerConfig {
    pub program: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct SessionConfig {
    pub id: String,
    pub instances: Vec<InstanceConfig>,
}

#[derive(Deserialize, Debug)]
pub struct InstanceConfig {
    pub name: String,
    pub container: String,
}
