use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use grader::config::{CliArgs, Config};
use grader::pipeline::Grader;
use grader::sandbox::DockerExecutor;
use grader::session::MemorySessionStore;
use grader::web_server::build_server;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let cli = CliArgs::parse();
    let Config {
        server: server_config,
        endpoints,
        docker,
        sessions,
    } = cli
        .to_config()
        .with_context(|| format!("Failed to load configuration from {}", cli.config_path))?;

    let store = Arc::new(MemorySessionStore::from_config(&sessions));
    log::info!("Loaded {} session(s) from configuration", store.len());

    let docker = Arc::new(DockerExecutor::new(docker.program));
    let grader = Grader::new(store.clone(), store, docker.clone(), docker, endpoints);

    // ======= PREPARATION END, EXECUTION START =======

    let server = build_server(server_config, grader).context("Failed to build server")?;
    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            log::info!("Ctrl-c received, shutting down...");
        }
        res_server = server_task => {
            log::error!("Server terminated unexpectedly: {:?}", res_server);
        }
    }

    server_handle.stop(true).await;

    log::info!("Shutdown complete");
    Ok(())
}
