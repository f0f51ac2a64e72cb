use dotenvy::dotenv;
use tracing::{error, info};

fn main() -> std::process::ExitCode {
    dotenv().ok();
    common::utils::logging::init_logging_from_env();

    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "stratfy", event = "panic", pid, message = %info, "unhandled panic");
    }));

    let worker_threads = match configs::AppConfig::load_or_env() {
        Ok(cfg) => cfg.server.worker_threads,
        Err(_) => std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()),
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "stratfy", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(service = "stratfy", event = "start", pid, version, threads = worker_threads.unwrap_or_default(), "starting");

    rt.block_on(async move {
        tokio::select! {
            res = server::run() => match res {
                Ok(()) => {
                    info!(service = "stratfy", event = "stop", pid, "server stopped");
                    std::process::ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(service = "stratfy", event = "run_failed", error = %e, "server exited with error");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(service = "stratfy", event = "shutdown_signal", pid, "received Ctrl+C, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}
