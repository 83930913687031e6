use pdf_p12_sign_cms::CmsEngine;
use std::process::ExitCode;

mod app;
mod cli;
mod config;
mod error;
mod request;
mod sign;
mod util;

fn main() -> ExitCode {
    // Setup tracing subscriber for CLI
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let engine = CmsEngine::new();
    let code = app::run(std::env::args_os(), |name| std::env::var_os(name), &engine);
    ExitCode::from(code)
}
