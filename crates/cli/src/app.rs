use crate::cli::Cli;
use crate::config::SignerConfig;
use crate::error::SignError;
use crate::request::SigningRequest;
use chrono::Utc;
use clap::Parser;
use console::style;
use pdf_p12_sign_core::SigningEngine;
use std::ffi::OsString;

/// Run one signing invocation and return the process exit code.
pub fn run<I, T, E>(args: I, env: impl Fn(&str) -> Option<OsString>, engine: &E) -> u8
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    E: SigningEngine,
{
    match try_run(args, env, engine) {
        Ok(()) => 0,
        Err(e) => {
            let code = e.exit_code();
            report(e);
            code
        }
    }
}

fn try_run<I, T, E>(
    args: I,
    env: impl Fn(&str) -> Option<OsString>,
    engine: &E,
) -> Result<(), SignError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    E: SigningEngine,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return Ok(());
        }
        Err(e) => return Err(SignError::Usage(e)),
    };

    let config = SignerConfig::from_lookup(env)?;
    let request = SigningRequest::new(cli, config, Utc::now());
    crate::sign::sign_pdf(&request, engine)
}

fn report(err: SignError) {
    if let SignError::Usage(usage) = &err {
        let _ = usage.print();
        return;
    }

    let hints = err.hints();
    let e = anyhow::Error::from(err);
    eprintln!("\n{} {}", style("[ERROR]").red().bold(), style(&e).red());

    for (i, cause) in e.chain().skip(1).enumerate() {
        if i == 0 {
            eprintln!("\n    Caused by:");
        }
        eprintln!("      - {}", style(cause).red());
    }
    for hint in &hints {
        eprintln!("\n    {} {}", style("Hint:").yellow().bold(), hint);
    }
    eprintln!();
}
