mod config;
mod error;
mod ipc;
mod logging;
mod report;
mod rubric;
mod server;
mod session;
mod store;

use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::net::TcpListener;

fn main() -> anyhow::Result<()> {
    let cli = config::Cli::parse();
    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("assessd: logging disabled: {e}");
    }

    let settings = config::Settings::resolve(&cli)?;
    let mut state = ipc::AppState::new(settings);

    let check = state.store.self_check();
    if check.readable {
        tracing::info!(
            path = %check.path,
            rows = check.row_count,
            id_column = check.id_column.as_deref().unwrap_or("-"),
            "record store ready"
        );
    } else {
        tracing::warn!(
            path = %check.path,
            error = check.error.as_deref().unwrap_or("unreadable"),
            "record store not usable yet"
        );
    }

    let listener = TcpListener::bind(("127.0.0.1", state.settings.port))
        .with_context(|| format!("failed to bind 127.0.0.1:{}", state.settings.port))?;
    let addr = listener.local_addr()?;

    let mut stdout = std::io::stdout();
    writeln!(stdout, "assessd listening on {addr}")?;
    stdout.flush()?;
    tracing::info!(%addr, session_id = %state.session_id, "listening");

    server::serve(listener, &mut state)
}
