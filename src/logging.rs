use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr; stdout carries only the listen address.
pub fn init_tracing(
    verbose: bool,
    log_level: Option<&str>,
    log_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = match (verbose, log_level) {
        (_, Some(level)) => level,
        (true, None) => "assessd=debug",
        (false, None) => "assessd=info",
    };

    // ASSESSD_LOG takes precedence over the command line
    let filter = EnvFilter::try_from_env("ASSESSD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if level.contains('=') {
            level.to_string()
        } else {
            format!("assessd={}", level)
        })
    });

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }
    Ok(())
}
