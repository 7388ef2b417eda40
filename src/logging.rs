use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "SIGE_LOG";

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "sige_grades=debug"
    } else {
        "sige_grades=info"
    }
}

/// Installs the stderr subscriber. `SIGE_LOG` wins over `RUST_LOG`.
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_raises_crate_level() {
        assert_eq!(default_directive(false), "sige_grades=info");
        assert_eq!(default_directive(true), "sige_grades=debug");
    }
}
