use anyhow::Context;
use lithos_config::ContentionConfig;
use lithos_perf::run_kind;
use tracing_subscriber::EnvFilter;

/// Loads the config at `path`, or the defaults when no path is given.
fn load_config(path: Option<&str>) -> anyhow::Result<ContentionConfig> {
    match path {
        Some(path) => ContentionConfig::load(path)
            .with_context(|| format!("loading contention config from {path}")),
        None => Ok(ContentionConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1);
    let cfg = load_config(path.as_deref())?;

    // The log level comes from the config, so the subscriber goes in after it.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        config = path.as_deref().unwrap_or("<defaults>"),
        implementations = ?cfg.implementations,
        log_level = %cfg.log_level,
        "loaded contention config"
    );
    tracing::info!(
        readers = cfg.reader_count,
        writers = cfg.writer_count,
        iterations = cfg.iterations,
        runs = cfg.runs,
        "starting slot contention"
    );

    let mut failures = 0usize;
    for &kind in &cfg.implementations {
        println!("{} impl", kind.as_str());
        for run in 0..cfg.runs {
            let report = run_kind(kind, &cfg);
            print!("{report}");
            if let Err(e) = report.verify() {
                tracing::warn!(implementation = kind.as_str(), run, error = %e, "run failed verification");
                failures += 1;
            }
        }
    }

    anyhow::ensure!(failures == 0, "{failures} run(s) failed verification");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_argument_uses_defaults() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.reader_count, ContentionConfig::default().reader_count);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_config(Some("/nonexistent/slot.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/slot.toml"));
    }
}
