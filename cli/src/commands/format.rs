use std::io::{self, Read, Write};
use std::process::ExitCode;
use anyhow::{Context, Result};
use pbi_docs::{ExtractConfig, MeasureRenderer};

pub fn run(config: &ExtractConfig, expr: Option<String>) -> Result<ExitCode> {
    let raw = match expr {
        Some(expr) => expr,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read expression from stdin")?;
            buf
        }
    };

    let rendering = MeasureRenderer::new(&config.format, &config.complexity).render(&raw);
    if let Some(warning) = rendering.warning {
        return Err(anyhow::Error::new(warning).context("Expression could not be formatted"));
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", rendering.displayed(&raw))?;
    writeln!(
        handle,
        "-- complexity: {} (depth {}, {} complex call(s))",
        rendering.complexity, rendering.max_depth, rendering.complex_matches
    )?;

    Ok(ExitCode::from(0))
}
