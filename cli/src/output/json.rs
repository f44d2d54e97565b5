use std::io::Write;
use std::path::Path;
use anyhow::Result;
use pbi_docs::write_atomic;
use serde::Serialize;

pub fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}

/// Pretty JSON with a trailing newline, persisted atomically.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    write_json(&mut buf, value)?;
    write_atomic(path, &buf)?;
    Ok(())
}
