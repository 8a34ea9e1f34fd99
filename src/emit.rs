// Fixed-schema CSV emission. Output is written to a temporary file next to
// the target and renamed into place once complete.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{PipelineError, Result};

/// A row type with a fixed column order.
pub trait CsvRow {
    const HEADER: &'static [&'static str];

    /// One value per `HEADER` column, same order.
    fn fields(&self) -> Vec<String>;
}

/// Quotes a value containing a comma, quote or line break.
pub fn escape_field(value: &str) -> std::borrow::Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\"")).into()
    } else {
        value.into()
    }
}

fn push_line<S: AsRef<str>>(out: &mut String, values: &[S]) {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(v.as_ref()));
    }
    out.push('\n');
}

/// Header plus one line per row.
pub fn render<R: CsvRow>(rows: &[R]) -> String {
    let mut out = String::new();
    push_line(&mut out, R::HEADER);
    for row in rows {
        push_line(&mut out, &row.fields());
    }
    out
}

/// Replaces `path` with `contents` in one rename; the parent directory is created if needed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| PipelineError::io(parent, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| PipelineError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| PipelineError::io(path, e.error))?;
    Ok(())
}

/// Replaces the directory `dir` with a fresh tree holding `files`, given as
/// paths relative to `dir`. The tree is staged beside `dir` and swapped in by
/// rename; a failure while staging leaves the existing directory untouched.
pub fn replace_dir(dir: &Path, files: &[(&str, String)]) -> Result<()> {
    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;

    let staging = tempfile::TempDir::new_in(parent).map_err(|e| PipelineError::io(parent, e))?;
    let staged = staging.path().join("new");
    for (relative, contents) in files {
        let path = staged.join(relative);
        if let Some(p) = path.parent() {
            std::fs::create_dir_all(p).map_err(|e| PipelineError::io(p, e))?;
        }
        std::fs::write(&path, contents).map_err(|e| PipelineError::io(&path, e))?;
    }

    let previous = staging.path().join("old");
    let had_previous = dir.exists();
    if had_previous {
        std::fs::rename(dir, &previous).map_err(|e| PipelineError::io(dir, e))?;
    }
    if let Err(e) = std::fs::rename(&staged, dir) {
        if had_previous && let Err(restore) = std::fs::rename(&previous, dir) {
            tracing::error!(
                path = %dir.display(),
                error = %restore,
                "could not restore previous directory"
            );
        }
        return Err(PipelineError::io(dir, e));
    }
    tracing::debug!(path = %dir.display(), files = files.len(), "directory replaced");
    Ok(())
}

/// Writes `rows` under the row type's header. Returns the number of data rows.
pub fn write_csv<R: CsvRow>(path: &Path, rows: &[R]) -> Result<usize> {
    write_atomic(path, &render(rows))?;
    tracing::debug!(path = %path.display(), rows = rows.len(), "csv written");
    Ok(rows.len())
}
