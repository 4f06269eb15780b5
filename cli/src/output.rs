use anyhow::Context;
use anyhow::Result;
use defscope_core::DefscopeError;
use defscope_core::Payload;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use tracing::warn;

/// Where a payload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written {
    Primary(PathBuf),
    /// The primary location was not writable
    Fallback(PathBuf),
}

impl Written {
    pub fn path(&self) -> &Path {
        match self {
            Written::Primary(path) | Written::Fallback(path) => path,
        }
    }
}

/// The user's documents directory, or the home directory when the platform
/// has none.
pub fn fallback_dir() -> Option<PathBuf> {
    dirs::document_dir().or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
}

fn is_permission_denied(err: &DefscopeError) -> bool {
    matches!(err, DefscopeError::Io(io) if io.kind() == ErrorKind::PermissionDenied)
}

/// Save `payload` at `primary`. On a permission error retry once inside
/// `fallback` under the same file name.
pub fn write_payload(payload: &Payload, primary: &Path, fallback: Option<&Path>) -> Result<Written> {
    let err = match payload.save(primary) {
        Ok(()) => return Ok(Written::Primary(primary.to_path_buf())),
        Err(err) => err,
    };
    let fallback = match fallback {
        Some(dir) if is_permission_denied(&err) => dir,
        _ => {
            return Err(err)
                .with_context(|| format!("Could not write output {}", primary.display()));
        }
    };

    let file_name = primary
        .file_name()
        .with_context(|| format!("Output path {} has no file name", primary.display()))?;
    let target = fallback.join(file_name);
    warn!(
        "cannot write {} ({err}), falling back to {}",
        primary.display(),
        target.display()
    );
    payload
        .save(&target)
        .with_context(|| format!("Could not write output {}", target.display()))?;
    Ok(Written::Fallback(target))
}
