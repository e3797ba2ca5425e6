use std::fs;
use std::io;
use std::path::Path;

/// Applies the "this copy is disposable" marker.
pub trait ReadOnlyMarker: Send + Sync {
    /// Must be idempotent and must not clear any other attribute.
    fn mark_read_only(&self, path: &Path) -> io::Result<()>;
}

/// Sets the read-only permission on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMarker;

impl ReadOnlyMarker for FsMarker {
    fn mark_read_only(&self, path: &Path) -> io::Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        if perms.readonly() {
            return Ok(());
        }
        perms.set_readonly(true);
        fs::set_permissions(path, perms)
    }
}

/// Logs what would be marked and leaves the file alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunMarker;

impl ReadOnlyMarker for DryRunMarker {
    fn mark_read_only(&self, path: &Path) -> io::Result<()> {
        tracing::info!(path = %path.display(), "dry run: would mark read-only");
        Ok(())
    }
}
