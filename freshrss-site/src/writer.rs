//! Hash-gated atomic site installation.
//!
//! A rendered site is written to `<nginx>/sites-available/<name>` only when
//! its SHA-256 digest differs from what is already on disk, then linked from
//! `<nginx>/sites-enabled/<name>`. Callers reload the proxy only on
//! [`WriteResult::Written`].

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, RenderError};

/// Outcome of installing one site file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// Content changed and was written.
    Written { path: PathBuf },
    /// On-disk content already matched; nothing written.
    Unchanged { path: PathBuf },
}

impl WriteResult {
    pub fn changed(&self) -> bool {
        matches!(self, WriteResult::Written { .. })
    }
}

/// The proxy's site directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteLayout {
    pub available_dir: PathBuf,
    pub enabled_dir: PathBuf,
}

impl SiteLayout {
    /// Debian-style layout rooted at `nginx_dir` (usually `/etc/nginx`).
    pub fn under(nginx_dir: &Path) -> Self {
        Self {
            available_dir: nginx_dir.join("sites-available"),
            enabled_dir: nginx_dir.join("sites-enabled"),
        }
    }

    pub fn available_path(&self, name: &str) -> PathBuf {
        self.available_dir.join(name)
    }

    pub fn enabled_path(&self, name: &str) -> PathBuf {
        self.enabled_dir.join(name)
    }

    /// Write `content` as site `name` and make sure it is enabled.
    pub fn install(&self, name: &str, content: &str) -> Result<WriteResult, RenderError> {
        let path = self.available_path(name);
        let result = atomic_write(&path, content)?;
        self.enable(name)?;
        Ok(result)
    }

    fn enable(&self, name: &str) -> Result<(), RenderError> {
        let target = self.available_path(name);
        let link = self.enabled_path(name);
        std::fs::create_dir_all(&self.enabled_dir).map_err(|e| io_err(&self.enabled_dir, e))?;
        if link.symlink_metadata().is_ok() {
            return Ok(());
        }
        link_site(&target, &link)?;
        tracing::info!(site = name, "enabled site");
        Ok(())
    }
}

fn digest(content: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(content);
    hex::encode(h.finalize())
}

fn atomic_write(path: &Path, content: &str) -> Result<WriteResult, RenderError> {
    let normalized = content.replace("\r\n", "\n");
    let wanted = digest(normalized.as_bytes());

    if let Ok(existing) = std::fs::read(path) {
        if digest(&existing) == wanted {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp = PathBuf::from(format!("{}.freshrss.tmp", path.display()));
    std::fs::write(&tmp, &normalized).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
fn link_site(target: &Path, link: &Path) -> Result<(), RenderError> {
    std::os::unix::fs::symlink(target, link).map_err(|e| io_err(link, e))
}

#[cfg(not(unix))]
fn link_site(target: &Path, link: &Path) -> Result<(), RenderError> {
    std::fs::copy(target, link)
        .map(|_| ())
        .map_err(|e| io_err(link, e))
}
