//! # freshrss-site
//!
//! Tera-based rendering of the reverse-proxy site configuration for the
//! FreshRSS unit, plus a hash-gated writer that installs it into an nginx
//! `sites-available` / `sites-enabled` layout.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use freshrss_site::{SiteContext, SiteLayout, SiteRenderer};
//!
//! fn configure(ctx: &SiteContext) -> Result<(), freshrss_site::RenderError> {
//!     let renderer = SiteRenderer::new(None)?;
//!     let content = renderer.render("fresh-rss.conf", ctx)?;
//!     let layout = SiteLayout::under(Path::new("/etc/nginx"));
//!     layout.install("fresh-rss", &content)?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod writer;

pub use context::SiteContext;
pub use engine::SiteRenderer;
pub use error::RenderError;
pub use writer::{SiteLayout, WriteResult};
