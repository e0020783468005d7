//! Template context for the site configuration.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

pub const DEFAULT_DOCUMENT_ROOT: &str = "/var/www/fresh-rss/p";
pub const DEFAULT_PHP_FPM_SOCKET: &str = "/run/php/php7.2-fpm.sock";

/// Values substituted into a site template.
///
/// `fqdn` and `port` come from the operator's configuration; the document
/// root and FPM socket describe where this host keeps the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContext {
    pub fqdn: String,
    pub port: u16,
    pub document_root: String,
    pub php_fpm_socket: String,
}

impl SiteContext {
    /// Context with the stock document root and PHP-FPM socket.
    pub fn new(fqdn: impl Into<String>, port: u16) -> Self {
        Self {
            fqdn: fqdn.into(),
            port,
            document_root: DEFAULT_DOCUMENT_ROOT.to_string(),
            php_fpm_socket: DEFAULT_PHP_FPM_SOCKET.to_string(),
        }
    }

    pub fn with_document_root(mut self, root: impl Into<String>) -> Self {
        self.document_root = root.into();
        self
    }

    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tera_context_exposes_every_field() {
        let ctx = SiteContext::new("rss.example.com", 8080).to_tera_context().unwrap();
        let json = ctx.into_json();
        assert_eq!(json["fqdn"], "rss.example.com");
        assert_eq!(json["port"], 8080);
        assert_eq!(json["document_root"], DEFAULT_DOCUMENT_ROOT);
        assert_eq!(json["php_fpm_socket"], DEFAULT_PHP_FPM_SOCKET);
    }
}
