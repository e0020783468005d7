//! nginx site configuration through freshrss-site.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use freshrss_reactor::{CollaboratorError, SiteConfigurator, SiteRequest};
use freshrss_site::{RenderError, SiteContext, SiteLayout, SiteRenderer};

use super::run_command;

pub struct NginxSite {
    renderer: SiteRenderer,
    layout: SiteLayout,
    reload: Option<String>,
}

impl NginxSite {
    /// `template_dir` holds optional `.tera` overrides of the built-in templates.
    pub fn new(nginx_dir: &Path, template_dir: Option<PathBuf>) -> Result<Self, RenderError> {
        Ok(Self {
            renderer: SiteRenderer::new(template_dir.as_deref())?,
            layout: SiteLayout::under(nginx_dir),
            reload: Some("nginx".to_string()),
        })
    }

    /// Skip the nginx reload after a changed site file.
    pub fn without_reload(mut self) -> Self {
        self.reload = None;
        self
    }

    fn reload(&self) -> Result<(), CollaboratorError> {
        let Some(program) = &self.reload else {
            return Ok(());
        };
        match run_command(program, &["-s", "reload"]) {
            Err(CollaboratorError::Spawn { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::warn!(program = %program, "nginx not found; site written but not reloaded");
                Ok(())
            }
            other => other,
        }
    }
}

fn render_err(e: RenderError) -> CollaboratorError {
    CollaboratorError::Other(e.to_string())
}

impl SiteConfigurator for NginxSite {
    fn configure_site(&mut self, site: &SiteRequest) -> Result<(), CollaboratorError> {
        let ctx = SiteContext::new(site.fqdn.clone(), site.port);
        let content = self
            .renderer
            .render(&site.template, &ctx)
            .map_err(render_err)?;
        let result = self.layout.install(&site.name, &content).map_err(render_err)?;
        if !result.changed() {
            tracing::info!(site = %site.name, "site configuration unchanged");
            return Ok(());
        }
        tracing::info!(site = %site.name, "site configuration written");
        self.reload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_and_enables_site() {
        let dir = TempDir::new().unwrap();
        let mut site = NginxSite::new(dir.path(), None).unwrap().without_reload();
        let request = SiteRequest {
            name: "fresh-rss".into(),
            template: "fresh-rss.conf".into(),
            fqdn: "rss.example.com".into(),
            port: 8080,
        };

        site.configure_site(&request).unwrap();

        let layout = SiteLayout::under(dir.path());
        let written = std::fs::read_to_string(layout.available_path("fresh-rss")).unwrap();
        assert!(written.contains("server_name rss.example.com;"), "{written}");
        assert!(layout.enabled_path("fresh-rss").exists());
    }

    #[test]
    fn unchanged_site_skips_reload() {
        let dir = TempDir::new().unwrap();
        let request = SiteRequest {
            name: "fresh-rss".into(),
            template: "fresh-rss.conf".into(),
            fqdn: "localhost".into(),
            port: 80,
        };
        let mut site = NginxSite::new(dir.path(), None).unwrap().without_reload();
        site.configure_site(&request).unwrap();

        // A reload now would fail the call.
        site.reload = Some("false".to_string());
        site.configure_site(&request).unwrap();

        let changed = SiteRequest { port: 8080, ..request };
        assert!(site.configure_site(&changed).is_err());
    }

    #[test]
    fn unknown_template_fails() {
        let dir = TempDir::new().unwrap();
        let mut site = NginxSite::new(dir.path(), None).unwrap().without_reload();
        let request = SiteRequest {
            name: "fresh-rss".into(),
            template: "missing.conf".into(),
            fqdn: "localhost".into(),
            port: 80,
        };

        assert!(site.configure_site(&request).is_err());
    }
}
