//! Tera rendering engine for site templates.
//!
//! Templates are addressed by their site-facing name (`fresh-rss.conf`).
//! The embedded defaults can be overridden by dropping `<name>.tera` files
//! into an operator-supplied directory.

use std::collections::BTreeMap;
use std::path::Path;

use tera::Tera;

use crate::context::SiteContext;
use crate::error::{io_err, RenderError};

// ---------------------------------------------------------------------------
// Embedded templates, baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[(
    "fresh-rss.conf",
    include_str!("templates/fresh-rss.conf.tera"),
)];

/// `<name>.tera` files directly inside `dir`, keyed by lowercased `<name>`.
/// Subdirectories and other files are ignored; a missing dir has none.
fn load_overrides(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut overrides = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(".tera"))
        else {
            continue;
        };
        if !path.is_file() {
            continue;
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        tracing::debug!(template = %name, path = %path.display(), "loaded template override");
        overrides.push((name.to_lowercase(), contents));
    }
    Ok(overrides)
}

fn build_tera(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: BTreeMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| ((*name).to_string(), (*content).to_string()))
        .collect();
    if let Some(dir) = override_dir {
        templates.extend(load_overrides(dir)?);
    }

    let mut tera = Tera::default();
    // Site configs are not HTML.
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(templates)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// SiteRenderer
// ---------------------------------------------------------------------------

/// Renders site configuration templates. Create once and reuse.
pub struct SiteRenderer {
    tera: Tera,
}

impl SiteRenderer {
    /// Load embedded templates plus any `.tera` overrides in `override_dir`.
    pub fn new(override_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Self {
            tera: build_tera(override_dir)?,
        })
    }

    /// Render `template` with `ctx`. Output always uses LF line endings.
    pub fn render(&self, template: &str, ctx: &SiteContext) -> Result<String, RenderError> {
        let name = template.to_lowercase();
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(RenderError::UnknownTemplate(template.to_string()));
        }
        let content = self.tera.render(&name, &ctx.to_tera_context()?)?;
        Ok(content.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn renderer_new_succeeds() {
        SiteRenderer::new(None).expect("embedded templates should load");
    }

    #[test]
    fn embedded_site_renders_domain_and_port() {
        let renderer = SiteRenderer::new(None).unwrap();
        let out = renderer
            .render("fresh-rss.conf", &SiteContext::new("rss.example.com", 8080))
            .unwrap();
        assert!(out.contains("listen 8080;"), "{out}");
        assert!(out.contains("server_name rss.example.com;"), "{out}");
        assert!(out.contains("fastcgi_pass unix:/run/php/php7.2-fpm.sock;"), "{out}");
        assert!(out.contains("$fastcgi_script_name"), "nginx variables must survive rendering");
    }

    #[test]
    fn unknown_template_is_an_error() {
        let renderer = SiteRenderer::new(None).unwrap();
        let err = renderer
            .render("apache.conf", &SiteContext::new("h", 80))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(_)), "got: {err}");
    }

    #[test]
    fn user_override_replaces_embedded_template() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("fresh-rss.conf.tera"),
            "server { listen {{ port }}; server_name {{ fqdn }}; }\r\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let renderer = SiteRenderer::new(Some(dir.path())).unwrap();
        let out = renderer
            .render("fresh-rss.conf", &SiteContext::new("a.b", 81))
            .unwrap();
        assert_eq!(out, "server { listen 81; server_name a.b; }\n");
    }

    #[test]
    fn overrides_are_flat_and_case_insensitive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Fresh-RSS.conf.tera"), "port {{ port }}").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/extra.conf.tera"), "nested").unwrap();

        let renderer = SiteRenderer::new(Some(dir.path())).unwrap();

        let out = renderer
            .render("fresh-rss.conf", &SiteContext::new("h", 9000))
            .unwrap();
        assert_eq!(out, "port 9000");
        let err = renderer
            .render("extra.conf", &SiteContext::new("h", 80))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(_)), "got: {err}");
    }

    #[test]
    fn missing_override_dir_uses_embedded_templates() {
        let dir = TempDir::new().unwrap();
        let renderer = SiteRenderer::new(Some(&dir.path().join("absent"))).unwrap();
        assert!(renderer
            .render("fresh-rss.conf", &SiteContext::new("h", 80))
            .is_ok());
    }
}
