//! Render + install round trip through the public API.

use freshrss_site::{SiteContext, SiteLayout, SiteRenderer, WriteResult};
use tempfile::TempDir;

#[test]
fn rendered_site_is_installed_once_per_change() {
    let nginx = TempDir::new().expect("nginx dir");
    let renderer = SiteRenderer::new(None).expect("renderer");
    let layout = SiteLayout::under(nginx.path());

    let ctx = SiteContext::new("rss.example.com", 80).with_document_root("/srv/fresh-rss/p");
    let first = renderer.render("fresh-rss.conf", &ctx).expect("render");
    assert!(first.contains("root /srv/fresh-rss/p;"));

    assert!(layout.install("fresh-rss", &first).expect("install").changed());
    assert!(matches!(
        layout.install("fresh-rss", &first).expect("reinstall"),
        WriteResult::Unchanged { .. }
    ));

    let moved = SiteContext::new("rss.example.com", 8443).with_document_root("/srv/fresh-rss/p");
    let second = renderer.render("fresh-rss.conf", &moved).expect("render");
    assert!(layout.install("fresh-rss", &second).expect("install").changed());

    let on_disk =
        std::fs::read_to_string(layout.available_path("fresh-rss")).expect("read installed site");
    assert!(on_disk.contains("listen 8443;"));
    assert!(!on_disk.contains("listen 80;"));
}
