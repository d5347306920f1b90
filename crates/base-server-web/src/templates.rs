//! Dashboard page rendering via `minijinja`.
//!
//! Templates are compiled into the binary and registered once at startup.
//! Names end in `.html`, so output is auto-escaped.

use minijinja::Environment;
use serde::Serialize;

use crate::error::WebError;

/// Page templates, as `(name, source)`.
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("main.html", include_str!("../templates/main.html")),
    ("events.html", include_str!("../templates/events.html")),
    ("api_docs.html", include_str!("../templates/api_docs.html")),
    ("bist.html", include_str!("../templates/bist.html")),
    ("docs.html", include_str!("../templates/docs.html")),
];

/// A dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    /// `/ui/`
    Main,
    /// `/ui/events`
    Events,
    /// `/ui/api-docs`
    ApiDocs,
    /// `/ui/bist`
    Bist,
    /// `/ui/docs`
    Docs,
}

impl Page {
    const fn template(self) -> &'static str {
        match self {
            Self::Main => "main.html",
            Self::Events => "events.html",
            Self::ApiDocs => "api_docs.html",
            Self::Bist => "bist.html",
            Self::Docs => "docs.html",
        }
    }

    /// Window title.
    pub const fn title(self) -> &'static str {
        match self {
            Self::Main => "Dashboard",
            Self::Events => "Events",
            Self::ApiDocs => "API Documentation",
            Self::Bist => "BIST Tests",
            Self::Docs => "Documentation",
        }
    }

    /// Navigation key of the page, used to highlight the active link.
    pub const fn nav_key(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Events => "events",
            Self::ApiDocs => "api-docs",
            Self::Bist => "bist",
            Self::Docs => "docs",
        }
    }
}

/// Holds the compiled page templates.
#[derive(Debug)]
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    /// Compile every page template.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if a template fails to parse.
    pub fn new() -> Result<Self, WebError> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    /// Render `page` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::Template`] if rendering fails.
    pub fn render(&self, page: Page, context: impl Serialize) -> Result<String, WebError> {
        Ok(self.env.get_template(page.template())?.render(context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_compiles_and_renders() {
        let renderer = PageRenderer::new();
        assert!(renderer.is_ok(), "{:?}", renderer.as_ref().err());
        let Ok(renderer) = renderer else { return };
        let context = serde_json::json!({
            "title": "T",
            "active": "main",
            "api_port": 8001,
            "dashboard_port": 8000,
            "event_count": 0,
            "stats": {"failed_appends": 0, "skipped_units": 0},
            "routes": [{"method": "GET", "route": "/api/health", "function": "health_check"}],
        });
        for page in [Page::Main, Page::Events, Page::ApiDocs, Page::Bist, Page::Docs] {
            let html = renderer.render(page, &context).unwrap_or_default();
            assert!(html.contains("<html"), "{page:?} did not render");
        }
    }

    #[test]
    fn output_is_escaped() {
        let renderer = PageRenderer::new();
        assert!(renderer.is_ok(), "{:?}", renderer.as_ref().err());
        let Ok(renderer) = renderer else { return };
        let context = serde_json::json!({
            "title": "T",
            "active": "main",
            "api_port": 8001,
            "dashboard_port": 8000,
            "event_count": 0,
            "stats": {"failed_appends": 0, "skipped_units": 0},
            "routes": [{"method": "GET", "route": "<script>alert(1)</script>", "function": "f"}],
        });
        let html = renderer.render(Page::Main, &context).unwrap_or_default();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
