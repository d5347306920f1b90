//! Dashboard pages under test.

/// A dashboard page and the markup it must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardPage {
    /// Name shown in the report.
    pub name: &'static str,
    /// Path on the dashboard server.
    pub path: &'static str,
    /// Substrings the body must contain, compared case-insensitively.
    pub required_elements: &'static [&'static str],
}

/// Every page the self test fetches.
pub const DASHBOARD_PAGES: &[DashboardPage] = &[
    DashboardPage {
        name: "Main Dashboard",
        path: "/ui/",
        required_elements: &["<html", "<head", "<title", "<body", "Dashboard", "stat-card"],
    },
    DashboardPage {
        name: "Events",
        path: "/ui/events",
        required_elements: &[
            "<html",
            "<head",
            "<title",
            "<body",
            "Recent Server Events",
            "events-container",
        ],
    },
    DashboardPage {
        name: "API Documentation",
        path: "/ui/api-docs",
        required_elements: &[
            "<html",
            "<head",
            "<title",
            "<body",
            "API Documentation",
            "docsContainer",
            "sourceContainer",
        ],
    },
    DashboardPage {
        name: "BIST Tests",
        path: "/ui/bist",
        required_elements: &["<html", "<head", "<title", "<body", "BIST Tests", "runAllBtn", "bist-tabs"],
    },
];

/// Outcome of checking a page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCheck {
    /// Whether the body contains `<html`.
    pub html_valid: bool,
    /// Required elements not found, in declaration order.
    pub missing_elements: Vec<String>,
}

impl PageCheck {
    /// Whether the page is valid HTML with nothing missing.
    pub fn passed(&self) -> bool {
        self.html_valid && self.missing_elements.is_empty()
    }
}

/// Check `body` for `<html` and every required element.
pub fn check_page(body: &str, required: &[&str]) -> PageCheck {
    let lower = body.to_lowercase();
    PageCheck {
        html_valid: lower.contains("<html"),
        missing_elements: required
            .iter()
            .filter(|element| !lower.contains(&element.to_lowercase()))
            .map(|element| (*element).to_owned())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_match_case_insensitively() {
        let body = "<HTML><head><title>x</title></head><BODY>dashboard <div class=\"STAT-CARD\"></div></BODY></HTML>";
        let check = check_page(body, DASHBOARD_PAGES.first().map_or(&[], |p| p.required_elements));
        assert!(check.html_valid);
        assert!(check.missing_elements.is_empty());
        assert!(check.passed());
    }

    #[test]
    fn missing_markers_are_reported_in_order() {
        let check = check_page("<html><body>Events</body></html>", &["<head", "<title", "<body"]);
        assert!(check.html_valid);
        assert_eq!(check.missing_elements, ["<head", "<title"]);
        assert!(!check.passed());
    }

    #[test]
    fn plain_text_is_not_html() {
        let check = check_page("{\"success\": true}", &[]);
        assert!(!check.html_valid);
        assert!(!check.passed());
    }
}
