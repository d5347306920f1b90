//! Built-in self test (BIST) for the base server.
//!
//! The self test is an HTTP smoke test run against live servers. It calls
//! every served API route (configured and built-in), fetches each dashboard page
//! and checks it for the markup it must contain, and sends a `HEAD` to
//! every enabled external dependency. The outcome is a [`BistReport`],
//! which is persisted as `bist_results.json` in the results directory.
//!
//! # Modules
//!
//! - [`error`] -- [`BistError`].
//! - [`pages`] -- Dashboard pages under test and the markup check.
//! - [`report`] -- The report model and its persistence.
//! - [`runner`] -- [`BistRunner`], which sends the requests.

pub mod error;
pub mod pages;
pub mod report;
pub mod runner;

pub use error::BistError;
pub use pages::{DASHBOARD_PAGES, DashboardPage, PageCheck, check_page};
pub use report::{
    BistReport, BistSummary, DependencyResult, EndpointResult, PageResult, REPORT_FILE_NAME,
    load_report, save_report,
};
pub use runner::{BistRunner, BistTargets, run_bist};
