//! Self-test execution.
//!
//! Requests run one after another with a per-request timeout and no retry.
//! A request that gets no response is recorded with status 0 and the
//! transport error; it never aborts the run.
//!
//! Configured routes are planned with the same resolution rules the API
//! server applies, so a route the server refuses to serve is not tested.

use std::time::Duration;

use base_server_core::routes::BUILTIN_API_ROUTES;
use base_server_core::{AppConfig, FunctionRegistry, resolve_routes};
use chrono::Utc;
use reqwest::{Client, Method};
use tracing::{debug, info, warn};

use crate::error::BistError;
use crate::pages::{DASHBOARD_PAGES, DashboardPage, check_page};
use crate::report::{BistReport, DependencyResult, EndpointResult, PageResult, save_report};

/// Where the servers under test listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BistTargets {
    /// Host name or address to connect to.
    pub host: String,
    /// API server port.
    pub api_port: u16,
    /// Dashboard server port.
    pub dashboard_port: u16,
}

impl BistTargets {
    /// Targets derived from the configuration. A wildcard bind address is
    /// reached over loopback.
    pub fn from_config(config: &AppConfig) -> Self {
        let host = match config.run_details.host.as_str() {
            "0.0.0.0" | "::" | "" => "127.0.0.1".to_owned(),
            other => other.to_owned(),
        };
        Self {
            host,
            api_port: config.api_port(),
            dashboard_port: config.dashboard_port(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("http://{}:{}{path}", self.host, self.api_port)
    }

    fn dashboard_url(&self, path: &str) -> String {
        format!("http://{}:{}{path}", self.host, self.dashboard_port)
    }
}

/// One API route to request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedEndpoint {
    route: String,
    method: String,
}

/// One external dependency to check.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlannedDependency {
    name: String,
    url: Option<String>,
}

/// Runs the self test against a fixed set of targets.
#[derive(Debug, Clone)]
pub struct BistRunner {
    client: Client,
    targets: BistTargets,
    endpoints: Vec<PlannedEndpoint>,
    dependencies: Vec<PlannedDependency>,
}

impl BistRunner {
    /// Build a runner for the servers described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`BistError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, BistError> {
        Self::with_targets(config, BistTargets::from_config(config))
    }

    /// Build a runner for `config`'s routes against explicit targets.
    ///
    /// # Errors
    ///
    /// Returns [`BistError::Client`] if the HTTP client cannot be built.
    pub fn with_targets(config: &AppConfig, targets: BistTargets) -> Result<Self, BistError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.bist.request_timeout_ms))
            .build()
            .map_err(|e| BistError::Client(e.to_string()))?;

        let plan = resolve_routes(config, &FunctionRegistry::builtin());
        for (name, reason) in &plan.rejected {
            debug!(route = %name, reason = %reason, "route is not served, leaving it out");
        }
        let configured = plan.accepted.into_iter().map(|route| PlannedEndpoint {
            route: route.path,
            method: route.method.as_str().to_owned(),
        });
        let builtin = BUILTIN_API_ROUTES.iter().map(|route| PlannedEndpoint {
            route: route.path.to_owned(),
            method: route.method().as_str().to_owned(),
        });

        let dependencies = config
            .external_dependencies
            .iter()
            .filter(|(_, dep)| dep.enabled)
            .map(|(name, dep)| PlannedDependency {
                name: name.clone(),
                url: dep.url.clone(),
            })
            .collect();

        Ok(Self {
            client,
            targets,
            endpoints: configured.chain(builtin).collect(),
            dependencies,
        })
    }

    /// The servers this runner sends requests to.
    pub const fn targets(&self) -> &BistTargets {
        &self.targets
    }

    /// Run every check and assemble the report.
    pub async fn run(&self) -> BistReport {
        let started = Utc::now();
        info!(
            api_port = self.targets.api_port,
            dashboard_port = self.targets.dashboard_port,
            endpoints = self.endpoints.len(),
            "BIST run starting"
        );

        let mut endpoints = Vec::with_capacity(self.endpoints.len());
        for endpoint in &self.endpoints {
            endpoints.push(self.request_endpoint(endpoint).await);
        }

        let mut pages = Vec::with_capacity(DASHBOARD_PAGES.len());
        for page in DASHBOARD_PAGES {
            pages.push(self.fetch_page(page).await);
        }

        let mut dependencies = Vec::with_capacity(self.dependencies.len());
        for dependency in &self.dependencies {
            dependencies.push(self.head_dependency(dependency).await);
        }

        let report = BistReport::new(started, endpoints, pages, dependencies);
        info!(
            total = report.summary.total,
            passed = report.summary.passed,
            failed = report.summary.failed,
            "BIST run complete"
        );
        report
    }

    async fn request_endpoint(&self, endpoint: &PlannedEndpoint) -> EndpointResult {
        let method = Method::from_bytes(endpoint.method.as_bytes()).unwrap_or(Method::GET);
        let url = self.targets.api_url(&endpoint.route);
        match self.client.request(method, &url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(route = %endpoint.route, status = status.as_u16(), "endpoint responded");
                EndpointResult {
                    route: endpoint.route.clone(),
                    method: endpoint.method.clone(),
                    status: status.as_u16(),
                    success: status.is_success(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(route = %endpoint.route, error = %e, "endpoint request failed");
                EndpointResult {
                    route: endpoint.route.clone(),
                    method: endpoint.method.clone(),
                    status: 0,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn fetch_page(&self, page: &DashboardPage) -> PageResult {
        let url = self.targets.dashboard_url(page.path);
        let fetched = match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                response.text().await.map(|body| (status, body))
            }
            Err(e) => Err(e),
        };

        match fetched {
            Ok((status, body)) => {
                let check = check_page(&body, page.required_elements);
                if !check.missing_elements.is_empty() {
                    warn!(page = page.name, missing = ?check.missing_elements, "dashboard page incomplete");
                }
                PageResult {
                    page: page.name.to_owned(),
                    url,
                    status: status.as_u16(),
                    success: status.is_success() && check.passed(),
                    html_valid: check.html_valid,
                    missing_elements: check.missing_elements,
                    error: None,
                }
            }
            Err(e) => {
                warn!(page = page.name, error = %e, "dashboard page request failed");
                PageResult {
                    page: page.name.to_owned(),
                    url,
                    status: 0,
                    success: false,
                    html_valid: false,
                    missing_elements: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn head_dependency(&self, dependency: &PlannedDependency) -> DependencyResult {
        let Some(url) = dependency.url.clone() else {
            return DependencyResult {
                dependency: dependency.name.clone(),
                url: None,
                status: 0,
                success: false,
                error: Some("no url configured".to_owned()),
            };
        };

        match self.client.head(&url).send().await {
            Ok(response) => {
                let status = response.status();
                DependencyResult {
                    dependency: dependency.name.clone(),
                    url: Some(url),
                    status: status.as_u16(),
                    success: status.is_success(),
                    error: None,
                }
            }
            Err(e) => {
                warn!(dependency = %dependency.name, error = %e, "dependency request failed");
                DependencyResult {
                    dependency: dependency.name.clone(),
                    url: Some(url),
                    status: 0,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

/// Run the self test for `config` and save the report to its results
/// directory.
///
/// # Errors
///
/// Returns [`BistError`] if the client cannot be built or the report
/// cannot be saved. Failed checks are not errors.
pub async fn run_bist(config: &AppConfig) -> Result<BistReport, BistError> {
    let report = BistRunner::new(config)?.run().await;
    let path = save_report(&report, &config.storage.results_dir)?;
    info!(path = %path.display(), "BIST report saved");
    Ok(report)
}
