//! Command-line interface.

use std::fmt::Write as _;
use std::path::PathBuf;

use base_server_core::ServerPorts;
use clap::{Args, Parser, Subcommand};

/// Configuration-driven API and dashboard server.
#[derive(Debug, Parser)]
#[command(name = "base-server", version)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, default_value = "config.json")]
    pub config: PathBuf,

    /// Subcommand; `serve` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

/// Top-level subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start the API and dashboard servers.
    Serve,
    /// Print the ports derived from the configuration.
    Ports(PortsArgs),
    /// Run the self test against running servers and print the report.
    Bist,
}

/// Output selection for `ports`. At most one flag may be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Args)]
#[group(multiple = false)]
pub struct PortsArgs {
    /// Print only the dashboard port.
    #[arg(long)]
    pub dashboard: bool,
    /// Print only the API port.
    #[arg(long)]
    pub api: bool,
    /// Print all ports as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Render `ports` the way `args` asks for.
///
/// # Errors
///
/// Returns an error if JSON encoding fails.
pub fn render_ports(ports: &ServerPorts, args: PortsArgs) -> Result<String, serde_json::Error> {
    if args.dashboard {
        return Ok(ports.dashboard_port.to_string());
    }
    if args.api {
        return Ok(ports.api_port.to_string());
    }
    if args.json {
        return serde_json::to_string_pretty(ports);
    }
    Ok(ports_summary(ports))
}

const RULE: &str = "════════════════════════════════════════════════════════";

fn ports_summary(ports: &ServerPorts) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "╔{RULE}╗");
    let _ = writeln!(out, "║{:^56}║", "Server Ports");
    let _ = writeln!(out, "╚{RULE}╝");
    let _ = writeln!(out);
    let _ = writeln!(out, "Root Port:        {}", ports.root_port);
    let _ = writeln!(out, "Dashboard Offset: {}", ports.dashboard_offset);
    let _ = writeln!(out, "API Offset:       {}", ports.api_offset);
    let _ = writeln!(out);
    let _ = writeln!(out, "Dashboard Port:   {}", ports.dashboard_port);
    let _ = writeln!(out, "API Port:         {}", ports.api_port);
    let _ = writeln!(out);
    let _ = writeln!(out, "╔{RULE}╗");
    let _ = writeln!(out, "Dashboard:  http://localhost:{}/ui/", ports.dashboard_port);
    let _ = writeln!(out, "API:        http://localhost:{}/api/", ports.api_port);
    let _ = write!(out, "╚{RULE}╝");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Option<Cli> {
        Cli::try_parse_from(args).ok()
    }

    fn ports() -> ServerPorts {
        ServerPorts {
            root_port: 9000,
            dashboard_port: 9000,
            api_port: 9001,
            dashboard_offset: 0,
            api_offset: 1,
        }
    }

    #[test]
    fn serve_is_the_default() {
        let cli = parse(&["base-server"]);
        assert_eq!(cli.as_ref().map(Cli::command), Some(Command::Serve));
        assert_eq!(cli.map(|c| c.config), Some(PathBuf::from("config.json")));
    }

    #[test]
    fn config_flag_after_subcommand() {
        let cli = parse(&["base-server", "bist", "--config", "other.json"]);
        assert_eq!(cli.as_ref().map(Cli::command), Some(Command::Bist));
        assert_eq!(cli.map(|c| c.config), Some(PathBuf::from("other.json")));
    }

    #[test]
    fn ports_flags_are_exclusive() {
        let cli = parse(&["base-server", "ports", "--api"]);
        let expected = PortsArgs {
            dashboard: false,
            api: true,
            json: false,
        };
        assert_eq!(cli.map(|c| c.command()), Some(Command::Ports(expected)));
        assert!(parse(&["base-server", "ports", "--api", "--json"]).is_none());
    }

    #[test]
    fn single_port_output() {
        let dashboard = PortsArgs {
            dashboard: true,
            api: false,
            json: false,
        };
        assert_eq!(render_ports(&ports(), dashboard).ok().as_deref(), Some("9000"));
        let api = PortsArgs {
            dashboard: false,
            api: true,
            json: false,
        };
        assert_eq!(render_ports(&ports(), api).ok().as_deref(), Some("9001"));
    }

    #[test]
    fn json_output() {
        let args = PortsArgs {
            dashboard: false,
            api: false,
            json: true,
        };
        let text = render_ports(&ports(), args).unwrap_or_default();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap_or_default();
        assert_eq!(value["api_port"], 9001);
        assert_eq!(value["dashboard_offset"], 0);
    }

    #[test]
    fn summary_lists_urls() {
        let text = ports_summary(&ports());
        assert!(text.contains("Root Port:        9000"));
        assert!(text.contains("http://localhost:9000/ui/"));
        assert!(text.contains("http://localhost:9001/api/"));
    }
}
