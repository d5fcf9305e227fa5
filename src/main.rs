//! Jenkins Dashboard Binary Entry Point
//!
//! Parses the command line, merges it over the optional YAML configuration,
//! logs in and runs the selected dashboard. Core functionality is provided by
//! the `jenkins_dashboard` library crate.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser};
use jenkins_dashboard::{
    client::JenkinsClient,
    collector::DetailTables,
    config::AppConfig,
    dashboard::{Dashboard, RunMode, Section, Selection},
    display::DisplayOptions,
    format::{Tone, format_error, paint, set_color_enabled},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Jenkins Dashboard - read-only monitoring in the console
#[derive(Parser, Debug)]
#[command(name = "jenkins-dashboard", version, about, long_about = None)]
struct Cli {
    /// Jenkins server URL (a bare host is treated as https)
    #[arg(env = "JENKINS_URL")]
    url: Option<String>,

    /// Jenkins username
    #[arg(env = "JENKINS_USER")]
    username: Option<String>,

    /// Jenkins password or API token
    #[arg(env = "JENKINS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to an optional YAML configuration file
    #[arg(short, long, env = "JENKINS_DASHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Skip TLS certificate verification
    #[arg(long)]
    no_ssl_verify: bool,

    /// Per-request timeout (e.g. "30s", "2m")
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Rows per table before truncating
    #[arg(long)]
    max_rows: Option<usize>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(flatten)]
    sections: SectionFlags,
}

/// Section selection. Without any flag the overview is shown.
#[derive(Args, Debug, Default)]
#[command(next_help_heading = "Sections")]
struct SectionFlags {
    /// Detailed instance information
    #[arg(long)]
    info: bool,
    /// System summary
    #[arg(long)]
    system: bool,
    /// Jobs summary, overview, types and recent builds
    #[arg(long)]
    jobs: bool,
    /// Failed jobs
    #[arg(long)]
    failed_jobs: bool,
    /// Build durations and frequencies
    #[arg(long)]
    build_stats: bool,
    /// Build artifacts
    #[arg(long)]
    artifacts: bool,
    /// Nodes summary and overview
    #[arg(long)]
    nodes: bool,
    /// Node labels and their usage in jobs
    #[arg(long)]
    labels: bool,
    /// Executor usage
    #[arg(long)]
    executors: bool,
    /// OS distribution
    #[arg(long)]
    os: bool,
    /// OS version summary
    #[arg(long)]
    os_summary: bool,
    /// Hardware information
    #[arg(long)]
    hardware: bool,
    /// OS, hardware and software tables per node
    #[arg(long)]
    node_details: bool,
    /// OS table per node
    #[arg(long)]
    node_os: bool,
    /// Hardware table per node
    #[arg(long)]
    node_hw: bool,
    /// Software table per node
    #[arg(long)]
    node_sw: bool,
    /// Plugins
    #[arg(long)]
    plugins: bool,
    /// Build queue
    #[arg(long)]
    queue: bool,
    /// Disk usage
    #[arg(long)]
    disk: bool,
    /// Security configuration
    #[arg(long)]
    security: bool,
    /// Users and permissions
    #[arg(long)]
    users: bool,
    /// LDAP configuration
    #[arg(long)]
    ldap: bool,
    /// Email notification settings
    #[arg(long)]
    email: bool,
    /// Configured build tools
    #[arg(long)]
    tools: bool,
    /// Notification systems
    #[arg(long)]
    notifications: bool,
    /// Alerts and warnings
    #[arg(long)]
    alerts: bool,
    /// Everything, grouped by area
    #[arg(long)]
    all: bool,
}

impl SectionFlags {
    fn run_mode(&self) -> RunMode {
        if self.all {
            return RunMode::All;
        }

        let mut selection = Selection::new();
        let flags = [
            (self.info, Section::Info),
            (self.system, Section::System),
            (self.jobs, Section::Jobs),
            (self.nodes, Section::Nodes),
            (self.node_details, Section::NodeDetails),
            (self.plugins, Section::Plugins),
            (self.queue, Section::Queue),
            (self.disk, Section::Disk),
            (self.hardware, Section::Hardware),
            (self.os, Section::Os),
            (self.os_summary, Section::OsSummary),
            (self.labels, Section::Labels),
            (self.executors, Section::Executors),
            (self.build_stats, Section::BuildStats),
            (self.failed_jobs, Section::FailedJobs),
            (self.security, Section::Security),
            (self.artifacts, Section::Artifacts),
            (self.users, Section::Users),
            (self.email, Section::Email),
            (self.tools, Section::Tools),
            (self.notifications, Section::Notifications),
            (self.alerts, Section::Alerts),
        ];
        for (_, section) in flags.into_iter().filter(|(on, _)| *on) {
            selection.add(section);
        }
        if self.node_os || self.node_hw || self.node_sw {
            selection.add_node_tables(DetailTables {
                os: self.node_os,
                hardware: self.node_hw,
                software: self.node_sw,
            });
        }
        if self.ldap {
            selection.add_ldap();
        }
        selection.into()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the tables on stdout.
    let default_filter = if cli.verbose {
        "info,jenkins_dashboard=debug"
    } else {
        "warn,jenkins_dashboard=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            println!("{}", format_error(format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            AppConfig::load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => AppConfig::default(),
    };

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(url) = cli.url {
        config.server.url = Some(url);
    }
    if let Some(username) = cli.username {
        config.server.username = Some(username);
    }
    if let Some(password) = cli.password {
        config.server.password = Some(password);
    }
    if cli.no_ssl_verify {
        config.server.verify_ssl = false;
    }
    if let Some(timeout) = cli.timeout {
        config.server.timeout = Some(timeout);
    }
    if cli.no_color {
        config.display.color = false;
    }
    if let Some(max_rows) = cli.max_rows {
        config.display.max_rows = max_rows;
    }
    config.validate()?;
    set_color_enabled(config.display.color);

    let client_config = config
        .server
        .to_client_config()
        .context("Jenkins URL, username and password are required")?;

    println!(
        "{}",
        paint(format!("Connecting to Jenkins at {}...", client_config.url), Tone::Info)
    );
    if !client_config.verify_ssl {
        println!("{}", paint("SSL verification: Disabled", Tone::Warning));
    }

    let mut client = JenkinsClient::new(client_config)?;
    let login = match client.login().await {
        Ok(login) => login,
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            println!("{}", format_error(e));
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::info!(url = %login.url, user = %login.full_name, "Logged in");
    println!(
        "{}",
        paint(
            format!(
                "Successfully connected to Jenkins {} as {}",
                login.version, login.full_name
            ),
            Tone::Success
        )
    );

    let mode = cli.sections.run_mode();
    let mut dashboard = Dashboard::new(&client, io::stdout())
        .with_limits(config.limits)
        .with_thresholds(config.thresholds)
        .with_display(DisplayOptions::with_max_rows(config.display.max_rows));
    dashboard.run(&mode).await?;

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["jenkins-dashboard", "ci.example.com", "admin", "token"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_no_flags_is_overview() {
        assert_eq!(parse(&[]).sections.run_mode(), RunMode::Overview);
    }

    #[test]
    fn test_all_wins() {
        assert_eq!(parse(&["--jobs", "--all"]).sections.run_mode(), RunMode::All);
    }

    #[test]
    fn test_selected_sections_in_order() {
        let RunMode::Selected(selection) = parse(&["--alerts", "--ldap", "--disk", "--node-hw"])
            .sections
            .run_mode()
        else {
            panic!("expected selected sections");
        };
        let sections: Vec<_> = selection.sections().collect();
        assert_eq!(
            sections,
            vec![
                Section::NodeDetails,
                Section::Disk,
                Section::Users,
                Section::Alerts
            ]
        );
    }

    #[test]
    fn test_timeout_parses_humantime() {
        let cli = parse(&["--timeout", "1m 30s"]);
        assert_eq!(cli.timeout, Some(Duration::from_secs(90)));
    }
}
