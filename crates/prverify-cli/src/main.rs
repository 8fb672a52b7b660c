//! prverify - GitHub Actions entrypoint
//!
//! Reads the pull request event the workflow was triggered by, runs the PR
//! title verifier against it and records the result as a check run.
//!
//! Every option falls back to the environment variables GitHub Actions sets,
//! so inside a workflow step no flags are needed.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use prverify_core::telemetry::{default_level, init_tracing};
use prverify_core::{
    verify_pr_title, ChecksApi, GitHubChecksClient, GitHubConfig, PrEvent, PrPlugin, RepoRef,
    DEFAULT_API_URL,
};

#[derive(Parser, Debug)]
#[command(name = "prverify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify pull request titles and report the result as a check run", long_about = None)]
struct Cli {
    /// Path to the webhook event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: PathBuf,

    /// Name of the triggering event
    #[arg(long, env = "GITHUB_EVENT_NAME", default_value = "pull_request")]
    event_name: String,

    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Token for the Checks API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Name of the check run
    #[arg(long, env = "INPUT_CHECK_NAME", default_value = "PR Title Verifier")]
    check_name: String,

    /// Title shown on the check run output
    #[arg(long, default_value = "Verify PR title")]
    check_title: String,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,
}

fn is_pull_request_event(event_name: &str) -> bool {
    matches!(event_name, "pull_request" | "pull_request_target")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let runner_debug = std::env::var("RUNNER_DEBUG").ok();
    init_tracing(cli.json, default_level(cli.verbose, runner_debug.as_deref()));

    let client = GitHubChecksClient::new(GitHubConfig::new(&cli.token).with_api_url(&cli.api_url))
        .context("Failed to create GitHub client")?;

    run(&cli, Arc::new(client)).await
}

async fn run(cli: &Cli, api: Arc<dyn ChecksApi>) -> Result<()> {
    if !is_pull_request_event(&cli.event_name) {
        info!(event_name = %cli.event_name, "Not a pull request event, skipping");
        return Ok(());
    }

    let repo = RepoRef::parse(&cli.repository).with_context(|| {
        format!(
            "Invalid repository `{}`, expected owner/repo",
            cli.repository
        )
    })?;

    let payload = tokio::fs::read(&cli.event_path)
        .await
        .with_context(|| format!("Failed to read event payload {:?}", cli.event_path))?;
    let event = PrEvent::from_json(&payload).context("Failed to decode pull request event")?;

    info!(
        repo = %repo,
        pr = event.pull_request.number,
        action = %event.action.as_str(),
        "Verifying pull request"
    );

    let plugin = PrPlugin::new(
        api,
        repo,
        &cli.check_name,
        &cli.check_title,
        Arc::new(verify_pr_title),
    );
    plugin.handle(&event).await?;

    info!("Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prverify_core::fakes::MemoryChecksApi;
    use prverify_core::CheckConclusion;
    use std::io::Write;

    fn cli(event_path: PathBuf) -> Cli {
        Cli::parse_from([
            "prverify",
            "--event-path",
            event_path.to_str().unwrap(),
            "--event-name",
            "pull_request",
            "--repository",
            "octo/widgets",
            "--token",
            "t0k3n",
        ])
    }

    fn event_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    const OPENED: &str = r#"{
        "action": "opened",
        "pull_request": { "number": 3, "title": "🌱 Bump deps", "head": { "sha": "abc" } }
    }"#;

    #[test]
    fn test_cli_defaults() {
        let cli = cli(PathBuf::from("/tmp/event.json"));
        assert_eq!(cli.api_url, DEFAULT_API_URL);
        assert_eq!(cli.check_name, "PR Title Verifier");
        assert_eq!(cli.check_title, "Verify PR title");
        assert!(!cli.verbose);
        assert!(!cli.json);
    }

    #[test]
    fn test_is_pull_request_event() {
        assert!(is_pull_request_event("pull_request"));
        assert!(is_pull_request_event("pull_request_target"));
        assert!(!is_pull_request_event("push"));
    }

    #[tokio::test]
    async fn test_run_records_check() {
        let file = event_file(OPENED);
        let api = Arc::new(MemoryChecksApi::new());

        run(&cli(file.path().to_path_buf()), api.clone())
            .await
            .expect("run failed");

        let runs = api.runs_for(&RepoRef::new("octo", "widgets"), "abc");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].conclusion, Some(CheckConclusion::Success));
    }

    #[tokio::test]
    async fn test_run_fails_on_bad_title() {
        let file = event_file(&OPENED.replace("🌱 ", ""));
        let api = Arc::new(MemoryChecksApi::new());

        let err = run(&cli(file.path().to_path_buf()), api.clone())
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("failed: "));
        assert_eq!(api.len(), 1);
    }

    #[tokio::test]
    async fn test_run_skips_other_events() {
        let api = Arc::new(MemoryChecksApi::new());
        let mut cli = cli(PathBuf::from("/nonexistent/event.json"));
        cli.event_name = "push".to_string();

        run(&cli, api.clone()).await.unwrap();
        assert!(api.is_empty());
    }

    #[tokio::test]
    async fn test_run_rejects_bad_repository() {
        let file = event_file(OPENED);
        let mut cli = cli(file.path().to_path_buf());
        cli.repository = "widgets".to_string();

        let err = run(&cli, Arc::new(MemoryChecksApi::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected owner/repo"));
    }

    #[tokio::test]
    async fn test_run_missing_event_file() {
        let cli = cli(PathBuf::from("/nonexistent/event.json"));
        let err = run(&cli, Arc::new(MemoryChecksApi::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read event payload"));
    }
}
