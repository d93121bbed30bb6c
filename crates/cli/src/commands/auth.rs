// `ragdesk login|register|logout|whoami|health`: account and server commands.

use anyhow::Context;
use clap::Args;
use ragdesk_client::gateway::ApiError;
use ragdesk_common::types::{AccountSummary, HealthStatus, UserProfile};
use serde::Serialize;

use super::{short_time, ClientEngine};
use crate::exit_code::AuthFailure;
use crate::output::{self, OutputFormat};
use crate::prompt;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email.
    email: String,
    /// Password. Prompted for when omitted.
    #[arg(long)]
    password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account email.
    email: String,
    /// Display name.
    #[arg(long, default_value = "")]
    name: String,
    /// Password. Prompted for when omitted.
    #[arg(long)]
    password: Option<String>,
}

#[derive(Debug, Args)]
pub struct WhoamiArgs {
    /// Ask the server for the full account summary.
    #[arg(long)]
    remote: bool,
}

#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub user: UserProfile,
    pub api_url: String,
}

#[derive(Debug, Serialize)]
pub struct SignedOut {
    pub signed_out: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub api_url: String,
    #[serde(flatten)]
    pub health: HealthStatus,
}

pub async fn login(engine: &ClientEngine, args: LoginArgs, format: OutputFormat) -> anyhow::Result<()> {
    let password =
        prompt::value_or_ask(args.password, "Password: ").context("failed to read password")?;
    if !engine.session().login(&args.email, &password).await {
        return Err(auth_failure(engine, "Login failed").into());
    }
    print_signed_in(engine, format, "Signed in")
}

pub async fn register(
    engine: &ClientEngine,
    args: RegisterArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let password =
        prompt::value_or_ask(args.password, "Password: ").context("failed to read password")?;
    if !engine.session().register(&args.email, &password, &args.name).await {
        return Err(auth_failure(engine, "Registration failed").into());
    }
    print_signed_in(engine, format, "Registered and signed in")
}

pub fn logout(engine: &ClientEngine, format: OutputFormat) -> anyhow::Result<()> {
    engine.session().logout().context("failed to clear the saved session")?;
    output::print_output(format, &SignedOut { signed_out: true }, |_| "Signed out.".to_string())?;
    Ok(())
}

pub async fn whoami(engine: &ClientEngine, args: WhoamiArgs, format: OutputFormat) -> anyhow::Result<()> {
    if args.remote {
        let summary = engine.session().refresh_profile().await.context("failed to load account")?;
        output::print_output(format, &summary, format_account)?;
        return Ok(());
    }
    print_signed_in(engine, format, "Signed in")
}

pub async fn health(engine: &ClientEngine, format: OutputFormat) -> anyhow::Result<()> {
    let health = engine.health().await.context("health check failed")?;
    let report = HealthReport { api_url: engine.config().api_url.clone(), health };
    output::print_output(format, &report, format_health)?;
    Ok(())
}

fn auth_failure(engine: &ClientEngine, fallback: &str) -> AuthFailure {
    let reason = engine.session().context().error().unwrap_or_else(|| fallback.to_string());
    AuthFailure { reason }
}

fn print_signed_in(engine: &ClientEngine, format: OutputFormat, verb: &str) -> anyhow::Result<()> {
    let user = engine.session().context().user().ok_or(ApiError::Unauthenticated)?;
    let result = SignedIn { user, api_url: engine.config().api_url.clone() };
    output::print_output(format, &result, |r| format_signed_in(r, verb))?;
    Ok(())
}

fn format_signed_in(result: &SignedIn, verb: &str) -> String {
    let user = &result.user;
    if user.full_name.is_empty() {
        format!("{verb} as {} on {}", user.email, result.api_url)
    } else {
        format!("{verb} as {} <{}> on {}", user.full_name, user.email, result.api_url)
    }
}

fn format_account(summary: &AccountSummary) -> String {
    let name = if summary.full_name.is_empty() { "-" } else { summary.full_name.as_str() };
    [
        format!("Email:     {}", summary.email),
        format!("Name:      {name}"),
        format!("Documents: {}", summary.total_docs),
        format!("Queries:   {}", summary.total_queries),
        format!("Joined:    {}", short_time(summary.created_at)),
    ]
    .join("\n")
}

fn format_health(report: &HealthReport) -> String {
    format!("Server at {} is {}", report.api_url, report.health.status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(full_name: &str) -> UserProfile {
        UserProfile {
            id: "u1".into(),
            email: "ada@example.com".into(),
            full_name: full_name.into(),
        }
    }

    #[test]
    fn format_signed_in_with_name() {
        let result = SignedIn { user: user("Ada"), api_url: "http://localhost:8000/api".into() };
        assert_eq!(
            format_signed_in(&result, "Signed in"),
            "Signed in as Ada <ada@example.com> on http://localhost:8000/api"
        );
    }

    #[test]
    fn format_signed_in_without_name() {
        let result = SignedIn { user: user(""), api_url: "http://x/api".into() };
        assert_eq!(format_signed_in(&result, "Signed in"), "Signed in as ada@example.com on http://x/api");
    }

    #[test]
    fn format_account_fills_missing_fields() {
        let summary = AccountSummary {
            id: "u1".into(),
            email: "ada@example.com".into(),
            full_name: String::new(),
            total_queries: 7,
            total_docs: 3,
            created_at: None,
        };
        let text = format_account(&summary);
        assert!(text.contains("Name:      -"));
        assert!(text.contains("Queries:   7"));
        assert!(text.contains("Joined:    -"));
    }

    #[test]
    fn health_report_flattens_status() {
        let report = HealthReport {
            api_url: "http://x/api".into(),
            health: HealthStatus { status: "healthy".into(), timestamp: None },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(format_health(&report), "Server at http://x/api is healthy");
    }
}
