// `ragdesk stats`: usage overview for the signed-in user.

use anyhow::Context;
use ragdesk_common::types::Stats;

use super::{short_time, ClientEngine};
use crate::output::{self, OutputFormat};

pub async fn run(engine: &ClientEngine, format: OutputFormat) -> anyhow::Result<()> {
    let stats = engine.try_stats().await.context("failed to load stats")?;
    output::print_output(format, &stats, format_human)?;
    Ok(())
}

fn format_human(stats: &Stats) -> String {
    let mut lines = vec![
        format!("Workspaces: {}", stats.total_workspaces),
        format!("Documents:  {}", stats.total_docs),
        format!("Queries:    {} (avg {:.0}ms)", stats.total_queries, stats.avg_duration_ms),
    ];
    if !stats.recent_queries.is_empty() {
        lines.push("Recent:".into());
        for q in &stats.recent_queries {
            lines.push(format!("  {}  {}", short_time(q.created_at), q.query));
        }
    }
    lines.join("\n")
}
