use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use super::summary::ItemResult;
use crate::constants::ANALYSIS_SUMMARY_CHARS;
use crate::types::DumpKind;

/// Outbound channel for finished analyses.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> anyhow::Result<()>;
}

fn summarize(analysis: &str) -> String {
    if analysis.chars().count() > ANALYSIS_SUMMARY_CHARS {
        let head: String = analysis.chars().take(ANALYSIS_SUMMARY_CHARS).collect();
        format!("{head}...")
    } else {
        analysis.to_string()
    }
}

/// Subject and pretty JSON body announcing one processed item.
pub fn notification_for(
    result: &ItemResult,
    analysis: &str,
    at: DateTime<Utc>,
) -> serde_json::Result<(String, String)> {
    let subject = match result.dump_kind {
        DumpKind::Thread => format!("Thread Dump Analysis - {}", result.task_pod_id),
        DumpKind::Heap => format!("Heap Dump Captured - {}", result.task_pod_id),
    };
    let body = json!({
        "message": result.message,
        "taskPodId": result.task_pod_id,
        "cluster": result.cluster,
        "threadDumpUrl": result.thread_dump_url,
        "analysisUrl": result.analysis_url,
        "timestamp": at.format("%Y-%m-%d-%H-%M-%S").to_string(),
        "analysis_summary": summarize(analysis),
    });
    Ok((subject, serde_json::to_string_pretty(&body)?))
}
