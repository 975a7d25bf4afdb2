use serde_json::json;

use crate::AnalysisResult;
use crate::fallback::ChainReport;

/// Render transcript text, or nothing when no strategy succeeded
pub fn render_transcript_text(report: &ChainReport) -> String {
    report.transcript.as_ref().map(|t| t.text.clone()).unwrap_or_default()
}

/// Render the full chain report as pretty JSON
pub fn render_transcript_json(report: &ChainReport) -> String {
    let value = json!({
        "transcript": report.transcript,
        "trail": report.trail,
    });
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

pub fn render_analysis_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Human-readable analysis. Falls back to JSON when the model strayed from
/// the requested shape.
pub fn render_analysis_text(value: &serde_json::Value) -> String {
    let Ok(result) = serde_json::from_value::<AnalysisResult>(value.clone()) else {
        return render_analysis_json(value);
    };

    let mut out = vec![format!("# {}", result.title)];

    if !result.usable_items.is_empty() {
        out.push(String::new());
        out.push("## Usable".to_string());
        for item in &result.usable_items {
            out.push(format!("- {}: {}", item.point, item.context));
        }
    }

    if !result.action_plan.is_empty() {
        out.push(String::new());
        out.push("## Actions".to_string());
        for item in &result.action_plan {
            out.push(format!("- [{}] {}", item.timing, item.action));
        }
    }

    if !result.memos.is_empty() {
        out.push(String::new());
        out.push("## Memos".to_string());
        for memo in &result.memos {
            out.push(format!("- {memo}"));
        }
    }

    out.join("\n")
}
