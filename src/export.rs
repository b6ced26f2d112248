use crate::models::{Checkpoint, Stats, Subject};
use crate::stats::{build_stats_at, today_string};
use crate::store::CheckpointMap;
use crate::ui::escape_html;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SubjectSection {
    pub subject: Subject,
    pub checkpoints: Vec<Checkpoint>,
    pub stats: Stats,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub generated_on: String,
    pub subjects: Vec<SubjectSection>,
    pub overall: Stats,
}

pub fn build_report(subjects: &[Subject], data: &CheckpointMap) -> Report {
    build_report_at(&today_string(), subjects, data)
}

pub fn build_report_at(today: &str, subjects: &[Subject], data: &CheckpointMap) -> Report {
    let sections: Vec<SubjectSection> = subjects
        .iter()
        .map(|subject| {
            let checkpoints = data.get(&subject.id).cloned().unwrap_or_default();
            SubjectSection {
                stats: build_stats_at(today, &checkpoints),
                subject: subject.clone(),
                checkpoints,
            }
        })
        .collect();

    let all: Vec<Checkpoint> = sections
        .iter()
        .flat_map(|section| section.checkpoints.iter().cloned())
        .collect();

    Report {
        generated_on: today.to_string(),
        overall: build_stats_at(today, &all),
        subjects: sections,
    }
}

pub fn render_report_html(report: &Report) -> String {
    let mut body = String::new();
    for section in &report.subjects {
        body.push_str(&format!(
            "<section><h2>{}</h2><p class=\"meta\">{} total &middot; {} completed &middot; {}% &middot; {} overdue</p>",
            escape_html(&section.subject.label()),
            section.stats.total,
            section.stats.completed,
            section.stats.progress_percent,
            section.stats.overdue_count,
        ));
        if section.checkpoints.is_empty() {
            body.push_str("<p class=\"empty\">No checkpoints yet</p>");
        } else {
            body.push_str("<table><thead><tr><th></th><th>Title</th><th>Due</th><th>Priority</th></tr></thead><tbody>");
            for checkpoint in &section.checkpoints {
                let items = checkpoint
                    .bullet_items()
                    .iter()
                    .map(|item| format!("<li>{}</li>", escape_html(item)))
                    .collect::<String>();
                body.push_str(&format!(
                    "<tr><td>{}</td><td>{}<ul>{}</ul></td><td>{}</td><td>{}</td></tr>",
                    if checkpoint.completed { "&#10003;" } else { "" },
                    escape_html(&checkpoint.title),
                    items,
                    escape_html(&checkpoint.date),
                    checkpoint.priority.as_str().to_uppercase(),
                ));
            }
            body.push_str("</tbody></table>");
        }
        body.push_str("</section>");
    }

    REPORT_HTML
        .replace("{{DATE}}", &escape_html(&report.generated_on))
        .replace("{{TOTAL}}", &report.overall.total.to_string())
        .replace("{{COMPLETED}}", &report.overall.completed.to_string())
        .replace("{{PROGRESS}}", &report.overall.progress_percent.to_string())
        .replace("{{OVERDUE}}", &report.overall.overdue_count.to_string())
        .replace("{{SECTIONS}}", &body)
}

const REPORT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Checkpoint Report {{DATE}}</title>
  <style>
    body { font-family: Georgia, serif; margin: 32px; color: #222; }
    h1 { margin-bottom: 4px; }
    .meta { color: #666; margin-top: 0; }
    table { width: 100%; border-collapse: collapse; margin-bottom: 24px; }
    th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid #ddd; vertical-align: top; }
    ul { margin: 4px 0 0 18px; padding: 0; color: #555; }
    @media print { button { display: none; } }
  </style>
</head>
<body>
  <button onclick="window.print()">Print / Save as PDF</button>
  <h1>Checkpoint Report</h1>
  <p class="meta">Generated {{DATE}} &middot; {{TOTAL}} checkpoints &middot; {{COMPLETED}} completed &middot; {{PROGRESS}}% &middot; {{OVERDUE}} overdue</p>
  {{SECTIONS}}
</body>
</html>
"#;
