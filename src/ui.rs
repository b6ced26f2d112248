use crate::filter::{PriorityFilter, ViewFilter};
use crate::models::{Checkpoint, Priority, Stats, Subject};

pub struct IndexPage<'a> {
    pub subjects: &'a [Subject],
    pub active: Option<&'a Subject>,
    pub checkpoints: &'a [Checkpoint],
    pub stats: Stats,
    pub view: &'a ViewFilter,
}

pub fn active_subject<'a>(subjects: &'a [Subject], requested: Option<&str>) -> Option<&'a Subject> {
    requested
        .and_then(|id| subjects.iter().find(|subject| subject.id == id))
        .or_else(|| subjects.first())
}

pub fn render_index(page: &IndexPage<'_>) -> String {
    let active_id = page.active.map(|subject| subject.id.as_str());
    let section = match page.active {
        Some(subject) => render_section(subject, page),
        None => "<div class=\"empty-state\"><h3>No subjects</h3><p>Add a subject to get started.</p></div>".to_string(),
    };

    let tabs = render_tabs(page.subjects, active_id);
    fill(INDEX_HTML, &[("{{TABS}}", tabs.as_str()), ("{{SECTION}}", section.as_str())])
}

/// Substitutes placeholders in one pass, so inserted text is never scanned again.
fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match slots.iter().find(|(name, _)| tail.starts_with(name)) {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len()..];
            }
            None => {
                out.push_str("{{");
                rest = &tail[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn tab_url(id: &str) -> String {
    match serde_urlencoded::to_string([("tab", id)]) {
        Ok(query) => format!("/?{query}"),
        Err(_) => "/".to_string(),
    }
}

pub fn render_tabs(subjects: &[Subject], active_id: Option<&str>) -> String {
    subjects
        .iter()
        .map(|subject| {
            let id = escape_html(&subject.id);
            let href = escape_html(&tab_url(&subject.id));
            let class = if Some(subject.id.as_str()) == active_id {
                "nav-tab active"
            } else {
                "nav-tab"
            };
            let confirm = escape_html(&format!(
                "return confirm('Delete \"{}\" subject? This cannot be undone.')",
                subject.label().replace('\'', "\\'")
            ));
            format!(
                r#"<div class="nav-tab-wrapper"><a class="{class}" href="{href}">{label}</a><form method="post" action="/subjects/{id}/delete" onsubmit="{confirm}"><button class="delete-tab-btn" type="submit" title="Delete subject">✕</button></form></div>"#,
                label = escape_html(&subject.label()),
            )
        })
        .collect()
}

pub fn render_stats(stats: &Stats) -> String {
    format!(
        r#"<div class="stats-section">
  <div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">Total</div></div>
  <div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">Completed</div></div>
  <div class="stat-card"><div class="stat-value">{}%</div><div class="stat-label">Progress</div></div>
  <div class="stat-card"><div class="stat-value">{}</div><div class="stat-label">Overdue</div></div>
</div>"#,
        stats.total, stats.completed, stats.progress_percent, stats.overdue_count
    )
}

pub fn render_checkpoint_list(subject_id: &str, checkpoints: &[Checkpoint], empty: &str) -> String {
    if checkpoints.is_empty() {
        return format!(
            r#"<div class="empty-state"><h3>{}</h3></div>"#,
            escape_html(empty)
        );
    }
    checkpoints
        .iter()
        .map(|checkpoint| render_checkpoint(subject_id, checkpoint))
        .collect()
}

fn render_checkpoint(subject_id: &str, checkpoint: &Checkpoint) -> String {
    let base = format!("/subjects/{}/checkpoints/{}", escape_html(subject_id), checkpoint.id);
    let items = checkpoint.bullet_items();
    let description = match items.len() {
        0 => "No description".to_string(),
        1 => escape_html(items[0]),
        _ => format!(
            "<ul>{}</ul>",
            items
                .iter()
                .map(|item| format!("<li>{}</li>", escape_html(item)))
                .collect::<String>()
        ),
    };

    format!(
        r#"<div class="checkpoint-item{done}">
  <form method="post" action="{base}/toggle"><button class="complete-toggle" type="submit" title="Toggle complete">{mark}</button></form>
  <div class="checkpoint-body">
    <span class="checkpoint-title">{title}</span>
    <div class="checkpoint-desc">{description}</div>
    <p class="checkpoint-date">{date}</p>
  </div>
  <span class="priority priority-{priority}">{priority_label}</span>
  <form method="post" action="{base}/delete" onsubmit="return confirm('Delete this checkpoint?')"><button class="delete-checkpoint-btn" type="submit">🗑️ Delete</button></form>
</div>"#,
        done = if checkpoint.completed { " completed" } else { "" },
        mark = if checkpoint.completed { "☑" } else { "☐" },
        title = escape_html(&checkpoint.title),
        date = escape_html(&checkpoint.date),
        priority = checkpoint.priority.as_str(),
        priority_label = checkpoint.priority.as_str().to_uppercase(),
    )
}

fn render_section(subject: &Subject, page: &IndexPage<'_>) -> String {
    let id = escape_html(&subject.id);
    let href = escape_html(&tab_url(&subject.id));
    let (active_filter, term) = match page.view {
        ViewFilter::Priority(filter) => (*filter, String::new()),
        ViewFilter::Search(term) => (PriorityFilter::All, escape_html(term)),
    };
    let filters: String = [
        (PriorityFilter::All, "All"),
        (PriorityFilter::High, "🔴 High"),
        (PriorityFilter::Medium, "🟡 Medium"),
        (PriorityFilter::Low, "🟢 Low"),
    ]
    .iter()
    .map(|(filter, label)| {
        let selected = matches!(page.view, ViewFilter::Priority(_)) && *filter == active_filter;
        format!(
            r#"<a class="btn btn-secondary{}" href="{href}&amp;priority={}">{label}</a>"#,
            if selected { " active" } else { "" },
            filter.as_str(),
        )
    })
    .collect();
    let priorities: String = [Priority::Low, Priority::Medium, Priority::High]
        .iter()
        .map(|priority| {
            format!(
                r#"<option value="{0}"{1}>{0}</option>"#,
                priority.as_str(),
                if *priority == Priority::Medium { " selected" } else { "" }
            )
        })
        .collect();

    format!(
        r#"<div class="section" data-subject="{id}">
  <form class="input-section" method="post" action="/subjects/{id}/checkpoints">
    <h3>Add New Checkpoint</h3>
    <div class="input-group">
      <label>Title <input type="text" name="title" placeholder="Enter checkpoint title" required></label>
      <label>Priority <select name="priority">{priorities}</select></label>
      <label>Due Date <input type="date" name="date" required></label>
    </div>
    <label>Description <textarea name="description" placeholder="Add details, one item per line..."></textarea></label>
    <button class="btn btn-primary" type="submit">➕ Add Checkpoint</button>
  </form>
  <div class="filter-section">
    <form class="search-box" method="get" action="/">
      <input type="hidden" name="tab" value="{id}">
      <input type="search" name="q" value="{term}" placeholder="Search checkpoints...">
    </form>
    {filters}
  </div>
  {stats}
  <div class="checkpoints-list">{list}</div>
</div>"#,
        stats = render_stats(&page.stats),
        list = render_checkpoint_list(&subject.id, page.checkpoints, page.view.empty_message()),
    )
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Checkpoint Tracker</title>
  <style>
    :root {
      --bg: #111827;
      --card: #1f2937;
      --ink: #f3f4f6;
      --muted: #9ca3af;
      --accent: #6366f1;
      --line: #374151;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Segoe UI", "Trebuchet MS", sans-serif;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
      padding: 20px 28px;
      border-bottom: 1px solid var(--line);
    }

    h1 { margin: 0; font-size: 1.6rem; }

    .header-controls { display: flex; gap: 8px; align-items: center; }
    .header-controls input { width: 9rem; }

    .nav-tabs { display: flex; flex-wrap: wrap; gap: 8px; padding: 16px 28px; }
    .nav-tab-wrapper { display: flex; align-items: center; gap: 2px; }
    .nav-tab-wrapper form { margin: 0; }

    .nav-tab {
      padding: 8px 14px;
      border-radius: 999px;
      color: var(--muted);
      text-decoration: none;
      background: var(--card);
    }

    .nav-tab.active { background: var(--accent); color: white; }

    .delete-tab-btn { background: transparent; color: var(--muted); border: none; cursor: pointer; }

    .content { padding: 0 28px 40px; display: grid; gap: 20px; }

    .input-section, .filter-section, .stats-section, .checkpoint-item {
      background: var(--card);
      border-radius: 12px;
      padding: 16px;
    }

    .input-group { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 12px; }

    label { display: grid; gap: 6px; margin-bottom: 12px; color: var(--muted); }

    input, select, textarea {
      padding: 10px;
      border-radius: 8px;
      border: 1px solid var(--line);
      background: #111827;
      color: var(--ink);
      font: inherit;
    }

    textarea { min-height: 70px; }

    .btn {
      display: inline-block;
      padding: 10px 16px;
      border-radius: 8px;
      border: none;
      cursor: pointer;
      font-weight: 600;
      text-decoration: none;
      font-size: 0.95rem;
    }

    .btn-primary { background: var(--accent); color: white; }
    .btn-secondary { background: var(--line); color: var(--ink); }
    .btn-secondary.active { outline: 2px solid var(--accent); }

    .filter-section { display: flex; flex-wrap: wrap; gap: 8px; align-items: center; }
    .search-box { flex: 1; min-width: 200px; margin: 0; }
    .search-box input { width: 100%; }

    .stats-section { display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; text-align: center; }
    .stat-value { font-size: 1.6rem; font-weight: 700; }
    .stat-label { color: var(--muted); font-size: 0.85rem; }

    .checkpoints-list { display: grid; gap: 12px; }

    .checkpoint-item { display: flex; gap: 12px; align-items: flex-start; }
    .checkpoint-item form { margin: 0; }
    .checkpoint-body { flex: 1; }
    .checkpoint-item.completed .checkpoint-title { text-decoration: line-through; opacity: 0.6; }
    .checkpoint-desc { color: var(--muted); margin-top: 6px; }
    .checkpoint-desc ul { margin: 0; padding-left: 18px; }
    .checkpoint-date { margin: 6px 0 0; font-size: 0.85rem; opacity: 0.7; }

    .complete-toggle { background: none; border: none; color: var(--ink); font-size: 1.3rem; cursor: pointer; }

    .priority { padding: 4px 10px; border-radius: 6px; font-size: 0.8rem; font-weight: 600; }
    .priority-high { background: #ef444422; color: #ef4444; }
    .priority-medium { background: #f59e0b22; color: #f59e0b; }
    .priority-low { background: #10b98122; color: #10b981; }

    .delete-checkpoint-btn {
      padding: 6px 12px;
      border: 1px solid #ef4444;
      background: transparent;
      color: #ef4444;
      border-radius: 6px;
      cursor: pointer;
    }

    .empty-state { text-align: center; color: var(--muted); padding: 28px; }
  </style>
</head>
<body>
  <header>
    <h1>Checkpoint Tracker</h1>
    <div class="header-controls">
      <form method="post" action="/subjects" class="header-controls">
        <input type="text" name="name" placeholder="e.g., DevOps" required>
        <input type="text" name="emoji" placeholder="🚀" maxlength="2" required>
        <button class="btn btn-secondary" type="submit">+ Add Subject</button>
      </form>
      <a class="btn btn-secondary" href="/export" target="_blank">Export</a>
    </div>
  </header>
  <nav class="nav-tabs">{{TABS}}</nav>
  <main class="content">{{SECTION}}</main>
</body>
</html>
"#;
