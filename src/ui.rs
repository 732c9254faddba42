use crate::dashboard::Dashboard;
use crate::metrics::date_key;
use chrono::NaiveDate;
use std::fmt::Write;

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 180.0;
const CHART_PAD: f64 = 24.0;

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let points: Vec<(String, f64)> = dashboard
        .points_series()
        .into_iter()
        .map(|point| (point.date, f64::from(point.points)))
        .collect();
    let chart = line_chart(&points, false);

    let days = dashboard.week_days();
    let mut head = String::new();
    for day in &days {
        let _ = write!(head, "<th class=\"day\">{}</th>", day.format("%a %b %-d"));
    }

    let mut rows = String::new();
    for (index, habit) in dashboard.habits().iter().enumerate() {
        let id = habit.id;
        let name = escape_html(&habit.name);
        let mut cells = String::new();
        for day in &days {
            let key = date_key(*day);
            let done = habit.is_completed_on(&key);
            let _ = write!(
                cells,
                "<td class=\"day\"><form method=\"post\" action=\"/habits/{id}/toggle\">\
                 <input type=\"hidden\" name=\"date\" value=\"{key}\" />\
                 <button class=\"check{}\" aria-pressed=\"{done}\" title=\"{key}\">{}</button>\
                 </form></td>",
                if done { " done" } else { "" },
                if done { "&#10003;" } else { "" },
            );
        }
        let _ = write!(
            rows,
            r#"<tr draggable="true" data-index="{index}">
  <td class="grip">&#8942;&#8942;</td>
  <td class="name">
    <form method="post" action="/habits/{id}/rename" class="rename">
      <input type="text" name="name" value="{name}" aria-label="Habit name" />
      <input type="hidden" name="key" value="" disabled />
    </form>
    <a class="open" href="/habits/{id}" title="Open">&#8599;</a>
  </td>
  <td class="points">
    <form method="post" action="/habits/{id}/points">
      <input type="number" name="points" value="{points}" min="1" max="10" onchange="this.form.submit()" />
    </form>
  </td>
  {cells}
  <td class="actions">
    <form method="post" action="/habits/{id}/delete"><button class="danger" title="Delete">&#10005;</button></form>
  </td>
</tr>
"#,
            points = habit.points,
        );
    }
    if dashboard.habits().is_empty() {
        let _ = write!(
            rows,
            "<tr><td class=\"empty\" colspan=\"{}\">No habits yet. Add one above.</td></tr>",
            days.len() + 4
        );
    }

    let week = dashboard.current_date().format("%b %-d, %Y").to_string();
    fill(
        DASHBOARD_HTML,
        &[
            ("STYLE", STYLE),
            ("WEEK", &week),
            ("CHART", &chart),
            ("INPUT", &escape_html(dashboard.new_habit_input())),
            ("DAYS", &head),
            ("ROWS", &rows),
        ],
    )
}

/// Renders the detail page; the dashboard must be in the detail view.
pub fn render_detail(dashboard: &Dashboard, today: NaiveDate) -> String {
    let (Some((habit, detail)), Some((series, stats))) =
        (dashboard.detail(), dashboard.detail_progress(today))
    else {
        return fill(NOT_FOUND_HTML, &[("STYLE", STYLE)]);
    };

    let points: Vec<(String, f64)> = series
        .into_iter()
        .map(|sample| (sample.date, f64::from(sample.completed)))
        .collect();

    fill(
        DETAIL_HTML,
        &[
            ("STYLE", STYLE),
            ("ID", &habit.id.to_string()),
            ("NAME", &escape_html(&habit.name)),
            ("DESCRIPTION", &escape_html(detail.draft())),
            ("CHART", &line_chart(&points, true)),
            ("CURRENT", &stats.current_streak.to_string()),
            ("LONGEST", &stats.longest_streak.to_string()),
            ("RATE", &format!("{:.0}%", stats.completion_rate * 100.0)),
        ],
    )
}

/// Substitutes `{{KEY}}` tokens in one pass over the template. Inserted values
/// are never scanned again, so user text containing a token stays verbatim.
/// Unknown tokens are left in place.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };
        let key = &after[..end];
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Inline SVG line chart. `step` draws a step-after line with a fixed 0..1 axis.
pub fn line_chart(points: &[(String, f64)], step: bool) -> String {
    if points.is_empty() {
        return "<p class=\"empty\">Nothing completed yet.</p>".to_string();
    }

    let max = if step {
        1.0
    } else {
        points.iter().map(|(_, value)| *value).fold(1.0, f64::max)
    };
    let plot_w = CHART_WIDTH - CHART_PAD * 2.0;
    let plot_h = CHART_HEIGHT - CHART_PAD * 2.0;
    let span = (points.len().saturating_sub(1)).max(1) as f64;
    let x = |i: usize| CHART_PAD + plot_w * i as f64 / span;
    let y = |v: f64| CHART_PAD + plot_h - plot_h * v / max;

    let mut path = String::new();
    for (i, (_, value)) in points.iter().enumerate() {
        if i == 0 {
            let _ = write!(path, "M{:.1},{:.1}", x(i), y(*value));
        } else if step {
            let (_, prev) = &points[i - 1];
            let _ = write!(path, " L{:.1},{:.1} L{:.1},{:.1}", x(i), y(*prev), x(i), y(*value));
        } else {
            let _ = write!(path, " L{:.1},{:.1}", x(i), y(*value));
        }
    }

    let mut dots = String::new();
    for (i, (label, value)) in points.iter().enumerate() {
        let _ = write!(
            dots,
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\"><title>{}: {}</title></circle>",
            x(i),
            y(*value),
            escape_html(label),
            value
        );
    }

    let first = escape_html(&points[0].0);
    let last = escape_html(&points[points.len() - 1].0);
    format!(
        "<svg class=\"chart\" viewBox=\"0 0 {w} {h}\" role=\"img\">\
         <line class=\"axis\" x1=\"{pad}\" y1=\"{base}\" x2=\"{right}\" y2=\"{base}\" />\
         <text x=\"{pad}\" y=\"{label_y}\">{first}</text>\
         <text x=\"{right}\" y=\"{label_y}\" text-anchor=\"end\">{last}</text>\
         <text x=\"4\" y=\"{top}\">{max}</text>\
         <path d=\"{path}\" />{dots}</svg>",
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        pad = CHART_PAD,
        base = CHART_HEIGHT - CHART_PAD,
        right = CHART_WIDTH - CHART_PAD,
        label_y = CHART_HEIGHT - 6.0,
        top = CHART_PAD + 4.0,
    )
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = r#"
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg: #f4f1ea;
      --ink: #23302b;
      --muted: #66736d;
      --accent: #3f9d5b;
      --danger: #d9534f;
      --card: rgba(255, 255, 255, 0.9);
      --line: #d9ddd6;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(160deg, var(--bg), #e5efe4 70%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(1100px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 24px;
      box-shadow: 0 20px 50px rgba(35, 48, 43, 0.14);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1, h2 { font-family: "Fraunces", Georgia, serif; margin: 0; }
    h2 { font-size: 1.2rem; }

    .chart { width: 100%; height: auto; }
    .chart path { fill: none; stroke: var(--accent); stroke-width: 2.5; }
    .chart circle { fill: var(--accent); }
    .chart .axis { stroke: var(--line); }
    .chart text { fill: var(--muted); font-size: 11px; }

    .add { display: flex; gap: 10px; }
    .add input { flex: 1; }

    input[type="text"], input[type="number"], textarea {
      border: 1px solid var(--line);
      border-radius: 10px;
      padding: 8px 10px;
      font: inherit;
    }
    input[type="number"] { width: 64px; }
    textarea { width: 100%; min-height: 110px; }

    button {
      border: none;
      border-radius: 10px;
      padding: 8px 14px;
      font: inherit;
      cursor: pointer;
      background: var(--accent);
      color: #fff;
    }
    button.danger { background: var(--danger); }

    table { width: 100%; border-collapse: collapse; }
    th, td { border-bottom: 1px solid var(--line); padding: 8px; text-align: left; }
    th.day, td.day { text-align: center; }
    td.name { display: flex; align-items: center; gap: 8px; }
    td.name .rename { flex: 1; }
    td.name input { width: 100%; }
    td.grip { cursor: move; color: var(--muted); }
    tr.drop-target { outline: 2px dashed var(--accent); }

    .check {
      width: 32px;
      height: 32px;
      padding: 0;
      background: #fff;
      border: 1px solid var(--line);
      color: #fff;
    }
    .check.done { background: var(--accent); border-color: var(--accent); }

    .subtitle { margin: 6px 0 0; color: var(--muted); }
    .empty { color: var(--muted); text-align: center; }
    .back { color: var(--accent); text-decoration: none; }
    .stats { display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; }
    .stat { background: #fff; border-radius: 14px; padding: 14px; }
    .stat span { display: block; color: var(--muted); font-size: 0.85rem; }
    .stat strong { font-size: 1.6rem; }
"#;

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Tracker</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Habit Tracker</h1>
      <p class="subtitle">Week of {{WEEK}}</p>
    </header>

    <section>
      <h2>Daily Points</h2>
      {{CHART}}
    </section>

    <form class="add" method="post" action="/habits">
      <input type="text" name="name" value="{{INPUT}}" placeholder="Enter new habit" />
      <button type="submit">Add Habit</button>
    </form>

    <table>
      <thead>
        <tr>
          <th></th>
          <th>Habit</th>
          <th>Points</th>
          {{DAYS}}
          <th>Actions</th>
        </tr>
      </thead>
      <tbody id="habits">
        {{ROWS}}
      </tbody>
    </table>

    <form id="reorder-form" method="post" action="/reorder" hidden>
      <input type="hidden" name="from" />
      <input type="hidden" name="to" />
    </form>
  </main>

  <script>
    document.querySelectorAll('form.rename').forEach((form) => {
      const input = form.querySelector('input[name="name"]');
      const key = form.querySelector('input[name="key"]');
      const submitWith = (value) => {
        if (value) {
          key.disabled = false;
          key.value = value;
        }
        form.submit();
      };
      input.addEventListener('keydown', (event) => {
        if (event.key === 'Enter' || event.key === 'Escape') {
          event.preventDefault();
          submitWith(event.key);
        }
      });
      input.addEventListener('blur', () => {
        if (input.value !== input.defaultValue) {
          submitWith(null);
        }
      });
    });

    const rows = document.querySelectorAll('#habits tr[draggable]');
    const reorderForm = document.getElementById('reorder-form');
    let dragSource = null;

    rows.forEach((row) => {
      row.addEventListener('dragstart', () => {
        dragSource = row.dataset.index;
      });
      row.addEventListener('dragover', (event) => {
        event.preventDefault();
        rows.forEach((other) => other.classList.toggle('drop-target', other === row));
      });
      row.addEventListener('drop', (event) => {
        event.preventDefault();
        if (dragSource === null || dragSource === row.dataset.index) {
          return;
        }
        reorderForm.elements.from.value = dragSource;
        reorderForm.elements.to.value = row.dataset.index;
        reorderForm.submit();
      });
      row.addEventListener('dragend', () => {
        dragSource = null;
        rows.forEach((other) => other.classList.remove('drop-target'));
      });
    });
  </script>
</body>
</html>
"#;

const DETAIL_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{NAME}} · Habit Tracker</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <a class="back" href="/">&larr; Back to Dashboard</a>
    <h1>{{NAME}}</h1>

    <section>
      <h2>Description</h2>
      <form method="post" action="/habits/{{ID}}/description">
        <textarea name="description" rows="4" onblur="if (this.value !== this.defaultValue) this.form.submit()">{{DESCRIPTION}}</textarea>
      </form>
    </section>

    <section>
      <h2>30-Day Progress</h2>
      {{CHART}}
    </section>

    <section>
      <h2>Stats</h2>
      <div class="stats">
        <div class="stat"><span>Current streak</span><strong>{{CURRENT}}</strong></div>
        <div class="stat"><span>Longest streak</span><strong>{{LONGEST}}</strong></div>
        <div class="stat"><span>Completion rate</span><strong>{{RATE}}</strong></div>
      </div>
    </section>
  </main>
</body>
</html>
"#;

const NOT_FOUND_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Habit not found</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <a class="back" href="/">&larr; Back to Dashboard</a>
    <p>Habit not found</p>
  </main>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Habit;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn habit(name: &str, dates: &[&str]) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            name: name.into(),
            points: 2,
            completed_dates: dates.iter().map(|d| d.to_string()).collect(),
            description: "<b>bold</b>".into(),
        }
    }

    #[test]
    fn escape_html_handles_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn dashboard_lists_habits_and_week() {
        let dashboard = Dashboard::new(
            vec![habit("Read <daily>", &["2024-06-04"])],
            today(),
        );
        let html = render_dashboard(&dashboard);

        assert!(html.contains("Read &lt;daily&gt;"));
        assert!(!html.contains("Read <daily>"));
        assert!(html.contains("Mon Jun 3"));
        assert!(html.contains("Sun Jun 9"));
        assert!(html.contains("value=\"2024-06-04\""));
        assert!(html.contains("check done"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn empty_dashboard_has_placeholder_row() {
        let html = render_dashboard(&Dashboard::new(Vec::new(), today()));
        assert!(html.contains("No habits yet"));
        assert!(html.contains("Nothing completed yet."));
    }

    #[test]
    fn detail_page_shows_stats() {
        let mut dashboard = Dashboard::new(
            vec![habit("Run", &["2024-06-02", "2024-06-03"])],
            today(),
        );
        dashboard.open_detail(0);
        let html = render_detail(&dashboard, today());

        assert!(html.contains("<h1>Run</h1>"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("<strong>2</strong>"));
        assert!(html.contains("<svg"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn user_text_with_template_tokens_is_kept_verbatim() {
        let mut named = habit("{{DESCRIPTION}} {{CHART}}", &[]);
        named.description = "goal: {{CURRENT}} days".into();
        let mut dashboard = Dashboard::new(vec![named], today());

        let board = render_dashboard(&dashboard);
        assert!(board.contains("value=\"{{DESCRIPTION}} {{CHART}}\""));

        dashboard.open_detail(0);
        let html = render_detail(&dashboard, today());
        assert!(html.contains(">goal: {{CURRENT}} days</textarea>"));
        assert!(html.contains("<h1>{{DESCRIPTION}} {{CHART}}</h1>"));
        assert!(html.contains("<strong>0</strong>"));
    }

    #[test]
    fn fill_leaves_unknown_and_unterminated_tokens() {
        assert_eq!(fill("a {{X}} {{Y}} {{Z", &[("X", "1")]), "a 1 {{Y}} {{Z");
    }

    #[test]
    fn dashboard_header_shows_week_start() {
        let html = render_dashboard(&Dashboard::new(Vec::new(), today()));
        assert!(html.contains("Week of Jun 3, 2024"));
    }

    #[test]
    fn detail_without_selection_is_not_found() {
        let dashboard = Dashboard::new(vec![habit("Run", &[])], today());
        assert!(render_detail(&dashboard, today()).contains("Habit not found"));
    }

    #[test]
    fn chart_plots_every_point() {
        let points = vec![("2024-01-01".to_string(), 5.0), ("2024-01-02".to_string(), 3.0)];
        let svg = line_chart(&points, false);
        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains("2024-01-01: 5"));
    }
}
