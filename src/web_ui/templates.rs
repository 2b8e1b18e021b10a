//! Template engine setup and HTML templates.

use once_cell::sync::Lazy;
use tera::{Context, Tera};

/// Global template engine instance with embedded templates.
pub static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();

    if let Err(e) = tera.add_raw_templates(vec![
        ("base.html", BASE_TEMPLATE),
        ("index.html", INDEX_TEMPLATE),
        ("table.html", TABLE_TEMPLATE),
        ("reports.html", REPORTS_TEMPLATE),
        ("error.html", ERROR_TEMPLATE),
    ]) {
        // Rendering then fails per request with a template-not-found error
        tracing::error!("Failed to load templates: {:?}", e);
    }

    tera
});

/// Render a template with context
pub fn render(template: &str, context: &Context) -> Result<String, tera::Error> {
    TEMPLATES.render(template, context)
}

// =============================================================================
// Embedded Templates
// =============================================================================

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}Food Wastage Management{% endblock %}</title>
    <style>
        :root {
            --bg: #f7f7f2;
            --panel: #ffffff;
            --ink: #1d2a1f;
            --ink-muted: #5b6b5e;
            --line: #dde3d8;
            --accent: #2f7d4a;
        }

        * { box-sizing: border-box; margin: 0; padding: 0; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
            background: var(--bg);
            color: var(--ink);
            line-height: 1.5;
        }

        a { color: var(--accent); text-decoration: none; }
        a:hover { text-decoration: underline; }

        .header {
            background: var(--panel);
            border-bottom: 1px solid var(--line);
            padding: 16px 32px;
            display: flex;
            align-items: center;
            gap: 32px;
        }
        .logo { font-weight: 700; color: var(--ink); }
        .nav { display: flex; gap: 20px; font-size: 14px; }

        .container { max-width: 1280px; margin: 0 auto; padding: 32px; }

        h1 { font-size: 26px; margin-bottom: 24px; }
        h2 { font-size: 16px; margin: 32px 0 12px; }

        .stats { display: flex; flex-wrap: wrap; gap: 16px; }
        .stat {
            background: var(--panel);
            border: 1px solid var(--line);
            border-radius: 10px;
            padding: 16px 24px;
            min-width: 180px;
        }
        .stat-value { font-size: 30px; font-weight: 600; }
        .stat-label { color: var(--ink-muted); font-size: 13px; }

        .panel {
            background: var(--panel);
            border: 1px solid var(--line);
            border-radius: 10px;
            overflow-x: auto;
        }

        table { border-collapse: collapse; width: 100%; font-size: 13px; }
        th, td { padding: 8px 12px; border-bottom: 1px solid var(--line); text-align: left; }
        th { background: #eef2ea; font-weight: 600; }
        tr:last-child td { border-bottom: none; }

        form.filters { display: flex; flex-wrap: wrap; gap: 12px; align-items: end; margin-bottom: 16px; }
        form.filters label { display: flex; flex-direction: column; font-size: 12px; color: var(--ink-muted); }
        select, input, button { font: inherit; padding: 6px 10px; border: 1px solid var(--line); border-radius: 6px; }
        button { background: var(--accent); color: #fff; border: none; cursor: pointer; }

        pre {
            font-family: 'SF Mono', Menlo, Consolas, monospace;
            font-size: 12px;
            background: #f0f3ec;
            padding: 12px;
            border-radius: 6px;
            margin-bottom: 12px;
            white-space: pre-wrap;
        }

        .report { padding: 16px; }
        .empty { padding: 32px; text-align: center; color: var(--ink-muted); }
        .muted { color: var(--ink-muted); font-size: 13px; }
        .mt { margin-top: 16px; }
    </style>
</head>
<body>
    <header class="header">
        <a href="/" class="logo">Food Wastage Management</a>
        <nav class="nav">
            {% for t in nav_tables %}
            <a href="/ui/tables/{{ t }}">{{ t }}</a>
            {% endfor %}
            <a href="/ui/claims">Claim details</a>
            <a href="/ui/reports">Reports</a>
        </nav>
    </header>
    <main class="container">
        {% block content %}{% endblock %}
    </main>
</body>
</html>"##;

const INDEX_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block content %}
<h1>Dashboard</h1>

<div class="stats">
    <div class="stat">
        <div class="stat-value">{{ dashboard.providers }}</div>
        <div class="stat-label">Providers</div>
    </div>
    <div class="stat">
        <div class="stat-value">{{ dashboard.receivers }}</div>
        <div class="stat-label">Receivers</div>
    </div>
    <div class="stat">
        <div class="stat-value">{{ dashboard.food_listings }}</div>
        <div class="stat-label">Food listings</div>
    </div>
    <div class="stat">
        <div class="stat-value">{{ dashboard.claims }}</div>
        <div class="stat-label">Claims</div>
    </div>
</div>

<h2>{% if filtered %}Matching listings{% else %}Recent listings{% endif %}</h2>
<form class="filters" method="get" action="/">
    <label>Location
        <select name="location">
            <option value="">All</option>
            {% for loc in dashboard.locations %}
            <option value="{{ loc }}" {% if loc == selected_location %}selected{% endif %}>{{ loc }}</option>
            {% endfor %}
        </select>
    </label>
    <label>Food type
        <select name="food_type">
            <option value="">All</option>
            {% for ft in dashboard.food_types %}
            <option value="{{ ft }}" {% if ft == selected_food_type %}selected{% endif %}>{{ ft }}</option>
            {% endfor %}
        </select>
    </label>
    <button type="submit">Filter</button>
</form>

<div class="panel">
    {% if listings %}
    <table>
        <tr>
            <th>Food_ID</th><th>Food_Name</th><th>Quantity</th><th>Expiry_Date</th>
            <th>Provider_ID</th><th>Provider_Type</th><th>Location</th><th>Food_Type</th><th>Meal_Type</th>
        </tr>
        {% for l in listings %}
        <tr>
            <td>{{ l.Food_ID }}</td><td>{{ l.Food_Name }}</td><td>{{ l.Quantity }}</td><td>{{ l.Expiry_Date }}</td>
            <td>{{ l.Provider_ID }}</td><td>{{ l.Provider_Type }}</td><td>{{ l.Location }}</td>
            <td>{{ l.Food_Type }}</td><td>{{ l.Meal_Type }}</td>
        </tr>
        {% endfor %}
    </table>
    {% else %}
    <div class="empty">No food listings</div>
    {% endif %}
</div>
{% endblock %}"##;

const TABLE_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}{{ table_name }} - Food Wastage Management{% endblock %}
{% block content %}
<h1>{{ table_name }}</h1>
<p class="muted">{{ result.rows | length }} rows</p>

<div class="panel mt">
    {% if result.rows %}
    <table>
        <tr>
            {% for column in result.columns %}<th>{{ column }}</th>{% endfor %}
        </tr>
        {% for row in result.rows %}
        <tr>
            {% for cell in row %}<td>{{ cell }}</td>{% endfor %}
        </tr>
        {% endfor %}
    </table>
    {% else %}
    <div class="empty">{{ table_name }} is empty</div>
    {% endif %}
</div>
{% endblock %}"##;

const REPORTS_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Reports - Food Wastage Management{% endblock %}
{% block content %}
<h1>Reports</h1>

{% for entry in reports %}
<h2>{{ loop.index }}. {{ entry.title }}</h2>
<div class="panel report">
    <pre>{{ entry.sql }}</pre>
    {% if entry.param %}
    <form class="filters" method="get" action="/ui/reports">
        <label>{{ entry.param.name }}
            <input name="{{ entry.param.name }}" value="{{ entry.param_value }}">
        </label>
        <button type="submit">Run</button>
    </form>
    {% endif %}
    {% if entry.result.rows %}
    <table>
        <tr>
            {% for column in entry.result.columns %}<th>{{ column }}</th>{% endfor %}
        </tr>
        {% for row in entry.result.rows %}
        <tr>
            {% for cell in row %}<td>{{ cell }}</td>{% endfor %}
        </tr>
        {% endfor %}
    </table>
    {% else %}
    <div class="empty">No rows</div>
    {% endif %}
</div>
{% endfor %}
{% endblock %}"##;

const ERROR_TEMPLATE: &str = r##"{% extends "base.html" %}
{% block title %}Error - Food Wastage Management{% endblock %}
{% block content %}
<div class="panel">
    <div class="empty">
        <h1>Something went wrong</h1>
        <p>{{ message }}</p>
        <p class="mt"><a href="/">Back to the dashboard</a></p>
    </div>
</div>
{% endblock %}"##;

#[cfg(test)]
mod tests {
    use super::*;

    fn base_context() -> Context {
        let mut context = Context::new();
        context.insert("nav_tables", &["Providers", "Claims"]);
        context
    }

    #[test]
    fn test_all_templates_load() {
        for name in ["base.html", "index.html", "table.html", "reports.html", "error.html"] {
            assert!(TEMPLATES.get_template_names().any(|t| t == name), "{}", name);
        }
    }

    #[test]
    fn test_error_page_escapes_message() {
        let mut context = base_context();
        context.insert("message", "<b>Unknown table</b>");

        let html = render("error.html", &context).unwrap();
        assert!(html.contains("&lt;b&gt;Unknown table&lt;&#x2F;b&gt;"));
        assert!(html.contains(r#"href="/ui/tables/Claims""#));
    }

    #[test]
    fn test_table_page_renders_nulls_as_blank() {
        let mut context = base_context();
        context.insert("table_name", "Receivers");
        context.insert(
            "result",
            &serde_json::json!({
                "columns": ["Receiver_ID", "Name"],
                "rows": [[1, null]],
            }),
        );

        let html = render("table.html", &context).unwrap();
        assert!(html.contains("<th>Receiver_ID</th>"));
        assert!(html.contains("<td>1</td><td></td>"));
    }
}
