//! HTML index page listing the API routes and the live dataset.

use htmlescape::encode_minimal;

use crate::broadcast::render_highlighted;
use crate::forum::model::Database;
use crate::routing::{RequiredField, RouteInfo};

/// Human-readable endpoint for a route pattern: anchors dropped, `(\d+)`
/// shown as `{id}` and `(\w+)` as `{user}`.
pub fn endpoint_path(pattern: &str) -> String {
    let path = pattern.strip_prefix('^').unwrap_or(pattern);
    let path = path
        .strip_suffix("/?$")
        .or_else(|| path.strip_suffix('$'))
        .unwrap_or(path);
    path.replace(r"(\d+)", "{id}").replace(r"(\w+)", "{user}")
}

/// A clickable example for an endpoint path.
pub fn example_url(path: &str, db: &Database) -> String {
    let url = path.replace("{id}", "1");
    match db.users.first() {
        Some(user) => url.replace("{user}", &user.username),
        None => url,
    }
}

fn emphasize_placeholders(path: &str) -> String {
    path.replace("{id}", "<em>id</em>")
        .replace("{user}", "<em>user</em>")
}

fn field_list(fields: Option<&[RequiredField]>) -> String {
    let Some(fields) = fields else {
        return String::new();
    };
    let items: Vec<String> = fields
        .iter()
        .map(|f| {
            format!(
                "<dt>{}</dt><dd>{}</dd>",
                encode_minimal(&f.name),
                encode_minimal(&f.description)
            )
        })
        .collect();
    format!("<dl>{}</dl>", items.join("\n"))
}

fn route_row(route: &RouteInfo, db: &Database) -> Option<String> {
    let path = endpoint_path(&route.pattern);
    if !path.starts_with("/api") {
        return None;
    }
    let example = encode_minimal(&example_url(&path, db));
    Some(format!(
        r#"<tr>
    <td class="method method-{method}">{method}</td>
    <td class="endpoint">{endpoint}</td>
    <td class="example"><a href="{example}">{example}</a></td>
    <td class="params">{params}</td>
</tr>"#,
        method = route.method,
        endpoint = emphasize_placeholders(&encode_minimal(&path)),
        params = field_list(route.required_fields.as_deref()),
    ))
}

/// Render the index page.
pub fn render_index<'a>(routes: impl Iterator<Item = &'a RouteInfo>, db: &Database) -> String {
    let rows: Vec<String> = routes.filter_map(|route| route_row(route, db)).collect();
    let contents = render_highlighted(db).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to render dataset for index page");
        String::new()
    });

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Forum API</title>
<link rel="stylesheet" href="style.css">
<script src="/update.js" defer></script>
</head>
<body>
<h1>Forum API</h1>
<div class="content">
<div id="endpoints">
<h3>API endpoints</h3>
<p>URL components shown in bold are placeholders; replace them with your own
values as in the example column.</p>
<table>
<tr>
    <th>Method</th>
    <th>Endpoint</th>
    <th>Example</th>
    <th>Required JSON parameters</th>
</tr>
{rows}
</table>
</div>
<div id="contents">
<h3>Current contents of database</h3>
<pre id="database_contents">{contents}</pre>
</div>
</div>
</body>
</html>
"#,
        rows = rows.join("\n"),
    )
}
