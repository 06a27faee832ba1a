//! Highlighted, HTML-safe rendering of the shared state.
//!
//! The state is pretty-printed as JSON, HTML-escaped, and every
//! `"key": value` line gets its key and value wrapped in spans so the
//! page can colour them. Output is a pure function of the state.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static KEY_VALUE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^(?P<space>\s*)(?P<key>&quot;.*&quot;?):\s*(?P<value>&quot;?[^\[{]*?&quot;|[^\[{]*?)(?P<tail>[,\[{]?)$"#,
    )
    .expect("highlight pattern is valid")
});

static HIGHLIGHT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"</?span[^>]*>"#).expect("tag pattern is valid"));

/// Render `state` as highlighted HTML.
pub fn render_highlighted<T: Serialize + ?Sized>(state: &T) -> Result<String, serde_json::Error> {
    let pretty = serde_json::to_string_pretty(state)?;
    let escaped = htmlescape::encode_minimal(&pretty);
    Ok(KEY_VALUE_LINE
        .replace_all(
            &escaped,
            r#"${space}<span class="key">${key}</span>: <span class="value">${value}</span>${tail}"#,
        )
        .into_owned())
}

/// Reverse [`render_highlighted`]: drop the spans and unescape, yielding the
/// pretty-printed JSON text.
pub fn strip_highlighting(rendered: &str) -> String {
    let plain = HIGHLIGHT_TAG.replace_all(rendered, "");
    match htmlescape::decode_html(&plain) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!(error = ?e, "Snapshot contained an undecodable entity");
            plain.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample() -> Value {
        json!({
            "users": [
                { "username": "alfred", "name": "Dr Alfredo" },
                { "username": "barnie", "name": "Barnibarno" }
            ],
            "topics": [{
                "title": "<b>bold</b> & \"quoted\"",
                "user": "alfred",
                "id": 1,
                "posts": [{ "text": "It's $5", "user": "barnie" }]
            }]
        })
    }

    #[test]
    fn test_wraps_keys_and_values() {
        let rendered = render_highlighted(&json!({ "id": 7, "name": "x" })).unwrap();
        assert!(rendered.contains(r#"<span class="key">&quot;id&quot;</span>: <span class="value">7</span>,"#));
        assert!(rendered.contains(r#"<span class="key">&quot;name&quot;</span>: <span class="value">&quot;x&quot;</span>"#));
    }

    #[test]
    fn test_escapes_markup_in_values() {
        let rendered = render_highlighted(&sample()).unwrap();
        assert!(!rendered.contains("<b>"));
        assert!(rendered.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn test_container_keys_keep_their_opening_bracket() {
        let rendered = render_highlighted(&json!({ "users": [1] })).unwrap();
        assert!(rendered.contains(r#"<span class="key">&quot;users&quot;</span>: <span class="value"></span>["#));
    }

    #[test]
    fn test_round_trip_reproduces_state() {
        let state = sample();
        let rendered = render_highlighted(&state).unwrap();
        let restored: Value = serde_json::from_str(&strip_highlighting(&rendered)).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let state = sample();
        assert_eq!(render_highlighted(&state).unwrap(), render_highlighted(&state).unwrap());
    }
}
