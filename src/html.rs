//! Standalone HTML viewer around a Mermaid diagram.

use std::fmt::Write;

use crate::theme::Theme;

const MERMAID_CDN: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.esm.min.mjs";

/// Build a viewer page. Mermaid picks up the `pre.mermaid` block on load.
pub fn render(diagram: &str, theme: Theme) -> String {
    let mut html = String::new();

    writeln!(&mut html, "<!DOCTYPE html>").unwrap();
    writeln!(&mut html, r#"<html lang="en">"#).unwrap();
    writeln!(
        &mut html,
        r#"<head>
  <meta charset="utf-8">
  <title>ER Diagram</title>
  <style>
    body {{ font-family: sans-serif; margin: 2rem; }}
    .mermaid {{ display: flex; justify-content: center; }}
  </style>
</head>"#
    )
    .unwrap();
    writeln!(&mut html, "<body>").unwrap();

    writeln!(&mut html, r#"<pre class="mermaid">"#).unwrap();
    html.push_str(&escape(diagram));
    if !diagram.ends_with('\n') {
        html.push('\n');
    }
    writeln!(&mut html, "</pre>").unwrap();

    writeln!(
        &mut html,
        r#"<script type="module">
  import mermaid from '{}';
  mermaid.initialize({{ startOnLoad: true, theme: '{}' }});
</script>"#,
        MERMAID_CDN,
        theme.name()
    )
    .unwrap();
    writeln!(&mut html, "</body>").unwrap();
    writeln!(&mut html, "</html>").unwrap();

    html
}

/// Escape text content. `>` is legal in text, so relationship labels such
/// as `user_id > id` stay readable in the source.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_structure() {
        let html = render("erDiagram\n    users {\n    }\n", Theme::Forest);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("mermaid.initialize({ startOnLoad: true, theme: 'forest' })"));
        assert!(html.contains("<pre class=\"mermaid\">\nerDiagram\n    users {\n    }\n</pre>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_many_to_one_label_kept_literal() {
        let diagram = "erDiagram\n    posts }o--|| users : \"user_id > id\"";
        let html = render(diagram, Theme::Default);
        assert!(html.contains(&format!("<pre class=\"mermaid\">\n{}\n</pre>", diagram)));
    }

    #[test]
    fn test_markup_in_names_is_escaped() {
        let html = render(
            "erDiagram\n    \"a</b\" {\n    }\n    a ||--o{ b : \"x < y & z\"\n",
            Theme::Default,
        );
        assert!(html.contains("    \"a&lt;/b\" {\n"));
        assert!(html.contains(": \"x &lt; y &amp; z\"\n</pre>"));
        assert!(!html.contains("a</b"));
        assert_eq!(html.matches("</pre>").count(), 1);
    }
}
