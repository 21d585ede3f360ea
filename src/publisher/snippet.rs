//! Embed snippet generation.
//!
//! Produces the two HTML fragments an operator pastes into their site: a
//! stylesheet link for `<head>` and a tenant-binding loader script for the
//! end of `<body>`. Fragments are whitespace-minified so they survive
//! copy-paste through rich-text surfaces.

/// Asset locations baked into the generated snippets.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetAssets {
    /// URL of the published widget stylesheet
    pub stylesheet_url: String,
    /// URL of the published widget script bundle
    pub script_url: String,
}

/// Collapse newlines and leading indentation.
fn minify(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for (i, line) in code.lines().enumerate() {
        if i == 0 {
            out.push_str(line);
        } else {
            out.push_str(line.trim_start());
        }
    }
    out
}

/// Generate the embed fragments for one tenant.
///
/// The loader script rebinds the durable tenant identifier before pulling
/// the widget bundle, so moving a snippet between sites re-homes the
/// installation cleanly.
pub fn embed_snippets(tenant: &str, assets: &SnippetAssets) -> Vec<String> {
    let head = format!(
        r#"<!-- Copy and paste this code snippet in your website's <head> tag -->
        <link
          rel="stylesheet"
          crossorigin="anonymous"
          referrerpolicy="no-referrer"
          href="{}"
        >"#,
        assets.stylesheet_url
    );

    let body = format!(
        r#"<!-- Copy and paste this code snippet just before your website's </body> tag -->
        <script>
          localStorage.removeItem("tenant_id");
          localStorage.setItem("tenant_id", "{}");
        </script>
        <script
          type="module"
          crossorigin="anonymous"
          referrerpolicy="no-referrer"
          src="{}"
        ></script>"#,
        tenant, assets.script_url
    );

    vec![minify(&head), minify(&body)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assets() -> SnippetAssets {
        SnippetAssets {
            stylesheet_url: "https://cdn.example.com/widget.css".to_string(),
            script_url: "https://cdn.example.com/widget.js".to_string(),
        }
    }

    #[test]
    fn test_two_fragments() {
        let snippets = embed_snippets("t-123", &assets());
        assert_eq!(snippets.len(), 2);
    }

    #[test]
    fn test_fragments_are_minified() {
        for snippet in embed_snippets("t-123", &assets()) {
            assert!(!snippet.contains('\n'));
        }
    }

    #[test]
    fn test_body_fragment_binds_tenant() {
        let snippets = embed_snippets("t-123", &assets());
        assert!(snippets[1].contains(r#"localStorage.setItem("tenant_id", "t-123")"#));
    }

    #[test]
    fn test_fragments_reference_assets() {
        let snippets = embed_snippets("t-123", &assets());
        assert!(snippets[0].contains("widget.css"));
        assert!(snippets[1].contains("widget.js"));
    }

    #[test]
    fn test_minify_keeps_single_line_intact() {
        assert_eq!(minify("<p>one line</p>"), "<p>one line</p>");
    }
}
