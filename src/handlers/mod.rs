//! HTTP handlers for the dashboard pages.

pub mod admin;
pub mod auth;
pub mod dashboard;

/// Minimal escaping for values interpolated into page markup.
pub(crate) fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
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

/// Shared page chrome so every page carries the same shell and nav.
pub(crate) fn render_page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<nav><a href=\"/\">Dashboard</a> | <a href=\"/dashbord_2/\">Overview</a> | <a href=\"/logout/\">Sign out</a></nav>\n{body}\n</body>\n</html>\n",
        title = html_escape(title),
        body = body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            html_escape("<script>\"a\"&'b'</script>"),
            "&lt;script&gt;&quot;a&quot;&amp;&#39;b&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn page_shell_wraps_body() {
        let page = render_page("Home", "<p>hi</p>");
        assert!(page.contains("<title>Home</title>"));
        assert!(page.contains("<p>hi</p>"));
    }
}
