//! Canonical HTML bodies for error and redirect responses.

/// Escape the five characters that matter inside HTML text and attribute
/// values: `&`, `<`, `>`, `"`, `'`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// The body of a generic error response: a fixed shell around the escaped
/// `"{status} {message}"` line, with no reference to the underlying file or
/// path.
pub fn error_page(status: http::StatusCode, message: &str) -> String {
    let line = format!("{} {}", status.as_u16(), message);
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Error</title>\n</head>\n<body>\n<pre>{}</pre>\n</body>\n</html>\n",
        escape_html(&line),
    )
}

/// The body of a `301`/`308` redirect response.
pub fn redirect_page(location: &str) -> String {
    let escaped = escape_html(location);
    format!("Redirecting to <a href=\"{escaped}\">{escaped}</a>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_characters() {
        assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn error_page_contains_status_and_message() {
        let page = error_page(http::StatusCode::NOT_FOUND, "Not Found");
        assert!(page.contains("<pre>404 Not Found</pre>"));
    }

    #[test]
    fn redirect_page_escapes_location() {
        let page = redirect_page("/a&b/");
        assert_eq!(page, "Redirecting to <a href=\"/a&amp;b/\">/a&amp;b/</a>");
    }
}
