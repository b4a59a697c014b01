/// Formats a page title and URL as a Markdown link.
///
/// Both parts are taken verbatim; Markdown special characters in the title
/// are deliberately not escaped.
pub fn markdown_link(title: &str, url: &str) -> String {
    format!("[{title}]({url})")
}
