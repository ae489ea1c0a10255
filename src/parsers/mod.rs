pub mod html;

#[cfg(test)]
mod tests;

/// Whether a response with this content type should be scanned for anchors
///
/// A missing content type is treated as HTML.
pub fn is_html(content_type: Option<&str>) -> bool {
    match content_type {
        None => true,
        Some(value) => {
            let value = value.to_ascii_lowercase();
            value.contains("html")
        }
    }
}
