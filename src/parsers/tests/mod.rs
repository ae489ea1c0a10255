use crate::parsers::{html, is_html};

#[test]
fn test_anchors_in_document_order() {
    let page = r#"<html><body>
        <a href="http://a">A</a>
        <p><a href="/relative">rel</a></p>
        <a href="https://b">B</a>
        <a href="ftp://c">C</a>
    </body></html>"#;

    assert_eq!(
        html::anchors(page),
        vec!["http://a", "/relative", "https://b", "ftp://c"]
    );
}

#[test]
fn test_duplicates_are_kept() {
    let page = r#"<a href="http://a">1</a><a href="http://a">2</a>"#;
    assert_eq!(html::anchors(page), vec!["http://a", "http://a"]);
}

#[test]
fn test_anchor_without_href_is_ignored() {
    let page = r#"<a name="top">top</a><a href="">empty</a><a href="::bad::">bad</a>"#;
    assert_eq!(html::anchors(page), vec!["", "::bad::"]);
}

#[test]
fn test_empty_document_has_no_anchors() {
    assert!(html::anchors("").is_empty());
}

#[test]
fn test_is_html() {
    assert!(is_html(None));
    assert!(is_html(Some("text/html; charset=utf-8")));
    assert!(is_html(Some("application/xhtml+xml")));
    assert!(!is_html(Some("application/json")));
    assert!(!is_html(Some("image/png")));
}
