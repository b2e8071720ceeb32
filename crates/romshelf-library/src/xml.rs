//! Minimal tag extraction for NFO sidecars and GameStream replies
//!
//! Both formats are flat and machine-written, so a full XML parser is not
//! needed: we only pull the text of known elements.

/// Text of the first `<tag>...</tag>` element, entity-decoded and trimmed
pub fn extract_tag(doc: &str, tag: &str) -> Option<String> {
    let open_tag = format!("<{}>", tag);
    let close_tag = format!("</{}>", tag);

    let start = doc.find(&open_tag)? + open_tag.len();
    let end = start + doc[start..].find(&close_tag)?;
    let value = decode_entities(doc[start..end].trim());

    if value.is_empty() { None } else { Some(value) }
}

/// Inner text of every `<tag>...</tag>` block, in document order
pub fn extract_blocks<'a>(doc: &'a str, tag: &str) -> Vec<&'a str> {
    let open_tag = format!("<{}>", tag);
    let close_tag = format!("</{}>", tag);

    let mut blocks = Vec::new();
    let mut rest = doc;
    while let Some(open) = rest.find(&open_tag) {
        let start = open + open_tag.len();
        let Some(len) = rest[start..].find(&close_tag) else {
            break;
        };
        blocks.push(&rest[start..start + len]);
        rest = &rest[start + len + close_tag.len()..];
    }
    blocks
}

/// Value of `attr="..."` on the first `<tag ...>` element
pub fn extract_attribute(doc: &str, tag: &str, attr: &str) -> Option<String> {
    let open = doc.find(&format!("<{}", tag))?;
    let end = open + doc[open..].find('>')?;
    let element = &doc[open..end];

    let key = format!("{}=\"", attr);
    let start = element.find(&key)? + key.len();
    let len = element[start..].find('"')?;
    Some(decode_entities(&element[start..start + len]))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tag() {
        assert_eq!(
            extract_tag("<title>Test Game</title>", "title"),
            Some("Test Game".to_string())
        );
        assert_eq!(extract_tag("<other>value</other>", "title"), None);
        assert_eq!(extract_tag("<title>  </title>", "title"), None);
        assert_eq!(
            extract_tag("<plot>Line one\nline &amp; two</plot>", "plot"),
            Some("Line one\nline & two".to_string())
        );
    }

    #[test]
    fn test_extract_blocks() {
        let doc = "<root><App><ID>1</ID></App><App><ID>2</ID></App></root>";
        let blocks = extract_blocks(doc, "App");
        assert_eq!(blocks, vec!["<ID>1</ID>", "<ID>2</ID>"]);
    }

    #[test]
    fn test_extract_attribute() {
        let doc = r#"<?xml version="1.0"?><root status_code="401" status_message="The client is not authorized">"#;
        assert_eq!(extract_attribute(doc, "root", "status_code"), Some("401".to_string()));
        assert_eq!(extract_attribute(doc, "root", "missing"), None);
    }
}
