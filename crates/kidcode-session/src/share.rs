//! Share links: a program document packed into a URL fragment.
//!
//! `<base>#code=<payload>` where the payload is the document's canonical
//! JSON in URL-safe base64 without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use kidcode_graph::PortableDocument;
use kidcode_types::BlockError;

pub const FRAGMENT: &str = "#code=";

pub fn encode_link(base_url: &str, doc: &PortableDocument) -> String {
    let payload = URL_SAFE_NO_PAD.encode(doc.to_json().as_bytes());
    format!("{base_url}{FRAGMENT}{payload}")
}

/// Read the document out of a share link. Anything after the payload
/// (another `#` or `&` parameter) is ignored.
pub fn decode_link(link: &str) -> Result<PortableDocument, BlockError> {
    let start = link
        .find(FRAGMENT)
        .ok_or_else(|| BlockError::malformed("share link has no #code= fragment"))?;
    let payload = &link[start + FRAGMENT.len()..];
    let payload = payload
        .split(['&', '#'])
        .next()
        .unwrap_or_default();
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| BlockError::malformed(format!("share link payload is not base64: {e}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| BlockError::malformed("share link payload is not UTF-8"))?;
    PortableDocument::from_json(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidcode_graph::{to_portable, ProgramGraph};
    use kidcode_registry::BlockRegistry;
    use kidcode_types::ErrorKind;

    fn document() -> PortableDocument {
        let reg = BlockRegistry::builtin();
        let mut g = ProgramGraph::new();
        let a = g.insert_block(&reg, "say_hello").unwrap();
        let b = g.insert_block(&reg, "play_sound").unwrap();
        g.connect_statement(&reg, a, b).unwrap();
        to_portable(&g)
    }

    #[test]
    fn link_round_trip() {
        let doc = document();
        let link = encode_link("https://example.org/kidcode/", &doc);
        assert!(link.starts_with("https://example.org/kidcode/#code="));
        assert!(!link.ends_with('='));
        assert_eq!(decode_link(&link).unwrap(), doc);
    }

    #[test]
    fn payload_is_url_safe() {
        let link = encode_link("", &document());
        let payload = &link[FRAGMENT.len()..];
        assert!(payload
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn trailing_parameters_ignored() {
        let doc = document();
        let link = format!("{}&lang=en", encode_link("x", &doc));
        assert_eq!(decode_link(&link).unwrap(), doc);
    }

    #[test]
    fn bad_links_are_malformed() {
        for link in ["https://example.org/", "x#code=!!!", "x#code=bm90IGpzb24"] {
            let err = decode_link(link).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MalformedDocument, "{link}");
        }
    }
}
