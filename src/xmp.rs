//! XMP packet parsing.
//!
//! An XMP packet is an RDF/XML document. Callers only need a flat view of it,
//! so every element with non-blank text of its own becomes one
//! `local name → trimmed text` pair. Namespace prefixes are dropped, which
//! means `dc:title` and `pdf:title` collide; the later element in document
//! order wins.

use crate::{Result, StripError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use serde::Serialize;
use std::collections::BTreeMap;

/// Key used in the wire mapping when the packet is not well-formed XML.
pub const ERROR_KEY: &str = "error";

/// Value stored under [`ERROR_KEY`] for a malformed packet.
pub const MALFORMED_MESSAGE: &str = "Invalid XMP metadata format";

/// Outcome of reading the XMP packet of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmpMetadata {
    /// The document has no XMP packet, or it could not be read at all.
    Absent,
    /// The packet parsed; may still be empty if no element carries text.
    Parsed(BTreeMap<String, String>),
    /// The packet is present but is not well-formed XML.
    Malformed(String),
}

impl XmpMetadata {
    /// Parse a raw packet into an [`XmpMetadata`].
    pub fn from_packet(xml: &str) -> Self {
        match parse_document(xml) {
            Ok(map) => XmpMetadata::Parsed(map),
            Err(e) => XmpMetadata::Malformed(e.to_string()),
        }
    }

    /// Returns `true` when there is nothing to show to the caller.
    pub fn is_empty(&self) -> bool {
        match self {
            XmpMetadata::Absent => true,
            XmpMetadata::Parsed(map) => map.is_empty(),
            XmpMetadata::Malformed(_) => false,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, XmpMetadata::Malformed(_))
    }

    /// The mapping returned to HTTP clients: `{}` when absent, the parsed
    /// pairs, or a single [`ERROR_KEY`] entry when malformed.
    pub fn to_mapping(&self) -> BTreeMap<String, String> {
        self.clone().into_mapping()
    }

    pub fn into_mapping(self) -> BTreeMap<String, String> {
        match self {
            XmpMetadata::Absent => BTreeMap::new(),
            XmpMetadata::Parsed(map) => map,
            XmpMetadata::Malformed(_) => {
                BTreeMap::from([(ERROR_KEY.to_string(), MALFORMED_MESSAGE.to_string())])
            }
        }
    }
}

impl Serialize for XmpMetadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_mapping().serialize(serializer)
    }
}

// ── Parsing ──────────────────────────────────────────────────────────────────

/// An element that is still open while walking the packet.
struct OpenElement {
    /// Index into the slot list reserved when the element started, so
    /// results keep document (pre-)order even though text is only complete
    /// once the element ends.
    slot: usize,
    name: String,
    text: String,
    /// Set once the first child element starts; text after that point is
    /// tail text of the child, not text of this element.
    text_closed: bool,
}

/// Walk the packet and collect the flattened pairs.
///
/// Returns [`StripError::Xml`] when the document is not well-formed:
/// mismatched or unclosed tags, no root element, several root elements,
/// character data outside the root, broken or duplicated attributes, or a
/// namespace prefix that was never declared.
pub fn parse_document(xml: &str) -> Result<BTreeMap<String, String>> {
    let mut reader = NsReader::from_str(xml);
    reader.trim_text(false);
    reader.check_end_names(true);

    let mut slots: Vec<Option<(String, String)>> = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut roots = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| StripError::Xml(format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(start) => {
                check_element(&reader, &start)?;
                open_child(&mut stack, &mut roots)?;
                slots.push(None);
                stack.push(OpenElement {
                    slot: slots.len() - 1,
                    name: local_name(start.local_name().as_ref()),
                    text: String::new(),
                    text_closed: false,
                });
            }
            Event::Empty(start) => {
                check_element(&reader, &start)?;
                open_child(&mut stack, &mut roots)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| StripError::Xml("unexpected closing tag".into()))?;
                let text = element.text.trim();
                if !text.is_empty() {
                    slots[element.slot] = Some((element.name, text.to_string()));
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| StripError::Xml(e.to_string()))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data);
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            // Declarations, processing instructions (`<?xpacket …?>`),
            // comments and doctypes carry no metadata.
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(StripError::Xml(format!(
            "unexpected end of packet, <{}> is not closed",
            stack[stack.len() - 1].name
        )));
    }
    if roots == 0 {
        return Err(StripError::Xml("packet has no root element".into()));
    }

    Ok(slots.into_iter().flatten().collect())
}

/// Reject start tags whose attributes are not well-formed or whose element or
/// attribute prefixes are not bound to a namespace.
fn check_element(reader: &NsReader<&[u8]>, start: &BytesStart) -> Result<()> {
    if let (ResolveResult::Unknown(prefix), _) = reader.resolve_element(start.name()) {
        return Err(unbound_prefix(&prefix, start.name().as_ref()));
    }

    for attr in start.attributes().with_checks(true) {
        let attr = attr.map_err(|e| {
            StripError::Xml(format!(
                "bad attribute in <{}>: {e}",
                String::from_utf8_lossy(start.name().as_ref())
            ))
        })?;

        // `xmlns`/`xmlns:*` declare bindings; `xml:*` is bound implicitly.
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") || key.starts_with(b"xml:") {
            continue;
        }
        if let (ResolveResult::Unknown(prefix), _) = reader.resolve_attribute(attr.key) {
            return Err(unbound_prefix(&prefix, key));
        }
    }
    Ok(())
}

fn unbound_prefix(prefix: &[u8], name: &[u8]) -> StripError {
    StripError::Xml(format!(
        "unbound namespace prefix `{}` in `{}`",
        String::from_utf8_lossy(prefix),
        String::from_utf8_lossy(name)
    ))
}

fn open_child(stack: &mut [OpenElement], roots: &mut usize) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.text_closed = true,
        None => {
            *roots += 1;
            if *roots > 1 {
                return Err(StripError::Xml("more than one root element".into()));
            }
        }
    }
    Ok(())
}

fn push_text(stack: &mut [OpenElement], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(element) if !element.text_closed => element.text.push_str(text),
        Some(_) => {}
        None if text.trim().is_empty() => {}
        None => return Err(StripError::Xml("character data outside the root element".into())),
    }
    Ok(())
}

/// Drop everything up to and including the namespace prefix.
fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about="" xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:xmp="http://ns.adobe.com/xap/1.0/" xmlns:pdf="http://ns.adobe.com/pdf/1.3/">
      <dc:creator>Alice</dc:creator>
      <xmp:CreatorTool>  Writer 7  </xmp:CreatorTool>
      <pdf:Producer>lopdf &amp; friends</pdf:Producer>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    #[test]
    fn flattens_elements_and_strips_prefixes() {
        let map = parse_document(PACKET).unwrap();
        assert_eq!(map.get("creator").map(String::as_str), Some("Alice"));
        assert_eq!(map.get("CreatorTool").map(String::as_str), Some("Writer 7"));
        assert_eq!(map.get("Producer").map(String::as_str), Some("lopdf & friends"));
        assert!(map.keys().all(|k| !k.contains(':')));
        // Containers only hold whitespace.
        assert!(!map.contains_key("RDF"));
        assert!(!map.contains_key("Description"));
    }

    #[test]
    fn later_element_overwrites_earlier_one() {
        let xml = r#"<r xmlns:a="urn:a" xmlns:b="urn:b"><a:title>first</a:title><b:title>second</b:title></r>"#;
        let map = parse_document(xml).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["title"], "second");
    }

    #[test]
    fn parent_is_ordered_before_its_children() {
        // The outer <name> starts first, so the inner one wins.
        let xml = "<r><name>outer<name>inner</name></name></r>";
        let map = parse_document(xml).unwrap();
        assert_eq!(map["name"], "inner");
    }

    #[test]
    fn tail_text_is_not_element_text() {
        let xml = "<r><a><b>x</b> tail </a></r>";
        let map = parse_document(xml).unwrap();
        assert!(!map.contains_key("a"));
        assert_eq!(map["b"], "x");
    }

    #[test]
    fn cdata_counts_as_text() {
        let map = parse_document("<r><note><![CDATA[ <raw> ]]></note></r>").unwrap();
        assert_eq!(map["note"], "<raw>");
    }

    #[test]
    fn truncated_packet_is_malformed() {
        let truncated = &PACKET[..PACKET.len() / 2];
        let meta = XmpMetadata::from_packet(truncated);
        assert!(meta.is_malformed());
        assert_eq!(
            meta.to_mapping(),
            BTreeMap::from([(ERROR_KEY.to_string(), MALFORMED_MESSAGE.to_string())])
        );
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        assert!(parse_document("<a><b>text</a></b>").is_err());
    }

    #[test]
    fn empty_and_rootless_packets_are_malformed() {
        assert!(parse_document("").is_err());
        assert!(parse_document("just text").is_err());
        assert!(parse_document("<a/><b/>").is_err());
    }

    #[test]
    fn attribute_without_value_is_malformed() {
        let xml = r#"<r xmlns:dc="urn:dc"><dc:creator broken>Alice</dc:creator></r>"#;
        assert!(XmpMetadata::from_packet(xml).is_malformed());
    }

    #[test]
    fn duplicated_attribute_is_malformed() {
        let xml = r#"<r><t a="1" a="2">v</t></r>"#;
        assert!(XmpMetadata::from_packet(xml).is_malformed());
    }

    #[test]
    fn undeclared_prefixes_are_malformed() {
        let element = "<r><dc:creator>Alice</dc:creator></r>";
        assert!(XmpMetadata::from_packet(element).is_malformed());

        let attribute = r#"<r><creator rdf:about="">Alice</creator></r>"#;
        assert!(XmpMetadata::from_packet(attribute).is_malformed());

        let empty = "<r><dc:creator/></r>";
        assert!(XmpMetadata::from_packet(empty).is_malformed());
    }

    #[test]
    fn declared_and_reserved_prefixes_parse() {
        let xml = r#"<r xmlns="urn:default" xmlns:dc="urn:dc" xml:lang="en"><dc:creator dc:role="x">Alice</dc:creator></r>"#;
        let map = parse_document(xml).unwrap();
        assert_eq!(map["creator"], "Alice");
    }

    #[test]
    fn absent_maps_to_empty_object() {
        assert!(XmpMetadata::Absent.is_empty());
        assert!(XmpMetadata::Absent.to_mapping().is_empty());
        assert_eq!(serde_json::to_string(&XmpMetadata::Absent).unwrap(), "{}");
    }
}
