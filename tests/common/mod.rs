// Builders for small in-memory PDFs used across the integration tests.
#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

/// A packet with plain (non-container) properties so every value lands on a
/// leaf element.
pub fn xmp_packet(creator: &str, title: &str) -> String {
    format!(
        r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:xmp="http://ns.adobe.com/xap/1.0/"
        xmlns:pdf="http://ns.adobe.com/pdf/1.3/">
      <dc:creator>{creator}</dc:creator>
      <dc:title>{title}</dc:title>
      <xmp:CreatorTool>Test Writer 1.0</xmp:CreatorTool>
      <pdf:Producer>lopdf</pdf:Producer>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
{padding}
<?xpacket end="w"?>"#,
        padding = " ".repeat(2048)
    )
}

/// A packet cut off in the middle of an element.
pub fn truncated_xmp_packet() -> String {
    let packet = xmp_packet("Alice", "Report");
    let cut = packet.find("<xmp:CreatorTool>").unwrap_or(packet.len() / 2) + 6;
    packet[..cut].to_string()
}

#[derive(Debug, Clone, Default)]
pub struct PdfFixture {
    pub pages: usize,
    pub xmp: Option<String>,
    pub compress_xmp: bool,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl PdfFixture {
    pub fn pages(pages: usize) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn with_xmp(mut self, packet: impl Into<String>) -> Self {
        self.xmp = Some(packet.into());
        self
    }

    pub fn compressed(mut self) -> Self {
        self.compress_xmp = true;
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for n in 1..=self.pages {
            let content = format!("BT /F1 24 Tf 72 720 Td (Page {n}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.pages as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if let Some(packet) = &self.xmp {
            let mut stream = Stream::new(
                dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
                packet.clone().into_bytes(),
            );
            if self.compress_xmp {
                stream.compress().expect("compress XMP stream");
            }
            let metadata_id = doc.add_object(stream);
            catalog.set("Metadata", metadata_id);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        if self.title.is_some() || self.author.is_some() {
            let mut info = dictionary! {};
            if let Some(title) = &self.title {
                info.set("Title", Object::string_literal(title.as_str()));
            }
            if let Some(author) = &self.author {
                info.set("Author", Object::string_literal(author.as_str()));
            }
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("serialize fixture PDF");
        buf
    }

    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).expect("write fixture PDF");
        path
    }
}
