// ABOUTME: Synthesizes the SMIL presentation document placed first in every MMS body
// ABOUTME: Groups parts into 8 second <par> slides and serializes them as compact XML

use crate::datatypes::{PduBody, PduPart};
use std::fmt::Write;
use tracing::warn;

/// Content type of the presentation part
pub const SMIL_CONTENT_TYPE: &str = "application/smil";
/// Content-ID of the presentation part
pub const SMIL_CONTENT_ID: &str = "smil";
/// Content-Location of the presentation part
pub const SMIL_CONTENT_LOCATION: &str = "smil.xml";

const SMIL_NAMESPACE: &str = "http://www.w3.org/2001/SMIL20/Language";
const SLIDE_DURATION: &str = "8000ms";

/// One element of the document tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmilElement {
    tag: &'static str,
    attributes: Vec<(&'static str, String)>,
    children: Vec<SmilElement>,
}

impl SmilElement {
    fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn with_attribute(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    fn with_child(mut self, child: SmilElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag(&self) -> &str {
        self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[SmilElement] {
        &self.children
    }

    fn write_to(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {}=\"{}\"", name, escape_attribute(value));
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in &self.children {
            child.write_to(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

/// What kind of slot a part occupies inside a `<par>`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Slot {
    Text,
    Media,
}

/// Map a part content type to its SMIL element, `None` when it cannot be presented
fn element_for(content_type: &str) -> Option<(&'static str, Slot)> {
    let lower = content_type.to_ascii_lowercase();
    match lower.as_str() {
        "text/plain" | "text/html" | "application/xhtml+xml" => Some(("text", Slot::Text)),
        "text/x-vcard" => Some(("ref", Slot::Media)),
        _ if lower.starts_with("image/") => Some(("img", Slot::Media)),
        _ if lower.starts_with("video/") => Some(("video", Slot::Media)),
        _ if lower.starts_with("audio/") => Some(("audio", Slot::Media)),
        _ => None,
    }
}

/// A `<smil>` presentation document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmilDocument {
    root: SmilElement,
}

impl SmilDocument {
    /// Lay out every presentable part of `body`, in body order.
    ///
    /// A new `<par>` starts once the current one holds both a text and a
    /// media element.
    pub fn from_body(body: &PduBody) -> Self {
        let mut slides: Vec<SmilElement> = Vec::new();
        let mut has_text = false;
        let mut has_media = false;

        for part in body.parts() {
            if slides.is_empty() || (has_text && has_media) {
                slides.push(SmilElement::new("par").with_attribute("dur", SLIDE_DURATION));
                has_text = false;
                has_media = false;
            }

            let content_type = part.content_type_str();
            let Some((tag, slot)) = element_for(content_type) else {
                warn!(content_type, "Skipping part with unsupported content type in SMIL");
                continue;
            };

            if let Some(slide) = slides.last_mut() {
                slide.children.push(media_element(tag, part));
            }
            match slot {
                Slot::Text => has_text = true,
                Slot::Media => has_media = true,
            }
        }

        let body = slides
            .into_iter()
            .fold(SmilElement::new("body"), SmilElement::with_child);

        let root = SmilElement::new("smil")
            .with_attribute("xmlns", SMIL_NAMESPACE)
            .with_child(SmilElement::new("head").with_child(SmilElement::new("layout")))
            .with_child(body);

        Self { root }
    }

    pub fn root(&self) -> &SmilElement {
        &self.root
    }

    /// `<par>` elements in presentation order
    pub fn slides(&self) -> &[SmilElement] {
        self.root
            .children
            .iter()
            .find(|child| child.tag == "body")
            .map(|body| body.children.as_slice())
            .unwrap_or_default()
    }

    /// Serialize as compact XML without a prolog
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out);
        out
    }

    /// Wrap the serialized document in the presentation part
    pub fn into_part(self) -> PduPart {
        PduPart::new(SMIL_CONTENT_TYPE, self.serialize())
            .with_content_id(SMIL_CONTENT_ID)
            .with_content_location(SMIL_CONTENT_LOCATION)
    }
}

fn media_element(tag: &'static str, part: &PduPart) -> SmilElement {
    SmilElement::new(tag).with_attribute("src", part.generate_location())
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
