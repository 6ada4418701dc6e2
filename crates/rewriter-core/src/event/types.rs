use std::fmt;

/// A single name/value attribute on an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Markup events carried through a pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentEvent {
    /// Document is starting
    StartDocument,
    /// Document has ended; no further events follow
    EndDocument,
    /// An element is opening
    StartElement { name: String, attributes: Vec<Attribute> },
    /// An element is closing
    EndElement { name: String },
    /// Character data
    Characters(String),
    /// A comment
    Comment(String),
    /// A processing instruction
    ProcessingInstruction { target: String, data: String },
}

impl ContentEvent {
    /// Create a start-element event
    pub fn start_element(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        ContentEvent::StartElement {
            name: name.into(),
            attributes,
        }
    }

    /// Create an end-element event
    pub fn end_element(name: impl Into<String>) -> Self {
        ContentEvent::EndElement { name: name.into() }
    }

    /// Create a character-data event
    pub fn characters(text: impl Into<String>) -> Self {
        ContentEvent::Characters(text.into())
    }

    /// Stable dotted name of the event kind
    pub fn name(&self) -> &'static str {
        match self {
            ContentEvent::StartDocument => "document.start",
            ContentEvent::EndDocument => "document.end",
            ContentEvent::StartElement { .. } => "element.start",
            ContentEvent::EndElement { .. } => "element.end",
            ContentEvent::Characters(_) => "characters",
            ContentEvent::Comment(_) => "comment",
            ContentEvent::ProcessingInstruction { .. } => "processing-instruction",
        }
    }

    /// Whether this event opens or closes the document
    pub fn is_document_boundary(&self) -> bool {
        matches!(self, ContentEvent::StartDocument | ContentEvent::EndDocument)
    }
}

impl fmt::Display for ContentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentEvent::StartDocument => write!(f, "start-document"),
            ContentEvent::EndDocument => write!(f, "end-document"),
            ContentEvent::StartElement { name, attributes } => {
                write!(f, "start-element {}", name)?;
                for attribute in attributes {
                    write!(f, " {}={:?}", attribute.name, attribute.value)?;
                }
                Ok(())
            }
            ContentEvent::EndElement { name } => write!(f, "end-element {}", name),
            ContentEvent::Characters(text) => write!(f, "characters {:?}", text),
            ContentEvent::Comment(text) => write!(f, "comment {:?}", text),
            ContentEvent::ProcessingInstruction { target, data } => {
                write!(f, "processing-instruction {} {:?}", target, data)
            }
        }
    }
}
