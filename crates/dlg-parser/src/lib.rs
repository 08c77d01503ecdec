mod xml;

pub use xml::{parse_xml_document, XmlDocument, XmlElementNode};
