pub mod alarms;
pub mod datas;
pub mod historic;
pub mod pool_edit;

use super::Error;
use roxmltree::{Document, Node};

pub const NOT_AUTHENTICATED: &str = "You are not authenticated";
pub const NO_MODIFICATION: &str = "Pas de modification";
pub const STATUS_OK: &str = "OK";

/// Outcome reported by the vendor after a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// The requested values were already in place.
    NoModification,
    /// Saved; the controller applies it asynchronously.
    Accepted,
}

pub fn parse_xml(text: &str) -> Result<Document<'_>, Error> {
    Document::parse(text).map_err(|e| Error::InvalidResponse(text.to_string(), e.to_string()))
}

/// First direct child element of `node` named `name`.
pub fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Text of `/root/status`, if present.
pub fn status_text<'a>(doc: &'a Document<'_>) -> Option<&'a str> {
    child(doc.root_element(), "status").and_then(|n| n.text())
}

/// Fails with `Error::NotAuthenticated` when the vendor embedded its login marker.
pub fn check_authenticated(doc: &Document<'_>) -> Result<(), Error> {
    match status_text(doc) {
        Some(status) if status.contains(NOT_AUTHENTICATED) => Err(Error::NotAuthenticated),
        _ => Ok(()),
    }
}

/* "Pas de modification" is the only wording the French backend uses; kept as a literal match */
pub fn save_status(text: &str) -> Result<SaveStatus, Error> {
    let doc = parse_xml(text)?;
    match status_text(&doc) {
        Some(status) if status.contains(NO_MODIFICATION) => Ok(SaveStatus::NoModification),
        Some(status) if status.contains(NOT_AUTHENTICATED) => Err(Error::NotAuthenticated),
        _ => Ok(SaveStatus::Accepted),
    }
}

#[cfg(test)]
pub(crate) fn read_resource(filename: &str) -> String {
    use std::fs;
    use std::path::PathBuf;

    let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    d.push(format!("resources/test/{}", filename));
    fs::read_to_string(d.as_path()).unwrap()
}
