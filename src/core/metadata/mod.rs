//! # Metadata Module
//!
//! Extracts record identifiers (IIDs) from XML metadata files.
//!
//! ## Lookup cascade
//! 1. `<identifier type="IID">` in the MODS namespace
//! 2. `<identifier type="IID">` in any (or no) namespace, then a bare
//!    `<iid>` / `<IID>` element
//! 3. An `iid` / `IID` attribute on the document root
//!
//! The first non-blank hit wins. Whitespace-only text never counts as an
//! identifier. Reading a file has no side effects and the same file always
//! yields the same result.

use crate::error::ExtractError;
use roxmltree::Document;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Namespace used by MODS metadata records
pub const MODS_NAMESPACE: &str = "http://www.loc.gov/mods/v3";

const IDENTIFIER_TYPE: &str = "IID";

/// Extract the record identifier from a metadata file.
///
/// Distinguishes malformed XML ([`ExtractError::Parse`]) from well-formed
/// XML that simply carries no usable identifier
/// ([`ExtractError::MissingIdentifier`]).
pub fn extract_identifier(path: &Path) -> Result<String, ExtractError> {
    let contents = fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let document = Document::parse(&contents).map_err(|e| ExtractError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    match identifier_from_document(&document) {
        Some(identifier) => {
            trace!(identifier, path = %path.display(), "extracted identifier");
            Ok(identifier)
        }
        None => Err(ExtractError::MissingIdentifier {
            path: path.to_path_buf(),
        }),
    }
}

fn identifier_from_document(document: &Document) -> Option<String> {
    find_typed_identifier(document, true)
        .or_else(|| find_typed_identifier(document, false))
        .or_else(|| find_iid_element(document))
        .or_else(|| find_root_attribute(document))
}

/// `<identifier type="IID">`, optionally restricted to the MODS namespace
fn find_typed_identifier(document: &Document, require_mods: bool) -> Option<String> {
    document
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "identifier")
        .filter(|n| !require_mods || n.tag_name().namespace() == Some(MODS_NAMESPACE))
        .filter(|n| n.attribute("type") == Some(IDENTIFIER_TYPE))
        .find_map(|n| non_blank(n.text()))
}

fn find_iid_element(document: &Document) -> Option<String> {
    document
        .descendants()
        .filter(|n| n.is_element())
        .filter(|n| matches!(n.tag_name().name(), "iid" | "IID"))
        .find_map(|n| non_blank(n.text()))
}

fn find_root_attribute(document: &Document) -> Option<String> {
    let root = document.root_element();
    non_blank(root.attribute("iid")).or_else(|| non_blank(root.attribute("IID")))
}

fn non_blank(text: Option<&str>) -> Option<String> {
    let trimmed = text?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
