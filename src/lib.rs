//! Line-oriented YAML 1.2 parser.
//!
//! Parses YAML text into an in-memory tree that is structurally a
//! superset of JSON, preserving per-node metadata (tags, anchors) that
//! the JSON model cannot represent directly. Nodes are addressed with
//! JSON pointers, which makes the result convenient for configuration
//! and schema carriers (OpenAPI or JSON Schema documents written in
//! YAML).
//!
//! # Parsing pipeline
//!
//! 1. **Character source**: decodes the input into lines, handling BOM
//!    sniffing and CR/LF normalization.
//!
//! 2. **Framer**: dispatches `%YAML`/`%TAG` directives and `---`/`...`
//!    document markers, and forwards content lines into the outer
//!    block machine.
//!
//! 3. **Block machines**: indentation-driven mapping/sequence/scalar
//!    state machines, with flow `[...]`/`{...}` sub-parsers and the
//!    scalar lexers running within a line.
//!
//! 4. **Assembler**: materializes each document's root value together
//!    with its tag map and anchor-resolved aliases.
//!
//! # Example
//!
//! ```
//! let doc = yamlite::parse("hr: 65\navg: 0.278\n").unwrap();
//! let root = doc.root().as_mapping().unwrap();
//! assert_eq!(root["hr"].as_i64(), Some(65));
//! assert_eq!(doc.get_tag("/avg").unwrap(), "tag:yaml.org,2002:float");
//! ```

mod block;
mod classify;
mod context;
mod document;
mod error;
mod flow;
mod framer;
mod line;
mod pointer;
mod scalar;
mod source;
mod value;

pub use document::Document;
pub use error::{ParseError, Result};
pub use value::Value;

use std::path::Path;

/// Parse a single YAML document from a string.
///
/// Produces exactly one document, possibly with a null root. A second
/// `---` marker is an error; use [`parse_stream`] for multi-document
/// input.
pub fn parse(input: &str) -> Result<Document> {
    framer::parse_single(input)
}

/// Parse a single YAML document from bytes, decoding UTF-8.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    framer::parse_single(&source::decode_bytes(bytes)?)
}

/// Parse a single YAML document from a file.
pub fn parse_path(path: impl AsRef<Path>) -> Result<Document> {
    framer::parse_single(&source::read_path(path.as_ref())?)
}

/// Parse a multi-document YAML stream from a string.
///
/// Returns one document per `---`/`...`-delimited section, in order.
/// At least one document is always returned; empty input yields a
/// single null-root document.
pub fn parse_stream(input: &str) -> Result<Vec<Document>> {
    framer::parse_stream(input)
}

/// Parse a multi-document YAML stream from bytes, decoding UTF-8.
pub fn parse_stream_bytes(bytes: &[u8]) -> Result<Vec<Document>> {
    framer::parse_stream(&source::decode_bytes(bytes)?)
}

/// Parse a multi-document YAML stream from a file.
pub fn parse_stream_path(path: impl AsRef<Path>) -> Result<Vec<Document>> {
    framer::parse_stream(&source::read_path(path.as_ref())?)
}
