//! Per-document parsing context and node properties.
//!
//! The [`Context`] owns the state that spans a whole document: tag
//! handles declared by `%TAG`, anchors recorded as nodes materialize,
//! the pointer-keyed tag map, and the `%YAML` version. A [`Scope`] is
//! the per-node slice of that state: the node's JSON pointer plus the
//! pending anchor and tag awaiting attachment. Descending into a child
//! node extends the pointer and clears the pendings, so a nested
//! descent never leaks a pending anchor to a sibling.

use crate::error::Result;
use crate::line::Line;
use crate::pointer;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

/// Prefix of the YAML 1.2 core-schema tags.
pub(crate) const YAML_TAG_PREFIX: &str = "tag:yaml.org,2002:";

pub(crate) const TAG_NULL: &str = "tag:yaml.org,2002:null";
pub(crate) const TAG_BOOL: &str = "tag:yaml.org,2002:bool";
pub(crate) const TAG_INT: &str = "tag:yaml.org,2002:int";
pub(crate) const TAG_FLOAT: &str = "tag:yaml.org,2002:float";
pub(crate) const TAG_STR: &str = "tag:yaml.org,2002:str";
pub(crate) const TAG_SEQ: &str = "tag:yaml.org,2002:seq";
pub(crate) const TAG_MAP: &str = "tag:yaml.org,2002:map";

/// Document-wide parsing state. Not shared across documents.
pub(crate) struct Context {
    tag_handles: HashMap<String, String>,
    anchors: HashMap<String, Value>,
    tags: BTreeMap<String, String>,
    pub version: Option<(u32, u32)>,
}

impl Context {
    pub fn new() -> Self {
        let mut tag_handles = HashMap::new();
        tag_handles.insert("!".to_string(), "!".to_string());
        tag_handles.insert("!!".to_string(), YAML_TAG_PREFIX.to_string());
        Context {
            tag_handles,
            anchors: HashMap::new(),
            tags: BTreeMap::new(),
            version: None,
        }
    }

    /// The effective version, defaulting to 1.2.
    pub fn version_or_default(&self) -> (u32, u32) {
        self.version.unwrap_or((1, 2))
    }

    /// Declare or override a tag handle from `%TAG`.
    pub fn declare_handle(&mut self, handle: String, prefix: String) {
        self.tag_handles.insert(handle, prefix);
    }

    pub fn resolve_handle(&self, handle: &str) -> Option<&str> {
        self.tag_handles.get(handle).map(String::as_str)
    }

    /// Record an anchor. Anchors are recorded only after their node is
    /// fully built, so forward and self references cannot resolve.
    pub fn record_anchor(&mut self, name: String, value: Value) {
        self.anchors.insert(name, value);
    }

    pub fn lookup_anchor(&self, name: &str) -> Option<&Value> {
        self.anchors.get(name)
    }

    /// Record the resolved tag for the node at a pointer.
    pub fn record_tag(&mut self, pointer: String, tag: String) {
        self.tags.insert(pointer, tag);
    }

    /// Release the accumulated pointer→tag map to the assembler.
    pub fn take_tags(&mut self) -> BTreeMap<String, String> {
        std::mem::take(&mut self.tags)
    }
}

/// The per-node slice of the context: pointer plus pending properties.
#[derive(Clone, Debug, Default)]
pub(crate) struct Scope {
    pointer: String,
    pub anchor: Option<String>,
    pub tag: Option<String>,
}

impl Scope {
    /// The scope of a document root.
    pub fn root() -> Self {
        Scope::default()
    }

    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Descend into a mapping entry. Pendings start cleared.
    pub fn child_key(&self, key: &str) -> Scope {
        Scope {
            pointer: pointer::append_key(&self.pointer, key),
            anchor: None,
            tag: None,
        }
    }

    /// Descend into a sequence item. Pendings start cleared.
    pub fn child_index(&self, index: usize) -> Scope {
        Scope {
            pointer: pointer::append_index(&self.pointer, index),
            anchor: None,
            tag: None,
        }
    }

    /// Write the pending anchor and tag for a finished node.
    pub fn save_node_properties(&self, ctx: &mut Context, value: &Value) {
        if let Some(anchor) = &self.anchor {
            ctx.record_anchor(anchor.clone(), value.clone());
        }
        if let Some(tag) = &self.tag {
            ctx.record_tag(self.pointer.clone(), tag.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Node-property resolver
// ---------------------------------------------------------------------------

/// Consume `&anchor` and `!tag` tokens at a fresh node position.
///
/// Tokens may appear in any order and repeatedly, separated by spaces.
/// A duplicate anchor in the same pending slot is fatal; a repeated tag
/// overwrites. In flow context the tag suffix additionally stops at
/// flow indicators, which belong to the surrounding flow machine.
pub(crate) fn read_node_properties(
    line: &mut Line,
    scope: &mut Scope,
    ctx: &Context,
    flow: bool,
) -> Result<()> {
    loop {
        line.skip_spaces();
        match line.peek() {
            Some('&') => {
                line.advance();
                read_anchor(line, scope)?;
            }
            Some('!') => {
                line.advance();
                scope.tag = Some(read_tag(line, ctx, flow)?);
            }
            _ => return Ok(()),
        }
    }
}

fn read_anchor(line: &mut Line, scope: &mut Scope) -> Result<()> {
    let name = line.take_while(is_anchor_char);
    if name.is_empty() {
        return Err(line.syntax_error("Expected anchor name after '&'"));
    }
    if scope.anchor.is_some() {
        return Err(line.reference_error(format!("Duplicate anchor: {}", name)));
    }
    scope.anchor = Some(name.to_string());
    Ok(())
}

/// Parse a tag token with the leading `!` already consumed.
fn read_tag(line: &mut Line, ctx: &Context, flow: bool) -> Result<String> {
    // Verbatim form: !<uri>, stored literally.
    if line.accept('<') {
        let uri = line.take_while(|c| c != '>');
        if !line.accept('>') {
            return Err(line.syntax_error("Unterminated verbatim tag"));
        }
        return Ok(uri.to_string());
    }

    let word = line.take_while(is_tag_handle_char);
    let handle = if line.accept('!') {
        format!("!{}!", word)
    } else {
        "!".to_string()
    };

    let mut suffix = Vec::with_capacity(word.len());
    if handle == "!" {
        suffix.extend_from_slice(word.as_bytes());
    }
    loop {
        match line.peek() {
            Some('%') => {
                line.advance();
                let byte = line
                    .hex(2)
                    .ok_or_else(|| line.encoding_error("Illegal percent sequence in tag"))?;
                suffix.push(byte as u8);
            }
            Some(c) if is_tag_suffix_char(c) && !(flow && is_flow_indicator(c)) => {
                let mut buf = [0u8; 4];
                suffix.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                line.advance();
            }
            _ => break,
        }
    }
    let suffix = String::from_utf8(suffix)
        .map_err(|_| line.encoding_error("Illegal percent encoding in tag"))?;

    let prefix = ctx
        .resolve_handle(&handle)
        .ok_or_else(|| line.reference_error(format!("Undeclared tag handle: {}", handle)))?;
    Ok(format!("{}{}", prefix, suffix))
}

fn is_anchor_char(c: char) -> bool {
    !c.is_whitespace() && !is_flow_indicator(c)
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, '[' | ']' | '{' | '}' | ',')
}

fn is_tag_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

fn is_tag_suffix_char(c: char) -> bool {
    is_tag_handle_char(c) || "#;/?:@&=+$,_.~*'()[]".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(text: &str) -> (Scope, Line<'_>) {
        let mut line = Line::new(1, text);
        let mut scope = Scope::root();
        let ctx = Context::new();
        read_node_properties(&mut line, &mut scope, &ctx, false).unwrap();
        (scope, line)
    }

    #[test]
    fn test_anchor_then_content() {
        let (scope, line) = props("&site value");
        assert_eq!(scope.anchor.as_deref(), Some("site"));
        assert_eq!(line.peek(), Some('v'));
    }

    #[test]
    fn test_secondary_handle() {
        let (scope, _) = props("!!str x");
        assert_eq!(scope.tag.as_deref(), Some(TAG_STR));
    }

    #[test]
    fn test_primary_handle() {
        let (scope, _) = props("!local x");
        assert_eq!(scope.tag.as_deref(), Some("!local"));
    }

    #[test]
    fn test_named_handle() {
        let mut line = Line::new(1, "!e!thing v");
        let mut scope = Scope::root();
        let mut ctx = Context::new();
        ctx.declare_handle("!e!".to_string(), "tag:example.com,2023:".to_string());
        read_node_properties(&mut line, &mut scope, &ctx, false).unwrap();
        assert_eq!(scope.tag.as_deref(), Some("tag:example.com,2023:thing"));
    }

    #[test]
    fn test_unknown_handle_is_fatal() {
        let mut line = Line::new(1, "!nope!thing v");
        let mut scope = Scope::root();
        let ctx = Context::new();
        let err = read_node_properties(&mut line, &mut scope, &ctx, false).unwrap_err();
        assert!(err.to_string().contains("Undeclared tag handle"));
    }

    #[test]
    fn test_verbatim_tag() {
        let (scope, _) = props("!<tag:example.com,2023:x> v");
        assert_eq!(scope.tag.as_deref(), Some("tag:example.com,2023:x"));
    }

    #[test]
    fn test_percent_decoding() {
        let (scope, _) = props("!!x%20y v");
        assert_eq!(scope.tag.as_deref(), Some("tag:yaml.org,2002:x y"));
        let mut line = Line::new(1, "!!x%2 v");
        let mut scope = Scope::root();
        let ctx = Context::new();
        let err = read_node_properties(&mut line, &mut scope, &ctx, false).unwrap_err();
        assert!(err.to_string().contains("percent"));
    }

    #[test]
    fn test_anchor_and_tag_any_order() {
        let (scope, _) = props("!!str &name x");
        assert_eq!(scope.anchor.as_deref(), Some("name"));
        assert_eq!(scope.tag.as_deref(), Some(TAG_STR));
    }

    #[test]
    fn test_duplicate_anchor_is_fatal() {
        let mut line = Line::new(1, "&a &b x");
        let mut scope = Scope::root();
        let ctx = Context::new();
        let err = read_node_properties(&mut line, &mut scope, &ctx, false).unwrap_err();
        assert!(err.to_string().contains("Duplicate anchor"));
    }

    #[test]
    fn test_scope_descent_clears_pendings() {
        let mut scope = Scope::root();
        scope.anchor = Some("a".to_string());
        let child = scope.child_key("k").child_index(2);
        assert_eq!(child.pointer(), "/k/2");
        assert!(child.anchor.is_none());
    }

    #[test]
    fn test_flow_suffix_stops_at_indicators() {
        let mut line = Line::new(1, "!!str,next");
        let mut scope = Scope::root();
        let ctx = Context::new();
        read_node_properties(&mut line, &mut scope, &ctx, true).unwrap();
        assert_eq!(scope.tag.as_deref(), Some(TAG_STR));
        assert_eq!(line.peek(), Some(','));
    }
}
