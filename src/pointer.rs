//! JSON-pointer utility used to address nodes for tag lookup.

use crate::value::Value;

/// Escape a single reference token per RFC 6901.
pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Append a mapping key to a pointer.
pub fn append_key(pointer: &str, key: &str) -> String {
    format!("{}/{}", pointer, escape_token(key))
}

/// Append a sequence index to a pointer.
pub fn append_index(pointer: &str, index: usize) -> String {
    format!("{}/{}", pointer, index)
}

/// Walk a value along a pointer. The empty pointer addresses the root.
pub fn resolve<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    if pointer.is_empty() {
        return Some(root);
    }
    if !pointer.starts_with('/') {
        return None;
    }
    let mut node = root;
    for token in pointer[1..].split('/') {
        let token = token.replace("~1", "/").replace("~0", "~");
        node = match node {
            Value::Mapping(entries) => entries.get(&token)?,
            Value::Sequence(items) => {
                // No leading zeros, per RFC 6901 array indexing.
                if token.len() > 1 && token.starts_with('0') {
                    return None;
                }
                let index: usize = token.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(node)
}
