//! Flow-style containers: `[...]` sequences and `{...}` mappings.
//!
//! Both run the same small state machine across lines until their
//! closing delimiter: ITEM expects the next value, CONTINUATION feeds
//! lines to a child scalar that spans them, COMMA expects a separator
//! or the close. Flow content is indentation-insensitive; the
//! surrounding block machinery keeps handing lines in until the
//! container terminates.

use crate::classify::key_string;
use crate::context::{read_node_properties, Context, Scope};
use crate::error::{ParseError, Result};
use crate::line::Line;
use crate::scalar::{Child, DoubleQuoted, PlainScalar, SingleQuoted};
use crate::value::Value;
use indexmap::IndexMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FlowState {
    Item,
    Continuation,
    Comma,
    Closed,
}

/// A flow sequence or mapping under construction.
#[derive(Debug)]
pub(crate) struct FlowContainer {
    mapping: bool,
    scope: Scope,
    state: FlowState,
    items: Vec<Value>,
    entries: IndexMap<String, Value>,
    current: Option<Box<Child>>,
    item_scope: Option<Scope>,
    pending_key: Option<String>,
    start_line: usize,
    start_column: usize,
}

impl FlowContainer {
    /// Start a container with the cursor just past its opening
    /// delimiter and consume the rest of the line.
    pub fn begin(
        mapping: bool,
        scope: Scope,
        line: &mut Line,
        ctx: &mut Context,
    ) -> Result<Self> {
        let mut container = FlowContainer {
            mapping,
            scope,
            state: FlowState::Item,
            items: Vec::new(),
            entries: IndexMap::new(),
            current: None,
            item_scope: None,
            pending_key: None,
            start_line: line.number(),
            start_column: line.column(),
        };
        container.process(line, ctx)?;
        Ok(container)
    }

    pub fn terminated(&self) -> bool {
        self.state == FlowState::Closed
    }

    /// Feed the next line.
    pub fn continuation(&mut self, line: &mut Line, ctx: &mut Context) -> Result<()> {
        self.process(line, ctx)
    }

    /// The finished container value.
    pub fn into_value(self) -> Result<Value> {
        if self.state != FlowState::Closed {
            return Err(ParseError::Syntax {
                message: format!(
                    "Unterminated flow {}",
                    if self.mapping { "mapping" } else { "sequence" }
                ),
                line: self.start_line,
                column: self.start_column + 1,
            });
        }
        if self.mapping {
            Ok(Value::Mapping(self.entries))
        } else {
            Ok(Value::Sequence(self.items))
        }
    }

    fn process(&mut self, line: &mut Line, ctx: &mut Context) -> Result<()> {
        loop {
            match self.state {
                FlowState::Closed => return Ok(()),
                FlowState::Continuation => {
                    let child = self.current.as_mut().expect("continuation without child");
                    child.continuation(line, ctx)?;
                    if !self.settle_child(line) {
                        return Ok(());
                    }
                }
                FlowState::Item => {
                    line.skip_spaces();
                    if line.at_content_end() {
                        return Ok(());
                    }
                    if !self.dispatch_item(line, ctx)? {
                        return Ok(());
                    }
                }
                FlowState::Comma => {
                    line.skip_spaces();
                    if line.at_content_end() {
                        return Ok(());
                    }
                    self.dispatch_separator(line, ctx)?;
                }
            }
        }
    }

    /// Decide where a freshly fed child leaves the machine. Returns
    /// `false` when the line is exhausted.
    fn settle_child(&mut self, line: &Line) -> bool {
        let child = self.current.as_ref().expect("settling without child");
        if child.terminated() || line.at_colon() {
            self.state = FlowState::Comma;
            true
        } else {
            self.state = FlowState::Continuation;
            false
        }
    }

    /// ITEM: read node properties, then dispatch on the next character.
    /// Returns `false` when the line is exhausted.
    fn dispatch_item(&mut self, line: &mut Line, ctx: &mut Context) -> Result<bool> {
        // Properties read on an earlier line stay pending in the item
        // scope until the item's value arrives.
        let mut item_scope = match self.item_scope.take() {
            Some(scope) => scope,
            None => self.fresh_item_scope(),
        };
        read_node_properties(line, &mut item_scope, ctx, true)?;
        self.item_scope = Some(item_scope);
        if line.at_content_end() {
            return Ok(false);
        }

        match line.peek() {
            Some(']') if !self.mapping => {
                line.advance();
                // An empty child before `]` is dropped.
                self.flush_pending_pair(ctx)?;
                self.state = FlowState::Closed;
                Ok(true)
            }
            Some('}') if self.mapping => {
                line.advance();
                self.flush_missing_value(line)?;
                self.state = FlowState::Closed;
                Ok(true)
            }
            Some(',') => {
                if self.mapping {
                    return Err(line.syntax_error("Expected key in flow mapping"));
                }
                line.advance();
                if self.pending_key.is_some() {
                    self.flush_pending_pair(ctx)?;
                } else {
                    let scope = self.item_scope.take().unwrap_or_else(Scope::root);
                    scope.save_node_properties(ctx, &Value::Null);
                    self.items.push(Value::Null);
                }
                Ok(true)
            }
            Some('[') => {
                line.advance();
                self.start_child_container(false, line, ctx)
            }
            Some('{') => {
                line.advance();
                self.start_child_container(true, line, ctx)
            }
            Some('"') => {
                line.advance();
                let scalar = DoubleQuoted::begin(line)?;
                self.current = Some(Box::new(Child::DoubleQuoted(scalar)));
                Ok(self.settle_child(line))
            }
            Some('\'') => {
                line.advance();
                let scalar = SingleQuoted::begin(line);
                self.current = Some(Box::new(Child::SingleQuoted(scalar)));
                Ok(self.settle_child(line))
            }
            Some('*') => {
                line.advance();
                let name = line.take_while(|c| !c.is_whitespace() && !"[]{},".contains(c));
                let value = ctx
                    .lookup_anchor(name)
                    .cloned()
                    .ok_or_else(|| line.reference_error(format!("Unknown alias: {}", name)))?;
                self.current = Some(Box::new(Child::Alias(value)));
                self.state = FlowState::Comma;
                Ok(true)
            }
            _ => {
                let scalar = PlainScalar::begin(line, true);
                self.current = Some(Box::new(Child::Plain(scalar)));
                Ok(self.settle_child(line))
            }
        }
    }

    /// The scope for a fresh item: the next index for sequences, the
    /// keyed child for a mapping value, a scratch scope for a key.
    fn fresh_item_scope(&self) -> Scope {
        if self.mapping {
            match &self.pending_key {
                Some(key) => self.scope.child_key(key),
                None => {
                    let mut scope = self.scope.clone();
                    scope.anchor = None;
                    scope.tag = None;
                    scope
                }
            }
        } else {
            self.scope.child_index(self.items.len())
        }
    }

    fn start_child_container(
        &mut self,
        mapping: bool,
        line: &mut Line,
        ctx: &mut Context,
    ) -> Result<bool> {
        let scope = self
            .item_scope
            .as_ref()
            .cloned()
            .unwrap_or_else(Scope::root);
        let child = FlowContainer::begin(mapping, scope, line, ctx)?;
        self.current = Some(Box::new(Child::Flow(child)));
        Ok(self.settle_child(line))
    }

    /// COMMA: a separator, a `:` promoting the child to a key, or the
    /// closing delimiter.
    fn dispatch_separator(&mut self, line: &mut Line, ctx: &mut Context) -> Result<()> {
        let double_quoted_key = matches!(
            self.current.as_deref(),
            Some(Child::DoubleQuoted(_)) if self.mapping && self.pending_key.is_none()
        );
        if line.accept_colon() || (double_quoted_key && line.accept(':')) {
            if self.pending_key.is_some() {
                return Err(line.syntax_error("Unexpected ':' in flow collection"));
            }
            let child = self
                .current
                .take()
                .ok_or_else(|| line.syntax_error("Expected key before ':'"))?;
            let scope = self.item_scope.take().unwrap_or_else(Scope::root);
            let key_value = child.into_value(ctx, &scope)?;
            if let Some(anchor) = &scope.anchor {
                ctx.record_anchor(anchor.clone(), key_value.clone());
            }
            self.pending_key = Some(key_string(&key_value));
            self.state = FlowState::Item;
            return Ok(());
        }
        match line.peek() {
            Some(',') => {
                line.advance();
                self.flush(line, ctx)?;
                self.state = FlowState::Item;
                Ok(())
            }
            Some(']') if !self.mapping => {
                line.advance();
                self.flush(line, ctx)?;
                self.state = FlowState::Closed;
                Ok(())
            }
            Some('}') if self.mapping => {
                line.advance();
                self.flush(line, ctx)?;
                self.state = FlowState::Closed;
                Ok(())
            }
            _ => Err(line.syntax_error(if self.mapping {
                "Expected ',' or '}' in flow mapping"
            } else {
                "Expected ',' or ']' in flow sequence"
            })),
        }
    }

    /// Materialize the current child into the container.
    fn flush(&mut self, line: &Line, ctx: &mut Context) -> Result<()> {
        let child = match self.current.take() {
            Some(child) => child,
            None => return self.flush_pending_pair(ctx),
        };
        let scope = self.item_scope.take().unwrap_or_else(Scope::root);
        let value = child.into_value(ctx, &scope)?;
        match (self.mapping, self.pending_key.take()) {
            (true, Some(key)) => {
                scope.save_node_properties(ctx, &value);
                self.insert_entry(key, value, line)
            }
            (true, None) => {
                // A key with no `:` takes a null value.
                if let Some(anchor) = &scope.anchor {
                    ctx.record_anchor(anchor.clone(), value.clone());
                }
                self.insert_entry(key_string(&value), Value::Null, line)
            }
            (false, Some(key)) => {
                scope.save_node_properties(ctx, &value);
                let mut pair = IndexMap::new();
                pair.insert(key, value);
                self.items.push(Value::Mapping(pair));
                Ok(())
            }
            (false, None) => {
                scope.save_node_properties(ctx, &value);
                self.items.push(value);
                Ok(())
            }
        }
    }

    /// Flush a dangling `key:` whose value never arrived.
    fn flush_pending_pair(&mut self, ctx: &mut Context) -> Result<()> {
        if let Some(key) = self.pending_key.take() {
            if let Some(scope) = self.item_scope.take() {
                scope.save_node_properties(ctx, &Value::Null);
            }
            if self.mapping {
                self.entries.insert(key, Value::Null);
            } else {
                let mut pair = IndexMap::new();
                pair.insert(key, Value::Null);
                self.items.push(Value::Mapping(pair));
            }
        }
        Ok(())
    }

    /// `}` straight after a key position.
    fn flush_missing_value(&mut self, line: &Line) -> Result<()> {
        if let Some(key) = self.pending_key.take() {
            self.insert_entry(key, Value::Null, line)?;
        }
        Ok(())
    }

    fn insert_entry(&mut self, key: String, value: Value, line: &Line) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(line.reference_error(format!("Duplicate key: {}", key)));
        }
        self.entries.insert(key, value);
        Ok(())
    }
}
