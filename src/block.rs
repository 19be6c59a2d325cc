//! The indentation-driven block state machines.
//!
//! An [`Initial`] block owns one node position: it reads node
//! properties, dispatches on the first content character, and either
//! finishes as a scalar child or delegates to a [`Mapping`] or
//! [`Sequence`] machine. Parents watch the column of each incoming
//! line; a dedent concludes the current child and re-dispatches the
//! line one level up, signalled by [`Outcome::Retry`].

use crate::classify::{classify, key_string};
use crate::context::{read_node_properties, Context, Scope};
use crate::error::Result;
use crate::flow::FlowContainer;
use crate::line::Line;
use crate::scalar::{parse_chomp, BlockScalar, Child, DoubleQuoted, PlainScalar, SingleQuoted};
use crate::value::Value;
use indexmap::IndexMap;

/// What a block did with a line it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The line was consumed.
    Consumed,
    /// The block is finished and the line belongs to an enclosing
    /// machine; the caller must conclude this block and re-dispatch.
    Retry,
}

/// The column a line competes with against a child's required indent.
///
/// A leading `-` counts as the column after the dash, so a
/// zero-indented sequence still nests under `key:`.
fn effective_column(line: &Line) -> usize {
    if line.at_dash() {
        line.column() + 1
    } else {
        line.column()
    }
}

/// A delegated container machine.
pub(crate) enum Block {
    Mapping(Mapping),
    Sequence(Sequence),
}

impl Block {
    fn process_line(&mut self, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        match self {
            Block::Mapping(m) => m.process_line(line, ctx),
            Block::Sequence(s) => s.process_line(line, ctx),
        }
    }

    fn process_blank_line(&mut self) {
        match self {
            Block::Mapping(m) => m.process_blank_line(),
            Block::Sequence(s) => s.process_blank_line(),
        }
    }

    fn conclude(self, ctx: &mut Context) -> Result<Value> {
        match self {
            Block::Mapping(m) => m.conclude(ctx),
            Block::Sequence(s) => s.conclude(ctx),
        }
    }

    fn wants_raw_lines(&self) -> bool {
        match self {
            Block::Mapping(m) => m.wants_raw_lines(),
            Block::Sequence(s) => s.wants_raw_lines(),
        }
    }
}

// ---------------------------------------------------------------------------
// Initial block
// ---------------------------------------------------------------------------

enum InitialState {
    Start,
    Scalar(Child),
    Delegate(Box<Block>),
}

/// The machine for one node position.
pub(crate) struct Initial {
    scope: Scope,
    indent: usize,
    state: InitialState,
}

impl Initial {
    pub fn new(scope: Scope, indent: usize) -> Self {
        Initial {
            scope,
            indent,
            state: InitialState::Start,
        }
    }

    /// The required indentation column of this node.
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// True while a descendant consumes raw lines regardless of
    /// indent (an open block scalar or flow container).
    pub fn wants_raw_lines(&self) -> bool {
        match &self.state {
            InitialState::Start => false,
            InitialState::Scalar(child) => child.wants_raw_lines(),
            InitialState::Delegate(block) => block.wants_raw_lines(),
        }
    }

    pub fn process_blank_line(&mut self) {
        match &mut self.state {
            InitialState::Start => {}
            InitialState::Scalar(child) => child.process_blank_line(),
            InitialState::Delegate(block) => block.process_blank_line(),
        }
    }

    pub fn process_line(&mut self, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        match &mut self.state {
            InitialState::Start => {
                if line.is_comment_only() {
                    return Ok(Outcome::Consumed);
                }
                read_node_properties(line, &mut self.scope, ctx, false)?;
                if line.at_content_end() {
                    return Ok(Outcome::Consumed);
                }
                self.dispatch(line, ctx)
            }
            InitialState::Scalar(child) => {
                if line.is_comment_only() && !child.wants_raw_lines() {
                    return Ok(Outcome::Consumed);
                }
                if child.terminated() {
                    return Err(line.syntax_error("Unexpected content after scalar"));
                }
                child.continuation(line, ctx)
            }
            InitialState::Delegate(block) => match block.process_line(line, ctx)? {
                Outcome::Consumed => Ok(Outcome::Consumed),
                Outcome::Retry => {
                    // The delegate dedented. Below our own indent the
                    // line belongs to an ancestor; in between, it
                    // matches no open block.
                    if effective_column(line) < self.indent {
                        Ok(Outcome::Retry)
                    } else {
                        Err(line.indentation_error("Content at unexpected column"))
                    }
                }
            },
        }
    }

    /// Read the first content of the node.
    fn dispatch(&mut self, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        let column = line.column();

        if line.accept('*') {
            let name = line.take_while(|c| !c.is_whitespace() && !"[]{},".contains(c));
            let value = ctx
                .lookup_anchor(name)
                .cloned()
                .ok_or_else(|| line.reference_error(format!("Unknown alias: {}", name)))?;
            line.skip_spaces();
            if !line.at_content_end() {
                return Err(line.syntax_error("Unexpected content after alias"));
            }
            self.state = InitialState::Scalar(Child::Alias(value));
            return Ok(Outcome::Consumed);
        }

        if line.at_dash() {
            let mut sequence = Sequence::new(self.scope.clone(), column);
            let outcome = sequence.process_line(line, ctx)?;
            self.state = InitialState::Delegate(Box::new(Block::Sequence(sequence)));
            return Ok(outcome);
        }

        if line.accept('"') {
            let scalar = DoubleQuoted::begin(line)?;
            return self.settle_quoted(Child::DoubleQuoted(scalar), column, line, ctx);
        }

        if line.accept('\'') {
            let scalar = SingleQuoted::begin(line);
            return self.settle_quoted(Child::SingleQuoted(scalar), column, line, ctx);
        }

        if line.accept('[') {
            let container = FlowContainer::begin(false, self.scope.clone(), line, ctx)?;
            return self.settle_flow(container, column, line, ctx);
        }

        if line.accept('{') {
            let container = FlowContainer::begin(true, self.scope.clone(), line, ctx)?;
            return self.settle_flow(container, column, line, ctx);
        }

        if line.at_question() {
            let mut mapping = Mapping::new_explicit(self.scope.clone(), column);
            let outcome = mapping.process_line(line, ctx)?;
            self.state = InitialState::Delegate(Box::new(Block::Mapping(mapping)));
            return Ok(outcome);
        }

        if line.at_colon() {
            return Err(line.syntax_error("Standalone mapping value"));
        }

        if let Some(header) = line.accept_any("|>") {
            let chomp = parse_chomp(line);
            line.skip_spaces();
            if !line.at_content_end() {
                return Err(line.syntax_error("Unexpected content after block scalar header"));
            }
            let scalar = BlockScalar::new(header == '>', chomp, self.indent);
            self.state = InitialState::Scalar(Child::Block(scalar));
            return Ok(Outcome::Consumed);
        }

        let scalar = PlainScalar::begin(line, false);
        if line.accept_colon() {
            let (key_value, _) = classify(&scalar.text, None, ctx.version_or_default());
            let key = key_string(&key_value);
            let mapping = Mapping::with_first_key(self.scope.clone(), column, key, line, ctx)?;
            self.state = InitialState::Delegate(Box::new(Block::Mapping(mapping)));
            return Ok(Outcome::Consumed);
        }
        self.state = InitialState::Scalar(Child::Plain(scalar));
        Ok(Outcome::Consumed)
    }

    /// A quoted scalar read on the first line: terminated and followed
    /// by a colon it becomes the first mapping key.
    fn settle_quoted(
        &mut self,
        child: Child,
        column: usize,
        line: &mut Line,
        ctx: &mut Context,
    ) -> Result<Outcome> {
        if child.terminated() {
            line.skip_spaces();
            if line.accept_colon() {
                let key = match &child {
                    Child::DoubleQuoted(s) => s.text.clone(),
                    Child::SingleQuoted(s) => s.text.clone(),
                    _ => unreachable!("quoted child expected"),
                };
                let mapping = Mapping::with_first_key(self.scope.clone(), column, key, line, ctx)?;
                self.state = InitialState::Delegate(Box::new(Block::Mapping(mapping)));
                return Ok(Outcome::Consumed);
            }
            if !line.at_content_end() {
                return Err(line.syntax_error("Unexpected content after quoted scalar"));
            }
        }
        self.state = InitialState::Scalar(child);
        Ok(Outcome::Consumed)
    }

    /// A flow container opened on the first line: closed and followed
    /// by a colon its JSON form becomes the first mapping key.
    fn settle_flow(
        &mut self,
        container: FlowContainer,
        column: usize,
        line: &mut Line,
        ctx: &mut Context,
    ) -> Result<Outcome> {
        if container.terminated() {
            line.skip_spaces();
            if line.accept_colon() {
                let key_value = container.into_value()?;
                let key = key_string(&key_value);
                let mapping = Mapping::with_first_key(self.scope.clone(), column, key, line, ctx)?;
                self.state = InitialState::Delegate(Box::new(Block::Mapping(mapping)));
                return Ok(Outcome::Consumed);
            }
            if !line.at_content_end() {
                return Err(line.syntax_error("Unexpected content after flow collection"));
            }
        }
        self.state = InitialState::Scalar(Child::Flow(container));
        Ok(Outcome::Consumed)
    }

    /// Finish the node: materialize its value and save pending
    /// node properties.
    pub fn conclude(self, ctx: &mut Context) -> Result<Value> {
        let value = match self.state {
            InitialState::Start => Value::Null,
            InitialState::Scalar(child) => child.into_value(ctx, &self.scope)?,
            InitialState::Delegate(block) => block.conclude(ctx)?,
        };
        self.scope.save_node_properties(ctx, &value);
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Mapping block
// ---------------------------------------------------------------------------

enum MappingState {
    /// Expecting the next key or `?`.
    Key,
    /// Reading a `?`-introduced complex key as its own subtree.
    QmChild(Box<Initial>),
    /// A complex key is read; expecting its `:` line.
    Colon(String),
    /// Reading the value of `key`.
    Child(String, Box<Initial>),
}

/// A block mapping rooted at the column of its first key.
pub(crate) struct Mapping {
    scope: Scope,
    indent: usize,
    entries: IndexMap<String, Value>,
    state: MappingState,
}

impl Mapping {
    /// A mapping discovered through its first `key:` on a line the
    /// caller already half-consumed; the rest of the line feeds the
    /// value child.
    pub fn with_first_key(
        scope: Scope,
        indent: usize,
        key: String,
        line: &mut Line,
        ctx: &mut Context,
    ) -> Result<Self> {
        let mut mapping = Mapping {
            scope,
            indent,
            entries: IndexMap::new(),
            state: MappingState::Key,
        };
        mapping.start_value(key, line, ctx)?;
        Ok(mapping)
    }

    /// A mapping discovered through a `?` explicit key.
    pub fn new_explicit(scope: Scope, indent: usize) -> Self {
        Mapping {
            scope,
            indent,
            entries: IndexMap::new(),
            state: MappingState::Key,
        }
    }

    fn wants_raw_lines(&self) -> bool {
        match &self.state {
            MappingState::Child(_, block) | MappingState::QmChild(block) => {
                block.wants_raw_lines()
            }
            _ => false,
        }
    }

    fn process_blank_line(&mut self) {
        if let MappingState::Child(_, block) | MappingState::QmChild(block) = &mut self.state {
            block.process_blank_line();
        }
    }

    fn process_line(&mut self, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        loop {
            match &mut self.state {
                MappingState::Child(_, block) => {
                    if line.is_comment_only() && !block.wants_raw_lines() {
                        return Ok(Outcome::Consumed);
                    }
                    if block.wants_raw_lines() || effective_column(line) >= block.indent() {
                        if let Outcome::Consumed = block.process_line(line, ctx)? {
                            return Ok(Outcome::Consumed);
                        }
                    }
                    self.finish_value(ctx)?;
                }
                MappingState::QmChild(block) => {
                    if line.is_comment_only() && !block.wants_raw_lines() {
                        return Ok(Outcome::Consumed);
                    }
                    if block.wants_raw_lines() || effective_column(line) >= block.indent() {
                        if let Outcome::Consumed = block.process_line(line, ctx)? {
                            return Ok(Outcome::Consumed);
                        }
                    }
                    self.finish_complex_key(line, ctx)?;
                }
                MappingState::Colon(_) => {
                    if line.is_comment_only() {
                        return Ok(Outcome::Consumed);
                    }
                    if line.column() < self.indent {
                        return Ok(Outcome::Retry);
                    }
                    if line.column() > self.indent || !line.accept_colon() {
                        return Err(line.indentation_error("Block mapping value missing"));
                    }
                    let key = match std::mem::replace(&mut self.state, MappingState::Key) {
                        MappingState::Colon(key) => key,
                        _ => unreachable!(),
                    };
                    return self.start_value(key, line, ctx);
                }
                MappingState::Key => {
                    if line.is_comment_only() {
                        return Ok(Outcome::Consumed);
                    }
                    if line.column() < self.indent {
                        return Ok(Outcome::Retry);
                    }
                    if line.column() > self.indent {
                        return Err(line.indentation_error("Content at unexpected column"));
                    }
                    return self.read_key(line, ctx);
                }
            }
        }
    }

    /// Lex a key at the mapping's own column.
    fn read_key(&mut self, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        if line.accept_question() {
            line.skip_spaces();
            let mut block = Box::new(Initial::new(
                self.scope.child_key("?"),
                self.indent + 2,
            ));
            let outcome = if line.at_content_end() {
                Outcome::Consumed
            } else {
                block.process_line(line, ctx)?
            };
            self.state = MappingState::QmChild(block);
            return Ok(outcome);
        }

        if line.at_dash() {
            return Err(line.syntax_error("Unexpected sequence entry in block mapping"));
        }
        if line.at_colon() {
            return Err(line.syntax_error("Standalone mapping value"));
        }

        let key = if line.accept('"') {
            let scalar = DoubleQuoted::begin(line)?;
            if !scalar.terminated {
                return Err(line.syntax_error("Unterminated mapping key"));
            }
            line.skip_spaces();
            scalar.text
        } else if line.accept('\'') {
            let scalar = SingleQuoted::begin(line);
            if !scalar.terminated {
                return Err(line.syntax_error("Unterminated mapping key"));
            }
            line.skip_spaces();
            scalar.text
        } else {
            let scalar = PlainScalar::begin(line, false);
            let (key_value, _) = classify(&scalar.text, None, ctx.version_or_default());
            key_string(&key_value)
        };

        if !line.accept_colon() {
            return Err(line.syntax_error("Expected ':' after mapping key"));
        }
        if self.entries.contains_key(&key) {
            return Err(line.reference_error(format!("Duplicate key: {}", key)));
        }
        self.start_value(key, line, ctx)
    }

    /// Open the value child for `key` and feed it the rest of the line.
    fn start_value(&mut self, key: String, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        let mut block = Box::new(Initial::new(
            self.scope.child_key(&key),
            self.indent + 1,
        ));
        line.skip_spaces();
        let outcome = if line.at_content_end() {
            Outcome::Consumed
        } else {
            block.process_line(line, ctx)?
        };
        self.state = MappingState::Child(key, block);
        Ok(outcome)
    }

    /// Conclude the open value child and store its entry.
    fn finish_value(&mut self, ctx: &mut Context) -> Result<()> {
        if let MappingState::Child(key, block) =
            std::mem::replace(&mut self.state, MappingState::Key)
        {
            let value = block.conclude(ctx)?;
            self.entries.insert(key, value);
        }
        Ok(())
    }

    /// Conclude a `?` key subtree; non-string keys are coerced via
    /// their JSON stringification.
    fn finish_complex_key(&mut self, line: &Line, ctx: &mut Context) -> Result<()> {
        if let MappingState::QmChild(block) =
            std::mem::replace(&mut self.state, MappingState::Key)
        {
            let key_value = block.conclude(ctx)?;
            let key = key_string(&key_value);
            if self.entries.contains_key(&key) {
                return Err(line.reference_error(format!("Duplicate key: {}", key)));
            }
            self.state = MappingState::Colon(key);
        }
        Ok(())
    }

    fn conclude(mut self, ctx: &mut Context) -> Result<Value> {
        match std::mem::replace(&mut self.state, MappingState::Key) {
            MappingState::Key => {}
            MappingState::Child(key, block) => {
                let value = block.conclude(ctx)?;
                self.entries.insert(key, value);
            }
            MappingState::QmChild(block) => {
                let key_value = block.conclude(ctx)?;
                self.entries.insert(key_string(&key_value), Value::Null);
            }
            MappingState::Colon(key) => {
                self.entries.insert(key, Value::Null);
            }
        }
        Ok(Value::Mapping(self.entries))
    }
}

// ---------------------------------------------------------------------------
// Sequence block
// ---------------------------------------------------------------------------

/// A block sequence rooted at the column of its first `-`.
pub(crate) struct Sequence {
    scope: Scope,
    indent: usize,
    items: Vec<Value>,
    child: Option<Box<Initial>>,
}

impl Sequence {
    pub fn new(scope: Scope, indent: usize) -> Self {
        Sequence {
            scope,
            indent,
            items: Vec::new(),
            child: None,
        }
    }

    fn wants_raw_lines(&self) -> bool {
        self.child.as_ref().is_some_and(|c| c.wants_raw_lines())
    }

    fn process_blank_line(&mut self) {
        if let Some(child) = &mut self.child {
            child.process_blank_line();
        }
    }

    fn process_line(&mut self, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        loop {
            if let Some(child) = &mut self.child {
                if line.is_comment_only() && !child.wants_raw_lines() {
                    return Ok(Outcome::Consumed);
                }
                if child.wants_raw_lines() || effective_column(line) >= child.indent() {
                    if let Outcome::Consumed = child.process_line(line, ctx)? {
                        return Ok(Outcome::Consumed);
                    }
                }
                self.finish_item(ctx)?;
                continue;
            }

            if line.is_comment_only() {
                return Ok(Outcome::Consumed);
            }
            if line.column() < self.indent {
                return Ok(Outcome::Retry);
            }
            if line.column() > self.indent {
                return Err(line.indentation_error("Content at unexpected column"));
            }
            if !line.accept_dash() {
                return Err(line.syntax_error("Expected '-' sequence entry"));
            }
            let mut child = Box::new(Initial::new(
                self.scope.child_index(self.items.len()),
                self.indent + 2,
            ));
            line.skip_spaces();
            let outcome = if line.at_content_end() {
                Outcome::Consumed
            } else {
                child.process_line(line, ctx)?
            };
            self.child = Some(child);
            return Ok(outcome);
        }
    }

    fn finish_item(&mut self, ctx: &mut Context) -> Result<()> {
        if let Some(child) = self.child.take() {
            let value = child.conclude(ctx)?;
            self.items.push(value);
        }
        Ok(())
    }

    fn conclude(mut self, ctx: &mut Context) -> Result<Value> {
        self.finish_item(ctx)?;
        Ok(Value::Sequence(self.items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a root block over whole-document text.
    fn parse_block(text: &str) -> Result<Value> {
        let mut ctx = Context::new();
        let mut root = Initial::new(Scope::root(), 0);
        for (number, raw) in crate::source::lines(text) {
            let mut line = Line::new(number, raw);
            if line.is_blank() {
                root.process_blank_line();
                continue;
            }
            match root.process_line(&mut line, &mut ctx)? {
                Outcome::Consumed => {}
                Outcome::Retry => {
                    return Err(line.indentation_error("Content at unexpected column"))
                }
            }
        }
        root.conclude(&mut ctx)
    }

    fn parsed(text: &str) -> Value {
        parse_block(text).unwrap()
    }

    #[test]
    fn test_block_sequence() {
        let value = parsed("- Mark McGwire\n- Sammy Sosa\n- Ken Griffey\n");
        let items = value.as_sequence().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Value::String("Mark McGwire".to_string()));
        assert_eq!(items[2], Value::String("Ken Griffey".to_string()));
    }

    #[test]
    fn test_block_mapping() {
        let value = parsed("hr: 65\navg: 0.278\nrbi: 147\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(entries["hr"], Value::Int(65));
        assert_eq!(entries["rbi"], Value::Int(147));
        assert!(matches!(entries["avg"], Value::Decimal(_)));
    }

    #[test]
    fn test_nested_mapping() {
        let value = parsed("outer:\n  a: 1\n  b: 2\nnext: 3\n");
        let entries = value.as_mapping().unwrap();
        let inner = entries["outer"].as_mapping().unwrap();
        assert_eq!(inner["a"], Value::Int(1));
        assert_eq!(entries["next"], Value::Int(3));
    }

    #[test]
    fn test_zero_indented_sequence_under_key() {
        let value = parsed("key:\n- a\n- b\nother: 1\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(
            entries["key"],
            Value::Sequence(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ])
        );
        assert_eq!(entries["other"], Value::Int(1));
    }

    #[test]
    fn test_sequence_of_mappings() {
        let value = parsed("- name: a\n  hr: 1\n- name: b\n  hr: 2\n");
        let items = value.as_sequence().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[1].as_mapping().unwrap()["name"],
            Value::String("b".to_string())
        );
    }

    #[test]
    fn test_nested_sequence_on_dash_line() {
        let value = parsed("- - a\n  - b\n- c\n");
        let items = value.as_sequence().unwrap();
        assert_eq!(
            items[0],
            Value::Sequence(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ])
        );
        assert_eq!(items[1], Value::String("c".to_string()));
    }

    #[test]
    fn test_multiline_plain_scalar() {
        let value = parsed("a: some\n   folded text\n");
        assert_eq!(
            value.as_mapping().unwrap()["a"],
            Value::String("some folded text".to_string())
        );
    }

    #[test]
    fn test_literal_block_scalar_strip() {
        let value = parsed("s: |-\n  line1\n  line2\n");
        assert_eq!(
            value.as_mapping().unwrap()["s"],
            Value::String("line1\nline2".to_string())
        );
    }

    #[test]
    fn test_folded_block_scalar() {
        let value = parsed("s: >\n  a\n  b\n\n  c\n");
        assert_eq!(
            value.as_mapping().unwrap()["s"],
            Value::String("a b\nc\n".to_string())
        );
    }

    #[test]
    fn test_block_scalar_keep() {
        let value = parsed("s: |+\n  a\n\n\nt: 1\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(entries["s"], Value::String("a\n\n\n".to_string()));
        assert_eq!(entries["t"], Value::Int(1));
    }

    #[test]
    fn test_anchor_alias_share_value() {
        let value = parsed("a: &X\n  street: 21 Wonder St\nb: *X\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(entries["a"], entries["b"]);
        assert!(entries["a"].as_mapping().is_some());
    }

    #[test]
    fn test_unknown_alias_fails() {
        let err = parse_block("a: *nope\n").unwrap_err();
        assert!(err.to_string().contains("Unknown alias"));
    }

    #[test]
    fn test_duplicate_key_fails_at_second_occurrence() {
        let err = parse_block("a: 1\nb: 2\na: 3\n").unwrap_err();
        assert!(err.to_string().contains("Duplicate key: a"));
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_quoted_first_key() {
        let value = parsed("\"key name\": 1\n");
        assert_eq!(value.as_mapping().unwrap()["key name"], Value::Int(1));
    }

    #[test]
    fn test_non_string_key_coerced() {
        let value = parsed("123: x\ntrue: y\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(entries["123"], Value::String("x".to_string()));
        assert_eq!(entries["true"], Value::String("y".to_string()));
    }

    #[test]
    fn test_explicit_complex_key() {
        let value = parsed("? [a, b]\n: 1\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(entries[r#"["a","b"]"#], Value::Int(1));
    }

    #[test]
    fn test_standalone_value_fails() {
        let err = parse_block(": 1\n").unwrap_err();
        assert!(err.to_string().contains("Standalone mapping value"));
    }

    #[test]
    fn test_mapping_value_in_continuation_fails() {
        let err = parse_block("a: 1\n  b: 2\n").unwrap_err();
        assert!(err.to_string().contains("plain scalar"));
    }

    #[test]
    fn test_bad_column_fails() {
        let err = parse_block("a:\n    b: 1\n  c: 2\n").unwrap_err();
        assert!(matches!(err, crate::error::ParseError::Indentation { .. }));
    }

    #[test]
    fn test_flow_in_block() {
        let value = parsed("key: {a: 1, b: [2, 3]}\n");
        let entries = value.as_mapping().unwrap();
        let inner = entries["key"].as_mapping().unwrap();
        assert_eq!(inner["b"], Value::Sequence(vec![Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn test_flow_spanning_lines() {
        let value = parsed("key: [1,\n  2]\n");
        assert_eq!(
            value.as_mapping().unwrap()["key"],
            Value::Sequence(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_quoted_scalar_spanning_lines() {
        let value = parsed("key: \"a\n  b\"\n");
        assert_eq!(
            value.as_mapping().unwrap()["key"],
            Value::String("a b".to_string())
        );
    }

    #[test]
    fn test_empty_value_is_null() {
        let value = parsed("a:\nb: 1\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(entries["a"], Value::Null);
    }

    #[test]
    fn test_comment_lines_ignored_between_entries() {
        let value = parsed("a: 1\n# note\nb: 2\n");
        let entries = value.as_mapping().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_dedented_comment_inside_block_scalar() {
        let value = parsed("s: |\n  a\n# note\n  b\n");
        assert_eq!(
            value.as_mapping().unwrap()["s"],
            Value::String("a\nb\n".to_string())
        );
    }
}
