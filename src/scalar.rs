//! Scalar child nodes and their lexers.
//!
//! A [`Child`] is a node the block machines are in the middle of
//! reading: a scalar in one of the four styles, a block scalar, a flow
//! container, or an alias. Each child knows whether its syntactic
//! delimiter has been seen (`terminated`), whether it may be finalized
//! anyway at a dedent (`complete`), and how to consume the next line
//! (`continuation`).

use crate::block::Outcome;
use crate::classify::classify;
use crate::context::{Context, Scope};
use crate::error::Result;
use crate::flow::FlowContainer;
use crate::line::Line;
use crate::value::Value;

/// Trailing-newline policy for block scalars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Chomp {
    Strip,
    Clip,
    Keep,
}

/// Parse the chomping indicator after a `|` or `>` header character.
pub(crate) fn parse_chomp(line: &mut Line) -> Chomp {
    match line.accept_any("+-") {
        Some('-') => Chomp::Strip,
        Some('+') => Chomp::Keep,
        _ => Chomp::Clip,
    }
}

/// A node being read by the block or flow machinery.
#[derive(Debug)]
pub(crate) enum Child {
    Plain(PlainScalar),
    SingleQuoted(SingleQuoted),
    DoubleQuoted(DoubleQuoted),
    Block(BlockScalar),
    Flow(FlowContainer),
    Alias(Value),
}

impl Child {
    /// The child's syntactic delimiter has been seen.
    pub fn terminated(&self) -> bool {
        match self {
            Child::Plain(p) => p.terminated,
            Child::SingleQuoted(s) => s.terminated,
            Child::DoubleQuoted(d) => d.terminated,
            Child::Block(_) => false,
            Child::Flow(f) => f.terminated(),
            Child::Alias(_) => true,
        }
    }

    /// The child may be finalized even without its delimiter.
    pub fn complete(&self) -> bool {
        match self {
            Child::Plain(_) | Child::Block(_) | Child::Alias(_) => true,
            Child::SingleQuoted(s) => s.terminated,
            Child::DoubleQuoted(d) => d.terminated,
            Child::Flow(f) => f.terminated(),
        }
    }

    /// Feed the next line to an unterminated child.
    pub fn continuation(&mut self, line: &mut Line, ctx: &mut Context) -> Result<Outcome> {
        match self {
            Child::Plain(p) => p.continuation(line).map(|()| Outcome::Consumed),
            Child::SingleQuoted(s) => s.continuation(line).map(|()| Outcome::Consumed),
            Child::DoubleQuoted(d) => d.continuation(line).map(|()| Outcome::Consumed),
            Child::Block(b) => b.continuation(line),
            Child::Flow(f) => f.continuation(line, ctx).map(|()| Outcome::Consumed),
            Child::Alias(_) => Err(line.syntax_error("Unexpected content after alias")),
        }
    }

    /// Feed a blank line. Only block scalars accumulate them.
    pub fn process_blank_line(&mut self) {
        if let Child::Block(b) = self {
            b.process_blank_line();
        }
    }

    /// True when the child consumes raw lines regardless of indent.
    pub fn wants_raw_lines(&self) -> bool {
        matches!(self, Child::Block(_)) || matches!(self, Child::Flow(f) if !f.terminated())
    }

    /// Produce the typed node, recording any classifier-implied tag.
    pub fn into_value(self, ctx: &mut Context, scope: &Scope) -> Result<Value> {
        match self {
            Child::Plain(p) => {
                let (value, implied_tag) =
                    classify(&p.text, scope.tag.as_deref(), ctx.version_or_default());
                if let Some(tag) = implied_tag {
                    ctx.record_tag(scope.pointer().to_string(), tag.to_string());
                }
                Ok(value)
            }
            Child::SingleQuoted(s) => {
                if !s.terminated {
                    return Err(unterminated_quoted(s.start_line, s.start_column));
                }
                Ok(Value::String(s.text))
            }
            Child::DoubleQuoted(d) => {
                if !d.terminated {
                    return Err(unterminated_quoted(d.start_line, d.start_column));
                }
                Ok(Value::String(d.text))
            }
            Child::Block(b) => Ok(Value::String(b.finalize())),
            Child::Flow(f) => f.into_value(),
            Child::Alias(value) => Ok(value),
        }
    }
}

fn unterminated_quoted(line: usize, column: usize) -> crate::error::ParseError {
    crate::error::ParseError::Syntax {
        message: "Unterminated quoted scalar".to_string(),
        line,
        column,
    }
}

// ---------------------------------------------------------------------------
// Plain scalars
// ---------------------------------------------------------------------------

/// An unquoted scalar, in block or flow context.
#[derive(Debug)]
pub(crate) struct PlainScalar {
    pub text: String,
    pub terminated: bool,
    flow: bool,
}

impl PlainScalar {
    /// Lex a plain scalar starting at the cursor.
    pub fn begin(line: &mut Line, flow: bool) -> Self {
        let mut scalar = PlainScalar {
            text: String::new(),
            terminated: false,
            flow,
        };
        scalar.lex_segment(line);
        scalar
    }

    /// Append a continuation line, separated by one space.
    pub fn continuation(&mut self, line: &mut Line) -> Result<()> {
        let mut segment = PlainScalar {
            text: String::new(),
            terminated: false,
            flow: self.flow,
        };
        segment.lex_segment(line);
        if line.accept_colon() {
            return Err(line.syntax_error("Unexpected ':' in multiline plain scalar"));
        }
        if !segment.text.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(&segment.text);
        }
        self.terminated = segment.terminated;
        Ok(())
    }

    /// Consume until a colon-with-whitespace, a comment, a flow
    /// indicator in flow context, or line end. Trailing whitespace is
    /// trimmed.
    fn lex_segment(&mut self, line: &mut Line) {
        line.set_mark();
        loop {
            if line.at_content_end() {
                if !line.at_end() {
                    // Stopped at a comment: the scalar cannot continue.
                    self.terminated = true;
                }
                break;
            }
            let ch = match line.peek() {
                Some(c) => c,
                None => break,
            };
            // Only a colon followed by whitespace or line end stops
            // the scalar; `a:b` keeps going.
            if ch == ':' && line.at_colon() {
                break;
            }
            if self.flow && matches!(ch, '[' | ']' | '{' | '}' | ',') {
                self.terminated = true;
                break;
            }
            line.advance();
        }
        let segment = line.marked().trim_end_matches([' ', '\t']);
        self.text.push_str(segment);
    }
}

// ---------------------------------------------------------------------------
// Single-quoted scalars
// ---------------------------------------------------------------------------

/// A `'...'` scalar. `''` is a literal apostrophe; a lone `'` closes.
#[derive(Debug)]
pub(crate) struct SingleQuoted {
    pub text: String,
    pub terminated: bool,
    start_line: usize,
    start_column: usize,
}

impl SingleQuoted {
    /// Lex with the cursor just past the opening quote.
    pub fn begin(line: &mut Line) -> Self {
        let mut scalar = SingleQuoted {
            text: String::new(),
            terminated: false,
            start_line: line.number(),
            start_column: line.column(),
        };
        scalar.lex(line);
        scalar
    }

    pub fn continuation(&mut self, line: &mut Line) -> Result<()> {
        if !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.lex(line);
        Ok(())
    }

    fn lex(&mut self, line: &mut Line) {
        while let Some(ch) = line.advance() {
            if ch == '\'' {
                if line.accept('\'') {
                    self.text.push('\'');
                } else {
                    self.terminated = true;
                    return;
                }
            } else {
                self.text.push(ch);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Double-quoted scalars
// ---------------------------------------------------------------------------

/// A `"..."` scalar with the full escape set.
#[derive(Debug)]
pub(crate) struct DoubleQuoted {
    pub text: String,
    pub terminated: bool,
    suppress_join: bool,
    start_line: usize,
    start_column: usize,
}

impl DoubleQuoted {
    /// Lex with the cursor just past the opening quote.
    pub fn begin(line: &mut Line) -> Result<Self> {
        let mut scalar = DoubleQuoted {
            text: String::new(),
            terminated: false,
            suppress_join: false,
            start_line: line.number(),
            start_column: line.column(),
        };
        scalar.lex(line)?;
        Ok(scalar)
    }

    /// Join the next line with a single space unless the accumulated
    /// text already ends with space or an escaped newline suppressed
    /// the join.
    pub fn continuation(&mut self, line: &mut Line) -> Result<()> {
        if self.suppress_join {
            self.suppress_join = false;
        } else if !self.text.ends_with(' ') {
            self.text.push(' ');
        }
        self.lex(line)
    }

    fn lex(&mut self, line: &mut Line) -> Result<()> {
        loop {
            let ch = match line.advance() {
                Some(c) => c,
                None => return Ok(()),
            };
            match ch {
                '"' => {
                    self.terminated = true;
                    return Ok(());
                }
                '\\' => {
                    if line.at_end() {
                        // A backslash as the last character swallows
                        // the line break and the implicit join space.
                        self.suppress_join = true;
                        return Ok(());
                    }
                    self.decode_escape(line)?;
                }
                c if (c as u32) < 0x20 && c != '\t' => {
                    return Err(line.syntax_error("Bad character in quoted scalar"));
                }
                c => self.text.push(c),
            }
        }
    }

    fn decode_escape(&mut self, line: &mut Line) -> Result<()> {
        let esc = match line.advance() {
            Some(c) => c,
            None => return Err(line.syntax_error("Bad escape")),
        };
        let decoded = match esc {
            '0' => '\0',
            'a' => '\x07',
            'b' => '\x08',
            't' | '\t' => '\t',
            'n' => '\n',
            'v' => '\x0B',
            'f' => '\x0C',
            'r' => '\r',
            'e' => '\x1B',
            ' ' => ' ',
            '"' => '"',
            '/' => '/',
            '\\' => '\\',
            'N' => '\u{0085}',
            '_' => '\u{00A0}',
            'L' => '\u{2028}',
            'P' => '\u{2029}',
            'x' => {
                let code = line
                    .hex(2)
                    .ok_or_else(|| line.encoding_error("Illegal hex escape"))?;
                char::from_u32(code)
                    .ok_or_else(|| line.encoding_error("Illegal hex escape"))?
            }
            'u' => self.decode_u16_escape(line)?,
            'U' => {
                let code = line
                    .hex(8)
                    .ok_or_else(|| line.encoding_error("Illegal unicode escape"))?;
                if (0xD800..=0xDFFF).contains(&code) {
                    return Err(line.encoding_error("Illegal surrogate escape"));
                }
                char::from_u32(code).ok_or_else(|| {
                    line.encoding_error("Supplementary code point out of range")
                })?
            }
            _ => return Err(line.syntax_error(format!("Unknown escape character '{}'", esc))),
        };
        self.text.push(decoded);
        Ok(())
    }

    /// Decode `\uHHHH`, pairing surrogates into one code point.
    fn decode_u16_escape(&mut self, line: &mut Line) -> Result<char> {
        let unit = line
            .hex(4)
            .ok_or_else(|| line.encoding_error("Illegal unicode escape"))?;
        if (0xDC00..=0xDFFF).contains(&unit) {
            return Err(line.encoding_error("Unexpected low surrogate escape"));
        }
        if (0xD800..=0xDBFF).contains(&unit) {
            if !line.accept_str("\\u") {
                return Err(line.encoding_error("Expected low surrogate escape"));
            }
            let low = line
                .hex(4)
                .ok_or_else(|| line.encoding_error("Illegal unicode escape"))?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(line.encoding_error("Expected low surrogate escape"));
            }
            let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
            return char::from_u32(code)
                .ok_or_else(|| line.encoding_error("Supplementary code point out of range"));
        }
        char::from_u32(unit).ok_or_else(|| line.encoding_error("Illegal unicode escape"))
    }
}

// ---------------------------------------------------------------------------
// Block scalars
// ---------------------------------------------------------------------------

/// A literal (`|`) or folded (`>`) block scalar.
///
/// The content indent is the column of the first non-blank line; lines
/// indented less terminate the scalar, except for comment lines, which
/// are tolerated.
#[derive(Debug)]
pub(crate) struct BlockScalar {
    folded: bool,
    chomp: Chomp,
    min_indent: usize,
    indent: Option<usize>,
    lines: Vec<String>,
}

impl BlockScalar {
    pub fn new(folded: bool, chomp: Chomp, min_indent: usize) -> Self {
        BlockScalar {
            folded,
            chomp,
            min_indent,
            indent: None,
            lines: Vec::new(),
        }
    }

    /// Blank lines contribute a line of just `\n`.
    pub fn process_blank_line(&mut self) {
        self.lines.push(String::new());
    }

    pub fn continuation(&mut self, line: &mut Line) -> Result<Outcome> {
        let indent = match self.indent {
            Some(indent) => indent,
            None => {
                if line.indent() < self.min_indent {
                    if line.is_comment_only() {
                        return Ok(Outcome::Consumed);
                    }
                    return Ok(Outcome::Retry);
                }
                self.indent = Some(line.indent());
                line.indent()
            }
        };
        if line.indent() < indent {
            if line.is_comment_only() {
                return Ok(Outcome::Consumed);
            }
            return Ok(Outcome::Retry);
        }
        self.lines.push(line.raw_from(indent).to_string());
        Ok(Outcome::Consumed)
    }

    /// Join lines and apply chomping.
    pub fn finalize(self) -> String {
        let mut text = if self.folded {
            fold_lines(&self.lines)
        } else {
            let mut out = String::new();
            for line in &self.lines {
                out.push_str(line);
                out.push('\n');
            }
            out
        };
        match self.chomp {
            Chomp::Strip => {
                while text.ends_with('\n') {
                    text.pop();
                }
            }
            Chomp::Clip => {
                while text.ends_with("\n\n") {
                    text.pop();
                }
            }
            Chomp::Keep => {}
        }
        text
    }
}

/// Fold lines: breaks between non-empty lines become a single space;
/// blank lines keep their newlines, preserving paragraph breaks.
fn fold_lines(lines: &[String]) -> String {
    let mut out = String::new();
    let mut after_break = true;
    for line in lines {
        if line.is_empty() {
            out.push('\n');
            after_break = true;
        } else {
            if !after_break {
                out.push(' ');
            }
            out.push_str(line);
            after_break = false;
        }
    }
    if !lines.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
