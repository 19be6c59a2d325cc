//! Directive processing and multi-document stream framing.
//!
//! The framer reads decoded lines, handles `%YAML`/`%TAG` directives
//! and the `---`/`...` document markers, and forwards everything else
//! into the outer block machine. Each document owns a fresh context
//! and outer block; a stream resets them at every document boundary.

use crate::block::{Initial, Outcome};
use crate::context::{Context, Scope};
use crate::document::Document;
use crate::error::{ParseError, Result};
use crate::line::Line;
use crate::source;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FramerState {
    /// Before any directive or content.
    Initial,
    /// Directives seen; `---` required before content.
    Directive,
    /// Document content.
    Main,
    /// After `...` in single-document mode.
    Ended,
}

struct Framer {
    stream: bool,
    state: FramerState,
    ctx: Context,
    root: Initial,
    docs: Vec<Document>,
    last_line: usize,
}

/// Parse exactly one document.
pub(crate) fn parse_single(text: &str) -> Result<Document> {
    let docs = run(text, false)?;
    Ok(docs.into_iter().next().expect("framer yields a document"))
}

/// Parse a `---`/`...`-delimited stream. At least one document is
/// always returned; empty input yields a single null-root document.
pub(crate) fn parse_stream(text: &str) -> Result<Vec<Document>> {
    run(text, true)
}

fn run(text: &str, stream: bool) -> Result<Vec<Document>> {
    let mut framer = Framer {
        stream,
        state: FramerState::Initial,
        ctx: Context::new(),
        root: Initial::new(Scope::root(), 0),
        docs: Vec::new(),
        last_line: 1,
    };
    for (number, raw) in source::lines(source::strip_bom(text)) {
        let mut line = Line::new(number, raw);
        framer.last_line = number;
        framer.process_line(&mut line)?;
    }
    framer.finish()
}

impl Framer {
    fn process_line(&mut self, line: &mut Line) -> Result<()> {
        if line.is_blank() {
            if self.state == FramerState::Main {
                self.root.process_blank_line();
            }
            return Ok(());
        }
        // Outside document content, comment lines carry nothing; in
        // MAIN they are forwarded raw since block scalars own them.
        if line.is_comment_only() && self.state != FramerState::Main {
            return Ok(());
        }

        if at_marker(line, "---") {
            return self.open_document(line);
        }
        if at_marker(line, "...") {
            return self.end_document(line);
        }

        match self.state {
            FramerState::Initial if is_directive(line) => {
                self.read_directive(line)?;
                self.state = FramerState::Directive;
                Ok(())
            }
            FramerState::Directive if is_directive(line) => self.read_directive(line),
            FramerState::Initial => {
                // A content line implicitly opens the document.
                self.state = FramerState::Main;
                self.forward(line)
            }
            FramerState::Directive => {
                Err(structure_error(line, "Expected '---' after directives"))
            }
            FramerState::Main => self.forward(line),
            FramerState::Ended => Err(structure_error(line, "Content after document end")),
        }
    }

    /// A `---` marker: close any open document, open the next one, and
    /// replay content on the marker line into the fresh block.
    fn open_document(&mut self, line: &mut Line) -> Result<()> {
        match self.state {
            FramerState::Initial | FramerState::Directive => {}
            FramerState::Main | FramerState::Ended => {
                if !self.stream {
                    return Err(structure_error(line, "Multiple documents not allowed"));
                }
                self.close_document()?;
            }
        }
        self.state = FramerState::Main;
        line.skip_spaces();
        if !line.at_content_end() {
            return self.forward(line);
        }
        Ok(())
    }

    /// A `...` marker closes the current document, even an empty one.
    fn end_document(&mut self, line: &mut Line) -> Result<()> {
        if self.state == FramerState::Ended && !self.stream {
            return Err(structure_error(line, "Content after document end"));
        }
        line.skip_spaces();
        if !line.at_content_end() {
            return Err(line.syntax_error("Unexpected content after '...'"));
        }
        self.close_document()?;
        self.state = if self.stream {
            FramerState::Initial
        } else {
            FramerState::Ended
        };
        Ok(())
    }

    fn forward(&mut self, line: &mut Line) -> Result<()> {
        match self.root.process_line(line, &mut self.ctx)? {
            Outcome::Consumed => Ok(()),
            Outcome::Retry => Err(line.indentation_error("Content at unexpected column")),
        }
    }

    /// Conclude the outer block into a finished document and reset the
    /// per-document state.
    fn close_document(&mut self) -> Result<()> {
        let ctx = std::mem::replace(&mut self.ctx, Context::new());
        let root = std::mem::replace(&mut self.root, Initial::new(Scope::root(), 0));
        self.docs.push(assemble(root, ctx)?);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Document>> {
        match self.state {
            FramerState::Directive => {
                return Err(ParseError::Structure {
                    message: "Expected '---' after directives".to_string(),
                    line: self.last_line,
                    column: 1,
                });
            }
            FramerState::Main => self.close_document()?,
            FramerState::Initial | FramerState::Ended => {
                if self.docs.is_empty() {
                    self.close_document()?;
                }
            }
        }
        Ok(self.docs)
    }

    /// Handle one `%` directive line.
    fn read_directive(&mut self, line: &mut Line) -> Result<()> {
        line.accept('%');
        let name = line.take_while(|c| !c.is_whitespace());
        match name {
            "YAML" => self.read_yaml_directive(line),
            "TAG" => self.read_tag_directive(line),
            other => {
                log::warn!("skipping unknown directive %{}", other);
                Ok(())
            }
        }
    }

    fn read_yaml_directive(&mut self, line: &mut Line) -> Result<()> {
        if self.ctx.version.is_some() {
            return Err(line.syntax_error("Duplicate %YAML directive"));
        }
        line.skip_spaces();
        let major = line
            .decimal()
            .ok_or_else(|| line.syntax_error("Illegal %YAML directive"))?;
        if !line.accept('.') {
            return Err(line.syntax_error("Illegal %YAML directive"));
        }
        let minor = line
            .decimal()
            .ok_or_else(|| line.syntax_error("Illegal %YAML directive"))?;
        line.skip_spaces();
        if !line.at_content_end() {
            return Err(line.syntax_error("Illegal %YAML directive"));
        }
        if major != 1 {
            return Err(ParseError::Version {
                message: format!("Unsupported YAML version {}.{}", major, minor),
                line: line.number(),
                column: 1,
            });
        }
        if minor != 1 && minor != 2 {
            log::warn!("unexpected YAML version 1.{}, parsing with 1.2 rules", minor);
        }
        self.ctx.version = Some((major as u32, minor as u32));
        Ok(())
    }

    fn read_tag_directive(&mut self, line: &mut Line) -> Result<()> {
        line.skip_spaces();
        let handle = line.take_while(|c| !c.is_whitespace());
        let well_formed = handle == "!"
            || handle == "!!"
            || (handle.len() > 2 && handle.starts_with('!') && handle.ends_with('!'));
        if !well_formed {
            return Err(line.syntax_error("Illegal %TAG directive"));
        }
        let handle = handle.to_string();
        line.skip_spaces();
        let prefix = line.take_while(|c| !c.is_whitespace());
        if prefix.is_empty() {
            return Err(line.syntax_error("Illegal %TAG directive"));
        }
        let prefix = prefix.to_string();
        line.skip_spaces();
        if !line.at_content_end() {
            return Err(line.syntax_error("Illegal %TAG directive"));
        }
        self.ctx.declare_handle(handle, prefix);
        Ok(())
    }
}

/// Build the finished document from a concluded outer block.
fn assemble(root: Initial, mut ctx: Context) -> Result<Document> {
    let value = root.conclude(&mut ctx)?;
    let version = ctx.version_or_default();
    Ok(Document::new(value, ctx.take_tags(), version))
}

/// A `---` or `...` marker: at column zero, the marker text followed by
/// whitespace or line end.
fn at_marker(line: &Line, marker: &str) -> bool {
    if line.indent() != 0 {
        return false;
    }
    let raw = line.raw_from(0);
    raw == marker
        || raw
            .strip_prefix(marker)
            .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with('\t'))
}

fn is_directive(line: &Line) -> bool {
    line.indent() == 0 && line.raw_from(0).starts_with('%')
}

fn structure_error(line: &Line, message: &str) -> ParseError {
    ParseError::Structure {
        message: message.to_string(),
        line: line.number(),
        column: line.column() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_single_document() {
        let doc = parse_single("a: 1\n").unwrap();
        assert_eq!(doc.root().as_mapping().unwrap()["a"], Value::Int(1));
        assert_eq!(doc.major_version(), 1);
        assert_eq!(doc.minor_version(), 2);
    }

    #[test]
    fn test_empty_input_is_null_document() {
        let doc = parse_single("").unwrap();
        assert!(doc.root().is_null());
        let docs = parse_stream("").unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].root().is_null());
    }

    #[test]
    fn test_explicit_document_marker() {
        let doc = parse_single("---\nabc\n").unwrap();
        assert_eq!(doc.root(), &Value::String("abc".to_string()));
    }

    #[test]
    fn test_content_on_marker_line() {
        let doc = parse_single("--- abc\n").unwrap();
        assert_eq!(doc.root(), &Value::String("abc".to_string()));
    }

    #[test]
    fn test_stream_documents() {
        let docs = parse_stream("---\nabc\n---\ndef\n...\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].root(), &Value::String("abc".to_string()));
        assert_eq!(docs[1].root(), &Value::String("def".to_string()));
    }

    #[test]
    fn test_multiple_documents_rejected_in_single_mode() {
        let err = parse_single("a: 1\n---\nb: 2\n").unwrap_err();
        assert!(err.to_string().contains("Multiple documents not allowed"));
    }

    #[test]
    fn test_content_after_end_rejected() {
        let err = parse_single("a: 1\n...\nb: 2\n").unwrap_err();
        assert!(err.to_string().contains("after document end"));
        // Blank and comment lines stay legal.
        let doc = parse_single("a: 1\n...\n\n# done\n").unwrap();
        assert_eq!(doc.root().as_mapping().unwrap()["a"], Value::Int(1));
    }

    #[test]
    fn test_yaml_directive_versions() {
        let doc = parse_single("%YAML 1.1\n---\nflag: yes\n").unwrap();
        assert_eq!(doc.minor_version(), 1);
        assert_eq!(
            doc.root().as_mapping().unwrap()["flag"],
            Value::Bool(true)
        );
        let err = parse_single("%YAML 2.0\n---\na\n").unwrap_err();
        assert!(matches!(err, ParseError::Version { .. }));
        let err = parse_single("%YAML 1.1\n%YAML 1.2\n---\na\n").unwrap_err();
        assert!(err.to_string().contains("Duplicate %YAML"));
    }

    #[test]
    fn test_unknown_minor_warns_and_parses() {
        let doc = parse_single("%YAML 1.3\n---\nflag: yes\n").unwrap();
        // 1.3 falls back to 1.2 rules: `yes` stays a string.
        assert_eq!(
            doc.root().as_mapping().unwrap()["flag"],
            Value::String("yes".to_string())
        );
    }

    #[test]
    fn test_tag_directive() {
        let doc = parse_single("%TAG !e! tag:example.com,2023:\n---\n- !e!thing v\n").unwrap();
        assert_eq!(doc.get_tag("/0").unwrap(), "tag:example.com,2023:thing");
        assert_eq!(
            doc.root().as_sequence().unwrap()[0],
            Value::String("v".to_string())
        );
    }

    #[test]
    fn test_comment_before_directives() {
        let doc = parse_single("# header\n%YAML 1.1\n---\nflag: on\n").unwrap();
        assert_eq!(
            doc.root().as_mapping().unwrap()["flag"],
            Value::Bool(true)
        );
    }

    #[test]
    fn test_unknown_directive_skipped() {
        let doc = parse_single("%FOO bar\n---\na: 1\n").unwrap();
        assert_eq!(doc.root().as_mapping().unwrap()["a"], Value::Int(1));
    }

    #[test]
    fn test_content_between_directives_rejected() {
        let err = parse_single("%YAML 1.2\na: 1\n").unwrap_err();
        assert!(err.to_string().contains("Expected '---'"));
    }

    #[test]
    fn test_directives_reset_between_stream_documents() {
        let docs =
            parse_stream("%TAG !e! tag:example.com,2023:\n---\n!e!a x\n...\n---\ny\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].get_tag("").unwrap(), "tag:example.com,2023:a");
        assert_eq!(docs[1].root(), &Value::String("y".to_string()));
    }

    #[test]
    fn test_leading_ellipsis_yields_empty_document() {
        let docs = parse_stream("...\nabc\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].root().is_null());
        assert_eq!(docs[1].root(), &Value::String("abc".to_string()));
    }

    #[test]
    fn test_trailing_marker_opens_null_document() {
        let docs = parse_stream("abc\n---\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[1].root().is_null());
    }

    #[test]
    fn test_dash_content_is_not_marker() {
        let doc = parse_single("--- abc\n").unwrap();
        assert_eq!(doc.root(), &Value::String("abc".to_string()));
        let doc = parse_single("----\n").unwrap();
        assert_eq!(doc.root(), &Value::String("----".to_string()));
    }
}
