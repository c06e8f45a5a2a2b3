//! Source spans and the parsing context that owns them.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use bumpalo::Bump;

/// A source code span.
///
/// Internally this is just an ID; in order to obtain information about the
/// span, it must be queried from a corresponding [`Context`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Span(u32);

impl Span {
    /// Returns the byte range for this span.
    pub fn range(self, ctx: &Context) -> (usize, usize) {
        ctx.spans.borrow().raw_spans[self.0 as usize].range
    }

    /// Returns the textual contents of this span as a string slice.
    pub fn text(self, ctx: &Context) -> &str {
        let (start, end) = self.range(ctx);
        &ctx.source[start..end]
    }

    /// Returns the coordinates (line and column) that this span starts at.
    ///
    /// Line and column are zero-indexed; you may want to one-index them for
    /// pretty-printing.
    pub fn coords(self, ctx: &Context) -> (u32, u32) {
        let raw = &ctx.spans.borrow().raw_spans[self.0 as usize];
        (raw.line, raw.col)
    }

    /// See [`Span::coords()`].
    pub fn line_number(self, ctx: &Context) -> u32 {
        self.coords(ctx).0
    }

    /// See [`Span::coords()`].
    pub fn col_number(self, ctx: &Context) -> u32 {
        self.coords(ctx).1
    }

    /// Creates a span covering `self` through the end of `end`.
    pub fn to(self, end: Span, ctx: &Context) -> Span {
        let (start, _) = self.range(ctx);
        let (_, stop) = end.range(ctx);
        let (line, col) = self.coords(ctx);
        ctx.push_span(RawSpan {
            range: (start, stop.max(start)),
            line,
            col,
        })
    }

    /// Uses the given `Context` to produce a [`fmt::Display`]able value.
    ///
    /// `Span` itself cannot be [`fmt::Display`], because we need a matching
    /// `Context` to interpret it with.
    pub fn display(self, ctx: &Context) -> impl fmt::Display + '_ {
        struct Displayable<'ctx> {
            span: Span,
            ctx: &'ctx Context,
        }
        impl fmt::Display for Displayable<'_> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                let (line, col) = self.span.coords(self.ctx);
                write!(
                    f,
                    "{}[{}:{}]",
                    self.ctx.path().display(),
                    line + 1,
                    col + 1
                )
            }
        }
        Displayable { span: self, ctx }
    }

    /// Like [`Span::display()`], without the path.
    pub fn display_range(self, ctx: &Context) -> impl fmt::Display + '_ {
        struct Displayable<'ctx> {
            span: Span,
            ctx: &'ctx Context,
        }
        impl fmt::Display for Displayable<'_> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                let (line, col) = self.span.coords(self.ctx);
                write!(f, "[{}:{}]", line + 1, col + 1)
            }
        }
        Displayable { span: self, ctx }
    }
}

/// A position in the source code marking the start of a `Span`.
#[derive(Copy, Clone, Default, Debug)]
pub(crate) struct Mark {
    offset: usize,
    line: u32,
    col: u32,
}

/// Internal representation of information associated with a span.
#[derive(Debug)]
struct RawSpan {
    range: (usize, usize),
    line: u32,
    col: u32,
}

/// State for generating spans, broken out so it can sit in a RefCell.
#[derive(Default, Debug)]
struct SpanState {
    // `Span`s index into this array.
    raw_spans: Vec<RawSpan>,
    // The cursor for tracking marks and creating spans.
    cursor: Mark,
}

/// A parsing context.
///
/// Keeps track of memory allocation, source code spans, and miscellaneous
/// book-keeping for an AST.
#[derive(Debug)]
pub struct Context {
    path: PathBuf,
    source: String,

    // All AST nodes are allocated on this arena so that nodes can hold plain
    // references and slices, which keeps pattern-matching simple.
    pub(crate) arena: Bump,
    spans: RefCell<SpanState>,
}

impl Context {
    /// Creates a new parsing context over the given path and source.
    pub fn new(path: PathBuf, source: String) -> Context {
        Self {
            path,
            source,
            arena: Bump::new(),
            spans: Default::default(),
        }
    }

    /// Returns the path to the source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the contents of the source file.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn offset(&self) -> usize {
        self.spans.borrow().cursor.offset
    }

    pub fn column(&self) -> u32 {
        self.spans.borrow().cursor.col
    }

    pub fn line(&self) -> u32 {
        self.spans.borrow().cursor.line
    }

    pub fn human_column(&self) -> u32 {
        self.column() + 1
    }

    pub fn human_line(&self) -> u32 {
        self.line() + 1
    }

    /// Number of spans created so far.
    pub fn span_count(&self) -> usize {
        self.spans.borrow().raw_spans.len()
    }

    /// The source text after the cursor.
    pub fn unread(&self) -> &str {
        &self.source[self.spans.borrow().cursor.offset..]
    }

    /// Creates a new mark pointing to the current position in the source.
    pub(crate) fn mark(&self) -> Mark {
        self.spans.borrow().cursor
    }

    /// Creates a new span using the given mark as the starting point.
    pub(crate) fn span(&self, start: Mark) -> Span {
        let end = self.spans.borrow().cursor.offset;
        self.push_span(RawSpan {
            range: (start.offset, end),
            line: start.line,
            col: start.col,
        })
    }

    fn push_span(&self, raw: RawSpan) -> Span {
        let mut spans = self.spans.borrow_mut();
        spans.raw_spans.push(raw);

        let index: u32 = (spans.raw_spans.len() - 1)
            .try_into()
            .expect("ran out of span indices");
        Span(index)
    }

    /// Advances the cursor.
    ///
    /// Takes `&self` because AST nodes hold references into the arena, which
    /// locks up a lifetime for the whole context.
    ///
    /// # Panics
    ///
    /// Panics if `len > self.unread().len()`.
    pub(crate) fn advance_cursor(&self, len: usize) {
        let mut spans = self.spans.borrow_mut();
        let offset = spans.cursor.offset;
        for c in self.source[offset..offset + len].chars() {
            if c == '\n' {
                spans.cursor.line += 1;
                spans.cursor.col = 0;
            } else {
                spans.cursor.col += 1;
            }
        }
        spans.cursor.offset += len;
    }

    /// Advances the cursor to an absolute byte offset. Offsets behind the
    /// cursor are ignored.
    pub(crate) fn advance_to(&self, offset: usize) {
        let current = self.offset();
        if offset > current {
            self.advance_cursor(offset - current);
        }
    }

    /// Shortcut for calling mark, advance_cursor and span in order.
    ///
    /// # Panics
    ///
    /// Panics if `len > self.unread().len()`.
    pub(crate) fn next_span(&self, len: usize) -> Span {
        let start = self.mark();
        self.advance_cursor(len);
        self.span(start)
    }

    /// Copies a string into the arena.
    pub(crate) fn alloc_str(&self, text: &str) -> &str {
        self.arena.alloc_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(source: &str) -> Context {
        Context::new(PathBuf::from("test.b"), source.to_string())
    }

    #[test]
    fn test_next_span_tracks_lines_and_columns() {
        let ctx = ctx("auto x;\nextrn y;");
        let auto = ctx.next_span(4);
        ctx.advance_cursor(4);
        let extrn = ctx.next_span(5);

        assert_eq!(auto.text(&ctx), "auto");
        assert_eq!(auto.coords(&ctx), (0, 0));
        assert_eq!(extrn.text(&ctx), "extrn");
        assert_eq!(extrn.coords(&ctx), (1, 0));
        assert_eq!(ctx.human_line(), 2);
        assert_eq!(ctx.human_column(), 6);
        assert_eq!(ctx.unread(), " y;");
    }

    #[test]
    fn test_advance_to_ignores_offsets_behind_cursor() {
        let ctx = ctx("abc def");
        ctx.advance_to(4);
        assert_eq!(ctx.offset(), 4);
        ctx.advance_to(2);
        assert_eq!(ctx.offset(), 4);
        assert_eq!(ctx.column(), 4);
    }

    #[test]
    fn test_span_join() {
        let ctx = ctx("f(a, b)");
        let f = ctx.next_span(1);
        ctx.advance_to(6);
        let close = ctx.next_span(1);
        let call = f.to(close, &ctx);
        assert_eq!(call.text(&ctx), "f(a, b)");
        assert_eq!(call.range(&ctx), (0, 7));
    }

    #[test]
    fn test_display() {
        let ctx = ctx("\n\n   x");
        ctx.advance_to(5);
        let x = ctx.next_span(1);
        assert_eq!(x.display(&ctx).to_string(), "test.b[3:4]");
        assert_eq!(x.display_range(&ctx).to_string(), "[3:4]");
        assert_eq!(x.line_number(&ctx), 2);
        assert_eq!(x.col_number(&ctx), 3);
    }
}
