//! Turns B source text into a list of lexemes.
//!
//! Raw tokenization is done by `logos`; this module decodes literals, records
//! spans in the [`Context`] and reports malformed input as diagnostics without
//! stopping.

use logos::Logos;

use crate::core::context::{Context, Span};
use crate::core::diagnostic::{Diagnostic, ErrorCode};
use crate::core::state::{CompilationConfiguration, VerbosityLevel};

/// Raw lexing failures; each one becomes a diagnostic in [`lex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexError {
    #[default]
    UnexpectedCharacter,
    UnterminatedComment,
    UnterminatedChar,
    UnterminatedString,
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = LexError)]
pub enum Token {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,
    #[regex(r"[0-9]+")]
    Number,
    #[token("'", |lex| quoted(lex, '\'', LexError::UnterminatedChar))]
    Char,
    #[token("\"", |lex| quoted(lex, '"', LexError::UnterminatedString))]
    String,
    #[token("/*", comment)]
    Comment,

    // Keywords
    #[token("auto")]
    Auto,
    #[token("extrn")]
    Extrn,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("goto")]
    Goto,
    #[token("return")]
    Return,

    // Punctuation
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    // Operators
    #[token("+")]
    Plus,
    #[token("++")]
    PlusPlus,
    #[token("-")]
    Minus,
    #[token("--")]
    MinusMinus,
    #[token("!")]
    Exclamation,
    #[token("&")]
    Ampersand,
    #[token("|")]
    VerticalBar,
    #[token("=")]
    Equals,
    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    ExclamationEquals,
    #[token("<")]
    LessThan,
    #[token("<<")]
    LessThanLessThan,
    #[token("<=")]
    LessThanEquals,
    #[token(">")]
    GreaterThan,
    #[token(">>")]
    GreaterThanGreaterThan,
    #[token(">=")]
    GreaterThanEquals,
    #[token("%")]
    Percent,
    #[token("*")]
    Asterisk,
    #[token("/")]
    ForwardSlash,

    // Assignment operators. B spells them with the `=` first.
    #[token("=+")]
    AssignPlus,
    #[token("=-")]
    AssignMinus,
    #[token("=*")]
    AssignAsterisk,
    #[token("=/")]
    AssignForwardSlash,
    #[token("=%")]
    AssignPercent,
    #[token("=<<")]
    AssignLessThanLessThan,
    #[token("=>>")]
    AssignGreaterThanGreaterThan,
    #[token("=<")]
    AssignLessThan,
    #[token("=<=")]
    AssignLessThanEquals,
    #[token("=>")]
    AssignGreaterThan,
    #[token("=>=")]
    AssignGreaterThanEquals,
    #[token("===")]
    AssignEqualsEquals,
    #[token("=!=")]
    AssignExclamationEquals,
    #[token("=&")]
    AssignAmpersand,
    #[token("=|")]
    AssignVerticalBar,
}

/// Skips to the closing `*/`, or to the end of input when there is none.
fn comment(lex: &mut logos::Lexer<Token>) -> Result<(), LexError> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            Ok(())
        }
        None => {
            lex.bump(lex.remainder().len());
            Err(LexError::UnterminatedComment)
        }
    }
}

/// Scans a character or string body up to its closing quote. `*` escapes the
/// next character. A literal may not cross a newline: an unclosed one
/// swallows the rest of its line.
fn quoted(lex: &mut logos::Lexer<Token>, quote: char, unclosed: LexError) -> Result<(), LexError> {
    let mut chars = lex.remainder().char_indices();
    while let Some((at, c)) = chars.next() {
        match c {
            '\n' => {
                lex.bump(at);
                return Err(unclosed);
            }
            '*' => match chars.clone().next() {
                Some((_, '\n')) | None => {}
                Some(_) => {
                    chars.next();
                }
            },
            c if c == quote => {
                lex.bump(at + c.len_utf8());
                return Ok(());
            }
            _ => {}
        }
    }
    lex.bump(lex.remainder().len());
    Err(unclosed)
}

impl Token {
    /// How the token is named in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            Token::Identifier => "identifier",
            Token::Number => "number",
            Token::Char => "character constant",
            Token::String => "string",
            Token::Comment => "comment",
            Token::Auto => "`auto`",
            Token::Extrn => "`extrn`",
            Token::If => "`if`",
            Token::Else => "`else`",
            Token::While => "`while`",
            Token::Switch => "`switch`",
            Token::Case => "`case`",
            Token::Goto => "`goto`",
            Token::Return => "`return`",
            Token::LeftParen => "`(`",
            Token::RightParen => "`)`",
            Token::LeftBrace => "`{`",
            Token::RightBrace => "`}`",
            Token::LeftBracket => "`[`",
            Token::RightBracket => "`]`",
            Token::Semicolon => "`;`",
            Token::Comma => "`,`",
            Token::Colon => "`:`",
            Token::Question => "`?`",
            Token::Plus => "`+`",
            Token::PlusPlus => "`++`",
            Token::Minus => "`-`",
            Token::MinusMinus => "`--`",
            Token::Exclamation => "`!`",
            Token::Ampersand => "`&`",
            Token::VerticalBar => "`|`",
            Token::Equals => "`=`",
            Token::EqualsEquals => "`==`",
            Token::ExclamationEquals => "`!=`",
            Token::LessThan => "`<`",
            Token::LessThanLessThan => "`<<`",
            Token::LessThanEquals => "`<=`",
            Token::GreaterThan => "`>`",
            Token::GreaterThanGreaterThan => "`>>`",
            Token::GreaterThanEquals => "`>=`",
            Token::Percent => "`%`",
            Token::Asterisk => "`*`",
            Token::ForwardSlash => "`/`",
            Token::AssignPlus => "`=+`",
            Token::AssignMinus => "`=-`",
            Token::AssignAsterisk => "`=*`",
            Token::AssignForwardSlash => "`=/`",
            Token::AssignPercent => "`=%`",
            Token::AssignLessThanLessThan => "`=<<`",
            Token::AssignGreaterThanGreaterThan => "`=>>`",
            Token::AssignLessThan => "`=<`",
            Token::AssignLessThanEquals => "`=<=`",
            Token::AssignGreaterThan => "`=>`",
            Token::AssignGreaterThanEquals => "`=>=`",
            Token::AssignEqualsEquals => "`===`",
            Token::AssignExclamationEquals => "`=!=`",
            Token::AssignAmpersand => "`=&`",
            Token::AssignVerticalBar => "`=|`",
        }
    }
}

/// The decoded value of a constant token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal<'ctx> {
    Int(u128),
    Char(u128),
    Str(&'ctx str),
}

/// A token together with where it came from.
#[derive(Debug, Clone, Copy)]
pub struct Lexeme<'ctx> {
    pub token: Token,
    pub span: Span,
    /// Set for `Number`, `Char` and `String` tokens.
    pub literal: Option<Literal<'ctx>>,
}

/// The output of [`lex`]: lexemes in source order plus whatever went wrong.
#[derive(Debug, Default)]
pub struct TokenList<'ctx> {
    pub lexemes: Vec<Lexeme<'ctx>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'ctx> TokenList<'ctx> {
    pub fn len(&self) -> usize {
        self.lexemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexemes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lexeme<'ctx>> {
        self.lexemes.iter()
    }
}

/// Lexes the whole source held by `ctx`.
pub fn lex<'ctx>(ctx: &'ctx Context, config: &CompilationConfiguration) -> TokenList<'ctx> {
    let verbosity = config.verbosity_levels.lex_verbosity_level;
    let word_bits = config.word_bits();
    let mut list = TokenList::default();

    if verbosity >= VerbosityLevel::Trace {
        log::info!("lex: start {}", ctx.path().display());
    }

    let mut lexer = Token::lexer(ctx.source());
    while let Some(result) = lexer.next() {
        let range = lexer.span();
        ctx.advance_to(range.start);

        let token = match result {
            Ok(Token::Comment) => continue,
            Err(error) => {
                let span = ctx.next_span(range.len());
                let (code, message) = match error {
                    LexError::UnexpectedCharacter => (
                        ErrorCode::UnexpectedCharacter,
                        format!("`{}` is not valid here", span.text(ctx)),
                    ),
                    LexError::UnterminatedComment => (
                        ErrorCode::UnterminatedComment,
                        "comment is never closed with `*/`".to_string(),
                    ),
                    LexError::UnterminatedChar => {
                        (ErrorCode::UnterminatedChar, "missing closing `'`".to_string())
                    }
                    LexError::UnterminatedString => (
                        ErrorCode::UnterminatedString,
                        "missing closing `\"`".to_string(),
                    ),
                };
                list.diagnostics.push(Diagnostic::error(code, span, message));
                continue;
            }
            Ok(token) => token,
        };

        let span = ctx.next_span(range.len());
        let literal = match token {
            Token::Number => Some(Literal::Int(decode_number(ctx, span, word_bits, &mut list))),
            Token::Char => Some(Literal::Char(decode_char(ctx, span, word_bits, &mut list))),
            Token::String => Some(Literal::Str(decode_string(ctx, span, &mut list))),
            _ => None,
        };

        if verbosity >= VerbosityLevel::Debug {
            log::debug!(
                "lex: {} {:?} `{}`",
                span.display(ctx),
                token,
                span.text(ctx)
            );
        }

        list.lexemes.push(Lexeme {
            token,
            span,
            literal,
        });
    }

    if verbosity >= VerbosityLevel::Trace {
        log::info!(
            "lex: {} lexemes, {} diagnostics",
            list.lexemes.len(),
            list.diagnostics.len()
        );
    }

    list
}

/// Parses a decimal or (leading `0`) octal constant.
///
/// As in the B manual, `8` and `9` are accepted as octal digits, so `09` is
/// the same as `011`. Returns `None` when the value does not fit in `bits`.
pub fn parse_number(text: &str, bits: u32) -> Option<u128> {
    let radix: u128 = if text.len() > 1 && text.starts_with('0') {
        8
    } else {
        10
    };

    let mut value: u128 = 0;
    for byte in text.bytes() {
        let digit = u128::from(byte.checked_sub(b'0')?);
        value = value.checked_mul(radix)?.checked_add(digit)?;
    }

    if bits < 128 && value >> bits != 0 {
        return None;
    }
    Some(value)
}

/// Decodes the B escape sequences (`*n`, `*t`, `*0`, `*e`, `*(`, `*)`, `**`,
/// `*'`, `*"`) in a literal body. On failure returns the offending character.
pub fn unescape(body: &str) -> std::result::Result<String, char> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '*' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('0') => '\0',
            Some('e') => '\u{4}',
            Some('(') => '{',
            Some(')') => '}',
            Some('*') => '*',
            Some('\'') => '\'',
            Some('"') => '"',
            Some(other) => return Err(other),
            None => return Err('*'),
        };
        out.push(escaped);
    }
    Ok(out)
}

fn decode_number(ctx: &Context, span: Span, bits: u32, list: &mut TokenList) -> u128 {
    match parse_number(span.text(ctx), bits) {
        Some(value) => value,
        None => {
            list.diagnostics.push(Diagnostic::error(
                ErrorCode::IntegerOverflow,
                span,
                format!("`{}` does not fit in a {}-bit word", span.text(ctx), bits),
            ));
            0
        }
    }
}

fn decode_char(ctx: &Context, span: Span, bits: u32, list: &mut TokenList) -> u128 {
    let text = span.text(ctx);
    let body = &text[1..text.len() - 1];
    let decoded = match unescape(body) {
        Ok(decoded) => decoded,
        Err(c) => {
            list.diagnostics.push(invalid_escape(span, c));
            return 0;
        }
    };

    let bytes = decoded.as_bytes();
    if bytes.is_empty() {
        list.diagnostics.push(Diagnostic::error(
            ErrorCode::EmptyChar,
            span,
            "character constants need at least one character",
        ));
        return 0;
    }
    if bytes.len() * 8 > bits as usize {
        list.diagnostics.push(Diagnostic::error(
            ErrorCode::CharTooLong,
            span,
            format!(
                "{} bytes do not fit in a {}-bit word",
                bytes.len(),
                bits
            ),
        ));
        return 0;
    }

    bytes
        .iter()
        .fold(0u128, |acc, byte| (acc << 8) | u128::from(*byte))
}

fn decode_string<'ctx>(ctx: &'ctx Context, span: Span, list: &mut TokenList) -> &'ctx str {
    let text = span.text(ctx);
    let body = &text[1..text.len() - 1];
    match unescape(body) {
        Ok(decoded) => ctx.alloc_str(&decoded),
        Err(c) => {
            list.diagnostics.push(invalid_escape(span, c));
            ""
        }
    }
}

fn invalid_escape(span: Span, c: char) -> Diagnostic {
    Diagnostic::error(
        ErrorCode::InvalidEscape,
        span,
        format!("`*{}` is not a known escape", c),
    )
}

/// One line per lexeme: `line:col<TAB>Kind<TAB>text`, one-indexed.
pub fn dump_tokens(list: &TokenList, ctx: &Context) -> String {
    let mut out = String::new();
    for lexeme in list.iter() {
        let (line, col) = lexeme.span.coords(ctx);
        out.push_str(&format!(
            "{}:{}\t{:?}\t{}\n",
            line + 1,
            col + 1,
            lexeme.token,
            lexeme.span.text(ctx)
        ));
    }
    out
}
