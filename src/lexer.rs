//! # Lexer Module
//!
//! The lexer tokenizes ANTLR-style grammar text using the nom parser
//! combinator library. It covers the grammar subset the railroad diagram
//! compiler consumes: rule headers, references, string literals, character
//! sets and ranges, EBNF suffixes, action blocks, and element options.
//!
//! ## Token Categories
//!
//! - **Keywords**: `grammar`, `fragment`
//! - **References**: rule and token names (told apart later by case)
//! - **Literals**: quoted strings (`'if'`), character sets (`[a-z]`)
//! - **Punctuation**: `:`, `;`, `|`, `(`, `)`, `?`, `*`, `+`, `~`, `.`, `..`
//! - **Blocks**: balanced `{...}` actions, `<...>` element options
//!
//! ## Example
//!
//! ```rust
//! use grammar_railroad::lexer::tokenize;
//!
//! let input = "expr: term ('+' term)* ;";
//! let (rest, tokens) = tokenize(input).unwrap();
//! assert!(rest.is_empty());
//! assert_eq!(tokens.len(), 9);
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::multispace1,
    combinator::{map, value},
    multi::many0,
    sequence::{pair, tuple},
    IResult,
};
use std::fmt;

/// Represents a position in grammar source as a byte offset range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Creates a new span from start and end byte offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length of this span in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if this span has zero length.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// A token with its span information.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token value
    pub token: Token,
    /// The span in grammar source
    pub span: Span,
}

impl SpannedToken {
    /// Creates a new spanned token.
    pub fn new(token: Token, span: Span) -> Self {
        Self { token, span }
    }
}

/// Token types of the grammar subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    /// `grammar` keyword opening a grammar header
    Grammar,
    /// `fragment` modifier on lexer rules
    Fragment,

    // Names and Literals
    /// Rule or token name
    Ident(String),
    /// String literal; the stored text excludes the surrounding quotes and
    /// keeps escape sequences exactly as written
    StringLit(String),
    /// Character set; the stored text includes the surrounding brackets
    CharSet(String),
    /// Action block; the stored text includes the surrounding braces
    Action(String),
    /// Element options; the stored text excludes the angle brackets
    Options(String),

    // Punctuation
    Colon,     // :
    Semicolon, // ;
    Bar,       // |
    LParen,    // (
    RParen,    // )
    Question,  // ?
    Star,      // *
    Plus,      // +
    Tilde,     // ~
    Dot,       // .
    Range,     // ..
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Grammar => write!(f, "grammar"),
            Token::Fragment => write!(f, "fragment"),
            Token::Ident(name) => write!(f, "{}", name),
            Token::StringLit(text) => write!(f, "'{}'", text),
            Token::CharSet(text) => write!(f, "{}", text),
            Token::Action(code) => write!(f, "{}", code),
            Token::Options(text) => write!(f, "<{}>", text),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Bar => write!(f, "|"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Question => write!(f, "?"),
            Token::Star => write!(f, "*"),
            Token::Plus => write!(f, "+"),
            Token::Tilde => write!(f, "~"),
            Token::Dot => write!(f, "."),
            Token::Range => write!(f, ".."),
        }
    }
}

/// Builds a recoverable nom error at the given input position.
fn lex_error(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
}

/// Skips whitespace and comments (`// ...` and `/* ... */`).
pub fn skip(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), multispace1),
            value((), pair(tag("//"), take_while(|c| c != '\n'))),
            value((), tuple((tag("/*"), take_until("*/"), tag("*/")))),
        ))),
    )(input)
}

/// Lexes a string literal like `'if'` or `'can\'t'`.
///
/// The returned token holds the text between the quotes with escape
/// sequences untouched; the diagram compiler renders them verbatim.
fn lex_string_literal(input: &str) -> IResult<&str, Token> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '\'')) => {}
        _ => return Err(lex_error(input)),
    }
    let mut escaped = false;
    for (idx, ch) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '\'' => {
                let body = input[1..idx].to_string();
                return Ok((&input[idx + 1..], Token::StringLit(body)));
            }
            _ => {}
        }
    }
    // Unterminated literal
    Err(lex_error(input))
}

/// Lexes a character set like `[a-z0-9]` or `[\]]`, brackets included.
fn lex_char_set(input: &str) -> IResult<&str, Token> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '[')) => {}
        _ => return Err(lex_error(input)),
    }
    let mut escaped = false;
    for (idx, ch) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            ']' => {
                let end = idx + ch.len_utf8();
                return Ok((&input[end..], Token::CharSet(input[..end].to_string())));
            }
            _ => {}
        }
    }
    Err(lex_error(input))
}

/// Lexes a balanced `{...}` action block, braces included.
///
/// Only brace nesting is tracked; braces inside action string literals are
/// counted too, which is acceptable for display purposes.
fn lex_action(input: &str) -> IResult<&str, Token> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '{')) => {}
        _ => return Err(lex_error(input)),
    }
    let mut depth = 1usize;
    for (idx, ch) in chars {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = idx + 1;
                    return Ok((&input[end..], Token::Action(input[..end].to_string())));
                }
            }
            _ => {}
        }
    }
    Err(lex_error(input))
}

/// Lexes a `<...>` element options block, returning the inner text.
fn lex_options(input: &str) -> IResult<&str, Token> {
    let (input, _) = tag("<")(input)?;
    let (input, body) = take_while(|c| c != '>')(input)?;
    let (input, _) = tag(">")(input)?;
    Ok((input, Token::Options(body.to_string())))
}

/// Lexes an identifier or keyword.
fn lex_ident(input: &str) -> IResult<&str, Token> {
    let (rest, name) = take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)?;
    let first = name.chars().next().unwrap_or('_');
    if first.is_ascii_digit() {
        return Err(lex_error(input));
    }
    let token = match name {
        "grammar" => Token::Grammar,
        "fragment" => Token::Fragment,
        _ => Token::Ident(name.to_string()),
    };
    Ok((rest, token))
}

/// Lexes a single token. The caller is responsible for skipping leading
/// whitespace (see [`skip`]); punctuation ordering puts `..` before `.`.
pub fn lex_token(input: &str) -> IResult<&str, Token> {
    alt((
        lex_string_literal,
        lex_char_set,
        lex_action,
        lex_options,
        lex_ident,
        value(Token::Range, tag("..")),
        value(Token::Colon, tag(":")),
        value(Token::Semicolon, tag(";")),
        value(Token::Bar, tag("|")),
        value(Token::LParen, tag("(")),
        value(Token::RParen, tag(")")),
        value(Token::Question, tag("?")),
        value(Token::Star, tag("*")),
        value(Token::Plus, tag("+")),
        value(Token::Tilde, tag("~")),
        value(Token::Dot, tag(".")),
    ))(input)
}

/// Tokenizes a whole grammar source into spanned tokens.
///
/// Stops at the first character no token matches; callers check the
/// remaining input to detect trailing garbage.
pub fn tokenize(source: &str) -> IResult<&str, Vec<SpannedToken>> {
    let mut tokens = Vec::new();
    let (mut input, _) = skip(source)?;
    loop {
        if input.is_empty() {
            return Ok((input, tokens));
        }
        let start = source.len() - input.len();
        let (rest, token) = match lex_token(input) {
            Ok(result) => result,
            Err(_) => return Ok((input, tokens)),
        };
        let end = source.len() - rest.len();
        tokens.push(SpannedToken::new(token, Span::new(start, end)));
        let (rest, _) = skip(rest)?;
        input = rest;
    }
}

/// Convenience wrapper used by tests and tooling: tokens without spans.
pub fn lex(source: &str) -> IResult<&str, Vec<Token>> {
    map(tokenize, |tokens| {
        tokens.into_iter().map(|spanned| spanned.token).collect()
    })(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_rule_tokens() {
        let (rest, tokens) = lex("expr: term ('+' term)* ;").unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            tokens,
            vec![
                Token::Ident("expr".to_string()),
                Token::Colon,
                Token::Ident("term".to_string()),
                Token::LParen,
                Token::StringLit("+".to_string()),
                Token::Ident("term".to_string()),
                Token::RParen,
                Token::Star,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_keywords_and_idents() {
        let (_, tokens) = lex("fragment grammar grammarX").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Fragment,
                Token::Grammar,
                Token::Ident("grammarX".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "a // line comment\n : /* block\ncomment */ b ;";
        let (rest, tokens) = lex(source).unwrap();
        assert!(rest.is_empty());
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".to_string()),
                Token::Colon,
                Token::Ident("b".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_string_literal_keeps_escapes() {
        let (rest, token) = lex_token(r"'can\'t'").unwrap();
        assert!(rest.is_empty());
        assert_eq!(token, Token::StringLit(r"can\'t".to_string()));
    }

    #[test]
    fn test_char_set_with_escaped_bracket() {
        let (rest, token) = lex_token(r"[a-z\]]").unwrap();
        assert!(rest.is_empty());
        assert_eq!(token, Token::CharSet(r"[a-z\]]".to_string()));
    }

    #[test]
    fn test_range_token_before_dot() {
        let (_, tokens) = lex("'a'..'z' .").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::StringLit("a".to_string()),
                Token::Range,
                Token::StringLit("z".to_string()),
                Token::Dot,
            ]
        );
    }

    #[test]
    fn test_nested_action_block() {
        let (rest, token) = lex_token("{ if (x) { y(); } }?").unwrap();
        assert_eq!(rest, "?");
        assert_eq!(token, Token::Action("{ if (x) { y(); } }".to_string()));
    }

    #[test]
    fn test_options_block() {
        let (rest, token) = lex_token("<assoc=right>").unwrap();
        assert!(rest.is_empty());
        assert_eq!(token, Token::Options("assoc=right".to_string()));
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert!(lex_token("'abc").is_err());
    }

    #[test]
    fn test_tokenize_reports_spans() {
        let (_, tokens) = tokenize("ab : cd").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 4));
        assert_eq!(tokens[2].span, Span::new(5, 7));
        assert_eq!(tokens[2].span.len(), 2);
    }
}
