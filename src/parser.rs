//! # Parser Module
//!
//! The parser transforms grammar text into a [`GrammarTree`]. It covers the
//! ANTLR-style subset the railroad diagram compiler consumes: an optional
//! `grammar Name;` header (plain, `lexer grammar`, or `parser grammar`)
//! followed by rule declarations.
//!
//! Rule kind is decided the ANTLR way: names with an upper-case initial are
//! lexer rules, everything else is a parser rule, and the `fragment`
//! modifier forces a lexer rule.
//!
//! ## Example
//!
//! ```rust
//! use grammar_railroad::parser::parse_grammar;
//!
//! let tree = parse_grammar("expr: term ('+' term)* ;").unwrap();
//! assert_eq!(tree.decls.len(), 1);
//! ```

use crate::ast::*;
use crate::lexer::{lex_token, skip, Token};
use nom::{combinator::opt, IResult};
use thiserror::Error;

/// Errors reported while parsing grammar text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The input stopped matching the grammar syntax.
    #[error("syntax error near byte {offset}: {snippet:?}")]
    Syntax {
        /// Byte offset of the first unparsable input
        offset: usize,
        /// A short excerpt of the input at that offset
        snippet: String,
    },
}

/// Type alias for parser results.
type ParseResult<'a, T> = IResult<&'a str, T>;

/// Parses a whole grammar source into a [`GrammarTree`].
///
/// The tree keeps declarations in document order. Any input that cannot be
/// consumed as a declaration is a [`ParseError::Syntax`].
pub fn parse_grammar(source: &str) -> Result<GrammarTree, ParseError> {
    let (input, _) = skip(source).map_err(|err| syntax_error(source, err))?;
    let (input, name) = opt(header)(input).map_err(|err| syntax_error(source, err))?;

    let mut decls = Vec::new();
    let mut input = input;
    while !input.is_empty() {
        match declaration(input) {
            Ok((rest, decl)) => {
                decls.push(decl);
                input = rest;
            }
            Err(err) => return Err(syntax_error(source, err)),
        }
    }
    Ok(GrammarTree { name, decls })
}

/// Converts a nom error into a [`ParseError`] with a source offset.
fn syntax_error(source: &str, err: nom::Err<nom::error::Error<&str>>) -> ParseError {
    let remaining = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
        nom::Err::Incomplete(_) => "",
    };
    let offset = source.len() - remaining.len();
    let snippet: String = remaining.chars().take(24).collect();
    ParseError::Syntax { offset, snippet }
}

/// Builds a recoverable nom error at the given input position.
fn parse_fail(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
}

/// Expects a specific token and consumes it (plus trailing whitespace).
///
/// Returns an error pointing at the original input if the next token does
/// not match, so callers can backtrack.
fn token<'a>(expected: Token) -> impl Fn(&'a str) -> ParseResult<'a, ()> {
    move |input| {
        let original_input = input;
        let (input, tok) = lex_token(input)?;
        if tok == expected {
            let (input, _) = skip(input)?;
            Ok((input, ()))
        } else {
            Err(parse_fail(original_input))
        }
    }
}

/// Expects an identifier with the given exact text (a soft keyword).
fn keyword<'a>(name: &'static str) -> impl Fn(&'a str) -> ParseResult<'a, ()> {
    move |input| {
        let original_input = input;
        let (input, tok) = lex_token(input)?;
        match tok {
            Token::Ident(text) if text == name => {
                let (input, _) = skip(input)?;
                Ok((input, ()))
            }
            _ => Err(parse_fail(original_input)),
        }
    }
}

/// Parses any identifier.
fn ident(input: &str) -> ParseResult<String> {
    let original_input = input;
    let (input, tok) = lex_token(input)?;
    match tok {
        Token::Ident(name) => {
            let (input, _) = skip(input)?;
            Ok((input, name))
        }
        _ => Err(parse_fail(original_input)),
    }
}

/// Parses a string literal, yielding the text between the quotes.
fn string_lit(input: &str) -> ParseResult<String> {
    let original_input = input;
    let (input, tok) = lex_token(input)?;
    match tok {
        Token::StringLit(text) => {
            let (input, _) = skip(input)?;
            Ok((input, text))
        }
        _ => Err(parse_fail(original_input)),
    }
}

/// Parses a `<...>` element options block, yielding the inner text.
fn options_text(input: &str) -> ParseResult<String> {
    let original_input = input;
    let (input, tok) = lex_token(input)?;
    match tok {
        Token::Options(text) => {
            let (input, _) = skip(input)?;
            Ok((input, text))
        }
        _ => Err(parse_fail(original_input)),
    }
}

/// Parses the grammar header: `grammar X;`, `lexer grammar X;`, or
/// `parser grammar X;`.
fn header(input: &str) -> ParseResult<String> {
    let (input, _) = opt(keyword("lexer"))(input)?;
    let (input, _) = opt(keyword("parser"))(input)?;
    let (input, _) = token(Token::Grammar)(input)?;
    let (input, name) = ident(input)?;
    let (input, _) = token(Token::Semicolon)(input)?;
    Ok((input, name))
}

/// True when a reference name denotes a lexer token (upper-case initial).
fn is_token_name(name: &str) -> bool {
    name.chars().next().map(char::is_uppercase).unwrap_or(false)
}

/// Parses one rule declaration, parser or lexer kind.
fn declaration(input: &str) -> ParseResult<Declaration> {
    let (input, fragment) = opt(token(Token::Fragment))(input)?;
    let (input, name) = ident(input)?;
    let (input, _) = token(Token::Colon)(input)?;
    let (input, block) = alt_list(input)?;
    let (input, _) = token(Token::Semicolon)(input)?;

    let decl = if fragment.is_some() || is_token_name(&name) {
        Declaration::LexerRule(LexerRule {
            name,
            fragment: fragment.is_some(),
            block: Some(block),
        })
    } else {
        Declaration::ParserRule(ParserRule {
            name,
            block: Some(block),
        })
    };
    Ok((input, decl))
}

/// Parses a `|`-separated alternative list. Alternatives may be empty
/// (`x: A | ;` has two, the second without elements).
fn alt_list(input: &str) -> ParseResult<AltList> {
    let (mut input, first) = alternative(input)?;
    let mut alternatives = vec![first];
    while let Ok((rest, _)) = token(Token::Bar)(input) {
        let (rest, alt) = alternative(rest)?;
        alternatives.push(alt);
        input = rest;
    }
    Ok((input, AltList::new(alternatives)))
}

/// Parses one alternative: zero or more elements.
fn alternative(input: &str) -> ParseResult<Alternative> {
    let mut elements = Vec::new();
    let mut input = input;
    while let Ok((rest, elem)) = element(input) {
        elements.push(elem);
        input = rest;
    }
    Ok((input, Alternative::new(elements)))
}

/// Parses one element: an item with an optional EBNF suffix.
fn element(input: &str) -> ParseResult<Element> {
    let (input, item) = item(input)?;
    let (input, suffix) = opt(suffix)(input)?;
    Ok((input, Element { item, suffix }))
}

/// Parses an EBNF suffix (`?`, `*`, `+`).
fn suffix(input: &str) -> ParseResult<Suffix> {
    let original_input = input;
    let (input, tok) = lex_token(input)?;
    let parsed = match tok {
        Token::Question => Suffix::Optional,
        Token::Star => Suffix::ZeroOrMore,
        Token::Plus => Suffix::OneOrMore,
        _ => return Err(parse_fail(original_input)),
    };
    let (input, _) = skip(input)?;
    Ok((input, parsed))
}

/// Parses one atom. Dispatch is on the leading token; anything that cannot
/// start an atom (`|`, `;`, `)`) fails so sequence parsing stops cleanly.
fn item(input: &str) -> ParseResult<Item> {
    let original_input = input;
    let (after, tok) = lex_token(input)?;
    let (after, _) = skip(after)?;
    match tok {
        Token::StringLit(start) => {
            // A literal may open a character range: 'a'..'z'
            if let Ok((rest, _)) = token(Token::Range)(after) {
                match string_lit(rest) {
                    Ok((rest, end)) => Ok((rest, Item::Range { start, end: Some(end) })),
                    // `'a'..` with nothing after it: keep the malformed
                    // range so the diagram can still show the lower bound
                    Err(_) => Ok((rest, Item::Range { start, end: None })),
                }
            } else {
                Ok((after, Item::Literal(start)))
            }
        }
        Token::CharSet(text) => Ok((after, Item::CharSet(text))),
        Token::Ident(name) => {
            let (after, options) = opt(options_text)(after)?;
            let item = if is_token_name(&name) {
                Item::TokenRef { name, options }
            } else {
                Item::RuleRef { name, options }
            };
            Ok((after, item))
        }
        Token::Dot => {
            let (after, options) = opt(options_text)(after)?;
            Ok((after, Item::Wildcard { options }))
        }
        Token::LParen => {
            let (after, block) = alt_list(after)?;
            let (after, _) = token(Token::RParen)(after)?;
            Ok((after, Item::Block(Some(block))))
        }
        Token::Tilde => {
            let (after, body) = set_body(after)?;
            Ok((after, Item::Not(body)))
        }
        Token::Action(code) => {
            let (after, question) = opt(token(Token::Question))(after)?;
            Ok((
                after,
                Item::Action {
                    code,
                    predicate: question.is_some(),
                },
            ))
        }
        _ => Err(parse_fail(original_input)),
    }
}

/// Parses the operand of `~`: one set element or `( a | b | ... )`.
fn set_body(input: &str) -> ParseResult<SetBody> {
    if let Ok((rest, _)) = token(Token::LParen)(input) {
        let (mut rest, first) = set_element(rest)?;
        let mut elements = vec![first];
        while let Ok((after_bar, _)) = token(Token::Bar)(rest) {
            let (after, elem) = set_element(after_bar)?;
            elements.push(elem);
            rest = after;
        }
        let (rest, _) = token(Token::RParen)(rest)?;
        Ok((rest, SetBody::Set(elements)))
    } else {
        let (rest, element) = set_element(input)?;
        Ok((rest, SetBody::Element(element)))
    }
}

/// Parses one element inside a (negated) set.
fn set_element(input: &str) -> ParseResult<SetElement> {
    let original_input = input;
    let (after, tok) = lex_token(input)?;
    let (after, _) = skip(after)?;
    match tok {
        Token::StringLit(start) => {
            if let Ok((rest, _)) = token(Token::Range)(after) {
                match string_lit(rest) {
                    Ok((rest, end)) => Ok((rest, SetElement::Range { start, end: Some(end) })),
                    Err(_) => Ok((rest, SetElement::Range { start, end: None })),
                }
            } else {
                Ok((after, SetElement::Literal(start)))
            }
        }
        Token::CharSet(text) => Ok((after, SetElement::CharSet(text))),
        Token::Ident(name) => Ok((after, SetElement::TokenRef(name))),
        _ => Err(parse_fail(original_input)),
    }
}
