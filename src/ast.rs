//! # Grammar Syntax Tree
//!
//! This module defines the syntax-tree nodes for ANTLR-style grammars.
//! The tree represents the structure of one grammar file as far as the
//! railroad diagram compiler needs to see it: rule declarations, alternative
//! lists, EBNF suffixes, and the atom kinds that become diagram leaves.
//!
//! Nodes are plain owned data. They are produced either by the bundled
//! parser ([`crate::parser::parse_grammar`]) or built programmatically; the
//! diagram compiler only ever reads them.
//!
//! ## Design Principles
//!
//! - **One variant per construct**: every grammar construct the diagram
//!   compiler can render has exactly one node shape, so the rendering
//!   dispatch stays a single exhaustive `match`.
//! - **Recovery-aware**: rule and block bodies are `Option`al, modelling
//!   trees an error-recovering parser hands over with pieces missing.
//! - **References stay opaque**: a rule reference is a name, never an
//!   inlined subtree, which keeps the tree acyclic for recursive rules.

/// The root node of a parsed grammar file.
///
/// Declarations are kept in document order; the diagram compiler relies on
/// that order when two declarations share a name.
///
/// # Example
///
/// ```antlr
/// grammar Expr;
///
/// expr: term ('+' term)* ;
/// ID: [a-z]+ ;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarTree {
    /// Grammar name from the `grammar Name;` header, if present
    pub name: Option<String>,
    /// Top-level rule declarations in document order
    pub decls: Vec<Declaration>,
}

impl GrammarTree {
    /// Creates an empty tree with no header and no declarations.
    pub fn new() -> Self {
        Self {
            name: None,
            decls: Vec::new(),
        }
    }
}

impl Default for GrammarTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A top-level rule declaration.
///
/// Parser rules start with a lower-case letter, lexer rules (and fragments)
/// with an upper-case letter. Both kinds share one name space when a rule is
/// looked up for rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// Parser rule (`expr: ... ;`)
    ParserRule(ParserRule),
    /// Lexer rule or fragment (`ID: ... ;`, `fragment DIGIT: ... ;`)
    LexerRule(LexerRule),
}

impl Declaration {
    /// The declared rule name, whatever the kind.
    pub fn name(&self) -> &str {
        match self {
            Declaration::ParserRule(rule) => &rule.name,
            Declaration::LexerRule(rule) => &rule.name,
        }
    }
}

/// A parser rule declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserRule {
    /// Rule name (lower-case initial)
    pub name: String,
    /// The rule body; `None` when upstream error recovery lost it
    pub block: Option<AltList>,
}

/// A lexer rule or fragment declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct LexerRule {
    /// Token name (upper-case initial)
    pub name: String,
    /// Whether the rule was declared with the `fragment` modifier
    pub fragment: bool,
    /// The rule body; `None` when upstream error recovery lost it
    pub block: Option<AltList>,
}

/// An ordered list of alternatives separated by `|`.
#[derive(Debug, Clone, PartialEq)]
pub struct AltList {
    /// The alternatives in source order; never empty for a parsed grammar
    pub alternatives: Vec<Alternative>,
}

impl AltList {
    /// Wraps a list of alternatives.
    pub fn new(alternatives: Vec<Alternative>) -> Self {
        Self { alternatives }
    }

    /// Convenience constructor for a single-alternative list.
    pub fn single(alt: Alternative) -> Self {
        Self {
            alternatives: vec![alt],
        }
    }
}

/// One alternative: a sequence of elements.
///
/// An empty element list is a valid alternative (`x: A | ;`) and renders as
/// a warning comment in the diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Alternative {
    /// The elements of the sequence, in source order
    pub elements: Vec<Element>,
}

impl Alternative {
    /// Wraps a sequence of elements.
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// The empty alternative.
    pub fn empty() -> Self {
        Self {
            elements: Vec::new(),
        }
    }
}

/// One element of an alternative: an item plus an optional EBNF suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// The underlying atom or block
    pub item: Item,
    /// EBNF cardinality suffix, if any
    pub suffix: Option<Suffix>,
}

impl Element {
    /// An element without a suffix.
    pub fn plain(item: Item) -> Self {
        Self { item, suffix: None }
    }

    /// An element with a suffix.
    pub fn suffixed(item: Item, suffix: Suffix) -> Self {
        Self {
            item,
            suffix: Some(suffix),
        }
    }
}

/// EBNF cardinality suffix on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    /// `?` — zero or one
    Optional,
    /// `*` — zero or more
    ZeroOrMore,
    /// `+` — one or more
    OneOrMore,
}

/// The atom kinds an element can be built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Reference to a parser rule (`expr`), with optional element options
    RuleRef {
        /// Referenced rule name
        name: String,
        /// Raw text of an attached `<...>` options block, if any
        options: Option<String>,
    },
    /// Reference to a lexer token or fragment (`ID`), with optional options
    TokenRef {
        /// Referenced token name
        name: String,
        /// Raw text of an attached `<...>` options block, if any
        options: Option<String>,
    },
    /// String literal (`'if'`); the stored text excludes the quotes
    Literal(String),
    /// Character set (`[a-z0-9]`); the stored text includes the brackets
    CharSet(String),
    /// Character range (`'a'..'z'`); the upper bound is `None` when the
    /// source was cut short by error recovery
    Range {
        /// Lower bound, without quotes
        start: String,
        /// Upper bound, without quotes
        end: Option<String>,
    },
    /// The wildcard atom (`.`), with optional element options
    Wildcard {
        /// Raw text of an attached `<...>` options block, if any
        options: Option<String>,
    },
    /// Parenthesized block (`( ... )`); `None` models a body lost to
    /// upstream error recovery
    Block(Option<AltList>),
    /// Negated set (`~X`, `~('a'|'b')`)
    Not(SetBody),
    /// Action block (`{ ... }`), optionally used as a semantic predicate
    /// (`{ ... }?`); the stored code includes the braces
    Action {
        /// Raw action text including the surrounding braces
        code: String,
        /// True when the action is followed by `?`
        predicate: bool,
    },
}

/// The operand of a negation: either a single set element or a
/// parenthesized set of them.
#[derive(Debug, Clone, PartialEq)]
pub enum SetBody {
    /// `~X`
    Element(SetElement),
    /// `~( a | b | c )`
    Set(Vec<SetElement>),
}

/// The element kinds that may appear inside a (negated) set.
#[derive(Debug, Clone, PartialEq)]
pub enum SetElement {
    /// Token reference
    TokenRef(String),
    /// String literal, without quotes
    Literal(String),
    /// Character set, including brackets
    CharSet(String),
    /// Character range
    Range {
        /// Lower bound, without quotes
        start: String,
        /// Upper bound, without quotes
        end: Option<String>,
    },
}
