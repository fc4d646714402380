//! # Railroad Diagram Compiler
//!
//! Compiles one grammar rule into a railroad diagram script: a nested,
//! textual expression (`Diagram`, `ComplexDiagram`, `Sequence`, `Choice`,
//! `Optional`, `ZeroOrMore`, `OneOrMore`, `Stack`, `Terminal`, `NonTerminal`,
//! `Comment`) that an external rendering library turns into a drawing. The
//! compiler never renders anything itself and never expands rule references,
//! so recursive rules stay finite: a reference is always an opaque
//! `NonTerminal` leaf.
//!
//! ## Line Wrapping
//!
//! Long alternatives are split across visual lines. While a sequence is
//! emitted, a running character width is accumulated; when appending the
//! next element would exceed the configured budget, the current `Sequence`
//! is closed and a new one opened inside the same `Stack`. The width of a
//! leaf is the character count of its stripped, pre-escape label, and
//! composites report the widest child, so a parent can wrap based on the
//! widest leaf beneath it. Character count is a deliberate proxy for
//! rendered width; it must stay a character count for output compatibility.
//!
//! ## Example
//!
//! ```rust
//! use grammar_railroad::diagram::{DiagramCompiler, DiagramOptions};
//! use grammar_railroad::parser::parse_grammar;
//!
//! let tree = parse_grammar("x: A | B ;").unwrap();
//! let compiler = DiagramCompiler::new(DiagramOptions::default());
//! let diagram = compiler.generate(&tree, "x");
//! assert!(diagram.script.starts_with("ComplexDiagram("));
//! assert!(!diagram.wrapped);
//! ```

use crate::ast::*;
use regex::Regex;

/// Label used for a wildcard atom in lexer rules.
const ANY_CHAR_LABEL: &str = "any char";
/// Label used for a wildcard atom in parser rules.
const ANY_TOKEN_LABEL: &str = "any token";
/// Label used for an alternative without elements.
const EMPTY_ALT_LABEL: &str = "<empty alt>";
/// Comment emitted in place of a subtree lost to upstream error recovery.
const SYNTAX_ERROR_LABEL: &str = "# Syntax Error #";

/// Per-compiler configuration.
#[derive(Debug, Clone, Default)]
pub struct DiagramOptions {
    /// Pattern removed from rendered labels before escaping, typically a
    /// shared grammar-name prefix (`None` strips nothing)
    pub strip_pattern: Option<Regex>,
    /// Character budget per visual line; `0` disables wrapping
    pub wrap_threshold: usize,
}

/// The result of compiling one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagram {
    /// The diagram script, empty when the rule was not found
    pub script: String,
    /// True when at least one sequence was split across lines
    pub wrapped: bool,
}

impl RuleDiagram {
    /// True when the requested rule was absent from the tree.
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

/// Text rendered for one subtree together with its width estimate.
///
/// The width travels back up the recursion so that an enclosing sequence
/// can decide where to wrap; no other state crosses visit boundaries.
#[derive(Debug)]
struct Rendered {
    text: String,
    width: usize,
}

impl Rendered {
    fn new(text: String, width: usize) -> Self {
        Self { text, width }
    }

    fn syntax_error() -> Self {
        Self::new(
            format!("Comment('{}')", SYNTAX_ERROR_LABEL),
            SYNTAX_ERROR_LABEL.chars().count(),
        )
    }
}

/// Which kind of rule is being rendered; a few leaves (wildcards) render
/// differently in lexer and parser context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Parser,
    Lexer,
}

/// Railroad diagram script compiler.
///
/// Holds only immutable configuration; all traversal state lives in locals
/// and return values, so one instance can serve overlapping `generate`
/// calls (for different rules of a shared tree) without interference.
#[derive(Debug, Clone)]
pub struct DiagramCompiler {
    options: DiagramOptions,
}

impl DiagramCompiler {
    /// Creates a compiler with the given configuration.
    pub fn new(options: DiagramOptions) -> Self {
        Self { options }
    }

    /// Compiles the first declaration named `rule_name`, in document order.
    ///
    /// Parser and lexer rules share the lookup name space. A missing rule
    /// is a normal outcome: the result has an empty script and no wrap
    /// flag, and no error is raised. Iteration stops at the first match,
    /// so work is bounded by the requested rule, not the whole grammar.
    pub fn generate(&self, tree: &GrammarTree, rule_name: &str) -> RuleDiagram {
        let Some(decl) = tree.decls.iter().find(|decl| decl.name() == rule_name) else {
            return RuleDiagram {
                script: String::new(),
                wrapped: false,
            };
        };

        let (kind, block) = match decl {
            Declaration::ParserRule(rule) => (RuleKind::Parser, rule.block.as_ref()),
            Declaration::LexerRule(rule) => (RuleKind::Lexer, rule.block.as_ref()),
        };

        let mut wrapped = false;
        let body = match block {
            Some(alts) => self.render_alt_list(alts, kind, &mut wrapped),
            None => Rendered::syntax_error(),
        };

        let script = match kind {
            RuleKind::Parser => format!("ComplexDiagram({})", body.text),
            RuleKind::Lexer => format!("Diagram({})", body.text),
        };
        RuleDiagram { script, wrapped }
    }

    /// Renders an alternative list as `Choice(0, ...)`.
    fn render_alt_list(&self, alts: &AltList, kind: RuleKind, wrapped: &mut bool) -> Rendered {
        if alts.alternatives.is_empty() {
            // A block with no alternatives only appears in recovered trees.
            return Rendered::syntax_error();
        }
        let mut parts = Vec::with_capacity(alts.alternatives.len());
        let mut width = 0;
        for alt in &alts.alternatives {
            let rendered = self.render_alternative(alt, kind, wrapped);
            width = width.max(rendered.width);
            parts.push(rendered.text);
        }
        Rendered::new(format!("Choice(0, {})", parts.join(", ")), width)
    }

    /// Renders one alternative as `Stack(Sequence(...))`, splitting the
    /// sequence whenever the running width would exceed the budget.
    fn render_alternative(&self, alt: &Alternative, kind: RuleKind, wrapped: &mut bool) -> Rendered {
        if alt.elements.is_empty() {
            return Rendered::new(
                format!(
                    "Stack(Sequence(Comment('{}', {{cls: 'warning'}})))",
                    EMPTY_ALT_LABEL
                ),
                EMPTY_ALT_LABEL.chars().count(),
            );
        }

        let threshold = if self.options.wrap_threshold > 0 {
            self.options.wrap_threshold
        } else {
            usize::MAX
        };

        let mut body = String::new();
        let mut current_width = 0usize;
        let mut max_width = 0usize;
        let mut segment_count = 0usize;
        for element in &alt.elements {
            let rendered = self.render_element(element, kind, wrapped);
            if segment_count > 0 && current_width.saturating_add(rendered.width) > threshold {
                // Close the current line and start a new one; a segment
                // never splits while empty, so an oversized lone element
                // still lands on a line of its own.
                body.push_str("), Sequence(");
                max_width = max_width.max(current_width);
                current_width = rendered.width;
                segment_count = 1;
                *wrapped = true;
            } else {
                if segment_count > 0 {
                    body.push_str(", ");
                }
                current_width += rendered.width;
                segment_count += 1;
            }
            body.push_str(&rendered.text);
        }
        max_width = max_width.max(current_width);

        Rendered::new(format!("Stack(Sequence({}))", body), max_width)
    }

    /// Renders one element, wrapping the item in its EBNF suffix.
    fn render_element(&self, element: &Element, kind: RuleKind, wrapped: &mut bool) -> Rendered {
        let inner = self.render_item(&element.item, kind, wrapped);
        match element.suffix {
            None => inner,
            Some(Suffix::Optional) => {
                Rendered::new(format!("Optional({})", inner.text), inner.width)
            }
            Some(Suffix::ZeroOrMore) => {
                Rendered::new(format!("ZeroOrMore({})", inner.text), inner.width)
            }
            Some(Suffix::OneOrMore) => {
                Rendered::new(format!("OneOrMore({})", inner.text), inner.width)
            }
        }
    }

    /// The construct-to-expression mapping table, one arm per atom kind.
    fn render_item(&self, item: &Item, kind: RuleKind, wrapped: &mut bool) -> Rendered {
        match item {
            Item::RuleRef { name, options } | Item::TokenRef { name, options } => {
                let (node, width) = self.leaf("NonTerminal", name);
                self.attach_options(node, width, options.as_deref())
            }
            Item::Literal(text) | Item::CharSet(text) => {
                let (node, width) = self.leaf("Terminal", text);
                Rendered::new(node, width)
            }
            Item::Range { start, end } => range_text(start, end.as_deref()),
            Item::Wildcard { options } => {
                let (node, width) = match kind {
                    RuleKind::Lexer => (
                        format!("Terminal('{}')", ANY_CHAR_LABEL),
                        ANY_CHAR_LABEL.chars().count(),
                    ),
                    RuleKind::Parser => (
                        format!("NonTerminal('{}')", ANY_TOKEN_LABEL),
                        ANY_TOKEN_LABEL.chars().count(),
                    ),
                };
                self.attach_options(node, width, options.as_deref())
            }
            Item::Block(Some(alts)) => self.render_alt_list(alts, kind, wrapped),
            Item::Block(None) => Rendered::syntax_error(),
            Item::Not(body) => {
                let inner = match body {
                    SetBody::Element(element) => self.render_set_element(element),
                    SetBody::Set(elements) => {
                        let mut parts = Vec::with_capacity(elements.len());
                        let mut width = 0;
                        for element in elements {
                            let rendered = self.render_set_element(element);
                            width = width.max(rendered.width);
                            parts.push(rendered.text);
                        }
                        Rendered::new(format!("Choice(0, {})", parts.join(", ")), width)
                    }
                };
                let not_width = "not".chars().count();
                Rendered::new(
                    format!("Sequence(Comment('not'), {})", inner.text),
                    inner.width.max(not_width),
                )
            }
            Item::Action { code, predicate } => {
                let mut label = self.strip(code);
                if *predicate {
                    label.push('?');
                    Rendered::new(
                        format!("Comment('{}', {{cls: 'predicate'}})", escape(&label)),
                        label.chars().count(),
                    )
                } else {
                    Rendered::new(
                        format!("Comment('{}')", escape(&label)),
                        label.chars().count(),
                    )
                }
            }
        }
    }

    /// Renders one element of a (negated) set.
    fn render_set_element(&self, element: &SetElement) -> Rendered {
        match element {
            SetElement::TokenRef(name) => {
                let (node, width) = self.leaf("NonTerminal", name);
                Rendered::new(node, width)
            }
            SetElement::Literal(text) | SetElement::CharSet(text) => {
                let (node, width) = self.leaf("Terminal", text);
                Rendered::new(node, width)
            }
            SetElement::Range { start, end } => range_text(start, end.as_deref()),
        }
    }

    /// Renders a labeled leaf node, returning its text and label width.
    ///
    /// The strip pattern is applied to the raw source text, the width is
    /// taken from the stripped text, and escaping happens last.
    fn leaf(&self, constructor: &str, raw: &str) -> (String, usize) {
        let label = self.strip(raw);
        let width = label.chars().count();
        (format!("{}('{}')", constructor, escape(&label)), width)
    }

    /// Appends a trailing options comment when the rendered options text is
    /// non-empty; otherwise passes the node through unchanged.
    fn attach_options(&self, node: String, width: usize, options: Option<&str>) -> Rendered {
        let Some(raw) = options else {
            return Rendered::new(node, width);
        };
        let label = self.strip(raw);
        if label.is_empty() {
            return Rendered::new(node, width);
        }
        let options_width = label.chars().count();
        Rendered::new(
            format!("Sequence({}, Comment('{}'))", node, escape(&label)),
            width.max(options_width),
        )
    }

    /// Removes the configured strip pattern from source-derived label text.
    fn strip(&self, text: &str) -> String {
        match &self.options.strip_pattern {
            Some(pattern) => pattern.replace_all(text, "").into_owned(),
            None => text.to_string(),
        }
    }
}

impl Default for DiagramCompiler {
    fn default() -> Self {
        Self::new(DiagramOptions::default())
    }
}

/// Renders a character range as bare text: `'a' .. 'z'`, or `'a' .. ?` when
/// the upper bound was lost to error recovery. Range text is not placed
/// inside a constructor call, so it is neither stripped nor escaped.
fn range_text(start: &str, end: Option<&str>) -> Rendered {
    let text = match end {
        Some(end) => format!("'{}' .. '{}'", start, end),
        None => format!("'{}' .. ?", start),
    };
    let width = text.chars().count();
    Rendered::new(text, width)
}

/// Escapes label text for a single-quoted script string: backslashes are
/// doubled first, then single quotes get a backslash.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}
