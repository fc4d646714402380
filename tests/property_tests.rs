//! Property tests for the diagram compiler: invariants that must hold for
//! arbitrary rule trees, not just the curated scenarios.

use grammar_railroad::ast::*;
use grammar_railroad::diagram::{DiagramCompiler, DiagramOptions};
use quickcheck::{Arbitrary, Gen, QuickCheck};

// Generate random rule trees straight in AST form, so the properties also
// cover shapes the bundled parser would only produce from broken input.
#[derive(Clone, Debug)]
struct RuleTree(GrammarTree);

// A rule whose elements are all leaves: used for the wrap-monotonicity
// property, where the "), Sequence(" split marker must come from wrapping
// alone (options and negations emit their own nested Sequence calls).
#[derive(Clone, Debug)]
struct FlatRule(GrammarTree);

const LABELS: &[&str] = &[
    "a", "ab", "name", "expr", "ID", "LONG_TOKEN_NAME", "x1", "it's", "a\\b",
];

fn gen_label(g: &mut Gen) -> String {
    (*g.choose(LABELS).unwrap()).to_string()
}

fn gen_leaf(g: &mut Gen) -> Item {
    match u8::arbitrary(g) % 7 {
        0 => Item::RuleRef {
            name: gen_label(g),
            options: None,
        },
        1 => Item::TokenRef {
            name: gen_label(g),
            options: None,
        },
        2 => Item::Literal(gen_label(g)),
        3 => Item::CharSet(format!("[{}]", gen_label(g))),
        4 => Item::Range {
            start: "a".to_string(),
            end: if bool::arbitrary(g) {
                Some("z".to_string())
            } else {
                None
            },
        },
        5 => Item::Wildcard { options: None },
        _ => Item::Action {
            code: format!("{{{}}}", gen_label(g)),
            predicate: bool::arbitrary(g),
        },
    }
}

fn gen_item(g: &mut Gen, depth: usize) -> Item {
    if depth > 0 && u8::arbitrary(g) % 4 == 0 {
        return Item::Block(Some(gen_alt_list(g, depth - 1)));
    }
    if depth > 0 && u8::arbitrary(g) % 8 == 0 {
        return Item::Not(SetBody::Set(vec![
            SetElement::Literal(gen_label(g)),
            SetElement::TokenRef("TOK".to_string()),
        ]));
    }
    gen_leaf(g)
}

fn gen_element(g: &mut Gen, depth: usize) -> Element {
    let item = gen_item(g, depth);
    let suffix = match u8::arbitrary(g) % 4 {
        0 => Some(Suffix::Optional),
        1 => Some(Suffix::ZeroOrMore),
        2 => Some(Suffix::OneOrMore),
        _ => None,
    };
    Element { item, suffix }
}

fn gen_alternative(g: &mut Gen, depth: usize) -> Alternative {
    let count = usize::arbitrary(g) % 5;
    Alternative::new((0..count).map(|_| gen_element(g, depth)).collect())
}

fn gen_alt_list(g: &mut Gen, depth: usize) -> AltList {
    let count = 1 + usize::arbitrary(g) % 3;
    AltList::new((0..count).map(|_| gen_alternative(g, depth)).collect())
}

fn wrap_rule(g: &mut Gen, block: AltList) -> GrammarTree {
    let decl = if bool::arbitrary(g) {
        Declaration::ParserRule(ParserRule {
            name: "rule".to_string(),
            block: Some(block),
        })
    } else {
        Declaration::LexerRule(LexerRule {
            name: "rule".to_string(),
            fragment: false,
            block: Some(block),
        })
    };
    GrammarTree {
        name: None,
        decls: vec![decl],
    }
}

impl Arbitrary for RuleTree {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = *g.choose(&[1usize, 2, 3]).unwrap();
        let block = gen_alt_list(g, depth);
        RuleTree(wrap_rule(g, block))
    }
}

impl Arbitrary for FlatRule {
    fn arbitrary(g: &mut Gen) -> Self {
        let count = 1 + usize::arbitrary(g) % 8;
        let elements = (0..count)
            .map(|_| Element::plain(gen_leaf(g)))
            .collect();
        let block = AltList::single(Alternative::new(elements));
        FlatRule(wrap_rule(g, block))
    }
}

fn compiler(threshold: usize) -> DiagramCompiler {
    DiagramCompiler::new(DiagramOptions {
        strip_pattern: None,
        wrap_threshold: threshold,
    })
}

fn split_count(script: &str) -> usize {
    script.matches("), Sequence(").count()
}

// Property: without a wrap budget, no sequence is ever split.
fn prop_unbounded_never_wraps(tree: RuleTree) -> bool {
    let diagram = compiler(0).generate(&tree.0, "rule");
    !diagram.wrapped
}

// Property: a rule absent from the tree yields empty output, not an error.
fn prop_absent_rule_is_empty(tree: RuleTree) -> bool {
    let diagram = compiler(0).generate(&tree.0, "no_such_rule");
    diagram.script.is_empty() && !diagram.wrapped
}

// Property: generation is deterministic and leaves no state behind on the
// compiler instance.
fn prop_idempotent(tree: RuleTree) -> bool {
    let compiler = compiler(16);
    let first = compiler.generate(&tree.0, "rule");
    let second = compiler.generate(&tree.0, "rule");
    first == second
}

// Property: shrinking the budget never removes a split, and once a rule
// wraps at threshold T it wraps at every smaller positive threshold.
fn prop_wrap_monotonic(rule: FlatRule) -> bool {
    let thresholds = [80usize, 40, 20, 10, 5, 2, 1];
    let mut last_splits = 0usize;
    let mut last_wrapped = false;
    for threshold in thresholds {
        let diagram = compiler(threshold).generate(&rule.0, "rule");
        let splits = split_count(&diagram.script);
        if splits < last_splits || (last_wrapped && !diagram.wrapped) {
            return false;
        }
        if (splits > 0) != diagram.wrapped {
            return false;
        }
        last_splits = splits;
        last_wrapped = diagram.wrapped;
    }
    true
}

// Property: emitted Terminal labels un-escape back to the stripped source
// text exactly.
fn prop_escape_round_trip(text: String) -> bool {
    let tree = GrammarTree {
        name: None,
        decls: vec![Declaration::ParserRule(ParserRule {
            name: "rule".to_string(),
            block: Some(AltList::single(Alternative::new(vec![Element::plain(
                Item::Literal(text.clone()),
            )]))),
        })],
    };
    let diagram = compiler(0).generate(&tree, "rule");
    let script = diagram.script;
    let Some(rest) = script.strip_prefix("ComplexDiagram(Choice(0, Stack(Sequence(Terminal('")
    else {
        return false;
    };
    let Some(label) = rest.strip_suffix("')))))") else {
        return false;
    };
    unescape(label) == text
}

// Property: the width proxy is the character count of the label, so two
// equal literals fit exactly at twice their length and wrap one short of it.
fn prop_width_is_label_length(len: usize) -> bool {
    let len = 1 + len % 32;
    let text: String = "x".repeat(len);
    let tree = GrammarTree {
        name: None,
        decls: vec![Declaration::ParserRule(ParserRule {
            name: "rule".to_string(),
            block: Some(AltList::single(Alternative::new(vec![
                Element::plain(Item::Literal(text.clone())),
                Element::plain(Item::Literal(text)),
            ]))),
        })],
    };
    let exact = compiler(2 * len).generate(&tree, "rule");
    let short = compiler(2 * len - 1).generate(&tree, "rule");
    !exact.wrapped && short.wrapped
}

fn unescape(label: &str) -> String {
    let mut out = String::new();
    let mut chars = label.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[test]
fn test_unbounded_never_wraps() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop_unbounded_never_wraps as fn(RuleTree) -> bool);
}

#[test]
fn test_absent_rule_is_empty() {
    QuickCheck::new()
        .tests(100)
        .quickcheck(prop_absent_rule_is_empty as fn(RuleTree) -> bool);
}

#[test]
fn test_idempotent() {
    QuickCheck::new()
        .tests(200)
        .quickcheck(prop_idempotent as fn(RuleTree) -> bool);
}

#[test]
fn test_wrap_monotonic() {
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop_wrap_monotonic as fn(FlatRule) -> bool);
}

#[test]
fn test_escape_round_trip() {
    QuickCheck::new()
        .tests(300)
        .quickcheck(prop_escape_round_trip as fn(String) -> bool);
}

#[test]
fn test_width_is_label_length() {
    QuickCheck::new()
        .tests(64)
        .quickcheck(prop_width_is_label_length as fn(usize) -> bool);
}
