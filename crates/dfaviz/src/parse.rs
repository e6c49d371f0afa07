//! Statement-level parser for the graph descriptions the automaton engine
//! emits.
//!
//! Only the fixed subset the engine writes is accepted: a `digraph {` header
//! line, one statement per line, and a closing `}` line. Every statement keeps
//! byte spans into the original text so rewrites can be expressed as splices
//! at absolute offsets instead of substring replacement.

use crate::{StateId, VizError};
use std::collections::BTreeMap;
use std::ops::Range;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attr<'a> {
    pub key: &'a str,
    /// Raw value text; for quoted values this excludes the quotes and keeps
    /// escapes as written.
    pub value: &'a str,
    pub quoted: bool,
    pub span: Range<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrList<'a> {
    /// Span from the opening `[` through the closing `]`.
    pub span: Range<usize>,
    pub attrs: Vec<Attr<'a>>,
}

impl<'a> AttrList<'a> {
    pub fn get(&self, key: &str) -> Option<&Attr<'a>> {
        self.attrs.iter().find(|attr| attr.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Offset of the closing `]`.
    pub fn close_offset(&self) -> usize {
        self.span.end - 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeStatement<'a> {
    pub node_id: &'a str,
    pub state: StateId,
    pub span: Range<usize>,
    pub attrs: AttrList<'a>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeStatement<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub span: Range<usize>,
    pub attrs: Option<AttrList<'a>>,
}

/// A bare `key = value` statement such as `rankdir = LR`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeStatement<'a> {
    pub key: &'a str,
    pub value: &'a str,
    pub span: Range<usize>,
}

/// A `graph [...]`, `node [...]` or `edge [...]` defaults statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultsStatement<'a> {
    pub target: &'a str,
    pub span: Range<usize>,
    pub attrs: AttrList<'a>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement<'a> {
    Node(NodeStatement<'a>),
    Edge(EdgeStatement<'a>),
    Attribute(AttributeStatement<'a>),
    Defaults(DefaultsStatement<'a>),
}

#[derive(Clone, Debug)]
pub struct GraphDescription<'a> {
    source: &'a str,
    statements: Vec<Statement<'a>>,
    nodes_by_state: BTreeMap<StateId, usize>,
    closing_line_start: usize,
}

impl<'a> GraphDescription<'a> {
    pub fn parse(source: &'a str) -> Result<Self, VizError> {
        let lines: Vec<Line<'a>> = content_lines(source).collect();

        let Some((header, rest)) = lines.split_first() else {
            return Err(VizError::InvalidDescription(
                "description is empty".to_string(),
            ));
        };
        if !(header.text.starts_with("digraph") && header.text.ends_with('{')) {
            return Err(VizError::InvalidDescription(format!(
                "expected 'digraph {{' header, found '{}'",
                header.text
            )));
        }

        let Some((closing, body)) = rest.split_last() else {
            return Err(VizError::InvalidDescription(
                "description has no closing '}' line".to_string(),
            ));
        };
        if closing.text != "}" {
            return Err(VizError::InvalidDescription(format!(
                "expected closing '}}' line, found '{}'",
                closing.text
            )));
        }

        let mut statements = Vec::with_capacity(body.len());
        let mut nodes_by_state = BTreeMap::new();
        for line in body {
            let tokens = tokenize(line.text, line.content_start)?;
            let span = line.content_start..line.content_start + line.text.len();
            let Some(statement) = parse_statement(&tokens, span)? else {
                continue;
            };
            if let Statement::Node(node) = &statement {
                if nodes_by_state.insert(node.state, statements.len()).is_some() {
                    return Err(VizError::InvalidDescription(format!(
                        "state {} is labelled by more than one node statement",
                        node.state
                    )));
                }
            }
            statements.push(statement);
        }

        Ok(Self {
            source,
            statements,
            nodes_by_state,
            closing_line_start: closing.line_start,
        })
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn statements(&self) -> &[Statement<'a>] {
        &self.statements
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeStatement<'a>> + '_ {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Node(node) => Some(node),
            _ => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeStatement<'a>> + '_ {
        self.statements.iter().filter_map(|statement| match statement {
            Statement::Edge(edge) => Some(edge),
            _ => None,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes_by_state.len()
    }

    /// Finds the node statement labelled with `state`.
    pub fn locate(&self, state: StateId) -> Result<&NodeStatement<'a>, VizError> {
        self.nodes_by_state
            .get(&state)
            .and_then(|index| match &self.statements[*index] {
                Statement::Node(node) => Some(node),
                _ => None,
            })
            .ok_or(VizError::AnnotationCoverage { state })
    }

    /// Offset of the first byte of the closing delimiter's line.
    pub fn closing_line_start(&self) -> usize {
        self.closing_line_start
    }
}

/// Text inserted at an absolute offset of the original description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
    pub offset: usize,
    pub text: String,
}

impl Splice {
    pub fn new(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            text: text.into(),
        }
    }
}

/// Applies splices in positional order. Offsets refer to `source`, never to
/// partially rewritten text.
pub fn apply_splices(source: &str, mut splices: Vec<Splice>) -> String {
    splices.sort_by_key(|splice| splice.offset);
    let extra: usize = splices.iter().map(|splice| splice.text.len()).sum();
    let mut output = String::with_capacity(source.len() + extra);
    let mut cursor = 0;
    for splice in splices {
        output.push_str(&source[cursor..splice.offset]);
        output.push_str(&splice.text);
        cursor = splice.offset;
    }
    output.push_str(&source[cursor..]);
    output
}

#[derive(Clone, Copy, Debug)]
struct Line<'a> {
    line_start: usize,
    content_start: usize,
    text: &'a str,
}

fn content_lines(source: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    source.split_inclusive('\n').filter_map(move |raw| {
        let line_start = offset;
        offset += raw.len();
        let without_newline = raw.trim_end_matches(['\n', '\r']);
        let text = without_newline.trim();
        if text.is_empty() || text.starts_with("//") {
            return None;
        }
        let leading = without_newline.len() - without_newline.trim_start().len();
        Some(Line {
            line_start,
            content_start: line_start + leading,
            text,
        })
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TokenKind {
    Ident,
    Quoted,
    Arrow,
    Equals,
    OpenBracket,
    CloseBracket,
    Separator,
}

#[derive(Clone, Debug)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
    span: Range<usize>,
}

impl Token<'_> {
    fn is_id(&self) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::Quoted)
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}

fn punctuation(line: &str, base: usize, start: usize, kind: TokenKind) -> Token<'_> {
    Token {
        kind,
        text: &line[start..start + 1],
        span: base + start..base + start + 1,
    }
}

fn tokenize(line: &str, base: usize) -> Result<Vec<Token<'_>>, VizError> {
    let mut tokens = Vec::new();
    let mut index = 0;

    while let Some(ch) = line[index..].chars().next() {
        let start = index;
        let single = |kind| punctuation(line, base, start, kind);

        match ch {
            c if c.is_whitespace() => {
                index += c.len_utf8();
            }
            '[' => {
                tokens.push(single(TokenKind::OpenBracket));
                index += 1;
            }
            ']' => {
                tokens.push(single(TokenKind::CloseBracket));
                index += 1;
            }
            '=' => {
                tokens.push(single(TokenKind::Equals));
                index += 1;
            }
            ',' | ';' => {
                tokens.push(single(TokenKind::Separator));
                index += 1;
            }
            '-' if line[index..].starts_with("->") => {
                index += 2;
                tokens.push(Token {
                    kind: TokenKind::Arrow,
                    text: &line[start..index],
                    span: base + start..base + index,
                });
            }
            '"' => {
                index += 1;
                let mut closed = false;
                while let Some(c) = line[index..].chars().next() {
                    index += c.len_utf8();
                    if c == '\\' {
                        if let Some(escaped) = line[index..].chars().next() {
                            index += escaped.len_utf8();
                        }
                        continue;
                    }
                    if c == '"' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(VizError::InvalidDescription(format!(
                        "unterminated quoted string at offset {}",
                        base + start
                    )));
                }
                tokens.push(Token {
                    kind: TokenKind::Quoted,
                    text: &line[start + 1..index - 1],
                    span: base + start..base + index,
                });
            }
            c if is_ident_char(c) => {
                while let Some(c) = line[index..].chars().next() {
                    if !is_ident_char(c) {
                        break;
                    }
                    index += c.len_utf8();
                }
                tokens.push(Token {
                    kind: TokenKind::Ident,
                    text: &line[start..index],
                    span: base + start..base + index,
                });
            }
            other => {
                return Err(VizError::InvalidDescription(format!(
                    "unexpected character '{other}' at offset {}",
                    base + start
                )));
            }
        }
    }

    Ok(tokens)
}

fn parse_statement<'a>(
    tokens: &[Token<'a>],
    span: Range<usize>,
) -> Result<Option<Statement<'a>>, VizError> {
    let mut end = tokens.len();
    while end > 0 && tokens[end - 1].kind == TokenKind::Separator {
        end -= 1;
    }
    let tokens = &tokens[..end];

    let Some(first) = tokens.first() else {
        return Ok(None);
    };
    if !first.is_id() {
        return Err(unsupported_statement(
            &span,
            "statement must start with an identifier",
        ));
    }

    match tokens.get(1).map(|token| token.kind) {
        Some(TokenKind::Arrow) => {
            let to = tokens
                .get(2)
                .filter(|token| token.is_id())
                .ok_or_else(|| unsupported_statement(&span, "edge has no target"))?;
            let rest = &tokens[3..];
            if rest.iter().any(|token| token.kind == TokenKind::Arrow) {
                return Err(unsupported_statement(&span, "edge chains are not supported"));
            }
            let attrs = if rest.is_empty() {
                None
            } else {
                Some(parse_attr_list(rest, &span)?)
            };
            Ok(Some(Statement::Edge(EdgeStatement {
                from: first.text,
                to: to.text,
                span,
                attrs,
            })))
        }
        Some(TokenKind::Equals) => {
            let value = tokens
                .get(2)
                .filter(|token| token.is_id() && tokens.len() == 3)
                .ok_or_else(|| unsupported_statement(&span, "malformed attribute statement"))?;
            Ok(Some(Statement::Attribute(AttributeStatement {
                key: first.text,
                value: value.text,
                span,
            })))
        }
        Some(TokenKind::OpenBracket)
            if first.kind == TokenKind::Ident
                && matches!(first.text, "graph" | "node" | "edge") =>
        {
            let attrs = parse_attr_list(&tokens[1..], &span)?;
            Ok(Some(Statement::Defaults(DefaultsStatement {
                target: first.text,
                span,
                attrs,
            })))
        }
        Some(TokenKind::OpenBracket) => {
            let attrs = parse_attr_list(&tokens[1..], &span)?;
            let state = node_state(first.text, &attrs)?;
            Ok(Some(Statement::Node(NodeStatement {
                node_id: first.text,
                state,
                span,
                attrs,
            })))
        }
        None => Err(VizError::InvalidDescription(format!(
            "node '{}' has no attribute list and therefore no state label",
            first.text
        ))),
        Some(_) => Err(unsupported_statement(&span, "unexpected token after identifier")),
    }
}

fn parse_attr_list<'a>(
    tokens: &[Token<'a>],
    span: &Range<usize>,
) -> Result<AttrList<'a>, VizError> {
    let (Some(open), Some(close)) = (tokens.first(), tokens.last()) else {
        return Err(unsupported_statement(span, "missing attribute list"));
    };
    if open.kind != TokenKind::OpenBracket
        || close.kind != TokenKind::CloseBracket
        || tokens.len() < 2
    {
        return Err(unsupported_statement(span, "unbalanced attribute list brackets"));
    }

    let inner = &tokens[1..tokens.len() - 1];
    let mut attrs = Vec::new();
    let mut index = 0;
    while index < inner.len() {
        match (inner.get(index), inner.get(index + 1), inner.get(index + 2)) {
            (Some(key), Some(eq), Some(value))
                if key.is_id() && eq.kind == TokenKind::Equals && value.is_id() =>
            {
                attrs.push(Attr {
                    key: key.text,
                    value: value.text,
                    quoted: value.kind == TokenKind::Quoted,
                    span: key.span.start..value.span.end,
                });
                index += 3;
                if inner
                    .get(index)
                    .is_some_and(|token| token.kind == TokenKind::Separator)
                {
                    index += 1;
                }
            }
            _ => {
                return Err(unsupported_statement(
                    span,
                    "malformed attribute in attribute list",
                ));
            }
        }
    }

    Ok(AttrList {
        span: open.span.start..close.span.end,
        attrs,
    })
}

fn node_state(node_id: &str, attrs: &AttrList<'_>) -> Result<StateId, VizError> {
    let label = attrs.get("label").ok_or_else(|| {
        VizError::InvalidDescription(format!("node '{node_id}' has no label attribute"))
    })?;
    if !label.quoted
        || label.value.is_empty()
        || !label.value.bytes().all(|byte| byte.is_ascii_digit())
        || (label.value.len() > 1 && label.value.starts_with('0'))
    {
        return Err(VizError::InvalidDescription(format!(
            "node '{node_id}' label '{}' is not a quoted decimal state id",
            label.value
        )));
    }
    label.value.parse::<u32>().map(StateId).map_err(|_| {
        VizError::InvalidDescription(format!(
            "node '{node_id}' label '{}' is out of range",
            label.value
        ))
    })
}

fn unsupported_statement(span: &Range<usize>, reason: &str) -> VizError {
    VizError::InvalidDescription(format!("{reason} (statement at offset {})", span.start))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_STATES: &str = "digraph {\n    0 [ label = \"0\" ]\n    1 [ label = \"1\" ]\n    2 [ label = \"10\" ]\n    0 -> 1 [ label = \"1\" ]\n    1 -> 2 [ label = \"0\" ]\n}\n";

    #[test]
    fn parse_engine_output_expected_nodes_and_edges() {
        let description = GraphDescription::parse(TEN_STATES).expect("description should parse");
        assert_eq!(description.node_count(), 3);
        assert_eq!(description.edges().count(), 2);

        let node = description.locate(StateId(10)).expect("state 10 should exist");
        assert_eq!(node.node_id, "2");
        assert_eq!(&TEN_STATES[node.attrs.span.clone()], "[ label = \"10\" ]");
    }

    #[test]
    fn locate_state_one_expected_not_state_ten() {
        let description = GraphDescription::parse(TEN_STATES).expect("description should parse");
        let node = description.locate(StateId(1)).expect("state 1 should exist");
        assert_eq!(node.node_id, "1");
        assert_eq!(node.attrs.get("label").map(|attr| attr.value), Some("1"));
    }

    #[test]
    fn locate_missing_state_expected_coverage_error() {
        let description = GraphDescription::parse(TEN_STATES).expect("description should parse");
        let error = description.locate(StateId(3)).expect_err("must fail");
        assert!(matches!(error, VizError::AnnotationCoverage { state: StateId(3) }));
    }

    #[test]
    fn parse_missing_closing_line_expected_invalid_description() {
        let error = GraphDescription::parse("digraph {\n    0 [ label = \"0\" ]\n")
            .expect_err("must fail");
        assert!(error.to_string().contains("closing"));
    }

    #[test]
    fn parse_unterminated_quote_expected_invalid_description() {
        let error = GraphDescription::parse("digraph {\n    0 [ label = \"0 ]\n}\n")
            .expect_err("must fail");
        assert!(error.to_string().contains("unterminated"));
    }

    #[test]
    fn parse_non_integer_label_expected_invalid_description() {
        let error = GraphDescription::parse("digraph {\n    0 [ label = \"q0\" ]\n}\n")
            .expect_err("must fail");
        assert!(matches!(error, VizError::InvalidDescription(_)));
    }

    #[test]
    fn parse_leading_zero_label_expected_invalid_description() {
        let error = GraphDescription::parse("digraph {\n    0 [ label = \"01\" ]\n}\n")
            .expect_err("must fail");
        assert!(matches!(error, VizError::InvalidDescription(_)));
        assert!(error.to_string().contains("'01'"));
    }

    #[test]
    fn parse_duplicate_label_expected_invalid_description() {
        let error = GraphDescription::parse(
            "digraph {\n    0 [ label = \"4\" ]\n    1 [ label = \"4\" ]\n}\n",
        )
        .expect_err("must fail");
        assert!(error.to_string().contains("more than one"));
    }

    #[test]
    fn parse_attribute_and_defaults_statements_expected_classified() {
        let source = "digraph {\n    graph [ rankdir = TB ]\n    0 [ label = \"0\" ]\n    rankdir = LR\n}\n";
        let description = GraphDescription::parse(source).expect("description should parse");
        assert!(matches!(
            description.statements()[0],
            Statement::Defaults(DefaultsStatement { target: "graph", .. })
        ));
        assert!(matches!(
            description.statements()[2],
            Statement::Attribute(AttributeStatement { key: "rankdir", value: "LR", .. })
        ));
        assert_eq!(&source[description.closing_line_start()..], "}\n");
    }

    #[test]
    fn parse_escaped_quote_in_edge_label_expected_single_token() {
        let source = "digraph {\n    0 [ label = \"0\" ]\n    0 -> 0 [ label = \"\\\"\" ]\n}\n";
        let description = GraphDescription::parse(source).expect("description should parse");
        let edge = description.edges().next().expect("edge should exist");
        let label = edge.attrs.as_ref().and_then(|attrs| attrs.get("label"));
        assert_eq!(label.map(|attr| attr.value), Some("\\\""));
    }

    #[test]
    fn apply_splices_unordered_expected_positional_application() {
        let output = apply_splices("a]b]", vec![Splice::new(3, "Y"), Splice::new(1, "X")]);
        assert_eq!(output, "aX]bY]");
    }
}
