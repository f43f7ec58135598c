use std::cmp::Ordering;

use crate::{
    diagnostic::{Diagnostic, Severity},
    surface::{Node, SyntaxNode},
    util::{Located, Location, Position},
};

/// Parses `source` into its top-level S-expressions.
///
/// Parsing stops at the first failure; the diagnostic points at the
/// construct the failure happened in.
pub fn parse(source: &str) -> Result<Vec<Node>, Diagnostic> {
    tracing::debug!(bytes = source.len(), "parsing source");
    let mut parser = Parser::new(source);

    match parser.program() {
        Ok(nodes) => {
            tracing::debug!(nodes = nodes.len(), "parsed source");
            Ok(nodes)
        }
        Err(failure) => {
            tracing::debug!(reason = ?failure.reason, context = ?failure.context.kind, "parse failed");
            Err(failure.into_diagnostic())
        }
    }
}

// the syntactic constructs a failure can be attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    TopLevel,
    InsideList,
    InsideString,
    InsideKeyName,
}

#[derive(Debug, Clone, Copy)]
struct Context {
    kind: ContextKind,
    start: Cursor,
}

// a point in the source: byte offset for slicing, row and column for locations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cursor {
    offset: usize,
    position: Position,
}

#[derive(Debug, Clone, PartialEq)]
enum Reason {
    ListTerminator,
    Expression,
    KeyName,
    MalformedNumber,
    MalformedSymbol,
    MalformedKeyName,
    UnterminatedString,
    InvalidEscape(char),
    UnexpectedClose,
    NestingTooDeep,
}

impl Reason {
    fn severity(&self) -> Severity {
        match self {
            Reason::ListTerminator => Severity::Recoverable,
            _ => Severity::Nonrecoverable,
        }
    }

    fn message(&self) -> String {
        match self {
            Reason::ListTerminator => "expected list terminator".to_string(),
            Reason::Expression => "expected an expression".to_string(),
            Reason::KeyName => "expected key name".to_string(),
            Reason::MalformedNumber => "malformed number literal".to_string(),
            Reason::MalformedSymbol => "malformed symbol".to_string(),
            Reason::MalformedKeyName => "malformed key name".to_string(),
            Reason::UnterminatedString => "unterminated string".to_string(),
            Reason::InvalidEscape(c) => format!("invalid escape sequence \\{c}"),
            Reason::UnexpectedClose => "unexpected )".to_string(),
            Reason::NestingTooDeep => format!("lists nested more than {MAX_NESTING} deep"),
        }
    }
}

#[derive(Debug, Clone)]
struct Failure {
    reason: Reason,
    at: Cursor,
    end: Position,
    context: Context,
}

impl Failure {
    // combine the failures of two alternatives tried from the same point,
    // keeping the one that got further
    fn or(self, other: Failure) -> Failure {
        match other.at.offset.cmp(&self.at.offset) {
            Ordering::Greater => other,
            Ordering::Less => self,
            Ordering::Equal => match (&self.reason, &other.reason) {
                (Reason::Expression, Reason::KeyName) => other,
                _ => self,
            },
        }
    }

    fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::new(
            self.reason.severity(),
            Location::new(self.context.start.position, self.end),
            self.reason.message(),
        )
    }
}

type ParseResult<T> = Result<T, Failure>;

/// How many lists may be open at once, counting the outermost one.
pub const MAX_NESTING: usize = 128;

struct Parser<'src> {
    source: &'src str,
    cursor: Cursor,
    contexts: Vec<Context>,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Parser<'src> {
        Parser {
            source,
            cursor: Cursor {
                offset: 0,
                position: Position::new(1, 1),
            },
            contexts: Vec::new(),
        }
    }

    // program := expr*
    fn program(&mut self) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                return Ok(nodes);
            }

            self.enter(ContextKind::TopLevel, self.cursor);
            if self.peek() == Some(')') {
                return Err(self.fail(Reason::UnexpectedClose));
            }
            nodes.push(self.expr()?);
            self.leave();
        }
    }

    // expr := list | string | key-name | number | symbol
    fn expr(&mut self) -> ParseResult<Node> {
        let alternatives: [fn(&mut Self) -> ParseResult<Node>; 5] = [
            Self::list,
            Self::string,
            Self::key_name,
            Self::number,
            Self::symbol,
        ];

        let start = self.cursor;
        let mut failure: Option<Failure> = None;

        for alternative in alternatives {
            match alternative(self) {
                Ok(node) => return Ok(node),
                // an alternative that consumed input owns the failure
                Err(err) if self.cursor.offset != start.offset => return Err(err),
                Err(err) => {
                    failure = Some(match failure {
                        Some(failure) => failure.or(err),
                        None => err,
                    })
                }
            }
        }

        Err(failure.unwrap_or_else(|| self.fail(Reason::Expression)))
    }

    // list := '(' expr* ')'
    fn list(&mut self) -> ParseResult<Node> {
        let start = self.cursor;
        if self.peek() != Some('(') {
            return Err(self.fail(Reason::Expression));
        }
        if self.open_lists() >= MAX_NESTING {
            return Err(self.fail(Reason::NestingTooDeep));
        }
        self.bump();
        self.enter(ContextKind::InsideList, start);

        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(self.fail(Reason::ListTerminator)),
                Some(')') => {
                    self.bump();
                    break;
                }
                Some(_) => children.push(self.expr()?),
            }
        }

        self.leave();
        Ok(self.located(start, SyntaxNode::List(children)))
    }

    // string := '"' chunk* '"'
    fn string(&mut self) -> ParseResult<Node> {
        let start = self.cursor;
        if !self.eat('"') {
            return Err(self.fail(Reason::Expression));
        }
        self.enter(ContextKind::InsideString, start);

        let mut value = String::new();
        loop {
            match self.peek() {
                None => return Err(self.fail(Reason::UnterminatedString)),
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    let escape = self.cursor;
                    self.bump();
                    let c = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => {
                            return Err(self.fail_from(Reason::InvalidEscape(other), escape))
                        }
                        None => return Err(self.fail(Reason::UnterminatedString)),
                    };
                    self.bump();
                    value.push(c);
                }
                Some(c) => {
                    self.bump();
                    value.push(c);
                }
            }
        }

        self.leave();
        Ok(self.located(start, SyntaxNode::Str(value)))
    }

    // key-name := '@' alnum+
    fn key_name(&mut self) -> ParseResult<Node> {
        let start = self.cursor;
        if !self.eat('@') {
            return Err(self.fail(Reason::Expression));
        }
        self.enter(ContextKind::InsideKeyName, start);

        let name = self.take_while(|c| c.is_ascii_alphanumeric());
        if name.is_empty() {
            // backtrack to the `@`, so that this failure competes with the
            // other alternatives
            let failure = self.fail_from(Reason::KeyName, start);
            self.leave();
            self.cursor = start;
            return Err(failure);
        }

        if !self.at_delimiter() {
            return Err(self.fail(Reason::MalformedKeyName));
        }

        let name = name.to_string();
        self.leave();
        Ok(self.located(start, SyntaxNode::KeyName(name)))
    }

    // number := [+-]? digit+ ('.' digit+)? ([eE] [+-]? digit+)?
    fn number(&mut self) -> ParseResult<Node> {
        let start = self.cursor;
        let signed = matches!(self.peek(), Some('+' | '-'));
        let first_digit = self.peek_nth(usize::from(signed));
        if !first_digit.is_some_and(|c| c.is_ascii_digit()) {
            return Err(self.fail(Reason::Expression));
        }

        if signed {
            self.bump();
        }
        self.take_while(|c| c.is_ascii_digit());

        if self.eat('.') && self.take_while(|c| c.is_ascii_digit()).is_empty() {
            return Err(self.fail_from(Reason::MalformedNumber, start));
        }
        if self.eat('e') || self.eat('E') {
            if !self.eat('+') {
                self.eat('-');
            }
            if self.take_while(|c| c.is_ascii_digit()).is_empty() {
                return Err(self.fail_from(Reason::MalformedNumber, start));
            }
        }
        if !self.at_delimiter() {
            return Err(self.fail_from(Reason::MalformedNumber, start));
        }

        let text = &self.source[start.offset..self.cursor.offset];
        let value = text
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| self.fail_from(Reason::MalformedNumber, start))?;

        Ok(self.located(start, SyntaxNode::Number(value)))
    }

    // symbol := symbol-start symbol-continue*
    fn symbol(&mut self) -> ParseResult<Node> {
        let start = self.cursor;
        if !self.peek().is_some_and(is_symbol_start) {
            return Err(self.fail(Reason::Expression));
        }

        let name = self.take_while(is_symbol_continue).to_string();
        if !self.at_delimiter() {
            return Err(self.fail_from(Reason::MalformedSymbol, start));
        }

        Ok(self.located(start, SyntaxNode::Symbol(name)))
    }

    // context stack

    fn enter(&mut self, kind: ContextKind, start: Cursor) {
        self.contexts.push(Context { kind, start });
    }

    fn leave(&mut self) {
        self.contexts.pop();
    }

    fn open_lists(&self) -> usize {
        self.contexts
            .iter()
            .filter(|context| context.kind == ContextKind::InsideList)
            .count()
    }

    // "inside some list" says little about what was expected, so a failure
    // directly inside a list is attributed to the context around the list
    fn attributed_context(&self) -> Context {
        let mut contexts = self.contexts.iter().rev();

        match contexts.next() {
            Some(innermost) if innermost.kind == ContextKind::InsideList => {
                contexts.next().copied().unwrap_or(*innermost)
            }
            Some(innermost) => *innermost,
            None => Context {
                kind: ContextKind::TopLevel,
                start: self.cursor,
            },
        }
    }

    // failures

    fn fail(&self, reason: Reason) -> Failure {
        self.fail_from(reason, self.cursor)
    }

    fn fail_from(&self, reason: Reason, at: Cursor) -> Failure {
        Failure {
            reason,
            at,
            end: self.offending_end(),
            context: self.attributed_context(),
        }
    }

    // the position just past the character the parser gave up on
    fn offending_end(&self) -> Position {
        let Position { row, col } = self.cursor.position;

        match self.peek() {
            None => self.cursor.position,
            Some('\n') => Position::new(row + 1, 1),
            Some(_) => Position::new(row, col + 1),
        }
    }

    // characters

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn rest(&self) -> &'src str {
        &self.source[self.cursor.offset..]
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        let position = &mut self.cursor.position;

        self.cursor.offset += c.len_utf8();
        if c == '\n' {
            position.row += 1;
            position.col = 1;
        } else {
            position.col += 1;
        }

        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'src str {
        let start = self.cursor.offset;
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
        &self.source[start..self.cursor.offset]
    }

    // atoms must end at whitespace, a parenthesis, a quote or the end of input
    fn at_delimiter(&self) -> bool {
        self.peek().map_or(true, is_delimiter)
    }

    fn skip_whitespace(&mut self) {
        self.take_while(is_whitespace);
    }

    fn located(&self, start: Cursor, data: SyntaxNode) -> Node {
        Located::new(Location::new(start.position, self.cursor.position), data)
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_delimiter(c: char) -> bool {
    is_whitespace(c) || matches!(c, '(' | ')' | '"')
}

fn is_symbol_punctuation(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/' | '?' | '=' | '<' | '>' | '_' | '!')
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || is_symbol_punctuation(c)
}

fn is_symbol_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_symbol_punctuation(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(r0: usize, c0: usize, r1: usize, c1: usize) -> Location {
        Location::new(Position::new(r0, c0), Position::new(r1, c1))
    }

    fn parse_one(source: &str) -> Node {
        let mut nodes = parse(source).unwrap();
        assert_eq!(nodes.len(), 1, "expected a single expression");
        nodes.remove(0)
    }

    fn parse_err(source: &str) -> Diagnostic {
        parse(source).unwrap_err()
    }

    fn children(node: &Node) -> &[Node] {
        match &node.data {
            SyntaxNode::List(children) => children,
            _ => panic!("expected a list, found {:?}", node.data),
        }
    }

    fn assert_contains_children(node: &Node) {
        if let SyntaxNode::List(children) = &node.data {
            for child in children {
                assert!(
                    node.location.contains(&child.location),
                    "{} does not contain {}",
                    node.location,
                    child.location
                );
                assert_contains_children(child);
            }
        }
    }

    #[test]
    fn parses_empty_source() {
        assert_eq!(parse("").unwrap(), vec![]);
        assert_eq!(parse(" \n\t\r\n ").unwrap(), vec![]);
    }

    #[test]
    fn parses_flat_list() {
        let node = parse_one("(set x 5)");
        assert_eq!(node.location, loc(1, 1, 1, 10));

        let children = children(&node);
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].data, SyntaxNode::Symbol("set".to_string()));
        assert_eq!(children[0].location, loc(1, 2, 1, 5));
        assert_eq!(children[1].data, SyntaxNode::Symbol("x".to_string()));
        assert_eq!(children[1].location, loc(1, 6, 1, 7));
        assert_eq!(children[2].data, SyntaxNode::Number(5.0));
        assert_eq!(children[2].location, loc(1, 8, 1, 9));
    }

    #[test]
    fn parses_several_top_level_forms() {
        let nodes = parse("(init) (update)\n(draw)").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[1].location, loc(1, 8, 1, 16));
        assert_eq!(nodes[2].location, loc(2, 1, 2, 7));
    }

    #[test]
    fn tracks_rows_and_columns() {
        let node = parse_one("(init\n  (draw-text \"hi\"))");
        assert_eq!(node.location, loc(1, 1, 2, 20));

        let inner = &children(&node)[1];
        assert_eq!(inner.location, loc(2, 3, 2, 19));
        assert_eq!(children(inner)[1].data, SyntaxNode::Str("hi".to_string()));
        assert_eq!(children(inner)[1].location, loc(2, 14, 2, 18));
    }

    #[test]
    fn columns_count_characters() {
        let nodes = parse("\"héllo\" x").unwrap();
        assert_eq!(nodes[0].data, SyntaxNode::Str("héllo".to_string()));
        assert_eq!(nodes[1].location, loc(1, 9, 1, 10));
    }

    #[test]
    fn parents_contain_children() {
        let source = "(init (set x 5))\n(update\n  (if (< x 10)\n    (set x (+ x @up \"s\"))))";
        for node in parse(source).unwrap() {
            assert_contains_children(&node);
        }
    }

    #[test]
    fn parses_numbers() {
        for (source, value) in [
            ("5", 5.0),
            ("-5", -5.0),
            ("+2.5", 2.5),
            ("1e3", 1000.0),
            ("-1.5e-2", -0.015),
            ("0.25E+1", 2.5),
        ] {
            assert_eq!(parse_one(source).data, SyntaxNode::Number(value), "{source}");
        }
    }

    #[test]
    fn parses_symbols() {
        for source in ["x", "-", "+", "-x", "<=", "empty?", "set!", "snake_case", "a1", "*/"] {
            assert_eq!(
                parse_one(source).data,
                SyntaxNode::Symbol(source.to_string()),
                "{source}"
            );
        }
    }

    #[test]
    fn parses_key_names() {
        let node = parse_one("@return");
        assert_eq!(node.data, SyntaxNode::KeyName("return".to_string()));
        assert_eq!(node.location, loc(1, 1, 1, 8));

        let node = parse_one("(f @7)");
        assert_eq!(children(&node)[1].data, SyntaxNode::KeyName("7".to_string()));
    }

    #[test]
    fn parses_string_escapes() {
        let node = parse_one(r#""a\n\t\"\\b""#);
        assert_eq!(node.data, SyntaxNode::Str("a\n\t\"\\b".to_string()));
    }

    #[test]
    fn strings_may_span_lines() {
        let node = parse_one("\"a\nb\"");
        assert_eq!(node.data, SyntaxNode::Str("a\nb".to_string()));
        assert_eq!(node.location, loc(1, 1, 2, 3));
    }

    #[test]
    fn missing_terminator_is_recoverable() {
        let err = parse_err("(init (set x 5)");
        assert_eq!(err.message, "expected list terminator");
        assert_eq!(err.severity, Severity::Recoverable);
        assert_eq!(err.location, loc(1, 1, 1, 16));
    }

    #[test]
    fn failure_inside_list_is_attributed_to_the_enclosing_context() {
        // fails inside `(if`, but points at the surrounding `(init`
        let err = parse_err("(init\n  (if x");
        assert_eq!(err.message, "expected list terminator");
        assert_eq!(err.location, loc(1, 1, 2, 8));
    }

    #[test]
    fn invalid_escape() {
        let err = parse_err(r#"(init "a\qb")"#);
        assert_eq!(err.message, r"invalid escape sequence \q");
        assert_eq!(err.severity, Severity::Nonrecoverable);
        assert_eq!(err.location, loc(1, 7, 1, 11));
    }

    #[test]
    fn unterminated_string() {
        let err = parse_err("(init \"abc");
        assert_eq!(err.message, "unterminated string");
        assert_eq!(err.severity, Severity::Nonrecoverable);
        assert_eq!(err.location, loc(1, 7, 1, 11));

        let err = parse_err("\"abc\\");
        assert_eq!(err.message, "unterminated string");
    }

    #[test]
    fn key_name_beats_expression() {
        let err = parse_err("(init @)");
        assert_eq!(err.message, "expected key name");
        assert_eq!(err.location, loc(1, 7, 1, 9));

        let err = parse_err("@");
        assert_eq!(err.message, "expected key name");
        assert_eq!(err.location, loc(1, 1, 1, 2));
    }

    #[test]
    fn malformed_numbers() {
        for source in ["1x", "1.", "1e", "1.2.3", "-3e+", "5@up"] {
            let err = parse_err(source);
            assert_eq!(err.message, "malformed number literal", "{source}");
            assert_eq!(err.severity, Severity::Nonrecoverable);
        }

        let err = parse_err("(init 1x)");
        assert_eq!(err.location, loc(1, 1, 1, 9));
    }

    #[test]
    fn expected_expression() {
        let err = parse_err("(init #)");
        assert_eq!(err.message, "expected an expression");
        assert_eq!(err.severity, Severity::Nonrecoverable);
        assert_eq!(err.location, loc(1, 1, 1, 8));
    }

    #[test]
    fn stray_close_paren() {
        let err = parse_err("(init) )");
        assert_eq!(err.message, "unexpected )");
        assert_eq!(err.severity, Severity::Nonrecoverable);
        assert_eq!(err.location, loc(1, 8, 1, 9));
    }

    fn nested(depth: usize) -> String {
        format!("{}x{}", "(f ".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn nesting_up_to_the_limit() {
        let mut node = parse_one(&nested(MAX_NESTING));
        for _ in 1..MAX_NESTING {
            node = children(&node)[1].clone();
        }
        assert_eq!(children(&node)[1].data, SyntaxNode::Symbol("x".to_string()));
    }

    #[test]
    fn nesting_past_the_limit() {
        let err = parse_err(&nested(MAX_NESTING + 1));
        assert_eq!(err.message, format!("lists nested more than {MAX_NESTING} deep"));
        assert_eq!(err.severity, Severity::Nonrecoverable);

        // points from the list two levels out to the `(` that opens one too many
        let col = 3 * MAX_NESTING + 1;
        assert_eq!(err.location, loc(1, col - 6, 1, col + 1));

        let err = parse_err(&nested(10 * MAX_NESTING));
        assert_eq!(err.message, format!("lists nested more than {MAX_NESTING} deep"));
    }

    #[test]
    fn numbers_must_be_finite() {
        for source in ["1e999", "-1e400", "(f 2e308)"] {
            let err = parse_err(source);
            assert_eq!(err.message, "malformed number literal", "{source}");
        }
        assert_eq!(parse_one("1e308").data, SyntaxNode::Number(1e308));
    }

    #[test]
    fn atoms_end_at_delimiters() {
        let err = parse_err("(f @up-x)");
        assert_eq!(err.message, "malformed key name");
        assert_eq!(err.severity, Severity::Nonrecoverable);
        assert_eq!(err.location, loc(1, 4, 1, 8));

        let err = parse_err("(f abc#)");
        assert_eq!(err.message, "malformed symbol");
        assert_eq!(err.location, loc(1, 1, 1, 8));

        let err = parse_err("abc@up");
        assert_eq!(err.message, "malformed symbol");

        // quotes and parentheses still separate atoms
        let node = parse_one("(f abc\"s\"(g) @up(h))");
        assert_eq!(children(&node).len(), 6);
    }

    #[test]
    fn parsing_is_deterministic() {
        for source in ["(init (set x 5))", "(init (set x 5)", "(init @)"] {
            assert_eq!(parse(source), parse(source));
        }
    }
}
