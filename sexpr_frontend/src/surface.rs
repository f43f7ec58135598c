use itertools::Itertools;

use crate::{
    core::{declared_handlers, Body, Expr, Handler, Program},
    diagnostic::Diagnostic,
    keys,
    util::{Located, Location},
};

// S-expressions as written in the source, before their shape is checked
pub type Node = Located<SyntaxNode>;
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxNode {
    // Parenthesized lists: [ (f x y) ]
    List(Vec<Node>),

    // Names: [ x ]
    Symbol(String),

    // String literals, with escapes already decoded: [ "hi\n" ]
    Str(String),

    // Number literals: [ -1.5e3 ]
    Number(f64),

    // Key names, as written (not yet resolved): [ @up ]
    KeyName(String),
}

const NOT_A_DECLARATION: &str = "top-level expression must be an init, update, or draw declaration";

/// Checks the shape of every top-level form and assembles the program,
/// stopping at the first error.
pub fn process_program(nodes: Vec<Node>) -> Result<Program, Diagnostic> {
    tracing::debug!(nodes = nodes.len(), "processing program");
    let program = nodes
        .into_iter()
        .try_fold(Program::default(), process_top_level)?;

    tracing::debug!(handlers = %declared_handlers(&program), "processed program");
    Ok(program)
}

/// Adds one `(init ...)`, `(update ...)` or `(draw ...)` declaration to
/// `program`.
pub fn process_top_level(program: Program, node: Node) -> Result<Program, Diagnostic> {
    let Located { location, data } = node;
    let not_a_declaration = || Diagnostic::nonrecoverable(location, NOT_A_DECLARATION);

    let SyntaxNode::List(children) = data else {
        return Err(not_a_declaration());
    };
    let mut children = children.into_iter();
    let handler = match children.next() {
        Some(Located {
            data: SyntaxNode::Symbol(name),
            ..
        }) => Handler::from_name(&name).ok_or_else(not_a_declaration)?,
        _ => return Err(not_a_declaration()),
    };

    tracing::trace!(handler = handler.name(), %location, "processing declaration");
    let body = process_body(children)?;

    program.declare(handler, body).map_err(|_| {
        Diagnostic::nonrecoverable(location, format!("duplicate {} declaration", handler.name()))
    })
}

/// Checks a single expression.
pub fn process_expr(node: Node) -> Result<Located<Expr>, Diagnostic> {
    let Located { location, data } = node;

    let expr = match data {
        SyntaxNode::Str(s) => Expr::StringLit(s),
        SyntaxNode::Number(n) => Expr::NumberLit(n),
        SyntaxNode::KeyName(name) => Expr::KeyLit(resolve_key(&name, location)?),
        SyntaxNode::Symbol(name) => Expr::GetVar(name),
        SyntaxNode::List(children) => process_list(location, children)?,
    };

    Ok(Located::new(location, expr))
}

fn process_body(nodes: impl IntoIterator<Item = Node>) -> Result<Body, Diagnostic> {
    nodes.into_iter().map(process_expr).collect()
}

fn process_list(location: Location, children: Vec<Node>) -> Result<Expr, Diagnostic> {
    let mut children = children.into_iter();

    let head = children.next().ok_or_else(|| {
        Diagnostic::nonrecoverable(location, "empty list is not a valid expression")
    })?;
    let name = expect_symbol(head, "first element of a list must be a symbol")?;

    match name.data.as_str() {
        "if" => process_if(location, children),
        "set" => process_set(location, children),
        _ => Ok(Expr::FuncCall {
            name,
            args: process_body(children)?,
        }),
    }
}

// (if cond body...)
fn process_if(location: Location, mut operands: impl Iterator<Item = Node>) -> Result<Expr, Diagnostic> {
    let cond = operands
        .next()
        .ok_or_else(|| Diagnostic::nonrecoverable(location, "if missing condition"))?;
    let cond = process_expr(cond)?;

    Ok(Expr::If {
        cond: Box::new(cond),
        body: process_body(operands)?,
    })
}

// (set target value)
fn process_set(location: Location, mut operands: impl Iterator<Item = Node>) -> Result<Expr, Diagnostic> {
    let arity_error = |message: &str| -> Result<Expr, Diagnostic> {
        Err(Diagnostic::nonrecoverable(location, message))
    };

    match (operands.next(), operands.next(), operands.next()) {
        (None, _, _) => arity_error("missing operands to set"),
        (Some(_), None, _) => arity_error("missing value to set the variable to"),
        (Some(_), Some(_), Some(_)) => arity_error("too many operands to set"),
        (Some(target), Some(value), None) => {
            let target = expect_symbol(target, "first operand to set must be a symbol")?;

            Ok(Expr::SetVar {
                target,
                value: Box::new(process_expr(value)?),
            })
        }
    }
}

fn expect_symbol(node: Node, message: &str) -> Result<Located<String>, Diagnostic> {
    match node.data {
        SyntaxNode::Symbol(name) => Ok(Located::new(node.location, name)),
        _ => Err(Diagnostic::nonrecoverable(node.location, message)),
    }
}

fn resolve_key(name: &str, location: Location) -> Result<i32, Diagnostic> {
    keys::resolve(name).ok_or_else(|| {
        let suggestions = keys::suggest(name);
        let message = if suggestions.is_empty() {
            format!("unknown key name @{name}")
        } else {
            format!(
                "unknown key name @{name}; did you mean {}?",
                suggestions.iter().map(|s| format!("@{s}")).join(" or ")
            )
        };

        Diagnostic::nonrecoverable(location, message)
    })
}
