use std::fmt::Display;

use itertools::Itertools;

use crate::util::{Located, Location};

// expressions of a validated program
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Assignments: [ (set x 5) ]
    SetVar {
        target: Located<String>,
        value: Box<Located<Expr>>,
    },

    // Variable references: [ x ]
    GetVar(String),

    // Calls to anything that isn't a special form: [ (draw-text "hi" 1 2) ]
    // The name is resolved by whatever consumes the program.
    FuncCall {
        name: Located<String>,
        args: Vec<Located<Expr>>,
    },

    // Conditionals, running the body when the condition holds: [ (if c a b) ]
    If {
        cond: Box<Located<Expr>>,
        body: Vec<Located<Expr>>,
    },

    // String literals: [ "hi" ]
    StringLit(String),

    // Number literals: [ 1.5 ]
    NumberLit(f64),

    // Key literals, already resolved to their key code: [ @up ]
    KeyLit(i32),
}

pub type Body = Vec<Located<Expr>>;

/// The lifecycle handlers a program may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Init,
    Update,
    Draw,
}

impl Handler {
    pub fn from_name(name: &str) -> Option<Handler> {
        match name {
            "init" => Some(Handler::Init),
            "update" => Some(Handler::Update),
            "draw" => Some(Handler::Draw),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Handler::Init => "init",
            Handler::Update => "update",
            Handler::Draw => "draw",
        }
    }
}

/// A validated program: each handler is declared at most once.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    // nothing declares variables yet
    pub vars: Vec<String>,
    pub init: Option<Body>,
    pub update: Option<Body>,
    pub draw: Option<Body>,
}

impl Program {
    pub fn handler(&self, handler: Handler) -> Option<&Body> {
        match handler {
            Handler::Init => self.init.as_ref(),
            Handler::Update => self.update.as_ref(),
            Handler::Draw => self.draw.as_ref(),
        }
    }

    fn handler_mut(&mut self, handler: Handler) -> &mut Option<Body> {
        match handler {
            Handler::Init => &mut self.init,
            Handler::Update => &mut self.update,
            Handler::Draw => &mut self.draw,
        }
    }

    /// Sets the body of `handler`, or hands the body back if the handler was
    /// already declared.
    pub fn declare(mut self, handler: Handler, body: Body) -> Result<Program, Body> {
        let slot = self.handler_mut(handler);
        if slot.is_some() {
            return Err(body);
        }
        *slot = Some(body);
        Ok(self)
    }
}

// Pretty printing, in the same S-expression form the source is written in

fn write_escaped(f: &mut std::fmt::Formatter<'_>, s: &str) -> std::fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn write_list(
    f: &mut std::fmt::Formatter<'_>,
    head: &str,
    items: &[Located<Expr>],
) -> std::fmt::Result {
    write!(f, "({head}")?;
    for item in items {
        write!(f, " {}", item.data)?;
    }
    f.write_str(")")
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::SetVar { target, value } => write!(f, "(set {} {})", target.data, value.data),
            Expr::GetVar(name) => f.write_str(name),
            Expr::FuncCall { name, args } => write_list(f, &name.data, args),
            Expr::If { cond, body } => {
                write!(f, "(if {}", cond.data)?;
                for expr in body {
                    write!(f, " {}", expr.data)?;
                }
                f.write_str(")")
            }
            Expr::StringLit(s) => write_escaped(f, s),
            Expr::NumberLit(n) => write!(f, "{n}"),
            Expr::KeyLit(code) => write!(f, "(key {code})"),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = [Handler::Init, Handler::Update, Handler::Draw]
            .into_iter()
            .filter_map(|handler| self.handler(handler).map(|body| (handler, body)));

        for (i, (handler, body)) in handlers.enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write_list(f, handler.name(), body)?;
        }
        Ok(())
    }
}

impl Located<Expr> {
    /// Every location in this expression tree, outermost first.
    pub fn locations(&self) -> Vec<Location> {
        let mut locations = vec![self.location];
        match &self.data {
            Expr::SetVar { target, value } => {
                locations.push(target.location);
                locations.extend(value.locations());
            }
            Expr::FuncCall { name, args } => {
                locations.push(name.location);
                locations.extend(args.iter().flat_map(|arg| arg.locations()));
            }
            Expr::If { cond, body } => {
                locations.extend(cond.locations());
                locations.extend(body.iter().flat_map(|expr| expr.locations()));
            }
            Expr::GetVar(_) | Expr::StringLit(_) | Expr::NumberLit(_) | Expr::KeyLit(_) => {}
        }
        locations
    }
}

/// Names of the handlers a program declares, in declaration slot order.
pub fn declared_handlers(program: &Program) -> String {
    [Handler::Init, Handler::Update, Handler::Draw]
        .into_iter()
        .filter(|handler| program.handler(*handler).is_some())
        .map(Handler::name)
        .join(", ")
}
