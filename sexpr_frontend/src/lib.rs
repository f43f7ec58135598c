//! Front end for a small S-expression scripting language.
//!
//! A program declares up to three lifecycle handlers, `init`, `update` and
//! `draw`, each a sequence of expressions:
//!
//! ```text
//! (init (set x 0))
//! (update (if (key-down @right) (set x (+ x 1))))
//! (draw (draw-rect x 10 8 8))
//! ```
//!
//! Source text goes through two stages:
//!
//!   source -> parse   (located S-expressions, `surface::Node`)
//!          -> surface (checked program, `core::Program`)
//!
//! Either stage stops at its first failure and reports a single
//! `Diagnostic`.

pub mod core;
pub mod diagnostic;
pub mod keys;
pub mod parse;
pub mod surface;
pub mod util;
pub mod wire;

#[cfg(test)]
mod test;

pub use crate::{
    core::{Expr, Handler, Program},
    diagnostic::{Diagnostic, Severity},
    parse::parse,
    surface::{process_program, Node, SyntaxNode},
    util::{Located, Location, Position},
};

/// Parses and checks a whole program.
pub fn compile(source: &str) -> Result<Program, Diagnostic> {
    let nodes = parse(source)?;
    process_program(nodes)
}
