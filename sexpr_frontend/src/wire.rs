//! JSON encoding of syntax trees and diagnostics for external tooling.
//!
//! Every encoded object carries its location flattened into `startRow`,
//! `startCol`, `endRow` and `endCol`. Syntax nodes are tagged by `type`:
//!
//! ```json
//! { "type": "list", "startRow": 1, "startCol": 1, "endRow": 1, "endCol": 7,
//!   "children": [
//!     { "type": "symbol", "ident": "f", "startRow": 1, ... },
//!     { "type": "key", "name": "up", "startRow": 1, ... }
//!   ] }
//! ```

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;

use crate::{
    diagnostic::Diagnostic,
    surface::{Node, SyntaxNode},
    util::{Located, Location},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationFields {
    start_row: usize,
    start_col: usize,
    end_row: usize,
    end_col: usize,
}

impl From<Location> for LocationFields {
    fn from(location: Location) -> Self {
        LocationFields {
            start_row: location.start.row,
            start_col: location.start.col,
            end_row: location.end.row,
            end_col: location.end.col,
        }
    }
}

#[derive(Serialize)]
struct EncodedDiagnostic<'a> {
    #[serde(flatten)]
    location: LocationFields,
    recoverable: bool,
    msg: &'a str,
}

// syntax nodes borrow the tree rather than copying it
struct EncodedNode<'a>(&'a Node);

impl Serialize for EncodedNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Located { location, data } = self.0;
        let fields = LocationFields::from(*location);

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("startRow", &fields.start_row)?;
        map.serialize_entry("startCol", &fields.start_col)?;
        map.serialize_entry("endRow", &fields.end_row)?;
        map.serialize_entry("endCol", &fields.end_col)?;

        match data {
            SyntaxNode::List(children) => {
                map.serialize_entry("type", "list")?;
                let children: Vec<_> = children.iter().map(EncodedNode).collect();
                map.serialize_entry("children", &children)?;
            }
            SyntaxNode::Symbol(ident) => {
                map.serialize_entry("type", "symbol")?;
                map.serialize_entry("ident", ident)?;
            }
            SyntaxNode::Str(value) => {
                map.serialize_entry("type", "str")?;
                map.serialize_entry("value", value)?;
            }
            SyntaxNode::Number(value) => {
                map.serialize_entry("type", "num")?;
                map.serialize_entry("value", value)?;
            }
            SyntaxNode::KeyName(name) => {
                map.serialize_entry("type", "key")?;
                map.serialize_entry("name", name)?;
            }
        }

        map.end()
    }
}

/// Encodes a parsed program as a JSON array of syntax nodes.
pub fn encode_nodes(nodes: &[Node]) -> serde_json::Result<Value> {
    serde_json::to_value(nodes.iter().map(EncodedNode).collect::<Vec<_>>())
}

/// Encodes a diagnostic as a JSON object.
pub fn encode_diagnostic(diagnostic: &Diagnostic) -> serde_json::Result<Value> {
    serde_json::to_value(EncodedDiagnostic {
        location: diagnostic.location.into(),
        recoverable: diagnostic.is_recoverable(),
        msg: &diagnostic.message,
    })
}
