//! # Devicetree source parser
//!
//! Parses [Devicetree][1] source into a forest of typed [`Node`]s for build-time tooling.
//!
//! Supported are node and property definitions, labels and unit addresses, `/dts-v1/;`,
//! `/include/` and `/memreserve/`. Nodes defined more than once, directly or through includes,
//! are merged.
//!
//! # Example
//!
//! ```
//! use dts_parser::{parse_str, ParseOptions, Value};
//!
//! let text = "
//! /dts-v1/;
//!
//! / {
//!     uart0: uart@4000 {
//!         compatible = \"ns16550a\";
//!         reg = <0x4000 (0x100 * 2)>;
//!     };
//! };
//!
//! / {
//!     uart@4000 { status = \"okay\"; };
//! };
//! ";
//! let tree = parse_str(text, &ParseOptions::default()).unwrap();
//! let uart = tree["/"].child("uart@4000").unwrap();
//! assert_eq!(uart.label.as_deref(), Some("uart0"));
//! assert_eq!(uart.address, Some(0x4000));
//! assert_eq!(
//!     uart.property("reg"),
//!     Some(&Value::CellArray(vec![Value::Integer(0x4000), Value::Integer(0x200)]))
//! );
//! assert_eq!(uart.property("status"), Some(&Value::String("okay".to_owned())));
//! ```
//!
//! [1]: https://www.devicetree.org/

use std::sync::Arc;

mod clean;
mod error;
pub mod expr;
mod file;
mod node;
mod parser;
mod source;
mod string;
mod value;

pub use clean::clean_line;
pub use error::{
    ExprError, IncludeError, ParseError, ParseErrorKind, StructuralError, SyntaxError,
    VersionError,
};
pub use expr::eval_expr;
pub use file::{parse_file, parse_path, parse_str, reserved_memory_name, ParseOptions};
pub use node::{merge_into, Node, Tree};
pub use parser::{parse_node, parse_property, DEFAULT_MAX_DEPTH};
pub use source::LineSource;
pub use string::{interpret_escaped_string, StringParseError};
pub use value::{parse_integer, parse_value, Value};

/// Name of a file or stream, used in error locations.
pub type SourceId = Arc<str>;
