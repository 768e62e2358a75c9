//! Semantic analysis core for JavaScript and TypeScript.
//!
//! `ibis-core` turns source text into an AST (via SWC) and provides the two
//! analyses lint rules build on: control flow graph construction over
//! statement sequences and structural equivalence between syntax subtrees.

pub mod config;
pub mod parser;
pub mod semantic;

pub use config::{Config, ConfigError, ParserConfig};
pub use parser::{Language, ParseError, ParsedFile, Parser};
pub use semantic::{BasicBlock, BlockId, CfgElement, ControlFlowGraph};
