//! Serializable view of a control flow graph.
//!
//! Flattens a [`ControlFlowGraph`] into plain node and edge lists with
//! source-text labels, for JSON dumps in tests and debugging tools.

use serde::Serialize;

use super::cfg::ControlFlowGraph;
use crate::parser::ParsedFile;

#[derive(Debug, Serialize)]
pub struct CfgView {
    pub nodes: Vec<CfgViewNode>,
    pub edges: Vec<CfgViewEdge>,
}

#[derive(Debug, Serialize)]
pub struct CfgViewNode {
    pub id: usize,
    /// Source text of the block's elements, one line per element.
    pub label: String,
    pub is_start: bool,
    pub is_end: bool,
}

#[derive(Debug, Serialize)]
pub struct CfgViewEdge {
    pub from: usize,
    pub to: usize,
    /// Marks the hypothetical fall-through edge of a jump block rather
    /// than a real control flow edge.
    pub without_jump: bool,
}

impl CfgView {
    pub fn build(cfg: &ControlFlowGraph<'_>, file: &ParsedFile) -> CfgView {
        let mut nodes = Vec::with_capacity(cfg.block_count());
        let mut edges = Vec::new();

        for block in cfg.blocks() {
            let id = block.id.index();
            let is_end = block.id == cfg.end();

            let label = if is_end {
                "END".to_string()
            } else {
                block
                    .elements
                    .iter()
                    .map(|e| file.span_text(e.span()).unwrap_or("<?>"))
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            nodes.push(CfgViewNode {
                id,
                label,
                is_start: block.id == cfg.start(),
                is_end,
            });

            for &succ in &block.successors {
                edges.push(CfgViewEdge {
                    from: id,
                    to: succ.index(),
                    without_jump: false,
                });
            }
            if let Some(without) = block.successor_without_jump {
                edges.push(CfgViewEdge {
                    from: id,
                    to: without.index(),
                    without_jump: true,
                });
            }
        }

        CfgView { nodes, edges }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
