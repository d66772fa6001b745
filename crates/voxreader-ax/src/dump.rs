//! Recursive element-tree dumps for the file sink.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::attr::Attr;
use crate::element::Element;
use crate::error::{AxCode, AxResult};
use crate::gateway::Gateway;

/// One dumped element: every readable attribute (flattened per the dump
/// encoding), the parameterized-attribute and action vocabularies, and the
/// recursive structure where requested.
#[derive(Debug, Clone, Serialize)]
pub struct DumpNode {
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "parameterizedAttributes")]
    pub parameterized_attributes: Vec<String>,
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<DumpNode>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DumpNode>,
}

/// Dump an element and, optionally, its ancestor chain and its subtree.
///
/// Returns `Ok(None)` when the element vanished before the dump could read
/// it. Children that vanish mid-walk are skipped rather than aborting the
/// whole dump. Dumping a full application is thousands of attribute
/// round-trips; the walk yields between sibling subtrees so the owning
/// thread stays responsive to its other channels.
pub fn dump(
    gw: &dyn Gateway,
    element: Element,
    recurse_parents: bool,
    recurse_children: bool,
) -> AxResult<Option<DumpNode>> {
    match node(gw, element, recurse_parents, recurse_children) {
        Ok(n) => Ok(Some(n)),
        Err(e) if e.code() == AxCode::InvalidElement => Ok(None),
        Err(e) => Err(e),
    }
}

fn node(
    gw: &dyn Gateway,
    element: Element,
    recurse_parents: bool,
    recurse_children: bool,
) -> AxResult<DumpNode> {
    let mut attributes = BTreeMap::new();
    for name in gw.list_attributes(element)? {
        if let Some(value) = gw.raw_attribute(element, &name)? {
            attributes.insert(name, value.to_dump_json());
        }
    }

    let parameterized_attributes = gw.list_parameterized_attributes(element)?;
    let actions = gw.list_actions(element)?.into_iter().map(|(id, _)| id).collect();

    let parent = if recurse_parents {
        match gw.element_attr(element, Attr::Parent)? {
            // Parent chains recurse upward only; a parent never re-lists its
            // children, so the dump stays a tree.
            Some(p) => node(gw, p, true, false).ok().map(Box::new),
            None => None,
        }
    } else {
        None
    };

    let mut children = Vec::new();
    if recurse_children {
        for child in gw.elements_attr(element, Attr::Children)? {
            match node(gw, child, false, true) {
                Ok(n) => children.push(n),
                Err(e) => log::debug!("skipping child {child} in dump: {e}"),
            }
            std::thread::yield_now();
        }
    }

    Ok(DumpNode { attributes, parameterized_attributes, actions, parent, children })
}
