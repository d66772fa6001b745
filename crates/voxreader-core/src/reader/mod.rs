//! Role-dispatched semantic readers.
//!
//! A reader turns an element into an ordered token list. The strategy is
//! picked once, when a focus is created: rows, columns, and cells pass
//! through to their children's summaries; outlines and tables add container
//! detail; everything else reads generically.

pub mod container;
pub mod generic;
pub mod selection;

use voxreader_ax::{AxResult, Element, Gateway, Role};

use crate::tokens::OutputToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    Generic,
    Container,
    PassThrough,
}

impl Reader {
    pub fn for_role(role: Role) -> Reader {
        match role {
            Role::Row | Role::Column | Role::Cell => Reader::PassThrough,
            Role::Outline | Role::Table => Reader::Container,
            _ => Reader::Generic,
        }
    }

    /// Full readout: what a focus move speaks.
    pub fn read(&self, gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
        match self {
            Reader::Generic | Reader::PassThrough => generic::read(gw, element),
            Reader::Container => container::read(gw, element),
        }
    }

    /// Abbreviated readout, used when an element is spoken on behalf of
    /// another (selected children, pass-through rows).
    pub fn read_summary(&self, gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
        match self {
            Reader::Generic => generic::read_summary(gw, element),
            Reader::Container => container::read_summary(gw, element),
            Reader::PassThrough => passthrough_summary(gw, element),
        }
    }
}

/// Rows, columns, and cells carry no label of their own; their summary is
/// the concatenation of each child's summary.
fn passthrough_summary(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    let mut out = Vec::new();
    for child in gw.children_in_navigation_order(element)? {
        let reader = Reader::for_role(gw.role(child)?);
        out.extend(reader.read_summary(gw, child)?);
    }
    Ok(out)
}
