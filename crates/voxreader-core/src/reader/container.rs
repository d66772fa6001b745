//! Container reads for tables and outlines.

use voxreader_ax::{Attr, AxResult, Element, Gateway};

use super::{generic, Reader};
use crate::tokens::OutputToken;

pub fn read(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    let mut out = generic::read(gw, element)?;
    out.extend(read_selected_children(gw, element)?);
    Ok(out)
}

pub fn read_summary(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    let mut out = generic::read_summary(gw, element)?;
    if let Some(rows) = axis_count(gw, element, Attr::Rows)? {
        out.push(OutputToken::RowCount(rows));
    }
    if let Some(columns) = axis_count(gw, element, Attr::Columns)? {
        out.push(OutputToken::ColumnCount(columns));
    }
    Ok(out)
}

fn axis_count(gw: &dyn Gateway, element: Element, attr: Attr) -> AxResult<Option<i64>> {
    Ok(gw
        .attribute(element, attr)?
        .and_then(|v| v.as_array().map(|items| items.len() as i64)))
}

/// A single selected child is spoken in full summary; several collapse to a
/// count. The first populated selection attribute wins.
pub fn read_selected_children(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    for attr in [
        Attr::SelectedChildren,
        Attr::SelectedCells,
        Attr::SelectedRows,
        Attr::SelectedColumns,
    ] {
        let selected = gw.elements_attr(element, attr)?;
        if selected.is_empty() {
            continue;
        }
        if selected.len() == 1 {
            let child = selected[0];
            let reader = Reader::for_role(gw.role(child)?);
            return reader.read_summary(gw, child);
        }
        return Ok(vec![OutputToken::SelectedChildrenCount(selected.len() as i64)]);
    }
    Ok(Vec::new())
}
