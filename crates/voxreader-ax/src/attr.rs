//! Attribute and parameterized-query vocabularies.

/// Named attribute slots the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attr {
    Role,
    Subrole,
    RoleDescription,
    Title,
    TitleElement,
    Description,
    Help,
    Value,
    ValueDescription,
    Placeholder,
    Selected,
    SelectedText,
    SelectedTextRange,
    Enabled,
    Focused,
    Edited,
    Parent,
    Children,
    ChildrenInNavigationOrder,
    Window,
    FocusedWindow,
    FocusedElement,
    FocusableAncestor,
    Rows,
    Columns,
    SelectedCells,
    SelectedRows,
    SelectedColumns,
    SelectedChildren,
}

impl Attr {
    pub fn as_str(self) -> &'static str {
        match self {
            Attr::Role => "AXRole",
            Attr::Subrole => "AXSubrole",
            Attr::RoleDescription => "AXRoleDescription",
            Attr::Title => "AXTitle",
            Attr::TitleElement => "AXTitleUIElement",
            Attr::Description => "AXDescription",
            Attr::Help => "AXHelp",
            Attr::Value => "AXValue",
            Attr::ValueDescription => "AXValueDescription",
            Attr::Placeholder => "AXPlaceholderValue",
            Attr::Selected => "AXSelected",
            Attr::SelectedText => "AXSelectedText",
            Attr::SelectedTextRange => "AXSelectedTextRange",
            Attr::Enabled => "AXEnabled",
            Attr::Focused => "AXFocused",
            Attr::Edited => "AXEdited",
            Attr::Parent => "AXParent",
            Attr::Children => "AXChildren",
            Attr::ChildrenInNavigationOrder => "AXChildrenInNavigationOrder",
            Attr::Window => "AXWindow",
            Attr::FocusedWindow => "AXFocusedWindow",
            Attr::FocusedElement => "AXFocusedUIElement",
            Attr::FocusableAncestor => "AXFocusableAncestor",
            Attr::Rows => "AXRows",
            Attr::Columns => "AXColumns",
            Attr::SelectedCells => "AXSelectedCells",
            Attr::SelectedRows => "AXSelectedRows",
            Attr::SelectedColumns => "AXSelectedColumns",
            Attr::SelectedChildren => "AXSelectedChildren",
        }
    }
}

/// Stateless queries of the form (element, name, input) → value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamAttr {
    LineForIndex,
    RangeForLine,
    StringForRange,
    RangeForPosition,
    RangeForIndex,
    BoundsForRange,
    CellForColumnAndRow,
}

impl ParamAttr {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamAttr::LineForIndex => "AXLineForIndexParameterized",
            ParamAttr::RangeForLine => "AXRangeForLineParameterized",
            ParamAttr::StringForRange => "AXStringForRangeParameterized",
            ParamAttr::RangeForPosition => "AXRangeForPositionParameterized",
            ParamAttr::RangeForIndex => "AXRangeForIndexParameterized",
            ParamAttr::BoundsForRange => "AXBoundsForRangeParameterized",
            ParamAttr::CellForColumnAndRow => "AXCellForColumnAndRowParameterized",
        }
    }
}
