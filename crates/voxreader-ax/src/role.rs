//! Element roles and the navigation classifications built on them.

/// Cross-element role, parsed from the `Role` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Application,
    Browser,
    BusyIndicator,
    Button,
    Cell,
    CheckBox,
    ColorWell,
    Column,
    ComboBox,
    DateField,
    DisclosureTriangle,
    DockItem,
    Drawer,
    Grid,
    Group,
    GrowArea,
    Handle,
    Heading,
    Image,
    Incrementer,
    LevelIndicator,
    Link,
    List,
    Menu,
    MenuBar,
    MenuBarItem,
    MenuButton,
    MenuItem,
    Outline,
    PopUpButton,
    Popover,
    ProgressIndicator,
    RadioButton,
    RelevanceIndicator,
    Row,
    ScrollArea,
    ScrollBar,
    Sheet,
    Slider,
    SplitGroup,
    StaticText,
    TabGroup,
    Table,
    TextArea,
    TextField,
    TimeField,
    Toolbar,
    ValueIndicator,
    WebArea,
    Window,
    /// Anything the engine has no special handling for.
    Other,
}

impl Role {
    pub fn from_ax(name: &str) -> Role {
        match name {
            "AXApplication" => Role::Application,
            "AXBrowser" => Role::Browser,
            "AXBusyIndicator" => Role::BusyIndicator,
            "AXButton" => Role::Button,
            "AXCell" => Role::Cell,
            "AXCheckBox" => Role::CheckBox,
            "AXColorWell" => Role::ColorWell,
            "AXColumn" => Role::Column,
            "AXComboBox" => Role::ComboBox,
            "AXDateField" => Role::DateField,
            "AXDisclosureTriangle" => Role::DisclosureTriangle,
            "AXDockItem" => Role::DockItem,
            "AXDrawer" => Role::Drawer,
            "AXGrid" => Role::Grid,
            "AXGroup" => Role::Group,
            "AXGrowArea" => Role::GrowArea,
            "AXHandle" => Role::Handle,
            "AXHeading" => Role::Heading,
            "AXImage" => Role::Image,
            "AXIncrementor" => Role::Incrementer,
            "AXLevelIndicator" => Role::LevelIndicator,
            "AXLink" => Role::Link,
            "AXList" => Role::List,
            "AXMenu" => Role::Menu,
            "AXMenuBar" => Role::MenuBar,
            "AXMenuBarItem" => Role::MenuBarItem,
            "AXMenuButton" => Role::MenuButton,
            "AXMenuItem" => Role::MenuItem,
            "AXOutline" => Role::Outline,
            "AXPopUpButton" => Role::PopUpButton,
            "AXPopover" => Role::Popover,
            "AXProgressIndicator" => Role::ProgressIndicator,
            "AXRadioButton" => Role::RadioButton,
            "AXRelevanceIndicator" => Role::RelevanceIndicator,
            "AXRow" => Role::Row,
            "AXScrollArea" => Role::ScrollArea,
            "AXScrollBar" => Role::ScrollBar,
            "AXSheet" => Role::Sheet,
            "AXSlider" => Role::Slider,
            "AXSplitGroup" => Role::SplitGroup,
            "AXStaticText" => Role::StaticText,
            "AXTabGroup" => Role::TabGroup,
            "AXTable" => Role::Table,
            "AXTextArea" => Role::TextArea,
            "AXTextField" => Role::TextField,
            "AXTimeField" => Role::TimeField,
            "AXToolbar" => Role::Toolbar,
            "AXValueIndicator" => Role::ValueIndicator,
            "AXWebArea" => Role::WebArea,
            "AXWindow" => Role::Window,
            _ => Role::Other,
        }
    }

    pub fn as_ax(self) -> &'static str {
        match self {
            Role::Application => "AXApplication",
            Role::Browser => "AXBrowser",
            Role::BusyIndicator => "AXBusyIndicator",
            Role::Button => "AXButton",
            Role::Cell => "AXCell",
            Role::CheckBox => "AXCheckBox",
            Role::ColorWell => "AXColorWell",
            Role::Column => "AXColumn",
            Role::ComboBox => "AXComboBox",
            Role::DateField => "AXDateField",
            Role::DisclosureTriangle => "AXDisclosureTriangle",
            Role::DockItem => "AXDockItem",
            Role::Drawer => "AXDrawer",
            Role::Grid => "AXGrid",
            Role::Group => "AXGroup",
            Role::GrowArea => "AXGrowArea",
            Role::Handle => "AXHandle",
            Role::Heading => "AXHeading",
            Role::Image => "AXImage",
            Role::Incrementer => "AXIncrementor",
            Role::LevelIndicator => "AXLevelIndicator",
            Role::Link => "AXLink",
            Role::List => "AXList",
            Role::Menu => "AXMenu",
            Role::MenuBar => "AXMenuBar",
            Role::MenuBarItem => "AXMenuBarItem",
            Role::MenuButton => "AXMenuButton",
            Role::MenuItem => "AXMenuItem",
            Role::Outline => "AXOutline",
            Role::PopUpButton => "AXPopUpButton",
            Role::Popover => "AXPopover",
            Role::ProgressIndicator => "AXProgressIndicator",
            Role::RadioButton => "AXRadioButton",
            Role::RelevanceIndicator => "AXRelevanceIndicator",
            Role::Row => "AXRow",
            Role::ScrollArea => "AXScrollArea",
            Role::ScrollBar => "AXScrollBar",
            Role::Sheet => "AXSheet",
            Role::Slider => "AXSlider",
            Role::SplitGroup => "AXSplitGroup",
            Role::StaticText => "AXStaticText",
            Role::TabGroup => "AXTabGroup",
            Role::Table => "AXTable",
            Role::TextArea => "AXTextArea",
            Role::TextField => "AXTextField",
            Role::TimeField => "AXTimeField",
            Role::Toolbar => "AXToolbar",
            Role::ValueIndicator => "AXValueIndicator",
            Role::WebArea => "AXWebArea",
            Role::Window => "AXWindow",
            Role::Other => "AXUnknown",
        }
    }

    /// Roles whose presence alone makes an element navigable, independent of
    /// its title/description/focus state.
    pub fn is_interesting_role(self) -> bool {
        matches!(
            self,
            Role::Browser
                | Role::BusyIndicator
                | Role::Button
                | Role::Cell
                | Role::CheckBox
                | Role::ColorWell
                | Role::ComboBox
                | Role::DateField
                | Role::DisclosureTriangle
                | Role::DockItem
                | Role::Drawer
                | Role::Grid
                | Role::GrowArea
                | Role::Handle
                | Role::Heading
                | Role::Image
                | Role::LevelIndicator
                | Role::Link
                | Role::List
                | Role::MenuBarItem
                | Role::MenuItem
                | Role::MenuButton
                | Role::Outline
                | Role::PopUpButton
                | Role::Popover
                | Role::ProgressIndicator
                | Role::RadioButton
                | Role::RelevanceIndicator
                | Role::Sheet
                | Role::Slider
                | Role::StaticText
                | Role::TabGroup
                | Role::Table
                | Role::TextArea
                | Role::TextField
                | Role::TimeField
                | Role::Toolbar
                | Role::ValueIndicator
                | Role::WebArea
        )
    }

    /// Roles not expected to contain navigable descendants.
    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            Role::BusyIndicator
                | Role::Button
                | Role::CheckBox
                | Role::ColorWell
                | Role::ComboBox
                | Role::DateField
                | Role::DisclosureTriangle
                | Role::DockItem
                | Role::Heading
                | Role::Image
                | Role::Incrementer
                | Role::LevelIndicator
                | Role::Link
                | Role::MenuBarItem
                | Role::MenuButton
                | Role::MenuItem
                | Role::PopUpButton
                | Role::ProgressIndicator
                | Role::RadioButton
                | Role::RelevanceIndicator
                | Role::ScrollBar
                | Role::Slider
                | Role::StaticText
                | Role::TextArea
                | Role::TextField
                | Role::TimeField
                | Role::ValueIndicator
        )
    }

    /// Roles navigation never climbs above.
    pub fn is_root(self) -> bool {
        matches!(self, Role::Menu | Role::MenuBar | Role::Window)
    }

    /// Roles worth pushing the OS keyboard focus onto after a move.
    pub fn wants_keyboard_focus(self) -> bool {
        matches!(
            self,
            Role::Button
                | Role::CheckBox
                | Role::ColorWell
                | Role::ComboBox
                | Role::DateField
                | Role::Incrementer
                | Role::Link
                | Role::MenuBarItem
                | Role::MenuButton
                | Role::MenuItem
                | Role::PopUpButton
                | Role::RadioButton
                | Role::Slider
                | Role::TextArea
                | Role::TextField
                | Role::TimeField
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_known_roles() {
        for role in [Role::Button, Role::WebArea, Role::MenuBar, Role::Incrementer, Role::Cell] {
            assert_eq!(Role::from_ax(role.as_ax()), role);
        }
    }

    #[test]
    fn unknown_roles_parse_to_other() {
        assert_eq!(Role::from_ax("AXFancyNewWidget"), Role::Other);
    }

    #[test]
    fn roots_are_exactly_menu_menubar_window() {
        assert!(Role::Menu.is_root());
        assert!(Role::MenuBar.is_root());
        assert!(Role::Window.is_root());
        assert!(!Role::Group.is_root());
        assert!(!Role::WebArea.is_root());
    }

    #[test]
    fn leaf_and_interesting_sets_differ_where_specified() {
        // Incrementer and scroll bar are leaves without being interesting roles.
        assert!(Role::Incrementer.is_leaf());
        assert!(!Role::Incrementer.is_interesting_role());
        assert!(Role::ScrollBar.is_leaf());
        assert!(!Role::ScrollBar.is_interesting_role());
        // Tables and outlines are interesting containers, not leaves.
        assert!(Role::Table.is_interesting_role());
        assert!(!Role::Table.is_leaf());
        // Rows and cells ride on their children; cell is interesting, row is not.
        assert!(Role::Cell.is_interesting_role());
        assert!(!Role::Row.is_interesting_role());
    }
}
