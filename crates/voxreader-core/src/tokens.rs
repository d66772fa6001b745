//! Semantic output tokens and their spoken rendering.

/// One unit of semantic output. Readers and the navigator produce ordered
/// lists of these; the speech scheduler renders each to (at most) one
/// utterance. `Boundary`, `Next`, and `Previous` are control tokens for
/// call-site logic and render silent.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputToken {
    Application(String),
    Window(String),
    Label(String),
    Role(String),
    BoolValue(bool),
    IntValue(i64),
    FloatValue(f64),
    StringValue(String),
    UrlValue(String),
    PlaceholderValue(String),
    SelectedText(String),
    SelectedTextGrew(String),
    SelectedTextShrank(String),
    InsertedText(String),
    RemovedText(String),
    Help(String),
    UpdatedLabel(String),
    Edited,
    Selected,
    Unselected,
    Disabled,
    Entering,
    Exiting,
    Next,
    Previous,
    NoFocus,
    Boundary,
    RowCount(i64),
    ColumnCount(i64),
    SelectedChildrenCount(i64),
    CapsLockStatusChanged(bool),
    ApiDisabled,
    NotAccessible,
    Timeout,
}

impl OutputToken {
    /// The utterance for this token, or `None` for silent control tokens.
    pub fn render(&self) -> Option<String> {
        use OutputToken::*;
        let text = match self {
            Application(s) | Window(s) | Label(s) | Role(s) | StringValue(s) | UrlValue(s)
            | PlaceholderValue(s) | SelectedText(s) | SelectedTextGrew(s)
            | SelectedTextShrank(s) | InsertedText(s) | RemovedText(s) | Help(s)
            | UpdatedLabel(s) => s.clone(),
            BoolValue(true) => "On".into(),
            BoolValue(false) => "Off".into(),
            IntValue(i) => i.to_string(),
            FloatValue(f) => f.to_string(),
            Edited => "Edited".into(),
            Selected => "Selected".into(),
            Unselected => "Unselected".into(),
            Disabled => "Disabled".into(),
            Entering => "Entering".into(),
            Exiting => "Exiting".into(),
            NoFocus => "Nothing in focus".into(),
            RowCount(n) => format!("{n} rows"),
            ColumnCount(n) => format!("{n} columns"),
            SelectedChildrenCount(1) => "1 selected child".into(),
            SelectedChildrenCount(n) => format!("{n} selected children"),
            CapsLockStatusChanged(true) => "CapsLock On".into(),
            CapsLockStatusChanged(false) => "CapsLock Off".into(),
            ApiDisabled => "Accessibility interface disabled".into(),
            NotAccessible => "Application not accessible".into(),
            Timeout => "Application is not responding".into(),
            Boundary | Next | Previous => return None,
        };
        Some(text)
    }
}
