//! The generic read: label, value, role, state, help — in that order.

use voxreader_ax::{Attr, AxResult, AxValue, Element, Gateway};

use crate::tokens::OutputToken;

pub fn read(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    let mut out = read_label(gw, element)?;
    out.extend(read_value(gw, element)?);
    out.extend(read_role(gw, element)?);
    out.extend(read_state(gw, element)?);
    out.extend(read_help(gw, element)?);
    Ok(out)
}

/// Label and value only.
pub fn read_summary(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    let mut out = read_label(gw, element)?;
    out.extend(read_value(gw, element)?);
    Ok(out)
}

/// Title wins; a title element's title substitutes for a missing one; the
/// description is the label of last resort.
pub fn read_label(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    if let Some(title) = gw.string_attr(element, Attr::Title)? {
        return Ok(vec![OutputToken::Label(title)]);
    }
    if let Some(title_el) = gw.element_attr(element, Attr::TitleElement)? {
        if let Some(title) = gw.string_attr(title_el, Attr::Title)? {
            return Ok(vec![OutputToken::Label(title)]);
        }
    }
    if let Some(description) = gw.string_attr(element, Attr::Description)? {
        return Ok(vec![OutputToken::Label(description)]);
    }
    Ok(Vec::new())
}

pub fn read_value(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    let mut out = Vec::new();

    if let Some(vd) = gw.string_attr(element, Attr::ValueDescription)? {
        out.push(OutputToken::StringValue(vd));
    } else if let Some(value) = gw.attribute(element, Attr::Value)? {
        match value {
            AxValue::Bool(b) => out.push(OutputToken::BoolValue(b)),
            AxValue::Int(i) => out.push(OutputToken::IntValue(i)),
            AxValue::Float(f) => out.push(OutputToken::FloatValue(f)),
            AxValue::String(s) | AxValue::AttributedString(s) => {
                if !s.is_empty() {
                    out.push(OutputToken::StringValue(s));
                }
                if let Some(selected) = gw.string_attr(element, Attr::SelectedText)? {
                    out.push(OutputToken::SelectedText(selected));
                }
            }
            AxValue::Url(u) => out.push(OutputToken::UrlValue(u)),
            // Structured values have no spoken form of their own.
            _ => {}
        }
    }

    if gw.bool_attr(element, Attr::Edited)? {
        out.push(OutputToken::Edited);
    }
    if let Some(placeholder) = gw.string_attr(element, Attr::Placeholder)? {
        out.push(OutputToken::PlaceholderValue(placeholder));
    }
    Ok(out)
}

/// A description already told the user what the element is; only speak the
/// role description when there is none.
pub fn read_role(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    if gw.string_attr(element, Attr::Description)?.is_some() {
        return Ok(Vec::new());
    }
    if let Some(role_description) = gw.string_attr(element, Attr::RoleDescription)? {
        return Ok(vec![OutputToken::Role(role_description)]);
    }
    Ok(Vec::new())
}

pub fn read_state(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    let mut out = Vec::new();
    if gw.bool_attr(element, Attr::Selected)? {
        out.push(OutputToken::Selected);
    }
    // Only an explicit "enabled = false" is worth speaking.
    let explicitly_disabled = gw
        .attribute(element, Attr::Enabled)?
        .and_then(|v| v.as_bool())
        == Some(false);
    if explicitly_disabled {
        out.push(OutputToken::Disabled);
    }
    Ok(out)
}

pub fn read_help(gw: &dyn Gateway, element: Element) -> AxResult<Vec<OutputToken>> {
    if let Some(help) = gw.string_attr(element, Attr::Help)? {
        return Ok(vec![OutputToken::Help(help)]);
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxreader_ax::{MockGateway, Role};

    fn gateway_with_button() -> (MockGateway, Element) {
        let gw = MockGateway::new();
        let app = gw.add_application(1, "App");
        let button = gw.add_child(app, Role::Button);
        (gw, button)
    }

    #[test]
    fn full_read_order_is_label_value_role_state_help() {
        let (gw, button) = gateway_with_button();
        gw.set_attr(button, Attr::Title, AxValue::String("Save".into()));
        gw.set_attr(button, Attr::Value, AxValue::Bool(true));
        gw.set_attr(button, Attr::RoleDescription, AxValue::String("button".into()));
        gw.set_attr(button, Attr::Selected, AxValue::Bool(true));
        gw.set_attr(button, Attr::Enabled, AxValue::Bool(false));
        gw.set_attr(button, Attr::Help, AxValue::String("saves the file".into()));

        let tokens = read(&gw, button).unwrap();
        assert_eq!(
            tokens,
            vec![
                OutputToken::Label("Save".into()),
                OutputToken::BoolValue(true),
                OutputToken::Role("button".into()),
                OutputToken::Selected,
                OutputToken::Disabled,
                OutputToken::Help("saves the file".into()),
            ]
        );
    }

    #[test]
    fn label_falls_back_through_title_element_to_description() {
        let (gw, button) = gateway_with_button();
        gw.set_attr(button, Attr::Description, AxValue::String("close".into()));
        assert_eq!(read_label(&gw, button).unwrap(), vec![OutputToken::Label("close".into())]);

        // A title element outranks the description.
        let app = gw.add_application(2, "App2");
        let label_el = gw.add_child(app, Role::StaticText);
        gw.set_attr(label_el, Attr::Title, AxValue::String("Name".into()));
        gw.set_attr(button, Attr::TitleElement, AxValue::Element(label_el));
        assert_eq!(read_label(&gw, button).unwrap(), vec![OutputToken::Label("Name".into())]);

        // A direct title outranks everything.
        gw.set_attr(button, Attr::Title, AxValue::String("OK".into()));
        assert_eq!(read_label(&gw, button).unwrap(), vec![OutputToken::Label("OK".into())]);
    }

    #[test]
    fn value_description_outranks_typed_value() {
        let (gw, button) = gateway_with_button();
        gw.set_attr(button, Attr::Value, AxValue::Int(50));
        gw.set_attr(button, Attr::ValueDescription, AxValue::String("half".into()));
        assert_eq!(
            read_value(&gw, button).unwrap(),
            vec![OutputToken::StringValue("half".into())]
        );
    }

    #[test]
    fn typed_value_dispatch() {
        let (gw, button) = gateway_with_button();

        gw.set_attr(button, Attr::Value, AxValue::Int(7));
        assert_eq!(read_value(&gw, button).unwrap(), vec![OutputToken::IntValue(7)]);

        gw.set_attr(button, Attr::Value, AxValue::Float(0.25));
        assert_eq!(read_value(&gw, button).unwrap(), vec![OutputToken::FloatValue(0.25)]);

        gw.set_attr(button, Attr::Value, AxValue::Url("https://e.example".into()));
        assert_eq!(
            read_value(&gw, button).unwrap(),
            vec![OutputToken::UrlValue("https://e.example".into())]
        );

        gw.set_attr(button, Attr::Value, AxValue::AttributedString("rich".into()));
        assert_eq!(read_value(&gw, button).unwrap(), vec![OutputToken::StringValue("rich".into())]);
    }

    #[test]
    fn string_value_appends_selected_text() {
        let (gw, field) = gateway_with_button();
        gw.set_attr(field, Attr::Value, AxValue::String("hello world".into()));
        gw.set_attr(field, Attr::SelectedText, AxValue::String("world".into()));
        assert_eq!(
            read_value(&gw, field).unwrap(),
            vec![
                OutputToken::StringValue("hello world".into()),
                OutputToken::SelectedText("world".into()),
            ]
        );
    }

    #[test]
    fn edited_and_placeholder_follow_the_value() {
        let (gw, field) = gateway_with_button();
        gw.set_attr(field, Attr::Value, AxValue::String("draft".into()));
        gw.set_attr(field, Attr::Edited, AxValue::Bool(true));
        gw.set_attr(field, Attr::Placeholder, AxValue::String("Search".into()));
        assert_eq!(
            read_value(&gw, field).unwrap(),
            vec![
                OutputToken::StringValue("draft".into()),
                OutputToken::Edited,
                OutputToken::PlaceholderValue("Search".into()),
            ]
        );
    }

    #[test]
    fn description_suppresses_role() {
        let (gw, button) = gateway_with_button();
        gw.set_attr(button, Attr::RoleDescription, AxValue::String("button".into()));
        assert_eq!(read_role(&gw, button).unwrap(), vec![OutputToken::Role("button".into())]);

        gw.set_attr(button, Attr::Description, AxValue::String("toolbar button".into()));
        assert_eq!(read_role(&gw, button).unwrap(), vec![]);
    }

    #[test]
    fn missing_enabled_attribute_is_not_disabled() {
        let (gw, button) = gateway_with_button();
        assert_eq!(read_state(&gw, button).unwrap(), vec![]);
        gw.set_attr(button, Attr::Enabled, AxValue::Bool(true));
        assert_eq!(read_state(&gw, button).unwrap(), vec![]);
    }
}
