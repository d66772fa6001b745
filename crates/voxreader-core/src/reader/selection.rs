//! Incremental updates: text-selection deltas and value diffs.

use voxreader_ax::{AxRange, AxResult, AxValue, Element, Gateway, ParamAttr};

use crate::input::keys::KeyStateProbe;
use crate::tokens::OutputToken;

/// What to speak when the selection of the focused text element moves from
/// `old` to `new`.
///
/// An unchanged range with an arrow key down means the caret hit an edge.
/// Twin empty ranges are a caret move: vertical arrows (without Option)
/// speak the landed-on line, anything else speaks the text skipped over.
/// A change anchored at one end speaks the delta and whether it was
/// selected or unselected; a wholesale move speaks both ranges.
pub fn selection_delta(
    gw: &dyn Gateway,
    element: Element,
    old: AxRange,
    new: AxRange,
    probe: &dyn KeyStateProbe,
) -> AxResult<Vec<OutputToken>> {
    if old == new {
        if probe.any_arrow_down() {
            return Ok(vec![OutputToken::Boundary]);
        }
        return Ok(Vec::new());
    }

    if old.is_empty() && new.is_empty() {
        if probe.vertical_arrow_down() && !probe.modifiers().option {
            return Ok(read_line_at(gw, element, new.start)?
                .map(|s| vec![OutputToken::StringValue(s)])
                .unwrap_or_default());
        }
        let span = AxRange::span(old.start.min(new.start), old.end().max(new.end()));
        return Ok(string_for_range(gw, element, span)?
            .map(|s| vec![OutputToken::StringValue(s)])
            .unwrap_or_default());
    }

    if old.start == new.start {
        let extended = new.end() > old.end();
        let span = AxRange::span(old.end().min(new.end()), old.end().max(new.end()));
        return Ok(edge_tokens(gw, element, span, extended)?);
    }

    if old.end() == new.end() {
        let extended = new.start < old.start;
        let span = AxRange::span(old.start.min(new.start), old.start.max(new.start));
        return Ok(edge_tokens(gw, element, span, extended)?);
    }

    // The selection jumped: speak what was abandoned, then what was taken.
    let mut out = Vec::new();
    if let Some(text) = string_for_range(gw, element, old)? {
        out.push(OutputToken::StringValue(text));
        out.push(OutputToken::Unselected);
    }
    if let Some(text) = string_for_range(gw, element, new)? {
        out.push(OutputToken::StringValue(text));
        out.push(OutputToken::Selected);
    }
    Ok(out)
}

fn edge_tokens(
    gw: &dyn Gateway,
    element: Element,
    span: AxRange,
    extended: bool,
) -> AxResult<Vec<OutputToken>> {
    let mut out = Vec::new();
    if let Some(text) = string_for_range(gw, element, span)? {
        out.push(OutputToken::StringValue(text));
    }
    out.push(if extended { OutputToken::Selected } else { OutputToken::Unselected });
    Ok(out)
}

fn read_line_at(gw: &dyn Gateway, element: Element, index: i64) -> AxResult<Option<String>> {
    let Some(line) = gw
        .parameterized(element, ParamAttr::LineForIndex, AxValue::Int(index))?
        .and_then(|v| v.as_int())
    else {
        return Ok(None);
    };
    let Some(range) = gw
        .parameterized(element, ParamAttr::RangeForLine, AxValue::Int(line))?
        .and_then(|v| v.as_range())
    else {
        return Ok(None);
    };
    string_for_range(gw, element, range)
}

fn string_for_range(gw: &dyn Gateway, element: Element, range: AxRange) -> AxResult<Option<String>> {
    Ok(gw
        .parameterized(element, ParamAttr::StringForRange, AxValue::Range(range))?
        .and_then(|v| v.as_text().map(str::to_string)))
}

/// Tokens for a value edit, by common prefix/suffix diff. A pure insertion
/// or removal speaks the delta; a wholesale change re-reads the new value.
pub fn value_diff(old: &str, new: &str) -> Vec<OutputToken> {
    if old == new {
        return Vec::new();
    }
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    let prefix = old_chars
        .iter()
        .zip(new_chars.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = old_chars.len().min(new_chars.len()) - prefix;
    let suffix = old_chars
        .iter()
        .rev()
        .zip(new_chars.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let removed: String = old_chars[prefix..old_chars.len() - suffix].iter().collect();
    let inserted: String = new_chars[prefix..new_chars.len() - suffix].iter().collect();

    match (removed.is_empty(), inserted.is_empty()) {
        (true, false) => vec![OutputToken::InsertedText(inserted)],
        (false, true) => vec![OutputToken::RemovedText(removed)],
        _ => vec![OutputToken::StringValue(new.to_string())],
    }
}

/// The grew/shrank token when the selected text changed at exactly one end.
pub fn selected_text_delta(old: &str, new: &str) -> Option<OutputToken> {
    if old == new {
        return None;
    }
    if new.len() > old.len() {
        if let Some(delta) = new.strip_prefix(old) {
            return Some(OutputToken::SelectedTextGrew(delta.to_string()));
        }
        if let Some(delta) = new.strip_suffix(old) {
            return Some(OutputToken::SelectedTextGrew(delta.to_string()));
        }
    } else {
        if let Some(delta) = old.strip_prefix(new) {
            return Some(OutputToken::SelectedTextShrank(delta.to_string()));
        }
        if let Some(delta) = old.strip_suffix(new) {
            return Some(OutputToken::SelectedTextShrank(delta.to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keys::{key, KeyCode, Modifiers};
    use std::collections::HashSet;
    use voxreader_ax::{Attr, MockGateway, Role};

    #[derive(Default)]
    struct StubProbe {
        keys: HashSet<KeyCode>,
        mods: Modifiers,
    }

    impl KeyStateProbe for StubProbe {
        fn is_key_down(&self, code: KeyCode) -> bool {
            self.keys.contains(&code)
        }
        fn modifiers(&self) -> Modifiers {
            self.mods
        }
    }

    fn text_field(value: &str) -> (MockGateway, Element) {
        let gw = MockGateway::new();
        let app = gw.add_application(1, "App");
        let field = gw.add_child(app, Role::TextField);
        gw.set_attr(field, Attr::Value, AxValue::String(value.into()));
        (gw, field)
    }

    #[test]
    fn unchanged_range_with_arrow_down_is_a_boundary() {
        let (gw, field) = text_field("abc");
        let probe = StubProbe { keys: HashSet::from([key::RIGHT]), ..StubProbe::default() };
        let range = AxRange::new(3, 0);
        let tokens = selection_delta(&gw, field, range, range, &probe).unwrap();
        assert_eq!(tokens, vec![OutputToken::Boundary]);
    }

    #[test]
    fn unchanged_range_without_arrows_is_silent() {
        let (gw, field) = text_field("abc");
        let probe = StubProbe::default();
        let range = AxRange::new(1, 0);
        assert!(selection_delta(&gw, field, range, range, &probe).unwrap().is_empty());
    }

    #[test]
    fn caret_move_speaks_the_skipped_text() {
        let (gw, field) = text_field("abcdef");
        let probe = StubProbe { keys: HashSet::from([key::RIGHT]), ..StubProbe::default() };
        let tokens =
            selection_delta(&gw, field, AxRange::new(1, 0), AxRange::new(4, 0), &probe).unwrap();
        assert_eq!(tokens, vec![OutputToken::StringValue("bcd".into())]);
    }

    #[test]
    fn vertical_caret_move_speaks_the_landing_line() {
        let (gw, field) = text_field("one\ntwo\nthree");
        let probe = StubProbe { keys: HashSet::from([key::DOWN]), ..StubProbe::default() };
        let tokens =
            selection_delta(&gw, field, AxRange::new(0, 0), AxRange::new(5, 0), &probe).unwrap();
        assert_eq!(tokens, vec![OutputToken::StringValue("two".into())]);
    }

    #[test]
    fn vertical_caret_move_with_option_speaks_the_span() {
        let (gw, field) = text_field("one\ntwo\nthree");
        let probe = StubProbe {
            keys: HashSet::from([key::DOWN]),
            mods: Modifiers { option: true, ..Modifiers::NONE },
        };
        let tokens =
            selection_delta(&gw, field, AxRange::new(0, 0), AxRange::new(4, 0), &probe).unwrap();
        assert_eq!(tokens, vec![OutputToken::StringValue("one\n".into())]);
    }

    #[test]
    fn right_edge_growth_and_shrink() {
        let (gw, field) = text_field("abcdef");
        let probe = StubProbe::default();

        // [0,0) → [0,3): "abc" became selected.
        let tokens =
            selection_delta(&gw, field, AxRange::new(0, 0), AxRange::new(0, 3), &probe).unwrap();
        assert_eq!(
            tokens,
            vec![OutputToken::StringValue("abc".into()), OutputToken::Selected]
        );

        // [0,3) → [0,5): "de" joined the selection.
        let tokens =
            selection_delta(&gw, field, AxRange::new(0, 3), AxRange::new(0, 5), &probe).unwrap();
        assert_eq!(
            tokens,
            vec![OutputToken::StringValue("de".into()), OutputToken::Selected]
        );

        // [0,5) → [0,2): "cde" left it.
        let tokens =
            selection_delta(&gw, field, AxRange::new(0, 5), AxRange::new(0, 2), &probe).unwrap();
        assert_eq!(
            tokens,
            vec![OutputToken::StringValue("cde".into()), OutputToken::Unselected]
        );
    }

    #[test]
    fn left_edge_changes_mirror_the_right() {
        let (gw, field) = text_field("abcdef");
        let probe = StubProbe::default();

        // [3,6) → [1,6): grew leftward over "bc".
        let tokens =
            selection_delta(&gw, field, AxRange::span(3, 6), AxRange::span(1, 6), &probe).unwrap();
        assert_eq!(
            tokens,
            vec![OutputToken::StringValue("bc".into()), OutputToken::Selected]
        );

        // [1,6) → [4,6): shed "bcd" on the left.
        let tokens =
            selection_delta(&gw, field, AxRange::span(1, 6), AxRange::span(4, 6), &probe).unwrap();
        assert_eq!(
            tokens,
            vec![OutputToken::StringValue("bcd".into()), OutputToken::Unselected]
        );
    }

    #[test]
    fn disjoint_move_speaks_both_ranges() {
        let (gw, field) = text_field("abcdef");
        let probe = StubProbe::default();
        let tokens =
            selection_delta(&gw, field, AxRange::span(0, 2), AxRange::span(3, 6), &probe).unwrap();
        assert_eq!(
            tokens,
            vec![
                OutputToken::StringValue("ab".into()),
                OutputToken::Unselected,
                OutputToken::StringValue("def".into()),
                OutputToken::Selected,
            ]
        );
    }

    #[test]
    fn value_diff_insertion_removal_and_replacement() {
        assert_eq!(
            value_diff("hello", "hello world"),
            vec![OutputToken::InsertedText(" world".into())]
        );
        assert_eq!(
            value_diff("hello world", "hello"),
            vec![OutputToken::RemovedText(" world".into())]
        );
        assert_eq!(
            value_diff("abc", "axc"),
            vec![OutputToken::StringValue("axc".into())]
        );
        assert_eq!(value_diff("same", "same"), vec![]);
    }

    #[test]
    fn selected_text_grew_and_shrank() {
        assert_eq!(
            selected_text_delta("ab", "abcd"),
            Some(OutputToken::SelectedTextGrew("cd".into()))
        );
        assert_eq!(
            selected_text_delta("cd", "abcd"),
            Some(OutputToken::SelectedTextGrew("ab".into()))
        );
        assert_eq!(
            selected_text_delta("abcd", "ab"),
            Some(OutputToken::SelectedTextShrank("cd".into()))
        );
        assert_eq!(selected_text_delta("ab", "xy"), None);
        assert_eq!(selected_text_delta("ab", "ab"), None);
    }
}
