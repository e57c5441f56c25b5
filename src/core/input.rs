//! Key parsing for legacy terminal input.
//!
//! Key identifiers are normalized strings such as `enter`, `ctrl+c`,
//! `pageUp`, or a single printable character.

/// Returns the normalized key identifier for one input sequence.
pub fn parse_key(data: &str) -> Option<String> {
    if let Some(key_id) = legacy_sequence_key_id(data) {
        return Some(key_id.to_string());
    }

    match data {
        "\x1b" => return Some("escape".to_string()),
        "\t" => return Some("tab".to_string()),
        "\r" | "\x1bOM" => return Some("enter".to_string()),
        "\n" => return Some("ctrl+j".to_string()),
        "\x00" => return Some("ctrl+space".to_string()),
        " " => return Some("space".to_string()),
        "\x7f" | "\x08" => return Some("backspace".to_string()),
        "\x1b[Z" => return Some("shift+tab".to_string()),
        "\x1b\r" => return Some("alt+enter".to_string()),
        "\x1b\x7f" | "\x1b\x08" => return Some("alt+backspace".to_string()),
        _ => {}
    }

    if data.len() == 2 && data.starts_with('\x1b') {
        let code = data.as_bytes()[1];
        if (97..=122).contains(&code) {
            return Some(format!("alt+{}", code as char));
        }
    }

    if data.len() == 1 {
        let code = data.as_bytes()[0];
        if (1..=26).contains(&code) {
            return Some(format!("ctrl+{}", (code + 96) as char));
        }
        if (32..=126).contains(&code) {
            return Some(data.to_string());
        }
    }

    None
}

/// Returns the text carried by a printable input sequence.
///
/// Control characters and escape sequences are never text.
pub fn parse_text(data: &str) -> Option<String> {
    if data.is_empty() || data.chars().any(char::is_control) {
        return None;
    }
    Some(data.to_string())
}

/// Returns whether `data` is the key identified by `key_id`.
pub fn matches_key(data: &str, key_id: &str) -> bool {
    parse_key(data).is_some_and(|parsed| parsed == key_id)
}

fn legacy_sequence_key_id(data: &str) -> Option<&'static str> {
    match data {
        "\x1b[A" | "\x1bOA" => Some("up"),
        "\x1b[B" | "\x1bOB" => Some("down"),
        "\x1b[C" | "\x1bOC" => Some("right"),
        "\x1b[D" | "\x1bOD" => Some("left"),
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => Some("home"),
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => Some("end"),
        "\x1b[2~" => Some("insert"),
        "\x1b[3~" => Some("delete"),
        "\x1b[5~" | "\x1b[[5~" => Some("pageUp"),
        "\x1b[6~" | "\x1b[[6~" => Some("pageDown"),
        "\x1b[1;5C" | "\x1bOc" => Some("ctrl+right"),
        "\x1b[1;5D" | "\x1bOd" => Some("ctrl+left"),
        "\x1b[1;3C" | "\x1bf" => Some("alt+right"),
        "\x1b[1;3D" | "\x1bb" => Some("alt+left"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{matches_key, parse_key, parse_text};

    #[test]
    fn control_bytes_map_to_ctrl_letters() {
        assert_eq!(parse_key("\x03").as_deref(), Some("ctrl+c"));
        assert_eq!(parse_key("\x15").as_deref(), Some("ctrl+u"));
        assert_eq!(parse_key("\x04").as_deref(), Some("ctrl+d"));
        assert_eq!(parse_key("\x17").as_deref(), Some("ctrl+w"));
    }

    #[test]
    fn enter_and_newline_are_distinct() {
        assert_eq!(parse_key("\r").as_deref(), Some("enter"));
        assert_eq!(parse_key("\n").as_deref(), Some("ctrl+j"));
    }

    #[test]
    fn navigation_sequences_are_recognized() {
        assert!(matches_key("\x1b[5~", "pageUp"));
        assert!(matches_key("\x1b[6~", "pageDown"));
        assert!(matches_key("\x1bOH", "home"));
        assert!(matches_key("\x1b[3~", "delete"));
        assert!(!matches_key("\x1b[A", "down"));
    }

    #[test]
    fn text_excludes_control_characters() {
        assert_eq!(parse_text("héllo").as_deref(), Some("héllo"));
        assert_eq!(parse_text("\x1b[A"), None);
        assert_eq!(parse_text("\r"), None);
    }
}
