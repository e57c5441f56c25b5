//! ANSI escape sequence scanning.

/// Length in bytes of the escape sequence starting at `pos`, if one starts there.
///
/// Recognizes CSI (`ESC [` .. final byte), OSC (`ESC ]` .. BEL or ST) and SS3
/// (`ESC O x`). Unterminated sequences are not treated as escapes.
pub fn ansi_sequence_len(input: &str, pos: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if pos + 1 >= bytes.len() || bytes[pos] != 0x1b {
        return None;
    }

    match bytes[pos + 1] {
        b'[' => {
            let mut idx = pos + 2;
            while idx < bytes.len() {
                if (0x40..=0x7e).contains(&bytes[idx]) {
                    return Some(idx + 1 - pos);
                }
                idx += 1;
            }
            None
        }
        b']' => {
            let mut idx = pos + 2;
            while idx < bytes.len() {
                if bytes[idx] == 0x07 {
                    return Some(idx + 1 - pos);
                }
                if bytes[idx] == 0x1b && bytes.get(idx + 1) == Some(&b'\\') {
                    return Some(idx + 2 - pos);
                }
                idx += 1;
            }
            None
        }
        b'O' if pos + 2 < bytes.len() => Some(3),
        _ => None,
    }
}

/// Removes every recognized escape sequence from `input`.
pub fn strip_ansi(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(len) = ansi_sequence_len(input, idx) {
            idx += len;
            continue;
        }
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        out.push(ch);
        idx += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{ansi_sequence_len, strip_ansi};

    #[test]
    fn csi_sequence_length_includes_final_byte() {
        assert_eq!(ansi_sequence_len("\x1b[31mred", 0), Some(5));
        assert_eq!(ansi_sequence_len("\x1b[38;5;2mx", 0), Some(9));
    }

    #[test]
    fn unterminated_sequences_are_not_escapes() {
        assert_eq!(ansi_sequence_len("\x1b[31", 0), None);
        assert_eq!(ansi_sequence_len("\x1b", 0), None);
        assert_eq!(ansi_sequence_len("plain", 0), None);
    }

    #[test]
    fn strip_removes_sgr_and_osc() {
        assert_eq!(strip_ansi("\x1b[32m> \x1b[39mhi"), "> hi");
        assert_eq!(strip_ansi("\x1b]0;title\x07body"), "body");
    }
}
