//! Output sanitation helpers.
//!
//! Raw terminal output arrives with mixed line-ending conventions, ANSI
//! escape sequences, echoed commands, and the trailing prompt. These
//! helpers normalize a decoded chunk into clean text.

const BACKSPACE: char = '\u{8}';

/// Normalize all line-ending variants to a single `\n`.
///
/// Devices emit `\r\n`, `\n\r`, `\r\r\n`, and occasionally a bare `\r`
/// from line repaints; after normalization no `\r` remains.
pub fn normalize_linefeeds(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    let mut chars = data.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                // \r\r\n and \r\n collapse to \n; a lone \r becomes \n
                while chars.peek() == Some(&'\r') {
                    chars.next();
                }
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            '\n' => {
                // \n\r collapses to \n
                if chars.peek() == Some(&'\r') {
                    chars.next();
                }
                out.push('\n');
            }
            other => out.push(other),
        }
    }

    out
}

/// Strip ANSI escape sequences from a raw byte chunk.
pub fn strip_ansi(data: &[u8]) -> Vec<u8> {
    strip_ansi_escapes::strip(data)
}

/// Strip the echoed command from the head of the output.
///
/// Line-wrap redraw inserts backspace characters into the echo; resolving
/// them character by character is not worth the complexity, so when any
/// backspace is present the entire first line is discarded instead.
/// Without backspaces, exactly the command's character count is removed
/// from the head unconditionally, plus the single newline that closed
/// the echo line. Blank lines belonging to the output itself survive.
pub fn strip_command(command: &str, output: &str) -> String {
    if output.contains(BACKSPACE) {
        return match output.split_once('\n') {
            Some((_, rest)) => rest.to_string(),
            None => String::new(),
        };
    }

    let stripped: String = output.chars().skip(command.chars().count()).collect();
    match stripped.strip_prefix('\n') {
        Some(rest) => rest.to_string(),
        None => stripped,
    }
}

/// Strip a trailing prompt line from the tail of the output.
///
/// Only the last line is considered, and only when it contains the base
/// prompt; any other trailing line is preserved unchanged.
pub fn strip_prompt(base_prompt: &str, output: &str) -> String {
    if base_prompt.is_empty() {
        return output.to_string();
    }

    match output.rfind('\n') {
        Some(pos) => {
            let (head, last) = output.split_at(pos);
            if last[1..].contains(base_prompt) {
                head.to_string()
            } else {
                output.to_string()
            }
        }
        None => {
            if output.contains(base_prompt) {
                String::new()
            } else {
                output.to_string()
            }
        }
    }
}

/// Clean up the first chunk of command output.
///
/// The first chunk may carry a partial repaint of the echoed command
/// (cursor movement and padding before the terminal settles). The first
/// line is settled exactly once: backspaces are dropped and a corrupted
/// echo is replaced by the command itself so that later echo stripping
/// and pattern matching see a predictable head.
pub fn settle_first_line(chunk: &str, command: &str) -> String {
    let (first, rest) = match chunk.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (chunk, None),
    };

    let cleaned: String = first.chars().filter(|c| *c != BACKSPACE).collect();
    let first = if !command.is_empty() && cleaned != first && cleaned.contains(command) {
        command.to_string()
    } else {
        cleaned
    };

    match rest {
        Some(rest) => format!("{first}\n{rest}"),
        None => first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_all_crlf_variants() {
        let mixed = "a\r\nb\n\rc\r\r\nd\re\nf";
        let normalized = normalize_linefeeds(mixed);
        assert_eq!(normalized, "a\nb\nc\nd\ne\nf");
        assert!(!normalized.contains('\r'));
    }

    #[test]
    fn normalize_is_identity_on_clean_text() {
        assert_eq!(normalize_linefeeds("one\ntwo\n"), "one\ntwo\n");
    }

    #[test]
    fn strip_command_removes_exact_echo() {
        let output = "show version\nCisco IOS\nmore";
        assert_eq!(strip_command("show version", output), "Cisco IOS\nmore");
    }

    #[test]
    fn strip_command_with_backspace_drops_whole_first_line() {
        let output = "show ver\u{8}\u{8}sion garbage\nreal output";
        assert_eq!(strip_command("show version", output), "real output");

        // Even a very short command discards the full first line
        let output = "sh\u{8}ow\nreal output";
        assert_eq!(strip_command("sh", output), "real output");
    }

    #[test]
    fn strip_command_removes_len_chars_even_without_echo_match() {
        // The head is consumed by length, not by echo comparison
        assert_eq!(strip_command("abc", "xyz123"), "123");
        assert_eq!(strip_command("longer than output", "short"), "");
    }

    #[test]
    fn strip_command_preserves_blank_lines_in_output() {
        let output = "show run\n\nBuilding configuration...\n";
        assert_eq!(
            strip_command("show run", output),
            "\nBuilding configuration...\n"
        );
    }

    #[test]
    fn strip_prompt_removes_only_trailing_prompt_line() {
        let output = "interface up\nRouter#";
        assert_eq!(strip_prompt("Router#", output), "interface up");
    }

    #[test]
    fn strip_prompt_preserves_non_matching_tail() {
        let output = "interface up\nstill going";
        assert_eq!(strip_prompt("Router#", output), output);
    }

    #[test]
    fn strip_prompt_ignores_prompt_in_body() {
        let output = "Router# appears here\nreal tail";
        assert_eq!(strip_prompt("Router#", output), output);
    }

    #[test]
    fn settle_first_line_replaces_corrupted_echo() {
        let chunk = "show version   \u{8}\u{8}\u{8}\nCisco IOS";
        assert_eq!(settle_first_line(chunk, "show version"), "show version\nCisco IOS");
    }

    #[test]
    fn settle_first_line_keeps_clean_chunks() {
        let chunk = "show version\noutput";
        assert_eq!(settle_first_line(chunk, "show version"), chunk);
    }
}
