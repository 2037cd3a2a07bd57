//! Neutralizes untrusted text before it is embedded into another
//! endpoint's command syntax.
//!
//! Every externally-sourced string (sender, content, alias) passes through
//! [`sanitize_for_console`] at the point it is interpolated into an
//! outgoing console command — never the static template around it.

/// Make text safe to embed inside a quoted string of a console command.
///
/// Newlines become spaces and carriage returns vanish (a raw newline in a
/// console line is a second command). Backslashes are escaped before
/// quotes so the quote escapes are not themselves re-escaped. Total over
/// any input.
#[must_use]
pub fn sanitize_for_console(text: &str) -> String {
    text.replace('\n', " ")
        .replace('\r', "")
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

/// Characters the sink renders as markup.
const MARKDOWN_META: &[char] = &['\\', '*', '_', '~', '`', '|', '>'];

/// Escape sink markup so bridged chat renders verbatim.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if MARKDOWN_META.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inverse of the console escape, for round-trip checks.
    fn unescape_console(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(ch) = chars.next() {
            if ch == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else {
                out.push(ch);
            }
        }
        out
    }

    #[test]
    fn quotes_are_escaped() {
        assert_eq!(sanitize_for_console(r#"say "hi""#), r#"say \"hi\""#);
    }

    #[test]
    fn backslash_escaped_before_quote() {
        // A pre-escaped quote must not collapse into an unescaped one.
        assert_eq!(sanitize_for_console(r#"\""#), r#"\\\""#);
    }

    #[test]
    fn newlines_removed() {
        let out = sanitize_for_console("line one\nline two\r\nthree");
        assert!(!out.contains('\n'));
        assert!(!out.contains('\r'));
        assert_eq!(out, "line one line two three");
    }

    #[test]
    fn no_unescaped_quotes_survive() {
        for input in [r#"a"b"#, r#"a\"b"#, "a\nb\"c", r#"\\\""#] {
            let out = sanitize_for_console(input);
            let mut escaped = false;
            for ch in out.chars() {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else {
                    assert_ne!(ch, '"', "unescaped quote in {out:?}");
                }
            }
        }
    }

    #[test]
    fn round_trips_when_newline_free() {
        for input in [r#"quote " back \ slash"#, "plain", r#"\\ already \" escaped"#] {
            assert_eq!(unescape_console(&sanitize_for_console(input)), input);
        }
    }

    #[test]
    fn total_over_awkward_input() {
        assert_eq!(sanitize_for_console(""), "");
        let _ = sanitize_for_console("\u{0}\u{7f}émoji 🦀");
    }

    #[test]
    fn markdown_metacharacters_escaped() {
        assert_eq!(escape_markdown("*bold* _it_"), "\\*bold\\* \\_it\\_");
        assert_eq!(escape_markdown("a|b`c"), "a\\|b\\`c");
        assert_eq!(escape_markdown("plain text"), "plain text");
    }
}
