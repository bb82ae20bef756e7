//! Verbatim capture of the embedded raw sub-languages.
//!
//! Both routines operate on the untokenized remainder of the source. The
//! block scanner tracks brace depth and skips braces inside single- and
//! double-quoted string literals; a truncated match would silently corrupt
//! downstream code emission, so this is the most heavily tested corner of
//! the lexer.

/// Result of a raw capture starting at the current lexer position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCapture {
    /// Captured text, outer delimiters excluded.
    pub text: String,
    /// Bytes consumed from the remainder, including the closing delimiter
    /// for block captures.
    pub consumed: usize,
    /// False when the closing delimiter was never found.
    pub terminated: bool,
}

/// Captures a balanced `{ ... }` block. `remainder` starts just after the
/// opening brace; the returned `consumed` includes the closing brace.
pub fn capture_block(remainder: &str) -> RawCapture {
    #[derive(PartialEq)]
    enum State {
        Code,
        Str(char),
    }

    let mut depth = 1usize;
    let mut state = State::Code;
    let mut escaped = false;

    for (i, c) in remainder.char_indices() {
        match state {
            State::Code => match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return RawCapture {
                            text: remainder[..i].to_string(),
                            consumed: i + 1,
                            terminated: true,
                        };
                    }
                }
                '"' | '\'' => state = State::Str(c),
                _ => {}
            },
            State::Str(quote) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote || c == '\n' {
                    // An unterminated string literal ends at the line break;
                    // brace counting resumes on the next line.
                    state = State::Code;
                }
            }
        }
    }

    RawCapture {
        text: remainder.to_string(),
        consumed: remainder.len(),
        terminated: false,
    }
}

/// Captures inline `= <code>` up to (not including) the end of the line.
pub fn capture_line(remainder: &str) -> RawCapture {
    let end = remainder.find('\n').unwrap_or(remainder.len());
    RawCapture {
        text: remainder[..end].trim().to_string(),
        consumed: end,
        terminated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_block() {
        let cap = capture_block("a + b }rest");
        assert_eq!(cap.text, "a + b ");
        assert_eq!(cap.consumed, 7);
        assert!(cap.terminated);
    }

    #[test]
    fn nested_braces() {
        let cap = capture_block("if x { y } else { z } }tail");
        assert_eq!(cap.text, "if x { y } else { z } ");
        assert!(cap.terminated);
        assert_eq!(&"if x { y } else { z } }tail"[cap.consumed..], "tail");
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let cap = capture_block(r#"fmt("{}", x) }out"#);
        assert_eq!(cap.text, r#"fmt("{}", x) "#);
        assert!(cap.terminated);
    }

    #[test]
    fn escaped_quote_does_not_end_the_string() {
        let cap = capture_block(r#"say("\"{") }out"#);
        assert_eq!(cap.text, r#"say("\"{") "#);
        assert!(cap.terminated);
    }

    #[test]
    fn single_quoted_strings() {
        let cap = capture_block("get('}') }out");
        assert_eq!(cap.text, "get('}') ");
        assert!(cap.terminated);
    }

    #[test]
    fn unterminated_string_ends_at_newline() {
        // The quote is never closed; counting resumes after the line break
        // so the block still terminates.
        let cap = capture_block("x = \"oops\ny = 1 }rest");
        assert!(cap.terminated);
        assert_eq!(cap.text, "x = \"oops\ny = 1 ");
    }

    #[test]
    fn unterminated_block_consumes_everything() {
        let cap = capture_block("x = { y ");
        assert!(!cap.terminated);
        assert_eq!(cap.consumed, 8);
    }

    #[test]
    fn multiline_block() {
        let cap = capture_block("\n  a = 1\n  b = {2: 3}\n}");
        assert_eq!(cap.text, "\n  a = 1\n  b = {2: 3}\n");
        assert!(cap.terminated);
    }

    #[test]
    fn inline_capture_stops_at_newline() {
        let cap = capture_line(" request.user.articles\nnext");
        assert_eq!(cap.text, "request.user.articles");
        assert!(cap.terminated);
        assert_eq!(cap.consumed, " request.user.articles".len());
    }

    #[test]
    fn inline_capture_at_eof() {
        let cap = capture_line(" x + 1");
        assert_eq!(cap.text, "x + 1");
        assert_eq!(cap.consumed, 6);
    }
}
