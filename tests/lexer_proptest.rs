//! Property-based tests for the lexer
//!
//! The lexer is total: it must produce a token stream for any input, and
//! the raw-capture routines must stay within bounds and report consistent
//! consumption counts on arbitrary text.

use proptest::prelude::*;
use veld::diagnostics::FileId;
use veld::lexer::raw::{capture_block, capture_line};
use veld::lexer::tokenize;

/// Generate plausible source lines mixing the surface grammar with noise.
fn source_line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // Collection headers
        "#[A-Za-z][A-Za-z0-9_]{0,10}",
        "#[A-Za-z][A-Za-z0-9_]{0,8} -> [A-Za-z][A-Za-z0-9_]{0,8}",
        // Page headers
        "\\[[a-z][a-z0-9-]{0,10}\\]: /[a-z]{1,8}/",
        // Field lines
        "[a-z][a-z0-9_]{0,8} : (str|int|bool|text|date)",
        "[a-z][a-z0-9_]{0,8} : one\\(#[A-Z][a-z]{1,8}\\)",
        // Annotations
        "@[a-z_]{1,12}",
        // Inline code
        "[a-z]{1,8}= [a-zA-Z0-9_.()]{0,20}",
        // Raw blocks (possibly unterminated)
        "@post_save \\{ [a-zA-Z0-9(){}\"' ]{0,24}",
        // Comments and junk
        "// [ -~]{0,30}",
        "[ -~]{0,40}",
    ]
}

fn source_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(source_line_strategy(), 0..20).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn tokenize_never_panics(input in source_strategy()) {
        let _ = tokenize(FileId::ZERO, &input);
    }

    #[test]
    fn tokenize_never_panics_on_arbitrary_bytes(input in "\\PC{0,200}") {
        let _ = tokenize(FileId::ZERO, &input);
    }

    #[test]
    fn token_spans_are_within_bounds_and_ordered(input in source_strategy()) {
        let (tokens, _) = tokenize(FileId::ZERO, &input);
        let mut last_end = 0usize;
        for spanned in &tokens {
            prop_assert!(spanned.span.start <= spanned.span.end);
            prop_assert!(spanned.span.end <= input.len());
            prop_assert!(spanned.span.start >= last_end);
            last_end = spanned.span.end;
        }
    }

    #[test]
    fn block_capture_consumption_is_consistent(input in "[a-z(){}\"'\\\\ \n]{0,120}") {
        let cap = capture_block(&input);
        prop_assert!(cap.consumed <= input.len());
        if cap.terminated {
            // Everything before the closing brace is the captured text.
            prop_assert_eq!(cap.text.as_str(), &input[..cap.consumed - 1]);
            prop_assert_eq!(&input[cap.consumed - 1..cap.consumed], "}");
        } else {
            prop_assert_eq!(cap.consumed, input.len());
        }
    }

    #[test]
    fn line_capture_stops_at_the_newline(input in "[ -~\n]{0,120}") {
        let cap = capture_line(&input);
        prop_assert!(cap.consumed <= input.len());
        prop_assert!(!cap.text.contains('\n'));
        prop_assert!(cap.terminated);
    }

    #[test]
    fn whole_pipeline_never_panics(input in source_strategy()) {
        let _ = veld::compile_source("prop.veld", &input);
    }
}
