//! Property-based tests for command line-splitting normalization

use proptest::prelude::*;
use wasmrepl::repl::split_command;

proptest! {
    /// A trailing line break adds exactly one trailing blank line to the
    /// split, and nothing else changes.
    #[test]
    fn trailing_break_adds_one_blank_line(s in "[a-z0-9 ()$.]{1,40}") {
        let without = split_command(&s);
        let with = split_command(&format!("{}\n", s));
        prop_assert_eq!(with.len(), without.len() + 1);
        prop_assert_eq!(with.last().cloned(), Some(String::new()));
        prop_assert_eq!(&with[..without.len()], &without[..]);
    }

    /// No logical line ever contains a line break.
    #[test]
    fn lines_never_contain_breaks(s in "[a-z0-9 ()$.\n]{0,60}") {
        for line in split_command(&s) {
            prop_assert!(!line.contains('\n'));
        }
    }

    /// CRLF breaks split exactly like LF breaks.
    #[test]
    fn crlf_splits_like_lf(a in "[a-z ()]{0,20}", b in "[a-z ()]{0,20}") {
        let crlf = split_command(&format!("{}\r\n{}", a, b));
        let lf = split_command(&format!("{}\n{}", a, b));
        prop_assert_eq!(crlf, lf);
    }

    /// Non-empty commands always produce at least one logical line.
    #[test]
    fn non_empty_commands_split_non_empty(s in "[a-z()]{1,20}") {
        prop_assert!(!split_command(&s).is_empty());
    }
}
