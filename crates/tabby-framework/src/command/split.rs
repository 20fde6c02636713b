//! Command line tokenizing over raw CQ strings.
//!
//! Splitting works on the raw message (CQ codes included), so that a
//! mention or an image stays a single argument:
//!
//! ```text
//! [CQ:at,qq=1]kick "bad guy" now   ──▶  ["[CQ:at,qq=1]", "kick", "bad guy", "now"]
//! ```

/// Cuts a raw message down to its command candidate: everything before the
/// first CQ code, then before the first space.
pub fn command_candidate(raw: &str) -> &str {
    let head = raw.split_once("[CQ:").map_or(raw, |(head, _)| head);
    head.split_once(' ').map_or(head, |(head, _)| head)
}

/// Splits `input` into arguments.
///
/// Spaces separate arguments except inside `[...]`. A `"` opens a quoted
/// run in which `\"` and `\\` are escapes and brackets nest verbatim; text
/// right after the closing quote continues the same argument. Unless
/// `split_by_space_only` is set, a bracketed span is also cut off from the
/// text around it.
pub fn tokenize(input: &str, split_by_space_only: bool) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_bracket = false;
    let mut chars = input.chars();

    fn flush(args: &mut Vec<String>, current: &mut String) {
        if !current.is_empty() {
            args.push(std::mem::take(current));
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            ' ' if in_bracket => current.push(ch),
            ' ' => flush(&mut args, &mut current),
            '"' if in_bracket => current.push(ch),
            '"' => quoted(&mut chars, &mut current),
            '[' => {
                in_bracket = true;
                if !split_by_space_only {
                    flush(&mut args, &mut current);
                }
                current.push(ch);
            }
            ']' => {
                in_bracket = false;
                current.push(ch);
                if !split_by_space_only {
                    flush(&mut args, &mut current);
                }
            }
            _ => current.push(ch),
        }
    }
    flush(&mut args, &mut current);
    args
}

/// Consumes a quoted run up to and including its closing quote.
fn quoted(chars: &mut std::str::Chars<'_>, current: &mut String) {
    let mut in_bracket = false;
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_bracket => current.push(ch),
            '\\' => match chars.next() {
                Some(escaped @ ('"' | '\\')) => current.push(escaped),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => {
                    current.push('\\');
                    return;
                }
            },
            '"' if in_bracket => current.push(ch),
            '"' => return,
            '[' => {
                in_bracket = true;
                current.push(ch);
            }
            ']' => {
                in_bracket = false;
                current.push(ch);
            }
            _ => current.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        assert_eq!(tokenize("arg1 arg2 arg3", true), ["arg1", "arg2", "arg3"]);
    }

    #[test]
    fn test_split_cq_boundary() {
        let msg = "[CQ:at,qq=123456]arg1 arg2 arg3";
        assert_eq!(
            tokenize(msg, false),
            ["[CQ:at,qq=123456]", "arg1", "arg2", "arg3"]
        );
        assert_eq!(
            tokenize(msg, true),
            ["[CQ:at,qq=123456]arg1", "arg2", "arg3"]
        );
    }

    #[test]
    fn test_split_space_inside_bracket() {
        let msg = "[CQ:at,qq=123 45&amp;6]arg1 arg2&amp; arg3";
        assert_eq!(
            tokenize(msg, false),
            ["[CQ:at,qq=123 45&amp;6]", "arg1", "arg2&amp;", "arg3"]
        );
    }

    #[test]
    fn test_split_quoted() {
        assert_eq!(
            tokenize(r#""abc [CQ:at,qq=123 45&amp;6]arg1" arg2"#, false),
            ["abc [CQ:at,qq=123 45&amp;6]arg1", "arg2"]
        );
        assert_eq!(
            tokenize(r#""abc\"de\\f" arg2"#, false),
            ["abc\"de\\f", "arg2"]
        );
    }

    #[test]
    fn test_split_quote_and_escapes_inside_bracket() {
        let msg = r#""abc[CQ:x,qq=abc"def\g\"hi]f" [CQ:x,qq=abc"def\g\"hi] arg2"#;
        assert_eq!(
            tokenize(msg, false),
            [
                r#"abc[CQ:x,qq=abc"def\g\"hi]f"#,
                r#"[CQ:x,qq=abc"def\g\"hi]"#,
                "arg2"
            ]
        );
    }

    #[test]
    fn test_split_adjacent_brackets() {
        let msg = r#"abc[CQ:x,qq=abc"def\g\"hi][CQ:x,qq=abc"def\g\"hi] arg2"#;
        assert_eq!(
            tokenize(msg, true),
            [r#"abc[CQ:x,qq=abc"def\g\"hi][CQ:x,qq=abc"def\g\"hi]"#, "arg2"]
        );
        assert_eq!(
            tokenize(msg, false),
            [
                "abc",
                r#"[CQ:x,qq=abc"def\g\"hi]"#,
                r#"[CQ:x,qq=abc"def\g\"hi]"#,
                "arg2"
            ]
        );
    }

    #[test]
    fn test_split_unterminated() {
        assert_eq!(tokenize(r#"a "b c"#, false), ["a", "b c"]);
        assert_eq!(tokenize(r#""x\"#, false), ["x\\"]);
        assert_eq!(tokenize(r#""x\n""#, false), ["x\\n"]);
        assert_eq!(tokenize(r#""ab"cd ef"#, false), ["abcd", "ef"]);
    }

    #[test]
    fn test_split_never_emits_empty() {
        assert!(tokenize("", false).is_empty());
        assert!(tokenize("    ", true).is_empty());
        assert_eq!(tokenize(r#"a "" b"#, false), ["a", "b"]);
    }

    #[test]
    fn test_command_candidate() {
        assert_eq!(command_candidate("prefix arg1 arg2 arg3"), "prefix");
        assert_eq!(command_candidate("prefix[CQ:at,qq=123456]arg1 arg2"), "prefix");
        assert_eq!(
            command_candidate("pre&amp;fix[CQ:at,qq=123456]arg1 arg2"),
            "pre&amp;fix"
        );
        assert_eq!(command_candidate("[CQ:at,qq=1] x"), "");
        assert_eq!(command_candidate(" x"), "");
    }
}
