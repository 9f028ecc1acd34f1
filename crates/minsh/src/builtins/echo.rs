//! echo builtin command

use std::iter::Peekable;
use std::str::Chars;

use async_trait::async_trait;

use super::{Builtin, Completion, Context};
use crate::error::Result;

/// The echo builtin command.
///
/// Usage: echo [-neE] [ARG]...
///
/// Options:
///   -n   Do not print the trailing newline
///   -e   Interpret backslash escapes
///   -E   Do not interpret backslash escapes (default)
pub struct Echo;

#[async_trait]
impl Builtin for Echo {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let mut add_newline = true;
        let mut interpret_escapes = false;
        let mut args = ctx.args.iter().peekable();

        // Leading flag words only; anything else starts the text
        while let Some(arg) = args.peek() {
            let Some(flags) = arg.strip_prefix('-') else {
                break;
            };
            if flags.is_empty() || !flags.chars().all(|c| matches!(c, 'n' | 'e' | 'E')) {
                break;
            }
            for flag in flags.chars() {
                match flag {
                    'n' => add_newline = false,
                    'e' => interpret_escapes = true,
                    _ => interpret_escapes = false,
                }
            }
            args.next();
        }

        let mut output = Vec::new();
        let mut stop = false;
        for (i, arg) in args.enumerate() {
            if i > 0 {
                output.push(b' ');
            }
            if interpret_escapes {
                let (bytes, stopped) = interpret_escape_sequences(arg);
                output.extend_from_slice(&bytes);
                if stopped {
                    stop = true;
                    break;
                }
            } else {
                output.extend_from_slice(arg.as_bytes());
            }
        }

        if add_newline && !stop {
            output.push(b'\n');
        }

        ctx.io.write_stdout(output)?;
        Ok(Completion::SUCCESS)
    }
}

/// Expand backslash escapes. The flag is set when `\c` cut the output short.
///
/// `\0nnn` and `\xHH` produce a single raw byte, so the result is not
/// always valid UTF-8.
fn interpret_escape_sequences(s: &str) -> (Vec<u8>, bool) {
    let mut result = Vec::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    let mut buf = [0u8; 4];

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => result.push(b'\n'),
            Some('t') => result.push(b'\t'),
            Some('r') => result.push(b'\r'),
            Some('\\') => result.push(b'\\'),
            Some('a') => result.push(0x07),
            Some('b') => result.push(0x08),
            Some('f') => result.push(0x0c),
            Some('v') => result.push(0x0b),
            Some('0') => {
                // \0nnn octal
                let (value, _) = read_digits(&mut chars, 8, 3);
                result.push(value as u8);
            }
            Some('x') => {
                // \xHH hex
                match read_digits(&mut chars, 16, 2) {
                    (_, 0) => result.extend_from_slice(b"\\x"),
                    (value, _) => result.push(value as u8),
                }
            }
            Some('c') => return (result, true),
            Some(other) => {
                result.push(b'\\');
                result.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => result.push(b'\\'),
        }
    }

    (result, false)
}

/// Read up to `max` digits in `radix`; returns the value (low byte kept)
/// and how many digits were read.
fn read_digits(chars: &mut Peekable<Chars<'_>>, radix: u32, max: usize) -> (u32, usize) {
    let mut value = 0u32;
    let mut count = 0;
    while count < max {
        match chars.peek().and_then(|d| d.to_digit(radix)) {
            Some(digit) => {
                value = (value * radix + digit) & 0xff;
                chars.next();
                count += 1;
            }
            None => break,
        }
    }
    (value, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::TestRun;

    async fn echo(args: &[&str]) -> String {
        let dir = tempfile::tempdir().unwrap();
        let mut run = TestRun::new(dir.path());
        assert_eq!(run.run(&Echo, args).await, Completion::SUCCESS);
        run.stdout()
    }

    #[tokio::test]
    async fn test_echo_joins_args() {
        assert_eq!(echo(&["hello", "world"]).await, "hello world\n");
        assert_eq!(echo(&[]).await, "\n");
    }

    #[tokio::test]
    async fn test_echo_no_newline() {
        assert_eq!(echo(&["-n", "hi"]).await, "hi");
        assert_eq!(echo(&["-n", "-n", "hi"]).await, "hi");
    }

    #[tokio::test]
    async fn test_echo_flag_like_text() {
        assert_eq!(echo(&["-x", "hi"]).await, "-x hi\n");
        assert_eq!(echo(&["-"]).await, "-\n");
        assert_eq!(echo(&["hi", "-n"]).await, "hi -n\n");
    }

    #[tokio::test]
    async fn test_echo_escapes() {
        assert_eq!(echo(&["-e", "a\\tb"]).await, "a\tb\n");
        assert_eq!(echo(&["a\\tb"]).await, "a\\tb\n");
        assert_eq!(echo(&["-ne", "x\\ny"]).await, "x\ny");
        assert_eq!(echo(&["-e", "stop\\cignored", "more"]).await, "stop");
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(interpret_escape_sequences("hello\\nworld").0, b"hello\nworld");
        assert_eq!(interpret_escape_sequences("\\\\backslash").0, b"\\backslash");
        assert_eq!(interpret_escape_sequences("\\x41\\0101").0, b"AA");
        assert_eq!(interpret_escape_sequences("\\q").0, b"\\q");
        assert_eq!(interpret_escape_sequences("\\xZ").0, b"\\xZ");
    }

    #[test]
    fn test_high_escapes_are_single_bytes() {
        assert_eq!(interpret_escape_sequences("\\xff\\x80").0, vec![0xff, 0x80]);
        assert_eq!(interpret_escape_sequences("\\0377").0, vec![0xff]);
        assert_eq!(interpret_escape_sequences("é\\xe9").0, vec![0xc3, 0xa9, 0xe9]);
    }
}
