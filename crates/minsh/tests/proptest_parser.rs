//! Property-based tests for the lexer and parser
//!
//! Generates random lines and checks that parsing is total and structurally
//! sound.

use minsh::parser::{Token, lex, parse};
use minsh::Shell;
use proptest::prelude::*;

/// Strategies for generating shell-like input
mod strategies {
    use proptest::prelude::*;

    /// Arbitrary strings (may be invalid shell)
    pub fn arbitrary_string() -> impl Strategy<Value = String> {
        prop::string::string_regex(".{0,100}").unwrap()
    }

    /// Plain words: no quotes, operators, `$` or backslashes
    pub fn plain_word() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-zA-Z0-9_./,:=+-]{1,20}").unwrap()
    }

    /// Lines built from shell metacharacters
    pub fn shell_noise() -> impl Strategy<Value = String> {
        prop::string::string_regex("[a-z $(){}|<>'\"\\\\0-9]{0,60}").unwrap()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Plain words separated by blanks lex to one word token each
    #[test]
    fn plain_words_lex_one_per_run(
        words in prop::collection::vec(strategies::plain_word(), 0..10),
        sep in prop::string::string_regex("[ \t]{1,3}").unwrap()
    ) {
        let line = words.join(&sep);
        let tokens = lex(&line);
        let expected: Vec<Token> = words.iter().cloned().map(Token::Word).collect();
        prop_assert_eq!(tokens, expected);
    }

    /// The parser never panics
    #[test]
    fn parse_never_panics(input in strategies::arbitrary_string()) {
        let _ = parse(&input);
    }

    /// The parser never panics on metacharacter-heavy input
    #[test]
    fn parse_never_panics_on_noise(input in strategies::shell_noise()) {
        let _ = parse(&input);
    }

    /// Pipes never produce unnamed commands
    #[test]
    fn pipes_never_produce_unnamed_commands(
        words in prop::collection::vec(
            prop_oneof![strategies::plain_word(), Just("|".to_string())],
            0..12
        )
    ) {
        let line = words.join(" ");
        let pipeline = parse(&line).unwrap();
        let named = words
            .split(|w| w == "|")
            .filter(|stage| !stage.is_empty())
            .count();
        prop_assert_eq!(pipeline.commands.len(), named);
        for command in &pipeline.commands {
            prop_assert!(!command.name.parts.is_empty());
        }
    }

    /// Parsing is deterministic
    #[test]
    fn parse_is_deterministic(input in strategies::shell_noise()) {
        let first = parse(&input).map_err(|e| e.to_string());
        let second = parse(&input).map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }

    /// Echoing plain words prints them back
    #[test]
    fn echo_round_trips_plain_words(
        words in prop::collection::vec(strategies::plain_word(), 1..6)
    ) {
        // `-e`/`-n`/`-E` style words are echo flags
        prop_assume!(!words[0].starts_with('-'));
        let line = format!("echo {}", words.join(" "));
        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut shell = Shell::builder()
                .inherit_process_env(false)
                .no_dotenv()
                .cwd(dir.path())
                .build();
            shell.exec(&line).await.unwrap()
        });
        prop_assert_eq!(result.stdout, format!("{}\n", words.join(" ")));
    }
}
