//! Command line parser.
//!
//! Lines are split on whitespace runs. The first token is the verb and the
//! rest are positional arguments. There is no quoting, escaping, globbing or
//! redirection: `"a b.txt"` is two arguments and `*` is a literal name.

use dropfs_core::{CommandInvocation, FsError, Verb};
use tracing::debug;

/// Parser for whitelisted shell commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandParser;

impl CommandParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Parse one command line.
    ///
    /// Fails with `EmptyCommand` for a blank line, `UnknownCommand` for a verb
    /// outside the whitelist and `BadArgCount` for the wrong number of
    /// arguments. Never touches the filesystem.
    pub fn parse(&self, raw: &str) -> Result<CommandInvocation, FsError> {
        let mut tokens = raw.split_whitespace();
        let Some(token) = tokens.next() else {
            return Err(FsError::EmptyCommand);
        };

        let verb = Verb::from_token(token)
            .ok_or_else(|| FsError::UnknownCommand(token.to_string()))?;
        let args: Vec<String> = tokens.map(str::to_string).collect();

        if !verb.arity().contains(&args.len()) {
            return Err(FsError::BadArgCount {
                verb: verb.to_string(),
                expected: verb.expected_args().to_string(),
                got: args.len(),
            });
        }

        debug!("Parsed {:?} as {} {:?}", raw, verb, args);
        Ok(CommandInvocation {
            raw: raw.trim().to_string(),
            verb,
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropfs_core::ErrorKind;

    fn parse(raw: &str) -> Result<CommandInvocation, FsError> {
        CommandParser::new().parse(raw)
    }

    // ========== Valid Commands ==========

    #[test]
    fn test_parse_ls_without_args() {
        let cmd = parse("ls").unwrap();
        assert_eq!(cmd.verb, Verb::Ls);
        assert!(cmd.args.is_empty());
        assert_eq!(cmd.arg(0), "");
    }

    #[test]
    fn test_parse_ls_with_dir() {
        let cmd = parse("ls docs").unwrap();
        assert_eq!(cmd.args, vec!["docs"]);
    }

    #[test]
    fn test_parse_mv_collapses_whitespace() {
        let cmd = parse("  mv \t a.txt    b.txt \n").unwrap();
        assert_eq!(cmd.verb, Verb::Mv);
        assert_eq!(cmd.args, vec!["a.txt", "b.txt"]);
        assert_eq!(cmd.raw, "mv \t a.txt    b.txt");
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let cmd = parse("cat a;rm").unwrap();
        assert_eq!(cmd.args, vec!["a;rm"]);

        let cmd = parse("touch $(reboot)").unwrap();
        assert_eq!(cmd.args, vec!["$(reboot)"]);
    }

    // ========== Rejections ==========

    #[test]
    fn test_empty_command() {
        assert!(matches!(parse(""), Err(FsError::EmptyCommand)));
        assert!(matches!(parse("   \t "), Err(FsError::EmptyCommand)));
    }

    #[test]
    fn test_unknown_verb() {
        let err = parse("rmdir docs").unwrap_err();
        assert!(matches!(err, FsError::UnknownCommand(ref v) if v == "rmdir"));
        assert_eq!(err.to_string(), "unsupported command: rmdir");
    }

    #[test]
    fn test_verbs_are_case_sensitive() {
        let err = parse("LS").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownCommand);
    }

    #[test]
    fn test_bad_arg_counts() {
        for raw in ["cat", "rm a b", "touch", "mv a", "mv a b c", "ls a b"] {
            let err = parse(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BadArgCount, "{raw}");
        }
    }

    #[test]
    fn test_bad_arg_count_message() {
        let err = parse("mv only-one").unwrap_err();
        assert_eq!(err.to_string(), "mv expects 2 arguments, got 1");
    }
}
