//! env builtin - print the session environment

use async_trait::async_trait;
use colored::Colorize;

use super::{Builtin, Completion, Context};
use crate::error::Result;

/// The env builtin.
///
/// Usage: env
///
/// Prints every variable as `KEY=VALUE`, sorted by name. On a terminal,
/// variables exported in this session are green and variables loaded from
/// a dotenv file are bright green.
pub struct Env;

#[async_trait]
impl Builtin for Env {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let use_color = ctx.io.stdout_is_tty();
        let mut output = String::new();

        for (key, value) in ctx.env.iter() {
            let line = format!("{}={}", key, value);
            if use_color && ctx.env.is_exported(key) {
                output.push_str(&line.green().to_string());
            } else if use_color && ctx.env.is_from_dotenv(key) {
                output.push_str(&line.bright_green().to_string());
            } else {
                output.push_str(&line);
            }
            output.push('\n');
        }

        ctx.io.write_stdout(output)?;
        Ok(Completion::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::testing::TestRun;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_env_sorted_plain() {
        let dir = tempfile::tempdir().unwrap();
        let mut run = TestRun::new(dir.path());
        run.env.set("PATH", "/bin:/usr/bin");
        run.env.set("HOME", "/home/user");
        run.env.export("ZED", Some("last"));
        run.env.from_dotenv.insert("HOME".to_string());

        assert_eq!(run.run(&Env, &[]).await, Completion::SUCCESS);
        // Not a terminal: no color codes
        assert_eq!(
            run.stdout(),
            "HOME=/home/user\nPATH=/bin:/usr/bin\nZED=last\n"
        );
    }

    #[tokio::test]
    async fn test_env_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut run = TestRun::new(dir.path());
        run.run(&Env, &[]).await;
        assert_eq!(run.stdout(), "");
    }
}
