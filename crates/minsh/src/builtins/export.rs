//! export builtin - set variables for the session and its child processes

use async_trait::async_trait;

use super::{Builtin, Completion, Context};
use crate::error::Result;
use crate::parser::is_valid_identifier;

/// export builtin.
///
/// Usage: export NAME[=VALUE]...
///
/// `NAME=VALUE` sets the variable. A bare `NAME` keeps an existing value and
/// creates an empty one otherwise. Every valid name is marked as exported;
/// invalid names are reported and skipped.
pub struct Export;

#[async_trait]
impl Builtin for Export {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let mut status = Completion::SUCCESS;

        for arg in ctx.args {
            let (name, value) = match arg.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value)),
                None => (arg.trim(), None),
            };

            if !is_valid_identifier(name) {
                ctx.io
                    .write_stderr(format!("export: not a valid identifier: {}\n", arg))?;
                status = Completion::FAILURE;
                continue;
            }

            ctx.env.export(name, value);
        }

        Ok(status)
    }
}
