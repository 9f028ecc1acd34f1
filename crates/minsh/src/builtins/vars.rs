//! Variable removal builtin (unset)

use async_trait::async_trait;

use super::{Builtin, Completion, Context};
use crate::error::Result;
use crate::parser::is_valid_identifier;

/// unset builtin - remove variables from the session.
///
/// Usage: unset NAME...
pub struct Unset;

#[async_trait]
impl Builtin for Unset {
    async fn execute(&self, mut ctx: Context<'_>) -> Result<Completion> {
        let mut status = Completion::SUCCESS;

        for raw in ctx.args {
            let name = raw.trim();
            if !is_valid_identifier(name) {
                ctx.io
                    .write_stderr(format!("unset: not a valid identifier: {}\n", raw))?;
                status = Completion::FAILURE;
                continue;
            }
            if ctx.env.unset(name) {
                tracing::trace!(name, "unset variable");
            }
        }

        Ok(status)
    }
}
