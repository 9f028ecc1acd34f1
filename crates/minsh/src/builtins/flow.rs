//! Flow control builtins (true, false, exit)

use async_trait::async_trait;

use super::{Builtin, Completion, Context};
use crate::error::Result;

/// The true builtin - always returns 0.
pub struct True;

#[async_trait]
impl Builtin for True {
    async fn execute(&self, _ctx: Context<'_>) -> Result<Completion> {
        Ok(Completion::SUCCESS)
    }
}

/// The false builtin - always returns 1.
pub struct False;

#[async_trait]
impl Builtin for False {
    async fn execute(&self, _ctx: Context<'_>) -> Result<Completion> {
        Ok(Completion::FAILURE)
    }
}

/// The exit builtin - end the session.
///
/// Usage: exit [N]
///
/// A missing or non-numeric N exits with 0. Only the leading integer of N
/// is used, so `exit 3abc` exits with 3.
pub struct Exit;

#[async_trait]
impl Builtin for Exit {
    async fn execute(&self, ctx: Context<'_>) -> Result<Completion> {
        let code = ctx.args.first().map(|s| parse_leading_int(s)).unwrap_or(0);
        Ok(Completion::ExitShell(code))
    }
}

/// Parse an optional sign and leading decimal digits; 0 when there are none.
fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().unwrap_or(0);
    let value = if negative { -value } else { value };
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
