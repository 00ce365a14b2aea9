use crate::{render, Context};
use std::io;

/// `llm-cost models`
pub fn execute(ctx: &Context) -> anyhow::Result<()> {
    render::models(&mut io::stdout().lock(), &ctx.prices)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_context;

    #[test]
    fn does_not_touch_database() {
        let (dir, ctx) = temp_context();
        execute(&ctx).unwrap();
        assert!(!dir.path().join("usage.db").exists());
    }

    #[test]
    fn works_with_broken_config() {
        let (_dir, ctx) = temp_context();
        std::fs::write(&ctx.config_path, "{not json").unwrap();
        execute(&ctx).unwrap();
    }
}
