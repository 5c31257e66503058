//! Update command implementation
//!
//! One synchronization pass over the component directory, resolved into
//! one of the three result modes: persist, diff against disk, or print.

use crate::core::config::Context;
use crate::core::error::CadenceResult;
use crate::core::vcs::CommitHelper;
use crate::sync::{Synchronizer, UpdateAction};
use crate::ui::Output;
use chrono::Utc;

/// Run the update command
pub fn run_update(ctx: &Context, action: UpdateAction, commit: bool, output: &mut Output) -> CadenceResult<()> {
  let today = Utc::now().format("%Y-%m-%d").to_string();

  let mut synchronizer = Synchronizer::new(ctx, &today);
  synchronizer.synchronize()?;

  let mut helper = commit.then(|| CommitHelper::new(&ctx.component_dir, ctx.pretend));
  let text = synchronizer.finish(action, helper.as_mut(), output)?;

  if let Some(text) = text {
    output.raw(&text);
  }
  if let Some(helper) = &helper {
    for message in helper.messages() {
      output.ok(message.clone());
    }
  }
  Ok(())
}
