//! Release lifecycle commands
//!
//! set-version, set-state, next-version, sentinel and timestamp. All of
//! them mutate wrapper handles in memory, re-run the synchronizer where the
//! descriptor changed, and resolve into either a real write or a pretend
//! report with the same message tokens.

use crate::changelog;
use crate::core::config::Context;
use crate::core::error::CadenceResult;
use crate::core::vcs::CommitHelper;
use crate::sync::Synchronizer;
use crate::ui::Output;
use crate::version;
use crate::wrappers::{SentinelWrapper, Wrapper, WrapperCache, CHANGELOG_YML_FILE, CHANGES_FILE};
use chrono::Utc;
use std::path::Path;

fn today() -> String {
  Utc::now().format("%Y-%m-%d").to_string()
}

/// Comma-separated local paths of every materialized wrapper.
fn wrapper_list(cache: &WrapperCache, base: &Path) -> String {
  cache
    .materialized()
    .iter()
    .map(|w| w.local_path(base).display().to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

fn stage_all(cache: &WrapperCache, helper: &mut CommitHelper, base: &Path) -> CadenceResult<()> {
  for wrapper in cache.materialized() {
    helper.add(wrapper.path(), base)?;
  }
  Ok(())
}

fn flush_helper(helper: &Option<CommitHelper>, output: &mut Output) {
  if let Some(helper) = helper {
    for message in helper.messages() {
      output.ok(message.clone());
    }
  }
}

/// Run the set-version command
pub fn run_set_version(
  ctx: &Context,
  release: Option<&str>,
  api: Option<&str>,
  commit: bool,
  output: &mut Output,
) -> CadenceResult<()> {
  let today = today();
  let mut synchronizer = Synchronizer::new(ctx, &today);

  {
    let cache = synchronizer.cache_mut();
    let current = cache.descriptor()?.data().version.release.clone();
    if cache.doc_dir().join(CHANGELOG_YML_FILE).exists() {
      changelog::set_version(cache.changelog_yml()?.store_mut(), &current, release, api);
    }
    cache.descriptor()?.set_version(release, api);
  }

  synchronizer.synchronize()?;
  refresh_changes_and_sentinel(ctx, &mut synchronizer, release)?;

  let list = wrapper_list(synchronizer.cache(), &ctx.component_dir);
  if ctx.pretend {
    output.ok(format!(
      "Would set release version \"{}\" and api version \"{}\" in {} now.",
      release.unwrap_or(""),
      api.unwrap_or(""),
      list
    ));
  } else {
    synchronizer.cache().save_all()?;
    output.ok(format!(
      "Set release version \"{}\" and api version \"{}\" in {}.",
      release.unwrap_or(""),
      api.unwrap_or(""),
      list
    ));
  }

  let mut helper = commit.then(|| CommitHelper::new(&ctx.component_dir, ctx.pretend));
  if let Some(helper) = helper.as_mut() {
    stage_all(synchronizer.cache(), helper, &ctx.component_dir)?;
  }
  flush_helper(&helper, output);
  Ok(())
}

/// Run the set-state command
pub fn run_set_state(
  ctx: &Context,
  release_state: Option<&str>,
  api_state: Option<&str>,
  commit: bool,
  output: &mut Output,
) -> CadenceResult<()> {
  let mut cache = WrapperCache::new(&ctx.component_dir);
  let xml = cache.package_xml()?;
  if let Some(state) = release_state {
    xml.stability_release = state.to_string();
  }
  if let Some(state) = api_state {
    xml.stability_api = state.to_string();
  }
  let xml_path = xml.path().to_path_buf();

  if ctx.pretend {
    output.ok(format!(
      "Would set release state \"{}\" and api state \"{}\" in {} now.",
      release_state.unwrap_or(""),
      api_state.unwrap_or(""),
      xml_path.display()
    ));
  } else {
    cache.package_xml()?.save()?;
    output.ok(format!(
      "Set release state \"{}\" and api state \"{}\" in {}.",
      release_state.unwrap_or(""),
      api_state.unwrap_or(""),
      xml_path.display()
    ));
  }

  let mut helper = commit.then(|| CommitHelper::new(&ctx.component_dir, ctx.pretend));
  if let Some(helper) = helper.as_mut() {
    helper.add(&xml_path, &ctx.component_dir)?;
  }
  flush_helper(&helper, output);
  Ok(())
}

/// Run the next-version command
pub fn run_next_version(
  ctx: &Context,
  next_version: &str,
  initial_note: &str,
  release_stability: Option<&str>,
  api_stability: Option<&str>,
  commit: bool,
  output: &mut Output,
) -> CadenceResult<()> {
  let today = today();
  let mut synchronizer = Synchronizer::new(ctx, &today);

  {
    let cache = synchronizer.cache_mut();
    let current = cache.descriptor()?.data().version.release.clone();
    let store_path = cache.changelog_yml()?.path().to_path_buf();
    changelog::advance_version(
      cache.changelog_yml()?.store_mut(),
      &current,
      next_version,
      initial_note,
      release_stability,
      api_stability,
      &store_path,
    )?;
    cache.descriptor()?.set_version(Some(next_version), None);
  }

  synchronizer.synchronize()?;
  refresh_changes_and_sentinel(ctx, &mut synchronizer, Some(next_version))?;

  let list = wrapper_list(synchronizer.cache(), &ctx.component_dir);
  let mut message = if ctx.pretend {
    format!(
      "Would add next version \"{}\" with the initial note \"{}\" to {} now.",
      next_version, initial_note, list
    )
  } else {
    synchronizer.cache().save_all()?;
    format!(
      "Added next version \"{}\" with the initial note \"{}\" to {}.",
      next_version, initial_note, list
    )
  };
  if let Some(stability) = release_stability {
    message.push_str(&format!(" Release stability: \"{}\".", stability));
  }
  if let Some(stability) = api_stability {
    message.push_str(&format!(" API stability: \"{}\".", stability));
  }
  output.ok(message);

  let mut helper = commit.then(|| CommitHelper::new(&ctx.component_dir, ctx.pretend));
  if let Some(helper) = helper.as_mut() {
    stage_all(synchronizer.cache(), helper, &ctx.component_dir)?;
    let name = synchronizer.cache_mut().package_xml()?.name.clone();
    helper.commit(&format!("Development mode for {}-{}", name, next_version))?;
  }
  flush_helper(&helper, output);
  Ok(())
}

/// Run the sentinel command: rewrite the CHANGES header and the source
/// version literal with the given values.
pub fn run_sentinel(
  ctx: &Context,
  changes_version: &str,
  app_version: &str,
  commit: bool,
  output: &mut Output,
) -> CadenceResult<()> {
  let mut cache = WrapperCache::new(&ctx.component_dir);
  let action = if ctx.pretend { "Would" } else { "Did" };
  let mut helper = commit.then(|| CommitHelper::new(&ctx.component_dir, ctx.pretend));

  if cache.doc_dir().join(CHANGES_FILE).exists() {
    let changes = cache.changes()?;
    changes.replace_header(changes_version)?;
    let path = changes.path().to_path_buf();
    if !ctx.pretend {
      cache.changes()?.save()?;
    }
    if let Some(helper) = helper.as_mut() {
      helper.add(&path, &ctx.component_dir)?;
    }
    output.ok(format!(
      "{} replace sentinel in {} with \"{}\" now.",
      action,
      path.display(),
      changes_version
    ));
  }

  if SentinelWrapper::locate(&ctx.component_dir).is_some() {
    let sentinel = cache.sentinel()?;
    sentinel.replace(app_version)?;
    let path = sentinel.path().to_path_buf();
    if !ctx.pretend {
      cache.sentinel()?.save()?;
    }
    if let Some(helper) = helper.as_mut() {
      helper.add(&path, &ctx.component_dir)?;
    }
    output.ok(format!(
      "{} replace sentinel in {} with \"{}\" now.",
      action,
      path.display(),
      app_version
    ));
  }

  flush_helper(&helper, output);
  Ok(())
}

/// Run the timestamp command
pub fn run_timestamp(ctx: &Context, commit: bool, output: &mut Output) -> CadenceResult<()> {
  let today = today();
  let mut synchronizer = Synchronizer::new(ctx, &today);

  {
    let cache = synchronizer.cache_mut();
    let current = cache.descriptor()?.data().version.release.clone();
    if cache.doc_dir().join(CHANGELOG_YML_FILE).exists() {
      changelog::timestamp(cache.changelog_yml()?.store_mut(), &current, &today);
    }
  }

  synchronizer.synchronize()?;

  let store_path = synchronizer.cache().doc_dir().join(CHANGELOG_YML_FILE);
  let xml_path = synchronizer.cache_mut().package_xml()?.path().to_path_buf();
  if ctx.pretend {
    output.ok(format!(
      "Would timestamp {} and {} now and synchronize its change log.",
      store_path.display(),
      xml_path.display()
    ));
  } else {
    synchronizer.cache().save_all()?;
    output.ok(format!(
      "Marked {} and {} with current timestamp and synchronized the change log.",
      store_path.display(),
      xml_path.display()
    ));
  }

  let mut helper = commit.then(|| CommitHelper::new(&ctx.component_dir, ctx.pretend));
  if let Some(helper) = helper.as_mut() {
    stage_all(synchronizer.cache(), helper, &ctx.component_dir)?;
    let cache = synchronizer.cache_mut();
    let name = cache.package_xml()?.name.clone();
    let version = cache.package_xml()?.version_release.clone();
    helper.commit(&format!("Released {}-{}", name, version))?;
  }
  flush_helper(&helper, output);
  Ok(())
}

/// Refresh the CHANGES rendering and the source sentinel after a version
/// change; both are skipped for components that do not keep them.
fn refresh_changes_and_sentinel(
  ctx: &Context,
  synchronizer: &mut Synchronizer<'_>,
  new_release: Option<&str>,
) -> CadenceResult<()> {
  let cache = synchronizer.cache_mut();

  // Only re-render CHANGES when the component keeps both files; an empty
  // store must never wipe an existing changelog text.
  if cache.doc_dir().join(CHANGELOG_YML_FILE).exists() && cache.doc_dir().join(CHANGES_FILE).exists() {
    let store = cache.changelog_yml()?.store().clone();
    let rendered = changelog::render_changes(&store);
    cache.changes()?.set_content(rendered);
  }

  if let Some(release) = new_release
    && SentinelWrapper::locate(&ctx.component_dir).is_some()
  {
    let literal = version::sentinel_literal(release, ctx.config.naming.branch.as_deref());
    cache.sentinel()?.replace(&literal)?;
  }
  Ok(())
}
