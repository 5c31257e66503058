//! Metadata synchronizer
//!
//! One pass reads the canonical descriptor and rewrites the in-memory state
//! of every derived manifest to match: identity fields and versions into
//! package.xml, a recomputed content list, translated dependency sections,
//! and a freshly derived composer.json. Nothing touches disk until the
//! caller picks the update result mode; print and diff never write at all.

pub mod contents;

pub use contents::{ContentWalker, WalkdirWalker};

use crate::changelog;
use crate::core::config::Context;
use crate::core::error::{CadenceError, CadenceResult};
use crate::core::vcs::CommitHelper;
use crate::ui::Output;
use crate::version::{constraint_to_bounds, map_dependency_type, ConstraintBounds, ManifestDependencyType};
use crate::wrappers::descriptor::{ComponentDescriptor, DependencySet};
use crate::wrappers::package_xml::{ExtensionDependency, ManifestAuthor, PackageDependency};
use crate::wrappers::{
  ComposerAuthor, ComposerManifest, ComposerRepository, ComponentType, Wrapper, WrapperCache, CHANGELOG_YML_FILE,
};
use std::collections::BTreeMap;

/// What to do with the mutated handles of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
  /// Persist every mutated handle
  Update,
  /// Render the concatenated textual form of every handle
  Print,
  /// Compare every handle against its on-disk content
  Diff,
}

/// Orchestrates one synchronization pass over a component directory.
///
/// Owns the wrapper cache exclusively for the session; handles live for
/// exactly one pass.
pub struct Synchronizer<'a> {
  ctx: &'a Context,
  cache: WrapperCache,
  walker: Box<dyn ContentWalker>,
  today: String,
}

impl<'a> Synchronizer<'a> {
  pub fn new(ctx: &'a Context, today: &str) -> Self {
    Self {
      ctx,
      cache: WrapperCache::new(&ctx.component_dir),
      walker: Box::new(WalkdirWalker),
      today: today.to_string(),
    }
  }

  /// Substitute the content walker (tests use a fixed listing).
  pub fn with_walker(mut self, walker: Box<dyn ContentWalker>) -> Self {
    self.walker = walker;
    self
  }

  pub fn cache(&self) -> &WrapperCache {
    &self.cache
  }

  pub fn cache_mut(&mut self) -> &mut WrapperCache {
    &mut self.cache
  }

  /// Run the pass: mutate every derived handle to match the descriptor.
  ///
  /// Pure in-memory transformation; a malformed descriptor aborts before
  /// any handle could be persisted.
  pub fn synchronize(&mut self) -> CadenceResult<()> {
    let descriptor = self.cache.descriptor()?.data().clone();
    descriptor.validate()?;

    let naming = self.ctx.config.naming.clone();
    let plan = DependencyPlan::build(&descriptor, &naming.channel)?;

    let changelog_exists = self.cache.doc_dir().join(CHANGELOG_YML_FILE).exists();
    let store = if changelog_exists {
      Some(self.cache.changelog_yml()?.store().clone())
    } else {
      None
    };

    let today = self.today.clone();
    let xml = self.cache.package_xml()?;

    xml.name = manifest_name(&descriptor, &naming.package_prefix());
    xml.channel = naming.channel.clone();
    xml.summary = descriptor.full.clone();
    xml.description = descriptor.description.clone();
    xml.version_release = descriptor.version.release.clone();
    xml.version_api = descriptor.version.api.clone();
    xml.stability_release = descriptor.state.release.as_str().to_string();
    xml.stability_api = descriptor.state.api.as_str().to_string();
    xml.license = descriptor.license.identifier.clone();
    xml.license_uri = descriptor.license.uri.clone();
    xml.authors = descriptor
      .authors
      .iter()
      .map(|author| ManifestAuthor {
        role: author.role.clone(),
        name: author.name.clone(),
        user: author.user.clone().unwrap_or_default(),
        email: author.email.clone(),
        active: author.active,
      })
      .collect();
    if xml.date.is_empty() {
      xml.date = today;
    }

    // Native-extension packages keep their hand-maintained content and
    // dependency sections; only the identity fields above are synced.
    let is_extension_package = xml.provides_extension.is_some();

    if !is_extension_package {
      let contents = self.walker.walk(&self.ctx.component_dir)?;
      let xml = self.cache.package_xml()?;
      xml.set_contents(contents);
      xml.clear_dependencies();
      xml.php_bounds = plan.php.clone();
      xml.required_packages = plan.required_packages.clone();
      xml.required_extensions = plan.required_extensions.clone();
      xml.optional_packages = plan.optional_packages.clone();
      xml.optional_extensions = plan.optional_extensions.clone();
    }

    if let Some(store) = &store {
      let release = descriptor.version.release.clone();
      changelog::update_manifest(store, &release, self.cache.package_xml()?);
    }

    if !is_extension_package {
      let manifest = build_composer_manifest(&descriptor, &naming, &self.today)?;
      self.cache.composer_json()?.set(manifest);
    }

    Ok(())
  }

  /// Resolve the pass into its result mode.
  ///
  /// `Print` and `Diff` return text; `Update` persists the handles (or, in
  /// pretend mode, only reports what it would write) and returns `None`.
  pub fn finish(
    &mut self,
    action: UpdateAction,
    commit: Option<&mut CommitHelper>,
    output: &mut Output,
  ) -> CadenceResult<Option<String>> {
    match action {
      UpdateAction::Print => {
        let mut parts = Vec::new();
        for wrapper in self.cache.materialized() {
          parts.push(wrapper.render()?);
        }
        Ok(Some(parts.join("===\n")))
      }
      UpdateAction::Diff => {
        let mut text = String::new();
        for wrapper in self.cache.materialized() {
          if let Some(diff) = wrapper.diff()? {
            let local = wrapper.local_path(&self.ctx.component_dir);
            text.push_str(&format!("--- a/{}\n+++ b/{}\n", local.display(), local.display()));
            text.push_str(&diff);
          }
        }
        Ok(Some(text))
      }
      UpdateAction::Update => {
        let component_dir = self.ctx.component_dir.clone();
        let mut commit = commit;
        for wrapper in self.cache.materialized() {
          let local = wrapper.local_path(&component_dir);
          if self.ctx.pretend {
            output.ok(format!("Would update {} now.", local.display()));
          } else {
            wrapper.save()?;
            output.ok(format!("Updated {}.", local.display()));
          }
          if let Some(helper) = commit.as_deref_mut() {
            helper.add(wrapper.path(), &component_dir)?;
          }
        }
        Ok(None)
      }
    }
  }
}

/// Manifest package name: libraries carry the configured prefix.
pub fn manifest_name(descriptor: &ComponentDescriptor, prefix: &str) -> String {
  match descriptor.component_type {
    ComponentType::Library => format!("{}{}", prefix, descriptor.id),
    _ => descriptor.id.clone(),
  }
}

/// Dependency sections translated ahead of any mutation so that unknown
/// types and malformed constraints abort the pass untouched.
#[derive(Debug, Clone, Default)]
struct DependencyPlan {
  php: ConstraintBounds,
  required_packages: Vec<PackageDependency>,
  required_extensions: Vec<ExtensionDependency>,
  optional_packages: Vec<PackageDependency>,
  optional_extensions: Vec<ExtensionDependency>,
}

impl DependencyPlan {
  fn build(descriptor: &ComponentDescriptor, default_channel: &str) -> CadenceResult<Self> {
    let mut plan = Self::default();
    for (required, group) in [
      (true, &descriptor.dependencies.required),
      (false, &descriptor.dependencies.optional),
    ] {
      for (dep_type, set) in group {
        match map_dependency_type(dep_type)? {
          None => {
            // The PHP constraint has a dedicated slot; optional PHP
            // constraints have no representation and are skipped.
            if required {
              let DependencySet::Constraint(expr) = set else {
                return Err(CadenceError::message("The 'php' dependency takes a bare constraint"));
              };
              plan.php = constraint_to_bounds(expr)?;
            }
          }
          Some(ManifestDependencyType::Package) => {
            let DependencySet::Packages(packages) = set else {
              return Err(CadenceError::message("The 'pear' dependency type takes a name map"));
            };
            for (key, constraint) in packages {
              let (channel, name) = key
                .split_once('/')
                .unwrap_or((default_channel, key.as_str()));
              let dependency = PackageDependency {
                name: name.to_string(),
                channel: channel.to_string(),
                bounds: constraint_to_bounds(constraint.version())?,
              };
              if required {
                plan.required_packages.push(dependency);
              } else {
                plan.optional_packages.push(dependency);
              }
            }
          }
          Some(ManifestDependencyType::Extension) => {
            let DependencySet::Packages(extensions) = set else {
              return Err(CadenceError::message("The 'ext' dependency type takes a name map"));
            };
            for (name, constraint) in extensions {
              let dependency = ExtensionDependency {
                name: name.clone(),
                bounds: constraint_to_bounds(constraint.version())?,
              };
              if required {
                plan.required_extensions.push(dependency);
              } else {
                plan.optional_extensions.push(dependency);
              }
            }
          }
        }
      }
    }
    Ok(plan)
  }
}

/// Derive the composer manifest from the descriptor.
fn build_composer_manifest(
  descriptor: &ComponentDescriptor,
  naming: &crate::core::config::NamingConfig,
  today: &str,
) -> CadenceResult<ComposerManifest> {
  let is_library = descriptor.component_type == ComponentType::Library;
  let prefix = if is_library { naming.package_prefix() } else { String::new() };

  let name = format!(
    "{}/{}",
    naming.vendor,
    descriptor.id.to_lowercase().replace('_', "-")
  );

  let mut require = BTreeMap::new();
  let mut suggest = BTreeMap::new();
  for (required, group) in [
    (true, &descriptor.dependencies.required),
    (false, &descriptor.dependencies.optional),
  ] {
    let target = if required { &mut require } else { &mut suggest };
    for (dep_type, set) in group {
      map_dependency_type(dep_type)?;
      match set {
        DependencySet::Constraint(expr) => {
          target.insert(dep_type.clone(), expr.clone());
        }
        DependencySet::Packages(packages) => {
          for (key, constraint) in packages {
            target.insert(format!("{}-{}", dep_type, key), constraint.version().to_string());
          }
        }
      }
    }
  }

  let major = descriptor
    .version
    .release
    .split('.')
    .next()
    .unwrap_or("0")
    .to_string();
  let replace_version = format!("{}.*", major);
  let replaced = format!("{}{}", prefix, descriptor.id);
  let replace = BTreeMap::from([
    (format!("pear-{}/{}", naming.channel, replaced), replace_version.clone()),
    (format!("pear-{}/{}", naming.vendor, replaced), replace_version),
  ]);

  let autoload_prefix = if is_library {
    format!("{}{}", prefix, descriptor.id)
  } else {
    descriptor.name.clone()
  };

  Ok(ComposerManifest {
    name,
    description: descriptor.full.clone(),
    package_type: if is_library { "library" } else { "project" }.to_string(),
    homepage: descriptor
      .homepage
      .clone()
      .unwrap_or_else(|| naming.default_homepage()),
    license: descriptor.license.identifier.clone(),
    authors: descriptor
      .authors
      .iter()
      .map(|author| ComposerAuthor {
        name: author.name.clone(),
        email: author.email.clone(),
        role: author.role.clone(),
      })
      .collect(),
    version: descriptor.version.release.clone(),
    time: today.to_string(),
    repositories: vec![ComposerRepository {
      repository_type: "pear".to_string(),
      url: naming.repository_url(),
    }],
    require,
    suggest,
    replace,
    autoload: crate::wrappers::composer_json::ComposerAutoload {
      psr0: BTreeMap::from([(autoload_prefix, "lib/".to_string())]),
    },
  })
}
