//! The generated XML package manifest (package.xml)
//!
//! A typed model of the PEAR package-2.0 schema subset cadence maintains.
//! Loading goes through sxd-document with XPath queries under the `p:`
//! namespace prefix; rendering is a deterministic writer so that an
//! unchanged model re-renders byte-identically (the property diff mode
//! relies on).

use crate::core::error::{CadenceError, CadenceResult};
use crate::version::ConstraintBounds;
use crate::wrappers::{Wrapper, WrapperKind};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use sxd_document::dom::{ChildOfElement, Element, ParentOfChild};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};

/// File name of the generated XML manifest.
pub const PACKAGE_XML_FILE: &str = "package.xml";

/// Namespace of the package-2.0 schema; queries use the `p:` prefix.
pub const PACKAGE_NS: &str = "http://pear.php.net/dtd/package-2.0";

const PEARINSTALLER_MIN: &str = "1.7.0";

#[derive(Debug, Clone, Default)]
pub struct ManifestAuthor {
  /// `lead` or `developer`
  pub role: String,
  pub name: String,
  pub user: String,
  pub email: String,
  pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFile {
  pub path: String,
  pub role: String,
}

#[derive(Debug, Clone, Default)]
pub struct PackageDependency {
  pub name: String,
  pub channel: String,
  pub bounds: ConstraintBounds,
}

#[derive(Debug, Clone, Default)]
pub struct ExtensionDependency {
  pub name: String,
  pub bounds: ConstraintBounds,
}

/// One entry of the manifest's per-release history.
#[derive(Debug, Clone, Default)]
pub struct ReleaseEntry {
  pub version_release: String,
  pub version_api: String,
  pub stability_release: String,
  pub stability_api: String,
  pub date: String,
  pub license: String,
  pub license_uri: Option<String>,
  pub notes: String,
}

/// Wrapper around package.xml with an in-memory typed tree.
#[derive(Debug)]
pub struct PackageXmlWrapper {
  path: PathBuf,
  pub name: String,
  pub channel: String,
  pub summary: String,
  pub description: String,
  pub authors: Vec<ManifestAuthor>,
  pub date: String,
  pub time: Option<String>,
  pub version_release: String,
  pub version_api: String,
  pub stability_release: String,
  pub stability_api: String,
  pub license: String,
  pub license_uri: Option<String>,
  pub notes: String,
  /// Set for native-extension packages; suppresses content/dependency sync
  pub provides_extension: Option<String>,
  pub contents: Vec<ContentFile>,
  pub php_bounds: ConstraintBounds,
  pub pearinstaller_min: String,
  pub required_packages: Vec<PackageDependency>,
  pub required_extensions: Vec<ExtensionDependency>,
  pub optional_packages: Vec<PackageDependency>,
  pub optional_extensions: Vec<ExtensionDependency>,
  pub changelog: Vec<ReleaseEntry>,
}

impl PackageXmlWrapper {
  /// Load the manifest, or start from an empty model when the file does
  /// not exist yet (it is created on demand).
  pub fn load(component_dir: &Path) -> CadenceResult<Self> {
    let path = component_dir.join(PACKAGE_XML_FILE);
    if !path.exists() {
      return Ok(Self::empty(path));
    }
    let content = fs::read_to_string(&path)?;
    Self::parse(&content, path)
  }

  fn empty(path: PathBuf) -> Self {
    Self {
      path,
      name: String::new(),
      channel: String::new(),
      summary: String::new(),
      description: String::new(),
      authors: Vec::new(),
      date: String::new(),
      time: None,
      version_release: String::new(),
      version_api: String::new(),
      stability_release: String::new(),
      stability_api: String::new(),
      license: String::new(),
      license_uri: None,
      notes: String::new(),
      provides_extension: None,
      contents: Vec::new(),
      php_bounds: ConstraintBounds::default(),
      pearinstaller_min: PEARINSTALLER_MIN.to_string(),
      required_packages: Vec::new(),
      required_extensions: Vec::new(),
      optional_packages: Vec::new(),
      optional_extensions: Vec::new(),
      changelog: Vec::new(),
    }
  }

  fn parse(content: &str, path: PathBuf) -> CadenceResult<Self> {
    let package = sxd_document::parser::parse(content)
      .map_err(|e| CadenceError::message(format!("XML parse error in {}: {:?}", path.display(), e)))?;
    let doc = package.as_document();
    let root = doc.root();

    let factory = Factory::new();
    let mut context = Context::new();
    context.set_namespace("p", PACKAGE_NS);

    let mut manifest = Self::empty(path);
    manifest.name = eval_string(&factory, &context, root, "/p:package/p:name")?;
    manifest.channel = eval_string(&factory, &context, root, "/p:package/p:channel")?;
    manifest.summary = eval_string(&factory, &context, root, "/p:package/p:summary")?;
    manifest.description = eval_string(&factory, &context, root, "/p:package/p:description")?;
    manifest.date = eval_string(&factory, &context, root, "/p:package/p:date")?;
    let time = eval_string(&factory, &context, root, "/p:package/p:time")?;
    manifest.time = (!time.is_empty()).then_some(time);
    manifest.version_release = eval_string(&factory, &context, root, "/p:package/p:version/p:release")?;
    manifest.version_api = eval_string(&factory, &context, root, "/p:package/p:version/p:api")?;
    manifest.stability_release = eval_string(&factory, &context, root, "/p:package/p:stability/p:release")?;
    manifest.stability_api = eval_string(&factory, &context, root, "/p:package/p:stability/p:api")?;
    manifest.license = eval_string(&factory, &context, root, "/p:package/p:license")?;
    let uri = eval_string(&factory, &context, root, "/p:package/p:license/@uri")?;
    manifest.license_uri = (!uri.is_empty()).then_some(uri);
    manifest.notes = eval_string(&factory, &context, root, "/p:package/p:notes")?;
    let provides = eval_string(&factory, &context, root, "/p:package/p:providesextension")?;
    manifest.provides_extension = (!provides.is_empty()).then_some(provides);

    for role in ["lead", "developer"] {
      for node in eval_nodes(&factory, &context, root, &format!("/p:package/p:{}", role))? {
        let Node::Element(el) = node else { continue };
        manifest.authors.push(ManifestAuthor {
          role: role.to_string(),
          name: child_text(el, "name"),
          user: child_text(el, "user"),
          email: child_text(el, "email"),
          active: child_text(el, "active") == "yes",
        });
      }
    }

    for node in eval_nodes(&factory, &context, root, "/p:package/p:contents//p:file")? {
      let Node::Element(el) = node else { continue };
      manifest.contents.push(ContentFile {
        path: content_file_path(el),
        role: el.attribute_value("role").unwrap_or_default().to_string(),
      });
    }

    manifest.php_bounds = parse_bounds(&factory, &context, root, "/p:package/p:dependencies/p:required/p:php")?;
    let pear_min = eval_string(
      &factory,
      &context,
      root,
      "/p:package/p:dependencies/p:required/p:pearinstaller/p:min",
    )?;
    if !pear_min.is_empty() {
      manifest.pearinstaller_min = pear_min;
    }

    for (group, packages, extensions) in [
      ("required", &mut manifest.required_packages, &mut manifest.required_extensions),
      ("optional", &mut manifest.optional_packages, &mut manifest.optional_extensions),
    ] {
      let base = format!("/p:package/p:dependencies/p:{}", group);
      for node in eval_nodes(&factory, &context, root, &format!("{}/p:package", base))? {
        let Node::Element(el) = node else { continue };
        packages.push(PackageDependency {
          name: child_text(el, "name"),
          channel: child_text(el, "channel"),
          bounds: element_bounds(el),
        });
      }
      for node in eval_nodes(&factory, &context, root, &format!("{}/p:extension", base))? {
        let Node::Element(el) = node else { continue };
        extensions.push(ExtensionDependency {
          name: child_text(el, "name"),
          bounds: element_bounds(el),
        });
      }
    }

    for node in eval_nodes(&factory, &context, root, "/p:package/p:changelog/p:release")? {
      let Node::Element(el) = node else { continue };
      let mut entry = ReleaseEntry {
        version_release: nested_text(el, &["version", "release"]),
        version_api: nested_text(el, &["version", "api"]),
        stability_release: nested_text(el, &["stability", "release"]),
        stability_api: nested_text(el, &["stability", "api"]),
        date: child_text(el, "date"),
        license: child_text(el, "license"),
        license_uri: None,
        notes: child_text(el, "notes"),
      };
      entry.license_uri = child_element(el, "license")
        .and_then(|l| l.attribute_value("uri"))
        .map(str::to_string);
      manifest.changelog.push(entry);
    }

    Ok(manifest)
  }

  /// Replace the contents section wholesale with a freshly computed list.
  pub fn set_contents(&mut self, mut contents: Vec<ContentFile>) {
    contents.sort_by(|a, b| a.path.cmp(&b.path));
    self.contents = contents;
  }

  /// Drop every package and extension dependency entry; the PHP slot and
  /// the installer constraint survive a resync untouched until rewritten.
  pub fn clear_dependencies(&mut self) {
    self.required_packages.clear();
    self.required_extensions.clear();
    self.optional_packages.clear();
    self.optional_extensions.clear();
  }

}

impl Wrapper for PackageXmlWrapper {
  fn kind(&self) -> WrapperKind {
    WrapperKind::PackageXml
  }

  fn path(&self) -> &Path {
    &self.path
  }

  fn render(&self) -> CadenceResult<String> {
    let mut out = String::with_capacity(4096);
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!(
      "<package packagerversion=\"1.9.5\" version=\"2.0\" xmlns=\"{}\">\n",
      PACKAGE_NS
    ));
    push_text_element(&mut out, 1, "name", &self.name);
    push_text_element(&mut out, 1, "channel", &self.channel);
    push_text_element(&mut out, 1, "summary", &self.summary);
    push_text_element(&mut out, 1, "description", &self.description);
    for author in &self.authors {
      let tag = if author.role == "developer" { "developer" } else { "lead" };
      let _ = writeln!(out, " <{}>", tag);
      push_text_element(&mut out, 2, "name", &author.name);
      push_text_element(&mut out, 2, "user", &author.user);
      push_text_element(&mut out, 2, "email", &author.email);
      push_text_element(&mut out, 2, "active", if author.active { "yes" } else { "no" });
      let _ = writeln!(out, " </{}>", tag);
    }
    push_text_element(&mut out, 1, "date", &self.date);
    if let Some(time) = &self.time {
      push_text_element(&mut out, 1, "time", time);
    }
    out.push_str(" <version>\n");
    push_text_element(&mut out, 2, "release", &self.version_release);
    push_text_element(&mut out, 2, "api", &self.version_api);
    out.push_str(" </version>\n <stability>\n");
    push_text_element(&mut out, 2, "release", &self.stability_release);
    push_text_element(&mut out, 2, "api", &self.stability_api);
    out.push_str(" </stability>\n");
    push_license(&mut out, 1, &self.license, self.license_uri.as_deref());
    push_notes(&mut out, 1, &self.notes);

    out.push_str(" <contents>\n  <dir baseinstalldir=\"/\" name=\"/\">\n");
    for file in &self.contents {
      let _ = writeln!(
        out,
        "   <file name=\"{}\" role=\"{}\" />",
        escape_attr(&file.path),
        escape_attr(&file.role)
      );
    }
    out.push_str("  </dir>\n </contents>\n");

    out.push_str(" <dependencies>\n  <required>\n   <php>\n");
    push_bounds(&mut out, 4, &self.php_bounds);
    out.push_str("   </php>\n   <pearinstaller>\n");
    push_text_element(&mut out, 4, "min", &self.pearinstaller_min);
    out.push_str("   </pearinstaller>\n");
    push_dependency_entries(&mut out, 3, &self.required_packages, &self.required_extensions);
    out.push_str("  </required>\n");
    if !self.optional_packages.is_empty() || !self.optional_extensions.is_empty() {
      out.push_str("  <optional>\n");
      push_dependency_entries(&mut out, 3, &self.optional_packages, &self.optional_extensions);
      out.push_str("  </optional>\n");
    }
    out.push_str(" </dependencies>\n");

    if let Some(extension) = &self.provides_extension {
      push_text_element(&mut out, 1, "providesextension", extension);
    }

    if !self.changelog.is_empty() {
      out.push_str(" <changelog>\n");
      for entry in &self.changelog {
        out.push_str("  <release>\n   <version>\n");
        push_text_element(&mut out, 4, "release", &entry.version_release);
        push_text_element(&mut out, 4, "api", &entry.version_api);
        out.push_str("   </version>\n   <stability>\n");
        push_text_element(&mut out, 4, "release", &entry.stability_release);
        push_text_element(&mut out, 4, "api", &entry.stability_api);
        out.push_str("   </stability>\n");
        push_text_element(&mut out, 3, "date", &entry.date);
        push_license(&mut out, 3, &entry.license, entry.license_uri.as_deref());
        push_notes(&mut out, 3, &entry.notes);
        out.push_str("  </release>\n");
      }
      out.push_str(" </changelog>\n");
    }

    out.push_str("</package>\n");
    Ok(out)
  }
}

// --- rendering helpers ---

fn indent(level: usize) -> &'static str {
  const SPACES: &str = "          ";
  &SPACES[..level.min(SPACES.len())]
}

fn push_text_element(out: &mut String, level: usize, tag: &str, text: &str) {
  let _ = writeln!(out, "{}<{}>{}</{}>", indent(level), tag, escape_text(text), tag);
}

fn push_license(out: &mut String, level: usize, license: &str, uri: Option<&str>) {
  match uri {
    Some(uri) => {
      let _ = writeln!(
        out,
        "{}<license uri=\"{}\">{}</license>",
        indent(level),
        escape_attr(uri),
        escape_text(license)
      );
    }
    None => push_text_element(out, level, "license", license),
  }
}

fn push_notes(out: &mut String, level: usize, notes: &str) {
  let _ = writeln!(out, "{}<notes>", indent(level));
  if !notes.is_empty() {
    let _ = writeln!(out, "{}", escape_text(notes));
  }
  let _ = writeln!(out, "{}</notes>", indent(level));
}

fn push_bounds(out: &mut String, level: usize, bounds: &ConstraintBounds) {
  if let Some(min) = &bounds.min {
    push_text_element(out, level, "min", min);
  }
  if let Some(max) = &bounds.max {
    push_text_element(out, level, "max", max);
  }
  for exclude in &bounds.exclude {
    push_text_element(out, level, "exclude", exclude);
  }
}

fn push_dependency_entries(
  out: &mut String,
  level: usize,
  packages: &[PackageDependency],
  extensions: &[ExtensionDependency],
) {
  for package in packages {
    let _ = writeln!(out, "{}<package>", indent(level));
    push_text_element(out, level + 1, "name", &package.name);
    push_text_element(out, level + 1, "channel", &package.channel);
    push_bounds(out, level + 1, &package.bounds);
    let _ = writeln!(out, "{}</package>", indent(level));
  }
  for extension in extensions {
    let _ = writeln!(out, "{}<extension>", indent(level));
    push_text_element(out, level + 1, "name", &extension.name);
    push_bounds(out, level + 1, &extension.bounds);
    let _ = writeln!(out, "{}</extension>", indent(level));
  }
}

fn escape_text(text: &str) -> String {
  text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(text: &str) -> String {
  escape_text(text).replace('"', "&quot;")
}

// --- parsing helpers ---

fn eval_string<'d>(
  factory: &Factory,
  context: &Context<'d>,
  node: impl Into<Node<'d>>,
  expr: &str,
) -> CadenceResult<String> {
  let xpath = factory
    .build(expr)
    .map_err(|e| CadenceError::message(format!("Invalid XPath '{}': {:?}", expr, e)))?
    .ok_or_else(|| CadenceError::message(format!("Empty XPath '{}'", expr)))?;
  let value = xpath
    .evaluate(context, node.into())
    .map_err(|e| CadenceError::message(format!("XPath evaluation failed for '{}': {:?}", expr, e)))?;
  Ok(value.string().trim().to_string())
}

fn eval_nodes<'d>(
  factory: &Factory,
  context: &Context<'d>,
  node: impl Into<Node<'d>>,
  expr: &str,
) -> CadenceResult<Vec<Node<'d>>> {
  let xpath = factory
    .build(expr)
    .map_err(|e| CadenceError::message(format!("Invalid XPath '{}': {:?}", expr, e)))?
    .ok_or_else(|| CadenceError::message(format!("Empty XPath '{}'", expr)))?;
  let value = xpath
    .evaluate(context, node.into())
    .map_err(|e| CadenceError::message(format!("XPath evaluation failed for '{}': {:?}", expr, e)))?;
  match value {
    Value::Nodeset(nodeset) => Ok(nodeset.document_order()),
    _ => Ok(Vec::new()),
  }
}

fn child_element<'d>(parent: Element<'d>, name: &str) -> Option<Element<'d>> {
  parent.children().into_iter().find_map(|child| match child {
    ChildOfElement::Element(el) if el.name().local_part() == name => Some(el),
    _ => None,
  })
}

fn child_text(parent: Element<'_>, name: &str) -> String {
  child_element(parent, name).map(element_text).unwrap_or_default()
}

fn nested_text(parent: Element<'_>, path: &[&str]) -> String {
  let mut current = parent;
  for segment in path {
    match child_element(current, segment) {
      Some(el) => current = el,
      None => return String::new(),
    }
  }
  element_text(current)
}

fn element_text(el: Element<'_>) -> String {
  let mut text = String::new();
  for child in el.children() {
    if let ChildOfElement::Text(t) = child {
      text.push_str(t.text());
    }
  }
  text.trim().to_string()
}

fn element_bounds(el: Element<'_>) -> ConstraintBounds {
  let min = child_text(el, "min");
  let max = child_text(el, "max");
  let exclude = el
    .children()
    .into_iter()
    .filter_map(|child| match child {
      ChildOfElement::Element(e) if e.name().local_part() == "exclude" => Some(element_text(e)),
      _ => None,
    })
    .collect();
  ConstraintBounds {
    min: (!min.is_empty()).then_some(min),
    max: (!max.is_empty()).then_some(max),
    exclude,
  }
}

fn parse_bounds<'d>(
  factory: &Factory,
  context: &Context<'d>,
  node: impl Into<Node<'d>>,
  expr: &str,
) -> CadenceResult<ConstraintBounds> {
  let nodes = eval_nodes(factory, context, node, expr)?;
  match nodes.first() {
    Some(Node::Element(el)) => Ok(element_bounds(*el)),
    _ => Ok(ConstraintBounds::default()),
  }
}

/// Full path of a file entry, composed from the enclosing dir names.
fn content_file_path(file: Element<'_>) -> String {
  let mut segments = vec![file.attribute_value("name").unwrap_or_default().trim_matches('/').to_string()];
  let mut current = file.parent();
  while let Some(ParentOfChild::Element(el)) = current {
    if el.name().local_part() == "dir" {
      let name = el.attribute_value("name").unwrap_or_default().trim_matches('/');
      if !name.is_empty() {
        segments.push(name.to_string());
      }
    }
    current = el.parent();
  }
  segments.reverse();
  segments.retain(|s| !s.is_empty());
  segments.join("/")
}
