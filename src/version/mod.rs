//! Version and constraint translation
//!
//! Pure functions mapping between release/API versions, stability branches,
//! and the constraint encodings of the generated manifest formats. The XML
//! manifest cannot express ranges directly, so composer-style expressions
//! are lowered to an explicit min/max/exclude triple.

use crate::core::error::{CadenceError, CadenceResult};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::OnceLock;

/// Dependency kinds the XML manifest knows about.
///
/// `php` deliberately has no variant here: the PHP version constraint is
/// written to the dedicated `<php>` slot, never as a generic dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestDependencyType {
  Package,
  Extension,
}

/// Map a descriptor dependency type onto its manifest counterpart.
///
/// Total over the closed set {php, pear, ext}; `php` maps to `None` because
/// it is handled by the dedicated constraint slot. Anything else is a hard
/// error, never silently dropped.
pub fn map_dependency_type(dep_type: &str) -> CadenceResult<Option<ManifestDependencyType>> {
  match dep_type {
    "php" => Ok(None),
    "pear" => Ok(Some(ManifestDependencyType::Package)),
    "ext" => Ok(Some(ManifestDependencyType::Extension)),
    other => Err(CadenceError::UnknownDependencyType {
      dep_type: other.to_string(),
    }),
  }
}

/// Explicit constraint triple for manifest formats without range syntax.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintBounds {
  pub min: Option<String>,
  pub max: Option<String>,
  pub exclude: Vec<String>,
}

impl ConstraintBounds {
  #[allow(dead_code)]
  pub fn is_unbounded(&self) -> bool {
    self.min.is_none() && self.max.is_none() && self.exclude.is_empty()
  }
}

/// Lower a composer-style constraint expression to min/max/exclude bounds.
///
/// Supports `>=`, `>`, `<=`, `<`, `=`, `!=`, `^`, `~`, wildcards and `||`
/// alternatives. Alternatives are merged into the widest covered span since
/// the target format cannot express disjoint ranges. Upper bounds produced
/// by `^`/`~` use the `alpha1` form so pre-releases of the next series are
/// excluded as well.
pub fn constraint_to_bounds(expr: &str) -> CadenceResult<ConstraintBounds> {
  let expr = expr.trim();
  if expr.is_empty() || expr == "*" {
    return Ok(ConstraintBounds::default());
  }

  let mut groups = Vec::new();
  for alternative in expr.split("||") {
    groups.push(parse_alternative(expr, alternative.trim())?);
  }

  if groups.len() == 1 {
    return Ok(groups.pop().unwrap_or_default());
  }

  // Merge alternatives into the widest span. Per-group upper bounds that
  // fall inside the merged span are dropped; only the final max survives
  // as an exclusion.
  let mut merged = ConstraintBounds::default();
  let mut unbounded_min = false;
  let mut unbounded_max = false;
  for group in &groups {
    match &group.min {
      None => unbounded_min = true,
      Some(min) => {
        if merged.min.as_deref().is_none_or(|m| compare(min, m) == Ordering::Less) {
          merged.min = Some(min.clone());
        }
      }
    }
    match &group.max {
      None => unbounded_max = true,
      Some(max) => {
        if merged.max.as_deref().is_none_or(|m| compare(max, m) == Ordering::Greater) {
          merged.max = Some(max.clone());
        }
      }
    }
  }
  if unbounded_min {
    merged.min = None;
  }
  if unbounded_max {
    merged.max = None;
  }
  if let Some(max) = &merged.max
    && groups.iter().any(|g| g.exclude.iter().any(|e| e == max))
  {
    merged.exclude.push(max.clone());
  }
  Ok(merged)
}

/// Parse one `||`-free alternative into bounds.
fn parse_alternative(full: &str, alternative: &str) -> CadenceResult<ConstraintBounds> {
  if alternative.is_empty() {
    return Err(malformed(full, "empty alternative"));
  }

  // Bare versions mean an exact match in composer; semver would default
  // them to caret, so force the exact operator.
  let mut comparators = Vec::new();
  for token in alternative.split([',', ' ']).filter(|t| !t.is_empty()) {
    let token = if token.starts_with(|c: char| c.is_ascii_digit()) && !token.contains('*') {
      format!("={}", token)
    } else {
      token.to_string()
    };
    comparators.push(token);
  }

  let req = semver::VersionReq::parse(&comparators.join(","))
    .map_err(|e| malformed(full, &e.to_string()))?;

  let mut bounds = ConstraintBounds::default();
  for cmp in &req.comparators {
    apply_comparator(&mut bounds, cmp, full)?;
  }
  Ok(bounds)
}

fn apply_comparator(bounds: &mut ConstraintBounds, cmp: &semver::Comparator, full: &str) -> CadenceResult<()> {
  let version = comparator_version(cmp);
  match cmp.op {
    semver::Op::GreaterEq => bounds.min = Some(version),
    semver::Op::Greater => {
      bounds.exclude.push(version.clone());
      bounds.min = Some(version);
    }
    semver::Op::LessEq => bounds.max = Some(version),
    semver::Op::Less => {
      bounds.exclude.push(version.clone());
      bounds.max = Some(version);
    }
    semver::Op::Exact => {
      bounds.min = Some(version.clone());
      bounds.max = Some(version);
    }
    semver::Op::Caret => {
      let upper = if cmp.major > 0 {
        format!("{}.0.0alpha1", cmp.major + 1)
      } else {
        format!("0.{}.0alpha1", cmp.minor.unwrap_or(0) + 1)
      };
      bounds.min = Some(version);
      bounds.exclude.push(upper.clone());
      bounds.max = Some(upper);
    }
    semver::Op::Tilde => {
      // ~1.2.3 allows patch-level changes, ~1.2 minor-level ones
      let upper = if cmp.patch.is_some() {
        format!("{}.{}.0alpha1", cmp.major, cmp.minor.unwrap_or(0) + 1)
      } else {
        format!("{}.0.0alpha1", cmp.major + 1)
      };
      bounds.min = Some(version);
      bounds.exclude.push(upper.clone());
      bounds.max = Some(upper);
    }
    semver::Op::Wildcard => {
      let upper = match cmp.minor {
        Some(minor) => format!("{}.{}.0alpha1", cmp.major, minor + 1),
        None => format!("{}.0.0alpha1", cmp.major + 1),
      };
      bounds.min = Some(version);
      bounds.exclude.push(upper.clone());
      bounds.max = Some(upper);
    }
    _ => return Err(malformed(full, "unsupported operator")),
  }
  Ok(())
}

fn comparator_version(cmp: &semver::Comparator) -> String {
  let mut version = format!("{}.{}.{}", cmp.major, cmp.minor.unwrap_or(0), cmp.patch.unwrap_or(0));
  if !cmp.pre.is_empty() {
    version.push_str(cmp.pre.as_str());
  }
  version
}

fn malformed(constraint: &str, reason: &str) -> CadenceError {
  CadenceError::MalformedConstraint {
    constraint: constraint.to_string(),
    reason: reason.to_string(),
  }
}

/// Validate a dotted version string as used by descriptors and manifests.
pub fn validate(version: &str) -> CadenceResult<()> {
  static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
  let re = PATTERN.get_or_init(|| {
    regex::Regex::new(r"(?i)^\d+(\.\d+){0,3}(?:[.-]?(?:dev|alpha|beta|rc|pl|git)\d*)?$").expect("static pattern")
  });
  if re.is_match(version) {
    Ok(())
  } else {
    Err(CadenceError::message(format!("Invalid version string: '{}'", version)))
  }
}

/// Produce the literal written into a source sentinel.
///
/// The base is the version with trailing `.0` components dropped down to
/// two; a branch suffix wins over any pre-release suffix of the version.
/// `5.0.0-git` becomes `5.0-git`.
pub fn sentinel_literal(version: &str, branch: Option<&str>) -> String {
  let numeric_len = version
    .find(|c: char| !c.is_ascii_digit() && c != '.')
    .unwrap_or(version.len());
  let (numeric, rest) = version.split_at(numeric_len);

  let mut parts: Vec<&str> = numeric.split('.').filter(|p| !p.is_empty()).collect();
  while parts.len() > 2 && parts.last() == Some(&"0") {
    parts.pop();
  }
  let base = parts.join(".");

  if let Some(branch) = branch.filter(|b| !b.is_empty()) {
    return format!("{}-{}", base, branch);
  }

  let suffix = rest.trim_start_matches(['.', '-', '_']);
  if suffix.is_empty() {
    base
  } else {
    format!("{}-{}", base, suffix)
  }
}

/// Development-snapshot version: numeric prefix plus a minute-granular,
/// sortable timestamp suffix.
pub fn snapshot_version(version: &str, now: &DateTime<Utc>) -> String {
  let numeric_len = version
    .find(|c: char| !c.is_ascii_digit() && c != '.')
    .unwrap_or(version.len());
  format!("{}dev{}", &version[..numeric_len], now.format("%Y%m%d%H%M"))
}

/// Compare two dotted version strings.
///
/// Pre-release suffixes rank dev < alpha < beta < rc < (stable) < pl, and
/// trailing `.0` components do not affect the ordering.
pub fn compare(a: &str, b: &str) -> Ordering {
  let left = tokenize(a);
  let right = tokenize(b);
  let mut i = 0;
  loop {
    match (left.get(i), right.get(i)) {
      (Some(l), Some(r)) => {
        let ord = l.cmp(r);
        if ord != Ordering::Equal {
          return ord;
        }
      }
      (Some(_), None) => return trailing_ordering(&left[i..]),
      (None, Some(_)) => return trailing_ordering(&right[i..]).reverse(),
      (None, None) => return Ordering::Equal,
    }
    i += 1;
  }
}

/// Ordering of a version with trailing tokens against its shorter prefix.
fn trailing_ordering(rest: &[(u8, u64)]) -> Ordering {
  for &(rank, value) in rest {
    match rank.cmp(&STABLE_RANK) {
      Ordering::Less => return Ordering::Less,
      Ordering::Greater => return Ordering::Greater,
      Ordering::Equal if value > 0 => return Ordering::Greater,
      Ordering::Equal => {}
    }
  }
  Ordering::Equal
}

const STABLE_RANK: u8 = 4;

/// Token stream of (rank, value) pairs; numeric segments carry the stable
/// rank so `1.2` beats `1.2rc1` but loses to `1.2pl1`.
fn tokenize(version: &str) -> Vec<(u8, u64)> {
  let mut tokens = Vec::new();
  let bytes = version.as_bytes();
  let mut i = 0;
  while i < bytes.len() {
    let c = bytes[i] as char;
    if c.is_ascii_digit() {
      let start = i;
      while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
        i += 1;
      }
      let value: u64 = version[start..i].parse().unwrap_or(u64::MAX);
      tokens.push((STABLE_RANK, value));
    } else if c.is_ascii_alphabetic() {
      let start = i;
      while i < bytes.len() && (bytes[i] as char).is_ascii_alphabetic() {
        i += 1;
      }
      tokens.push((suffix_rank(&version[start..i]), 0));
    } else {
      i += 1;
    }
  }
  tokens
}

fn suffix_rank(suffix: &str) -> u8 {
  match suffix.to_ascii_lowercase().as_str() {
    "dev" | "git" => 0,
    "a" | "alpha" => 1,
    "b" | "beta" => 2,
    "rc" => 3,
    "pl" | "p" => 5,
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_dependency_mapping_is_total() {
    assert_eq!(map_dependency_type("pear").unwrap(), Some(ManifestDependencyType::Package));
    assert_eq!(map_dependency_type("ext").unwrap(), Some(ManifestDependencyType::Extension));
    assert_eq!(map_dependency_type("php").unwrap(), None);

    let err = map_dependency_type("bogus").unwrap_err();
    assert!(matches!(err, CadenceError::UnknownDependencyType { dep_type } if dep_type == "bogus"));
  }

  #[test]
  fn test_constraint_range() {
    let bounds = constraint_to_bounds(">=1.2,<2.0").unwrap();
    assert_eq!(bounds.min.as_deref(), Some("1.2.0"));
    assert_eq!(bounds.max.as_deref(), Some("2.0.0"));
    assert_eq!(bounds.exclude, vec!["2.0.0".to_string()]);
  }

  #[test]
  fn test_constraint_caret() {
    let bounds = constraint_to_bounds("^2.1").unwrap();
    assert_eq!(bounds.min.as_deref(), Some("2.1.0"));
    assert_eq!(bounds.max.as_deref(), Some("3.0.0alpha1"));
    assert_eq!(bounds.exclude, vec!["3.0.0alpha1".to_string()]);
  }

  #[test]
  fn test_constraint_alternatives_merge_to_widest_span() {
    let bounds = constraint_to_bounds("^5.3 || ^7").unwrap();
    assert_eq!(bounds.min.as_deref(), Some("5.3.0"));
    assert_eq!(bounds.max.as_deref(), Some("8.0.0alpha1"));
    assert_eq!(bounds.exclude, vec!["8.0.0alpha1".to_string()]);
  }

  #[test]
  fn test_constraint_star_is_unbounded() {
    assert!(constraint_to_bounds("*").unwrap().is_unbounded());
  }

  #[test]
  fn test_constraint_exact() {
    let bounds = constraint_to_bounds("1.4.2").unwrap();
    assert_eq!(bounds.min.as_deref(), Some("1.4.2"));
    assert_eq!(bounds.max.as_deref(), Some("1.4.2"));
    assert!(bounds.exclude.is_empty());
  }

  #[test]
  fn test_malformed_constraint() {
    let err = constraint_to_bounds(">=not.a.version").unwrap_err();
    assert!(matches!(err, CadenceError::MalformedConstraint { .. }));
  }

  #[test]
  fn test_compare_orders_versions() {
    assert_eq!(compare("2.0.0", "1.5.0"), Ordering::Greater);
    assert_eq!(compare("1.0.0", "1.5.0"), Ordering::Less);
    assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
  }

  #[test]
  fn test_compare_prerelease_ranks() {
    assert_eq!(compare("1.0.0alpha1", "1.0.0beta1"), Ordering::Less);
    assert_eq!(compare("1.0.0rc1", "1.0.0"), Ordering::Less);
    assert_eq!(compare("1.0.0", "1.0.0pl1"), Ordering::Less);
    assert_eq!(compare("2.0.0-git", "2.0.0"), Ordering::Less);
  }

  #[test]
  fn test_validate_versions() {
    assert!(validate("1.2.3").is_ok());
    assert!(validate("4.0.1rc1").is_ok());
    assert!(validate("5.0.0-git").is_ok());
    assert!(validate("not a version").is_err());
    assert!(validate("1..2").is_err());
  }

  #[test]
  fn test_sentinel_literal() {
    assert_eq!(sentinel_literal("5.0.0-git", None), "5.0-git");
    assert_eq!(sentinel_literal("5.2.1", None), "5.2.1");
    assert_eq!(sentinel_literal("4.0.0", None), "4.0");
    assert_eq!(sentinel_literal("6.0.0", Some("master")), "6.0-master");
  }

  #[test]
  fn test_snapshot_version() {
    let now = Utc.with_ymd_and_hms(2026, 8, 6, 15, 4, 0).unwrap();
    assert_eq!(snapshot_version("5.0.0", &now), "5.0.0dev202608061504");
    assert_eq!(snapshot_version("5.0.0-git", &now), "5.0.0dev202608061504");
  }
}
