//! Role-based route policy.
//!
//! Rules come from a Casbin-style CSV, one per line:
//!
//! ```text
//! # role, path pattern, method
//! p, admin, /sales/*, *
//! p, seller, /sales/:id, GET
//! ```
//!
//! A request is allowed only if some rule for its role matches both the path
//! and the method. There is no role hierarchy and no implicit allow.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid policy rule on line {line}: {reason}")]
    InvalidRule { line: usize, reason: String },
    #[error("policy file {0} contains no rules")]
    Empty(String),
}

/// Decides whether a role may call `method` on `path`.
#[async_trait]
pub trait PolicyEngine: Send + Sync {
    async fn authorize(&self, role: &str, path: &str, method: &str) -> Result<bool, PolicyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `:name`, exactly one non-empty segment
    Param,
    /// trailing `*`, one or more remaining segments
    Rest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathPattern {
    segments: Vec<Segment>,
}

impl PathPattern {
    fn parse(raw: &str) -> Result<Self, String> {
        if !raw.starts_with('/') {
            return Err(format!("path '{}' must start with '/'", raw));
        }

        let parts = split_path(raw);
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = match *part {
                "*" if i + 1 == parts.len() => Segment::Rest,
                "*" => return Err(format!("'*' is only allowed at the end of '{}'", raw)),
                p if p.starts_with(':') && p.len() > 1 => Segment::Param,
                "" => return Err(format!("empty segment in '{}'", raw)),
                p => Segment::Literal(p.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self { segments })
    }

    fn matches(&self, path: &str) -> bool {
        let parts = split_path(path);
        let mut i = 0;

        for segment in &self.segments {
            match segment {
                Segment::Rest => {
                    let rest = &parts[i.min(parts.len())..];
                    return !rest.is_empty() && rest.iter().any(|p| !p.is_empty());
                }
                Segment::Param => match parts.get(i) {
                    Some(part) if !part.is_empty() => {}
                    _ => return false,
                },
                Segment::Literal(literal) => match parts.get(i) {
                    Some(part) if part == literal => {}
                    _ => return false,
                },
            }
            i += 1;
        }

        i == parts.len()
    }
}

/// Segments of a path without the leading slash. A single trailing slash is
/// ignored, so `/sales/` and `/sales` are the same path. `/` has no segments.
fn split_path(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MethodMatch {
    Any,
    Exact(String),
}

impl MethodMatch {
    fn parse(raw: &str) -> Self {
        if raw == "*" {
            MethodMatch::Any
        } else {
            MethodMatch::Exact(raw.to_ascii_uppercase())
        }
    }

    fn matches(&self, method: &str) -> bool {
        match self {
            MethodMatch::Any => true,
            MethodMatch::Exact(expected) => expected.eq_ignore_ascii_case(method),
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    role: String,
    path: PathPattern,
    method: MethodMatch,
}

/// Immutable in-memory rule set, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Load rules from a CSV file. An unreadable or empty file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path_str.clone(),
            source,
        })?;

        let table = Self::from_csv(&content)?;
        if table.is_empty() {
            return Err(PolicyError::Empty(path_str));
        }

        tracing::info!(path = %path_str, rules = table.len(), "Policy rules loaded");
        Ok(table)
    }

    /// Parse rules from CSV text. Blank lines and `#` comments are skipped.
    pub fn from_csv(content: &str) -> Result<Self, PolicyError> {
        let mut rules = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
            let invalid = |reason: String| PolicyError::InvalidRule { line, reason };

            match fields.first() {
                Some(&"p") => {}
                Some(other) => {
                    return Err(invalid(format!("unsupported rule type '{}'", other)));
                }
                None => return Err(invalid("empty rule".to_string())),
            }

            if fields.len() != 4 {
                return Err(invalid(format!(
                    "expected 'p, role, path, method', found {} fields",
                    fields.len()
                )));
            }

            let (role, path, method) = (fields[1], fields[2], fields[3]);
            if role.is_empty() || method.is_empty() {
                return Err(invalid("role and method must not be empty".to_string()));
            }

            rules.push(Rule {
                role: role.to_string(),
                path: PathPattern::parse(path).map_err(invalid)?,
                method: MethodMatch::parse(method),
            });
        }

        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Synchronous decision. Deny unless a rule matches.
    pub fn allows(&self, role: &str, path: &str, method: &str) -> bool {
        self.rules.iter().any(|rule| {
            rule.role == role && rule.method.matches(method) && rule.path.matches(path)
        })
    }
}

#[async_trait]
impl PolicyEngine for RuleTable {
    async fn authorize(&self, role: &str, path: &str, method: &str) -> Result<bool, PolicyError> {
        Ok(self.allows(role, path, method))
    }
}
