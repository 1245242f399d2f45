//! Mount-pattern decoding.
//!
//! Frameworks compile each mount path (`"/users/:id"`) into a regex and a
//! parallel list of parameter names, discarding the original string. This
//! module reverses that compilation textually: it rewrites each anonymous
//! capture group in the pattern source back into `:name` form using the
//! recorded names, then extracts the path template. The recognizers here
//! are specific to one pattern-compiler dialect; supporting another
//! framework means swapping this module, nothing else.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use tracing::debug;

use crate::error::ResolveError;

/// Matches one compiled parameter capture group, `(?:([^\/]+?))`.
static PARAM_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\?:\(\[\^\\/\]\+\?\)\)").expect("param group regex should be valid")
});

/// Matches a decodable path-shaped pattern source and captures the
/// template portion (literal segments and rewritten `:name` parameters).
static PATH_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\^\\/(?:(:?[\w\\.\-]*(?:\\/:?[\w\\.\-]*)*)|(\(\?:\(\[\^\\/\]\+\?\)\)))\\")
        .expect("path shape regex should be valid")
});

/// Matches the compiled root mount, `^\/?(?=\/|$)`.
static ROOT_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\^\\/\?\(\?=\\/\|\$\)$").expect("root shape regex should be valid")
});

/// A compiled mount pattern as recorded by the framework: the regex source
/// text, the ordered parameter names, and the literal mount path when the
/// framework kept one around.
#[derive(Debug, Clone)]
pub struct MountPattern {
    source: String,
    param_names: Vec<String>,
    literal_path: Option<String>,
}

impl MountPattern {
    /// Wraps a raw compiled pattern. `literal_path` is the original mount
    /// string when the framework recorded it, which distinguishes a plain
    /// catch-all mount from a truly opaque regex mount.
    pub fn new(
        source: impl Into<String>,
        param_names: Vec<String>,
        literal_path: Option<String>,
    ) -> Self {
        Self {
            source: source.into(),
            param_names,
            literal_path,
        }
    }

    /// Compiles a literal mount path (`"/users/:id"`) the way the target
    /// framework's pattern compiler does, so adapters and tests can build
    /// trees without the framework present.
    pub fn literal(path: &str) -> Self {
        if path == "/" || path.is_empty() {
            return Self::root();
        }
        let mut source = String::from("^");
        let mut param_names = Vec::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            source.push_str("\\/");
            match segment.strip_prefix(':') {
                Some(name) => {
                    source.push_str(r"(?:([^\/]+?))");
                    param_names.push(name.to_string());
                }
                None => {
                    for ch in segment.chars() {
                        if ch == '.' {
                            source.push('\\');
                        }
                        source.push(ch);
                    }
                }
            }
        }
        source.push_str(r"\/?(?=\/|$)");
        Self {
            source,
            param_names,
            literal_path: Some(path.to_string()),
        }
    }

    /// The compiled root mount (`"/"`), which contributes nothing to the
    /// accumulated base path.
    pub fn root() -> Self {
        Self {
            source: String::from(r"^\/?(?=\/|$)"),
            param_names: Vec::new(),
            literal_path: Some(String::from("/")),
        }
    }

    /// Wraps an opaque regex mount with no literal path on record.
    pub fn regex(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            param_names: Vec::new(),
            literal_path: None,
        }
    }

    /// Regex source text of the compiled pattern.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Ordered parameter names recorded alongside the pattern.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}

/// Outcome of decoding a mount pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedPattern {
    /// A path-shaped pattern, decoded back to a `/`-joined template with
    /// `:name` parameter segments.
    Literal { template: String },
    /// A regex mount that cannot be expressed as a path. The marker embeds
    /// the pattern source so the resulting document keys stay unique and
    /// visibly non-routable.
    Opaque { marker: String },
    /// A root or catch-all mount. Contributes nothing to the base path;
    /// resolution descends with the base path unchanged.
    CatchAll,
    /// Path-shaped but the template could not be extracted. The subtree is
    /// skipped.
    Unresolved,
}

/// Decodes a compiled mount pattern.
///
/// ## Errors
///
/// Returns [`ResolveError::StructuralMismatch`] when the pattern source
/// contains more parameter capture groups than recorded parameter names.
/// That means the structural assumptions about the pattern compiler no
/// longer hold, so resolution aborts rather than emit wrong paths.
pub fn decode_pattern(pattern: &MountPattern) -> Result<DecodedPattern, ResolveError> {
    let source = pattern.source();

    if PATH_SHAPE.is_match(source) {
        let decoded = decode_template(source, pattern.param_names())?;
        return Ok(match decoded {
            Some(template) => DecodedPattern::Literal { template },
            None => {
                debug!(pattern = source, "path-shaped pattern did not yield a template");
                DecodedPattern::Unresolved
            }
        });
    }

    if pattern.literal_path.is_none() && !ROOT_SHAPE.is_match(source) {
        return Ok(DecodedPattern::Opaque {
            marker: format!(" RegExp(/{source}/) "),
        });
    }

    Ok(DecodedPattern::CatchAll)
}

/// Rewrites each parameter capture group to `:name` using the recorded
/// names in order, then extracts the template via the path recognizer.
fn decode_template(source: &str, param_names: &[String]) -> Result<Option<String>, ResolveError> {
    let mut rewritten = source.to_string();
    let mut index = 0;
    while PARAM_GROUP.is_match(&rewritten) {
        let name = param_names
            .get(index)
            .ok_or_else(|| ResolveError::StructuralMismatch {
                pattern: source.to_string(),
                param_count: param_names.len(),
            })?;
        let replacement = format!(":{name}");
        rewritten = PARAM_GROUP
            .replace(&rewritten, NoExpand(&replacement))
            .into_owned();
        index += 1;
    }

    Ok(PATH_SHAPE
        .captures(&rewritten)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace("\\/", "/")))
}
