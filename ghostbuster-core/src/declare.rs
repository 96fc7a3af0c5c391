//! Class and define declarations, extracted line by line from manifests.
//!
//! This is pattern matching, not parsing. Only the first `class` (or
//! `define`) line of a manifest is considered, so a file declaring several
//! contributes one symbol. Commented-out declarations at column 0 do not
//! match because the line must start with the keyword.

use regex::Regex;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{GhostbusterResult, IoResultExt};

/// Namespace separator in Puppet names.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Kind of declaration a manifest can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Class,
    Define,
}

impl DeclKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Define => "define",
        }
    }

    fn pattern(self) -> &'static Regex {
        static CLASS: OnceLock<Regex> = OnceLock::new();
        static DEFINE: OnceLock<Regex> = OnceLock::new();
        let (cell, src) = match self {
            Self::Class => (&CLASS, r"^class\s+([^\s({]+)"),
            Self::Define => (&DEFINE, r"^define\s+([^\s({]+)"),
        };
        cell.get_or_init(|| Regex::new(src).expect("Hardcoded regex pattern is valid"))
    }
}

/// A declared class or define, with its normalized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSymbol {
    pub kind: DeclKind,
    /// Segment-capitalized name, e.g. `Apache::Mod::Ssl`
    pub name: String,
    pub file: PathBuf,
}

/// Capitalizes a segment: first character upper-case, the rest lower-case.
fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Normalizes a Puppet name the way PuppetDB titles classes.
///
/// `apache::mod::ssl` becomes `Apache::Mod::Ssl`. Idempotent.
pub fn normalize_name(raw: &str) -> String {
    raw.split(NAMESPACE_SEPARATOR)
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(NAMESPACE_SEPARATOR)
}

/// Raw name from the first declaration line of the given kind.
pub fn first_declaration<'a>(kind: DeclKind, content: &'a str) -> Option<&'a str> {
    let re = kind.pattern();
    content
        .lines()
        .find_map(|line| re.captures(line).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

/// Reads a manifest and returns its first declaration of `kind`, if any.
pub fn scan_manifest(kind: DeclKind, path: &Path) -> GhostbusterResult<Option<DeclaredSymbol>> {
    let content = fs::read_to_string(path).with_path(path)?;
    Ok(first_declaration(kind, &content).map(|raw| DeclaredSymbol {
        kind,
        name: normalize_name(raw),
        file: path.to_path_buf(),
    }))
}

/// Splits a path at the last `marker` directory: `(module, rest)`.
///
/// `None` when any component is not valid UTF-8.
fn split_at_marker(path: &Path, marker: &str) -> Option<(String, String)> {
    let parts = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_str()),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;

    // marker needs a module before it and at least one component after it
    let idx = parts
        .iter()
        .enumerate()
        .rev()
        .find(|(i, p)| **p == marker && *i > 0 && *i + 1 < parts.len())
        .map(|(i, _)| i)?;

    Some((parts[idx - 1].to_string(), parts[idx + 1..].join("/")))
}

/// Module owning a manifest: `<module>` in `.../<module>/manifests/<rest>`.
pub fn module_of_manifest(path: &Path) -> Option<String> {
    split_at_marker(path, "manifests").map(|(module, _)| module)
}

/// Module and template name from `.../<module>/templates/<rest>`.
pub fn template_parts(path: &Path) -> Option<(String, String)> {
    split_at_marker(path, "templates")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("foo::bar"), "Foo::Bar");
        assert_eq!(normalize_name("apache"), "Apache");
        assert_eq!(normalize_name("apache::mod::ssl"), "Apache::Mod::Ssl");
    }

    #[test]
    fn test_normalize_lowercases_tail() {
        assert_eq!(normalize_name("FOO::BaR"), "Foo::Bar");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["foo::bar", "Foo::Bar", "a::b_c::d", "::top", "x"] {
            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "not idempotent for {raw}");
        }
    }

    #[test]
    fn test_first_class_declaration() {
        let src = "# class commented\nclass foo::bar (\n  $x = 1,\n) {\n}\n";
        assert_eq!(first_declaration(DeclKind::Class, src), Some("foo::bar"));
    }

    #[test]
    fn test_name_terminators() {
        assert_eq!(first_declaration(DeclKind::Class, "class a{}"), Some("a"));
        assert_eq!(first_declaration(DeclKind::Class, "class a(){}"), Some("a"));
        assert_eq!(first_declaration(DeclKind::Class, "class\ta::b {"), Some("a::b"));
    }

    #[test]
    fn test_only_first_declaration_counts() {
        let src = "class one {}\nclass two {}\n";
        assert_eq!(first_declaration(DeclKind::Class, src), Some("one"));
    }

    #[test]
    fn test_indented_declaration_ignored() {
        assert_eq!(first_declaration(DeclKind::Class, "  class nested {}"), None);
    }

    #[test]
    fn test_define_declaration() {
        let src = "define apache::vhost (\n  $port,\n) {\n}\n";
        assert_eq!(first_declaration(DeclKind::Define, src), Some("apache::vhost"));
        assert_eq!(first_declaration(DeclKind::Class, src), None);
    }

    #[test]
    fn test_module_of_manifest() {
        assert_eq!(
            module_of_manifest(Path::new("/m/apache/manifests/mod/ssl.pp")),
            Some("apache".to_string())
        );
        assert_eq!(module_of_manifest(Path::new("/m/apache/init.pp")), None);
    }

    #[test]
    fn test_template_parts() {
        assert_eq!(
            template_parts(Path::new("/m/apache/templates/mods/ssl.conf.erb")),
            Some(("apache".to_string(), "mods/ssl.conf.erb".to_string()))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_component_yields_none() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new("/m")
            .join(OsStr::from_bytes(b"bad\xff"))
            .join("templates/x.erb");
        assert_eq!(template_parts(&path), None);

        let manifest = Path::new("/m")
            .join(OsStr::from_bytes(b"bad\xff"))
            .join("manifests/init.pp");
        assert_eq!(module_of_manifest(&manifest), None);
    }

    #[test]
    fn test_template_parts_last_marker_wins() {
        assert_eq!(
            template_parts(Path::new("/m/templates/site/templates/motd.erb")),
            Some(("site".to_string(), "motd.erb".to_string()))
        );
    }
}
