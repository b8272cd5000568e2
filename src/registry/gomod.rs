//! Minimal `go.mod` reader: module path, requirements and replacements

use crate::error::{Error, Result};
use regex::Regex;
use std::path::PathBuf;

lazy_static::lazy_static! {
    static ref MODULE_RE: Regex = Regex::new(r#"^module\s+"?([^"\s]+)"?"#).unwrap();
    static ref REQUIRE_LINE_RE: Regex = Regex::new(r#"^require\s+"?([^"\s(]+)"?\s+(\S+)"#).unwrap();
    static ref REPLACE_LINE_RE: Regex = Regex::new(r#"^replace\s+(.+)$"#).unwrap();
    static ref SPEC_RE: Regex = Regex::new(r#"^"?([^"\s]+)"?\s+(\S+)"#).unwrap();
    static ref REPLACE_SPEC_RE: Regex =
        Regex::new(r#"^"?([^"\s]+)"?(?:\s+\S+)?\s*=>\s*"?([^"\s]+)"?(?:\s+(\S+))?"#).unwrap();
}

/// A `require` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Module path
    pub path: String,
    /// Selected version
    pub version: String,
}

/// Target of a `replace` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// Directory relative to the main module root (or absolute)
    Dir(PathBuf),
    /// Another module version
    Module(Requirement),
}

/// A `replace` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    /// Replaced module path
    pub path: String,
    /// Replacement
    pub target: ReplaceTarget,
}

/// Parsed `go.mod`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GoMod {
    /// Main module path
    pub module: String,
    /// Required modules
    pub requires: Vec<Requirement>,
    /// Replace directives
    pub replaces: Vec<Replace>,
}

#[derive(Clone, Copy, PartialEq)]
enum Block {
    None,
    Require,
    Replace,
    Other,
}

impl GoMod {
    /// Parses the contents of a `go.mod` file
    pub fn parse(text: &str) -> Result<GoMod> {
        let mut gomod = GoMod::default();
        let mut block = Block::None;

        for raw in text.lines() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            if block != Block::None {
                if line == ")" {
                    block = Block::None;
                    continue;
                }
                match block {
                    Block::Require => {
                        if let Some(caps) = SPEC_RE.captures(line) {
                            gomod.requires.push(Requirement {
                                path: caps[1].to_string(),
                                version: caps[2].to_string(),
                            });
                        }
                    }
                    Block::Replace => {
                        if let Some(replace) = parse_replace(line) {
                            gomod.replaces.push(replace);
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if let Some(caps) = MODULE_RE.captures(line) {
                gomod.module = caps[1].to_string();
            } else if line.ends_with('(') {
                block = match line.split_whitespace().next() {
                    Some("require") => Block::Require,
                    Some("replace") => Block::Replace,
                    _ => Block::Other,
                };
            } else if let Some(caps) = REQUIRE_LINE_RE.captures(line) {
                gomod.requires.push(Requirement {
                    path: caps[1].to_string(),
                    version: caps[2].to_string(),
                });
            } else if let Some(caps) = REPLACE_LINE_RE.captures(line) {
                if let Some(replace) = parse_replace(&caps[1]) {
                    gomod.replaces.push(replace);
                }
            }
        }

        if gomod.module.is_empty() {
            return Err(Error::Config("go.mod has no module directive".to_string()));
        }
        Ok(gomod)
    }

    /// Requirement whose module path is the longest prefix of `import_path`
    pub fn requirement_for(&self, import_path: &str) -> Option<&Requirement> {
        self.requires
            .iter()
            .filter(|r| path_within(import_path, &r.path))
            .max_by_key(|r| r.path.len())
    }

    /// Replace directive covering `import_path`
    pub fn replace_for(&self, import_path: &str) -> Option<&Replace> {
        self.replaces
            .iter()
            .filter(|r| path_within(import_path, &r.path))
            .max_by_key(|r| r.path.len())
    }
}

/// Whether `import_path` is `module` or a package inside it
pub fn path_within(import_path: &str, module: &str) -> bool {
    import_path == module
        || (import_path.starts_with(module) && import_path[module.len()..].starts_with('/'))
}

/// Module cache escaping: every upper-case letter becomes `!` plus its lower case
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

fn parse_replace(spec: &str) -> Option<Replace> {
    let caps = REPLACE_SPEC_RE.captures(spec.trim())?;
    let path = caps[1].to_string();
    let new = caps[2].to_string();
    let target = if new.starts_with('.') || new.starts_with('/') {
        ReplaceTarget::Dir(PathBuf::from(new))
    } else {
        ReplaceTarget::Module(Requirement {
            path: new,
            version: caps.get(3).map(|m| m.as_str().to_string())?,
        })
    };
    Some(Replace { path, target })
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_MOD: &str = r#"module gotest

go 1.21

require github.com/BurntSushi/toml v1.3.2

require (
	google.golang.org/protobuf v1.31.0
	golang.org/x/text v0.14.0 // indirect
)

replace example.com/local => ../local
replace (
	example.com/fork v1.0.0 => example.com/fork2 v1.2.0
)
"#;

    #[test]
    fn test_parse_gomod() {
        let gomod = GoMod::parse(GO_MOD).unwrap();
        assert_eq!(gomod.module, "gotest");
        assert_eq!(gomod.requires.len(), 3);
        assert_eq!(gomod.requires[0].path, "github.com/BurntSushi/toml");
        assert_eq!(gomod.requires[2].version, "v0.14.0");
        assert_eq!(
            gomod.replaces[0].target,
            ReplaceTarget::Dir(PathBuf::from("../local"))
        );
        assert_eq!(
            gomod.replaces[1].target,
            ReplaceTarget::Module(Requirement {
                path: "example.com/fork2".into(),
                version: "v1.2.0".into()
            })
        );
    }

    #[test]
    fn test_requirement_prefix_match() {
        let gomod = GoMod::parse(GO_MOD).unwrap();
        let req = gomod
            .requirement_for("google.golang.org/protobuf/types/known/timestamppb")
            .unwrap();
        assert_eq!(req.version, "v1.31.0");
        assert!(gomod.requirement_for("google.golang.org/protobufx").is_none());
    }

    #[test]
    fn test_escape_module_path() {
        assert_eq!(
            escape_module_path("github.com/BurntSushi/toml"),
            "github.com/!burnt!sushi/toml"
        );
    }

    #[test]
    fn test_missing_module_directive() {
        assert!(matches!(GoMod::parse("go 1.21\n"), Err(Error::Config(_))));
    }
}
