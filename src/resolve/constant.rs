//! Go constant lookups
//!
//! [`GoSourceReader`] parses a package's source files with tree-sitter and
//! evaluates its package-scoped `const` declarations. String literals,
//! references to other constants of the same package and `+` concatenation
//! of strings are folded; anything else is reported as unsupported.

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

use super::{ResolutionError, anchor};

/// Reads the value of a package-level constant
pub trait ConstantReader {
    fn read(&mut self, package: &str, constant: &str) -> Result<String, ResolutionError>;
}

/// Right-hand side of a constant declaration
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    /// Decoded string literal
    Text(String),
    /// Numeric, rune or boolean literal, kept as written
    Literal(String),
    /// Another constant of the same package
    Ref(String),
    Concat(Box<Expr>, Box<Expr>),
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ConstDef {
    expr: Expr,
    /// Source text of the expression, for error reporting
    source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Text(String),
    Literal(String),
}

impl Value {
    fn into_string(self) -> String {
        match self {
            Value::Text(s) | Value::Literal(s) => s,
        }
    }
}

/// Constants declared at package scope across one package's files
#[derive(Debug, Default)]
struct Package {
    constants: HashMap<String, ConstDef>,
}

impl Package {
    /// Value of `name`, or the expression that could not be evaluated
    fn value(&self, name: &str) -> Option<Result<String, String>> {
        let def = self.constants.get(name)?;
        let mut visiting = vec![name.to_string()];

        Some(
            self.evaluate(&def.expr, &mut visiting)
                .map(Value::into_string)
                .ok_or_else(|| def.source.clone()),
        )
    }

    fn evaluate(&self, expr: &Expr, visiting: &mut Vec<String>) -> Option<Value> {
        match expr {
            Expr::Text(s) => Some(Value::Text(s.clone())),
            Expr::Literal(s) => Some(Value::Literal(s.clone())),
            Expr::Ref(name) => {
                if visiting.contains(name) {
                    return None;
                }
                let Some(def) = self.constants.get(name) else {
                    // predeclared identifiers unless shadowed
                    return matches!(name.as_str(), "true" | "false")
                        .then(|| Value::Literal(name.clone()));
                };

                visiting.push(name.clone());
                let value = self.evaluate(&def.expr, visiting);
                visiting.pop();
                value
            }
            Expr::Concat(left, right) => {
                match (self.evaluate(left, visiting)?, self.evaluate(right, visiting)?) {
                    (Value::Text(l), Value::Text(r)) => Some(Value::Text(l + &r)),
                    _ => None,
                }
            }
            Expr::Unsupported => None,
        }
    }
}

/// Reads constants from Go sources below a repository root
///
/// Packages are parsed once per reader and kept for the rest of the run.
pub struct GoSourceReader {
    root: PathBuf,
    module: Option<Option<String>>,
    packages: HashMap<PathBuf, Package>,
}

impl GoSourceReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            module: None,
            packages: HashMap::new(),
        }
    }

    /// Module path declared in `<root>/go.mod`, if any
    fn module_path(&mut self) -> Option<String> {
        if self.module.is_none() {
            let go_mod = self.root.join("go.mod");
            let module = fs::read_to_string(&go_mod)
                .ok()
                .and_then(|contents| parse_module_directive(&contents));

            tracing::debug!(module = ?module, "read {}", go_mod.display());
            self.module = Some(module);
        }

        self.module.clone().flatten()
    }

    /// Directory holding the sources of `package`
    fn package_dir(&mut self, package: &str) -> Result<PathBuf, ResolutionError> {
        if package.starts_with("./") || package.starts_with("../") || Path::new(package).is_absolute()
        {
            return Ok(anchor(&self.root, package));
        }

        if let Some(module) = self.module_path() {
            if package == module {
                return Ok(self.root.clone());
            }
            if let Some(rest) = package
                .strip_prefix(module.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
            {
                return Ok(self.root.join(rest));
            }
        }

        let vendored = self.root.join("vendor").join(package);
        if vendored.is_dir() {
            return Ok(vendored);
        }

        let local = self.root.join(package);
        if local.is_dir() {
            return Ok(local);
        }

        Err(ResolutionError::Package {
            package: package.to_string(),
            reason: "not part of the main module and not vendored".to_string(),
        })
    }

    fn load_package(dir: &Path) -> Result<Package, ResolutionError> {
        let entries = fs::read_dir(dir).map_err(|source| ResolutionError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_go_source(path))
            .collect();
        files.sort();

        let mut parser = go_parser().map_err(|reason| ResolutionError::Parse {
            path: dir.to_path_buf(),
            reason,
        })?;

        let mut package = Package::default();
        for file in &files {
            let source = fs::read_to_string(file).map_err(|source| ResolutionError::Io {
                path: file.clone(),
                source,
            })?;

            let constants = scan_constants(&mut parser, &source).ok_or_else(|| ResolutionError::Parse {
                path: file.clone(),
                reason: "parser produced no syntax tree".to_string(),
            })?;

            for (name, def) in constants {
                package.constants.entry(name).or_insert(def);
            }
        }

        tracing::debug!(
            files = files.len(),
            constants = package.constants.len(),
            "parsed Go package {}",
            dir.display()
        );

        Ok(package)
    }
}

impl ConstantReader for GoSourceReader {
    fn read(&mut self, package: &str, constant: &str) -> Result<String, ResolutionError> {
        let dir = self.package_dir(package)?;

        if !self.packages.contains_key(&dir) {
            let loaded = Self::load_package(&dir)?;
            self.packages.insert(dir.clone(), loaded);
        }

        match self.packages.get(&dir).and_then(|p| p.value(constant)) {
            Some(Ok(value)) => Ok(value),
            Some(Err(expression)) => Err(ResolutionError::UnsupportedConstant {
                package: package.to_string(),
                constant: constant.to_string(),
                expression,
            }),
            None => Err(ResolutionError::NotFound {
                what: format!("constant {}", constant),
                location: package.to_string(),
            }),
        }
    }
}

fn parse_module_directive(go_mod: &str) -> Option<String> {
    let re = Regex::new(r#"(?m)^\s*module\s+"?([^"\s]+)"?"#).ok()?;
    re.captures(go_mod).map(|caps| caps[1].to_string())
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go") && path.is_file()
}

fn go_parser() -> Result<Parser, String> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| format!("failed to load the Go grammar: {}", e))?;
    Ok(parser)
}

fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Package-scoped constants declared in one source file, in order
///
/// Function bodies are not visited, so local constants are never reported.
fn scan_constants(parser: &mut Parser, source: &str) -> Option<Vec<(String, ConstDef)>> {
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    let mut constants = Vec::new();

    let mut cursor = root.walk();
    for declaration in root
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "const_declaration")
    {
        // a spec without values repeats the previous expression list
        let mut previous: Vec<ConstDef> = Vec::new();

        let mut specs = declaration.walk();
        for spec in declaration
            .named_children(&mut specs)
            .filter(|n| n.kind() == "const_spec")
        {
            if let Some(list) = spec.child_by_field_name("value") {
                let mut items = list.walk();
                previous = list
                    .named_children(&mut items)
                    .filter(|n| n.kind() != "comment")
                    .map(|expr| ConstDef {
                        expr: if spec.has_error() {
                            Expr::Unsupported
                        } else {
                            expression(expr, source)
                        },
                        source: node_text(expr, source).to_string(),
                    })
                    .collect();
            }

            let mut names = spec.walk();
            for (k, name) in spec
                .children_by_field_name("name", &mut names)
                .filter(|n| n.is_named())
                .enumerate()
            {
                let name = node_text(name, source);
                if name == "_" {
                    continue;
                }
                let def = previous.get(k).cloned().unwrap_or_else(|| ConstDef {
                    expr: Expr::Unsupported,
                    source: node_text(spec, source).to_string(),
                });
                constants.push((name.to_string(), def));
            }
        }
    }

    Some(constants)
}

fn expression(node: Node<'_>, source: &str) -> Expr {
    let text = node_text(node, source);

    match node.kind() {
        "interpreted_string_literal" => unquote(text).map_or(Expr::Unsupported, Expr::Text),
        "raw_string_literal" => Expr::Text(raw_string(text)),
        "int_literal" | "float_literal" | "imaginary_literal" | "rune_literal" | "true" | "false" => {
            Expr::Literal(text.to_string())
        }
        "identifier" => Expr::Ref(text.to_string()),
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let inner = node
                .named_children(&mut cursor)
                .find(|n| n.kind() != "comment");
            inner.map_or(Expr::Unsupported, |inner| expression(inner, source))
        }
        "binary_expression" => {
            let left = node.child_by_field_name("left");
            let operator = node.child_by_field_name("operator");
            let right = node.child_by_field_name("right");

            match (left, operator, right) {
                (Some(left), Some(op), Some(right)) if op.kind() == "+" => Expr::Concat(
                    Box::new(expression(left, source)),
                    Box::new(expression(right, source)),
                ),
                _ => Expr::Unsupported,
            }
        }
        _ => Expr::Unsupported,
    }
}

fn raw_string(literal: &str) -> String {
    let inner = literal.strip_prefix('`').unwrap_or(literal);
    let inner = inner.strip_suffix('`').unwrap_or(inner);
    // carriage returns are discarded from raw string literals
    inner.replace('\r', "")
}

/// Decode an interpreted Go string literal
fn unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    let mut buf = [0u8; 4];

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        match chars.next()? {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' => out.push(b'\\'),
            '"' => out.push(b'"'),
            'x' => {
                let hex: String = (0..2).map(|_| chars.next()).collect::<Option<_>>()?;
                out.push(u8::from_str_radix(&hex, 16).ok()?);
            }
            escape @ ('u' | 'U') => {
                let digits = if escape == 'u' { 4 } else { 8 };
                let hex: String = (0..digits).map(|_| chars.next()).collect::<Option<_>>()?;
                let ch = char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?;
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            first @ '0'..='7' => {
                let mut octal = String::from(first);
                for _ in 0..2 {
                    octal.push(chars.next()?);
                }
                out.push(u8::from_str_radix(&octal, 8).ok()?);
            }
            _ => return None,
        }
    }

    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCES: &str = r#"// Package resources holds shared constants.
package resources

import "fmt"

const EtcdImageTag = "v3.5.17"

const (
	// DefaultVersion is used for new clusters
	DefaultVersion string = "v1.32.4"
	escaped                = "line\n\ttab \"quoted\" \x41\u00e9\101"
	raw                    = `C:\path\n`
	Replicas               = 3
	Enabled                = true
	Computed               = "v" + "1"
	_                      = "ignored"
	First, Second          = "a", "b"
)

const (
	ModeA = iota
	ModeB
)

func helper() string {
	const Local = "not package scoped"
	return fmt.Sprintf("%s", Local)
}

var notAConstant = struct{ Name string }{Name: "x"}
"#;

    fn package(sources: &[&str]) -> Package {
        let mut parser = go_parser().unwrap();
        let mut package = Package::default();
        for source in sources {
            for (name, def) in scan_constants(&mut parser, source).unwrap() {
                package.constants.entry(name).or_insert(def);
            }
        }
        package
    }

    fn value(src: &str, name: &str) -> Option<Result<String, String>> {
        package(&[src]).value(name)
    }

    fn literal(value: &str) -> Option<Result<String, String>> {
        Some(Ok(value.to_string()))
    }

    #[test]
    fn test_single_declaration() {
        assert_eq!(value(RESOURCES, "EtcdImageTag"), literal("v3.5.17"));
    }

    #[test]
    fn test_grouped_declarations() {
        assert_eq!(value(RESOURCES, "DefaultVersion"), literal("v1.32.4"));
        assert_eq!(value(RESOURCES, "Replicas"), literal("3"));
        assert_eq!(value(RESOURCES, "Enabled"), literal("true"));
        assert_eq!(value(RESOURCES, "First"), literal("a"));
        assert_eq!(value(RESOURCES, "Second"), literal("b"));
    }

    #[test]
    fn test_string_decoding() {
        assert_eq!(
            value(RESOURCES, "escaped"),
            literal("line\n\ttab \"quoted\" Aé\u{41}")
        );
        assert_eq!(value(RESOURCES, "raw"), literal(r"C:\path\n"));
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(value(RESOURCES, "Computed"), literal("v1"));

        let src = "package x\n\nconst Image = \"quay.io/\" +\n\t\"kubermatic\" + (\"/etcd\")\nconst Next = \"n\"\n";
        assert_eq!(value(src, "Image"), literal("quay.io/kubermatic/etcd"));
        assert_eq!(value(src, "Next"), literal("n"));
    }

    #[test]
    fn test_references_to_other_constants() {
        let src = r#"package pkg

const base = "v1.30"
const Alias = base
const Tag = "v" + "3.5.17"
const Image = registry + "/etcd:" + Tag

const registry = "gcr.io"
"#;
        assert_eq!(value(src, "Alias"), literal("v1.30"));
        assert_eq!(value(src, "Tag"), literal("v3.5.17"));
        assert_eq!(value(src, "Image"), literal("gcr.io/etcd:v3.5.17"));
    }

    #[test]
    fn test_references_across_files() {
        let package = package(&[
            "package pkg\n\nconst Version = prefix + minor\n",
            "package pkg\n\nconst (\n\tprefix = \"v1.\"\n\tminor  = `25`\n)\n",
        ]);
        assert_eq!(package.value("Version"), literal("v1.25"));
    }

    #[test]
    fn test_implicit_repetition() {
        let src = "package x\n\nconst (\n\tStable = \"v2.1.0\"\n\tAlsoStable\n)\n";
        assert_eq!(value(src, "AlsoStable"), literal("v2.1.0"));
    }

    #[test]
    fn test_unsupported_values() {
        assert_eq!(value(RESOURCES, "ModeA"), Some(Err("iota".to_string())));
        assert_eq!(value(RESOURCES, "ModeB"), Some(Err("iota".to_string())));

        let src = r#"package x

import "fmt"

const Cycle = Other
const Other = Cycle
const Mixed = "v" + 1
const External = fmt.Sprint
const Unknown = elsewhere
"#;
        assert_eq!(value(src, "Cycle"), Some(Err("Other".to_string())));
        assert!(matches!(value(src, "Mixed"), Some(Err(e)) if e == r#""v" + 1"#));
        assert!(matches!(value(src, "External"), Some(Err(_))));
        assert!(matches!(value(src, "Unknown"), Some(Err(_))));
    }

    #[test]
    fn test_skips_nested_and_blank() {
        assert_eq!(value(RESOURCES, "Local"), None);
        assert_eq!(value(RESOURCES, "_"), None);
        assert_eq!(value(RESOURCES, "notAConstant"), None);
    }

    #[test]
    fn test_comments_are_ignored() {
        let src = "package x\n/* const Hidden = \"h\" */\n// const Other = \"o\"\nconst Shown = \"s\" // trailing\n";
        assert_eq!(value(src, "Hidden"), None);
        assert_eq!(value(src, "Other"), None);
        assert_eq!(value(src, "Shown"), literal("s"));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""plain""#), Some("plain".to_string()));
        assert_eq!(unquote(r#""\U0001F600""#), Some("\u{1F600}".to_string()));
        assert_eq!(unquote(r#""bad \q escape""#), None);
        assert_eq!(unquote(r#""\777""#), None);
        assert_eq!(unquote("unquoted"), None);
    }

    #[test]
    fn test_module_directive() {
        assert_eq!(
            parse_module_directive("// comment\nmodule k8c.io/kubermatic/v2\n\ngo 1.23\n"),
            Some("k8c.io/kubermatic/v2".to_string())
        );
        assert_eq!(parse_module_directive("go 1.23\n"), None);
    }

    fn repository() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("go.mod"), "module k8c.io/kubermatic/v2\n\ngo 1.23\n").unwrap();

        let pkg = root.join("pkg/resources");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("resources.go"), RESOURCES).unwrap();
        fs::write(
            pkg.join("resources_test.go"),
            "package resources\n\nconst TestOnly = \"t\"\n",
        )
        .unwrap();

        let vendored = root.join("vendor/github.com/example/lib");
        fs::create_dir_all(&vendored).unwrap();
        fs::write(vendored.join("version.go"), "package lib\n\nconst Version = \"0.9.1\"\n").unwrap();

        dir
    }

    #[test]
    fn test_read_module_package() {
        let repo = repository();
        let mut reader = GoSourceReader::new(repo.path());

        assert_eq!(
            reader.read("k8c.io/kubermatic/v2/pkg/resources", "EtcdImageTag").unwrap(),
            "v3.5.17"
        );
        assert_eq!(reader.read("./pkg/resources", "Replicas").unwrap(), "3");
        assert_eq!(reader.read("./pkg/resources", "Computed").unwrap(), "v1");
    }

    #[test]
    fn test_read_vendored_package() {
        let repo = repository();
        let mut reader = GoSourceReader::new(repo.path());

        assert_eq!(reader.read("github.com/example/lib", "Version").unwrap(), "0.9.1");
    }

    #[test]
    fn test_read_errors() {
        let repo = repository();
        let mut reader = GoSourceReader::new(repo.path());
        let package = "k8c.io/kubermatic/v2/pkg/resources";

        assert!(matches!(
            reader.read(package, "TestOnly"),
            Err(ResolutionError::NotFound { .. })
        ));
        assert!(matches!(
            reader.read(package, "ModeA"),
            Err(ResolutionError::UnsupportedConstant { expression, .. }) if expression == "iota"
        ));
        assert!(matches!(
            reader.read("github.com/missing/lib", "Version"),
            Err(ResolutionError::Package { .. })
        ));
        assert!(matches!(
            reader.read("k8c.io/kubermatic/v2/pkg/missing", "Version"),
            Err(ResolutionError::Io { .. })
        ));
    }

    #[test]
    fn test_packages_are_parsed_once() {
        let repo = repository();
        let mut reader = GoSourceReader::new(repo.path());
        let package = "k8c.io/kubermatic/v2/pkg/resources";

        assert_eq!(reader.read(package, "EtcdImageTag").unwrap(), "v3.5.17");

        fs::write(
            repo.path().join("pkg/resources/resources.go"),
            "package resources\n\nconst EtcdImageTag = \"changed\"\n",
        )
        .unwrap();
        assert_eq!(reader.read(package, "EtcdImageTag").unwrap(), "v3.5.17");

        let mut fresh = GoSourceReader::new(repo.path());
        assert_eq!(fresh.read(package, "EtcdImageTag").unwrap(), "changed");
    }
}
