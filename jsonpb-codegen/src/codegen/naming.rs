//! Naming utilities for Go code generation

use std::path::{Path, PathBuf};

/// Suffix appended to the base name of a companion file
pub const COMPANION_SUFFIX: &str = "_json";

/// Check if a name is a Go reserved keyword
pub fn is_go_keyword(name: &str) -> bool {
    matches!(
        name,
        "break"
            | "case"
            | "chan"
            | "const"
            | "continue"
            | "default"
            | "defer"
            | "else"
            | "fallthrough"
            | "for"
            | "func"
            | "go"
            | "goto"
            | "if"
            | "import"
            | "interface"
            | "map"
            | "package"
            | "range"
            | "return"
            | "select"
            | "struct"
            | "switch"
            | "type"
            | "var"
    )
}

/// Check if a name is a legal Go identifier that is not a keyword
pub fn is_go_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !is_go_keyword(name)
}

/// Package name an import path binds when imported without an alias
///
/// Follows the goimports convention: the last path element, skipping a
/// trailing major-version element (`/v2`) and dropping a `go-` prefix or
/// `-go` / `.go` suffix.
/// e.g., "github.com/ajm188/go-jsonpb" -> "jsonpb"
pub fn import_local_name(path: &str) -> String {
    let mut elements = path.rsplit('/');
    let mut last = elements.next().unwrap_or(path);
    if is_major_version(last) {
        if let Some(prev) = elements.next() {
            last = prev;
        }
    }

    let last = last.strip_prefix("go-").unwrap_or(last);
    let last = last
        .strip_suffix("-go")
        .or_else(|| last.strip_suffix(".go"))
        .unwrap_or(last);

    last.chars()
        .map(|c| if c == '_' || c.is_alphanumeric() { c } else { '_' })
        .collect()
}

fn is_major_version(element: &str) -> bool {
    element
        .strip_prefix('v')
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

/// Companion file path for a source file
/// e.g., "api/service.pb.go" -> "api/service_json.pb.go"
pub fn companion_file_name(source: &Path) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let companion = match file_name.split_once('.') {
        Some((base, ext)) => format!("{}{}.{}", base, COMPANION_SUFFIX, ext),
        None => format!("{}{}.go", file_name, COMPANION_SUFFIX),
    };

    source.with_file_name(companion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_go_identifier() {
        assert!(is_go_identifier("MarshalJSON"));
        assert!(is_go_identifier("_x1"));
        assert!(is_go_identifier("Foo_Bar"));
        assert!(!is_go_identifier(""));
        assert!(!is_go_identifier("1abc"));
        assert!(!is_go_identifier("a-b"));
        assert!(!is_go_identifier("type"));
        assert!(!is_go_identifier("func"));
    }

    #[test]
    fn test_import_local_name() {
        assert_eq!(
            import_local_name("google.golang.org/protobuf/encoding/protojson"),
            "protojson"
        );
        assert_eq!(import_local_name("github.com/ajm188/go-jsonpb"), "jsonpb");
        assert_eq!(import_local_name("github.com/foo/bar/v2"), "bar");
        assert_eq!(import_local_name("gopkg.in/yaml-go"), "yaml");
        assert_eq!(import_local_name("fmt"), "fmt");
    }

    #[test]
    fn test_companion_file_name() {
        assert_eq!(
            companion_file_name(Path::new("api/service.pb.go")),
            PathBuf::from("api/service_json.pb.go")
        );
        assert_eq!(
            companion_file_name(Path::new("types.go")),
            PathBuf::from("types_json.go")
        );
        assert_eq!(
            companion_file_name(Path::new("noext")),
            PathBuf::from("noext_json.go")
        );
    }
}
