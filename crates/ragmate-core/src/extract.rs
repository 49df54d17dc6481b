//! Heuristic dependency and export extraction.
//!
//! Line-oriented pattern matching per language. Misses are acceptable; the
//! extractor must never fail on arbitrary input.

use crate::Language;
use once_cell::sync::Lazy;
use regex::Regex;

/// Dependencies and exports found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub dependencies: Vec<String>,
    pub exports: Vec<String>,
}

fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
}

static JS_IMPORT_FROM: Lazy<Regex> =
    Lazy::new(|| compile_regex(r#"^\s*(?:import|export)\b[^'"]*?\bfrom\s+['"]([^'"]+)['"]"#));
static JS_IMPORT_BARE: Lazy<Regex> = Lazy::new(|| compile_regex(r#"^\s*import\s+['"]([^'"]+)['"]"#));
static JS_REQUIRE: Lazy<Regex> =
    Lazy::new(|| compile_regex(r#"\b(?:require|import)\s*\(\s*['"]([^'"]+)['"]\s*\)"#));
static JS_EXPORT_DECL: Lazy<Regex> = Lazy::new(|| {
    compile_regex(
        r"^\s*export\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|type|enum|namespace)\s+([A-Za-z_$][\w$]*)",
    )
});
static JS_EXPORT_LIST: Lazy<Regex> = Lazy::new(|| compile_regex(r"^\s*export\s*(?:type\s*)?\{([^}]*)\}"));
static JS_EXPORT_DEFAULT: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^\s*export\s+default\s+([A-Za-z_$][\w$]*)\s*;?\s*$"));

static PY_IMPORT: Lazy<Regex> = Lazy::new(|| compile_regex(r"^import\s+(.+)$"));
static PY_FROM: Lazy<Regex> = Lazy::new(|| compile_regex(r"^from\s+(\S+)\s+import\b"));
static PY_DEF: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^(?:async\s+)?(?:def|class)\s+([A-Za-z]\w*)"));

static RS_USE: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^\s*(?:pub(?:\([^)]*\))?\s+)?use\s+([^;]+);"));
static RS_EXTERN: Lazy<Regex> = Lazy::new(|| compile_regex(r"^\s*extern\s+crate\s+(\w+)"));
static RS_PUB: Lazy<Regex> = Lazy::new(|| {
    compile_regex(
        r"^\s*pub\s+(?:const\s+|async\s+|unsafe\s+)*(?:fn|struct|enum|trait|type|mod|const|static|union)\s+([A-Za-z_]\w*)",
    )
});

static GO_IMPORT_SINGLE: Lazy<Regex> =
    Lazy::new(|| compile_regex(r#"^\s*import\s+(?:\w+\s+)?"([^"]+)""#));
static GO_IMPORT_LINE: Lazy<Regex> = Lazy::new(|| compile_regex(r#"^\s*(?:[\w.]+\s+)?"([^"]+)"\s*$"#));
static GO_EXPORT: Lazy<Regex> = Lazy::new(|| {
    compile_regex(r"^(?:func(?:\s*\([^)]*\))?|type|var|const)\s+([A-Z]\w*)")
});

static JAVA_IMPORT: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^\s*import\s+(?:static\s+)?([\w.*]+)\s*;"));
static JAVA_PUBLIC: Lazy<Regex> = Lazy::new(|| {
    compile_regex(
        r"^\s*public\s+(?:static\s+|final\s+|abstract\s+)*(?:class|interface|enum|record)\s+([A-Za-z_]\w*)",
    )
});

static HCL_SOURCE: Lazy<Regex> = Lazy::new(|| compile_regex(r#"^\s*source\s*=\s*"([^"]+)""#));
static HCL_OUTPUT: Lazy<Regex> = Lazy::new(|| compile_regex(r#"^\s*output\s+"([^"]+)""#));

/// Extract dependencies and exports from `content` of a file at `path`.
pub fn extract(path: &str, content: &str) -> Extracted {
    let mut out = Extracted::default();
    match Language::from_path(path) {
        Language::TypeScript | Language::JavaScript => extract_js(content, &mut out),
        Language::Python => extract_python(content, &mut out),
        Language::Rust => extract_rust(content, &mut out),
        Language::Go => extract_go(content, &mut out),
        Language::Java => extract_java(content, &mut out),
        Language::Hcl => extract_hcl(content, &mut out),
        // Unknown files still get the JS patterns; they are the most common
        // import syntax in mixed repositories.
        Language::Unknown => extract_js(content, &mut out),
    }
    out
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

fn extract_js(content: &str, out: &mut Extracted) {
    for line in content.lines() {
        if let Some(c) = JS_IMPORT_FROM.captures(line).or_else(|| JS_IMPORT_BARE.captures(line)) {
            push_unique(&mut out.dependencies, &c[1]);
        }
        for c in JS_REQUIRE.captures_iter(line) {
            push_unique(&mut out.dependencies, &c[1]);
        }

        if let Some(c) = JS_EXPORT_DECL.captures(line) {
            push_unique(&mut out.exports, &c[1]);
        } else if let Some(c) = JS_EXPORT_LIST.captures(line) {
            for item in c[1].split(',') {
                // `a as b` exports `b`
                let name = item.split_whitespace().last().unwrap_or("");
                push_unique(&mut out.exports, name);
            }
        } else if let Some(c) = JS_EXPORT_DEFAULT.captures(line) {
            push_unique(&mut out.exports, &c[1]);
        }
    }
}

fn extract_python(content: &str, out: &mut Extracted) {
    for line in content.lines() {
        if let Some(c) = PY_FROM.captures(line) {
            push_unique(&mut out.dependencies, &c[1]);
        } else if let Some(c) = PY_IMPORT.captures(line) {
            for item in c[1].split(',') {
                let module = item.split_whitespace().next().unwrap_or("");
                push_unique(&mut out.dependencies, module);
            }
        }

        // Top-level public definitions only
        if let Some(c) = PY_DEF.captures(line) {
            if !c[1].starts_with('_') {
                push_unique(&mut out.exports, &c[1]);
            }
        }
    }
}

fn extract_rust(content: &str, out: &mut Extracted) {
    for line in content.lines() {
        if let Some(c) = RS_USE.captures(line) {
            push_unique(&mut out.dependencies, &c[1]);
        } else if let Some(c) = RS_EXTERN.captures(line) {
            push_unique(&mut out.dependencies, &c[1]);
        }

        if let Some(c) = RS_PUB.captures(line) {
            push_unique(&mut out.exports, &c[1]);
        }
    }
}

fn extract_go(content: &str, out: &mut Extracted) {
    let mut in_import_block = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if in_import_block {
            if trimmed.starts_with(')') {
                in_import_block = false;
            } else if let Some(c) = GO_IMPORT_LINE.captures(line) {
                push_unique(&mut out.dependencies, &c[1]);
            }
            continue;
        }
        if trimmed.starts_with("import (") || trimmed == "import(" {
            in_import_block = true;
            continue;
        }
        if let Some(c) = GO_IMPORT_SINGLE.captures(line) {
            push_unique(&mut out.dependencies, &c[1]);
        }
        if let Some(c) = GO_EXPORT.captures(line) {
            push_unique(&mut out.exports, &c[1]);
        }
    }
}

fn extract_java(content: &str, out: &mut Extracted) {
    for line in content.lines() {
        if let Some(c) = JAVA_IMPORT.captures(line) {
            push_unique(&mut out.dependencies, &c[1]);
        }
        if let Some(c) = JAVA_PUBLIC.captures(line) {
            push_unique(&mut out.exports, &c[1]);
        }
    }
}

fn extract_hcl(content: &str, out: &mut Extracted) {
    for line in content.lines() {
        if let Some(c) = HCL_SOURCE.captures(line) {
            push_unique(&mut out.dependencies, &c[1]);
        }
        if let Some(c) = HCL_OUTPUT.captures(line) {
            push_unique(&mut out.exports, &c[1]);
        }
    }
}
