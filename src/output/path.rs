// src/output/path.rs
// =============================================================================
// Maps a page URL to a relative markdown file path.
//
// Example (docs prefix "/start/latest/docs"):
//   https://tanstack.com/start/latest/docs/framework/react/overview
//   -> framework/react/overview.md
//
// The mapping is a pure function: the same URL always gives the same path.
// Different URLs may collide (e.g. "a b" and "a!b" both become "a_b"); the
// writer's written-path set takes care of that.
// =============================================================================

#[derive(Debug, Clone)]
pub struct PathNormalizer {
    docs_prefix: String,
}

impl PathNormalizer {
    pub fn new(docs_prefix: impl Into<String>) -> Self {
        let docs_prefix = docs_prefix.into();
        Self {
            docs_prefix: docs_prefix.trim_end_matches('/').to_string(),
        }
    }

    // Converts a URL to a relative path using forward slashes.
    //
    // Never fails: anything shaped roughly like a URL produces some path.
    pub fn normalize(&self, url: &str) -> String {
        let path = path_component(url);

        // Strip the docs prefix and the slash right after it
        let rest = match path.strip_prefix(self.docs_prefix.as_str()) {
            Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
            None => path,
        };

        // Only one trailing slash is removed
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let rest = if rest.is_empty() { "index" } else { rest };

        let cleaned: String = rest.chars().map(sanitize_char).collect();

        // Empty segments would make the path absolute ("/other/page") or
        // produce "a//b"; dropping them keeps the result under the output root
        let relative = cleaned
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        if relative.is_empty() {
            "index.md".to_string()
        } else {
            format!("{relative}.md")
        }
    }
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new("/start/latest/docs")
    }
}

// Keeps ASCII letters, digits, '_', '-' and '/'; everything else becomes '_'.
fn sanitize_char(c: char) -> char {
    if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/') {
        c
    } else {
        '_'
    }
}

// Returns the path component of a URL exactly as written.
//
// We slice the string instead of going through url::Url because Url
// percent-encodes the path ("Intro Page" -> "Intro%20Page"), which would
// change the file name.
fn path_component(url: &str) -> &str {
    let after_authority = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find(|c: char| matches!(c, '/' | '?' | '#')) {
                Some(start) => &rest[start..],
                None => "",
            }
        }
        None => url,
    };

    let end = after_authority
        .find(|c: char| matches!(c, '?' | '#'))
        .unwrap_or(after_authority.len());
    &after_authority[..end]
}
