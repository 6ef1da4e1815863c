//! Path translation between the sandbox and host namespaces.
//!
//! Tool arguments cross from a Linux-style sandbox into a host service
//! that resolves Windows-style paths. Sandbox absolute paths mean nothing
//! there, so project paths are rewritten under the host's network share
//! root, and sibling relative paths are re-anchored under the project's
//! `dev/<name>` subfolder token. Everything here is pure string
//! inspection; the filesystem is never touched.

use serde_json::Value;
use tracing::debug;

use crate::jsonrpc::JsonRpcRequest;

/// Absolute prefixes that mark a path as sandbox-native.
pub const SANDBOX_ROOTS: &[&str] = &["/home/", "/root/", "/Users/", "/tmp/", "/var/"];

/// Method whose arguments receive path translation.
pub const TOOL_CALL_METHOD: &str = "tools/call";

/// Argument key that triggers translation when it holds a sandbox path.
pub const PROJECT_PATH_KEY: &str = "projectPath";

/// Sibling argument keys re-anchored under the derived subfolder token.
pub const RELATIVE_ARG_KEYS: &[&str] = &["path", "filePath", "directory", "cwd"];

/// Namespace a path string addresses, decided by prefix inspection alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Sandbox-native absolute path (`/home/...`, `/tmp/...`, ...).
    Sandbox,
    /// Host network share path (`\\server\...`).
    Share,
    /// Host drive-letter path (`C:\...` or `C:/...`).
    Drive,
    /// Anything else, including the empty string.
    Relative,
}

impl PathKind {
    /// True for the two namespaces the host resolves natively.
    #[must_use]
    pub fn is_host_side(self) -> bool {
        matches!(self, PathKind::Share | PathKind::Drive)
    }
}

/// Classifies `path` by prefix.
#[must_use]
pub fn classify(path: &str) -> PathKind {
    if path.is_empty() {
        return PathKind::Relative;
    }
    if path.starts_with(r"\\") {
        return PathKind::Share;
    }
    if SANDBOX_ROOTS.iter().any(|root| path.starts_with(root)) {
        return PathKind::Sandbox;
    }
    if is_drive_path(path) {
        return PathKind::Drive;
    }
    PathKind::Relative
}

fn is_drive_path(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Removes the first virtual workspace component (`/@name/`) from `path`.
///
/// Only the first such component is a workspace marker; later `@`
/// components (scoped package directories, for one) are kept.
#[must_use]
pub fn strip_workspace_segment(path: &str) -> String {
    let mut stripped = false;
    let parts: Vec<&str> = path
        .split('/')
        .filter(|part| {
            if !stripped && part.starts_with('@') {
                stripped = true;
                false
            } else {
                true
            }
        })
        .collect();
    parts.join("/")
}

/// Rewrites a sandbox path into the host share namespace.
///
/// The workspace segment is stripped and the remainder is prefixed with
/// `share_root`, so `/home/user/p` becomes `\\wsl$\Ubuntu/home/user/p`
/// under the default root. The host tolerates the mixed separators.
#[must_use]
pub fn rewrite_to_share(share_root: &str, path: &str) -> String {
    let root = share_root.trim_end_matches(['/', '\\']);
    format!("{root}{}", strip_workspace_segment(path))
}

/// Extracts the project subfolder token: the final path component when it
/// sits directly under a `dev` component.
#[must_use]
pub fn derive_subfolder(path: &str) -> Option<String> {
    let stripped = strip_workspace_segment(path);
    let trimmed = stripped.trim_end_matches('/');
    let mut components = trimmed.rsplit('/');
    let name = components.next()?;
    let parent = components.next()?;
    if parent == "dev" && !name.is_empty() {
        Some(name.to_string())
    } else {
        None
    }
}

/// Rewrites the path arguments of a `tools/call` request in place.
///
/// Triggers only when `projectPath` holds a sandbox path. The project
/// path moves into the share namespace; when it derives a subfolder
/// token, sibling relative-path arguments are re-anchored under that
/// token. Every other request passes through untouched.
pub fn translate_request(request: &mut JsonRpcRequest, share_root: &str) {
    if request.method != TOOL_CALL_METHOD {
        return;
    }
    let Some(args) = request
        .params
        .as_mut()
        .and_then(|params| params.get_mut("arguments"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    let Some(project_path) = args.get(PROJECT_PATH_KEY).and_then(Value::as_str) else {
        return;
    };
    if classify(project_path) != PathKind::Sandbox {
        return;
    }

    let original = project_path.to_string();
    let rewritten = rewrite_to_share(share_root, &original);
    let token = derive_subfolder(&original);
    debug!(from = %original, to = %rewritten, token = ?token, "translated project path");
    args.insert(PROJECT_PATH_KEY.to_string(), Value::String(rewritten));

    let Some(token) = token else {
        return;
    };
    for key in RELATIVE_ARG_KEYS {
        let updated = match args.get(*key).and_then(Value::as_str) {
            Some(value) if needs_token(value, &token) => Some(format!("{token}/{value}")),
            _ => None,
        };
        if let Some(updated) = updated {
            args.insert((*key).to_string(), Value::String(updated));
        }
    }
}

/// A sibling value takes the token when it is relative and not already
/// anchored under it. A bare prefix match is not enough: token `my` must
/// not claim `myfile.txt`.
fn needs_token(value: &str, token: &str) -> bool {
    if classify(value) != PathKind::Relative {
        return false;
    }
    match value.strip_prefix(token) {
        Some("") => false,
        Some(rest) if rest.starts_with('/') => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = r"\\wsl$\Ubuntu";

    fn tool_call(arguments: Value) -> JsonRpcRequest {
        serde_json::from_value(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "run_tool", "arguments": arguments },
        }))
        .unwrap()
    }

    fn argument<'a>(request: &'a JsonRpcRequest, key: &str) -> &'a str {
        request
            .params
            .as_ref()
            .and_then(|p| p.get("arguments"))
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
            .unwrap()
    }

    // ========================================================================
    // classify
    // ========================================================================

    /// Tests the classification matrix across all four namespaces.
    #[test]
    fn classify_covers_namespaces() {
        assert_eq!(classify("/home/user/project"), PathKind::Sandbox);
        assert_eq!(classify("/root/x"), PathKind::Sandbox);
        assert_eq!(classify("/Users/dev/app"), PathKind::Sandbox);
        assert_eq!(classify("/tmp/scratch"), PathKind::Sandbox);
        assert_eq!(classify("/var/lib/data"), PathKind::Sandbox);
        assert_eq!(classify(r"\\wsl$\Ubuntu\home"), PathKind::Share);
        assert_eq!(classify(r"C:\Users\dev"), PathKind::Drive);
        assert_eq!(classify("c:/work"), PathKind::Drive);
        assert_eq!(classify("src/app"), PathKind::Relative);
        assert_eq!(classify(""), PathKind::Relative);
        assert_eq!(classify("/opt/thing"), PathKind::Relative);
        assert_eq!(classify("C:"), PathKind::Relative);
    }

    /// Tests that rewriting any sandbox path lands it host-side.
    #[test]
    fn rewrite_lands_host_side() {
        for path in ["/home/user/project", "/tmp/x", "/var/y", "/Users/me/z"] {
            let rewritten = rewrite_to_share(ROOT, path);
            assert_eq!(classify(&rewritten), PathKind::Share, "{path}");
            assert!(classify(&rewritten).is_host_side());
        }
    }

    // ========================================================================
    // rewrite_to_share / strip_workspace_segment
    // ========================================================================

    /// Tests that rewriting is share root plus the original path.
    #[test]
    fn rewrite_prefixes_share_root() {
        assert_eq!(
            rewrite_to_share(ROOT, "/home/user/project"),
            r"\\wsl$\Ubuntu/home/user/project"
        );
    }

    /// Tests that the workspace segment disappears during rewriting.
    #[test]
    fn rewrite_strips_workspace_segment() {
        assert_eq!(
            rewrite_to_share(ROOT, "/home/user/@main/dev/proj"),
            r"\\wsl$\Ubuntu/home/user/dev/proj"
        );
    }

    /// Tests that only the first `@` component is treated as a marker.
    #[test]
    fn strip_removes_first_marker_only() {
        assert_eq!(
            strip_workspace_segment("/home/@ws/node_modules/@types/node"),
            "/home/node_modules/@types/node"
        );
        assert_eq!(strip_workspace_segment("/home/user/p"), "/home/user/p");
    }

    // ========================================================================
    // derive_subfolder
    // ========================================================================

    /// Tests the subfolder token extraction tail match.
    #[test]
    fn derive_matches_dev_tail() {
        assert_eq!(
            derive_subfolder("/home/user/dev/myproject"),
            Some("myproject".to_string())
        );
        assert_eq!(
            derive_subfolder("/home/user/dev/myproject/"),
            Some("myproject".to_string())
        );
        assert_eq!(derive_subfolder("/home/user/x"), None);
        assert_eq!(derive_subfolder("/home/dev"), None);
        assert_eq!(derive_subfolder("myproject"), None);
        assert_eq!(
            derive_subfolder("/home/@ws/dev/proj"),
            Some("proj".to_string())
        );
    }

    // ========================================================================
    // translate_request
    // ========================================================================

    /// Tests the full rewrite: project path moves to the share and the
    /// relative sibling takes the token.
    #[test]
    fn translates_project_and_sibling() {
        let mut req = tool_call(serde_json::json!({
            "projectPath": "/home/user/dev/myproject",
            "path": "src/app",
        }));
        translate_request(&mut req, ROOT);
        assert_eq!(
            argument(&req, "projectPath"),
            r"\\wsl$\Ubuntu/home/user/dev/myproject"
        );
        assert_eq!(argument(&req, "path"), "myproject/src/app");
    }

    /// Tests that each sibling key in the table is re-anchored.
    #[test]
    fn translates_every_sibling_key() {
        let mut req = tool_call(serde_json::json!({
            "projectPath": "/home/user/dev/proj",
            "path": "a",
            "filePath": "b/c.rs",
            "directory": "d",
            "cwd": "",
        }));
        translate_request(&mut req, ROOT);
        assert_eq!(argument(&req, "path"), "proj/a");
        assert_eq!(argument(&req, "filePath"), "proj/b/c.rs");
        assert_eq!(argument(&req, "directory"), "proj/d");
        assert_eq!(argument(&req, "cwd"), "proj/");
    }

    /// Tests that anchored or absolute siblings are left alone.
    #[test]
    fn skips_anchored_and_absolute_siblings() {
        let mut req = tool_call(serde_json::json!({
            "projectPath": "/home/user/dev/proj",
            "path": "proj/src/app",
            "filePath": "/home/user/other.rs",
            "directory": r"C:\elsewhere",
            "cwd": "proj",
        }));
        translate_request(&mut req, ROOT);
        assert_eq!(argument(&req, "path"), "proj/src/app");
        assert_eq!(argument(&req, "filePath"), "/home/user/other.rs");
        assert_eq!(argument(&req, "directory"), r"C:\elsewhere");
        assert_eq!(argument(&req, "cwd"), "proj");
    }

    /// Tests that a sibling merely sharing the token's leading characters
    /// is still re-anchored.
    #[test]
    fn token_match_is_component_exact() {
        let mut req = tool_call(serde_json::json!({
            "projectPath": "/home/user/dev/my",
            "path": "myfile.txt",
        }));
        translate_request(&mut req, ROOT);
        assert_eq!(argument(&req, "path"), "my/myfile.txt");
    }

    /// Tests that no token means siblings pass through unchanged.
    #[test]
    fn no_token_leaves_siblings() {
        let mut req = tool_call(serde_json::json!({
            "projectPath": "/home/user/plain",
            "path": "src/app",
        }));
        translate_request(&mut req, ROOT);
        assert_eq!(argument(&req, "projectPath"), r"\\wsl$\Ubuntu/home/user/plain");
        assert_eq!(argument(&req, "path"), "src/app");
    }

    /// Tests that non-tool methods and non-sandbox project paths pass
    /// through untouched.
    #[test]
    fn ignores_untriggered_requests() {
        let mut other_method: JsonRpcRequest = serde_json::from_value(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "resources/list",
            "params": { "arguments": { "projectPath": "/home/user/dev/p", "path": "x" } },
        }))
        .unwrap();
        let before = serde_json::to_string(&other_method).unwrap();
        translate_request(&mut other_method, ROOT);
        assert_eq!(serde_json::to_string(&other_method).unwrap(), before);

        let mut host_path = tool_call(serde_json::json!({
            "projectPath": r"C:\already\there",
            "path": "src",
        }));
        translate_request(&mut host_path, ROOT);
        assert_eq!(argument(&host_path, "projectPath"), r"C:\already\there");
        assert_eq!(argument(&host_path, "path"), "src");
    }

    /// Tests that requests without arguments survive translation.
    #[test]
    fn tolerates_missing_arguments() {
        let mut req: JsonRpcRequest = serde_json::from_value(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "bare" },
        }))
        .unwrap();
        translate_request(&mut req, ROOT);
        assert!(req.params.as_ref().unwrap().get("arguments").is_none());

        let mut no_params: JsonRpcRequest =
            serde_json::from_value(serde_json::json!({ "method": "tools/call", "id": 4 })).unwrap();
        translate_request(&mut no_params, ROOT);
        assert!(no_params.params.is_none());
    }

    /// Tests that a non-string sibling value is not rewritten.
    #[test]
    fn skips_non_string_siblings() {
        let mut req = tool_call(serde_json::json!({
            "projectPath": "/home/user/dev/proj",
            "path": 17,
        }));
        translate_request(&mut req, ROOT);
        let value = req
            .params
            .as_ref()
            .and_then(|p| p.get("arguments"))
            .and_then(|a| a.get("path"))
            .unwrap();
        assert_eq!(value, &serde_json::json!(17));
    }
}
