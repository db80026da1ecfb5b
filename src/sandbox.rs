//! Resolves client-supplied path references to absolute filesystem paths
//! confined to a virtual root.
//!
//! The sandbox is lexical: it cleans `.`/`..` and re-anchors to `root`
//! without ever touching the filesystem or following symlinks. See the
//! specification's Path Sandbox component for the exact algorithm and its
//! rationale.

use std::path::{Component, Path, PathBuf};

/// Resolves a client-supplied path reference to an absolute path guaranteed
/// to have `root` as a directory-boundary prefix.
///
/// `root` and `cwd` are assumed already absolute and clean (`cwd` being
/// `root` or a descendant of it). `reference` is the raw client argument,
/// which may be absolute, relative, and may contain `.`/`..` traversal.
///
/// The traversal is applied entirely in terms of the *virtual* path relative
/// to `root`, never against `root`'s own host-filesystem segments: the
/// starting stack is the client-visible remainder of `cwd` (empty for `root`
/// itself), and `..` pops only from that stack. A `..` issued with an empty
/// stack is simply dropped rather than consumed against `root`'s own parent
/// directories, so popping can never walk into - or past - `root`'s own
/// absolute path on disk.
pub fn resolve(root: &Path, cwd: &Path, reference: &str) -> PathBuf {
    let reference_path = Path::new(reference);

    // The stack this reference is resolved against: empty (i.e. `root`) for
    // an absolute reference, otherwise the virtual-relative remainder of
    // `cwd`.
    let mut stack: Vec<&std::ffi::OsStr> = if reference_path.is_absolute() {
        Vec::new()
    } else {
        match cwd.strip_prefix(root) {
            Ok(rel) => rel.components().filter_map(|c| if let Component::Normal(part) = c { Some(part) } else { None }).collect(),
            Err(_) => Vec::new(),
        }
    };

    for component in reference_path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                stack.pop();
            }
            Component::Normal(part) => stack.push(part),
        }
    }

    let mut resolved = root.to_path_buf();
    resolved.extend(stack);
    resolved
}

/// True if `path` is `root` itself or a path-separator-bounded descendant of it.
pub fn has_root_prefix(path: &Path, root: &Path) -> bool {
    path == root || path.strip_prefix(root).is_ok()
}

/// Renders an absolute path under `root` as the client-visible virtual path
/// (leading `/`, root itself is `/`).
pub fn to_virtual(path: &Path, root: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => "/".to_string(),
        Ok(rel) => {
            let mut virt = String::from("/");
            virt.push_str(&rel.to_string_lossy().replace('\\', "/"));
            virt
        }
        Err(_) => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/srv/ftp")
    }

    #[test]
    fn resolves_relative_path_under_cwd() {
        let cwd = root().join("a");
        assert_eq!(resolve(&root(), &cwd, "b.txt"), root().join("a/b.txt"));
    }

    #[test]
    fn resolves_absolute_path_under_root() {
        let cwd = root().join("a/b");
        assert_eq!(resolve(&root(), &cwd, "/c.txt"), root().join("c.txt"));
    }

    #[test]
    fn clamps_parent_escape_to_root() {
        let cwd = root();
        assert_eq!(resolve(&root(), &cwd, ".."), root());
        assert_eq!(resolve(&root(), &cwd, "../../etc/passwd"), root().join("etc/passwd"));
    }

    #[test]
    fn clamps_absolute_parent_escape() {
        let cwd = root();
        assert_eq!(resolve(&root(), &cwd, "/../../.."), root());
    }

    #[test]
    fn cwd_then_parent_returns_to_root() {
        let sub = resolve(&root(), &root(), "server");
        assert_eq!(sub, root().join("server"));
        let back = resolve(&root(), &sub, "..");
        assert_eq!(back, root());
    }

    #[test]
    fn collapses_dot_and_duplicate_separators() {
        let cwd = root();
        assert_eq!(resolve(&root(), &cwd, "./a//./b"), root().join("a/b"));
    }

    #[test]
    fn to_virtual_renders_root_as_slash() {
        assert_eq!(to_virtual(&root(), &root()), "/");
        assert_eq!(to_virtual(&root().join("server"), &root()), "/server");
    }
}
