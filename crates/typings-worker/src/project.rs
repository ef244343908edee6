// typings-worker/src/project.rs
use std::path::{Path, PathBuf};
use typings_common::PROJECT_MANIFEST;

/// Nearest ancestor directory of `file_path` that contains a `package.json`
pub fn find_project_root(file_path: &Path) -> Option<PathBuf> {
    find_project_root_with(file_path, |path| path.exists())
}

/// Same search as [`find_project_root`] with a caller-supplied existence check
pub fn find_project_root_with<F>(file_path: &Path, exists: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    file_path
        .parent()?
        .ancestors()
        .filter(|dir| !dir.as_os_str().is_empty())
        .find(|dir| exists(&dir.join(PROJECT_MANIFEST)))
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_finds_nearest_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("a/b");
        let file = root.join("c/file.ts");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(root.join("package.json"), "{}").unwrap();
        fs::write(&file, "").unwrap();

        assert_eq!(find_project_root(&file), Some(root));
    }

    #[test]
    fn test_prefers_closest_ancestor() {
        let temp_dir = TempDir::new().unwrap();
        let outer = temp_dir.path().join("a");
        let inner = outer.join("b");
        fs::create_dir_all(&inner).unwrap();
        fs::write(outer.join("package.json"), "{}").unwrap();
        fs::write(inner.join("package.json"), "{}").unwrap();

        assert_eq!(find_project_root(&inner.join("index.ts")), Some(inner));
    }

    #[test]
    fn test_manifest_in_file_directory() {
        let found = find_project_root_with(Path::new("/a/b/c/file.ts"), |p| {
            p == Path::new("/a/b/c/package.json")
        });
        assert_eq!(found, Some(PathBuf::from("/a/b/c")));
    }

    #[test]
    fn test_walks_to_manifest_two_levels_up() {
        let found = find_project_root_with(Path::new("/a/b/c/file.ts"), |p| {
            p == Path::new("/a/b/package.json")
        });
        assert_eq!(found, Some(PathBuf::from("/a/b")));
    }

    #[test]
    fn test_no_manifest_in_chain() {
        let found = find_project_root_with(Path::new("/a/b/c/file.ts"), |_| false);
        assert_eq!(found, None);
    }

    #[test]
    fn test_checks_every_ancestor_up_to_root() {
        let checked = std::cell::RefCell::new(Vec::new());
        find_project_root_with(Path::new("/a/b/file.ts"), |p| {
            checked.borrow_mut().push(p.to_path_buf());
            false
        });
        assert_eq!(
            checked.into_inner(),
            vec![
                PathBuf::from("/a/b/package.json"),
                PathBuf::from("/a/package.json"),
                PathBuf::from("/package.json"),
            ]
        );
    }

    #[test]
    fn test_bare_file_name_has_no_root() {
        assert_eq!(find_project_root_with(Path::new("file.ts"), |_| true), None);
    }
}
