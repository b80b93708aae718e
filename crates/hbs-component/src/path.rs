/*
 * path.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Component reference resolution.
//!
//! Maps a symbolic component reference to the template file that implements
//! it. Four reference shapes are recognized, purely syntactically:
//!
//! - relative: `atoms/button` resolves against the root directory
//! - absolute: `/demo/atoms/button` ignores the root directory
//! - package-qualified: `~pkg/atoms/button` resolves against the directory
//!   where `pkg` is installed
//! - file-suffixed: a final segment containing `.` is taken verbatim
//!
//! Without a file suffix the template lives in a directory named after the
//! component: `atoms/button` becomes `atoms/button/button.hbs`.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{ComponentError, ComponentResult};

/// Trait for locating installed packages by name.
pub trait PackageLocator: Send + Sync {
    /// Return the installation directory of `package`, if it can be found.
    ///
    /// # Arguments
    /// * `package` - The package name from a `~package/...` reference
    /// * `root_directory` - The configured component root directory
    fn locate(&self, package: &str, root_directory: &Path) -> Option<PathBuf>;
}

/// Locator that searches `<ancestor>/<directory>/<package>` for every
/// ancestor of the root directory, nearest first.
#[derive(Debug, Clone)]
pub struct PackageDirLocator {
    directory: String,
}

impl PackageDirLocator {
    /// Create a locator searching directories named `directory`
    /// (usually `node_modules`).
    pub fn new(directory: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl Default for PackageDirLocator {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PACKAGE_DIRECTORY)
    }
}

impl PackageLocator for PackageDirLocator {
    fn locate(&self, package: &str, root_directory: &Path) -> Option<PathBuf> {
        root_directory
            .ancestors()
            .map(|ancestor| ancestor.join(&self.directory).join(package))
            .find(|candidate| candidate.is_dir())
    }
}

/// Locator backed by a fixed map of package names to directories.
#[derive(Debug, Clone, Default)]
pub struct StaticPackageLocator {
    packages: HashMap<String, PathBuf>,
}

impl StaticPackageLocator {
    /// Create a new empty locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package directory.
    pub fn add(&mut self, package: impl Into<String>, directory: impl Into<PathBuf>) -> &mut Self {
        self.packages.insert(package.into(), directory.into());
        self
    }
}

impl PackageLocator for StaticPackageLocator {
    fn locate(&self, package: &str, _root_directory: &Path) -> Option<PathBuf> {
        self.packages.get(package).cloned()
    }
}

/// Split `~package/rest` into `("package", "rest")`.
///
/// Returns `Ok(None)` for references without a package qualifier. A
/// qualifier without a component path is rejected.
pub fn split_package_qualifier(reference: &str) -> ComponentResult<Option<(&str, &str)>> {
    let Some(qualified) = reference.strip_prefix('~') else {
        return Ok(None);
    };
    let invalid = |message: &str| ComponentError::Resolution {
        reference: reference.to_string(),
        message: message.to_string(),
    };
    let Some(separator) = qualified.find(['/', '\\']) else {
        return Err(invalid("package reference is missing a component path"));
    };
    let (package, rest) = (&qualified[..separator], &qualified[separator + 1..]);
    if package.is_empty() {
        return Err(invalid("package name is empty"));
    }
    if rest.is_empty() {
        return Err(invalid("package reference is missing a component path"));
    }
    Ok(Some((package, rest)))
}

/// Resolve a component reference to its template file.
///
/// This is a pure function apart from the package lookup: the template file
/// is not checked for existence.
///
/// # Examples
///
/// ```ignore
/// // root: /site
/// // "atoms/button"              → /site/atoms/button/button.hbs
/// // "atoms/button/button.hbs"   → /site/atoms/button/button.hbs
/// // "/demo/atoms/button"        → /demo/atoms/button/button.hbs
/// // "~ui-kit/atoms/button"      → <ui-kit>/atoms/button/button.hbs
/// ```
pub fn resolve_template_path(
    reference: &str,
    root_directory: &Path,
    locator: &dyn PackageLocator,
    template_extension: &str,
) -> ComponentResult<PathBuf> {
    let (base, rest) = match split_package_qualifier(reference)? {
        Some((package, rest)) => {
            let directory = locator.locate(package, root_directory).ok_or_else(|| {
                ComponentError::Resolution {
                    reference: reference.to_string(),
                    message: format!("package \"{}\" could not be located", package),
                }
            })?;
            (directory, rest)
        }
        None => (absolute_path(root_directory), reference),
    };

    let joined = if rest.starts_with(['/', '\\']) {
        PathBuf::from(rest)
    } else {
        base.join(rest)
    };
    let template_directory = normalize_path(&joined);

    let basename = template_directory
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ComponentError::Resolution {
            reference: reference.to_string(),
            message: "reference does not name a component".to_string(),
        })?
        .to_string();

    if basename.contains('.') {
        return Ok(template_directory);
    }
    Ok(template_directory.join(format!("{}.{}", basename, template_extension)))
}

/// Make `path` absolute against the current directory and normalize it.
///
/// Falls back to the lexically normalized input when the current directory
/// is unavailable.
pub fn absolute_path(path: &Path) -> PathBuf {
    match std::path::absolute(path) {
        Ok(absolute) => normalize_path(&absolute),
        Err(_) => normalize_path(path),
    }
}

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding segment. Does not touch the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let folds = matches!(normalized.components().next_back(), Some(Component::Normal(_)));
                if folds {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(reference: &str, root: &str) -> ComponentResult<PathBuf> {
        resolve_template_path(reference, Path::new(root), &StaticPackageLocator::new(), "hbs")
    }

    #[test]
    fn test_resolve_full_template_path() {
        let result = resolve("components/atoms/button/button.hbs", "/site").unwrap();
        assert_eq!(result, PathBuf::from("/site/components/atoms/button/button.hbs"));
    }

    #[test]
    fn test_resolve_absolute_template_path() {
        let result = resolve("/demo/components/atoms/button/button.hbs", "/site").unwrap();
        assert_eq!(result, PathBuf::from("/demo/components/atoms/button/button.hbs"));
    }

    #[test]
    fn test_resolve_absolute_ignores_root() {
        let a = resolve("/demo/atoms/button", "/site").unwrap();
        let b = resolve("/demo/atoms/button", "/elsewhere").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("/demo/atoms/button/button.hbs"));
    }

    #[test]
    fn test_resolve_missing_file_name() {
        let result = resolve("components/atoms/button", "/site").unwrap();
        assert_eq!(result, PathBuf::from("/site/components/atoms/button/button.hbs"));
    }

    #[test]
    fn test_resolve_partial_template_path() {
        let result = resolve("components/atoms/button/partial/button-text", "/site").unwrap();
        assert_eq!(
            result,
            PathBuf::from("/site/components/atoms/button/partial/button-text/button-text.hbs")
        );
    }

    #[test]
    fn test_resolve_fixture_scenario() {
        let result = resolve("fixtures/demo-button", "/r").unwrap();
        assert_eq!(result, PathBuf::from("/r/fixtures/demo-button/demo-button.hbs"));
    }

    #[test]
    fn test_resolve_normalizes_dot_segments() {
        let result = resolve("./atoms/../molecules/card", "/site/components").unwrap();
        assert_eq!(result, PathBuf::from("/site/components/molecules/card/card.hbs"));
    }

    #[test]
    fn test_resolve_custom_extension() {
        let result = resolve_template_path(
            "atoms/button",
            Path::new("/site"),
            &StaticPackageLocator::new(),
            "handlebars",
        )
        .unwrap();
        assert_eq!(result, PathBuf::from("/site/atoms/button/button.handlebars"));
    }

    #[test]
    fn test_resolve_package_reference() {
        let mut locator = StaticPackageLocator::new();
        locator.add("ui-kit", "/deps/ui-kit");
        let result =
            resolve_template_path("~ui-kit/components/atoms/button", Path::new("/site"), &locator, "hbs")
                .unwrap();
        assert!(result.starts_with("/deps/ui-kit"));
        assert_eq!(result, PathBuf::from("/deps/ui-kit/components/atoms/button/button.hbs"));
    }

    #[test]
    fn test_resolve_unknown_package() {
        let err = resolve("~missing/atoms/button", "/site").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to resolve component \"~missing/atoms/button\": package \"missing\" could not be located"
        );
    }

    #[test]
    fn test_package_without_remainder_fails_fast() {
        assert!(matches!(resolve("~ui-kit", "/site"), Err(ComponentError::Resolution { .. })));
        assert!(matches!(resolve("~ui-kit/", "/site"), Err(ComponentError::Resolution { .. })));
        assert!(matches!(resolve("~/atoms/button", "/site"), Err(ComponentError::Resolution { .. })));
    }

    #[test]
    fn test_split_package_qualifier() {
        assert_eq!(split_package_qualifier("atoms/button").unwrap(), None);
        assert_eq!(
            split_package_qualifier("~kit/atoms/button").unwrap(),
            Some(("kit", "atoms/button"))
        );
        assert_eq!(
            split_package_qualifier("~kit\\atoms").unwrap(),
            Some(("kit", "atoms"))
        );
    }

    #[test]
    fn test_package_dir_locator_walks_ancestors() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("node_modules").join("ui-kit");
        std::fs::create_dir_all(&package).unwrap();
        let root = dir.path().join("site").join("components");
        std::fs::create_dir_all(&root).unwrap();

        let locator = PackageDirLocator::default();
        assert_eq!(locator.locate("ui-kit", &root), Some(package));
        assert_eq!(locator.locate("other", &root), None);
    }

    #[test]
    fn test_relative_root_resolves_to_absolute_path() {
        let result = resolve("atoms/button", "components").unwrap();
        assert!(result.is_absolute());
        let expected = std::env::current_dir()
            .unwrap()
            .join("components/atoms/button/button.hbs");
        assert_eq!(result, expected);
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(absolute_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        let relative = absolute_path(Path::new("../x"));
        assert!(relative.is_absolute());
        assert!(!relative.components().any(|c| c == Component::ParentDir));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("../a/b/..")), PathBuf::from("../a"));
    }
}
