use super::gomod::{escape_module_path, path_within, GoMod, ReplaceTarget};
use crate::error::{Error, Result};
use crate::types::ScopePath;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, trace};

/// One Go file of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// File name or path, for diagnostics
    pub path: String,
    /// File contents
    pub text: Arc<str>,
}

/// Loads the Go files that make up a package
///
/// Implementations are called by the registry without any registry lock
/// held, possibly from several threads at once.
pub trait SourceProvider: Send + Sync {
    /// Returns every file of the package at `scope`; an unknown package has no files
    fn load(&self, scope: &ScopePath) -> Result<Vec<SourceText>>;
}

/// Package sources held in memory, keyed by import path and file name
///
/// Suits editors with unsaved buffers. Callers that replace a file are
/// expected to invalidate the scope in the registry afterwards.
#[derive(Debug, Default)]
pub struct InMemorySources {
    packages: RwLock<HashMap<ScopePath, BTreeMap<String, Arc<str>>>>,
}

impl InMemorySources {
    /// Creates an empty source set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file
    pub fn insert(&self, scope: impl Into<ScopePath>, file: impl Into<String>, text: &str) {
        self.packages
            .write()
            .entry(scope.into())
            .or_default()
            .insert(file.into(), Arc::from(text));
    }

    /// Removes a file, returning whether it existed
    pub fn remove(&self, scope: &ScopePath, file: &str) -> bool {
        let mut packages = self.packages.write();
        match packages.get_mut(scope) {
            Some(files) => files.remove(file).is_some(),
            None => false,
        }
    }
}

impl SourceProvider for InMemorySources {
    fn load(&self, scope: &ScopePath) -> Result<Vec<SourceText>> {
        let packages = self.packages.read();
        Ok(packages
            .get(scope)
            .map(|files| {
                files
                    .iter()
                    .map(|(path, text)| SourceText {
                        path: path.clone(),
                        text: text.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

const FILE_CACHE_CAPACITY: usize = 512;

#[derive(Clone)]
struct CachedFile {
    modified: Option<SystemTime>,
    len: u64,
    text: Arc<str>,
}

/// Package sources read from a Go module on disk
///
/// Import paths inside the main module map to directories under its root.
/// Required modules map into the module cache at
/// `$GOPATH/pkg/mod/<escaped path>@<version>`, honoring `replace` directives.
/// File contents are cached by path and revalidated by modification time
/// and length on every load.
pub struct FsSources {
    root: PathBuf,
    gomod: Option<GoMod>,
    gopath: Option<PathBuf>,
    include_test_files: bool,
    cache: Mutex<LruCache<PathBuf, CachedFile>>,
}

impl FsSources {
    /// Opens the module rooted at `root`, reading `root/go.mod` when present
    pub fn open(root: impl Into<PathBuf>, include_test_files: bool) -> Result<Self> {
        let root = root.into();
        let gomod_path = root.join("go.mod");
        let gomod = match std::fs::read_to_string(&gomod_path) {
            Ok(text) => Some(GoMod::parse(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(Error::io(&gomod_path, &e)),
        };

        debug!(
            root = %root.display(),
            module = gomod.as_ref().map(|m| m.module.as_str()).unwrap_or("<none>"),
            "Opened Go sources"
        );

        Ok(FsSources {
            root,
            gomod,
            gopath: default_gopath(),
            include_test_files,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(FILE_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
        })
    }

    /// Overrides the GOPATH used to find the module cache
    pub fn with_gopath(mut self, gopath: impl Into<PathBuf>) -> Self {
        self.gopath = Some(gopath.into());
        self
    }

    /// The parsed `go.mod`, if the root has one
    pub fn gomod(&self) -> Option<&GoMod> {
        self.gomod.as_ref()
    }

    /// Import path of a directory inside the main module
    pub fn scope_for_dir(&self, dir: &Path) -> Option<ScopePath> {
        let relative = dir.strip_prefix(&self.root).ok()?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let base = match &self.gomod {
            Some(gomod) => gomod.module.clone(),
            None => "main".to_string(),
        };
        if relative.is_empty() {
            Some(ScopePath::new(base))
        } else if self.gomod.is_some() {
            Some(ScopePath::new(format!("{}/{}", base, relative)))
        } else {
            Some(ScopePath::new(relative))
        }
    }

    /// Directory holding the package at `scope`
    pub fn package_dir(&self, scope: &ScopePath) -> Option<PathBuf> {
        let path = scope.as_str();
        let Some(gomod) = &self.gomod else {
            // Without a go.mod, import paths are directories under the root
            return Some(if path == "main" {
                self.root.clone()
            } else {
                self.root.join(path)
            });
        };

        if path_within(path, &gomod.module) {
            return Some(join_rest(&self.root, &path[gomod.module.len()..]));
        }

        if let Some(replace) = gomod.replace_for(path) {
            let rest = &path[replace.path.len()..];
            return match &replace.target {
                ReplaceTarget::Dir(dir) => Some(join_rest(&self.root.join(dir), rest)),
                ReplaceTarget::Module(req) => self.module_cache_dir(&req.path, &req.version, rest),
            };
        }

        let req = gomod.requirement_for(path)?;
        self.module_cache_dir(&req.path, &req.version, &path[req.path.len()..])
    }

    fn module_cache_dir(&self, module: &str, version: &str, rest: &str) -> Option<PathBuf> {
        let gopath = self.gopath.as_ref()?;
        let dir = gopath.join("pkg").join("mod").join(format!(
            "{}@{}",
            escape_module_path(module),
            escape_module_path(version)
        ));
        Some(join_rest(&dir, rest))
    }

    fn is_package_file(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.ends_with(".go") && (self.include_test_files || !name.ends_with("_test.go"))
    }

    /// Reads a file through the cache; the cache lock is never held during the read
    fn read_cached(&self, path: &Path) -> Result<Arc<str>> {
        let meta = std::fs::metadata(path).map_err(|e| Error::io(path, &e))?;
        let modified = meta.modified().ok();
        let len = meta.len();

        if let Some(hit) = self.cache.lock().get(path) {
            if hit.modified == modified && hit.len == len {
                trace!(path = %path.display(), "File cache hit");
                return Ok(hit.text.clone());
            }
        }

        let text: Arc<str> = Arc::from(
            std::fs::read_to_string(path)
                .map_err(|e| Error::io(path, &e))?
                .as_str(),
        );
        self.cache.lock().put(
            path.to_path_buf(),
            CachedFile {
                modified,
                len,
                text: text.clone(),
            },
        );
        Ok(text)
    }
}

impl SourceProvider for FsSources {
    fn load(&self, scope: &ScopePath) -> Result<Vec<SourceText>> {
        let Some(dir) = self.package_dir(scope) else {
            debug!(scope = %scope, "No directory for import path");
            return Ok(Vec::new());
        };

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(scope = %scope, dir = %dir.display(), "Package directory missing");
                return Ok(Vec::new());
            }
            Err(e) => return Err(Error::io(&dir, &e)),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&dir, &e))?;
            let path = entry.path();
            if path.is_file() && self.is_package_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let text = self.read_cached(&path)?;
                Ok(SourceText {
                    path: path.display().to_string(),
                    text,
                })
            })
            .collect()
    }
}

fn join_rest(base: &Path, rest: &str) -> PathBuf {
    rest.split('/')
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |dir, part| dir.join(part))
}

fn default_gopath() -> Option<PathBuf> {
    if let Some(gopath) = std::env::var_os("GOPATH") {
        let first = std::env::split_paths(&gopath).next()?;
        return Some(first);
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join("go"))
}
