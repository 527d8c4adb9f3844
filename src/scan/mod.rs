//! Artifact discovery
//!
//! Walks a case directory without depth limit and yields every file that
//! matches a known post-processing convention as an [`ArtifactRef`].
//!
//! # Conventions
//!
//! | Kind | Rule |
//! |------|------|
//! | [`ArtifactKind::Table`] | extension `.dat` |
//! | [`ArtifactKind::SampledLine`] | extension `.xy` |
//! | [`ArtifactKind::Mesh`] | extension `.vtk`/`.vtp` below a mesh output directory |
//!
//! Mesh output directories are recognized by name (`surfaces`, `cuttingPlane`,
//! ...), see [`ScanConfig::mesh_dir_patterns`]. Anything else is skipped
//! silently: a case tree holds plenty of unrelated solver files.
//!
//! # Example
//!
//! ```rust,ignore
//! use ofpost_rs::scan::{Scanner, ScanConfig};
//!
//! for artifact in Scanner::new("cavity", &ScanConfig::default())? {
//!     println!("{:?} {}", artifact.kind, artifact.path.display());
//! }
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{PostError, PostResult};

// =================================================================================================
// Artifact identity
// =================================================================================================

/// Closed set of artifact kinds; selects the parser and the default rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// Surface / slice polygonal data (`.vtk`, `.vtp`)
    Mesh,
    /// Tabular time series (`.dat`)
    Table,
    /// Sampled line data (`.xy`)
    SampledLine,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Mesh => "mesh",
            ArtifactKind::Table => "table",
            ArtifactKind::SampledLine => "sampled-line",
        };
        f.write_str(name)
    }
}

/// One discovered output unit
///
/// The layout follows the solver's `postProcessing/<function>/<time>/<file>`
/// convention: when the parent directory name is a number it is taken as the
/// time directory and the directory above it becomes the group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    /// Absolute path of the file
    pub path: PathBuf,

    /// Inferred kind
    pub kind: ArtifactKind,

    /// Name of the group directory (the function object), used for titles
    pub logical_name: String,

    /// File name without extension
    pub stem: String,

    /// Numeric time directory the file lives in, if any
    pub time_dir: Option<String>,

    /// Group directory relative to the case root
    pub group_dir: PathBuf,

    /// Another artifact in the same directory has the same stem
    pub stem_shared: bool,
}

impl ArtifactRef {
    /// Build a reference for `path` found below `root`
    pub fn from_path(root: &Path, path: &Path, kind: ArtifactKind) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let parent = path.parent().unwrap_or(root);
        let parent_name = parent
            .file_name()
            .map(|s| s.to_string_lossy().into_owned());

        let (time_dir, group) = match parent_name {
            Some(name) if parent != root && is_time_name(&name) => {
                (Some(name), parent.parent().unwrap_or(root))
            }
            _ => (None, parent),
        };

        let group_dir = group.strip_prefix(root).unwrap_or(Path::new("")).to_path_buf();
        let logical_name = if group_dir.as_os_str().is_empty() {
            stem.clone()
        } else {
            group
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| stem.clone())
        };

        Self {
            path: path.to_path_buf(),
            kind,
            logical_name,
            stem,
            time_dir,
            group_dir,
            stem_shared: false,
        }
    }

    /// File extension, lower case
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    /// Time value of the time directory, if the file lives in one
    pub fn time_value(&self) -> Option<f64> {
        self.time_dir.as_deref().and_then(|t| t.parse::<f64>().ok())
    }

    /// Key shared by the time steps of one logical artifact
    pub fn series_key(&self) -> (ArtifactKind, PathBuf, String, String) {
        (self.kind, self.group_dir.clone(), self.stem.clone(), self.extension())
    }
}

/// A directory name is a time directory when it parses as a finite number
fn is_time_name(name: &str) -> bool {
    name.parse::<f64>().map(|t| t.is_finite()).unwrap_or(false)
}

// =================================================================================================
// Configuration
// =================================================================================================

/// Scan conventions
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Directory name prefixes (case-insensitive) that mark mesh outputs
    pub mesh_dir_patterns: Vec<String>,

    /// File name fragments (case-insensitive) that are never artifacts
    pub exclusions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mesh_dir_patterns: [
                "surfaces",
                "cuttingPlane",
                "slice",
                "plane",
                "isoSurface",
                "patchSurface",
                "sampledSurface",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            exclusions: vec!["cloud".to_string()],
        }
    }
}

impl ScanConfig {
    /// Builder pattern: add a mesh directory pattern
    pub fn mesh_dir(mut self, pattern: impl Into<String>) -> Self {
        self.mesh_dir_patterns.push(pattern.into());
        self
    }

    /// Builder pattern: add a file name exclusion
    pub fn exclude(mut self, fragment: impl Into<String>) -> Self {
        self.exclusions.push(fragment.into());
        self
    }

    fn is_mesh_dir(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.mesh_dir_patterns
            .iter()
            .any(|p| name.starts_with(&p.to_lowercase()))
    }

    fn is_excluded(&self, file_name: &str) -> bool {
        let name = file_name.to_lowercase();
        self.exclusions.iter().any(|e| name.contains(&e.to_lowercase()))
    }

    /// Classify a file found below `root`; `None` means "not an artifact"
    pub fn classify(&self, root: &Path, path: &Path) -> Option<ArtifactKind> {
        let file_name = path.file_name()?.to_string_lossy();
        if self.is_excluded(&file_name) {
            return None;
        }

        let ext = path.extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "dat" => Some(ArtifactKind::Table),
            "xy" => Some(ArtifactKind::SampledLine),
            "vtk" | "vtp" => {
                let relative = path.parent()?.strip_prefix(root).ok()?;
                relative
                    .components()
                    .any(|c| self.is_mesh_dir(&c.as_os_str().to_string_lossy()))
                    .then_some(ArtifactKind::Mesh)
            }
            _ => None,
        }
    }
}

// =================================================================================================
// Scanner
// =================================================================================================

/// Lazy, depth-first walk over a case root
///
/// Only the entries of the directory currently being listed are held in
/// memory. Entries are visited in name order so two scans of the same tree
/// yield the same sequence. A new `Scanner` restarts the walk.
pub struct Scanner {
    root: PathBuf,
    config: ScanConfig,
    dirs: Vec<PathBuf>,
    files: VecDeque<ArtifactRef>,
}

impl Scanner {
    /// Start a scan of `root`
    ///
    /// # Errors
    ///
    /// `Io` if `root` does not exist or is not a directory.
    pub fn new(root: impl AsRef<Path>, config: &ScanConfig) -> PostResult<Self> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| PostError::io(root, e))?;
        if !root.is_dir() {
            return Err(PostError::io(
                &root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "case root is not a directory"),
            ));
        }

        Ok(Self {
            dirs: vec![root.clone()],
            root,
            config: config.clone(),
            files: VecDeque::new(),
        })
    }

    /// Canonical case root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List one directory: queue its artifacts, push its sub-directories
    fn expand(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read directory {}: {}", dir.display(), e);
                return;
            }
        };

        let mut listed: Vec<(PathBuf, fs::FileType)> = entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_type().ok().map(|ty| (e.path(), ty)))
            .collect();
        listed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut subdirs = Vec::new();
        let mut artifacts = Vec::new();
        for (path, ty) in listed {
            if ty.is_dir() {
                subdirs.push(path);
            } else if ty.is_symlink() && path.is_dir() {
                debug!("not following directory link {}", path.display());
            } else {
                match self.config.classify(&self.root, &path) {
                    Some(kind) => artifacts.push(ArtifactRef::from_path(&self.root, &path, kind)),
                    None => debug!("skipping {}", path.display()),
                }
            }
        }

        let mut stems: HashMap<String, usize> = HashMap::new();
        for artifact in &artifacts {
            *stems.entry(artifact.stem.clone()).or_default() += 1;
        }
        for mut artifact in artifacts {
            artifact.stem_shared = stems.get(&artifact.stem).is_some_and(|&n| n > 1);
            self.files.push_back(artifact);
        }

        // reversed so the stack pops them in name order
        self.dirs.extend(subdirs.into_iter().rev());
    }
}

impl Iterator for Scanner {
    type Item = ArtifactRef;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(artifact) = self.files.pop_front() {
                return Some(artifact);
            }

            let dir = self.dirs.pop()?;
            self.expand(&dir);
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
