//! Layer boundary lint for the `timetable` crate.
//!
//! `backend/src` is split into `domain` (grid model, services, ports),
//! `inbound` (Actix handlers) and `outbound` (repositories and the access
//! policy). Each layer has a [`LayerRule`] naming the sibling layers and
//! external crates it may not touch. The domain additionally may not read
//! the wall clock directly; services receive a `mockable::Clock` instead.
//!
//! Paths are matched in `crate::`, `self::`/`super::` and `timetable::`
//! form, in `use` items as well as inline expressions and types.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;
use thiserror::Error;

/// Name under which integration code refers to the linted crate.
pub const CRATE_NAME: &str = "timetable";

const WEB_CRATES: &[&str] = &[
    "actix",
    "actix_http",
    "actix_service",
    "actix_session",
    "actix_web",
    "awc",
];
const DATABASE_CRATES: &[&str] = &["bb8", "diesel", "diesel_async", "diesel_migrations"];
const OPENAPI_CRATES: &[&str] = &["utoipa", "utoipa_swagger_ui"];

/// Wall-clock readers the domain must reach through `mockable::Clock`.
const WALL_CLOCK_TYPES: &[&str] = &["Utc", "Local", "SystemTime"];

/// A top-level module of `backend/src` that carries boundary rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Domain,
    Inbound,
    Outbound,
}

impl Layer {
    const ALL: [Self; 3] = [Self::Domain, Self::Inbound, Self::Outbound];

    /// Module name as it appears in paths.
    #[must_use]
    pub const fn module(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn from_module(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|layer| layer.module() == name)
    }

    /// Layer owning a path relative to `backend/src`.
    #[must_use]
    pub fn of_file(relative: &Path) -> Option<Self> {
        let first = relative.components().next()?;
        Self::from_module(&first.as_os_str().to_string_lossy())
    }

    /// Boundary rule applied to files in this layer.
    #[must_use]
    pub const fn rule(self) -> LayerRule {
        match self {
            Self::Domain => LayerRule {
                forbidden_layers: &[Self::Inbound, Self::Outbound],
                forbidden_crates: &[WEB_CRATES, DATABASE_CRATES, OPENAPI_CRATES],
                wall_clock: false,
            },
            Self::Inbound => LayerRule {
                forbidden_layers: &[Self::Outbound],
                forbidden_crates: &[DATABASE_CRATES],
                wall_clock: true,
            },
            Self::Outbound => LayerRule {
                forbidden_layers: &[Self::Inbound],
                forbidden_crates: &[WEB_CRATES, OPENAPI_CRATES],
                wall_clock: true,
            },
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module())
    }
}

/// What one layer may not reference.
#[derive(Debug, Clone, Copy)]
pub struct LayerRule {
    pub forbidden_layers: &'static [Layer],
    pub forbidden_crates: &'static [&'static [&'static str]],
    /// Whether `Utc::now()` and friends may be called directly.
    pub wall_clock: bool,
}

impl LayerRule {
    fn forbids_crate(&self, root: &str) -> bool {
        self.forbidden_crates
            .iter()
            .any(|group| group.contains(&root))
    }
}

/// The kind of boundary breach found in a file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Error)]
pub enum Finding {
    #[error("{from} module must not depend on crate::{to}")]
    LayerDependency { from: Layer, to: Layer },
    #[error("{layer} module must not depend on external crate `{krate}`")]
    ForbiddenCrate { layer: Layer, krate: String },
    #[error("{layer} module must read time through mockable::Clock, not `{call}`")]
    WallClock { layer: Layer, call: String },
}

/// A single breach, tied to the file it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: PathBuf,
    pub finding: Finding,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.finding)
    }
}

/// Failure modes of a lint run.
#[derive(Debug, Error)]
pub enum ArchitectureLintError {
    #[error("I/O error while linting architecture: {0}")]
    Io(#[from] io::Error),
    #[error("{} is not under domain, inbound or outbound", .0.display())]
    UnknownLayer(PathBuf),
    #[error("failed to parse {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },
    #[error("architecture boundary violations:\n{}", render_violations(.0))]
    Violations(Vec<Violation>),
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| format!("- {violation}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    pub contents: String,
}

/// Lint every layered file under `backend_dir/src`.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let sources = collect_layer_sources(&backend_dir.join("src"))?;
    lint_sources(&sources)
}

/// Lint in-memory sources. Every file must belong to a layer.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let layer = Layer::of_file(&source.file)
            .ok_or_else(|| ArchitectureLintError::UnknownLayer(source.file.clone()))?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        violations.extend(
            findings(layer, &parsed)
                .into_iter()
                .map(|finding| Violation {
                    file: source.file.clone(),
                    finding,
                }),
        );
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

fn findings(layer: Layer, parsed: &syn::File) -> BTreeSet<Finding> {
    let rule = layer.rule();
    let mut references = References::default();
    references.visit_file(parsed);

    let mut found = BTreeSet::new();
    for path in &references.paths {
        if let Some(to) = referenced_layer(path)
            && rule.forbidden_layers.contains(&to)
        {
            found.insert(Finding::LayerDependency { from: layer, to });
        }
        if let Some(root) = external_root(path)
            && rule.forbids_crate(root)
        {
            found.insert(Finding::ForbiddenCrate {
                layer,
                krate: root.to_owned(),
            });
        }
        if !rule.wall_clock
            && let Some(call) = wall_clock_call(path)
        {
            found.insert(Finding::WallClock { layer, call });
        }
    }
    found
}

fn is_relative(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

/// The layer a path points into, if it names one.
fn referenced_layer(path: &[String]) -> Option<Layer> {
    let mut segments = path.iter().map(String::as_str).peekable();
    match segments.peek().copied()? {
        root if root == CRATE_NAME => {
            segments.next();
        }
        root if is_relative(root) => {
            while segments.next_if(|segment| is_relative(segment)).is_some() {}
        }
        _ => {}
    }
    segments.next().and_then(Layer::from_module)
}

fn external_root(path: &[String]) -> Option<&str> {
    let root = path.first()?.as_str();
    (!is_relative(root) && root != CRATE_NAME && Layer::from_module(root).is_none())
        .then_some(root)
}

fn wall_clock_call(path: &[String]) -> Option<String> {
    match path {
        [.., owner, method] if method == "now" && WALL_CLOCK_TYPES.contains(&owner.as_str()) => {
            Some(format!("{owner}::now"))
        }
        _ => None,
    }
}

/// Every path named in a file, with `use` trees flattened.
#[derive(Default)]
struct References {
    paths: BTreeSet<Vec<String>>,
}

fn flatten_use(tree: &syn::UseTree, prefix: &[String], out: &mut BTreeSet<Vec<String>>) {
    let extend = |leaf: String| {
        let mut path = prefix.to_vec();
        path.push(leaf);
        path
    };
    match tree {
        syn::UseTree::Path(node) => flatten_use(&node.tree, &extend(node.ident.to_string()), out),
        syn::UseTree::Name(node) => {
            out.insert(extend(node.ident.to_string()));
        }
        syn::UseTree::Rename(node) => {
            out.insert(extend(node.ident.to_string()));
        }
        syn::UseTree::Glob(_) => {
            out.insert(extend("*".to_owned()));
        }
        syn::UseTree::Group(group) => {
            for item in &group.items {
                flatten_use(item, prefix, out);
            }
        }
    }
}

impl<'ast> Visit<'ast> for References {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let path: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        if !path.is_empty() {
            self.paths.insert(path);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        flatten_use(&node.tree, &[], &mut self.paths);
    }
}

/// Read every `.rs` file below the layer directories, sorted by path.
fn collect_layer_sources(src_dir: &Path) -> Result<Vec<LintSource>, ArchitectureLintError> {
    let mut pending: Vec<PathBuf> = Layer::ALL
        .into_iter()
        .map(|layer| src_dir.join(layer.module()))
        .filter(|dir| dir.is_dir())
        .collect();
    let mut sources = Vec::new();

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                let contents = fs::read_to_string(&path)?;
                let file = path
                    .strip_prefix(src_dir)
                    .map_or_else(|_| path.clone(), Path::to_path_buf);
                sources.push(LintSource { file, contents });
            }
        }
    }

    sources.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(sources)
}
