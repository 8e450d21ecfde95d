//! Layer selection
//!
//! Walks the document depth-first and collects the paths in scope for one
//! compilation, together with the transform that maps each path into
//! document root space.

use crate::document::{Affine, Document, Element};
use crate::path::Path;

/// Outcome of a layer lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerMatch {
    /// No layer was requested; every path is in scope
    WholeDocument,
    /// At least one layer carried the requested label
    Found { layer: String, count: usize },
    /// No layer carried the requested label
    NotFound { layer: String },
}

impl LayerMatch {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The requested label, if any
    pub fn layer(&self) -> Option<&str> {
        match self {
            Self::WholeDocument => None,
            Self::Found { layer, .. } | Self::NotFound { layer } => Some(layer.as_str()),
        }
    }
}

/// A path selected for compilation
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPath<'a> {
    pub id: &'a str,
    pub path: &'a Path,
    /// Accumulated transform into document root space
    pub transform: Affine,
}

/// Paths in scope, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'a> {
    pub outcome: LayerMatch,
    pub paths: Vec<SelectedPath<'a>>,
}

/// Select the paths of `layer` (trimmed, matched exactly), or of the whole
/// document when `layer` is `None`.
///
/// Inside a matching layer every descendant path is taken, nested layers
/// included. Outside, layers with another label are skipped along with
/// their subtree while plain groups are searched.
pub fn select_paths<'a>(document: &'a Document, layer: Option<&str>) -> Selection<'a> {
    let wanted = layer.map(str::trim).filter(|l| !l.is_empty());

    let mut walker = Walker {
        wanted,
        matches: 0,
        paths: Vec::new(),
    };
    walker.walk(document.children(), &Affine::identity(), wanted.is_none());

    let outcome = match wanted {
        None => LayerMatch::WholeDocument,
        Some(layer) if walker.matches > 0 => LayerMatch::Found {
            layer: layer.to_string(),
            count: walker.matches,
        },
        Some(layer) => LayerMatch::NotFound {
            layer: layer.to_string(),
        },
    };

    tracing::debug!("Layer selection {:?}: {} paths", outcome, walker.paths.len());
    Selection {
        outcome,
        paths: walker.paths,
    }
}

struct Walker<'a, 'w> {
    wanted: Option<&'w str>,
    matches: usize,
    paths: Vec<SelectedPath<'a>>,
}

impl<'a> Walker<'a, '_> {
    fn walk(&mut self, elements: &'a [Element], parent: &Affine, collecting: bool) {
        for element in elements {
            // Child transform applies first, then the parent's
            let transform = element.transform().then(parent);

            match element {
                Element::Path(path) => {
                    if collecting {
                        self.paths.push(SelectedPath {
                            id: &path.id,
                            path: &path.path,
                            transform,
                        });
                    }
                }
                Element::Group(group) if !collecting => match group.layer_label() {
                    Some(label) if Some(label) == self.wanted => {
                        self.matches += 1;
                        self.walk(&group.children, &transform, true);
                    }
                    Some(_) => {}
                    None => self.walk(&group.children, &transform, false),
                },
                Element::Group(group) => self.walk(&group.children, &transform, true),
                Element::Other(other) => self.walk(&other.children, &transform, collecting),
            }
        }
    }
}
