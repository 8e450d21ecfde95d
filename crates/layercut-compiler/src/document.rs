//! Typed document model
//!
//! An SVG file is parsed once into a tree of [`Element`]s. Layer markers,
//! labels, transforms and geometry are all resolved here so later stages
//! never look at attribute strings.

use crate::error::DocumentError;
use crate::path::Path;
use lyon::geom::{point, Box2D, Transform};
use roxmltree::Node;
use std::str::FromStr;
use svgtypes::{Length, LengthUnit, PointsParser, ViewBox};

/// Inkscape namespace, carrier of the layer marker and label
pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";

/// Affine transform in document space
pub type Affine = Transform<f64>;

/// Elements that never render on their own
const NON_RENDERED: &[&str] = &[
    "defs", "metadata", "symbol", "clipPath", "mask", "marker", "pattern",
];

/// A parsed document: root children plus the root's size information
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    size: DocumentSize,
    children: Vec<Element>,
}

/// One node of the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Group(Group),
    Path(PathElement),
    Other(OtherElement),
}

/// A `<g>` element, possibly an Inkscape layer
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: Option<String>,
    pub label: Option<String>,
    pub is_layer: bool,
    pub transform: Affine,
    pub children: Vec<Element>,
}

/// A drawable element converted to path commands
#[derive(Debug, Clone, PartialEq)]
pub struct PathElement {
    /// `id` attribute, or `path#N` by document order
    pub id: String,
    pub path: Path,
    pub transform: Affine,
}

/// Any other element; only traversed
#[derive(Debug, Clone, PartialEq)]
pub struct OtherElement {
    pub tag: String,
    pub transform: Affine,
    pub children: Vec<Element>,
}

/// Size information of the root `<svg>` element
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DocumentSize {
    pub width: Option<Length>,
    pub height: Option<Length>,
    pub view_box: Option<ViewBox>,
}

impl Group {
    /// The layer label, if this group is a labelled layer
    pub fn layer_label(&self) -> Option<&str> {
        if self.is_layer {
            self.label.as_deref()
        } else {
            None
        }
    }
}

impl Element {
    /// Local transform of this element
    pub fn transform(&self) -> &Affine {
        match self {
            Self::Group(group) => &group.transform,
            Self::Path(path) => &path.transform,
            Self::Other(other) => &other.transform,
        }
    }

    /// Child elements (empty for paths)
    pub fn children(&self) -> &[Element] {
        match self {
            Self::Group(group) => &group.children,
            Self::Path(_) => &[],
            Self::Other(other) => &other.children,
        }
    }
}

impl DocumentSize {
    /// Millimetres per document user unit.
    ///
    /// An absolute `width` with a `viewBox` gives `width_mm / viewBox.w`.
    /// An absolute `width` without a `viewBox` means user units are CSS
    /// pixels. Otherwise one user unit is one millimetre.
    pub fn user_unit_mm(&self) -> f64 {
        let width_mm = self.width.and_then(length_mm);
        match (width_mm, self.view_box) {
            (Some(width_mm), Some(view_box)) if view_box.w > 0.0 => width_mm / view_box.w,
            (Some(_), _) => 25.4 / 96.0,
            (None, _) => 1.0,
        }
    }

    /// Document extents in user units: the `viewBox`, or else `width` and
    /// `height` anchored at the origin. `None` when neither is usable.
    pub fn extents(&self) -> Option<Box2D<f64>> {
        if let Some(vb) = self.view_box {
            if vb.w > 0.0 && vb.h > 0.0 {
                return Some(Box2D::new(point(vb.x, vb.y), point(vb.x + vb.w, vb.y + vb.h)));
            }
        }

        let width = self.length_in_user_units(self.width?)?;
        let height = self.length_in_user_units(self.height?)?;
        if width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite() {
            Some(Box2D::new(point(0.0, 0.0), point(width, height)))
        } else {
            None
        }
    }

    fn length_in_user_units(&self, length: Length) -> Option<f64> {
        match length.unit {
            LengthUnit::None => Some(length.number),
            _ => length_mm(length).map(|mm| mm / self.user_unit_mm()),
        }
    }
}

/// Absolute length in millimetres; `None` for relative units
fn length_mm(length: Length) -> Option<f64> {
    let factor = match length.unit {
        LengthUnit::Mm => 1.0,
        LengthUnit::Cm => 10.0,
        LengthUnit::In => 25.4,
        LengthUnit::Pt => 25.4 / 72.0,
        LengthUnit::Pc => 25.4 / 6.0,
        LengthUnit::Px => 25.4 / 96.0,
        _ => return None,
    };
    Some(length.number * factor)
}

impl Document {
    /// Build a document directly from elements
    pub fn new(size: DocumentSize, children: Vec<Element>) -> Self {
        Self { size, children }
    }

    /// Parse SVG text
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let xml = roxmltree::Document::parse(text).map_err(|e| DocumentError::Xml(e.to_string()))?;
        let root = xml.root_element();
        if root.tag_name().name() != "svg" {
            return Err(DocumentError::NotSvg(root.tag_name().name().to_string()));
        }

        let size = DocumentSize {
            width: root.attribute("width").and_then(|v| Length::from_str(v).ok()),
            height: root.attribute("height").and_then(|v| Length::from_str(v).ok()),
            view_box: root.attribute("viewBox").and_then(|v| ViewBox::from_str(v).ok()),
        };

        let mut parser = TreeParser {
            xml: &xml,
            geometry_count: 0,
        };
        let children = parser.parse_children(root, true)?;

        tracing::debug!(
            "Parsed document: {} top-level elements, {} drawable",
            children.len(),
            parser.geometry_count
        );
        Ok(Self { size, children })
    }

    /// Root size information
    pub fn size(&self) -> &DocumentSize {
        &self.size
    }

    /// Top-level elements in document order
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Labels of every layer in document order (duplicates kept)
    pub fn layer_labels(&self) -> Vec<&str> {
        fn walk<'a>(elements: &'a [Element], out: &mut Vec<&'a str>) {
            for element in elements {
                if let Element::Group(group) = element {
                    if let Some(label) = group.layer_label() {
                        out.push(label);
                    }
                }
                walk(element.children(), out);
            }
        }

        let mut labels = Vec::new();
        walk(&self.children, &mut labels);
        labels
    }
}

struct TreeParser<'a, 'input> {
    xml: &'a roxmltree::Document<'input>,
    geometry_count: usize,
}

impl TreeParser<'_, '_> {
    fn parse_children(
        &mut self,
        node: Node,
        parent_visible: bool,
    ) -> Result<Vec<Element>, DocumentError> {
        let mut elements = Vec::new();
        for child in node.children().filter(|n| n.is_element()) {
            if let Some(element) = self.parse_element(child, parent_visible)? {
                elements.push(element);
            }
        }
        Ok(elements)
    }

    fn parse_element(
        &mut self,
        node: Node,
        parent_visible: bool,
    ) -> Result<Option<Element>, DocumentError> {
        let tag = node.tag_name().name();
        if NON_RENDERED.contains(&tag) || style_value(node, "display") == Some("none") {
            return Ok(None);
        }

        let visible = match style_value(node, "visibility") {
            Some("hidden") | Some("collapse") => false,
            Some("visible") => true,
            _ => parent_visible,
        };

        let transform = match node.attribute("transform") {
            Some(value) => {
                let t = svgtypes::Transform::from_str(value).map_err(|e| {
                    DocumentError::Transform {
                        element: self.describe(node),
                        reason: e.to_string(),
                    }
                })?;
                Affine::new(t.a, t.b, t.c, t.d, t.e, t.f)
            }
            None => Affine::identity(),
        };

        let element = match tag {
            "g" => Element::Group(Group {
                id: node.attribute("id").map(str::to_string),
                label: node.attribute((INKSCAPE_NS, "label")).map(str::to_string),
                is_layer: node.attribute((INKSCAPE_NS, "groupmode")) == Some("layer"),
                transform,
                children: self.parse_children(node, visible)?,
            }),
            "path" | "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" => {
                self.geometry_count += 1;
                if !visible {
                    return Ok(None);
                }
                let Some(path) = self.parse_geometry(node, tag)? else {
                    return Ok(None);
                };
                let id = node
                    .attribute("id")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("path#{}", self.geometry_count));
                Element::Path(PathElement {
                    id,
                    path,
                    transform,
                })
            }
            _ => Element::Other(OtherElement {
                tag: tag.to_string(),
                transform,
                children: self.parse_children(node, visible)?,
            }),
        };

        Ok(Some(element))
    }

    fn parse_geometry(&self, node: Node, tag: &str) -> Result<Option<Path>, DocumentError> {
        let shape_error = |reason: String| DocumentError::Shape {
            element: self.describe(node),
            reason,
        };
        let number = |name: &str| -> Result<f64, DocumentError> {
            match node.attribute(name).map(str::trim) {
                None | Some("") | Some("auto") => Ok(0.0),
                Some(value) => Length::from_str(value)
                    .map(|length| length.number)
                    .map_err(|e| shape_error(format!("{}: {}", name, e))),
            }
        };

        let path = match tag {
            "path" => Some(
                Path::parse(node.attribute("d").unwrap_or_default()).map_err(|reason| {
                    DocumentError::PathData {
                        element: self.describe(node),
                        reason,
                    }
                })?,
            ),
            "rect" => Path::rect(
                number("x")?,
                number("y")?,
                number("width")?,
                number("height")?,
                number("rx")?,
                number("ry")?,
            ),
            "circle" => {
                let r = number("r")?;
                Path::ellipse(number("cx")?, number("cy")?, r, r)
            }
            "ellipse" => Path::ellipse(number("cx")?, number("cy")?, number("rx")?, number("ry")?),
            "line" => Some(Path::line(
                number("x1")?,
                number("y1")?,
                number("x2")?,
                number("y2")?,
            )),
            "polyline" | "polygon" => {
                let points: Vec<(f64, f64)> =
                    PointsParser::from(node.attribute("points").unwrap_or_default()).collect();
                if points.len() < 2 {
                    None
                } else if tag == "polygon" {
                    Some(Path::polygon(&points))
                } else {
                    Some(Path::polyline(&points))
                }
            }
            _ => None,
        };

        Ok(path)
    }

    fn describe(&self, node: Node) -> String {
        let tag = node.tag_name().name();
        match node.attribute("id") {
            Some(id) => format!("<{}> '{}'", tag, id),
            None => {
                let pos = self.xml.text_pos_at(node.range().start);
                format!("<{}> at line {}", tag, pos.row)
            }
        }
    }
}

/// Look up a presentation property either as an attribute or inside `style`
fn style_value<'a>(node: Node<'a, '_>, key: &str) -> Option<&'a str> {
    if let Some(style) = node.attribute("style") {
        for declaration in style.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                if name.trim() == key {
                    return Some(value.trim());
                }
            }
        }
    }
    node.attribute(key).map(str::trim)
}
