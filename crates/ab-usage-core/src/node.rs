//! Editable document tree over a usage event.
//!
//! The editor never touches event fields by name. Instead the event is
//! projected into a tagged [`Node`] tree (scalar / record / map / list),
//! mutations are applied to the tree through [`UsageEvent::apply`], and the
//! typed event is reconstructed from the tree. A failed mutation leaves the
//! event bit-identical, because the tree is a separate copy.
//!
//! Only mutable envelope fields (`id`, `source`, `time`) appear in the
//! tree; `specversion`, `type` and `datacontenttype` are constants and are
//! not editable. Optional string fields surface as empty text (an empty
//! value means "omitted on the wire"), and absent dimension/tag maps
//! surface as empty maps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::coerce::{CoercionError, Scalar};
use crate::event::{Meter, UsageData, UsageEvent};

/// Width at which child value summaries are cut off in editor menus.
const SUMMARY_WIDTH: usize = 50;

/// One node of the editable document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A typed leaf value.
    Scalar(Scalar),
    /// A fixed-shape object; fields cannot be added or removed.
    Record(Vec<(String, Node)>),
    /// An open string-to-string map; entries may be added and removed.
    Map(BTreeMap<String, String>),
    /// An ordered sequence; elements are appended by cloning `template`.
    List {
        /// Current elements.
        items: Vec<Node>,
        /// Blank element cloned on insertion.
        template: Box<Node>,
    },
}

impl Node {
    /// One-line summary of this node's contents, for editor menus.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Scalar(s) => clip(&s.to_string()),
            Self::Record(fields) => {
                let parts: Vec<String> = fields
                    .iter()
                    .filter_map(|(name, child)| match child {
                        Self::Scalar(s) => Some(format!("{name}={s}")),
                        _ => None,
                    })
                    .collect();
                clip(&parts.join(", "))
            }
            Self::Map(entries) => format!("{} entries", entries.len()),
            Self::List { items, .. } => format!("{} items", items.len()),
        }
    }

    /// Borrow the node at `path` relative to this node.
    #[must_use]
    pub fn at(&self, path: &FieldPath) -> Option<&Self> {
        let mut node = self;
        for seg in path.segments() {
            node = match (node, seg) {
                (Self::Record(fields), PathSeg::Name(name)) => fields
                    .iter()
                    .find(|(field, _)| field == name)
                    .map(|(_, child)| child)?,
                (Self::List { items, .. }, PathSeg::Index(i)) => items.get(*i)?,
                _ => return None,
            };
        }
        Some(node)
    }

    fn at_mut(&mut self, path: &[PathSeg], full: &FieldPath) -> Result<&mut Self, EditError> {
        let mut node = self;
        for seg in path {
            node = match (node, seg) {
                (Self::Record(fields), PathSeg::Name(name)) => fields
                    .iter_mut()
                    .find(|(field, _)| field == name)
                    .map(|(_, child)| child)
                    .ok_or_else(|| EditError::UnknownPath { path: full.to_string() })?,
                (Self::List { items, .. }, PathSeg::Index(i)) => items
                    .get_mut(*i)
                    .ok_or_else(|| EditError::UnknownPath { path: full.to_string() })?,
                _ => return Err(EditError::UnknownPath { path: full.to_string() }),
            };
        }
        Ok(node)
    }
}

fn clip(s: &str) -> String {
    if s.len() > SUMMARY_WIDTH {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i < SUMMARY_WIDTH - 3)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &s[..cut])
    } else {
        s.to_string()
    }
}

/// One segment of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    /// A record field or map key.
    Name(String),
    /// A list index.
    Index(usize),
}

/// A path into the document tree, displayed as `data.meters[0].quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath(Vec<PathSeg>);

impl FieldPath {
    /// The empty path, addressing the event itself.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Whether this is the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The path's segments, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[PathSeg] {
        &self.0
    }

    /// Extend the path with a field or key name.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segs = self.0.clone();
        segs.push(PathSeg::Name(name.into()));
        Self(segs)
    }

    /// Extend the path with a list index.
    #[must_use]
    pub fn index(&self, i: usize) -> Self {
        let mut segs = self.0.clone();
        segs.push(PathSeg::Index(i));
        Self(segs)
    }

    fn split_last(&self) -> Option<(&[PathSeg], &PathSeg)> {
        self.0.split_last().map(|(last, init)| (init, last))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(event)");
        }
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                PathSeg::Name(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                PathSeg::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || EditError::InvalidPath { path: s.to_string() };
        let mut segs = Vec::new();
        for part in s.split('.') {
            let mut rest = part;
            let name_end = rest.find('[').unwrap_or(rest.len());
            let name = &rest[..name_end];
            if name.is_empty() {
                return Err(bad());
            }
            segs.push(PathSeg::Name(name.to_string()));
            rest = &rest[name_end..];
            while let Some(stripped) = rest.strip_prefix('[') {
                let close = stripped.find(']').ok_or_else(bad)?;
                let index: usize = stripped[..close].parse().map_err(|_| bad())?;
                segs.push(PathSeg::Index(index));
                rest = &stripped[close + 1..];
            }
            if !rest.is_empty() {
                return Err(bad());
            }
        }
        if segs.is_empty() {
            return Err(bad());
        }
        Ok(Self(segs))
    }
}

/// A single mutation of the document tree.
///
/// Every edit — from either editor mode, or from template overrides — goes
/// through one of these operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    /// Replace the scalar leaf (or map entry) at `path` with the coerced
    /// value of `raw`.
    Set {
        /// Path to the leaf.
        path: FieldPath,
        /// Raw user input, coerced to the leaf's existing kind.
        raw: String,
    },
    /// Append a blank element to the list at `path`.
    InsertListItem {
        /// Path to the list.
        path: FieldPath,
    },
    /// Remove the element at `index` from the list at `path`.
    RemoveListItem {
        /// Path to the list.
        path: FieldPath,
        /// Zero-based element index.
        index: usize,
    },
    /// Insert (or overwrite) `key` in the map at `path`.
    InsertMapEntry {
        /// Path to the map.
        path: FieldPath,
        /// Entry key.
        key: String,
        /// Entry value.
        value: String,
    },
    /// Remove `key` from the map at `path`.
    RemoveMapEntry {
        /// Path to the map.
        path: FieldPath,
        /// Entry key.
        key: String,
    },
}

/// An edit operation could not be applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    /// The raw input did not coerce to the field's kind.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// No field exists at the given path.
    #[error("no such field: {path}")]
    UnknownPath {
        /// The offending path.
        path: String,
    },

    /// The path addresses a container where a single value was expected.
    #[error("{path} is not an editable value")]
    NotScalar {
        /// The offending path.
        path: String,
    },

    /// The path does not address a list.
    #[error("{path} is not a list")]
    NotList {
        /// The offending path.
        path: String,
    },

    /// The path does not address a map.
    #[error("{path} is not a map")]
    NotMap {
        /// The offending path.
        path: String,
    },

    /// A list index is out of range.
    #[error("index {index} is out of range for {path}")]
    IndexOutOfRange {
        /// Path to the list.
        path: String,
        /// The rejected index.
        index: usize,
    },

    /// A map key does not exist.
    #[error("no entry {key:?} in {path}")]
    UnknownKey {
        /// Path to the map.
        path: String,
        /// The missing key.
        key: String,
    },

    /// The path string could not be parsed.
    #[error("invalid field path: {path:?}")]
    InvalidPath {
        /// The rejected path string.
        path: String,
    },

    /// The tree no longer matches the event shape. Editor operations
    /// cannot produce this; it guards the reconstruction step.
    #[error("malformed event document: {0}")]
    Shape(String),
}

impl UsageEvent {
    /// Project the event into its editable document tree.
    #[must_use]
    pub fn to_node(&self) -> Node {
        let d = &self.data;
        Node::Record(vec![
            ("id".into(), text(&self.id)),
            ("source".into(), text(&self.source)),
            ("time".into(), Node::Scalar(Scalar::Timestamp(self.time))),
            (
                "data".into(),
                Node::Record(vec![
                    ("id".into(), text(&d.id)),
                    ("service".into(), text(&d.service)),
                    ("operation".into(), text(&d.operation)),
                    ("resourceId".into(), text(&d.resource_id)),
                    (
                        "usageStart".into(),
                        Node::Scalar(Scalar::Timestamp(d.usage_start)),
                    ),
                    (
                        "usageEnd".into(),
                        Node::Scalar(Scalar::Timestamp(d.usage_end)),
                    ),
                    (
                        "meters".into(),
                        Node::List {
                            items: d.meters.iter().map(meter_node).collect(),
                            template: Box::new(meter_node(&Meter::default())),
                        },
                    ),
                    ("dimensions".into(), map_node(d.dimensions.as_ref())),
                    ("tags".into(), map_node(d.tags.as_ref())),
                    ("tenantId".into(), opt_text(d.tenant_id.as_deref())),
                    ("userId".into(), opt_text(d.user_id.as_deref())),
                    ("projectId".into(), opt_text(d.project_id.as_deref())),
                ]),
            ),
        ])
    }

    /// Apply one edit operation.
    ///
    /// The mutation is made on a projected copy of the event and the event
    /// is rebuilt from it, so any failure leaves `self` unchanged.
    ///
    /// # Errors
    ///
    /// Returns an [`EditError`] when the path does not resolve, the raw
    /// input does not coerce, or a list/map operation targets the wrong
    /// shape.
    pub fn apply(&mut self, op: &EditOp) -> Result<(), EditError> {
        let mut tree = self.to_node();
        apply_to_tree(&mut tree, op)?;
        *self = self.rebuilt_from(&tree)?;
        Ok(())
    }

    /// Reconstruct a typed event from an edited tree, carrying over the
    /// envelope constants from `self`.
    fn rebuilt_from(&self, tree: &Node) -> Result<Self, EditError> {
        let root = record_fields(tree, "event")?;
        let data = record_fields(field(root, "data")?, "data")?;

        let meters = match field(data, "meters")? {
            Node::List { items, .. } => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let m = record_fields(item, "meter")
                        .map_err(|e| EditError::Shape(format!("meters[{i}]: {e}")))?;
                    Ok(Meter {
                        meter_id: take_text(m, "meterId")?,
                        quantity: take_number(m, "quantity")?,
                        unit: take_text(m, "unit")?,
                    })
                })
                .collect::<Result<Vec<_>, EditError>>()?,
            _ => return Err(EditError::Shape("meters is not a list".into())),
        };

        Ok(Self {
            id: take_text(root, "id")?,
            specversion: self.specversion.clone(),
            event_type: self.event_type.clone(),
            source: take_text(root, "source")?,
            time: take_timestamp(root, "time")?,
            datacontenttype: self.datacontenttype.clone(),
            data: UsageData {
                id: take_text(data, "id")?,
                service: take_text(data, "service")?,
                operation: take_text(data, "operation")?,
                resource_id: take_text(data, "resourceId")?,
                usage_start: take_timestamp(data, "usageStart")?,
                usage_end: take_timestamp(data, "usageEnd")?,
                meters,
                dimensions: take_map(data, "dimensions")?,
                tags: take_map(data, "tags")?,
                tenant_id: take_opt_text(data, "tenantId")?,
                user_id: take_opt_text(data, "userId")?,
                project_id: take_opt_text(data, "projectId")?,
            },
        })
    }
}

fn apply_to_tree(tree: &mut Node, op: &EditOp) -> Result<(), EditError> {
    match op {
        EditOp::Set { path, raw } => {
            let (parent_segs, last) = path
                .split_last()
                .ok_or_else(|| EditError::NotScalar { path: path.to_string() })?;
            let parent = tree.at_mut(parent_segs, path)?;
            match (parent, last) {
                (Node::Record(fields), PathSeg::Name(name)) => {
                    let child = fields
                        .iter_mut()
                        .find(|(field, _)| field == name)
                        .map(|(_, child)| child)
                        .ok_or_else(|| EditError::UnknownPath { path: path.to_string() })?;
                    set_scalar(child, raw, path)
                }
                (Node::Map(entries), PathSeg::Name(key)) => {
                    entries.insert(key.clone(), raw.clone());
                    Ok(())
                }
                (Node::List { items, .. }, PathSeg::Index(i)) => {
                    let child = items
                        .get_mut(*i)
                        .ok_or_else(|| EditError::UnknownPath { path: path.to_string() })?;
                    set_scalar(child, raw, path)
                }
                _ => Err(EditError::UnknownPath { path: path.to_string() }),
            }
        }
        EditOp::InsertListItem { path } => match tree.at_mut(path.segments(), path)? {
            Node::List { items, template } => {
                items.push((**template).clone());
                Ok(())
            }
            _ => Err(EditError::NotList { path: path.to_string() }),
        },
        EditOp::RemoveListItem { path, index } => match tree.at_mut(path.segments(), path)? {
            Node::List { items, .. } => {
                if *index < items.len() {
                    items.remove(*index);
                    Ok(())
                } else {
                    Err(EditError::IndexOutOfRange {
                        path: path.to_string(),
                        index: *index,
                    })
                }
            }
            _ => Err(EditError::NotList { path: path.to_string() }),
        },
        EditOp::InsertMapEntry { path, key, value } => {
            match tree.at_mut(path.segments(), path)? {
                Node::Map(entries) => {
                    entries.insert(key.clone(), value.clone());
                    Ok(())
                }
                _ => Err(EditError::NotMap { path: path.to_string() }),
            }
        }
        EditOp::RemoveMapEntry { path, key } => match tree.at_mut(path.segments(), path)? {
            Node::Map(entries) => entries.remove(key).map(drop).ok_or_else(|| {
                EditError::UnknownKey {
                    path: path.to_string(),
                    key: key.clone(),
                }
            }),
            _ => Err(EditError::NotMap { path: path.to_string() }),
        },
    }
}

fn set_scalar(node: &mut Node, raw: &str, path: &FieldPath) -> Result<(), EditError> {
    match node {
        Node::Scalar(current) => {
            *current = Scalar::parse(raw, current.kind())?;
            Ok(())
        }
        _ => Err(EditError::NotScalar { path: path.to_string() }),
    }
}

fn text(s: &str) -> Node {
    Node::Scalar(Scalar::Text(s.to_string()))
}

fn opt_text(s: Option<&str>) -> Node {
    text(s.unwrap_or(""))
}

fn map_node(entries: Option<&BTreeMap<String, String>>) -> Node {
    Node::Map(entries.cloned().unwrap_or_default())
}

fn meter_node(meter: &Meter) -> Node {
    Node::Record(vec![
        ("meterId".into(), text(&meter.meter_id)),
        (
            "quantity".into(),
            Node::Scalar(Scalar::Number(meter.quantity)),
        ),
        ("unit".into(), text(&meter.unit)),
    ])
}

fn record_fields<'a>(node: &'a Node, what: &str) -> Result<&'a [(String, Node)], EditError> {
    match node {
        Node::Record(fields) => Ok(fields),
        _ => Err(EditError::Shape(format!("{what} is not a record"))),
    }
}

fn field<'a>(fields: &'a [(String, Node)], name: &str) -> Result<&'a Node, EditError> {
    fields
        .iter()
        .find(|(field, _)| field == name)
        .map(|(_, node)| node)
        .ok_or_else(|| EditError::Shape(format!("missing field {name}")))
}

fn take_text(fields: &[(String, Node)], name: &str) -> Result<String, EditError> {
    match field(fields, name)? {
        Node::Scalar(Scalar::Text(s)) => Ok(s.clone()),
        _ => Err(EditError::Shape(format!("{name} is not text"))),
    }
}

fn take_opt_text(fields: &[(String, Node)], name: &str) -> Result<Option<String>, EditError> {
    let s = take_text(fields, name)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}

fn take_number(fields: &[(String, Node)], name: &str) -> Result<f64, EditError> {
    match field(fields, name)? {
        Node::Scalar(Scalar::Number(n)) => Ok(*n),
        _ => Err(EditError::Shape(format!("{name} is not a number"))),
    }
}

fn take_timestamp(
    fields: &[(String, Node)],
    name: &str,
) -> Result<chrono::DateTime<chrono::Utc>, EditError> {
    match field(fields, name)? {
        Node::Scalar(Scalar::Timestamp(t)) => Ok(*t),
        _ => Err(EditError::Shape(format!("{name} is not a timestamp"))),
    }
}

fn take_map(
    fields: &[(String, Node)],
    name: &str,
) -> Result<Option<BTreeMap<String, String>>, EditError> {
    match field(fields, name)? {
        Node::Map(entries) => Ok(if entries.is_empty() {
            None
        } else {
            Some(entries.clone())
        }),
        _ => Err(EditError::Shape(format!("{name} is not a map"))),
    }
}
