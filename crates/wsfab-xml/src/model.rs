//! The XML document model (C5): an arena of elements addressed by `NodeId`,
//! with `parent` as a plain lookup rather than an owning pointer — spec.md
//! §9's "raw pointer graphs with weak back-refs" REDESIGN FLAG, resolved by
//! indexing into `XmlMessage::arena` instead of reference counting.

use crate::error::XmlErrorState;
use wsfab_charset::OutputEncoding;

/// Index into `XmlMessage::arena`. Never an owning pointer: the arena owns
/// every element, and `NodeId` is only ever compared/looked-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// The XDT data-type group of `XmlDataType` (spec.md §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum XdtKind {
    #[default]
    String,
    Integer,
    Boolean,
    Double,
    Base64,
    DateTime,
    Cdata,
    Complex,
}

/// The WSDL cardinality group of `XmlDataType` (spec.md §3.1). `None` means
/// no cardinality bit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Mandatory,
    Optional,
    ZeroOne,
    OnceOnly,
    ZeroMany,
    OneMany,
}

/// The WSDL ordering group of `XmlDataType` (spec.md §3.1). `None` means
/// "all" (neither bit set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    Choice,
    Sequence,
}

/// `XmlDataType` as three orthogonal enums folded into one struct, per
/// spec.md §9's guidance to avoid a single packed bitfield in a statically
/// typed language. `to_wsdl_bits`/`from_wsdl_bits` exist only at the
/// doc/test boundary; nothing in this workspace reads a packed integer off
/// the wire (no consumer needs it — the WSDL generator reads the struct
/// fields directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XmlDataType {
    pub kind: XdtKind,
    pub cardinality: Option<Cardinality>,
    pub ordering: Option<Ordering>,
}

impl XmlDataType {
    pub fn new(kind: XdtKind) -> Self {
        Self { kind, cardinality: None, ordering: None }
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = Some(cardinality);
        self
    }

    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    /// Bit-packs into the documented layout: bits 0-3 kind, bits 4-6
    /// cardinality (0 = unset), bit 7 ordering (0 = all, 1 = choice, 2 =
    /// sequence packed in bits 7-8). Test/documentation boundary only.
    pub fn to_wsdl_bits(self) -> u16 {
        let kind_bits = match self.kind {
            XdtKind::String => 0,
            XdtKind::Integer => 1,
            XdtKind::Boolean => 2,
            XdtKind::Double => 3,
            XdtKind::Base64 => 4,
            XdtKind::DateTime => 5,
            XdtKind::Cdata => 6,
            XdtKind::Complex => 7,
        };
        let cardinality_bits = match self.cardinality {
            None => 0,
            Some(Cardinality::Mandatory) => 1,
            Some(Cardinality::Optional) => 2,
            Some(Cardinality::ZeroOne) => 3,
            Some(Cardinality::OnceOnly) => 4,
            Some(Cardinality::ZeroMany) => 5,
            Some(Cardinality::OneMany) => 6,
        };
        let ordering_bits = match self.ordering {
            None => 0,
            Some(Ordering::Choice) => 1,
            Some(Ordering::Sequence) => 2,
        };
        kind_bits | (cardinality_bits << 4) | (ordering_bits << 7)
    }

    pub fn from_wsdl_bits(bits: u16) -> Self {
        let kind = match bits & 0xF {
            0 => XdtKind::String,
            1 => XdtKind::Integer,
            2 => XdtKind::Boolean,
            3 => XdtKind::Double,
            4 => XdtKind::Base64,
            5 => XdtKind::DateTime,
            6 => XdtKind::Cdata,
            _ => XdtKind::Complex,
        };
        let cardinality = match (bits >> 4) & 0x7 {
            1 => Some(Cardinality::Mandatory),
            2 => Some(Cardinality::Optional),
            3 => Some(Cardinality::ZeroOne),
            4 => Some(Cardinality::OnceOnly),
            5 => Some(Cardinality::ZeroMany),
            6 => Some(Cardinality::OneMany),
            _ => None,
        };
        let ordering = match (bits >> 7) & 0x3 {
            1 => Some(Ordering::Choice),
            2 => Some(Ordering::Sequence),
            _ => None,
        };
        Self { kind, cardinality, ordering }
    }
}

/// An element attribute. Attribute names are unique per element within the
/// same namespace (spec.md §3.1's invariant); enforcement lives in
/// `XmlMessage::set_attribute`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// One arena-owned element. `parent`/`children` are `NodeId` lookups into
/// the owning `XmlMessage::arena`, never pointers; `restriction` is a
/// by-name lookup into a shared `XmlRestrictions` table (spec.md §3.1:
/// "elements never own restrictions").
#[derive(Debug, Clone, Default)]
pub struct XmlElementData {
    pub namespace: String,
    pub name: String,
    pub data_type: XmlDataType,
    pub value: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub restriction: Option<String>,
}

impl XmlElementData {
    /// Returns the element name qualified by namespace prefix, e.g. `s:Body`.
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.namespace, self.name)
        }
    }
}

/// Whitespace handling policy for text content (spec.md §3.2, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespaceMode {
    #[default]
    Preserve,
    Collapse,
}

/// A single XML document: arena of elements plus document-level fields
/// (spec.md §3.2).
#[derive(Debug, Clone, Default)]
pub struct XmlMessage {
    arena: Vec<XmlElementData>,
    pub root: Option<NodeId>,
    pub version: String,
    pub standalone: bool,
    pub encoding: OutputEncoding,
    pub condensed: bool,
    pub send_bom: bool,
    pub whitespace_mode: WhitespaceMode,
    pub print_restrictions: bool,
    pub error: XmlErrorState,
}

impl XmlMessage {
    pub fn new() -> Self {
        Self { version: "1.0".to_string(), ..Default::default() }
    }

    /// Allocates a new, parentless element in the arena and returns its id.
    pub fn new_element(&mut self, namespace: impl Into<String>, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.arena.len() as u32);
        self.arena.push(XmlElementData {
            namespace: namespace.into(),
            name: name.into(),
            data_type: XmlDataType::default(),
            value: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
            restriction: None,
        });
        id
    }

    /// Allocates an element with a string value and appends it as a child
    /// of `parent`, for the common case of leaf elements.
    pub fn add_element(
        &mut self,
        parent: NodeId,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let id = self.new_element(namespace, name);
        self.get_mut(id).value = value.into();
        self.append_child(parent, id);
        id
    }

    /// Appends `child` to `parent.children`, rebinding `child.parent`.
    /// Always inserts — duplicate names are permitted (spec.md §4.7's
    /// `AddElement` semantics).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.get_mut(child).parent = Some(parent);
        self.get_mut(parent).children.push(child);
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = Some(root);
    }

    pub fn get(&self, id: NodeId) -> &XmlElementData {
        &self.arena[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut XmlElementData {
        &mut self.arena[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// First child named `name` (namespace-agnostic local-name match).
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.get(parent).children.iter().copied().find(|&id| self.get(id).name == name)
    }

    /// All children named `name`, in document order.
    pub fn find_children(&self, parent: NodeId, name: &str) -> Vec<NodeId> {
        self.get(parent).children.iter().copied().filter(|&id| self.get(id).name == name).collect()
    }

    /// Find-or-insert by name at `parent`: if a child named `name` already
    /// exists, updates its value; otherwise appends a new one. Spec.md
    /// §4.7's `SetParameter` semantics.
    pub fn set_or_add_element(
        &mut self,
        parent: NodeId,
        namespace: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        let name = name.into();
        if let Some(existing) = self.find_child(parent, &name) {
            self.get_mut(existing).value = value.into();
            existing
        } else {
            self.add_element(parent, namespace, name, value)
        }
    }

    /// Find-or-insert attribute by name on `node`.
    pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let element = self.get_mut(node);
        if let Some(existing) = element.attributes.iter_mut().find(|a| a.name == name) {
            existing.value = value;
        } else {
            element.attributes.push(Attribute { name, value });
        }
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.get(node).attributes.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).parent
    }

    /// Copies the subtree rooted at `node` (from any `XmlMessage`, including
    /// `self`) into `self`, returning the new root id. Used to deep-copy
    /// WSDL templates and SOAP message clones, since the arena owns plain
    /// data with no shared pointers to rebind.
    pub fn clone_subtree_from(&mut self, source: &XmlMessage, node: NodeId) -> NodeId {
        let data = source.get(node);
        let new_id = self.new_element(data.namespace.clone(), data.name.clone());
        {
            let new_data = self.get_mut(new_id);
            new_data.data_type = data.data_type;
            new_data.value = data.value.clone();
            new_data.attributes = data.attributes.clone();
            new_data.restriction = data.restriction.clone();
        }
        for &child in &data.children.clone() {
            let new_child = self.clone_subtree_from(source, child);
            self.append_child(new_id, new_child);
        }
        new_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wsdl_bits_round_trip() {
        let dt = XmlDataType::new(XdtKind::Integer)
            .with_cardinality(Cardinality::OneMany)
            .with_ordering(Ordering::Sequence);
        assert_eq!(XmlDataType::from_wsdl_bits(dt.to_wsdl_bits()), dt);
    }

    #[test]
    fn find_child_and_set_or_add_are_consistent() {
        let mut msg = XmlMessage::new();
        let root = msg.new_element("", "root");
        msg.set_root(root);
        msg.add_element(root, "", "a", "1");
        msg.set_or_add_element(root, "", "a", "2");
        assert_eq!(msg.find_children(root, "a").len(), 1);
        let a = msg.find_child(root, "a").unwrap();
        assert_eq!(msg.get(a).value, "2");
    }

    #[test]
    fn clone_subtree_deep_copies_children() {
        let mut source = XmlMessage::new();
        let root = source.new_element("", "root");
        source.set_root(root);
        source.add_element(root, "", "child", "v");

        let mut target = XmlMessage::new();
        let new_root = target.clone_subtree_from(&source, root);
        target.set_root(new_root);
        let child = target.find_child(new_root, "child").unwrap();
        assert_eq!(target.get(child).value, "v");
    }
}
