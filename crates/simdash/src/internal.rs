//! Internal model: the resolved, prototype-expanded field tree.
//!
//! Nodes live in an arena; parent and child links are indices, so prototype
//! cloning never has to reason about pointer lifetimes. Prototypes are
//! resolved first and stay invisible to the flat index; concrete fields
//! referencing a prototype get a deep clone of its subtree.

use std::collections::BTreeMap;

use tracing::warn;

use crate::external::{ExternalField, ExternalModel};
use crate::types::{DashError, DashResult, ReturnKind};
use crate::units::Unit;

/// Index of a field in the model arena.
pub type FieldId = usize;

/// One resolved tree node. Local `name` never contains dots.
#[derive(Debug, Clone)]
pub struct InternalField {
    pub name: String,
    pub return_kind: ReturnKind,
    pub unit: Unit,
    pub parent: Option<FieldId>,
    /// Only set for root fields.
    pub function_name: Option<String>,
    pub display_name: Option<String>,
    pub abs_base_value: Option<f64>,
    pub is_portion: bool,
    pub default_decimal_digits: u8,
    /// Non-list children.
    pub fields: BTreeMap<String, FieldId>,
    /// List-typed children.
    pub list_fields: BTreeMap<String, FieldId>,
    /// The prototype node this instance was cloned from.
    pub prototype_ref: Option<FieldId>,
    pub is_prototype: bool,
    /// For prototype nodes: every instance cloned from this node, keyed by
    /// its resolved dotted name.
    pub prototype_instances: BTreeMap<String, FieldId>,
}

impl InternalField {
    fn from_external(name: &str, ext: &ExternalField, parent: Option<FieldId>) -> Self {
        InternalField {
            name: name.to_string(),
            // Callers guarantee a kind: unset is only legal on
            // prototype-referencing fields, which are cloned instead.
            return_kind: ext.return_kind.unwrap_or(ReturnKind::Table),
            unit: ext.unit,
            parent,
            function_name: ext.function_name.clone(),
            display_name: ext.display_name.clone(),
            abs_base_value: ext.abs_base_value,
            is_portion: ext.is_portion,
            default_decimal_digits: ext.default_decimal_digits,
            fields: BTreeMap::new(),
            list_fields: BTreeMap::new(),
            prototype_ref: None,
            is_prototype: false,
            prototype_instances: BTreeMap::new(),
        }
    }

    pub fn is_list_field(&self) -> bool {
        self.return_kind == ReturnKind::List
    }

    pub fn is_leaf(&self) -> bool {
        self.fields.is_empty() && self.list_fields.is_empty()
    }
}

/// Resolved field tree with a flat dotted-name index.
#[derive(Debug, Default)]
pub struct InternalModel {
    arena: Vec<InternalField>,
    prototypes: BTreeMap<String, FieldId>,
    /// Dotted name -> field. The sole lookup mechanism; prototypes are
    /// never entered here.
    index: BTreeMap<String, FieldId>,
    roots: Vec<FieldId>,
}

impl InternalModel {
    /// Resolve an external model into a concrete field tree. Prototypes are
    /// resolved first, then every top-level field; referencing an unknown
    /// prototype aborts the resolution.
    pub fn resolve(external: &ExternalModel) -> DashResult<InternalModel> {
        let mut model = InternalModel::default();

        for (name, ext_proto) in &external.field_prototypes {
            let id = model.parse_proto_field(name, ext_proto, None);
            model.prototypes.insert(name.clone(), id);
        }

        for (name, ext_field) in &external.fields {
            let id = model.parse_field(name, ext_field, None)?;
            model.roots.push(id);
        }

        Ok(model)
    }

    fn alloc(&mut self, field: InternalField) -> FieldId {
        self.arena.push(field);
        self.arena.len() - 1
    }

    pub fn field(&self, id: FieldId) -> &InternalField {
        &self.arena[id]
    }

    /// Prototype phase: build the subtree, flag every node, index nothing.
    fn parse_proto_field(
        &mut self,
        name: &str,
        ext: &ExternalField,
        parent: Option<FieldId>,
    ) -> FieldId {
        let mut proto = InternalField::from_external(name, ext, parent);
        proto.is_prototype = true;
        let id = self.alloc(proto);

        for (child_name, child_ext) in &ext.fields {
            let child_id = self.parse_proto_field(child_name, child_ext, Some(id));
            if self.arena[child_id].is_list_field() {
                self.arena[id].list_fields.insert(child_name.clone(), child_id);
            } else {
                self.arena[id].fields.insert(child_name.clone(), child_id);
            }
        }

        id
    }

    /// Concrete phase: fresh nodes for plain fields, deep clones for
    /// prototype references, holder-plus-splice for list fields that
    /// reference a prototype.
    fn parse_field(
        &mut self,
        name: &str,
        ext: &ExternalField,
        parent: Option<FieldId>,
    ) -> DashResult<FieldId> {
        let proto_id = match &ext.prototype_ref {
            Some(proto_name) => Some(
                self.prototypes
                    .get(proto_name)
                    .copied()
                    .ok_or_else(|| DashError::UnknownPrototype(proto_name.clone()))?,
            ),
            None => None,
        };

        let id = match proto_id {
            Some(proto_id) if !ext.is_list_field() => {
                // The external node's name and parent apply to the clone's
                // root; its shape comes entirely from the prototype.
                let clone_id = self.clone_subtree(proto_id, parent);
                self.arena[clone_id].name = name.to_string();
                clone_id
            }
            _ => {
                let mut field = InternalField::from_external(name, ext, parent);
                field.prototype_ref = proto_id;
                self.alloc(field)
            }
        };

        if let (Some(proto_id), true) = (proto_id, ext.is_list_field()) {
            // A list field expanding into a prototype: clone the prototype
            // as a child scope, then splice its immediate children onto the
            // holder so the prototype's own name stays transparent.
            let instance_id = self.clone_subtree(proto_id, Some(id));
            let fields = std::mem::take(&mut self.arena[instance_id].fields);
            let list_fields = std::mem::take(&mut self.arena[instance_id].list_fields);
            for &child_id in fields.values().chain(list_fields.values()) {
                self.arena[child_id].parent = Some(id);
            }
            self.arena[id].fields = fields;
            self.arena[id].list_fields = list_fields;
        } else {
            for (child_name, child_ext) in &ext.fields {
                let child_id = self.parse_field(child_name, child_ext, Some(id))?;
                if self.arena[child_id].is_list_field() {
                    self.arena[id].list_fields.insert(child_name.clone(), child_id);
                } else {
                    self.arena[id].fields.insert(child_name.clone(), child_id);
                }
            }
        }

        self.add_to_index_recursively(id);

        Ok(id)
    }

    /// Deep-clone a prototype subtree: fresh nodes, fresh parent links, the
    /// clone recorded in the prototype's instance registry under its
    /// resolved dotted name.
    fn clone_subtree(&mut self, proto_id: FieldId, parent: Option<FieldId>) -> FieldId {
        let proto = &self.arena[proto_id];
        let instance = InternalField {
            name: proto.name.clone(),
            return_kind: proto.return_kind,
            unit: proto.unit,
            parent,
            function_name: proto.function_name.clone(),
            display_name: proto.display_name.clone(),
            abs_base_value: proto.abs_base_value,
            is_portion: proto.is_portion,
            default_decimal_digits: proto.default_decimal_digits,
            fields: BTreeMap::new(),
            list_fields: BTreeMap::new(),
            prototype_ref: Some(proto_id),
            is_prototype: false,
            prototype_instances: BTreeMap::new(),
        };
        let id = self.alloc(instance);

        let child_fields: Vec<(String, FieldId)> = self.arena[proto_id]
            .fields
            .iter()
            .map(|(n, c)| (n.clone(), *c))
            .collect();
        for (child_name, child_proto) in child_fields {
            let child_id = self.clone_subtree(child_proto, Some(id));
            self.arena[id].fields.insert(child_name, child_id);
        }

        let child_list_fields: Vec<(String, FieldId)> = self.arena[proto_id]
            .list_fields
            .iter()
            .map(|(n, c)| (n.clone(), *c))
            .collect();
        for (child_name, child_proto) in child_list_fields {
            let child_id = self.clone_subtree(child_proto, Some(id));
            self.arena[id].list_fields.insert(child_name, child_id);
        }

        let dotted = self.dotted_name(id);
        self.arena[proto_id].prototype_instances.insert(dotted, id);

        id
    }

    fn add_to_index_recursively(&mut self, id: FieldId) {
        self.index.insert(self.dotted_name(id), id);
        let children: Vec<FieldId> = {
            let field = &self.arena[id];
            field
                .fields
                .values()
                .chain(field.list_fields.values())
                .copied()
                .collect()
        };
        for child in children {
            self.add_to_index_recursively(child);
        }
    }

    /// Full path of a field, parent names joined with dots. Roots have no
    /// prefix.
    pub fn dotted_name(&self, id: FieldId) -> String {
        let mut segments = vec![self.arena[id].name.as_str()];
        let mut current = self.arena[id].parent;
        while let Some(parent_id) = current {
            segments.push(self.arena[parent_id].name.as_str());
            current = self.arena[parent_id].parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Look up a field by dotted name. A miss is logged and returns `None`,
    /// never an error.
    pub fn get_field(&self, dotted_name: &str) -> Option<FieldId> {
        let found = self.index.get(dotted_name).copied();
        if found.is_none() {
            warn!("field {dotted_name} not found");
        }
        found
    }

    /// Every exportable field: the ones with no children in either map.
    pub fn leaf_fields(&self) -> Vec<FieldId> {
        self.index
            .values()
            .copied()
            .filter(|id| self.arena[*id].is_leaf())
            .collect()
    }

    pub fn roots(&self) -> &[FieldId] {
        &self.roots
    }

    pub fn root_of(&self, id: FieldId) -> FieldId {
        match self.arena[id].parent {
            Some(parent) => self.root_of(parent),
            None => id,
        }
    }

    /// Nearest list-typed ancestor, excluding the field itself. Tells the
    /// generator which loop a leaf sits inside.
    pub fn next_list_field_in_hierarchy(&self, id: FieldId) -> Option<FieldId> {
        let parent = self.arena[id].parent?;
        if self.arena[parent].is_list_field() {
            Some(parent)
        } else {
            self.next_list_field_in_hierarchy(parent)
        }
    }

    pub fn effective_display_name(&self, id: FieldId) -> String {
        match &self.arena[id].display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => self.dotted_name(id),
        }
    }
}
