//! Schema registry
//!
//! Declares which elements may nest where and which attributes they may
//! carry. Registration is declarative: the last definition registered for a
//! name wins and nothing is merged. Definitions are validated when they are
//! registered, never when a mutation is checked.
//!
//! ## Resolution rules
//!
//! - `allow_in`: explicit parents
//! - `allow_children`: explicit children (items or generic items like `$block`)
//! - `allow_where`: allowed wherever the referenced item is allowed
//! - `allow_content_of`: allows whatever the referenced item allows
//! - `inherit_all_from`: both of the above, plus attributes and flags

use indexmap::IndexMap;

use crate::data::constants::TEXT;
use crate::utils::error::{EditorError, EditorResult};

/// Definition of a schema item
#[derive(Debug, Clone, Default)]
pub struct SchemaItemDefinition {
    pub allow_where: Vec<String>,
    pub allow_in: Vec<String>,
    pub allow_attributes: Vec<String>,
    pub allow_children: Vec<String>,
    pub allow_content_of: Vec<String>,
    pub inherit_all_from: Option<String>,
    pub is_object: bool,
    pub is_block: bool,
    pub is_limit: bool,
    pub is_selectable: bool,
}

impl SchemaItemDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_where(mut self, item: &str) -> Self {
        self.allow_where.push(item.to_string());
        self
    }

    pub fn allow_in(mut self, item: &str) -> Self {
        self.allow_in.push(item.to_string());
        self
    }

    pub fn allow_attributes(mut self, keys: &[&str]) -> Self {
        self.allow_attributes
            .extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn allow_children(mut self, item: &str) -> Self {
        self.allow_children.push(item.to_string());
        self
    }

    pub fn allow_content_of(mut self, item: &str) -> Self {
        self.allow_content_of.push(item.to_string());
        self
    }

    pub fn inherit_all_from(mut self, item: &str) -> Self {
        self.inherit_all_from = Some(item.to_string());
        self
    }

    pub fn object(mut self) -> Self {
        self.is_object = true;
        self
    }

    pub fn block(mut self) -> Self {
        self.is_block = true;
        self
    }

    pub fn limit(mut self) -> Self {
        self.is_limit = true;
        self
    }

    pub fn selectable(mut self) -> Self {
        self.is_selectable = true;
        self
    }
}

/// Registry of schema items
#[derive(Debug, Clone, Default)]
pub struct Schema {
    items: IndexMap<String, SchemaItemDefinition>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an item definition
    pub fn register(&mut self, name: &str, definition: SchemaItemDefinition) -> EditorResult<()> {
        validate_name(name, name)?;

        let references = definition
            .allow_in
            .iter()
            .chain(&definition.allow_where)
            .chain(&definition.allow_content_of)
            .chain(&definition.allow_children)
            .chain(definition.inherit_all_from.iter());
        for reference in references {
            validate_name(name, reference)?;
            if reference == name {
                return Err(EditorError::invalid_definition(
                    name,
                    "an item cannot reference itself",
                ));
            }
        }

        if definition.allow_attributes.iter().any(|k| k.trim().is_empty()) {
            return Err(EditorError::invalid_definition(
                name,
                "attribute keys must not be empty",
            ));
        }

        if name == TEXT
            && (!definition.allow_children.is_empty() || !definition.allow_content_of.is_empty())
        {
            return Err(EditorError::invalid_definition(
                name,
                "text cannot have children",
            ));
        }

        tracing::trace!(item = name, "schema item registered");
        self.items.insert(name.to_string(), definition);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn definition(&self, name: &str) -> Option<&SchemaItemDefinition> {
        self.items.get(name)
    }

    /// Registered item names in registration order
    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Can `child` be placed directly inside `parent`?
    pub fn check_child(&self, parent: &str, child: &str) -> bool {
        if !self.is_registered(parent) || !self.is_registered(child) {
            return false;
        }

        let child_where = self.where_chain(child);
        let parent_content = self.content_chain(parent);

        // Parent side: allow_children of the parent (or what it inherits content from)
        let by_parent = parent_content.iter().any(|p| {
            self.items.get(p.as_str()).is_some_and(|def| {
                def.allow_children
                    .iter()
                    .any(|allowed| child_where.iter().any(|w| w == allowed))
            })
        });
        if by_parent {
            return true;
        }

        // Child side: allow_in of the child (or what it inherits placement from)
        child_where.iter().any(|w| {
            self.items.get(w.as_str()).is_some_and(|def| {
                def.allow_in
                    .iter()
                    .any(|allowed| parent_content.iter().any(|p| p == allowed))
            })
        })
    }

    /// Can `item` carry the attribute `key`?
    pub fn check_attribute(&self, item: &str, key: &str) -> bool {
        let mut current = Some(item);
        let mut guard = 0;
        while let Some(name) = current {
            let Some(def) = self.items.get(name) else {
                return false;
            };
            if def.allow_attributes.iter().any(|k| k == key) {
                return true;
            }
            current = def.inherit_all_from.as_deref();
            guard += 1;
            if guard > self.items.len() {
                return false;
            }
        }
        false
    }

    pub fn is_object(&self, name: &str) -> bool {
        self.flag(name, |def| def.is_object)
    }

    pub fn is_block(&self, name: &str) -> bool {
        self.flag(name, |def| def.is_block)
    }

    /// Limits and objects both stop structural operations at their boundary
    pub fn is_limit(&self, name: &str) -> bool {
        self.flag(name, |def| def.is_limit || def.is_object)
    }

    pub fn is_selectable(&self, name: &str) -> bool {
        self.flag(name, |def| def.is_selectable || def.is_object)
    }

    fn flag(&self, name: &str, get: impl Fn(&SchemaItemDefinition) -> bool) -> bool {
        let mut current = Some(name);
        let mut guard = 0;
        while let Some(item) = current {
            let Some(def) = self.items.get(item) else {
                return false;
            };
            if get(def) {
                return true;
            }
            current = def.inherit_all_from.as_deref();
            guard += 1;
            if guard > self.items.len() {
                return false;
            }
        }
        false
    }

    /// The item plus everything it inherits placement from
    fn where_chain(&self, name: &str) -> Vec<String> {
        self.closure(name, |def| {
            def.allow_where
                .iter()
                .chain(def.inherit_all_from.iter())
                .cloned()
                .collect()
        })
    }

    /// The item plus everything it inherits allowed content from
    fn content_chain(&self, name: &str) -> Vec<String> {
        self.closure(name, |def| {
            def.allow_content_of
                .iter()
                .chain(def.inherit_all_from.iter())
                .cloned()
                .collect()
        })
    }

    fn closure(
        &self,
        name: &str,
        next: impl Fn(&SchemaItemDefinition) -> Vec<String>,
    ) -> Vec<String> {
        let mut seen = vec![name.to_string()];
        let mut stack = vec![name.to_string()];
        while let Some(item) = stack.pop() {
            if let Some(def) = self.items.get(&item) {
                for reference in next(def) {
                    if !seen.contains(&reference) {
                        seen.push(reference.clone());
                        stack.push(reference);
                    }
                }
            }
        }
        seen
    }
}

fn validate_name(item: &str, name: &str) -> EditorResult<()> {
    if name.is_empty() {
        return Err(EditorError::invalid_definition(item, "names must not be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(EditorError::invalid_definition(
            item,
            format!("'{}' contains whitespace", name),
        ));
    }
    Ok(())
}
