//! Converter registry
//!
//! Converters are kept in explicit ordered lists, one per direction:
//!
//! - **upcast**: markup element → model nodes
//! - **editing downcast**: model node → editing view node, plus position
//!   resolvers, removal converters and attribute patches
//! - **data downcast**: model node → owned data tree
//!
//! Each list is sorted by [`Priority`], highest first; converters registered
//! with the same priority keep their registration order. Dispatch takes the
//! first converter whose predicate matches.
//!
//! Attribute-to-attribute converters are shared by all three directions, and
//! the dirty-scope table tells the editing downcast whether an attribute change
//! is a local patch or needs a full reconversion of the element.

use fxhash::FxHashMap;

use super::batch::DirtyScope;
use super::downcast::data::DataContext;
use super::downcast::editing::EditingContext;
use super::model::{AttributeValue, Document, NodeId};
use super::upcast::UpcastContext;
use super::view::{ViewElement, ViewId, ViewNode};
use crate::utils::error::EditorResult;

/// Converter priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Normal,
    High,
    Highest,
}

impl Priority {
    pub fn value(self) -> i32 {
        match self {
            Priority::Lowest => -100,
            Priority::Low => -10,
            Priority::Normal => 0,
            Priority::High => 10,
            Priority::Highest => 100,
        }
    }
}

// ============================================================================
// Converter Types
// ============================================================================

pub type UpcastFn = fn(&ViewElement, &mut UpcastContext<'_, '_>) -> EditorResult<Vec<NodeId>>;

/// Markup element → model nodes
#[derive(Clone)]
pub struct UpcastConverter {
    pub name: &'static str,
    pub priority: Priority,
    pub matches: fn(&ViewElement) -> bool,
    pub convert: UpcastFn,
}

/// Builds the (outer) view element of a model node. Children are placed by
/// the dispatcher afterwards.
pub type EditingFn = fn(&mut EditingContext<'_>, NodeId) -> Option<ViewId>;

/// Container and offset where the view of a model node goes
pub type PositionFn = fn(&mut EditingContext<'_>, NodeId) -> Option<(ViewId, usize)>;

/// Takes the view of a removed model node out of the editing view
pub type RemovalFn = fn(&mut EditingContext<'_>, NodeId, ViewId);

/// Patches the view after an attribute change
pub type AttributePatchFn = fn(&mut EditingContext<'_>, NodeId, &str);

pub type DataFn = fn(&DataContext<'_>, NodeId) -> Vec<ViewNode>;

/// Model node → editing view node
#[derive(Clone)]
pub struct EditingConverter {
    pub name: &'static str,
    pub model: &'static str,
    pub priority: Priority,
    pub matches: fn(&Document, NodeId) -> bool,
    pub convert: EditingFn,
}

/// Model node → data tree nodes
#[derive(Clone)]
pub struct DataConverter {
    pub name: &'static str,
    pub model: &'static str,
    pub priority: Priority,
    pub matches: fn(&Document, NodeId) -> bool,
    pub convert: DataFn,
}

/// Attribute mapping used by upcast and both downcasts
#[derive(Clone)]
pub struct AttributeToAttribute {
    /// Model element carrying the attribute
    pub model: &'static str,
    pub model_key: &'static str,
    pub view_key: &'static str,
    pub to_model: fn(&str) -> Option<AttributeValue>,
    pub to_view: fn(&AttributeValue) -> Option<String>,
}

/// Predicate matching every node of the converter's model element
pub fn always(_doc: &Document, _node: NodeId) -> bool {
    true
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Clone, Default)]
pub struct Conversion {
    upcast: Vec<UpcastConverter>,
    editing: Vec<EditingConverter>,
    data: Vec<DataConverter>,
    positions: FxHashMap<&'static str, PositionFn>,
    removals: FxHashMap<&'static str, RemovalFn>,
    attribute_patches: Vec<(&'static str, &'static str, AttributePatchFn)>,
    attribute_to_attribute: Vec<AttributeToAttribute>,
    dirty_scopes: Vec<(&'static str, &'static str, DirtyScope)>,
}

/// Insert keeping the list sorted by priority, ties in registration order
fn insert_by_priority<T>(list: &mut Vec<T>, item: T, priority: Priority, get: fn(&T) -> Priority) {
    let index = list
        .iter()
        .position(|existing| get(existing) < priority)
        .unwrap_or(list.len());
    list.insert(index, item);
}

impl Conversion {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    pub fn add_upcast(&mut self, converter: UpcastConverter) {
        tracing::trace!(name = converter.name, "upcast converter registered");
        let priority = converter.priority;
        insert_by_priority(&mut self.upcast, converter, priority, |c| c.priority);
    }

    pub fn add_editing(&mut self, converter: EditingConverter) {
        tracing::trace!(name = converter.name, "editing converter registered");
        let priority = converter.priority;
        insert_by_priority(&mut self.editing, converter, priority, |c| c.priority);
    }

    pub fn add_data(&mut self, converter: DataConverter) {
        tracing::trace!(name = converter.name, "data converter registered");
        let priority = converter.priority;
        insert_by_priority(&mut self.data, converter, priority, |c| c.priority);
    }

    pub fn set_position_resolver(&mut self, model: &'static str, resolve: PositionFn) {
        self.positions.insert(model, resolve);
    }

    pub fn set_removal(&mut self, model: &'static str, remove: RemovalFn) {
        self.removals.insert(model, remove);
    }

    pub fn add_attribute_patch(
        &mut self,
        model: &'static str,
        key: &'static str,
        patch: AttributePatchFn,
    ) {
        self.attribute_patches.retain(|(m, k, _)| (*m, *k) != (model, key));
        self.attribute_patches.push((model, key, patch));
    }

    pub fn add_attribute_to_attribute(&mut self, converter: AttributeToAttribute) {
        self.attribute_to_attribute.push(converter);
    }

    pub fn set_dirty_scope(&mut self, model: &'static str, key: &'static str, scope: DirtyScope) {
        self.dirty_scopes.retain(|(m, k, _)| (*m, *k) != (model, key));
        self.dirty_scopes.push((model, key, scope));
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    pub fn upcast_converter(&self, element: &ViewElement) -> Option<&UpcastConverter> {
        self.upcast.iter().find(|c| (c.matches)(element))
    }

    pub fn editing_converter(&self, doc: &Document, node: NodeId) -> Option<&EditingConverter> {
        let name = doc.name(node)?;
        self.editing
            .iter()
            .find(|c| c.model == name && (c.matches)(doc, node))
    }

    pub fn data_converter(&self, doc: &Document, node: NodeId) -> Option<&DataConverter> {
        let name = doc.name(node)?;
        self.data
            .iter()
            .find(|c| c.model == name && (c.matches)(doc, node))
    }

    pub fn position_resolver(&self, model: &str) -> Option<PositionFn> {
        self.positions.get(model).copied()
    }

    pub fn removal(&self, model: &str) -> Option<RemovalFn> {
        self.removals.get(model).copied()
    }

    pub fn attribute_patch(&self, model: &str, key: &str) -> Option<AttributePatchFn> {
        self.attribute_patches
            .iter()
            .find(|(m, k, _)| *m == model && *k == key)
            .map(|(_, _, patch)| *patch)
    }

    /// Scope of the view update an attribute change needs
    pub fn dirty_scope(&self, model: &str, key: &str) -> DirtyScope {
        self.dirty_scopes
            .iter()
            .find(|(m, k, _)| *m == model && *k == key)
            .map(|(_, _, scope)| *scope)
            .unwrap_or(DirtyScope::LocalPatch)
    }

    pub fn attribute_mapping(&self, model: &str, model_key: &str) -> Option<&AttributeToAttribute> {
        self.attribute_to_attribute
            .iter()
            .find(|a| a.model == model && a.model_key == model_key)
    }

    /// Model attributes for a markup element that becomes `model`
    pub fn attributes_from_view(
        &self,
        model: &str,
        element: &ViewElement,
    ) -> Vec<(&'static str, AttributeValue)> {
        self.attribute_to_attribute
            .iter()
            .filter(|a| a.model == model)
            .filter_map(|a| {
                let raw = element.attribute(a.view_key)?;
                match (a.to_model)(raw) {
                    Some(value) => Some((a.model_key, value)),
                    None => {
                        tracing::debug!(
                            element = %element.name,
                            key = a.view_key,
                            value = raw,
                            "dropped attribute value"
                        );
                        None
                    }
                }
            })
            .collect()
    }

    /// View attributes for a model node
    pub fn attributes_to_view(&self, doc: &Document, node: NodeId) -> Vec<(&'static str, String)> {
        let Some(name) = doc.name(node) else {
            return Vec::new();
        };
        self.attribute_to_attribute
            .iter()
            .filter(|a| a.model == name)
            .filter_map(|a| {
                let value = doc.attribute(node, a.model_key)?;
                (a.to_view)(value).map(|v| (a.view_key, v))
            })
            .collect()
    }

    pub fn upcast_names(&self) -> Vec<&'static str> {
        self.upcast.iter().map(|c| c.name).collect()
    }

    pub fn editing_names(&self) -> Vec<&'static str> {
        self.editing.iter().map(|c| c.name).collect()
    }

    pub fn data_names(&self) -> Vec<&'static str> {
        self.data.iter().map(|c| c.name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upcast_none(_el: &ViewElement, _ctx: &mut UpcastContext<'_, '_>) -> EditorResult<Vec<NodeId>> {
        Ok(Vec::new())
    }

    fn converter(name: &'static str, priority: Priority) -> UpcastConverter {
        UpcastConverter {
            name,
            priority,
            matches: |el| el.name == "p",
            convert: upcast_none,
        }
    }

    #[test]
    fn test_priority_order_with_stable_ties() {
        let mut conversion = Conversion::new();
        conversion.add_upcast(converter("normal-1", Priority::Normal));
        conversion.add_upcast(converter("high", Priority::High));
        conversion.add_upcast(converter("normal-2", Priority::Normal));
        conversion.add_upcast(converter("low", Priority::Low));
        conversion.add_upcast(converter("highest", Priority::Highest));

        assert_eq!(
            conversion.upcast_names(),
            vec!["highest", "high", "normal-1", "normal-2", "low"]
        );
        let first = conversion.upcast_converter(&ViewElement::new("p")).unwrap();
        assert_eq!(first.name, "highest");
        assert!(conversion.upcast_converter(&ViewElement::new("div")).is_none());
    }

    #[test]
    fn test_priority_values() {
        assert!(Priority::High.value() > Priority::Normal.value());
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn test_dirty_scope_defaults_to_local_patch() {
        let mut conversion = Conversion::new();
        conversion.set_dirty_scope("table", "headingRows", DirtyScope::FullTableReconversion);
        assert_eq!(
            conversion.dirty_scope("table", "headingRows"),
            DirtyScope::FullTableReconversion
        );
        assert_eq!(
            conversion.dirty_scope("table", "headingColumns"),
            DirtyScope::LocalPatch
        );
    }

    #[test]
    fn test_attribute_mapping_both_ways() {
        let mut conversion = Conversion::new();
        conversion.add_attribute_to_attribute(AttributeToAttribute {
            model: "cell",
            model_key: "span",
            view_key: "span",
            to_model: |raw| raw.parse::<i64>().ok().map(AttributeValue::Integer),
            to_view: |value| value.as_integer().map(|n| n.to_string()),
        });

        let el = ViewElement::new("td").with_attribute("span", "3");
        assert_eq!(
            conversion.attributes_from_view("cell", &el),
            vec![("span", AttributeValue::Integer(3))]
        );
        let bad = ViewElement::new("td").with_attribute("span", "x");
        assert!(conversion.attributes_from_view("cell", &bad).is_empty());
        assert!(conversion.attributes_from_view("other", &el).is_empty());
    }
}
