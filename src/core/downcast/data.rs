//! Data downcast
//!
//! Produces the data tree from the whole model on demand. Nothing is cached
//! and nothing is patched: every call walks the document from the root.

use crate::core::conversion::Conversion;
use crate::core::model::{Document, NodeId};
use crate::core::view::ViewNode;

pub struct DataContext<'a> {
    pub doc: &'a Document,
    pub conversion: &'a Conversion,
}

impl<'a> DataContext<'a> {
    pub fn new(doc: &'a Document, conversion: &'a Conversion) -> Self {
        Self { doc, conversion }
    }

    /// Convert one node. Elements without a converter are transparent.
    pub fn convert(&self, node: NodeId) -> Vec<ViewNode> {
        match self.conversion.data_converter(self.doc, node) {
            Some(converter) => (converter.convert)(self, node),
            None => {
                tracing::trace!(node = %node, name = ?self.doc.name(node), "no data converter");
                self.convert_children(node)
            }
        }
    }

    pub fn convert_children(&self, node: NodeId) -> Vec<ViewNode> {
        self.doc
            .children(node)
            .iter()
            .flat_map(|&child| self.convert(child))
            .collect()
    }
}

/// Data tree of the whole document
pub fn to_data(doc: &Document, conversion: &Conversion) -> Vec<ViewNode> {
    DataContext::new(doc, conversion).convert_children(doc.root())
}
