//! Paragraph feature
//!
//! Registers the generic document structure every other feature builds on:
//! `$root`, `$block`, `$text` and `paragraph`, with `p` as its markup.

use crate::core::conversion::{
    always, AttributeToAttribute, DataConverter, EditingConverter, Priority, UpcastConverter,
};
use crate::core::editor::{Feature, Services};
use crate::core::model::{AttributeValue, NodeId};
use crate::core::schema::{Schema, SchemaItemDefinition};
use crate::core::upcast::UpcastContext;
use crate::core::view::{ViewElement, ViewNode};
use crate::data::constants::{ALIGNMENT, BLOCK, PARAGRAPH, ROOT, TEXT};
use crate::utils::error::EditorResult;

const ALIGNMENTS: &[&str] = &["left", "center", "right", "justify"];

pub struct Paragraph;

impl Feature for Paragraph {
    fn name(&self) -> &'static str {
        "paragraph"
    }

    fn register(&self, services: &mut Services<'_>) -> EditorResult<()> {
        register_schema(services.schema())?;

        let conversion = &mut *services.conversion;
        conversion.add_attribute_to_attribute(AttributeToAttribute {
            model: PARAGRAPH,
            model_key: ALIGNMENT,
            view_key: "align",
            to_model: alignment_to_model,
            to_view: |value| value.as_text().map(str::to_string),
        });
        conversion.add_upcast(UpcastConverter {
            name: "paragraph",
            priority: Priority::Normal,
            matches: |el| el.name == "p",
            convert: upcast_paragraph,
        });
        conversion.add_editing(EditingConverter {
            name: "paragraph",
            model: PARAGRAPH,
            priority: Priority::Normal,
            matches: always,
            convert: |ctx, paragraph| {
                let view = ctx.view.create_element("p");
                for (key, value) in ctx.conversion.attributes_to_view(ctx.doc, paragraph) {
                    ctx.view.set_attribute(view, key, &value);
                }
                Some(view)
            },
        });
        conversion.add_editing(EditingConverter {
            name: "text",
            model: TEXT,
            priority: Priority::Normal,
            matches: always,
            convert: |ctx, text| {
                let content = ctx.doc.text(text)?;
                Some(ctx.view.create_text(content))
            },
        });
        conversion.add_data(DataConverter {
            name: "paragraph",
            model: PARAGRAPH,
            priority: Priority::Normal,
            matches: always,
            convert: |ctx, paragraph| {
                let mut element = ViewElement::new("p");
                for (key, value) in ctx.conversion.attributes_to_view(ctx.doc, paragraph) {
                    element = element.with_attribute(key, &value);
                }
                vec![ViewNode::Element(
                    element.with_children(ctx.convert_children(paragraph)),
                )]
            },
        });
        conversion.add_data(DataConverter {
            name: "text",
            model: TEXT,
            priority: Priority::Normal,
            matches: always,
            convert: |ctx, text| {
                ctx.doc
                    .text(text)
                    .map(|content| ViewNode::Text(content.to_string()))
                    .into_iter()
                    .collect()
            },
        });
        Ok(())
    }
}

/// `$root`, `$block`, `$text` and `paragraph`
pub fn register_schema(schema: &mut Schema) -> EditorResult<()> {
    schema.register(ROOT, SchemaItemDefinition::new().limit())?;
    schema.register(BLOCK, SchemaItemDefinition::new().allow_in(ROOT).block())?;
    schema.register(TEXT, SchemaItemDefinition::new().allow_in(BLOCK))?;
    schema.register(
        PARAGRAPH,
        SchemaItemDefinition::new()
            .inherit_all_from(BLOCK)
            .allow_attributes(&[ALIGNMENT]),
    )
}

fn alignment_to_model(raw: &str) -> Option<AttributeValue> {
    let value = raw.trim().to_ascii_lowercase();
    ALIGNMENTS
        .contains(&value.as_str())
        .then(|| AttributeValue::Text(value))
}

fn upcast_paragraph(el: &ViewElement, ctx: &mut UpcastContext<'_, '_>) -> EditorResult<Vec<NodeId>> {
    let attributes = ctx.conversion().attributes_from_view(PARAGRAPH, el);
    let paragraph = ctx.writer().create_element(PARAGRAPH, &attributes)?;
    ctx.convert_children(el, paragraph)?;
    Ok(vec![paragraph])
}
