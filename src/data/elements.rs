//! Markup element classification
//!
//! Static sets telling the upcast dispatcher which markup elements open a
//! block (and therefore end any pending inline run) and which elements are
//! dropped with their content.

use phf::phf_set;

/// Markup elements that start a new block when met inside flowing content
static BLOCK_MARKUP: phf::Set<&'static str> = phf_set! {
    "p", "div", "table", "figure", "figcaption", "blockquote", "section", "article",
    "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "pre", "thead", "tbody",
    "tfoot", "tr", "td", "th", "caption", "hr",
};

/// Markup elements whose content never reaches the model
static IGNORED_MARKUP: phf::Set<&'static str> = phf_set! {
    "script", "style", "template", "head", "colgroup", "col",
};

/// Check whether a markup element is block-level
pub fn is_block_markup(name: &str) -> bool {
    BLOCK_MARKUP.contains(name)
}

/// Check whether a markup element is skipped together with its children
pub fn is_ignored_markup(name: &str) -> bool {
    IGNORED_MARKUP.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_markup() {
        assert!(is_block_markup("p"));
        assert!(is_block_markup("table"));
        assert!(!is_block_markup("strong"));
        assert!(!is_block_markup("span"));
    }

    #[test]
    fn test_ignored_markup() {
        assert!(is_ignored_markup("script"));
        assert!(!is_ignored_markup("td"));
    }
}
