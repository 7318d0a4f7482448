//! Element primitives - plain containers and text.

use crate::dom::{attach_to_current_parent, with_parent, Element};
use crate::primitives::Cleanup;
use crate::types::Style;

/// Properties for [`div`].
#[derive(Default)]
pub struct DivProps {
    pub id: Option<String>,
    pub class: Option<String>,
    pub style: Style,
    /// Rendered with the new element as the current parent.
    pub children: Option<Box<dyn FnOnce() -> Cleanup>>,
}

/// Create a `div` under the current parent and render its children into it.
pub fn div(props: DivProps) -> Cleanup {
    let el = Element::new("div");
    if let Some(id) = &props.id {
        el.set_id(id);
    }
    if let Some(class) = &props.class {
        el.set_class_name(class);
    }
    el.set_style(props.style);
    attach_to_current_parent(&el);

    let children_cleanup = props.children.map(|children| with_parent(&el, children));

    Box::new(move || {
        if let Some(cleanup) = children_cleanup {
            cleanup();
        }
        el.remove();
    })
}

/// Create an `h1` with `content` under the current parent.
pub fn heading(content: &str) -> Cleanup {
    let el = Element::new("h1");
    el.set_text_content(content);
    attach_to_current_parent(&el);
    Box::new(move || el.remove())
}
