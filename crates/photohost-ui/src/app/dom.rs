//! Small DOM helpers shared by the widgets.
//!
//! Setters log failures instead of returning them; a missing style or class never
//! aborts a render.

use anyhow::anyhow;
use gloo::console;
use gloo::utils::document;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Element, HtmlElement, HtmlInputElement};

/// Convert a thrown JS value into an error.
pub(crate) fn js_error(err: JsValue) -> anyhow::Error {
    let detail = err
        .as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"));
    anyhow!(detail)
}

pub(crate) fn by_id<T: JsCast>(id: &str) -> Option<T> {
    document().get_element_by_id(id)?.dyn_into::<T>().ok()
}

pub(crate) fn query_all<T: JsCast>(root: &Element, selector: &str) -> Vec<T> {
    let Ok(nodes) = root.query_selector_all(selector) else {
        console::error!("invalid selector", selector);
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.get(i))
        .filter_map(|node| node.dyn_into::<T>().ok())
        .collect()
}

pub(crate) fn document_query_all<T: JsCast>(selector: &str) -> Vec<T> {
    document()
        .document_element()
        .map_or_else(Vec::new, |root| query_all(&root, selector))
}

pub(crate) fn create(tag: &str, class: &str) -> anyhow::Result<HtmlElement> {
    let element = document()
        .create_element(tag)
        .map_err(js_error)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| anyhow!("<{tag}> is not an HTML element"))?;
    if !class.is_empty() {
        element.set_class_name(class);
    }
    Ok(element)
}

/// Replace an element's children with a single text line.
pub(crate) fn replace_with_line(parent: &Element, class: &str, text: &str) {
    parent.set_text_content(None);
    match create("div", class) {
        Ok(line) => {
            line.set_text_content(Some(text));
            append(parent, &line);
        }
        Err(err) => console::error!("line render failed", err.to_string()),
    }
}

pub(crate) fn append(parent: &Element, child: &Element) {
    if let Err(err) = parent.append_child(child) {
        console::error!("append failed", err);
    }
}

pub(crate) fn set_class(element: &Element, class: &str, on: bool) {
    if let Err(err) = element.class_list().toggle_with_force(class, on) {
        console::error!("class toggle failed", class, err);
    }
}

pub(crate) fn set_attr(element: &Element, name: &str, value: &str) {
    if let Err(err) = element.set_attribute(name, value) {
        console::error!("attribute set failed", name, err);
    }
}

pub(crate) fn set_style(element: &HtmlElement, property: &str, value: &str) {
    if let Err(err) = element.style().set_property(property, value) {
        console::error!("style set failed", property, err);
    }
}

pub(crate) fn set_visible(element: &HtmlElement, visible: bool) {
    set_style(element, "display", if visible { "block" } else { "none" });
}

pub(crate) fn set_text(element: Option<&Element>, text: &str) {
    if let Some(element) = element {
        element.set_text_content(Some(text));
    }
}

/// CSRF token from the hidden form field rendered by the server.
pub(crate) fn csrf_token() -> Option<String> {
    document()
        .query_selector("[name=csrfmiddlewaretoken]")
        .ok()
        .flatten()
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|input| input.value())
        .filter(|token| !token.is_empty())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn now_ms() -> u64 {
    js_sys::Date::now().max(0.0) as u64
}
