//! Placeholder swap markup.
//!
//! Every boundary is rendered inside the shell as a slot
//! (`<div id="sb-{id}">`). When the section settles, a `<template
//! id="sr-{id}">` carrying the final markup is streamed, followed by a
//! call to the swap runtime which moves the template's content into the
//! slot.

use suspense_core::{SectionId, SectionStatus};

/// Escape text for safe inclusion in HTML content and attributes.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// The client-side swap runtime. Emitted once, in the shell's head.
///
/// Retry buttons rendered by error views dispatch a `suspense:retry`
/// event carrying the section id.
pub fn swap_runtime_script() -> &'static str {
    r#"function $sw(id){var t=document.getElementById("sr-"+id),s=document.getElementById("sb-"+id);if(!t||!s)return;s.replaceChildren(t.content.cloneNode(true));s.dataset.status=t.dataset.status;t.remove();}
document.addEventListener("click",function(e){var b=e.target.closest&&e.target.closest("[data-retry-section]");if(b)document.dispatchEvent(new CustomEvent("suspense:retry",{detail:b.dataset.retrySection}));});"#
}

/// The slot a boundary occupies in the shell, holding its placeholder.
pub fn placeholder_slot(id: &SectionId, placeholder_html: &str) -> String {
    format!(
        r#"<div id="sb-{}" data-section data-status="pending">{}</div>"#,
        escape_html(id.as_str()),
        placeholder_html
    )
}

/// A resolved section: template plus the swap call that reveals it.
pub fn resolved_chunk(id: &SectionId, status: SectionStatus, html: &str) -> String {
    format!(
        "<template id=\"sr-{}\" data-status=\"{}\">{}</template><script>$sw({})</script>\n",
        escape_html(id.as_str()),
        status,
        html,
        js_string(id.as_str())
    )
}

/// A JSON string literal that cannot terminate the surrounding script.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}
