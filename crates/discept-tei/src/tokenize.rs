//! Word tokenization and id assignment inside a TEI `text`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{Element, Node};
use crate::tei::{tei, TEI_NS};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());

/// Elements that receive an `xml:id` from [`ensure_ids`].
pub const ADDRESSABLE: &[&str] = &["w", "s", "seg", "p"];

/// Split text into words, each carrying the separator that followed it:
/// `"\n"` when the whitespace run contained a newline, `" "` otherwise
/// (also after the last word).
pub fn split_words(text: &str) -> Vec<String> {
    let text = text.trim();
    let matches: Vec<_> = WORD.find_iter(text).collect();
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let gap = matches
                .get(i + 1)
                .map(|next| &text[m.end()..next.start()])
                .unwrap_or("");
            let separator = if gap.contains('\n') { "\n" } else { " " };
            format!("{}{}", m.as_str(), separator)
        })
        .collect()
}

/// Wrap every word of every multi-word text node under the document's
/// `text` element in a `<w>`. Returns true if anything changed.
pub fn tokenize(doc: &mut Element) -> bool {
    match doc.child_mut(TEI_NS, "text") {
        Some(text) => tokenize_element(text),
        None => false,
    }
}

fn tokenize_element(element: &mut Element) -> bool {
    let mut changed = false;
    let old = std::mem::take(&mut element.children);
    for node in old {
        match node {
            Node::Element(mut child) => {
                if tokenize_element(&mut child) {
                    changed = true;
                }
                element.children.push(Node::Element(child));
            }
            Node::Text(text) => {
                let words = split_words(&text);
                if words.len() <= 1 {
                    element.children.push(Node::Text(text));
                    continue;
                }
                for word in words {
                    element.push(tei("w").with_text(&word));
                    element.children.push(Node::Text(" ".to_string()));
                }
                changed = true;
            }
            other => element.children.push(other),
        }
    }
    changed
}

/// Give every addressable element under `text` that lacks one an `xml:id`
/// drawn from `next_id`. Returns the assigned ids in document order.
pub fn ensure_ids(doc: &mut Element, next_id: &mut impl FnMut() -> String) -> Vec<String> {
    let mut assigned = Vec::new();
    if let Some(text) = doc.child_mut(TEI_NS, "text") {
        text.walk_mut(&mut |e| {
            let addressable = e.namespace.as_deref() == Some(TEI_NS)
                && ADDRESSABLE.contains(&e.local.as_str());
            if addressable && e.id().is_none() {
                let id = next_id();
                e.set_attr("xml:id", id.clone());
                assigned.push(id);
            }
        });
    }
    assigned
}
