//! `standOff` join and link handling shared by the reader and the writer.
//!
//! A link target names either raw element ids or the ids of `join` elements,
//! each of which stands for an ordered group of element ids.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use discept_tei::{tei, Element, TEI_NS};

use crate::types::Category;

pub const TRANSLATION: &str = "translation";
pub const JOIN_ID_PREFIX: &str = "join-";

/// Split a `target`/`facs` attribute into bare ids.
pub fn parse_targets(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .map(|r| r.strip_prefix('#').unwrap_or(r).to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

/// Render ids as a `target` attribute value.
pub fn format_targets<S: AsRef<str>>(ids: &[S]) -> String {
    ids.iter()
        .map(|id| format!("#{}", id.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Direct `standOff` children of `root`.
pub fn stand_offs(root: &Element) -> impl Iterator<Item = &Element> {
    root.children_named(TEI_NS, "standOff")
}

#[derive(Debug, Clone)]
struct Join {
    targets: Vec<String>,
    category: Option<String>,
}

/// Grouping joins (`join[@xml:id]` without `@facs`) by id.
#[derive(Debug, Default)]
pub struct JoinIndex {
    joins: HashMap<String, Join>,
}

impl JoinIndex {
    pub fn from_stand_offs<'a>(stand_offs: impl Iterator<Item = &'a Element>) -> Self {
        let mut joins = HashMap::new();
        for stand_off in stand_offs {
            for join in stand_off.children_named(TEI_NS, "join") {
                if join.attr("facs").is_some() {
                    continue;
                }
                let Some(id) = join.id() else {
                    debug!("Skipping join without xml:id");
                    continue;
                };
                joins.insert(
                    id.to_string(),
                    Join {
                        targets: parse_targets(join.attr("target").unwrap_or("")),
                        category: join.attr("type").map(str::to_string),
                    },
                );
            }
        }
        Self { joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Element ids behind a reference: the join's targets, or the id itself.
    pub fn resolve(&self, reference: &str) -> Vec<String> {
        match self.joins.get(reference) {
            Some(join) => join.targets.clone(),
            None => vec![reference.to_string()],
        }
    }

    fn category(&self, reference: &str) -> Option<&str> {
        self.joins
            .get(reference)
            .and_then(|j| j.category.as_deref())
    }
}

/// Image joins: graphic id (from `@facs`) → illustrated element ids.
pub fn facs_joins<'a>(stand_offs: impl Iterator<Item = &'a Element>) -> HashMap<String, Vec<String>> {
    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    for stand_off in stand_offs {
        for join in stand_off.children_named(TEI_NS, "join") {
            let Some(facs) = join.attr("facs") else {
                continue;
            };
            let targets = parse_targets(join.attr("target").unwrap_or(""));
            for graphic in parse_targets(facs) {
                out.entry(graphic).or_default().extend(targets.iter().cloned());
            }
        }
    }
    out
}

/// A translation link with both sides resolved to languages and element ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub lang_a: String,
    pub ids_a: Vec<String>,
    pub lang_b: String,
    pub ids_b: Vec<String>,
    pub category: Category,
}

/// Resolve every `linkGrp[@type="translation"]/link` under the given
/// `standOff`s. `languages` maps element ids to the language document that
/// contains them; links whose sides cannot be placed are skipped.
pub fn resolve_links<'a>(
    stand_offs: impl Iterator<Item = &'a Element>,
    joins: &JoinIndex,
    languages: &HashMap<String, String>,
) -> Vec<ResolvedLink> {
    let mut resolved = Vec::new();
    for stand_off in stand_offs {
        for group in stand_off.children_named(TEI_NS, "linkGrp") {
            if group.attr("type") != Some(TRANSLATION) {
                debug!("Skipping linkGrp of type {:?}", group.attr("type"));
                continue;
            }
            for link in group.children_named(TEI_NS, "link") {
                if let Some(r) = resolve_link(link, joins, languages) {
                    resolved.push(r);
                }
            }
        }
    }
    resolved
}

fn resolve_link(
    link: &Element,
    joins: &JoinIndex,
    languages: &HashMap<String, String>,
) -> Option<ResolvedLink> {
    let refs = parse_targets(link.attr("target").unwrap_or(""));
    if refs.len() != 2 {
        warn!("Skipping link with {} targets (expected 2)", refs.len());
        return None;
    }

    let side = |reference: &str| -> Option<(String, Vec<String>)> {
        let ids = joins.resolve(reference);
        let language = ids.iter().find_map(|id| languages.get(id))?.clone();
        if ids.iter().any(|id| languages.get(id).is_some_and(|l| *l != language)) {
            warn!("Reference '{}' spans more than one language", reference);
        }
        Some((language, ids))
    };

    let Some((lang_a, ids_a)) = side(&refs[0]) else {
        warn!("Cannot place link target '{}' in any language", refs[0]);
        return None;
    };
    let Some((lang_b, ids_b)) = side(&refs[1]) else {
        warn!("Cannot place link target '{}' in any language", refs[1]);
        return None;
    };
    if lang_a == lang_b {
        warn!("Skipping link whose both sides are in '{}'", lang_a);
        return None;
    }

    let raw = link
        .attr("type")
        .or_else(|| joins.category(&refs[0]))
        .or_else(|| joins.category(&refs[1]));
    let category = match raw {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("{}; using {}", e, Category::default());
            Category::default()
        }),
        None => Category::default(),
    };

    Some(ResolvedLink {
        lang_a,
        ids_a,
        lang_b,
        ids_b,
        category,
    })
}

/// Hands out sequential join ids that do not clash with ids already in use.
#[derive(Debug, Default)]
pub struct JoinAllocator {
    next: usize,
    taken: HashSet<String>,
}

impl JoinAllocator {
    pub fn new(taken: impl IntoIterator<Item = String>) -> Self {
        Self {
            next: 0,
            taken: taken.into_iter().collect(),
        }
    }

    pub fn next_id(&mut self) -> String {
        loop {
            self.next += 1;
            let id = format!("{}{}", JOIN_ID_PREFIX, self.next);
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Reference for one side of a link: the id itself for a single element,
    /// otherwise a freshly allocated join pushed to `out`.
    pub fn side_reference(
        &mut self,
        ids: &[String],
        category: Category,
        out: &mut Vec<Element>,
    ) -> String {
        if let [single] = ids {
            return single.clone();
        }
        let id = self.next_id();
        out.push(
            tei("join")
                .with_attr("xml:id", id.clone())
                .with_attr("type", category.as_str())
                .with_attr("target", format_targets(ids)),
        );
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stand_off(inner: &str) -> Element {
        Element::parse(&format!(r#"<standOff xmlns="{}">{}</standOff>"#, TEI_NS, inner)).unwrap()
    }

    fn languages(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(id, l)| (id.to_string(), l.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_and_format_targets() {
        assert_eq!(parse_targets(" #a1  #a2 b3 "), vec!["a1", "a2", "b3"]);
        assert_eq!(format_targets(&["a1", "a2"]), "#a1 #a2");
    }

    #[test]
    fn test_resolve_through_join() {
        let so = stand_off(
            r##"<join xml:id="j1" type="Literal" target="#a1 #a2"/>
               <linkGrp type="translation"><link target="#j1 #b1"/></linkGrp>"##,
        );
        let joins = JoinIndex::from_stand_offs(std::iter::once(&so));
        assert_eq!(joins.len(), 1);
        let langs = languages(&[("a1", "en"), ("a2", "en"), ("b1", "de")]);
        let links = resolve_links(std::iter::once(&so), &joins, &langs);
        assert_eq!(
            links,
            vec![ResolvedLink {
                lang_a: "en".into(),
                ids_a: vec!["a1".into(), "a2".into()],
                lang_b: "de".into(),
                ids_b: vec!["b1".into()],
                category: Category::Literal,
            }]
        );
    }

    #[test]
    fn test_unplaceable_links_skipped() {
        let so = stand_off(
            r##"<linkGrp type="translation">
                 <link target="#zz #b1"/>
                 <link target="#a1"/>
                 <link target="#a1 #a2"/>
               </linkGrp>
               <linkGrp type="notes"><link target="#a1 #b1"/></linkGrp>"##,
        );
        let joins = JoinIndex::from_stand_offs(std::iter::once(&so));
        let langs = languages(&[("a1", "en"), ("a2", "en"), ("b1", "de")]);
        assert!(resolve_links(std::iter::once(&so), &joins, &langs).is_empty());
    }

    #[test]
    fn test_facs_joins_not_grouping_joins() {
        let so = stand_off(r##"<join facs="#img1" target="#a1 #a2"/>"##);
        assert!(JoinIndex::from_stand_offs(std::iter::once(&so)).is_empty());
        let facs = facs_joins(std::iter::once(&so));
        assert_eq!(facs["img1"], vec!["a1", "a2"]);
    }

    #[test]
    fn test_allocator_skips_taken_ids() {
        let mut alloc = JoinAllocator::new(vec!["join-1".to_string()]);
        assert_eq!(alloc.next_id(), "join-2");
        assert_eq!(alloc.next_id(), "join-3");
    }

    #[test]
    fn test_side_reference_single_id_is_direct() {
        let mut alloc = JoinAllocator::default();
        let mut out = Vec::new();
        let r = alloc.side_reference(&["a1".to_string()], Category::Other, &mut out);
        assert_eq!(r, "a1");
        assert!(out.is_empty());

        let r = alloc.side_reference(
            &["a1".to_string(), "a2".to_string()],
            Category::Semantic,
            &mut out,
        );
        assert_eq!(r, "join-1");
        assert_eq!(out[0].attr("type"), Some("Semantic"));
        assert_eq!(out[0].attr("target"), Some("#a1 #a2"));
    }
}
