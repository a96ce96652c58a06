//! Density scoring over an immutable document
//!
//! Every function here is pure: the same tree and blocks always produce the
//! same scores and the same selection. Scores only grow when plain text is
//! added and only grow when links are removed.

use super::blocks::TextBlock;
use crate::dom::{Dom, Element, NodeId};
use std::collections::BTreeMap;

/// Siblings of the top candidate scoring at least this share of it join the region
pub const SIBLING_RATIO: f64 = 0.2;

/// Blocks and siblings with more of their text inside links are boilerplate
pub const MAX_LINK_DENSITY: f64 = 0.5;

/// Ancestors that share a block's score, starting at the first credited node
const ANCESTOR_LEVELS: usize = 3;

/// Paragraph-level containers; scoring credits their parent first
const PARAGRAPH_TAGS: &[&str] = &[
    "p", "pre", "blockquote", "li", "dt", "dd", "td", "th", "caption", "figcaption", "address",
    "summary", "h1", "h2", "h3", "h4", "h5", "h6",
];

const POSITIVE_HINTS: &[&str] = &[
    "article", "body", "content", "entry", "hentry", "main", "page", "post", "story", "text",
    "blog",
];

const NEGATIVE_HINTS: &[&str] = &[
    "ad", "ads", "advert", "banner", "breadcrumb", "breadcrumbs", "comment", "comments",
    "community", "disqus", "footer", "header", "masthead", "menu", "meta", "nav", "navbar",
    "promo", "related", "share", "sharing", "sidebar", "social", "sponsor", "sponsored",
    "subscribe", "tags", "widget",
];

/// Plain (non-link) visible characters per enclosed tag
pub fn text_density(block: &TextBlock) -> f64 {
    block.plain_chars() as f64 / block.tags.max(1) as f64
}

/// Share of visible characters that sit inside anchors
pub fn link_density(chars: usize, link_chars: usize) -> f64 {
    if chars == 0 {
        0.0
    } else {
        link_chars as f64 / chars as f64
    }
}

/// Multiplier from class and id tokens that hint at content or boilerplate
pub fn class_weight(el: &Element) -> f64 {
    let tokens: Vec<String> = ["class", "id"]
        .iter()
        .filter_map(|attr| el.attr(attr))
        .flat_map(|value| value.split(|c: char| c.is_whitespace() || c == '-' || c == '_'))
        .filter(|token| !token.is_empty())
        .map(|token| token.to_ascii_lowercase())
        .collect();

    let mut weight = 1.0;
    if tokens.iter().any(|t| POSITIVE_HINTS.contains(&t.as_str())) {
        weight *= 1.25;
    }
    if tokens.iter().any(|t| NEGATIVE_HINTS.contains(&t.as_str())) {
        weight *= 0.5;
    }
    weight
}

/// Accumulated evidence for one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Block densities shared in from descendants
    pub raw: f64,
    /// Visible characters of all blocks in the subtree
    pub chars: usize,
    /// Of which inside links
    pub link_chars: usize,
    /// Class/id hint multiplier
    pub weight: f64,
}

impl Candidate {
    fn new(weight: f64) -> Self {
        Self {
            raw: 0.0,
            chars: 0,
            link_chars: 0,
            weight,
        }
    }

    pub fn link_density(&self) -> f64 {
        link_density(self.chars, self.link_chars)
    }

    pub fn score(&self) -> f64 {
        self.raw * (1.0 - self.link_density()) * self.weight
    }
}

/// Score every element that holds a block
///
/// The first credited node receives the block's density in full, its parent
/// half of it, its grandparent a third. The first credited node is the
/// block's container, or the container's parent when the container is a
/// paragraph-level element. Character counts go to all ancestors so subtree
/// link density is exact.
pub fn score_candidates(dom: &Dom, blocks: &[TextBlock]) -> BTreeMap<NodeId, Candidate> {
    let mut candidates: BTreeMap<NodeId, Candidate> = BTreeMap::new();

    for block in blocks {
        let density = text_density(block);
        let credited_from = first_credited(dom, block.container);
        let mut level: Option<usize> = None;
        let mut node = Some(block.container);

        while let Some(id) = node {
            if id == credited_from {
                level = Some(0);
            }
            if let Some(el) = dom.element(id) {
                let candidate = candidates
                    .entry(id)
                    .or_insert_with(|| Candidate::new(class_weight(el)));
                candidate.chars += block.chars;
                candidate.link_chars += block.link_chars;
                if let Some(level) = level.filter(|&l| l < ANCESTOR_LEVELS) {
                    candidate.raw += density / (level + 1) as f64;
                }
            }
            level = level.map(|l| l + 1);
            node = dom.parent(id);
        }
    }

    candidates
}

fn first_credited(dom: &Dom, container: NodeId) -> NodeId {
    let is_paragraph = dom
        .element(container)
        .is_some_and(|el| PARAGRAPH_TAGS.contains(&el.name.as_str()));
    match dom.parent(container) {
        Some(parent) if is_paragraph => parent,
        _ => container,
    }
}

/// Highest-scoring candidate; ties go to the earliest in document order
pub fn top_candidate(candidates: &BTreeMap<NodeId, Candidate>) -> Option<(NodeId, f64)> {
    candidates
        .iter()
        .map(|(&id, candidate)| (id, candidate.score()))
        .fold(None, |best, (id, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((id, score)),
        })
        .filter(|&(_, score)| score > 0.0)
}

/// Pick the content region: the top candidate plus strong siblings
///
/// Returns the region roots in document order.
pub fn select_region(dom: &Dom, candidates: &BTreeMap<NodeId, Candidate>) -> Option<Vec<NodeId>> {
    let (top, top_score) = top_candidate(candidates)?;
    let Some(parent) = dom.parent(top) else {
        return Some(vec![top]);
    };

    let threshold = top_score * SIBLING_RATIO;
    let region = dom
        .children(parent)
        .iter()
        .copied()
        .filter(|&child| {
            child == top
                || candidates.get(&child).is_some_and(|c| {
                    c.score() >= threshold && c.link_density() < MAX_LINK_DENSITY
                })
        })
        .collect();
    Some(region)
}
