//! Boilerplate removal and text block segmentation

use crate::dom::{Dom, Element, Node, NodeId, ROOT};

/// Elements dropped with their whole subtree
const REMOVED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "canvas", "object", "embed",
    "head", "nav", "header", "footer", "aside", "form", "button", "input", "select", "textarea",
    "menu", "dialog",
];

/// Landmark roles that never hold main content
const REMOVED_ROLES: &[&str] = &[
    "navigation",
    "banner",
    "contentinfo",
    "complementary",
    "search",
    "menu",
    "menubar",
];

/// Elements that start a new block of text
const BLOCK_TAGS: &[&str] = &[
    "html", "body", "article", "main", "section", "div", "p", "pre", "blockquote", "li", "ul",
    "ol", "dl", "dt", "dd", "h1", "h2", "h3", "h4", "h5", "h6", "table", "thead", "tbody",
    "tfoot", "tr", "td", "th", "caption", "figure", "figcaption", "address", "details",
    "summary", "fieldset", "hr", "center",
];

/// A run of inline text between block boundaries
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Whitespace-normalized text
    pub text: String,
    /// Nearest block-level ancestor
    pub container: NodeId,
    /// Visible (non-whitespace) characters
    pub chars: usize,
    /// Visible characters inside anchors
    pub link_chars: usize,
    /// Enclosing block element plus inline elements opened in the run
    pub tags: usize,
}

impl TextBlock {
    /// Visible characters outside anchors
    pub fn plain_chars(&self) -> usize {
        self.chars.saturating_sub(self.link_chars)
    }
}

/// True for elements whose subtree is never content
pub fn is_boilerplate(el: &Element) -> bool {
    if REMOVED_TAGS.contains(&el.name.as_str()) {
        return true;
    }
    if el.has_attr("hidden") {
        return true;
    }
    if el
        .attr("aria-hidden")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    if let Some(role) = el.attr("role") {
        let role = role.trim().to_ascii_lowercase();
        if REMOVED_ROLES.contains(&role.as_str()) {
            return true;
        }
    }
    if let Some(style) = el.attr("style") {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        if style.contains("display:none") || style.contains("visibility:hidden") {
            return true;
        }
    }
    false
}

pub fn is_block_level(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

#[derive(Default)]
struct Run {
    words: Vec<String>,
    chars: usize,
    link_chars: usize,
    inline_tags: usize,
    pending_space: bool,
    /// `<br>`s since the last visible text
    line_breaks: usize,
}

impl Run {
    fn push_text(&mut self, text: &str, in_link: bool) {
        let visible = text.chars().filter(|c| !c.is_whitespace()).count();
        self.chars += visible;
        if in_link {
            self.link_chars += visible;
        }
        if visible > 0 {
            self.line_breaks = 0;
        }

        // Text nodes split words only where the source has whitespace.
        let starts_with_space = text.starts_with(char::is_whitespace);
        for (i, word) in text.split_whitespace().enumerate() {
            let glue = i == 0 && !starts_with_space && !self.pending_space;
            match self.words.last_mut() {
                Some(last) if glue => last.push_str(word),
                _ => self.words.push(word.to_string()),
            }
        }
        if !text.is_empty() {
            self.pending_space = text.ends_with(char::is_whitespace);
        }
    }

    fn push_break(&mut self) {
        self.pending_space = true;
    }

    fn flush(&mut self, container: NodeId, blocks: &mut Vec<TextBlock>) {
        let run = std::mem::take(self);
        if run.chars == 0 {
            return;
        }
        blocks.push(TextBlock {
            text: run.words.join(" "),
            container,
            chars: run.chars,
            link_chars: run.link_chars,
            tags: run.inline_tags + 1,
        });
    }
}

enum Step {
    Enter(NodeId),
    Leave(NodeId),
}

/// Split the content of a document into text blocks, in document order
///
/// Boilerplate subtrees are skipped entirely.
pub fn collect_blocks(dom: &Dom) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    let mut containers: Vec<NodeId> = Vec::new();
    let mut run = Run::default();
    let mut link_depth = 0usize;
    let mut stack = vec![Step::Enter(ROOT)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => match dom.node(id) {
                Node::Text(text) => run.push_text(text, link_depth > 0),
                Node::Comment(_) => {}
                Node::Element(el) => {
                    if id != ROOT && is_boilerplate(el) {
                        run.push_break();
                        continue;
                    }
                    if id == ROOT || is_block_level(&el.name) {
                        run.flush(containers.last().copied().unwrap_or(ROOT), &mut blocks);
                        containers.push(id);
                    } else {
                        run.inline_tags += 1;
                        match el.name.as_str() {
                            "br" => {
                                run.push_break();
                                run.line_breaks += 1;
                                // A blank line ends the paragraph
                                if run.line_breaks >= 2 {
                                    run.flush(containers.last().copied().unwrap_or(ROOT), &mut blocks);
                                }
                            }
                            name => {
                                run.line_breaks = 0;
                                match name {
                                    "a" => link_depth += 1,
                                    "img" | "wbr" => run.push_break(),
                                    _ => {}
                                }
                            }
                        }
                    }
                    stack.push(Step::Leave(id));
                    stack.extend(dom.children(id).iter().rev().map(|&c| Step::Enter(c)));
                }
            },
            Step::Leave(id) => {
                let Some(el) = dom.element(id) else { continue };
                if id == ROOT || is_block_level(&el.name) {
                    run.flush(containers.last().copied().unwrap_or(ROOT), &mut blocks);
                    containers.pop();
                } else if el.name == "a" {
                    link_depth = link_depth.saturating_sub(1);
                }
            }
        }
    }

    run.flush(containers.last().copied().unwrap_or(ROOT), &mut blocks);
    blocks
}
