//! A minimal element tree standing in for the page's DOM.
//!
//! Views are rebuilt from scratch on every refresh, so the tree only needs
//! construction, class-list edits, visibility toggles and rendering.

use crate::models::{PlaybackClient, PlaylistEntry};
use crate::utils::thumbnail_url;

pub const HIDDEN: &str = "hidden";

pub const MENU_ITEM_CLASSES: &[&str] = &[
    "block",
    "flex",
    "flex-row",
    "w-full",
    "whitespace-nowrap",
    "items-center",
    "px-4",
    "py-2",
    "leading-5",
    "cursor-pointer",
    "bg-neutral-800",
    "text-neutral-100",
    "hover:bg-neutral-700",
    "focus:outline-none",
    "focus:bg-neutral-500",
    "focus:text-neutral-900",
];

pub const MENU_ICON_CLASSES: &[&str] = &["material-symbols-outlined", "text-lg", "mr-1", "text-neutral-100"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList(Vec<String>);

impl ClassList {
    pub fn new(classes: &[&str]) -> Self {
        let mut list = ClassList::default();
        for class in classes {
            list.add(class);
        }
        list
    }

    pub fn add(&mut self, class: &str) {
        if !self.contains(class) {
            self.0.push(class.to_string());
        }
    }

    pub fn remove(&mut self, class: &str) {
        self.0.retain(|c| c != class);
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    /// Returns true if the class is present after the toggle.
    pub fn toggle(&mut self, class: &str) -> bool {
        if self.contains(class) {
            self.remove(class);
            false
        } else {
            self.add(class);
            true
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Text(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub classes: ClassList,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str, classes: &[&str]) -> Self {
        Self {
            tag: tag.to_string(),
            classes: ClassList::new(classes),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_class_list(tag: &str, classes: ClassList) -> Self {
        Self {
            tag: tag.to_string(),
            classes,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn is_hidden(&self) -> bool {
        self.classes.contains(HIDDEN)
    }

    pub fn show(&mut self) {
        self.classes.remove(HIDDEN);
    }

    pub fn hide(&mut self) {
        self.classes.add(HIDDEN);
    }

    pub fn toggle_hidden(&mut self) {
        self.classes.toggle(HIDDEN);
    }

    /// Concatenated text of this element and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            let classes: Vec<&str> = self.classes.iter().collect();
            out.push_str(&format!(" class=\"{}\"", escape_html(&classes.join(" "))));
        }
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(&escape_html(t)),
                Node::Element(e) => e.write_html(out),
            }
        }
        if !matches!(self.tag.as_str(), "img" | "input") {
            out.push_str(&format!("</{}>", self.tag));
        }
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// --- Views ---

/// The queued videos, each with a remove control, or a placeholder when empty.
pub fn render_playlist(entries: &[PlaylistEntry]) -> Element {
    let mut root = Element::new("div", &["playlist"]);
    if entries.is_empty() {
        root.append(
            Element::new(
                "div",
                &["w-full", "h-full", "text-center", "content-center", "font-bold", "text-4xl", "text-neutral-700"],
            )
            .child("Playlist Empty"),
        );
        return root;
    }

    let mut ul = Element::new("ul", &["pt-3", "bg-neutral-600", "rounded-xl"]);
    for entry in entries {
        let thumbnail = if entry.thumbnail_url.is_empty() {
            thumbnail_url(&entry.video_id, 0)
        } else {
            entry.thumbnail_url.clone()
        };
        let details = Element::new("div", &["flex", "flex-row"])
            .child(
                Element::new("div", &[]).child(
                    Element::new("img", &[])
                        .attr("src", thumbnail)
                        .attr("style", "width:120px;height:90px"),
                ),
            )
            .child(
                Element::new("div", &["flex", "flex-col", "pl-6"])
                    .child(Element::new("div", &[]).child(entry.title.as_str()))
                    .child(Element::new("div", &[]).child(entry.author_name.as_str())),
            );
        let remove = Element::new("button", &["material-symbols-outlined", "text-5xl", "p-3", "pl-6"])
            .attr("type", "button")
            .attr("title", "Remove Video")
            .attr("data-video-id", entry.video_id.as_str())
            .child("playlist_remove");
        ul.append(
            Element::new("li", &[]).child(
                Element::new("div", &["flex", "flex-row", "justify-between", "items-center", "pb-3"])
                    .child(details)
                    .child(Element::new("div", &[]).child(remove)),
            ),
        );
    }
    root.append(ul);
    root
}

/// The playback-client selection menu. Items carry their list index in
/// `data-index`; the first and last items get rounded corners.
pub fn render_client_menu(clients: &[PlaybackClient]) -> Element {
    let mut ul = Element::new("ul", &["pbcs"]);
    let last = clients.len().saturating_sub(1);
    for (i, client) in clients.iter().enumerate() {
        let mut li = Element::new("li", MENU_ITEM_CLASSES)
            .attr("data-index", i.to_string())
            .child(Element::new("span", &[]).child(client.name.as_str()));
        if clients.len() == 1 {
            li.classes.add("rounded-xl");
        } else if i == 0 {
            li.classes.add("rounded-t-xl");
        } else if i == last {
            li.classes.add("rounded-b-xl");
        }
        ul.append(li);
    }
    ul
}

pub fn menu_item(icon: Option<&str>, label: &str, action: &str) -> Element {
    let mut li = Element::new("li", MENU_ITEM_CLASSES).attr("data-action", action);
    if let Some(icon) = icon {
        li.append(Element::new("span", MENU_ICON_CLASSES).child(icon));
    }
    li.append(Element::new("span", &[]).child(label));
    li
}
