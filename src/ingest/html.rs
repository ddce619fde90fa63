//! Minimal HTML element tree for positional scraping.
//!
//! The forecast page has no ids or classes to select on, so it is read by
//! fixed child-index paths. For those paths to line up with what a browser
//! shows in its inspector, the tree follows the DOM rules that change element
//! positions:
//! - only elements count as children (text is kept for `text_content`)
//! - void elements (`br`, `img`, `meta`, ...) never have children
//! - `<tr>` directly inside `<table>` gets an implicit `<tbody>`
//! - unclosed `p`, `li`, `option`, `td`, `th`, `tr` are closed implicitly
//! - a stray `</p>` becomes an empty `<p>`, and `</br>` becomes a `<br>`
//!
//! Anything else is parsed tolerantly: other unmatched closing tags are
//! dropped and unclosed elements are closed at end of input.

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub nodes: Vec<Node>,
}

impl Element {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), nodes: Vec::new() }
    }

    /// Child elements, skipping text.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, index: usize) -> Option<&Element> {
        self.children().nth(index)
    }

    /// Follows a child-index path. Returns the depth at which the path broke
    /// on failure.
    pub fn descend(&self, path: &[usize]) -> Result<&Element, usize> {
        let mut current = self;
        for (depth, &index) in path.iter().enumerate() {
            current = current.child(index).ok_or(depth)?;
        }
        Ok(current)
    }

    /// First descendant (depth-first, including self) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children().find_map(|c| c.find(name))
    }

    /// Concatenated text of all descendants, like DOM `textContent`.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.nodes {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Block-level openers that implicitly close an open `<p>`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

/// Parses a document into a tree rooted at a synthetic `#document` element.
pub fn parse_document(html: &str) -> Element {
    let mut stack: Vec<Element> = vec![Element::new("#document")];
    let mut rest = html;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push_text(&mut stack, rest);
            break;
        };
        if lt > 0 {
            push_text(&mut stack, &rest[..lt]);
        }
        rest = &rest[lt..];

        if let Some(after) = rest.strip_prefix("<!--") {
            rest = match after.find("-->") {
                Some(end) => &after[end + 3..],
                None => "",
            };
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            rest = match rest.find('>') {
                Some(end) => &rest[end + 1..],
                None => "",
            };
            continue;
        }
        if let Some(after) = rest.strip_prefix("</") {
            let (name, consumed) = read_name(after);
            rest = match after.find('>') {
                Some(end) => &after[end + 1..],
                None => "",
            };
            if consumed > 0 {
                close_element(&mut stack, &name);
            }
            continue;
        }

        let (name, consumed) = read_name(&rest[1..]);
        if consumed == 0 {
            // A bare '<' in text.
            push_text(&mut stack, "<");
            rest = &rest[1..];
            continue;
        }
        let tag_end = find_tag_end(rest);
        rest = &rest[tag_end..];

        open_element(&mut stack, &name);

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let closing = format!("</{}", name);
            let end = rest.to_ascii_lowercase().find(&closing).unwrap_or(rest.len());
            push_text(&mut stack, &rest[..end]);
            rest = &rest[end..];
        }
    }

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    stack.pop().unwrap_or_else(|| Element::new("#document"))
}

/// The `<body>` element, or the whole document when there is none.
pub fn body(document: &Element) -> &Element {
    document.find("body").unwrap_or(document)
}

fn read_name(s: &str) -> (String, usize) {
    let len = s
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '-'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let starts_alpha = s.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false);
    if starts_alpha { (s[..len].to_ascii_lowercase(), len) } else { (String::new(), 0) }
}

/// Byte offset just past the `>` that ends the tag at the start of `s`,
/// skipping `>` inside quoted attribute values.
fn find_tag_end(s: &str) -> usize {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return i + 1,
            _ => {}
        }
    }
    s.len()
}

fn top_name(stack: &[Element]) -> &str {
    stack.last().map(|e| e.name.as_str()).unwrap_or("")
}

fn pop_into_parent(stack: &mut Vec<Element>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.nodes.push(Node::Element(done));
        }
    }
}

fn push_text(stack: &mut [Element], raw: &str) {
    if let Some(top) = stack.last_mut() {
        top.nodes.push(Node::Text(decode_entities(raw)));
    }
}

fn open_element(stack: &mut Vec<Element>, name: &str) {
    match name {
        "td" | "th" => {
            while matches!(top_name(stack), "td" | "th") {
                pop_into_parent(stack);
            }
        }
        "tr" => {
            while matches!(top_name(stack), "td" | "th" | "tr") {
                pop_into_parent(stack);
            }
            if top_name(stack) == "table" {
                stack.push(Element::new("tbody"));
            }
        }
        "tbody" | "thead" | "tfoot" => {
            while matches!(top_name(stack), "td" | "th" | "tr" | "tbody" | "thead" | "tfoot") {
                pop_into_parent(stack);
            }
        }
        "li" if top_name(stack) == "li" => pop_into_parent(stack),
        "option" if top_name(stack) == "option" => pop_into_parent(stack),
        _ if CLOSES_P.contains(&name) && top_name(stack) == "p" => pop_into_parent(stack),
        _ => {}
    }

    if VOID_ELEMENTS.contains(&name) {
        if let Some(top) = stack.last_mut() {
            top.nodes.push(Node::Element(Element::new(name)));
        }
    } else {
        stack.push(Element::new(name));
    }
}

/// Elements that stop the search for an open `<p>` when `</p>` arrives.
const P_SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

fn close_element(stack: &mut Vec<Element>, name: &str) {
    match name {
        // Browsers turn `</br>` into a `<br>` element.
        "br" => return open_element(stack, "br"),
        // A `</p>` with no open `<p>` in scope inserts an empty paragraph.
        "p" => {
            let open_p = stack
                .iter()
                .rev()
                .take_while(|e| !P_SCOPE_BOUNDARIES.contains(&e.name.as_str()))
                .any(|e| e.name == "p");
            if !open_p {
                if let Some(top) = stack.last_mut() {
                    top.nodes.push(Node::Element(Element::new("p")));
                }
                return;
            }
        }
        _ => {}
    }

    // Ignore other closing tags with no matching open element.
    let Some(pos) = stack.iter().rposition(|e| e.name == name) else {
        return;
    };
    if pos == 0 {
        return;
    }
    while stack.len() > pos {
        pop_into_parent(stack);
    }
}

/// Decodes the common named entities and numeric character references.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, semi + 1))
        });
        match decoded {
            Some((c, len)) => {
                out.push(c);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
