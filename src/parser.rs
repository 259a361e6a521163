use crate::entities::decode_entities;

/// Open elements allowed on the stack at once. Start tags beyond this depth
/// are dropped and their content flows into the innermost open element.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<HtmlNode>,
}

impl Element {
    fn new(tag: String) -> Self {
        Self {
            tag,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParserState {
    Data,
    StartTag,
    EndTag,
    BeforeAttrName,
    BeforeAttrValue,
    AttrValueQuoted(char),
    AttrValueUnquoted,
    SelfClosingStart,
    Comment,
}

/// Best-effort fragment parser. Unclosed elements are closed at end of input,
/// unmatched end tags are dropped, and a `<` that cannot start a tag is text.
pub struct HtmlParser {
    input: Vec<char>,
    pos: usize,
    state: ParserState,
    text: String,
    open: Vec<Element>,
    root: Vec<HtmlNode>,
}

impl HtmlParser {
    pub fn new(html: &str) -> Self {
        Self {
            input: html.chars().collect(),
            pos: 0,
            state: ParserState::Data,
            text: String::new(),
            open: Vec::new(),
            root: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Vec<HtmlNode> {
        while self.pos < self.input.len() {
            self.step();
        }
        self.flush_text();

        while let Some(elem) = self.open.pop() {
            self.append(HtmlNode::Element(elem));
        }
        self.root
    }

    fn step(&mut self) {
        match self.state {
            ParserState::Data => self.consume_data(),
            ParserState::StartTag => self.consume_start_tag(),
            ParserState::EndTag => self.consume_end_tag(),
            ParserState::BeforeAttrName => self.consume_attr_name(),
            ParserState::BeforeAttrValue => self.consume_attr_value_start(),
            ParserState::AttrValueQuoted(quote) => self.consume_quoted_value(quote),
            ParserState::AttrValueUnquoted => self.consume_unquoted_value(),
            ParserState::SelfClosingStart => self.consume_self_closing(),
            ParserState::Comment => self.consume_comment(),
        }
    }

    fn consume_data(&mut self) {
        while let Some(ch) = self.peek(0) {
            if ch != '<' {
                self.text.push(ch);
                self.pos += 1;
                continue;
            }

            match self.peek(1) {
                Some(next) if next.is_ascii_alphabetic() => {
                    self.flush_text();
                    self.pos += 1;
                    self.state = ParserState::StartTag;
                    return;
                }
                Some('/') if self.peek(2).is_some_and(|c| c.is_ascii_alphabetic()) => {
                    self.flush_text();
                    self.pos += 2;
                    self.state = ParserState::EndTag;
                    return;
                }
                Some('!') if self.starts_with_at(self.pos + 2, "--") => {
                    self.flush_text();
                    self.pos += 4;
                    self.state = ParserState::Comment;
                    return;
                }
                Some('!') | Some('?') => {
                    // doctype, CDATA, processing instructions
                    self.flush_text();
                    self.skip_past('>');
                }
                _ => {
                    self.text.push('<');
                    self.pos += 1;
                }
            }
        }
    }

    fn consume_start_tag(&mut self) {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == ':')
        {
            self.pos += 1;
        }
        let tag = self.slice(start, self.pos).to_ascii_lowercase();

        self.close_implied_by(&tag);
        // Attributes still land on the element; finish_start_tag drops it
        // again when it sits past the depth limit.
        self.open.push(Element::new(tag));
        self.state = ParserState::BeforeAttrName;
    }

    fn consume_end_tag(&mut self) {
        let start = self.pos;
        self.skip_past('>');
        let raw = self.slice(start, self.pos);
        let tag = raw
            .trim_end_matches('>')
            .split(|ch: char| ch.is_whitespace() || ch == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        self.close_element(&tag);
        self.state = ParserState::Data;
    }

    fn consume_attr_name(&mut self) {
        self.skip_whitespace();
        match self.peek(0) {
            None => {}
            Some('>') => {
                self.pos += 1;
                self.finish_start_tag();
            }
            Some('/') => {
                self.pos += 1;
                self.state = ParserState::SelfClosingStart;
            }
            Some(_) => {
                let start = self.pos;
                while self
                    .peek(0)
                    .is_some_and(|ch| !(ch == '=' || ch == '>' || ch == '/' || ch.is_whitespace()))
                {
                    self.pos += 1;
                }
                // a lone '=' would otherwise stall
                if self.pos == start {
                    self.pos += 1;
                }
                let name = self.slice(start, self.pos).to_ascii_lowercase();
                if let Some(elem) = self.open.last_mut() {
                    elem.attrs.push(Attr {
                        name,
                        value: String::new(),
                    });
                }

                self.skip_whitespace();
                if self.peek(0) == Some('=') {
                    self.pos += 1;
                    self.state = ParserState::BeforeAttrValue;
                }
            }
        }
    }

    fn consume_attr_value_start(&mut self) {
        self.skip_whitespace();
        match self.peek(0) {
            None => {}
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.state = ParserState::AttrValueQuoted(quote);
            }
            Some('>') => {
                self.pos += 1;
                self.finish_start_tag();
            }
            Some(_) => self.state = ParserState::AttrValueUnquoted,
        }
    }

    fn consume_quoted_value(&mut self, quote: char) {
        let start = self.pos;
        while self.peek(0).is_some_and(|ch| ch != quote) {
            self.pos += 1;
        }
        let value = self.slice(start, self.pos);
        self.set_attr_value(&value);
        if self.pos < self.input.len() {
            self.pos += 1;
        }
        self.state = ParserState::BeforeAttrName;
    }

    fn consume_unquoted_value(&mut self) {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|ch| !(ch == '>' || ch.is_whitespace()))
        {
            self.pos += 1;
        }
        let value = self.slice(start, self.pos);
        self.set_attr_value(&value);
        self.state = ParserState::BeforeAttrName;
    }

    fn consume_self_closing(&mut self) {
        self.skip_whitespace();
        if self.peek(0) != Some('>') {
            self.state = ParserState::BeforeAttrName;
            return;
        }
        self.pos += 1;
        if let Some(elem) = self.open.pop() {
            self.append(HtmlNode::Element(elem));
        }
        self.state = ParserState::Data;
    }

    fn consume_comment(&mut self) {
        while self.pos < self.input.len() {
            if self.starts_with_at(self.pos, "-->") {
                self.pos += 3;
                break;
            }
            self.pos += 1;
        }
        self.state = ParserState::Data;
    }

    fn set_attr_value(&mut self, raw: &str) {
        if let Some(attr) = self.open.last_mut().and_then(|elem| elem.attrs.last_mut()) {
            attr.value = decode_entities(raw).into_owned();
        }
    }

    fn finish_start_tag(&mut self) {
        self.state = ParserState::Data;
        let Some(tag) = self.open.last().map(|elem| elem.tag.clone()) else {
            return;
        };

        if is_void_element(&tag) {
            if let Some(elem) = self.open.pop() {
                self.append(HtmlNode::Element(elem));
            }
        } else if is_raw_text_element(&tag) {
            self.skip_raw_text(&tag);
            self.open.pop();
        } else if self.open.len() > MAX_NESTING_DEPTH {
            self.open.pop();
        }
    }

    fn close_element(&mut self, tag: &str) {
        let Some(index) = self.open.iter().rposition(|elem| elem.tag == tag) else {
            return;
        };
        self.pop_to(index);
    }

    /// Applies the end tags HTML lets authors omit, e.g. `<li>a<li>b`.
    fn close_implied_by(&mut self, tag: &str) {
        let (targets, boundaries): (&[&str], &[&str]) = match tag {
            "li" => (&["li"], &["ul", "ol", "menu"]),
            "dt" | "dd" => (&["dt", "dd"], &["dl"]),
            "tr" => (&["tr"], &["table", "thead", "tbody", "tfoot"]),
            "td" | "th" => (&["td", "th"], &["tr", "table"]),
            "thead" | "tbody" | "tfoot" => (&["thead", "tbody", "tfoot"], &["table"]),
            tag if closes_paragraph(tag) => (&["p"], P_SCOPE_BOUNDARIES),
            _ => return,
        };

        for index in (0..self.open.len()).rev() {
            let open_tag = self.open[index].tag.as_str();
            if targets.contains(&open_tag) {
                self.pop_to(index);
                return;
            }
            if boundaries.contains(&open_tag) {
                return;
            }
        }
    }

    fn pop_to(&mut self, index: usize) {
        while self.open.len() > index {
            if let Some(elem) = self.open.pop() {
                self.append(HtmlNode::Element(elem));
            }
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.text);
        let decoded = decode_entities(&raw).into_owned();

        let structural_parent = self
            .open
            .last()
            .is_some_and(|elem| STRUCTURAL_TAGS.contains(&elem.tag.as_str()));
        if decoded.trim().is_empty() && structural_parent {
            return;
        }
        self.append(HtmlNode::Text(decoded));
    }

    fn append(&mut self, node: HtmlNode) {
        let siblings = match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.root,
        };
        if let (HtmlNode::Text(new), Some(HtmlNode::Text(prev))) = (&node, siblings.last_mut()) {
            prev.push_str(new);
            return;
        }
        siblings.push(node);
    }

    fn skip_raw_text(&mut self, tag: &str) {
        while self.pos < self.input.len() {
            if self.peek(0) == Some('<')
                && self.peek(1) == Some('/')
                && self.matches_ignore_case_at(self.pos + 2, tag)
            {
                self.skip_past('>');
                return;
            }
            self.pos += 1;
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.input[start..end].iter().collect()
    }

    fn starts_with_at(&self, index: usize, pattern: &str) -> bool {
        let mut at = index;
        for expected in pattern.chars() {
            if self.input.get(at) != Some(&expected) {
                return false;
            }
            at += 1;
        }
        true
    }

    fn matches_ignore_case_at(&self, index: usize, pattern: &str) -> bool {
        let mut at = index;
        for expected in pattern.chars() {
            match self.input.get(at) {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => at += 1,
                _ => return false,
            }
        }
        !self
            .input
            .get(at)
            .is_some_and(|ch| ch.is_ascii_alphanumeric())
    }

    fn skip_whitespace(&mut self) {
        while self.peek(0).is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn skip_past(&mut self, target: char) {
        while let Some(ch) = self.peek(0) {
            self.pos += 1;
            if ch == target {
                break;
            }
        }
    }
}

// Whitespace-only text directly inside these is layout, not content.
const STRUCTURAL_TAGS: &[&str] = &[
    "html", "head", "body", "table", "thead", "tbody", "tfoot", "tr", "colgroup", "ul", "ol",
    "dl", "menu", "select",
];

const P_SCOPE_BOUNDARIES: &[&str] = &[
    "div", "section", "article", "aside", "main", "header", "footer", "nav", "blockquote", "li",
    "dd", "td", "th", "table", "ul", "ol", "dl", "figure", "form", "button", "body", "html",
];

fn closes_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "section"
            | "article"
            | "aside"
            | "main"
            | "header"
            | "footer"
            | "nav"
            | "blockquote"
            | "pre"
            | "ul"
            | "ol"
            | "dl"
            | "table"
            | "hr"
            | "figure"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
    )
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_element(tag: &str) -> bool {
    matches!(
        tag,
        "script" | "style" | "noscript" | "template" | "title" | "textarea"
    )
}

pub fn parse_html(html: &str) -> Vec<HtmlNode> {
    HtmlParser::new(html).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &HtmlNode) -> &Element {
        match node {
            HtmlNode::Element(elem) => elem,
            HtmlNode::Text(text) => panic!("expected element, got text {text:?}"),
        }
    }

    fn tags(nodes: &[HtmlNode]) -> Vec<&str> {
        nodes
            .iter()
            .filter_map(|node| match node {
                HtmlNode::Element(elem) => Some(elem.tag.as_str()),
                HtmlNode::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn builds_nested_tree_with_attributes() {
        let nodes =
            parse_html(r#"<p class=intro>Hi <a href="/x?a=1&amp;b=2" title='T'>there</a></p>"#);
        let p = element(&nodes[0]);
        assert_eq!(p.tag, "p");
        assert_eq!(p.attr("class"), Some("intro"));
        assert_eq!(p.children[0], HtmlNode::Text("Hi ".to_string()));
        let a = element(&p.children[1]);
        assert_eq!(a.attr("href"), Some("/x?a=1&b=2"));
        assert_eq!(a.attr("title"), Some("T"));
    }

    #[test]
    fn unclosed_elements_close_at_end_of_input() {
        let nodes = parse_html("<div><p>open <b>bold");
        let div = element(&nodes[0]);
        let p = element(&div.children[0]);
        assert_eq!(tags(&p.children), vec!["b"]);
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let nodes = parse_html("a</span>b");
        assert_eq!(nodes, vec![HtmlNode::Text("ab".to_string())]);
    }

    #[test]
    fn implied_end_tags_split_list_items_and_cells() {
        let nodes = parse_html("<ul><li>one<li>two</ul><table><tr><td>a<td>b<tr><td>c</table>");
        let ul = element(&nodes[0]);
        assert_eq!(tags(&ul.children), vec!["li", "li"]);
        let table = element(&nodes[1]);
        assert_eq!(tags(&table.children), vec!["tr", "tr"]);
        assert_eq!(tags(&element(&table.children[0]).children), vec!["td", "td"]);
    }

    #[test]
    fn script_style_and_comments_are_dropped() {
        let nodes = parse_html("<script>if (a < b) {}</script><!-- note -->text<style>p{}</style>");
        assert_eq!(nodes, vec![HtmlNode::Text("text".to_string())]);
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse_html("1 < 2 and 3 <= 4");
        assert_eq!(nodes, vec![HtmlNode::Text("1 < 2 and 3 <= 4".to_string())]);
    }

    #[test]
    fn void_and_self_closing_elements_have_no_children() {
        let nodes = parse_html("<img src=a.png alt=x><br/>after");
        assert_eq!(tags(&nodes), vec!["img", "br"]);
        assert_eq!(nodes[2], HtmlNode::Text("after".to_string()));
    }

    #[test]
    fn whitespace_between_table_rows_is_dropped() {
        let nodes = parse_html("<table>\n  <tr>\n    <td>x</td>\n  </tr>\n</table>");
        let table = element(&nodes[0]);
        assert_eq!(table.children.len(), 1);
    }

    #[test]
    fn nesting_is_capped_without_losing_text() {
        let html = format!("{}hello", "<div>".repeat(MAX_NESTING_DEPTH + 10));
        let nodes = parse_html(&html);

        let mut depth = 0;
        let mut current = &nodes;
        while let Some(HtmlNode::Element(elem)) = current.first() {
            depth += 1;
            current = &elem.children;
        }
        assert_eq!(depth, MAX_NESTING_DEPTH);
        assert_eq!(current, &vec![HtmlNode::Text("hello".to_string())]);
    }

    #[test]
    fn void_elements_past_the_cap_are_kept_as_leaves() {
        let html = format!("{}<img src=deep.png>", "<span>".repeat(MAX_NESTING_DEPTH));
        let nodes = parse_html(&html);

        let mut current = &nodes;
        for _ in 0..MAX_NESTING_DEPTH {
            current = &element(&current[0]).children;
        }
        assert_eq!(element(&current[0]).attr("src"), Some("deep.png"));
    }
}
