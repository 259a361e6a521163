use crate::parser::{Element, HtmlNode};

/// The fixed switches of the HTML to Markdown renderer. Everything is
/// rendered by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Render anchors as their text only.
    pub ignore_links: bool,
    /// Drop images entirely.
    pub ignore_images: bool,
    /// Drop `*`, `**` and `~~` delimiters.
    pub ignore_emphasis: bool,
    /// Keep tables as HTML instead of pipe tables.
    pub bypass_tables: bool,
}

#[derive(Debug, Clone, Copy)]
enum ListType {
    Ordered(usize),
    Unordered,
}

struct ConvertContext<'a> {
    options: &'a ConvertOptions,
    list_stack: Vec<ListType>,
    in_code_block: bool,
    in_table: bool,
}

impl<'a> ConvertContext<'a> {
    fn new(options: &'a ConvertOptions) -> Self {
        Self {
            options,
            list_stack: Vec::new(),
            in_code_block: false,
            in_table: false,
        }
    }

    fn plain(&self) -> bool {
        self.in_code_block || self.options.ignore_emphasis
    }
}

pub fn convert_to_markdown(nodes: &[HtmlNode], options: &ConvertOptions) -> String {
    let mut ctx = ConvertContext::new(options);
    let output = convert_children(nodes, &mut ctx);
    tidy_blank_lines(&output)
}

fn convert_children(children: &[HtmlNode], ctx: &mut ConvertContext) -> String {
    let mut output = String::new();
    for child in children {
        match child {
            HtmlNode::Text(text) => {
                let text = process_text(text, ctx);
                if ctx.in_code_block {
                    output.push_str(&text);
                    continue;
                }
                let text = if output.ends_with(char::is_whitespace) {
                    text.trim_start()
                } else {
                    text.as_str()
                };
                if at_line_start(&output) {
                    escape_line_start(text, &mut output);
                } else {
                    output.push_str(text);
                }
            }
            HtmlNode::Element(elem) => {
                let rendered = convert_element(elem, ctx);
                if rendered.is_empty() {
                    continue;
                }
                if !ctx.in_code_block && !ctx.in_table && starts_block(&elem.tag, ctx) {
                    ensure_blank_line(&mut output);
                }
                output.push_str(&rendered);
            }
        }
    }
    output
}

fn convert_element(elem: &Element, ctx: &mut ConvertContext) -> String {
    match elem.tag.as_str() {
        "h1" => convert_heading(elem, ctx, 1),
        "h2" => convert_heading(elem, ctx, 2),
        "h3" => convert_heading(elem, ctx, 3),
        "h4" => convert_heading(elem, ctx, 4),
        "h5" => convert_heading(elem, ctx, 5),
        "h6" => convert_heading(elem, ctx, 6),
        "p" | "div" | "section" | "article" | "aside" | "main" | "header" | "footer" | "nav"
        | "figure" | "figcaption" | "address" | "dl" | "dt" | "dd" | "details" | "summary" => {
            block(convert_children(&elem.children, ctx).trim())
        }
        "br" => {
            if ctx.in_code_block {
                "\n".to_string()
            } else if ctx.in_table {
                " ".to_string()
            } else {
                "  \n".to_string()
            }
        }
        "hr" => "---\n\n".to_string(),
        "strong" | "b" => emphasize(elem, ctx, "**"),
        "em" | "i" => emphasize(elem, ctx, "*"),
        "del" | "s" | "strike" => emphasize(elem, ctx, "~~"),
        "code" | "kbd" | "samp" | "tt" => convert_inline_code(elem, ctx),
        "pre" => convert_code_block(elem, ctx),
        "a" => convert_link(elem, ctx),
        "img" => convert_image(elem, ctx),
        "ul" => convert_list(elem, ctx, false),
        "ol" => convert_list(elem, ctx, true),
        "li" => convert_list_item(elem, ctx),
        "blockquote" => convert_blockquote(elem, ctx),
        "table" => convert_table(elem, ctx),
        "head" | "svg" | "canvas" | "iframe" | "object" => String::new(),
        _ => convert_children(&elem.children, ctx),
    }
}

fn starts_block(tag: &str, ctx: &ConvertContext) -> bool {
    match tag {
        "ul" | "ol" => ctx.list_stack.is_empty(),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "div" | "section" | "article" | "aside"
        | "main" | "header" | "footer" | "nav" | "figure" | "figcaption" | "address" | "dl"
        | "dt" | "dd" | "details" | "summary" | "hr" | "pre" | "blockquote" | "table" => true,
        _ => false,
    }
}

fn block(content: &str) -> String {
    if content.is_empty() {
        String::new()
    } else {
        format!("{content}\n\n")
    }
}

fn ensure_blank_line(output: &mut String) {
    let kept = output.trim_end().len();
    output.truncate(kept);
    if !output.is_empty() {
        output.push_str("\n\n");
    }
}

fn convert_heading(elem: &Element, ctx: &mut ConvertContext, level: usize) -> String {
    let content = convert_children(&elem.children, ctx);
    let mut line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.is_empty() {
        return String::new();
    }
    if ctx.in_table {
        return line;
    }
    // a trailing run of '#' would be read as a closing sequence
    let unhashed = line.trim_end_matches('#').len();
    if unhashed < line.len() && !line[..unhashed].ends_with('\\') {
        line.insert(unhashed, '\\');
    }
    format!("{} {}\n\n", "#".repeat(level), line)
}

fn emphasize(elem: &Element, ctx: &mut ConvertContext, delimiter: &str) -> String {
    let content = convert_children(&elem.children, ctx);
    if ctx.plain() {
        return content;
    }
    let (leading, core, trailing) = split_padding(&content);
    if core.is_empty() {
        return content;
    }
    format!("{leading}{delimiter}{core}{delimiter}{trailing}")
}

fn convert_inline_code(elem: &Element, ctx: &mut ConvertContext) -> String {
    if ctx.in_code_block {
        return convert_children(&elem.children, ctx);
    }

    ctx.in_code_block = true;
    let content = convert_children(&elem.children, ctx);
    ctx.in_code_block = false;

    let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if content.is_empty() {
        return String::new();
    }
    let fence = "`".repeat(longest_run(&content, '`') + 1);
    if content.starts_with('`') || content.ends_with('`') {
        format!("{fence} {content} {fence}")
    } else {
        format!("{fence}{content}{fence}")
    }
}

fn convert_code_block(elem: &Element, ctx: &mut ConvertContext) -> String {
    let was_in_code = ctx.in_code_block;
    ctx.in_code_block = true;
    let content = convert_children(&elem.children, ctx);
    ctx.in_code_block = was_in_code;

    if was_in_code {
        return content;
    }

    let content = content.strip_prefix('\n').unwrap_or(&content).trim_end();
    if ctx.in_table {
        return content.to_string();
    }

    let fence = "`".repeat(longest_run(content, '`').max(2) + 1);
    let language = code_language(elem).unwrap_or_default();
    format!("{fence}{language}\n{content}\n{fence}\n\n")
}

fn code_language(pre: &Element) -> Option<&str> {
    language_class(pre).or_else(|| {
        pre.children.iter().find_map(|child| match child {
            HtmlNode::Element(code) if code.tag == "code" => language_class(code),
            _ => None,
        })
    })
}

fn language_class(elem: &Element) -> Option<&str> {
    elem.attr("class")?.split_whitespace().find_map(|class| {
        class
            .strip_prefix("language-")
            .or_else(|| class.strip_prefix("lang-"))
    })
}

fn convert_link(elem: &Element, ctx: &mut ConvertContext) -> String {
    let content = convert_children(&elem.children, ctx);
    if ctx.options.ignore_links || ctx.in_code_block {
        return content;
    }

    let Some(href) = elem.attr("href").map(str::trim).filter(|href| !href.is_empty()) else {
        return content;
    };

    let (leading, core, trailing) = split_padding(&content);
    let label = if core.is_empty() {
        escape_inline(href)
    } else {
        core.to_string()
    };
    format!(
        "{leading}[{label}]({}{}){trailing}",
        link_destination(href),
        link_title(elem)
    )
}

fn convert_image(elem: &Element, ctx: &mut ConvertContext) -> String {
    if ctx.options.ignore_images || ctx.in_code_block {
        return String::new();
    }
    let Some(src) = elem.attr("src").map(str::trim).filter(|src| !src.is_empty()) else {
        return String::new();
    };

    let alt = escape_inline(
        &elem
            .attr("alt")
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    );
    format!("![{alt}]({}{})", link_destination(src), link_title(elem))
}

fn link_destination(url: &str) -> String {
    if url.contains(|ch: char| ch.is_whitespace() || ch == '(' || ch == ')') {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url.to_string()
    }
}

fn link_title(elem: &Element) -> String {
    elem.attr("title")
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(|title| format!(" \"{}\"", title.replace('"', "\\\"")))
        .unwrap_or_default()
}

fn convert_list(elem: &Element, ctx: &mut ConvertContext, ordered: bool) -> String {
    let nested = !ctx.list_stack.is_empty();
    let list_type = if ordered {
        let start = elem
            .attr("start")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(1);
        ListType::Ordered(start)
    } else {
        ListType::Unordered
    };

    ctx.list_stack.push(list_type);
    let content = convert_children(&elem.children, ctx);
    ctx.list_stack.pop();

    let content = content.trim_end();
    if content.trim_start().is_empty() {
        String::new()
    } else if nested {
        format!("\n{content}")
    } else {
        format!("{content}\n\n")
    }
}

/// Renders one item. Continuation lines, nested lists included, are indented
/// to the item's content column so they stay inside the item.
fn convert_list_item(elem: &Element, ctx: &mut ConvertContext) -> String {
    let marker = match ctx.list_stack.last_mut() {
        Some(ListType::Ordered(num)) => {
            let current = *num;
            *num += 1;
            format!("{current}. ")
        }
        Some(ListType::Unordered) | None => "- ".to_string(),
    };

    let content = convert_children(&elem.children, ctx);
    let content = content.trim();
    if content.is_empty() {
        return format!("{}\n", marker.trim_end());
    }

    let pad = " ".repeat(marker.len());
    let mut item = String::new();
    for (idx, line) in content.lines().enumerate() {
        if idx == 0 {
            item.push_str(&marker);
        } else if !line.is_empty() {
            item.push_str(&pad);
        }
        item.push_str(line);
        item.push('\n');
    }
    item
}

fn convert_blockquote(elem: &Element, ctx: &mut ConvertContext) -> String {
    let content = convert_children(&elem.children, ctx);
    let content = content.trim();
    if content.is_empty() {
        return String::new();
    }
    if ctx.in_table {
        return content.to_string();
    }

    let quoted: Vec<String> = content
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">".to_string()
            } else {
                format!("> {line}")
            }
        })
        .collect();
    format!("{}\n\n", quoted.join("\n"))
}

fn convert_table(elem: &Element, ctx: &mut ConvertContext) -> String {
    if ctx.options.bypass_tables {
        let mut html = String::new();
        render_element(elem, &mut html);
        return format!("{html}\n\n");
    }

    let was_in_table = ctx.in_table;
    ctx.in_table = true;

    let mut caption = String::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    collect_rows(elem, ctx, &mut rows, &mut caption);

    ctx.in_table = was_in_table;

    if rows.is_empty() {
        return block(caption.trim());
    }
    if was_in_table {
        // Nested tables collapse into their cell as plain text.
        return rows
            .iter()
            .map(|row| row.join(" "))
            .collect::<Vec<_>>()
            .join(" ");
    }

    let max_cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(max_cols, String::new());
    }

    let mut output = String::new();
    let caption = caption.trim();
    if !caption.is_empty() {
        output.push_str(caption);
        output.push_str("\n\n");
    }
    for (idx, row) in rows.iter().enumerate() {
        output.push('|');
        for cell in row {
            // cells are split before inline parsing, so code spans need it too
            output.push(' ');
            output.push_str(&cell.replace('|', "\\|"));
            output.push_str(" |");
        }
        output.push('\n');
        if idx == 0 {
            output.push('|');
            output.push_str(&" --- |".repeat(row.len()));
            output.push('\n');
        }
    }
    output.push('\n');
    output
}

fn collect_rows(
    elem: &Element,
    ctx: &mut ConvertContext,
    rows: &mut Vec<Vec<String>>,
    caption: &mut String,
) {
    for child in &elem.children {
        let HtmlNode::Element(child) = child else {
            continue;
        };
        match child.tag.as_str() {
            "tr" => {
                let cells: Vec<String> = child
                    .children
                    .iter()
                    .filter_map(|cell| match cell {
                        HtmlNode::Element(cell) if cell.tag == "td" || cell.tag == "th" => {
                            Some(cell)
                        }
                        _ => None,
                    })
                    .map(|cell| {
                        convert_children(&cell.children, ctx)
                            .split_whitespace()
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect();
                if !cells.is_empty() {
                    rows.push(cells);
                }
            }
            "thead" | "tbody" | "tfoot" => collect_rows(child, ctx, rows, caption),
            "caption" => caption.push_str(&convert_children(&child.children, ctx)),
            _ => {}
        }
    }
}

fn render_element(elem: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&elem.tag);
    for attr in &elem.attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&escape_html(&attr.value, true));
        out.push('"');
    }
    out.push('>');
    if matches!(elem.tag.as_str(), "br" | "img" | "hr" | "col" | "wbr") {
        return;
    }
    for child in &elem.children {
        match child {
            HtmlNode::Text(text) => out.push_str(&escape_html(text, false)),
            HtmlNode::Element(child) => render_element(child, out),
        }
    }
    out.push_str("</");
    out.push_str(&elem.tag);
    out.push('>');
}

fn escape_html(text: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Collapses whitespace and escapes characters Markdown would otherwise read
/// as inline syntax. Code is passed through untouched.
fn process_text(text: &str, ctx: &ConvertContext) -> String {
    if ctx.in_code_block {
        return text.to_string();
    }

    let mut collapsed = String::with_capacity(text.len());
    let mut pending_space = false;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            collapsed.push(' ');
            pending_space = false;
        }
        push_escaped(&mut collapsed, ch, &text[idx + ch.len_utf8()..]);
    }
    if pending_space {
        collapsed.push(' ');
    }
    collapsed
}

fn escape_inline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        push_escaped(&mut escaped, ch, &text[idx + ch.len_utf8()..]);
    }
    escaped
}

fn push_escaped(out: &mut String, ch: char, rest: &str) {
    let needs_escape = match ch {
        '\\' | '*' | '_' | '`' | '[' | ']' | '~' => true,
        '<' => rest.starts_with(|next: char| next.is_ascii_alphabetic() || "/!?".contains(next)),
        '&' => looks_like_entity(rest),
        _ => false,
    };
    if needs_escape {
        out.push('\\');
    }
    out.push(ch);
}

fn looks_like_entity(rest: &str) -> bool {
    let name = rest.strip_prefix('#').unwrap_or(rest);
    let len = name
        .find(|ch: char| !ch.is_ascii_alphanumeric())
        .unwrap_or(name.len());
    len > 0 && name[len..].starts_with(';')
}

fn at_line_start(output: &str) -> bool {
    let rest = output.trim_end_matches(' ');
    rest.is_empty() || rest.ends_with('\n')
}

/// Pushes `text`, escaping a leading block marker: headings, quotes, bullets,
/// setext underlines and `1.` / `1)` ordinals.
fn escape_line_start(text: &str, out: &mut String) {
    let body = text.trim_start();
    let (indent, body) = text.split_at(text.len() - body.len());
    out.push_str(indent);

    let digits = body.bytes().take_while(u8::is_ascii_digit).count();
    let split_at = match body.as_bytes().first() {
        Some(b'#' | b'>' | b'-' | b'+' | b'=') => Some(0),
        Some(b'0'..=b'9')
            if digits <= 9
                && matches!(body.as_bytes().get(digits), Some(b'.' | b')'))
                && body[digits + 1..]
                    .chars()
                    .next()
                    .is_none_or(char::is_whitespace) =>
        {
            Some(digits)
        }
        _ => None,
    };
    match split_at {
        Some(at) => {
            out.push_str(&body[..at]);
            out.push('\\');
            out.push_str(&body[at..]);
        }
        None => out.push_str(body),
    }
}

fn split_padding(content: &str) -> (&str, &str, &str) {
    let core = content.trim();
    if core.is_empty() {
        return ("", "", "");
    }
    let start = content.len() - content.trim_start().len();
    let end = start + core.len();
    let leading = if start > 0 { " " } else { "" };
    let trailing = if end < content.len() { " " } else { "" };
    (leading, core, trailing)
}

fn longest_run(text: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Collapses runs of blank lines outside fenced code and trims the document.
fn tidy_blank_lines(markdown: &str) -> String {
    let mut output = String::with_capacity(markdown.len());
    let mut fence: Option<String> = None;
    let mut previous_blank = false;

    for line in markdown.lines() {
        let trimmed = line.trim_start();
        match &fence {
            Some(open) => {
                if trimmed.trim_end() == open {
                    fence = None;
                }
            }
            None => {
                if trimmed.starts_with("```") {
                    let width = trimmed.chars().take_while(|&ch| ch == '`').count();
                    fence = Some("`".repeat(width));
                } else if line.trim().is_empty() {
                    if previous_blank {
                        continue;
                    }
                    previous_blank = true;
                    output.push('\n');
                    continue;
                }
            }
        }
        previous_blank = false;
        output.push_str(line);
        output.push('\n');
    }

    output.trim().to_string()
}
