use pulldown_cmark::{Options, Parser, html};

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Renders Markdown into an HTML fragment. Any input renders; unrecognised
/// syntax comes through as literal text.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());

    let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut html_output, parser);

    html_output.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_block_constructs() {
        assert_eq!(render_html("# Title"), "<h1>Title</h1>");
        assert_eq!(
            render_html("- a\n- b"),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>"
        );
        assert_eq!(
            render_html("> quoted"),
            "<blockquote>\n<p>quoted</p>\n</blockquote>"
        );
        assert_eq!(
            render_html("```rust\nlet x = 1;\n```"),
            "<pre><code class=\"language-rust\">let x = 1;\n</code></pre>"
        );
    }

    #[test]
    fn renders_inline_constructs() {
        assert_eq!(
            render_html("**b** *i* `c` [l](https://x.y) ![a](p.png)"),
            "<p><strong>b</strong> <em>i</em> <code>c</code> <a href=\"https://x.y\">l</a> <img src=\"p.png\" alt=\"a\" /></p>"
        );
    }

    #[test]
    fn renders_gfm_tables_and_strikethrough() {
        let html = render_html("| a | b |\n| --- | --- |\n| 1 | 2 |\n\n~~old~~");
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("<td>1</td>"), "{html}");
        assert!(html.contains("<del>old</del>"), "{html}");
    }

    #[test]
    fn unbalanced_syntax_passes_through() {
        assert_eq!(render_html("**open [link"), "<p>**open [link</p>");
        assert_eq!(render_html(""), "");
    }
}
