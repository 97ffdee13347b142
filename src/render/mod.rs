use pulldown_cmark::{html, Event, Options, Parser};

use crate::config::RenderOptions;

pub trait MarkdownRenderer {
    fn render(&self, source: &str) -> String;
}

/// CommonMark with the GitHub-flavoured extensions enabled in config. Raw HTML
/// is emitted verbatim unless `allow_raw_html` is off, in which case it is
/// escaped as text.
#[derive(Debug, Clone)]
pub struct CommonMarkRenderer {
    options: Options,
    allow_raw_html: bool,
}

impl CommonMarkRenderer {
    pub fn new(config: &RenderOptions) -> Self {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, config.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, config.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, config.tasklists);
        Self {
            options,
            allow_raw_html: config.allow_raw_html,
        }
    }
}

impl Default for CommonMarkRenderer {
    fn default() -> Self {
        Self::new(&RenderOptions::default())
    }
}

impl MarkdownRenderer for CommonMarkRenderer {
    fn render(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options);
        let mut out = String::with_capacity(source.len() + source.len() / 2);
        if self.allow_raw_html {
            html::push_html(&mut out, parser);
        } else {
            html::push_html(
                &mut out,
                parser.map(|event| match event {
                    Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
                    other => other,
                }),
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_headings_and_lists() {
        let renderer = CommonMarkRenderer::default();
        assert_eq!(renderer.render("# Groceries"), "<h1>Groceries</h1>\n");
        assert_eq!(
            renderer.render("- milk\n- eggs"),
            "<ul>\n<li>milk</li>\n<li>eggs</li>\n</ul>\n"
        );
    }

    #[test]
    fn raw_html_passes_through_by_default() {
        let renderer = CommonMarkRenderer::default();
        let html = renderer.render("<script>alert(1)</script>\n\nhi <b>there</b>");
        assert!(html.contains("<script>alert(1)</script>"));
        assert!(html.contains("<b>there</b>"));
    }

    #[test]
    fn raw_html_is_escaped_when_disallowed() {
        let renderer = CommonMarkRenderer::new(&RenderOptions {
            allow_raw_html: false,
            ..RenderOptions::default()
        });
        let html = renderer.render("<script>alert(1)</script>\n\nhi <b>there</b>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;b&gt;there&lt;/b&gt;"));
    }

    #[test]
    fn extensions_follow_config() {
        let table = "| a | b |\n|---|---|\n| 1 | 2 |";
        assert!(CommonMarkRenderer::default().render(table).contains("<table>"));

        let plain = CommonMarkRenderer::new(&RenderOptions {
            tables: false,
            ..RenderOptions::default()
        });
        assert!(!plain.render(table).contains("<table>"));

        let tasks = CommonMarkRenderer::default().render("- [x] done");
        assert!(tasks.contains("type=\"checkbox\""));
    }
}
