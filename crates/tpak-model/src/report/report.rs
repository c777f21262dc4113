//! Minimal HTML report container: a titled page made of sections, each a
//! list of maud blocks and inline Plotly charts.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";

const STYLE: &str = "
body { font-family: 'Segoe UI', sans-serif; margin: 0; background: #f4f6f8; color: #1d2b36; }
header { background: #1f3c4d; color: #fff; padding: 18px 32px; }
header p { margin: 4px 0 0; opacity: 0.8; }
nav { background: #243b55; padding: 8px 32px; }
nav a { color: #ffcc70; margin-right: 18px; text-decoration: none; font-weight: 600; }
section { background: #fff; margin: 24px 32px; padding: 20px 26px; border-radius: 12px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); }
table { border-collapse: collapse; }
th, td { padding: 4px 10px; border-bottom: 1px solid #dde3e8; text-align: right; }
th:first-child, td:first-child { text-align: left; }
.banner { padding: 10px 14px; border-radius: 8px; margin-bottom: 12px; }
.banner.ok { background: #e3f6e8; }
.banner.warn { background: #fff3cd; }
.banner.error { background: #fde2e1; color: #8a1c1c; }
.metric { display: inline-block; min-width: 120px; margin-right: 16px; padding: 12px; border-radius: 10px; background: #eef2f5; }
.metric b { display: block; font-size: 1.4rem; }
.result { font-size: 3rem; font-weight: 800; color: #c77d00; }
footer { margin: 24px 32px; font-size: 0.85rem; opacity: 0.7; }
";

pub struct ReportSection {
    title: String,
    blocks: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(content);
    }

    pub fn add_plot(&mut self, plot: Plot) {
        self.blocks.push(PreEscaped(plot.to_inline_html(None)));
    }

    fn anchor(&self) -> String {
        self.title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect()
    }
}

pub struct Report {
    app_name: String,
    version: String,
    title: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(app_name: &str, version: &str, title: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            version: version.to_string(),
            title: title.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    pub fn render(&self) -> Markup {
        let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { (PreEscaped(STYLE)) }
                }
                body {
                    header {
                        h1 { (self.title) }
                        p { (self.app_name) " v" (self.version) }
                    }
                    nav {
                        @for sec in &self.sections {
                            a href={ "#" (sec.anchor()) } { (sec.title) }
                        }
                    }
                    @for sec in &self.sections {
                        section id=(sec.anchor()) {
                            h2 { (sec.title) }
                            @for block in &sec.blocks {
                                (block)
                            }
                        }
                    }
                    footer { "Generated " (generated) }
                }
            }
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render().into_string())
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}
