use crate::config::ScanConfig;
use crate::parser::html;
use crate::scan::coordinator::Scanner;
use crate::scan::report::{self, ReportEntry};
use crate::style::sheet::SheetSource;

pub mod bpk_audit {
    use super::*;

    /// One-shot scan of an HTML string plus optional extra CSS.
    ///
    /// `<link>` sheets are treated as inaccessible; pass their contents as
    /// `css_content` to have them take part in the cascade.
    pub fn audit(html_content: &str, css_content: &str, config: &ScanConfig) -> Vec<ReportEntry> {
        let document = html::create_dom_tree(html_content);
        let mut scanner = Scanner::new(config);
        if !css_content.trim().is_empty() {
            scanner = scanner.with_extra_source(SheetSource::inline("extra", css_content));
        }
        report::summarize(&scanner.scan(&document))
    }
}
