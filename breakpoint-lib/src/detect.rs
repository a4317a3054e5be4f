//! The public query API.

use crate::dom::dom_tree::{self, Document};
use crate::fetch::StylesheetFetcher;
use crate::host::StyleHost;
use crate::loader::StylesheetLoader;
use crate::ready::ReadinessGate;
use crate::style::css_matcher::PseudoElement;
use crate::style::declaration::{breakpoint_name, BREAKPOINT_PROPERTY};
use crate::style::synthesized::{SynthesizedSelector, MARKER_ATTRIBUTE};
use crate::style::{BreakpointCompiler, TextCompiler};
use log::{debug, info};
use std::future::Future;
use std::rc::Rc;

/// Declarations assigned to a probe's inline style during feature detection.
/// A host with custom-property support keeps both.
pub const FEATURE_TEST: &str = "--test:#f00;color:var(--test);";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Read `--breakpoint` straight from the computed style.
    Direct,
    /// Read the `:before` content of a marker element.
    Fallback,
}

impl DetectionMode {
    fn detect(host: &dyn StyleHost) -> Self {
        if host.inline_style_length(FEATURE_TEST) == 2 {
            DetectionMode::Direct
        } else {
            DetectionMode::Fallback
        }
    }
}

pub struct BreakpointDetector {
    document: Rc<Document>,
    host: Rc<dyn StyleHost>,
    mode: DetectionMode,
    gate: ReadinessGate,
}

impl BreakpointDetector {
    /// Detects host capabilities once and, in fallback mode, starts loading
    /// the document's stylesheets.
    ///
    /// Fallback mode spawns local tasks, so it must be called from within a
    /// `tokio::task::LocalSet`.
    pub fn start(
        document: Rc<Document>,
        host: Rc<dyn StyleHost>,
        fetcher: Rc<dyn StylesheetFetcher>,
    ) -> Self {
        Self::start_with_compiler(document, host, fetcher, Rc::new(TextCompiler::new()))
    }

    pub fn start_with_compiler(
        document: Rc<Document>,
        host: Rc<dyn StyleHost>,
        fetcher: Rc<dyn StylesheetFetcher>,
        compiler: Rc<dyn BreakpointCompiler>,
    ) -> Self {
        let mode = DetectionMode::detect(host.as_ref());
        info!("breakpoint detection mode: {:?}", mode);

        let gate = ReadinessGate::new();
        match mode {
            DetectionMode::Direct => gate.open(),
            DetectionMode::Fallback => {
                StylesheetLoader::new(Rc::clone(&document), fetcher, compiler, gate.clone())
                    .load_all();
            }
        }

        BreakpointDetector {
            document,
            host,
            mode,
            gate,
        }
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    /// The computed breakpoint value for `selector`, as the host reports it.
    ///
    /// In fallback mode the value is the `content` string, quotes included.
    /// Selectors are matched by their canonical key, so any spelling of the
    /// selector used in the stylesheet works: whitespace and newlines around
    /// combinators and commas, attribute quote style and `::`/`:` on legacy
    /// pseudo-elements do not matter.
    /// Results before the gate opens may be stale.
    pub fn detect_breakpoint(&self, selector: &str) -> Option<String> {
        match self.mode {
            DetectionMode::Direct => {
                let element = self.document.query_selector(selector)?;
                self.host
                    .computed_value(&self.document, &element, None, BREAKPOINT_PROPERTY)
            }
            DetectionMode::Fallback => self.detect_with_marker(selector),
        }
    }

    fn detect_with_marker(&self, selector: &str) -> Option<String> {
        let marker = dom_tree::create_element("div");
        dom_tree::set_attribute(
            &marker,
            MARKER_ATTRIBUTE,
            &SynthesizedSelector::new(selector).attribute_value(),
        );

        let parent = self
            .document
            .body()
            .or_else(|| self.document.document_element())
            .unwrap_or_else(|| Rc::clone(&self.document.root));
        dom_tree::append_child(&parent, Rc::clone(&marker));

        let value = self.host.computed_value(
            &self.document,
            &marker,
            Some(PseudoElement::Before),
            "content",
        );

        dom_tree::remove_child(&parent, &marker);
        debug!("marker for `{}` reported {:?}", selector, value);
        value
    }

    /// Like [`detect_breakpoint`](Self::detect_breakpoint), but returns the
    /// bare identifier. Empty, `none` and `normal` values read as no breakpoint.
    pub fn detect_breakpoint_name(&self, selector: &str) -> Option<String> {
        let raw = self.detect_breakpoint(selector)?;
        let unquoted = unquote(raw.trim());
        if matches!(unquoted, "" | "none" | "normal") {
            return None;
        }
        breakpoint_name(unquoted).map(str::to_string)
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// Runs `callback` once every stylesheet has been processed.
    pub fn ready(&self, callback: impl FnOnce() + 'static) {
        self.gate.ready(callback);
    }

    pub fn wait_ready(&self) -> impl Future<Output = ()> {
        self.gate.wait()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::NodeRef;
    use crate::error::Result;
    use crate::fetch::FetchResponse;
    use futures::future::{FutureExt, LocalBoxFuture};
    use std::cell::RefCell;

    struct NoFetch;

    impl StylesheetFetcher for NoFetch {
        fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<FetchResponse>> {
            panic!("unexpected fetch of {url}");
        }
    }

    /// Records every computed-style query and answers with a fixed value.
    struct ScriptedHost {
        keeps: usize,
        answer: Option<String>,
        queries: RefCell<Vec<(Option<String>, Option<PseudoElement>, String)>>,
    }

    impl ScriptedHost {
        fn new(keeps: usize, answer: Option<&str>) -> Self {
            ScriptedHost {
                keeps,
                answer: answer.map(str::to_string),
                queries: RefCell::new(Vec::new()),
            }
        }
    }

    impl StyleHost for ScriptedHost {
        fn inline_style_length(&self, _css_text: &str) -> usize {
            self.keeps
        }

        fn computed_value(
            &self,
            _document: &Document,
            element: &NodeRef,
            pseudo: Option<PseudoElement>,
            property: &str,
        ) -> Option<String> {
            let marker = dom_tree::get_attribute(element, MARKER_ATTRIBUTE);
            self.queries
                .borrow_mut()
                .push((marker, pseudo, property.to_string()));
            self.answer.clone()
        }
    }

    fn page() -> Rc<Document> {
        Rc::new(crate::parser::html::create_dom_tree(
            "<html><head></head><body><main></main></body></html>",
        ))
    }

    #[test]
    fn direct_mode_reads_custom_property() {
        let host = Rc::new(ScriptedHost::new(2, Some("medium")));
        let detector = BreakpointDetector::start(page(), host.clone(), Rc::new(NoFetch));

        assert_eq!(detector.mode(), DetectionMode::Direct);
        assert!(detector.is_ready());
        assert_eq!(detector.detect_breakpoint("main").as_deref(), Some("medium"));
        assert_eq!(
            host.queries.borrow().as_slice(),
            &[(None, None, "--breakpoint".to_string())]
        );
    }

    #[test]
    fn direct_mode_without_match_is_none() {
        let host = Rc::new(ScriptedHost::new(2, Some("medium")));
        let detector = BreakpointDetector::start(page(), host.clone(), Rc::new(NoFetch));
        assert_eq!(detector.detect_breakpoint(".missing"), None);
        assert!(host.queries.borrow().is_empty());
    }

    #[tokio::test]
    async fn fallback_mode_queries_marker_and_removes_it() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let host = Rc::new(ScriptedHost::new(0, Some("\"large\"")));
                let document = page();
                let detector =
                    BreakpointDetector::start(Rc::clone(&document), host.clone(), Rc::new(NoFetch));

                assert_eq!(detector.mode(), DetectionMode::Fallback);
                assert!(detector.is_ready());
                assert_eq!(detector.detect_breakpoint("main").as_deref(), Some("\"large\""));
                assert_eq!(detector.detect_breakpoint_name("main").as_deref(), Some("large"));

                let queries = host.queries.borrow();
                assert_eq!(
                    queries[0],
                    (
                        Some("main__detectBreakpoint__".to_string()),
                        Some(PseudoElement::Before),
                        "content".to_string()
                    )
                );
                let markers = document
                    .elements()
                    .into_iter()
                    .filter(|node| dom_tree::get_attribute(node, MARKER_ATTRIBUTE).is_some())
                    .count();
                assert_eq!(markers, 0);
            })
            .await;
    }

    #[tokio::test]
    async fn marker_carries_canonical_selector_key() {
        tokio::task::LocalSet::new()
            .run_until(async {
                let host = Rc::new(ScriptedHost::new(0, None));
                let detector = BreakpointDetector::start(page(), host.clone(), Rc::new(NoFetch));
                detector.detect_breakpoint("div>p");
                detector.detect_breakpoint("div >\n  p");

                let markers: Vec<Option<String>> =
                    host.queries.borrow().iter().map(|query| query.0.clone()).collect();
                assert_eq!(
                    markers,
                    vec![
                        Some("div > p__detectBreakpoint__".to_string()),
                        Some("div > p__detectBreakpoint__".to_string()),
                    ]
                );
            })
            .await;
    }

    #[test]
    fn names_ignore_empty_values() {
        for answer in ["none", "normal", "", "\"\""] {
            let host = Rc::new(ScriptedHost::new(2, Some(answer)));
            let detector = BreakpointDetector::start(page(), host, Rc::new(NoFetch));
            assert_eq!(detector.detect_breakpoint_name("main"), None, "{answer:?}");
        }
    }

    #[test]
    fn unquote_strips_matching_quotes_only() {
        assert_eq!(unquote("\"small\""), "small");
        assert_eq!(unquote("'small'"), "small");
        assert_eq!(unquote("\"small'"), "\"small'");
        assert_eq!(unquote("small"), "small");
    }

    #[test]
    fn wait_ready_resolves_in_direct_mode() {
        let host = Rc::new(ScriptedHost::new(2, None));
        let detector = BreakpointDetector::start(page(), host, Rc::new(NoFetch));
        assert!(detector.wait_ready().now_or_never().is_some());
        assert_eq!(detector.detect_breakpoint("main"), None);
    }
}
