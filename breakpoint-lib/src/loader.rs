//! Fetches every linked stylesheet, compiles it and injects the result.

use crate::dom::dom_tree::Document;
use crate::error::Result;
use crate::fetch::{FetchResponse, StylesheetFetcher};
use crate::inject::inject;
use crate::ready::ReadinessGate;
use crate::style::BreakpointCompiler;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Pending,
    Done,
}

/// One stylesheet request.
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub url: String,
    pub state: FetchState,
    pub response_text: Option<String>,
    pub ok: bool,
}

/// Every task registered by one loader run. Tasks are never removed.
#[derive(Debug, Default)]
pub struct FetchBatch {
    tasks: Vec<FetchTask>,
}

impl FetchBatch {
    fn register(&mut self, url: &str) -> usize {
        self.tasks.push(FetchTask {
            url: url.to_string(),
            state: FetchState::Pending,
            response_text: None,
            ok: false,
        });
        self.tasks.len() - 1
    }

    fn mark_done(&mut self, id: usize, ok: bool, response_text: Option<String>) {
        if let Some(task) = self.tasks.get_mut(id) {
            task.state = FetchState::Done;
            task.ok = ok;
            task.response_text = response_text;
        }
    }

    /// True once every task is done; an empty batch is complete.
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|task| task.state == FetchState::Done)
    }

    pub fn tasks(&self) -> &[FetchTask] {
        &self.tasks
    }
}

/// Resolve a possibly-relative `href` against the document's base URL.
pub fn resolve_href(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let resolved = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };
    resolved.ok().map(String::from)
}

/// Drives one batch of stylesheet fetches and opens the gate when all are done.
#[derive(Clone)]
pub struct StylesheetLoader {
    document: Rc<Document>,
    fetcher: Rc<dyn StylesheetFetcher>,
    compiler: Rc<dyn BreakpointCompiler>,
    batch: Rc<RefCell<FetchBatch>>,
    gate: ReadinessGate,
}

impl StylesheetLoader {
    pub fn new(
        document: Rc<Document>,
        fetcher: Rc<dyn StylesheetFetcher>,
        compiler: Rc<dyn BreakpointCompiler>,
        gate: ReadinessGate,
    ) -> Self {
        StylesheetLoader {
            document,
            fetcher,
            compiler,
            batch: Rc::new(RefCell::new(FetchBatch::default())),
            gate,
        }
    }

    pub fn batch(&self) -> Rc<RefCell<FetchBatch>> {
        Rc::clone(&self.batch)
    }

    /// Starts one local task per `<link rel="stylesheet">` and returns
    /// immediately. Must run inside a `tokio::task::LocalSet`.
    pub fn load_all(&self) {
        let base = self.document.base_url.borrow().clone();
        let urls: Vec<String> = self
            .document
            .stylesheet_links()
            .iter()
            .filter_map(|href| {
                let resolved = resolve_href(base.as_ref(), href);
                if resolved.is_none() {
                    warn!("cannot resolve stylesheet href `{}`", href);
                }
                resolved
            })
            .collect();
        info!("loading {} linked stylesheets", urls.len());

        // Register the whole batch before any fetch can complete.
        let ids: Vec<usize> = {
            let mut batch = self.batch.borrow_mut();
            urls.iter().map(|url| batch.register(url)).collect()
        };
        self.check_complete();

        for (id, url) in ids.into_iter().zip(urls) {
            let loader = self.clone();
            tokio::task::spawn_local(async move {
                let result = loader.fetcher.fetch(&url).await;
                loader.finish(id, &url, result);
            });
        }
    }

    fn finish(&self, id: usize, url: &str, result: Result<FetchResponse>) {
        let (ok, text) = match result {
            Ok(response) if response.is_success() => (true, Some(response.body)),
            Ok(response) => {
                warn!("{} responded with status {}", url, response.status);
                (false, None)
            }
            Err(e) => {
                warn!("{}: {}", url, e);
                (false, None)
            }
        };

        if let Some(css) = &text {
            let compiled = self.compiler.compile(css);
            if compiled.is_empty() {
                debug!("{} declares no breakpoints", url);
            } else {
                inject(&self.document, &compiled);
            }
        }

        self.batch.borrow_mut().mark_done(id, ok, text);
        self.check_complete();
    }

    fn check_complete(&self) {
        if self.batch.borrow().is_complete() && !self.gate.is_ready() {
            info!("all stylesheets processed");
            self.gate.open();
        }
    }
}
