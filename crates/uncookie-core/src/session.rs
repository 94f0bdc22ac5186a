//! Page-lifetime runner.
//!
//! A [`Session`] owns one document, its interpreter and the ordered handler
//! list. Every [`Session::trigger`] walks the handlers in storage order and
//! runs one interpreter pass per handler whose schema applies to the page.
//!
//! Passes never overlap. A trigger that arrives while a pass is running only
//! marks the pending slot and returns; the running trigger re-runs once when
//! it finishes, however many triggers arrived in between.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::document::Document;
use crate::handler::Handler;
use crate::interpreter::{EffectSummary, Interpreter};
use crate::loader::RemoteLoader;
use crate::message::Messenger;
use crate::schema::ActionGroup;

/// Outcome of one handler's pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub handler: String,
    pub shape: &'static str,
    pub summary: EffectSummary,
}

struct PageState<D, M> {
    document: D,
    interpreter: Interpreter<M>,
}

pub struct Session<D, M> {
    state: Mutex<PageState<D, M>>,
    handlers: StdMutex<Vec<Handler>>,
    loader: RemoteLoader,
    pending: AtomicBool,
}

impl<D: Document, M: Messenger> Session<D, M> {
    pub fn new(
        document: D,
        interpreter: Interpreter<M>,
        loader: RemoteLoader,
        handlers: Vec<Handler>,
    ) -> Self {
        Self {
            state: Mutex::new(PageState {
                document,
                interpreter,
            }),
            handlers: StdMutex::new(handlers),
            loader,
            pending: AtomicBool::new(false),
        }
    }

    /// Session wired from a loaded [`Config`].
    pub fn from_config(document: D, messenger: M, config: &Config) -> Self {
        Self::new(
            document,
            Interpreter::new(messenger).with_max_depth(config.max_chain_depth),
            RemoteLoader::with_ttl(config.cache_ttl()),
            config.handlers.clone(),
        )
    }

    pub fn handlers(&self) -> Vec<Handler> {
        self.handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn loader(&self) -> &RemoteLoader {
        &self.loader
    }

    /// Replace the handler list and drop every cached remote schema.
    pub fn reset_configuration(&self, handlers: Vec<Handler>) {
        *self.handlers.lock().unwrap_or_else(|e| e.into_inner()) = handlers;
        self.loader.clear_cache();
        tracing::info!("configuration reset");
    }

    /// Run every applicable handler against the document.
    ///
    /// Returns `None` when another trigger is already running; that trigger
    /// picks the request up before it returns.
    pub async fn trigger(&self) -> Option<Vec<PassReport>> {
        self.pending.store(true, Ordering::SeqCst);

        let mut reports: Option<Vec<PassReport>> = None;
        while self.pending.load(Ordering::SeqCst) {
            let Ok(mut state) = self.state.try_lock() else {
                tracing::debug!("pass already running, trigger queued");
                break;
            };
            let out = reports.get_or_insert_with(Vec::new);
            while self.pending.swap(false, Ordering::SeqCst) {
                let handlers = self.handlers();
                out.extend(self.run_handlers(&mut state, &handlers).await);
            }
        }
        reports
    }

    async fn run_handlers(
        &self,
        state: &mut PageState<D, M>,
        handlers: &[Handler],
    ) -> Vec<PassReport> {
        let host = state.document.hostname().to_string();
        let mut reports = Vec::new();

        for handler in handlers {
            let text = if handler.is_remote() {
                match self.loader.resolve(handler.schema.trim()).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(handler = %handler.name, error = %e, "skipping handler");
                        continue;
                    }
                }
            } else {
                handler.schema.clone()
            };

            let group = ActionGroup::detect_text(&text);
            let Some(schema) = group.select(handler, &host) else {
                tracing::debug!(handler = %handler.name, host = %host, shape = group.shape(), "handler does not apply");
                continue;
            };

            tracing::debug!(handler = %handler.name, shape = group.shape(), "running handler");
            let summary = state
                .interpreter
                .interpret(&schema, &mut state.document)
                .await;
            reports.push(PassReport {
                handler: handler.name.clone(),
                shape: group.shape(),
                summary,
            });
            if summary.halted {
                break;
            }
        }
        reports
    }

    /// Run `f` against the document once no pass holds it.
    pub async fn with_document<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state.document)
    }

    pub fn into_document(self) -> D {
        self.state.into_inner().document
    }
}
