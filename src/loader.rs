//! SDK loader - load status and the wrapper that gates rendering on it.
//!
//! The mapping SDK has to be loaded before a map can exist. The [`Loader`]
//! exposes a coarse, reactive [`LoadStatus`]; [`wrapper`] starts the load
//! when it mounts, renders its children once the status is
//! [`LoadStatus::Success`] and a status view otherwise. Failures are shown,
//! never retried.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::{error, info};

use crate::config::WidgetConfig;
use crate::error::LoadError;
use crate::primitives::{switch, Cleanup};
use crate::sdk::MapsApi;

/// Coarse SDK load state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Loading,
    Failure,
    Success,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadStatus::Loading => "LOADING",
            LoadStatus::Failure => "FAILURE",
            LoadStatus::Success => "SUCCESS",
        })
    }
}

/// What the SDK loader is asked to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub api_key: String,
    pub version: String,
    pub libraries: Vec<String>,
}

impl LoaderOptions {
    /// Options with the widget's default version and libraries.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            version: crate::config::DEFAULT_VERSION.to_string(),
            libraries: vec![crate::config::DEFAULT_LIBRARY.to_string()],
        }
    }
}

impl From<&WidgetConfig> for LoaderOptions {
    fn from(config: &WidgetConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            version: config.version.clone(),
            libraries: config.libraries.clone(),
        }
    }
}

/// Loads the SDK once and publishes the status.
pub struct Loader {
    options: LoaderOptions,
    status: Signal<LoadStatus>,
    /// Untracked mirror of `status`, readable from inside effects.
    settled: Rc<Cell<LoadStatus>>,
    requested: Cell<bool>,
}

impl Loader {
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            status: signal(LoadStatus::Loading),
            settled: Rc::new(Cell::new(LoadStatus::Loading)),
            requested: Cell::new(false),
        }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Current status (tracked when read inside an effect).
    pub fn status(&self) -> LoadStatus {
        self.status.get()
    }

    pub fn status_signal(&self) -> Signal<LoadStatus> {
        self.status.clone()
    }

    /// Whether the SDK has been asked to load.
    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }

    /// Ask `api` to load. Only the first call after construction reaches the
    /// SDK; later calls just report the status without tracking it.
    pub fn load(&self, api: &dyn MapsApi) -> LoadStatus {
        if self.requested.replace(true) {
            return self.settled.get();
        }

        let status = self.status.clone();
        let settled = self.settled.clone();
        let options = self.options.clone();
        api.load(
            &self.options,
            Box::new(move |result: Result<(), LoadError>| {
                let next = match result {
                    Ok(()) => {
                        info!(version = %options.version, libraries = ?options.libraries, "mapping SDK loaded");
                        LoadStatus::Success
                    }
                    Err(err) => {
                        error!(error = %err, "mapping SDK failed to load");
                        LoadStatus::Failure
                    }
                };
                settled.set(next);
                status.set(next);
            }),
        );
        self.settled.get()
    }
}

/// Renders a status view for a non-success status.
pub type StatusRender = Rc<dyn Fn(LoadStatus) -> Cleanup>;

/// Start loading the SDK through `api` and render `children` once `loader`
/// succeeds, `render(status)` until then.
///
/// With no `render`, nothing is shown while loading or after a failure.
pub fn wrapper(
    loader: &Loader,
    api: &dyn MapsApi,
    render: Option<StatusRender>,
    children: impl Fn() -> Cleanup + 'static,
) -> Cleanup {
    let status = loader.status_signal();
    let cleanup = switch(
        move || status.get(),
        move |status| match status {
            LoadStatus::Success => Some(children()),
            other => render.as_ref().map(|r| r(other)),
        },
    );
    loader.load(api);
    cleanup
}
