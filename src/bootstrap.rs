//! Page bootstrap - mounts the app into the host page.
//!
//! Invoked once at start-up. Waits for the page content to load, finds the
//! mount point and renders [`app`] into it.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{error, info};

use crate::app::{app, AppEnv, AppState};
use crate::dom::{with_parent, Document, Element};
use crate::error::BootstrapError;
use crate::primitives::Cleanup;

/// Id of the element the app is rendered into.
pub const MOUNT_POINT_ID: &str = "root";

/// A render root bound to one element of the page.
pub struct Root {
    element: Element,
    cleanup: Option<Cleanup>,
}

impl Root {
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn is_mounted(&self) -> bool {
        self.cleanup.is_some()
    }

    /// Render `component` into the root, replacing whatever it showed before.
    pub fn render(&mut self, component: impl FnOnce() -> Cleanup) {
        self.unmount();
        self.cleanup = Some(with_parent(&self.element, component));
    }

    /// Tear down the rendered tree. No-op when nothing is mounted.
    pub fn unmount(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Create a render root on the element with `id`.
pub fn create_root(document: &Document, id: &str) -> Result<Root, BootstrapError> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| BootstrapError::MissingMountPoint(id.to_string()))?;
    Ok(Root {
        element,
        cleanup: None,
    })
}

/// Handle to the app started by [`start`].
#[derive(Clone)]
pub struct StartHandle {
    root: Rc<RefCell<Option<Root>>>,
    state: AppState,
}

impl StartHandle {
    /// Whether the app has been mounted into the page.
    pub fn is_mounted(&self) -> bool {
        self.root.borrow().as_ref().is_some_and(Root::is_mounted)
    }

    /// State of the running app.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Tear the app down.
    pub fn unmount(&self) {
        let root = self.root.borrow_mut().take();
        if let Some(mut root) = root {
            root.unmount();
            info!("app unmounted");
        }
    }
}

/// Mount the app into `document` once its content has loaded.
///
/// A missing mount point is logged and leaves the page untouched.
pub fn start(document: &Document, env: AppEnv) -> StartHandle {
    let handle = StartHandle {
        root: Rc::new(RefCell::new(None)),
        state: AppState::new(),
    };

    let slot = handle.root.clone();
    let state = handle.state.clone();
    let doc = document.clone();
    document.on_content_loaded(move || match create_root(&doc, MOUNT_POINT_ID) {
        Ok(mut root) => {
            root.render(|| app(env, state));
            info!(mount_point = MOUNT_POINT_ID, "app mounted");
            *slot.borrow_mut() = Some(root);
        }
        Err(err) => error!(error = %err, "bootstrap failed"),
    });

    handle
}
