//! Interactive drawing controller lifecycle
//!
//! Map-scoped rather than entity-scoped: `set_map` attaches and detaches
//! the single native controller. A surface without drawing support is a
//! deployment problem, so attachment degrades with a diagnostic instead of
//! raising; detaching before any attach is a safe no-op. Re-attaching after
//! a detach reuses the existing controller.

use crate::api::events::{event_channel, EventScope, EventStream};
use crate::api::{DrawingController, MapApi};
use crate::core::options::{DrawingDelta, DrawingOptions, ShapeKind};
use crate::event::ShapeComplete;
use crate::Result;
use std::sync::Arc;
use tokio::sync::Mutex;

struct DrawingInner {
    options: DrawingOptions,
    controller: Option<Arc<dyn DrawingController>>,
    attached: bool,
}

/// Owns the single native drawing controller of a map
pub struct DrawingManager {
    scope: Arc<dyn EventScope>,
    inner: Mutex<DrawingInner>,
}

impl DrawingManager {
    pub fn new(scope: Arc<dyn EventScope>, options: DrawingOptions) -> Self {
        Self {
            scope,
            inner: Mutex::new(DrawingInner {
                options,
                controller: None,
                attached: false,
            }),
        }
    }

    /// Attaches to a map surface or detaches with `None`.
    ///
    /// The controller is constructed lazily on the first successful attach
    /// and kept across detach/attach cycles. When the surface reports no
    /// drawing capability the attach is skipped with a diagnostic; the rest
    /// of the map keeps working. Construction errors from the external
    /// library propagate.
    pub async fn set_map(&self, map: Option<Arc<dyn MapApi>>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        match map {
            Some(api) => {
                if !api.drawing_supported() {
                    log::warn!(
                        "drawing support is not loaded on this map surface; drawing stays disabled"
                    );
                    return Ok(());
                }
                if inner.controller.is_none() {
                    let controller = api
                        .create_drawing_controller(inner.options.clone())
                        .await?;
                    inner.controller = Some(controller);
                }
                if let Some(controller) = &inner.controller {
                    controller.set_attached(true);
                    inner.attached = true;
                }
            }
            None => {
                if let Some(controller) = &inner.controller {
                    controller.set_attached(false);
                }
                inner.attached = false;
            }
        }
        Ok(())
    }

    /// Applies all changed options as a single native setter call,
    /// minimizing round-trips. Before the controller exists, the patch
    /// folds into the construction options instead.
    pub async fn apply(&self, delta: DrawingDelta) {
        if delta.is_empty() {
            return;
        }
        let mut inner = self.inner.lock().await;
        inner.options.merge(&delta);
        if let Some(controller) = &inner.controller {
            controller.apply(&delta);
        }
    }

    /// Stream of shape completions, optionally restricted to one overlay
    /// kind. `None` until a controller exists.
    pub async fn completions(&self, filter: Option<ShapeKind>) -> Option<EventStream<ShapeComplete>> {
        let controller = self.inner.lock().await.controller.clone()?;
        let (sink, rx) = event_channel(self.scope.clone());
        let listener = controller.listen(sink);
        let stream = EventStream::new(rx, Some(listener));
        Some(match filter {
            None => stream,
            Some(kind) => stream.filtered(move |event| event.kind() == kind),
        })
    }

    /// Whether the controller is currently attached to a map
    pub async fn is_attached(&self) -> bool {
        self.inner.lock().await.attached
    }

    /// Current effective options, including folded-in patches
    pub async fn options(&self) -> DrawingOptions {
        self.inner.lock().await.options.clone()
    }
}
