//! Keeps a [`PaginationEngine`] and a [`UrlPagination`] on the same page

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::application::pagination::PaginationEngine;

use super::url::UrlPagination;

/// Drive `engine` from the URL position and write engine-side moves
/// (direct navigation, clamping after the collection shrank) back to the URL.
///
/// The engine is moved to the URL position right away. The binding ends
/// when the returned task is aborted or either side is dropped. Must be
/// called inside a Tokio runtime.
pub fn bind_engine<T, A>(url: &UrlPagination, engine: &Arc<PaginationEngine<T, A>>) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
{
    let mut url_rx = url.subscribe();
    let mut engine_rx = engine.subscribe();
    let url_inner = Arc::downgrade(&url.inner);
    let engine_ref = Arc::downgrade(engine);
    let list = engine.name().to_string();

    let start = *url_rx.borrow_and_update();
    engine.set_position(start.current_page, start.page_size);
    let mut last_engine = engine_rx.borrow_and_update().position();

    debug!(
        list = %list,
        page = start.current_page,
        page_size = start.page_size,
        "Engine bound to URL"
    );

    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = url_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let position = *url_rx.borrow_and_update();
                    let Some(engine) = engine_ref.upgrade() else {
                        break;
                    };
                    engine.set_position(position.current_page, position.page_size);
                }
                changed = engine_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let position = engine_rx.borrow_and_update().position();
                    if position == last_engine {
                        continue;
                    }
                    last_engine = position;

                    let Some(url) = url_inner.upgrade() else {
                        break;
                    };
                    let current = url.position();
                    if (current.current_page, current.page_size) != position {
                        debug!(list = %list, page = position.0, "Engine moved, updating URL");
                        url.update_pagination(position.0, Some(position.1));
                    }
                }
            }
        }
        debug!(list = %list, "Engine binding released");
    })
}
