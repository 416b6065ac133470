use futures_util::StreamExt;
use tracing::debug;

use crate::app::{Disposition, EditorSurface, Message, update};
use crate::error::EditorError;
use crate::store::{ContentStore, PageId, PageStore};
use crate::surface::DisplaySurface;

impl<D, C, P> EditorSurface<D, C, P>
where
    D: DisplaySurface,
    C: ContentStore + 'static,
    P: PageStore + 'static,
{
    /// Apply a message and run the effects it queued.
    ///
    /// Messages fed back by effects (the read-back after an insertion) are
    /// applied before returning. After [`detach`](Self::detach) every message
    /// is ignored.
    ///
    /// # Errors
    /// See [`update`]. Effects queued before a failure still run, so a failed
    /// save has cleared the busy indicator and notified listeners by the time
    /// the error is returned.
    pub fn dispatch(&mut self, msg: Message) -> Result<Disposition, EditorError> {
        if self.detached {
            debug!(?msg, "editor detached, message dropped");
            return Ok(Disposition::Ignored);
        }
        let result = update(&mut self.model, msg);
        let mut first_error = None;
        for follow_up in self.run_effects() {
            if let Err(err) = self.dispatch(follow_up) {
                first_error.get_or_insert(err);
            }
        }
        match (result, first_error) {
            (Err(err), _) | (Ok(_), Some(err)) => Err(err),
            (Ok(disposition), None) => Ok(disposition),
        }
    }

    /// Wait for the next upload, save or timer to finish and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<Result<Disposition, EditorError>> {
        let msg = self.in_flight.next().await?;
        Some(self.dispatch(msg))
    }

    /// Drive in-flight work until none is left.
    ///
    /// # Errors
    /// Stops at the first failed completion (a failed save) and returns it;
    /// remaining work stays in flight for a later call.
    pub async fn settle(&mut self) -> Result<(), EditorError> {
        while let Some(result) = self.next_completion().await {
            result?;
        }
        Ok(())
    }

    /// Load a page and make it the target of subsequent saves.
    ///
    /// # Errors
    /// Returns [`EditorError::Load`] if the page store cannot provide it.
    pub async fn open(&mut self, page: PageId) -> Result<(), EditorError> {
        let snapshot = match self.pages.load(&page).await {
            Ok(snapshot) => snapshot,
            Err(source) => return Err(EditorError::Load { page, source }),
        };
        self.dispatch(Message::PageLoaded { page, snapshot })?;
        Ok(())
    }

    /// Create an empty page in the page store and open it.
    ///
    /// # Errors
    /// Returns [`EditorError::Create`] or [`EditorError::Load`].
    pub async fn create_page(&mut self) -> Result<PageId, EditorError> {
        let page = self.pages.create().await.map_err(EditorError::Create)?;
        self.open(page.clone()).await?;
        Ok(page)
    }
}
