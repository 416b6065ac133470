//! The editor surface: one document, its render/edit loop and its saves.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete editor state
//! - [`Message`]: Host input and completions of asynchronous work
//! - [`update`]: State transitions that queue [`Effect`]s
//! - [`EditorSurface`]: Runs effects against a [`DisplaySurface`] and the
//!   stores, and drives in-flight uploads, saves and timers
//!
//! Everything runs on the caller's thread. Network work is held as local
//! futures and only makes progress inside [`EditorSurface::next_completion`]
//! or [`EditorSurface::settle`].

mod effects;
mod event_loop;
mod model;
mod update;

pub use model::{
    DEFAULT_CONTENT_PREFIX, DEFAULT_SAVE_GRACE, EditorEvent, EditorSettings, Effect, Model,
};
pub use update::{Disposition, Message, update};

use std::rc::Rc;
use std::sync::mpsc::{Receiver, Sender, channel};

use futures_util::future::LocalBoxFuture;
use futures_util::stream::FuturesUnordered;

use crate::store::{ContentStore, PageStore};
use crate::surface::DisplaySurface;

/// An editing session over one display surface.
///
/// Construct it when the view is mounted and [`detach`](Self::detach) it
/// when the view goes away.
pub struct EditorSurface<D, C, P> {
    model: Model,
    surface: D,
    content: Rc<C>,
    pages: Rc<P>,
    listeners: Vec<Sender<EditorEvent>>,
    in_flight: FuturesUnordered<LocalBoxFuture<'static, Message>>,
    detached: bool,
}

impl<D, C, P> EditorSurface<D, C, P>
where
    D: DisplaySurface,
    C: ContentStore + 'static,
    P: PageStore + 'static,
{
    pub fn new(settings: EditorSettings, surface: D, content: Rc<C>, pages: Rc<P>) -> Self {
        let mut editor = Self {
            model: Model::new(settings),
            surface,
            content,
            pages,
            listeners: Vec::new(),
            in_flight: FuturesUnordered::new(),
            detached: false,
        };
        editor.surface.present(&editor.model.rendered);
        editor
    }

    pub const fn model(&self) -> &Model {
        &self.model
    }

    pub const fn surface(&self) -> &D {
        &self.surface
    }

    /// The surface, for hosts that feed it input before dispatching.
    pub const fn surface_mut(&mut self) -> &mut D {
        &mut self.surface
    }

    pub fn source(&self) -> &str {
        &self.model.source
    }

    pub fn title(&self) -> &str {
        self.model.title.current()
    }

    pub const fn is_busy(&self) -> bool {
        self.model.busy
    }

    /// Number of uploads, saves and timers still outstanding.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub const fn is_detached(&self) -> bool {
        self.detached
    }

    /// Register a listener for [`EditorEvent`]s.
    pub fn subscribe(&mut self) -> Receiver<EditorEvent> {
        let (sender, receiver) = channel();
        self.listeners.push(sender);
        receiver
    }

    /// Release every listener and drop outstanding work.
    ///
    /// Further messages are ignored.
    pub fn detach(&mut self) {
        self.listeners.clear();
        self.in_flight = FuturesUnordered::new();
        self.detached = true;
    }

    fn emit(&mut self, event: &EditorEvent) {
        // Listeners whose receiver is gone are dropped.
        self.listeners
            .retain(|listener| listener.send(event.clone()).is_ok());
    }
}

impl<D, C, P> std::fmt::Debug for EditorSurface<D, C, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSurface")
            .field("model", &self.model)
            .field("listeners", &self.listeners.len())
            .field("in_flight", &self.in_flight.len())
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
