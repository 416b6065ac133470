use std::rc::Rc;

use futures_util::FutureExt;

use crate::app::model::Effect;
use crate::app::{EditorSurface, Message};
use crate::position;
use crate::store::{ContentStore, PageStore};
use crate::surface::DisplaySurface;

impl<D, C, P> EditorSurface<D, C, P>
where
    D: DisplaySurface,
    C: ContentStore + 'static,
    P: PageStore + 'static,
{
    /// Run every queued effect, returning the messages they fed back.
    pub(super) fn run_effects(&mut self) -> Vec<Message> {
        self.model
            .take_effects()
            .into_iter()
            .filter_map(|effect| self.execute(effect))
            .collect()
    }

    fn execute(&mut self, effect: Effect) -> Option<Message> {
        match effect {
            Effect::Present => self.surface.present(&self.model.rendered),
            Effect::LoadLines => self.surface.load_lines(&self.model.buffer.lines()),
            Effect::RevealCaret => {
                position::reveal_caret(&mut self.surface, &self.model.rendered);
            }
            Effect::FocusRendered(node) => {
                position::focus_from_rendered(
                    &mut self.surface,
                    &self.model.rendered,
                    &self.model.buffer,
                    node,
                );
            }
            Effect::InsertAtCaret(text) => {
                self.surface.insert_at_caret(&text);
                return Some(Message::LinesReplaced(self.surface.editable_lines()));
            }
            Effect::Emit(event) => self.emit(&event),
            Effect::Save { page, body, seq } => {
                let pages = Rc::clone(&self.pages);
                self.in_flight.push(
                    async move {
                        let result = pages.save(&page, body).await;
                        Message::SaveFinished { page, seq, result }
                    }
                    .boxed_local(),
                );
            }
            Effect::GraceTimer { seq, after } => {
                self.in_flight.push(
                    async move {
                        tokio::time::sleep(after).await;
                        Message::SaveGraceElapsed(seq)
                    }
                    .boxed_local(),
                );
            }
            Effect::Upload(job) => {
                let content = Rc::clone(&self.content);
                self.in_flight.push(
                    async move {
                        let result = content.upload(&job.content_type, job.bytes).await;
                        Message::UploadFinished {
                            name: job.name,
                            kind: job.kind,
                            result,
                        }
                    }
                    .boxed_local(),
                );
            }
        }
        None
    }
}
