//! Sequential command processing for a [`Session`].
//!
//! A spawned task owns the session and applies commands one at a time.
//! Generations run as separate tasks and post their result back to the same
//! loop, so the session is never mutated concurrently and navigation stays
//! responsive while a request is out.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use super::{Outcome, Session, Ticket};
use crate::errors::{PlanError, TransitionError};
use crate::pipeline::Pipeline;
use crate::reference::{IncomeBracket, Language, Region};
use crate::wire::Plan;

type Reply<T> = oneshot::Sender<T>;

enum Command {
    SelectRegion(Region, Reply<Result<(), TransitionError>>),
    SelectIncome(IncomeBracket, Reply<Result<(), TransitionError>>),
    ChangeLanguage(Language, Reply<()>),
    Back(Reply<()>),
    Reset(Reply<()>),
}

type Finished = (Ticket, Result<Arc<Plan>, PlanError>);

struct Worker {
    session: Session,
    pipeline: Arc<Pipeline>,
    state: watch::Sender<Session>,
    done_tx: mpsc::UnboundedSender<Finished>,
}

impl Worker {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>, mut done_rx: mpsc::UnboundedReceiver<Finished>) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
                Some((ticket, result)) = done_rx.recv() => self.finish(ticket, result),
            }
        }
        tracing::debug!("session driver stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::SelectRegion(region, reply) => {
                let res = self.session.select_region(region);
                self.publish();
                let _ = reply.send(res);
            }
            Command::SelectIncome(bracket, reply) => {
                let res = self.session.select_income(bracket).map(|t| self.launch(t));
                if let Err(e) = &res {
                    tracing::debug!(error = %e, "select_income rejected");
                }
                self.publish();
                let _ = reply.send(res);
            }
            Command::ChangeLanguage(language, reply) => {
                if let Some(t) = self.session.change_language(language) {
                    self.launch(t);
                }
                self.publish();
                let _ = reply.send(());
            }
            Command::Back(reply) => {
                self.session.back();
                self.publish();
                let _ = reply.send(());
            }
            Command::Reset(reply) => {
                self.session.reset();
                self.publish();
                let _ = reply.send(());
            }
        }
    }

    // Before replying, so a caller that awaits the reply sees the new state.
    fn publish(&self) {
        self.state.send_replace(self.session.clone());
    }

    fn finish(&mut self, ticket: Ticket, result: Result<Arc<Plan>, PlanError>) {
        let completion = self.session.complete(&ticket, result);
        if let Outcome::Failed(e) = &completion.outcome {
            tracing::info!(key = %ticket.key, error = %e, "plan request failed");
        }
        if let Some(next) = completion.follow_up {
            self.launch(next);
        }
        self.publish();
    }

    fn launch(&self, ticket: Ticket) {
        let pipeline = self.pipeline.clone();
        let done = self.done_tx.clone();
        let (region, bracket, language) = (ticket.region.clone(), ticket.bracket.clone(), ticket.language.clone());
        let run = tokio::spawn(async move { pipeline.run(&region, &bracket, &language).await });
        tokio::spawn(async move {
            // Every ticket must be answered or the session stays in flight.
            let result = match run.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(key = %ticket.key, error = %e, "plan request task died");
                    Err(PlanError::GenerationUnavailable(format!("plan request aborted: {e}")))
                }
            };
            let _ = done.send((ticket, result));
        });
    }
}

/// Handle to a session running on its own task. Dropping it stops the task.
pub struct SessionDriver {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<Session>,
    task: JoinHandle<()>,
}

impl SessionDriver {
    pub fn spawn(pipeline: Arc<Pipeline>, language: Language) -> Self {
        let session = Session::new(language);
        let (state_tx, state_rx) = watch::channel(session.clone());
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        let worker = Worker { session, pipeline, state: state_tx, done_tx };
        let task = tokio::spawn(worker.run(cmd_rx, done_rx));

        Self { commands: cmd_tx, state: state_rx, task }
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, TransitionError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| TransitionError::DriverClosed)?;
        rx.await.map_err(|_| TransitionError::DriverClosed)
    }

    pub async fn select_region(&self, region: Region) -> Result<(), TransitionError> {
        self.call(|r| Command::SelectRegion(region, r)).await?
    }

    /// Returns once the request is issued; see [`Self::settled`].
    pub async fn select_income(&self, bracket: IncomeBracket) -> Result<(), TransitionError> {
        self.call(|r| Command::SelectIncome(bracket, r)).await?
    }

    pub async fn change_language(&self, language: Language) -> Result<(), TransitionError> {
        self.call(|r| Command::ChangeLanguage(language, r)).await
    }

    pub async fn back(&self) -> Result<(), TransitionError> {
        self.call(Command::Back).await
    }

    pub async fn reset(&self) -> Result<(), TransitionError> {
        self.call(Command::Reset).await
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.clone()
    }

    /// Waits until no request is in flight and returns that state.
    pub async fn settled(&self) -> Result<Session, TransitionError> {
        let mut rx = self.state.clone();
        let s = rx
            .wait_for(|s| !s.in_flight())
            .await
            .map_err(|_| TransitionError::DriverClosed)?;
        Ok(s.clone())
    }
}

impl Drop for SessionDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
