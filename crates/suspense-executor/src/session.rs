//! Stream sessions: the per-section registry and transition dispatch.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::FutureExt;
use suspense_core::{InvalidSectionError, ProducerError, SectionId, SectionStatus, SessionId};
use suspense_data::Producer;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, trace, warn};

use crate::section::{Outcome, SectionState, Transition};

/// Callback invoked for each transition.
pub type TransitionCallback<T> = Arc<dyn Fn(&Transition<T>) + Send + Sync>;

/// Identifies a subscription so it can be removed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Stream of transitions returned by [`SessionHandle::transitions`].
pub type Transitions<T> = UnboundedReceiver<Transition<T>>;

struct Slot<T> {
    id: SectionId,
    producer: Arc<dyn Producer<T>>,
    state: SectionState<T>,
    // Bumped by every retry; results from an older generation are dropped.
    generation: u32,
    invoked_at: Instant,
}

enum Subscriber<T> {
    Callback(TransitionCallback<T>),
    Channel(UnboundedSender<Transition<T>>),
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Callback(callback) => Self::Callback(Arc::clone(callback)),
            Self::Channel(tx) => Self::Channel(tx.clone()),
        }
    }
}

impl<T> Subscriber<T> {
    fn deliver(&self, transition: &Transition<T>) {
        match self {
            Self::Callback(callback) => callback(transition),
            Self::Channel(tx) => {
                let _ = tx.unbounded_send(transition.clone());
            }
        }
    }

    fn is_closed(&self) -> bool {
        matches!(self, Self::Channel(tx) if tx.is_closed())
    }
}

/// Deliveries waiting to run outside the dispatch lock, in order.
enum Job<T> {
    /// A live transition for the subscribers registered when it happened.
    Live(Transition<T>, Vec<Subscriber<T>>),
    /// Transitions delivered before `subscriber` registered.
    Replay(Vec<Transition<T>>, Subscriber<T>),
}

struct Dispatch<T> {
    history: Vec<Transition<T>>,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
    next_subscription: u64,
    queue: VecDeque<Job<T>>,
    // Set while some thread is draining `queue`.
    draining: bool,
}

pub(crate) struct SessionShared<T> {
    id: SessionId,
    runtime: Handle,
    index: HashMap<SectionId, usize>,
    slots: RwLock<Vec<Slot<T>>>,
    // Orders transitions and subscriptions. Never held while a callback
    // runs. Always taken before `slots`.
    dispatch: Mutex<Dispatch<T>>,
    progress: watch::Sender<u64>,
}

impl<T> SessionShared<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(
        id: SessionId,
        runtime: Handle,
        sections: Vec<(SectionId, Arc<dyn Producer<T>>)>,
    ) -> Self {
        let now = Instant::now();
        let index = sections
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), i))
            .collect();
        let slots = sections
            .into_iter()
            .map(|(id, producer)| Slot {
                id,
                producer,
                state: SectionState::Pending,
                generation: 0,
                invoked_at: now,
            })
            .collect();
        let (progress, _) = watch::channel(0);

        Self {
            id,
            runtime,
            index,
            slots: RwLock::new(slots),
            dispatch: Mutex::new(Dispatch {
                history: Vec::new(),
                subscribers: Vec::new(),
                next_subscription: 0,
                queue: VecDeque::new(),
                draining: false,
            }),
            progress,
        }
    }

    fn read_slots(&self) -> RwLockReadGuard<'_, Vec<Slot<T>>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, Vec<Slot<T>>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_dispatch(&self) -> MutexGuard<'_, Dispatch<T>> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn position(&self, id: &SectionId) -> Result<usize, InvalidSectionError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| InvalidSectionError::new(id.clone()))
    }

    fn bump_progress(&self) {
        self.progress.send_modify(|v| *v = v.wrapping_add(1));
    }

    /// Spawn every producer. Called once, before the handle is returned.
    pub(crate) fn launch_all(self: &Arc<Self>) {
        let producers: Vec<_> = self
            .read_slots()
            .iter()
            .enumerate()
            .map(|(i, slot)| (i, slot.generation, Arc::clone(&slot.producer)))
            .collect();

        for (index, generation, producer) in producers {
            self.launch(index, generation, producer);
        }
    }

    fn launch(self: &Arc<Self>, index: usize, generation: u32, producer: Arc<dyn Producer<T>>) {
        let shared = Arc::clone(self);
        self.runtime.spawn(async move {
            let result = AssertUnwindSafe(producer.produce())
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ProducerError::new("Section producer panicked")));
            shared.settle(index, generation, result);
        });
    }

    fn settle(&self, index: usize, generation: u32, result: Result<T, ProducerError>) {
        let mut dispatch = self.lock_dispatch();

        let (transition, complete) = {
            let mut slots = self.write_slots();
            let slot = &mut slots[index];
            if slot.generation != generation || slot.state.status().is_terminal() {
                trace!(session = %self.id, section = %slot.id, generation, "discarding superseded result");
                return;
            }

            let outcome = Outcome::from(result);
            slot.state = outcome.to_state();
            let transition = Transition {
                session: self.id.clone(),
                section: slot.id.clone(),
                attempt: generation + 1,
                outcome,
                elapsed: slot.invoked_at.elapsed(),
                sequence: dispatch.history.len() as u64,
            };
            let complete = slots.iter().all(|s| s.state.status().is_terminal());
            (transition, complete)
        };

        match &transition.outcome {
            Outcome::Ready(_) => debug!(
                session = %self.id,
                section = %transition.section,
                attempt = transition.attempt,
                elapsed_ms = transition.elapsed.as_millis() as u64,
                "section ready"
            ),
            Outcome::Failed(err) => warn!(
                session = %self.id,
                section = %transition.section,
                attempt = transition.attempt,
                error = %err,
                "section failed"
            ),
        }

        dispatch.subscribers.retain(|(_, s)| !s.is_closed());
        let subscribers = dispatch.subscribers.iter().map(|(_, s)| s.clone()).collect();
        dispatch.history.push(transition.clone());
        dispatch.queue.push_back(Job::Live(transition, subscribers));

        if complete {
            info!(session = %self.id, transitions = dispatch.history.len(), "session complete");
        }

        self.drain(dispatch);
        self.bump_progress();
    }

    fn subscribe(&self, subscriber: Subscriber<T>) -> SubscriptionId {
        let mut dispatch = self.lock_dispatch();
        let id = SubscriptionId(dispatch.next_subscription);
        dispatch.next_subscription += 1;
        if !dispatch.history.is_empty() {
            let replay = dispatch.history.clone();
            dispatch.queue.push_back(Job::Replay(replay, subscriber.clone()));
        }
        dispatch.subscribers.push((id, subscriber));
        self.drain(dispatch);
        id
    }

    /// Run queued deliveries with the dispatch lock released.
    ///
    /// Only one thread drains at a time, so jobs run in the order they were
    /// queued. A thread that finds another one draining leaves its job to it.
    fn drain<'a>(&'a self, mut dispatch: MutexGuard<'a, Dispatch<T>>) {
        if dispatch.draining {
            return;
        }
        dispatch.draining = true;

        loop {
            let Some(job) = dispatch.queue.pop_front() else {
                dispatch.draining = false;
                return;
            };
            drop(dispatch);

            match &job {
                Job::Live(transition, subscribers) => {
                    for subscriber in subscribers {
                        self.deliver(subscriber, transition);
                    }
                }
                Job::Replay(transitions, subscriber) => {
                    for transition in transitions {
                        self.deliver(subscriber, transition);
                    }
                }
            }

            dispatch = self.lock_dispatch();
        }
    }

    fn deliver(&self, subscriber: &Subscriber<T>, transition: &Transition<T>) {
        let delivered = std::panic::catch_unwind(AssertUnwindSafe(|| subscriber.deliver(transition)));
        if delivered.is_err() {
            error!(session = %self.id, section = %transition.section, "transition callback panicked");
        }
    }

    fn retry(self: &Arc<Self>, id: &SectionId) -> Result<(), InvalidSectionError> {
        let index = self.position(id)?;
        let (generation, producer) = {
            let mut slots = self.write_slots();
            let slot = &mut slots[index];
            slot.generation += 1;
            slot.state = SectionState::Pending;
            slot.invoked_at = Instant::now();
            (slot.generation, Arc::clone(&slot.producer))
        };

        info!(session = %self.id, section = %id, attempt = generation + 1, "retrying section");
        self.bump_progress();
        self.launch(index, generation, producer);
        Ok(())
    }
}

/// Handle to a running stream session.
///
/// Cloning is cheap; all clones observe the same sections.
pub struct SessionHandle<T> {
    shared: Arc<SessionShared<T>>,
}

impl<T> Clone for SessionHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for SessionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.shared.id)
            .field("sections", &self.shared.index.len())
            .finish()
    }
}

impl<T> SessionHandle<T>
where
    T: Send + Sync + 'static,
{
    pub(crate) fn new(shared: Arc<SessionShared<T>>) -> Self {
        Self { shared }
    }

    /// The session id.
    pub fn id(&self) -> &SessionId {
        &self.shared.id
    }

    /// Section ids in declaration order.
    pub fn section_ids(&self) -> Vec<SectionId> {
        self.shared.read_slots().iter().map(|s| s.id.clone()).collect()
    }

    /// Whether `id` belongs to this session.
    pub fn contains(&self, id: impl Into<SectionId>) -> bool {
        self.shared.index.contains_key(&id.into())
    }

    /// Current status of a section. Never blocks on a producer.
    pub fn status(&self, id: impl Into<SectionId>) -> Result<SectionStatus, InvalidSectionError> {
        self.state(id).map(|state| state.status())
    }

    /// Current state of a section, including its payload once settled.
    pub fn state(&self, id: impl Into<SectionId>) -> Result<SectionState<T>, InvalidSectionError> {
        let index = self.shared.position(&id.into())?;
        Ok(self.shared.read_slots()[index].state.clone())
    }

    /// Status of every section, in declaration order.
    pub fn statuses(&self) -> Vec<(SectionId, SectionStatus)> {
        self.shared
            .read_slots()
            .iter()
            .map(|s| (s.id.clone(), s.state.status()))
            .collect()
    }

    /// Number of producer invocations for a section so far.
    pub fn attempts(&self, id: impl Into<SectionId>) -> Result<u32, InvalidSectionError> {
        let index = self.shared.position(&id.into())?;
        Ok(self.shared.read_slots()[index].generation + 1)
    }

    /// Whether every section has reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.shared
            .read_slots()
            .iter()
            .all(|s| s.state.status().is_terminal())
    }

    /// Register a callback for every transition of this session.
    ///
    /// Transitions that were already delivered are replayed first, in
    /// order. Callbacks run one at a time on the task that settled the
    /// section (or the caller of `subscribe`), with no session lock held,
    /// so they may query or retry the session. They must not block. A
    /// subscription made from inside a callback gets its replay once that
    /// callback returns. A panicking callback is logged and skipped.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Transition<T>) + Send + Sync + 'static,
    {
        self.shared.subscribe(Subscriber::Callback(Arc::new(callback)))
    }

    /// Remove a subscription. Returns whether it existed.
    ///
    /// A transition already queued for delivery may still reach it.
    pub fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut dispatch = self.shared.lock_dispatch();
        let before = dispatch.subscribers.len();
        dispatch.subscribers.retain(|(id, _)| *id != subscription);
        dispatch.subscribers.len() != before
    }

    /// Stream of transitions: replayed history first, then live ones.
    pub fn transitions(&self) -> Transitions<T> {
        let (tx, rx) = mpsc::unbounded();
        self.shared.subscribe(Subscriber::Channel(tx));
        rx
    }

    /// Every transition delivered so far, in order.
    pub fn history(&self) -> Vec<Transition<T>> {
        self.shared.lock_dispatch().history.clone()
    }

    /// Discard a section's current invocation and run its producer again.
    ///
    /// The section goes back to `Pending`; other sections are untouched.
    pub fn retry(&self, id: impl Into<SectionId>) -> Result<(), InvalidSectionError> {
        self.shared.retry(&id.into())
    }

    /// Wait until every section is terminal.
    ///
    /// Resolves immediately for an already complete session. A retry
    /// issued afterwards makes the session incomplete again.
    pub async fn settled(&self) {
        let mut progress = self.shared.progress.subscribe();
        loop {
            if self.is_complete() {
                return;
            }
            if progress.changed().await.is_err() {
                return;
            }
        }
    }
}
