//! Client-side todo state: the cached list, the filter, the edit selection and
//! the progress of every request in flight.
//!
//! # Design
//! The server is the only source of truth. Mutations never patch the cached
//! list; a successful create, update or delete is followed by a full reload,
//! and whichever reload completes last replaces the list wholesale.
//!
//! Every operation takes `&self`, so a presentation layer can drive several
//! at once (toggle row 2 while row 1 is still deleting). State sits behind a
//! mutex that is only ever held between awaits, never across one. Per-row
//! progress lives in `ViewState::in_flight`, keyed by todo id.
//!
//! Pending markers are owned by an `InFlight` guard, so an operation whose
//! future is dropped mid-request (an aborted task, a timeout) still clears
//! its row marker and releases its `Pending` status.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::TodoError;
use crate::filter::{visible_todos, Filter};
use crate::gateway::TodoApi;
use crate::types::{CreateTodo, Todo, TodoId, UpdateTodo};

/// Progress of one class of request (fetch, create, update, delete).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// What a single row is currently waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowActivity {
    Toggling,
    Updating,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        })
    }
}

/// The dismissible banner left behind by the last failed mutation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{error}")]
pub struct MutationError {
    pub kind: MutationKind,
    #[source]
    pub error: TodoError,
}

/// Everything a renderer needs, as a plain value.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub todos: Vec<Todo>,
    pub filter: Filter,
    pub editing: Option<Todo>,
    pub fetch: OpStatus,
    pub fetch_error: Option<TodoError>,
    pub create: OpStatus,
    pub update: OpStatus,
    pub delete: OpStatus,
    pub mutation_error: Option<MutationError>,
    /// Activities per row, oldest first. A row is busy while this is non-empty.
    pub in_flight: HashMap<TodoId, Vec<RowActivity>>,
}

impl ViewState {
    pub fn visible_todos(&self) -> Vec<Todo> {
        visible_todos(&self.todos, self.filter)
    }

    pub fn is_loading(&self) -> bool {
        self.fetch == OpStatus::Pending
    }

    /// The most recently started activity on a row.
    pub fn row_activity(&self, id: TodoId) -> Option<RowActivity> {
        self.in_flight.get(&id).and_then(|a| a.last().copied())
    }
}

pub struct TodoViewModel<A> {
    api: A,
    list_retries: u32,
    state: Mutex<ViewState>,
}

impl<A: TodoApi> TodoViewModel<A> {
    /// A view model that retries a failed list fetch once before giving up.
    pub fn new(api: A) -> Self {
        Self::with_list_retries(api, 1)
    }

    pub fn with_list_retries(api: A, list_retries: u32) -> Self {
        Self {
            api,
            list_retries,
            state: Mutex::new(ViewState::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        lock(&self.state)
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    pub fn todos(&self) -> Vec<Todo> {
        self.state().todos.clone()
    }

    pub fn filter(&self) -> Filter {
        self.state().filter
    }

    pub fn editing(&self) -> Option<Todo> {
        self.state().editing.clone()
    }

    pub fn fetch_error(&self) -> Option<TodoError> {
        self.state().fetch_error.clone()
    }

    pub fn mutation_error(&self) -> Option<MutationError> {
        self.state().mutation_error.clone()
    }

    pub fn row_activity(&self, id: TodoId) -> Option<RowActivity> {
        self.state().row_activity(id)
    }

    /// Recomputed from the cached list on every call.
    pub fn visible_todos(&self) -> Vec<Todo> {
        self.state().visible_todos()
    }

    /// Fetch the list, retrying up to `list_retries` times.
    ///
    /// On failure the previously loaded todos stay in place and
    /// `fetch_error` is set; calling this again is the manual retry.
    pub async fn load_todos(&self) -> Result<(), TodoError> {
        let mut pending = InFlight::start(&self.state, OpClass::Fetch, None);

        let mut attempt = 0;
        let result = loop {
            match self.api.list_todos().await {
                Ok(todos) => break Ok(todos),
                Err(e) if attempt < self.list_retries => {
                    attempt += 1;
                    debug!(attempt, error = %e, "retrying todo list fetch");
                }
                Err(e) => break Err(e),
            }
        };

        pending.settle();
        let mut state = self.state();
        match result {
            Ok(todos) => {
                debug!(count = todos.len(), "loaded todos");
                state.todos = todos;
                state.fetch = OpStatus::Succeeded;
                state.fetch_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "keeping stale todos after failed fetch");
                state.fetch = OpStatus::Failed;
                state.fetch_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Create a todo and reload. The title is expected to be validated by
    /// the caller already (`CreateTodo::validate`).
    pub async fn create(&self, input: CreateTodo) -> Result<(), TodoError> {
        let mut pending = InFlight::start(&self.state, MutationKind::Create.into(), None);

        let result = self.api.create_todo(&input).await;
        pending.settle();
        match result {
            Ok(todo) => {
                info!(id = todo.id, "created todo");
                self.succeed(MutationKind::Create);
                self.reload().await;
                Ok(())
            }
            Err(e) => Err(self.fail(MutationKind::Create, e)),
        }
    }

    /// Patch a todo and reload. Success also ends any edit in progress.
    pub async fn update(&self, id: TodoId, patch: UpdateTodo) -> Result<(), TodoError> {
        self.apply_update(id, &patch, RowActivity::Updating).await
    }

    pub async fn toggle_complete(&self, id: TodoId, completed: bool) -> Result<(), TodoError> {
        self.apply_update(id, &UpdateTodo::completed(completed), RowActivity::Toggling)
            .await
    }

    /// Submit the edit form against the todo selected by `begin_edit`.
    pub async fn save_edit(&self, patch: UpdateTodo) -> Result<(), TodoError> {
        let editing = self.state().editing.as_ref().map(|t| t.id);
        let Some(id) = editing else {
            warn!("save_edit called with nothing being edited");
            return Err(TodoError::NoEditTarget);
        };
        self.apply_update(id, &patch, RowActivity::Updating).await
    }

    /// Delete a todo. The row stays in the list until a reload confirms it
    /// is gone.
    pub async fn remove(&self, id: TodoId) -> Result<(), TodoError> {
        let mut pending = InFlight::start(
            &self.state,
            MutationKind::Delete.into(),
            Some((id, RowActivity::Deleting)),
        );

        let result = self.api.delete_todo(id).await;
        pending.settle();
        match result {
            Ok(()) => {
                info!(id, "deleted todo");
                self.succeed(MutationKind::Delete);
                self.reload().await;
                Ok(())
            }
            Err(e) => Err(self.fail(MutationKind::Delete, e)),
        }
    }

    pub fn set_filter(&self, filter: Filter) {
        self.state().filter = filter;
    }

    /// Select `todo` for editing, replacing any previous selection.
    pub fn begin_edit(&self, todo: Todo) {
        self.state().editing = Some(todo);
    }

    pub fn cancel_edit(&self) {
        self.state().editing = None;
    }

    pub fn dismiss_mutation_error(&self) {
        self.state().mutation_error = None;
    }

    pub fn dismiss_fetch_error(&self) {
        self.state().fetch_error = None;
    }

    async fn apply_update(
        &self,
        id: TodoId,
        patch: &UpdateTodo,
        activity: RowActivity,
    ) -> Result<(), TodoError> {
        let mut pending =
            InFlight::start(&self.state, MutationKind::Update.into(), Some((id, activity)));

        let result = self.api.update_todo(id, patch).await;
        pending.settle();
        match result {
            Ok(todo) => {
                info!(id = todo.id, "updated todo");
                self.succeed(MutationKind::Update);
                self.state().editing = None;
                self.reload().await;
                Ok(())
            }
            Err(e) => Err(self.fail(MutationKind::Update, e)),
        }
    }

    /// Reload after a mutation. A failure here is already recorded in
    /// `fetch_error` and does not undo the mutation's success.
    async fn reload(&self) {
        if let Err(e) = self.load_todos().await {
            debug!(error = %e, "reload after mutation failed");
        }
    }

    fn succeed(&self, kind: MutationKind) {
        let mut state = self.state();
        *status_mut(&mut state, kind.into()) = OpStatus::Succeeded;
        if state.mutation_error.as_ref().is_some_and(|m| m.kind == kind) {
            state.mutation_error = None;
        }
    }

    fn fail(&self, kind: MutationKind, error: TodoError) -> TodoError {
        let mut state = self.state();
        *status_mut(&mut state, kind.into()) = OpStatus::Failed;
        state.mutation_error = Some(MutationError {
            kind,
            error: error.clone(),
        });
        error
    }
}

fn lock(state: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Which `OpStatus` slot a request reports into.
#[derive(Debug, Clone, Copy)]
enum OpClass {
    Fetch,
    Mutation(MutationKind),
}

impl From<MutationKind> for OpClass {
    fn from(kind: MutationKind) -> Self {
        OpClass::Mutation(kind)
    }
}

fn status_mut(state: &mut ViewState, class: OpClass) -> &mut OpStatus {
    match class {
        OpClass::Fetch => &mut state.fetch,
        OpClass::Mutation(MutationKind::Create) => &mut state.create,
        OpClass::Mutation(MutationKind::Update) => &mut state.update,
        OpClass::Mutation(MutationKind::Delete) => &mut state.delete,
    }
}

/// Marks a request as pending for as long as it lives.
///
/// Dropping the guard removes its row activity. If the request never
/// settled, a status still at `Pending` goes back to `Idle`.
struct InFlight<'a> {
    state: &'a Mutex<ViewState>,
    class: OpClass,
    row: Option<(TodoId, RowActivity)>,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn start(
        state: &'a Mutex<ViewState>,
        class: OpClass,
        row: Option<(TodoId, RowActivity)>,
    ) -> Self {
        let mut guard = lock(state);
        *status_mut(&mut guard, class) = OpStatus::Pending;
        if let Some((id, activity)) = row {
            guard.in_flight.entry(id).or_default().push(activity);
        }
        Self {
            state,
            class,
            row,
            settled: false,
        }
    }

    /// The response arrived; its outcome is recorded by the caller.
    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if !self.settled {
            debug!(class = ?self.class, "request dropped before it settled");
            let status = status_mut(&mut state, self.class);
            if *status == OpStatus::Pending {
                *status = OpStatus::Idle;
            }
        }
        if let Some((id, activity)) = self.row {
            if let Some(activities) = state.in_flight.get_mut(&id) {
                if let Some(pos) = activities.iter().rposition(|a| *a == activity) {
                    activities.remove(pos);
                }
                if activities.is_empty() {
                    state.in_flight.remove(&id);
                }
            }
        }
    }
}
