//! Generic remote request state.
//!
//! A [`RemoteRequest`] tracks the latest attempt of one logical request.
//! Each attempt is identified by a [`Ticket`]; results carrying an older
//! ticket are dropped, so a slow response can never overwrite a newer one.

use std::cell::RefCell;
use std::future::Future;

use crate::core::error::ApiError;

/// State of the latest attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteState<T, E = ApiError> {
    Idle,
    Pending,
    Loaded(T),
    Failed(E),
}

impl<T, E> Default for RemoteState<T, E> {
    fn default() -> Self {
        Self::Idle
    }
}

/// Identifies one attempt of a [`RemoteRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Latest-attempt tracker for a single remote value.
#[derive(Clone, Debug)]
pub struct RemoteRequest<T, E = ApiError> {
    state: RemoteState<T, E>,
    generation: u64,
}

impl<T, E> Default for RemoteRequest<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> RemoteRequest<T, E> {
    pub fn new() -> Self {
        Self {
            state: RemoteState::Idle,
            generation: 0,
        }
    }

    /// Start a new attempt, superseding any pending one.
    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state = RemoteState::Pending;
        Ticket(self.generation)
    }

    /// Whether `ticket` still belongs to the most recent attempt.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    /// Record the outcome of an attempt.
    ///
    /// Returns `false` (and leaves the state untouched) when the ticket was
    /// superseded by a later [`begin`](Self::begin) or [`reset`](Self::reset).
    pub fn resolve(&mut self, ticket: Ticket, result: Result<T, E>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                stale = ticket.0,
                current = self.generation,
                "dropping superseded response"
            );
            return false;
        }
        self.state = match result {
            Ok(value) => RemoteState::Loaded(value),
            Err(error) => RemoteState::Failed(error),
        };
        true
    }

    /// Forget the current value and invalidate outstanding tickets.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = RemoteState::Idle;
    }

    pub fn state(&self) -> &RemoteState<T, E> {
        &self.state
    }

    pub fn pending(&self) -> bool {
        matches!(self.state, RemoteState::Pending)
    }

    pub fn loaded(&self) -> bool {
        matches!(self.state, RemoteState::Loaded(_))
    }

    pub fn error(&self) -> Option<&E> {
        match &self.state {
            RemoteState::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match &self.state {
            RemoteState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Outcome of [`run_tracked`].
#[derive(Clone, Debug, PartialEq)]
pub struct Tracked<T, E> {
    /// The attempt's own result, recorded or not.
    pub result: Result<T, E>,
    /// Whether the result was recorded in the cell.
    pub applied: bool,
}

/// Run `fut` as a new attempt of the request held in `cell`.
///
/// The cell is only borrowed around `begin` and `resolve`, never across the
/// await point. The caller always gets its own result back; `applied` is
/// `false` when a newer attempt superseded it in the meantime.
pub async fn run_tracked<T, E, F>(cell: &RefCell<RemoteRequest<T, E>>, fut: F) -> Tracked<T, E>
where
    T: Clone,
    E: Clone,
    F: Future<Output = Result<T, E>>,
{
    let ticket = cell.borrow_mut().begin();
    let result = fut.await;
    let applied = cell.borrow_mut().resolve(ticket, result.clone());
    Tracked { result, applied }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut request: RemoteRequest<u32, String> = RemoteRequest::new();
        assert_eq!(request.state(), &RemoteState::Idle);

        let ticket = request.begin();
        assert!(request.pending());
        assert!(request.value().is_none());

        assert!(request.resolve(ticket, Ok(7)));
        assert!(request.loaded());
        assert_eq!(request.value(), Some(&7));
        assert!(request.error().is_none());
    }

    #[test]
    fn test_failure_leaves_value_empty() {
        let mut request: RemoteRequest<u32, String> = RemoteRequest::new();
        let ticket = request.begin();
        request.resolve(ticket, Ok(1));

        let ticket = request.begin();
        request.resolve(ticket, Err("boom".to_string()));
        assert_eq!(request.error().map(String::as_str), Some("boom"));
        assert!(request.value().is_none());
    }

    #[test]
    fn test_superseded_ticket_is_ignored() {
        let mut request: RemoteRequest<&str, String> = RemoteRequest::new();
        let first = request.begin();
        let second = request.begin();

        assert!(request.resolve(second, Ok("new")));
        assert!(!request.resolve(first, Ok("old")));
        assert_eq!(request.value(), Some(&"new"));
    }

    #[test]
    fn test_reset_invalidates_pending() {
        let mut request: RemoteRequest<u8, String> = RemoteRequest::new();
        let ticket = request.begin();
        request.reset();
        assert!(!request.resolve(ticket, Ok(1)));
        assert_eq!(request.state(), &RemoteState::Idle);
    }

    #[tokio::test]
    async fn test_run_tracked() {
        let cell = RefCell::new(RemoteRequest::<u8, String>::new());
        let outcome = run_tracked(&cell, async { Ok(5) }).await;
        assert_eq!(
            outcome,
            Tracked {
                result: Ok(5),
                applied: true
            }
        );
        assert_eq!(cell.borrow().value(), Some(&5));
    }

    #[tokio::test]
    async fn test_run_tracked_after_reset_keeps_own_result() {
        let cell = RefCell::new(RemoteRequest::<u8, String>::new());
        let outcome = run_tracked(&cell, async {
            cell.borrow_mut().reset();
            Ok(3)
        })
        .await;
        assert_eq!(outcome.result, Ok(3));
        assert!(!outcome.applied);
        assert_eq!(cell.borrow().state(), &RemoteState::Idle);
    }
}
