//! Remote todo gateway: one network round-trip per operation.
//!
//! `TodoGateway` glues a `TodoClient` to a `Transport` and collapses the raw
//! `ApiError` of each exchange into the operation-specific `TodoError` that
//! callers branch on. It keeps no state between calls.

use async_trait::async_trait;
use tracing::warn;

use crate::client::TodoClient;
use crate::error::{ApiError, TodoError};
use crate::http::Transport;
use crate::types::{CreateTodo, Todo, TodoId, UpdateTodo};

/// The five operations the view model needs from the remote service.
#[async_trait]
pub trait TodoApi: Send + Sync {
    async fn list_todos(&self) -> Result<Vec<Todo>, TodoError>;

    /// `Ok(None)` when the server reports the todo as absent.
    async fn get_todo(&self, id: TodoId) -> Result<Option<Todo>, TodoError>;

    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, TodoError>;

    async fn update_todo(&self, id: TodoId, patch: &UpdateTodo) -> Result<Todo, TodoError>;

    async fn delete_todo(&self, id: TodoId) -> Result<(), TodoError>;
}

#[derive(Debug, Clone)]
pub struct TodoGateway<T> {
    client: TodoClient,
    transport: T,
}

impl<T: Transport> TodoGateway<T> {
    pub fn new(client: TodoClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[async_trait]
impl<T: Transport> TodoApi for TodoGateway<T> {
    async fn list_todos(&self) -> Result<Vec<Todo>, TodoError> {
        let response = self.transport.execute(self.client.build_list_todos()).await;
        response
            .and_then(|r| self.client.parse_list_todos(r))
            .map_err(|e| {
                warn!(error = %e, "error fetching todos");
                TodoError::ListUnavailable(e)
            })
    }

    async fn get_todo(&self, id: TodoId) -> Result<Option<Todo>, TodoError> {
        let response = self.transport.execute(self.client.build_get_todo(id)).await;
        response
            .and_then(|r| self.client.parse_get_todo(r))
            .map_err(|source| {
                warn!(id, error = %source, "error fetching todo");
                TodoError::Fetch { id, source }
            })
    }

    async fn create_todo(&self, input: &CreateTodo) -> Result<Todo, TodoError> {
        let result = match self.client.build_create_todo(input) {
            Ok(request) => self.transport.execute(request).await,
            Err(e) => Err(e),
        };
        result
            .and_then(|r| self.client.parse_create_todo(r))
            .map_err(|e| {
                warn!(error = %e, "error creating todo");
                if e.is_invalid_input() {
                    TodoError::InvalidInput(e)
                } else {
                    TodoError::CreateFailed(e)
                }
            })
    }

    async fn update_todo(&self, id: TodoId, patch: &UpdateTodo) -> Result<Todo, TodoError> {
        let result = match self.client.build_update_todo(id, patch) {
            Ok(request) => self.transport.execute(request).await,
            Err(e) => Err(e),
        };
        result
            .and_then(|r| self.client.parse_update_todo(r))
            .map_err(|e| {
                warn!(id, error = %e, "error updating todo");
                match e {
                    ApiError::NotFound => TodoError::NotFound(id),
                    other => TodoError::UpdateFailed(other),
                }
            })
    }

    async fn delete_todo(&self, id: TodoId) -> Result<(), TodoError> {
        let response = self.transport.execute(self.client.build_delete_todo(id)).await;
        response
            .and_then(|r| self.client.parse_delete_todo(r))
            .map_err(|e| {
                warn!(id, error = %e, "error deleting todo");
                match e {
                    ApiError::NotFound => TodoError::NotFound(id),
                    other => TodoError::DeleteFailed(other),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    const TODO_JSON: &str = r#"{"id":3,"title":"Walk dog","description":null,"completed":true,"createdAt":"2023-01-15T00:00:00Z","updatedAt":"2023-01-20T00:00:00Z"}"#;

    /// Replies with one canned outcome and remembers the request it saw.
    struct CannedTransport {
        reply: Result<HttpResponse, ApiError>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl CannedTransport {
        fn status(status: u16, body: &str) -> Self {
            Self {
                reply: Ok(HttpResponse::new(status, body)),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn unreachable() -> Self {
            Self {
                reply: Err(ApiError::Transport("connection refused".to_string())),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    fn gateway(transport: CannedTransport) -> TodoGateway<CannedTransport> {
        TodoGateway::new(TodoClient::new("http://localhost:3000"), transport)
    }

    #[tokio::test]
    async fn list_failure_is_reported_not_masked_as_empty() {
        let err = gateway(CannedTransport::unreachable())
            .list_todos()
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::ListUnavailable(ApiError::Transport(_))));

        let err = gateway(CannedTransport::status(500, "down"))
            .list_todos()
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::ListUnavailable(_)));
    }

    #[tokio::test]
    async fn get_maps_404_to_absent_and_other_failures_to_errors() {
        let missing = gateway(CannedTransport::status(404, "")).get_todo(3).await;
        assert_eq!(missing, Ok(None));

        let found = gateway(CannedTransport::status(200, TODO_JSON))
            .get_todo(3)
            .await
            .unwrap();
        assert_eq!(found.map(|t| t.title), Some("Walk dog".to_string()));

        let err = gateway(CannedTransport::unreachable())
            .get_todo(3)
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::Fetch { id: 3, .. }));
    }

    #[tokio::test]
    async fn create_distinguishes_invalid_input_from_generic_failure() {
        let input = CreateTodo::new("Buy milk");

        let err = gateway(CannedTransport::status(400, "bad"))
            .create_todo(&input)
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::InvalidInput(_)));

        let err = gateway(CannedTransport::status(503, "busy"))
            .create_todo(&input)
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::CreateFailed(_)));

        let err = gateway(CannedTransport::unreachable())
            .create_todo(&input)
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::CreateFailed(ApiError::Transport(_))));
    }

    #[tokio::test]
    async fn update_sends_patch_and_maps_not_found() {
        let transport = CannedTransport::status(404, "");
        let gw = gateway(transport);
        let err = gw.update_todo(8, &UpdateTodo::completed(true)).await.unwrap_err();
        assert_eq!(err, TodoError::NotFound(8));

        let seen = gw.transport.seen.lock().unwrap();
        assert_eq!(seen[0].method, HttpMethod::Patch);
        assert_eq!(seen[0].body.as_deref(), Some(r#"{"completed":true}"#));
    }

    #[tokio::test]
    async fn update_generic_failure() {
        let err = gateway(CannedTransport::status(500, ""))
            .update_todo(1, &UpdateTodo::completed(false))
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::UpdateFailed(_)));
    }

    #[tokio::test]
    async fn delete_outcomes() {
        assert!(gateway(CannedTransport::status(204, "")).delete_todo(1).await.is_ok());

        let err = gateway(CannedTransport::status(404, ""))
            .delete_todo(1)
            .await
            .unwrap_err();
        assert_eq!(err, TodoError::NotFound(1));

        let err = gateway(CannedTransport::unreachable())
            .delete_todo(1)
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::DeleteFailed(_)));
    }
}
