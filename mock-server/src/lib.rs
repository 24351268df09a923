use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    todos: BTreeMap<u64, Todo>,
    users: HashMap<String, (User, String)>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", get(get_todo).patch(update_todo).delete(delete_todo))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_todos(State(db): State<Db>) -> Json<Vec<Todo>> {
    let store = db.read().await;
    Json(store.todos.values().cloned().collect())
}

async fn create_todo(
    State(db): State<Db>,
    input: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), (StatusCode, String)> {
    let Json(input) = input.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
    if input.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "title must not be empty".to_string()));
    }

    let mut store = db.write().await;
    store.next_id += 1;
    let now = Utc::now();
    let todo = Todo {
        id: store.next_id,
        title: input.title,
        description: input.description,
        completed: input.completed,
        created_at: now,
        updated_at: now,
    };
    store.todos.insert(todo.id, todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn get_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Todo>, StatusCode> {
    let store = db.read().await;
    store.todos.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<u64>,
    input: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<Todo>, (StatusCode, String)> {
    let Json(input) = input.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err((StatusCode::BAD_REQUEST, "title must not be empty".to_string()));
    }

    let mut store = db.write().await;
    let todo = store
        .todos
        .get_mut(&id)
        .ok_or((StatusCode::NOT_FOUND, String::new()))?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(description) = input.description {
        todo.description = Some(description);
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    todo.updated_at = Utc::now().max(todo.updated_at);
    Ok(Json(todo.clone()))
}

async fn delete_todo(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .todos
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn register(
    State(db): State<Db>,
    input: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), (StatusCode, String)> {
    let Json(input) = input.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
    let mut store = db.write().await;
    if store.users.contains_key(&input.email) {
        return Err((StatusCode::CONFLICT, "email already registered".to_string()));
    }

    let user = User {
        id: store.users.len() as u64 + 1,
        email: input.email.clone(),
        name: input.name,
    };
    store
        .users
        .insert(input.email, (user.clone(), input.password));
    Ok((StatusCode::CREATED, Json(issue_token(user))))
}

async fn login(
    State(db): State<Db>,
    input: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let Json(input) = input.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;
    let store = db.read().await;
    match store.users.get(&input.email) {
        Some((user, password)) if *password == input.password => Ok(Json(issue_token(user.clone()))),
        _ => Err((StatusCode::UNAUTHORIZED, "invalid credentials".to_string())),
    }
}

fn issue_token(user: User) -> AuthResponse {
    AuthResponse {
        access_token: format!("token-{}", user.id),
        user,
    }
}
