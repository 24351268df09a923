use std::fmt::Write;

use todo_core::{RowActivity, Todo, ViewState};

/// Render the filtered list the way the list page shows it: banners first,
/// then one line per visible todo, or the filter's empty message.
pub fn list(state: &ViewState) -> String {
    let mut out = String::new();

    if let Some(err) = &state.fetch_error {
        let _ = writeln!(out, "Error! {err}");
    }
    if let Some(err) = &state.mutation_error {
        let _ = writeln!(out, "Could not {}: {err}", err.kind);
    }

    let visible = state.visible_todos();
    if visible.is_empty() && state.fetch_error.is_none() {
        let _ = writeln!(out, "{}", state.filter.empty_message());
    }
    for todo in &visible {
        out.push_str(&row(todo, state.row_activity(todo.id)));
    }
    out
}

pub fn row(todo: &Todo, activity: Option<RowActivity>) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    let mut line = format!("[{mark}] #{} {}", todo.id, todo.title);
    match activity {
        Some(RowActivity::Deleting) => line.push_str(" (deleting)"),
        Some(RowActivity::Toggling) | Some(RowActivity::Updating) => line.push_str(" (saving)"),
        None => {}
    }
    line.push('\n');

    if let Some(description) = todo.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(line, "      {description}");
    }
    let _ = writeln!(
        line,
        "      Created: {} | Updated: {}",
        todo.created_at.format("%Y-%m-%d %H:%M"),
        todo.updated_at.format("%Y-%m-%d %H:%M"),
    );
    line
}
