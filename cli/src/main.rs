//! `todo`: terminal front-end for the todo service.
//!
//! Every invocation restores the persisted session, forwards one intent to
//! the auth context or the view model, and prints the resulting state.

mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use todo_core::{
    AuthContext, Config, CreateTodo, FileSessionStore, Filter, LoginCredentials,
    RegisterCredentials, ReqwestTransport, SessionStore, TodoApi, TodoClient, TodoError, TodoGateway,
    TodoId, TodoViewModel, Transport, UpdateTodo, User,
};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "todo", about = "Manage your todo list")]
struct Cli {
    /// Base URL of the todo service (overrides TODO_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Todo(TodoCommand),
    #[command(flatten)]
    Session(SessionCommand),
}

#[derive(Subcommand)]
enum TodoCommand {
    /// Show todos.
    List {
        #[arg(short, long, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Show a single todo.
    Show { id: TodoId },
    /// Add a new todo.
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Edit a todo's title, description or completion.
    Edit {
        id: TodoId,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Mark a todo as completed.
    Done { id: TodoId },
    /// Mark a todo as not completed.
    Undo { id: TodoId },
    /// Delete a todo.
    Rm { id: TodoId },
}

#[derive(Subcommand)]
enum SessionCommand {
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Print the signed-in user.
    Whoami,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load().context("reading configuration")?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    debug!(?config, "configuration loaded");

    let mut auth = AuthContext::new(
        FileSessionStore::new(&config.session_file),
        TodoClient::new(&config.api_url),
        ReqwestTransport::new(),
    );
    auth.restore();

    match cli.command {
        Command::Session(command) => session(&mut auth, command).await,
        Command::Todo(command) => {
            let gateway = TodoGateway::new(auth.authorized_client(), ReqwestTransport::new());
            let vm = TodoViewModel::with_list_retries(gateway, config.list_retries);
            todos(&vm, command).await
        }
    }
}

async fn session<S, T>(auth: &mut AuthContext<S, T>, command: SessionCommand) -> Result<()>
where
    S: SessionStore,
    T: Transport,
{
    match command {
        SessionCommand::Register {
            email,
            password,
            name,
        } => {
            let credentials = RegisterCredentials {
                name,
                email,
                password,
            };
            let state = auth.register(&credentials).await?;
            print_user(state.user.as_ref());
        }
        SessionCommand::Login { email, password } => {
            let state = auth.login(&LoginCredentials { email, password }).await?;
            print_user(state.user.as_ref());
        }
        SessionCommand::Logout => {
            auth.logout()?;
            println!("Logged out.");
        }
        SessionCommand::Whoami => print_user(auth.state().user.as_ref()),
    }
    Ok(())
}

async fn todos<A: TodoApi>(vm: &TodoViewModel<A>, command: TodoCommand) -> Result<()> {
    match command {
        TodoCommand::List { filter } => {
            vm.set_filter(filter);
            let loaded = vm.load_todos().await;
            print!("{}", render::list(&vm.snapshot()));
            list_outcome(loaded)?;
        }
        TodoCommand::Show { id } => match vm.api().get_todo(id).await? {
            Some(todo) => print!("{}", render::row(&todo, None)),
            None => bail!("Todo {id} not found."),
        },
        TodoCommand::Add { title, description } => {
            let mut input = CreateTodo::new(title);
            input.description = description;
            if let Err(reason) = input.validate() {
                bail!(reason);
            }
            vm.create(input).await?;
            print!("{}", render::list(&vm.snapshot()));
        }
        TodoCommand::Edit {
            id,
            title,
            description,
            completed,
        } => {
            let patch = UpdateTodo {
                title,
                description,
                completed,
            };
            if patch.is_empty() {
                bail!("nothing to change: pass --title, --description or --completed");
            }
            if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
                bail!("Title is required");
            }
            vm.load_todos().await?;
            let Some(todo) = vm.todos().into_iter().find(|t| t.id == id) else {
                bail!("Todo {id} not found.");
            };
            vm.begin_edit(todo);
            vm.save_edit(patch).await?;
            print!("{}", render::list(&vm.snapshot()));
        }
        TodoCommand::Done { id } => {
            vm.toggle_complete(id, true).await?;
            print!("{}", render::list(&vm.snapshot()));
        }
        TodoCommand::Undo { id } => {
            vm.toggle_complete(id, false).await?;
            print!("{}", render::list(&vm.snapshot()));
        }
        TodoCommand::Rm { id } => {
            vm.remove(id).await?;
            print!("{}", render::list(&vm.snapshot()));
        }
    }
    Ok(())
}

/// The list banner already names the failure; only the exit status is left.
fn list_outcome(loaded: Result<(), TodoError>) -> Result<()> {
    if loaded.is_err() {
        bail!("todo list unavailable");
    }
    Ok(())
}

fn print_user(user: Option<&User>) {
    match user {
        Some(user) => match &user.name {
            Some(name) => println!("Signed in as {name} <{}>", user.email),
            None => println!("Signed in as {}", user.email),
        },
        None => println!("Not signed in."),
    }
}
