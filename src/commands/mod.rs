//! Name-based command dispatch.
//!
//! Handlers come in two shapes: plain `(state, args)` handlers and identity-bound
//! `(state, args, user)` handlers. [`logged_in`] is the only adapter between them.

pub mod agg;
pub mod browse;
pub mod feeds;
pub mod follows;
pub mod users;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::errors::{AppError, AppResult};
use crate::models::user::User;
use crate::state::AppState;

/// One invocation: a command name and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

pub type HandlerFuture = BoxFuture<'static, AppResult<()>>;
pub type Handler = Box<dyn Fn(Arc<AppState>, Vec<String>) -> HandlerFuture + Send + Sync>;

#[derive(Default)]
pub struct Commands {
    handlers: HashMap<String, Handler>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `name` to `handler`, replacing any earlier registration.
    pub fn register<F, Fut>(&mut self, name: &str, handler: F)
    where
        F: Fn(Arc<AppState>, Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            Box::new(move |state, args| handler(state, args).boxed()),
        );
    }

    pub async fn run(&self, state: Arc<AppState>, command: Command) -> AppResult<()> {
        let handler = self
            .handlers
            .get(&command.name)
            .ok_or_else(|| AppError::UnknownCommand(command.name.clone()))?;
        log::debug!("Dispatching command {}", command.name);
        handler(state, command.args).await
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Registers every command the CLI exposes.
pub fn register_all(commands: &mut Commands) {
    commands.register("login", users::login);
    commands.register("register", users::register);
    commands.register("reset", users::reset);
    commands.register("users", users::list);
    commands.register("agg", agg::agg);
    commands.register("addfeed", logged_in(feeds::add_feed));
    commands.register("feeds", feeds::list);
    commands.register("follow", logged_in(follows::follow));
    commands.register("following", logged_in(follows::following));
    commands.register("unfollow", logged_in(follows::unfollow));
    commands.register("browse", logged_in(browse::browse));
}

/// Lifts a handler that needs the active user into a plain handler.
///
/// The active user name is resolved against storage on every call; when it does not
/// resolve, `AuthenticationRequired` is returned and `handler` is never invoked.
pub fn logged_in<F, Fut>(
    handler: F,
) -> impl Fn(Arc<AppState>, Vec<String>) -> HandlerFuture + Send + Sync + 'static
where
    F: Fn(Arc<AppState>, Vec<String>, User) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = AppResult<()>> + Send + 'static,
{
    let handler = Arc::new(handler);
    move |state, args| {
        let handler = Arc::clone(&handler);
        async move {
            let user = resolve_current_user(&state)?;
            handler(state, args, user).await
        }
        .boxed()
    }
}

fn resolve_current_user(state: &AppState) -> AppResult<User> {
    let name = state
        .current_user_name()
        .ok_or(AppError::AuthenticationRequired { user_name: None })?;
    let mut conn = state.conn()?;
    match User::get_by_name(&mut conn, &name)? {
        Some(user) => Ok(user),
        None => {
            log::warn!("Current user {} does not exist", name);
            Err(AppError::AuthenticationRequired {
                user_name: Some(name),
            })
        }
    }
}

/// Fails with a usage message unless at least `count` arguments were given.
pub(crate) fn require_args(args: &[String], count: usize, usage: &str) -> AppResult<()> {
    if args.len() < count {
        return Err(AppError::invalid_input(
            "arguments",
            &format!("expected {count}, got {}. Usage: `{usage}`", args.len()),
        ));
    }
    Ok(())
}
