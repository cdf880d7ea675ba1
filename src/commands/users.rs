use std::sync::Arc;

use super::require_args;
use crate::errors::{AppError, AppResult, ResultExt};
use crate::models::user::{NewUser, User};
use crate::state::AppState;

pub async fn login(state: Arc<AppState>, args: Vec<String>) -> AppResult<()> {
    require_args(&args, 1, "login <username>")?;
    let name = &args[0];

    let mut conn = state.conn()?;
    let user = User::get_by_name(&mut conn, name)?
        .ok_or_else(|| AppError::resource_not_found(&format!("User with name {name}")))?;

    state.config_mut().set_user(&user.name)?;
    println!("Current user set to: {}", user.name);
    Ok(())
}

pub async fn register(state: Arc<AppState>, args: Vec<String>) -> AppResult<()> {
    require_args(&args, 1, "register <username>")?;
    let name = &args[0];

    let mut conn = state.conn()?;
    if User::get_by_name(&mut conn, name)?.is_some() {
        return Err(AppError::duplicate_resource(&format!("User with name {name}")));
    }

    let user = NewUser::new(name)
        .insert(&mut conn)
        .context("Could not create user")?;
    state.config_mut().set_user(&user.name)?;

    println!("Created user {} and set to current user", user.name);
    tracing::debug!(user_id = %user.id, name = %user.name, "Registered user");
    Ok(())
}

pub async fn reset(state: Arc<AppState>, _args: Vec<String>) -> AppResult<()> {
    let mut conn = state.conn()?;
    let removed = User::delete_all(&mut conn).context("Could not reset db")?;
    tracing::debug!(removed, "Database reset completed successfully");
    println!("Database has been reset");
    Ok(())
}

pub async fn list(state: Arc<AppState>, _args: Vec<String>) -> AppResult<()> {
    let mut conn = state.conn()?;
    let users = User::get_all(&mut conn).context("Unable to fetch users")?;
    let current = state.current_user_name();

    for user in users {
        if current.as_deref() == Some(user.name.as_str()) {
            println!("* {} (current)", user.name);
        } else {
            println!("* {}", user.name);
        }
    }
    Ok(())
}
