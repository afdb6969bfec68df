//! Setup and session commands: `init`, `login`, `logout`, `whoami`

use chrono::Utc;

use crate::config::paths::CheckdeskPaths;
use crate::config::settings::Settings;
use crate::error::CheckdeskResult;
use crate::services::{SessionService, UserService};
use crate::storage::{initialize_storage, Storage};

use super::{read_new_secret, read_secret, CliContext};

/// Create the data directory, seed default banks and the first admin
///
/// The admin is only created while no user exists yet.
pub fn handle_init(
    paths: &CheckdeskPaths,
    settings: &Settings,
    admin: &str,
    password_stdin: bool,
) -> CheckdeskResult<()> {
    println!("Initializing checkdesk at: {}", paths.base_dir().display());
    settings.save(paths)?;

    let storage = Storage::open(paths.clone())?;
    let seeded = initialize_storage(&storage)?;
    if seeded > 0 {
        println!("Added {} default bank(s).", seeded);
    }

    if storage.users().count()? > 0 {
        println!("Users already exist; skipping admin creation.");
    } else {
        let password = read_new_secret("admin password", password_stdin)?;
        let user = UserService::new(&storage, &settings.security).bootstrap_admin(admin, &password)?;
        println!("Created admin user: {}", user.username);
        println!("Log in with: checkdesk login {}", user.username);
    }

    println!("Initialization complete!");
    Ok(())
}

pub fn handle_login(ctx: &CliContext, username: &str, password_stdin: bool) -> CheckdeskResult<()> {
    let password = read_secret("Password: ", password_stdin)?;
    let sessions = SessionService::new(&ctx.storage, ctx.paths.session_file());
    let (user, session) = sessions.login(username, &password, &ctx.settings.security, Utc::now())?;

    println!("Logged in as {} ({})", user.username, user.role);
    println!(
        "Session valid until {}",
        session.expires_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

pub fn handle_logout(ctx: &CliContext) -> CheckdeskResult<()> {
    let sessions = SessionService::new(&ctx.storage, ctx.paths.session_file());
    if sessions.logout()? {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}

pub fn handle_whoami(ctx: &CliContext) -> CheckdeskResult<()> {
    match ctx.user() {
        Some(user) => {
            println!("{} ({})", user.username, user.role);
            if !user.full_name.is_empty() {
                println!("{}", user.full_name);
            }
        }
        None => println!("Not logged in."),
    }
    Ok(())
}
