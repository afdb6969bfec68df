//! User management CLI commands

use chrono::Utc;
use clap::Subcommand;

use crate::display::{format_user_details, format_user_list};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Permission, Role};
use crate::services::user::UserProfile;
use crate::services::UserService;

use super::{read_new_secret, read_secret, CliContext};

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user
    Create {
        username: String,
        /// admin, accountant, agent or readonly
        #[arg(short, long, default_value = "readonly")]
        role: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Read the password from one line of stdin
        #[arg(long)]
        password_stdin: bool,
    },
    /// List users
    List {
        /// Include deactivated users
        #[arg(short, long)]
        all: bool,
    },
    /// Show user details
    Show { user: String },
    /// Change a password; without a user, your own
    Passwd {
        user: Option<String>,
        #[arg(long)]
        password_stdin: bool,
    },
    /// Change the role of a user
    Role { user: String, role: String },
    /// Deactivate a user
    Deactivate { user: String },
    /// Reactivate a user
    Reactivate { user: String },
    /// Clear a login lockout
    Unlock { user: String },
}

fn parse_role(value: &str) -> CheckdeskResult<Role> {
    Role::parse(value).ok_or_else(|| {
        CheckdeskError::Validation(format!(
            "Invalid role '{}'. Use admin, accountant, agent or readonly",
            value
        ))
    })
}

pub fn handle_user_command(ctx: &CliContext, cmd: UserCommands) -> CheckdeskResult<()> {
    let service = UserService::new(&ctx.storage, &ctx.settings.security);
    let now = Utc::now();

    match cmd {
        UserCommands::Create {
            username,
            role,
            full_name,
            email,
            password_stdin,
        } => {
            ctx.require(Permission::UserCreate)?;
            let role = parse_role(&role)?;
            let password = read_new_secret("password", password_stdin)?;
            let profile = UserProfile {
                full_name: full_name.unwrap_or_default(),
                email: email.unwrap_or_default(),
            };
            let user = service.create(&username, &password, role, profile)?;
            println!("Created user: {} ({})", user.username, user.role);
            println!("  ID: {}", user.id);
        }

        UserCommands::List { all } => {
            ctx.require(Permission::UserRead)?;
            println!("{}", format_user_list(&service.list(all)?, now));
        }

        UserCommands::Show { user } => {
            ctx.require(Permission::UserRead)?;
            let user = service.find_required(&user)?;
            print!("{}", format_user_details(&user, now));
        }

        UserCommands::Passwd {
            user,
            password_stdin,
        } => {
            let me = ctx.user().ok_or_else(|| {
                CheckdeskError::Authentication("Not logged in; run `checkdesk login` first".into())
            })?;
            let target = match user {
                Some(name) => service.find_required(&name)?,
                None => me.clone(),
            };

            if target.id == me.id {
                let current = read_secret("Current password: ", password_stdin)?;
                let new_password = read_new_secret("password", password_stdin)?;
                service.change_password(target.id, Some(current.as_str()), &new_password)?;
            } else {
                ctx.require(Permission::UserUpdate)?;
                let new_password = read_new_secret("password", password_stdin)?;
                service.change_password(target.id, None, &new_password)?;
            }
            println!("Password changed for {}", target.username);
        }

        UserCommands::Role { user, role } => {
            ctx.require(Permission::UserUpdate)?;
            let role = parse_role(&role)?;
            let user = service.find_required(&user)?;
            let user = service.set_role(user.id, role)?;
            println!("{} is now {}", user.username, user.role);
        }

        UserCommands::Deactivate { user } => {
            let me = ctx.require(Permission::UserDelete)?;
            let user = service.find_required(&user)?;
            if user.id == me.id {
                return Err(CheckdeskError::Validation(
                    "You cannot deactivate your own account".into(),
                ));
            }
            let user = service.deactivate(user.id)?;
            println!("Deactivated user: {}", user.username);
        }

        UserCommands::Reactivate { user } => {
            ctx.require(Permission::UserUpdate)?;
            let user = service.find_required(&user)?;
            let user = service.reactivate(user.id)?;
            println!("Reactivated user: {}", user.username);
        }

        UserCommands::Unlock { user } => {
            ctx.require(Permission::UserUpdate)?;
            let user = service.find_required(&user)?;
            let user = service.unlock(user.id)?;
            println!("Unlocked user: {}", user.username);
        }
    }

    Ok(())
}
