//! The admin menu: user management, recovery approvals, delegation.

use std::io::{BufRead, Write};
use std::path::Path;

use usms_core::validation::{validate_password, validate_username};
use usms_core::{CoreError, EntityStatus, Role, UserStatus};
use usms_db::Database;

use crate::error::AppResult;
use crate::screens;
use crate::session::Session;
use crate::ui::{is_exit, Console};

pub async fn run<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
    receipt_dir: &Path,
) -> AppResult<()> {
    loop {
        con.heading(&format!("Admin — {}", session.username))?;
        con.say("[1] User management")?;
        con.say("[2] Approve recovery requests")?;
        con.say("[P] Product manager menu")?;
        con.say("[S] Sales manager menu")?;
        con.say("[X] Logout")?;

        let choice = con.read_line("Choice: ")?;
        if is_exit(&choice) {
            return Ok(());
        }

        let result = match choice.to_ascii_lowercase().as_str() {
            "1" => users_menu(db, con, session).await,
            "2" => approve_recovery(db, con).await,
            "p" => screens::product_manager::run(db, con, session).await,
            "s" => screens::sales_manager::run(db, con, session, receipt_dir).await,
            _ => {
                con.error("Unknown option.")?;
                Ok(())
            }
        };

        if let Err(e) = result {
            con.error(&e)?;
        }
    }
}

// =============================================================================
// User Management
// =============================================================================

async fn users_menu<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<()> {
    loop {
        con.heading("User Management")?;

        let users = db.users().list().await?;
        con.say(format!("{:<6} {:<20} {:<16} {}", "ID", "USERNAME", "ROLE", "STATUS"))?;
        for u in &users {
            let status = match u.status {
                UserStatus::Active => "ACTIVE",
                UserStatus::Deactivated => "DEACTIVATED",
            };
            con.say(format!("{:<6} {:<20} {:<16} {}", u.id, u.username, u.role.label(), status))?;
        }

        con.say("[1] Create  [2] Edit  [3] Deactivate  [4] Recover  [X] Back")?;
        let choice = con.read_line("Choice: ")?;
        if is_exit(&choice) {
            return Ok(());
        }

        let result = match choice.as_str() {
            "1" => create_user(db, con).await,
            "2" => edit_user(db, con).await,
            "3" => deactivate_user(db, con, session).await,
            "4" => recover_user(db, con).await,
            _ => {
                con.error("Unknown option.")?;
                Ok(())
            }
        };

        if let Err(e) = result {
            con.error(&e)?;
        }
    }
}

fn prompt_role<R: BufRead, W: Write>(
    con: &mut Console<R, W>,
    prompt: &str,
) -> AppResult<Option<Option<Role>>> {
    // Outer None = abort, inner None = keep current (blank)
    match con.prompt(prompt)? {
        None => Ok(None),
        Some(input) if input.is_empty() => Ok(Some(None)),
        Some(input) => match Role::parse(&input) {
            Some(role) => Ok(Some(Some(role))),
            None => {
                con.error("Roles: user, product_manager, sales_manager, admin.")?;
                Ok(None)
            }
        },
    }
}

async fn create_user<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    let username = match con.prompt_nonempty("Username: ")? {
        Some(u) => u,
        None => return Ok(()),
    };
    validate_username(&username)?;

    let password = match con.prompt_nonempty("Password: ")? {
        Some(p) => p,
        None => return Ok(()),
    };
    validate_password(&password)?;

    let role = match prompt_role(con, "Role (user/product_manager/sales_manager/admin): ")? {
        Some(Some(role)) => role,
        Some(None) => Role::User,
        None => return Ok(()),
    };

    let user = db.users().register(&username, &password, role).await?;
    con.success(format!("User '{}' created as {}.", user.username, user.role))?;
    Ok(())
}

async fn edit_user<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    let target = match find_user(db, con).await? {
        Some(u) => u,
        None => return Ok(()),
    };
    con.say(format!("Editing '{}' ({}).", target.username, target.role))?;
    con.say("Press Enter at any field to keep the current value.")?;

    let username = match con.prompt("New username: ")? {
        None => return Ok(()),
        Some(input) if input.is_empty() => None,
        Some(input) => {
            validate_username(&input)?;
            Some(input)
        }
    };

    let password = match con.prompt("New password: ")? {
        None => return Ok(()),
        Some(input) if input.is_empty() => None,
        Some(input) => {
            validate_password(&input)?;
            Some(input)
        }
    };

    let role = match prompt_role(con, "New role: ")? {
        Some(role) => role,
        None => return Ok(()),
    };

    if username.is_none() && password.is_none() && role.is_none() {
        con.warn("Nothing to change.")?;
        return Ok(());
    }

    db.users()
        .update(target.id, username.as_deref(), password.as_deref(), role)
        .await?;
    con.success("User updated.")?;
    Ok(())
}

async fn deactivate_user<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    session: &Session,
) -> AppResult<()> {
    let target = match find_user(db, con).await? {
        Some(u) => u,
        None => return Ok(()),
    };

    if target.id == session.user_id {
        return Err(CoreError::SelfDeactivation.into());
    }

    // Destructive: re-verify the admin before the final confirmation
    let admin = db
        .users()
        .get(session.user_id)
        .await?
        .ok_or_else(|| CoreError::InvalidCredentials)?;
    let password = match con.prompt_nonempty("Your password: ")? {
        Some(p) => p,
        None => return Ok(()),
    };
    if !db.users().verify(&admin, &password) {
        return Err(CoreError::InvalidCredentials.into());
    }

    if !con.confirm(&format!("Deactivate '{}'?", target.username))? {
        con.warn("Deactivation aborted.")?;
        return Ok(());
    }

    db.users().deactivate(target.id).await?;
    con.success(format!("User '{}' deactivated.", target.username))?;
    Ok(())
}

async fn recover_user<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    let target = match find_user(db, con).await? {
        Some(u) => u,
        None => return Ok(()),
    };

    db.users().recover(target.id).await?;
    con.success(format!("User '{}' is active again.", target.username))?;
    Ok(())
}

async fn find_user<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<Option<usms_core::User>> {
    let username = match con.prompt_nonempty("Username: ")? {
        Some(u) => u,
        None => return Ok(None),
    };

    match db.users().get_by_username(&username).await? {
        Some(user) => Ok(Some(user)),
        None => {
            con.error(format!("No user '{username}'."))?;
            Ok(None)
        }
    }
}

// =============================================================================
// Recovery Approvals
// =============================================================================

async fn approve_recovery<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
) -> AppResult<()> {
    con.heading("Pending Recovery Requests")?;

    let products = db.products().list_pending_recovery().await?;
    let categories = db
        .categories()
        .list(Some(EntityStatus::PendingRecovery))
        .await?;

    if products.is_empty() && categories.is_empty() {
        con.warn("No recovery requests.")?;
        return Ok(());
    }

    for p in &products {
        con.say(format!("  product  [{}] {} '{}'", p.id, p.code, p.name))?;
    }
    for c in &categories {
        con.say(format!("  category [{}] '{}'", c.id, c.name))?;
    }

    let kind = con.read_line("Approve a [P]roduct or [C]ategory? ")?;
    if is_exit(&kind) {
        return Ok(());
    }
    let id = match con.prompt_i64("Id: ")? {
        Some(id) => id,
        None => return Ok(()),
    };

    match kind.to_ascii_lowercase().as_str() {
        "p" => db.products().approve_recovery(id).await?,
        "c" => db.categories().approve_recovery(id).await?,
        _ => {
            con.error("Enter P or C.")?;
            return Ok(());
        }
    }

    con.success("Recovery approved; the record is active again.")?;
    Ok(())
}
