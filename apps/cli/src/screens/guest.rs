//! The guest menu: browse, login, register.

use std::io::{BufRead, Write};
use std::path::Path;

use usms_core::validation::{validate_password, validate_username};
use usms_core::{CoreError, Role};
use usms_db::Database;

use crate::error::AppResult;
use crate::screens;
use crate::session::Session;
use crate::ui::{is_exit, Console};

/// The top-level menu loop. Returns when the operator exits the program.
pub async fn run<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    receipt_dir: &Path,
) -> AppResult<()> {
    loop {
        con.heading("USMS — Uniform Sales & Management System")?;
        con.say("[1] Browse catalog")?;
        con.say("[2] Login")?;
        con.say("[3] Register")?;
        con.say("[X] Exit")?;

        let choice = con.read_line("Choice: ")?;
        if is_exit(&choice) {
            return Ok(());
        }

        let result = match choice.as_str() {
            "1" => screens::show_catalog(db, con).await,
            "2" => login(db, con, receipt_dir).await,
            "3" => register(db, con).await,
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

async fn login<R: BufRead, W: Write>(
    db: &Database,
    con: &mut Console<R, W>,
    receipt_dir: &Path,
) -> AppResult<()> {
    con.heading("Login")?;

    let username = match con.prompt_nonempty("Username: ")? {
        Some(u) => u,
        None => return Ok(()),
    };
    let password = match con.prompt_nonempty("Password: ")? {
        Some(p) => p,
        None => return Ok(()),
    };

    let user = match db.users().authenticate(&username, &password).await? {
        Some(user) => user,
        None => {
            con.error(CoreError::InvalidCredentials)?;
            return Ok(());
        }
    };

    let session = Session::for_user(&user);
    con.success(format!("Welcome, {} ({})", session.username, session.role))?;

    match session.role {
        Role::User => screens::customer::run(db, con, &session, receipt_dir).await?,
        Role::ProductManager => screens::product_manager::run(db, con, &session).await?,
        Role::SalesManager => screens::sales_manager::run(db, con, &session, receipt_dir).await?,
        Role::Admin => screens::admin::run(db, con, &session, receipt_dir).await?,
    }

    con.say(format!("Logged out {}.", session.username))?;
    Ok(())
}

async fn register<R: BufRead, W: Write>(db: &Database, con: &mut Console<R, W>) -> AppResult<()> {
    con.heading("Register")?;

    let username = match con.prompt_nonempty("Username (3-32 chars, letters/digits/_): ")? {
        Some(u) => u,
        None => return Ok(()),
    };
    validate_username(&username)?;

    let password = match con.prompt_nonempty("Password (min 8 chars): ")? {
        Some(p) => p,
        None => return Ok(()),
    };
    validate_password(&password)?;

    let confirm = match con.prompt_nonempty("Confirm password: ")? {
        Some(p) => p,
        None => return Ok(()),
    };
    if confirm != password {
        con.error("Passwords do not match.")?;
        return Ok(());
    }

    // Public registration is always a customer account
    let user = db.users().register(&username, &password, Role::User).await?;
    con.success(format!("Account '{}' created. You can now log in.", user.username))?;
    Ok(())
}
