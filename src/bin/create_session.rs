use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::Duration;

use spendwise::{
    DEFAULT_SESSION_DURATION, UpsertUser, UserId, create_session, initialize_db, upsert_user,
};

/// Sign a user in without the identity provider, for local development.
///
/// Creates or updates the user and prints a session ID that can be sent as
/// `Authorization: Bearer <session ID>`.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The ID of the user to sign in as.
    #[arg(long)]
    user_id: String,

    /// The user's email address.
    #[arg(long)]
    email: Option<String>,

    /// How many hours the session is valid for, defaults to one week.
    #[arg(long)]
    hours: Option<i64>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if db_path.extension().is_none_or(|extension| extension.is_empty()) {
        eprintln!("Database path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    let user = upsert_user(
        UpsertUser {
            id: Some(UserId::new(args.user_id)),
            email: args.email,
            ..Default::default()
        },
        &connection,
    )?;

    let duration = args
        .hours
        .map(Duration::hours)
        .unwrap_or(DEFAULT_SESSION_DURATION);
    let session = create_session(&user.id, duration, &connection)?;

    eprintln!("Created session for {} valid until {}", user.id, session.expire);
    println!("{}", session.sid);

    Ok(())
}
