use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use spendlog::{
    NewExpense, PasswordHash, TagName, ValidatedPassword, create_expense, create_user,
    initialize_db,
};

/// A utility for creating a database populated with demo data.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user 'demo' with password 'test'...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    create_user("demo", password_hash, &conn)?;

    println!("Creating demo expenses...");

    let today = OffsetDateTime::now_utc();
    let demo_expenses = [
        (4.5, "Coffee", 1, vec!["food", "drinks"]),
        (23.99, "Groceries", 2, vec!["food"]),
        (12.0, "Train ticket", 3, vec!["travel"]),
        (55.0, "Power bill", 10, vec!["utilities"]),
        (18.5, "Takeaways", 14, vec!["food"]),
        (8.0, "Movie rental", 20, vec!["entertainment"]),
        (32.5, "Petrol", 35, vec!["travel"]),
        (4.5, "Coffee", 40, vec!["food", "drinks"]),
        (120.0, "Car service", 65, vec!["travel"]),
        (49.99, "Video game", 70, vec!["entertainment"]),
    ];

    for (amount, description, days_ago, tags) in demo_expenses {
        create_expense(
            NewExpense {
                amount,
                description: description.to_owned(),
                occurred_at: Some(today - Duration::days(days_ago)),
                import_id: None,
                tags: tags.into_iter().map(TagName::new_unchecked).collect(),
            },
            &conn,
        )?;
    }

    println!("Success!");

    Ok(())
}
