//! Creates a database with sample data for manual testing.

use clap::Parser;
use rusqlite::Connection;

use bokari_rs::{
    PasswordHash, UserId,
    account::{NewAccount, insert_account},
    budget::{NewBudget, insert_budget},
    category::insert_category,
    db::initialize,
    payment_method::insert_payment_method,
    transaction::{TransactionData, create_transaction},
    user::{NewUser, insert_user},
};

/// Creates a database with sample users, reference data and transactions.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path for the SQLite database to create.
    #[arg(long, default_value = "test.db")]
    db_path: String,

    /// The password every sample user gets.
    #[arg(long, default_value = "pw123456")]
    password: String,
}

fn main() {
    let args = Args::parse();

    let connection = Connection::open(&args.db_path).expect("Could not open the database.");
    initialize(&connection).expect("Could not initialize the database.");

    let password = PasswordHash::new(&args.password, PasswordHash::DEFAULT_COST)
        .expect("Could not hash the sample password.");

    for (username, admin) in [("alda", false), ("birta", false), ("stjornandi", true)] {
        insert_user(
            NewUser {
                username: username.to_owned(),
                email: format!("{username}@example.com")
                    .parse()
                    .expect("sample email is valid"),
                password: password.clone(),
                admin,
            },
            &connection,
        )
        .expect("Could not insert sample user.");
    }

    for (user_id, name, balance) in [
        (1, "Launareikningur", 250_000.0),
        (2, "Sparnaður", 1_200_000.0),
    ] {
        insert_account(
            NewAccount {
                user_id: UserId::new(user_id),
                account_name: name.to_owned(),
                balance,
            },
            &connection,
        )
        .expect("Could not insert sample account.");
    }

    for (name, slug) in [
        ("Matur", "matur"),
        ("Íbúð", "ibud"),
        ("Samgöngur", "samgongur"),
        ("Afþreying", "afthreying"),
    ] {
        insert_category(name, slug, &connection).expect("Could not insert sample category.");
    }

    for (name, slug) in [
        ("Reiðufé", "reidufe"),
        ("Kreditkort", "kreditkort"),
        ("Debetkort", "debetkort"),
    ] {
        insert_payment_method(name, slug, &connection)
            .expect("Could not insert sample payment method.");
    }

    for (user_id, category, monthly_limit) in [(1, "matur", 80_000.0), (2, "samgongur", 25_000.0)]
    {
        insert_budget(
            NewBudget {
                user_id: UserId::new(user_id),
                category: category.to_owned(),
                monthly_limit,
            },
            &connection,
        )
        .expect("Could not insert sample budget.");
    }

    for (user_id, amount, description) in [
        (1, 6000.0, "Smá matur"),
        (1, 12_500.0, "Bensín"),
        (2, 3200.0, "Strætókort"),
    ] {
        create_transaction(
            &TransactionData {
                account_id: user_id,
                user_id: UserId::new(user_id),
                payment_method_id: 1,
                transaction_type: "expense".to_owned(),
                category: "matur".to_owned(),
                amount,
                description: description.to_owned(),
            },
            &connection,
        )
        .expect("Could not insert sample transaction.");
    }

    println!("Created sample database at {}", args.db_path);
}
