//! Prints an `ADMIN_HASH_PASSWORD=` line for the admin login.
//!
//! The password comes from the first argument, or from stdin when no
//! argument is given so it stays out of shell history.

use bcrypt::{hash, DEFAULT_COST};
use std::io::{self, BufRead};

/// Shortest password accepted for the admin account.
const MIN_LENGTH: usize = 8;

fn read_password() -> io::Result<String> {
    if let Some(arg) = std::env::args().nth(1) {
        return Ok(arg);
    }
    eprint!("Admin password: ");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn main() {
    let password = match read_password() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Could not read password: {}", e);
            std::process::exit(1);
        }
    };

    if password.chars().count() < MIN_LENGTH {
        eprintln!("Password must be at least {} characters", MIN_LENGTH);
        std::process::exit(1);
    }

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            println!("# Add to .env, then restart the server:");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
