//! Print an Argon2 PHC hash for `ADMIN_PASSWORD_HASH`.
//!
//! ```text
//! cargo run --bin hash-password -- 'correct horse battery staple'
//! ```

use folio_api::hash_password;

fn main() {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("usage: hash-password <password>");
        std::process::exit(2);
    };

    match hash_password(&password) {
        Ok(hash) => println!("{}", hash),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
