//! Print fresh secrets for a `.env` file

use home_loan_helper::utils::crypto::{generate_encryption_key, generate_token};

fn main() {
    println!("🔐 Generating secure secrets for Home Loan Helper API");
    println!("{}", "=".repeat(60));

    println!("JWT_SECRET=\"{}\"", generate_token(32));
    println!("ENCRYPTION_KEY=\"{}\"", generate_encryption_key());
    println!("DB_PASSWORD=\"{}\"", generate_token(16));

    println!();
    println!("💡 Usage:");
    println!("1. Copy these values to your .env file");
    println!("2. Update your DATABASE_URL with the DB_PASSWORD");
    println!("3. Never commit these secrets to git!");
    println!();
    println!("⚠️  Keep these secrets secure and use different ones for production!");
}
