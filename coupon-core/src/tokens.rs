//! Random ticket tokens
//!
//! Neither token is checked against the store, so collisions are possible.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Smallest ticket number handed out
pub const TICKET_MIN: u32 = 100_000;

/// Largest ticket number handed out
pub const TICKET_MAX: u32 = 999_999;

/// Length of the alphanumeric identifier stored with each coupon
pub const UNIQUE_ID_LEN: usize = 20;

/// Six digit ticket number, uniform over `TICKET_MIN..=TICKET_MAX`
pub fn ticket_number<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(TICKET_MIN..=TICKET_MAX)
}

/// `UNIQUE_ID_LEN` characters drawn with replacement from `[A-Za-z0-9]`
pub fn unique_identifier<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..UNIQUE_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Both tokens for a new coupon, using the thread-local generator
pub fn generate() -> (u32, String) {
    let mut rng = rand::thread_rng();
    (ticket_number(&mut rng), unique_identifier(&mut rng))
}
