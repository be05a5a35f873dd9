//! Record identifier generation.
//!
//! Identifiers are 20 characters: 8 characters encoding the millisecond timestamp
//! followed by 12 random characters, over a 64-symbol alphabet whose symbols are in
//! ascending ASCII order. Identifiers generated by one [`IdGenerator`] sort in
//! generation order. Within the same millisecond, or if the clock steps backwards,
//! the random part of the previous identifier is incremented instead of redrawn.

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

const ALPHABET: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";
const TIME_LEN: usize = 8;
const RANDOM_LEN: usize = 12;

#[derive(Debug, Default)]
struct IdState {
    last_millis: i64,
    last_random: [u8; RANDOM_LEN],
}

/// Generates unique, time-ordered record identifiers.
#[derive(Debug, Default)]
pub struct IdGenerator {
    state: Mutex<IdState>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier using the current system time.
    pub fn next_id(&self) -> String {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    /// Returns the next identifier for the given millisecond timestamp.
    pub fn next_id_at(&self, millis: i64) -> String {
        let mut state = self.state.lock();

        if millis > state.last_millis {
            state.last_millis = millis;
            state.last_random = random_digits();
        } else {
            increment(&mut state.last_random);
        }

        let mut id = String::with_capacity(TIME_LEN + RANDOM_LEN);
        let mut time = state.last_millis.max(0) as u64;
        let mut time_digits = [0u8; TIME_LEN];

        for digit in time_digits.iter_mut().rev() {
            *digit = (time % 64) as u8;
            time /= 64;
        }

        id.extend(time_digits.iter().map(|d| ALPHABET[*d as usize] as char));
        id.extend(state.last_random.iter().map(|d| ALPHABET[*d as usize] as char));
        id
    }
}

fn random_digits() -> [u8; RANDOM_LEN] {
    let bytes = Uuid::new_v4().into_bytes();
    let mut digits = [0u8; RANDOM_LEN];

    for (digit, byte) in digits.iter_mut().zip(bytes.iter()) {
        *digit = byte % 64;
    }

    digits
}

fn increment(digits: &mut [u8; RANDOM_LEN]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
