//! Record identifiers: 16 random bytes, hex encoded.

use rand::RngCore;

pub fn new_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
