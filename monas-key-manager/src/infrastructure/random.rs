//! Process-wide secure random source.

use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::domain::error::{KeyManagerError, KeyManagerResult};

/// `len` bytes from the operating system RNG, wiped when dropped.
pub fn random_bytes(len: usize) -> KeyManagerResult<Zeroizing<Vec<u8>>> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    fill_random(&mut bytes)
        .map_err(|e| KeyManagerError::Generation(format!("secure random source failed: {e}")))?;
    Ok(bytes)
}

pub fn fill_random(dest: &mut [u8]) -> Result<(), rand_core::Error> {
    OsRng.try_fill_bytes(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_have_requested_length() {
        assert_eq!(random_bytes(32).unwrap().len(), 32);
        assert!(random_bytes(0).unwrap().is_empty());
    }

    #[test]
    fn consecutive_draws_differ() {
        let a = random_bytes(32).unwrap();
        let b = random_bytes(32).unwrap();
        assert_ne!(*a, *b);
    }
}
