//! Generators produce the string values of access and refresh tokens.
//!
//! The default policy depends only on the entropy of the generated token to make guessing
//! infeasible. Values never encode anything about the grant, any association between a value and
//! its client, user or scope is kept by the model.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};

/// Produces opaque token values.
///
/// ## Requirements on implementations
///
/// Consecutive values MUST be indistinguishable from a random function. One should not be able to
/// derive another token from ones own.
pub trait TagToken: Send + Sync {
    /// Generate a fresh value.
    fn tag(&self) -> Result<String, rand::Error>;
}

/// Generates tokens from random bytes.
///
/// Each byte is drawn from the operating system random source, the result is url-safe base64
/// without padding. All values of one generator have the same length.
#[derive(Clone, Copy, Debug)]
pub struct RandomGenerator {
    random: OsRng,
    len: usize,
}

impl RandomGenerator {
    /// Generates tokens with a specific byte length.
    pub fn new(length: usize) -> RandomGenerator {
        RandomGenerator {
            random: OsRng,
            len: length,
        }
    }

    /// The number of random bytes in each token.
    pub fn byte_len(&self) -> usize {
        self.len
    }

    fn generate(&self) -> Result<String, rand::Error> {
        let mut result = vec![0; self.len];
        let mut rnd = self.random;
        rnd.try_fill_bytes(result.as_mut_slice())?;
        Ok(URL_SAFE_NO_PAD.encode(&result))
    }
}

impl TagToken for RandomGenerator {
    fn tag(&self) -> Result<String, rand::Error> {
        self.generate()
    }
}

impl<T: TagToken + ?Sized> TagToken for Box<T> {
    fn tag(&self) -> Result<String, rand::Error> {
        (**self).tag()
    }
}
