//! Reservation code (PNR) issuance.

use rand::Rng;
use wayfare_core::error::Result;
use wayfare_core::store::{BookingLedger, StoreTransaction};
use wayfare_core::types::ReservationCode;
use wayfare_core::{BookingError, StoreError};

/// Draws random reservation codes and checks them against the booking ledger.
#[derive(Clone, Copy, Debug)]
pub struct CodeGenerator {
    max_attempts: u32,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(16)
    }
}

impl CodeGenerator {
    /// Creates a generator that gives up after `max_attempts` collisions (at least one attempt)
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Draws one code of [`ReservationCode::LENGTH`] characters from
    /// [`ReservationCode::ALPHABET`].
    ///
    /// # Errors
    ///
    /// Never in practice; the drawn text is re-validated by [`ReservationCode::parse`].
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Result<ReservationCode> {
        let alphabet = ReservationCode::ALPHABET;
        let code: String = (0..ReservationCode::LENGTH)
            .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
            .collect();
        ReservationCode::parse(&code)
    }

    /// Draws codes until one is unused by every booking visible to `tx`.
    ///
    /// The unique index on the booking code still guards against a concurrent
    /// transaction claiming the same code before `tx` commits.
    ///
    /// # Errors
    ///
    /// - `Store(Conflict)`: every attempt collided
    /// - `Store(Database)`: the lookup failed
    pub async fn issue(&self, tx: &mut dyn StoreTransaction) -> Result<ReservationCode> {
        for attempt in 1..=self.max_attempts {
            let code = Self::generate(&mut rand::thread_rng())?;
            if !tx.code_exists(code.clone()).await? {
                return Ok(code);
            }
            tracing::debug!(attempt, "Reservation code collision, drawing again");
        }

        tracing::error!(attempts = self.max_attempts, "No free reservation code found");
        Err(BookingError::Store(StoreError::Conflict(format!(
            "No unused reservation code after {} attempts",
            self.max_attempts
        ))))
    }
}
