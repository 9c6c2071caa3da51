use rusqlite::{OptionalExtension, params};

use turf_core::UserId;

use crate::error::Result;
use crate::store::Store;

/// The scoring ledger: one non-negative running total per player.
///
/// Totals only ever grow in normal play. The increment is a single
/// UPSERT, so concurrent awards to the same player cannot lose an
/// update no matter how captures interleave.
pub struct ScoreLedger<'a> {
    store: &'a Store,
}

impl<'a> ScoreLedger<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Add `amount` to the player's total and return the new total.
    pub fn increase(&self, user: UserId, amount: u64) -> Result<u64> {
        let tx = self.store.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO scores (user_id, points) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET points = points + excluded.points",
            params![user.0, amount as i64],
        )?;
        let total: i64 = tx.query_row(
            "SELECT points FROM scores WHERE user_id = ?1",
            [user.0],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(total as u64)
    }

    /// Sum of every player's total, for diagnostics.
    pub fn grand_total(&self) -> Result<u64> {
        let total: i64 = self.store.conn().query_row(
            "SELECT COALESCE(SUM(points), 0) FROM scores",
            [],
            |row| row.get(0),
        )?;
        Ok(total as u64)
    }

    /// Current total; players with no ledger row sit at zero.
    pub fn total_of(&self, user: UserId) -> Result<u64> {
        let total: Option<i64> = self
            .store
            .conn()
            .query_row(
                "SELECT points FROM scores WHERE user_id = ?1",
                [user.0],
                |row| row.get(0),
            )
            .optional()?;
        Ok(total.unwrap_or(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increase_from_zero() {
        let store = Store::open_in_memory().unwrap();
        let ledger = ScoreLedger::new(&store);

        assert_eq!(ledger.total_of(UserId(1)).unwrap(), 0);
        assert_eq!(ledger.increase(UserId(1), 10).unwrap(), 10);
        assert_eq!(ledger.total_of(UserId(1)).unwrap(), 10);
    }

    #[test]
    fn test_increase_accumulates() {
        let store = Store::open_in_memory().unwrap();
        let ledger = ScoreLedger::new(&store);

        ledger.increase(UserId(1), 10).unwrap();
        ledger.increase(UserId(1), 3).unwrap();
        assert_eq!(ledger.increase(UserId(1), 0).unwrap(), 13);
    }

    #[test]
    fn test_totals_isolated_per_user() {
        let store = Store::open_in_memory().unwrap();
        let ledger = ScoreLedger::new(&store);

        ledger.increase(UserId(1), 5).unwrap();
        ledger.increase(UserId(2), 7).unwrap();

        assert_eq!(ledger.total_of(UserId(1)).unwrap(), 5);
        assert_eq!(ledger.total_of(UserId(2)).unwrap(), 7);
        assert_eq!(ledger.total_of(UserId(3)).unwrap(), 0);
        assert_eq!(ledger.grand_total().unwrap(), 12);
    }
}
