//! Per-session state

use uuid::Uuid;

/// State attached to one client session.
///
/// Returned by the session store once it has counted the current request,
/// so `num_visits` includes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    session_id: Uuid,
    num_visits: i64,
}

impl SessionContext {
    pub fn new(session_id: Uuid, num_visits: i64) -> Self {
        Self { session_id, num_visits }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Visits recorded so far
    pub fn num_visits(&self) -> i64 {
        self.num_visits
    }

    /// Visits made before the current one
    pub fn previous_visits(&self) -> i64 {
        (self.num_visits - 1).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_visits() {
        assert_eq!(SessionContext::new(Uuid::new_v4(), 1).previous_visits(), 0);
        assert_eq!(SessionContext::new(Uuid::new_v4(), 5).previous_visits(), 4);
        assert_eq!(SessionContext::new(Uuid::new_v4(), 0).previous_visits(), 0);
    }
}
