/// Stamp attached to an in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic request counter. Only the most recently issued ticket is
/// current, so responses to superseded requests can be dropped.
#[derive(Debug, Default)]
pub struct Generation {
    current: u64,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new ticket, invalidating every earlier one.
    pub fn advance(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ticket_is_current() {
        let mut gen = Generation::new();
        let first = gen.advance();
        assert!(gen.is_current(first));

        let second = gen.advance();
        assert!(!gen.is_current(first));
        assert!(gen.is_current(second));
        assert!(second.value() > first.value());
    }

    #[test]
    fn fresh_generation_has_no_current_ticket() {
        let mut other = Generation::new();
        let foreign = other.advance();
        let gen = Generation::new();
        assert!(!gen.is_current(foreign));
    }
}
