use crate::utils::types::Address;

/// The next `r` nodes clockwise, kept so the ring survives up to `r - 1`
/// simultaneous successor failures. `successors[0]` tracks the node's
/// current successor whenever the list is non-empty.
#[derive(Debug, Clone)]
pub struct SuccessorList {
    r: usize,
    successors: Vec<Address>,
}

impl SuccessorList {
    pub fn new(r: usize, own_address: &Address) -> SuccessorList {
        SuccessorList {
            r,
            successors: vec![own_address.clone()],
        }
    }

    pub fn addresses(&self) -> &[Address] {
        &self.successors
    }

    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.successors.len()
    }

    pub fn first(&self) -> Option<&Address> {
        self.successors.first()
    }

    /// Removes the failed head of the list.
    pub fn pop_front(&mut self) {
        if !self.successors.is_empty() {
            self.successors.remove(0);
        }
    }

    /// Collapses the list back to a solo ring.
    pub fn reset(&mut self, own_address: &Address) {
        self.successors = vec![own_address.clone()];
    }

    /// Rebuilds the list as `[successor] ++ tail`, truncated to `r` entries.
    /// The walk stops at the first repeated address: a repeat means the tail
    /// wrapped past the whole ring, and keeping it would pad the list with
    /// stale duplicates on small rings.
    pub fn adopt(&mut self, successor: &Address, tail: Vec<Address>) {
        let mut rebuilt = vec![successor.clone()];
        for address in tail {
            if rebuilt.len() >= self.r || rebuilt.contains(&address) {
                break;
            }
            rebuilt.push(address);
        }
        self.successors = rebuilt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.to_string()
    }

    #[test]
    fn starts_as_solo_ring() {
        let list = SuccessorList::new(4, &addr("a:1"));
        assert_eq!(list.addresses(), &[addr("a:1")]);
    }

    #[test]
    fn adopt_truncates_to_r_entries() {
        let mut list = SuccessorList::new(2, &addr("me:0"));
        list.adopt(&addr("a:1"), vec![addr("b:2"), addr("c:3")]);
        assert_eq!(list.addresses(), &[addr("a:1"), addr("b:2")]);
    }

    #[test]
    fn adopt_stops_at_the_first_ring_wrap() {
        let mut list = SuccessorList::new(4, &addr("me:0"));
        list.adopt(&addr("a:1"), vec![addr("me:0"), addr("a:1"), addr("me:0")]);
        assert_eq!(list.addresses(), &[addr("a:1"), addr("me:0")]);
    }

    #[test]
    fn pop_front_then_reset_recovers_solo_ring() {
        let mut list = SuccessorList::new(4, &addr("me:0"));
        list.adopt(&addr("a:1"), vec![addr("b:2")]);
        list.pop_front();
        assert_eq!(list.first(), Some(&addr("b:2")));
        list.pop_front();
        list.pop_front();
        assert!(list.is_empty());
        list.reset(&addr("me:0"));
        assert_eq!(list.addresses(), &[addr("me:0")]);
    }
}
