//! Decision rules: cheapest offer for buyers, utility threshold for list borrowers.

use biblio_proto::{AgentId, BookRecord, Price, RefuseReason, SearchResult, WantedList};

/// A priced offer received from a seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Seller that made the offer.
    pub seller: AgentId,
    /// Offered record.
    pub book: BookRecord,
    /// Asking price.
    pub price: Price,
}

/// Picks the lowest price. Ties go to the earliest offer in `offers`.
#[must_use]
pub fn select_cheapest(offers: &[Offer]) -> Option<&Offer> {
    cheapest_index(offers).map(|i| &offers[i])
}

fn cheapest_index(offers: &[Offer]) -> Option<usize> {
    offers
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, Price)>, (i, offer)| match best {
            Some((_, price)) if price <= offer.price => best,
            _ => Some((i, offer.price)),
        })
        .map(|(i, _)| i)
}

/// Returns true if `result` is worth borrowing under the list's threshold.
///
/// The threshold is inclusive, so a threshold of zero borrows even when
/// nothing was found.
#[must_use]
pub fn should_borrow(result: &SearchResult, wanted: &WantedList) -> bool {
    wanted.threshold().is_met(result.utility())
}

/// Replies gathered for one call for proposals.
#[derive(Debug, Clone)]
pub struct OfferCollection {
    expected: Vec<AgentId>,
    responded: Vec<AgentId>,
    offers: Vec<Offer>,
    refusals: Vec<(AgentId, RefuseReason)>,
}

impl OfferCollection {
    /// Expects one reply from each of `expected`.
    #[must_use]
    pub fn new(expected: Vec<AgentId>) -> Self {
        Self {
            expected,
            responded: Vec::new(),
            offers: Vec::new(),
            refusals: Vec::new(),
        }
    }

    fn mark(&mut self, agent: &AgentId) -> bool {
        if !self.expected.contains(agent) || self.responded.contains(agent) {
            return false;
        }
        self.responded.push(agent.clone());
        true
    }

    /// Records an offer in arrival order. Returns false for duplicates or
    /// unexpected senders, which are ignored.
    pub fn record_offer(&mut self, offer: Offer) -> bool {
        if !self.mark(&offer.seller) {
            return false;
        }
        self.offers.push(offer);
        true
    }

    /// Records a refusal. Returns false for duplicates or unexpected senders.
    pub fn record_refusal(&mut self, seller: &AgentId, reason: RefuseReason) -> bool {
        if !self.mark(seller) {
            return false;
        }
        self.refusals.push((seller.clone(), reason));
        true
    }

    /// Returns true once every expected responder answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.responded.len() == self.expected.len()
    }

    /// Offers in arrival order.
    #[must_use]
    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    /// Refusals in arrival order.
    #[must_use]
    pub fn refusals(&self) -> &[(AgentId, RefuseReason)] {
        &self.refusals
    }

    /// The cheapest offer and every other offer.
    #[must_use]
    pub fn into_selection(self) -> Option<(Offer, Vec<Offer>)> {
        let index = cheapest_index(&self.offers)?;
        let mut offers = self.offers;
        let winner = offers.remove(index);
        Some((winner, offers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_proto::UtilityThreshold;
    use proptest::prelude::*;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    fn offer(seller: &str, cents: u64) -> Offer {
        let price = Price::from_cents(cents);
        Offer {
            seller: agent(seller),
            book: BookRecord::for_sale("1984", "George Orwell", price),
            price,
        }
    }

    #[test]
    fn cheapest_wins() {
        let offers = vec![offer("a", 1599), offer("b", 1250), offer("c", 2025)];
        assert_eq!(select_cheapest(&offers).unwrap().seller, agent("b"));
    }

    #[test]
    fn tie_goes_to_first_received() {
        let offers = vec![offer("a", 1599), offer("b", 1250), offer("c", 1250)];
        assert_eq!(select_cheapest(&offers).unwrap().seller, agent("b"));
        assert!(select_cheapest(&[]).is_none());
    }

    #[test]
    fn collection_completes_and_ignores_strangers() {
        let mut collection = OfferCollection::new(vec![agent("a"), agent("b")]);
        assert!(collection.record_offer(offer("a", 1599)));
        assert!(!collection.record_offer(offer("a", 999)));
        assert!(!collection.record_offer(offer("z", 1)));
        assert!(!collection.is_complete());
        assert!(collection.record_refusal(&agent("b"), RefuseReason::NotFound));
        assert!(collection.is_complete());
        assert_eq!(collection.offers().len(), 1);
        assert_eq!(collection.refusals().len(), 1);
    }

    #[test]
    fn selection_splits_winner_and_losers() {
        let mut collection = OfferCollection::new(vec![agent("a"), agent("b"), agent("c")]);
        collection.record_offer(offer("a", 1599));
        collection.record_offer(offer("b", 1250));
        collection.record_offer(offer("c", 1875));

        let (winner, losers) = collection.into_selection().unwrap();
        assert_eq!(winner.seller, agent("b"));
        let loser_names: Vec<_> = losers.iter().map(|o| o.seller.as_str()).collect();
        assert_eq!(loser_names, vec!["a", "c"]);
    }

    #[test]
    fn empty_collection_selects_nothing() {
        assert!(OfferCollection::new(vec![agent("a")]).into_selection().is_none());
    }

    #[test]
    fn borrow_threshold_is_inclusive() {
        let wanted = WantedList::new(["Dune", "Hamlet"], UtilityThreshold::new(0.5).unwrap()).unwrap();
        let mut half = SearchResult::new();
        half.record_found("Dune", BookRecord::for_loan("Dune", "Frank Herbert", 1, 21));
        half.record_missing("Hamlet");
        assert!(should_borrow(&half, &wanted));

        let mut none = SearchResult::new();
        none.record_missing("Dune");
        none.record_missing("Hamlet");
        let lenient = WantedList::new(["Dune", "Hamlet"], UtilityThreshold::new(0.0).unwrap()).unwrap();
        assert!(should_borrow(&none, &lenient));
        assert!(!should_borrow(&none, &wanted));
    }

    proptest! {
        #[test]
        fn cheapest_is_minimal_and_earliest(prices in proptest::collection::vec(0u64..50, 1..12)) {
            let offers: Vec<Offer> = prices
                .iter()
                .enumerate()
                .map(|(i, p)| offer(&format!("s{i}"), *p))
                .collect();
            let winner = select_cheapest(&offers).unwrap();
            let min = prices.iter().copied().min().unwrap();
            let first_min = prices.iter().position(|p| *p == min).unwrap();

            prop_assert_eq!(winner.price, Price::from_cents(min));
            prop_assert_eq!(&winner.seller, &offers[first_min].seller);
        }
    }
}
