//! Conversation ids used by the market and library protocols.

/// Buyer and sellers negotiating one purchase.
pub const BOOK_TRADE: &str = "book-trade";
/// Clerk acknowledging a single-title loan request.
pub const LOAN_SEARCH: &str = "loan-search";
/// Offer, acceptance and confirmation of a single-title loan.
pub const BOOK_LOAN: &str = "book-loan";
/// Availability question and its acknowledgement.
pub const BOOK_SEARCH: &str = "book-search";
/// Answer to an availability question.
pub const SEARCH_RESULT: &str = "search-result";
/// Wanted list submission, acknowledgement and result.
pub const LIST_SEARCH: &str = "list-search";
/// Bulk loan of the titles found in a list search.
pub const LIST_LOAN: &str = "list-loan";
