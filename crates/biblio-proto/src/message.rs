//! The message envelope every agent exchanges.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::book::BookRecord;
use crate::error::ProtoError;
use crate::types::AgentId;
use crate::wanted::{LoanReport, SearchResult, WantedList};

/// Speech-act tag carried by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Performative {
    /// Ask responders for offers.
    CallForProposal,
    /// An offer in answer to a call for proposals.
    Propose,
    /// Decline to make an offer.
    Refuse,
    /// Commit to an offer.
    AcceptProposal,
    /// Turn an offer down.
    RejectProposal,
    /// Ask a responder to do something.
    Request,
    /// Share information or confirm an outcome.
    Inform,
    /// Report that a committed action could not be carried out.
    Failure,
    /// Agree to proceed, used for bulk loan requests.
    Agree,
    /// Confirm a request, used to submit a wanted list.
    Confirm,
}

impl fmt::Display for Performative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CallForProposal => "CFP",
            Self::Propose => "PROPOSE",
            Self::Refuse => "REFUSE",
            Self::AcceptProposal => "ACCEPT_PROPOSAL",
            Self::RejectProposal => "REJECT_PROPOSAL",
            Self::Request => "REQUEST",
            Self::Inform => "INFORM",
            Self::Failure => "FAILURE",
            Self::Agree => "AGREE",
            Self::Confirm => "CONFIRM",
        };
        f.write_str(name)
    }
}

/// Message payload: a short tagged string or a structured record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    /// No payload.
    Empty,
    /// Tagged text such as `"insufficient-copies:3"`.
    Text(String),
    /// A single catalog record.
    Book(BookRecord),
    /// A borrower's wanted list.
    WantedList(WantedList),
    /// A clerk's search result.
    SearchResult(SearchResult),
    /// A clerk's bulk loan report.
    LoanReport(LoanReport),
}

impl Content {
    /// Returns the text payload, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Read the payload as text.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] for any other payload kind.
    pub fn text(&self) -> Result<&str, ProtoError> {
        self.as_text()
            .ok_or_else(|| ProtoError::malformed("text", self.kind()))
    }

    /// Read the payload as a book record.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] for any other payload kind.
    pub fn book(&self) -> Result<&BookRecord, ProtoError> {
        match self {
            Self::Book(book) => Ok(book),
            other => Err(ProtoError::malformed("book record", other.kind())),
        }
    }

    /// Read the payload as a wanted list.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] for any other payload kind.
    pub fn wanted_list(&self) -> Result<&WantedList, ProtoError> {
        match self {
            Self::WantedList(list) => Ok(list),
            other => Err(ProtoError::malformed("wanted list", other.kind())),
        }
    }

    /// Read the payload as a search result.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] for any other payload kind.
    pub fn search_result(&self) -> Result<&SearchResult, ProtoError> {
        match self {
            Self::SearchResult(result) => Ok(result),
            other => Err(ProtoError::malformed("search result", other.kind())),
        }
    }

    /// Read the payload as a loan report.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Malformed`] for any other payload kind.
    pub fn loan_report(&self) -> Result<&LoanReport, ProtoError> {
        match self {
            Self::LoanReport(report) => Ok(report),
            other => Err(ProtoError::malformed("loan report", other.kind())),
        }
    }

    /// Short name of the payload kind, for logs and errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Book(_) => "book",
            Self::WantedList(_) => "wanted_list",
            Self::SearchResult(_) => "search_result",
            Self::LoanReport(_) => "loan_report",
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<BookRecord> for Content {
    fn from(book: BookRecord) -> Self {
        Self::Book(book)
    }
}

impl From<WantedList> for Content {
    fn from(list: WantedList) -> Self {
        Self::WantedList(list)
    }
}

impl From<SearchResult> for Content {
    fn from(result: SearchResult) -> Self {
        Self::SearchResult(result)
    }
}

impl From<LoanReport> for Content {
    fn from(report: LoanReport) -> Self {
        Self::LoanReport(report)
    }
}

/// Generate a fresh reply-correlation token such as `cfp-6f1c…`.
#[must_use]
pub fn new_token(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// A message between agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Speech-act tag.
    pub performative: Performative,
    /// Agent that sent the message.
    pub sender: AgentId,
    /// Agents the message is addressed to.
    pub receivers: Vec<AgentId>,
    /// Payload.
    pub content: Content,
    /// Conversation this message belongs to.
    pub conversation_id: Option<String>,
    /// Token the receiver must echo in `in_reply_to`.
    pub reply_with: Option<String>,
    /// Token of the message this one answers.
    pub in_reply_to: Option<String>,
}

impl Message {
    /// Create an empty message with no receivers.
    #[must_use]
    pub fn new(performative: Performative, sender: AgentId) -> Self {
        Self {
            performative,
            sender,
            receivers: Vec::new(),
            content: Content::Empty,
            conversation_id: None,
            reply_with: None,
            in_reply_to: None,
        }
    }

    /// Add a receiver.
    #[must_use]
    pub fn to(mut self, receiver: AgentId) -> Self {
        self.receivers.push(receiver);
        self
    }

    /// Add several receivers.
    #[must_use]
    pub fn to_all(mut self, receivers: impl IntoIterator<Item = AgentId>) -> Self {
        self.receivers.extend(receivers);
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<Content>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the conversation id.
    #[must_use]
    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Set the reply-correlation token the receiver must echo.
    #[must_use]
    pub fn reply_with(mut self, token: impl Into<String>) -> Self {
        self.reply_with = Some(token.into());
        self
    }

    /// Set the token this message answers.
    #[must_use]
    pub fn in_reply_to(mut self, token: impl Into<String>) -> Self {
        self.in_reply_to = Some(token.into());
        self
    }

    /// Build a reply to this message, sent by `from`.
    ///
    /// The reply goes back to the original sender, stays in the same
    /// conversation and echoes the original `reply_with` token.
    #[must_use]
    pub fn reply(&self, from: AgentId, performative: Performative) -> Self {
        Self {
            performative,
            sender: from,
            receivers: vec![self.sender.clone()],
            content: Content::Empty,
            conversation_id: self.conversation_id.clone(),
            reply_with: None,
            in_reply_to: self.reply_with.clone(),
        }
    }

    /// Text payload, or [`ProtoError::Malformed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not text.
    pub fn text(&self) -> Result<&str, ProtoError> {
        self.content.text()
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.performative, self.sender)?;
        if let Some(conversation) = &self.conversation_id {
            write!(f, " [{conversation}]")?;
        }
        Ok(())
    }
}
