//! Transport seam between the client state machine and provider I/O

use std::sync::Arc;

use crate::error::Result;
use crate::protocol::{ProviderRequest, ProviderResponse};

/// What happened on a provider link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEventKind {
    /// A well-formed response frame arrived
    Message(ProviderResponse),
    /// The link closed. `None` means a clean end of stream.
    Closed(Option<String>),
}

/// Event emitted by a link, tagged with the generation it was opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEvent {
    pub generation: u64,
    pub kind: LinkEventKind,
}

impl LinkEvent {
    pub fn message(generation: u64, response: ProviderResponse) -> Self {
        LinkEvent {
            generation,
            kind: LinkEventKind::Message(response),
        }
    }

    pub fn closed(generation: u64, reason: Option<String>) -> Self {
        LinkEvent {
            generation,
            kind: LinkEventKind::Closed(reason),
        }
    }
}

/// Where link events go. Called from provider I/O threads.
pub type LinkCallback = Arc<dyn Fn(LinkEvent) + Send + Sync>;

/// Opens links to a color provider
pub trait ProviderTransport: Send {
    /// Establish a new link. Every event the link produces must carry
    /// `generation` and be delivered through `events`.
    fn open(&mut self, generation: u64, events: LinkCallback) -> Result<Box<dyn ProviderLink>>;
}

/// An established link. Dropping it closes the link.
pub trait ProviderLink: Send {
    fn send(&mut self, request: &ProviderRequest) -> Result<()>;
}
