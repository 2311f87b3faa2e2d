//! Color provider protocol
//!
//! The provider is an out-of-process helper spoken to over stdio. There is a
//! single request and a single response shape:
//!
//! - request: `{"action":"getColors"}`
//! - response: `{"success":bool,"colors"?:{...},"error"?:string,"filePath"?:string}`
//!
//! Messages carry no ids; a response answers the most recent request.
//!
//! # Module Structure
//!
//! - `message`: request/response types
//! - `io`: framing (native-messaging length prefix or JSONL) and readers

mod io;
mod message;

pub use io::*;
pub use message::*;
