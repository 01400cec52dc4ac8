// Signature capture and pre-submission validation for hospital round forms.
//
// A `Page` stands in for the hosting document. `RoundFormValidator` binds
// to it, owns one `SignatureCapture` per signature pad, and decides whether
// a submit may go through. `Session` wires both together for scripted or
// interactive use.

pub mod config;
pub mod draw;
pub mod encode;
pub mod error;
pub mod input;
pub mod page;
pub mod session;
pub mod signature;
pub mod submission;
pub mod types;
pub mod validator;

pub use config::FormLayout;
pub use error::Error;
pub use page::Page;
pub use session::{Action, Outcome, Session};
pub use signature::SignatureCapture;
pub use validator::{RoundFormValidator, SignatureSlot, ValidationError};
