mod error;
mod message;
mod policy;
mod session_record;
mod types;

pub use error::*;
pub use message::*;
pub use policy::*;
pub use session_record::*;
pub use types::*;

pub extern crate serde;
pub extern crate serde_json;
