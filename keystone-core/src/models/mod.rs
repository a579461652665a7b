mod citation;
mod document;
mod message;
mod project;
mod schedule;
mod team;
mod template;

pub use citation::*;
pub use document::*;
pub use message::*;
pub use project::*;
pub use schedule::*;
pub use team::*;
pub use template::*;
