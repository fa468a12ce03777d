pub mod answers;
pub mod recommendation;
pub mod user;
