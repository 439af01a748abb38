mod department;
mod membership;
mod organization;
mod user;

pub use department::*;
pub use membership::*;
pub use organization::*;
pub use user::*;
