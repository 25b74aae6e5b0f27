pub mod address;
pub mod fee_policy;
pub mod hash;
pub mod name;
pub mod record;

pub use address::*;
pub use fee_policy::*;
pub use hash::*;
pub use name::*;
pub use record::*;
