pub mod deploy;
pub mod invoke;
pub mod lookup;
