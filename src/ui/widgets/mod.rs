pub mod blockie;

pub use blockie::Blockie;
