pub mod coordinate;
pub use coordinate::Position;

pub mod snp;
pub use snp::{Allele, SnpCoord};

pub mod window;
pub use window::WindowRange;
