pub mod location;
pub mod location_table;
pub mod record;
pub mod region;
pub mod strand;

// re-export for cleaner imports
pub use self::location::{LocationInformation, LocationKey};
pub use self::location_table::LocationTable;
pub use self::record::IndexedRecord;
pub use self::region::GenomicRegion;
pub use self::strand::Strand;
