//! Core types for session data representation.
//!
//! The provider hands the engine two kinds of data:
//! - [`LapTable`], every [`LapRecord`] of a session, indexed by driver
//! - [`TelemetrySeries`], the ordered [`TelemetrySample`]s of one lap
//!
//! Both are immutable once built. A [`Session`] bundles the lap table with
//! its [`SessionKey`] and circuit [`Corner`]s.
//!
//! ## Usage Example
//!
//! ```rust
//! use overcut::types::{Compound, LapRecord, LapTable};
//!
//! let mut lap = LapRecord::new("LEC", 1, Some(92.4));
//! lap.compound = Compound::from("soft");
//! let table = LapTable::new(vec![lap]);
//!
//! assert_eq!(table.drivers(), ["LEC".to_string()]);
//! assert_eq!(table.fastest_lap("LEC").map(|l| l.lap_number), Some(1));
//! ```

pub(crate) mod finite;
mod lap;
mod session;
mod table;
mod telemetry;

pub use lap::{Compound, GREEN_FLAG_STATUS, LapRecord};
pub use session::{Corner, Session, SessionKey, SessionMode};
pub use table::LapTable;
pub use telemetry::{Channel, TelemetrySample, TelemetrySeries};
