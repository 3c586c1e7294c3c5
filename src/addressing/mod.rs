//! KNX addressing system.
//!
//! KNX uses two types of addresses:
//! - Individual addresses for physical devices (Area.Line.Device)
//! - Group addresses for logical grouping (Main/Middle/Sub, Main/Sub, or free-form)
//!
//! [`AddressFilter`] patterns let callers subscribe to a subset of group
//! addresses without enumerating them individually.

pub mod filter;
pub mod group;
pub mod individual;

#[doc(inline)]
pub use filter::AddressFilter;
#[doc(inline)]
pub use group::{AddressStyle, GroupAddress};
#[doc(inline)]
pub use individual::IndividualAddress;
