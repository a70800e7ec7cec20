//! Action - plain records accepted by the base sink

use std::fmt::Debug;

/// A plain action record
///
/// Actions are the only values a reducer ever sees. The type tag is used for
/// logging, metrics labels and error messages.
pub trait Action: Debug + Send + Sync + 'static {
    /// Type tag of this record (e.g. `"increment"`)
    fn action_type(&self) -> &str;
}
