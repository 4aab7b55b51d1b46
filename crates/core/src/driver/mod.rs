//! The seam between scenarios and the application they drive.

pub mod protocol;
#[cfg(feature = "remote")]
pub mod remote;

use std::time::Duration;

use crate::error::HarnessResult;
use crate::page::{ElementHandle, Page};

/// A running application the harness can act on.
///
/// Actions only start work; they do not wait for it. The harness calls
/// [`Driver::settle`] after each action to let tracked work (route
/// transitions, dialogs) finish, and [`Driver::advance`] while polling a
/// wait predicate so untracked work (data loads, debounced suggestions)
/// gets a chance to land.
pub trait Driver {
    /// Replace the application's data with the named fixture snapshot.
    fn reset_fixture(&mut self, name: &str) -> HarnessResult<()>;

    fn authenticate(&mut self, username: &str) -> HarnessResult<()>;

    fn visit(&mut self, route: &str) -> HarnessResult<()>;

    fn current_url(&mut self) -> HarnessResult<String>;

    fn page(&mut self) -> HarnessResult<Page>;

    fn click(&mut self, target: &ElementHandle) -> HarnessResult<()>;

    fn focus(&mut self, target: &ElementHandle) -> HarnessResult<()>;

    /// Replace the value of a text input or textarea and fire its input
    /// notification.
    fn fill(&mut self, target: &ElementHandle, text: &str) -> HarnessResult<()>;

    /// Pick an option of a `<select>` by visible text or value and fire its
    /// change notification.
    fn choose(&mut self, target: &ElementHandle, option: &str) -> HarnessResult<()>;

    /// Run until no tracked work is pending.
    fn settle(&mut self) -> HarnessResult<()>;

    /// Let `by` pass on the application's clock.
    fn advance(&mut self, by: Duration) -> HarnessResult<()>;

    /// Time elapsed on the application's clock since the driver started.
    fn elapsed(&self) -> Duration;
}
